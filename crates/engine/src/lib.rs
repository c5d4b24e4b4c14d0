#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Container engine abstraction for hrel
//!
//! This crate provides a unified interface for everything the pipeline runs
//! inside containers:
//! - Throwaway tool containers (Go toolchain, cosign, syft)
//! - Registry authentication
//! - Multi-platform image builds pushed under several tags
//!
//! Every invocation emits engine events with secrets redacted.

pub mod cli;
pub mod context;
pub mod engine;
pub mod image;
pub mod spec;

pub use cli::CliEngine;
pub use context::EngineContext;
pub use engine::{ContainerEngine, ExecOutput, RegistryAuth};
pub use image::{parse_build_metadata, ImageBuildRequest, PublishedImage, DIGEST_KEY};
pub use spec::{CacheVolume, ContainerSpec, ExecArg, Mount};
