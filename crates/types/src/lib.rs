#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the hrel release pipeline
//!
//! This crate provides the small vocabulary shared by every stage: build
//! targets, artifact names, registry tags and redacted secrets.

pub mod image;
pub mod naming;
pub mod secret;
pub mod target;

pub use image::{normalize_tags, ImageRef, ImageTag};
pub use naming::{ArchiveKind, ArtifactNames};
pub use secret::Secret;
pub use target::{Target, TargetArch, TargetOs};
