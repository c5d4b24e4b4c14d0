//! hrel - release pipeline for the Harbor CLI
//!
//! Parses the command line, resolves configuration, and runs pipeline stages
//! against a docker or podman engine while logging pipeline events.

mod cli;
mod display;
mod error;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs, OidcArgs, RegistryArgs};
use crate::display::{CommandOutcome, OutputRenderer};
use crate::error::CliError;
use clap::Parser;
use hrel_config::Config;
use hrel_engine::{CliEngine, EngineContext};
use hrel_errors::EngineError;
use hrel_events::EventReceiver;
use hrel_pipeline::{OidcCredentials, Pipeline, RegistryCredentials};
use hrel_types::Secret;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{debug, error, info};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            println!("{}", e.to_json());
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting hrel v{}", env!("CARGO_PKG_VERSION"));

    let source_dir = resolve_source(&cli.global.source).await?;

    // defaults < file < HREL_* environment < flags
    let mut config = Config::load_for_source(&source_dir, cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);
    config.validate()?;

    let renderer = OutputRenderer::new(cli.global.json);

    if !cli.command.needs_engine() {
        renderer.render(&CommandOutcome::Config(config.to_toml_string()?))?;
        return Ok(());
    }

    let engine = CliEngine::new(&config.engine.program).with_pull(config.engine.pull);
    if !engine.is_available().await {
        return Err(hrel_errors::Error::from(EngineError::Unavailable {
            program: engine.program().to_string(),
        })
        .into());
    }

    let (event_sender, event_receiver) = hrel_events::channel();
    let correlation_id = Uuid::new_v4().to_string();
    debug!(correlation = %correlation_id, command = cli.command.name(), "running command");
    let ctx = EngineContext::new(Some(event_sender)).with_correlation_id(correlation_id);

    let pipeline = Pipeline::new(config, source_dir, Arc::new(engine), ctx);
    let outcome = execute_command_with_events(cli.command, &pipeline, event_receiver).await?;

    renderer.render(&outcome)?;

    info!("Command completed successfully");
    Ok(())
}

/// Run the command while logging events as they arrive
async fn execute_command_with_events(
    command: Commands,
    pipeline: &Pipeline,
    mut event_receiver: EventReceiver,
) -> Result<CommandOutcome, CliError> {
    let mut command_future = Box::pin(execute_command(command, pipeline));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(message) = event_receiver.try_recv() {
                    logging::log_event_with_tracing(&message);
                }
                return result;
            }

            message = event_receiver.recv() => {
                if let Some(message) = message {
                    logging::log_event_with_tracing(&message);
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(
    command: Commands,
    pipeline: &Pipeline,
) -> Result<CommandOutcome, CliError> {
    match command {
        Commands::Build => {
            let info = pipeline.detect().await?;
            let paths = pipeline.build(&info).await?;
            Ok(CommandOutcome::Artifacts {
                kind: "binaries",
                paths,
            })
        }

        Commands::Archive => {
            let info = pipeline.detect().await?;
            let paths = pipeline.archive(&info).await?;
            Ok(CommandOutcome::Artifacts {
                kind: "archives",
                paths,
            })
        }

        Commands::Sbom => {
            let info = pipeline.detect().await?;
            let paths = pipeline.sbom(&info).await?;
            Ok(CommandOutcome::Artifacts {
                kind: "sboms",
                paths,
            })
        }

        Commands::Publish { tags, registry } => {
            let info = pipeline.detect().await?;
            let addresses = pipeline
                .publish(&info, &tags, &registry_credentials(registry))
                .await?;
            Ok(CommandOutcome::Published(addresses))
        }

        Commands::Sign {
            address,
            registry,
            oidc,
        } => {
            let output = pipeline
                .sign(&address, &registry_credentials(registry), &oidc_credentials(oidc))
                .await?;
            Ok(CommandOutcome::Signed { address, output })
        }

        Commands::PublishAndSign {
            tags,
            registry,
            oidc,
        } => {
            let info = pipeline.detect().await?;
            let address = pipeline
                .publish_and_sign(
                    &info,
                    &tags,
                    &registry_credentials(registry),
                    &oidc_credentials(oidc),
                )
                .await?;
            Ok(CommandOutcome::Signed {
                address,
                output: String::new(),
            })
        }

        Commands::Release {
            tags,
            registry,
            oidc,
        } => {
            let info = pipeline.detect().await?;
            let report = pipeline
                .release(
                    &info,
                    &tags,
                    &registry_credentials(registry),
                    &oidc_credentials(oidc),
                )
                .await?;
            Ok(CommandOutcome::Release(Box::new(report)))
        }

        Commands::Config => Err(CliError::InvalidArguments(
            "config does not run pipeline stages".to_string(),
        )),
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(program) = &global.engine {
        config.engine.program.clone_from(program);
    }
    if global.pull {
        config.engine.pull = true;
    }
    if let Some(registry) = &global.registry {
        config.image.registry = Some(registry.clone());
    }
    if let Some(version) = &global.app_version {
        config.project.app_version = Some(version.clone());
    }
    if let Some(version) = &global.go_version {
        config.project.go_version = Some(version.clone());
    }
}

async fn resolve_source(source: &std::path::Path) -> Result<PathBuf, CliError> {
    tokio::fs::canonicalize(source).await.map_err(|e| {
        CliError::InvalidArguments(format!(
            "source directory {} is not accessible: {e}",
            source.display()
        ))
    })
}

fn registry_credentials(args: RegistryArgs) -> RegistryCredentials {
    RegistryCredentials::new(args.username, Secret::new(args.password))
}

fn oidc_credentials(args: OidcArgs) -> OidcCredentials {
    OidcCredentials {
        github_token: args.github_token.map(Secret::new),
        request_url: args.actions_id_token_request_url,
        request_token: args.actions_id_token_request_token.map(Secret::new),
    }
}

fn env_filter(debug_enabled: bool) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_enabled {
            tracing_subscriber::EnvFilter::new(
                "info,hrel=debug,hrel_pipeline=debug,hrel_engine=debug,hrel_config=debug",
            )
        } else {
            tracing_subscriber::EnvFilter::new("info")
        }
    })
}

/// Initialize tracing; logs go to stderr so stdout stays parseable
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter(debug_enabled))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(debug_enabled)
            .with_env_filter(env_filter(debug_enabled))
            .init();
    }
}
