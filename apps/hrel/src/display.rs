//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use console::{Style, Term};
use hrel_pipeline::ReleaseReport;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};

/// What a command produced
#[derive(Debug)]
pub enum CommandOutcome {
    /// Files written under the dist directory
    Artifacts {
        kind: &'static str,
        paths: Vec<PathBuf>,
    },
    /// Pushed image addresses pinned to a digest
    Published(Vec<String>),
    /// Cosign output for a signed address
    Signed { address: String, output: String },
    Release(Box<ReleaseReport>),
    /// Effective configuration rendered as TOML
    Config(String),
}

impl CommandOutcome {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Artifacts { kind, paths } => json!({
                "kind": kind,
                "paths": display_paths(paths),
            }),
            Self::Published(addresses) => json!({ "addresses": addresses }),
            Self::Signed { address, output } => json!({
                "address": address,
                "output": output,
            }),
            Self::Release(report) => json!({
                "app_version": report.info.app_version,
                "go_version": report.info.go_version,
                "git_commit": report.info.git_commit,
                "binaries": display_paths(&report.binaries),
                "archives": display_paths(&report.archives),
                "addresses": report.addresses,
                "signed": report.signed,
                "sboms": display_paths(&report.sboms),
            }),
            Self::Config(toml) => json!({ "config": toml }),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    json_output: bool,
    colors: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            colors: Term::stdout().features().colors_supported(),
        }
    }

    /// Render a command result
    pub fn render(&self, outcome: &CommandOutcome) -> io::Result<()> {
        if self.json_output {
            let json =
                serde_json::to_string_pretty(&outcome.to_json()).map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match outcome {
            CommandOutcome::Artifacts { kind, paths } => self.render_artifacts(kind, paths),
            CommandOutcome::Published(addresses) => {
                for address in addresses {
                    println!("{} {address}", self.ok("published"));
                }
            }
            CommandOutcome::Signed { address, output } => {
                if !output.trim().is_empty() {
                    println!("{}", output.trim_end());
                }
                println!("{} {address}", self.ok("signed"));
            }
            CommandOutcome::Release(report) => self.render_release(report),
            CommandOutcome::Config(toml) => print!("{toml}"),
        }
        Ok(())
    }

    fn render_artifacts(&self, kind: &str, paths: &[PathBuf]) {
        if paths.is_empty() {
            println!("No {kind} produced.");
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new(capitalize(kind)).add_attribute(Attribute::Bold),
            Cell::new("Path").add_attribute(Attribute::Bold),
        ]);
        for path in paths {
            table.add_row(vec![Cell::new(file_name(path)), Cell::new(path.display())]);
        }
        println!("{table}");
    }

    fn render_release(&self, report: &ReleaseReport) {
        println!("Release Summary");
        println!();
        println!("Version:  {}", report.info.app_version);
        println!("Go:       {}", report.info.go_version);
        if !report.info.git_commit.is_empty() {
            println!("Commit:   {}", report.info.git_commit);
        }
        println!("Binaries: {}", report.binaries.len());
        println!("Archives: {}", report.archives.len());
        println!("SBOMs:    {}", report.sboms.len());
        println!();
        for address in &report.addresses {
            println!("{} {address}", self.ok("published"));
        }
        println!("{} {}", self.ok("signed"), report.signed);
    }

    fn ok(&self, label: &str) -> String {
        let text = format!("[{label}]");
        if self.colors {
            Style::new().green().bold().apply_to(text).to_string()
        } else {
            text
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrel_pipeline::ProjectInfo;

    #[test]
    fn artifacts_json_lists_paths() {
        let outcome = CommandOutcome::Artifacts {
            kind: "archives",
            paths: vec![PathBuf::from("dist/archive/harbor-cli_v1_linux_amd64.tar.gz")],
        };
        let value = outcome.to_json();
        assert_eq!(value["kind"], "archives");
        assert_eq!(
            value["paths"][0],
            "dist/archive/harbor-cli_v1_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn release_json_carries_signed_address() {
        let report = ReleaseReport {
            info: ProjectInfo {
                name: "harbor-cli".to_string(),
                app_version: "v1.0.0".to_string(),
                go_version: "1.24.2".to_string(),
                git_commit: "abc1234".to_string(),
                build_time: "2025-01-01T00:00:00Z".to_string(),
            },
            binaries: vec![],
            archives: vec![],
            addresses: vec!["r.io/ns/cli:1.0.0@sha256:ff".to_string()],
            signed: "r.io/ns/cli:1.0.0@sha256:ff".to_string(),
            sboms: vec![],
        };
        let value = CommandOutcome::Release(Box::new(report)).to_json();
        assert_eq!(value["signed"], "r.io/ns/cli:1.0.0@sha256:ff");
        assert_eq!(value["app_version"], "v1.0.0");
        assert_eq!(value["addresses"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn capitalize_handles_empty() {
        assert_eq!(capitalize("binaries"), "Binaries");
        assert_eq!(capitalize(""), "");
    }
}
