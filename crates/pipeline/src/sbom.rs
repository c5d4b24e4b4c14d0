//! SBOM generation using Syft

use hrel_engine::ContainerSpec;
use hrel_errors::{Error, SbomError};
use hrel_events::{EventEmitter, Stage};
use hrel_types::Target;
use std::path::{Path, PathBuf};

use crate::project::ProjectInfo;
use crate::Pipeline;

/// Syft container scanning one archive into `<archive>.sbom.json`
#[must_use]
pub fn sbom_spec(
    syft_image: &str,
    format: &str,
    archive_dir: &Path,
    sbom_dir: &Path,
    archive: &str,
    sbom: &str,
) -> ContainerSpec {
    ContainerSpec::from(syft_image)
        .mount_read_only(archive_dir, "/input")
        .mount(sbom_dir, "/out")
        .exec([
            format!("/input/{archive}"),
            "-o".to_string(),
            format!("{format}=/out/{sbom}"),
        ])
}

impl Pipeline {
    /// Generate one SBOM per release archive into `<dist>/sbom`
    ///
    /// # Errors
    ///
    /// Returns `SbomError::EmptyDist` when nothing has been built yet, or
    /// `SbomError::GenerationFailed` when syft fails for an archive.
    pub async fn sbom(&self, info: &ProjectInfo) -> Result<Vec<PathBuf>, Error> {
        let targets = self.config().targets();
        self.stage(Stage::Sbom, &targets, self.generate_sboms(info, &targets))
            .await
    }

    async fn generate_sboms(
        &self,
        info: &ProjectInfo,
        targets: &[Target],
    ) -> Result<Vec<PathBuf>, Error> {
        let dist = self.dist_dir();
        ensure_not_empty(&dist).await?;

        let archive_dir = dist.join("archive");
        let sbom_dir = dist.join("sbom");
        tokio::fs::create_dir_all(&sbom_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &sbom_dir))?;

        let names = info.names();
        let settings = &self.config().sbom;
        let mut sboms = Vec::with_capacity(targets.len());

        for target in targets {
            let archive = names.archive(target);
            if !tokio::fs::try_exists(archive_dir.join(&archive))
                .await
                .unwrap_or(false)
            {
                return Err(SbomError::MissingArchive { archive }.into());
            }

            let sbom = names.sbom(target);
            let spec = sbom_spec(
                &settings.syft_image,
                &settings.format,
                &archive_dir,
                &sbom_dir,
                &archive,
                &sbom,
            );

            self.engine
                .run(&self.ctx, &spec)
                .await
                .map_err(|e| SbomError::GenerationFailed {
                    archive: archive.clone(),
                    message: e.to_string(),
                })?;

            let path = sbom_dir.join(&sbom);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(SbomError::GenerationFailed {
                    archive,
                    message: format!("syft did not write {sbom}"),
                }
                .into());
            }

            self.emit_artifact(Stage::Sbom, Some(*target), &path);
            sboms.push(path);
        }

        Ok(sboms)
    }
}

/// The dist directory must exist and hold at least one entry
async fn ensure_not_empty(dist: &Path) -> Result<(), SbomError> {
    let empty = || SbomError::EmptyDist {
        path: dist.display().to_string(),
    };

    let mut entries = match tokio::fs::read_dir(dist).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(empty()),
        Err(e) => {
            return Err(SbomError::UnreadableDist {
                path: dist.display().to_string(),
                message: e.to_string(),
            })
        }
    };

    match entries.next_entry().await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(empty()),
        Err(e) => Err(SbomError::UnreadableDist {
            path: dist.display().to_string(),
            message: e.to_string(),
        }),
    }
}
