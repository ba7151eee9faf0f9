use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::convert::{ConverterFactory, SubtitleConverter};
use crate::error::{Result, SubmuxError};
use crate::mkv::{
    ConvertedSubtitle, MkvToolkit, MkvToolkitFactory, TrackDescriptor, TrackSpec,
    SUBTITLE_TRACK_TYPE,
};
use crate::scanner::WorkUnit;
use crate::scheduler::{JobOutcome, UnitProcessor};

/// Per-file subtitle pipeline: inspect, extract, convert, remux, clean up.
///
/// Each stage talks to an external tool through a trait seam; any stage
/// error is absorbed at the unit boundary and becomes a Failed outcome for
/// that file only.
pub struct SubtitlePipeline {
    config: Config,
    toolkit: Box<dyn MkvToolkit>,
    converter: Box<dyn SubtitleConverter>,
}

impl SubtitlePipeline {
    pub fn new(config: Config) -> Result<Self> {
        let toolkit = MkvToolkitFactory::create_toolkit(config.tools.clone());
        let converter =
            ConverterFactory::create_converter(config.tools.clone(), config.subtitles.clone());

        toolkit.check_availability()?;

        Ok(Self {
            config,
            toolkit,
            converter,
        })
    }

    /// Construct with explicit collaborators
    pub fn with_components(
        config: Config,
        toolkit: Box<dyn MkvToolkit>,
        converter: Box<dyn SubtitleConverter>,
    ) -> Self {
        Self {
            config,
            toolkit,
            converter,
        }
    }

    async fn run(&self, unit: &WorkUnit) -> Result<JobOutcome> {
        let file = unit.path.as_path();

        let tracks = self.toolkit.identify(file).await?;
        let eligible = eligible_subtitle_tracks(&tracks, &self.config.subtitles.target_formats);
        if eligible.is_empty() {
            info!("No subtitles to convert in file {}", file.display());
            return Ok(JobOutcome::Skipped);
        }
        info!(
            "Found {} suitable subtitle tracks in file {}",
            eligible.len(),
            file.display()
        );

        let digest = path_digest(file);
        let specs = self.extraction_plan(&digest, &eligible);

        // Shared across concurrently running units; create-if-absent.
        tokio::fs::create_dir_all(&self.config.subtitles.temp_dir).await?;
        self.toolkit.extract_tracks(file, &specs).await?;

        let mut converted = Vec::new();
        for (track, spec) in eligible.iter().zip(specs.iter()) {
            match self.converter.convert(&spec.artifact).await {
                Ok(path) => converted.push(ConvertedSubtitle {
                    path,
                    language: track.language.clone(),
                }),
                Err(e) => warn!(
                    "Conversion of track {} in {} failed, continuing without it: {}",
                    track.id,
                    file.display(),
                    e
                ),
            }
        }
        if converted.is_empty() {
            return Err(SubmuxError::Convert(format!(
                "no subtitle track of {} survived conversion",
                file.display()
            )));
        }

        let output = merged_output_path(
            file,
            &self.config.scan.container_extension,
            &self.config.scan.merged_suffix,
        )?;
        let mux_result = self.toolkit.merge(file, &converted, &output).await;

        // Converted artifacts are unit-owned temporaries; remove them whether
        // or not the remux went through.
        self.cleanup_artifacts(&converted).await;
        mux_result?;

        if self.config.jobs.remove_original {
            tokio::fs::remove_file(file).await?;
            warn!("Removed original file {}", file.display());
        }

        Ok(JobOutcome::Completed)
    }

    fn extraction_plan(&self, digest: &str, tracks: &[TrackDescriptor]) -> Vec<TrackSpec> {
        tracks
            .iter()
            .map(|track| TrackSpec {
                track_id: track.id,
                artifact: self
                    .config
                    .subtitles
                    .temp_dir
                    .join(format!("{}-{}", digest, track.id)),
            })
            .collect()
    }

    async fn cleanup_artifacts(&self, converted: &[ConvertedSubtitle]) {
        warn!("Removing converted subtitle artifacts");
        for subtitle in converted {
            remove_logged(&subtitle.path).await;

            if let Some(sidecar) = sidecar_path(
                &subtitle.path,
                &self.config.subtitles.output_extension,
                &self.config.subtitles.sidecar_extension,
            ) {
                remove_logged(&sidecar).await;
            }
        }
    }
}

#[async_trait]
impl UnitProcessor for SubtitlePipeline {
    async fn process(&self, unit: &WorkUnit) -> JobOutcome {
        match self.run(unit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Processing {} failed: {}", unit.path.display(), e);
                JobOutcome::Failed(e.to_string())
            }
        }
    }
}

async fn remove_logged(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => warn!("Removed subtitle artifact {}", path.display()),
        Err(e) => error!(
            "Failed to remove subtitle artifact {}: {}",
            path.display(),
            e
        ),
    }
}

/// Subtitle tracks worth converting. Returns an empty list when any
/// subtitle track already carries a target-format codec: the whole file is
/// treated as done, not just that track.
pub fn eligible_subtitle_tracks(
    tracks: &[TrackDescriptor],
    target_formats: &[String],
) -> Vec<TrackDescriptor> {
    let mut eligible = Vec::new();

    for track in tracks {
        if track.track_type != SUBTITLE_TRACK_TYPE {
            continue;
        }
        if target_formats
            .iter()
            .any(|format| format == &track.codec || format == &track.codec_id)
        {
            info!("File already has {} subtitles", target_formats.join("/"));
            return Vec::new();
        }
        eligible.push(track.clone());
    }

    eligible
}

/// Stable digest of the file path, used to namespace temp artifacts so
/// concurrent units never collide
pub fn path_digest(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.to_string_lossy().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Output path of the merged container: the extension marker in the file
/// name replaced with the merged suffix
pub fn merged_output_path(
    file: &Path,
    container_extension: &str,
    merged_suffix: &str,
) -> Result<PathBuf> {
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SubmuxError::Mux(format!("invalid container file name: {}", file.display())))?;

    Ok(file.with_file_name(name.replace(container_extension, merged_suffix)))
}

fn sidecar_path(converted: &Path, output_extension: &str, sidecar_extension: &str) -> Option<PathBuf> {
    let name = converted.file_name()?.to_str()?;
    let stem = name.strip_suffix(output_extension)?;
    Some(converted.with_file_name(format!("{}{}", stem, sidecar_extension)))
}
