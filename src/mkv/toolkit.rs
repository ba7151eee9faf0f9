use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::config::ToolsConfig;
use crate::error::{Result, SubmuxError};
use super::{ConvertedSubtitle, MkvToolkit, ToolCommand, TrackDescriptor, TrackSpec};

/// Concrete toolkit implementation driving mkvmerge and mkvextract
pub struct MkvmergeToolkit {
    config: ToolsConfig,
}

impl MkvmergeToolkit {
    pub fn new(config: ToolsConfig) -> Self {
        Self { config }
    }
}

/// `mkvmerge -J` identify output, reduced to the fields we consume
#[derive(Debug, Deserialize)]
struct IdentifyOutput {
    #[serde(default)]
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: u64,
    #[serde(rename = "type")]
    track_type: String,
    codec: String,
    #[serde(default)]
    properties: RawTrackProperties,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrackProperties {
    codec_id: Option<String>,
    language: Option<String>,
}

impl From<RawTrack> for TrackDescriptor {
    fn from(raw: RawTrack) -> Self {
        Self {
            id: raw.id,
            track_type: raw.track_type,
            codec: raw.codec,
            codec_id: raw.properties.codec_id.unwrap_or_default(),
            language: raw.properties.language,
        }
    }
}

/// Parse the JSON identify output of `mkvmerge -J`
pub fn parse_identify_output(json: &str) -> Result<Vec<TrackDescriptor>> {
    let identify: IdentifyOutput = serde_json::from_str(json)?;
    Ok(identify.tracks.into_iter().map(TrackDescriptor::from).collect())
}

#[async_trait]
impl MkvToolkit for MkvmergeToolkit {
    async fn identify(&self, file: &Path) -> Result<Vec<TrackDescriptor>> {
        info!("Inspecting container file {}", file.display());

        let output = ToolCommand::new(&self.config.mkvmerge_path, "Container inspection")
            .arg("-J")
            .path_arg(file)
            .run()
            .await?;

        if !output.success() {
            return Err(SubmuxError::Inspect(format!(
                "mkvmerge -J exited with {:?} for {}",
                output.code,
                file.display()
            )));
        }

        parse_identify_output(&output.stdout)
    }

    async fn extract_tracks(&self, file: &Path, specs: &[TrackSpec]) -> Result<()> {
        info!("Extracting {} subtitle tracks from file {}", specs.len(), file.display());

        let mut command = ToolCommand::new(&self.config.mkvextract_path, "Track extraction")
            .path_arg(file)
            .arg("tracks");
        for spec in specs {
            command = command.arg(format!("{}:{}", spec.track_id, spec.artifact.display()));
        }

        let output = command.run().await?;
        if !output.success() {
            return Err(SubmuxError::Extract(format!(
                "mkvextract exited with {:?} for {}, check stdout and stderr",
                output.code,
                file.display()
            )));
        }

        info!("Extracted subtitles from file {}", file.display());
        Ok(())
    }

    async fn merge(
        &self,
        file: &Path,
        subtitles: &[ConvertedSubtitle],
        output: &Path,
    ) -> Result<()> {
        info!(
            "Muxing file {} with {} converted subtitle tracks into {}",
            file.display(),
            subtitles.len(),
            output.display()
        );

        let mut command = ToolCommand::new(&self.config.mkvmerge_path, "Remux")
            .arg("-o")
            .path_arg(output)
            .path_arg(file);
        for subtitle in subtitles {
            if let Some(language) = &subtitle.language {
                command = command.arg("--language").arg(format!("0:{}", language));
            }
            command = command.path_arg(&subtitle.path);
        }

        let result = command.run().await?;
        // mkvmerge exits 1 when it finished with warnings; only 2+ is a failure
        match result.code {
            Some(0) => {
                info!("Muxed file {} into {}", file.display(), output.display());
                Ok(())
            }
            Some(1) => {
                warn!("mkvmerge finished with warnings for {}", file.display());
                Ok(())
            }
            code => Err(SubmuxError::Mux(format!(
                "mkvmerge exited with {:?} for {}, check stdout and stderr",
                code,
                file.display()
            ))),
        }
    }

    fn check_availability(&self) -> Result<()> {
        for binary in [&self.config.mkvmerge_path, &self.config.mkvextract_path] {
            let output = std::process::Command::new(binary)
                .arg("--version")
                .output()
                .map_err(|e| SubmuxError::Config(format!("{} not available: {}", binary, e)))?;

            if !output.status.success() {
                return Err(SubmuxError::Config(format!("{} version check failed", binary)));
            }
        }

        info!("mkvtoolnix binaries are available");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTIFY_FIXTURE: &str = r#"{
        "container": {"recognized": true, "supported": true, "type": "Matroska"},
        "tracks": [
            {
                "id": 0,
                "type": "video",
                "codec": "MPEG-4p10/AVC/H.264",
                "properties": {"codec_id": "V_MPEG4/ISO/AVC", "language": "und"}
            },
            {
                "id": 1,
                "type": "audio",
                "codec": "AC-3",
                "properties": {"codec_id": "A_AC3", "language": "eng"}
            },
            {
                "id": 2,
                "type": "subtitles",
                "codec": "HDMV PGS",
                "properties": {"codec_id": "S_HDMV/PGS", "language": "eng"}
            },
            {
                "id": 3,
                "type": "subtitles",
                "codec": "HDMV PGS",
                "properties": {"codec_id": "S_HDMV/PGS", "language": "ger"}
            }
        ]
    }"#;

    #[test]
    fn parses_identify_output() {
        let tracks = parse_identify_output(IDENTIFY_FIXTURE).unwrap();
        assert_eq!(tracks.len(), 4);

        let pgs = &tracks[2];
        assert_eq!(pgs.id, 2);
        assert_eq!(pgs.track_type, "subtitles");
        assert_eq!(pgs.codec, "HDMV PGS");
        assert_eq!(pgs.codec_id, "S_HDMV/PGS");
        assert_eq!(pgs.language.as_deref(), Some("eng"));
    }

    #[test]
    fn tolerates_missing_properties() {
        let json = r#"{"tracks": [{"id": 0, "type": "subtitles", "codec": "VobSub"}]}"#;
        let tracks = parse_identify_output(json).unwrap();
        assert_eq!(tracks[0].codec_id, "");
        assert!(tracks[0].language.is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_identify_output("not json").is_err());
    }
}
