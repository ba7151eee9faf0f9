use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{SubtitleConfig, ToolsConfig};
use crate::error::{Result, SubmuxError};
use crate::mkv::ToolCommand;

/// Main trait for per-track subtitle conversion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubtitleConverter: Send + Sync {
    /// Convert one raw subtitle artifact, returning the converted path.
    /// The raw artifact is deleted on success.
    async fn convert(&self, input: &Path) -> Result<PathBuf>;
}

/// Factory for creating converter instances
pub struct ConverterFactory;

impl ConverterFactory {
    /// Create the default converter implementation (BDSup2Sub-based)
    pub fn create_converter(
        tools: ToolsConfig,
        subtitles: SubtitleConfig,
    ) -> Box<dyn SubtitleConverter> {
        Box::new(BdSup2SubConverter::new(tools, subtitles))
    }
}

/// BDSup2Sub invoked through java, one subtitle track per call
pub struct BdSup2SubConverter {
    tools: ToolsConfig,
    subtitles: SubtitleConfig,
}

impl BdSup2SubConverter {
    pub fn new(tools: ToolsConfig, subtitles: SubtitleConfig) -> Self {
        Self { tools, subtitles }
    }

    fn output_path(&self, input: &Path) -> PathBuf {
        PathBuf::from(format!(
            "{}{}",
            input.display(),
            self.subtitles.output_extension
        ))
    }
}

#[async_trait]
impl SubtitleConverter for BdSup2SubConverter {
    async fn convert(&self, input: &Path) -> Result<PathBuf> {
        let output = self.output_path(input);
        info!("Converting subtitle {}", input.display());

        let result = ToolCommand::new(&self.tools.java_path, "Subtitle conversion")
            .arg("-jar")
            .arg(&self.tools.converter_jar)
            .arg("-o")
            .path_arg(&output)
            .path_arg(input)
            .run()
            .await?;

        if !conversion_succeeded(result.code, &result.stdout, &self.subtitles.error_marker) {
            return Err(SubmuxError::Convert(format!(
                "conversion of {} failed with code {:?}, check stdout and stderr",
                input.display(),
                result.code
            )));
        }

        info!("Converted subtitle {} to {}", input.display(), output.display());
        tokio::fs::remove_file(input).await?;
        warn!("Removed raw subtitle artifact {}", input.display());

        Ok(output)
    }
}

/// Exit code alone is not enough: the converter can exit 0 while reporting
/// an internal error in its output.
pub fn conversion_succeeded(code: Option<i32>, stdout: &str, error_marker: &str) -> bool {
    code == Some(0) && !stdout.to_lowercase().contains(&error_marker.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_zero_with_clean_output_succeeds() {
        assert!(conversion_succeeded(Some(0), "exporting /tmp/x.idx\ndone", "error"));
    }

    #[test]
    fn nonzero_exit_fails() {
        assert!(!conversion_succeeded(Some(1), "", "error"));
        assert!(!conversion_succeeded(None, "", "error"));
    }

    #[test]
    fn error_marker_in_stdout_fails_despite_exit_zero() {
        assert!(!conversion_succeeded(Some(0), "ERROR: unsupported palette", "error"));
        assert!(!conversion_succeeded(Some(0), "an Error occurred", "error"));
    }

    #[test]
    fn converted_path_appends_output_extension() {
        let converter = BdSup2SubConverter::new(
            crate::config::Config::default().tools,
            crate::config::Config::default().subtitles,
        );
        let output = converter.output_path(Path::new("/tmp/subtitles/abc-2"));
        assert_eq!(output, PathBuf::from("/tmp/subtitles/abc-2.idx"));
    }
}
