use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubmuxError};

// Default values for job configuration
fn default_max_concurrency() -> usize {
    4
}

fn default_remove_original() -> bool {
    false
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub tools: ToolsConfig,
    pub subtitles: SubtitleConfig,
    pub scan: ScanConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the mkvextract binary
    pub mkvextract_path: String,
    /// Path to the mkvmerge binary (inspection and remuxing)
    pub mkvmerge_path: String,
    /// Path to the java binary running the converter
    pub java_path: String,
    /// Path to the BDSup2Sub jar
    pub converter_jar: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// Codec names and codec ids already in the target format.
    /// A file carrying any of these in a subtitle track is skipped whole.
    pub target_formats: Vec<String>,
    /// Extension of the converted index file
    pub output_extension: String,
    /// Extension of the paired sidecar data file
    pub sidecar_extension: String,
    /// Case-insensitive marker the converter prints on internal errors
    pub error_marker: String,
    /// Shared directory for extraction and conversion temporaries
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Substring marking a container file name
    pub container_extension: String,
    /// Suffix of merged output files, also used for sibling detection
    pub merged_suffix: String,
    /// Paths containing any of these substrings are skipped
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Concurrency ceiling for in-flight work units
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Delete the original file after a successful remux
    #[serde(default = "default_remove_original")]
    pub remove_original: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig {
                mkvextract_path: "/usr/bin/mkvextract".to_string(),
                mkvmerge_path: "/usr/bin/mkvmerge".to_string(),
                java_path: "java".to_string(),
                converter_jar: "/opt/BDSup2Sub.jar".to_string(),
            },
            subtitles: SubtitleConfig {
                target_formats: vec!["S_VOBSUB".to_string(), "VobSub".to_string()],
                output_extension: ".idx".to_string(),
                sidecar_extension: ".sub".to_string(),
                error_marker: "error".to_string(),
                temp_dir: PathBuf::from("/tmp/subtitles"),
            },
            scan: ScanConfig {
                container_extension: ".mkv".to_string(),
                merged_suffix: "-merged.mkv".to_string(),
                exclude_patterns: Vec::new(),
            },
            jobs: JobsConfig {
                max_concurrency: default_max_concurrency(),
                remove_original: default_remove_original(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubmuxError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubmuxError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubmuxError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubmuxError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.subtitles.target_formats, vec!["S_VOBSUB", "VobSub"]);
        assert_eq!(config.scan.container_extension, ".mkv");
        assert_eq!(config.scan.merged_suffix, "-merged.mkv");
        assert_eq!(config.jobs.max_concurrency, 4);
        assert!(!config.jobs.remove_original);
        assert_eq!(config.subtitles.error_marker, "error");
    }

    #[test]
    fn roundtrips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.jobs.max_concurrency = 8;
        config.scan.exclude_patterns = vec!["/samples/".to_string()];
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.jobs.max_concurrency, 8);
        assert_eq!(loaded.scan.exclude_patterns, vec!["/samples/"]);
        assert_eq!(loaded.tools.mkvmerge_path, config.tools.mkvmerge_path);
    }

    #[test]
    fn job_settings_fall_back_to_defaults() {
        let partial = r#"
            [tools]
            mkvextract_path = "/usr/bin/mkvextract"
            mkvmerge_path = "/usr/bin/mkvmerge"
            java_path = "java"
            converter_jar = "/opt/BDSup2Sub.jar"

            [subtitles]
            target_formats = ["S_VOBSUB"]
            output_extension = ".idx"
            sidecar_extension = ".sub"
            error_marker = "error"
            temp_dir = "/tmp/subtitles"

            [scan]
            container_extension = ".mkv"
            merged_suffix = "-merged.mkv"
            exclude_patterns = []

            [jobs]
        "#;

        let config: Config = toml::from_str(partial).unwrap();
        assert_eq!(config.jobs.max_concurrency, 4);
        assert!(!config.jobs.remove_original);
    }
}
