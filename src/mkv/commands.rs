use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::Result;

/// Captured result of one external tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Abstract external tool command representation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl ToolCommand {
    /// Create a new tool command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add a path argument
    pub fn path_arg<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Run the command to completion, capturing exit status and output.
    /// Captured stdout is relayed to the log at info, stderr at error.
    pub async fn run(&self) -> Result<ToolOutput> {
        debug!("Executing {}: {} {:?}", self.description, self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await?;

        let result = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.stdout.is_empty() {
            info!("{} stdout: {}", self.description, result.stdout.trim_end());
        }
        if !result.stderr.is_empty() {
            error!("{} stderr: {}", self.description, result.stderr.trim_end());
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_argument_list_in_order() {
        let cmd = ToolCommand::new("mkvextract", "Track extraction")
            .path_arg("/media/movie.mkv")
            .arg("tracks")
            .args(["2:/tmp/a", "3:/tmp/b"]);

        assert_eq!(cmd.binary_path, "mkvextract");
        assert_eq!(cmd.args, vec!["/media/movie.mkv", "tracks", "2:/tmp/a", "3:/tmp/b"]);
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let cmd = ToolCommand::new("/nonexistent/submux-test-binary", "Version check");
        assert!(cmd.run().await.is_err());
    }
}
