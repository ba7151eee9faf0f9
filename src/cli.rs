use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Root directory to scan for container files
    pub input_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_exactly_one_input_directory() {
        assert!(Args::try_parse_from(["submux"]).is_err());
        assert!(Args::try_parse_from(["submux", "/media", "/other"]).is_err());

        let args = Args::try_parse_from(["submux", "/media"]).unwrap();
        assert_eq!(args.input_dir, PathBuf::from("/media"));
        assert!(!args.verbose);
        assert!(args.config.is_none());
    }
}
