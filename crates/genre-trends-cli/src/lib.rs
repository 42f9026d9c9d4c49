//! Shared CLI definitions for genre-trends.
//!
//! Used by the main application and by the build script (manpage).

use clap::Parser;
use std::path::PathBuf;

/// Dataset opened when no path is given on the command line.
pub const DEFAULT_DATA_FILE: &str = "music_genres_summary.csv";

/// Command-line arguments for genre-trends
#[derive(Clone, Parser, Debug)]
#[command(
    name = "genre-trends",
    version,
    about = "Explore music genre popularity over time in the terminal",
    long_about = "Loads a CSV of (genre, year, popularity) rows, filters it by a genre \
selection and a year range, shows the result as an editable year-by-genre table \
and draws one popularity line per genre."
)]
pub struct Args {
    /// CSV file with `genre`, `year` and `popularity` columns.
    /// Falls back to the `[data] path` config value, then to music_genres_summary.csv
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Specify the delimiter to use when reading the file
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Specify that the file has no header
    #[arg(long = "no-header", action)]
    pub no_header: bool,

    /// Load the file once and reuse it instead of re-reading it on every selection change
    #[arg(long = "snapshot", action)]
    pub snapshot: bool,

    /// Write the chart for the default selection to this file (.png or .svg) and exit
    #[arg(long = "export", value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data (log files) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/genre-trends/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

impl Args {
    /// Path of the dataset: CLI argument, then config value, then the default file name.
    pub fn resolve_path(&self, configured: Option<&PathBuf>) -> PathBuf {
        self.path
            .clone()
            .or_else(|| configured.cloned())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let args = Args::parse_from(["genre-trends"]);
        assert_eq!(args.resolve_path(None), PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn test_cli_path_wins_over_config() {
        let args = Args::parse_from(["genre-trends", "other.csv"]);
        let configured = PathBuf::from("from_config.csv");
        assert_eq!(
            args.resolve_path(Some(&configured)),
            PathBuf::from("other.csv")
        );
    }

    #[test]
    fn test_config_path_used_when_no_argument() {
        let args = Args::parse_from(["genre-trends", "--snapshot"]);
        let configured = PathBuf::from("from_config.csv");
        assert!(args.snapshot);
        assert_eq!(args.resolve_path(Some(&configured)), configured);
    }

    #[test]
    fn test_force_requires_generate_config() {
        assert!(Args::try_parse_from(["genre-trends", "--force"]).is_err());
        assert!(Args::try_parse_from(["genre-trends", "--generate-config", "--force"]).is_ok());
    }
}
