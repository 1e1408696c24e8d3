//! CLI module for PersonaLearn.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// PersonaLearn - supplementary videos for confusing lecture moments
///
/// Transcribes a lecture, finds the parts a learner struggled with and
/// suggests YouTube videos that explain them differently.
#[derive(Parser, Debug)]
#[command(name = "personalearn")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP recommendation server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Recommend videos for the confusing moments of a lecture
    Recommend {
        /// YouTube URL or video ID
        video: String,

        /// JSON file with comprehension points ([{"timestamp": 12.0, "comprehension": -0.8}])
        #[arg(long, conflicts_with = "at")]
        points: Option<String>,

        /// Confusion timestamps in seconds (each treated as fully confused)
        #[arg(long, num_args = 1..)]
        at: Vec<f64>,
    },

    /// Transcribe a video into the cache and print its SRT
    Transcribe {
        /// YouTube URL or video ID
        video: String,

        /// Write the SRT to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the transcript text between two timestamps
    Excerpt {
        /// YouTube URL or video ID
        video: String,

        /// Start time in seconds
        #[arg(allow_negative_numbers = true)]
        start: f64,

        /// End time in seconds
        #[arg(allow_negative_numbers = true)]
        end: f64,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend_with_timestamps() {
        let cli = Cli::parse_from(["personalearn", "-vv", "recommend", "abcdefghijk", "--at", "12.5", "40"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Recommend { video, points, at } => {
                assert_eq!(video, "abcdefghijk");
                assert!(points.is_none());
                assert_eq!(at, vec![12.5, 40.0]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_points_conflicts_with_at() {
        let result = Cli::try_parse_from([
            "personalearn",
            "recommend",
            "abcdefghijk",
            "--points",
            "points.json",
            "--at",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_excerpt_negative_start() {
        let cli = Cli::parse_from(["personalearn", "excerpt", "abcdefghijk", "-2", "3"]);
        match cli.command {
            Commands::Excerpt { start, end, .. } => assert_eq!((start, end), (-2.0, 3.0)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults_to_settings() {
        let cli = Cli::parse_from(["personalearn", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
