// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::frame::FrameEncoding;
use crate::mode::Mode;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r"Examples:
    posefault inspect --recordings /data/recordings
    posefault inspect -r /data/recordings --test-exercise squat
    posefault show -r /data/recordings -s rec_01.json --frame 4 --mode limbs
    posefault show -r /data/recordings -s rec_01.json --save preview.png")]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize the sessions of a recording directory
    Inspect(InspectArgs),
    /// Derive and print one frame's region labels
    Show(ShowArgs),
}

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Recording directory holding the session metadata files
    #[arg(short, long)]
    pub recordings: PathBuf,

    /// Exercise identifier held out for the test split (repeatable)
    #[arg(long = "test-exercise")]
    pub test_exercises: Vec<String>,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

/// Arguments for the show command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Recording directory holding the session metadata files
    #[arg(short, long)]
    pub recordings: PathBuf,

    /// Session metadata file name within the recording directory
    #[arg(short, long)]
    pub session: String,

    /// Frame ordinal within the session
    #[arg(short, long, default_value_t = 0)]
    pub frame: usize,

    /// Label granularity (full-body, half-body, limbs, joints)
    #[arg(short, long, default_value_t = Mode::FullBody)]
    pub mode: Mode,

    /// Frame encoding (rgbd, rgbd-pose)
    #[arg(long, default_value_t = FrameEncoding::Rgbd)]
    pub encoding: FrameEncoding,

    /// Save a preview PNG of the loaded frame
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_inspect_args() {
        let args = Cli::parse_from([
            "posefault",
            "inspect",
            "--recordings",
            "/data/recordings",
            "--test-exercise",
            "squat",
            "--test-exercise",
            "lunge",
        ]);
        match args.command {
            Commands::Inspect(inspect) => {
                assert_eq!(inspect.recordings, PathBuf::from("/data/recordings"));
                assert_eq!(inspect.test_exercises, vec!["squat", "lunge"]);
                assert!(inspect.verbose);
            }
            Commands::Show(_) => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_show_args_defaults() {
        let args = Cli::parse_from([
            "posefault",
            "show",
            "--recordings",
            "/data/recordings",
            "--session",
            "rec_01.json",
        ]);
        match args.command {
            Commands::Show(show) => {
                assert_eq!(show.frame, 0);
                assert_eq!(show.mode, Mode::FullBody);
                assert_eq!(show.encoding, FrameEncoding::Rgbd);
                assert!(show.save.is_none());
            }
            Commands::Inspect(_) => panic!("expected show"),
        }
    }

    #[test]
    fn test_show_args_custom_mode() {
        let args = Cli::parse_from([
            "posefault",
            "show",
            "-r",
            "/data",
            "-s",
            "rec.json",
            "--mode",
            "limbs",
            "--encoding",
            "rgbd-pose",
        ]);
        match args.command {
            Commands::Show(show) => {
                assert_eq!(show.mode, Mode::Limbs);
                assert_eq!(show.encoding, FrameEncoding::RgbdPose);
            }
            Commands::Inspect(_) => panic!("expected show"),
        }
    }
}
