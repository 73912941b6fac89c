// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line options.

use std::path::PathBuf;

use clap::Parser;

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "hookwire_demo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drive a scripted scene through hookwire listeners", long_about = None)]
#[command(after_help = "Set RUST_LOG to adjust logging, e.g. RUST_LOG=hookwire_core=trace")]
pub struct Cli {
    /// Runtime settings file (RON)
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Listener file (RON) replacing the built-in listeners
    #[arg(long, value_name = "PATH")]
    pub listeners: Option<PathBuf>,

    /// Write the listeners in use to a RON file
    #[arg(long, value_name = "PATH")]
    pub save_listeners: Option<PathBuf>,

    /// Print the method catalog as JSON and exit
    #[arg(long)]
    pub catalog_json: bool,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 6)]
    pub frames: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("hookwire_demo").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.settings, None);
        assert_eq!(cli.listeners, None);
        assert!(!cli.catalog_json);
        assert_eq!(cli.frames, 6);
    }

    #[test]
    fn test_all_options() {
        let cli = parse(&[
            "--settings",
            "settings.ron",
            "--listeners",
            "demos/doors.ron",
            "--save-listeners",
            "out.ron",
            "--catalog-json",
            "--frames",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("settings.ron")));
        assert_eq!(cli.listeners, Some(PathBuf::from("demos/doors.ron")));
        assert_eq!(cli.save_listeners, Some(PathBuf::from("out.ron")));
        assert!(cli.catalog_json);
        assert_eq!(cli.frames, 10);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse(&["--settings"]).unwrap_err().kind(), ErrorKind::InvalidValue);
        assert_eq!(parse(&["--frames", "many"]).unwrap_err().kind(), ErrorKind::ValueValidation);
        assert_eq!(parse(&["--verbose"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
    }
}
