// SPDX-License-Identifier: MIT
//
// Command-line configuration.
//
// Everything the editor can be told at startup comes from argv. There is
// no config file: the editor has no persistent state to configure.

use std::path::PathBuf;

use clap::Parser;
use rowed_syntax::Colorer;
use rowed_term::terminal::Size;

/// Edit text inline in the terminal.
///
/// Ctrl-D or Ctrl-C ends the session. The final text is printed to stdout
/// when stdout is redirected.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "rowed", version)]
pub struct Config {
    /// Initial colorer (none, cpp). Ctrl-T cycles it.
    #[arg(long, value_name = "NAME", default_value_t = Colorer::default())]
    pub syntax: Colorer,

    /// Write a trace log to this file (filter: ROWED_LOG).
    #[arg(long = "log", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Width to assume if the terminal size is unknown.
    #[arg(
        long,
        value_name = "N",
        default_value_t = Size::DEFAULT.cols,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub cols: u16,

    /// Height to assume if the terminal size is unknown.
    #[arg(
        long,
        value_name = "N",
        default_value_t = Size::DEFAULT.rows,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub rows: u16,
}

impl Config {
    /// Size used when the window size can't be queried.
    pub const fn fallback_size(&self) -> Size {
        Size {
            cols: self.cols,
            rows: self.rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        Config::try_parse_from(std::iter::once("rowed").chain(args.iter().copied()))
    }

    fn error_kind(args: &[&str]) -> ErrorKind {
        match parse(args) {
            Ok(config) => panic!("expected an error, got {config:?}"),
            Err(e) => e.kind(),
        }
    }

    #[test]
    fn command_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn no_args_is_default() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.syntax, Colorer::Cpp);
        assert_eq!(config.log_file, None);
        assert_eq!(config.fallback_size(), Size::DEFAULT);
    }

    #[test]
    fn help_is_reported() {
        assert_eq!(error_kind(&["--syntax", "none", "-h"]), ErrorKind::DisplayHelp);
        assert_eq!(error_kind(&["--help"]), ErrorKind::DisplayHelp);
    }

    #[test]
    fn syntax_separate_and_inline() {
        assert_eq!(parse(&["--syntax", "none"]).unwrap().syntax, Colorer::None);
        assert_eq!(parse(&["--syntax=NONE"]).unwrap().syntax, Colorer::None);
    }

    #[test]
    fn unknown_syntax() {
        assert_eq!(error_kind(&["--syntax", "cobol"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn log_path() {
        let config = parse(&["--log", "/tmp/rowed.log"]).unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/rowed.log")));
    }

    #[test]
    fn fallback_size() {
        let config = parse(&["--cols=132", "--rows", "50"]).unwrap();
        assert_eq!(config.fallback_size(), Size { cols: 132, rows: 50 });
    }

    #[test]
    fn zero_dimension_rejected() {
        assert_eq!(error_kind(&["--cols", "0"]), ErrorKind::ValueValidation);
        assert_eq!(error_kind(&["--rows=0"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn missing_value() {
        assert!(parse(&["--log"]).is_err());
    }

    #[test]
    fn unknown_argument() {
        assert_eq!(error_kind(&["notes.txt"]), ErrorKind::UnknownArgument);
    }
}
