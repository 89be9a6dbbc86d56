// SPDX-License-Identifier: MIT
//
// rowed — an inline terminal line editor.
//
// This is the main binary that wires together the crates:
//
//   rowed-term   → tty, raw mode, escape output, key decoding, status bar
//   rowed-editor → the document and its incremental rendering
//   rowed-syntax → display-only token coloring
//
// The editor draws in place below the shell prompt. Each keypress flows
// through:
//
//   status refresh (CSI 6n round trip) → read_key → dispatch → document
//
// On Ctrl-D / Ctrl-C the terminal goes back to its original mode, the
// document is drawn one last time, and, if stdout is redirected, its text
// is written there too:
//
//   rowed > notes.txt

mod config;
mod error;
mod logging;
mod session;

use std::io::{self, IsTerminal, Write};
use std::process;

use clap::Parser;
use rowed_term::terminal::Terminal;
use tracing::error;

use crate::config::Config;
use crate::error::Error;
use crate::session::Session;

fn main() {
    let config = Config::parse();

    let log_guard = config.log_file.as_deref().map(logging::init);

    let result = run(&config);
    if let Err(e) = &result {
        error!(error = %e, "session failed");
    }
    drop(log_guard);

    if let Err(e) = result {
        eprintln!("rowed: {e}");
        process::exit(1);
    }
}

/// Run one editing session. The terminal is restored before this returns,
/// on every path.
fn run(config: &Config) -> Result<(), Error> {
    let mut terminal = Terminal::open()?.with_fallback_size(config.fallback_size());
    terminal.enter_raw_mode()?;

    let mut session = Session::new(terminal, config.syntax);
    session.start()?;
    session.run()?;

    session.channel_mut().restore()?;

    let stdout = io::stdout();
    if stdout.is_terminal() {
        session.finish(None)?;
    } else {
        let mut lock = stdout.lock();
        let mirror: &mut dyn Write = &mut lock;
        session.finish(Some(mirror))?;
    }
    Ok(())
}
