// SPDX-License-Identifier: MIT
//
// Terminal control — the controlling tty, raw mode, and RAII restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr) and ioctl (TIOCGWINSZ). These are the standard POSIX
// interfaces for terminal control and have no safe std alternative. Each
// unsafe block is minimal.
#![allow(unsafe_code)]
//
// The editor talks to `/dev/tty` directly instead of stdin/stdout, so
// stdout stays free for mirroring the final document when it is
// redirected. The same handle is the byte source for key decoding, the
// sink for all escape output, and the geometry source for the status bar.
//
// Raw mode is restored exactly once. `restore` takes the saved termios
// out of its `Option`, `Drop` calls `restore`, and a panic hook restores
// from a global backup if the editor dies mid-edit. Whichever runs first
// wins; the rest find nothing left to do.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
#[cfg(unix)]
use std::sync::Mutex;
use std::sync::Once;

use tracing::{debug, warn};

use crate::error::{Result, TermError};
use crate::input::ByteSource;

/// Path of the controlling terminal.
pub const TTY_PATH: &str = "/dev/tty";

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Conventional VT100 geometry, used when the real size is unknown.
    pub const DEFAULT: Self = Self { cols: 80, rows: 24 };
}

impl Default for Size {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Source of the terminal's window size.
///
/// Polled before every status-bar refresh. Implementations never fail;
/// they fall back to a configured size when the OS query does.
pub trait Geometry {
    fn window_size(&self) -> Size;
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query a terminal's size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if the file is not a terminal, the query fails, or
/// either dimension is zero.
#[cfg(unix)]
#[must_use]
pub fn query_size(file: &File) -> Option<Size> {
    use std::os::unix::io::AsRawFd;

    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(file.as_raw_fd(), libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn query_size(_file: &File) -> Option<Size> {
    None
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of the original termios (and the fd it belongs to) for
/// panic recovery. The [`Terminal`] owns its own copy; the hook can't
/// reach it.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<(libc::c_int, libc::termios)>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_from_backup() {
    if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
        if let Some((fd, original)) = guard.take() {
            unsafe {
                let _ = libc::tcsetattr(fd, libc::TCSANOW, &raw const original);
            }
        }
    }
}

#[cfg(not(unix))]
const fn restore_from_backup() {}

static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores cooked mode before the panic message
/// prints, so the message lands on a terminal that echoes and wraps.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_from_backup();
            original(info);
        }));
    });
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Handle on the controlling terminal.
///
/// Reads are unbuffered and blocking, one byte at a time. Writes are
/// buffered and flushed before every read, so each keystroke costs one
/// write syscall no matter how many escape sequences the edit produced.
///
/// # Example
///
/// ```no_run
/// use rowed_term::terminal::Terminal;
///
/// let mut term = Terminal::open()?;
/// term.enter_raw_mode()?;
/// // ... decode keys, render ...
/// term.restore()?; // or let Drop do it
/// # Ok::<(), rowed_term::TermError>(())
/// ```
pub struct Terminal {
    reader: File,
    writer: BufWriter<File>,

    /// Original termios saved before entering raw mode. `None` when the
    /// terminal is in its original mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Size reported when the OS query fails.
    fallback: Size,
}

impl Terminal {
    /// Open the controlling terminal for reading and writing.
    ///
    /// Does **not** enter raw mode; call [`enter_raw_mode`](Self::enter_raw_mode).
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Open`] if the device can't be opened (no
    /// controlling terminal, e.g. under a daemon or some CI runners).
    pub fn open() -> Result<Self> {
        let open_err = |source| TermError::Open {
            path: TTY_PATH,
            source,
        };
        let reader = OpenOptions::new()
            .read(true)
            .write(true)
            .open(TTY_PATH)
            .map_err(open_err)?;
        let writer = BufWriter::new(reader.try_clone().map_err(open_err)?);

        Ok(Self {
            reader,
            writer,
            #[cfg(unix)]
            original_termios: None,
            fallback: Size::DEFAULT,
        })
    }

    /// Set the size reported when the window size can't be queried.
    #[must_use]
    pub const fn with_fallback_size(mut self, size: Size) -> Self {
        self.fallback = size;
        self
    }

    /// Whether raw mode is currently active.
    #[cfg(unix)]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.original_termios.is_some()
    }

    #[cfg(not(unix))]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        false
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    /// Switch the terminal to raw mode.
    ///
    /// Disables echo, canonical line buffering, signal keys (Ctrl-C and
    /// Ctrl-Z arrive as bytes), CR→NL translation and output
    /// post-processing. Reads block until at least one byte arrives.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the termios attributes can't be read or set.
    #[cfg(unix)]
    pub fn enter_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if self.original_termios.is_some() {
            return Ok(());
        }

        install_panic_hook();

        let fd = self.reader.as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some((fd, termios));
            }

            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        debug!("terminal entered raw mode");
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn enter_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Flush pending output and put the terminal back in its original mode.
    ///
    /// Only the first call after [`enter_raw_mode`](Self::enter_raw_mode)
    /// touches termios; later calls just flush.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or `tcsetattr` fails. The saved mode is
    /// consumed either way, so a failed restore is not retried.
    #[cfg(unix)]
    pub fn restore(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let flushed = self.writer.flush();

        if let Some(original) = self.original_termios.take() {
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            let fd = self.reader.as_raw_fd();
            if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const original) } != 0 {
                return Err(io::Error::last_os_error());
            }
            debug!("terminal restored to original mode");
        }

        flushed
    }

    #[cfg(not(unix))]
    pub fn restore(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl ByteSource for Terminal {
    fn read_byte(&mut self) -> io::Result<u8> {
        self.writer.flush()?;

        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(1) => return Ok(byte[0]),
                Ok(_) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl Write for Terminal {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl Geometry for Terminal {
    fn window_size(&self) -> Size {
        query_size(&self.reader).unwrap_or_else(|| {
            warn!(
                cols = self.fallback.cols,
                rows = self.fallback.rows,
                "window size unavailable, using fallback"
            );
            self.fallback
        })
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn default_size_is_vt100() {
        assert_eq!(Size::default(), Size { cols: 80, rows: 24 });
    }

    #[test]
    fn size_is_copy() {
        let a = Size { cols: 120, rows: 40 };
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn size_debug_format() {
        let debug = format!("{:?}", Size::DEFAULT);
        assert!(debug.contains("80"));
        assert!(debug.contains("24"));
    }

    // ── Queries ───────────────────────────────────────────────────────

    #[test]
    fn query_size_of_regular_file_is_none() {
        let file = File::open("Cargo.toml").unwrap();
        assert_eq!(query_size(&file), None);
    }

    // ── Terminal ──────────────────────────────────────────────────────

    // Test runners may or may not have a controlling terminal; both
    // outcomes must be well-formed.

    #[test]
    fn open_succeeds_or_names_device() {
        match Terminal::open() {
            Ok(term) => assert!(!term.is_raw()),
            Err(err) => assert!(matches!(err, TermError::Open { path: TTY_PATH, .. })),
        }
    }

    #[test]
    fn restore_without_raw_mode_is_noop() {
        if let Ok(mut term) = Terminal::open() {
            term.restore().unwrap();
            term.restore().unwrap();
            assert!(!term.is_raw());
        }
    }

    #[test]
    fn geometry_is_never_zero() {
        if let Ok(term) = Terminal::open() {
            let term = term.with_fallback_size(Size { cols: 100, rows: 30 });
            let size = term.window_size();
            assert!(size.cols > 0);
            assert!(size.rows > 0);
        }
    }

    #[test]
    fn restore_from_empty_backup_is_harmless() {
        restore_from_backup();
    }
}
