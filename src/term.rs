// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, capabilities, buffered output, RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control — there is no safe
// alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via
// termios, switches to the alternate screen, and guarantees cleanup on
// drop — even if the editor panics mid-frame.
//
// Capabilities are sniffed from `$TERM` rather than a terminfo database:
// a name containing "256color" means 256 palette slots and OSC 4 color
// redefinition; anything else gets the conservative 8-color profile.
// That is the whole capability model this layer needs.
//
// All drawing goes through an internal frame buffer. A frame is composed
// with `frame()` / the `ansi` emitters and pushed to the terminal with
// `flush()` in a single `write_all`, so the user never sees a half-drawn
// screen.
//
// The panic hook bypasses Rust's stdout lock entirely, writing a
// pre-built restore sequence directly to fd 1. This prevents deadlock if
// the panic happened while holding the stdout lock (common during frame
// rendering). One raw write, everything restored, then the original
// panic handler prints its message to a working terminal.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::palette::Backend;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn query_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

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
pub fn query_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Capabilities ───────────────────────────────────────────────────────────

/// What the terminal can do, sniffed from `$TERM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Number of addressable palette slots (8 or 256).
    pub palette_slots: usize,
    /// Whether OSC 4 palette redefinition is expected to work.
    pub can_redefine_colors: bool,
}

impl Capabilities {
    /// Sniff capabilities from a `$TERM` value.
    #[must_use]
    pub fn from_term_name(term: &str) -> Self {
        if term.contains("256color") {
            Self {
                palette_slots: 256,
                can_redefine_colors: true,
            }
        } else {
            Self {
                palette_slots: 8,
                can_redefine_colors: false,
            }
        }
    }

    /// Sniff capabilities from the `TERM` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_term_name(&std::env::var("TERM").unwrap_or_default())
    }
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Term`] struct owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore raw mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Complete terminal restore sequence for emergency use.
///
/// Concatenation of: disable mouse (SGR format + drag), disable focus
/// reporting, reset SGR attributes, reset the scroll region, show the
/// cursor, exit alternate screen.
///
/// Ordered carefully: alternate screen exit is last so the restored
/// shell content appears with no TUI artifacts.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?1006l\x1b[?1002l\
    \x1b[?1004l\
    \x1b[0m\
    \x1b[r\
    \x1b[?25h\
    \x1b[?1049l";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. Our hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios, then delegates to the
/// original panic handler so the error prints to a working terminal.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the complete restore sequence directly to stdout's file descriptor.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if the panic
/// occurred while the lock was held (e.g., mid-frame flush).
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Term ───────────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup and a buffered output path.
///
/// Call [`enter`](Self::enter) to switch to TUI mode (raw mode, alternate
/// screen). The terminal is automatically restored when the handle is
/// dropped — even on panic.
///
/// # Example
///
/// ```no_run
/// use sel_term::term::Term;
///
/// let mut term = Term::new()?;
/// term.enter()?;
/// // ... render frames, handle input ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Term {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Current terminal size (cached, refresh with [`refresh_size`](Self::refresh_size)).
    size: Size,

    /// What this terminal can do, per `$TERM`.
    caps: Capabilities,

    /// Pending frame bytes, pushed out in one write by [`flush`](Self::flush).
    out: Vec<u8>,

    /// Whether we're in TUI mode (raw + alt screen).
    active: bool,

    /// Whether SGR mouse reporting is currently on.
    mouse_enabled: bool,
}

impl Term {
    /// Create a terminal handle, query the current size, and sniff
    /// capabilities from `$TERM`.
    ///
    /// Does **not** enter TUI mode — call [`enter`](Self::enter) for that.
    /// Falls back to 80×24 if the terminal size cannot be determined (e.g.,
    /// in tests or piped environments).
    ///
    /// # Errors
    ///
    /// Currently infallible, but returns `Result` for forward compatibility.
    pub fn new() -> io::Result<Self> {
        Ok(Self::with_capabilities(Capabilities::from_env()))
    }

    /// Create a terminal handle with explicit capabilities.
    #[must_use]
    pub fn with_capabilities(caps: Capabilities) -> Self {
        let size = query_size().unwrap_or(Size { cols: 80, rows: 24 });

        Self {
            #[cfg(unix)]
            original_termios: None,
            size,
            caps,
            out: Vec::with_capacity(16 * 1024),
            active: false,
            mouse_enabled: false,
        }
    }

    /// Current terminal size (columns, rows).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Capability profile for this terminal.
    #[inline]
    #[must_use]
    pub const fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Re-query the terminal size from the OS.
    ///
    /// Call this after a resize notification to pick up the new
    /// dimensions. Returns the updated size and caches it internally.
    /// Outside a tty the cached size is kept, so tests and piped
    /// environments keep working.
    ///
    /// # Errors
    ///
    /// Returns an error when the process has a tty but the geometry
    /// query fails — the UI cannot function without geometry.
    pub fn refresh_size(&mut self) -> io::Result<Size> {
        match query_size() {
            Some(s) => {
                self.size = s;
                Ok(s)
            }
            None if is_tty() => Err(io::Error::other("cannot query terminal size")),
            None => Ok(self.size),
        }
    }

    /// Whether we're currently in TUI mode.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The pending frame buffer. Escape emitters write into this and
    /// [`flush`](Self::flush) pushes it to the terminal in one write.
    #[inline]
    pub fn frame(&mut self) -> &mut Vec<u8> {
        &mut self.out
    }

    /// Push the pending frame to stdout in a single write and empty the
    /// buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write to stdout fails.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.out.is_empty() {
            return Ok(());
        }
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(&self.out)?;
        lock.flush()?;
        self.out.clear();
        Ok(())
    }

    /// Enter TUI mode.
    ///
    /// Enables raw mode (via termios), switches to the alternate screen,
    /// hides the cursor, clears the screen, and enables focus reporting.
    /// Mouse reporting is toggled separately via
    /// [`set_mouse_enabled`](Self::set_mouse_enabled) because it is a
    /// runtime option.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or terminal output fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::cursor_hide(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        ansi::enable_focus_reporting(&mut lock)?;
        lock.flush()?;

        self.active = true;
        Ok(())
    }

    /// Leave TUI mode and restore the terminal.
    ///
    /// Disables all features in reverse order, restores the original screen
    /// content, and exits raw mode. Idempotent: calling `leave()` while
    /// inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        self.out.clear();

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if self.mouse_enabled {
            ansi::disable_mouse(&mut lock)?;
        }
        ansi::disable_focus_reporting(&mut lock)?;
        ansi::reset(&mut lock)?;
        ansi::reset_scroll_region(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        ansi::exit_alt_screen(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.mouse_enabled = false;
        self.active = false;
        Ok(())
    }

    /// Turn SGR mouse reporting on or off. No-op outside TUI mode and
    /// when the state already matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the write to stdout fails.
    pub fn set_mouse_enabled(&mut self, enabled: bool) -> io::Result<()> {
        if !self.active || enabled == self.mouse_enabled {
            self.mouse_enabled = enabled && self.active;
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if enabled {
            ansi::enable_mouse(&mut lock)?;
        } else {
            ansi::disable_mouse(&mut lock)?;
        }
        lock.flush()?;

        self.mouse_enabled = enabled;
        Ok(())
    }

    /// Whether SGR mouse reporting is currently on.
    #[inline]
    #[must_use]
    pub const fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // cfmakeraw equivalent: disable all line processing.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            // Clear the global backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Backend for Term {
    fn can_redefine_colors(&self) -> bool {
        self.caps.can_redefine_colors
    }

    fn palette_slots(&self) -> usize {
        self.caps.palette_slots
    }

    fn redefine_color(&mut self, slot: u16, r: u16, g: u16, b: u16) {
        // Buffered with the frame so palette programming lands on the
        // terminal before the cells that reference the slot.
        let _ = ansi::set_palette_color(&mut self.out, slot, r, g, b);
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
