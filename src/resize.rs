// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Resize notification — SIGWINCH to a flag, plus a wake pipe.
//
// A signal handler may only do async-signal-safe work, so the handler
// here does exactly two things: store into an `AtomicBool` and write
// one byte into a non-blocking self-pipe. Everything that actually
// reacts to the resize — querying the new geometry, rebuilding
// surfaces — happens later, synchronously, when the UI calls
// `check_resize` at the top of its input path.
//
// The pipe exists so a thread blocked in `poll()` waiting for terminal
// input wakes up immediately when the terminal is resized instead of
// sitting on stale geometry until the next keypress. The byte source
// polls the pipe's read end alongside the tty.
//
// Signal dispositions are process-global, so this state is too. The
// pending flag is consumed with `swap`, which keeps multiple UI
// instances (tests) from double-reacting to one signal.

use std::io;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Set by the SIGWINCH handler, consumed by [`take_pending`].
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// Write end of the wake pipe (−1 until installed).
static WAKE_WRITE_FD: AtomicI32 = AtomicI32::new(-1);

/// Read end of the wake pipe (−1 until installed).
static WAKE_READ_FD: AtomicI32 = AtomicI32::new(-1);

/// The pipe is created at most once per process.
static PIPE_CREATED: Once = Once::new();

/// Whether a resize notification arrived since the last call.
///
/// Consuming read: the flag is cleared atomically.
pub fn take_pending() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

/// Mark a resize as pending and poke the wake pipe, exactly as the
/// signal handler would. Used by tests and by forced repaints.
pub fn notify() {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
    wake();
}

/// Write one byte into the wake pipe. Async-signal-safe.
fn wake() {
    let fd = WAKE_WRITE_FD.load(Ordering::Relaxed);
    if fd >= 0 {
        #[cfg(unix)]
        unsafe {
            let byte = 0u8;
            let _ = libc::write(fd, std::ptr::from_ref(&byte).cast(), 1);
        }
    }
}

/// Read end of the wake pipe, for byte sources to poll. −1 when
/// [`install`] has not run.
#[must_use]
pub fn wake_fd() -> i32 {
    WAKE_READ_FD.load(Ordering::Relaxed)
}

/// Drain any queued wake bytes so the pipe poll re-arms.
pub fn drain_wake() {
    let fd = wake_fd();
    if fd >= 0 {
        #[cfg(unix)]
        unsafe {
            let mut buf = [0u8; 32];
            while libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) > 0 {}
        }
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
    wake();
}

/// Install the SIGWINCH handler (and ignore SIGINT — the editor sees
/// ctrl-C as a key, not as a termination request).
///
/// Creates the wake pipe on first call; later calls only reinstall the
/// handlers. Returns the pipe's read end.
///
/// # Errors
///
/// Returns an error if the wake pipe cannot be created.
#[cfg(unix)]
pub fn install() -> io::Result<i32> {
    let mut pipe_err = None;
    PIPE_CREATED.call_once(|| {
        let mut fds = [0i32; 2];
        let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_NONBLOCK | libc::O_CLOEXEC) };
        if rc == 0 {
            WAKE_READ_FD.store(fds[0], Ordering::Relaxed);
            WAKE_WRITE_FD.store(fds[1], Ordering::Relaxed);
        } else {
            pipe_err = Some(io::Error::last_os_error());
        }
    });
    if let Some(err) = pipe_err {
        return Err(err);
    }

    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());

        let mut ign: libc::sigaction = std::mem::zeroed();
        ign.sa_sigaction = libc::SIG_IGN;
        libc::sigemptyset(&raw mut ign.sa_mask);
        libc::sigaction(libc::SIGINT, &raw const ign, std::ptr::null_mut());
    }

    Ok(wake_fd())
}

#[cfg(not(unix))]
pub fn install() -> io::Result<i32> {
    Ok(-1)
}

/// Restore default dispositions for SIGWINCH and SIGINT. The wake pipe
/// stays open for the process lifetime (reinstall reuses it).
#[cfg(unix)]
pub fn uninstall() {
    unsafe {
        let mut dfl: libc::sigaction = std::mem::zeroed();
        dfl.sa_sigaction = libc::SIG_DFL;
        libc::sigemptyset(&raw mut dfl.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const dfl, std::ptr::null_mut());
        libc::sigaction(libc::SIGINT, &raw const dfl, std::ptr::null_mut());
    }
}

#[cfg(not(unix))]
pub fn uninstall() {}

/// Serializes tests that touch the process-global resize state; the
/// test harness runs tests on parallel threads.
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_pending_consumes_the_flag() {
        let _guard = test_lock();
        RESIZE_PENDING.store(false, Ordering::Relaxed);
        assert!(!take_pending());
        notify();
        assert!(take_pending());
        assert!(!take_pending());
    }

    #[cfg(unix)]
    #[test]
    fn install_creates_wake_pipe() {
        let _guard = test_lock();
        let fd = install().unwrap();
        assert!(fd >= 0);
        // A notification must leave a byte in the pipe.
        notify();
        let mut buf = [0u8; 4];
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        assert!(n >= 1);
        drain_wake();
        take_pending();
        uninstall();
    }

    #[cfg(unix)]
    #[test]
    fn drain_wake_empties_the_pipe() {
        let _guard = test_lock();
        let fd = install().unwrap();
        notify();
        notify();
        drain_wake();
        let mut buf = [0u8; 4];
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        assert!(n <= 0); // non-blocking read on an empty pipe
        take_pending();
        uninstall();
    }
}
