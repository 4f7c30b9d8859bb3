// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources — where the input decoder gets its raw bytes.
//
// The decoder is a pure state machine over single bytes, so it talks to
// input through a small trait instead of to stdin directly. Production
// uses [`TtySource`], which blocks in `poll()` on the tty fd together
// with the resize wake pipe, so a terminal resize interrupts a blocking
// read immediately. Tests use [`ScriptSource`], which replays a byte
// script and answers the decoder's zero-timeout peeks from the same
// script — every escape-sequence path becomes testable without a pty.
//
// `push_back` exists because escape disambiguation sometimes reads one
// byte too many: the decoder peeks at the byte after ESC, and when that
// byte starts an unrelated sequence it hands the byte back instead of
// buffering it in decoder state.

use std::collections::VecDeque;
use std::io;

/// Outcome of a blocking byte read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRead {
    /// One raw input byte.
    Byte(u8),
    /// The wait was interrupted without data — by a resize
    /// notification or a signal. The caller should re-check
    /// out-of-band state before reading again.
    Interrupted,
    /// The source is exhausted (EOF on the fd, or the script ran out).
    Eof,
}

/// A stream of raw terminal input bytes.
pub trait ByteSource {
    /// Block until a byte arrives, the wait is interrupted, or the
    /// source hits EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn next_byte(&mut self) -> io::Result<SourceRead>;

    /// Return a byte only if one is available right now. Used for
    /// ESC disambiguation: a lone ESC has nothing after it, an escape
    /// sequence does.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying poll or read fails.
    fn poll_byte(&mut self) -> io::Result<Option<u8>>;

    /// Hand a byte back so the next read returns it first.
    fn push_back(&mut self, byte: u8);
}

// ─── TtySource ──────────────────────────────────────────────────────────────

/// Reads raw bytes from the terminal, waking on resize notifications.
///
/// Blocks in `poll()` on both the tty fd and the resize wake pipe.
/// When the pipe fires first, the read returns
/// [`SourceRead::Interrupted`] so the caller can run its resize path
/// before asking for input again.
#[cfg(unix)]
pub struct TtySource {
    fd: i32,
    wake_fd: i32,
    pushed: VecDeque<u8>,
}

#[cfg(unix)]
impl TtySource {
    /// Wrap the given tty fd, waking on `wake_fd` (−1 disables the
    /// wake path).
    #[must_use]
    pub const fn new(fd: i32, wake_fd: i32) -> Self {
        Self {
            fd,
            wake_fd,
            pushed: VecDeque::new(),
        }
    }

    /// Wrap stdin, waking on the resize pipe installed by
    /// [`crate::resize::install`].
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO, crate::resize::wake_fd())
    }

    /// `poll()` the tty fd (and the wake pipe) with the given timeout.
    /// Returns which side became readable.
    fn poll(&self, timeout_ms: i32) -> io::Result<PollOutcome> {
        let mut fds = [
            libc::pollfd {
                fd: self.fd,
                events: libc::POLLIN,
                revents: 0,
            },
            libc::pollfd {
                fd: self.wake_fd,
                events: libc::POLLIN,
                revents: 0,
            },
        ];
        let nfds = if self.wake_fd >= 0 { 2 } else { 1 };

        let ready = unsafe { libc::poll(fds.as_mut_ptr(), nfds, timeout_ms) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(PollOutcome::Woken);
            }
            return Err(err);
        }
        if ready == 0 {
            return Ok(PollOutcome::Timeout);
        }
        if fds[0].revents & libc::POLLIN != 0 {
            return Ok(PollOutcome::TtyReadable);
        }
        // Only the wake pipe fired. Drain it so the next poll re-arms.
        crate::resize::drain_wake();
        Ok(PollOutcome::Woken)
    }

    /// Read exactly one byte from the tty.
    fn read_byte(&self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }
}

#[cfg(unix)]
enum PollOutcome {
    TtyReadable,
    Woken,
    Timeout,
}

#[cfg(unix)]
impl ByteSource for TtySource {
    fn next_byte(&mut self) -> io::Result<SourceRead> {
        if let Some(byte) = self.pushed.pop_front() {
            return Ok(SourceRead::Byte(byte));
        }

        match self.poll(-1)? {
            PollOutcome::TtyReadable => match self.read_byte()? {
                Some(byte) => Ok(SourceRead::Byte(byte)),
                None => Ok(SourceRead::Eof),
            },
            PollOutcome::Woken | PollOutcome::Timeout => Ok(SourceRead::Interrupted),
        }
    }

    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed.pop_front() {
            return Ok(Some(byte));
        }

        match self.poll(0)? {
            PollOutcome::TtyReadable => self.read_byte(),
            PollOutcome::Woken | PollOutcome::Timeout => Ok(None),
        }
    }

    fn push_back(&mut self, byte: u8) {
        self.pushed.push_front(byte);
    }
}

// ─── ScriptSource ───────────────────────────────────────────────────────────

/// Replays a fixed byte script. The decoder's zero-timeout peeks see
/// the scripted bytes as "already available", which is exactly how a
/// burst of escape-sequence bytes arrives from a real terminal.
#[derive(Debug, Default)]
pub struct ScriptSource {
    bytes: VecDeque<u8>,
}

impl ScriptSource {
    /// Build a source that replays `script` and then reports EOF.
    #[must_use]
    pub fn new(script: &[u8]) -> Self {
        Self {
            bytes: script.iter().copied().collect(),
        }
    }

    /// Append more bytes to the script.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.bytes.extend(bytes.iter().copied());
    }

    /// Whether the script still has bytes to deliver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ByteSource for ScriptSource {
    fn next_byte(&mut self) -> io::Result<SourceRead> {
        Ok(self
            .bytes
            .pop_front()
            .map_or(SourceRead::Eof, SourceRead::Byte))
    }

    fn poll_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }

    fn push_back(&mut self, byte: u8) {
        self.bytes.push_front(byte);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn script_replays_in_order() {
        let mut src = ScriptSource::new(b"abc");
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'a'));
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'b'));
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'c'));
        assert_eq!(src.next_byte().unwrap(), SourceRead::Eof);
    }

    #[test]
    fn script_poll_sees_scripted_bytes() {
        let mut src = ScriptSource::new(b"x");
        assert_eq!(src.poll_byte().unwrap(), Some(b'x'));
        assert_eq!(src.poll_byte().unwrap(), None);
    }

    #[test]
    fn push_back_returns_first() {
        let mut src = ScriptSource::new(b"b");
        src.push_back(b'a');
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'a'));
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'b'));
    }

    #[test]
    fn feed_extends_the_script() {
        let mut src = ScriptSource::new(b"a");
        src.feed(b"b");
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'a'));
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'b'));
        assert!(src.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn tty_source_push_back_is_served_without_polling() {
        // fd −1 would fail any real poll; the pushed byte must win first.
        let mut src = TtySource::new(-1, -1);
        src.push_back(b'q');
        assert_eq!(src.next_byte().unwrap(), SourceRead::Byte(b'q'));
        assert_eq!(src.poll_byte().unwrap(), None);
    }
}
