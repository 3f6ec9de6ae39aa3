//! Terminal operator signals.
//!
//! Puts stdin into non-canonical, non-blocking mode so the pipelines can
//! poll for a key between frame reads — a signal is observed with at
//! most one frame of latency, and the loop never blocks on the keyboard.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("stdin is not a terminal")]
    NotATerminal,
    #[error("termios: {0}")]
    Termios(#[from] io::Error),
}

/// Discrete operator signal during a pipeline loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySignal {
    /// 'c' — capture one enrollment sample.
    Capture,
    /// 'a' — mark attendance now.
    Mark,
    /// 'q' — cancel the pipeline.
    Quit,
}

/// Source of operator signals for a pipeline loop.
///
/// Implemented by [`Keyboard`]; test doubles script a signal sequence.
pub trait SignalSource {
    /// Non-blocking poll; `None` when no signal is pending.
    fn poll_signal(&mut self) -> Option<KeySignal>;
}

/// Raw-mode keyboard over stdin.
///
/// The original terminal attributes are restored on drop, so an aborted
/// pipeline never leaves the shell in raw mode.
pub struct Keyboard {
    original: libc::termios,
}

impl Keyboard {
    pub fn open() -> Result<Self, ConsoleError> {
        let fd = libc::STDIN_FILENO;
        // SAFETY: isatty on a valid, process-owned fd.
        if unsafe { libc::isatty(fd) } == 0 {
            return Err(ConsoleError::NotATerminal);
        }

        // SAFETY: termios is plain-old-data; tcgetattr fills it in.
        let mut term: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut term) } != 0 {
            return Err(ConsoleError::Termios(io::Error::last_os_error()));
        }
        let original = term;

        // Non-canonical, no echo; VMIN=0/VTIME=0 makes read() non-blocking.
        term.c_lflag &= !(libc::ICANON | libc::ECHO);
        term.c_cc[libc::VMIN] = 0;
        term.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &term) } != 0 {
            return Err(ConsoleError::Termios(io::Error::last_os_error()));
        }

        tracing::debug!("keyboard in raw mode (c=capture, a=mark, q=quit)");
        Ok(Self { original })
    }
}

impl SignalSource for Keyboard {
    fn poll_signal(&mut self) -> Option<KeySignal> {
        let mut byte = [0u8; 1];
        // SAFETY: reading into a one-byte stack buffer; VMIN=0 means this
        // returns immediately when no input is pending.
        let n = unsafe {
            libc::read(libc::STDIN_FILENO, byte.as_mut_ptr() as *mut libc::c_void, 1)
        };
        if n != 1 {
            return None;
        }
        match byte[0] {
            b'c' | b'C' => Some(KeySignal::Capture),
            b'a' | b'A' => Some(KeySignal::Mark),
            b'q' | b'Q' => Some(KeySignal::Quit),
            _ => None,
        }
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        // SAFETY: restoring attributes saved in open().
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.original);
        }
    }
}
