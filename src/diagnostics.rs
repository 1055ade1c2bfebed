//! Diagnostic channels and scoped message absorption.
//!
//! Every diagnostic the pipeline produces goes to one of three named channels
//! (`"Error"`, `"Warning"`, `"Info"`). Messages are forwarded to the `log`
//! facade with the channel name as the log target, unless an [`Absorber`] is
//! installed on the emitting thread.
//!
//! # Absorbing
//!
//! An [`Absorber`] is a scoped guard. While it is alive, diagnostics emitted on
//! the thread that created it are intercepted; other threads are unaffected.
//! Dropping the guard restores whatever was installed before, on every exit
//! path.
//!
//! ```
//! use assetpipe::diagnostics::{self, AbsorbMode, Absorber, Channel};
//!
//! let absorber = Absorber::new(AbsorbMode::Absorb);
//! diagnostics::error("bad pattern");
//! assert_eq!(absorber.last_message(Channel::Error).as_deref(), Some("bad pattern"));
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;

/// Channel name for error messages.
pub const ERROR_WINDOW: &str = "Error";
/// Channel name for warning messages.
pub const WARNING_WINDOW: &str = "Warning";
/// Channel name for informational messages.
pub const INFO_WINDOW: &str = "Info";

/// A named diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Error,
    Warning,
    Info,
}

impl Channel {
    /// The channel name consumed by the external console.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Error => ERROR_WINDOW,
            Channel::Warning => WARNING_WINDOW,
            Channel::Info => INFO_WINDOW,
        }
    }

    fn level(self) -> log::Level {
        match self {
            Channel::Error => log::Level::Error,
            Channel::Warning => log::Level::Warn,
            Channel::Info => log::Level::Info,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How an [`Absorber`] treats intercepted messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsorbMode {
    /// Capture every message and do not forward it.
    Absorb,
    /// Count error messages and forward everything unchanged.
    CountErrors,
}

/// A diagnostic captured by an absorber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub channel: Channel,
    pub message: String,
}

struct Frame {
    mode: AbsorbMode,
    captured: Vec<Diagnostic>,
    errors: usize,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Emit a message on a channel.
///
/// The innermost absorber on the current thread sees the message first.
pub fn emit(channel: Channel, message: impl Into<String>) {
    let message = message.into();
    let forward = FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        match frames.last_mut() {
            None => true,
            Some(frame) => {
                if channel == Channel::Error {
                    frame.errors += 1;
                }
                match frame.mode {
                    AbsorbMode::Absorb => {
                        frame.captured.push(Diagnostic { channel, message: message.clone() });
                        false
                    }
                    AbsorbMode::CountErrors => true,
                }
            }
        }
    });

    if forward {
        log::log!(target: channel.name(), channel.level(), "{}", message);
    }
}

/// Emit on the `"Error"` channel.
pub fn error(message: impl Into<String>) {
    emit(Channel::Error, message);
}

/// Emit on the `"Warning"` channel.
pub fn warning(message: impl Into<String>) {
    emit(Channel::Warning, message);
}

/// Emit on the `"Info"` channel.
pub fn info(message: impl Into<String>) {
    emit(Channel::Info, message);
}

/// Scoped, thread-local diagnostic interceptor.
///
/// Guards nest; the most recently created one is active. Guards must be
/// dropped in reverse creation order. Dropping an outer guard first also
/// discards every guard created after it.
pub struct Absorber {
    depth: usize,
    // thread-local state: the guard must stay on its thread
    _not_send: PhantomData<*const ()>,
}

impl Absorber {
    /// Install a new interceptor on the current thread.
    pub fn new(mode: AbsorbMode) -> Self {
        let depth = FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            frames.push(Frame { mode, captured: Vec::new(), errors: 0 });
            frames.len()
        });
        Self { depth, _not_send: PhantomData }
    }

    fn with_frame<R>(&self, f: impl FnOnce(&Frame) -> R) -> Option<R> {
        FRAMES.with(|frames| frames.borrow().get(self.depth - 1).map(f))
    }

    /// Number of error-channel messages seen while this guard was active.
    pub fn error_count(&self) -> usize {
        self.with_frame(|frame| frame.errors).unwrap_or(0)
    }

    /// All captured diagnostics, oldest first. Empty in `CountErrors` mode.
    pub fn captured(&self) -> Vec<Diagnostic> {
        self.with_frame(|frame| frame.captured.clone()).unwrap_or_default()
    }

    /// The most recent captured message on a channel.
    pub fn last_message(&self, channel: Channel) -> Option<String> {
        self.with_frame(|frame| {
            frame.captured.iter().rev().find(|d| d.channel == channel).map(|d| d.message.clone())
        })
        .flatten()
    }
}

impl Drop for Absorber {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            if frames.len() >= self.depth {
                frames.truncate(self.depth - 1);
            }
        });
    }
}
