use std::cell::RefCell;

use thiserror::Error;
use tracing::warn;

use crate::engine::Engine;

#[derive(Error, Debug)]
pub enum VlcError {
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),

    #[error("Unsupported engine backend: {0}")]
    UnsupportedBackend(String),

    #[error("Operation '{0}' attempted on a null handle")]
    NullHandle(&'static str),

    #[error("engine error in {operation}: {message}")]
    NativeCall {
        operation: &'static str,
        message: String,
    },

    #[error("Unrecognized {0} has no engine preset")]
    UnknownPreset(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VlcError>;

thread_local! {
    static LAST_ERROR: RefCell<Option<VlcError>> = const { RefCell::new(None) };
}

/// Last-error channel for calls that degrade to sentinel values.
///
/// The slot is scoped to the calling thread, which is the thread that owns
/// the player objects. Each guarded call overwrites it: a call that succeeds
/// leaves it empty, a call that fails leaves its error behind.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reset the slot and the engine's pending error before a guarded call.
    pub(crate) fn begin(engine: &dyn Engine) {
        engine.clearerr();
        Self::clear();
    }

    /// Pull the pending engine error, if any, into the slot.
    ///
    /// Returns `true` when the engine reported an error.
    pub(crate) fn check(engine: &dyn Engine, operation: &'static str) -> bool {
        match engine.errmsg() {
            Some(message) => {
                warn!("Engine error: {} ({})", message, operation);
                engine.clearerr();
                Self::record(VlcError::NativeCall { operation, message });
                true
            }
            None => false,
        }
    }

    /// Record a null-handle guard hit. The engine is not touched.
    pub(crate) fn null_handle(operation: &'static str) {
        Self::record(VlcError::NullHandle(operation));
    }

    pub(crate) fn record(error: VlcError) {
        LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(error));
    }

    /// Message of the error left by the most recent guarded call.
    pub fn last_error() -> Option<String> {
        LAST_ERROR.with(|slot| slot.borrow().as_ref().map(|e| e.to_string()))
    }

    /// Take the error left by the most recent guarded call, emptying the slot.
    pub fn take_last_error() -> Option<VlcError> {
        LAST_ERROR.with(|slot| slot.borrow_mut().take())
    }

    pub fn clear() {
        LAST_ERROR.with(|slot| slot.borrow_mut().take());
    }
}
