use crate::backend;
use crate::frame;
use crate::interrupt;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("slot {0} is not open")]
    NotOpen(usize),

    #[error("slot {0} is not initialized")]
    NotInitialized(usize),

    #[error("slot {0} is already open")]
    AlreadyOpen(usize),

    #[error("slot {slot} did not reach frame end within {timeout:?}")]
    StopTimeout {
        slot: usize,
        timeout: std::time::Duration,
    },

    #[error("no block at slot {0}")]
    InvalidBlockId(usize),

    #[error("index {index} is out of range (limit {limit})")]
    OutOfRange { index: usize, limit: usize },

    #[error("slot {slot} has no {path:?} buffer at index {buffer}")]
    MissingBuffer {
        slot: usize,
        path: frame::DmaPath,
        buffer: usize,
    },

    #[error("interrupt line {line} has no {handler:?} handler")]
    EmptyHandler {
        line: u32,
        handler: interrupt::HandlerSlot,
    },

    #[error(transparent)]
    Backend(#[from] backend::Error),

    #[error("slot {slot} raised a hardware error (status {status:#010x})")]
    HardwareFault { slot: usize, status: u32 },

    #[error("invalid setfile table ({0})")]
    InvalidSetfile(String),
}

#[derive(Debug, Default)]
struct Pending {
    error: Option<Error>,
    warning: Option<interrupt::Warning>,
}

/// Keeps the first error and the first warning raised by interrupt handlers.
///
/// Handlers run off the scheduler's thread, the scheduler drains the flag
/// with `load_error` and `load_warning`.
#[derive(Debug, Clone, Default)]
pub struct Flag(std::sync::Arc<std::sync::Mutex<Pending>>);

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_error_if_not_set<IntoError>(&self, error: IntoError)
    where
        IntoError: Into<Error>,
    {
        let mut pending = self.0.lock().expect("mutex is not poisoned");
        if pending.error.is_none() {
            pending.error = Some(error.into());
        }
    }

    pub fn store_warning_if_not_set(&self, warning: interrupt::Warning) {
        let mut pending = self.0.lock().expect("mutex is not poisoned");
        if pending.warning.is_none() {
            pending.warning = Some(warning);
        }
    }

    pub fn load_error(&self) -> Result<(), Error> {
        self.0
            .lock()
            .expect("mutex is not poisoned")
            .error
            .take()
            .map_or(Ok(()), Err)
    }

    pub fn load_warning(&self) -> Option<interrupt::Warning> {
        self.0.lock().expect("mutex is not poisoned").warning.take()
    }
}
