pub const OPEN: u8 = 1 << 0;
pub const INIT: u8 = 1 << 1;
pub const CONFIG: u8 = 1 << 2;
pub const RUN: u8 = 1 << 3;
pub const TUNESET: u8 = 1 << 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Closed,
    Open,
    Initialized { configured: bool, running: bool },
}

#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Refused {
    #[error("the block is not open")]
    NotOpen,

    #[error("the block is not initialized")]
    NotInitialized,
}

/// Lifecycle of one block plus the orthogonal tuning-set flag.
///
/// RUN and CONFIG only exist inside `Initialized`, so a running block is
/// always initialized.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct State {
    lifecycle: Lifecycle,
    tuneset: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::Closed,
            tuneset: false,
        }
    }
}

impl State {
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns false if the block was already open.
    pub fn open(&mut self) -> bool {
        match self.lifecycle {
            Lifecycle::Closed => {
                self.lifecycle = Lifecycle::Open;
                true
            }
            Lifecycle::Open | Lifecycle::Initialized { .. } => false,
        }
    }

    pub fn init(&mut self) -> Result<(), Refused> {
        match self.lifecycle {
            Lifecycle::Closed => Err(Refused::NotOpen),
            Lifecycle::Open => {
                self.lifecycle = Lifecycle::Initialized {
                    configured: false,
                    running: false,
                };
                Ok(())
            }
            Lifecycle::Initialized { .. } => Ok(()),
        }
    }

    pub fn enable(&mut self) -> Result<(), Refused> {
        match &mut self.lifecycle {
            Lifecycle::Initialized { running, .. } => {
                *running = true;
                Ok(())
            }
            _ => Err(Refused::NotInitialized),
        }
    }

    pub fn configure(&mut self) -> Result<(), Refused> {
        match &mut self.lifecycle {
            Lifecycle::Initialized { configured, .. } => {
                *configured = true;
                Ok(())
            }
            _ => Err(Refused::NotInitialized),
        }
    }

    /// Clears RUN and CONFIG together.
    pub fn stop(&mut self) {
        if let Lifecycle::Initialized { .. } = self.lifecycle {
            self.lifecycle = Lifecycle::Initialized {
                configured: false,
                running: false,
            };
        }
    }

    pub fn close(&mut self) -> Result<(), Refused> {
        match self.lifecycle {
            Lifecycle::Closed => Err(Refused::NotOpen),
            _ => {
                *self = Self::default();
                Ok(())
            }
        }
    }

    pub(crate) fn set_tuneset(&mut self, tuneset: bool) {
        self.tuneset = tuneset;
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.lifecycle, Lifecycle::Closed)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Initialized { .. })
    }

    pub fn is_configured(&self) -> bool {
        matches!(
            self.lifecycle,
            Lifecycle::Initialized {
                configured: true,
                ..
            }
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Initialized { running: true, .. })
    }

    pub fn is_tuneset(&self) -> bool {
        self.tuneset
    }

    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.is_open() {
            flags |= OPEN;
        }
        if self.is_initialized() {
            flags |= INIT;
        }
        if self.is_configured() {
            flags |= CONFIG;
        }
        if self.is_running() {
            flags |= RUN;
        }
        if self.tuneset {
            flags |= TUNESET;
        }
        flags
    }
}
