use crate::devices;
use crate::frame;
use crate::parameters;
use crate::setfile;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Call {
    ChainCreate,
    ChainDestroy,
    ObjectCreate,
    ObjectDestroy,
    SetControl,
    DispatchShot,
    GetMeta,
    CreateTuneSet,
    ApplyTuneSet,
    DeleteTuneSet,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("backend call {call:?} failed with code {code}")]
pub struct Error {
    pub call: Call,
    pub code: i32,
}

impl Error {
    pub fn new(call: Call, code: i32) -> Self {
        Self { call, code }
    }
}

/// One backend object: a block slot running a pipeline instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub kind: devices::Kind,
    pub slot: usize,
    pub instance: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
}

/// Vendor library that programs the hardware.
///
/// Calls are synchronous. Frame completion is reported later through the
/// block's interrupt lines, never through a return value.
pub trait Backend: Send + Sync {
    fn chain_create(&self, kind: devices::Kind, slot: usize) -> Result<(), Error>;

    fn chain_destroy(&self, kind: devices::Kind, slot: usize) -> Result<(), Error>;

    fn object_create(&self, target: Target) -> Result<(), Error>;

    fn object_destroy(&self, target: Target) -> Result<(), Error>;

    fn set_control(&self, target: Target, control: Control) -> Result<(), Error>;

    fn dispatch_shot(
        &self,
        target: Target,
        param_set: &parameters::ParamSet,
        shot: Option<&frame::Shot>,
    ) -> Result<(), Error>;

    fn get_meta(&self, target: Target, frame_count: u32) -> Result<Vec<u8>, Error>;

    fn create_tune_set(
        &self,
        target: Target,
        index: usize,
        entry: &setfile::Entry,
    ) -> Result<(), Error>;

    fn apply_tune_set(&self, target: Target, index: usize) -> Result<(), Error>;

    fn delete_tune_set(&self, target: Target, index: usize) -> Result<(), Error>;
}
