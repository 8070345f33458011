pub mod backend;
pub mod block;
pub mod clock;
pub mod configuration;
pub mod device;
pub mod devices;
pub mod error;
pub mod frame;
pub mod interrupt;
pub mod parameters;
pub mod pipeline;
pub mod properties;
pub mod register;
pub mod setfile;
pub mod slot;
pub mod state;
pub mod topology;

pub use crate::backend::Backend;
pub use crate::block::ActiveMask;
pub use crate::block::ControlId;
pub use crate::configuration::Configuration;
pub use crate::devices::Kind;
pub use crate::error::Error;
pub use crate::frame::Frame;
pub use crate::parameters::DirtyMask;
pub use crate::parameters::ParamSet;
pub use crate::parameters::Region;
pub use crate::pipeline::Pipeline;
pub use crate::setfile::SetfileTable;
pub use crate::slot::SlotRegistry;

pub use bincode;
pub use isp_types as types;
