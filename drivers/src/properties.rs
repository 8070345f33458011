use crate::devices;
use crate::frame;

#[derive(Debug, Copy, Clone)]
pub struct Block {
    pub name: &'static str,
    pub interrupts: usize,
    pub accelerated_interrupts: bool,
    pub dma_paths: &'static [frame::DmaPath],
    /// Path whose missing buffer aborts a shot, other paths are dropped for the frame.
    pub primary_input: Option<frame::DmaPath>,
    pub upstream: Option<devices::Kind>,
    pub chroma_sibling: Option<devices::Kind>,
}
