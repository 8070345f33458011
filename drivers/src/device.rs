use crate::interrupt;
use crate::parameters;
use crate::properties;
use crate::register;

/// Capabilities of one hardware block kind.
pub trait Hwip {
    const PROPERTIES: properties::Block;

    /// Reads and acknowledges the status register behind `source`.
    fn interrupt_events(
        window: &dyn register::Window,
        source: interrupt::HandlerSlot,
    ) -> interrupt::Events;

    /// Rewrites output formats to the range configured on the chroma sibling.
    fn correct_chroma_range(parameters: &mut parameters::Parameters, range: isp_types::YuvRange) {
        parameters.dma_output.format = parameters.dma_output.format.with_range(range);
        parameters.dma_sub_output.format = parameters.dma_sub_output.format.with_range(range);
    }
}
