use crate::device;
use crate::devices;
use crate::frame;
use crate::interrupt;
use crate::parameters;
use crate::properties;
use crate::register;
use crate::register::Register;

register::register! { InterruptStatus, 0x0300, {
    frame_start: 0..1,
    frame_end: 1..2,
    reference_miss: 2..3,
    reserved_3_32: 3..32,
} }
register::register! { InterruptClear, 0x0304, { value: 0..32 } }

pub struct Block;

impl device::Hwip for Block {
    const PROPERTIES: properties::Block = properties::Block {
        name: "Temporal processor",
        interrupts: 1,
        accelerated_interrupts: false,
        dma_paths: &[frame::DmaPath::Input, frame::DmaPath::Output],
        primary_input: Some(frame::DmaPath::Input),
        upstream: Some(devices::Kind::Isp),
        chroma_sibling: Some(devices::Kind::Scaler),
    };

    fn interrupt_events(
        window: &dyn register::Window,
        _source: interrupt::HandlerSlot,
    ) -> interrupt::Events {
        let status = InterruptStatus::read(window);
        InterruptClear {
            value: status.value(),
        }
        .write(window);
        interrupt::Events {
            frame_start: status.frame_start == 1,
            frame_end: status.frame_end == 1,
            fault: (status.reference_miss == 1).then(|| status.value()),
        }
    }

    // the reference output keeps the range it was captured with
    fn correct_chroma_range(parameters: &mut parameters::Parameters, range: isp_types::YuvRange) {
        parameters.dma_output.format = parameters.dma_output.format.with_range(range);
    }
}
