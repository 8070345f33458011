use crate::device;
use crate::frame;
use crate::interrupt;
use crate::properties;
use crate::register;
use crate::register::Register;

register::register! { InterruptStatus, 0x0040, {
    frame_start: 0..1,
    frame_end: 1..2,
    line_overflow: 2..3,
    reserved_3_16: 3..16,
    lane_error: 16..20,
    reserved_20_32: 20..32,
} }
register::register! { InterruptClear, 0x0044, { value: 0..32 } }

pub struct Block;

impl device::Hwip for Block {
    const PROPERTIES: properties::Block = properties::Block {
        name: "Capture front-end",
        interrupts: 1,
        accelerated_interrupts: false,
        dma_paths: &[frame::DmaPath::Output],
        primary_input: None,
        upstream: None,
        chroma_sibling: None,
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
            fault: (status.line_overflow == 1 || status.lane_error != 0).then(|| status.value()),
        }
    }
}
