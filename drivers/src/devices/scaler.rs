use crate::device;
use crate::frame;
use crate::interrupt;
use crate::properties;
use crate::register;
use crate::register::Register;

register::register! { InterruptStatus, 0x0400, {
    frame_start: 0..1,
    frame_end: 1..2,
    reserved_2_8: 2..8,
    output_overflow: 8..13,
    reserved_13_32: 13..32,
} }
register::register! { InterruptClear, 0x0404, { value: 0..32 } }

pub struct Block;

impl device::Hwip for Block {
    const PROPERTIES: properties::Block = properties::Block {
        name: "Multi-channel scaler",
        interrupts: 1,
        accelerated_interrupts: false,
        dma_paths: &[
            frame::DmaPath::Input,
            frame::DmaPath::Output,
            frame::DmaPath::SubOutput,
        ],
        primary_input: Some(frame::DmaPath::Input),
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
            fault: (status.output_overflow != 0).then(|| status.value()),
        }
    }
}
