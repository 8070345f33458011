use crate::device;
use crate::devices;
use crate::frame;
use crate::interrupt;
use crate::properties;
use crate::register;
use crate::register::Register;

register::register! { ContextStatus0, 0x0200, {
    frame_start: 0..1,
    reserved_1_4: 1..4,
    frame_end: 4..5,
    reserved_5_16: 5..16,
    corrupted: 16..17,
    reserved_17_32: 17..32,
} }
register::register! { ContextStatus1, 0x0204, {
    output_done: 0..1,
    sub_output_done: 1..2,
    reserved_2_16: 2..16,
    write_overflow: 16..18,
    reserved_18_32: 18..32,
} }
register::register! { ContextClear0, 0x0208, { value: 0..32 } }
register::register! { ContextClear1, 0x020C, { value: 0..32 } }

pub struct Block;

impl device::Hwip for Block {
    const PROPERTIES: properties::Block = properties::Block {
        name: "Image signal processor",
        interrupts: 2,
        accelerated_interrupts: true,
        dma_paths: &[
            frame::DmaPath::Input,
            frame::DmaPath::Output,
            frame::DmaPath::SubOutput,
        ],
        primary_input: Some(frame::DmaPath::Input),
        upstream: Some(devices::Kind::Bayer),
        chroma_sibling: Some(devices::Kind::Scaler),
    };

    fn interrupt_events(
        window: &dyn register::Window,
        source: interrupt::HandlerSlot,
    ) -> interrupt::Events {
        match source {
            interrupt::HandlerSlot::Primary => {
                let status = ContextStatus0::read(window);
                ContextClear0 {
                    value: status.value(),
                }
                .write(window);
                interrupt::Events {
                    frame_start: status.frame_start == 1,
                    frame_end: status.frame_end == 1,
                    fault: (status.corrupted == 1).then(|| status.value()),
                }
            }
            interrupt::HandlerSlot::Secondary => {
                let status = ContextStatus1::read(window);
                ContextClear1 {
                    value: status.value(),
                }
                .write(window);
                interrupt::Events {
                    frame_start: false,
                    frame_end: false,
                    fault: (status.write_overflow != 0).then(|| status.value()),
                }
            }
        }
    }
}
