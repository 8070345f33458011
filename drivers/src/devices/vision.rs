use crate::device;
use crate::frame;
use crate::interrupt;
use crate::parameters;
use crate::properties;
use crate::register;
use crate::register::Register;

register::register! { InterruptStatus, 0x0500, {
    done: 0..1,
    reserved_1_4: 1..4,
    timeout: 4..5,
    reserved_5_32: 5..32,
} }
register::register! { InterruptClear, 0x0504, { value: 0..32 } }

pub struct Block;

impl device::Hwip for Block {
    const PROPERTIES: properties::Block = properties::Block {
        name: "Vision accelerator",
        interrupts: 1,
        accelerated_interrupts: false,
        dma_paths: &[frame::DmaPath::Input],
        primary_input: Some(frame::DmaPath::Input),
        upstream: None,
        chroma_sibling: None,
    };

    // the accelerator reports one completion per frame, without a start event
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
            frame_start: false,
            frame_end: status.done == 1,
            fault: (status.timeout == 1).then(|| status.value()),
        }
    }

    fn correct_chroma_range(_parameters: &mut parameters::Parameters, _range: isp_types::YuvRange) {}
}
