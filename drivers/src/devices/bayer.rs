use crate::device;
use crate::devices;
use crate::frame;
use crate::interrupt;
use crate::properties;
use crate::register;
use crate::register::Register;

register::register! { FrameStatus, 0x0100, {
    frame_start: 0..1,
    frame_end: 1..2,
    reserved_2_8: 2..8,
    dma_error: 8..12,
    reserved_12_32: 12..32,
} }
register::register! { FrameClear, 0x0104, { value: 0..32 } }
register::register! { StatisticsStatus, 0x0108, {
    statistics_done: 0..1,
    reserved_1_8: 1..8,
    statistics_overflow: 8..9,
    reserved_9_32: 9..32,
} }
register::register! { StatisticsClear, 0x010C, { value: 0..32 } }

pub struct Block;

impl device::Hwip for Block {
    const PROPERTIES: properties::Block = properties::Block {
        name: "Bayer processor",
        interrupts: 2,
        accelerated_interrupts: true,
        dma_paths: &[
            frame::DmaPath::Input,
            frame::DmaPath::Output,
            frame::DmaPath::SubOutput,
        ],
        primary_input: Some(frame::DmaPath::Input),
        upstream: Some(devices::Kind::Capture),
        chroma_sibling: None,
    };

    fn interrupt_events(
        window: &dyn register::Window,
        source: interrupt::HandlerSlot,
    ) -> interrupt::Events {
        match source {
            interrupt::HandlerSlot::Primary => {
                let status = FrameStatus::read(window);
                FrameClear {
                    value: status.value(),
                }
                .write(window);
                interrupt::Events {
                    frame_start: status.frame_start == 1,
                    frame_end: status.frame_end == 1,
                    fault: (status.dma_error != 0).then(|| status.value()),
                }
            }
            // statistics are collected by the backend, only faults matter here
            interrupt::HandlerSlot::Secondary => {
                let status = StatisticsStatus::read(window);
                StatisticsClear {
                    value: status.value(),
                }
                .write(window);
                interrupt::Events {
                    frame_start: false,
                    frame_end: false,
                    fault: (status.statistics_overflow == 1).then(|| status.value()),
                }
            }
        }
    }
}
