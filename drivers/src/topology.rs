use crate::error;
use crate::register;
use crate::register::Register;

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BayerChain {
    /// Sensor data reaches the bayer processor without binning.
    Pure,
    Processed,
}

/// Runtime inputs that decide the signal routing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    /// Active sensors by channel.
    pub sensors: std::collections::BTreeMap<u8, BayerChain>,
    pub temporal_open: bool,
    pub secured: bool,
}

impl Topology {
    pub fn is_pip(&self) -> bool {
        self.sensors.len() > 1
    }

    /// Channels outside of the sensor mux are not routed.
    fn channel_bits(&self, chain: Option<BayerChain>) -> u32 {
        self.sensors
            .iter()
            .filter(|(channel, _)| u32::from(**channel) < CHANNELS)
            .filter(|(_, sensor_chain)| chain.map_or(true, |chain| **sensor_chain == chain))
            .fold(0, |bits, (channel, _)| bits | (1 << channel))
    }
}

/// Sensor channels the mux can route, one enable bit each.
pub const CHANNELS: u32 = SensorMux::ENABLE.bit_width;

pub fn check_channel(channel: u8) -> Result<(), error::Error> {
    if u32::from(channel) < CHANNELS {
        Ok(())
    } else {
        Err(error::Error::OutOfRange {
            index: channel as usize,
            limit: CHANNELS as usize,
        })
    }
}

register::register! { SensorMux, 0x0000, {
    pip: 0..1,
    wobns: 1..3,
    reserved_3_4: 3..4,
    enable: 4..6,
    reserved_6_32: 6..32,
} }
register::register! { ScalerSource, 0x0004, {
    temporal: 0..1,
    reserved_1_32: 1..32,
} }

struct Group {
    name: &'static str,
    address: u32,
    /// Fields a secured system keeps at their current value.
    secure_fields: &'static [register::Field],
    /// Owned by the secure world while secured, neither read nor written.
    locked_when_secured: bool,
    desired: fn(&Topology, u32) -> u32,
}

const GROUPS: [Group; 2] = [
    Group {
        name: "sensor mux",
        address: SensorMux::ADDRESS,
        secure_fields: &[SensorMux::PIP, SensorMux::ENABLE],
        locked_when_secured: false,
        desired: |topology, current| {
            let mut register = SensorMux::from_value(current);
            register.pip = topology.is_pip() as u32;
            register.wobns = topology.channel_bits(Some(BayerChain::Pure));
            register.enable = topology.channel_bits(None);
            register.value()
        },
    },
    Group {
        name: "scaler source",
        address: ScalerSource::ADDRESS,
        secure_fields: &[],
        locked_when_secured: true,
        desired: |topology, current| {
            let mut register = ScalerSource::from_value(current);
            register.temporal = topology.temporal_open as u32;
            register.value()
        },
    },
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub writes: usize,
    pub locked: usize,
    pub rejected: Vec<register::Field>,
}

/// Programs the SoC routing registers, writing only registers whose value changes.
pub struct Configurator {
    window: std::sync::Arc<dyn register::Window>,
    secure_build: bool,
}

impl Configurator {
    pub fn new(window: std::sync::Arc<dyn register::Window>, secure_build: bool) -> Self {
        Self {
            window,
            secure_build,
        }
    }

    pub fn apply(&self, topology: &Topology) -> Report {
        let secured = self.secure_build && topology.secured;
        let mut report = Report::default();
        for group in GROUPS.iter() {
            if secured && group.locked_when_secured {
                log::debug!("{} is locked while secured", group.name);
                report.locked += 1;
                continue;
            }
            let current = self.window.read(group.address);
            let mut desired = (group.desired)(topology, current);
            if secured {
                for field in group.secure_fields {
                    if field.get(desired) != field.get(current) {
                        log::warn!(
                            "{}: rejected change of bits {:#010x} while secured ({:#x} -> {:#x})",
                            group.name,
                            field.mask(),
                            field.get(current),
                            field.get(desired)
                        );
                        desired = field.set(desired, field.get(current));
                        report.rejected.push(*field);
                    }
                }
            }
            if desired != current {
                log::debug!(
                    "{}: {current:#010x} -> {desired:#010x}",
                    group.name
                );
                self.window.write(group.address, desired);
                report.writes += 1;
            }
        }
        report
    }
}
