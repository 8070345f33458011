use crate::devices;
use crate::error;
use crate::frame;

/// Presence bitmap of logical fields, bit `i` marks field `i` as changed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DirtyMask {
    pub low: u32,
    pub high: u32,
}

impl DirtyMask {
    pub const EMPTY: DirtyMask = DirtyMask { low: 0, high: 0 };

    pub fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            low: (bits & 0xffffffff) as u32,
            high: (bits >> 32) as u32,
        }
    }

    pub fn from_fields(fields: &[Field]) -> Self {
        fields
            .iter()
            .fold(Self::EMPTY, |mask, field| mask.with(*field))
    }

    pub fn bits(self) -> u64 {
        (self.low as u64) | ((self.high as u64) << 32)
    }

    pub fn is_set(self, index: u32) -> bool {
        index < 64 && (self.bits() >> index) & 1 == 1
    }

    pub fn is_empty(self) -> bool {
        self.bits() == 0
    }

    pub fn with(self, field: Field) -> Self {
        Self::from_bits(self.bits() | (1u64 << field.index()))
    }
}

macro_rules! parameters {
    ($($index:literal => $name:ident: $record:ty),+ $(,)?) => {
        paste::paste! {
            #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
            pub enum Field {
                $(
                    [<$name:camel>] = $index,
                )+
            }

            $(
                const _: () = assert!($index < 64);
            )+

            impl Field {
                pub const ALL: &'static [Field] = &[
                    $(
                        Field::[<$name:camel>],
                    )+
                ];

                pub fn index(self) -> u32 {
                    self as u32
                }

                pub fn from_index(index: u32) -> Option<Self> {
                    match index {
                        $(
                            $index => Some(Self::[<$name:camel>]),
                        )+
                        _ => None,
                    }
                }

                fn known_bits() -> u64 {
                    0u64
                    $(
                        | (1u64 << $index)
                    )+
                }
            }

            /// Logical parameters of one block kind in one pipeline instance.
            #[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
            pub struct Parameters {
                $(
                    pub $name: $record,
                )+
            }

            impl Parameters {
                pub fn copy_field(&mut self, source: &Parameters, field: Field) {
                    match field {
                        $(
                            Field::[<$name:camel>] => self.$name = source.$name,
                        )+
                    }
                }
            }
        }
    };
}

parameters! {
    0 => control: isp_types::Control,
    1 => otf_input: isp_types::OtfInput,
    2 => dma_input: isp_types::DmaInput,
    3 => otf_output: isp_types::OtfOutput,
    4 => dma_output: isp_types::DmaOutput,
    5 => dma_sub_output: isp_types::DmaOutput,
    32 => output_range: isp_types::OutputRange,
    33 => vision_roi: isp_types::VisionRoi,
}

impl Parameters {
    pub fn command(&self, path: frame::DmaPath) -> isp_types::Command {
        match path {
            frame::DmaPath::Input => self.dma_input.command,
            frame::DmaPath::Output => self.dma_output.command,
            frame::DmaPath::SubOutput => self.dma_sub_output.command,
        }
    }

    pub fn set_command(&mut self, path: frame::DmaPath, command: isp_types::Command) {
        match path {
            frame::DmaPath::Input => self.dma_input.command = command,
            frame::DmaPath::Output => self.dma_output.command = command,
            frame::DmaPath::SubOutput => self.dma_sub_output.command = command,
        }
    }
}

/// Parameters of every block kind for each pipeline instance, owned by the
/// configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub instances: Vec<[Parameters; devices::Kind::COUNT]>,
}

impl Region {
    pub fn new(instances: usize) -> Self {
        Self {
            instances: vec![Default::default(); instances],
        }
    }

    pub fn deserialize_bincode(data: &[u8]) -> bincode::Result<Region> {
        bincode::deserialize(data)
    }

    pub fn parameters(
        &self,
        instance: u32,
        kind: devices::Kind,
    ) -> Result<&Parameters, error::Error> {
        self.instances
            .get(instance as usize)
            .map(|stages| &stages[kind.index()])
            .ok_or(error::Error::OutOfRange {
                index: instance as usize,
                limit: self.instances.len(),
            })
    }

    pub fn parameters_mut(
        &mut self,
        instance: u32,
        kind: devices::Kind,
    ) -> Option<&mut Parameters> {
        self.instances
            .get_mut(instance as usize)
            .map(|stages| &mut stages[kind.index()])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameCount {
    External(u32),
    Internal(u32),
}

impl Default for FrameCount {
    fn default() -> Self {
        Self::External(0)
    }
}

/// Accumulated configuration of one (block, instance) pair.
///
/// Only the fields named by a dirty mask are replaced on update, everything
/// else keeps the value of the previous shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSet {
    pub kind: devices::Kind,
    pub instance: u32,
    pub parameters: Parameters,
    pub addresses: [Vec<frame::DmaAddress>; frame::DmaPath::COUNT],
    pub frame_count: FrameCount,
    pub reprocessing: bool,
    pub downstream: Option<isp_types::Geometry>,
}

impl ParamSet {
    pub fn new(kind: devices::Kind, instance: u32) -> Self {
        Self {
            kind,
            instance,
            parameters: Parameters::default(),
            addresses: Default::default(),
            frame_count: FrameCount::default(),
            reprocessing: false,
            downstream: None,
        }
    }

    /// Copies the records whose dirty bit is set from this block's parameters
    /// of `instance` in the region.
    pub fn update(
        &mut self,
        region: &Region,
        mask: DirtyMask,
        instance: u32,
    ) -> Result<usize, error::Error> {
        if mask.is_empty() {
            return Ok(0);
        }
        let source = region.parameters(instance, self.kind)?;
        let unknown = mask.bits() & !Field::known_bits();
        if unknown != 0 {
            log::debug!("ignoring dirty bits without a field ({unknown:#018x})");
        }
        let mut copied = 0;
        for field in Field::ALL {
            if mask.is_set(field.index()) {
                self.parameters.copy_field(source, *field);
                copied += 1;
            }
        }
        Ok(copied)
    }

    pub fn addresses(&self, path: frame::DmaPath) -> &[frame::DmaAddress] {
        &self.addresses[path as usize]
    }

    /// Frame size and crop this block receives, reported to its upstream block.
    pub fn geometry(&self) -> isp_types::Geometry {
        isp_types::Geometry {
            width: self.parameters.otf_input.width,
            height: self.parameters.otf_input.height,
            crop: self.parameters.otf_input.crop,
        }
    }
}
