use crate::clock;
use crate::devices;
use crate::error;
use crate::register;

/// Slot indices double as bit positions in frame completion flags.
pub const MAX_SLOTS: usize = 32;

pub struct Slot {
    pub kind: devices::Kind,
    pub index: usize,
    pub channel: u8,
    pub window: std::sync::Arc<dyn register::Window>,
    /// Interrupt lines, the position is the handler slot (primary, secondary).
    pub interrupts: Vec<u32>,
    pub clock_gate: Option<clock::Binding>,
}

pub struct Descriptor {
    pub kind: devices::Kind,
    pub channel: u8,
    pub window: std::sync::Arc<dyn register::Window>,
    pub interrupts: Vec<u32>,
    pub clock_gate: Option<clock::Binding>,
}

/// Hardware blocks of the system, fixed after bring-up.
pub struct SlotRegistry {
    slots: Vec<Slot>,
}

impl SlotRegistry {
    pub fn builder() -> Builder {
        Builder { slots: Vec::new() }
    }

    pub fn get(&self, index: usize) -> Result<&Slot, error::Error> {
        self.slots
            .get(index)
            .ok_or(error::Error::InvalidBlockId(index))
    }

    pub fn find(&self, kind: devices::Kind, channel: u8) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|slot| slot.kind == kind && slot.channel == channel)
    }

    /// The block feeding `index` on the fly, on the same channel.
    pub fn upstream_of(&self, index: usize) -> Option<&Slot> {
        let slot = self.slots.get(index)?;
        self.find(slot.kind.properties().upstream?, slot.channel)
    }

    pub fn chroma_sibling_of(&self, index: usize) -> Option<&Slot> {
        let slot = self.slots.get(index)?;
        self.find(slot.kind.properties().chroma_sibling?, slot.channel)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

pub struct Builder {
    slots: Vec<Slot>,
}

impl Builder {
    /// Registers a block and returns its slot index.
    pub fn add(&mut self, descriptor: Descriptor) -> Result<usize, error::Error> {
        let index = self.slots.len();
        if index >= MAX_SLOTS {
            return Err(error::Error::OutOfRange {
                index,
                limit: MAX_SLOTS,
            });
        }
        let expected = descriptor.kind.properties().interrupts;
        if descriptor.interrupts.len() != expected {
            return Err(error::Error::OutOfRange {
                index: descriptor.interrupts.len(),
                limit: expected,
            });
        }
        if let Some(existing) = self
            .slots
            .iter()
            .find(|slot| slot.kind == descriptor.kind && slot.channel == descriptor.channel)
        {
            return Err(error::Error::InvalidBlockId(existing.index));
        }
        self.slots.push(Slot {
            kind: descriptor.kind,
            index,
            channel: descriptor.channel,
            window: descriptor.window,
            interrupts: descriptor.interrupts,
            clock_gate: descriptor.clock_gate,
        });
        Ok(index)
    }

    pub fn build(self) -> SlotRegistry {
        SlotRegistry { slots: self.slots }
    }
}
