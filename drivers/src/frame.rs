use crate::parameters;

pub use isp_types::DmaAddress;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DmaPath {
    Input = 0,
    Output = 1,
    SubOutput = 2,
}

impl DmaPath {
    pub const COUNT: usize = 3;

    pub const ALL: [DmaPath; Self::COUNT] = [Self::Input, Self::Output, Self::SubOutput];

    /// Out flag retired when this path's write completes.
    pub fn out_flag(self) -> u32 {
        match self {
            Self::Input => 0,
            Self::Output => OUT_CAPTURE_DONE,
            Self::SubOutput => OUT_PREVIEW_DONE,
        }
    }
}

pub const OUT_CAPTURE_DONE: u32 = 1 << 0;
pub const OUT_PREVIEW_DONE: u32 = 1 << 1;

/// Per-frame metadata written by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shot {
    pub dirty: parameters::DirtyMask,
    pub metadata: Vec<u8>,
}

#[derive(Debug)]
pub struct Frame {
    pub instance: u32,
    pub frame_count: u32,
    pub shot: Option<Shot>,
    pub num_buffers: usize,
    pub buffer_cursor: usize,
    pub buffers: [Vec<DmaAddress>; DmaPath::COUNT],
    out_flag: std::sync::atomic::AtomicU32,
    core_flag: std::sync::atomic::AtomicU32,
}

impl Frame {
    pub fn external(instance: u32, frame_count: u32, shot: Shot) -> Self {
        Self::with_shot(instance, frame_count, Some(shot))
    }

    /// A frame the pipeline generates itself, without scheduler metadata.
    pub fn internal(instance: u32, frame_count: u32) -> Self {
        Self::with_shot(instance, frame_count, None)
    }

    fn with_shot(instance: u32, frame_count: u32, shot: Option<Shot>) -> Self {
        Self {
            instance,
            frame_count,
            shot,
            num_buffers: 1,
            buffer_cursor: 0,
            buffers: Default::default(),
            out_flag: std::sync::atomic::AtomicU32::new(0),
            core_flag: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn with_buffers(mut self, path: DmaPath, addresses: Vec<DmaAddress>) -> Self {
        self.buffers[path as usize] = addresses;
        self
    }

    pub fn with_num_buffers(mut self, num_buffers: usize, buffer_cursor: usize) -> Self {
        self.num_buffers = num_buffers;
        self.buffer_cursor = buffer_cursor;
        self
    }

    pub fn with_out_flag(self, out_flag: u32) -> Self {
        self.out_flag
            .store(out_flag, std::sync::atomic::Ordering::Release);
        self
    }

    pub fn is_internal(&self) -> bool {
        self.shot.is_none()
    }

    /// Addresses of `path` for this frame's batch, zero where the scheduler provided none.
    pub fn addresses(&self, path: DmaPath) -> impl Iterator<Item = DmaAddress> + '_ {
        let buffers = &self.buffers[path as usize];
        (self.buffer_cursor..self.buffer_cursor + self.num_buffers)
            .map(move |index| buffers.get(index).copied().unwrap_or(0))
    }

    pub fn out_flag(&self) -> u32 {
        self.out_flag.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn core_flag(&self) -> u32 {
        self.core_flag.load(std::sync::atomic::Ordering::Acquire)
    }

    pub fn expect_core(&self, slot: usize) {
        self.core_flag
            .fetch_or(1 << slot, std::sync::atomic::Ordering::AcqRel);
    }

    /// Withdraws the expectation of a block whose shot was not dispatched.
    pub fn cancel_core(&self, slot: usize) {
        self.core_flag
            .fetch_and(!(1 << slot), std::sync::atomic::Ordering::AcqRel);
    }

    /// Retires `slot` and `outputs`, returns true once nothing is pending.
    pub fn notify_done(&self, slot: usize, outputs: u32) -> bool {
        self.core_flag
            .fetch_and(!(1 << slot), std::sync::atomic::Ordering::AcqRel);
        self.out_flag
            .fetch_and(!outputs, std::sync::atomic::Ordering::AcqRel);
        self.is_done()
    }

    pub fn is_done(&self) -> bool {
        self.out_flag() == 0 && self.core_flag() == 0
    }
}
