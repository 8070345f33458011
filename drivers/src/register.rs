/// A window of 32-bit registers addressed by byte offset.
///
/// Accesses outside of the window are logged. Reads return 0 and writes are dropped.
pub trait Window: Send + Sync {
    fn read(&self, offset: u32) -> u32;

    fn write(&self, offset: u32, value: u32);
}

/// A bit-field within the register at `offset`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Field {
    pub offset: u32,
    pub bit_position: u32,
    pub bit_width: u32,
}

impl Field {
    pub const fn new(offset: u32, bit_position: u32, bit_width: u32) -> Self {
        assert!(bit_width > 0 && bit_position + bit_width <= 32);
        Self {
            offset,
            bit_position,
            bit_width,
        }
    }

    pub const fn mask(&self) -> u32 {
        (((1u64 << self.bit_width) - 1) as u32) << self.bit_position
    }

    pub const fn get(&self, register: u32) -> u32 {
        (register & self.mask()) >> self.bit_position
    }

    /// Returns `register` with this field replaced by `value` (truncated to the field width).
    pub const fn set(&self, register: u32, value: u32) -> u32 {
        (register & !self.mask()) | ((value << self.bit_position) & self.mask())
    }

    pub fn read(&self, window: &dyn Window) -> u32 {
        self.get(window.read(self.offset))
    }

    pub fn modify(&self, window: &dyn Window, value: u32) {
        let register = window.read(self.offset);
        window.write(self.offset, self.set(register, value));
    }
}

pub trait Register: Sized {
    const ADDRESS: u32;

    const FIELDS: &'static [Field];

    fn value(&self) -> u32;

    fn from_value(value: u32) -> Self;

    fn read(window: &dyn Window) -> Self {
        Self::from_value(window.read(Self::ADDRESS))
    }

    fn write(&self, window: &dyn Window) {
        window.write(Self::ADDRESS, self.value());
    }
}

macro_rules! register {
    ($name:ident, $address:literal, {$($subname:ident: $substart:literal..$subend:literal),+ $(,)?}) => {
        paste::paste! {
            #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
            pub struct $name {
                $(
                    pub $subname: u32,
                )+
            }

            $(
                const _: () = assert!($substart < $subend && $subend <= 32);
            )+

            impl $name {
                $(
                    pub const [<$subname:upper>]: $crate::register::Field =
                        $crate::register::Field::new($address, $substart, $subend - $substart);
                )+
            }

            impl $crate::register::Register for $name {
                const ADDRESS: u32 = $address;

                const FIELDS: &'static [$crate::register::Field] = &[
                    $(
                        Self::[<$subname:upper>],
                    )+
                ];

                fn value(&self) -> u32 {
                    0u32
                    $(
                        | Self::[<$subname:upper>].set(0, self.$subname)
                    )+
                }

                fn from_value(value: u32) -> Self {
                    Self {
                        $(
                            $subname: Self::[<$subname:upper>].get(value),
                        )+
                    }
                }
            }
        }
    };
}

pub(crate) use register;

/// Register file kept in memory, used to simulate blocks and SoC registers.
pub struct MemoryWindow {
    registers: std::sync::Mutex<Vec<u32>>,
    writes: std::sync::atomic::AtomicUsize,
}

impl MemoryWindow {
    pub fn new(length: u32) -> Self {
        Self {
            registers: std::sync::Mutex::new(vec![0; (length as usize).div_ceil(4)]),
            writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Stores a value without counting it as a bus write.
    pub fn poke(&self, offset: u32, value: u32) {
        if let Some(register) = self
            .registers
            .lock()
            .expect("mutex is not poisoned")
            .get_mut((offset / 4) as usize)
        {
            *register = value;
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(std::sync::atomic::Ordering::Acquire)
    }
}

impl Window for MemoryWindow {
    fn read(&self, offset: u32) -> u32 {
        match self
            .registers
            .lock()
            .expect("mutex is not poisoned")
            .get((offset / 4) as usize)
        {
            Some(value) => *value,
            None => {
                log::error!("read outside of the register window (offset {offset:#06x})");
                0
            }
        }
    }

    fn write(&self, offset: u32, value: u32) {
        match self
            .registers
            .lock()
            .expect("mutex is not poisoned")
            .get_mut((offset / 4) as usize)
        {
            Some(register) => {
                *register = value;
                self.writes
                    .fetch_add(1, std::sync::atomic::Ordering::AcqRel);
            }
            None => log::error!("write outside of the register window (offset {offset:#06x})"),
        }
    }
}

pub struct MmioWindow {
    base: std::ptr::NonNull<u32>,
    length: u32,
}

unsafe impl Send for MmioWindow {}
unsafe impl Sync for MmioWindow {}

impl MmioWindow {
    /// # Safety
    ///
    /// `base` must point to a mapped, 4-byte aligned register window of at least
    /// `length` bytes that stays mapped for the lifetime of the returned value.
    pub unsafe fn new(base: std::ptr::NonNull<u8>, length: u32) -> Self {
        Self {
            base: base.cast(),
            length,
        }
    }
}

impl Window for MmioWindow {
    fn read(&self, offset: u32) -> u32 {
        if offset % 4 != 0 || offset >= self.length {
            log::error!("read outside of the register window (offset {offset:#06x})");
            return 0;
        }
        // unsafe: offset is aligned and within the mapped window
        unsafe { std::ptr::read_volatile(self.base.as_ptr().add((offset / 4) as usize)) }
    }

    fn write(&self, offset: u32, value: u32) {
        if offset % 4 != 0 || offset >= self.length {
            log::error!("write outside of the register window (offset {offset:#06x})");
            return;
        }
        // unsafe: offset is aligned and within the mapped window
        unsafe { std::ptr::write_volatile(self.base.as_ptr().add((offset / 4) as usize), value) }
    }
}
