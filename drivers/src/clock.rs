use crate::error;
use crate::register;

/// Clock gate shared by several blocks.
///
/// The gate field reads 1 while the clock is gated. It is cleared when the
/// first consumer acquires the resource and set again when the last one
/// releases it.
pub struct Resource {
    window: std::sync::Arc<dyn register::Window>,
    gate: register::Field,
    counts: std::sync::Mutex<Vec<u32>>,
}

impl Resource {
    pub fn new(
        window: std::sync::Arc<dyn register::Window>,
        gate: register::Field,
        consumers: usize,
    ) -> Self {
        gate.modify(window.as_ref(), 1);
        Self {
            window,
            gate,
            counts: std::sync::Mutex::new(vec![0; consumers]),
        }
    }

    pub fn acquire(&self, bit: usize) -> Result<(), error::Error> {
        let mut counts = self.counts.lock().expect("mutex is not poisoned");
        let limit = counts.len();
        let idle = counts.iter().all(|count| *count == 0);
        let count = counts
            .get_mut(bit)
            .ok_or(error::Error::OutOfRange { index: bit, limit })?;
        *count += 1;
        if idle {
            self.gate.modify(self.window.as_ref(), 0);
        }
        Ok(())
    }

    pub fn release(&self, bit: usize) -> Result<(), error::Error> {
        let mut counts = self.counts.lock().expect("mutex is not poisoned");
        let limit = counts.len();
        let count = counts
            .get_mut(bit)
            .ok_or(error::Error::OutOfRange { index: bit, limit })?;
        if *count == 0 {
            log::error!("clock gate consumer {bit} released more often than acquired");
            return Ok(());
        }
        *count -= 1;
        if counts.iter().all(|count| *count == 0) {
            self.gate.modify(self.window.as_ref(), 1);
        }
        Ok(())
    }

    pub fn count(&self, bit: usize) -> u32 {
        self.counts
            .lock()
            .expect("mutex is not poisoned")
            .get(bit)
            .copied()
            .unwrap_or(0)
    }

    pub fn is_gated(&self) -> bool {
        self.gate.read(self.window.as_ref()) == 1
    }
}

#[derive(Clone)]
pub struct Binding {
    pub resource: std::sync::Arc<Resource>,
    pub bit: usize,
}
