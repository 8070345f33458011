use crate::error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HandlerSlot {
    Primary = 0,
    Secondary = 1,
}

impl HandlerSlot {
    pub const ALL: [HandlerSlot; 2] = [Self::Primary, Self::Secondary];
}

/// Conditions decoded from a block's interrupt status register.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Events {
    pub frame_start: bool,
    pub frame_end: bool,
    pub fault: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    SpuriousFrameEnd { slot: usize },
}

/// Execution context some handlers need (vector registers, for instance).
pub trait AcceleratedContext: Send + Sync {
    fn enter(&self);

    fn exit(&self);
}

pub struct NoAcceleration;

impl AcceleratedContext for NoAcceleration {
    fn enter(&self) {}

    fn exit(&self) {}
}

/// Enters the accelerated context on creation and exits it on drop.
pub struct AcceleratedGuard<'a> {
    context: &'a dyn AcceleratedContext,
}

impl<'a> AcceleratedGuard<'a> {
    pub fn enter(context: &'a dyn AcceleratedContext) -> Self {
        context.enter();
        Self { context }
    }
}

impl Drop for AcceleratedGuard<'_> {
    fn drop(&mut self) {
        self.context.exit();
    }
}

pub type Handler = Box<dyn Fn() -> Result<(), error::Error> + Send + Sync + 'static>;

#[derive(Default)]
struct Entry {
    accelerated: bool,
    handlers: [Option<Handler>; 2],
}

#[derive(Debug, Copy, Clone)]
struct Binding {
    entry: usize,
    handler: HandlerSlot,
}

#[derive(Default)]
struct Table {
    lines: std::collections::HashMap<u32, Binding>,
    entries: std::collections::HashMap<usize, Entry>,
}

/// Dispatch table from physical interrupt lines to handler slots.
pub struct Router {
    table: std::sync::RwLock<Table>,
    accelerated_context: std::sync::Arc<dyn AcceleratedContext>,
    flag: error::Flag,
}

impl Router {
    pub fn new(
        accelerated_context: std::sync::Arc<dyn AcceleratedContext>,
        flag: error::Flag,
    ) -> Self {
        Self {
            table: std::sync::RwLock::new(Table::default()),
            accelerated_context,
            flag,
        }
    }

    /// Binds `line` to one handler slot of `entry`. Setup time only.
    pub fn bind(&self, line: u32, entry: usize, handler: HandlerSlot, accelerated: bool) {
        let mut table = self.table.write().expect("lock is not poisoned");
        table.lines.insert(line, Binding { entry, handler });
        table.entries.entry(entry).or_default().accelerated |= accelerated;
    }

    pub fn register(&self, entry: usize, slot: HandlerSlot, handler: Handler) {
        let mut table = self.table.write().expect("lock is not poisoned");
        table.entries.entry(entry).or_default().handlers[slot as usize] = Some(handler);
    }

    pub fn unregister(&self, entry: usize, slot: HandlerSlot) {
        let mut table = self.table.write().expect("lock is not poisoned");
        if let Some(entry) = table.entries.get_mut(&entry) {
            entry.handlers[slot as usize] = None;
        }
    }

    pub fn is_registered(&self, entry: usize, slot: HandlerSlot) -> bool {
        self.table
            .read()
            .expect("lock is not poisoned")
            .entries
            .get(&entry)
            .map_or(false, |entry| entry.handlers[slot as usize].is_some())
    }

    pub fn flag(&self) -> &error::Flag {
        &self.flag
    }

    pub fn fire(&self, line: u32) -> Result<(), error::Error> {
        let table = self.table.read().expect("lock is not poisoned");
        let (binding, entry) = match table
            .lines
            .get(&line)
            .and_then(|binding| Some((*binding, table.entries.get(&binding.entry)?)))
        {
            Some(found) => found,
            None => {
                log::error!("interrupt line {line} is not bound");
                let error = error::Error::EmptyHandler {
                    line,
                    handler: HandlerSlot::Primary,
                };
                self.flag.store_error_if_not_set(error.clone());
                return Err(error);
            }
        };
        let handler = match &entry.handlers[binding.handler as usize] {
            Some(handler) => handler,
            None => {
                log::error!(
                    "interrupt line {line} fired without a {:?} handler (entry {})",
                    binding.handler,
                    binding.entry
                );
                let error = error::Error::EmptyHandler {
                    line,
                    handler: binding.handler,
                };
                self.flag.store_error_if_not_set(error.clone());
                return Err(error);
            }
        };
        let result = if entry.accelerated {
            let _guard = AcceleratedGuard::enter(self.accelerated_context.as_ref());
            handler()
        } else {
            handler()
        };
        if let Err(error) = &result {
            self.flag.store_error_if_not_set(error.clone());
        }
        result
    }
}
