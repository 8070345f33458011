use crate::backend;
use crate::block;
use crate::configuration;
use crate::devices;
use crate::error;
use crate::frame;
use crate::interrupt;
use crate::parameters;
use crate::register;
use crate::setfile;
use crate::slot;
use crate::state;
use crate::topology;

/// Entry point of the external scheduler.
///
/// Slots are addressed by their registry index. Instances index the
/// per-block sessions and the Region.
pub struct Pipeline {
    configuration: configuration::Configuration,
    registry: slot::SlotRegistry,
    blocks: Vec<std::sync::Arc<block::Block>>,
    router: std::sync::Arc<interrupt::Router>,
    region: std::sync::Arc<std::sync::RwLock<parameters::Region>>,
    topology: std::sync::Mutex<topology::Topology>,
    configurator: topology::Configurator,
    flag: error::Flag,
}

impl Pipeline {
    pub fn new(
        configuration: configuration::Configuration,
        registry: slot::SlotRegistry,
        backend: std::sync::Arc<dyn backend::Backend>,
        accelerated_context: std::sync::Arc<dyn interrupt::AcceleratedContext>,
        routing_window: std::sync::Arc<dyn register::Window>,
    ) -> Self {
        let flag = error::Flag::new();
        let router = std::sync::Arc::new(interrupt::Router::new(
            accelerated_context,
            flag.clone(),
        ));
        let blocks = registry
            .iter()
            .map(|slot| {
                let properties = slot.kind.properties();
                for (line, handler) in slot.interrupts.iter().zip(interrupt::HandlerSlot::ALL) {
                    router.bind(*line, slot.index, handler, properties.accelerated_interrupts);
                }
                std::sync::Arc::new(block::Block::new(
                    slot,
                    backend.clone(),
                    &configuration,
                    flag.clone(),
                ))
            })
            .collect();
        let configurator =
            topology::Configurator::new(routing_window, configuration.secure_build);
        Self {
            region: std::sync::Arc::new(std::sync::RwLock::new(parameters::Region::new(
                configuration.instances,
            ))),
            configuration,
            registry,
            blocks,
            router,
            topology: std::sync::Mutex::new(topology::Topology::default()),
            configurator,
            flag,
        }
    }

    pub fn configuration(&self) -> &configuration::Configuration {
        &self.configuration
    }

    pub fn registry(&self) -> &slot::SlotRegistry {
        &self.registry
    }

    /// Shared parameter blob, written by the configuration layer.
    pub fn region(&self) -> std::sync::Arc<std::sync::RwLock<parameters::Region>> {
        self.region.clone()
    }

    /// First error and warning raised by interrupt handlers.
    pub fn flag(&self) -> &error::Flag {
        &self.flag
    }

    pub fn block(&self, slot: usize) -> Result<&block::Block, error::Error> {
        self.blocks
            .get(slot)
            .map(|block| block.as_ref())
            .ok_or(error::Error::InvalidBlockId(slot))
    }

    pub fn state(&self, slot: usize) -> Result<state::State, error::Error> {
        Ok(self.block(slot)?.state())
    }

    pub fn param_set(
        &self,
        slot: usize,
        instance: u32,
    ) -> Result<parameters::ParamSet, error::Error> {
        self.block(slot)?.param_set(instance)
    }

    pub fn open(&self, slot: usize, instance: u32) -> Result<(), error::Error> {
        let block = self.block(slot)?;
        let first = !block.state().is_open();
        match block.open(instance) {
            Err(error::Error::AlreadyOpen(_)) => {
                log::debug!(
                    "{} (slot {slot}) is already open by instance {instance}",
                    block.kind()
                );
                return Ok(());
            }
            result => result?,
        }
        if first && block.kind() == devices::Kind::Temporal {
            self.update_topology(|topology| topology.temporal_open = true);
        }
        Ok(())
    }

    /// Initializes the block for `instance` and installs its interrupt handlers.
    pub fn init(&self, slot: usize, instance: u32) -> Result<(), error::Error> {
        let block = self.block(slot)?;
        block.init(instance)?;
        let descriptor = self.registry.get(slot)?;
        for source in interrupt::HandlerSlot::ALL
            .into_iter()
            .take(descriptor.interrupts.len())
        {
            if self.router.is_registered(slot, source) {
                continue;
            }
            let block = self.blocks[slot].clone();
            let window = descriptor.window.clone();
            self.router.register(
                slot,
                source,
                Box::new(move || block.handle_interrupt(window.as_ref(), source)),
            );
        }
        Ok(())
    }

    pub fn enable(&self, slot: usize, instance: u32) -> Result<(), error::Error> {
        self.block(slot)?.enable(instance)
    }

    pub fn disable(&self, slot: usize, instance: u32) -> Result<(), error::Error> {
        self.block(slot)?
            .disable(instance, self.configuration.stop_timeout)
    }

    pub fn close(&self, slot: usize, instance: u32) -> Result<(), error::Error> {
        let block = self.block(slot)?;
        let result = block.close(instance);
        if !block.is_opened_by_any() {
            for handler_slot in interrupt::HandlerSlot::ALL {
                self.router.unregister(slot, handler_slot);
            }
            if block.kind() == devices::Kind::Temporal {
                self.update_topology(|topology| topology.temporal_open = false);
            }
        }
        result
    }

    /// Applies the Region fields named by (`low`, `high`) to the block's parameter set.
    pub fn set_param(
        &self,
        slot: usize,
        instance: u32,
        low: u32,
        high: u32,
    ) -> Result<usize, error::Error> {
        let block = self.block(slot)?;
        let region = self.region.read().expect("lock is not poisoned");
        block.set_param(&region, parameters::DirtyMask::new(low, high), instance)
    }

    pub fn shot(
        &self,
        slot: usize,
        frame: &std::sync::Arc<frame::Frame>,
        active: block::ActiveMask,
    ) -> Result<(), error::Error> {
        let block = self.block(slot)?;
        let neighbours = block::Neighbours {
            upstream: self
                .registry
                .upstream_of(slot)
                .map(|upstream| self.blocks[upstream.index].as_ref()),
            chroma_sibling: self
                .registry
                .chroma_sibling_of(slot)
                .map(|sibling| self.blocks[sibling.index].as_ref()),
        };
        let region = self.region.read().expect("lock is not poisoned");
        block.shot(frame, active, &region, neighbours)
    }

    pub fn load_setfile(
        &self,
        slot: usize,
        instance: u32,
        table: &setfile::SetfileTable,
    ) -> Result<(), error::Error> {
        self.block(slot)?.load_setfile(instance, table)
    }

    pub fn apply_setfile(
        &self,
        slot: usize,
        instance: u32,
        table: &setfile::SetfileTable,
        scenario: usize,
    ) -> Result<(), error::Error> {
        self.block(slot)?.apply_setfile(instance, table, scenario)
    }

    pub fn delete_setfile(&self, slot: usize, instance: u32) -> Result<(), error::Error> {
        self.block(slot)?.delete_setfile(instance)
    }

    pub fn get_ctrl(&self, slot: usize, id: block::ControlId) -> Result<u32, error::Error> {
        Ok(self.block(slot)?.get_control(id))
    }

    pub fn set_ctrl(
        &self,
        slot: usize,
        id: block::ControlId,
        value: u32,
    ) -> Result<(), error::Error> {
        self.block(slot)?.set_control(id, value);
        Ok(())
    }

    pub fn meta(
        &self,
        slot: usize,
        instance: u32,
        frame_count: u32,
    ) -> Result<Vec<u8>, error::Error> {
        self.block(slot)?.meta(instance, frame_count)
    }

    /// Called from the interrupt context of `line`.
    pub fn interrupt(&self, line: u32) -> Result<(), error::Error> {
        self.router.fire(line)
    }

    pub fn open_sensor(
        &self,
        channel: u8,
        chain: topology::BayerChain,
    ) -> Result<topology::Report, error::Error> {
        topology::check_channel(channel)?;
        Ok(self.update_topology(|topology| {
            topology.sensors.insert(channel, chain);
        }))
    }

    pub fn close_sensor(&self, channel: u8) -> Result<topology::Report, error::Error> {
        topology::check_channel(channel)?;
        Ok(self.update_topology(|topology| {
            topology.sensors.remove(&channel);
        }))
    }

    pub fn set_secure(&self, secured: bool) -> topology::Report {
        self.update_topology(|topology| topology.secured = secured)
    }

    pub fn topology(&self) -> topology::Topology {
        self.topology
            .lock()
            .expect("mutex is not poisoned")
            .clone()
    }

    fn update_topology<Update>(&self, update: Update) -> topology::Report
    where
        Update: FnOnce(&mut topology::Topology),
    {
        let mut topology = self.topology.lock().expect("mutex is not poisoned");
        update(&mut topology);
        self.configurator.apply(&topology)
    }
}
