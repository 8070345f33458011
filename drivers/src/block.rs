use crate::backend;
use crate::clock;
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

/// Slots taking part in a shot, bit `i` is slot `i`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ActiveMask(pub u64);

impl ActiveMask {
    pub fn from_slots(slots: &[usize]) -> Self {
        Self(slots.iter().fold(0, |mask, slot| mask | (1 << slot)))
    }

    pub fn contains(self, slot: usize) -> bool {
        slot < 64 && (self.0 >> slot) & 1 == 1
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlId {
    /// Whether the last block of the chain writes its result with DMA.
    DmaTerminated,
    FullBypass,
    Reprocessing,
}

#[derive(Debug, Copy, Clone)]
struct Controls {
    dma_terminated: bool,
    full_bypass: bool,
    reprocessing: bool,
}

struct Inner {
    state: state::State,
    chain_created: bool,
    opened: u64,
    objects: u64,
    running: u64,
    controls: Controls,
}

/// Per-instance data of a block.
struct Session {
    param_set: parameters::ParamSet,
    /// Internal frames dispatched since the last external one.
    internal_frames: u32,
    loaded: u64,
}

struct InFlight {
    frame: std::sync::Arc<frame::Frame>,
    outputs: u32,
}

/// Blocks a shot may touch besides its own.
///
/// Lock order follows the chain: a block may lock its upstream's session
/// while holding its own, never the reverse.
#[derive(Clone, Copy, Default)]
pub struct Neighbours<'a> {
    pub upstream: Option<&'a Block>,
    pub chroma_sibling: Option<&'a Block>,
}

/// Runtime side of one hardware block slot.
pub struct Block {
    kind: devices::Kind,
    slot: usize,
    backend: std::sync::Arc<dyn backend::Backend>,
    clock_gate: Option<clock::Binding>,
    max_buffers: usize,
    inner: std::sync::Mutex<Inner>,
    sessions: Vec<std::sync::Mutex<Session>>,
    /// Dispatched frames in dispatch order, retired by frame-end interrupts.
    in_flight: std::sync::Mutex<std::collections::VecDeque<InFlight>>,
    frame_end: std::sync::Condvar,
    flag: error::Flag,
}

impl Block {
    pub fn new(
        slot: &slot::Slot,
        backend: std::sync::Arc<dyn backend::Backend>,
        configuration: &configuration::Configuration,
        flag: error::Flag,
    ) -> Self {
        Self {
            kind: slot.kind,
            slot: slot.index,
            backend,
            clock_gate: slot.clock_gate.clone(),
            max_buffers: configuration.max_buffers,
            inner: std::sync::Mutex::new(Inner {
                state: state::State::default(),
                chain_created: false,
                opened: 0,
                objects: 0,
                running: 0,
                controls: Controls {
                    dma_terminated: true,
                    full_bypass: false,
                    reprocessing: false,
                },
            }),
            sessions: (0..configuration.instances.min(64))
                .map(|instance| {
                    std::sync::Mutex::new(Session {
                        param_set: parameters::ParamSet::new(slot.kind, instance as u32),
                        internal_frames: 0,
                        loaded: 0,
                    })
                })
                .collect(),
            in_flight: std::sync::Mutex::new(std::collections::VecDeque::new()),
            frame_end: std::sync::Condvar::new(),
            flag,
        }
    }

    pub fn kind(&self) -> devices::Kind {
        self.kind
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn state(&self) -> state::State {
        self.inner.lock().expect("mutex is not poisoned").state
    }

    pub fn param_set(&self, instance: u32) -> Result<parameters::ParamSet, error::Error> {
        Ok(self
            .session(instance)?
            .lock()
            .expect("mutex is not poisoned")
            .param_set
            .clone())
    }

    pub fn loaded_setfiles(&self, instance: u32) -> Result<u64, error::Error> {
        Ok(self
            .session(instance)?
            .lock()
            .expect("mutex is not poisoned")
            .loaded)
    }

    fn session(&self, instance: u32) -> Result<&std::sync::Mutex<Session>, error::Error> {
        self.sessions
            .get(instance as usize)
            .ok_or(error::Error::OutOfRange {
                index: instance as usize,
                limit: self.sessions.len(),
            })
    }

    fn instance_bit(&self, instance: u32) -> Result<u64, error::Error> {
        self.session(instance)?;
        Ok(1 << instance)
    }

    fn target(&self, instance: u32) -> backend::Target {
        backend::Target {
            kind: self.kind,
            slot: self.slot,
            instance,
        }
    }

    /// Opens the block for `instance`.
    ///
    /// A repeated open of the same instance changes nothing and returns `AlreadyOpen`.
    pub fn open(&self, instance: u32) -> Result<(), error::Error> {
        let bit = self.instance_bit(instance)?;
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        if inner.opened & bit != 0 {
            return Err(error::Error::AlreadyOpen(self.slot));
        }
        inner.opened |= bit;
        if !inner.state.open() {
            log::debug!(
                "{} (slot {}) is already open, shared with instance {instance}",
                self.kind,
                self.slot
            );
            return Ok(());
        }
        if let Some(clock_gate) = &self.clock_gate {
            if let Err(error) = clock_gate.resource.acquire(clock_gate.bit) {
                inner.opened &= !bit;
                let _ = inner.state.close();
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn init(&self, instance: u32) -> Result<(), error::Error> {
        let bit = self.instance_bit(instance)?;
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        if !inner.state.is_open() {
            return Err(error::Error::NotOpen(self.slot));
        }
        if inner.chain_created {
            log::debug!("{} (slot {}) chain already created", self.kind, self.slot);
        } else {
            self.backend.chain_create(self.kind, self.slot)?;
            inner.chain_created = true;
        }
        if inner.objects & bit != 0 {
            log::debug!(
                "{} (slot {}) object already created for instance {instance}",
                self.kind,
                self.slot
            );
        } else {
            self.backend.object_create(self.target(instance))?;
            inner.objects |= bit;
        }
        inner
            .state
            .init()
            .map_err(|_| error::Error::NotOpen(self.slot))
    }

    pub fn enable(&self, instance: u32) -> Result<(), error::Error> {
        let bit = self.instance_bit(instance)?;
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        if !inner.state.is_initialized() {
            return Err(error::Error::NotInitialized(self.slot));
        }
        if !inner.state.is_running() {
            self.backend
                .set_control(self.target(instance), backend::Control::Start)?;
        }
        inner
            .state
            .enable()
            .map_err(|_| error::Error::NotInitialized(self.slot))?;
        inner.running |= bit;
        Ok(())
    }

    /// Stops the block once no other instance runs on it.
    ///
    /// A frame-end timeout is reported after the stop has been issued.
    pub fn disable(
        &self,
        instance: u32,
        timeout: std::time::Duration,
    ) -> Result<(), error::Error> {
        let bit = self.instance_bit(instance)?;
        {
            let mut inner = self.inner.lock().expect("mutex is not poisoned");
            if inner.running & !bit != 0 {
                inner.running &= !bit;
                log::debug!(
                    "{} (slot {}) still used by instances {:#x}",
                    self.kind,
                    self.slot,
                    inner.running
                );
                return Ok(());
            }
        }
        let timed_out = {
            let in_flight = self.in_flight.lock().expect("mutex is not poisoned");
            let (mut in_flight, result) = self
                .frame_end
                .wait_timeout_while(in_flight, timeout, |in_flight| !in_flight.is_empty())
                .expect("mutex is not poisoned");
            if result.timed_out() {
                log::warn!(
                    "{} (slot {}) did not reach frame end within {timeout:?}, dropping {} frame(s)",
                    self.kind,
                    self.slot,
                    in_flight.len()
                );
                in_flight.clear();
                true
            } else {
                false
            }
        };
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        let stop = if inner.state.is_running() {
            self.backend
                .set_control(self.target(instance), backend::Control::Stop)
        } else {
            Ok(())
        };
        inner.running &= !bit;
        inner.state.stop();
        if timed_out {
            return Err(error::Error::StopTimeout {
                slot: self.slot,
                timeout,
            });
        }
        stop.map_err(error::Error::from)
    }

    pub fn close(&self, instance: u32) -> Result<(), error::Error> {
        let bit = self.instance_bit(instance)?;
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        if !inner.state.is_open() {
            return Err(error::Error::NotOpen(self.slot));
        }
        let mut result = Ok(());
        {
            let mut session = self
                .session(instance)?
                .lock()
                .expect("mutex is not poisoned");
            if let Err(error) = self.unload(instance, &mut session) {
                result = Err(error);
            }
            session.param_set = parameters::ParamSet::new(self.kind, instance);
            session.internal_frames = 0;
        }
        if inner.objects & bit != 0 {
            inner.objects &= !bit;
            if let Err(error) = self.backend.object_destroy(self.target(instance)) {
                result = result.and(Err(error.into()));
            }
        }
        inner.opened &= !bit;
        inner.running &= !bit;
        if inner.opened != 0 {
            return result;
        }
        if inner.chain_created {
            inner.chain_created = false;
            if let Err(error) = self.backend.chain_destroy(self.kind, self.slot) {
                result = result.and(Err(error.into()));
            }
        }
        let _ = inner.state.close();
        if let Some(clock_gate) = &self.clock_gate {
            result = result.and(clock_gate.resource.release(clock_gate.bit));
        }
        result
    }

    pub fn is_opened_by_any(&self) -> bool {
        self.inner.lock().expect("mutex is not poisoned").opened != 0
    }

    /// Applies a parameter diff outside of a shot.
    pub fn set_param(
        &self,
        region: &parameters::Region,
        mask: parameters::DirtyMask,
        instance: u32,
    ) -> Result<usize, error::Error> {
        if !self.state().is_open() {
            return Err(error::Error::NotOpen(self.slot));
        }
        self.session(instance)?
            .lock()
            .expect("mutex is not poisoned")
            .param_set
            .update(region, mask, instance)
    }

    pub fn shot(
        &self,
        frame: &std::sync::Arc<frame::Frame>,
        active: ActiveMask,
        region: &parameters::Region,
        neighbours: Neighbours<'_>,
    ) -> Result<(), error::Error> {
        if !active.contains(self.slot) {
            return Ok(());
        }
        let instance = frame.instance;
        let session = self.session(instance)?;
        let controls = {
            let inner = self.inner.lock().expect("mutex is not poisoned");
            if !inner.state.is_initialized() {
                return Err(error::Error::NotInitialized(self.slot));
            }
            inner.controls
        };
        if frame.num_buffers == 0 || frame.num_buffers > self.max_buffers {
            return Err(error::Error::OutOfRange {
                index: frame.num_buffers,
                limit: self.max_buffers,
            });
        }
        let expects_core = !controls.dma_terminated
            && frame.out_flag() & (frame::OUT_CAPTURE_DONE | frame::OUT_PREVIEW_DONE) == 0;
        let properties = self.kind.properties();

        // sibling range is a snapshot, taken before our own session is locked
        let chroma_range = properties.chroma_sibling.map(|sibling_kind| {
            match neighbours
                .chroma_sibling
                .and_then(|sibling| sibling.output_range(instance))
            {
                Some(range) => range,
                None => {
                    log::warn!(
                        "{} (slot {}) has no {sibling_kind} to read the output range from, using full range",
                        self.kind,
                        self.slot
                    );
                    isp_types::YuvRange::Full
                }
            }
        });

        let mut session = session.lock().expect("mutex is not poisoned");
        let mask = match &frame.shot {
            None => {
                for path in frame::DmaPath::ALL {
                    session
                        .param_set
                        .parameters
                        .set_command(path, isp_types::Command::Disable);
                }
                session.param_set.frame_count =
                    parameters::FrameCount::Internal(frame.frame_count);
                session.internal_frames += 1;
                parameters::DirtyMask::EMPTY
            }
            Some(shot) => {
                if session.internal_frames != 0 {
                    session.internal_frames = 0;
                    let source = region.parameters(instance, self.kind)?;
                    for path in frame::DmaPath::ALL {
                        session
                            .param_set
                            .parameters
                            .set_command(path, source.command(path));
                    }
                }
                session.param_set.frame_count =
                    parameters::FrameCount::External(frame.frame_count);
                shot.dirty
            }
        };
        session.param_set.update(region, mask, instance)?;
        session.param_set.reprocessing = controls.reprocessing;
        if controls.full_bypass {
            session.param_set.parameters.control.bypass = true;
        }

        let mut outputs = 0;
        for path in frame::DmaPath::ALL {
            let param_set = &mut session.param_set;
            if !properties.dma_paths.contains(&path)
                || !param_set.parameters.command(path).is_enabled()
            {
                param_set.addresses[path as usize] = vec![0; frame.num_buffers];
                continue;
            }
            let addresses: Vec<frame::DmaAddress> = frame.addresses(path).collect();
            if let Some(buffer) = addresses.iter().position(|address| *address == 0) {
                if properties.primary_input == Some(path) {
                    return Err(error::Error::MissingBuffer {
                        slot: self.slot,
                        path,
                        buffer: frame.buffer_cursor + buffer,
                    });
                }
                log::warn!(
                    "{} (slot {}) frame {} has no {path:?} buffer at index {}, output disabled",
                    self.kind,
                    self.slot,
                    frame.frame_count,
                    frame.buffer_cursor + buffer
                );
                param_set
                    .parameters
                    .set_command(path, isp_types::Command::Disable);
                param_set.addresses[path as usize] = vec![0; frame.num_buffers];
                continue;
            }
            param_set.addresses[path as usize] = addresses;
            outputs |= path.out_flag();
        }

        if session.param_set.parameters.otf_input.command.is_enabled() {
            if let Some(upstream) = neighbours.upstream {
                if let Err(error) =
                    upstream.accept_downstream_geometry(instance, session.param_set.geometry())
                {
                    log::warn!(
                        "{} (slot {}) could not report its geometry upstream ({error})",
                        self.kind,
                        self.slot
                    );
                }
            }
        }

        if let Some(range) = chroma_range {
            self.kind
                .correct_chroma_range(&mut session.param_set.parameters, range);
        }

        // queued before the dispatch, the frame end may fire as soon as the backend returns
        {
            let mut in_flight = self.in_flight.lock().expect("mutex is not poisoned");
            if !in_flight.is_empty() {
                log::debug!(
                    "{} (slot {}) dispatches frame {} behind {} pending frame(s)",
                    self.kind,
                    self.slot,
                    frame.frame_count,
                    in_flight.len()
                );
            }
            in_flight.push_back(InFlight {
                frame: frame.clone(),
                outputs,
            });
        }
        if expects_core {
            frame.expect_core(self.slot);
        }
        if let Err(error) = self.backend.dispatch_shot(
            self.target(instance),
            &session.param_set,
            frame.shot.as_ref(),
        ) {
            let mut in_flight = self.in_flight.lock().expect("mutex is not poisoned");
            if let Some(position) = in_flight
                .iter()
                .rposition(|pending| std::sync::Arc::ptr_eq(&pending.frame, frame))
            {
                in_flight.remove(position);
            }
            drop(in_flight);
            if expects_core {
                frame.cancel_core(self.slot);
            }
            return Err(error.into());
        }
        drop(session);

        self.inner
            .lock()
            .expect("mutex is not poisoned")
            .state
            .configure()
            .map_err(|_| error::Error::NotInitialized(self.slot))
    }

    /// Output range configured for `instance`, none if the block is not initialized.
    pub fn output_range(&self, instance: u32) -> Option<isp_types::YuvRange> {
        if !self.state().is_initialized() {
            return None;
        }
        self.session(instance).ok().map(|session| {
            session
                .lock()
                .expect("mutex is not poisoned")
                .param_set
                .parameters
                .output_range
                .range
        })
    }

    /// Records the geometry of the on-the-fly successor, the only field another block may write.
    pub fn accept_downstream_geometry(
        &self,
        instance: u32,
        geometry: isp_types::Geometry,
    ) -> Result<(), error::Error> {
        self.session(instance)?
            .lock()
            .expect("mutex is not poisoned")
            .param_set
            .downstream = Some(geometry);
        Ok(())
    }

    /// Decodes one interrupt of this block, called from the interrupt router.
    pub fn handle_interrupt(
        &self,
        window: &dyn register::Window,
        source: interrupt::HandlerSlot,
    ) -> Result<(), error::Error> {
        let events = self.kind.interrupt_events(window, source);
        if events.frame_start {
            log::trace!("{} (slot {}) frame start", self.kind, self.slot);
        }
        if events.frame_end {
            self.complete_frame();
        }
        match events.fault {
            Some(status) => Err(error::Error::HardwareFault {
                slot: self.slot,
                status,
            }),
            None => Ok(()),
        }
    }

    fn complete_frame(&self) {
        let finished = self
            .in_flight
            .lock()
            .expect("mutex is not poisoned")
            .pop_front();
        self.frame_end.notify_all();
        match finished {
            Some(in_flight) => {
                if in_flight.frame.notify_done(self.slot, in_flight.outputs) {
                    log::trace!(
                        "frame {} of instance {} done",
                        in_flight.frame.frame_count,
                        in_flight.frame.instance
                    );
                }
            }
            None => {
                log::warn!(
                    "{} (slot {}) frame end without a frame in flight",
                    self.kind,
                    self.slot
                );
                self.flag
                    .store_warning_if_not_set(interrupt::Warning::SpuriousFrameEnd {
                        slot: self.slot,
                    });
            }
        }
    }

    pub fn get_control(&self, id: ControlId) -> u32 {
        let controls = self.inner.lock().expect("mutex is not poisoned").controls;
        match id {
            ControlId::DmaTerminated => controls.dma_terminated as u32,
            ControlId::FullBypass => controls.full_bypass as u32,
            ControlId::Reprocessing => controls.reprocessing as u32,
        }
    }

    pub fn set_control(&self, id: ControlId, value: u32) {
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        match id {
            ControlId::DmaTerminated => inner.controls.dma_terminated = value != 0,
            ControlId::FullBypass => inner.controls.full_bypass = value != 0,
            ControlId::Reprocessing => inner.controls.reprocessing = value != 0,
        }
    }

    pub fn meta(&self, instance: u32, frame_count: u32) -> Result<Vec<u8>, error::Error> {
        self.instance_bit(instance)?;
        if !self.state().is_initialized() {
            return Err(error::Error::NotInitialized(self.slot));
        }
        Ok(self.backend.get_meta(self.target(instance), frame_count)?)
    }

    /// Creates every tuning set in use. Entries the backend refuses are skipped.
    pub fn load_setfile(
        &self,
        instance: u32,
        table: &setfile::SetfileTable,
    ) -> Result<(), error::Error> {
        table.validate()?;
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        if !inner.state.is_initialized() {
            return Err(error::Error::NotInitialized(self.slot));
        }
        let mut session = self
            .session(instance)?
            .lock()
            .expect("mutex is not poisoned");
        for (index, entry) in table.entries.iter().take(table.using_count).enumerate() {
            match self
                .backend
                .create_tune_set(self.target(instance), index, entry)
            {
                Ok(()) => session.loaded |= 1 << index,
                Err(error) => log::warn!(
                    "{} (slot {}) setfile {index} (version {}) not loaded ({error})",
                    self.kind,
                    self.slot,
                    table.version
                ),
            }
        }
        inner.state.set_tuneset(true);
        Ok(())
    }

    pub fn apply_setfile(
        &self,
        instance: u32,
        table: &setfile::SetfileTable,
        scenario: usize,
    ) -> Result<(), error::Error> {
        let index = table.resolve(scenario)?;
        self.instance_bit(instance)?;
        if !self.state().is_initialized() {
            return Err(error::Error::NotInitialized(self.slot));
        }
        Ok(self
            .backend
            .apply_tune_set(self.target(instance), index)?)
    }

    pub fn delete_setfile(&self, instance: u32) -> Result<(), error::Error> {
        let mut inner = self.inner.lock().expect("mutex is not poisoned");
        let result = {
            let mut session = self
                .session(instance)?
                .lock()
                .expect("mutex is not poisoned");
            self.unload(instance, &mut session)
        };
        inner.state.set_tuneset(false);
        result
    }

    fn unload(&self, instance: u32, session: &mut Session) -> Result<(), error::Error> {
        let mut result = Ok(());
        while session.loaded != 0 {
            let index = session.loaded.trailing_zeros() as usize;
            session.loaded &= !(1 << index);
            if let Err(error) = self
                .backend
                .delete_tune_set(self.target(instance), index)
            {
                log::warn!(
                    "{} (slot {}) setfile {index} not deleted ({error})",
                    self.kind,
                    self.slot
                );
                result = result.and(Err(error.into()));
            }
        }
        result
    }
}
