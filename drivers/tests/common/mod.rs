#![allow(dead_code)]

use isp_drivers::backend;
use isp_drivers::clock;
use isp_drivers::devices;
use isp_drivers::frame;
use isp_drivers::interrupt;
use isp_drivers::parameters;
use isp_drivers::register;
use isp_drivers::setfile;
use isp_drivers::slot;

pub const CAPTURE: usize = 0;
pub const BAYER: usize = 1;
pub const ISP: usize = 2;
pub const TEMPORAL: usize = 3;
pub const SCALER: usize = 4;
pub const VISION: usize = 5;

/// Interrupt lines of each slot, in handler slot order.
pub const LINES: [&[u32]; 6] = [&[10], &[11, 12], &[13, 14], &[15], &[16], &[17]];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    ChainCreate(devices::Kind, usize),
    ChainDestroy(devices::Kind, usize),
    ObjectCreate(backend::Target),
    ObjectDestroy(backend::Target),
    SetControl(backend::Target, backend::Control),
    DispatchShot(backend::Target, parameters::ParamSet),
    GetMeta(backend::Target, u32),
    CreateTuneSet(backend::Target, usize),
    ApplyTuneSet(backend::Target, usize),
    DeleteTuneSet(backend::Target, usize),
}

impl Record {
    pub fn call(&self) -> backend::Call {
        match self {
            Record::ChainCreate(..) => backend::Call::ChainCreate,
            Record::ChainDestroy(..) => backend::Call::ChainDestroy,
            Record::ObjectCreate(..) => backend::Call::ObjectCreate,
            Record::ObjectDestroy(..) => backend::Call::ObjectDestroy,
            Record::SetControl(..) => backend::Call::SetControl,
            Record::DispatchShot(..) => backend::Call::DispatchShot,
            Record::GetMeta(..) => backend::Call::GetMeta,
            Record::CreateTuneSet(..) => backend::Call::CreateTuneSet,
            Record::ApplyTuneSet(..) => backend::Call::ApplyTuneSet,
            Record::DeleteTuneSet(..) => backend::Call::DeleteTuneSet,
        }
    }
}

/// Backend that records every call and fails on demand.
#[derive(Default)]
pub struct RecordingBackend {
    records: std::sync::Mutex<Vec<Record>>,
    /// (call, tuning set index or any, error code)
    failures: std::sync::Mutex<Vec<(backend::Call, Option<usize>, i32)>>,
}

impl RecordingBackend {
    pub fn fail(&self, call: backend::Call, code: i32) {
        self.failures.lock().unwrap().push((call, None, code));
    }

    pub fn fail_tune_set(&self, index: usize, code: i32) {
        self.failures
            .lock()
            .unwrap()
            .push((backend::Call::CreateTuneSet, Some(index), code));
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    pub fn count(&self, call: backend::Call) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| record.call() == call)
            .count()
    }

    pub fn dispatched(&self) -> Vec<parameters::ParamSet> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter_map(|record| match record {
                Record::DispatchShot(_, param_set) => Some(param_set.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_dispatch(&self) -> parameters::ParamSet {
        self.dispatched().pop().expect("a shot was dispatched")
    }

    fn record(&self, record: Record, index: Option<usize>) -> Result<(), backend::Error> {
        let call = record.call();
        self.records.lock().unwrap().push(record);
        match self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(failing, failing_index, _)| {
                *failing == call && (failing_index.is_none() || *failing_index == index)
            }) {
            Some((_, _, code)) => Err(backend::Error::new(call, *code)),
            None => Ok(()),
        }
    }
}

impl backend::Backend for RecordingBackend {
    fn chain_create(&self, kind: devices::Kind, slot: usize) -> Result<(), backend::Error> {
        self.record(Record::ChainCreate(kind, slot), None)
    }

    fn chain_destroy(&self, kind: devices::Kind, slot: usize) -> Result<(), backend::Error> {
        self.record(Record::ChainDestroy(kind, slot), None)
    }

    fn object_create(&self, target: backend::Target) -> Result<(), backend::Error> {
        self.record(Record::ObjectCreate(target), None)
    }

    fn object_destroy(&self, target: backend::Target) -> Result<(), backend::Error> {
        self.record(Record::ObjectDestroy(target), None)
    }

    fn set_control(
        &self,
        target: backend::Target,
        control: backend::Control,
    ) -> Result<(), backend::Error> {
        self.record(Record::SetControl(target, control), None)
    }

    fn dispatch_shot(
        &self,
        target: backend::Target,
        param_set: &parameters::ParamSet,
        _shot: Option<&frame::Shot>,
    ) -> Result<(), backend::Error> {
        self.record(Record::DispatchShot(target, param_set.clone()), None)
    }

    fn get_meta(&self, target: backend::Target, frame_count: u32) -> Result<Vec<u8>, backend::Error> {
        self.record(Record::GetMeta(target, frame_count), None)?;
        Ok(frame_count.to_le_bytes().to_vec())
    }

    fn create_tune_set(
        &self,
        target: backend::Target,
        index: usize,
        _entry: &setfile::Entry,
    ) -> Result<(), backend::Error> {
        self.record(Record::CreateTuneSet(target, index), Some(index))
    }

    fn apply_tune_set(&self, target: backend::Target, index: usize) -> Result<(), backend::Error> {
        self.record(Record::ApplyTuneSet(target, index), Some(index))
    }

    fn delete_tune_set(&self, target: backend::Target, index: usize) -> Result<(), backend::Error> {
        self.record(Record::DeleteTuneSet(target, index), Some(index))
    }
}

#[derive(Default)]
pub struct CountingContext {
    pub enters: std::sync::atomic::AtomicUsize,
    pub exits: std::sync::atomic::AtomicUsize,
}

impl CountingContext {
    pub fn enters(&self) -> usize {
        self.enters.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn exits(&self) -> usize {
        self.exits.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl interrupt::AcceleratedContext for CountingContext {
    fn enter(&self) {
        self.enters
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn exit(&self) {
        self.exits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

pub struct Fixture {
    pub pipeline: isp_drivers::Pipeline,
    pub backend: std::sync::Arc<RecordingBackend>,
    pub context: std::sync::Arc<CountingContext>,
    pub windows: Vec<std::sync::Arc<register::MemoryWindow>>,
    pub clock: std::sync::Arc<clock::Resource>,
    pub routing_window: std::sync::Arc<register::MemoryWindow>,
}

impl Fixture {
    /// Opens and initializes `slots` for `instance`.
    pub fn start(&self, slots: &[usize], instance: u32) {
        for slot in slots {
            self.pipeline.open(*slot, instance).unwrap();
            self.pipeline.init(*slot, instance).unwrap();
        }
    }

    /// Writes the block's parameters of `instance` in the shared Region.
    pub fn edit_region<Edit>(&self, slot: usize, instance: u32, edit: Edit)
    where
        Edit: FnOnce(&mut parameters::Parameters),
    {
        let kind = self.pipeline.registry().get(slot).unwrap().kind;
        let region = self.pipeline.region();
        let mut region = region.write().unwrap();
        edit(region.parameters_mut(instance, kind).unwrap());
    }

    /// Sets the block's status register and fires its primary line.
    pub fn raise(&self, slot: usize, status_address: u32, status: u32) -> Result<(), isp_drivers::Error> {
        use register::Window;
        self.windows[slot].write(status_address, status);
        self.pipeline.interrupt(LINES[slot][0])
    }
}

pub fn fixture() -> Fixture {
    fixture_with(isp_drivers::Configuration::default())
}

pub fn fixture_with(configuration: isp_drivers::Configuration) -> Fixture {
    let clock_window = std::sync::Arc::new(register::MemoryWindow::new(4));
    let clock = std::sync::Arc::new(clock::Resource::new(
        clock_window,
        register::Field::new(0, 0, 1),
        LINES.len(),
    ));
    let kinds = [
        devices::Kind::Capture,
        devices::Kind::Bayer,
        devices::Kind::Isp,
        devices::Kind::Temporal,
        devices::Kind::Scaler,
        devices::Kind::Vision,
    ];
    let mut windows = Vec::new();
    let mut builder = slot::SlotRegistry::builder();
    for (index, kind) in kinds.into_iter().enumerate() {
        let window = std::sync::Arc::new(register::MemoryWindow::new(0x1000));
        windows.push(window.clone());
        builder
            .add(slot::Descriptor {
                kind,
                channel: 0,
                window,
                interrupts: LINES[index].to_vec(),
                clock_gate: Some(clock::Binding {
                    resource: clock.clone(),
                    bit: index,
                }),
            })
            .unwrap();
    }
    let backend = std::sync::Arc::new(RecordingBackend::default());
    let context = std::sync::Arc::new(CountingContext::default());
    let routing_window = std::sync::Arc::new(register::MemoryWindow::new(0x10));
    let pipeline = isp_drivers::Pipeline::new(
        configuration,
        builder.build(),
        backend.clone(),
        context.clone(),
        routing_window.clone(),
    );
    Fixture {
        pipeline,
        backend,
        context,
        windows,
        clock,
        routing_window,
    }
}

pub fn external(instance: u32, frame_count: u32, dirty: parameters::DirtyMask) -> frame::Frame {
    frame::Frame::external(
        instance,
        frame_count,
        frame::Shot {
            dirty,
            metadata: Vec::new(),
        },
    )
}

pub fn all_slots() -> isp_drivers::ActiveMask {
    isp_drivers::ActiveMask(u64::MAX)
}
