//! # Medical Device Workload
//!
//! Three cooperating tasks share one record of device readings, guarded by
//! a kernel mutex:
//!
//! | Task          | Priority | Period (ticks) | Work                          |
//! |---------------|----------|----------------|-------------------------------|
//! | vitals        | 3        | 2              | samples the heart rate        |
//! | drug delivery | 2        | 5              | marks medication administered |
//! | display       | 1        | 3              | renders both readings         |
//!
//! Tasks never print. They push [`Telemetry`] into an outbox that is also
//! attached to the kernel as an event sink, so kernel events and task output
//! land in one queue in the order they happened. The host drains it after
//! every cycle.

use core_types::{MutexId, Priority, TaskId};
use kernel_api::{BoundEntry, EventRecord, EventSink, KernelError, TaskContext};
use serde::Serialize;
use services_logger::{LogEntry, LogLevel};
use sim_kernel::Kernel;
use std::cell::RefCell;
use std::rc::Rc;

pub const VITALS_PRIORITY: Priority = Priority(3);
pub const DRUG_PRIORITY: Priority = Priority(2);
pub const DISPLAY_PRIORITY: Priority = Priority(1);

pub const VITALS_PERIOD: u64 = 2;
pub const DRUG_PERIOD: u64 = 5;
pub const DISPLAY_PERIOD: u64 = 3;

/// Readings shared between the tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MedicalData {
    /// Beats per minute; 0 until the first sample
    pub heart_rate: i32,
    /// 0 idle, 1 administering
    pub drug_delivery_status: u8,
}

/// A heart-rate reading, rendered as a `data` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "data")]
pub struct VitalSample {
    pub tick: u64,
    pub hr: i32,
}

/// One item of workload output
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    /// Something the kernel did
    Event(EventRecord),
    /// A task's log line
    Log(LogEntry),
    /// A task's reading
    Data(VitalSample),
}

/// Queue shared by the tasks and the kernel's event stream
#[derive(Debug, Default)]
struct Outbox {
    items: Vec<Telemetry>,
}

impl Outbox {
    fn push(&mut self, item: Telemetry) {
        self.items.push(item);
    }

    fn take(&mut self) -> Vec<Telemetry> {
        std::mem::take(&mut self.items)
    }
}

impl EventSink for Outbox {
    fn record(&mut self, record: &EventRecord) {
        self.push(Telemetry::Event(record.clone()));
    }
}

/// Simulated sensor: 65..=79 bpm, cycling with the tick counter
pub fn heart_rate_at(tick: u64) -> i32 {
    70 + (tick % 15) as i32 - 5
}

/// State bound to every demo task
#[derive(Clone)]
struct Shared {
    data: Rc<RefCell<MedicalData>>,
    data_mutex: MutexId,
    outbox: Rc<RefCell<Outbox>>,
}

impl Shared {
    fn log(&self, ctx: &dyn TaskContext, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message)
            .with_tick(ctx.now())
            .with_source(ctx.task_id());
        self.outbox.borrow_mut().push(Telemetry::Log(entry));
    }

    /// Runs `f` on the readings while holding the data mutex
    ///
    /// Returns `None` if the mutex could not be taken this slice.
    fn with_data<R>(
        &self,
        ctx: &mut dyn TaskContext,
        f: impl FnOnce(&mut MedicalData) -> R,
    ) -> Option<R> {
        match ctx.lock(self.data_mutex) {
            Ok(outcome) if outcome.is_held() => {}
            Ok(outcome) => {
                self.log(ctx, LogLevel::Warn, format!("Data lock unavailable: {outcome:?}"));
                return None;
            }
            Err(err) => {
                self.log(ctx, LogLevel::Error, err.to_string());
                return None;
            }
        }

        let result = f(&mut self.data.borrow_mut());

        if let Err(err) = ctx.unlock(self.data_mutex) {
            self.log(ctx, LogLevel::Error, err.to_string());
        }
        Some(result)
    }
}

fn monitor_vitals(ctx: &mut dyn TaskContext, shared: &mut Shared) {
    shared.log(ctx, LogLevel::Info, "VitalSigns: Task started.");

    let tick = ctx.now();
    let reading = shared.with_data(ctx, |data| {
        data.heart_rate = heart_rate_at(tick);
        data.heart_rate
    });
    if let Some(hr) = reading {
        shared
            .outbox
            .borrow_mut()
            .push(Telemetry::Data(VitalSample { tick, hr }));
        shared.log(
            ctx,
            LogLevel::Info,
            format!("VitalSigns: Heart rate is {hr} bpm."),
        );
    }

    ctx.sleep(VITALS_PERIOD);
}

fn deliver_drug(ctx: &mut dyn TaskContext, shared: &mut Shared) {
    shared.log(ctx, LogLevel::Info, "DrugDelivery: Task started.");

    if shared
        .with_data(ctx, |data| data.drug_delivery_status = 1)
        .is_some()
    {
        shared.log(ctx, LogLevel::Info, "DrugDelivery: Administering medication.");
    }

    ctx.sleep(DRUG_PERIOD);
}

fn update_display(ctx: &mut dyn TaskContext, shared: &mut Shared) {
    shared.log(ctx, LogLevel::Info, "Display: Task started.");

    if let Some(data) = shared.with_data(ctx, |data| *data) {
        shared.log(
            ctx,
            LogLevel::Info,
            format!(
                "Display: Updating screen - HR: {}, Drug Status: {}",
                data.heart_rate, data.drug_delivery_status
            ),
        );
    }

    ctx.sleep(DISPLAY_PERIOD);
}

/// Handle on the demo workload installed in a kernel
pub struct MedicalDemo {
    shared: Shared,
    vitals: TaskId,
    drug: TaskId,
    display: TaskId,
}

impl MedicalDemo {
    /// Attaches the outbox, creates the data mutex and registers the
    /// three tasks
    pub fn install(kernel: &mut Kernel) -> Result<Self, KernelError> {
        let outbox = Rc::new(RefCell::new(Outbox::default()));
        kernel.add_sink(Box::new(Rc::clone(&outbox)));

        let shared = Shared {
            data: Rc::new(RefCell::new(MedicalData::default())),
            data_mutex: kernel.create_mutex()?,
            outbox,
        };

        let vitals = kernel.create_named_task(
            "vitals",
            BoundEntry::new(monitor_vitals, shared.clone()),
            VITALS_PRIORITY,
        )?;
        let drug = kernel.create_named_task(
            "drug_delivery",
            BoundEntry::new(deliver_drug, shared.clone()),
            DRUG_PRIORITY,
        )?;
        let display = kernel.create_named_task(
            "display",
            BoundEntry::new(update_display, shared.clone()),
            DISPLAY_PRIORITY,
        )?;

        Ok(Self {
            shared,
            vitals,
            drug,
            display,
        })
    }

    pub fn vitals(&self) -> TaskId {
        self.vitals
    }

    pub fn drug(&self) -> TaskId {
        self.drug
    }

    pub fn display(&self) -> TaskId {
        self.display
    }

    /// The mutex guarding [`MedicalData`]
    pub fn data_mutex(&self) -> MutexId {
        self.shared.data_mutex
    }

    /// Current readings
    pub fn data(&self) -> MedicalData {
        *self.shared.data.borrow()
    }

    /// Takes everything queued since the last drain, oldest first
    pub fn drain(&self) -> Vec<Telemetry> {
        self.shared.outbox.borrow_mut().take()
    }
}
