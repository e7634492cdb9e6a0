//! Controller event bus

use crossbeam_channel::{Receiver, Sender};
use lod_scheduler::{LoadOutcome, StageObserver};
use lod_shared::{QualityChangeEvent, StageResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the controller reports to UI and telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ControllerEvent {
    StageCompleted(StageResult),
    LoadFinished(LoadOutcome),
    QualityChanged(QualityChangeEvent),
}

/// Fan-out to every subscriber. Events reach each subscriber in the order
/// they were published; disconnected subscribers are dropped on the next
/// publish.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<ControllerEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<ControllerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn publish(&self, event: ControllerEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Scheduler observer that forwards to the bus and remembers the most
/// recent load outcome for diagnostics
#[derive(Debug, Clone)]
pub(crate) struct BusObserver {
    bus: EventBus,
    last_outcome: Arc<Mutex<Option<LoadOutcome>>>,
}

impl BusObserver {
    pub(crate) fn new(bus: EventBus) -> Self {
        Self {
            bus,
            last_outcome: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn last_outcome(&self) -> Option<LoadOutcome> {
        self.last_outcome.lock().clone()
    }
}

impl StageObserver for BusObserver {
    fn on_stage_complete(&self, result: &StageResult) {
        self.bus.publish(ControllerEvent::StageCompleted(*result));
    }

    fn on_load_finished(&self, outcome: &LoadOutcome) {
        *self.last_outcome.lock() = Some(outcome.clone());
        self.bus.publish(ControllerEvent::LoadFinished(outcome.clone()));
    }
}
