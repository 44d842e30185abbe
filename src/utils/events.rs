use chrono::{DateTime, NaiveDate, Utc};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use crate::config::scenario::Scenario;
use crate::models::generator::DataQuality;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    DataQuality(DataQuality),
    UnresolvedSite { site: String, reason: String },
}

/// Observation about the input data. Returned with the results, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub asset: String,
    pub day: Option<NaiveDate>,
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationEvent {
    RunStarted { scenario: Scenario, tasks: usize },
    AssetSkipped { asset: String, reason: String },
    TaskCompleted { asset: String, day: NaiveDate },
    TaskSkipped { asset: String, day: NaiveDate, reason: String },
    Diagnostic(Diagnostic),
    RunFinished { scenario: Scenario, rows: usize },
}

/// Optional sending half of the progress channel. Sends never block and a
/// dropped receiver is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<Sender<SimulationEvent>>,
}

impl EventSink {
    pub fn new(sender: Sender<SimulationEvent>) -> Self {
        Self { sender: Some(sender) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn emit(&self, event: SimulationEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}

pub fn channel() -> (EventSink, Receiver<SimulationEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSink::new(tx), rx)
}
