//! Job status reporting.
//!
//! Jobs never write to the console themselves. Every status change is logged
//! through `tracing` and forwarded over one unbounded channel, so a single
//! consumer owns the terminal and lines from concurrent jobs never interleave.

use std::path::PathBuf;

use raiplay_parser::Descriptor;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::outcome::JobOutcome;

#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The job was queued on the orchestrator.
    Submitted(Descriptor),
    /// The remux process is about to be launched.
    Started {
        descriptor: Descriptor,
        output_path: PathBuf,
    },
    /// The job reached a terminal state.
    Finished(JobOutcome),
}

/// Cloneable handle every job reports through.
#[derive(Debug, Clone, Default)]
pub struct StatusReporter {
    tx: Option<mpsc::UnboundedSender<JobEvent>>,
}

impl StatusReporter {
    /// A reporter plus the receiving end its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A reporter that only logs.
    pub fn log_only() -> Self {
        Self::default()
    }

    pub fn submitted(&self, descriptor: &Descriptor) {
        info!(title = descriptor.title(), "{descriptor} --- SUBMITTED");
        self.send(JobEvent::Submitted(descriptor.clone()));
    }

    pub fn started(&self, descriptor: &Descriptor, output_path: PathBuf) {
        info!(
            title = descriptor.title(),
            output = %output_path.display(),
            "starting remux"
        );
        self.send(JobEvent::Started {
            descriptor: descriptor.clone(),
            output_path,
        });
    }

    pub fn finished(&self, outcome: &JobOutcome) {
        if outcome.succeeded() {
            info!(exit_code = ?outcome.exit_code(), "{outcome}");
        } else {
            warn!(exit_code = ?outcome.exit_code(), "{outcome}");
        }
        self.send(JobEvent::Finished(outcome.clone()));
    }

    fn send(&self, event: JobEvent) {
        if let Some(tx) = &self.tx {
            // A dropped receiver only means nobody is listening any more.
            let _ = tx.send(event);
        }
    }
}
