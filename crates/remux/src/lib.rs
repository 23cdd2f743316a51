//! Remux engine for resolved RaiPlay descriptors.
//!
//! Each [`Descriptor`](raiplay_parser::Descriptor) becomes one
//! [`DownloadJob`] that runs `ffmpeg -i <content_url> -c copy -bsf:a aac_adtstoasc <file>`
//! as a child process. The [`DownloadOrchestrator`] runs a single job or a
//! whole batch on a bounded pool and reports every status change through a
//! [`StatusReporter`].

pub mod command;
pub mod config;
pub mod error;
pub mod events;
pub mod job;
pub mod orchestrator;
pub mod outcome;

pub use command::RemuxCommand;
pub use config::RemuxConfig;
pub use error::DownloadError;
pub use events::{JobEvent, StatusReporter};
pub use job::DownloadJob;
pub use orchestrator::{DownloadOrchestrator, OrchestratorSummary};
pub use outcome::{JobOutcome, JobState, Termination};
