use std::fmt;
use std::path::{Path, PathBuf};

use raiplay_parser::Descriptor;

use crate::error::DownloadError;

/// Lifecycle of a download job. There is no way back from a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
        )
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The remux process ran to completion with this exit code.
    Exited { code: i32 },
    /// The process ended without an exit code (killed by a signal).
    Signalled,
    /// The process could not be launched or waited on.
    Errored { cause: String },
    /// The job was cancelled before or while running.
    Cancelled,
}

/// Terminal record of one download attempt.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    descriptor: Descriptor,
    output_path: PathBuf,
    termination: Termination,
}

impl JobOutcome {
    pub fn new(descriptor: Descriptor, output_path: PathBuf, termination: Termination) -> Self {
        Self {
            descriptor,
            output_path,
            termination,
        }
    }

    pub(crate) fn errored(
        descriptor: Descriptor,
        output_path: PathBuf,
        error: &DownloadError,
    ) -> Self {
        Self::new(
            descriptor,
            output_path,
            Termination::Errored {
                cause: error.to_string(),
            },
        )
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.termination {
            Termination::Exited { code } => Some(code),
            _ => None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code() == Some(0)
    }

    pub fn is_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }

    pub fn state(&self) -> JobState {
        if self.succeeded() {
            JobState::Succeeded
        } else {
            JobState::Failed
        }
    }

    pub fn into_result(self) -> Result<Descriptor, DownloadError> {
        match self.termination {
            Termination::Exited { code: 0 } => Ok(self.descriptor),
            Termination::Exited { code } => Err(DownloadError::NonZeroExit { code }),
            Termination::Signalled => Err(DownloadError::Terminated),
            Termination::Errored { cause } => Err(DownloadError::JobFailed(cause)),
            Termination::Cancelled => Err(DownloadError::Cancelled),
        }
    }
}

/// The status line printed for every finished job.
impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.termination {
            Termination::Exited { code } => {
                write!(f, "{} --- TERMINATED with code {code}", self.descriptor)
            }
            Termination::Signalled => write!(f, "{} --- KILLED by signal", self.descriptor),
            Termination::Errored { cause } => write!(f, "{} --- ERROR: {cause}", self.descriptor),
            Termination::Cancelled => write!(f, "{} --- CANCELLED", self.descriptor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(termination: Termination) -> JobOutcome {
        let d = Descriptor::new("https://x/video/a.html", "Ep 1", 1, 1, "https://x/a.m3u8")
            .unwrap();
        JobOutcome::new(d, PathBuf::from("out/Ep 1.mp4"), termination)
    }

    #[test]
    fn zero_exit_succeeds() {
        let o = outcome(Termination::Exited { code: 0 });
        assert!(o.succeeded());
        assert_eq!(o.state(), JobState::Succeeded);
        assert_eq!(o.to_string(), "Request[Ep 1] --- TERMINATED with code 0");
        assert!(o.into_result().is_ok());
    }

    #[test]
    fn non_zero_exit_keeps_its_code() {
        let o = outcome(Termination::Exited { code: 1 });
        assert!(!o.succeeded());
        assert_eq!(o.exit_code(), Some(1));
        assert!(matches!(
            o.into_result(),
            Err(DownloadError::NonZeroExit { code: 1 })
        ));
    }

    #[test]
    fn errored_has_no_exit_code() {
        let o = outcome(Termination::Errored {
            cause: "no such file".into(),
        });
        assert_eq!(o.exit_code(), None);
        assert_eq!(o.state(), JobState::Failed);
        assert!(o.to_string().contains("no such file"));
    }

    #[test]
    fn transitions_only_move_forward() {
        assert!(JobState::Pending.can_transition_to(JobState::Running));
        assert!(JobState::Running.can_transition_to(JobState::Failed));
        assert!(!JobState::Succeeded.can_transition_to(JobState::Running));
        assert!(!JobState::Running.can_transition_to(JobState::Pending));
        assert!(JobState::Failed.is_terminal());
    }
}
