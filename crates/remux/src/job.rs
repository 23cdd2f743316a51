//! A single committed download.

use std::path::Path;

use raiplay_parser::Descriptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::command::RemuxCommand;
use crate::config::RemuxConfig;
use crate::error::DownloadError;
use crate::events::StatusReporter;
use crate::outcome::{JobOutcome, JobState, Termination};

/// Remuxes the stream of one descriptor into a file with the external tool.
#[derive(Debug)]
pub struct DownloadJob {
    descriptor: Descriptor,
    command: RemuxCommand,
    state: JobState,
}

impl DownloadJob {
    pub fn new(descriptor: Descriptor, output_dir: &Path, config: &RemuxConfig) -> Self {
        let command = RemuxCommand::new(config, &descriptor, output_dir);
        Self {
            descriptor,
            command,
            state: JobState::Pending,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn command(&self) -> &RemuxCommand {
        &self.command
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Runs the job to completion.
    ///
    /// Exit code `0` yields a succeeded outcome and any other code a failed one
    /// carrying that code. Failing to launch or wait on the process is
    /// returned as an error. A status line is reported on every path.
    pub async fn run(self, reporter: &StatusReporter) -> Result<JobOutcome, DownloadError> {
        self.run_until_cancelled(reporter, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), but kills the process when `cancel` fires.
    pub async fn run_until_cancelled(
        mut self,
        reporter: &StatusReporter,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, DownloadError> {
        if cancel.is_cancelled() {
            self.advance(JobState::Failed);
            let outcome = self.into_outcome(Termination::Cancelled);
            reporter.finished(&outcome);
            return Ok(outcome);
        }

        self.advance(JobState::Running);
        reporter.started(&self.descriptor, self.command.output_path().to_path_buf());
        debug!(
            program = self.command.program(),
            args = ?self.command.args(),
            "spawning remux process"
        );

        let mut child = match self.command.to_command().spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = DownloadError::ProcessLaunch {
                    program: self.command.program().to_string(),
                    source,
                };
                return Err(self.fail(reporter, err));
            }
        };

        let termination = tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    error!(title = self.descriptor.title(), error = %e, "failed to kill remux process");
                }
                Termination::Cancelled
            }
            status = child.wait() => match status {
                Ok(status) => match status.code() {
                    Some(code) => Termination::Exited { code },
                    None => Termination::Signalled,
                },
                Err(source) => {
                    return Err(self.fail(reporter, DownloadError::ProcessWait { source }));
                }
            },
        };

        let terminal = match termination {
            Termination::Exited { code: 0 } => JobState::Succeeded,
            _ => JobState::Failed,
        };
        self.advance(terminal);
        let outcome = self.into_outcome(termination);
        reporter.finished(&outcome);
        Ok(outcome)
    }

    fn advance(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid job transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Marks the job failed, reports it and hands the error back.
    fn fail(mut self, reporter: &StatusReporter, err: DownloadError) -> DownloadError {
        self.advance(JobState::Failed);
        let outcome = JobOutcome::errored(
            self.descriptor,
            self.command.output_path().to_path_buf(),
            &err,
        );
        reporter.finished(&outcome);
        err
    }

    fn into_outcome(self, termination: Termination) -> JobOutcome {
        let output_path = self.command.output_path().to_path_buf();
        JobOutcome::new(self.descriptor, output_path, termination)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::events::JobEvent;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;

    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn descriptor(title: &str) -> Descriptor {
        Descriptor::new(
            "https://www.raiplay.it/video/2021/05/ep.html",
            title,
            1,
            2,
            "https://mediapolis.rai.it/relinker?cont=abc",
        )
        .unwrap()
    }

    fn config(tool: &Path) -> RemuxConfig {
        RemuxConfig::default().with_binary_path(tool.to_string_lossy())
    }

    #[tokio::test]
    async fn zero_exit_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "exit 0");
        let job = DownloadJob::new(descriptor("Ep"), dir.path(), &config(&tool));
        assert_eq!(job.state(), JobState::Pending);

        let outcome = job.run(&StatusReporter::log_only()).await.unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.exit_code(), Some(0));
    }

    #[tokio::test]
    async fn exit_code_one_fails_with_code() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "exit 1");
        let outcome = DownloadJob::new(descriptor("Ep"), dir.path(), &config(&tool))
            .run(&StatusReporter::log_only())
            .await
            .unwrap();
        assert!(!outcome.succeeded());
        assert_eq!(outcome.exit_code(), Some(1));
        assert_eq!(outcome.state(), JobState::Failed);
    }

    #[tokio::test]
    async fn missing_binary_is_a_launch_error_and_still_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (reporter, mut rx) = StatusReporter::channel();
        let err = DownloadJob::new(
            descriptor("Ep"),
            dir.path(),
            &RemuxConfig::default().with_binary_path(dir.path().join("missing").to_string_lossy()),
        )
        .run(&reporter)
        .await
        .unwrap_err();
        assert!(matches!(err, DownloadError::ProcessLaunch { .. }));

        drop(reporter);
        let mut finished = 0;
        while let Some(event) = rx.recv().await {
            if let JobEvent::Finished(outcome) = event {
                assert!(matches!(outcome.termination(), Termination::Errored { .. }));
                finished += 1;
            }
        }
        assert_eq!(finished, 1);
    }

    #[tokio::test]
    async fn receives_unsplit_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("My Videos");
        std::fs::create_dir(&out_dir).unwrap();
        let args_file = dir.path().join("args.txt");
        let tool = fake_tool(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'", args_file.display()),
        );

        let outcome = DownloadJob::new(descriptor("My Show: Part 2"), &out_dir, &config(&tool))
            .run(&StatusReporter::log_only())
            .await
            .unwrap();
        assert!(outcome.succeeded());

        let recorded = std::fs::read_to_string(&args_file).unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        let expected_output = out_dir.join("My Show: Part 2.mp4");
        assert_eq!(
            args,
            [
                "-hide_banner",
                "-n",
                "-i",
                "https://mediapolis.rai.it/relinker?cont=abc",
                "-c",
                "copy",
                "-bsf:a",
                "aac_adtstoasc",
                expected_output.to_str().unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_kills_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "sleep 30");
        let cancel = CancellationToken::new();
        let job = DownloadJob::new(descriptor("Ep"), dir.path(), &config(&tool));

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(10),
            job.run_until_cancelled(&StatusReporter::log_only(), &cancel),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(outcome.is_cancelled());
        assert!(!outcome.succeeded());
    }
}
