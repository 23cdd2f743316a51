#[cfg(feature = "colored-output")]
use colored::*;
use raiplay_parser::{Descriptor, EpisodeFailure};
use remux_engine::{JobEvent, OrchestratorSummary};

use crate::error::Result;

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// The console line for a job event. Submissions are only logged.
    pub fn format_event(&self, event: &JobEvent) -> Option<String> {
        match event {
            JobEvent::Submitted(_) => None,
            JobEvent::Started {
                descriptor,
                output_path,
            } => Some(format!(
                "{} {} -> {}",
                self.colorize("start", &Color::Cyan, true),
                descriptor,
                self.colorize(&output_path.display().to_string(), &Color::Blue, false)
            )),
            JobEvent::Finished(outcome) => {
                let line = outcome.to_string();
                Some(if outcome.succeeded() {
                    self.colorize(&line, &Color::Green, false)
                } else {
                    self.colorize(&line, &Color::Red, true)
                })
            }
        }
    }

    pub fn format_summary(&self, summary: &OrchestratorSummary) -> String {
        let mut output = format!(
            "{}: {} total, {} succeeded",
            self.colorize("Downloads", &Color::Yellow, true),
            summary.total,
            self.colorize(&summary.succeeded.to_string(), &Color::Green, false),
        );
        if summary.failed > 0 {
            output.push_str(&format!(
                ", {} failed",
                self.colorize(&summary.failed.to_string(), &Color::Red, true)
            ));
        }
        if summary.cancelled > 0 {
            output.push_str(&format!(", {} cancelled", summary.cancelled));
        }
        output
    }

    pub fn format_failure(&self, failure: &EpisodeFailure) -> String {
        format!(
            "{} {}: {}",
            self.colorize("skipped", &Color::Yellow, true),
            failure.url,
            failure.error
        )
    }

    pub fn format_descriptors(&self, descriptors: &[Descriptor], pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(descriptors)
        } else {
            serde_json::to_string(descriptors)
        }?;
        Ok(json)
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                    Color::Red => text.red(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (self.colored, color, bold);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
    Red,
}

#[cfg(test)]
mod tests {
    use super::*;
    use remux_engine::{JobOutcome, Termination};

    fn descriptor() -> Descriptor {
        Descriptor::new(
            "https://www.raiplay.it/video/2020/01/ep.html",
            "Ep 1",
            1,
            1,
            "https://mediapolis.rai.it/relinker?cont=x",
        )
        .unwrap()
    }

    #[test]
    fn finished_line_carries_exit_code() {
        let output = OutputManager::new(false);
        let event = JobEvent::Finished(JobOutcome::new(
            descriptor(),
            "out/Ep 1.mp4".into(),
            Termination::Exited { code: 1 },
        ));
        assert_eq!(
            output.format_event(&event).as_deref(),
            Some("Request[Ep 1] --- TERMINATED with code 1")
        );
        assert!(
            output
                .format_event(&JobEvent::Submitted(descriptor()))
                .is_none()
        );
    }

    #[test]
    fn summary_mentions_failures_only_when_present() {
        let output = OutputManager::new(false);
        let clean = OrchestratorSummary {
            total: 2,
            succeeded: 2,
            failed: 0,
            cancelled: 0,
        };
        assert_eq!(
            output.format_summary(&clean),
            "Downloads: 2 total, 2 succeeded"
        );

        let mixed = OrchestratorSummary {
            failed: 1,
            succeeded: 1,
            ..clean
        };
        assert!(output.format_summary(&mixed).ends_with(", 1 failed"));
    }

    #[test]
    fn descriptors_print_as_json_array() {
        let output = OutputManager::new(false);
        let json = output.format_descriptors(&[descriptor()], false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["title"], "Ep 1");
        assert_eq!(value[0]["content_url"], "https://mediapolis.rai.it/relinker?cont=x");
    }
}
