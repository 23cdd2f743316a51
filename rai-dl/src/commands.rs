use std::path::Path;

use anyhow::Context;
use raiplay_parser::{
    Descriptor, MetadataClient, RequestResolver, SeriesFailurePolicy, SeriesResolution, UrlKind,
};
use remux_engine::{
    DownloadOrchestrator, JobEvent, JobOutcome, OrchestratorSummary, StatusReporter,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::CliError;
use crate::output::OutputManager;

pub struct CommandExecutor {
    config: AppConfig,
    resolver: RequestResolver,
    output: OutputManager,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let client_config = config
            .client_config()
            .context("Invalid catalog client configuration")?;
        let client =
            MetadataClient::from_config(&client_config).context("Failed to build HTTP client")?;
        let resolver = RequestResolver::with_config(client, config.resolver_config());

        Ok(Self {
            config,
            resolver,
            output: OutputManager::new(cfg!(feature = "colored-output")),
        })
    }

    fn resolver_for(&self, policy: SeriesFailurePolicy) -> RequestResolver {
        let mut config = self.config.resolver_config();
        config.series_failure = policy;
        RequestResolver::with_config(self.resolver.client().clone(), config)
    }

    pub async fn download_episode(&self, url: &str, output_dir: &Path) -> anyhow::Result<()> {
        let descriptor = self
            .resolver
            .resolve_one(url)
            .await
            .with_context(|| format!("Failed to resolve episode {url}"))?;
        prepare_output_dir(output_dir).await?;

        let session = self.session();
        let outcome = session.orchestrator.submit_one(descriptor, output_dir).await;
        session.close().await;

        finish(&self.output, &[outcome], 0)
    }

    pub async fn download_series(
        &self,
        url: &str,
        output_dir: &Path,
        parallelism: Option<usize>,
        isolate_failures: bool,
    ) -> anyhow::Result<()> {
        let policy = if isolate_failures {
            SeriesFailurePolicy::Isolate
        } else {
            self.config.series_failure
        };
        let resolution = self
            .resolver_for(policy)
            .resolve_series(url)
            .await
            .with_context(|| format!("Failed to resolve series {url}"))?;
        let unresolved = self.report_unresolved(&resolution);

        prepare_output_dir(output_dir).await?;
        let session = self.session();
        let outcomes = session
            .orchestrator
            .submit_all(
                resolution.into_descriptors(),
                output_dir,
                parallelism.or(self.config.parallelism),
            )
            .await
            .context("Failed to start downloads")?;
        session.close().await;

        finish(&self.output, &outcomes, unresolved)
    }

    /// Downloads an episode or a whole series depending on the url.
    pub async fn download_auto(
        &self,
        url: &str,
        output_dir: &Path,
        parallelism: Option<usize>,
    ) -> anyhow::Result<()> {
        match detect_kind(url)? {
            UrlKind::Episode => self.download_episode(url, output_dir).await,
            UrlKind::Series => {
                self.download_series(url, output_dir, parallelism, false)
                    .await
            }
        }
    }

    pub async fn resolve(&self, url: &str, series: bool, compact: bool) -> anyhow::Result<()> {
        let mut unresolved = 0;
        let descriptors: Vec<Descriptor> = if series {
            let resolution = self
                .resolver
                .resolve_series(url)
                .await
                .with_context(|| format!("Failed to resolve series {url}"))?;
            unresolved = self.report_unresolved(&resolution);
            resolution.into_descriptors()
        } else {
            vec![
                self.resolver
                    .resolve_one(url)
                    .await
                    .with_context(|| format!("Failed to resolve episode {url}"))?,
            ]
        };

        println!("{}", self.output.format_descriptors(&descriptors, !compact)?);
        if unresolved > 0 {
            return Err(CliError::UnresolvedEpisodes {
                unresolved,
                total: descriptors.len() + unresolved,
            }
            .into());
        }
        Ok(())
    }

    #[cfg(feature = "interactive")]
    pub async fn interactive(&self) -> anyhow::Result<()> {
        use inquire::{Select, Text};

        const EPISODE: &str = "Download a single episode";
        const SERIES: &str = "Download a whole series";
        const RESOLVE: &str = "Show stream information only";
        const QUIT: &str = "Quit";

        let choice = Select::new(
            "What do you want to do?",
            vec![EPISODE, SERIES, RESOLVE, QUIT],
        )
        .prompt()
        .map_err(CliError::from)?;
        if choice == QUIT {
            return Ok(());
        }

        let url = Text::new("RaiPlay url:")
            .prompt()
            .map_err(CliError::from)?;
        let url = url.trim();

        if choice == RESOLVE {
            let series = detect_kind(url)? == UrlKind::Series;
            return self.resolve(url, series, false).await;
        }

        let output_dir = Text::new("Output directory:")
            .with_default(".")
            .prompt()
            .map_err(CliError::from)?;
        let output_dir = Path::new(output_dir.trim());

        if choice == EPISODE {
            self.download_episode(url, output_dir).await
        } else {
            self.download_series(url, output_dir, None, false).await
        }
    }

    fn session(&self) -> DownloadSession {
        DownloadSession::start(DownloadOrchestrator::new(self.config.remux.clone()))
    }

    fn report_unresolved(&self, resolution: &SeriesResolution) -> usize {
        for failure in &resolution.failures {
            eprintln!("{}", self.output.format_failure(failure));
        }
        resolution.failures.len()
    }
}

/// An orchestrator whose events are printed by one background task.
///
/// Ctrl-C cancels every job of the orchestrator until the session is closed.
struct DownloadSession {
    orchestrator: DownloadOrchestrator,
    printer: JoinHandle<()>,
    interrupt: JoinHandle<()>,
}

impl DownloadSession {
    fn start(orchestrator: DownloadOrchestrator) -> Self {
        let (reporter, events) = StatusReporter::channel();
        let orchestrator = orchestrator.with_reporter(reporter);

        let output = OutputManager::new(cfg!(feature = "colored-output"));
        let printer = tokio::spawn(print_events(events, output));
        let interrupt = tokio::spawn(cancel_on_ctrl_c(orchestrator.cancellation_token()));

        Self {
            orchestrator,
            printer,
            interrupt,
        }
    }

    /// Stops listening for Ctrl-C and waits until every event is printed.
    async fn close(self) {
        self.interrupt.abort();
        drop(self.orchestrator);
        let _ = self.printer.await;
    }
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, stopping downloads");
        token.cancel();
    }
}

/// Prints the summary line; any failed or unresolved episode is an error.
fn finish(
    output: &OutputManager,
    outcomes: &[JobOutcome],
    unresolved: usize,
) -> anyhow::Result<()> {
    let summary = OrchestratorSummary::from_outcomes(outcomes);
    println!("{}", output.format_summary(&summary));
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        cancelled = summary.cancelled,
        unresolved,
        "done"
    );

    if summary.all_succeeded() && unresolved == 0 {
        Ok(())
    } else {
        Err(CliError::DownloadsFailed {
            failed: summary.total - summary.succeeded + unresolved,
            total: summary.total + unresolved,
        }
        .into())
    }
}

fn detect_kind(url: &str) -> anyhow::Result<UrlKind> {
    UrlKind::detect(url).ok_or_else(|| CliError::UnsupportedUrl(url.to_string()).into())
}

async fn prepare_output_dir(dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

async fn print_events(mut events: mpsc::UnboundedReceiver<JobEvent>, output: OutputManager) {
    while let Some(event) = events.recv().await {
        if let Some(line) = output.format_event(&event) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[rstest]
    #[case(
        "https://www.raiplay.it/programmi/ilcommissariomontalbano",
        UrlKind::Series
    )]
    #[case(
        "https://www.raiplay.it/video/2021/05/ep-1234.html",
        UrlKind::Episode
    )]
    fn detects_supported_urls(#[case] url: &str, #[case] kind: UrlKind) {
        assert_eq!(detect_kind(url).unwrap(), kind);
    }

    #[test]
    fn foreign_urls_are_rejected() {
        let err = detect_kind("https://example.com/watch?v=1").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::UnsupportedUrl(_))
        ));
    }

    #[test]
    fn failed_downloads_exit_with_error() {
        let output = OutputManager::new(false);
        let descriptor = Descriptor::new(
            "https://www.raiplay.it/video/2020/01/ep.html",
            "Ep",
            1,
            1,
            "https://mediapolis.rai.it/relinker?cont=x",
        )
        .unwrap();
        let ok = JobOutcome::new(
            descriptor.clone(),
            "Ep.mp4".into(),
            remux_engine::Termination::Exited { code: 0 },
        );
        let bad = JobOutcome::new(
            descriptor,
            "Ep.mp4".into(),
            remux_engine::Termination::Exited { code: 1 },
        );

        assert!(finish(&output, std::slice::from_ref(&ok), 0).is_ok());
        assert!(finish(&output, std::slice::from_ref(&ok), 1).is_err());

        let err = finish(&output, &[ok, bad], 0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::DownloadsFailed {
                failed: 1,
                total: 2
            })
        ));
    }

    #[tokio::test]
    async fn resolving_a_series_with_skipped_episodes_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/programmi/show"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<rai-episodes base_path="/programmi/show" block="Episodi"
                    set="Set-1" episode_path="episodes.json"></rai-episodes>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/programmi/show/Episodi/Set-1/episodes.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "seasons": [{ "episodes": [{ "cards": [
                    { "path_id": "/video/ok.html" },
                    { "path_id": "/video/broken.html" }
                ] }] }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/video/ok.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Ok",
                "season": "1",
                "episode": "1",
                "video": { "content_url": "https://mediapolis.rai.it/relinker?cont=ok" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/video/broken.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Broken" })))
            .mount(&server)
            .await;

        let executor = CommandExecutor::new(AppConfig {
            origin: server.uri(),
            series_failure: SeriesFailurePolicy::Isolate,
            ..AppConfig::default()
        })
        .unwrap();

        let err = executor
            .resolve(&format!("{}/programmi/show", server.uri()), true, true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::UnresolvedEpisodes {
                unresolved: 1,
                total: 2
            })
        ));
    }
}
