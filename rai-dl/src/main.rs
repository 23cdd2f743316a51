mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    config::AppConfig,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {:#}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {:#}", e);
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    init_logging(args.verbose, args.quiet);

    if let Some(Commands::Completions { shell }) = &args.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Args::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let config = AppConfig::load(args.config.as_deref())?;
    debug!(?config, "effective configuration");
    let version = config.remux.detect_version();
    debug!(binary = %config.remux.binary_path, version = ?version, "remux tool");

    if let Some(Commands::Config { path }) = &args.command {
        if *path {
            match AppConfig::file_path(args.config.as_deref()) {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("no configuration directory on this platform"),
            }
        } else {
            print!("{}", config.show()?);
        }
        return Ok(());
    }

    let executor = CommandExecutor::new(config)?;

    match args.command {
        Some(Commands::Episode { url, output_dir }) => {
            executor.download_episode(&url, &output_dir).await
        }
        Some(Commands::Series {
            url,
            output_dir,
            parallelism,
            isolate_failures,
        }) => {
            executor
                .download_series(&url, &output_dir, parallelism, isolate_failures)
                .await
        }
        Some(Commands::Get {
            url,
            output_dir,
            parallelism,
        }) => executor.download_auto(&url, &output_dir, parallelism).await,
        Some(Commands::Resolve {
            url,
            series,
            compact,
        }) => executor.resolve(&url, series, compact).await,
        Some(Commands::Completions { .. }) | Some(Commands::Config { .. }) => Ok(()),
        #[cfg(feature = "interactive")]
        None => executor.interactive().await,
        #[cfg(not(feature = "interactive"))]
        None => anyhow::bail!("no command given, see --help"),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
        // Job status lines are already printed by the event printer.
        match "remux_engine::events=warn".parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .init();
}
