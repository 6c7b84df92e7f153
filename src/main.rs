mod cli;
mod config;
mod diff;
mod error;
mod filter;
mod model;
mod output;
mod platform;
mod projector;
mod resolver;
mod sampler;
mod table;
mod watch;

use cli::CliArgs;
use config::WatchConfig;
use output::{format_banner, Reporter};
use platform::{create_table_source, SysinfoProcesses};
use resolver::ProcessNameResolver;
use sampler::Sampler;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = CliArgs::parse_or_exit();

    // Everything up to the first tick is configuration: any failure exits 1.
    let (config, sampler, mut reporter) = match setup(&args) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let banner = format_banner(config.mode, &config.targets.describe(), config.interval);
    if let Err(e) = reporter.emit(&banner) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = watch::run(&config, sampler, reporter).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn setup(args: &CliArgs) -> error::Result<(WatchConfig, Sampler, Reporter)> {
    let config = WatchConfig::from_cli(&args.command)?;
    let reporter = Reporter::open(config.output.as_deref())?;
    let source = create_table_source()?;
    let resolver = ProcessNameResolver::new(Box::new(SysinfoProcesses::new()));
    let sampler = Sampler::new(source, resolver, config.targets.clone());
    tracing::debug!(
        mode = %config.mode,
        match_all = config.targets.is_match_all(),
        "configured"
    );
    Ok((config, sampler, reporter))
}
