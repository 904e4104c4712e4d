use anyhow::Context;
use buildkite_metrics::buildkite::BuildkiteClient;
use buildkite_metrics::metrics::{CloudWatchSink, LogSink, MetricsSink};
use buildkite_metrics::{collect_metrics, Config, ConfigOverrides};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Publish Buildkite build and job counts to CloudWatch
#[derive(Parser)]
#[command(name = "buildkite-metrics", version)]
#[command(about = "Publish Buildkite running and scheduled build/job counts to CloudWatch", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    collect: CollectArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Count running and scheduled work and publish it (default command)
    Collect(CollectArgs),
}

#[derive(Args, Clone, Default)]
struct CollectArgs {
    /// JSON configuration event to read ("-" for stdin)
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Buildkite organization slug
    #[arg(long)]
    org_slug: Option<String>,

    /// Buildkite API access token
    #[arg(long)]
    api_access_token: Option<String>,

    /// Queue to report on in addition to "default"
    #[arg(short, long)]
    queue: Option<String>,

    /// CloudWatch namespace to publish under
    #[arg(long)]
    namespace: Option<String>,

    /// Base URL of the Buildkite API
    #[arg(long)]
    api_url: Option<String>,

    /// AWS region for CloudWatch
    #[arg(long)]
    region: Option<String>,

    /// Log the metric data instead of submitting it
    #[arg(long)]
    dry_run: bool,
}

impl CollectArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            org_slug: self.org_slug.clone(),
            api_access_token: self.api_access_token.clone(),
            queue: self.queue.clone(),
            namespace: self.namespace.clone(),
            api_url: self.api_url.clone(),
            region: self.region.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("buildkite-metrics started with verbosity level: {}", cli.verbose);

    let args = match cli.command {
        Some(Commands::Collect(args)) => args,
        None => cli.collect,
    };

    if let Err(e) = run_collect(args).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run_collect(args: CollectArgs) -> anyhow::Result<()> {
    let config = Config::load(args.event.as_deref())
        .context("Failed to load configuration event")?
        .merge(ConfigOverrides::from_env())
        .merge(args.overrides());
    config.validate()?;
    debug!("Using {:?}", config);

    let source = BuildkiteClient::new(&config.api_url, &config.api_access_token)?;
    let sink: Box<dyn MetricsSink> = if args.dry_run {
        Box::new(LogSink)
    } else {
        Box::new(CloudWatchSink::new(config.region.clone()).await)
    };

    let result = collect_metrics(&config, &source, sink.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
