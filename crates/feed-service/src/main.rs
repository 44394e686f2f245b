use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_config::{Config, ConfigLoader};
use feed_datafeeds::feed_for_tag;
use feed_queries::{standard_catalog, CatalogFilter};
use feed_reporter::{AlloyOracle, OracleInterface, ReporterService};

#[derive(Parser)]
#[command(name = "tellor-feeds")]
#[command(about = "Tellor data feed reporter", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/feeds.toml")]
	config: PathBuf,

	#[arg(long, env = "FEEDS_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Report configured feeds to the oracle
	Report {
		/// Report only this feed tag instead of the configured set
		#[arg(long, value_name = "TAG")]
		feed: Option<String>,
	},
	/// Validate the configuration file
	Validate,
	/// List the query catalog
	Catalog {
		/// Render the full catalog as a markdown table
		#[arg(long)]
		markdown: bool,
		/// Filter by tag substring
		#[arg(long)]
		tag: Option<String>,
		/// Filter by query type
		#[arg(long)]
		query_type: Option<String>,
		/// Filter by active flag
		#[arg(long)]
		active: Option<bool>,
	},
	/// Show descriptor, query data and query id for a catalog tag
	Query {
		tag: String,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let mut cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command.take() {
		Some(Commands::Report { feed }) => run_reporter(cli, feed).await,
		None => run_reporter(cli, None).await,
		Some(Commands::Validate) => validate_config(cli).await,
		Some(Commands::Catalog {
			markdown,
			tag,
			query_type,
			active,
		}) => show_catalog(markdown, tag, query_type, active),
		Some(Commands::Query { tag }) => show_query(&tag),
	}
}

async fn run_reporter(cli: Cli, only_feed: Option<String>) -> Result<()> {
	info!("Starting Tellor feed reporter");
	info!("Loading configuration from: {:?}", cli.config);

	let config =
		ConfigLoader::from_env_and_file(Some(&cli.config)).context("Failed to load configuration")?;

	let tags = match only_feed {
		Some(tag) => vec![tag],
		None => config.feeds.tags.clone(),
	};

	let (oracle, services) =
		build_services(&config, &tags).context("Failed to build reporter services")?;

	match oracle.staker_info().await {
		Ok(info) => info!(
			staked_balance = %info.staked_balance,
			reports_submitted = %info.reports_submitted,
			"Reporter staking state"
		),
		Err(error) => tracing::warn!(%error, "Could not read staking state"),
	}
	if let Ok(timestamp) = oracle.time_of_last_value().await {
		info!(last_value_timestamp = timestamp, "Oracle state");
	}

	let mut handles = Vec::new();
	for (tag, service) in services {
		info!(tag = %tag, "Starting feed");
		handles.push(tokio::spawn(async move { service.run().await }));
	}

	// Setup graceful shutdown
	let shutdown_signal = setup_shutdown_signal();

	info!("Feed reporter started");

	shutdown_signal.await;

	info!("Shutdown signal received, stopping feeds...");
	for handle in handles {
		handle.abort();
	}

	info!("Feed reporter stopped");
	Ok(())
}

fn build_services(
	config: &Config,
	tags: &[String],
) -> Result<(Arc<AlloyOracle>, Vec<(String, ReporterService)>)> {
	let client = reqwest::Client::builder()
		.timeout(Duration::from_secs(config.sources.http_timeout_secs))
		.build()
		.context("Failed to build HTTP client")?;

	let oracle = Arc::new(
		AlloyOracle::connect(
			&config.reporter.rpc_url,
			config.reporter.chain_id,
			config.reporter.oracle_address,
			&config.reporter.private_key,
			config.reporter.gas_limit,
		)
		.context("Failed to connect to the oracle")?,
	);
	info!(reporter = %oracle.reporter_address(), oracle = %config.reporter.oracle_address, "Oracle connected");

	let mut services = Vec::new();
	for tag in tags {
		let feed = feed_for_tag(tag, &client)
			.with_context(|| format!("Failed to build feed '{}'", tag))?
			.with_context(|| format!("No feed defined for tag '{}'", tag))?;

		services.push((
			tag.clone(),
			ReporterService::new(
				feed,
				oracle.clone(),
				Duration::from_secs(config.reporter.interval_secs),
				config.reporter.confirmations,
			),
		));
	}

	Ok((oracle, services))
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = ConfigLoader::from_file(&cli.config).context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("RPC URL: {}", config.reporter.rpc_url);
	info!("Chain id: {}", config.reporter.chain_id);
	info!("Oracle address: {}", config.reporter.oracle_address);
	info!("Report interval: {}s", config.reporter.interval_secs);
	info!("Log level: {}", config.telemetry.log_level);
	info!("Feeds:");
	for tag in &config.feeds.tags {
		info!("  {} ({})", tag, config.feeds.algorithm);
	}

	Ok(())
}

fn show_catalog(
	markdown: bool,
	tag: Option<String>,
	query_type: Option<String>,
	active: Option<bool>,
) -> Result<()> {
	let catalog = standard_catalog().context("Failed to build catalog")?;

	if markdown {
		println!("{}", catalog.to_markdown()?);
		return Ok(());
	}

	let filter = CatalogFilter {
		tag,
		query_type,
		active,
		..Default::default()
	};
	for entry in catalog.find(&filter) {
		println!(
			"{:<32} {:<28} {} active={}",
			entry.tag, entry.query_type, entry.query_id, entry.active
		);
	}

	Ok(())
}

fn show_query(tag: &str) -> Result<()> {
	let catalog = standard_catalog().context("Failed to build catalog")?;
	let entry = catalog
		.get(tag)
		.with_context(|| format!("No catalog entry for tag '{}'", tag))?;
	let query = entry.query()?;

	println!("tag:        {}", entry.tag);
	println!("title:      {}", entry.title);
	println!("descriptor: {}", entry.descriptor);
	println!("query data: 0x{}", hex::encode(query.query_data()));
	println!("query id:   {}", entry.query_id);

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
