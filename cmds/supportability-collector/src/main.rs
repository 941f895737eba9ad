use anyhow::Result;
use clap::Parser;
use collector::{collect, config::Settings, health};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing from the --log-level flag, with RUST_LOG able to
/// override individual targets.
fn init_logger(level: &str) {
	let level = match level.to_lowercase().as_str() {
		"trace" => "trace",
		"debug" => "debug",
		"info" => "info",
		"warn" | "warning" => "warn",
		"error" => "error",
		_ => "info",
	};

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}

#[tokio::main]
async fn main() -> Result<()> {
	let settings = Settings::parse();
	init_logger(&settings.log_level);

	info!(version = env!("COLLECTOR_VERSION"), "starting supportability collector");

	let (_addr, _health) = health::spawn(settings.health_check_port).await?;
	collect::run(&settings).await?;
	Ok(())
}
