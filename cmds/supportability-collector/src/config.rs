//! Process configuration.
//!
//! All settings can be supplied as flags or environment variables. The two
//! Rancher API credentials are mandatory; clap terminates the process with a
//! non-zero exit code before any collection work if either is missing.

use clap::Parser;

#[derive(Parser)]
#[command(name = "supportability-collector")]
#[command(about = "Collects a Rancher supportability bundle and ships it to remote storage")]
#[command(version = env!("COLLECTOR_VERSION"))]
pub struct Settings {
	/// Port the health/version/metrics endpoint listens on.
	#[arg(long, env = "HEALTH_CHECK_PORT", default_value_t = 9000)]
	pub health_check_port: u16,

	/// Rancher API access key.
	#[arg(long, env = "RANCHER_ACCESS_KEY", hide_env_values = true)]
	pub rancher_access_key: String,

	/// Rancher API secret key.
	#[arg(long, env = "RANCHER_SECRET_KEY", hide_env_values = true)]
	pub rancher_secret_key: String,

	/// Namespace the Rancher server workloads run in.
	#[arg(long, env = "RANCHER_NAMESPACE", default_value = "cattle-system")]
	pub rancher_namespace: String,

	/// Log level: trace, debug, info, warn, error.
	#[arg(long, default_value = "info")]
	pub log_level: String,
}
