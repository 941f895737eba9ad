//! Background health endpoint.
//!
//! Serves liveness, build version and a small metrics exposition while the
//! pipeline runs. The endpoint shares no state with the pipeline; it is
//! started before collection begins and dies with the process.

use std::{
	net::SocketAddr,
	time::Instant,
};

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info};

/// Bind the health endpoint on `0.0.0.0:<port>` and serve it on a detached
/// task. Bind failures are reported to the caller; serve failures after a
/// successful bind are logged.
pub async fn spawn(port: u16) -> Result<(SocketAddr, JoinHandle<()>)> {
	let listener = TcpListener::bind(("0.0.0.0", port))
		.await
		.with_context(|| format!("binding health endpoint on port {port}"))?;
	let addr = listener.local_addr().context("resolving health endpoint address")?;

	let started = Instant::now();
	let router = Router::new()
		.route("/healthz", get(|| async { "OK" }))
		.route("/version", get(|| async { version_body() }))
		.route("/metrics", get(move || async move { render_metrics(started) }));

	info!(%addr, "health endpoint listening");
	let handle = tokio::spawn(async move {
		if let Err(err) = axum::serve(listener, router).await {
			error!(error = %err, "health endpoint failed");
		}
	});
	Ok((addr, handle))
}

fn version_body() -> String {
	format!("Version: {}", env!("COLLECTOR_VERSION"))
}

/// Minimal Prometheus exposition: build metadata and process uptime.
fn render_metrics(started: Instant) -> String {
	let mut out = String::new();
	out.push_str("# HELP collector_build_info Build metadata for the running collector.\n");
	out.push_str("# TYPE collector_build_info gauge\n");
	out.push_str(&format!(
		"collector_build_info{{version=\"{}\"}} 1\n",
		env!("COLLECTOR_VERSION")
	));
	out.push_str("# HELP collector_uptime_seconds Seconds since process start.\n");
	out.push_str("# TYPE collector_uptime_seconds gauge\n");
	out.push_str(&format!(
		"collector_uptime_seconds {:.3}\n",
		started.elapsed().as_secs_f64()
	));
	out
}
