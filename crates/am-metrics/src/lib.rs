use std::env;
use std::sync::OnceLock;

use metrics::{Unit, describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};

/// Matches written by strict generation, labelled by `outcome`.
pub const MATCHES_GENERATED: &str = "am_matches_generated_total";
/// Generation requests, labelled by `outcome` (`matched`, `no_eligible`, `not_found`).
pub const GENERATION_REQUESTS: &str = "am_generation_requests_total";
/// Recorded match decisions, labelled by `decision`.
pub const MATCH_DECISIONS: &str = "am_match_decisions_total";
/// Wall time of a generation request.
pub const GENERATION_SECONDS: &str = "am_generation_duration_seconds";

static STARTED: OnceLock<bool> = OnceLock::new();

fn resolve_port(raw: Option<&str>, default_port: u16) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(default_port)
}

fn describe() {
    describe_counter!(MATCHES_GENERATED, Unit::Count, "Matches persisted by strict generation");
    describe_counter!(GENERATION_REQUESTS, Unit::Count, "Match generation requests by outcome");
    describe_counter!(MATCH_DECISIONS, Unit::Count, "Connected/skipped decisions recorded");
    describe_histogram!(GENERATION_SECONDS, Unit::Seconds, "Duration of match generation");
}

/// Starts the Prometheus exporter on `0.0.0.0:<port>`, port taken from
/// `port_env` or `default_port`. Must run inside a tokio runtime.
///
/// Returns whether an exporter is running. Later calls return the first result.
pub fn init_metrics(port_env: &str, default_port: u16) -> bool {
    *STARTED.get_or_init(|| {
        let port = resolve_port(env::var(port_env).ok().as_deref(), default_port);

        match PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
        {
            Ok(()) => {
                describe();
                info!(metrics_port = port, "prometheus exporter listening");
                true
            }
            Err(err) => {
                warn!(error = %err, metrics_port = port, "prometheus exporter not started");
                false
            }
        }
    })
}
