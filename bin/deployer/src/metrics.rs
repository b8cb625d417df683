//! Prometheus metrics for deployment runs.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Records deployment metrics into the global registry.
///
/// Without an installed exporter every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        describe_counter!("deployer_runs_total", "Total number of deployment runs");
        describe_counter!(
            "deployer_runs_failure_total",
            "Total number of deployment runs aborted by a failing step"
        );
        describe_histogram!(
            "deployer_run_duration_seconds",
            "Duration of each deployment run in seconds"
        );

        describe_counter!(
            "deployer_step_outcome_total",
            "Completed steps by step name and outcome"
        );
        describe_counter!(
            "deployer_step_failure_total",
            "Failed steps by step name"
        );

        describe_histogram!(
            "deployer_submit_duration_seconds",
            "Time from signing a creation transaction to its receipt"
        );
        describe_counter!(
            "deployer_gas_used_total",
            "Gas used by confirmed creation transactions"
        );
    }

    /// Record a finished run.
    pub fn record_run(&self, success: bool, duration: Duration) {
        counter!("deployer_runs_total").increment(1);
        histogram!("deployer_run_duration_seconds").record(duration.as_secs_f64());

        if !success {
            counter!("deployer_runs_failure_total").increment(1);
        }
    }

    pub fn record_step_outcome(&self, step: &str, outcome: &'static str) {
        counter!(
            "deployer_step_outcome_total",
            "step" => step.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    pub fn record_step_failure(&self, step: &str) {
        counter!("deployer_step_failure_total", "step" => step.to_string()).increment(1);
    }

    /// Record a confirmed creation transaction.
    pub fn record_submission(&self, step: &str, gas_used: u64, duration: Duration) {
        histogram!("deployer_submit_duration_seconds", "step" => step.to_string())
            .record(duration.as_secs_f64());
        counter!("deployer_gas_used_total", "step" => step.to_string()).increment(gas_used);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
