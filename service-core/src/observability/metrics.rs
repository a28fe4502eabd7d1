use crate::error::AppError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the process-wide Prometheus recorder.
///
/// Metrics emitted before this call, or in processes that never call it,
/// are dropped by the `metrics` facade.
pub fn init_metrics() -> Result<PrometheusHandle, AppError> {
    PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "Failed to install Prometheus recorder: {}",
            e
        ))
    })
}
