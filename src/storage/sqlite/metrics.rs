//! Metrics recording for store operations.

use std::time::Instant;

/// Records operation metrics for storage operations.
///
/// This function records two metrics for each operation:
/// 1. `storage_operations_total` - Counter for operation count by status
/// 2. `storage_operation_duration_ms` - Histogram for operation latency
///
/// # Arguments
///
/// * `backend` - Backend name (e.g., "sqlite", "journal")
/// * `operation` - Operation name (e.g., "save", "get", "scan_classified")
/// * `start` - Operation start time from `Instant::now()`
/// * `status` - Operation status ("success" or "error")
pub fn record_operation_metrics(
    backend: &'static str,
    operation: &'static str,
    start: Instant,
    status: &'static str,
) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => backend,
        "operation" => operation,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}
