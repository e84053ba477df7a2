use lazy_static::lazy_static;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

use crate::runner::CommandStatus;

lazy_static! {
    pub static ref RECEIVED_BATCHES_TOTAL: IntCounter = register_int_counter!(
        "alert_executor_received_batches_total",
        "Total number of alert batches received."
    )
    .unwrap();
    pub static ref COMMANDS_SUCCESS_TOTAL: IntCounter = register_int_counter!(
        "alert_executor_commands_success_total",
        "Total number of commands that exited zero."
    )
    .unwrap();
    pub static ref COMMANDS_FAILED_TOTAL: IntCounter = register_int_counter!(
        "alert_executor_commands_failed_total",
        "Total number of commands that exited non-zero."
    )
    .unwrap();
    pub static ref COMMANDS_TIMEOUT_TOTAL: IntCounter = register_int_counter!(
        "alert_executor_commands_timeout_total",
        "Total number of commands killed after exceeding the timeout."
    )
    .unwrap();
}

pub fn record_command(status: CommandStatus) {
    match status {
        CommandStatus::Success => COMMANDS_SUCCESS_TOTAL.inc(),
        CommandStatus::Failed => COMMANDS_FAILED_TOTAL.inc(),
        CommandStatus::Timeout => COMMANDS_TIMEOUT_TOTAL.inc(),
    }
}

// Text exposition for the /metrics route.
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}
