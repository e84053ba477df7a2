//! The dispatch pipeline: filter firing alerts, extract their
//! identifier, resolve it against the mapping and run the configured
//! commands, folding every classified outcome into one response.

mod extract;
mod outcome;

pub use extract::{extract_alert_id, ExtractError};
pub use outcome::{
    AlertOutcome, DispatchResponse, CONFIG_UNAVAILABLE_ERROR, NO_MAPPING_WARNING,
};

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    mapping::{MappingError, MappingSource},
    metrics,
    runner::CommandRunner,
    server::{Alert, AlertPayload},
    Error, Result,
};

pub struct Dispatcher {
    mapping: Arc<dyn MappingSource>,
    runner: CommandRunner,
}

impl Dispatcher {
    pub fn new(mapping: Arc<dyn MappingSource>, runner: CommandRunner) -> Self {
        Self { mapping, runner }
    }

    /// Processes one webhook batch. Alerts are handled independently
    /// and in order; a classified failure on one alert never stops the
    /// rest. Only unclassified faults (broken mapping document, spawn
    /// failure) return `Err` and fail the whole request.
    pub async fn dispatch(&self, payload: &AlertPayload) -> Result<DispatchResponse> {
        info!(
            "Received batch of {} alert(s) for receiver '{}'",
            payload.alerts.len(),
            payload.receiver
        );
        metrics::RECEIVED_BATCHES_TOTAL.inc();

        let mut results = Vec::new();
        for alert in &payload.alerts {
            self.dispatch_alert(alert, &mut results).await?;
        }

        Ok(DispatchResponse { results })
    }

    async fn dispatch_alert(&self, alert: &Alert, results: &mut Vec<AlertOutcome>) -> Result<()> {
        let name = alert.name();
        // Lower-cased exact match, no trimming: "firing " is not
        // firing.
        let status = alert.status.to_lowercase();
        info!("Processing alert '{}' with status '{}'", name, status);

        if status != "firing" {
            info!("Ignoring alert '{}' with status '{}'", name, status);
            return Ok(());
        }

        let alert_id = match extract_alert_id(&alert.generator_url) {
            Ok(alert_id) => alert_id,
            Err(e) => {
                error!("Could not find alert_id in generatorURL: {}", e);
                results.push(AlertOutcome::ExtractionFailed {
                    alert: name.to_string(),
                    error: e.to_string(),
                });
                return Ok(());
            }
        };
        info!("Extracted alert_id: {}", alert_id);

        let commands = match self.mapping.resolve(alert_id).await {
            Ok(Some(commands)) if !commands.is_empty() => commands,
            // An empty command set is the same as no entry: the alert
            // still gets its warning record.
            Ok(_) => {
                warn!("No command configured for alert_id '{}'", alert_id);
                results.push(AlertOutcome::NoMapping {
                    alert: name.to_string(),
                    alert_id: alert_id.to_string(),
                    warning: NO_MAPPING_WARNING.to_string(),
                });
                return Ok(());
            }
            Err(MappingError::Unavailable) => {
                error!("Mapping configuration is unavailable");
                results.push(AlertOutcome::ConfigUnavailable {
                    alert: name.to_string(),
                    error: CONFIG_UNAVAILABLE_ERROR.to_string(),
                });
                return Ok(());
            }
            Err(MappingError::Invalid(e)) => {
                return Err(Error::Config(e));
            }
        };

        info!(
            "Found {} command(s) for alert_id '{}'",
            commands.len(),
            alert_id
        );

        // Strictly sequential; commands are independent and a failed
        // one does not short-circuit the rest.
        for command in &commands {
            let result = self.runner.run(name, alert_id, command).await?;
            metrics::record_command(result.status);
            results.push(AlertOutcome::Execution(result));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::StaticMappingSource;
    use crate::runner::CommandStatus;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    struct UnavailableMappingSource;

    #[async_trait]
    impl MappingSource for UnavailableMappingSource {
        async fn resolve(
            &self,
            _alert_id: &str,
        ) -> std::result::Result<Option<Vec<String>>, MappingError> {
            Err(MappingError::Unavailable)
        }
    }

    fn dispatcher(mapping: impl MappingSource + 'static) -> Dispatcher {
        Dispatcher::new(
            Arc::new(mapping),
            CommandRunner::new(Duration::from_secs(5)),
        )
    }

    fn alert(name: &str, status: &str, generator_url: &str) -> Alert {
        let mut labels = HashMap::new();
        labels.insert("alertname".to_string(), name.to_string());
        Alert {
            status: status.to_string(),
            labels,
            annotations: HashMap::new(),
            generator_url: generator_url.to_string(),
            starts_at: None,
            ends_at: None,
        }
    }

    fn batch(alerts: Vec<Alert>) -> AlertPayload {
        AlertPayload {
            receiver: "executor".to_string(),
            status: "firing".to_string(),
            alerts,
            group_labels: None,
            common_labels: None,
            common_annotations: None,
            external_url: None,
            version: None,
            group_key: None,
        }
    }

    #[tokio::test]
    async fn test_firing_alert_runs_mapped_command() {
        let dispatcher = dispatcher(
            StaticMappingSource::new().with_command("42", vec!["echo ok".to_string()]),
        );
        let payload = batch(vec![alert("HighCPU", "firing", "http://host/grafana/42/view")]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 1);
        match &response.results[0] {
            AlertOutcome::Execution(result) => {
                assert_eq!(result.alert, "HighCPU");
                assert_eq!(result.alert_id, "42");
                assert_eq!(result.command, "echo ok");
                assert_eq!(result.status, CommandStatus::Success);
                assert_eq!(result.stdout, "ok");
                assert_eq!(result.stderr, "");
            }
            other => panic!("expected execution result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_firing_alerts_contribute_nothing() {
        let dispatcher = dispatcher(
            StaticMappingSource::new().with_command("42", vec!["echo ok".to_string()]),
        );
        let payload = batch(vec![
            alert("A", "resolved", "http://host/grafana/42/view"),
            alert("B", "Resolved", "http://host/grafana/42/view"),
            alert("C", "RESOLVED", "http://host/grafana/42/view"),
            // Lower-casing only, no trim: trailing space is not firing.
            alert("D", "firing ", "http://host/grafana/42/view"),
            alert("E", "FIRING", "http://host/grafana/42/view"),
        ]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 1);
        match &response.results[0] {
            AlertOutcome::Execution(result) => assert_eq!(result.alert, "E"),
            other => panic!("expected execution result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_is_recorded_and_skipped() {
        let dispatcher = dispatcher(StaticMappingSource::new());
        let payload = batch(vec![alert("Broken", "firing", "http://host/alerting/42")]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 1);
        match &response.results[0] {
            AlertOutcome::ExtractionFailed { alert, error } => {
                assert_eq!(alert, "Broken");
                assert_eq!(error, "Invalid generatorURL format: http://host/alerting/42");
            }
            other => panic!("expected extraction failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unmapped_identifier_is_a_warning() {
        let dispatcher = dispatcher(StaticMappingSource::new());
        let payload = batch(vec![alert("HighCPU", "firing", "http://host/grafana/42/view")]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 1);
        match &response.results[0] {
            AlertOutcome::NoMapping {
                alert,
                alert_id,
                warning,
            } => {
                assert_eq!(alert, "HighCPU");
                assert_eq!(alert_id, "42");
                assert_eq!(warning, NO_MAPPING_WARNING);
            }
            other => panic!("expected mapping miss, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_command_set_is_reported_as_mapping_miss() {
        let dispatcher = dispatcher(StaticMappingSource::new().with_command("42", vec![]));
        let payload = batch(vec![alert("HighCPU", "firing", "http://host/grafana/42/view")]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 1);
        match &response.results[0] {
            AlertOutcome::NoMapping {
                alert,
                alert_id,
                warning,
            } => {
                assert_eq!(alert, "HighCPU");
                assert_eq!(alert_id, "42");
                assert_eq!(warning, NO_MAPPING_WARNING);
            }
            other => panic!("expected mapping miss, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unavailable_mapping_degrades_every_firing_alert() {
        let dispatcher = dispatcher(UnavailableMappingSource);
        let payload = batch(vec![
            alert("A", "firing", "http://host/grafana/1/view"),
            alert("B", "resolved", "http://host/grafana/2/view"),
            alert("C", "firing", "http://host/grafana/3/view"),
        ]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 2);
        for result in &response.results {
            match result {
                AlertOutcome::ConfigUnavailable { error, .. } => {
                    assert_eq!(error, CONFIG_UNAVAILABLE_ERROR);
                }
                other => panic!("expected config-unavailable, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_failed_command_does_not_stop_siblings() {
        let dispatcher = dispatcher(StaticMappingSource::new().with_command(
            "42",
            vec!["exit 1".to_string(), "echo still-here".to_string()],
        ));
        let payload = batch(vec![alert("HighCPU", "firing", "http://host/grafana/42/view")]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 2);
        match (&response.results[0], &response.results[1]) {
            (AlertOutcome::Execution(first), AlertOutcome::Execution(second)) => {
                assert_eq!(first.status, CommandStatus::Failed);
                assert_eq!(second.status, CommandStatus::Success);
                assert_eq!(second.stdout, "still-here");
            }
            other => panic!("expected two execution results, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_one_alert_failure_never_aborts_the_batch() {
        let dispatcher = dispatcher(
            StaticMappingSource::new().with_command("2", vec!["echo ok".to_string()]),
        );
        let payload = batch(vec![
            alert("Broken", "firing", "http://host/no-marker/1"),
            alert("Fine", "firing", "http://host/grafana/2/view"),
        ]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(matches!(
            response.results[0],
            AlertOutcome::ExtractionFailed { .. }
        ));
        assert!(matches!(response.results[1], AlertOutcome::Execution(_)));
    }

    #[tokio::test]
    async fn test_missing_alertname_label_defaults_to_unknown() {
        let dispatcher = dispatcher(StaticMappingSource::new());
        let mut unnamed = alert("ignored", "firing", "http://host/grafana/42/view");
        unnamed.labels.clear();
        let payload = batch(vec![unnamed]);

        let response = dispatcher.dispatch(&payload).await.unwrap();
        match &response.results[0] {
            AlertOutcome::NoMapping { alert, .. } => assert_eq!(alert, "unknown"),
            other => panic!("expected mapping miss, got {:?}", other),
        }
    }
}
