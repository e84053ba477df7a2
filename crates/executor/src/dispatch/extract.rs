use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid generatorURL format: {url}")]
pub struct ExtractError {
    pub url: String,
}

/// Pulls the alert identifier out of a generator URL: the path segment
/// immediately following the first `grafana` segment. No decoding
/// beyond a literal split on `/`.
pub fn extract_alert_id(url: &str) -> Result<&str, ExtractError> {
    let mut segments = url.split('/');
    segments
        .by_ref()
        .find(|segment| *segment == "grafana")
        .and_then(|_| segments.next())
        .ok_or_else(|| ExtractError {
            url: url.to_string(),
        })
}
