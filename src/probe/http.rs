//! HTTP reachability check and outcome classification.

use super::ProbeOutcome;
use std::time::Duration;

/// Run one HTTP GET against the target and classify the result.
///
/// A completed response with a success status is `Online`; any other
/// completed response is `Degraded` with the status line as diagnostic;
/// a transport failure is `Unreachable` with the error description.
pub async fn check_http(
    client: &reqwest::Client,
    target: &str,
    timeout: Duration,
) -> (ProbeOutcome, Option<String>) {
    let url = if target.starts_with("http://") || target.starts_with("https://") {
        target.to_string()
    } else {
        format!("https://{}", target)
    };

    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                (ProbeOutcome::Online, None)
            } else {
                (ProbeOutcome::Degraded, Some(status.to_string()))
            }
        }
        Err(e) => {
            let diagnostic = if e.is_timeout() {
                format!("timed out after {:?}", timeout)
            } else {
                e.to_string()
            };
            (ProbeOutcome::Unreachable, Some(diagnostic))
        }
    }
}
