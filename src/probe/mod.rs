//! Probe module for endpoint reachability checks.
//!
//! One HTTP GET per endpoint per run, classified into an outcome. Probes are
//! independent of each other and fan out concurrently across the registry.

mod http;

pub use http::*;

use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinSet;

/// Classified result of a single reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    /// Transport succeeded and the response indicates success.
    Online,
    /// Transport succeeded but the response indicates failure.
    Degraded,
    /// Transport itself failed (timeout, DNS, connection refused).
    Unreachable,
}

impl ProbeOutcome {
    pub fn is_online(self) -> bool {
        matches!(self, ProbeOutcome::Online)
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Online => write!(f, "online"),
            ProbeOutcome::Degraded => write!(f, "degraded"),
            ProbeOutcome::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Outcome of probing one named endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointReport {
    pub name: String,
    pub outcome: ProbeOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

/// Probe results for one group, in registry order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupResult {
    pub group: String,
    pub endpoints: Vec<EndpointReport>,
}

/// Executes reachability checks with a fixed per-probe timeout.
///
/// Construction takes the timeout explicitly; there is no ambient
/// configuration state.
#[derive(Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    /// Probe a single endpoint. Never fails: every transport error is
    /// classified into an outcome with a diagnostic.
    pub async fn check(&self, name: &str, target: &str) -> EndpointReport {
        // Jitter to avoid a thundering herd against shared hosts
        let jitter = rand::random::<u64>() % 100;
        tokio::time::sleep(Duration::from_millis(jitter)).await;

        let (outcome, diagnostic) = check_http(&self.client, target, self.timeout).await;
        EndpointReport {
            name: name.to_string(),
            outcome,
            diagnostic,
        }
    }

    /// Probe every endpoint in the registry with concurrent fan-out, bounded
    /// by the endpoint count. Results are reassembled in registry order so
    /// the run is deterministic regardless of completion order.
    pub async fn probe_all(&self, registry: &Registry) -> Vec<GroupResult> {
        let mut set: JoinSet<(usize, usize, EndpointReport)> = JoinSet::new();

        for (gi, group) in registry.groups.iter().enumerate() {
            for (ei, ep) in group.endpoints.iter().enumerate() {
                let prober = self.clone();
                let name = ep.name.clone();
                let target = ep.target.clone();
                set.spawn(async move { (gi, ei, prober.check(&name, &target).await) });
            }
        }

        let mut slots: Vec<Vec<Option<EndpointReport>>> = registry
            .groups
            .iter()
            .map(|g| vec![None; g.endpoints.len()])
            .collect();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((gi, ei, report)) => slots[gi][ei] = Some(report),
                Err(e) => tracing::error!("probe task panicked: {}", e),
            }
        }

        registry
            .groups
            .iter()
            .zip(slots)
            .map(|(group, reports)| GroupResult {
                group: group.group.clone(),
                endpoints: reports
                    .into_iter()
                    .zip(&group.endpoints)
                    .map(|(report, ep)| {
                        report.unwrap_or_else(|| EndpointReport {
                            name: ep.name.clone(),
                            outcome: ProbeOutcome::Unreachable,
                            diagnostic: Some("probe task failed".to_string()),
                        })
                    })
                    .collect(),
            })
            .collect()
    }
}
