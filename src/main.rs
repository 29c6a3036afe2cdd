//! Pulseboard - Batch Endpoint Status Engine
//!
//! Probes a grouped registry of endpoints once, appends the outcome to an
//! append-only history ledger, correlates an external incident feed, and
//! writes the aggregated snapshot for the presentation layer. Scheduling
//! between runs is an external concern.

mod config;
mod history;
mod incidents;
mod probe;
mod registry;
mod status;

use config::RunConfig;
use history::{HistoryStore, ProbeRun};
use incidents::IncidentCorrelator;
use probe::Prober;
use registry::Registry;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pulseboard=info".parse()?))
        .init();

    // Load configuration and the endpoint registry
    let cfg = RunConfig::load();
    let registry = Registry::load(&cfg.registry_path)?;
    tracing::info!(
        "Starting run: {} endpoints in {} groups",
        registry.endpoint_count(),
        registry.groups.len()
    );

    let prober = Prober::new(cfg.probe_timeout)?;
    let correlator = IncidentCorrelator::new(&cfg.feed_url, reqwest::Client::new());

    // Probing and the incident fetch touch disjoint resources, so they run
    // concurrently within the single pass.
    let (groups, incident_index) =
        tokio::join!(prober.probe_all(&registry), correlator.fetch());

    let run = ProbeRun::new(Utc::now(), groups);

    // Log outcomes before touching the ledger, so a storage failure never
    // hides the fact that probing itself completed.
    for group in &run.groups {
        for ep in &group.endpoints {
            match &ep.diagnostic {
                Some(diag) => tracing::info!("{}/{}: {} ({})", group.group, ep.name, ep.outcome, diag),
                None => tracing::info!("{}/{}: {}", group.group, ep.name, ep.outcome),
            }
        }
    }

    // Append-only ledger update: load, append, persist atomically
    let store = HistoryStore::new(&cfg.ledger_path);
    let ledger = store.load()?.append(run.clone());
    store.persist(&ledger)?;
    tracing::info!("Ledger now holds {} runs", ledger.len());

    // Join everything into the snapshot for the presentation adapter
    let snapshot = status::aggregate(&registry, &run, &ledger, &incident_index);
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(&cfg.snapshot_path, json)?;

    if snapshot.overall_online {
        tracing::info!("All groups online; snapshot written to {}", cfg.snapshot_path);
    } else {
        let unhealthy: Vec<&str> = snapshot
            .groups
            .iter()
            .filter(|g| !g.online)
            .map(|g| g.group.as_str())
            .collect();
        tracing::warn!(
            "Unhealthy groups: {}; snapshot written to {}",
            unhealthy.join(", "),
            cfg.snapshot_path
        );
    }

    Ok(())
}
