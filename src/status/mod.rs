//! Status aggregation module.
//!
//! Joins the current probe results, the full ledger, and the incident index
//! into one Snapshot for the presentation adapter. Pure computation over
//! already-validated inputs; missing series or incidents mean "no data",
//! never an error.

use crate::history::{EndpointSeries, HistoryLedger, ProbeRun};
use crate::incidents::{IncidentDay, IncidentIndex};
use crate::probe::ProbeOutcome;
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current state of one endpoint, with its full history and incident view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub name: String,
    pub target: String,
    pub outcome: ProbeOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Fraction of recorded points that were online, over the whole series.
    pub uptime_ratio: f64,
    pub series: EndpointSeries,
    pub incidents: Vec<IncidentDay>,
}

/// Rollup for one group. The rollup is binary: a group is online iff every
/// endpoint in it is online this run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatus {
    pub group: String,
    pub online: bool,
    pub endpoints: Vec<EndpointStatus>,
}

/// The aggregate handed to presentation. Created fresh each run and never
/// persisted; only the ledger is durable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub overall_online: bool,
    pub groups: Vec<GroupStatus>,
    /// Full ledger, inlined for the charting frontend.
    pub history: HistoryLedger,
}

/// Build the snapshot for one run. `ledger` is the post-append ledger, so
/// every series already includes the current run's point. Endpoints no
/// longer in the registry keep their history in `ledger` but get no entry
/// in the snapshot.
pub fn aggregate(
    registry: &Registry,
    run: &ProbeRun,
    ledger: &HistoryLedger,
    incidents: &IncidentIndex,
) -> Snapshot {
    let groups: Vec<GroupStatus> = registry
        .groups
        .iter()
        .map(|group| {
            let endpoints: Vec<EndpointStatus> = group
                .endpoints
                .iter()
                .map(|ep| {
                    let report = run.report_for(&ep.name);
                    let series = ledger.extract_series(&ep.name);
                    EndpointStatus {
                        name: ep.name.clone(),
                        target: ep.target.clone(),
                        outcome: report
                            .map(|r| r.outcome)
                            .unwrap_or(ProbeOutcome::Unreachable),
                        diagnostic: report.and_then(|r| r.diagnostic.clone()),
                        uptime_ratio: uptime_ratio(&series),
                        incidents: incidents.days_for(&ep.name),
                        series,
                    }
                })
                .collect();

            GroupStatus {
                group: group.group.clone(),
                online: endpoints.iter().all(|e| e.outcome.is_online()),
                endpoints,
            }
        })
        .collect();

    Snapshot {
        generated_at: run.timestamp,
        overall_online: groups.iter().all(|g| g.online),
        groups,
        history: ledger.clone(),
    }
}

fn uptime_ratio(series: &EndpointSeries) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let online = series.iter().filter(|p| p.outcome.is_online()).count();
    online as f64 / series.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidents::parse_feed;
    use crate::probe::{EndpointReport, GroupResult};
    use crate::registry::{Endpoint, EndpointGroup};
    use chrono::TimeZone;

    fn registry(groups: &[(&str, &[&str])]) -> Registry {
        Registry {
            groups: groups
                .iter()
                .map(|(name, endpoints)| EndpointGroup {
                    group: name.to_string(),
                    endpoints: endpoints
                        .iter()
                        .map(|ep| Endpoint {
                            name: ep.to_string(),
                            target: format!("https://{}.example.com", ep),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn run_at(hour: u32, groups: &[(&str, &[(&str, ProbeOutcome)])]) -> ProbeRun {
        ProbeRun::new(
            Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
            groups
                .iter()
                .map(|(name, reports)| GroupResult {
                    group: name.to_string(),
                    endpoints: reports
                        .iter()
                        .map(|(ep, outcome)| EndpointReport {
                            name: ep.to_string(),
                            outcome: *outcome,
                            diagnostic: None,
                        })
                        .collect(),
                })
                .collect(),
        )
    }

    #[test]
    fn test_one_unreachable_endpoint_flags_group_and_overall() {
        let registry = registry(&[("A", &["X", "Y"])]);
        let run = run_at(
            1,
            &[(
                "A",
                &[("X", ProbeOutcome::Online), ("Y", ProbeOutcome::Unreachable)],
            )],
        );
        let ledger = HistoryLedger::default().append(run.clone());

        let snapshot = aggregate(&registry, &run, &ledger, &IncidentIndex::default());

        assert!(!snapshot.overall_online);
        assert!(!snapshot.groups[0].online);

        let x = &snapshot.groups[0].endpoints[0];
        assert_eq!(x.outcome, ProbeOutcome::Online);
        assert_eq!(x.series.len(), 1);
        assert_eq!(x.series[0].outcome, ProbeOutcome::Online);

        let y = &snapshot.groups[0].endpoints[1];
        assert_eq!(y.outcome, ProbeOutcome::Unreachable);
        assert_eq!(y.series.len(), 1);
        assert_eq!(y.series[0].outcome, ProbeOutcome::Unreachable);
    }

    #[test]
    fn test_all_online_rolls_up_online() {
        let registry = registry(&[("A", &["X"]), ("B", &["Y"])]);
        let run = run_at(
            1,
            &[
                ("A", &[("X", ProbeOutcome::Online)]),
                ("B", &[("Y", ProbeOutcome::Online)]),
            ],
        );
        let ledger = HistoryLedger::default().append(run.clone());

        let snapshot = aggregate(&registry, &run, &ledger, &IncidentIndex::default());
        assert!(snapshot.overall_online);
        assert!(snapshot.groups.iter().all(|g| g.online));
    }

    #[test]
    fn test_degraded_endpoint_only_affects_its_group() {
        let registry = registry(&[("A", &["X"]), ("B", &["Y"])]);
        let run = run_at(
            1,
            &[
                ("A", &[("X", ProbeOutcome::Degraded)]),
                ("B", &[("Y", ProbeOutcome::Online)]),
            ],
        );
        let ledger = HistoryLedger::default().append(run.clone());

        let snapshot = aggregate(&registry, &run, &ledger, &IncidentIndex::default());
        assert!(!snapshot.overall_online);
        assert!(!snapshot.groups[0].online);
        assert!(snapshot.groups[1].online);
    }

    #[test]
    fn test_removed_endpoint_keeps_history_but_gets_no_entry() {
        // Run 1 recorded "Z"; the registry then dropped it before run 2
        let run1 = run_at(1, &[("A", &[("Z", ProbeOutcome::Online)])]);
        let run2 = run_at(2, &[("A", &[("X", ProbeOutcome::Online)])]);
        let ledger = HistoryLedger::default()
            .append(run1)
            .append(run2.clone());

        let registry = registry(&[("A", &["X"])]);
        let snapshot = aggregate(&registry, &run2, &ledger, &IncidentIndex::default());

        assert_eq!(ledger.extract_series("Z").len(), 1);
        let names: Vec<&str> = snapshot
            .groups
            .iter()
            .flat_map(|g| g.endpoints.iter().map(|e| e.name.as_str()))
            .collect();
        assert_eq!(names, vec!["X"]);
    }

    #[test]
    fn test_incidents_joined_per_endpoint() {
        let registry = registry(&[("A", &["X", "Y"])]);
        let run = run_at(
            1,
            &[("A", &[("X", ProbeOutcome::Online), ("Y", ProbeOutcome::Online)])],
        );
        let ledger = HistoryLedger::default().append(run.clone());
        let incidents = parse_feed(
            "endpoint,moment,kind,text\nX,2024-06-01 09:00,error,down again\n",
        );

        let snapshot = aggregate(&registry, &run, &ledger, &incidents);
        assert_eq!(snapshot.groups[0].endpoints[0].incidents.len(), 1);
        assert!(snapshot.groups[0].endpoints[1].incidents.is_empty());
    }

    #[test]
    fn test_uptime_ratio_over_series() {
        let registry = registry(&[("A", &["X"])]);
        let run1 = run_at(1, &[("A", &[("X", ProbeOutcome::Online)])]);
        let run2 = run_at(2, &[("A", &[("X", ProbeOutcome::Unreachable)])]);
        let ledger = HistoryLedger::default().append(run1).append(run2.clone());

        let snapshot = aggregate(&registry, &run2, &ledger, &IncidentIndex::default());
        let x = &snapshot.groups[0].endpoints[0];
        assert!((x.uptime_ratio - 0.5).abs() < f64::EPSILON);
    }
}
