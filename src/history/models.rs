//! Ledger model types.

use crate::probe::{EndpointReport, GroupResult, ProbeOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One complete probe run, immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRun {
    pub timestamp: DateTime<Utc>,
    pub groups: Vec<GroupResult>,
}

impl ProbeRun {
    pub fn new(timestamp: DateTime<Utc>, groups: Vec<GroupResult>) -> Self {
        Self { timestamp, groups }
    }

    /// Find the report recorded for an endpoint in this run, searching
    /// across all groups since group membership may drift between runs.
    pub fn report_for(&self, name: &str) -> Option<&EndpointReport> {
        self.groups
            .iter()
            .flat_map(|g| &g.endpoints)
            .find(|e| e.name == name)
    }

    pub fn outcome_for(&self, name: &str) -> Option<ProbeOutcome> {
        self.report_for(name).map(|e| e.outcome)
    }
}

/// The append-only sequence of runs, strictly increasing by timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLedger {
    runs: Vec<ProbeRun>,
}

/// One observation in an endpoint's derived time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub outcome: ProbeOutcome,
}

/// Derived per-endpoint time series; never stored, always re-extracted
/// from the ledger.
pub type EndpointSeries = Vec<SeriesPoint>;

impl HistoryLedger {
    pub fn runs(&self) -> &[ProbeRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Return a new ledger with `run` appended. Consumes self; existing
    /// runs are never mutated or reordered.
    pub fn append(mut self, run: ProbeRun) -> Self {
        self.runs.push(run);
        self
    }

    /// Extract the ordered time series for one endpoint by scanning every
    /// run. An endpoint absent from a run (registry drift) contributes no
    /// point for that run; this is not an error.
    pub fn extract_series(&self, name: &str) -> EndpointSeries {
        self.runs
            .iter()
            .filter_map(|run| {
                run.outcome_for(name).map(|outcome| SeriesPoint {
                    timestamp: run.timestamp,
                    outcome,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::EndpointReport;
    use chrono::TimeZone;

    fn run_at(hour: u32, reports: Vec<(&str, ProbeOutcome)>) -> ProbeRun {
        ProbeRun::new(
            Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
            vec![GroupResult {
                group: "A".to_string(),
                endpoints: reports
                    .into_iter()
                    .map(|(name, outcome)| EndpointReport {
                        name: name.to_string(),
                        outcome,
                        diagnostic: None,
                    })
                    .collect(),
            }],
        )
    }

    #[test]
    fn test_append_grows_series_by_one_point() {
        let ledger = HistoryLedger::default()
            .append(run_at(1, vec![("X", ProbeOutcome::Online)]));
        let before = ledger.extract_series("X");

        let run = run_at(2, vec![("X", ProbeOutcome::Degraded)]);
        let ts = run.timestamp;
        let ledger = ledger.append(run);
        let after = ledger.extract_series("X");

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last().unwrap().timestamp, ts);
        assert_eq!(after.last().unwrap().outcome, ProbeOutcome::Degraded);
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[test]
    fn test_append_without_endpoint_leaves_series_unchanged() {
        let ledger = HistoryLedger::default()
            .append(run_at(1, vec![("X", ProbeOutcome::Online)]));
        let before = ledger.extract_series("X");

        let ledger = ledger.append(run_at(2, vec![("Y", ProbeOutcome::Online)]));
        assert_eq!(ledger.extract_series("X"), before);
    }

    #[test]
    fn test_series_survives_registry_drift() {
        // "Z" is recorded in run 1, then dropped from the registry; its
        // history must still be extractable, and group drift must not
        // break matching.
        let ledger = HistoryLedger::default()
            .append(run_at(1, vec![("Z", ProbeOutcome::Unreachable)]))
            .append(run_at(2, vec![("X", ProbeOutcome::Online)]));

        let series = ledger.extract_series("Z");
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].outcome, ProbeOutcome::Unreachable);
    }

    #[test]
    fn test_unknown_endpoint_yields_empty_series() {
        let ledger = HistoryLedger::default()
            .append(run_at(1, vec![("X", ProbeOutcome::Online)]));
        assert!(ledger.extract_series("nope").is_empty());
    }
}
