//! Incident correlation module.
//!
//! Fetches an externally maintained incident feed and indexes it by endpoint
//! name and calendar date. Correlation is enrichment only: every fetch or
//! parse failure degrades to an empty index, never to a run failure.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Display category for an incident entry, normalized case-insensitively
/// from the feed's free-form kind column. Anything that is not a problem
/// report counts as a resolution report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentKind {
    Problem,
    Resolution,
}

impl IncidentKind {
    pub fn from_feed(kind: &str) -> Self {
        if kind.trim().eq_ignore_ascii_case("error") {
            IncidentKind::Problem
        } else {
            IncidentKind::Resolution
        }
    }
}

/// One externally reported incident tied to an endpoint and a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentEntry {
    pub endpoint: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub kind: IncidentKind,
    pub text: String,
}

/// All incidents for one calendar day, as handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentDay {
    pub date: NaiveDate,
    pub entries: Vec<IncidentEntry>,
}

/// Incidents indexed by endpoint name, then calendar date. Within a date,
/// entries keep feed arrival order until presentation ordering is applied.
#[derive(Debug, Clone, Default)]
pub struct IncidentIndex {
    by_endpoint: HashMap<String, BTreeMap<NaiveDate, Vec<IncidentEntry>>>,
}

impl IncidentIndex {
    pub fn insert(&mut self, entry: IncidentEntry) {
        self.by_endpoint
            .entry(entry.endpoint.clone())
            .or_default()
            .entry(entry.date)
            .or_default()
            .push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.by_endpoint.is_empty()
    }

    /// Number of indexed entries across all endpoints and dates.
    pub fn len(&self) -> usize {
        self.by_endpoint
            .values()
            .flat_map(|days| days.values())
            .map(|entries| entries.len())
            .sum()
    }

    /// Incident days for one endpoint in display order: dates descending,
    /// entries within a date ascending by time. The sort is stable, so
    /// entries with equal times keep feed arrival order. Unknown endpoints
    /// yield no days.
    pub fn days_for(&self, endpoint: &str) -> Vec<IncidentDay> {
        let Some(days) = self.by_endpoint.get(endpoint) else {
            return Vec::new();
        };

        days.iter()
            .rev()
            .map(|(date, entries)| {
                let mut entries = entries.clone();
                entries.sort_by_key(|e| e.time);
                IncidentDay {
                    date: *date,
                    entries,
                }
            })
            .collect()
    }
}

/// Parse the tabular incident feed: a header row, then rows of
/// `(endpoint, "date time", kind, text)`. Rows that do not fit this shape
/// are skipped individually rather than failing the batch.
pub fn parse_feed(payload: &str) -> IncidentIndex {
    let mut index = IncidentIndex::default();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(payload.as_bytes());

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("skipping unreadable feed row: {}", e);
                continue;
            }
        };

        if record.len() != 4 {
            tracing::debug!("skipping feed row with {} fields", record.len());
            continue;
        }

        let Some((date, time)) = parse_moment(&record[1]) else {
            tracing::debug!("skipping feed row with bad timestamp: {}", &record[1]);
            continue;
        };

        index.insert(IncidentEntry {
            endpoint: record[0].trim().to_string(),
            date,
            time,
            kind: IncidentKind::from_feed(&record[2]),
            text: record[3].trim().to_string(),
        });
    }

    index
}

/// Split a feed `"date time"` field into its calendar date and time of day.
fn parse_moment(raw: &str) -> Option<(NaiveDate, NaiveTime)> {
    let (date_part, time_part) = raw.trim().split_once(' ')?;
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time_part, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time_part, "%H:%M"))
        .ok()?;
    Some((date, time))
}

/// Fetches the incident feed once per run. Owns nothing durable.
pub struct IncidentCorrelator {
    client: reqwest::Client,
    feed_url: String,
}

impl IncidentCorrelator {
    pub fn new(feed_url: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            feed_url: feed_url.to_string(),
        }
    }

    /// Fetch and index the feed, best-effort. Network errors, non-success
    /// responses, and unreadable payloads all yield the empty index.
    pub async fn fetch(&self) -> IncidentIndex {
        if self.feed_url.is_empty() {
            tracing::debug!("no incident feed configured");
            return IncidentIndex::default();
        }

        let response = match self.client.get(&self.feed_url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("incident feed fetch failed: {}", e);
                return IncidentIndex::default();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("incident feed returned {}", response.status());
            return IncidentIndex::default();
        }

        match response.text().await {
            Ok(payload) => {
                let index = parse_feed(&payload);
                tracing::info!("indexed {} incident entries", index.len());
                index
            }
            Err(e) => {
                tracing::warn!("incident feed body unreadable: {}", e);
                IncidentIndex::default()
            }
        }
    }
}
