//! Next-match relay: Next Match
//!
//! For each tracked team: the soonest future qualification match across all
//! championship divisions, with the division name and its stream link.
//!
//!   1. Resolve every division's event key (config errors fail fast)
//!   2. Fetch each division's match list from TBA
//!   3. Fold (division, match) pairs in division order into one entry per team
//!
//! One failed division fails the whole call. No partial results.

pub mod config;

pub use config::{Division, RelayConfig};

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tba_client::{EventMatch, TbaClient};
use tracing::{debug, info};

/// team key -> entry; teams without an upcoming match are absent.
pub type NextMatches = BTreeMap<String, UpcomingMatchEntry>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UpcomingMatchEntry {
    #[serde(rename = "match")]
    pub match_record:   Value,
    pub division:       String,
    pub stream:         String,
    #[serde(skip)]
    pub predicted_time: i64,
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// Predicted time of a match that can still be someone's next match.
fn eligible_time(m: &EventMatch, now: i64) -> Option<i64> {
    if !m.is_qualification() {
        return None;
    }
    m.predicted_time().filter(|&t| t > now)
}

struct Candidate<'a> {
    division:       &'a Division,
    event_match:    &'a EventMatch,
    predicted_time: i64,
}

/// Pure reduction over already-fetched match lists.
///
/// `batches` must come in division order: on equal predicted times the
/// match seen first is kept.
pub fn select_next_matches<'a, I>(roster: &[String], batches: I, now: i64) -> NextMatches
where
    I: IntoIterator<Item = (&'a Division, &'a [EventMatch])>,
{
    let best = batches
        .into_iter()
        .flat_map(|(division, matches)| matches.iter().map(move |m| (division, m)))
        .filter_map(|(division, m)| eligible_time(m, now).map(|t| (division, m, t)))
        .fold(HashMap::<&str, Candidate<'a>>::new(), |mut best, (division, m, t)| {
            for team in roster.iter().filter(|team| m.has_team(team)) {
                let replace = match best.get(team.as_str()) {
                    Some(current) => t < current.predicted_time,
                    None => true,
                };
                if replace {
                    best.insert(
                        team.as_str(),
                        Candidate { division, event_match: m, predicted_time: t },
                    );
                }
            }
            best
        });

    best.into_iter()
        .map(|(team, c)| {
            (
                team.to_string(),
                UpcomingMatchEntry {
                    match_record:   c.event_match.raw.clone(),
                    division:       c.division.name.clone(),
                    stream:         c.division.stream.clone(),
                    predicted_time: c.predicted_time,
                },
            )
        })
        .collect()
}

// ── Aggregator ────────────────────────────────────────────────────────────────

pub struct NextMatchAggregator {
    client:    TbaClient,
    roster:    Vec<String>,
    divisions: Vec<Division>,
}

impl NextMatchAggregator {
    pub fn new(client: TbaClient, roster: Vec<String>, divisions: Vec<Division>) -> Self {
        Self { client, roster, divisions }
    }

    pub fn from_config(cfg: &RelayConfig) -> Self {
        let client = TbaClient::new(
            cfg.tba_base_url.clone(),
            cfg.tba_auth_key.clone(),
            cfg.request_timeout(),
        );
        Self::new(client, cfg.roster.clone(), cfg.divisions.clone())
    }

    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    pub async fn get_next_matches(&self) -> Result<NextMatches> {
        self.get_next_matches_at(Utc::now().timestamp()).await
    }

    /// `now` in unix seconds, one snapshot for every division.
    pub async fn get_next_matches_at(&self, now: i64) -> Result<NextMatches> {
        let event_keys = self
            .divisions
            .iter()
            .map(Division::event_key)
            .collect::<Result<Vec<_>>>()?;

        // try_join_all keeps input order, so the tie-break stays on division order.
        let fetched = try_join_all(self.divisions.iter().zip(&event_keys).map(
            |(division, key)| async move {
                let matches = self
                    .client
                    .fetch_event_matches(key)
                    .await
                    .with_context(|| format!("division {} ({key})", division.name))?;
                debug!("{}: {} matches", division.name, matches.len());
                Ok::<_, anyhow::Error>(matches)
            },
        ))
        .await?;

        let total: usize = fetched.iter().map(Vec::len).sum();
        let next = select_next_matches(
            &self.roster,
            self.divisions.iter().zip(fetched.iter().map(Vec::as_slice)),
            now,
        );

        info!(
            divisions = self.divisions.len(),
            matches = total,
            teams = next.len(),
            "next matches computed"
        );
        Ok(next)
    }
}
