/// Next-match relay: The Blue Alliance client
///
/// Read-only access to `GET /event/{event_key}/matches`.
/// Auth: static key in the `X-TBA-Auth-Key` header.
/// No retries, no pagination: one call returns the whole event schedule.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const TBA_BASE_URL: &str = "https://www.thebluealliance.com/api/v3";
pub const AUTH_HEADER:  &str = "X-TBA-Auth-Key";

// ── Match structs ─────────────────────────────────────────────────────────────

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompLevel {
    /// Qualification
    Qm,
    Ef,
    Qf,
    Sf,
    F,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Alliance {
    #[serde(default)]
    pub team_keys: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Alliances {
    pub red:  Alliance,
    pub blue: Alliance,
}

/// Fields of a match record the relay filters on.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MatchSummary {
    #[serde(default)]
    pub key:            String,
    pub comp_level:     CompLevel,
    pub predicted_time: Option<i64>,   // unix seconds, null = unscheduled
    pub alliances:      Alliances,
}

/// One match: the typed summary plus the record exactly as TBA sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMatch {
    pub summary: MatchSummary,
    pub raw:     Value,
}

impl EventMatch {
    pub fn from_raw(raw: Value) -> Result<Self> {
        let summary: MatchSummary = serde_json::from_value(raw.clone())
            .context("malformed match record")?;
        Ok(Self { summary, raw })
    }

    /// Build from a summary alone (raw = the summary serialized back).
    pub fn from_summary(summary: MatchSummary) -> Self {
        let raw = serde_json::to_value(&summary).unwrap_or(Value::Null);
        Self { summary, raw }
    }

    pub fn is_qualification(&self) -> bool {
        self.summary.comp_level == CompLevel::Qm
    }

    pub fn predicted_time(&self) -> Option<i64> {
        self.summary.predicted_time
    }

    /// Red then blue keys, duplicates dropped.
    pub fn team_keys(&self) -> Vec<&str> {
        let alliances = &self.summary.alliances;
        let mut keys: Vec<&str> = Vec::new();
        for key in alliances.red.team_keys.iter().chain(&alliances.blue.team_keys) {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }

    pub fn has_team(&self, team: &str) -> bool {
        let alliances = &self.summary.alliances;
        alliances.red.team_keys.iter().chain(&alliances.blue.team_keys).any(|k| k == team)
    }
}

// ── TbaClient ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TbaClient {
    client:   reqwest::Client,
    base_url: String,
    auth_key: Option<String>,
}

impl TbaClient {
    pub fn new(base_url: impl Into<String>, auth_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("next-match-relay/0.1")
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whole match list of one event. Any failure is returned, never swallowed.
    pub async fn fetch_event_matches(&self, event_key: &str) -> Result<Vec<EventMatch>> {
        let url = format!("{}/event/{}/matches", self.base_url, event_key);

        let mut req = self.client.get(&url)
            .header("Accept", "application/json");
        if let Some(ref key) = self.auth_key {
            req = req.header(AUTH_HEADER, key);
        }

        let resp = req.send().await
            .with_context(|| format!("TBA request failed for {event_key}"))?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(anyhow!("TBA {event_key} status {status}: {snippet}"));
        }

        let raw = resp.text().await.context("TBA body read failed")?;
        let data: Value = serde_json::from_str(&raw)
            .with_context(|| format!("TBA {event_key} JSON parse failed"))?;

        let Value::Array(records) = data else {
            return Err(anyhow!("TBA {event_key}: expected a JSON array of matches"));
        };

        let matches = records
            .into_iter()
            .map(EventMatch::from_raw)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("TBA {event_key} match list"))?;

        debug!("TBA {event_key}: {} matches", matches.len());
        Ok(matches)
    }
}
