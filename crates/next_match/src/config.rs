//! Static tables + env overrides, parsed once at startup.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use tba_client::TBA_BASE_URL;

/// Tracked teams (Israel, 2025).
pub const TRACKED_TEAMS: [&str; 12] = [
    "frc2231", "frc5951", "frc1690", "frc5990", "frc5654", "frc2630",
    "frc2230", "frc3339", "frc5987", "frc1942", "frc5614", "frc6738",
];

/// Championship divisions in processing order: (name, event URL, stream).
pub const CHAMPIONSHIP_DIVISIONS: [(&str, &str, &str); 8] = [
    ("galileo",    "https://www.thebluealliance.com/event/2025gal", "https://www.twitch.tv/firstinspires_galileo"),
    ("archimedes", "https://www.thebluealliance.com/event/2025arc", "https://www.twitch.tv/firstinspires_archimedes"),
    ("newton",     "https://www.thebluealliance.com/event/2025new", "https://www.twitch.tv/firstinspires_newton"),
    ("curie",      "https://www.thebluealliance.com/event/2025cur", "https://www.twitch.tv/firstinspires_curie"),
    ("daly",       "https://www.thebluealliance.com/event/2025dal", "https://www.twitch.tv/firstinspires_daly"),
    ("hopper",     "https://www.thebluealliance.com/event/2025hop", "https://www.twitch.tv/firstinspires_hopper"),
    ("johnson",    "https://www.thebluealliance.com/event/2025joh", "https://www.twitch.tv/firstinspires_johnson"),
    ("milstein",   "https://www.thebluealliance.com/event/2025mil", "https://www.twitch.tv/firstinspires_milstein"),
];

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub name:      String,
    pub event_url: Option<String>,
    pub stream:    String,
}

impl Division {
    pub fn new(name: impl Into<String>, event_url: Option<String>, stream: impl Into<String>) -> Self {
        Self { name: name.into(), event_url, stream: stream.into() }
    }

    /// Last path segment of the event URL, e.g. `.../event/2025cur` -> `2025cur`.
    pub fn event_key(&self) -> Result<String> {
        let url = self
            .event_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("division {}: event URL not configured", self.name))?;

        url.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|seg| !seg.is_empty() && !seg.contains(':'))
            .map(str::to_string)
            .ok_or_else(|| anyhow!("division {}: no event key in {url}", self.name))
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind:                 SocketAddr,
    pub tba_base_url:         String,
    pub tba_auth_key:         Option<String>,
    pub request_timeout_secs: u64,
    pub log_dir:              String,
    pub roster:               Vec<String>,
    pub divisions:            Vec<Division>,
}

impl RelayConfig {
    /// Built-in tables, no env lookups.
    pub fn defaults() -> Self {
        Self {
            bind:                 SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            tba_base_url:         TBA_BASE_URL.to_string(),
            tba_auth_key:         None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_dir:              "logs".to_string(),
            roster:               default_roster(),
            divisions:            default_divisions(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `lookup` stands in for the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::defaults();

        if let Some(bind) = lookup("RELAY_BIND") {
            cfg.bind = bind.parse().with_context(|| format!("Invalid RELAY_BIND {bind}"))?;
        }
        if let Some(url) = lookup("TBA_BASE_URL").filter(|u| !u.trim().is_empty()) {
            cfg.tba_base_url = url;
        }
        cfg.tba_auth_key = lookup("TBA_AUTH_KEY").filter(|k| !k.trim().is_empty());
        cfg.request_timeout_secs = lookup("TBA_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if let Some(dir) = lookup("RELAY_LOG_DIR").filter(|d| !d.trim().is_empty()) {
            cfg.log_dir = dir;
        }

        // Empty override unsets the URL; the request for that division then fails.
        for division in &mut cfg.divisions {
            let key = format!("DIVISION_{}_URL", division.name.to_uppercase());
            if let Some(url) = lookup(&key) {
                division.event_url = Some(url).filter(|u| !u.trim().is_empty());
            }
        }

        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn default_roster() -> Vec<String> {
    TRACKED_TEAMS.iter().map(|t| t.to_string()).collect()
}

pub fn default_divisions() -> Vec<Division> {
    CHAMPIONSHIP_DIVISIONS
        .iter()
        .map(|(name, url, stream)| Division::new(*name, Some(url.to_string()), *stream))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn event_key_is_last_path_segment() {
        let d = Division::new("curie", Some("https://www.thebluealliance.com/event/2025cur".into()), "s");
        assert_eq!(d.event_key().unwrap(), "2025cur");

        let d = Division::new("curie", Some("https://www.thebluealliance.com/event/2025cur/".into()), "s");
        assert_eq!(d.event_key().unwrap(), "2025cur");

        let d = Division::new("bare", Some("2025hop".into()), "s");
        assert_eq!(d.event_key().unwrap(), "2025hop");
    }

    #[test]
    fn event_key_missing_or_empty_url_fails() {
        assert!(Division::new("daly", None, "s").event_key().is_err());
        assert!(Division::new("daly", Some("   ".into()), "s").event_key().is_err());
        assert!(Division::new("daly", Some("https://".into()), "s").event_key().is_err());
    }

    #[test]
    fn defaults_keep_division_order() {
        let cfg = RelayConfig::defaults();
        let names: Vec<&str> = cfg.divisions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["galileo", "archimedes", "newton", "curie", "daly", "hopper", "johnson", "milstein"]
        );
        assert_eq!(cfg.roster.len(), 12);
        assert_eq!(cfg.bind.port(), 3001);
        assert!(cfg.divisions.iter().all(|d| d.event_key().is_ok()));
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = RelayConfig::from_lookup(lookup_from(&[
            ("RELAY_BIND", "127.0.0.1:9000"),
            ("TBA_AUTH_KEY", "k"),
            ("TBA_TIMEOUT_SECS", "3"),
            ("DIVISION_NEWTON_URL", "https://www.thebluealliance.com/event/2026new"),
            ("DIVISION_DALY_URL", ""),
        ]))
        .unwrap();

        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.tba_auth_key.as_deref(), Some("k"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));

        let newton = cfg.divisions.iter().find(|d| d.name == "newton").unwrap();
        assert_eq!(newton.event_key().unwrap(), "2026new");
        let daly = cfg.divisions.iter().find(|d| d.name == "daly").unwrap();
        assert!(daly.event_url.is_none());
    }

    #[test]
    fn bad_bind_is_an_error() {
        assert!(RelayConfig::from_lookup(lookup_from(&[("RELAY_BIND", "nope")])).is_err());
    }

    #[test]
    fn blank_auth_key_counts_as_missing() {
        let cfg = RelayConfig::from_lookup(lookup_from(&[("TBA_AUTH_KEY", " ")])).unwrap();
        assert!(cfg.tba_auth_key.is_none());
    }
}
