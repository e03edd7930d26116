/// Next-match relay: Logger
/// JSONL event stream, one file per UTC day

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Log dir {} not created: {}", dir.display(), e);
        }
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct RelayStartedEvent {
    pub ts:             String,
    pub event:          &'static str,   // "RELAY_STARTED"
    pub bind:           String,
    pub divisions:      usize,
    pub tracked_teams:  usize,
    pub auth_key_set:   bool,
}

#[derive(Serialize, Debug)]
pub struct NextMatchesServedEvent {
    pub ts:             String,
    pub event:          &'static str,   // "NEXT_MATCHES_SERVED"
    pub teams_with_match: usize,
    pub elapsed_ms:     u64,
}

#[derive(Serialize, Debug)]
pub struct NextMatchesFailedEvent {
    pub ts:             String,
    pub event:          &'static str,   // "NEXT_MATCHES_FAILED"
    pub error:          String,         // never sent to the caller
    pub elapsed_ms:     u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_event_into_daily_file() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = EventLogger::new(tmp.path().join("logs"));

        for n in 0..2 {
            logger
                .log(&NextMatchesServedEvent {
                    ts: now_iso(),
                    event: "NEXT_MATCHES_SERVED",
                    teams_with_match: n,
                    elapsed_ms: 5,
                })
                .unwrap();
        }

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let content = fs::read_to_string(logger.log_dir().join(format!("{date}.jsonl"))).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "NEXT_MATCHES_SERVED");
        assert_eq!(first["teams_with_match"], 0);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["teams_with_match"], 1);
    }

    #[test]
    fn failed_event_keeps_error_text() {
        let tmp = tempfile::tempdir().unwrap();
        let logger = EventLogger::new(tmp.path());
        logger
            .log(&NextMatchesFailedEvent {
                ts: now_iso(),
                event: "NEXT_MATCHES_FAILED",
                error: "division newton: HTTP 503".to_string(),
                elapsed_ms: 12,
            })
            .unwrap();

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let content = fs::read_to_string(tmp.path().join(format!("{date}.jsonl"))).unwrap();
        assert!(content.contains("division newton: HTTP 503"));
    }
}
