//! Append-only activity log.
//!
//! One JSON object per line under the data dir, recording each store
//! mutation so a demo session can be inspected after the fact.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct ActivityLog {
    pub path: PathBuf,
    file: File,
}

#[derive(Serialize)]
struct Event<'a> {
    ts: DateTime<Utc>,
    event: &'a str,
    #[serde(flatten)]
    data: serde_json::Value,
}

impl ActivityLog {
    pub const FILE_NAME: &'static str = "activity.jsonl";

    pub fn new(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(Self::FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self { path, file })
    }

    pub fn log(&mut self, event: &str, data: serde_json::Value) -> Result<()> {
        let event = Event {
            ts: Utc::now(),
            event,
            data,
        };
        let line = serde_json::to_string(&event)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()?;
        Ok(())
    }

    pub fn login(&mut self, email: &str) -> Result<()> {
        self.log("login", serde_json::json!({ "email": email }))
    }

    pub fn logout(&mut self) -> Result<()> {
        self.log("logout", serde_json::json!({}))
    }

    pub fn booking_added(&mut self, kind: &str, label: &str, price: &str) -> Result<()> {
        self.log(
            "booking_added",
            serde_json::json!({ "kind": kind, "label": label, "price": price }),
        )
    }

    pub fn ticket_added(&mut self, event_name: &str) -> Result<()> {
        self.log("ticket_added", serde_json::json!({ "event_name": event_name }))
    }

    pub fn points_redeemed(&mut self, reward: &str, cost: u32, remaining: u32) -> Result<()> {
        self.log(
            "points_redeemed",
            serde_json::json!({ "reward": reward, "cost": cost, "remaining": remaining }),
        )
    }

    pub fn profile_updated(&mut self, field: &str) -> Result<()> {
        self.log("profile_updated", serde_json::json!({ "field": field }))
    }
}
