//! Audit log port.
//!
//! Sinks never return errors: a failed write is logged and
//! dropped so the response is never affected.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use log::{debug, warn};
use crate::FlowName;

/// Outcome recorded per request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus
{   Ok
  , Blocked
  , Fallback
  , Error
}

/// One audit line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry
{   pub ts: u64
  , pub flow: FlowName
  , pub trace_id: String
  , pub status: AuditStatus
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>
}

impl AuditEntry
{   pub fn new(
      flow: FlowName
    , trace_id: &str
    , status: AuditStatus
    , text: &str
    ) -> Self
    {   let ts = SystemTime::now()
          .duration_since(UNIX_EPOCH)
          .map(|d| d.as_secs())
          .unwrap_or(0);
        AuditEntry
        {   ts
          , flow
          , trace_id: trace_id.to_string()
          , status
          , text: Some(text.to_string())
        }
    }
}

pub trait AuditSink: Send + Sync
{   fn record(&self, entry: AuditEntry);
}

/// Discards everything
#[derive(Debug, Clone, Default)]
pub struct NoopAuditLog;

impl AuditSink for NoopAuditLog
{   fn record(&self, _entry: AuditEntry) {}
}

/// Appends one JSON line per request. The file is opened once,
/// in append mode, when the log is created; each record is a
/// single `write_all` under the lock, so lines never interleave
/// and no request pays for an `open`.
#[derive(Debug)]
pub struct FileAuditLog
{   path: PathBuf
  , preview_chars: usize
  , file: Option<Mutex<File>>
}

impl FileAuditLog
{   pub fn new(path: PathBuf, preview_chars: usize) -> Self
    {   debug!("Audit log at {}", path.display());
        let file = match OpenOptions::new().create(true).append(true).open(&path)
        {   Ok(file) => Some(Mutex::new(file))
          , Err(e) => {
              warn!("Audit log {} unavailable: {}", path.display(), e);
              None
            }
        };
        FileAuditLog
        {   path
          , preview_chars
          , file
        }
    }

    /// Whether records will reach the file
    pub fn is_open(&self) -> bool
    {   self.file.is_some()
    }

    fn append(&self, line: &str) -> std::io::Result<()>
    {   let file = match &self.file
        {   Some(file) => file
          , None => return Err(std::io::Error::new(
              std::io::ErrorKind::NotFound,
              "audit file was not opened"
            ))
        };
        let mut file = file.lock().map_err(|_| {
          std::io::Error::new(std::io::ErrorKind::Other, "audit lock poisoned")
        })?;
        file.write_all(line.as_bytes())
    }
}

impl AuditSink for FileAuditLog
{   fn record(&self, mut entry: AuditEntry)
    {   entry.text = entry.text
          .map(|t| t.trim().chars().take(self.preview_chars).collect::<String>())
          .filter(|t| !t.is_empty());

        let mut line = match serde_json::to_string(&entry)
        {   Ok(line) => line
          , Err(e) => {
              warn!("Audit entry not serialisable: {}", e);
              return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line)
        {   warn!(
              "Audit write to {} failed: {}",
              self.path.display(), e
            );
        }
    }
}
