//! Records every frame exchanged with the gateway to disk.
//!
//! Enabled by setting `IBGAMMA_RECORDING_DIR` to a directory. Each session gets its own
//! timestamped sub directory holding one file per message:
//!
//! ```text
//! /tmp/logs/2024-03-18-14-05-0/0001-request.msg
//! /tmp/logs/2024-03-18-14-05-0/0002-response.msg
//! ```

use std::env;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::messages::{RequestMessage, ResponseMessage};

pub(crate) const RECORDING_DIR_VAR: &str = "IBGAMMA_RECORDING_DIR";

static RECORDING_SEQ: AtomicUsize = AtomicUsize::new(0);
static RECORDER_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Clone, Debug, Default)]
pub(crate) struct MessageRecorder {
    enabled: bool,
    recording_dir: String,
}

impl MessageRecorder {
    pub fn new(enabled: bool, recording_dir: String) -> Self {
        Self { enabled, recording_dir }
    }

    /// A recorder that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        match env::var(RECORDING_DIR_VAR) {
            Ok(dir) if !dir.is_empty() => Self::in_directory(&dir),
            _ => Self::disabled(),
        }
    }

    // Recording is diagnostics only; a directory that cannot be created disables it.
    fn in_directory(dir: &str) -> Self {
        let format = format_description!("[year]-[month]-[day]-[hour]-[minute]");
        let now = OffsetDateTime::now_utc();
        let stamp = now.format(&format).unwrap_or_else(|_| now.unix_timestamp().to_string());
        let instance_id = RECORDER_ID.fetch_add(1, Ordering::SeqCst);
        let recording_dir = format!("{dir}/{stamp}-{instance_id}");

        match fs::create_dir_all(&recording_dir) {
            Ok(()) => MessageRecorder::new(true, recording_dir),
            Err(err) => {
                warn!("message recording disabled, could not create {recording_dir}: {err}");
                Self::disabled()
            }
        }
    }

    pub fn record_request(&self, message: &RequestMessage) {
        if !self.enabled {
            return;
        }

        let record_id = RECORDING_SEQ.fetch_add(1, Ordering::SeqCst);
        self.write(self.request_file(record_id), message.encode());
    }

    pub fn record_response(&self, message: &ResponseMessage) {
        if !self.enabled {
            return;
        }

        let record_id = RECORDING_SEQ.fetch_add(1, Ordering::SeqCst);
        self.write(self.response_file(record_id), message.encode());
    }

    fn write(&self, path: String, encoded: String) {
        if let Err(err) = fs::write(&path, encoded.replace('\0', "|")) {
            warn!("could not record message to {path}: {err}");
        }
    }

    fn request_file(&self, record_id: usize) -> String {
        format!("{}/{:04}-request.msg", self.recording_dir, record_id)
    }

    fn response_file(&self, record_id: usize) -> String {
        format!("{}/{:04}-response.msg", self.recording_dir, record_id)
    }
}
