//! Outcome events and the notification sink
//!
//! Every scan resolution and status correction emits an event. Delivery is
//! best-effort: events go through a bounded channel into a forwarder task
//! that POSTs them to an optional webhook. Nothing on the request path ever
//! waits on the sink, and a sink failure never changes an outcome.

use crate::db::models::AttendanceStatus;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Rollcall event types
///
/// Serialized for webhook transmission; the `type` tag distinguishes
/// variants on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AttendanceEvent {
    /// A scan produced a new attendance record
    ScanRecorded {
        student_id: String,
        subject_id: String,
        date: NaiveDate,
        time_in: NaiveTime,
        timestamp: DateTime<Utc>,
    },

    /// A scan hit an already-recorded (student, subject, date)
    ScanDuplicate {
        student_id: String,
        subject_id: String,
        date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    /// A scan was rejected before any record was written
    ScanRejected {
        rfid_tag_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// An admin corrected the status of an existing record
    StatusCorrected {
        attendance_id: String,
        old_status: AttendanceStatus,
        new_status: AttendanceStatus,
        timestamp: DateTime<Utc>,
    },

    /// A correction was refused without changing the record
    CorrectionRejected {
        attendance_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// Outbound notification timeout; a slower sink degrades to logged-and-dropped
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(2);

/// Bounded queue between request handlers and the forwarder task
const SINK_QUEUE_DEPTH: usize = 256;

/// Handle for fire-and-forget outcome notifications
#[derive(Clone)]
pub struct NotificationSink {
    tx: mpsc::Sender<AttendanceEvent>,
}

impl NotificationSink {
    /// Spawn the forwarder task and return the sending handle
    ///
    /// With no webhook configured, events are logged at debug level and
    /// discarded.
    pub fn spawn(webhook_url: Option<String>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AttendanceEvent>(SINK_QUEUE_DEPTH);

        tokio::spawn(async move {
            let client = reqwest::Client::new();

            while let Some(event) = rx.recv().await {
                let Some(url) = webhook_url.as_deref() else {
                    debug!("No webhook configured, dropping event: {:?}", event);
                    continue;
                };

                let result = client
                    .post(url)
                    .timeout(WEBHOOK_TIMEOUT)
                    .json(&event)
                    .send()
                    .await;

                match result {
                    Ok(response) if !response.status().is_success() => {
                        warn!("Webhook returned {} for {:?}", response.status(), event);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Webhook delivery failed: {} (event {:?})", e, event);
                    }
                }
            }
        });

        Self { tx }
    }

    /// Queue an event without blocking; a full queue drops the event
    pub fn notify(&self, event: AttendanceEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!("Notification dropped: {}", e);
        }
    }
}
