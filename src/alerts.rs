//! Bounded fall-alert log.
//!
//! Holds the most recent alerts, newest first, with a hard cap and a
//! per-alert auto-dismiss timer. Every departure from the log, whether
//! evicted, expired, or manually dismissed, notifies the dismiss observer
//! exactly once.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::StreamError;
use crate::message::AlertPayload;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use image::RgbImage;
use log::{debug, warn};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default number of alerts retained at once.
pub const ALERT_CAP: usize = 5;

#[derive(Clone)]
pub struct FallAlert {
    pub id: String,
    pub camera_id: String,
    pub camera_name: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f32,
    pub snapshot: Option<RgbImage>,
    pub acknowledged: bool,
}

struct Retained {
    alert: FallAlert,
    expires_at: Instant,
}

/// Called once for each alert leaving the log, whatever the reason.
pub type DismissObserver = Box<dyn FnMut(&FallAlert)>;

pub struct AlertLog {
    capacity: usize,
    auto_dismiss: Duration,
    entries: VecDeque<Retained>,
    on_dismiss: Option<DismissObserver>,
}

impl AlertLog {
    pub fn new(auto_dismiss: Duration) -> Self {
        Self::with_capacity(ALERT_CAP, auto_dismiss)
    }

    pub fn with_capacity(capacity: usize, auto_dismiss: Duration) -> Self {
        Self {
            capacity,
            auto_dismiss,
            entries: VecDeque::new(),
            on_dismiss: None,
        }
    }

    pub fn set_dismiss_observer(&mut self, observer: DismissObserver) {
        self.on_dismiss = Some(observer);
    }

    /// Records an incoming alert and returns its log id. Admission and any
    /// resulting eviction of the oldest entry happen as one step.
    pub fn push(
        &mut self,
        camera_id: &str,
        camera_name: &str,
        payload: &AlertPayload,
        now: Instant,
    ) -> String {
        let snapshot = payload
            .frame_snapshot
            .as_ref()
            .and_then(|b64| match decode_snapshot(b64) {
                Ok(img) => Some(img),
                Err(e) => {
                    debug!("[{camera_id}] discarding undecodable alert snapshot: {e}");
                    None
                }
            });

        let alert = FallAlert {
            id: Uuid::new_v4().to_string(),
            camera_id: camera_id.to_string(),
            camera_name: camera_name.to_string(),
            timestamp: Utc::now(),
            confidence: payload.confidence,
            snapshot,
            acknowledged: false,
        };
        warn!(
            "[{camera_id}] fall alert for person {} (confidence {:.2})",
            payload.person_id, payload.confidence
        );

        let id = alert.id.clone();
        self.entries.push_front(Retained {
            alert,
            expires_at: now + self.auto_dismiss,
        });
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                self.notify_dismissed(&evicted.alert);
            }
        }
        id
    }

    /// Removes the alert with the given id. Returns false if it already
    /// left the log; no second notification fires in that case.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let Some(pos) = self.entries.iter().position(|r| r.alert.id == id) else {
            return false;
        };
        if let Some(removed) = self.entries.remove(pos) {
            self.notify_dismissed(&removed.alert);
        }
        true
    }

    /// Marks an alert as seen without removing it or touching its timer.
    pub fn acknowledge(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|r| r.alert.id == id) {
            Some(retained) => {
                retained.alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Expires alerts whose auto-dismiss deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        let mut expired = Vec::new();
        self.entries.retain(|r| {
            if now >= r.expires_at {
                expired.push(r.alert.clone());
                false
            } else {
                true
            }
        });
        for alert in &expired {
            self.notify_dismissed(alert);
        }
    }

    /// Retained alerts, newest first.
    pub fn alerts(&self) -> impl Iterator<Item = &FallAlert> {
        self.entries.iter().map(|r| &r.alert)
    }

    pub fn get(&self, id: &str) -> Option<&FallAlert> {
        self.entries.iter().find(|r| r.alert.id == id).map(|r| &r.alert)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn notify_dismissed(&mut self, alert: &FallAlert) {
        if let Some(observer) = &mut self.on_dismiss {
            observer(alert);
        }
    }
}

fn decode_snapshot(b64: &str) -> Result<RgbImage, StreamError> {
    let bytes = BASE64.decode(b64)?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}
