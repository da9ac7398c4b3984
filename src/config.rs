//! Stream client configuration.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use serde::Deserialize;
use std::time::Duration;

/// Delay policy between successive automatic reconnection attempts.
///
/// The observable contract is bounded attempts with an explicit reset on
/// `retry()`; the curve itself is configurable.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    Fixed { delay_ms: u64 },
    Exponential { base_ms: u64, cap_ms: u64 },
}

impl Backoff {
    /// Delay before reconnect attempt number `attempt + 1`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { base_ms, cap_ms } => {
                // Shift capped so the multiplier cannot overflow u64.
                let ms = base_ms.saturating_mul(1u64 << attempt.min(16));
                Duration::from_millis(ms.min(cap_ms))
            }
        }
    }
}

/// Per-camera stream subscription settings.
///
/// `endpoint_base` is the backend address the per-camera endpoint is resolved
/// against; a `{camera_id}` placeholder is substituted if present, otherwise
/// the camera id is appended as a path segment.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub endpoint_base: String,
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff")]
    pub retry_delay: Backoff,
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,
    #[serde(default = "default_true")]
    pub show_overlay: bool,
}

impl StreamConfig {
    pub fn new(endpoint_base: impl Into<String>) -> Self {
        Self {
            endpoint_base: endpoint_base.into(),
            auto_connect: default_true(),
            max_retries: default_max_retries(),
            retry_delay: default_backoff(),
            auto_dismiss_ms: default_auto_dismiss_ms(),
            show_overlay: default_true(),
        }
    }

    /// Resolves the connection endpoint for one camera.
    pub fn endpoint_for(&self, camera_id: &str) -> String {
        if self.endpoint_base.contains("{camera_id}") {
            self.endpoint_base.replace("{camera_id}", camera_id)
        } else {
            format!("{}/{}", self.endpoint_base.trim_end_matches('/'), camera_id)
        }
    }

    pub fn auto_dismiss(&self) -> Duration {
        Duration::from_millis(self.auto_dismiss_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff() -> Backoff {
    Backoff::Exponential {
        base_ms: 3_000,
        cap_ms: 60_000,
    }
}

fn default_auto_dismiss_ms() -> u64 {
    30_000
}
