//! Library error type.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Failures internal to the stream client. None of these reach the embedding
/// UI as a fault; they degrade into a state value or a dropped message.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("malformed stream message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid image payload: {0}")]
    Image(#[from] image::ImageError),
}
