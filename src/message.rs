//! Wire message model.
//!
//! Every inbound unit is a JSON envelope `{type, camera_id, payload,
//! timestamp}`. The payload shape is discriminated by `type`; unrecognized
//! tags are carried as an explicit `Unknown` variant so the router has a
//! single ignore branch.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::StreamError;
use serde::{Deserialize, Deserializer, Serialize};

/// Detected person posture state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonState {
    #[default]
    Unknown,
    Standing,
    Sitting,
    Lying,
    Falling,
}

impl PersonState {
    pub fn as_str(self) -> &'static str {
        match self {
            PersonState::Unknown => "unknown",
            PersonState::Standing => "standing",
            PersonState::Sitting => "sitting",
            PersonState::Lying => "lying",
            PersonState::Falling => "falling",
        }
    }
}

/// Axis-aligned rectangle in normalized [0, 1] frame coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    /// Converts to pixel corner coordinates `(x1, y1, x2, y2)` for a raster
    /// of the given dimensions.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (i32, i32, i32, i32) {
        let x1 = (self.x * frame_width as f32) as i32;
        let y1 = (self.y * frame_height as f32) as i32;
        let x2 = ((self.x + self.width) * frame_width as f32) as i32;
        let y2 = ((self.y + self.height) * frame_height as f32) as i32;
        (x1, y1, x2, y2)
    }
}

/// One of the 33 tracked body keypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseLandmark {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub visibility: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetection {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub pose_landmarks: Vec<PoseLandmark>,
    #[serde(default)]
    pub state: PersonState,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub body_angle: Option<f32>,
    #[serde(default)]
    pub fall_risk_score: Option<f32>,
}

/// Latest encoded video frame. New arrivals replace the prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    /// Base64-encoded JPEG.
    pub frame: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub fps: f32,
}

/// Detection results for the most recent frame. Delivered on an independent
/// cadence; consumers tolerate loose frame/detection pairing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSnapshot {
    #[serde(default)]
    pub persons: Vec<PersonDetection>,
    #[serde(default)]
    pub fall_detected: bool,
    #[serde(default)]
    pub processing_time_ms: f64,
}

/// Transient fall alert from the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub person_id: String,
    pub confidence: f32,
    /// Base64-encoded JPEG of the frame at alert time.
    #[serde(default)]
    pub frame_snapshot: Option<String>,
}

/// Stream heartbeat / health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    pub connected: bool,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default)]
    pub frame_count: u64,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    camera_id: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    payload: serde_json::Value,
}

/// A validated inbound message. Immutable once received; never persisted.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub camera_id: String,
    /// Raw wire timestamp (ISO-8601); opaque to this core.
    pub timestamp: Option<String>,
    pub body: MessageBody,
}

#[derive(Debug, Clone)]
pub enum MessageBody {
    Frame(FramePayload),
    Detection(DetectionSnapshot),
    Alert(AlertPayload),
    Status(StatusPayload),
    /// Tag not recognized; the router drops these without touching
    /// connection health.
    Unknown(String),
}

impl StreamMessage {
    /// Decodes one raw wire unit. A malformed envelope or a malformed
    /// payload of a known type is an error (the unit gets dropped); an
    /// unknown tag is not.
    pub fn parse(raw: &[u8]) -> Result<Self, StreamError> {
        let env: RawEnvelope = serde_json::from_slice(raw)?;
        let body = match env.kind.as_str() {
            "frame" => MessageBody::Frame(serde_json::from_value(env.payload)?),
            "detection" => MessageBody::Detection(serde_json::from_value(env.payload)?),
            "alert" => MessageBody::Alert(serde_json::from_value(env.payload)?),
            "status" => MessageBody::Status(serde_json::from_value(env.payload)?),
            _ => MessageBody::Unknown(env.kind.clone()),
        };

        Ok(Self {
            camera_id: env.camera_id,
            timestamp: env.timestamp,
            body,
        })
    }
}

/// The backend emits tracking ids both as strings and bare integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frame_message() {
        let raw = br#"{
            "type": "frame",
            "camera_id": "cam-1",
            "timestamp": "2026-08-30T10:00:00",
            "payload": {"frame": "AAAA", "width": 640, "height": 480, "fps": 14.7}
        }"#;
        let msg = StreamMessage::parse(raw).unwrap();
        assert_eq!(msg.camera_id, "cam-1");
        match msg.body {
            MessageBody::Frame(p) => {
                assert_eq!(p.width, 640);
                assert_eq!(p.height, 480);
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn parses_detection_with_numeric_person_id() {
        let raw = br#"{
            "type": "detection",
            "camera_id": "cam-1",
            "payload": {
                "persons": [{
                    "id": 0,
                    "bbox": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.4},
                    "state": "lying",
                    "confidence": 0.85
                }],
                "fall_detected": false,
                "processing_time_ms": 12.5
            }
        }"#;
        let msg = StreamMessage::parse(raw).unwrap();
        match msg.body {
            MessageBody::Detection(snap) => {
                assert_eq!(snap.persons.len(), 1);
                assert_eq!(snap.persons[0].id, "0");
                assert_eq!(snap.persons[0].state, PersonState::Lying);
                assert!(snap.persons[0].pose_landmarks.is_empty());
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        let raw = br#"{"type": "telemetry", "camera_id": "cam-1", "payload": {}}"#;
        let msg = StreamMessage::parse(raw).unwrap();
        match msg.body {
            MessageBody::Unknown(tag) => assert_eq!(tag, "telemetry"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn malformed_known_payload_is_an_error() {
        let raw = br#"{"type": "frame", "camera_id": "cam-1", "payload": {"width": "wide"}}"#;
        assert!(StreamMessage::parse(raw).is_err());
    }

    #[test]
    fn bbox_scales_to_pixels() {
        let bbox = BoundingBox {
            x: 0.25,
            y: 0.5,
            width: 0.5,
            height: 0.25,
        };
        assert_eq!(bbox.to_pixels(640, 480), (160, 240, 480, 360));
    }
}
