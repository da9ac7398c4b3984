//! Tagged-message demultiplexer.
//!
//! Raw wire units are parsed once and fanned out to per-kind handlers.
//! Malformed or unrecognized units are dropped without disturbing the
//! connection.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::message::{
    AlertPayload, DetectionSnapshot, FramePayload, MessageBody, StatusPayload, StreamMessage,
};
use log::debug;

type FrameHandler = Box<dyn FnMut(&str, FramePayload)>;
type DetectionHandler = Box<dyn FnMut(&str, DetectionSnapshot)>;
type AlertHandler = Box<dyn FnMut(&str, AlertPayload)>;
type StatusHandler = Box<dyn FnMut(&str, StatusPayload)>;

/// Routes parsed messages to the handler registered for their kind. Handlers
/// receive the originating camera id alongside the payload.
#[derive(Default)]
pub struct MessageRouter {
    on_frame: Option<FrameHandler>,
    on_detection: Option<DetectionHandler>,
    on_alert: Option<AlertHandler>,
    on_status: Option<StatusHandler>,
}

impl MessageRouter {
    pub fn on_frame(&mut self, handler: impl FnMut(&str, FramePayload) + 'static) {
        self.on_frame = Some(Box::new(handler));
    }

    pub fn on_detection(&mut self, handler: impl FnMut(&str, DetectionSnapshot) + 'static) {
        self.on_detection = Some(Box::new(handler));
    }

    pub fn on_alert(&mut self, handler: impl FnMut(&str, AlertPayload) + 'static) {
        self.on_alert = Some(Box::new(handler));
    }

    pub fn on_status(&mut self, handler: impl FnMut(&str, StatusPayload) + 'static) {
        self.on_status = Some(Box::new(handler));
    }

    /// Parses one raw wire unit and invokes the matching handler, if any.
    pub fn dispatch(&mut self, raw: &[u8]) {
        let msg = match StreamMessage::parse(raw) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("dropping malformed stream message: {e}");
                return;
            }
        };

        match msg.body {
            MessageBody::Frame(payload) => {
                if let Some(handler) = &mut self.on_frame {
                    handler(&msg.camera_id, payload);
                }
            }
            MessageBody::Detection(payload) => {
                if let Some(handler) = &mut self.on_detection {
                    handler(&msg.camera_id, payload);
                }
            }
            MessageBody::Alert(payload) => {
                if let Some(handler) = &mut self.on_alert {
                    handler(&msg.camera_id, payload);
                }
            }
            MessageBody::Status(payload) => {
                if let Some(handler) = &mut self.on_status {
                    handler(&msg.camera_id, payload);
                }
            }
            MessageBody::Unknown(kind) => {
                debug!("ignoring stream message of unknown type {kind:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn envelope(kind: &str, payload: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": kind,
            "camera_id": "cam-7",
            "timestamp": "2026-08-30T12:00:00Z",
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn routes_each_kind_to_its_handler() {
        let mut router = MessageRouter::default();
        let counts = Rc::new(RefCell::new([0u32; 4]));

        let c = counts.clone();
        router.on_frame(move |cam, payload| {
            assert_eq!(cam, "cam-7");
            assert_eq!(payload.width, 640);
            c.borrow_mut()[0] += 1;
        });
        let c = counts.clone();
        router.on_detection(move |_, snapshot| {
            assert!(!snapshot.fall_detected);
            c.borrow_mut()[1] += 1;
        });
        let c = counts.clone();
        router.on_alert(move |_, alert| {
            assert_eq!(alert.person_id, "3");
            c.borrow_mut()[2] += 1;
        });
        let c = counts.clone();
        router.on_status(move |_, status| {
            assert!(status.connected);
            c.borrow_mut()[3] += 1;
        });

        router.dispatch(&envelope(
            "frame",
            serde_json::json!({"frame": "", "width": 640, "height": 360, "fps": 15.0}),
        ));
        router.dispatch(&envelope(
            "detection",
            serde_json::json!({"persons": [], "fall_detected": false, "processing_time_ms": 12.5}),
        ));
        router.dispatch(&envelope(
            "alert",
            serde_json::json!({"person_id": 3, "confidence": 0.9}),
        ));
        router.dispatch(&envelope(
            "status",
            serde_json::json!({"connected": true, "streaming": true}),
        ));

        assert_eq!(*counts.borrow(), [1, 1, 1, 1]);
    }

    #[test]
    fn malformed_input_is_dropped() {
        let mut router = MessageRouter::default();
        let hits = Rc::new(RefCell::new(0u32));
        let h = hits.clone();
        router.on_frame(move |_, _| *h.borrow_mut() += 1);

        router.dispatch(b"not json at all");
        router.dispatch(&envelope("frame", serde_json::json!({"width": "wrong"})));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let mut router = MessageRouter::default();
        let hits = Rc::new(RefCell::new(0u32));
        let h = hits.clone();
        router.on_status(move |_, _| *h.borrow_mut() += 1);

        router.dispatch(&envelope("heartbeat", serde_json::json!({})));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn kinds_without_a_handler_are_silently_skipped() {
        let mut router = MessageRouter::default();
        router.dispatch(&envelope(
            "frame",
            serde_json::json!({"frame": "", "width": 1, "height": 1, "fps": 1.0}),
        ));
    }
}
