//! End-to-end scenarios driving a camera view over a scripted transport.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crossbeam_channel::{unbounded, Receiver, Sender};
use fallwatch_client::{
    AlertLog, Backoff, CameraView, ConnectionState, Connector, StreamConfig, TransportEvent,
    TransportHandle, ViewKind,
};
use image::RgbImage;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

struct NoopHandle;

impl TransportHandle for NoopHandle {
    fn shutdown(&mut self) {}
}

/// Connector with scripted accept/refuse outcomes. Accepted opens send an
/// immediate `Opened` and expose their sender for the test to drive.
#[derive(Clone)]
struct ScriptedConnector {
    plan: Rc<RefCell<VecDeque<bool>>>,
    senders: Rc<RefCell<Vec<Sender<TransportEvent>>>>,
}

impl ScriptedConnector {
    fn new(plan: &[bool]) -> Self {
        Self {
            plan: Rc::new(RefCell::new(plan.iter().copied().collect())),
            senders: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn last_sender(&self) -> Sender<TransportEvent> {
        self.senders.borrow().last().unwrap().clone()
    }

    fn opens(&self) -> usize {
        self.senders.borrow().len()
    }
}

impl Connector for ScriptedConnector {
    fn open(
        &mut self,
        _endpoint: &str,
    ) -> anyhow::Result<(Box<dyn TransportHandle>, Receiver<TransportEvent>)> {
        let accept = self.plan.borrow_mut().pop_front().unwrap_or(true);
        if !accept {
            anyhow::bail!("connection refused");
        }
        let (tx, rx) = unbounded();
        let _ = tx.send(TransportEvent::Opened);
        self.senders.borrow_mut().push(tx);
        Ok((Box::new(NoopHandle), rx))
    }
}

fn jpeg_base64(w: u32, h: u32) -> String {
    let img = RgbImage::new(w, h);
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 85);
    img.write_with_encoder(encoder).unwrap();
    BASE64.encode(&buf)
}

fn envelope(kind: &str, camera_id: &str, payload: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "type": kind,
        "camera_id": camera_id,
        "timestamp": "2026-08-30T12:00:00Z",
        "payload": payload,
    }))
    .unwrap()
}

fn frame_message(camera_id: &str) -> Vec<u8> {
    envelope(
        "frame",
        camera_id,
        serde_json::json!({
            "frame": jpeg_base64(64, 48),
            "width": 64,
            "height": 48,
            "fps": 15.0,
        }),
    )
}

fn detection_message(camera_id: &str, fall: bool) -> Vec<u8> {
    envelope(
        "detection",
        camera_id,
        serde_json::json!({
            "persons": [{
                "id": 1,
                "bbox": {"x": 0.25, "y": 0.25, "width": 0.5, "height": 0.5},
                "state": "standing",
                "confidence": 0.87,
            }],
            "fall_detected": fall,
            "processing_time_ms": 18.4,
        }),
    )
}

fn alert_message(camera_id: &str, confidence: f32) -> Vec<u8> {
    envelope(
        "alert",
        camera_id,
        serde_json::json!({
            "person_id": 1,
            "confidence": confidence,
        }),
    )
}

fn config(max_retries: u32) -> StreamConfig {
    let mut config = StreamConfig::new("127.0.0.1:9000");
    config.max_retries = max_retries;
    config.retry_delay = Backoff::Fixed { delay_ms: 0 };
    config
}

fn view_with(
    config: &StreamConfig,
    connector: &ScriptedConnector,
) -> (CameraView, Rc<RefCell<AlertLog>>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let alerts = Rc::new(RefCell::new(AlertLog::new(config.auto_dismiss())));
    let view = CameraView::new(
        "cam-1",
        "Hallway",
        config,
        Box::new(connector.clone()),
        alerts.clone(),
    );
    (view, alerts)
}

#[test]
fn live_stream_renders_frames_and_records_alerts() {
    let connector = ScriptedConnector::new(&[true]);
    let (mut view, alerts) = view_with(&config(5), &connector);

    let sender = connector.last_sender();
    sender
        .send(TransportEvent::Message(frame_message("cam-1")))
        .unwrap();
    sender
        .send(TransportEvent::Message(detection_message("cam-1", false)))
        .unwrap();
    sender
        .send(TransportEvent::Message(alert_message("cam-1", 0.92)))
        .unwrap();

    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::Connected);

    let rendered = view.render();
    assert_eq!(rendered.kind, ViewKind::Live);
    assert_eq!(rendered.image.dimensions(), (64, 48));

    let alerts = alerts.borrow();
    assert_eq!(alerts.len(), 1);
    let alert = alerts.alerts().next().unwrap();
    assert_eq!(alert.camera_id, "cam-1");
    assert_eq!(alert.camera_name, "Hallway");
    assert!((alert.confidence - 0.92).abs() < f32::EPSILON);
    assert!(!alert.acknowledged);

    assert_eq!(view.stats().frames_received, 1);
}

#[test]
fn alert_log_is_capped_across_a_burst() {
    let connector = ScriptedConnector::new(&[true]);
    let (mut view, alerts) = view_with(&config(5), &connector);

    let sender = connector.last_sender();
    for i in 0..7 {
        sender
            .send(TransportEvent::Message(alert_message(
                "cam-1",
                0.5 + i as f32 / 100.0,
            )))
            .unwrap();
    }
    view.pump(Instant::now());

    let alerts = alerts.borrow();
    assert_eq!(alerts.len(), 5);
    // Newest first, oldest two evicted.
    let confidences: Vec<f32> = alerts.alerts().map(|a| a.confidence).collect();
    assert!((confidences[0] - 0.56).abs() < 1e-6);
    assert!((confidences[4] - 0.52).abs() < 1e-6);
}

#[test]
fn retained_alerts_expire_on_pump() {
    let mut config = config(5);
    config.auto_dismiss_ms = 30_000;
    let connector = ScriptedConnector::new(&[true]);
    let (mut view, alerts) = view_with(&config, &connector);

    let start = Instant::now();
    connector
        .last_sender()
        .send(TransportEvent::Message(alert_message("cam-1", 0.9)))
        .unwrap();
    view.pump(start);
    assert_eq!(alerts.borrow().len(), 1);

    view.pump(start + Duration::from_secs(31));
    assert!(alerts.borrow().is_empty());
}

#[test]
fn view_shows_loading_until_the_first_frame() {
    let connector = ScriptedConnector::new(&[true]);
    let (mut view, _alerts) = view_with(&config(5), &connector);

    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::Connected);
    assert_eq!(view.render().kind, ViewKind::Loading);

    connector
        .last_sender()
        .send(TransportEvent::Message(frame_message("cam-1")))
        .unwrap();
    view.pump(Instant::now());
    assert_eq!(view.render().kind, ViewKind::Live);
}

#[test]
fn exhausted_retries_go_offline_and_retry_restarts() {
    let connector = ScriptedConnector::new(&[true, false, false, true]);
    let (mut view, _alerts) = view_with(&config(2), &connector);

    connector
        .last_sender()
        .send(TransportEvent::Closed)
        .unwrap();
    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::Error);

    // Zero-delay backoff, so each pump fires one reconnect attempt.
    view.pump(Instant::now());
    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::MaxRetries);
    assert_eq!(view.render().kind, ViewKind::Offline);

    // No further attempts happen on their own.
    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::MaxRetries);
    assert_eq!(connector.opens(), 1);

    view.retry();
    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::Connected);
    assert_eq!(view.stats().reconnect_count, 3);
}

#[test]
fn messages_for_the_torn_down_connection_never_land() {
    let connector = ScriptedConnector::new(&[true]);
    let (mut view, alerts) = view_with(&config(5), &connector);

    let sender = connector.last_sender();
    view.pump(Instant::now());
    view.disconnect();

    let _ = sender.send(TransportEvent::Message(alert_message("cam-1", 0.9)));
    view.pump(Instant::now());

    assert_eq!(view.connection_state(), ConnectionState::Disconnected);
    assert!(alerts.borrow().is_empty());
    assert_eq!(view.stats().frames_received, 0);
}

#[test]
fn manual_connect_is_required_when_auto_connect_is_off() {
    let mut config = config(5);
    config.auto_connect = false;
    let connector = ScriptedConnector::new(&[true]);
    let (mut view, _alerts) = view_with(&config, &connector);

    assert_eq!(view.connection_state(), ConnectionState::Disconnected);
    assert_eq!(connector.opens(), 0);

    view.connect();
    view.pump(Instant::now());
    assert_eq!(view.connection_state(), ConnectionState::Connected);
}
