//! Per-camera view assembly.
//!
//! A [`CameraView`] ties one connection manager, router, and compositor
//! together with the shared alert log. Everything runs on the caller's
//! thread; the caller ticks [`CameraView::pump`] and pulls frames with
//! [`CameraView::render`].
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::alerts::AlertLog;
use crate::compositor::{decode_frame, DecodedFrame, FrameCompositor, RenderedView};
use crate::config::StreamConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::message::{DetectionSnapshot, StatusPayload};
use crate::router::MessageRouter;
use crate::transport::Connector;
use log::debug;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

/// Frames in the receive-rate window.
const FPS_WINDOW: usize = 30;

/// Receive-side stream counters.
#[derive(Debug, Default, Clone)]
pub struct StreamStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub avg_fps: f32,
    pub reconnect_count: u32,
    pub last_frame_at: Option<Instant>,
}

#[derive(Default)]
struct ViewShared {
    frame: Option<DecodedFrame>,
    snapshot: Option<DetectionSnapshot>,
    status: Option<StatusPayload>,
    stats: StreamStats,
    frame_times: VecDeque<Instant>,
    connecting_seen: bool,
}

impl ViewShared {
    fn record_frame(&mut self, now: Instant) {
        self.stats.frames_received += 1;
        self.stats.last_frame_at = Some(now);

        self.frame_times.push_back(now);
        while self.frame_times.len() > FPS_WINDOW {
            self.frame_times.pop_front();
        }
        if self.frame_times.len() >= 2 {
            let span = now
                .duration_since(self.frame_times[0])
                .as_secs_f32();
            if span > 0.0 {
                self.stats.avg_fps = (self.frame_times.len() - 1) as f32 / span;
            }
        }
    }
}

pub struct CameraView {
    camera_id: String,
    camera_name: String,
    conn: ConnectionManager,
    router: MessageRouter,
    compositor: FrameCompositor,
    shared: Rc<RefCell<ViewShared>>,
    alerts: Rc<RefCell<AlertLog>>,
}

impl CameraView {
    pub fn new(
        camera_id: impl Into<String>,
        camera_name: impl Into<String>,
        config: &StreamConfig,
        connector: Box<dyn Connector>,
        alerts: Rc<RefCell<AlertLog>>,
    ) -> Self {
        let camera_id = camera_id.into();
        let camera_name = camera_name.into();
        let mut conn = ConnectionManager::new(camera_id.clone(), config, connector);
        let shared = Rc::new(RefCell::new(ViewShared::default()));

        let mut router = MessageRouter::default();
        let s = shared.clone();
        router.on_frame(move |cam, payload| {
            let mut shared = s.borrow_mut();
            match decode_frame(&payload) {
                Ok(frame) => {
                    shared.frame = Some(frame);
                    shared.record_frame(Instant::now());
                }
                Err(e) => {
                    shared.stats.frames_dropped += 1;
                    debug!("[{cam}] dropping undecodable frame: {e}");
                }
            }
        });
        let s = shared.clone();
        router.on_detection(move |_, snapshot| {
            s.borrow_mut().snapshot = Some(snapshot);
        });
        let s = shared.clone();
        router.on_status(move |_, status| {
            s.borrow_mut().status = Some(status);
        });
        let a = alerts.clone();
        let name = camera_name.clone();
        router.on_alert(move |cam, payload| {
            a.borrow_mut().push(cam, &name, &payload, Instant::now());
        });

        let s = shared.clone();
        conn.subscribe(Box::new(move |state| {
            if state == ConnectionState::Connecting {
                let mut shared = s.borrow_mut();
                if shared.connecting_seen {
                    shared.stats.reconnect_count += 1;
                } else {
                    shared.connecting_seen = true;
                }
            }
        }));

        let mut view = Self {
            camera_id,
            camera_name,
            conn,
            router,
            compositor: FrameCompositor::new(config.show_overlay),
            shared,
            alerts,
        };
        if config.auto_connect {
            view.connect();
        }
        view
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    pub fn connect(&mut self) {
        self.conn.connect();
    }

    pub fn disconnect(&mut self) {
        self.conn.disconnect();
    }

    pub fn retry(&mut self) {
        self.conn.retry();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn stats(&self) -> StreamStats {
        self.shared.borrow().stats.clone()
    }

    pub fn status(&self) -> Option<StatusPayload> {
        self.shared.borrow().status.clone()
    }

    pub fn set_show_overlay(&mut self, show: bool) {
        self.compositor.show_overlay = show;
    }

    /// One cooperative tick: drives the reconnect timer, drains transport
    /// events, and expires alerts.
    pub fn pump(&mut self, now: Instant) {
        self.conn.poll(now, &mut self.router);
        self.alerts.borrow_mut().tick(now);
    }

    /// Composites the current frame, detections, and connection state.
    pub fn render(&mut self) -> RenderedView {
        let shared = self.shared.borrow();
        self.compositor.render(
            shared.frame.as_ref(),
            shared.snapshot.as_ref(),
            self.conn.state(),
        )
    }
}
