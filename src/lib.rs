//! Fallwatch live-monitoring client.
//!
//! Receive side of a per-camera monitoring pipeline: a bounded-reconnect
//! connection manager, a tagged-message demultiplexer, an overlay compositor
//! for detection data, and a capped fall-alert log. Single-threaded and
//! cooperative; the embedding application ticks [`view::CameraView::pump`]
//! and pulls composited frames with [`view::CameraView::render`].
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

pub mod alerts;
pub mod compositor;
pub mod config;
pub mod connection;
pub mod error;
mod font;
pub mod message;
pub mod router;
pub mod transport;
pub mod view;

pub use alerts::{AlertLog, DismissObserver, FallAlert, ALERT_CAP};
pub use compositor::{decode_frame, DecodedFrame, FrameCompositor, RenderedView, ViewKind};
pub use config::{Backoff, StreamConfig};
pub use connection::{ConnectionManager, ConnectionState, ObserverId, StateObserver};
pub use error::StreamError;
pub use message::{
    AlertPayload, BoundingBox, DetectionSnapshot, FramePayload, MessageBody, PersonDetection,
    PersonState, PoseLandmark, StatusPayload, StreamMessage,
};
pub use router::MessageRouter;
pub use transport::{Connector, TcpConnector, TransportEvent, TransportHandle};
pub use view::{CameraView, StreamStats};
