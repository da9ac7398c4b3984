//! Frame decoding and overlay compositing.
//!
//! Paired frame and detection data from the same camera are merged into one
//! rendered image per tick. Detections use normalized [0, 1] coordinates and
//! are scaled to whatever raster the frame decoded to, so box and skeleton
//! stay aligned across resolution changes.
//!
//! SPDX-License-Identifier: GPL-3.0-or-later

use crate::connection::ConnectionState;
use crate::error::StreamError;
use crate::font;
use crate::message::{DetectionSnapshot, FramePayload, PersonDetection, PersonState};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

/// Landmark index pairs forming the rendered skeleton: shoulders, arms,
/// torso sides, hip line, and legs.
pub const POSE_CONNECTIONS: [(usize, usize); 12] = [
    (11, 12),
    (11, 13),
    (13, 15),
    (12, 14),
    (14, 16),
    (11, 23),
    (12, 24),
    (23, 24),
    (23, 25),
    (25, 27),
    (24, 26),
    (26, 28),
];

/// Landmarks below this visibility are treated as missing.
const VISIBILITY_MIN: f32 = 0.5;

const GREEN: Rgb<u8> = Rgb([46, 204, 64]);
const ORANGE: Rgb<u8> = Rgb([255, 165, 0]);
const RED: Rgb<u8> = Rgb([255, 40, 40]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const PLACEHOLDER_BG: Rgb<u8> = Rgb([24, 24, 24]);

const PLACEHOLDER_W: u32 = 640;
const PLACEHOLDER_H: u32 = 360;

/// A decoded frame plus the source-reported capture rate.
pub struct DecodedFrame {
    pub image: RgbImage,
    pub fps: f32,
}

/// Decodes the base64 JPEG carried by a frame payload.
pub fn decode_frame(payload: &FramePayload) -> Result<DecodedFrame, StreamError> {
    let bytes = BASE64.decode(&payload.frame)?;
    let image = image::load_from_memory(&bytes)?.to_rgb8();
    Ok(DecodedFrame {
        image,
        fps: payload.fps,
    })
}

/// What a rendered image represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Live video, possibly with overlays.
    Live,
    /// Waiting for the first frame.
    Loading,
    /// Retries exhausted; manual restart required.
    Offline,
}

pub struct RenderedView {
    pub kind: ViewKind,
    pub image: RgbImage,
}

/// Composites one camera's frame, detections, and connection state into a
/// displayable image. Stateful only for the alarm border pulse.
pub struct FrameCompositor {
    pub show_overlay: bool,
    pulse_phase: u64,
}

impl FrameCompositor {
    pub fn new(show_overlay: bool) -> Self {
        Self {
            show_overlay,
            pulse_phase: 0,
        }
    }

    pub fn render(
        &mut self,
        frame: Option<&DecodedFrame>,
        snapshot: Option<&DetectionSnapshot>,
        conn_state: ConnectionState,
    ) -> RenderedView {
        if conn_state == ConnectionState::MaxRetries {
            return RenderedView {
                kind: ViewKind::Offline,
                image: offline_placeholder(),
            };
        }
        let Some(frame) = frame else {
            return RenderedView {
                kind: ViewKind::Loading,
                image: loading_placeholder(),
            };
        };

        let mut image = frame.image.clone();
        if let Some(snapshot) = snapshot {
            if self.show_overlay {
                for person in &snapshot.persons {
                    draw_person(&mut image, person);
                }
                draw_processing_time(&mut image, snapshot.processing_time_ms);
            }
            // The alarm treatment stays visible even with overlays off.
            if snapshot.fall_detected {
                self.pulse_phase = self.pulse_phase.wrapping_add(1);
                draw_alarm_border(&mut image, self.pulse_phase);
                draw_alarm_banner(&mut image);
            }
        }

        RenderedView {
            kind: ViewKind::Live,
            image,
        }
    }
}

fn draw_person(img: &mut RgbImage, person: &PersonDetection) {
    let (w, h) = img.dimensions();
    let (x1, y1, x2, y2) = person.bbox.to_pixels(w, h);
    let color = state_color(person.state);
    let stroke = if person.state == PersonState::Falling {
        3
    } else {
        2
    };

    draw_box(img, x1, y1, x2, y2, stroke, color);
    draw_label(img, person, x1, y1, color);
    if !person.pose_landmarks.is_empty() {
        draw_skeleton(img, person, color);
    }
}

fn state_color(state: PersonState) -> Rgb<u8> {
    match state {
        PersonState::Falling => RED,
        PersonState::Lying => ORANGE,
        _ => GREEN,
    }
}

fn draw_box(img: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, stroke: i32, color: Rgb<u8>) {
    for t in 0..stroke {
        let w = x2 - x1 - 2 * t;
        let h = y2 - y1 - 2 * t;
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            img,
            Rect::at(x1 + t, y1 + t).of_size(w as u32, h as u32),
            color,
        );
    }
}

fn draw_label(img: &mut RgbImage, person: &PersonDetection, x1: i32, y1: i32, color: Rgb<u8>) {
    let mut label = format!(
        "{} ({}%)",
        person.state.as_str(),
        (person.confidence * 100.0).round() as i32
    );
    if let Some(angle) = person.body_angle {
        label.push_str(&format!(" {angle:.0}deg"));
    }

    let (tw, th) = font::text_extent(&label);
    let by = (y1 - th as i32 - 4).max(0);
    draw_filled_rect_mut(
        img,
        Rect::at(x1, by).of_size(tw + 6, th + 4),
        color,
    );
    font::draw_text(img, x1 + 3, by + 2, &label, WHITE);
}

fn draw_skeleton(img: &mut RgbImage, person: &PersonDetection, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    let lms = &person.pose_landmarks;

    for (a, b) in POSE_CONNECTIONS {
        let (Some(start), Some(end)) = (lms.get(a), lms.get(b)) else {
            continue;
        };
        if start.visibility <= VISIBILITY_MIN || end.visibility <= VISIBILITY_MIN {
            continue;
        }
        draw_line_segment_mut(
            img,
            (start.x * w as f32, start.y * h as f32),
            (end.x * w as f32, end.y * h as f32),
            color,
        );
    }

    for lm in lms {
        if lm.visibility <= VISIBILITY_MIN {
            continue;
        }
        let cx = (lm.x * w as f32) as i32;
        let cy = (lm.y * h as f32) as i32;
        draw_filled_circle_mut(img, (cx, cy), 3, color);
    }
}

fn draw_processing_time(img: &mut RgbImage, processing_time_ms: f64) {
    let (w, h) = img.dimensions();
    let text = format!("{processing_time_ms:.1}ms");
    let (tw, th) = font::text_extent(&text);
    font::draw_text(
        img,
        w as i32 - tw as i32 - 6,
        h as i32 - th as i32 - 4,
        &text,
        WHITE,
    );
}

fn draw_alarm_border(img: &mut RgbImage, phase: u64) {
    let (w, h) = img.dimensions();
    let thickness = if phase % 2 == 0 { 10 } else { 6 };
    if w <= thickness * 2 || h <= thickness * 2 {
        return;
    }

    draw_filled_rect_mut(img, Rect::at(0, 0).of_size(w, thickness), RED);
    draw_filled_rect_mut(
        img,
        Rect::at(0, (h - thickness) as i32).of_size(w, thickness),
        RED,
    );
    draw_filled_rect_mut(img, Rect::at(0, 0).of_size(thickness, h), RED);
    draw_filled_rect_mut(
        img,
        Rect::at((w - thickness) as i32, 0).of_size(thickness, h),
        RED,
    );
}

fn draw_alarm_banner(img: &mut RgbImage) {
    let (w, _) = img.dimensions();
    let text = "! FALL DETECTED";
    let (tw, th) = font::text_extent(text);
    let bw = tw + 16;
    let bx = (w.saturating_sub(bw) / 2) as i32;
    draw_filled_rect_mut(img, Rect::at(bx, 14).of_size(bw, th + 8), RED);
    font::draw_text(img, bx + 8, 18, text, WHITE);
}

fn loading_placeholder() -> RgbImage {
    let mut img = RgbImage::from_pixel(PLACEHOLDER_W, PLACEHOLDER_H, PLACEHOLDER_BG);
    let text = "CONNECTING...";
    let (tw, th) = font::text_extent(text);
    font::draw_text(
        &mut img,
        ((PLACEHOLDER_W - tw) / 2) as i32,
        ((PLACEHOLDER_H - th) / 2) as i32,
        text,
        WHITE,
    );
    img
}

fn offline_placeholder() -> RgbImage {
    let mut img = RgbImage::from_pixel(PLACEHOLDER_W, PLACEHOLDER_H, PLACEHOLDER_BG);
    let text = "CAMERA OFFLINE";
    let (tw, th) = font::text_extent(text);
    let tx = ((PLACEHOLDER_W - tw) / 2) as i32;
    let ty = ((PLACEHOLDER_H - th) / 2) as i32 - 16;
    font::draw_text(&mut img, tx, ty, text, WHITE);

    let button = "RETRY";
    let (bw, bh) = font::text_extent(button);
    let bx = ((PLACEHOLDER_W - bw - 20) / 2) as i32;
    let by = ty + th as i32 + 16;
    draw_hollow_rect_mut(&mut img, Rect::at(bx, by).of_size(bw + 20, bh + 12), WHITE);
    font::draw_text(&mut img, bx + 10, by + 6, button, WHITE);
    img
}
