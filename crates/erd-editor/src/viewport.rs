//! Viewport controller: anchor-preserving zoom and background panning.
//!
//! The view transform is plain session state; nothing here is global.

use crate::input::{PointerCapture, PointerId, release_quietly};
use erd_core::{Bounds, ViewTransform};
use kurbo::{Point, Vec2};

pub const MIN_SCALE: f64 = 0.2;
pub const MAX_SCALE: f64 = 3.0;
/// Scale factor applied per wheel notch.
pub const ZOOM_STEP: f64 = 1.1;
/// Screen margin kept around the diagram by [`Viewport::fit`].
pub const FIT_PADDING: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel up zooms in, anything else zooms out.
    pub fn from_wheel(delta_y: f64) -> Self {
        if delta_y < 0.0 { Self::In } else { Self::Out }
    }

    fn factor(self) -> f64 {
        match self {
            Self::In => ZOOM_STEP,
            Self::Out => 1.0 / ZOOM_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanGesture {
    pointer_id: PointerId,
    start: Point,
    base: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct Viewport {
    view: ViewTransform,
    pan: Option<PanGesture>,
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Replace the transform; the scale is clamped to the allowed range.
    /// A transform with a non-finite component is ignored and `false`
    /// returned.
    pub fn set_view(&mut self, view: ViewTransform) -> bool {
        if !(view.k.is_finite() && view.tx.is_finite() && view.ty.is_finite()) {
            log::warn!("ignoring non-finite view {view:?}");
            return false;
        }
        self.view = ViewTransform {
            k: view.k.clamp(MIN_SCALE, MAX_SCALE),
            ..view
        };
        true
    }

    /// Zoom one step about `pointer` (screen space), keeping the diagram
    /// point under it fixed.
    pub fn zoom(&mut self, pointer: Point, direction: ZoomDirection) -> ViewTransform {
        let anchor = self.screen_to_diagram(pointer);
        let k = (self.view.k * direction.factor()).clamp(MIN_SCALE, MAX_SCALE);
        self.view = ViewTransform::new(k, pointer.x - anchor.x * k, pointer.y - anchor.y * k);
        self.view
    }

    /// Zoom for a wheel event.
    pub fn zoom_for_wheel(&mut self, pointer: Point, delta_y: f64) -> ViewTransform {
        self.zoom(pointer, ZoomDirection::from_wheel(delta_y))
    }

    /// Shift by a screen-space delta; not scaled by `k`.
    pub fn pan(&mut self, delta: Vec2) {
        self.view.tx += delta.x;
        self.view.ty += delta.y;
    }

    /// Centre `extent` in a `width` × `height` screen, shrinking it to fit
    /// but never enlarging past 1:1.
    pub fn fit(&mut self, extent: Bounds, width: f64, height: f64) -> ViewTransform {
        let padded = extent.inflate(FIT_PADDING);
        let k = (width / padded.width)
            .min(height / padded.height)
            .min(1.0)
            .clamp(MIN_SCALE, MAX_SCALE);
        let cx = extent.x + extent.width / 2.0;
        let cy = extent.y + extent.height / 2.0;
        self.view = ViewTransform::new(k, width / 2.0 - cx * k, height / 2.0 - cy * k);
        self.view
    }

    pub fn screen_to_diagram(&self, p: Point) -> Point {
        self.view.to_diagram(p.x, p.y).into()
    }

    pub fn diagram_to_screen(&self, p: Point) -> Point {
        self.view.to_screen(p.x, p.y).into()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Start a pan gesture. Ignored while another pan is active.
    pub fn begin_pan(
        &mut self,
        pointer_id: PointerId,
        at: Point,
        capture: &mut impl PointerCapture,
    ) -> bool {
        if self.pan.is_some() {
            return false;
        }
        if let Err(e) = capture.set_capture(pointer_id) {
            log::debug!("pan continues without capture: {e}");
        }
        self.pan = Some(PanGesture {
            pointer_id,
            start: at,
            base: Vec2::new(self.view.tx, self.view.ty),
        });
        log::debug!("pan start at ({}, {})", at.x, at.y);
        true
    }

    /// Follow the pointer. Returns `true` when the transform changed.
    pub fn update_pan(&mut self, pointer_id: PointerId, at: Point) -> bool {
        let Some(pan) = self.pan else { return false };
        if pan.pointer_id != pointer_id {
            return false;
        }
        let offset = at - pan.start;
        self.view.tx = pan.base.x + offset.x;
        self.view.ty = pan.base.y + offset.y;
        true
    }

    /// End the active pan, if any. The transform stays where the last
    /// update left it. Returns `true` when a gesture ended.
    pub fn end_pan(&mut self, capture: &mut impl PointerCapture) -> bool {
        let Some(pan) = self.pan.take() else { return false };
        release_quietly(capture, pan.pointer_id);
        log::debug!("pan end at {:?}", self.view);
        true
    }
}
