//! Input abstraction layer.
//!
//! Normalizes browser pointer and wheel events into a unified
//! [`InputEvent`] consumed by the session. Coordinates are in surface
//! (screen) space, relative to the top-left corner of the drawing.

/// Browser `PointerEvent.pointerId`.
pub type PointerId = i32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pointer_id: PointerId, x: f64, y: f64 },
    PointerMove { pointer_id: PointerId, x: f64, y: f64 },
    PointerUp { pointer_id: PointerId, x: f64, y: f64 },
    /// The platform aborted the gesture (capture lost, touch cancelled).
    PointerCancel { pointer_id: PointerId },
    /// Wheel scroll at `(x, y)`; negative `delta_y` scrolls up.
    Wheel { x: f64, y: f64, delta_y: f64 },
    Click { x: f64, y: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pointer capture failed for pointer {pointer_id}: {reason}")]
pub struct CaptureError {
    pub pointer_id: PointerId,
    pub reason: String,
}

/// Pointer capture on the drawing surface.
///
/// Gestures take capture when they start so moves outside the surface keep
/// arriving, and release it when they end. Release failures are logged and
/// otherwise ignored.
pub trait PointerCapture {
    fn set_capture(&mut self, pointer_id: PointerId) -> Result<(), CaptureError>;
    fn release_capture(&mut self, pointer_id: PointerId) -> Result<(), CaptureError>;
}

/// Capture that always succeeds; for hosts without a pointer model.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn set_capture(&mut self, _pointer_id: PointerId) -> Result<(), CaptureError> {
        Ok(())
    }

    fn release_capture(&mut self, _pointer_id: PointerId) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Release `pointer_id`, logging (and otherwise ignoring) failure.
pub(crate) fn release_quietly(capture: &mut impl PointerCapture, pointer_id: PointerId) {
    if let Err(e) = capture.release_capture(pointer_id) {
        log::debug!("ignoring capture release failure: {e}");
    }
}
