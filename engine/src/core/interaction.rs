//! Pointer Interaction
//!
//! Turns raw pointer events into hit tests and manipulation calls on a
//! [`Drawable`]. The controller holds no reference to the drawing between
//! events; the host passes it in on every call.

use tracing::trace;

use crate::core::{
    drawings::{Drawable, HitResult, ModifierKeys},
    Point2D, Timestamp,
};

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragState {
    hit: HitResult,
    last_point: Point2D,
}

/// Drag tracking between pointer down and pointer up
#[derive(Debug, Default)]
pub struct PointerController {
    drag: Option<DragState>,
}

impl PointerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Hit-tests `drawing`; a hit starts a drag.
    pub fn pointer_down(
        &mut self,
        drawing: &mut dyn Drawable,
        point: Point2D,
        current_time: Timestamp,
    ) -> HitResult {
        let hit = drawing.hit_test(point, current_time);
        self.drag = hit.is_hit().then_some(DragState {
            hit,
            last_point: point,
        });
        trace!(?hit, "Pointer down");
        hit
    }

    /// Applies the motion to the dragged part. Returns whether anything moved.
    pub fn pointer_move(
        &mut self,
        drawing: &mut dyn Drawable,
        point: Point2D,
        modifiers: ModifierKeys,
    ) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };

        match drag.hit {
            HitResult::Body => {
                let dx = point.x - drag.last_point.x;
                let dy = point.y - drag.last_point.y;
                drawing.move_drawing(dx, dy, modifiers);
            }
            HitResult::Handle(handle) => drawing.move_handle(point, handle),
            HitResult::Miss => return false,
        }
        drag.last_point = point;
        true
    }

    /// Ends the drag. Returns whether a drag was in progress.
    pub fn pointer_up(&mut self) -> bool {
        self.drag.take().is_some()
    }
}
