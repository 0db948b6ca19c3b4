//! Interactive viewport over a rendered surface.
//!
//! The [`ViewportController`] positions a rendered surface of known size inside
//! a fixed-size container. It supports anchor-preserving zoom, fit-to-view, and
//! drag-to-pan driven by pointer-id based events.
//!
//! A container pixel `p` shows the content point `(p - translation) / scale`.
//! Every zoom recomputes the translation so that the content point under the
//! zoom anchor stays under that same pixel.
//!
//! # Example
//!
//! ```
//! # use mural_core::geometry::{Point, Size};
//! # use mural_core::viewport::ViewportController;
//! let mut viewport = ViewportController::new();
//! viewport.set_container(Size::new(800.0, 600.0));
//! viewport.set_surface(Some(Size::new(400.0, 300.0)));
//!
//! let anchor = Point::new(120.0, 90.0);
//! let before = viewport.transform().content_at(anchor);
//! viewport.zoom_around_point(4.0, anchor);
//! let after = viewport.transform().content_at(anchor);
//!
//! assert!((before.x() - after.x()).abs() < 1e-3);
//! assert!((before.y() - after.y()).abs() < 1e-3);
//! ```

use log::{debug, trace};

use crate::geometry::{Point, Size};

/// Smallest scale any viewport operation may produce.
pub const MIN_SCALE: f32 = 0.2;

/// Largest scale any viewport operation may produce.
pub const MAX_SCALE: f32 = 16.0;

/// Margin, in container pixels, kept around the surface by [`ViewportController::fit_to_view`].
pub const DEFAULT_FIT_PADDING: f32 = 48.0;

/// Factor applied by the zoom-in and zoom-out actions.
pub const ZOOM_STEP: f32 = 1.2;

/// Scale change per unit of wheel delta: one 100-unit notch zooms by ~16%.
const WHEEL_ZOOM_SENSITIVITY: f32 = 0.0015;

/// Clamps a requested scale into `[MIN_SCALE, MAX_SCALE]`.
///
/// NaN has no meaningful clamp and yields `None`.
fn clamp_scale(scale: f32) -> Option<f32> {
    (!scale.is_nan()).then(|| scale.clamp(MIN_SCALE, MAX_SCALE))
}

/// Translation and uniform scale of the surface within its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    x: f32,
    y: f32,
    scale: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl ViewportTransform {
    pub fn x(self) -> f32 {
        self.x
    }

    pub fn y(self) -> f32 {
        self.y
    }

    pub fn scale(self) -> f32 {
        self.scale
    }

    pub fn translation(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns the content point shown at a container pixel.
    pub fn content_at(self, pixel: Point) -> Point {
        pixel.sub_point(self.translation()).scale(1.0 / self.scale)
    }

    /// Returns the container pixel at which a content point is shown.
    pub fn pixel_of(self, content: Point) -> Point {
        content.scale(self.scale).add_point(self.translation())
    }
}

/// State captured when a drag gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pointer_id: u32,
    start_pointer: Point,
    start_translation: Point,
}

impl DragSession {
    pub fn pointer_id(&self) -> u32 {
        self.pointer_id
    }

    pub fn start_pointer(&self) -> Point {
        self.start_pointer
    }

    pub fn start_translation(&self) -> Point {
        self.start_translation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// A pointer event in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub position: Point,
    pub kind: PointerEventKind,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, pointer_id: u32, position: Point) -> Self {
        Self {
            pointer_id,
            position,
            kind,
        }
    }
}

/// A wheel event; positive `delta_y` scrolls down, which zooms out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub delta_y: f32,
    pub position: Point,
}

/// Controller owning the viewport transform and the drag state machine.
///
/// Zoom and fit operations require both the container and the surface size to
/// be known; before that they are no-ops. Drag gestures only translate.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewportTransform,
    surface: Option<Size>,
    container: Option<Size>,
    fit_padding: f32,
    /// Set while a new surface is waiting for the container to be measured.
    needs_fit: bool,
    drag: DragState,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self::with_fit_padding(DEFAULT_FIT_PADDING)
    }

    /// Creates a controller with a custom fit padding, in container pixels.
    pub fn with_fit_padding(fit_padding: f32) -> Self {
        Self {
            transform: ViewportTransform::default(),
            surface: None,
            container: None,
            fit_padding: fit_padding.max(0.0),
            needs_fit: false,
            drag: DragState::Idle,
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn surface(&self) -> Option<Size> {
        self.surface
    }

    pub fn container(&self) -> Option<Size> {
        self.container
    }

    pub fn fit_padding(&self) -> f32 {
        self.fit_padding
    }

    /// Returns the open drag session, if any.
    pub fn drag_session(&self) -> Option<&DragSession> {
        match &self.drag {
            DragState::Dragging(session) => Some(session),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging(_))
    }

    /// Records the visible size of the container.
    ///
    /// A surface that became current before the container was known is
    /// fitted as soon as both sizes are available.
    pub fn set_container(&mut self, size: Size) {
        self.container = size.is_usable().then_some(size);
        if self.needs_fit {
            self.fit_to_view();
        }
    }

    /// Records the measured size of the current surface.
    ///
    /// When a surface of different dimensions becomes current the view is
    /// refitted. Returns `true` if the dimensions changed.
    pub fn set_surface(&mut self, size: Option<Size>) -> bool {
        let size = size.filter(|size| size.is_usable());
        if size == self.surface {
            return false;
        }

        debug!(surface:? = size; "Surface size changed");
        self.surface = size;
        self.needs_fit = size.is_some();
        if self.needs_fit {
            self.fit_to_view();
        }
        true
    }

    /// Returns container and surface sizes when both are known.
    fn measured(&self) -> Option<(Size, Size)> {
        match (self.container, self.surface) {
            (Some(container), Some(surface)) => Some((container, surface)),
            _ => {
                trace!("Viewport not measured yet, ignoring request");
                None
            }
        }
    }

    /// Zooms to `target_scale` while keeping the content point under `anchor`
    /// at the same container pixel.
    pub fn zoom_around_point(&mut self, target_scale: f32, anchor: Point) {
        if self.measured().is_none() {
            return;
        }
        let Some(new_scale) = clamp_scale(target_scale) else {
            return;
        };

        let content = self.transform.content_at(anchor);
        self.transform = ViewportTransform {
            x: anchor.x() - content.x() * new_scale,
            y: anchor.y() - content.y() * new_scale,
            scale: new_scale,
        };
        trace!(transform:? = self.transform; "Zoomed around point");
    }

    /// Multiplies the scale by `factor`, anchored at the container center.
    pub fn zoom_by_factor(&mut self, factor: f32) {
        let Some((container, _)) = self.measured() else {
            return;
        };
        self.zoom_around_point(self.transform.scale * factor, container.center());
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by_factor(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by_factor(1.0 / ZOOM_STEP);
    }

    /// Scales the surface to the largest size that fits the container minus
    /// padding, and centers it.
    pub fn fit_to_view(&mut self) {
        let Some((container, surface)) = self.measured() else {
            return;
        };

        let fit_x = (container.width() - self.fit_padding) / surface.width();
        let fit_y = (container.height() - self.fit_padding) / surface.height();
        let Some(scale) = clamp_scale(fit_x.min(fit_y)) else {
            return;
        };

        self.transform = ViewportTransform {
            x: (container.width() - surface.width() * scale) / 2.0,
            y: (container.height() - surface.height() * scale) / 2.0,
            scale,
        };
        self.needs_fit = false;
        debug!(transform:? = self.transform; "Fitted surface to view");
    }

    /// Opens a drag session for `pointer_id`. Ignored while another session
    /// is open.
    pub fn begin_drag(&mut self, pointer_id: u32, pointer: Point) {
        if let DragState::Dragging(active) = &self.drag {
            trace!(active = active.pointer_id, ignored = pointer_id; "Drag already active");
            return;
        }

        self.drag = DragState::Dragging(DragSession {
            pointer_id,
            start_pointer: pointer,
            start_translation: self.transform.translation(),
        });
    }

    /// Moves the surface with the pointer of the open session.
    pub fn update_drag(&mut self, pointer_id: u32, pointer: Point) {
        let DragState::Dragging(session) = &self.drag else {
            return;
        };
        if session.pointer_id != pointer_id {
            return;
        }

        let translation = session
            .start_translation
            .add_point(pointer.sub_point(session.start_pointer));
        self.transform.x = translation.x();
        self.transform.y = translation.y();
    }

    /// Closes the open session if it belongs to `pointer_id`.
    pub fn end_drag(&mut self, pointer_id: u32) {
        if self
            .drag_session()
            .is_some_and(|session| session.pointer_id == pointer_id)
        {
            self.drag = DragState::Idle;
        }
    }

    /// Dispatches a pointer event to the drag state machine.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event.kind {
            PointerEventKind::Down => self.begin_drag(event.pointer_id, event.position),
            PointerEventKind::Move => self.update_drag(event.pointer_id, event.position),
            PointerEventKind::Up | PointerEventKind::Cancel => self.end_drag(event.pointer_id),
        }
    }

    /// Zooms around the wheel position. Ignored while a drag is open.
    pub fn handle_wheel(&mut self, event: WheelEvent) {
        if self.is_dragging() {
            return;
        }
        let factor = (-event.delta_y * WHEEL_ZOOM_SENSITIVITY).exp();
        self.zoom_around_point(self.transform.scale * factor, event.position);
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn measured_viewport() -> ViewportController {
        let mut viewport = ViewportController::new();
        viewport.set_container(Size::new(800.0, 600.0));
        viewport.set_surface(Some(Size::new(400.0, 300.0)));
        viewport
    }

    #[test]
    fn test_fit_to_view_centers_surface() {
        let viewport = measured_viewport();
        let transform = viewport.transform();

        assert_approx_eq!(f32, transform.scale(), 1.84, epsilon = 1e-5);
        assert_approx_eq!(f32, transform.x(), 32.0, epsilon = 1e-3);
        assert_approx_eq!(f32, transform.y(), 24.0, epsilon = 1e-3);

        // Equal margins on both sides of each axis.
        let right = 800.0 - (transform.x() + 400.0 * transform.scale());
        let bottom = 600.0 - (transform.y() + 300.0 * transform.scale());
        assert_approx_eq!(f32, right, transform.x(), epsilon = 1e-3);
        assert_approx_eq!(f32, bottom, transform.y(), epsilon = 1e-3);
    }

    #[test]
    fn test_fit_to_view_clamps_tiny_and_huge_surfaces() {
        let mut viewport = ViewportController::new();
        viewport.set_container(Size::new(800.0, 600.0));

        viewport.set_surface(Some(Size::new(1.0, 1.0)));
        assert_eq!(viewport.transform().scale(), MAX_SCALE);

        viewport.set_surface(Some(Size::new(100_000.0, 100_000.0)));
        assert_eq!(viewport.transform().scale(), MIN_SCALE);
    }

    #[test]
    fn test_operations_before_measurement_are_noops() {
        let mut viewport = ViewportController::new();
        viewport.zoom_by_factor(3.0);
        viewport.zoom_around_point(5.0, Point::new(10.0, 10.0));
        viewport.fit_to_view();
        assert_eq!(viewport.transform(), ViewportTransform::default());

        viewport.set_container(Size::new(800.0, 600.0));
        viewport.zoom_in();
        assert_eq!(viewport.transform(), ViewportTransform::default());
    }

    #[test]
    fn test_set_surface_refits_only_on_dimension_change() {
        let mut viewport = measured_viewport();
        viewport.zoom_by_factor(2.0);
        let zoomed = viewport.transform();

        assert!(!viewport.set_surface(Some(Size::new(400.0, 300.0))));
        assert_eq!(viewport.transform(), zoomed);

        assert!(viewport.set_surface(Some(Size::new(200.0, 100.0))));
        assert_ne!(viewport.transform(), zoomed);

        assert!(viewport.set_surface(None));
        assert_eq!(viewport.surface(), None);
    }

    #[test]
    fn test_surface_before_container_fits_once_container_is_known() {
        let mut viewport = ViewportController::new();
        assert!(viewport.set_surface(Some(Size::new(400.0, 300.0))));
        assert_eq!(viewport.transform(), ViewportTransform::default());

        viewport.set_container(Size::new(800.0, 600.0));
        assert_approx_eq!(f32, viewport.transform().scale(), 1.84, epsilon = 1e-5);
        assert_approx_eq!(f32, viewport.transform().x(), 32.0, epsilon = 1e-3);

        // Later container changes keep the user's zoom.
        viewport.zoom_in();
        let zoomed = viewport.transform();
        viewport.set_container(Size::new(1024.0, 768.0));
        assert_eq!(viewport.transform(), zoomed);
    }

    #[test]
    fn test_zoom_around_point_clamps_to_max() {
        let mut viewport = measured_viewport();
        viewport.zoom_around_point(1000.0, Point::new(17.0, 230.0));
        assert_eq!(viewport.transform().scale(), MAX_SCALE);

        viewport.zoom_around_point(f32::INFINITY, Point::new(0.0, 0.0));
        assert_eq!(viewport.transform().scale(), MAX_SCALE);
    }

    #[test]
    fn test_zoom_ignores_nan() {
        let mut viewport = measured_viewport();
        let before = viewport.transform();
        viewport.zoom_around_point(f32::NAN, Point::new(1.0, 1.0));
        viewport.zoom_by_factor(f32::NAN);
        assert_eq!(viewport.transform(), before);
    }

    #[test]
    fn test_zoom_by_factor_keeps_center_fixed() {
        let mut viewport = measured_viewport();
        let center = Point::new(400.0, 300.0);
        let before = viewport.transform().content_at(center);

        viewport.zoom_in();
        viewport.zoom_in();
        viewport.zoom_out();

        let after = viewport.transform().content_at(center);
        assert_approx_eq!(f32, before.x(), after.x(), epsilon = 1e-3);
        assert_approx_eq!(f32, before.y(), after.y(), epsilon = 1e-3);
        assert_approx_eq!(f32, viewport.transform().scale(), 1.84 * ZOOM_STEP, epsilon = 1e-4);
    }

    #[test]
    fn test_drag_translates_without_scaling() {
        let mut viewport = measured_viewport();
        let start = viewport.transform();

        viewport.begin_drag(7, Point::new(100.0, 100.0));
        viewport.update_drag(7, Point::new(130.0, 80.0));

        let moved = viewport.transform();
        assert_approx_eq!(f32, moved.x(), start.x() + 30.0);
        assert_approx_eq!(f32, moved.y(), start.y() - 20.0);
        assert_eq!(moved.scale(), start.scale());

        // Updates are relative to the drag start, not cumulative.
        viewport.update_drag(7, Point::new(100.0, 100.0));
        assert_eq!(viewport.transform(), start);

        viewport.end_drag(7);
        assert!(!viewport.is_dragging());
    }

    #[test]
    fn test_drag_ignores_other_pointers() {
        let mut viewport = measured_viewport();
        let start = viewport.transform();

        viewport.begin_drag(1, Point::new(0.0, 0.0));
        viewport.begin_drag(2, Point::new(50.0, 50.0));
        assert_eq!(viewport.drag_session().map(DragSession::pointer_id), Some(1));

        viewport.update_drag(2, Point::new(500.0, 500.0));
        assert_eq!(viewport.transform(), start);

        viewport.end_drag(2);
        assert!(viewport.is_dragging());

        viewport.end_drag(1);
        assert!(!viewport.is_dragging());

        // A new gesture may start once the first one ended.
        viewport.begin_drag(2, Point::new(50.0, 50.0));
        assert_eq!(viewport.drag_session().map(DragSession::pointer_id), Some(2));
    }

    #[test]
    fn test_pointer_events_drive_drag_state() {
        let mut viewport = measured_viewport();
        let start = viewport.transform();

        viewport.handle_pointer(PointerEvent::new(PointerEventKind::Down, 3, Point::new(10.0, 10.0)));
        viewport.handle_pointer(PointerEvent::new(PointerEventKind::Move, 3, Point::new(15.0, 25.0)));
        viewport.handle_pointer(PointerEvent::new(PointerEventKind::Cancel, 3, Point::new(15.0, 25.0)));

        assert!(!viewport.is_dragging());
        assert_approx_eq!(f32, viewport.transform().x(), start.x() + 5.0);
        assert_approx_eq!(f32, viewport.transform().y(), start.y() + 15.0);
    }

    #[test]
    fn test_wheel_zooms_around_cursor_and_is_blocked_by_drag() {
        let mut viewport = measured_viewport();
        let cursor = Point::new(200.0, 150.0);
        let before = viewport.transform();
        let content = before.content_at(cursor);

        viewport.handle_wheel(WheelEvent {
            delta_y: -100.0,
            position: cursor,
        });
        let zoomed = viewport.transform();
        assert!(zoomed.scale() > before.scale());
        let after = zoomed.content_at(cursor);
        assert_approx_eq!(f32, content.x(), after.x(), epsilon = 1e-3);
        assert_approx_eq!(f32, content.y(), after.y(), epsilon = 1e-3);

        viewport.begin_drag(1, cursor);
        viewport.handle_wheel(WheelEvent {
            delta_y: 300.0,
            position: cursor,
        });
        assert_eq!(viewport.transform(), zoomed);
    }

    #[test]
    fn test_transform_pixel_content_inverse() {
        let mut viewport = measured_viewport();
        viewport.zoom_around_point(3.0, Point::new(12.0, 34.0));
        let transform = viewport.transform();

        let content = Point::new(55.0, 66.0);
        let back = transform.content_at(transform.pixel_of(content));
        assert_approx_eq!(f32, back.x(), content.x(), epsilon = 1e-3);
        assert_approx_eq!(f32, back.y(), content.y(), epsilon = 1e-3);
    }
}
