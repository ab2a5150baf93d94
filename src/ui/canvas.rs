use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Geometry, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::state::data::BoundingBox;
use crate::Message;

const BBOX_COLOR: Color = Color { r: 0.2, g: 0.9, b: 0.4, a: 1.0 };
const SELECTION_COLOR: Color = Color { r: 1.0, g: 0.8, b: 0.2, a: 1.0 };

/// Scale that fits a photo of `natural_width` into `max_display_width`.
/// Photos are shrunk, never enlarged.
pub fn display_scale(max_display_width: f32, natural_width: u32) -> f32 {
    if natural_width == 0 {
        return 1.0;
    }
    (max_display_width / natural_width as f32).min(1.0)
}

/// Turn a drag between two display points into a bbox in source pixels.
/// Drags smaller than one source pixel are not a selection.
pub fn selection_to_bbox(start: Point, end: Point, scale: f32) -> Option<BoundingBox> {
    if scale <= 0.0 {
        return None;
    }
    let x0 = (start.x.min(end.x) / scale).round();
    let y0 = (start.y.min(end.y) / scale).round();
    let x1 = (start.x.max(end.x) / scale).round();
    let y1 = (start.y.max(end.y) / scale).round();

    let (width, height) = (x1 - x0, y1 - y0);
    if width < 1.0 || height < 1.0 {
        return None;
    }
    Some(BoundingBox::new(x0 as i32, y0 as i32, width as i32, height as i32))
}

/// Overlay drawn on top of the source photo: the current bbox plus the
/// rectangle being dragged out. Coordinates are kept in source pixels and
/// multiplied by `scale` only for drawing.
pub struct BboxCanvas {
    bbox: Option<BoundingBox>,
    natural: Option<(u32, u32)>,
    scale: f32,
}

impl BboxCanvas {
    pub fn new() -> Self {
        Self {
            bbox: None,
            natural: None,
            scale: 1.0,
        }
    }

    /// Update what is shown. An out-of-bounds bbox is drawn as is and only
    /// logged; correcting it is up to the user or the pipeline.
    pub fn set(&mut self, bbox: Option<BoundingBox>, natural: Option<(u32, u32)>, max_display_width: f32) {
        if bbox != self.bbox || natural != self.natural {
            if let (Some(b), Some((width, height))) = (bbox, natural) {
                if b.exceeds(width, height) {
                    tracing::warn!(
                        bbox = ?[b.x, b.y, b.width, b.height],
                        width,
                        height,
                        "bbox exceeds photo bounds"
                    );
                }
            }
        }
        self.bbox = bbox;
        self.natural = natural;
        self.scale = natural
            .map(|(width, _)| display_scale(max_display_width, width))
            .unwrap_or(1.0);
    }

    /// Size the photo is drawn at
    pub fn display_size(&self) -> Option<Size> {
        self.natural
            .map(|(w, h)| Size::new(w as f32 * self.scale, h as f32 * self.scale))
    }
}

impl Default for BboxCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Program<Message> for BboxCanvas {
    type State = DragState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse button press - start a selection
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(pos) = cursor.position_in(bounds) {
                    state.anchor = Some(pos);
                    state.current = Some(pos);
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse move - grow the selection, clamped to the photo
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.anchor.is_some() {
                    state.current = Some(Point::new(
                        (position.x - bounds.x).clamp(0.0, bounds.width),
                        (position.y - bounds.y).clamp(0.0, bounds.height),
                    ));
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - the selection is complete
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if let (Some(start), Some(end)) = (state.anchor.take(), state.current.take()) {
                    let message = selection_to_bbox(start, end, self.scale).map(Message::BboxSelected);
                    return (canvas::event::Status::Captured, message);
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        if let Some(bbox) = self.bbox {
            let path = Path::rectangle(
                Point::new(bbox.x as f32 * self.scale, bbox.y as f32 * self.scale),
                Size::new(bbox.width as f32 * self.scale, bbox.height as f32 * self.scale),
            );
            frame.stroke(&path, Stroke::default().with_color(BBOX_COLOR).with_width(2.0));
        }

        if let (Some(start), Some(end)) = (state.anchor, state.current) {
            let top_left = Point::new(start.x.min(end.x), start.y.min(end.y));
            let size = Size::new((start.x - end.x).abs(), (start.y - end.y).abs());
            frame.fill_rectangle(top_left, size, Color { a: 0.15, ..SELECTION_COLOR });
            frame.stroke(
                &Path::rectangle(top_left, size),
                Stroke::default().with_color(SELECTION_COLOR).with_width(1.0),
            );
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(&self, _state: &Self::State, bounds: Rectangle, cursor: Cursor) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// State for drag-to-select, in display coordinates
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub anchor: Option<Point>,
    pub current: Option<Point>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scale_never_enlarges() {
        assert_eq!(display_scale(640.0, 1280), 0.5);
        assert_eq!(display_scale(640.0, 320), 1.0);
        assert_eq!(display_scale(640.0, 0), 1.0);
    }

    #[test]
    fn test_selection_is_in_source_pixels() {
        let bbox = selection_to_bbox(Point::new(60.0, 40.0), Point::new(10.0, 5.0), 0.5);
        assert_eq!(bbox, Some(BoundingBox::new(20, 10, 100, 70)));
    }

    #[test]
    fn test_click_is_not_a_selection() {
        assert_eq!(selection_to_bbox(Point::new(5.0, 5.0), Point::new(5.2, 5.0), 1.0), None);
    }

    #[test]
    fn test_set_tolerates_missing_and_out_of_bounds() {
        let mut canvas = BboxCanvas::new();
        canvas.set(None, None, 640.0);
        assert_eq!(canvas.display_size(), None);

        let outside = BoundingBox::new(1200, 10, 200, 50);
        canvas.set(Some(outside), Some((1280, 960)), 640.0);
        assert_eq!(canvas.bbox, Some(outside));
        assert_eq!(canvas.scale, 0.5);
        assert_eq!(canvas.display_size(), Some(Size::new(640.0, 480.0)));
    }
}
