/// Magnified 128×64 bitmap with drag-paint editing
///
/// The lit cells are drawn into a cache that is only cleared when the
/// bitmap changes; the hover preview and guide lines are a separate, cheap
/// layer. The grid never touches overrides: it emits `Message::Paint` and
/// the app does the bookkeeping.
use iced::mouse;
use iced::widget::canvas::{self, Cache, Frame, Geometry, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use super::pointer::{cell_at, HintKind, PointerSurface};
use crate::state::bitmap::{Bitmap, GRID_HEIGHT, GRID_WIDTH};
use crate::Message;

/// Screen pixels per grid cell
pub const CELL_SCALE: f32 = 5.0;

const WILL_TURN_ON: Color = Color { r: 0.25, g: 0.85, b: 0.35, a: 0.65 };
const WILL_TURN_OFF: Color = Color { r: 0.95, g: 0.3, b: 0.3, a: 0.65 };
const PAINTING: Color = Color { r: 1.0, g: 0.7, b: 0.1, a: 0.75 };

pub struct PixelGrid {
    bitmap: Bitmap,
    cache: Cache,
}

impl PixelGrid {
    pub fn new() -> Self {
        Self {
            bitmap: Bitmap::new(),
            cache: Cache::new(),
        }
    }

    /// Display size of the whole grid
    pub fn size() -> Size {
        Size::new(GRID_WIDTH as f32 * CELL_SCALE, GRID_HEIGHT as f32 * CELL_SCALE)
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Replace the effective bitmap; the cell layer is redrawn only if it changed
    pub fn set_bitmap(&mut self, bitmap: Bitmap) {
        if self.bitmap != bitmap {
            self.bitmap = bitmap;
            self.cache.clear();
        }
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl canvas::Program<Message> for PixelGrid {
    type State = PointerSurface;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let cell = cursor
            .position_in(bounds)
            .and_then(|p| cell_at(p.x, p.y, bounds.width, bounds.height));

        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(paint) = state.press(cell, &self.bitmap) {
                    return (canvas::event::Status::Captured, Some(Message::Paint(paint)));
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) => {
                let (paint, hover_changed) = state.move_to(cell, &self.bitmap);
                if let Some(paint) = paint {
                    return (canvas::event::Status::Captured, Some(Message::Paint(paint)));
                }
                if hover_changed {
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging() {
                    state.release();
                    return (canvas::event::Status::Captured, None);
                }
            }

            canvas::Event::Mouse(mouse::Event::CursorLeft) => {
                if state.leave() {
                    return (canvas::event::Status::Captured, None);
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
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let palette = theme.palette();
        let cell_w = bounds.width / GRID_WIDTH as f32;
        let cell_h = bounds.height / GRID_HEIGHT as f32;

        let cells = self.cache.draw(renderer, bounds.size(), |frame| {
            frame.fill_rectangle(Point::ORIGIN, frame.size(), Color::BLACK);
            for (x, y) in self.bitmap.lit_cells() {
                frame.fill_rectangle(
                    Point::new(x as f32 * cell_w, y as f32 * cell_h),
                    Size::new(cell_w, cell_h),
                    palette.text,
                );
            }
        });

        let mut overlay = Frame::new(renderer, bounds.size());
        if let Some(hint) = state.hint(&self.bitmap) {
            let (x, y) = hint.cell;
            let guide_alpha = if hint.over_lit { 0.45 } else { 0.18 };
            let guide = Color { a: guide_alpha, ..palette.primary };

            // Full row and column through the hovered cell
            overlay.fill_rectangle(
                Point::new(0.0, y as f32 * cell_h),
                Size::new(bounds.width, cell_h),
                guide,
            );
            overlay.fill_rectangle(
                Point::new(x as f32 * cell_w, 0.0),
                Size::new(cell_w, bounds.height),
                guide,
            );

            let color = match hint.kind {
                HintKind::WillTurnOn => WILL_TURN_ON,
                HintKind::WillTurnOff => WILL_TURN_OFF,
                HintKind::Painting(_) => PAINTING,
            };
            let top_left = Point::new(x as f32 * cell_w, y as f32 * cell_h);
            overlay.fill_rectangle(top_left, Size::new(cell_w, cell_h), color);
            overlay.stroke(
                &Path::rectangle(top_left, Size::new(cell_w, cell_h)),
                Stroke::default().with_color(Color { a: 1.0, ..color }).with_width(1.0),
            );
        }

        vec![cells, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}
