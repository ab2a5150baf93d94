/// Pointer handling for the pixel grid, independent of any renderer
///
/// The canvas widget only translates raw mouse events into cells and calls
/// into [`PointerSurface`]; all painting decisions live here so they can be
/// tested without a window.

use std::collections::HashSet;

use crate::state::bitmap::{Bitmap, GRID_HEIGHT, GRID_WIDTH};

/// A grid cell as `(column, row)`
pub type Cell = (u32, u32);

/// Map a pointer position on a surface displayed at `width`×`height` to a
/// grid cell. Positions outside the grid yield `None`.
pub fn cell_at(px: f32, py: f32, width: f32, height: f32) -> Option<Cell> {
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let column = (px * GRID_WIDTH as f32 / width).floor();
    let row = (py * GRID_HEIGHT as f32 / height).floor();

    if column < 0.0 || row < 0.0 || column >= GRID_WIDTH as f32 || row >= GRID_HEIGHT as f32 {
        return None;
    }
    Some((column as u32, row as u32))
}

/// A cell the user painted, emitted to the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paint {
    pub x: u32,
    pub y: u32,
    pub value: bool,
}

/// What the hovered cell would become
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    WillTurnOn,
    WillTurnOff,
    /// A drag is in progress painting this value
    Painting(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverHint {
    pub cell: Cell,
    pub kind: HintKind,
    /// Hovered cell is lit; guides are drawn with more contrast
    pub over_lit: bool,
}

/// One press-drag-release stroke
#[derive(Debug, Clone, Default)]
struct PaintSession {
    value: bool,
    painted: HashSet<Cell>,
}

/// Per-widget pointer state
#[derive(Debug, Clone, Default)]
pub struct PointerSurface {
    drag: Option<PaintSession>,
    hover: Option<Cell>,
}

impl PointerSurface {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Button pressed over `cell`. Starts a stroke painting the opposite of
    /// the pressed cell's current value.
    pub fn press(&mut self, cell: Option<Cell>, bitmap: &Bitmap) -> Option<Paint> {
        let (x, y) = cell?;
        let value = !bitmap.get(x, y);

        let mut session = PaintSession {
            value,
            painted: HashSet::new(),
        };
        session.painted.insert((x, y));
        self.drag = Some(session);
        self.hover = Some((x, y));

        Some(Paint { x, y, value })
    }

    /// Pointer moved to `cell`.
    ///
    /// Returns the paint to emit, if any, and whether the hovered cell
    /// changed (the only case that needs a redraw).
    pub fn move_to(&mut self, cell: Option<Cell>, bitmap: &Bitmap) -> (Option<Paint>, bool) {
        let hover_changed = self.hover != cell;
        self.hover = cell;

        let paint = match (self.drag.as_mut(), cell) {
            (Some(session), Some((x, y))) => {
                if bitmap.get(x, y) != session.value && session.painted.insert((x, y)) {
                    Some(Paint {
                        x,
                        y,
                        value: session.value,
                    })
                } else {
                    None
                }
            }
            _ => None,
        };

        (paint, hover_changed)
    }

    /// Button released; the stroke ends
    pub fn release(&mut self) {
        self.drag = None;
    }

    /// Pointer left the surface
    pub fn leave(&mut self) -> bool {
        let had_hover = self.hover.is_some();
        self.hover = None;
        had_hover
    }

    pub fn hint(&self, bitmap: &Bitmap) -> Option<HoverHint> {
        let (x, y) = self.hover?;
        let over_lit = bitmap.get(x, y);
        let kind = match &self.drag {
            Some(session) => HintKind::Painting(session.value),
            None if over_lit => HintKind::WillTurnOff,
            None => HintKind::WillTurnOn,
        };
        Some(HoverHint {
            cell: (x, y),
            kind,
            over_lit,
        })
    }
}
