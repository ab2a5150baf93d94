/// UI components for the review editor
///
/// This module contains:
/// - Bbox overlay drawn over the source photo
/// - Magnified pixel grid with drag-paint editing
/// - Pointer handling shared by the grid, free of any renderer
/// - Keyboard shortcuts
/// - Vector output preview

pub mod canvas;
pub mod keys;
pub mod pixel_grid;
pub mod pointer;
pub mod svg_preview;
