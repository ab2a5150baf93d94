/// State management module
///
/// This module holds everything the editor knows, independent of the UI:
/// - Wire data structures shared with the review server (data.rs)
/// - The fixed-resolution bitmap (bitmap.rs)
/// - Manual pixel overrides and their undo history (overrides.rs, history.rs)
/// - Auto/manual threshold reconciliation (threshold.rs)
/// - The per-item editor state machine (editor.rs)
/// - The item list with optimistic status commands (items.rs)

pub mod bitmap;
pub mod data;
pub mod editor;
pub mod history;
pub mod items;
pub mod overrides;
pub mod threshold;
