/// Keyboard shortcuts for the editor
use iced::keyboard::key::Named;
use iced::keyboard::{Key, Modifiers};
use iced::widget::text_editor::{Binding, KeyPress, Status};

use crate::state::editor::BboxEdit;
use crate::Message;

/// Pixels per arrow press, and with shift held
const STEP: i32 = 1;
const COARSE_STEP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    Bbox(BboxEdit),
}

/// Map a key press to an editor shortcut.
///
/// - Ctrl/Cmd+Z undo, Ctrl/Cmd+Shift+Z or Ctrl/Cmd+Y redo
/// - Arrows move the bbox, Ctrl/Cmd+arrows resize it
/// - Shift multiplies the step by ten
pub fn shortcut(key: &Key, modifiers: Modifiers) -> Option<Shortcut> {
    match key.as_ref() {
        Key::Character(c) if modifiers.command() => match c.to_lowercase().as_str() {
            "z" if modifiers.shift() => Some(Shortcut::Redo),
            "z" => Some(Shortcut::Undo),
            "y" => Some(Shortcut::Redo),
            _ => None,
        },
        Key::Named(named) => {
            let step = if modifiers.shift() { COARSE_STEP } else { STEP };
            let (dx, dy) = match named {
                Named::ArrowLeft => (-step, 0),
                Named::ArrowRight => (step, 0),
                Named::ArrowUp => (0, -step),
                Named::ArrowDown => (0, step),
                _ => return None,
            };
            let edit = if modifiers.command() {
                BboxEdit::Resize { dw: dx, dh: dy }
            } else {
                BboxEdit::Move { dx, dy }
            };
            Some(Shortcut::Bbox(edit))
        }
        _ => None,
    }
}

/// Key bindings for the notes editor. Undo and redo typed while it has
/// focus are swallowed so they never reach the pixel history.
pub fn notes_binding(key_press: KeyPress) -> Option<Binding<Message>> {
    if matches!(key_press.status, Status::Focused)
        && matches!(shortcut(&key_press.key, key_press.modifiers), Some(Shortcut::Undo | Shortcut::Redo))
    {
        return Some(Binding::Sequence(Vec::new()));
    }
    Binding::from_key_press(key_press)
}
