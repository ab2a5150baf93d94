/// Binarization threshold mode and its reconciliation with server state
///
/// The server stores only a number (or nothing). Whether the user meant
/// "let the pipeline decide" is UI intent that the server cannot express:
/// a save in auto mode may still come back with a concrete threshold. The
/// editor therefore remembers the intent it had when it issued a save or
/// re-run and feeds it back in here when the response arrives.

use super::data::ItemState;

/// Used when switching from auto to manual with no server value to start from
pub const DEFAULT_MANUAL_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSetting {
    /// The pipeline computes the cutoff (Otsu)
    Auto,
    /// Explicit cutoff, 0-255
    Manual(u8),
}

impl ThresholdSetting {
    pub fn is_auto(self) -> bool {
        matches!(self, ThresholdSetting::Auto)
    }

    /// Value to send in a state patch; auto mode omits it
    pub fn patch_value(self) -> Option<f64> {
        match self {
            ThresholdSetting::Auto => None,
            ThresholdSetting::Manual(value) => Some(f64::from(value)),
        }
    }
}

/// Stored threshold, rounded and clamped to a byte
pub fn server_threshold(state: &ItemState) -> Option<u8> {
    state
        .normalize_params
        .otsu_threshold
        .filter(|value| value.is_finite())
        .map(|value| value.round().clamp(0.0, 255.0) as u8)
}

/// Decide the threshold mode to show after a server response.
///
/// * `prior_intent` is the mode the user had selected when the request was
///   issued, or `None` for a fresh load of an item.
/// * Auto intent always survives, whatever the server stored.
/// * Manual intent takes the server's value when it has one.
/// * A fresh load is manual exactly when the server has a stored value.
pub fn reconcile(prior_intent: Option<ThresholdSetting>, state: &ItemState) -> ThresholdSetting {
    match (prior_intent, server_threshold(state)) {
        (Some(ThresholdSetting::Auto), _) => ThresholdSetting::Auto,
        (Some(ThresholdSetting::Manual(_)), Some(stored)) => ThresholdSetting::Manual(stored),
        (Some(ThresholdSetting::Manual(value)), None) => ThresholdSetting::Manual(value),
        (None, Some(stored)) => ThresholdSetting::Manual(stored),
        (None, None) => ThresholdSetting::Auto,
    }
}
