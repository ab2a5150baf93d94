/// Manual pixel corrections
///
/// An override forces a single cell of the 128×64 bitmap on or off,
/// regardless of what the pipeline's thresholding produced. The two sets
/// are kept disjoint: a cell is forced one way or the other, never both.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A bitmap coordinate as `(x, y)`.
///
/// Signed so that malformed coordinates coming from the server still
/// deserialize; they are ignored when the bitmap is derived.
pub type Coord = (i32, i32);

/// Force-on / force-off sets, serialized as `{force_on: [[x, y], ...], force_off: [...]}`
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    #[serde(default)]
    pub force_on: BTreeSet<Coord>,
    #[serde(default)]
    pub force_off: BTreeSet<Coord>,
}

impl OverrideSet {
    /// Record that `(x, y)` should be `value`.
    ///
    /// The coordinate is removed from both sets first, so applying the same
    /// value twice is harmless and the sets stay disjoint.
    pub fn apply(&mut self, x: i32, y: i32, value: bool) {
        self.force_on.remove(&(x, y));
        self.force_off.remove(&(x, y));

        if value {
            self.force_on.insert((x, y));
        } else {
            self.force_off.insert((x, y));
        }
    }

    /// The forced value of a cell, if any
    pub fn forced(&self, x: i32, y: i32) -> Option<bool> {
        if self.force_on.contains(&(x, y)) {
            Some(true)
        } else if self.force_off.contains(&(x, y)) {
            Some(false)
        } else {
            None
        }
    }

    /// Restore disjointness on sets loaded from the server.
    ///
    /// The pipeline applies force_off after force_on when binarizing, so a
    /// coordinate present in both ends up off. Keep that outcome.
    pub fn normalized(mut self) -> Self {
        let conflicts: Vec<Coord> = self.force_on.intersection(&self.force_off).copied().collect();
        for coord in conflicts {
            self.force_on.remove(&coord);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_moves_between_sets() {
        let mut overrides = OverrideSet::default();

        overrides.apply(3, 4, true);
        assert_eq!(overrides.forced(3, 4), Some(true));

        overrides.apply(3, 4, false);
        assert_eq!(overrides.forced(3, 4), Some(false));
        assert!(!overrides.force_on.contains(&(3, 4)));
        assert!(overrides.force_on.is_disjoint(&overrides.force_off));
        assert_eq!(overrides.force_off.len(), 1);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut overrides = OverrideSet::default();
        overrides.apply(1, 1, true);
        overrides.apply(1, 1, true);

        assert_eq!(overrides.force_on.len(), 1);
        assert!(overrides.force_off.is_empty());
    }

    #[test]
    fn test_wire_format() {
        let mut overrides = OverrideSet::default();
        overrides.apply(5, 2, true);
        overrides.apply(0, 63, false);

        let json = serde_json::to_value(&overrides).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"force_on": [[5, 2]], "force_off": [[0, 63]]})
        );
    }

    #[test]
    fn test_missing_sets_default_to_empty() {
        let overrides: OverrideSet = serde_json::from_str(r#"{"force_on": [[1, 2]]}"#).unwrap();
        assert!(overrides.force_off.is_empty());
        assert_eq!(overrides.forced(1, 2), Some(true));
    }

    #[test]
    fn test_normalized_prefers_force_off() {
        let overrides: OverrideSet = serde_json::from_str(
            r#"{"force_on": [[1, 2], [3, 3]], "force_off": [[1, 2]]}"#,
        )
        .unwrap();
        assert!(!overrides.force_on.is_disjoint(&overrides.force_off));

        let overrides = overrides.normalized();
        assert!(overrides.force_on.is_disjoint(&overrides.force_off));
        assert_eq!(overrides.forced(1, 2), Some(false));
        assert_eq!(overrides.forced(3, 3), Some(true));
    }
}
