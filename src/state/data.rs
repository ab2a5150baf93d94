/// Shared data structures for the application state
///
/// These structs mirror the review server's JSON and flow between the HTTP
/// client and the editor. Unknown fields on the persisted item state are
/// carried through untouched so a round trip never drops server data.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::overrides::OverrideSet;

// ========== Item list ==========

/// Curation status of an item
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Ok,
    NeedsReview,
    Rejected,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::Ok, ItemStatus::NeedsReview, ItemStatus::Rejected];
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemStatus::Ok => "ok",
            ItemStatus::NeedsReview => "needs review",
            ItemStatus::Rejected => "rejected",
        })
    }
}

/// One row of the item list
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ItemSummary {
    pub id: String,
    pub status: ItemStatus,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub svg_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Timestamps are written by the pipeline as ISO-8601 with a `Z` suffix,
/// but may be empty for items that were never processed.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|t| t.with_timezone(&Utc))))
}

// ========== Persisted item state ==========

/// Region of interest in source-photo pixel coordinates
///
/// Serialized as `[x, y, w, h]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Grow or shrink, never below 1×1
    pub fn resized(self, dw: i32, dh: i32) -> Self {
        Self {
            width: (self.width + dw).max(1),
            height: (self.height + dh).max(1),
            ..self
        }
    }

    /// Whether any edge lies outside a `width`×`height` image
    pub fn exceeds(&self, width: u32, height: u32) -> bool {
        let (width, height) = (i64::from(width), i64::from(height));
        self.x < 0
            || self.y < 0
            || i64::from(self.x) + i64::from(self.width) > width
            || i64::from(self.y) + i64::from(self.height) > height
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.x, self.y, self.width, self.height].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x, y, w, h] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(Self::new(x.round() as i32, y.round() as i32, w.round() as i32, h.round() as i32))
    }
}

/// `null` and `[]` both mean "no bbox"; the server stores `[]` after a
/// bbox has been cleared for re-detection.
fn optional_bbox<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<f64>> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some([]) => Ok(None),
        Some(&[x, y, w, h]) => Ok(Some(BoundingBox::new(
            x.round() as i32,
            y.round() as i32,
            w.round() as i32,
            h.round() as i32,
        ))),
        Some(other) => Err(serde::de::Error::invalid_length(other.len(), &"0 or 4 numbers")),
    }
}

fn default_target_size() -> [u32; 2] {
    [128, 64]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NormalizeParams {
    #[serde(default = "default_target_size")]
    pub target_size: [u32; 2],
    /// Binarization cutoff; absent when the pipeline computes it (Otsu)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otsu_threshold: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            otsu_threshold: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Outcome of the pipeline's OLED qualification step
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Validation {
    pub is_qualifying: bool,
    pub confidence: f64,
    pub reason_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_density: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Full persisted curation record of one item
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ItemState {
    #[serde(default, deserialize_with = "optional_bbox")]
    pub oled_bbox: Option<BoundingBox>,
    #[serde(default)]
    pub normalize_params: NormalizeParams,
    #[serde(default)]
    pub validation: Validation,
    #[serde(default)]
    pub overrides: OverrideSet,
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
    #[serde(default)]
    pub notes: String,
    /// `version`, `source_path`, `updated_at`, ...
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Response of `GET /api/item/{id}`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ItemDetail {
    pub id: String,
    pub state: ItemState,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub svg_url: Option<String>,
}

// ========== Requests ==========

/// How a patch changes the stored bbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BboxPatch {
    Set(BoundingBox),
    /// Sent as `[]`, which the server stores and later treats as "detect again"
    Clear,
}

impl Serialize for BboxPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BboxPatch::Set(bbox) => bbox.serialize(serializer),
            BboxPatch::Clear => Vec::<i32>::new().serialize(serializer),
        }
    }
}

/// Partial update for `POST /api/item/{id}/state`
///
/// Omitted fields are left as they are on the server. An omitted
/// `threshold` lets the pipeline compute one automatically.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oled_bbox: Option<BboxPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OverrideSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_status: Option<ItemStatus>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerunRequest {
    pub refine_bbox: bool,
}

/// Response of `POST /api/item/{id}/rerun`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RerunResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub svg_url: Option<String>,
    pub state: ItemState,
}

// ========== Response envelopes ==========

/// The list endpoint answers either with a bare array or with `{items: [...]}`
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum ItemsEnvelope {
    Wrapped { items: Vec<ItemSummary> },
    Bare(Vec<ItemSummary>),
}

impl ItemsEnvelope {
    pub(crate) fn into_items(self) -> Vec<ItemSummary> {
        match self {
            ItemsEnvelope::Wrapped { items } | ItemsEnvelope::Bare(items) => items,
        }
    }
}

/// The state endpoint answers either with `{status, state}` or the bare state.
/// Wrapped goes first: every field of a bare state is optional, so it would
/// match anything.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum StateEnvelope {
    Wrapped { state: ItemState },
    Bare(ItemState),
}

impl StateEnvelope {
    pub(crate) fn into_state(self) -> ItemState {
        match self {
            StateEnvelope::Wrapped { state } | StateEnvelope::Bare(state) => state,
        }
    }
}
