/// Per-item editor orchestration
///
/// The editor owns the draft copy of one item's curation state and decides
/// which backend calls to make. It performs no I/O itself: every operation
/// that needs the server returns a [`Request`], and the shell feeds the
/// server's answer back through the matching `on_*` method. That keeps the
/// whole Save / Re-run / force re-detect choreography testable without a
/// network.
///
/// Phases: `Loading → Ready → {Saving → Ready, Rerunning → Ready}`, and any
/// failed load ends in `Error`. Save and re-run failures return to `Ready`
/// with a blocking notice instead.

use std::sync::atomic::{AtomicU64, Ordering};

use super::bitmap::{GRID_HEIGHT, GRID_WIDTH};
use super::data::{BboxPatch, BoundingBox, ItemDetail, ItemState, RerunResponse, StatePatch};
use super::history::History;
use super::overrides::OverrideSet;
use super::threshold::{self, ThresholdSetting};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Ready,
    Saving,
    Rerunning,
    Error(String),
}

/// A backend call the shell must perform for the editor
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Load { id: String },
    Save { id: String, patch: StatePatch },
    Rerun { id: String, refine_bbox: bool },
}

/// What to do once the in-flight request succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FollowUp {
    /// Plain save: reload the item
    Reload,
    /// Ordinary re-run: the save was only there to persist the draft
    Rerun { refine_bbox: bool },
    /// Force re-detect: reload so the cleared bbox round-trips, then re-run
    ReloadThenRerun,
}

/// Keyboard edit of the bbox, in source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BboxEdit {
    Move { dx: i32, dy: i32 },
    Resize { dw: i32, dh: i32 },
}

/// Locally held copy of an item
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub state: ItemState,
    pub source_url: String,
    preview_url: Option<String>,
    svg_url: Option<String>,
    /// Bumped after every re-run. The pipeline rewrites artifacts in place,
    /// so the URLs alone do not change.
    revision: u64,
}

impl Draft {
    pub fn preview_url(&self) -> Option<String> {
        self.preview_url.as_deref().map(|url| versioned(url, self.revision))
    }

    pub fn svg_url(&self) -> Option<String> {
        self.svg_url.as_deref().map(|url| versioned(url, self.revision))
    }
}

fn versioned(url: &str, revision: u64) -> String {
    if revision == 0 {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}v={revision}")
}

/// Source of editor session numbers; every `Editor::open` takes the next one
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

pub struct Editor {
    id: String,
    /// Distinguishes this editor from earlier ones opened on the same item
    session: u64,
    phase: Phase,
    draft: Option<Draft>,
    threshold: ThresholdSetting,
    /// Threshold mode at the time the in-flight save/re-run was issued
    intent: Option<ThresholdSetting>,
    history: History<OverrideSet>,
    follow_up: Option<FollowUp>,
    /// Bbox cleared by a force re-detect, put back if the save fails
    cleared_bbox: Option<BoundingBox>,
    notice: Option<String>,
    dirty: bool,
}

impl Editor {
    /// Start editing `id`. The returned request loads the item.
    pub fn open(id: impl Into<String>, history_capacity: usize) -> (Self, Request) {
        let id = id.into();
        let editor = Self {
            id: id.clone(),
            session: NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            phase: Phase::Loading,
            draft: None,
            threshold: ThresholdSetting::Auto,
            intent: None,
            history: History::new(history_capacity),
            follow_up: None,
            cleared_bbox: None,
            notice: None,
            dirty: false,
        };
        (editor, Request::Load { id })
    }

    // ========== Accessors ==========

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Answers to requests must be fed back only to the editor session
    /// that issued them
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn threshold(&self) -> ThresholdSetting {
        self.threshold
    }

    pub fn overrides(&self) -> Option<&OverrideSet> {
        self.draft.as_ref().map(|draft| &draft.state.overrides)
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.draft.as_ref().and_then(|draft| draft.state.oled_bbox)
    }

    /// Blocking notification from a failed save or re-run
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Draft has edits that were not saved yet
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Save / Re-run are only offered when idle and no notice is pending
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Ready && self.draft.is_some() && self.notice.is_none()
    }

    pub fn can_undo(&self) -> bool {
        self.editable() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editable() && self.history.can_redo()
    }

    fn editable(&self) -> bool {
        self.phase == Phase::Ready && self.draft.is_some()
    }

    // ========== Backend choreography ==========

    /// Save the draft, then reload the item.
    pub fn save(&mut self) -> Option<Request> {
        self.submit(Phase::Saving, FollowUp::Reload, None)
    }

    /// Persist the draft, then ask the pipeline to reprocess it.
    pub fn rerun(&mut self) -> Option<Request> {
        self.submit(Phase::Rerunning, FollowUp::Rerun { refine_bbox: false }, None)
    }

    /// A drag selection defines a new bbox; the pipeline snaps it to content.
    pub fn select_bbox(&mut self, bbox: BoundingBox) -> Option<Request> {
        if !self.can_submit() {
            return None;
        }
        if let Some(draft) = self.draft.as_mut() {
            draft.state.oled_bbox = Some(bbox);
        }
        self.submit(Phase::Rerunning, FollowUp::Rerun { refine_bbox: true }, None)
    }

    /// Clear the stored bbox and let the pipeline detect a fresh one.
    pub fn force_redetect(&mut self) -> Option<Request> {
        if !self.can_submit() {
            return None;
        }
        if let Some(draft) = self.draft.as_mut() {
            self.cleared_bbox = draft.state.oled_bbox.take();
        }
        self.submit(Phase::Rerunning, FollowUp::ReloadThenRerun, Some(BboxPatch::Clear))
    }

    fn submit(&mut self, phase: Phase, follow_up: FollowUp, bbox: Option<BboxPatch>) -> Option<Request> {
        if !self.can_submit() {
            return None;
        }
        let draft = self.draft.as_ref()?;
        let patch = StatePatch {
            oled_bbox: bbox.or(draft.state.oled_bbox.map(BboxPatch::Set)),
            threshold: self.threshold.patch_value(),
            overrides: Some(draft.state.overrides.clone()),
            flags: Some(draft.state.flags.clone()),
            notes: Some(draft.state.notes.clone()),
            manual_status: None,
        };

        self.phase = phase;
        self.follow_up = Some(follow_up);
        self.intent = Some(self.threshold);

        Some(Request::Save {
            id: self.id.clone(),
            patch,
        })
    }

    /// Feed back the result of a `Load` request.
    pub fn on_loaded(&mut self, result: Result<ItemDetail, String>) -> Option<Request> {
        if !self.awaits(&[Phase::Loading, Phase::Saving, Phase::Rerunning], "load") {
            return None;
        }
        // The server now holds whatever bbox the reload brings back
        self.cleared_bbox = None;

        let detail = match result {
            Ok(detail) => detail,
            Err(error) => {
                tracing::error!(item = %self.id, %error, "failed to load item");
                self.phase = Phase::Error(error);
                self.draft = None;
                self.follow_up = None;
                self.intent = None;
                return None;
            }
        };

        let rerun_pending = self.follow_up == Some(FollowUp::ReloadThenRerun);
        let prior_intent = if rerun_pending { self.intent } else { self.intent.take() };

        let mut state = detail.state;
        state.overrides = state.overrides.normalized();
        self.threshold = threshold::reconcile(prior_intent, &state);

        match self.draft.as_mut() {
            Some(draft) => {
                draft.source_url = detail.source_url;
                draft.preview_url = detail.preview_url;
                draft.svg_url = detail.svg_url;
                draft.state = state;
                let overrides = draft.state.overrides.clone();
                if self.history.current() != Some(&overrides) {
                    self.history.push(overrides);
                }
            }
            None => {
                self.history = History::seeded(state.overrides.clone(), self.history.capacity());
                self.draft = Some(Draft {
                    state,
                    source_url: detail.source_url,
                    preview_url: detail.preview_url,
                    svg_url: detail.svg_url,
                    revision: 0,
                });
            }
        }

        if rerun_pending {
            self.follow_up = None;
            self.phase = Phase::Rerunning;
            return Some(Request::Rerun {
                id: self.id.clone(),
                refine_bbox: false,
            });
        }

        self.follow_up = None;
        self.phase = Phase::Ready;
        None
    }

    /// Feed back the result of a `Save` request.
    pub fn on_saved(&mut self, result: Result<ItemState, String>) -> Option<Request> {
        if !self.awaits(&[Phase::Saving, Phase::Rerunning], "save") {
            return None;
        }
        if let Err(error) = result {
            self.fail("Save failed", error);
            return None;
        }
        self.dirty = false;

        match self.follow_up.take() {
            Some(FollowUp::Rerun { refine_bbox }) => {
                self.phase = Phase::Rerunning;
                Some(Request::Rerun {
                    id: self.id.clone(),
                    refine_bbox,
                })
            }
            Some(FollowUp::ReloadThenRerun) => {
                self.follow_up = Some(FollowUp::ReloadThenRerun);
                Some(Request::Load { id: self.id.clone() })
            }
            Some(FollowUp::Reload) | None => Some(Request::Load { id: self.id.clone() }),
        }
    }

    /// Feed back the result of a `Rerun` request. The response is merged
    /// into the draft directly; no reload happens.
    pub fn on_rerun(&mut self, result: Result<RerunResponse, String>) {
        if !self.awaits(&[Phase::Rerunning], "re-run") {
            return;
        }
        let response = match result {
            Ok(response) => response,
            Err(error) => {
                self.fail("Re-run failed", error);
                return;
            }
        };
        tracing::info!(item = %self.id, status = %response.status, "pipeline re-run finished");

        let mut state = response.state;
        state.overrides = state.overrides.normalized();
        self.threshold = threshold::reconcile(self.intent.take(), &state);

        if let Some(draft) = self.draft.as_mut() {
            draft.state = state;
            if response.preview_url.is_some() {
                draft.preview_url = response.preview_url;
            }
            if response.svg_url.is_some() {
                draft.svg_url = response.svg_url;
            }
            draft.revision += 1;

            let overrides = draft.state.overrides.clone();
            if self.history.current() != Some(&overrides) {
                self.history.push(overrides);
            }
        }

        self.follow_up = None;
        self.phase = Phase::Ready;
    }

    /// Whether an answer is expected in the current phase; unexpected ones are dropped
    fn awaits(&self, phases: &[Phase], answer: &str) -> bool {
        let expected = phases.contains(&self.phase);
        if !expected {
            tracing::debug!(item = %self.id, phase = ?self.phase, "ignoring unexpected {answer} answer");
        }
        expected
    }

    fn fail(&mut self, context: &str, error: String) {
        tracing::warn!(item = %self.id, %error, "{context}");
        if let (Some(bbox), Some(draft)) = (self.cleared_bbox.take(), self.draft.as_mut()) {
            draft.state.oled_bbox = Some(bbox);
        }
        self.notice = Some(format!("{context}: {error}"));
        self.follow_up = None;
        self.intent = None;
        self.phase = Phase::Ready;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Load again after a failed load.
    pub fn retry(&mut self) -> Option<Request> {
        if !matches!(self.phase, Phase::Error(_)) {
            return None;
        }
        self.phase = Phase::Loading;
        Some(Request::Load { id: self.id.clone() })
    }

    // ========== Draft edits ==========

    /// Force a pixel to `value` and record an undo snapshot.
    pub fn toggle_pixel(&mut self, x: u32, y: u32, value: bool) -> bool {
        if !self.editable() || x >= GRID_WIDTH || y >= GRID_HEIGHT {
            return false;
        }
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        draft.state.overrides.apply(x as i32, y as i32, value);
        self.history.push(draft.state.overrides.clone());
        self.dirty = true;
        true
    }

    pub fn undo(&mut self) -> bool {
        if !self.editable() {
            return false;
        }
        match self.history.undo() {
            Some(snapshot) => self.restore(snapshot),
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if !self.editable() {
            return false;
        }
        match self.history.redo() {
            Some(snapshot) => self.restore(snapshot),
            None => false,
        }
    }

    fn restore(&mut self, snapshot: OverrideSet) -> bool {
        match self.draft.as_mut() {
            Some(draft) => {
                draft.state.overrides = snapshot;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Move or resize the bbox. Ignored when there is no bbox yet.
    pub fn edit_bbox(&mut self, edit: BboxEdit) -> bool {
        if !self.editable() {
            return false;
        }
        let Some(draft) = self.draft.as_mut() else {
            return false;
        };
        let Some(bbox) = draft.state.oled_bbox else {
            return false;
        };

        draft.state.oled_bbox = Some(match edit {
            BboxEdit::Move { dx, dy } => bbox.translated(dx, dy),
            BboxEdit::Resize { dw, dh } => bbox.resized(dw, dh),
        });
        self.dirty = true;
        true
    }

    pub fn set_threshold(&mut self, setting: ThresholdSetting) {
        if self.editable() && self.threshold != setting {
            self.threshold = setting;
            self.dirty = true;
        }
    }

    pub fn set_notes(&mut self, notes: String) {
        if !self.editable() {
            return;
        }
        if let Some(draft) = self.draft.as_mut() {
            if draft.state.notes != notes {
                draft.state.notes = notes;
                self.dirty = true;
            }
        }
    }

    pub fn set_flag(&mut self, name: &str, value: bool) {
        if !self.editable() || name.is_empty() {
            return;
        }
        if let Some(draft) = self.draft.as_mut() {
            draft
                .state
                .flags
                .insert(name.to_string(), serde_json::Value::Bool(value));
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::history::DEFAULT_CAPACITY;
    use assert_matches::assert_matches;

    fn detail(bbox: Option<BoundingBox>, threshold: Option<f64>) -> ItemDetail {
        let mut state = ItemState::default();
        state.oled_bbox = bbox;
        state.normalize_params.otsu_threshold = threshold;
        ItemDetail {
            id: "kit".into(),
            state,
            source_url: "/api/public/oled/dev/incoming/kit.jpg".into(),
            preview_url: Some("/api/public/screens/kit_preview_128x64.png".into()),
            svg_url: Some("/api/public/screens/kit.svg".into()),
        }
    }

    fn ready(bbox: Option<BoundingBox>, threshold: Option<f64>) -> Editor {
        let (mut editor, request) = Editor::open("kit", DEFAULT_CAPACITY);
        assert_eq!(request, Request::Load { id: "kit".into() });
        assert_eq!(editor.on_loaded(Ok(detail(bbox, threshold))), None);
        assert_eq!(editor.phase(), &Phase::Ready);
        editor
    }

    fn rerun_response(state: ItemState) -> RerunResponse {
        RerunResponse {
            status: "ok".into(),
            preview_url: Some("/api/public/screens/kit_preview_128x64.png".into()),
            svg_url: Some("/api/public/screens/kit.svg".into()),
            state,
        }
    }

    #[test]
    fn test_fresh_load_threshold_mode() {
        assert_eq!(ready(None, None).threshold(), ThresholdSetting::Auto);
        assert_eq!(ready(None, Some(101.0)).threshold(), ThresholdSetting::Manual(101));
    }

    #[test]
    fn test_load_failure_is_error_state() {
        let (mut editor, _) = Editor::open("kit", DEFAULT_CAPACITY);
        editor.on_loaded(Err("404 Not Found".into()));

        assert_matches!(editor.phase(), Phase::Error(msg) if msg.contains("404"));
        assert!(editor.draft().is_none());
        assert_eq!(editor.retry(), Some(Request::Load { id: "kit".into() }));
        assert_eq!(editor.phase(), &Phase::Loading);
    }

    #[test]
    fn test_arrow_moves_bbox() {
        let mut editor = ready(Some(BoundingBox::new(10, 10, 50, 30)), None);

        assert!(editor.edit_bbox(BboxEdit::Move { dx: 1, dy: 0 }));
        assert_eq!(editor.bbox(), Some(BoundingBox::new(11, 10, 50, 30)));

        let mut editor = ready(Some(BoundingBox::new(10, 10, 50, 30)), None);
        editor.edit_bbox(BboxEdit::Move { dx: 10, dy: 0 });
        assert_eq!(editor.bbox(), Some(BoundingBox::new(20, 10, 50, 30)));
    }

    #[test]
    fn test_resize_clamps_to_one() {
        let mut editor = ready(Some(BoundingBox::new(10, 10, 5, 5)), None);
        editor.edit_bbox(BboxEdit::Resize { dw: -10, dh: 10 });
        assert_eq!(editor.bbox(), Some(BoundingBox::new(10, 10, 1, 15)));
    }

    #[test]
    fn test_bbox_edit_without_bbox_is_ignored() {
        let mut editor = ready(None, None);
        assert!(!editor.edit_bbox(BboxEdit::Move { dx: 1, dy: 0 }));
        assert_eq!(editor.bbox(), None);
    }

    #[test]
    fn test_save_in_auto_mode_stays_auto() {
        let mut editor = ready(Some(BoundingBox::new(1, 2, 3, 4)), None);
        assert!(editor.threshold().is_auto());

        let request = editor.save().unwrap();
        assert_matches!(&request, Request::Save { patch, .. } if patch.threshold.is_none());
        assert_eq!(editor.phase(), &Phase::Saving);

        let next = editor.on_saved(Ok(ItemState::default()));
        assert_eq!(next, Some(Request::Load { id: "kit".into() }));
        assert_eq!(editor.phase(), &Phase::Saving);

        assert_eq!(editor.on_loaded(Ok(detail(Some(BoundingBox::new(1, 2, 3, 4)), None))), None);
        assert_eq!(editor.phase(), &Phase::Ready);
        assert_eq!(editor.threshold(), ThresholdSetting::Auto);
    }

    #[test]
    fn test_save_in_auto_mode_ignores_persisted_value() {
        let mut editor = ready(None, None);
        editor.save();
        editor.on_saved(Ok(ItemState::default()));
        editor.on_loaded(Ok(detail(None, Some(120.0))));

        assert_eq!(editor.threshold(), ThresholdSetting::Auto);
    }

    #[test]
    fn test_manual_threshold_is_sent() {
        let mut editor = ready(None, None);
        editor.set_threshold(ThresholdSetting::Manual(150));

        let request = editor.save().unwrap();
        assert_matches!(request, Request::Save { patch, .. } if patch.threshold == Some(150.0));
    }

    #[test]
    fn test_busy_blocks_overlapping_requests() {
        let mut editor = ready(None, None);
        assert!(editor.save().is_some());

        assert_eq!(editor.save(), None);
        assert_eq!(editor.rerun(), None);
        assert_eq!(editor.force_redetect(), None);
        assert!(!editor.toggle_pixel(0, 0, true));
    }

    #[test]
    fn test_rerun_saves_first_and_merges_without_reload() {
        let mut editor = ready(Some(BoundingBox::new(10, 10, 50, 30)), None);
        editor.toggle_pixel(3, 3, true);

        let request = editor.rerun().unwrap();
        assert_matches!(&request, Request::Save { patch, .. }
            if patch.overrides.as_ref().map(|o| o.forced(3, 3)) == Some(Some(true)));
        assert_eq!(editor.phase(), &Phase::Rerunning);

        let next = editor.on_saved(Ok(ItemState::default()));
        assert_eq!(next, Some(Request::Rerun { id: "kit".into(), refine_bbox: false }));

        let mut state = editor.draft().unwrap().state.clone();
        state.validation.pixel_density = Some(0.3);
        editor.on_rerun(Ok(rerun_response(state)));

        assert_eq!(editor.phase(), &Phase::Ready);
        assert!(!editor.is_dirty());
        let draft = editor.draft().unwrap();
        assert_eq!(draft.state.validation.pixel_density, Some(0.3));
        assert_eq!(
            draft.preview_url().as_deref(),
            Some("/api/public/screens/kit_preview_128x64.png?v=1")
        );
    }

    #[test]
    fn test_rerun_reapplies_threshold_reconciliation() {
        let mut editor = ready(None, None);
        editor.rerun();
        editor.on_saved(Ok(ItemState::default()));

        let mut state = ItemState::default();
        state.normalize_params.otsu_threshold = Some(88.0);
        editor.on_rerun(Ok(rerun_response(state)));

        assert_eq!(editor.threshold(), ThresholdSetting::Auto);
    }

    #[test]
    fn test_force_redetect_round_trips_cleared_bbox() {
        let mut editor = ready(Some(BoundingBox::new(10, 10, 50, 30)), None);

        let request = editor.force_redetect().unwrap();
        assert_matches!(&request, Request::Save { patch, .. } if patch.oled_bbox == Some(BboxPatch::Clear));
        assert_eq!(editor.bbox(), None);

        let next = editor.on_saved(Ok(ItemState::default()));
        assert_eq!(next, Some(Request::Load { id: "kit".into() }));

        let next = editor.on_loaded(Ok(detail(None, None)));
        assert_eq!(next, Some(Request::Rerun { id: "kit".into(), refine_bbox: false }));
        assert_eq!(editor.phase(), &Phase::Rerunning);
        assert_eq!(editor.bbox(), None);

        let mut state = ItemState::default();
        state.oled_bbox = Some(BoundingBox::new(400, 280, 520, 260));
        editor.on_rerun(Ok(rerun_response(state)));

        assert_eq!(editor.phase(), &Phase::Ready);
        assert_eq!(editor.bbox(), Some(BoundingBox::new(400, 280, 520, 260)));
    }

    #[test]
    fn test_drag_selection_requests_refinement() {
        let mut editor = ready(None, None);
        let selected = BoundingBox::new(5, 6, 70, 40);

        let request = editor.select_bbox(selected).unwrap();
        assert_matches!(&request, Request::Save { patch, .. } if patch.oled_bbox == Some(BboxPatch::Set(selected)));

        let next = editor.on_saved(Ok(ItemState::default()));
        assert_eq!(next, Some(Request::Rerun { id: "kit".into(), refine_bbox: true }));
    }

    #[test]
    fn test_save_failure_raises_blocking_notice() {
        let mut editor = ready(None, None);
        editor.save();
        assert_eq!(editor.on_saved(Err("connection refused".into())), None);

        assert_eq!(editor.phase(), &Phase::Ready);
        assert!(editor.notice().unwrap().contains("connection refused"));
        assert!(!editor.can_submit());
        assert_eq!(editor.save(), None);

        editor.dismiss_notice();
        assert!(editor.can_submit());
    }

    #[test]
    fn test_rerun_failure_keeps_draft() {
        let mut editor = ready(None, None);
        editor.toggle_pixel(1, 1, true);
        editor.rerun();
        editor.on_saved(Ok(ItemState::default()));
        editor.on_rerun(Err("500".into()));

        assert_eq!(editor.phase(), &Phase::Ready);
        assert!(editor.notice().is_some());
        assert_eq!(editor.overrides().unwrap().forced(1, 1), Some(true));
    }

    #[test]
    fn test_failed_force_redetect_restores_bbox() {
        let original = BoundingBox::new(10, 10, 50, 30);
        let mut editor = ready(Some(original), None);

        editor.force_redetect().unwrap();
        assert_eq!(editor.bbox(), None);
        assert_eq!(editor.on_saved(Err("timeout".into())), None);

        assert_eq!(editor.bbox(), Some(original));
        assert!(editor.notice().is_some());
    }

    #[test]
    fn test_each_open_gets_its_own_session() {
        let (first, _) = Editor::open("kit", DEFAULT_CAPACITY);
        let (second, _) = Editor::open("kit", DEFAULT_CAPACITY);
        assert_ne!(first.session(), second.session());
    }

    #[test]
    fn test_rerun_answer_while_ready_is_ignored() {
        let mut editor = ready(None, None);
        editor.toggle_pixel(1, 1, true);

        editor.on_rerun(Ok(rerun_response(ItemState::default())));

        assert_eq!(editor.phase(), &Phase::Ready);
        assert_eq!(editor.overrides().unwrap().forced(1, 1), Some(true));
    }

    #[test]
    fn test_save_answer_while_ready_is_ignored() {
        let mut editor = ready(None, None);
        editor.set_notes("draft".into());

        assert_eq!(editor.on_saved(Ok(ItemState::default())), None);
        assert_eq!(editor.on_saved(Err("late".into())), None);

        assert_eq!(editor.phase(), &Phase::Ready);
        assert_eq!(editor.notice(), None);
    }

    #[test]
    fn test_load_answer_while_ready_is_ignored() {
        let mut editor = ready(None, None);
        editor.toggle_pixel(3, 3, true);

        assert_eq!(editor.on_loaded(Ok(detail(None, Some(90.0)))), None);
        assert_eq!(editor.overrides().unwrap().forced(3, 3), Some(true));
    }

    #[test]
    fn test_toggle_undo_redo() {
        let mut editor = ready(None, None);
        assert!(!editor.can_undo());

        editor.toggle_pixel(1, 1, true);
        editor.toggle_pixel(2, 2, false);
        let before_undo = editor.overrides().unwrap().clone();

        assert!(editor.undo());
        assert!(editor.undo());
        assert_eq!(editor.overrides(), Some(&OverrideSet::default()));
        assert!(!editor.undo());

        assert!(editor.redo());
        assert!(editor.redo());
        assert_eq!(editor.overrides().unwrap(), &before_undo);
        assert!(!editor.redo());
    }

    #[test]
    fn test_toggle_out_of_grid_is_ignored() {
        let mut editor = ready(None, None);
        assert!(!editor.toggle_pixel(128, 0, true));
        assert!(!editor.toggle_pixel(0, 64, true));
        assert_eq!(editor.overrides(), Some(&OverrideSet::default()));
    }

    #[test]
    fn test_history_survives_save_reload() {
        let mut editor = ready(None, None);
        editor.toggle_pixel(1, 1, true);
        let saved = editor.overrides().unwrap().clone();

        editor.save();
        editor.on_saved(Ok(ItemState::default()));
        let mut reloaded = detail(None, None);
        reloaded.state.overrides = saved;
        editor.on_loaded(Ok(reloaded));

        assert!(editor.undo());
        assert_eq!(editor.overrides(), Some(&OverrideSet::default()));
    }

    #[test]
    fn test_flags_and_notes() {
        let mut editor = ready(None, None);
        editor.set_flag("inverted", true);
        editor.set_notes("top row clipped".into());

        let Request::Save { patch, .. } = editor.save().unwrap() else {
            panic!("expected save");
        };
        assert_eq!(patch.notes.as_deref(), Some("top row clipped"));
        assert_eq!(
            patch.flags.unwrap().get("inverted"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
