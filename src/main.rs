use std::time::Instant;

use iced::widget::{
    button, canvas, checkbox, column, container, image, pick_list, row, scrollable, slider, stack, svg,
    text, text_editor, text_input, Column, Space,
};
use iced::{event, keyboard, Alignment, Element, Event, Length, Subscription, Task, Theme};

mod api;
mod assets;
mod config;
mod state;
mod ui;

use api::ReviewApi;
use assets::{loader, Asset, AssetSlot, Photo};
use config::Config;
use state::bitmap::Bitmap;
use state::data::{BoundingBox, ItemDetail, ItemState, ItemStatus, ItemSummary, RerunResponse};
use state::editor::{BboxEdit, Editor, Phase, Request};
use state::items::ItemList;
use state::threshold::{self, ThresholdSetting, DEFAULT_MANUAL_THRESHOLD};
use ui::canvas::BboxCanvas;
use ui::keys::Shortcut;
use ui::pixel_grid::PixelGrid;
use ui::pointer::Paint;

/// Main application state
struct ReviewApp {
    api: ReviewApi,
    config: Config,
    items: ItemList,
    /// Why the last item list fetch failed
    list_error: Option<String>,
    /// Failed status update, shown until dismissed
    list_notice: Option<String>,
    /// Editor for the selected item; replaced wholesale on every switch
    editor: Option<Editor>,
    photo: AssetSlot<Photo>,
    /// Pipeline preview sampled to the grid, before overrides
    preview: AssetSlot<Bitmap>,
    vector: AssetSlot<svg::Handle>,
    pixel_grid: PixelGrid,
    bbox_canvas: BboxCanvas,
    notes: text_editor::Content,
    new_flag: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    // Item list
    Refresh,
    ItemsLoaded(Result<Vec<ItemSummary>, String>),
    SelectItem(String),
    SetStatus(String, ItemStatus),
    StatusUpdated {
        id: String,
        seq: u64,
        result: Result<ItemState, String>,
    },
    DismissListNotice,

    // Backend answers, tagged with the item they belong to
    ItemLoaded(u64, Result<ItemDetail, String>),
    Saved(u64, Result<ItemState, String>),
    RerunDone(u64, Result<RerunResponse, String>),

    // Assets, tagged with the URL they were fetched from
    PhotoLoaded(String, Result<Photo, String>),
    PreviewLoaded(String, Result<Bitmap, String>),
    SvgLoaded(String, Result<svg::Handle, String>),

    // Editing
    Paint(Paint),
    BboxSelected(BoundingBox),
    Nudge(BboxEdit),
    Shortcut(Shortcut),
    Undo,
    Redo,
    ThresholdAuto(bool),
    ThresholdChanged(u8),
    NotesEdited(text_editor::Action),
    FlagToggled(String, bool),
    NewFlagChanged(String),
    AddFlag,

    // Actions
    Save,
    Rerun,
    ForceRedetect,
    DismissNotice,
    Retry,
}

impl ReviewApp {
    fn new(config: Config, api: ReviewApi) -> (Self, Task<Message>) {
        let app = ReviewApp {
            api,
            config,
            items: ItemList::new(),
            list_error: None,
            list_notice: None,
            editor: None,
            photo: AssetSlot::new(),
            preview: AssetSlot::new(),
            vector: AssetSlot::new(),
            pixel_grid: PixelGrid::new(),
            bbox_canvas: BboxCanvas::new(),
            notes: text_editor::Content::new(),
            new_flag: String::new(),
        };
        let task = app.load_items();
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Refresh => self.load_items(),

            Message::ItemsLoaded(result) => {
                match result {
                    Ok(items) => {
                        tracing::info!(count = items.len(), "item list loaded");
                        self.items.replace(items);
                        self.list_error = None;
                    }
                    Err(error) => {
                        tracing::error!(%error, "failed to load item list");
                        self.list_error = Some(error);
                    }
                }
                Task::none()
            }

            Message::SelectItem(id) => {
                if self.editor.as_ref().is_some_and(|editor| editor.id() == id) {
                    return Task::none();
                }
                self.reset_views();
                let (editor, request) = Editor::open(id, self.config.history_capacity);
                self.editor = Some(editor);
                self.dispatch(request)
            }

            Message::SetStatus(id, status) => {
                let Some(command) = self.items.issue(&id, status) else {
                    return Task::none();
                };
                let api = self.api.clone();
                let seq = command.seq;
                Task::perform(
                    async move {
                        api.update_state(&command.id, &command.patch)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    move |result| Message::StatusUpdated {
                        id: id.clone(),
                        seq,
                        result,
                    },
                )
            }

            Message::StatusUpdated { id, seq, result } => match result {
                Ok(_) => {
                    self.items.confirm(&id, seq);
                    Task::none()
                }
                Err(error) => {
                    tracing::warn!(item = %id, %error, "status update rejected");
                    self.items.rollback(&id, seq);
                    self.list_notice = Some(format!("Status update for {id} failed: {error}"));
                    self.load_items()
                }
            },

            Message::DismissListNotice => {
                self.list_notice = None;
                Task::none()
            }

            Message::ItemLoaded(session, result) => {
                let Some(editor) = self.editor_for(session) else {
                    return Task::none();
                };
                let follow_up = editor.on_loaded(result);
                self.after_response(follow_up)
            }

            Message::Saved(session, result) => {
                let Some(editor) = self.editor_for(session) else {
                    return Task::none();
                };
                let follow_up = editor.on_saved(result);
                self.after_response(follow_up)
            }

            Message::RerunDone(session, result) => {
                let Some(editor) = self.editor_for(session) else {
                    return Task::none();
                };
                editor.on_rerun(result);
                self.after_response(None)
            }

            Message::PhotoLoaded(url, result) => {
                if self.photo.resolve(&url, result) {
                    self.sync_bbox_canvas();
                }
                Task::none()
            }

            Message::PreviewLoaded(url, result) => {
                if self.preview.resolve(&url, result) {
                    self.sync_pixel_grid();
                }
                Task::none()
            }

            Message::SvgLoaded(url, result) => {
                self.vector.resolve(&url, result);
                Task::none()
            }

            Message::Paint(paint) => {
                if let Some(editor) = self.editor.as_mut() {
                    if editor.toggle_pixel(paint.x, paint.y, paint.value) {
                        self.sync_pixel_grid();
                    }
                }
                Task::none()
            }

            Message::BboxSelected(bbox) => {
                let request = self.editor.as_mut().and_then(|editor| editor.select_bbox(bbox));
                self.sync_bbox_canvas();
                self.dispatch_maybe(request)
            }

            Message::Nudge(edit) | Message::Shortcut(Shortcut::Bbox(edit)) => {
                if let Some(editor) = self.editor.as_mut() {
                    if editor.edit_bbox(edit) {
                        self.sync_bbox_canvas();
                    }
                }
                Task::none()
            }

            Message::Undo | Message::Shortcut(Shortcut::Undo) => {
                if self.editor.as_mut().is_some_and(|editor| editor.undo()) {
                    self.sync_pixel_grid();
                }
                Task::none()
            }

            Message::Redo | Message::Shortcut(Shortcut::Redo) => {
                if self.editor.as_mut().is_some_and(|editor| editor.redo()) {
                    self.sync_pixel_grid();
                }
                Task::none()
            }

            Message::ThresholdAuto(auto) => {
                if let Some(editor) = self.editor.as_mut() {
                    let setting = if auto {
                        ThresholdSetting::Auto
                    } else {
                        ThresholdSetting::Manual(manual_starting_value(editor))
                    };
                    editor.set_threshold(setting);
                }
                Task::none()
            }

            Message::ThresholdChanged(value) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.set_threshold(ThresholdSetting::Manual(value));
                }
                Task::none()
            }

            Message::NotesEdited(action) => {
                let Some(editor) = self.editor.as_mut() else {
                    return Task::none();
                };
                let is_edit = action.is_edit();
                if is_edit && editor.phase() != &Phase::Ready {
                    return Task::none();
                }
                self.notes.perform(action);
                if is_edit {
                    editor.set_notes(typed_notes(self.notes.text()));
                }
                Task::none()
            }

            Message::FlagToggled(name, value) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.set_flag(&name, value);
                }
                Task::none()
            }

            Message::NewFlagChanged(name) => {
                self.new_flag = name;
                Task::none()
            }

            Message::AddFlag => {
                let name = self.new_flag.trim().to_string();
                if name.is_empty() {
                    return Task::none();
                }
                if let Some(editor) = self.editor.as_mut() {
                    editor.set_flag(&name, true);
                    self.new_flag.clear();
                }
                Task::none()
            }

            Message::Save => {
                let request = self.editor.as_mut().and_then(Editor::save);
                self.dispatch_maybe(request)
            }

            Message::Rerun => {
                let request = self.editor.as_mut().and_then(Editor::rerun);
                self.dispatch_maybe(request)
            }

            Message::ForceRedetect => {
                let request = self.editor.as_mut().and_then(Editor::force_redetect);
                self.dispatch_maybe(request)
            }

            Message::DismissNotice => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.dismiss_notice();
                }
                Task::none()
            }

            Message::Retry => {
                let request = self.editor.as_mut().and_then(Editor::retry);
                self.dispatch_maybe(request)
            }
        }
    }

    /// The current editor, if it is the one that sent the request being answered
    fn editor_for(&mut self, session: u64) -> Option<&mut Editor> {
        let editor = self.editor.as_mut().filter(|editor| editor.session() == session);
        if editor.is_none() {
            tracing::debug!(session, "dropping response for an editor that is no longer open");
        }
        editor
    }

    fn after_response(&mut self, follow_up: Option<Request>) -> Task<Message> {
        let assets = self.sync_views();
        Task::batch([assets, self.dispatch_maybe(follow_up)])
    }

    fn load_items(&self) -> Task<Message> {
        let api = self.api.clone();
        Task::perform(
            async move { api.list_items().await.map_err(|e| e.to_string()) },
            Message::ItemsLoaded,
        )
    }

    fn dispatch_maybe(&self, request: Option<Request>) -> Task<Message> {
        match request {
            Some(request) => self.dispatch(request),
            None => Task::none(),
        }
    }

    /// Run a backend call on behalf of the current editor. Answers carry the
    /// editor's session so ones meant for an earlier editor can be dropped.
    fn dispatch(&self, request: Request) -> Task<Message> {
        let api = self.api.clone();
        let Some(session) = self.editor.as_ref().map(Editor::session) else {
            return Task::none();
        };

        match request {
            Request::Load { id } => {
                tracing::info!(item = %id, "loading item");
                Task::perform(
                    async move {
                        let started = Instant::now();
                        let result = api.get_item(&id).await.map_err(|e| e.to_string());
                        log_finished("load", &id, started, result.is_ok());
                        result
                    },
                    move |result| Message::ItemLoaded(session, result),
                )
            }

            Request::Save { id, patch } => {
                tracing::info!(item = %id, "saving item");
                Task::perform(
                    async move {
                        let started = Instant::now();
                        let result = api.update_state(&id, &patch).await.map_err(|e| e.to_string());
                        log_finished("save", &id, started, result.is_ok());
                        result
                    },
                    move |result| Message::Saved(session, result),
                )
            }

            Request::Rerun { id, refine_bbox } => {
                tracing::info!(item = %id, refine_bbox, "re-running pipeline");
                Task::perform(
                    async move {
                        let started = Instant::now();
                        let result = api.rerun(&id, refine_bbox).await.map_err(|e| e.to_string());
                        log_finished("rerun", &id, started, result.is_ok());
                        result
                    },
                    move |result| Message::RerunDone(session, result),
                )
            }
        }
    }

    /// Drop everything that belonged to the previous item
    fn reset_views(&mut self) {
        self.photo.reset();
        self.preview.reset();
        self.vector.reset();
        self.pixel_grid = PixelGrid::new();
        self.bbox_canvas = BboxCanvas::new();
        self.notes = text_editor::Content::new();
        self.new_flag.clear();
    }

    /// Bring views and asset slots in line with the editor's draft.
    /// Returns the fetches for any asset whose URL changed.
    fn sync_views(&mut self) -> Task<Message> {
        let Some(draft) = self.editor.as_ref().and_then(Editor::draft) else {
            return Task::none();
        };

        let source_url = Some(draft.source_url.as_str())
            .filter(|url| !url.is_empty())
            .map(|url| self.api.resolve(url));
        let preview_url = draft.preview_url().map(|url| self.api.resolve(&url));
        let svg_url = draft.svg_url().map(|url| self.api.resolve(&url));

        if self.notes.text().trim_end() != draft.state.notes.trim_end() {
            self.notes = text_editor::Content::with_text(&draft.state.notes);
        }

        let mut tasks = Vec::new();

        if let Some(url) = self.photo.target(source_url) {
            let (task, handle) = Task::perform(loader::load_photo(self.api.clone(), url.clone()), move |result| {
                Message::PhotoLoaded(url.clone(), result)
            })
            .abortable();
            self.photo.track(handle);
            tasks.push(task);
        }

        if let Some(url) = self.preview.target(preview_url) {
            let (task, handle) = Task::perform(loader::load_preview(self.api.clone(), url.clone()), move |result| {
                Message::PreviewLoaded(url.clone(), result)
            })
            .abortable();
            self.preview.track(handle);
            tasks.push(task);
        }

        if let Some(url) = self.vector.target(svg_url) {
            let foreground = self.theme().palette().text;
            let (task, handle) = Task::perform(
                loader::load_svg(self.api.clone(), url.clone(), foreground),
                move |result| Message::SvgLoaded(url.clone(), result),
            )
            .abortable();
            self.vector.track(handle);
            tasks.push(task);
        }

        self.sync_pixel_grid();
        self.sync_bbox_canvas();

        Task::batch(tasks)
    }

    /// Effective bitmap: sampled preview with the draft overrides on top
    fn sync_pixel_grid(&mut self) {
        let base = self.preview.ready().cloned().unwrap_or_else(Bitmap::new);
        let effective = match self.editor.as_ref().and_then(Editor::overrides) {
            Some(overrides) => base.with_overrides(overrides),
            None => base,
        };
        self.pixel_grid.set_bitmap(effective);
    }

    fn sync_bbox_canvas(&mut self) {
        let bbox = self.editor.as_ref().and_then(Editor::bbox);
        let natural = self.photo.ready().map(|photo| (photo.width, photo.height));
        self.bbox_canvas.set(bbox, natural, self.config.max_display_width);
    }

    // ========== View ==========

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let editor: Element<'_, Message> = match &self.editor {
            Some(editor) => scrollable(self.view_editor(editor)).width(Length::Fill).into(),
            None => container(text("Select an item to review").size(16))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        row![self.view_item_list(), editor].height(Length::Fill).into()
    }

    fn view_item_list(&self) -> Element<'_, Message> {
        let header = row![
            text("Items").size(20),
            Space::with_width(Length::Fill),
            button("Refresh").on_press(Message::Refresh),
        ]
        .align_y(Alignment::Center);

        let mut list = Column::new().spacing(4);
        if let Some(notice) = &self.list_notice {
            list = list.push(
                container(
                    row![
                        text(notice).size(12).width(Length::Fill),
                        button(text("Dismiss").size(12)).on_press(Message::DismissListNotice),
                    ]
                    .spacing(6)
                    .align_y(Alignment::Center),
                )
                .padding(8)
                .style(container::rounded_box),
            );
        }
        if let Some(error) = &self.list_error {
            list = list.push(text(format!("Could not load items: {error}")).size(12));
        }

        for item in self.items.items() {
            let selected = self.editor.as_ref().is_some_and(|editor| editor.id() == item.id);
            let label = if selected {
                format!("> {}", item.id)
            } else {
                item.id.clone()
            };

            let id = item.id.clone();
            let status = pick_list(ItemStatus::ALL, Some(item.status), move |status| {
                Message::SetStatus(id.clone(), status)
            })
            .text_size(12);

            let pending = if self.items.is_pending(&item.id) { "saving" } else { "" };
            let updated = item
                .updated_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default();

            list = list.push(
                row![
                    button(text(label).size(14))
                        .on_press(Message::SelectItem(item.id.clone()))
                        .style(button::text)
                        .width(Length::Fill),
                    text(format!("{:.2}", item.confidence)).size(12),
                    text(updated).size(10),
                    status,
                    text(pending).size(10),
                ]
                .spacing(6)
                .align_y(Alignment::Center),
            );
        }

        column![header, scrollable(list)]
            .spacing(10)
            .padding(10)
            .width(Length::Fixed(360.0))
            .into()
    }

    fn view_editor<'a>(&'a self, editor: &'a Editor) -> Element<'a, Message> {
        let title = row![
            text(editor.id()).size(22),
            text(if editor.is_dirty() { "unsaved changes" } else { "" }).size(12),
            Space::with_width(Length::Fill),
            text(phase_label(editor.phase())).size(14),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        if let Phase::Error(error) = editor.phase() {
            return column![
                title,
                text(format!("Failed to load item: {error}")),
                button("Retry").on_press(Message::Retry),
            ]
            .spacing(16)
            .padding(16)
            .into();
        }

        let Some(draft) = editor.draft() else {
            return column![title, text("Loading...")].spacing(16).padding(16).into();
        };

        let mut body = Column::new().spacing(16).padding(16).push(title);

        if let Some(notice) = editor.notice() {
            body = body.push(
                container(
                    row![
                        text(notice),
                        Space::with_width(Length::Fill),
                        button("Dismiss").on_press(Message::DismissNotice),
                    ]
                    .spacing(10)
                    .align_y(Alignment::Center),
                )
                .padding(10)
                .style(container::rounded_box),
            );
        }

        let ready = editor.phase() == &Phase::Ready;
        let nudge = |label: &'a str, edit: BboxEdit| {
            button(text(label).size(12)).on_press_maybe((ready && editor.bbox().is_some()).then_some(Message::Nudge(edit)))
        };

        body = body
            .push(self.view_photo())
            .push(
                row![
                    nudge("Left", BboxEdit::Move { dx: -1, dy: 0 }),
                    nudge("Right", BboxEdit::Move { dx: 1, dy: 0 }),
                    nudge("Up", BboxEdit::Move { dx: 0, dy: -1 }),
                    nudge("Down", BboxEdit::Move { dx: 0, dy: 1 }),
                    nudge("Narrower", BboxEdit::Resize { dw: -1, dh: 0 }),
                    nudge("Wider", BboxEdit::Resize { dw: 1, dh: 0 }),
                    nudge("Shorter", BboxEdit::Resize { dw: 0, dh: -1 }),
                    nudge("Taller", BboxEdit::Resize { dw: 0, dh: 1 }),
                ]
                .spacing(4),
            )
            .push(self.view_grid(editor))
            .push(self.view_threshold(editor))
            .push(
                column![
                    text("Notes").size(14),
                    text_editor(&self.notes)
                        .on_action(Message::NotesEdited)
                        .key_binding(ui::keys::notes_binding)
                        .height(Length::Fixed(100.0)),
                ]
                .spacing(4),
            )
            .push(self.view_flags(editor))
            .push(view_validation(&draft.state))
            .push(
                row![
                    button("Undo").on_press_maybe((ready && editor.can_undo()).then_some(Message::Undo)),
                    button("Redo").on_press_maybe((ready && editor.can_redo()).then_some(Message::Redo)),
                    Space::with_width(Length::Fill),
                    button("Save").on_press_maybe(editor.can_submit().then_some(Message::Save)),
                    button("Re-run").on_press_maybe(editor.can_submit().then_some(Message::Rerun)),
                    button("Force re-detect")
                        .on_press_maybe(editor.can_submit().then_some(Message::ForceRedetect)),
                ]
                .spacing(8),
            )
            .push(ui::svg_preview::view(self.vector.asset(), PixelGrid::size().width));

        body.into()
    }

    /// Source photo with the bbox overlay stacked on top
    fn view_photo(&self) -> Element<'_, Message> {
        match (self.photo.asset(), self.bbox_canvas.display_size()) {
            (Asset::Ready(photo), Some(size)) => stack![
                image(photo.handle.clone())
                    .width(Length::Fixed(size.width))
                    .height(Length::Fixed(size.height)),
                canvas(&self.bbox_canvas)
                    .width(Length::Fixed(size.width))
                    .height(Length::Fixed(size.height)),
            ]
            .into(),
            (Asset::Unavailable(_), _) => text("Source photo unavailable").into(),
            (Asset::Empty, _) => text("No source photo").into(),
            _ => text("Loading source photo...").into(),
        }
    }

    fn view_grid(&self, editor: &Editor) -> Element<'_, Message> {
        let size = PixelGrid::size();
        let (forced_on, forced_off) = editor
            .overrides()
            .map(|overrides| (overrides.force_on.len(), overrides.force_off.len()))
            .unwrap_or_default();

        let mut section = Column::new().spacing(6).push(
            canvas(&self.pixel_grid)
                .width(Length::Fixed(size.width))
                .height(Length::Fixed(size.height)),
        );
        if let Asset::Unavailable(_) = self.preview.asset() {
            section = section.push(text("Preview unavailable; showing overrides only").size(12));
        }
        section
            .push(
                text(format!(
                    "{} lit, {} forced on, {} forced off",
                    self.pixel_grid.bitmap().count_on(),
                    forced_on,
                    forced_off
                ))
                .size(12),
            )
            .into()
    }

    fn view_threshold(&self, editor: &Editor) -> Element<'_, Message> {
        let setting = editor.threshold();
        let value = match setting {
            ThresholdSetting::Manual(value) => value,
            ThresholdSetting::Auto => manual_starting_value(editor),
        };
        let label = match setting {
            ThresholdSetting::Auto => "auto".to_string(),
            ThresholdSetting::Manual(value) => value.to_string(),
        };

        row![
            checkbox("Auto threshold", setting.is_auto()).on_toggle(Message::ThresholdAuto),
            slider(0..=255u8, value, Message::ThresholdChanged).width(Length::Fixed(255.0)),
            text(label).size(12),
        ]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
    }

    fn view_flags<'a>(&'a self, editor: &'a Editor) -> Element<'a, Message> {
        let mut flags = Column::new().spacing(4).push(text("Flags").size(14));

        if let Some(draft) = editor.draft() {
            for (name, value) in &draft.state.flags {
                flags = match value.as_bool() {
                    Some(checked) => {
                        let flag = name.clone();
                        flags.push(
                            checkbox(name.as_str(), checked)
                                .on_toggle(move |checked| Message::FlagToggled(flag.clone(), checked)),
                        )
                    }
                    None => flags.push(text(format!("{name}: {value}")).size(12)),
                };
            }
        }

        flags
            .push(
                row![
                    text_input("new flag", &self.new_flag)
                        .on_input(Message::NewFlagChanged)
                        .on_submit(Message::AddFlag)
                        .width(Length::Fixed(200.0)),
                    button("Add").on_press(Message::AddFlag),
                ]
                .spacing(6),
            )
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Keyboard shortcuts. Keys already handled by a widget (typing in the
    /// notes editor, for one) are not shortcuts.
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, status, _window| match (event, status) {
            (Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }), event::Status::Ignored) => {
                ui::keys::shortcut(&key, modifiers).map(Message::Shortcut)
            }
            _ => None,
        })
    }
}

fn view_validation(state: &ItemState) -> Element<'_, Message> {
    let validation = &state.validation;
    let reasons = if validation.reason_codes.is_empty() {
        "none".to_string()
    } else {
        validation.reason_codes.join(", ")
    };
    let density = validation
        .pixel_density
        .map(|density| format!("{density:.3}"))
        .unwrap_or_else(|| "-".to_string());

    column![
        text("Validation").size(14),
        text(format!(
            "qualifying: {}   confidence: {:.2}   pixel density: {}",
            validation.is_qualifying, validation.confidence, density
        ))
        .size(12),
        text(format!("reasons: {reasons}")).size(12),
    ]
    .spacing(4)
    .into()
}

fn phase_label(phase: &Phase) -> &'static str {
    match phase {
        Phase::Loading => "loading",
        Phase::Ready => "ready",
        Phase::Saving => "saving",
        Phase::Rerunning => "re-running",
        Phase::Error(_) => "error",
    }
}

/// Value the slider starts from when switching to manual
fn manual_starting_value(editor: &Editor) -> u8 {
    editor
        .draft()
        .and_then(|draft| threshold::server_threshold(&draft.state))
        .unwrap_or(DEFAULT_MANUAL_THRESHOLD)
}

/// Notes as typed. Editor content text always ends in a newline the user
/// never typed; one is dropped.
fn typed_notes(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

fn log_finished(operation: &str, id: &str, started: Instant, ok: bool) {
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if ok {
        tracing::info!(item = id, elapsed_ms, "{operation} finished");
    } else {
        tracing::warn!(item = id, elapsed_ms, "{operation} failed");
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("oledvec_review=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            std::process::exit(2);
        }
    };
    tracing::info!(api = %config.api_url, "configuration loaded");

    let api = match ReviewApi::new(config.api_url.clone(), config.request_timeout) {
        Ok(api) => api,
        Err(error) => {
            tracing::error!(%error, "failed to build HTTP client");
            std::process::exit(2);
        }
    };

    iced::application("OLED Bitmap Review", ReviewApp::update, ReviewApp::view)
        .theme(ReviewApp::theme)
        .subscription(ReviewApp::subscription)
        .centered()
        .run_with(move || ReviewApp::new(config, api))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_notes_drops_one_trailing_newline() {
        assert_eq!(typed_notes("top row clipped\n".into()), "top row clipped");
        assert_eq!(typed_notes("two\nlines\n\n".into()), "two\nlines\n");
        assert_eq!(typed_notes("no newline".into()), "no newline");
        assert_eq!(typed_notes(String::new()), "");
    }
}
