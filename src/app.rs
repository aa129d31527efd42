use chrono::Local;
use ratatui::widgets::{Block, Borders};
use tokio::sync::mpsc;
use tui_textarea::TextArea;

use crate::api::{Answer, BackendClient, Mode, GENERIC_ERROR};
use crate::typing::{self, TypingEvent};

/// Default query strategy, matching the backend's own default.
pub const DEFAULT_MODE: &str = "naive";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Bot,
}

/// One entry in the conversation. Bot messages created as placeholders have
/// their `text` grown in place by the typing reveal; once the reveal
/// finishes the text is never touched again. Messages are never deleted or
/// reordered within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
    pub mode: Option<String>,
    pub error: bool,
    pub timestamp: String,
}

impl Message {
    fn stamp() -> String {
        Local::now().format("%H:%M:%S").to_string()
    }

    pub fn user(text: String) -> Self {
        Self {
            kind: MessageKind::User,
            text,
            mode: None,
            error: false,
            timestamp: Self::stamp(),
        }
    }

    pub fn bot_placeholder(mode: String) -> Self {
        Self {
            kind: MessageKind::Bot,
            text: String::new(),
            mode: Some(mode),
            error: false,
            timestamp: Self::stamp(),
        }
    }

    pub fn bot_error(text: String) -> Self {
        Self {
            kind: MessageKind::Bot,
            text,
            mode: None,
            error: true,
            timestamp: Self::stamp(),
        }
    }
}

/// Outcomes delivered by spawned backend tasks to the UI loop.
#[derive(Debug)]
pub enum BackendEvent {
    Modes(Vec<Mode>),
    Answer(Answer),
    Failed { error: String },
}

pub struct App {
    backend: BackendClient,

    /// Ordered conversation; append-only, bot text updated in place.
    pub messages: Vec<Message>,
    pub modes: Vec<Mode>,
    pub selected_mode: String,
    pub textarea: TextArea<'static>,

    /// A query is in flight or its answer is still being revealed.
    pub loading: bool,
    /// A reveal is writing words into the newest bot message. Gates new
    /// submissions, mode switching and the input field.
    pub typing: bool,

    pub show_info: bool,
    pub show_mode_picker: bool,
    pub mode_cursor: usize,

    pub scroll_offset: u16,
    /// Keep the view pinned to the newest message until the user scrolls up.
    pub follow: bool,
    /// Largest valid scroll offset as of the last frame, maintained by the
    /// renderer so key handling can clamp against it.
    pub max_scroll: u16,

    backend_tx: mpsc::Sender<BackendEvent>,
    backend_rx: mpsc::Receiver<BackendEvent>,
    typing_tx: mpsc::Sender<TypingEvent>,
    typing_rx: mpsc::Receiver<TypingEvent>,
}

impl App {
    pub fn new(backend: BackendClient) -> Self {
        let (backend_tx, backend_rx) = mpsc::channel(32);
        let (typing_tx, typing_rx) = mpsc::channel(32);

        let mut textarea = TextArea::default();
        textarea.set_block(Block::default().borders(Borders::ALL).title("Question"));

        Self {
            backend,
            messages: Vec::new(),
            modes: Vec::new(),
            selected_mode: DEFAULT_MODE.to_string(),
            textarea,
            loading: false,
            typing: false,
            show_info: false,
            show_mode_picker: false,
            mode_cursor: 0,
            scroll_offset: 0,
            follow: true,
            max_scroll: 0,
            backend_tx,
            backend_rx,
            typing_tx,
            typing_rx,
        }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    // ---- state transitions -------------------------------------------------

    /// Replace the input buffer contents.
    pub fn question_changed(&mut self, text: &str) {
        let mut textarea = TextArea::from(text.lines().map(str::to_string).collect::<Vec<_>>());
        textarea.set_block(Block::default().borders(Borders::ALL).title("Question"));
        self.textarea = textarea;
    }

    /// Select a mode by id. Deliberately does not check the id against the
    /// current mode list: a refetch never resets an existing selection, so a
    /// stale id can be submitted if the list changes underneath it. That
    /// matches the backend contract, which validates the mode server-side.
    pub fn mode_selected(&mut self, id: &str) {
        self.selected_mode = id.to_string();
    }

    pub fn message_appended(&mut self, message: Message) {
        self.messages.push(message);
        self.follow = true;
    }

    pub fn message_partial_updated(&mut self, index: usize, text: String) {
        match self.messages.get_mut(index) {
            Some(message) => {
                message.text = text;
                self.follow = true;
            }
            None => tracing::error!(index, "partial update for unknown message"),
        }
    }

    pub fn typing_started(&mut self) {
        self.typing = true;
    }

    pub fn typing_ended(&mut self) {
        self.typing = false;
        self.loading = false;
    }

    // ---- query cycle -------------------------------------------------------

    pub fn current_question(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// Submit the current input as a question. A no-op while a reveal is in
    /// progress or when the trimmed input is empty: no message is appended
    /// and no request is issued.
    pub fn submit_question(&mut self) {
        let question = self.current_question();
        let question = question.trim();
        if question.is_empty() || self.typing {
            return;
        }
        let question = question.to_string();

        self.question_changed("");
        self.message_appended(Message::user(question.clone()));
        self.loading = true;

        let backend = self.backend.clone();
        let mode = self.selected_mode.clone();
        let tx = self.backend_tx.clone();
        tokio::spawn(async move {
            let event = match backend.query(&question, &mode).await {
                Ok(answer) => BackendEvent::Answer(answer),
                Err(e) => {
                    tracing::error!(error = %e, "query failed");
                    BackendEvent::Failed { error: e.to_string() }
                }
            };
            if tx.send(event).await.is_err() {
                tracing::debug!("backend event receiver dropped");
            }
        });
    }

    /// Kick off the one-shot mode fetch. Failures are logged and leave the
    /// mode list empty; there is no retry and no user-facing error.
    pub fn fetch_modes(&self) {
        let backend = self.backend.clone();
        let tx = self.backend_tx.clone();
        tokio::spawn(async move {
            match backend.modes().await {
                Ok(modes) => {
                    tracing::info!(count = modes.len(), "fetched backend modes");
                    let _ = tx.send(BackendEvent::Modes(modes)).await;
                }
                Err(e) => tracing::error!(error = %e, "failed to fetch modes"),
            }
        });
    }

    /// Drain completed backend calls delivered since the last frame.
    pub fn process_backend_events(&mut self) {
        while let Ok(event) = self.backend_rx.try_recv() {
            match event {
                BackendEvent::Modes(modes) => {
                    // Selection is intentionally left alone even when its id
                    // no longer appears in the fresh list.
                    self.modes = modes;
                    self.mode_cursor = self
                        .modes
                        .iter()
                        .position(|m| m.id == self.selected_mode)
                        .unwrap_or(0);
                }
                BackendEvent::Answer(answer) => {
                    self.message_appended(Message::bot_placeholder(answer.mode));
                    let index = self.messages.len() - 1;
                    self.typing_started();
                    tokio::spawn(typing::reveal_words(
                        answer.text,
                        index,
                        self.typing_tx.clone(),
                    ));
                }
                BackendEvent::Failed { error } => {
                    let text = if error.is_empty() {
                        GENERIC_ERROR.to_string()
                    } else {
                        error
                    };
                    self.message_appended(Message::bot_error(text));
                    self.loading = false;
                }
            }
        }
    }

    /// Drain word reveals delivered since the last frame. FIFO delivery from
    /// a single sequential reveal task keeps partials strictly ordered.
    pub fn process_typing_events(&mut self) {
        while let Ok(event) = self.typing_rx.try_recv() {
            match event {
                TypingEvent::Partial { index, text } => {
                    self.message_partial_updated(index, text);
                }
                TypingEvent::Done => self.typing_ended(),
            }
        }
    }

    // ---- mode picker -------------------------------------------------------

    pub fn toggle_mode_picker(&mut self) {
        if self.typing {
            return;
        }
        self.show_mode_picker = !self.show_mode_picker;
        if self.show_mode_picker {
            self.mode_cursor = self
                .modes
                .iter()
                .position(|m| m.id == self.selected_mode)
                .unwrap_or(0);
        }
    }

    pub fn mode_cursor_up(&mut self) {
        self.mode_cursor = self.mode_cursor.saturating_sub(1);
    }

    pub fn mode_cursor_down(&mut self) {
        if !self.modes.is_empty() {
            self.mode_cursor = (self.mode_cursor + 1).min(self.modes.len() - 1);
        }
    }

    /// Confirm the mode under the cursor and close the picker.
    pub fn confirm_mode(&mut self) {
        if let Some(mode) = self.modes.get(self.mode_cursor) {
            let id = mode.id.clone();
            self.mode_selected(&id);
        }
        self.show_mode_picker = false;
    }

    /// Display name for a mode id, falling back to the raw id when the list
    /// does not contain it.
    pub fn mode_name(&self, id: &str) -> String {
        self.modes
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    // ---- scrolling ---------------------------------------------------------

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_scroll);
        if self.scroll_offset == self.max_scroll {
            self.follow = true;
        }
    }
}
