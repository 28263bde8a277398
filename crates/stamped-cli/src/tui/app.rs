//! Application state and logic

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use stamped_core::analytics::{self, Analytics, Properties};
use stamped_core::route::Route;
use stamped_core::{
    export, Config, DocumentEntry, DocumentId, DocumentStore, KeyValueStore, LoadOrigin, Session,
    SessionEvent, SessionOptions,
};

/// How long a status message stays up
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Which view is showing
#[derive(Debug)]
pub enum View {
    /// Title, instructions and stored documents
    Landing,
    /// One open document
    Document(Box<Session>),
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current view
    pub view: View,
    /// Stored documents shown on the landing view
    pub documents: Vec<DocumentEntry>,
    /// Currently selected document index
    pub doc_index: usize,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Error shown in a modal until a key is pressed
    pub error: Option<String>,
    /// Whether help overlay is visible
    pub show_help: bool,
    options: SessionOptions,
    export_dir: PathBuf,
}

impl App {
    /// Create a new app on the landing view
    pub fn new<S: KeyValueStore>(store: &DocumentStore<S>, config: &Config) -> Result<Self> {
        let documents = store.list().context("Failed to list documents")?;

        Ok(Self {
            should_quit: false,
            view: View::Landing,
            documents,
            doc_index: 0,
            status_message: None,
            status_message_time: None,
            error: None,
            show_help: false,
            options: SessionOptions::from(config),
            export_dir: config.export_dir(),
        })
    }

    /// Currently open document, if any
    pub fn session(&self) -> Option<&Session> {
        match &self.view {
            View::Document(session) => Some(&**session),
            View::Landing => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.view {
            View::Document(session) => Some(&mut **session),
            View::Landing => None,
        }
    }

    /// Character that stamps the elapsed time
    pub fn terminator(&self) -> char {
        self.options.terminator
    }

    /// Route of the current view
    pub fn route(&self) -> Route {
        match &self.view {
            View::Landing => Route::Landing,
            View::Document(session) => Route::Document(session.id()),
        }
    }

    // ==================== Navigation between views ====================

    /// Leave the current view and show `route`
    pub fn navigate<S: KeyValueStore>(
        &mut self,
        store: &mut DocumentStore<S>,
        route: Route,
        is_new: bool,
        sink: &dyn Analytics,
    ) -> Result<()> {
        self.close_session(store);

        match route {
            Route::Landing => {
                self.refresh_documents(store)?;
                sink.event(analytics::PAGE_VIEW_HOME);
            }
            Route::Document(id) => {
                let session = Session::open(store, id, &self.options)
                    .with_context(|| format!("Failed to open document {}", id))?;

                if let LoadOrigin::Recovered { .. } = session.origin() {
                    self.set_status("Stored document was unreadable; starting empty");
                }

                sink.event(if is_new {
                    analytics::NEW_DOCUMENT
                } else {
                    analytics::OPEN_DOCUMENT
                });
                sink.identify(&Properties::from([(
                    "document_kind".to_string(),
                    session.kind().to_string(),
                )]));

                self.view = View::Document(Box::new(session));
            }
        }
        Ok(())
    }

    /// Create a fresh document and open it
    pub fn new_document<S: KeyValueStore>(
        &mut self,
        store: &mut DocumentStore<S>,
        sink: &dyn Analytics,
    ) -> Result<()> {
        self.navigate(store, Route::Document(DocumentId::new()), true, sink)
    }

    /// Open the document selected on the landing view
    pub fn open_selected<S: KeyValueStore>(
        &mut self,
        store: &mut DocumentStore<S>,
        sink: &dyn Analytics,
    ) -> Result<()> {
        if let Some(doc) = self.documents.get(self.doc_index) {
            let id = doc.id;
            self.navigate(store, Route::Document(id), false, sink)?;
        }
        Ok(())
    }

    /// Return to the landing view
    pub fn go_home<S: KeyValueStore>(
        &mut self,
        store: &mut DocumentStore<S>,
        sink: &dyn Analytics,
    ) -> Result<()> {
        self.navigate(store, Route::Landing, false, sink)
    }

    /// End the open session, if any
    ///
    /// Its timers go with it. Failure to flush unsaved edits is shown as an
    /// error; the view still closes.
    pub fn close_session<S: KeyValueStore>(&mut self, store: &mut DocumentStore<S>) {
        let view = std::mem::replace(&mut self.view, View::Landing);
        if let View::Document(session) = view {
            if let Err(e) = (*session).close(store) {
                self.set_error(format!("Unsaved changes were lost: {}", e));
            }
        }
    }

    /// Close everything and exit
    pub fn quit<S: KeyValueStore>(&mut self, store: &mut DocumentStore<S>) {
        self.close_session(store);
        self.should_quit = true;
    }

    // ==================== Landing view ====================

    /// Reload the document list
    pub fn refresh_documents<S: KeyValueStore>(&mut self, store: &DocumentStore<S>) -> Result<()> {
        self.documents = store.list().context("Failed to list documents")?;
        if self.documents.is_empty() {
            self.doc_index = 0;
        } else if self.doc_index >= self.documents.len() {
            self.doc_index = self.documents.len() - 1;
        }
        Ok(())
    }

    pub fn move_up(&mut self) {
        if self.doc_index > 0 {
            self.doc_index -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.doc_index + 1 < self.documents.len() {
            self.doc_index += 1;
        }
    }

    /// Delete the selected document
    pub fn delete_selected<S: KeyValueStore>(&mut self, store: &mut DocumentStore<S>) -> Result<()> {
        if let Some(doc) = self.documents.get(self.doc_index) {
            let id = doc.id;
            store.delete(id).context("Failed to delete document")?;
            self.set_status(format!("Deleted {}", id));
            self.refresh_documents(store)?;
        }
        Ok(())
    }

    // ==================== Document view ====================

    /// Fire due ticks and autosaves, expire status messages
    pub fn poll<S: KeyValueStore>(&mut self, store: &mut DocumentStore<S>, now: Instant) {
        let events = match self.session_mut() {
            Some(session) => session.poll(store, now),
            None => Vec::new(),
        };

        for event in events {
            if let SessionEvent::AutosaveFailed(msg) = event {
                self.set_status(format!("Autosave failed: {}", msg));
            }
        }

        self.check_status_timeout(now);
    }

    /// Earliest instant the app needs to wake up for
    pub fn next_deadline(&self) -> Option<Instant> {
        let status = self.status_message_time.map(|t| t + STATUS_TIMEOUT);
        [self.session().and_then(Session::next_deadline), status]
            .into_iter()
            .flatten()
            .min()
    }

    /// Manual save of the open document
    pub fn save<S: KeyValueStore>(&mut self, store: &mut DocumentStore<S>, now: Instant) {
        let Some(session) = self.session_mut() else {
            return;
        };
        if let Err(e) = session.save(store, now) {
            let mut message = format!("Save failed: {}", e);
            if let Some(hint) = e.recovery_suggestion() {
                message.push(' ');
                message.push_str(hint);
            }
            if e.is_recoverable() {
                message.push_str(" Your edits are still open and nothing was lost.");
            }
            self.set_error(message);
        }
    }

    /// Write `stamped.csv` for the open document
    pub fn export(&mut self, sink: &dyn Analytics) {
        let Some(session) = self.session() else {
            return;
        };
        match export::write_export(&self.export_dir, session.snapshot()) {
            Ok(path) => {
                sink.event(analytics::EXPORT_DOCUMENT);
                self.set_status(format!("Downloaded {}", path.display()));
            }
            Err(e) => self.set_error(format!("Export failed: {}", e)),
        }
    }

    // ==================== Messages ====================

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self, now: Instant) {
        if let Some(time) = self.status_message_time {
            if now.saturating_duration_since(time) >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}
