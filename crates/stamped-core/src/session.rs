//! Document session
//!
//! A [`Session`] is everything one open document view owns: the snapshot,
//! the caret, a stopwatch and an autosave countdown. Nothing is shared
//! between sessions. Both timers are plain deadlines inside the session,
//! so once the session is closed (consumed) neither can fire again.
//!
//! The caller drives time: it sleeps until [`Session::next_deadline`] and
//! then calls [`Session::poll`].

use std::time::{Duration, Instant};

use crate::autosave::AutosaveScheduler;
use crate::config::Config;
use crate::document::{Content, DocumentId, DocumentKind, DocumentSnapshot};
use crate::stamp::TextBuffer;
use crate::stopwatch::Stopwatch;
use crate::storage::{KeyValueStore, StorageResult};
use crate::store::{DocumentStore, LoadOrigin};

/// How long "Saved!" stays up after a manual save
pub const SAVED_NOTICE: Duration = Duration::from_secs(3);

/// Tunables for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub autosave_delay: Duration,
    pub terminator: char,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            autosave_delay: config.autosave_delay(),
            terminator: config.terminator,
        }
    }
}

/// State of the manual save control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    /// Manual save succeeded; shown until the instant passes
    Saved { until: Instant },
    /// Last save failed; shown until the next successful save
    Failed(String),
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "Save",
            SaveStatus::Saved { .. } => "Saved!",
            SaveStatus::Failed(_) => "Save failed",
        }
    }
}

/// Something that happened while polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stopwatch advanced this many seconds
    Ticked(u64),
    Autosaved,
    AutosaveFailed(String),
}

/// One open document
#[derive(Debug)]
pub struct Session {
    snapshot: DocumentSnapshot,
    origin: LoadOrigin,
    row: usize,
    column: usize,
    /// Active cell (grid) or the whole text
    buffer: TextBuffer,
    stopwatch: Stopwatch,
    autosave: AutosaveScheduler,
    terminator: char,
    save_status: SaveStatus,
    /// Edits not yet persisted
    dirty: bool,
}

impl Session {
    /// Open a document, starting empty if nothing is stored for `id`
    pub fn open<S: KeyValueStore>(
        store: &mut DocumentStore<S>,
        id: DocumentId,
        options: &SessionOptions,
    ) -> StorageResult<Self> {
        let loaded = store.load(id)?;
        tracing::info!(%id, origin = ?loaded.origin, "Opened document");
        Ok(Self::from_snapshot(loaded.snapshot, loaded.origin, options))
    }

    /// Session over an in-memory snapshot
    pub fn from_snapshot(
        snapshot: DocumentSnapshot,
        origin: LoadOrigin,
        options: &SessionOptions,
    ) -> Self {
        let mut session = Self {
            snapshot,
            origin,
            row: 0,
            column: 0,
            buffer: TextBuffer::new(),
            stopwatch: Stopwatch::new(),
            autosave: AutosaveScheduler::new(options.autosave_delay),
            terminator: options.terminator,
            save_status: SaveStatus::Idle,
            dirty: false,
        };
        session.load_buffer();
        session
    }

    pub fn id(&self) -> DocumentId {
        self.snapshot.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.snapshot.kind()
    }

    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    pub fn origin(&self) -> &LoadOrigin {
        &self.origin
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Active cell as `(row, column)`
    pub fn position(&self) -> (usize, usize) {
        (self.row, self.column)
    }

    // ==================== Editing ====================

    /// Type a character, stamping the elapsed time after the terminator
    pub fn type_char(&mut self, c: char, now: Instant) {
        let time = self.stopwatch.format();
        if self.buffer.type_char(c, self.terminator, &time) {
            tracing::debug!(time = %time, "Stamped sentence");
        }
        self.commit_buffer(now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if self.buffer.backspace() {
            self.commit_buffer(now);
        }
    }

    pub fn delete(&mut self, now: Instant) {
        if self.buffer.delete() {
            self.commit_buffer(now);
        }
    }

    pub fn cursor_left(&mut self) {
        self.buffer.cursor_left();
    }

    pub fn cursor_right(&mut self) {
        self.buffer.cursor_right();
    }

    pub fn cursor_home(&mut self) {
        self.buffer.cursor_home();
    }

    pub fn cursor_end(&mut self) {
        self.buffer.cursor_end();
    }

    /// Write the buffer through to the snapshot, arming autosave on change
    fn commit_buffer(&mut self, now: Instant) {
        let changed = match &mut self.snapshot.content {
            Content::Grid(grid) => grid.set_cell(self.row, self.column, self.buffer.text()),
            Content::Text(text) => {
                if text.as_str() == self.buffer.text() {
                    false
                } else {
                    *text = self.buffer.text().to_string();
                    true
                }
            }
        };

        if changed {
            self.dirty = true;
            self.autosave.content_changed(now);
        }
    }

    /// Load the active cell (or whole text) into the buffer
    fn load_buffer(&mut self) {
        let text = match &self.snapshot.content {
            Content::Grid(grid) => grid.cell(self.row, self.column).unwrap_or_default(),
            Content::Text(text) => text.as_str(),
        };
        self.buffer.set_text(text);
    }

    // ==================== Cell navigation ====================

    /// Make `(row, column)` the active cell, clamped to the grid
    pub fn select_cell(&mut self, row: usize, column: usize) {
        let Content::Grid(grid) = &self.snapshot.content else {
            return;
        };
        let row = row.min(grid.row_count().saturating_sub(1));
        let column = column.min(grid.column_count().saturating_sub(1));
        if (row, column) != (self.row, self.column) {
            self.row = row;
            self.column = column;
            self.load_buffer();
        }
    }

    pub fn move_up(&mut self) {
        self.select_cell(self.row.saturating_sub(1), self.column);
    }

    pub fn move_down(&mut self) {
        self.select_cell(self.row + 1, self.column);
    }

    pub fn move_left(&mut self) {
        self.select_cell(self.row, self.column.saturating_sub(1));
    }

    pub fn move_right(&mut self) {
        self.select_cell(self.row, self.column + 1);
    }

    /// Next cell in reading order, wrapping to the next row
    pub fn next_cell(&mut self) {
        let Content::Grid(grid) = &self.snapshot.content else {
            return;
        };
        if self.column + 1 < grid.column_count() {
            self.select_cell(self.row, self.column + 1);
        } else if self.row + 1 < grid.row_count() {
            self.select_cell(self.row + 1, 0);
        }
    }

    /// Previous cell in reading order, wrapping to the previous row
    pub fn prev_cell(&mut self) {
        let Content::Grid(grid) = &self.snapshot.content else {
            return;
        };
        if self.column > 0 {
            self.select_cell(self.row, self.column - 1);
        } else if self.row > 0 {
            self.select_cell(self.row - 1, grid.column_count().saturating_sub(1));
        }
    }

    // ==================== Timer ====================

    pub fn start_timer(&mut self, now: Instant) {
        self.stopwatch.start(now);
    }

    pub fn stop_timer(&mut self) {
        self.stopwatch.stop();
    }

    pub fn toggle_timer(&mut self, now: Instant) {
        self.stopwatch.toggle(now);
    }

    pub fn reset_timer(&mut self) {
        self.stopwatch.reset();
    }

    // ==================== Saving ====================

    /// Save now, independent of the autosave countdown
    ///
    /// The pending countdown, if any, still fires later. Failures are not
    /// retried; they are reported and shown in the save status.
    pub fn save<S: KeyValueStore>(
        &mut self,
        store: &mut DocumentStore<S>,
        now: Instant,
    ) -> StorageResult<()> {
        match store.save(&self.snapshot) {
            Ok(()) => {
                self.dirty = false;
                self.save_status = SaveStatus::Saved {
                    until: now + SAVED_NOTICE,
                };
                tracing::info!(id = %self.id(), "Saved document");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(id = %self.id(), error = %e, "Save failed");
                self.save_status = SaveStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Fire whatever is due at `now`
    pub fn poll<S: KeyValueStore>(
        &mut self,
        store: &mut DocumentStore<S>,
        now: Instant,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        let ticks = self.stopwatch.poll(now);
        if ticks > 0 {
            events.push(SessionEvent::Ticked(ticks));
        }

        if self.autosave.poll(now) {
            match store.save(&self.snapshot) {
                Ok(()) => {
                    self.dirty = false;
                    if let SaveStatus::Failed(_) = self.save_status {
                        self.save_status = SaveStatus::Idle;
                    }
                    tracing::debug!(id = %self.id(), "Autosaved document");
                    events.push(SessionEvent::Autosaved);
                }
                Err(e) => {
                    tracing::warn!(id = %self.id(), error = %e, "Autosave failed");
                    self.save_status = SaveStatus::Failed(e.to_string());
                    events.push(SessionEvent::AutosaveFailed(e.to_string()));
                }
            }
        }

        if let SaveStatus::Saved { until } = self.save_status {
            if until <= now {
                self.save_status = SaveStatus::Idle;
            }
        }

        events
    }

    /// Earliest instant at which [`Session::poll`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let status = match self.save_status {
            SaveStatus::Saved { until } => Some(until),
            _ => None,
        };
        [
            self.stopwatch.next_deadline(),
            self.autosave.next_deadline(),
            status,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// End the session
    ///
    /// Pending timers are dropped with the session. Edits that were never
    /// persisted get one final save.
    pub fn close<S: KeyValueStore>(mut self, store: &mut DocumentStore<S>) -> StorageResult<()> {
        self.stopwatch.stop();
        self.autosave.cancel();

        if self.dirty {
            if let Err(e) = store.save(&self.snapshot) {
                tracing::warn!(id = %self.id(), error = %e, "Could not save document on close");
                return Err(e);
            }
        }
        tracing::info!(id = %self.id(), "Closed document");
        Ok(())
    }
}
