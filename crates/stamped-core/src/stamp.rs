//! Inline timestamp insertion
//!
//! A [`TextBuffer`] is a string with a caret measured in characters. When
//! the terminator character is typed, [`TextBuffer::type_char`] writes the
//! terminator and then the elapsed-time marker right after it, leaving the
//! caret behind the marker so typing continues where the user expects.

/// Render the inline marker for a formatted time, e.g. ` [00:01:30] `
pub fn marker(formatted_time: &str) -> String {
    format!(" [{}] ", formatted_time)
}

/// Editable text with a caret
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    /// Caret position in characters, `0..=char_len`
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding `text` with the caret at the end
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Replace the content, placing the caret at the end
    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Self::from_text(text);
    }

    /// Move the caret, clamped to the content
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.char_len());
    }

    /// Byte offset of a character position
    fn byte_offset(&self, char_pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Insert a character at the caret
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Insert a string at the caret
    pub fn insert_str(&mut self, s: &str) {
        let at = self.byte_offset(self.cursor);
        self.text.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    /// Type a character, stamping `formatted_time` after it if it is the terminator
    ///
    /// Returns true when a marker was inserted.
    pub fn type_char(&mut self, c: char, terminator: char, formatted_time: &str) -> bool {
        self.insert_char(c);
        if c == terminator {
            self.insert_str(&marker(formatted_time));
            return true;
        }
        false
    }

    /// Delete the character before the caret
    ///
    /// Returns false if there was nothing to delete.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    /// Delete the character under the caret
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.text.remove(at);
        true
    }

    pub fn cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker() {
        assert_eq!(marker("00:01:30"), " [00:01:30] ");
    }

    #[test]
    fn test_terminator_inserts_marker_after_it() {
        let mut buf = TextBuffer::from_text("Hello");
        assert!(buf.type_char('.', '.', "00:01:30"));
        assert_eq!(buf.text(), "Hello. [00:01:30] ");
        assert_eq!(buf.cursor(), buf.char_len());
    }

    #[test]
    fn test_insertion_is_reproducible() {
        let start = TextBuffer::from_text("Same input");
        let mut a = start.clone();
        let mut b = start.clone();
        a.type_char('.', '.', "00:01:30");
        b.type_char('.', '.', "00:01:30");
        assert_eq!(a, b);
    }

    #[test]
    fn test_other_characters_are_plain() {
        let mut buf = TextBuffer::new();
        assert!(!buf.type_char('a', '.', "00:00:05"));
        assert!(!buf.type_char('!', '.', "00:00:05"));
        assert_eq!(buf.text(), "a!");
    }

    #[test]
    fn test_mid_text_insertion_keeps_surrounding_content() {
        let mut buf = TextBuffer::from_text("First Second");
        buf.set_cursor(5);
        buf.type_char('.', '.', "00:00:00");
        assert_eq!(buf.text(), "First. [00:00:00]  Second");
        // Caret sits right after the marker
        assert_eq!(buf.cursor(), "First. [00:00:00] ".chars().count());

        buf.insert_char('X');
        assert_eq!(buf.text(), "First. [00:00:00] X Second");
    }

    #[test]
    fn test_custom_terminator() {
        let mut buf = TextBuffer::new();
        buf.type_char('.', '!', "00:00:01");
        buf.type_char('!', '!', "00:00:01");
        assert_eq!(buf.text(), ".! [00:00:01] ");
    }

    #[test]
    fn test_multibyte_cursor() {
        let mut buf = TextBuffer::from_text("café");
        buf.cursor_left();
        buf.insert_char('x');
        assert_eq!(buf.text(), "cafxé");
        assert!(buf.backspace());
        assert!(buf.delete());
        assert_eq!(buf.text(), "caf");
    }

    #[test]
    fn test_backspace_and_delete_at_edges() {
        let mut buf = TextBuffer::from_text("ab");
        assert!(!buf.delete());
        buf.cursor_home();
        assert!(!buf.backspace());
        assert!(buf.delete());
        assert_eq!(buf.text(), "b");
    }

    #[test]
    fn test_cursor_movement_is_clamped() {
        let mut buf = TextBuffer::from_text("abc");
        buf.cursor_right();
        assert_eq!(buf.cursor(), 3);
        buf.set_cursor(99);
        assert_eq!(buf.cursor(), 3);
        buf.cursor_home();
        buf.cursor_left();
        assert_eq!(buf.cursor(), 0);
        buf.cursor_end();
        assert_eq!(buf.cursor(), 3);
    }
}
