//! Single-line text composer.
//!
//! The cursor counts characters, not bytes, so multi-byte input edits
//! cleanly.

/// Editable input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    buffer: String,
    cursor: usize,
}

impl Composer {
    /// Empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// No text at all (whitespace counts as text).
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Insert `c` at the cursor.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor. `false` if nothing changed.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.buffer.remove(at);
        true
    }

    /// Delete the character at the cursor. `false` if nothing changed.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.buffer.remove(at);
        true
    }

    /// Move the cursor one character left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor one character right.
    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    /// Move the cursor to the start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor past the last character.
    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Take the text out, leaving the composer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    /// Discard the text.
    pub fn clear(&mut self) {
        self.take();
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.buffer.char_indices().nth(char_index).map_or(self.buffer.len(), |(i, _)| i)
    }
}

/// Slash command typed into the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/clear`: ask to wipe the conversation for everyone.
    Clear,
    /// `/quit`: leave the application.
    Quit,
}

impl Command {
    /// Recognize a command. Anything else is chat text.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "/clear" => Some(Self::Clear),
            "/quit" => Some(Self::Quit),
            _ => None,
        }
    }
}
