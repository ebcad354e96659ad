/// Single-line editor for the subscription rule.
///
/// `cursor_pos` is a byte offset that always sits on a char boundary.
#[derive(Debug, Clone, Default)]
pub struct RuleInput {
    pub input: String,
    pub cursor_pos: usize,
}

impl RuleInput {
    pub fn new(initial: &str) -> Self {
        Self {
            input: initial.to_string(),
            cursor_pos: initial.len(),
        }
    }

    pub fn value(&self) -> &str {
        &self.input
    }

    /// Cursor column in characters, for terminal placement.
    pub fn cursor_column(&self) -> usize {
        self.input[..self.cursor_pos].chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_pos > 0 {
            let prev = self.input[..self.cursor_pos]
                .chars()
                .last()
                .map(|c| c.len_utf8())
                .unwrap_or(0);
            self.cursor_pos -= prev;
            self.input.remove(self.cursor_pos);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor_pos < self.input.len() {
            self.input.remove(self.cursor_pos);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.input[..self.cursor_pos].chars().last() {
            self.cursor_pos -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.input[self.cursor_pos..].chars().next() {
            self.cursor_pos += c.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor_pos = 0;
    }

    pub fn end(&mut self) {
        self.cursor_pos = self.input.len();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_in_the_middle() {
        let mut input = RuleInput::new("level=rror");
        input.home();
        for _ in 0..6 {
            input.move_right();
        }
        input.insert_char('e');
        assert_eq!(input.value(), "level=error");
        assert_eq!(input.cursor_column(), 7);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut input = RuleInput::new("abc");
        input.delete_char();
        assert_eq!(input.value(), "ab");
        input.home();
        input.delete_forward();
        assert_eq!(input.value(), "b");
        input.delete_char();
        assert_eq!(input.value(), "b");
    }

    #[test]
    fn test_multibyte_cursor() {
        let mut input = RuleInput::new("");
        input.insert_char('ü');
        input.insert_char('x');
        input.move_left();
        input.move_left();
        assert_eq!(input.cursor_pos, 0);
        input.move_right();
        assert_eq!(input.cursor_column(), 1);
        input.delete_char();
        assert_eq!(input.value(), "x");
        input.end();
        input.move_right();
        assert_eq!(input.cursor_pos, 1);
    }
}
