use unicode_width::UnicodeWidthChar;

/// The input typed since the last prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingLine {
    text: String,
}

impl PendingLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Remove the last visible character along with any zero-width
    /// characters (combining marks, joiners) typed after it. Returns the
    /// number of cells the removed text occupied, or `None` when the line
    /// is empty.
    pub fn pop_cluster(&mut self) -> Option<usize> {
        let mut c = self.text.pop()?;
        while cell_width(c) == 0 {
            match self.text.pop() {
                Some(base) => c = base,
                None => return Some(0),
            }
        }
        Some(cell_width(c))
    }

    /// Move the contents out, leaving the line empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of terminal cells the line occupies once echoed.
    pub fn display_width(&self) -> usize {
        self.text.chars().map(cell_width).sum()
    }
}

/// Terminal cells used by one character.
fn cell_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_leaves_line_empty() {
        let mut line = PendingLine::new();
        line.push('h');
        line.push('i');
        assert_eq!(line.take(), "hi");
        assert!(line.is_empty());
        assert_eq!(line.display_width(), 0);
    }

    #[test]
    fn pop_cluster_on_empty_line_is_none() {
        let mut line = PendingLine::new();
        assert_eq!(line.pop_cluster(), None);
        line.push('語');
        assert_eq!(line.pop_cluster(), Some(2));
        assert_eq!(line.pop_cluster(), None);
    }

    #[test]
    fn wide_characters_take_two_cells() {
        let mut line = PendingLine::new();
        line.push('a');
        line.push('語');
        assert_eq!(line.display_width(), 3);
    }

    #[test]
    fn combining_marks_take_no_cells() {
        let mut line = PendingLine::new();
        line.push('e');
        line.push('\u{301}');
        assert_eq!(line.display_width(), 1);
    }

    #[test]
    fn pop_cluster_takes_marks_with_their_base() {
        let mut line = PendingLine::new();
        line.push('a');
        line.push('e');
        line.push('\u{301}');
        line.push('\u{308}');
        assert_eq!(line.pop_cluster(), Some(1));
        assert_eq!(line.as_str(), "a");
        assert_eq!(line.pop_cluster(), Some(1));
        assert_eq!(line.pop_cluster(), None);
    }

    #[test]
    fn pop_cluster_on_lone_mark_frees_no_cells() {
        let mut line = PendingLine::new();
        line.push('\u{301}');
        assert_eq!(line.pop_cluster(), Some(0));
        assert!(line.is_empty());
    }
}
