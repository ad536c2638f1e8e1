//! Key events as seen by the REPL.
//!
//! Hosts translate whatever their terminal produces (crossterm events, raw
//! stdin bytes) into [`KeyEvent`]s. The controller only ever looks at the
//! logical key and four modifier flags.

use bitflags::bitflags;

/// Logical key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    /// A key that produces a character. Shift is already applied.
    Char(char),
    /// Arrows, function keys, Tab, Escape and anything else without a
    /// character of its own.
    Other,
}

bitflags! {
    /// Modifier keys held during a key press.
    ///
    /// Shift is deliberately absent: it is folded into the character.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const ALT       = 0b0001;
        const ALT_GRAPH = 0b0010;
        const CTRL      = 0b0100;
        const META      = 0b1000;
    }
}

/// One key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A key press without modifiers.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    pub fn char(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), Modifiers::CTRL)
    }

    pub fn enter() -> Self {
        Self::plain(Key::Enter)
    }

    pub fn backspace() -> Self {
        Self::plain(Key::Backspace)
    }
}

/// What the controller does with a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    Erase,
    ClearScreen,
    Insert(char),
    Ignore,
}

/// Classify a key event.
///
/// Enter and Backspace win regardless of modifiers. Ctrl-L clears the
/// screen. A character is inserted only when no modifier is held at all.
pub fn classify(event: &KeyEvent) -> KeyAction {
    match event.key {
        Key::Enter => KeyAction::Submit,
        Key::Backspace => KeyAction::Erase,
        Key::Char('l' | 'L') if event.modifiers.contains(Modifiers::CTRL) => {
            KeyAction::ClearScreen
        }
        Key::Char(c) if event.modifiers.is_empty() && !c.is_control() => KeyAction::Insert(c),
        Key::Char(_) | Key::Other => KeyAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_and_backspace_ignore_modifiers() {
        let ctrl_enter = KeyEvent::new(Key::Enter, Modifiers::CTRL);
        let alt_backspace = KeyEvent::new(Key::Backspace, Modifiers::ALT);
        assert_eq!(classify(&ctrl_enter), KeyAction::Submit);
        assert_eq!(classify(&alt_backspace), KeyAction::Erase);
    }

    #[test]
    fn ctrl_l_clears_in_either_case() {
        assert_eq!(classify(&KeyEvent::ctrl('l')), KeyAction::ClearScreen);
        assert_eq!(classify(&KeyEvent::ctrl('L')), KeyAction::ClearScreen);
        let ctrl_alt_l = KeyEvent::new(Key::Char('l'), Modifiers::CTRL | Modifiers::ALT);
        assert_eq!(classify(&ctrl_alt_l), KeyAction::ClearScreen);
    }

    #[test]
    fn plain_characters_are_inserted() {
        assert_eq!(classify(&KeyEvent::char('a')), KeyAction::Insert('a'));
        assert_eq!(classify(&KeyEvent::char('Z')), KeyAction::Insert('Z'));
        assert_eq!(classify(&KeyEvent::char(' ')), KeyAction::Insert(' '));
        assert_eq!(classify(&KeyEvent::char('λ')), KeyAction::Insert('λ'));
    }

    #[test]
    fn any_modifier_suppresses_insertion() {
        for modifiers in [
            Modifiers::ALT,
            Modifiers::ALT_GRAPH,
            Modifiers::CTRL,
            Modifiers::META,
        ] {
            let event = KeyEvent::new(Key::Char('x'), modifiers);
            assert_eq!(classify(&event), KeyAction::Ignore, "{modifiers:?}");
        }
    }

    #[test]
    fn keys_without_characters_are_ignored() {
        assert_eq!(classify(&KeyEvent::plain(Key::Other)), KeyAction::Ignore);
        assert_eq!(classify(&KeyEvent::char('\t')), KeyAction::Ignore);
        assert_eq!(classify(&KeyEvent::char('\u{1b}')), KeyAction::Ignore);
    }
}
