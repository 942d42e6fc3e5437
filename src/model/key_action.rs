//! Domain-level keyboard actions independent of key bindings.

/// Actions the viewer can perform in response to a key press.
///
/// These represent user intent, not specific keys. The mapping from
/// `crossterm::event::KeyEvent` to `KeyAction` is handled by `KeyBindings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    // Scrolling
    /// Scroll up by one row. Default: k/↑
    ScrollUp,
    /// Scroll down by one row. Default: j/↓
    ScrollDown,
    /// Scroll up by one page height. Default: Ctrl+u/Page Up
    PageUp,
    /// Scroll down by one page height. Default: Ctrl+d/Page Down
    PageDown,
    /// Jump to the oldest record. Default: g/Home
    ScrollToTop,

    // Tail following
    /// Jump to the newest record and stay pinned there. Default: G/End/f
    FollowTail,

    // Buffer
    /// Drop every buffered record. Default: c
    ClearBuffer,

    // Application
    /// Exit the viewer. Default: q/Ctrl+c
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_actions_are_hashable_and_distinct() {
        let all = [
            KeyAction::ScrollUp,
            KeyAction::ScrollDown,
            KeyAction::PageUp,
            KeyAction::PageDown,
            KeyAction::ScrollToTop,
            KeyAction::FollowTail,
            KeyAction::ClearBuffer,
            KeyAction::Quit,
        ];
        let set: HashSet<_> = all.iter().copied().collect();
        assert_eq!(set.len(), all.len());
    }
}
