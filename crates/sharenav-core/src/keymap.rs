//! Keyboard command dispatch.
//!
//! A keymap is an ordered list of commands. Resolution is a linear scan:
//! the first enabled command whose key and modifiers match wins. Commands
//! are suppressed while a text input has focus unless they opt in.

/// Modifier keys held during a key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
}

/// One key press as seen by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInput {
    /// `KeyboardEvent.key` value, e.g. `"ArrowDown"` or `"j"`.
    pub key: String,
    pub modifiers: Modifiers,
    /// Focus is inside an editable text control.
    pub in_text_input: bool,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
            in_text_input: false,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.in_text_input = true;
        self
    }
}

/// A bindable command.
pub struct KeyCommand<A, C> {
    pub id: &'static str,
    pub keys: Vec<&'static str>,
    /// Must match exactly; a modifier not listed must not be held.
    pub modifiers: Modifiers,
    pub enabled: fn(&C) -> bool,
    pub allow_in_input: bool,
    pub action: A,
}

impl<A, C> KeyCommand<A, C> {
    pub fn new(id: &'static str, keys: &[&'static str], action: A) -> Self {
        Self {
            id,
            keys: keys.to_vec(),
            modifiers: Modifiers::NONE,
            enabled: |_| true,
            allow_in_input: false,
            action,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn when(mut self, enabled: fn(&C) -> bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn allow_in_input(mut self) -> Self {
        self.allow_in_input = true;
        self
    }

    fn matches(&self, input: &KeyInput, context: &C) -> bool {
        if input.in_text_input && !self.allow_in_input {
            return false;
        }
        self.modifiers == input.modifiers
            && self.keys.iter().any(|k| *k == input.key)
            && (self.enabled)(context)
    }
}

/// Whether a key press was consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A command ran; the caller should prevent the browser default.
    Handled,
    Ignored,
}

/// Ordered command list.
pub struct Keymap<A, C> {
    commands: Vec<KeyCommand<A, C>>,
}

impl<A, C> Default for Keymap<A, C> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<A, C> Keymap<A, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, command: KeyCommand<A, C>) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[KeyCommand<A, C>] {
        &self.commands
    }

    /// First enabled command matching the input.
    pub fn resolve(&self, input: &KeyInput, context: &C) -> Option<&KeyCommand<A, C>> {
        self.commands.iter().find(|c| c.matches(input, context))
    }

    /// Resolve and run the matched command's action synchronously.
    pub fn dispatch(
        &self,
        input: &KeyInput,
        context: &C,
        mut run: impl FnMut(&A),
    ) -> Dispatch {
        match self.resolve(input, context) {
            Some(command) => {
                log::debug!("key {:?} -> {}", input.key, command.id);
                run(&command.action);
                Dispatch::Handled
            }
            None => Dispatch::Ignored,
        }
    }
}

// =============================================================================
// Explorer Bindings
// =============================================================================

/// Actions bound by the default explorer keymap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorerCommand {
    GoUp,
    OpenSelected,
    SelectNext,
    SelectPrevious,
    NextPreview,
    PreviousPreview,
    ClosePreview,
    Refresh,
}

/// State the default bindings depend on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExplorerKeyContext {
    pub previewing: bool,
    pub has_selection: bool,
    pub at_root: bool,
}

type ExplorerKey = KeyCommand<ExplorerCommand, ExplorerKeyContext>;

impl Keymap<ExplorerCommand, ExplorerKeyContext> {
    /// Default explorer bindings. Preview stepping comes first so the arrow
    /// keys page through the gallery while a preview is open.
    pub fn explorer_default() -> Self {
        use ExplorerCommand::*;

        Self::new()
            .bind(
                ExplorerKey::new("preview.next", &["ArrowRight"], NextPreview)
                    .when(|c| c.previewing),
            )
            .bind(
                ExplorerKey::new("preview.previous", &["ArrowLeft"], PreviousPreview)
                    .when(|c| c.previewing),
            )
            .bind(
                ExplorerKey::new("preview.close", &["Escape"], ClosePreview)
                    .when(|c| c.previewing),
            )
            .bind(
                ExplorerKey::new("nav.up", &["Backspace", "ArrowLeft"], GoUp)
                    .when(|c| !c.previewing && !c.at_root),
            )
            .bind(
                ExplorerKey::new("nav.open", &["Enter", "ArrowRight"], OpenSelected)
                    .when(|c| !c.previewing && c.has_selection),
            )
            .bind(
                ExplorerKey::new("select.next", &["ArrowDown", "j"], SelectNext)
                    .when(|c| !c.previewing),
            )
            .bind(
                ExplorerKey::new("select.previous", &["ArrowUp", "k"], SelectPrevious)
                    .when(|c| !c.previewing),
            )
            .bind(ExplorerKey::new("nav.refresh", &["r", "F5"], Refresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keymap() -> Keymap<ExplorerCommand, ExplorerKeyContext> {
        Keymap::explorer_default()
    }

    fn browsing() -> ExplorerKeyContext {
        ExplorerKeyContext {
            previewing: false,
            has_selection: true,
            at_root: false,
        }
    }

    fn action(input: KeyInput, context: ExplorerKeyContext) -> Option<ExplorerCommand> {
        keymap().resolve(&input, &context).map(|c| c.action)
    }

    #[test]
    fn test_arrows_depend_on_preview() {
        let previewing = ExplorerKeyContext {
            previewing: true,
            ..browsing()
        };
        assert_eq!(
            action(KeyInput::new("ArrowRight"), previewing),
            Some(ExplorerCommand::NextPreview)
        );
        assert_eq!(
            action(KeyInput::new("ArrowRight"), browsing()),
            Some(ExplorerCommand::OpenSelected)
        );
        assert_eq!(
            action(KeyInput::new("ArrowLeft"), browsing()),
            Some(ExplorerCommand::GoUp)
        );
    }

    #[test]
    fn test_text_input_blocks_commands() {
        assert_eq!(
            action(KeyInput::new("Backspace").in_text_input(), browsing()),
            None
        );
        assert_eq!(action(KeyInput::new("j").in_text_input(), browsing()), None);
    }

    #[test]
    fn test_opt_in_command_fires_in_input() {
        let map: Keymap<&str, ()> = Keymap::new().bind(
            KeyCommand::new("search", &["f"], "search")
                .with_modifiers(Modifiers::CTRL)
                .allow_in_input(),
        );
        let input = KeyInput::new("f")
            .with_modifiers(Modifiers::CTRL)
            .in_text_input();
        assert_eq!(map.resolve(&input, &()).map(|c| c.id), Some("search"));
    }

    #[test]
    fn test_modifiers_must_match_exactly() {
        let ctrl_r = KeyInput::new("r").with_modifiers(Modifiers::CTRL);
        assert_eq!(action(ctrl_r, browsing()), None);
        assert_eq!(
            action(KeyInput::new("r"), browsing()),
            Some(ExplorerCommand::Refresh)
        );
    }

    #[test]
    fn test_disabled_commands_are_skipped() {
        let at_root = ExplorerKeyContext {
            at_root: true,
            has_selection: false,
            ..browsing()
        };
        assert_eq!(action(KeyInput::new("Backspace"), at_root), None);
        assert_eq!(action(KeyInput::new("Enter"), at_root), None);
        assert_eq!(action(KeyInput::new("Escape"), browsing()), None);
    }

    #[test]
    fn test_dispatch_runs_handler() {
        let mut ran = Vec::new();
        let result = keymap().dispatch(&KeyInput::new("j"), &browsing(), |a| ran.push(*a));
        assert_eq!(result, Dispatch::Handled);
        assert_eq!(ran, vec![ExplorerCommand::SelectNext]);

        let result = keymap().dispatch(&KeyInput::new("x"), &browsing(), |a| ran.push(*a));
        assert_eq!(result, Dispatch::Ignored);
        assert_eq!(ran.len(), 1);
    }
}
