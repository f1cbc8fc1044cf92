//! Editor session management.
//!
//! `SessionRegistry` maps open editors to their `TransitionController`.
//! `AutoSwitch` wires the registry to the settings, rule engine, input method
//! switcher and notifier so that hosts only have to forward three lifecycle
//! events: editor opened, editor closed, cursor moved.

use crate::config::SwitchSettings;
use crate::controller::{Collaborators, CursorEvent, SessionState, Transition, TransitionController};
use crate::document::Document;
use crate::model::Rgb;
use crate::rules::RuleEngine;
use crate::switcher::{InputMethodSwitcher, Notifier};
use std::collections::HashMap;

/// Opaque host identifier of an editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditorId(pub u64);

/// Controllers for every open editor.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<EditorId, TransitionController>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session. Re-opening an editor resets its state.
    pub fn open(&mut self, id: EditorId) {
        self.sessions.entry(id).or_default().reset();
    }

    /// Discard a session. Returns whether one existed.
    pub fn close(&mut self, id: EditorId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Controller for `id`, created on demand for editors the host never
    /// announced.
    ///
    /// A late event for an already closed editor therefore opens a new slot,
    /// which lives until the host closes that editor again.
    pub fn controller_mut(&mut self, id: EditorId) -> &mut TransitionController {
        self.sessions.entry(id).or_default()
    }

    pub fn state(&self, id: EditorId) -> Option<&SessionState> {
        self.sessions.get(&id).map(TransitionController::state)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Automatic input method switching for a set of editors.
///
/// All calls are expected on the host's event thread.
pub struct AutoSwitch<S, W, N> {
    settings: S,
    switcher: W,
    notifier: N,
    rules: RuleEngine,
    sessions: SessionRegistry,
}

impl<S, W, N> AutoSwitch<S, W, N>
where
    S: SwitchSettings,
    W: InputMethodSwitcher,
    N: Notifier,
{
    pub fn new(settings: S, switcher: W, notifier: N) -> Self {
        Self {
            settings,
            switcher,
            notifier,
            rules: RuleEngine::new(),
            sessions: SessionRegistry::new(),
        }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Mutable settings. Rule edits take effect on the next event.
    pub fn settings_mut(&mut self) -> &mut S {
        &mut self.settings
    }

    pub fn switcher(&self) -> &W {
        &self.switcher
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn editor_opened(&mut self, id: EditorId) {
        tracing::debug!(editor = id.0, "editor session opened");
        self.sessions.open(id);
    }

    pub fn editor_closed(&mut self, id: EditorId) -> bool {
        tracing::debug!(editor = id.0, "editor session closed");
        self.sessions.close(id)
    }

    /// Forward a cursor movement in editor `id`. Unknown ids, including
    /// closed ones, get a fresh session; pair it with `editor_closed`.
    pub fn cursor_moved<D: Document + ?Sized>(
        &mut self,
        id: EditorId,
        doc: &D,
        event: CursorEvent,
    ) -> Transition {
        let env = Collaborators {
            settings: &self.settings,
            rules: &self.rules,
            switcher: &self.switcher,
            notifier: &self.notifier,
        };
        self.sessions.controller_mut(id).handle(doc, event, &env)
    }

    /// Cursor colour for the currently active input method.
    pub fn cursor_color(&self) -> Option<Rgb> {
        self.settings.cursor_color(self.switcher.current_method())
    }
}
