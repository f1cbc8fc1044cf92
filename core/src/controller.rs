//! Per-editor transition controller.
//!
//! One `TransitionController` lives per open editor and owns that editor's
//! `SessionState`. On every cursor event it decides whether an input method
//! switch should fire:
//!
//! 1. **debounce**: events closer than `DEBOUNCE_WINDOW` to the previous
//!    admitted event are dropped without touching state;
//! 2. **same line**: an unchanged context on the same line is dropped, and
//!    a `CommentLine → CodeDefault` flip on the same line is dropped while the
//!    line text still shows a comment marker (the tree lagging behind typing);
//! 3. **change**: otherwise the line is recorded and, if the context kind
//!    differs from the last one, it is recorded too and dispatched;
//! 4. **dispatch**: scene lookup, rule override, switch, and feedback only
//!    when a real transition happened.
//!
//! State is updated even when the scene is disabled. Repeats are never
//! dispatched, so a manual input method change inside a comment stands until
//! the context changes.

use crate::classifier::{classify, line_comment_at};
use crate::config::SwitchSettings;
use crate::document::Document;
use crate::model::{ContextKind, InputMethodKind, SceneKind};
use crate::rules::RuleEngine;
use crate::switcher::{InputMethodSwitcher, Notifier};
use std::time::{Duration, Instant};

/// Minimum spacing between two processed cursor events.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// A cursor movement reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorEvent {
    /// Byte offset of the caret
    pub offset: usize,
    /// When the host observed the movement
    pub at: Instant,
}

impl CursorEvent {
    pub fn new(offset: usize, at: Instant) -> Self {
        Self { offset, at }
    }

    /// An event observed now.
    pub fn now(offset: usize) -> Self {
        Self::new(offset, Instant::now())
    }
}

/// What the controller remembers between events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub last_context: Option<ContextKind>,
    /// `None` until the first processed event
    pub last_line: Option<usize>,
    pub last_event: Option<Instant>,
}

/// Outcome of one cursor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Inside the debounce window
    Debounced,
    /// Automatic switching is globally off
    Paused,
    /// Context kind did not change
    Unchanged,
    /// Same-line comment→code flip ignored as parser lag
    ParserLag,
    /// Context changed but its scene is disabled
    SceneDisabled {
        context: ContextKind,
        scene: SceneKind,
    },
    /// Dispatcher reported no transition (already there, or it failed)
    AlreadyActive {
        context: ContextKind,
        target: InputMethodKind,
    },
    /// The input method was switched
    Switched {
        context: ContextKind,
        target: InputMethodKind,
    },
}

impl Transition {
    /// Whether the event reached the dispatcher.
    pub fn dispatched(&self) -> bool {
        matches!(
            self,
            Transition::AlreadyActive { .. } | Transition::Switched { .. }
        )
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, Transition::Switched { .. })
    }
}

/// Result of feeding a classified position into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The context changed to this kind; dispatch it
    Changed(ContextKind),
    /// Nothing to do, for the given reason
    Suppressed(Transition),
}

/// Collaborators a controller needs to dispatch a switch.
///
/// Borrowed per event so that sessions never own shared services.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub settings: &'a dyn SwitchSettings,
    pub rules: &'a RuleEngine,
    pub switcher: &'a dyn InputMethodSwitcher,
    pub notifier: &'a dyn Notifier,
}

/// State machine for a single editor session.
#[derive(Debug, Clone, Default)]
pub struct TransitionController {
    state: SessionState,
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Forget everything, as if the session had just been opened.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    /// Debounce gate. Returns `false` (leaving state untouched) when `now`
    /// is within `DEBOUNCE_WINDOW` of the last admitted event.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let Some(last) = self.state.last_event {
            if now.saturating_duration_since(last) < DEBOUNCE_WINDOW {
                return false;
            }
        }
        self.state.last_event = Some(now);
        true
    }

    /// Apply the same-line and repeat suppression rules to a classified
    /// position. `still_comment` is consulted only for the rollback guard.
    pub fn observe(
        &mut self,
        line: usize,
        kind: ContextKind,
        still_comment: impl FnOnce() -> bool,
    ) -> Observation {
        let last = self.state.last_context;

        if self.state.last_line == Some(line) {
            if last == Some(kind) {
                return Observation::Suppressed(Transition::Unchanged);
            }
            if last == Some(ContextKind::CommentLine)
                && kind == ContextKind::CodeDefault
                && still_comment()
            {
                return Observation::Suppressed(Transition::ParserLag);
            }
        }

        self.state.last_line = Some(line);
        if last == Some(kind) {
            return Observation::Suppressed(Transition::Unchanged);
        }
        self.state.last_context = Some(kind);
        Observation::Changed(kind)
    }

    /// Process one cursor event end to end.
    pub fn handle<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        event: CursorEvent,
        env: &Collaborators<'_>,
    ) -> Transition {
        if !self.admit(event.at) {
            tracing::trace!(offset = event.offset, "cursor event debounced");
            return Transition::Debounced;
        }
        if !env.settings.is_enabled() {
            return Transition::Paused;
        }

        let offset = event.offset.min(doc.len());
        let kind = classify(doc, offset);
        let line = doc.line_number(offset);

        match self.observe(line, kind, || line_comment_at(doc, offset)) {
            Observation::Suppressed(reason) => {
                tracing::trace!(line, context = %kind, ?reason, "cursor event suppressed");
                reason
            }
            Observation::Changed(kind) => dispatch(doc, offset, kind, env),
        }
    }
}

fn dispatch<D: Document + ?Sized>(
    doc: &D,
    offset: usize,
    context: ContextKind,
    env: &Collaborators<'_>,
) -> Transition {
    let scene = context.scene();
    if !env.settings.scene_enabled(scene) {
        tracing::debug!(%context, %scene, "scene disabled, not switching");
        return Transition::SceneDisabled { context, scene };
    }

    let line_text = doc.text_in_range(doc.line_start(offset), doc.line_end(offset));
    let target = env
        .rules
        .resolve_target(env.settings.custom_rules(), &line_text, scene.default_method());

    if env.switcher.switch_to(target) {
        tracing::debug!(%context, %target, "input method switched");
        env.notifier
            .notify(&format!("{} - {}", scene.label(), target.label()));
        Transition::Switched { context, target }
    } else {
        tracing::debug!(%context, %target, "no input method transition");
        Transition::AlreadyActive { context, target }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SourceBuffer;
    use crate::config::Config;
    use crate::model::CustomRule;
    use crate::syntax::SyntaxFamily;
    use std::cell::{Cell, RefCell};

    /// Switcher that tracks a mode and records every transition it makes.
    #[derive(Default)]
    struct FakeSwitcher {
        native: Cell<bool>,
        calls: RefCell<Vec<InputMethodKind>>,
    }

    impl InputMethodSwitcher for FakeSwitcher {
        fn switch_to_latin(&self) -> bool {
            self.calls.borrow_mut().push(InputMethodKind::Latin);
            self.native.replace(false)
        }

        fn switch_to_native(&self) -> bool {
            self.calls.borrow_mut().push(InputMethodKind::Native);
            !self.native.replace(true)
        }

        fn current_method(&self) -> InputMethodKind {
            if self.native.get() {
                InputMethodKind::Native
            } else {
                InputMethodKind::Latin
            }
        }

        fn is_supported(&self) -> bool {
            true
        }
    }

    struct Harness {
        config: Config,
        rules: RuleEngine,
        switcher: FakeSwitcher,
        hints: RefCell<Vec<String>>,
    }

    impl Harness {
        fn new(config: Config) -> Self {
            Self {
                config,
                rules: RuleEngine::new(),
                switcher: FakeSwitcher::default(),
                hints: RefCell::new(Vec::new()),
            }
        }

        fn run(&self, ctl: &mut TransitionController, doc: &SourceBuffer, offset: usize, at: Instant) -> Transition {
            let notify = |text: &str| self.hints.borrow_mut().push(text.to_string());
            let env = Collaborators {
                settings: &self.config,
                rules: &self.rules,
                switcher: &self.switcher,
                notifier: &notify,
            };
            ctl.handle(doc, CursorEvent::new(offset, at), &env)
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_debounce_drops_close_events() {
        let mut ctl = TransitionController::new();
        let t0 = Instant::now();
        assert!(ctl.admit(t0));
        let before = *ctl.state();
        assert!(!ctl.admit(t0 + ms(49)));
        assert_eq!(*ctl.state(), before);
        assert!(ctl.admit(t0 + ms(50)));
    }

    #[test]
    fn test_same_context_dispatches_once() {
        let mut ctl = TransitionController::new();
        assert_eq!(ctl.observe(0, ContextKind::CodeDefault, || false), Observation::Changed(ContextKind::CodeDefault));
        for line in [0, 0, 1, 2, 2] {
            assert_eq!(
                ctl.observe(line, ContextKind::CodeDefault, || false),
                Observation::Suppressed(Transition::Unchanged)
            );
        }
        assert_eq!(ctl.state().last_line, Some(2));
    }

    #[test]
    fn test_rollback_guard() {
        let mut ctl = TransitionController::new();
        ctl.observe(4, ContextKind::CommentLine, || true);
        let before = *ctl.state();

        let obs = ctl.observe(4, ContextKind::CodeDefault, || true);
        assert_eq!(obs, Observation::Suppressed(Transition::ParserLag));
        assert_eq!(*ctl.state(), before);

        // marker gone: the downgrade goes through
        let obs = ctl.observe(4, ContextKind::CodeDefault, || false);
        assert_eq!(obs, Observation::Changed(ContextKind::CodeDefault));
    }

    #[test]
    fn test_rollback_guard_only_on_same_line() {
        let mut ctl = TransitionController::new();
        ctl.observe(4, ContextKind::CommentLine, || true);
        let obs = ctl.observe(5, ContextKind::CodeDefault, || panic!("not consulted"));
        assert_eq!(obs, Observation::Changed(ContextKind::CodeDefault));
    }

    #[test]
    fn test_empty_buffer_asks_for_latin() {
        let h = Harness::new(Config::default());
        h.switcher.native.set(true);
        let doc = SourceBuffer::new("", SyntaxFamily::CStyle);
        let mut ctl = TransitionController::new();

        let t = h.run(&mut ctl, &doc, 0, Instant::now());
        assert_eq!(
            t,
            Transition::Switched {
                context: ContextKind::CodeDefault,
                target: InputMethodKind::Latin
            }
        );
        assert_eq!(*h.switcher.calls.borrow(), vec![InputMethodKind::Latin]);
        assert_eq!(*h.hints.borrow(), vec!["Code - Latin".to_string()]);
    }

    #[test]
    fn test_no_notification_without_transition() {
        let h = Harness::new(Config::default());
        let doc = SourceBuffer::new("let x = 1;", SyntaxFamily::CStyle);
        let mut ctl = TransitionController::new();

        let t = h.run(&mut ctl, &doc, 3, Instant::now());
        assert_eq!(
            t,
            Transition::AlreadyActive {
                context: ContextKind::CodeDefault,
                target: InputMethodKind::Latin
            }
        );
        assert!(h.hints.borrow().is_empty());
    }

    #[test]
    fn test_disabled_scene_still_updates_state() {
        let mut config = Config::default();
        config.set_scene_enabled(SceneKind::Comment, false);
        let h = Harness::new(config);
        let doc = SourceBuffer::new("// note", SyntaxFamily::CStyle);
        let mut ctl = TransitionController::new();
        let t0 = Instant::now();

        assert_eq!(
            h.run(&mut ctl, &doc, 7, t0),
            Transition::SceneDisabled {
                context: ContextKind::CommentLine,
                scene: SceneKind::Comment
            }
        );
        assert_eq!(ctl.state().last_context, Some(ContextKind::CommentLine));
        assert_eq!(h.run(&mut ctl, &doc, 5, t0 + ms(100)), Transition::Unchanged);
        assert!(h.switcher.calls.borrow().is_empty());
    }

    #[test]
    fn test_paused_config_never_classifies() {
        let mut config = Config::default();
        config.enabled = false;
        let h = Harness::new(config);
        let doc = SourceBuffer::new("// note", SyntaxFamily::CStyle);
        let mut ctl = TransitionController::new();

        assert_eq!(h.run(&mut ctl, &doc, 3, Instant::now()), Transition::Paused);
        assert_eq!(ctl.state().last_context, None);
        assert!(ctl.state().last_event.is_some());
    }

    #[test]
    fn test_rule_overrides_scene_default() {
        let mut config = Config::default();
        config.upsert_rule(CustomRule::new("sql", r"\bSELECT\b", InputMethodKind::Latin));
        let h = Harness::new(config);
        let doc = SourceBuffer::new("// SELECT * FROM t", SyntaxFamily::CStyle);
        let mut ctl = TransitionController::new();

        let t = h.run(&mut ctl, &doc, 10, Instant::now());
        assert_eq!(
            t,
            Transition::AlreadyActive {
                context: ContextKind::CommentLine,
                target: InputMethodKind::Latin
            }
        );
        assert_eq!(*h.switcher.calls.borrow(), vec![InputMethodKind::Latin]);
    }
}
