//! Replays cursor positions through the switching facade.
//!
//! By default a dry-run switcher stands in for the OS input method so that
//! rules and scenes can be tried out without touching the keyboard state.

use imeswitch_core::{
    AutoSwitch, Config, ContextKind, CursorEvent, Document, EditorId, InputMethodKind,
    InputMethodSwitcher, LogNotifier, Notifier, SourceBuffer, Transition,
};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// Switcher that only tracks which method would be active.
#[derive(Debug, Default)]
pub struct DryRunSwitcher {
    native: Cell<bool>,
}

impl DryRunSwitcher {
    pub fn starting_with(method: InputMethodKind) -> Self {
        Self {
            native: Cell::new(method == InputMethodKind::Native),
        }
    }
}

impl InputMethodSwitcher for DryRunSwitcher {
    fn switch_to_latin(&self) -> bool {
        self.native.replace(false)
    }

    fn switch_to_native(&self) -> bool {
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

/// One replayed event.
#[derive(Debug, Serialize)]
pub struct ReplayStep {
    pub offset: usize,
    pub line: usize,
    pub outcome: &'static str,
    pub context: Option<ContextKind>,
    pub target: Option<InputMethodKind>,
    pub active: InputMethodKind,
    pub hint: Option<String>,
}

fn outcome_parts(t: &Transition) -> (&'static str, Option<ContextKind>, Option<InputMethodKind>) {
    match *t {
        Transition::Debounced => ("debounced", None, None),
        Transition::Paused => ("paused", None, None),
        Transition::Unchanged => ("unchanged", None, None),
        Transition::ParserLag => ("parser_lag", None, None),
        Transition::SceneDisabled { context, .. } => ("scene_disabled", Some(context), None),
        Transition::AlreadyActive { context, target } => ("already_active", Some(context), Some(target)),
        Transition::Switched { context, target } => ("switched", Some(context), Some(target)),
    }
}

/// Feed `offsets` into a fresh session, `interval` apart.
pub fn replay<W: InputMethodSwitcher>(
    config: Config,
    switcher: W,
    doc: &SourceBuffer,
    offsets: &[usize],
    interval: Duration,
) -> Vec<ReplayStep> {
    let last_hint: RefCell<Option<String>> = RefCell::new(None);
    let notifier = |text: &str| {
        LogNotifier.notify(text);
        *last_hint.borrow_mut() = Some(text.to_string());
    };
    let mut auto = AutoSwitch::new(config, switcher, notifier);

    let id = EditorId(0);
    auto.editor_opened(id);

    let mut at = Instant::now();
    let mut steps = Vec::with_capacity(offsets.len());
    for (i, &offset) in offsets.iter().enumerate() {
        if i > 0 {
            at += interval;
        }
        let transition = auto.cursor_moved(id, doc, CursorEvent::new(offset, at));
        let (outcome, context, target) = outcome_parts(&transition);
        steps.push(ReplayStep {
            offset,
            line: doc.line_number(offset.min(doc.len())),
            outcome,
            context,
            target,
            active: auto.switcher().current_method(),
            hint: last_hint.borrow_mut().take(),
        });
    }
    auto.editor_closed(id);
    steps
}
