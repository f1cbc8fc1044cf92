// core/tests/switching_pipeline.rs
//
// End-to-end switching through the public API: buffer edits, the
// classifier, the transition controller and the facade.
//
// Tests cover:
// - Typing a comment on a line the syntax tree has not caught up with
// - Parser lag after the tree catches up partially
// - Commit message buffers
// - Custom rules overriding scene defaults
// - Notifications only for real transitions

use imeswitch_core::{
    classify, AutoSwitch, Config, ContextKind, CursorEvent, CustomRule, Document, EditorId,
    InputMethodKind, InputMethodSwitcher, NodeKind, SceneKind, SourceBuffer, SyntaxFamily, Transition,
};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

// Switcher with an observable mode
#[derive(Default)]
struct RecordingSwitcher {
    native: Cell<bool>,
    requests: RefCell<Vec<InputMethodKind>>,
}

impl InputMethodSwitcher for RecordingSwitcher {
    fn switch_to_latin(&self) -> bool {
        self.requests.borrow_mut().push(InputMethodKind::Latin);
        self.native.replace(false)
    }

    fn switch_to_native(&self) -> bool {
        self.requests.borrow_mut().push(InputMethodKind::Native);
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

type Hints = Rc<RefCell<Vec<String>>>;

fn setup(config: Config) -> (AutoSwitch<Config, RecordingSwitcher, impl Fn(&str)>, Hints) {
    let hints: Hints = Rc::new(RefCell::new(Vec::new()));
    let sink = hints.clone();
    let notifier = move |text: &str| sink.borrow_mut().push(text.to_string());
    (AutoSwitch::new(config, RecordingSwitcher::default(), notifier), hints)
}

/// Events spaced well outside the debounce window.
struct Clock {
    now: Instant,
}

impl Clock {
    fn new() -> Self {
        Self { now: Instant::now() }
    }

    fn tick(&mut self) -> Instant {
        self.now += Duration::from_millis(100);
        self.now
    }
}

#[test]
fn stale_tree_comment_line_switches_to_native() {
    let mut doc = SourceBuffer::new("fn main() {\n  \n}", SyntaxFamily::CStyle);
    let line_two = "fn main() {\n  ".len();
    // type without reparsing: the tree still sees whitespace here
    let end = doc.insert(line_two, "// start typing chinese comment");
    assert_eq!(doc.node_at(end - 1).map(|n| n.kind), Some(NodeKind::Other));

    assert_eq!(classify(&doc, end), ContextKind::CommentLine);

    let (mut auto, hints) = setup(Config::default());
    let mut clock = Clock::new();
    let id = EditorId(1);
    auto.editor_opened(id);

    let t = auto.cursor_moved(id, &doc, CursorEvent::new(end, clock.tick()));
    assert_eq!(
        t,
        Transition::Switched {
            context: ContextKind::CommentLine,
            target: InputMethodKind::Native
        }
    );
    assert_eq!(*hints.borrow(), vec!["Comment - Native".to_string()]);

    // moving to the next line goes back to code
    let below = doc.text().len();
    let t = auto.cursor_moved(id, &doc, CursorEvent::new(below, clock.tick()));
    assert_eq!(
        t,
        Transition::Switched {
            context: ContextKind::CodeDefault,
            target: InputMethodKind::Latin
        }
    );
    assert_eq!(hints.borrow().len(), 2);
}

#[test]
fn moving_before_marker_on_same_line_returns_to_code() {
    let doc = SourceBuffer::new("x = 1  # 注释", SyntaxFamily::Hash);
    let (mut auto, _hints) = setup(Config::default());
    let mut clock = Clock::new();
    let id = EditorId(3);

    let end = doc.text().len();
    assert!(auto.cursor_moved(id, &doc, CursorEvent::new(end, clock.tick())).is_switch());
    // back before the marker on the same line: a genuine move into code
    let t = auto.cursor_moved(id, &doc, CursorEvent::new(1, clock.tick()));
    assert_eq!(
        t,
        Transition::Switched {
            context: ContextKind::CodeDefault,
            target: InputMethodKind::Latin
        }
    );
}

#[test]
fn commit_message_buffer_uses_native() {
    let doc = SourceBuffer::for_path(Path::new(".git/COMMIT_EDITMSG"), "fix: // not a comment");
    for offset in [0, 5, 100] {
        assert_eq!(classify(&doc, offset), ContextKind::CommitMessage);
    }

    let (mut auto, hints) = setup(Config::default());
    let t = auto.cursor_moved(EditorId(9), &doc, CursorEvent::now(0));
    assert_eq!(
        t,
        Transition::Switched {
            context: ContextKind::CommitMessage,
            target: InputMethodKind::Native
        }
    );
    assert_eq!(*hints.borrow(), vec!["Commit - Native".to_string()]);
}

#[test]
fn rule_keeps_latin_for_code_in_comments() {
    let mut config = Config::default();
    config.upsert_rule(
        CustomRule::new("cmd", r"\$\s*(cargo|git)\b", InputMethodKind::Latin).with_priority(10),
    );
    let doc = SourceBuffer::new("// $ cargo build\n// 构建说明", SyntaxFamily::CStyle);
    let (mut auto, hints) = setup(config);
    let mut clock = Clock::new();
    let id = EditorId(4);

    let t = auto.cursor_moved(id, &doc, CursorEvent::new(8, clock.tick()));
    assert_eq!(
        t,
        Transition::AlreadyActive {
            context: ContextKind::CommentLine,
            target: InputMethodKind::Latin
        }
    );
    assert!(hints.borrow().is_empty());

    // same context kind on the next line is not dispatched again
    let t = auto.cursor_moved(id, &doc, CursorEvent::new(doc.text().len(), clock.tick()));
    assert_eq!(t, Transition::Unchanged);
    assert_eq!(*auto.switcher().requests.borrow(), vec![InputMethodKind::Latin]);
}

#[test]
fn string_scene_is_opt_in() {
    let doc = SourceBuffer::new("let s = \"hello\";", SyntaxFamily::CStyle);

    let (mut auto, _) = setup(Config::default());
    let t = auto.cursor_moved(EditorId(1), &doc, CursorEvent::now(10));
    assert_eq!(
        t,
        Transition::SceneDisabled {
            context: ContextKind::StringLiteral,
            scene: SceneKind::StringLiteral
        }
    );

    let mut config = Config::default();
    config.set_scene_enabled(SceneKind::StringLiteral, true);
    let (mut auto, _) = setup(config);
    let t = auto.cursor_moved(EditorId(1), &doc, CursorEvent::now(10));
    assert_eq!(
        t,
        Transition::AlreadyActive {
            context: ContextKind::StringLiteral,
            target: InputMethodKind::Latin
        }
    );
}

#[test]
fn rapid_events_are_debounced() {
    let doc = SourceBuffer::new("// a\nb", SyntaxFamily::CStyle);
    let (mut auto, _) = setup(Config::default());
    let id = EditorId(2);
    let t0 = Instant::now();

    assert!(auto.cursor_moved(id, &doc, CursorEvent::new(3, t0)).is_switch());
    let t = auto.cursor_moved(id, &doc, CursorEvent::new(6, t0 + Duration::from_millis(10)));
    assert_eq!(t, Transition::Debounced);
    assert_eq!(auto.switcher().current_method(), InputMethodKind::Native);
}
