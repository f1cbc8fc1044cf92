//! imeswitch-core
//!
//! Context-aware input method switching for code editors. Given a document
//! and a cursor offset, the core decides what the user is typing (code,
//! comment, string, commit message, ...) and asks a platform switcher to
//! select the Latin or the native input method accordingly.
//!
//! Public API:
//! - `classify` - Context classification at a cursor offset
//! - `RuleEngine` - User regex overrides with a compiled-pattern cache
//! - `TransitionController` - Per-editor debounce and suppression state machine
//! - `AutoSwitch` - Facade wiring sessions, settings, switcher and notifier
//! - `Config` - TOML-backed settings
//! - `Document` / `SourceBuffer` - Host document seam and a self-contained buffer

pub mod model;
pub use model::{ContextKind, CustomRule, InputLanguage, InputMethodKind, Rgb, SceneKind};

pub mod syntax;
pub use syntax::SyntaxFamily;

pub mod document;
pub use document::{Document, NodeClass, NodeKind, SyntaxNode, ToolWindow};

pub mod buffer;
pub use buffer::{is_commit_message_path, scan_regions, SourceBuffer};

pub mod classifier;
pub use classifier::{classify, line_comment_at};

pub mod rules;
pub use rules::RuleEngine;

pub mod config;
pub use config::{Config, CursorColors, SceneToggles, SwitchSettings};

pub mod switcher;
pub use switcher::{InputMethodSwitcher, LogNotifier, Notifier, SilentNotifier};

pub mod controller;
pub use controller::{
    Collaborators, CursorEvent, Observation, SessionState, Transition, TransitionController,
    DEBOUNCE_WINDOW,
};

pub mod session;
pub use session::{AutoSwitch, EditorId, SessionRegistry};
