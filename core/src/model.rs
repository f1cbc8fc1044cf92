//! Value types shared by the classifier, rule engine and controller.
//!
//! Everything here is a plain value: `ContextKind` is produced fresh on every
//! classification, `SceneKind` names a configurable switching scope, and
//! `CustomRule` is user data owned by the configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lexical context of the cursor as decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// Plain code
    CodeDefault,
    /// Inside (or after the marker of) a line comment
    CommentLine,
    /// Inside a block comment
    CommentBlock,
    /// Inside a string or other literal value
    StringLiteral,
    /// Commit message editor
    CommitMessage,
    /// Terminal tool window
    ToolWindowTerminal,
    /// Project tree tool window
    ToolWindowProject,
}

impl ContextKind {
    /// The configurable scene this context belongs to.
    pub fn scene(self) -> SceneKind {
        match self {
            ContextKind::CodeDefault => SceneKind::Default,
            ContextKind::CommentLine | ContextKind::CommentBlock => SceneKind::Comment,
            ContextKind::StringLiteral => SceneKind::StringLiteral,
            ContextKind::CommitMessage => SceneKind::GitCommit,
            ContextKind::ToolWindowTerminal | ContextKind::ToolWindowProject => {
                SceneKind::ToolWindow
            }
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextKind::CodeDefault => "code",
            ContextKind::CommentLine => "line comment",
            ContextKind::CommentBlock => "block comment",
            ContextKind::StringLiteral => "string literal",
            ContextKind::CommitMessage => "commit message",
            ContextKind::ToolWindowTerminal => "terminal",
            ContextKind::ToolWindowProject => "project view",
        };
        f.pad(name)
    }
}

/// Configurable switching scope.
///
/// Several `ContextKind`s map onto one scene (both comment kinds are
/// `Comment`). `VimNormal` and `VimInsert` have no classifier counterpart;
/// they exist so hosts with modal editing can store a policy for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Default,
    Comment,
    StringLiteral,
    GitCommit,
    ToolWindow,
    VimNormal,
    VimInsert,
}

impl SceneKind {
    /// All scenes in display order.
    pub const ALL: [SceneKind; 7] = [
        SceneKind::Default,
        SceneKind::Comment,
        SceneKind::StringLiteral,
        SceneKind::GitCommit,
        SceneKind::ToolWindow,
        SceneKind::VimNormal,
        SceneKind::VimInsert,
    ];

    /// Input method a scene switches to when no custom rule overrides it.
    ///
    /// Prose scenes (comments, commit messages, vim insert) go native,
    /// everything where code or identifiers are typed goes Latin.
    pub fn default_method(self) -> InputMethodKind {
        match self {
            SceneKind::Comment | SceneKind::GitCommit | SceneKind::VimInsert => {
                InputMethodKind::Native
            }
            SceneKind::Default
            | SceneKind::StringLiteral
            | SceneKind::ToolWindow
            | SceneKind::VimNormal => InputMethodKind::Latin,
        }
    }

    /// Short human label used in feedback hints.
    pub fn label(self) -> &'static str {
        match self {
            SceneKind::Default => "Code",
            SceneKind::Comment => "Comment",
            SceneKind::StringLiteral => "String",
            SceneKind::GitCommit => "Commit",
            SceneKind::ToolWindow => "Tool window",
            SceneKind::VimNormal => "Vim normal",
            SceneKind::VimInsert => "Vim insert",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The two input method classes the switcher distinguishes.
///
/// Rule files written against the older language-based names
/// (`ENGLISH`, `CHINESE`, ...) still deserialize through the aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMethodKind {
    #[serde(alias = "ENGLISH", alias = "english")]
    Latin,
    #[serde(
        alias = "CHINESE",
        alias = "JAPANESE",
        alias = "KOREAN",
        alias = "chinese",
        alias = "japanese",
        alias = "korean"
    )]
    Native,
}

impl InputMethodKind {
    pub fn label(self) -> &'static str {
        match self {
            InputMethodKind::Latin => "Latin",
            InputMethodKind::Native => "Native",
        }
    }
}

impl Default for InputMethodKind {
    fn default() -> Self {
        Self::Latin
    }
}

impl fmt::Display for InputMethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Language names surfaced in configuration displays.
///
/// Only the coarse `InputMethodKind` is acted on; per-locale switching
/// (Japanese vs. Korean vs. Chinese) is not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputLanguage {
    English,
    Chinese,
    Japanese,
    Korean,
}

impl InputLanguage {
    pub const ALL: [InputLanguage; 4] = [
        InputLanguage::English,
        InputLanguage::Chinese,
        InputLanguage::Japanese,
        InputLanguage::Korean,
    ];

    pub fn kind(self) -> InputMethodKind {
        match self {
            InputLanguage::English => InputMethodKind::Latin,
            InputLanguage::Chinese | InputLanguage::Japanese | InputLanguage::Korean => {
                InputMethodKind::Native
            }
        }
    }
}

impl fmt::Display for InputLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputLanguage::English => "English",
            InputLanguage::Chinese => "Chinese",
            InputLanguage::Japanese => "Japanese",
            InputLanguage::Korean => "Korean",
        };
        f.pad(name)
    }
}

/// A user-defined override rule.
///
/// When `pattern` is found anywhere in the text around the cursor, the
/// switcher targets `target` instead of the scene default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomRule {
    /// Unique rule id
    pub id: String,
    /// Display name
    pub name: String,
    /// Regular expression searched (not full-matched) in the text
    pub pattern: String,
    /// Input method to switch to on match
    #[serde(alias = "target_input_method")]
    pub target: InputMethodKind,
    pub enabled: bool,
    /// Higher value wins
    pub priority: i32,
}

impl Default for CustomRule {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            pattern: String::new(),
            target: InputMethodKind::Latin,
            enabled: true,
            priority: 0,
        }
    }
}

impl CustomRule {
    /// Create an enabled rule with priority 0.
    pub fn new(id: &str, pattern: &str, target: InputMethodKind) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            pattern: pattern.to_string(),
            target,
            ..Self::default()
        }
    }

    /// Builder-style priority setter.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder-style enabled setter.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// An sRGB colour, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid colour '{}', expected #RRGGBB", value))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
