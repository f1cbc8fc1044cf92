//! Syntax families: the static comment/string vocabulary of a language.
//!
//! The classifier never parses a language. It only needs to know which
//! markers open a line comment, which delimiters enclose a block comment and
//! which characters quote a string. Languages sharing that vocabulary share a
//! family.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Comment/string vocabulary shared by a group of languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxFamily {
    /// `//` and `/* */` (C, Java, Kotlin, Rust, Go, JS, ...)
    CStyle,
    /// `#` (Python, shell, Ruby, YAML, TOML, ...)
    Hash,
    /// `--` and `/* */` (SQL, Lua, Haskell)
    DoubleDash,
    /// `;` (Lisps, INI, assembly)
    Semicolon,
    /// `<!-- -->` (HTML, XML)
    Markup,
    /// No comment syntax at all
    PlainText,
}

impl Default for SyntaxFamily {
    fn default() -> Self {
        Self::PlainText
    }
}

static LANGUAGE_FAMILIES: Lazy<HashMap<&'static str, SyntaxFamily>> = Lazy::new(|| {
    use SyntaxFamily::*;
    let mut m = HashMap::new();
    for id in [
        "c", "h", "cc", "cpp", "cxx", "hpp", "java", "kt", "kts", "kotlin", "rs", "rust",
        "go", "js", "jsx", "mjs", "ts", "tsx", "javascript", "typescript", "cs", "csharp",
        "swift", "scala", "dart", "groovy", "gradle", "php", "proto", "m", "mm", "zig",
        "json5", "jsonc",
    ] {
        m.insert(id, CStyle);
    }
    for id in [
        "py", "python", "sh", "bash", "zsh", "fish", "rb", "ruby", "pl", "perl", "r",
        "yaml", "yml", "toml", "cmake", "dockerfile", "makefile", "mk", "nim", "ex", "exs",
        "elixir", "ps1", "conf", "properties", "tcl",
    ] {
        m.insert(id, Hash);
    }
    for id in ["sql", "lua", "hs", "haskell", "elm", "ada", "adb", "vhdl"] {
        m.insert(id, DoubleDash);
    }
    for id in ["lisp", "el", "clj", "cljs", "scm", "rkt", "asm", "s", "ini"] {
        m.insert(id, Semicolon);
    }
    for id in ["html", "htm", "xml", "xhtml", "svg", "vue", "md", "markdown"] {
        m.insert(id, Markup);
    }
    m
});

impl SyntaxFamily {
    /// Look up a family by language id or file extension (case-insensitive).
    pub fn from_language(id: &str) -> Self {
        let id = id.trim().trim_start_matches('.').to_ascii_lowercase();
        LANGUAGE_FAMILIES
            .get(id.as_str())
            .copied()
            .unwrap_or(SyntaxFamily::PlainText)
    }

    /// Guess a family from a file path, using the extension or, for
    /// extensionless build files, the file name.
    pub fn for_path(path: &Path) -> Self {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            return Self::from_language(ext);
        }
        path.file_name()
            .and_then(|n| n.to_str())
            .map(Self::from_language)
            .unwrap_or(SyntaxFamily::PlainText)
    }

    /// Markers that start a comment running to the end of the line.
    pub fn line_comment_markers(self) -> &'static [&'static str] {
        match self {
            SyntaxFamily::CStyle => &["//"],
            SyntaxFamily::Hash => &["#"],
            SyntaxFamily::DoubleDash => &["--"],
            SyntaxFamily::Semicolon => &[";"],
            SyntaxFamily::Markup | SyntaxFamily::PlainText => &[],
        }
    }

    /// Opening and closing delimiters of a block comment, if the family has one.
    pub fn block_comment(self) -> Option<(&'static str, &'static str)> {
        match self {
            SyntaxFamily::CStyle | SyntaxFamily::DoubleDash => Some(("/*", "*/")),
            SyntaxFamily::Markup => Some(("<!--", "-->")),
            SyntaxFamily::Hash | SyntaxFamily::Semicolon | SyntaxFamily::PlainText => None,
        }
    }

    /// Characters that open (and close) a string literal.
    ///
    /// `'` is left out for the C family: it doubles as the Rust lifetime sigil
    /// and a lone one would swallow the rest of the line.
    pub fn string_quotes(self) -> &'static [char] {
        match self {
            SyntaxFamily::CStyle => &['"', '`'],
            SyntaxFamily::Hash | SyntaxFamily::DoubleDash => &['"', '\''],
            SyntaxFamily::Semicolon => &['"'],
            SyntaxFamily::Markup | SyntaxFamily::PlainText => &[],
        }
    }

    /// Find the earliest line-comment marker in `line`, as a byte index.
    pub fn find_line_comment(self, line: &str) -> Option<usize> {
        self.line_comment_markers()
            .iter()
            .filter_map(|marker| line.find(marker))
            .min()
    }
}
