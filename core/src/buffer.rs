//! In-memory `Document` used by the CLI and by tests.
//!
//! `SourceBuffer` keeps the text, a line index and a flat list of comment and
//! string regions produced by a single left-to-right scan. The regions play
//! the role of the host syntax tree. Like a real editor's tree they are only
//! rebuilt on `reparse()`: `set_text()` and `insert()` update the text but
//! leave the regions describing the previous revision, which is how parser
//! lag looks from the classifier's side.

use crate::document::{Document, NodeClass, NodeKind, SyntaxNode, ToolWindow};
use crate::syntax::SyntaxFamily;
use std::borrow::Cow;
use std::path::Path;

/// File names git opens in the editor for commit-style messages.
const COMMIT_MESSAGE_FILES: &[&str] = &["COMMIT_EDITMSG", "MERGE_MSG", "TAG_EDITMSG"];

/// Whether `path` names a commit-message buffer.
pub fn is_commit_message_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| COMMIT_MESSAGE_FILES.iter().any(|f| name.contains(f)))
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct SourceBuffer {
    text: String,
    /// Byte offset of the first character of each line
    line_starts: Vec<usize>,
    family: SyntaxFamily,
    /// Comment and literal regions from the last reparse, sorted by start
    regions: Vec<SyntaxNode>,
    commit_message: bool,
    tool_window: Option<ToolWindow>,
}

impl SourceBuffer {
    /// Create a buffer and parse it immediately.
    pub fn new(text: impl Into<String>, family: SyntaxFamily) -> Self {
        let text = text.into();
        let line_starts = index_lines(&text);
        let regions = scan_regions(&text, family);
        Self {
            text,
            line_starts,
            family,
            regions,
            commit_message: false,
            tool_window: None,
        }
    }

    /// Create a buffer for a file, deriving the syntax family and the
    /// commit-message flag from its path.
    pub fn for_path(path: &Path, text: impl Into<String>) -> Self {
        let mut buffer = Self::new(text, SyntaxFamily::for_path(path));
        buffer.commit_message = is_commit_message_path(path);
        buffer
    }

    pub fn with_commit_message(mut self, commit_message: bool) -> Self {
        self.commit_message = commit_message;
        self
    }

    pub fn with_tool_window(mut self, tool_window: Option<ToolWindow>) -> Self {
        self.tool_window = tool_window;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Regions known to the (possibly stale) tree.
    pub fn regions(&self) -> &[SyntaxNode] {
        &self.regions
    }

    /// Replace the text without reparsing.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.line_starts = index_lines(&self.text);
    }

    /// Insert `s` at `offset` (clamped to a char boundary) without reparsing.
    /// Returns the offset just past the inserted text.
    pub fn insert(&mut self, offset: usize, s: &str) -> usize {
        let mut at = offset.min(self.text.len());
        while !self.text.is_char_boundary(at) {
            at -= 1;
        }
        self.text.insert_str(at, s);
        self.line_starts = index_lines(&self.text);
        at + s.len()
    }

    /// Rebuild the region tree from the current text.
    pub fn reparse(&mut self) {
        self.regions = scan_regions(&self.text, self.family);
    }

    fn line_index(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    fn region_containing(&self, offset: usize) -> Option<&SyntaxNode> {
        let idx = self.regions.partition_point(|r| r.start <= offset);
        let region = self.regions.get(idx.checked_sub(1)?)?;
        (offset < region.end).then_some(region)
    }
}

impl Document for SourceBuffer {
    fn len(&self) -> usize {
        self.text.len()
    }

    fn line_number(&self, offset: usize) -> usize {
        self.line_index(offset)
    }

    fn line_start(&self, offset: usize) -> usize {
        self.line_starts[self.line_index(offset)]
    }

    fn line_end(&self, offset: usize) -> usize {
        let line = self.line_index(offset);
        match self.line_starts.get(line + 1) {
            Some(&next) => {
                // next - 1 is the '\n'
                let end = next - 1;
                if end > self.line_starts[line] && self.text.as_bytes()[end - 1] == b'\r' {
                    end - 1
                } else {
                    end
                }
            }
            None => self.text.len(),
        }
    }

    fn text_in_range(&self, start: usize, end: usize) -> Cow<'_, str> {
        Cow::Borrowed(self.text.get(start..end).unwrap_or(""))
    }

    fn syntax_family(&self) -> SyntaxFamily {
        self.family
    }

    fn node_at(&self, offset: usize) -> Option<SyntaxNode> {
        if let Some(region) = self.region_containing(offset) {
            return Some(region.clone());
        }
        let ch = self.text.get(offset..)?.chars().next()?;
        let kind = if ch.is_whitespace() {
            NodeKind::Whitespace
        } else {
            NodeKind::Other
        };
        Some(SyntaxNode::new(kind, offset, offset + ch.len_utf8()))
    }

    fn parent_of_kind(&self, node: &SyntaxNode, class: NodeClass) -> Option<SyntaxNode> {
        if node.kind.is_a(class) {
            return Some(node.clone());
        }
        self.region_containing(node.start)
            .filter(|r| r.kind.is_a(class))
            .cloned()
    }

    fn is_commit_message(&self) -> bool {
        self.commit_message
    }

    fn tool_window(&self) -> Option<ToolWindow> {
        self.tool_window
    }
}

fn index_lines(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Scan `text` once, left to right, collecting comment and string regions.
///
/// Block comments may span lines; line comments end before the newline;
/// strings end at the matching unescaped quote or, except for backtick
/// strings, at the end of the line.
pub fn scan_regions(text: &str, family: SyntaxFamily) -> Vec<SyntaxNode> {
    let markers = family.line_comment_markers();
    let block = family.block_comment();
    let quotes = family.string_quotes();
    let mut regions = Vec::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if let Some((open, close)) = block {
            if rest.starts_with(open) {
                let end = rest[open.len()..]
                    .find(close)
                    .map(|p| i + open.len() + p + close.len())
                    .unwrap_or(text.len());
                regions.push(SyntaxNode::new(NodeKind::BlockComment, i, end));
                i = end;
                continue;
            }
        }

        if markers.iter().any(|m| rest.starts_with(m)) {
            let end = i + rest.find('\n').unwrap_or(rest.len());
            let end = if text[..end].ends_with('\r') { end - 1 } else { end };
            regions.push(SyntaxNode::new(NodeKind::LineComment, i, end));
            i = end.max(i + 1);
            continue;
        }

        let Some(ch) = rest.chars().next() else { break };
        if quotes.contains(&ch) {
            let end = string_end(text, i, ch);
            regions.push(SyntaxNode::new(NodeKind::Literal, i, end));
            i = end;
            continue;
        }
        if ch == '\'' && family == SyntaxFamily::CStyle {
            // char literal; anything else (a Rust lifetime) is plain code
            if let Some(len) = char_literal_len(rest) {
                regions.push(SyntaxNode::new(NodeKind::Literal, i, i + len));
                i += len;
                continue;
            }
        }
        i += ch.len_utf8();
    }

    regions
}

/// Byte length of a C-style char literal at the start of `rest`, such as
/// `'x'`, `'\''` or `'\u{4E2D}'`.
fn char_literal_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1);
    let (_, first) = chars.next()?;
    match first {
        '\'' | '\n' => None,
        '\\' => chars
            .skip(1)
            .take(10)
            .take_while(|&(_, c)| c != '\n')
            .find(|&(_, c)| c == '\'')
            .map(|(pos, _)| pos + 1),
        _ => {
            let (pos, c) = chars.next()?;
            (c == '\'').then_some(pos + 1)
        }
    }
}

fn string_end(text: &str, open_at: usize, quote: char) -> usize {
    let body_start = open_at + quote.len_utf8();
    let mut escaped = false;
    for (pos, c) in text[body_start..].char_indices() {
        let abs = body_start + pos;
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\n' if quote != '`' => return abs,
            c if c == quote => return abs + c.len_utf8(),
            _ => {}
        }
    }
    text.len()
}
