//! Cursor context classification.
//!
//! `classify` decides what the user is typing at a cursor offset. It is a
//! lightweight heuristic, not a language front end:
//!
//! 1. commit-message and tool-window buffers are recognised by the host;
//! 2. a text scan of the current line for a line-comment marker;
//! 3. the host syntax tree around the offset;
//! 4. otherwise plain code.
//!
//! Step 2 runs before the tree because the tree is typically a few
//! milliseconds behind the keyboard. The text scan may upgrade a position to
//! "comment"; it never downgrades what the tree reports.

use crate::document::{Document, NodeClass, NodeKind, ToolWindow};
use crate::model::ContextKind;

/// Classify the context at `offset`.
///
/// Never panics: offsets past the end are clamped to the end and offsets
/// inside a multi-byte character are moved back to its first byte.
pub fn classify<D: Document + ?Sized>(doc: &D, offset: usize) -> ContextKind {
    if doc.is_commit_message() {
        return ContextKind::CommitMessage;
    }
    match doc.tool_window() {
        Some(ToolWindow::Terminal) => return ContextKind::ToolWindowTerminal,
        Some(ToolWindow::Project) => return ContextKind::ToolWindowProject,
        None => {}
    }

    let cursor = LineCursor::locate(doc, offset);
    if cursor.in_line_comment(doc) {
        return ContextKind::CommentLine;
    }

    classify_by_tree(doc, &cursor).unwrap_or(ContextKind::CodeDefault)
}

/// The text-only half of `classify`: whether a line-comment marker of the
/// document's syntax family appears on the current line at or before
/// `offset`.
pub fn line_comment_at<D: Document + ?Sized>(doc: &D, offset: usize) -> bool {
    LineCursor::locate(doc, offset).in_line_comment(doc)
}

/// A clamped cursor position together with its line.
struct LineCursor<'a> {
    offset: usize,
    line_start: usize,
    /// Current line text, without the terminator
    line: std::borrow::Cow<'a, str>,
}

impl<'a> LineCursor<'a> {
    fn locate<D: Document + ?Sized>(doc: &'a D, offset: usize) -> Self {
        let offset = offset.min(doc.len());
        let line_start = doc.line_start(offset).min(offset);
        let line_end = doc.line_end(offset).max(line_start);
        let line = doc.text_in_range(line_start, line_end);

        let mut column = (offset - line_start).min(line.len());
        while !line.is_char_boundary(column) {
            column -= 1;
        }
        // Past the line end means the cursor sits on the terminator.
        let offset = if offset > line_start + line.len() {
            offset
        } else {
            line_start + column
        };

        Self {
            offset,
            line_start,
            line,
        }
    }

    fn column(&self) -> usize {
        self.offset - self.line_start
    }

    fn in_line_comment<D: Document + ?Sized>(&self, doc: &D) -> bool {
        doc.syntax_family()
            .find_line_comment(&self.line)
            .map(|marker| self.column() >= marker)
            .unwrap_or(false)
    }

    /// Offset of the character before the cursor, if any.
    fn previous_offset(&self) -> Option<usize> {
        let column = self.column().min(self.line.len());
        if column > 0 {
            let prev = self.line[..column].char_indices().next_back()?.0;
            return Some(self.line_start + prev);
        }
        // Start of line: the byte before is the (ASCII) line terminator.
        self.offset.checked_sub(1)
    }
}

fn classify_by_tree<D: Document + ?Sized>(doc: &D, cursor: &LineCursor<'_>) -> Option<ContextKind> {
    let mut node = doc.node_at(cursor.offset);

    // The cursor usually sits just after what was typed; the position itself
    // is whitespace or end of file, the character before carries the node.
    let needs_fallback = node
        .as_ref()
        .map(|n| n.kind == NodeKind::Whitespace)
        .unwrap_or(true);
    if needs_fallback {
        if let Some(prev) = cursor.previous_offset().and_then(|p| doc.node_at(p)) {
            node = Some(prev);
        }
    }
    let node = node?;

    if let Some(comment) = doc.parent_of_kind(&node, NodeClass::Comment) {
        return Some(match comment.kind {
            NodeKind::BlockComment => ContextKind::CommentBlock,
            _ => ContextKind::CommentLine,
        });
    }
    if doc.parent_of_kind(&node, NodeClass::Literal).is_some() {
        return Some(ContextKind::StringLiteral);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SourceBuffer;
    use crate::syntax::SyntaxFamily;

    fn rust(text: &str) -> SourceBuffer {
        SourceBuffer::new(text, SyntaxFamily::CStyle)
    }

    #[test]
    fn test_empty_buffer_is_code() {
        let buf = rust("");
        assert_eq!(classify(&buf, 0), ContextKind::CodeDefault);
        assert_eq!(classify(&buf, 42), ContextKind::CodeDefault);
    }

    #[test]
    fn test_line_comment_by_text() {
        let text = "let a = 1; // note";
        let buf = rust(text);
        assert_eq!(classify(&buf, 3), ContextKind::CodeDefault);
        assert_eq!(classify(&buf, 11), ContextKind::CommentLine);
        assert_eq!(classify(&buf, text.len()), ContextKind::CommentLine);
    }

    #[test]
    fn test_block_comment_from_tree() {
        let text = "fn a() {}\n/* first\n   second */\nfn b() {}";
        let buf = rust(text);
        let inside = text.find("second").unwrap();
        assert_eq!(classify(&buf, inside), ContextKind::CommentBlock);
        assert_eq!(classify(&buf, text.len()), ContextKind::CodeDefault);
    }

    #[test]
    fn test_string_literal_and_cursor_after_it() {
        let text = "let s = \"hello\";";
        let buf = rust(text);
        assert_eq!(classify(&buf, 10), ContextKind::StringLiteral);
        // after the semicolon: plain code
        assert_eq!(classify(&buf, text.len()), ContextKind::CodeDefault);
    }

    #[test]
    fn test_cursor_on_whitespace_uses_previous_node() {
        let text = "/* note */ \nx";
        let buf = rust(text);
        // offset 10 is the space right after the closing delimiter
        assert_eq!(classify(&buf, 10), ContextKind::CommentBlock);
    }

    #[test]
    fn test_comment_marker_inside_string_counts_as_comment() {
        // The text scan does not know about strings; a marker inside a
        // literal still upgrades positions after it.
        let text = "let url = \"http://example.com\";";
        let buf = rust(text);
        assert_eq!(classify(&buf, text.len()), ContextKind::CommentLine);
    }

    #[test]
    fn test_multibyte_offsets_are_clamped() {
        let text = "let 变量 = 1; // 中文注释";
        let buf = rust(text);
        let marker = text.find("//").unwrap();
        for offset in 0..=text.len() + 3 {
            let expected = if offset >= marker {
                ContextKind::CommentLine
            } else {
                ContextKind::CodeDefault
            };
            assert_eq!(classify(&buf, offset), expected, "offset {}", offset);
        }
    }

    #[test]
    fn test_repeated_calls_agree_on_stale_buffer() {
        let mut buf = rust("fn main() {\n}\n");
        let end = buf.insert(buf.text().len(), "let s = \"中文\"; // 注释");
        // not reparsed: the regions still describe the old text
        assert!(buf.regions().is_empty());

        let inside_char = buf.text().find('中').unwrap() + 1;
        for offset in [0, inside_char, end, buf.text().len()] {
            let first = classify(&buf, offset);
            assert_eq!(classify(&buf, offset), first, "offset {}", offset);
            assert_eq!(line_comment_at(&buf, offset), line_comment_at(&buf, offset));
        }
        assert_eq!(classify(&buf, end), ContextKind::CommentLine);
    }

    #[test]
    fn test_char_literal_does_not_open_a_string() {
        let text = "let q = '\"'; let n = 1;";
        let buf = rust(text);
        assert_eq!(classify(&buf, 9), ContextKind::StringLiteral);
        assert_eq!(classify(&buf, text.len() - 2), ContextKind::CodeDefault);
    }

    #[test]
    fn test_hash_family() {
        let text = "x = 1  # 注释";
        let buf = SourceBuffer::new(text, SyntaxFamily::Hash);
        assert_eq!(classify(&buf, 2), ContextKind::CodeDefault);
        assert_eq!(classify(&buf, text.len()), ContextKind::CommentLine);
    }

    #[test]
    fn test_host_flags_win() {
        let buf = rust("fn main() {}").with_commit_message(true);
        assert_eq!(classify(&buf, 3), ContextKind::CommitMessage);
        let buf = rust("ls -la").with_tool_window(Some(ToolWindow::Terminal));
        assert_eq!(classify(&buf, 0), ContextKind::ToolWindowTerminal);
    }

    #[test]
    fn test_line_comment_at_offsets() {
        let buf = rust("a\n  // b\nc");
        assert!(!line_comment_at(&buf, 0));
        assert!(!line_comment_at(&buf, 3));
        assert!(line_comment_at(&buf, 4));
        assert!(line_comment_at(&buf, 8));
        assert!(!line_comment_at(&buf, 9));
    }
}
