//! Read-only view of the host editor's document.
//!
//! The classifier consumes the host's text and syntax tree through the
//! `Document` trait. Offsets are byte offsets into the document text; hosts
//! with other offset units convert before calling in.

use crate::syntax::SyntaxFamily;
use std::borrow::Cow;

/// Kind of a syntax tree node, as far as the classifier cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Whitespace between tokens
    Whitespace,
    /// `// ...` style comment
    LineComment,
    /// `/* ... */` style comment
    BlockComment,
    /// String or other literal value
    Literal,
    /// Any other token or composite node
    Other,
}

/// Ancestor classes the classifier asks the tree about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    Comment,
    Literal,
}

impl NodeKind {
    /// Whether a node of this kind belongs to `class`.
    pub fn is_a(self, class: NodeClass) -> bool {
        match class {
            NodeClass::Comment => matches!(self, NodeKind::LineComment | NodeKind::BlockComment),
            NodeClass::Literal => self == NodeKind::Literal,
        }
    }
}

/// A node handle returned by the host tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// Byte range `[start, end)` covered by the node
    pub start: usize,
    pub end: usize,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }
}

/// Tool windows that host a text cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolWindow {
    Terminal,
    Project,
}

/// Host document collaborator.
///
/// Implementations must tolerate any offset in `[0, len()]`. The tree
/// accessors may describe an older revision of the text than the line
/// accessors; the classifier is written to survive that lag.
pub trait Document {
    /// Length of the text in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zero-based line containing `offset`.
    fn line_number(&self, offset: usize) -> usize;

    /// Offset of the first byte of the line containing `offset`.
    fn line_start(&self, offset: usize) -> usize;

    /// Offset just past the last character of the line containing `offset`,
    /// excluding the line terminator.
    fn line_end(&self, offset: usize) -> usize;

    /// Text in `[start, end)`. Out-of-range or misaligned ranges yield "".
    fn text_in_range(&self, start: usize, end: usize) -> Cow<'_, str>;

    /// Comment vocabulary of the document's language.
    fn syntax_family(&self) -> SyntaxFamily;

    /// Deepest syntax node covering `offset`, if the tree has one.
    fn node_at(&self, offset: usize) -> Option<SyntaxNode>;

    /// Closest node of `class` among `node` and its ancestors.
    fn parent_of_kind(&self, node: &SyntaxNode, class: NodeClass) -> Option<SyntaxNode>;

    /// Whether this buffer is a version-control commit message.
    fn is_commit_message(&self) -> bool {
        false
    }

    /// The tool window hosting this buffer, if it is not a regular editor.
    fn tool_window(&self) -> Option<ToolWindow> {
        None
    }
}
