//! Symbol handles and the locations they are found at.
//!
//! A [`SymbolHandle`] is the engine's view of a declared program entity.
//! Its derived `Eq`/`Hash` is plain handle equality; the looser notion used
//! for grouping lives in [`super::comparer`].

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

/// Identity of one compiled image (the output of a project, or a
/// referenced binary).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ImageId(pub u32);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

/// Identity of one source project context.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProjectId(pub u32);

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", self.0)
    }
}

/// Stable, cheap identifier of a searched document.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DocumentId(pub u32);

impl DocumentId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Textual identity of a declared entity, e.g. `M:Foo.Bar(System.Int32)`.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SymbolKey(Arc<str>);

impl SymbolKey {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The simple name: the last dotted segment, without kind prefix or
    /// parameter list.
    pub fn simple_name(&self) -> &str {
        let id = self.0.as_ref();
        let id = id.split_once(':').map_or(id, |(_, rest)| rest);
        let id = id.split_once('(').map_or(id, |(head, _)| head);
        id.rsplit('.').next().unwrap_or(id)
    }
}

impl fmt::Debug for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a handle was resolved from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SymbolOrigin {
    /// Resolved against source text of `project`, which compiles to `output`.
    Source { project: ProjectId, output: ImageId },
    /// Resolved against a compiled binary reference.
    Metadata { image: ImageId },
}

impl SymbolOrigin {
    /// The compiled image this origin corresponds to.
    pub fn image(&self) -> ImageId {
        match *self {
            SymbolOrigin::Source { output, .. } => output,
            SymbolOrigin::Metadata { image } => image,
        }
    }
}

/// An identifier for a declared program entity as resolved in one context.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SymbolHandle {
    key: SymbolKey,
    origin: SymbolOrigin,
}

impl SymbolHandle {
    pub fn new(key: SymbolKey, origin: SymbolOrigin) -> Self {
        Self { key, origin }
    }

    /// A handle resolved from source in `project`.
    pub fn source(key: impl Into<Arc<str>>, project: ProjectId, output: ImageId) -> Self {
        Self::new(SymbolKey::new(key), SymbolOrigin::Source { project, output })
    }

    /// A handle resolved from a compiled image.
    pub fn metadata(key: impl Into<Arc<str>>, image: ImageId) -> Self {
        Self::new(SymbolKey::new(key), SymbolOrigin::Metadata { image })
    }

    pub fn key(&self) -> &SymbolKey {
        &self.key
    }

    pub fn origin(&self) -> SymbolOrigin {
        self.origin
    }

    pub fn name(&self) -> &str {
        self.key.simple_name()
    }

    /// Whether any location of this handle comes from metadata.
    pub fn is_from_metadata(&self) -> bool {
        matches!(self.origin, SymbolOrigin::Metadata { .. })
    }

    /// The source project, if resolved from source.
    pub fn project(&self) -> Option<ProjectId> {
        match self.origin {
            SymbolOrigin::Source { project, .. } => Some(project),
            SymbolOrigin::Metadata { .. } => None,
        }
    }
}

impl fmt::Display for SymbolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            SymbolOrigin::Source { project, .. } => write!(f, "{} [p{}]", self.key, project.0),
            SymbolOrigin::Metadata { image } => write!(f, "{} [img{}]", self.key, image.0),
        }
    }
}

/// A byte span inside a document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<Range<usize>> for TextSpan {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// 0-indexed line and column (column in bytes). Displayed 1-indexed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    /// Compute the position of `offset` in `text`.
    pub fn at(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count();
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);

        Self {
            line: line as u32,
            col: (offset - line_start) as u32,
        }
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// A reference or definition site.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Location {
    pub document: DocumentId,
    pub path: Option<Arc<Path>>,
    pub span: TextSpan,
    pub position: Option<LineCol>,
}

impl Location {
    pub fn new(document: DocumentId, span: impl Into<TextSpan>) -> Self {
        Self {
            document,
            path: None,
            span: span.into(),
            position: None,
        }
    }

    pub fn with_path(mut self, path: Arc<Path>) -> Self {
        self.path = Some(path);
        self
    }

    /// Fill in `position` from the document text.
    pub fn with_position_in(mut self, text: &str) -> Self {
        self.position = Some(LineCol::at(text, self.span.start));
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}", path.display())?,
            None => write!(f, "{}", self.document)?,
        }
        match self.position {
            Some(position) => write!(f, ":{}", position),
            None => write!(f, "@{}..{}", self.span.start, self.span.end),
        }
    }
}
