use std::sync::Arc;

use dashmap::DashMap;

use crate::frontmatter;
use crate::protocol::Position;

/// Immutable view of a document at a given version. Never mutated once
/// returned from the store — `DocumentStore` replaces rather than edits.
pub struct DocumentSnapshot {
    pub uri: String,
    pub version: i64,
    pub text: String,
    pub lines: Vec<String>,
    pub has_frontmatter: bool,
    pub frontmatter_start_line: usize,
    pub frontmatter_end_line: usize,
    pub frontmatter_yaml: String,
}

impl DocumentSnapshot {
    pub fn new(uri: String, version: i64, text: String) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_owned).collect();

        match frontmatter::detect(&lines) {
            Some(span) => Self {
                uri,
                version,
                text,
                lines,
                has_frontmatter: true,
                frontmatter_start_line: span.start_line,
                frontmatter_end_line: span.end_line,
                frontmatter_yaml: span.yaml,
            },
            None => Self {
                uri,
                version,
                text,
                lines,
                has_frontmatter: false,
                frontmatter_start_line: 0,
                frontmatter_end_line: 0,
                frontmatter_yaml: String::new(),
            },
        }
    }

    /// True iff `p` is strictly between the two frontmatter delimiter lines
    /// (the delimiters themselves are excluded).
    pub fn position_in_frontmatter(&self, p: Position) -> bool {
        self.has_frontmatter
            && self.frontmatter_start_line < p.line as usize
            && (p.line as usize) < self.frontmatter_end_line
    }

    /// Convert an absolute document line into a line relative to the start of
    /// `frontmatter_yaml` (the `-1` skips the opening fence).
    pub fn yaml_relative_line(&self, document_line: u32) -> Option<usize> {
        if !self.has_frontmatter {
            return None;
        }
        let line = document_line as i64 - self.frontmatter_start_line as i64 - 1;
        if line < 0 {
            None
        } else {
            Some(line as usize)
        }
    }
}

/// Mapping from document URI to its latest snapshot. `Open` and `Update` are
/// identical full-replacement operations, kept as distinct methods for
/// clarity of intent at call sites.
pub struct DocumentStore {
    inner: DashMap<String, Arc<DocumentSnapshot>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn open(&self, uri: String, version: i64, text: String) {
        let snapshot = DocumentSnapshot::new(uri.clone(), version, text);
        self.inner.insert(uri, Arc::new(snapshot));
    }

    pub fn update(&self, uri: String, version: i64, text: String) {
        self.open(uri, version, text);
    }

    pub fn close(&self, uri: &str) {
        self.inner.remove(uri);
    }

    pub fn get(&self, uri: &str) -> Option<Arc<DocumentSnapshot>> {
        self.inner.get(uri).map(|entry| entry.value().clone())
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
