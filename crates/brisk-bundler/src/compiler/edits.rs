//! Span-based source rewriting.

/// Replace `start..end` of a module's source with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    pub start: u32,
    pub end: u32,
    pub text: String,
}

impl Edit {
    pub fn replace(start: u32, end: u32, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn remove(start: u32, end: u32) -> Self {
        Self::replace(start, end, String::new())
    }

    pub fn insert(at: u32, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }
}

/// Apply edits to `source`. Edits must not overlap.
///
/// Line breaks inside a replaced range are re-emitted after the replacement,
/// so code below an edit keeps its line number for source maps.
pub(crate) fn apply(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| (edit.start, edit.end));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        let start = edit.start as usize;
        let end = edit.end as usize;
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.text);

        let removed = source[start..end].matches('\n').count();
        let added = edit.text.matches('\n').count();
        for _ in added..removed {
            out.push('\n');
        }
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}
