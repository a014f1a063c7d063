//! Review diff model.
//!
//! The server sends a diff already split into groups (hunks) of aligned
//! old/new line pairs. These types mirror that shape and reject any line whose
//! sides do not match its kind, so views never see a half-populated pair.

use super::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a line pair changed between the two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    #[serde(alias = "insert")]
    Added,
    #[serde(alias = "delete")]
    Removed,
    #[serde(alias = "no")]
    Unchanged,
    Modified,
}

impl LineKind {
    fn expects_old(self) -> bool {
        !matches!(self, Self::Added)
    }

    fn expects_new(self) -> bool {
        !matches!(self, Self::Removed)
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Unchanged => write!(f, "unchanged"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// One side of a line pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub content: String,
    pub revision: u32,
    /// Stable id comments are anchored to.
    pub id: String,
}

/// Half-open line interval `[from, to)` within one revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub from: u32,
    pub to: u32,
}

impl LineRange {
    pub fn len(&self) -> u32 {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `start,len` notation used in unified hunk headers.
    fn unified(&self) -> String {
        let len = self.len();
        let mut start = self.from + 1;
        if len == 1 {
            return start.to_string();
        }
        if len == 0 {
            start -= 1;
        }
        format!("{start},{len}")
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawDiffLine {
    #[serde(rename = "type", alias = "kind")]
    kind: LineKind,
    #[serde(default)]
    old: Option<Line>,
    #[serde(default)]
    new: Option<Line>,
}

/// An aligned old/new line pair.
///
/// `old` is absent exactly for added lines and `new` exactly for removed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDiffLine", into = "RawDiffLine")]
pub struct DiffLine {
    kind: LineKind,
    old: Option<Line>,
    new: Option<Line>,
}

impl TryFrom<RawDiffLine> for DiffLine {
    type Error = ModelError;

    fn try_from(raw: RawDiffLine) -> Result<Self, Self::Error> {
        DiffLine::new(raw.kind, raw.old, raw.new)
    }
}

impl From<DiffLine> for RawDiffLine {
    fn from(line: DiffLine) -> Self {
        RawDiffLine {
            kind: line.kind,
            old: line.old,
            new: line.new,
        }
    }
}

impl DiffLine {
    pub fn new(kind: LineKind, old: Option<Line>, new: Option<Line>) -> Result<Self, ModelError> {
        if kind.expects_old() != old.is_some() {
            return Err(ModelError::MalformedDiff(format!(
                "{kind} line {} an old side",
                if old.is_some() { "must not have" } else { "requires" }
            )));
        }
        if kind.expects_new() != new.is_some() {
            return Err(ModelError::MalformedDiff(format!(
                "{kind} line {} a new side",
                if new.is_some() { "must not have" } else { "requires" }
            )));
        }
        Ok(Self { kind, old, new })
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn old(&self) -> Option<&Line> {
        self.old.as_ref()
    }

    pub fn new_side(&self) -> Option<&Line> {
        self.new.as_ref()
    }

    /// True if either side carries the given line id.
    pub fn has_id(&self, id: &str) -> bool {
        self.old.iter().chain(self.new.iter()).any(|line| line.id == id)
    }
}

/// A hunk: a contiguous block of aligned lines with its ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffGroup {
    pub old_range: LineRange,
    pub new_range: LineRange,
    #[serde(default)]
    pub lines: Vec<DiffLine>,
}

fn write_prefixed(f: &mut fmt::Formatter<'_>, prefix: char, content: &str) -> fmt::Result {
    write!(f, "{prefix}{content}")?;
    if !content.ends_with('\n') {
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for DiffGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            self.old_range.unified(),
            self.new_range.unified()
        )?;
        for line in &self.lines {
            if let Some(old) = &line.old {
                let prefix = if line.kind == LineKind::Unchanged { ' ' } else { '-' };
                write_prefixed(f, prefix, &old.content)?;
            }
            if let (Some(new), true) = (&line.new, line.kind != LineKind::Unchanged) {
                write_prefixed(f, '+', &new.content)?;
            }
        }
        Ok(())
    }
}

/// The diff of a single reviewed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFile {
    #[serde(rename = "filename", alias = "name")]
    pub name: String,
    #[serde(default)]
    pub groups: Vec<DiffGroup>,
}

impl DiffFile {
    pub fn from_value(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|err| ModelError::MalformedDiff(err.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|err| ModelError::MalformedDiff(err.to_string()))
    }

    fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.groups.iter().flat_map(|group| group.lines.iter())
    }

    pub fn additions(&self) -> usize {
        self.lines()
            .filter(|line| matches!(line.kind, LineKind::Added | LineKind::Modified))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.lines()
            .filter(|line| matches!(line.kind, LineKind::Removed | LineKind::Modified))
            .count()
    }

    pub fn find_line(&self, id: &str) -> Option<&DiffLine> {
        self.lines().find(|line| line.has_id(id))
    }
}

impl fmt::Display for DiffFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- a/{}", self.name)?;
        writeln!(f, "+++ b/{}", self.name)?;
        for group in &self.groups {
            write!(f, "{group}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn side(content: &str, revision: u32, id: &str) -> serde_json::Value {
        json!({ "content": content, "revision": revision, "id": id })
    }

    #[test]
    fn builds_single_unchanged_line() {
        let file = DiffFile::from_value(json!({
            "filename": "main.cpp",
            "groups": [{
                "old_range": { "from": 0, "to": 1 },
                "new_range": { "from": 0, "to": 1 },
                "lines": [{
                    "type": "unchanged",
                    "old": side("a", 1, "1"),
                    "new": side("a", 2, "2"),
                }],
            }],
        }))
        .unwrap();

        assert_eq!(file.name, "main.cpp");
        assert_eq!(file.groups.len(), 1);
        let lines = &file.groups[0].lines;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind(), LineKind::Unchanged);
        assert_eq!(
            lines[0].old(),
            Some(&Line {
                content: "a".into(),
                revision: 1,
                id: "1".into()
            })
        );
        assert_eq!(
            lines[0].new_side(),
            Some(&Line {
                content: "a".into(),
                revision: 2,
                id: "2".into()
            })
        );
    }

    #[test]
    fn added_line_tolerates_null_old_side() {
        let line: DiffLine = serde_json::from_value(json!({
            "type": "added",
            "old": null,
            "new": side("b", 2, "7"),
        }))
        .unwrap();
        assert!(line.old().is_none());
        assert_eq!(line.new_side().map(|l| l.id.as_str()), Some("7"));
    }

    #[test]
    fn unchanged_line_with_null_old_side_is_malformed() {
        let err = DiffFile::from_value(json!({
            "filename": "x",
            "groups": [{
                "old_range": { "from": 0, "to": 1 },
                "new_range": { "from": 0, "to": 1 },
                "lines": [{ "type": "unchanged", "old": null, "new": side("b", 2, "7") }],
            }],
        }))
        .unwrap_err();
        assert!(matches!(err, ModelError::MalformedDiff(_)));
    }

    #[test]
    fn removed_line_must_not_carry_new_side() {
        let result = DiffLine::new(
            LineKind::Removed,
            Some(Line {
                content: "x".into(),
                revision: 1,
                id: "1".into(),
            }),
            Some(Line {
                content: "x".into(),
                revision: 2,
                id: "2".into(),
            }),
        );
        assert!(matches!(result, Err(ModelError::MalformedDiff(_))));
    }

    #[test]
    fn accepts_server_kind_spellings() {
        let line: DiffLine = serde_json::from_value(json!({
            "type": "delete",
            "old": side("gone", 1, "3"),
        }))
        .unwrap();
        assert_eq!(line.kind(), LineKind::Removed);
        assert!(line.new_side().is_none());

        let line: DiffLine = serde_json::from_value(json!({
            "type": "no",
            "old": side("same", 1, "4"),
            "new": side("same", 2, "5"),
        }))
        .unwrap();
        assert_eq!(line.kind(), LineKind::Unchanged);
    }

    #[test]
    fn renders_group_as_unified_hunk() {
        let group: DiffGroup = serde_json::from_value(json!({
            "old_range": { "from": 0, "to": 2 },
            "new_range": { "from": 0, "to": 2 },
            "lines": [
                { "type": "no", "old": side("keep\n", 1, "1"), "new": side("keep\n", 2, "2") },
                { "type": "delete", "old": side("old", 1, "3") },
                { "type": "insert", "new": side("new", 2, "4") },
            ],
        }))
        .unwrap();

        assert_eq!(group.to_string(), "@@ -1,2 +1,2 @@\n keep\n-old\n+new\n");
    }

    #[test]
    fn single_and_empty_ranges_use_short_headers() {
        let single = LineRange { from: 4, to: 5 };
        let empty = LineRange { from: 4, to: 4 };
        assert_eq!(single.unified(), "5");
        assert_eq!(empty.unified(), "4,0");
        assert!(empty.is_empty());
    }

    #[test]
    fn counts_changes_and_finds_lines() {
        let file = DiffFile::from_value(json!({
            "name": "lib.rs",
            "groups": [{
                "old_range": { "from": 0, "to": 2 },
                "new_range": { "from": 0, "to": 2 },
                "lines": [
                    { "type": "modified", "old": side("a", 1, "1"), "new": side("b", 2, "2") },
                    { "type": "added", "new": side("c", 2, "3") },
                ],
            }],
        }))
        .unwrap();

        assert_eq!(file.additions(), 2);
        assert_eq!(file.deletions(), 1);
        assert_eq!(file.find_line("3").map(DiffLine::kind), Some(LineKind::Added));
        assert!(file.find_line("missing").is_none());
    }
}
