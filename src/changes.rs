use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// LineRange
// ---------------------------------------------------------------------------

/// An inclusive, 1-indexed range of line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start >= 1 && start <= end);
        Self { start, end }
    }

    /// A range covering a single line.
    pub fn single(line: u32) -> Self {
        Self::new(line, line)
    }

    /// Number of lines covered.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Append `line` to a sorted range list, coalescing with the last range
/// when contiguous or overlapping. Lines must arrive in ascending order,
/// which is how the diff engine emits them.
pub(crate) fn push_line(ranges: &mut Vec<LineRange>, line: u32) {
    if let Some(last) = ranges.last_mut() {
        if line <= last.end {
            return;
        }
        if line == last.end + 1 {
            last.end = line;
            return;
        }
    }
    ranges.push(LineRange::single(line));
}

// ---------------------------------------------------------------------------
// ChangeStatus
// ---------------------------------------------------------------------------

/// How a file differs between the historical tree and the working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChangeStatus {
    /// Present in the working tree only (includes untracked files).
    Added,
    /// Present in the historical tree only.
    Deleted,
    /// Present on both sides with differing content or mode.
    Modified,
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// FileChanges
// ---------------------------------------------------------------------------

/// The change record for a single file.
///
/// `added` ranges are numbered in the working-tree copy, `removed` ranges
/// in the historical copy; both are sorted, coalesced, and non-overlapping.
/// Binary files carry no ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileChanges {
    /// Repo-relative path with forward slashes.
    pub path: String,
    pub status: ChangeStatus,
    pub binary: bool,
    pub added: Vec<LineRange>,
    pub removed: Vec<LineRange>,
}

impl FileChanges {
    /// Total count of added lines.
    pub fn added_lines(&self) -> u32 {
        self.added.iter().map(LineRange::len).sum()
    }

    /// Total count of removed lines.
    pub fn removed_lines(&self) -> u32 {
        self.removed.iter().map(LineRange::len).sum()
    }
}

// ---------------------------------------------------------------------------
// DiffResult
// ---------------------------------------------------------------------------

/// An ordered sequence of per-file change records, in the order the tree
/// walk visited them. Produced fresh per extraction; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiffResult {
    pub files: Vec<FileChanges>,
}

impl DiffResult {
    /// True when the tree and working tree were identical.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileChanges> {
        self.files.iter()
    }

    /// Map of path to added line ranges, the shape a coverage evaluator
    /// joins against a coverage report. Binary files are skipped.
    pub fn added_ranges(&self) -> BTreeMap<&str, &[LineRange]> {
        self.files
            .iter()
            .filter(|f| !f.binary && !f.added.is_empty())
            .map(|f| (f.path.as_str(), f.added.as_slice()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a FileChanges;
    type IntoIter = std::slice::Iter<'a, FileChanges>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

// ---------------------------------------------------------------------------
// Path normalization
// ---------------------------------------------------------------------------

/// Normalize a delta path to repo-relative forward-slash form.
pub(crate) fn normalize_path(path: &std::path::Path) -> String {
    let s = path.to_string_lossy();
    if s.contains('\\') {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_line_coalesces_contiguous() {
        let mut ranges = Vec::new();
        for line in [3, 4, 5, 9, 10, 20] {
            push_line(&mut ranges, line);
        }
        assert_eq!(
            ranges,
            vec![
                LineRange::new(3, 5),
                LineRange::new(9, 10),
                LineRange::single(20),
            ]
        );
    }

    #[test]
    fn push_line_ignores_duplicates() {
        let mut ranges = Vec::new();
        push_line(&mut ranges, 7);
        push_line(&mut ranges, 7);
        assert_eq!(ranges, vec![LineRange::single(7)]);
    }

    #[test]
    fn range_accessors() {
        let r = LineRange::new(4, 6);
        assert_eq!(r.len(), 3);
        assert!(r.contains(4));
        assert!(r.contains(6));
        assert!(!r.contains(7));
        assert_eq!(r.to_string(), "4-6");
        assert_eq!(LineRange::single(12).to_string(), "12");
    }

    #[test]
    fn added_ranges_skips_binary_and_empty() {
        let result = DiffResult {
            files: vec![
                FileChanges {
                    path: "src/a.rs".into(),
                    status: ChangeStatus::Modified,
                    binary: false,
                    added: vec![LineRange::new(2, 3)],
                    removed: vec![],
                },
                FileChanges {
                    path: "img.png".into(),
                    status: ChangeStatus::Modified,
                    binary: true,
                    added: vec![],
                    removed: vec![],
                },
                FileChanges {
                    path: "gone.rs".into(),
                    status: ChangeStatus::Deleted,
                    binary: false,
                    added: vec![],
                    removed: vec![LineRange::new(1, 10)],
                },
            ],
        };
        let ranges = result.added_ranges();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges["src/a.rs"], &[LineRange::new(2, 3)]);
    }

    #[test]
    fn backslash_paths_normalized() {
        assert_eq!(
            normalize_path(std::path::Path::new("src\\lib.rs")),
            "src/lib.rs"
        );
        assert_eq!(
            normalize_path(std::path::Path::new("src/lib.rs")),
            "src/lib.rs"
        );
    }
}
