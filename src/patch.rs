use crate::changes::{push_line, ChangeStatus, FileChanges, LineRange};

/// Abbreviated object-id width used in `index` lines.
const ABBREV: usize = 7;

/// A single line inside a hunk, as reported by the diff engine.
#[derive(Debug, Clone)]
pub(crate) struct PatchLine {
    pub origin: char,
    pub old_lineno: Option<u32>,
    pub new_lineno: Option<u32>,
    pub content: Vec<u8>,
}

/// One contiguous block of changes with its `@@` header.
#[derive(Debug, Clone)]
pub(crate) struct HunkPatch {
    pub header: String,
    pub lines: Vec<PatchLine>,
}

/// The rendered-diff intermediate for one differing file.
///
/// Holds everything needed to emit a `git diff` style segment or to
/// project the structured change record; one of these exists per file
/// that still differs after line-ending normalization.
#[derive(Debug, Clone)]
pub(crate) struct FilePatch {
    pub path: String,
    pub status: ChangeStatus,
    pub binary: bool,
    /// Abbreviated object ids for the `index` line; the all-zero id
    /// stands in for a missing side.
    pub old_id: String,
    pub new_id: String,
    /// Git filemode bits; `None` when the side does not exist.
    pub old_mode: Option<u32>,
    pub new_mode: Option<u32>,
    pub hunks: Vec<HunkPatch>,
}

/// Abbreviate an object id for an `index` line.
pub(crate) fn short_id(oid: git2::Oid) -> String {
    let mut s = oid.to_string();
    s.truncate(ABBREV);
    s
}

/// The abbreviated all-zero id, standing in for a missing side.
pub(crate) fn null_id() -> String {
    "0".repeat(ABBREV)
}

impl FilePatch {
    fn old_label(&self) -> String {
        match self.old_mode {
            Some(_) => format!("a/{}", self.path),
            None => "/dev/null".to_string(),
        }
    }

    fn new_label(&self) -> String {
        match self.new_mode {
            Some(_) => format!("b/{}", self.path),
            None => "/dev/null".to_string(),
        }
    }

    /// Append this file's segment in `git diff` dialect.
    pub(crate) fn render_into(&self, out: &mut String) {
        use std::fmt::Write as _;

        let _ = writeln!(out, "diff --git a/{0} b/{0}", self.path);

        match (self.old_mode, self.new_mode) {
            (None, Some(mode)) => {
                let _ = writeln!(out, "new file mode {:06o}", mode);
            }
            (Some(mode), None) => {
                let _ = writeln!(out, "deleted file mode {:06o}", mode);
            }
            (Some(old), Some(new)) if old != new => {
                let _ = writeln!(out, "old mode {:06o}", old);
                let _ = writeln!(out, "new mode {:06o}", new);
            }
            _ => {}
        }

        // A pure mode change has identical ids and no content section.
        if self.old_id == self.new_id && self.hunks.is_empty() && !self.binary {
            return;
        }

        match (self.old_mode, self.new_mode) {
            (Some(old), Some(new)) if old == new => {
                let _ = writeln!(out, "index {}..{} {:06o}", self.old_id, self.new_id, new);
            }
            _ => {
                let _ = writeln!(out, "index {}..{}", self.old_id, self.new_id);
            }
        }

        if self.binary {
            let _ = writeln!(
                out,
                "Binary files {} and {} differ",
                self.old_label(),
                self.new_label()
            );
            return;
        }

        if self.hunks.is_empty() {
            // Empty-file creation or deletion: header and index line only.
            return;
        }

        let _ = writeln!(out, "--- {}", self.old_label());
        let _ = writeln!(out, "+++ {}", self.new_label());

        for hunk in &self.hunks {
            out.push_str(&hunk.header);
            for line in &hunk.lines {
                match line.origin {
                    '+' | '-' | ' ' => out.push(line.origin),
                    _ => {}
                }
                out.push_str(&String::from_utf8_lossy(&line.content));
            }
        }
    }

    /// Project the structured change record for this file.
    pub(crate) fn to_file_changes(&self) -> FileChanges {
        let mut added: Vec<LineRange> = Vec::new();
        let mut removed: Vec<LineRange> = Vec::new();

        for hunk in &self.hunks {
            for line in &hunk.lines {
                match line.origin {
                    '+' => {
                        if let Some(n) = line.new_lineno {
                            push_line(&mut added, n);
                        }
                    }
                    '-' => {
                        if let Some(n) = line.old_lineno {
                            push_line(&mut removed, n);
                        }
                    }
                    _ => {}
                }
            }
        }

        FileChanges {
            path: self.path.clone(),
            status: self.status,
            binary: self.binary,
            added,
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(old_mode: Option<u32>, new_mode: Option<u32>) -> FilePatch {
        FilePatch {
            path: "src/lib.rs".into(),
            status: ChangeStatus::Modified,
            binary: false,
            old_id: "1111111".into(),
            new_id: "2222222".into(),
            old_mode,
            new_mode,
            hunks: vec![HunkPatch {
                header: "@@ -1,2 +1,2 @@\n".into(),
                lines: vec![
                    PatchLine {
                        origin: '-',
                        old_lineno: Some(1),
                        new_lineno: None,
                        content: b"old\n".to_vec(),
                    },
                    PatchLine {
                        origin: '+',
                        old_lineno: None,
                        new_lineno: Some(1),
                        content: b"new\n".to_vec(),
                    },
                    PatchLine {
                        origin: ' ',
                        old_lineno: Some(2),
                        new_lineno: Some(2),
                        content: b"same\n".to_vec(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn modified_segment() {
        let mut out = String::new();
        patch(Some(0o100644), Some(0o100644)).render_into(&mut out);
        assert_eq!(
            out,
            "diff --git a/src/lib.rs b/src/lib.rs\n\
             index 1111111..2222222 100644\n\
             --- a/src/lib.rs\n\
             +++ b/src/lib.rs\n\
             @@ -1,2 +1,2 @@\n\
             -old\n\
             +new\n\
             \x20same\n"
        );
    }

    #[test]
    fn new_file_header() {
        let mut out = String::new();
        let mut p = patch(None, Some(0o100644));
        p.old_id = null_id();
        p.render_into(&mut out);
        assert!(out.contains("new file mode 100644\n"));
        assert!(out.contains("index 0000000..2222222\n"));
        assert!(out.contains("--- /dev/null\n"));
        assert!(out.contains("+++ b/src/lib.rs\n"));
    }

    #[test]
    fn deleted_file_header() {
        let mut out = String::new();
        let mut p = patch(Some(0o100644), None);
        p.new_id = null_id();
        p.render_into(&mut out);
        assert!(out.contains("deleted file mode 100644\n"));
        assert!(out.contains("+++ /dev/null\n"));
    }

    #[test]
    fn pure_mode_change_has_no_index_line() {
        let mut out = String::new();
        let p = FilePatch {
            path: "run.sh".into(),
            status: ChangeStatus::Modified,
            binary: false,
            old_id: "3333333".into(),
            new_id: "3333333".into(),
            old_mode: Some(0o100644),
            new_mode: Some(0o100755),
            hunks: vec![],
        };
        p.render_into(&mut out);
        assert_eq!(
            out,
            "diff --git a/run.sh b/run.sh\nold mode 100644\nnew mode 100755\n"
        );
    }

    #[test]
    fn binary_notice() {
        let mut out = String::new();
        let p = FilePatch {
            path: "img.png".into(),
            status: ChangeStatus::Modified,
            binary: true,
            old_id: "4444444".into(),
            new_id: "5555555".into(),
            old_mode: Some(0o100644),
            new_mode: Some(0o100644),
            hunks: vec![],
        };
        p.render_into(&mut out);
        assert!(out.ends_with("Binary files a/img.png and b/img.png differ\n"));
    }

    #[test]
    fn ranges_projection() {
        let changes = patch(Some(0o100644), Some(0o100644)).to_file_changes();
        assert_eq!(changes.added, vec![LineRange::single(1)]);
        assert_eq!(changes.removed, vec![LineRange::single(1)]);
        assert_eq!(changes.added_lines(), 1);
    }
}
