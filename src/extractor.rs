use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git2::{Delta, DiffOptions, FileMode, ObjectType, Repository};
use log::{debug, trace};

use crate::changes::{normalize_path, ChangeStatus, DiffResult};
use crate::error::{Error, Result};
use crate::normalize::{is_binary, LineEndingPolicy};
use crate::patch::{null_id, short_id, FilePatch, HunkPatch, PatchLine};

/// Extracts the difference between a committed tree and the live working
/// tree.
///
/// Construction locates the repository by searching the given directory
/// and its ancestors; each extraction call resolves a reference to its
/// tree, walks the entry-level difference against the working tree, and
/// re-diffs every candidate entry over line-ending-normalized content so
/// terminator-only differences never surface as changes.
///
/// The working tree is read live at extraction time, never snapshotted at
/// construction. One instance must not be shared across threads without
/// external serialization; all I/O is synchronous and blocking, and every
/// per-call resource is released on all exit paths.
pub struct DiffExtractor {
    repo: Repository,
    workdir: PathBuf,
    policy: LineEndingPolicy,
}

impl std::fmt::Debug for DiffExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffExtractor")
            .field("workdir", &self.workdir)
            .field("policy", &self.policy)
            .finish()
    }
}

impl DiffExtractor {
    /// Open the repository containing `workdir`, with the platform-native
    /// line-ending policy.
    ///
    /// The metadata directory is searched for in `workdir` and its
    /// ancestors; ambient user- and system-level git configuration is read
    /// as defaults when the repository is opened. The configured
    /// `core.autocrlf` is only logged — the normalization policy is always
    /// the explicit one, never the ambient one.
    ///
    /// # Errors
    /// Returns [`Error::RepositoryNotFound`] when no repository is
    /// discoverable from `workdir`, and [`Error::BareRepository`] when the
    /// discovered repository has no working tree.
    pub fn open(workdir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_policy(workdir, LineEndingPolicy::native())
    }

    /// Open with an explicitly chosen line-ending policy.
    pub fn open_with_policy(
        workdir: impl AsRef<Path>,
        policy: LineEndingPolicy,
    ) -> Result<Self> {
        let start = workdir.as_ref();
        let repo = Repository::discover(start)
            .map_err(|e| Error::repository_not_found(start, e))?;

        let workdir = match repo.workdir() {
            Some(dir) => dir.to_path_buf(),
            None => {
                return Err(Error::BareRepository {
                    path: repo.path().to_path_buf(),
                })
            }
        };

        let ambient = repo
            .config()
            .and_then(|cfg| cfg.get_string("core.autocrlf"))
            .unwrap_or_else(|_| String::from("unset"));
        debug!(
            "opened {} (line-ending policy {}, ambient core.autocrlf {})",
            workdir.display(),
            policy,
            ambient
        );

        Ok(Self {
            repo,
            workdir,
            policy,
        })
    }

    /// Root of the working tree being diffed.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// The line-ending policy forced on comparisons.
    pub fn policy(&self) -> LineEndingPolicy {
        self.policy
    }

    /// Unified diff text between the tree `reference` resolves to and the
    /// working tree, concatenated across files in tree-walk order.
    ///
    /// Identical content yields an empty string, not an error.
    ///
    /// # Errors
    /// [`Error::ReferenceNotFound`] when `reference` does not resolve to a
    /// tree; [`Error::MalformedRepository`] when historical data resolves
    /// but cannot be read.
    pub fn obtain(&self, reference: &str) -> Result<String> {
        let patches = self.scan(reference)?;
        let mut text = String::new();
        for patch in &patches {
            patch.render_into(&mut text);
        }
        debug!(
            "{} file(s) differ against '{}'",
            patches.len(),
            reference
        );
        trace!("diff against '{}':\n{}", reference, text);
        Ok(text)
    }

    /// Structured per-file changed line ranges for the same walk as
    /// [`obtain`](Self::obtain).
    pub fn changes(&self, reference: &str) -> Result<DiffResult> {
        let patches = self.scan(reference)?;
        Ok(DiffResult {
            files: patches.iter().map(FilePatch::to_file_changes).collect(),
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Resolve a reference string (branch, `HEAD`, tag, commit id — any
    /// rev-parse form) to its tree.
    fn resolve_tree(&self, reference: &str) -> Result<git2::Tree<'_>> {
        let object = self.repo.revparse_single(reference).map_err(|e| {
            match e.code() {
                git2::ErrorCode::NotFound
                | git2::ErrorCode::InvalidSpec
                | git2::ErrorCode::Ambiguous
                | git2::ErrorCode::UnbornBranch => Error::reference_not_found(reference, e),
                _ => Error::Git(e),
            }
        })?;

        let peeled = object.peel(ObjectType::Tree).map_err(|e| match e.code() {
            git2::ErrorCode::Peel | git2::ErrorCode::NotFound => {
                Error::reference_not_found(reference, e)
            }
            _ => Error::malformed(format!("cannot read tree for '{}'", reference), e),
        })?;

        peeled.into_tree().map_err(|_| {
            Error::malformed_msg(format!("object for '{}' is not a tree", reference))
        })
    }

    /// Walk the entry-level difference and build a patch per file that
    /// still differs after normalization.
    fn scan(&self, reference: &str) -> Result<Vec<FilePatch>> {
        let tree = self.resolve_tree(reference)?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let diff = self
            .repo
            .diff_tree_to_workdir(Some(&tree), Some(&mut opts))?;

        let mut patches = Vec::new();
        for delta in diff.deltas() {
            if let Some(patch) = self.diff_entry(&delta)? {
                trace!("{}: {}", patch.path, patch.status);
                patches.push(patch);
            }
        }
        Ok(patches)
    }

    /// Re-diff one candidate entry over normalized content.
    ///
    /// Returns `None` for entries that turn out identical after
    /// normalization (terminator-only or stat-only differences) and for
    /// entry kinds with no line content (submodules).
    fn diff_entry(&self, delta: &git2::DiffDelta<'_>) -> Result<Option<FilePatch>> {
        let status = match delta.status() {
            Delta::Added | Delta::Untracked => ChangeStatus::Added,
            Delta::Deleted => ChangeStatus::Deleted,
            Delta::Modified | Delta::Typechange => ChangeStatus::Modified,
            _ => return Ok(None),
        };

        if delta.old_file().mode() == FileMode::Commit
            || delta.new_file().mode() == FileMode::Commit
        {
            trace!("skipping submodule entry {:?}", delta.new_file().path());
            return Ok(None);
        }

        let rel = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .ok_or_else(|| Error::malformed_msg("diff entry without a path"))?;
        let path = normalize_path(rel);

        let old_raw = match status {
            ChangeStatus::Added => None,
            _ => Some(self.read_blob(delta.old_file().id(), &path)?),
        };
        let new_raw = match status {
            ChangeStatus::Deleted => None,
            _ => Some(self.read_worktree(rel, delta.new_file().mode())?),
        };

        let old_mode = mode_bits(delta.old_file().mode());
        let new_mode = mode_bits(delta.new_file().mode());

        let old_norm = old_raw.as_deref().map(|b| self.policy.normalize(b));
        let new_norm = new_raw.as_deref().map(|b| self.policy.normalize(b));

        if let (Some(old), Some(new)) = (&old_norm, &new_norm) {
            if old.as_ref() == new.as_ref() && old_mode == new_mode {
                trace!("{}: identical after normalization", path);
                return Ok(None);
            }
        }

        let binary = old_norm.as_deref().map_or(false, is_binary)
            || new_norm.as_deref().map_or(false, is_binary);

        let old_id = match &old_norm {
            Some(_) => short_id(delta.old_file().id()),
            None => null_id(),
        };
        let new_id = match &new_norm {
            Some(content) => {
                short_id(git2::Oid::hash_object(ObjectType::Blob, content.as_ref())?)
            }
            None => null_id(),
        };

        let mut file_patch = FilePatch {
            path,
            status,
            binary,
            old_id,
            new_id,
            old_mode,
            new_mode,
            hunks: Vec::new(),
        };

        if binary {
            return Ok(Some(file_patch));
        }

        let hunks = RefCell::new(Vec::<HunkPatch>::new());
        {
            let mut hunk_cb = |_delta: git2::DiffDelta<'_>, hunk: git2::DiffHunk<'_>| -> bool {
                hunks.borrow_mut().push(HunkPatch {
                    header: String::from_utf8_lossy(hunk.header()).into_owned(),
                    lines: Vec::new(),
                });
                true
            };
            let mut line_cb = |_delta: git2::DiffDelta<'_>,
                               _hunk: Option<git2::DiffHunk<'_>>,
                               line: git2::DiffLine<'_>|
             -> bool {
                let mut hunks = hunks.borrow_mut();
                if let Some(current) = hunks.last_mut() {
                    current.lines.push(PatchLine {
                        origin: line.origin(),
                        old_lineno: line.old_lineno(),
                        new_lineno: line.new_lineno(),
                        content: line.content().to_vec(),
                    });
                }
                true
            };
            self.repo.diff_buffers(
                old_norm.as_deref(),
                Some(file_patch.path.as_str()),
                new_norm.as_deref(),
                Some(file_patch.path.as_str()),
                None,
                None,
                None,
                Some(&mut hunk_cb),
                Some(&mut line_cb),
            )?;
        }
        file_patch.hunks = hunks.into_inner();

        Ok(Some(file_patch))
    }

    /// Read a historical blob; a tree that references an unreadable object
    /// is corrupt, not missing.
    fn read_blob(&self, oid: git2::Oid, path: &str) -> Result<Vec<u8>> {
        let blob = self
            .repo
            .find_blob(oid)
            .map_err(|e| Error::malformed(format!("cannot read blob {} for {}", oid, path), e))?;
        Ok(blob.content().to_vec())
    }

    /// Read a working-tree entry's content, live. Symlinks contribute
    /// their target path, matching how git stores them.
    fn read_worktree(&self, rel: &Path, mode: FileMode) -> Result<Vec<u8>> {
        let full = self.workdir.join(rel);
        if mode == FileMode::Link {
            let target =
                std::fs::read_link(&full).map_err(|e| Error::io(full.as_path(), e))?;
            return Ok(target.as_os_str().as_encoded_bytes().to_vec());
        }
        std::fs::read(&full).map_err(|e| Error::io(full.as_path(), e))
    }
}

/// Git filemode bits for a delta side, `None` when the side is absent.
fn mode_bits(mode: FileMode) -> Option<u32> {
    match mode {
        FileMode::Unreadable => None,
        other => Some(other as u32),
    }
}
