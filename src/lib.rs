//! Changed-line extraction between a git tree and the working tree.
//!
//! `covdiff` opens the repository containing a working directory, resolves
//! a reference (branch name, `HEAD`, tag, or commit id) to its tree, and
//! diffs that tree against the live on-disk files — with the line-ending
//! normalization policy forced explicitly, so identical lines checked out
//! with different terminators never surface as changes. The result feeds
//! coverage-on-changed-lines tooling, either as unified diff text or as
//! structured per-file line ranges.
//!
//! # Key types
//!
//! - [`DiffExtractor`] — owns the repository handle; construct once, call
//!   [`obtain`](DiffExtractor::obtain) or
//!   [`changes`](DiffExtractor::changes) per extraction.
//! - [`DiffResult`] — ordered per-file [`FileChanges`] records with
//!   added/removed [`LineRange`]s, the shape a coverage evaluator joins
//!   against a coverage report.
//! - [`LineEndingPolicy`] — the forced normalization mode, selected from
//!   the host platform's native separator by default.
//!
//! # Quick example
//!
//! ```rust,no_run
//! use covdiff::DiffExtractor;
//!
//! let extractor = DiffExtractor::open(".")?;
//! let diff_text = extractor.obtain("HEAD")?;
//!
//! let result = extractor.changes("refs/heads/master")?;
//! for file in &result {
//!     println!("{} ({})", file.path, file.status);
//! }
//! # Ok::<(), covdiff::Error>(())
//! ```

pub mod changes;
pub mod error;
pub mod extractor;
pub mod normalize;

mod patch;

// Re-export primary public types at crate root.
pub use changes::{ChangeStatus, DiffResult, FileChanges, LineRange};
pub use error::{Error, Result};
pub use extractor::DiffExtractor;
pub use normalize::LineEndingPolicy;
