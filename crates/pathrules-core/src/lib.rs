//! pathrules core
//!
//! A library for resolving repository paths against two kinds of rule
//! documents:
//!
//! - **Ownership documents** (CODEOWNERS-style): which approvers own a
//!   path, with GitHub and GitLab features — sections, optional sections,
//!   minimum approver counts, default approvers, role tokens, exclusion
//!   patterns, escaped spaces.
//! - **Ignore documents** (gitignore-style): whether a path is excluded,
//!   with negation, base-directory scoping, and whole-tree resolution
//!   across nested documents.
//!
//! Both engines compile the shared glob-like expression language with
//! [`pattern::CompiledPattern`] and resolve ordered rule lists with
//! last-relevant-match-wins precedence.
//!
//! # Quick Start
//!
//! ```rust
//! use pathrules_core::{CodeOwners, GitIgnore, Verdict};
//!
//! let codeowners = CodeOwners::parse(
//!     "# CODEOWNERS file\n\
//!      *.rs @rustacean\n\
//!      /docs/ @github/docs-team\n",
//! )?;
//! assert_eq!(
//!     codeowners.all_approvers("src/parse/mod.rs"),
//!     vec!["@rustacean"]
//! );
//! assert_eq!(
//!     codeowners.all_approvers("docs/index.md"),
//!     vec!["@github/docs-team"]
//! );
//!
//! let gitignore = GitIgnore::new("target/\n!target/keep.me\n")?;
//! // The directory-wide ignore cannot be negated afterwards.
//! assert_eq!(gitignore.verdict("target/keep.me"), Verdict::Ignored);
//! # Ok::<(), pathrules_core::PatternError>(())
//! ```
//!
//! # Modules
//!
//! - [`pattern`]: the expression compiler shared by both engines
//! - [`owners`]: ownership documents and approver resolution
//! - [`ignore`]: ignore documents, file sets, and discovery
//! - [`parse`]: the line-level parsers

use std::path::{Path, PathBuf};

pub mod ignore;
pub mod owners;
pub mod parse;
pub mod pattern;

// Re-export commonly used types at the crate root
pub use ignore::{GitIgnore, GitIgnoreFileSet, IgnoreRule, QueryPathError, Verdict};
pub use owners::{CodeOwners, OwnershipRule, Section, StructuralProblem};
pub use pattern::{CompiledPattern, Dialect, PatternError};

/// Finds the ownership document in a repository.
///
/// Searches in the following locations (in order):
/// 1. `.github/CODEOWNERS`
/// 2. `.gitlab/CODEOWNERS`
/// 3. `docs/CODEOWNERS`
/// 4. `CODEOWNERS`
///
/// Returns `Some(path)` if found, `None` otherwise.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pathrules_core::find_codeowners_file;
///
/// if let Some(path) = find_codeowners_file(Path::new("/path/to/repo")) {
///     println!("Found CODEOWNERS at: {}", path.display());
/// }
/// ```
pub fn find_codeowners_file(repo_path: &Path) -> Option<PathBuf> {
    let locations = [
        repo_path.join(".github/CODEOWNERS"),
        repo_path.join(".gitlab/CODEOWNERS"),
        repo_path.join("docs/CODEOWNERS"),
        repo_path.join("CODEOWNERS"),
    ];
    locations.into_iter().find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_codeowners_in_preferred_location() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".github")).unwrap();
        fs::write(dir.path().join(".github/CODEOWNERS"), "* @team\n").unwrap();
        fs::write(dir.path().join("CODEOWNERS"), "* @other\n").unwrap();

        let found = find_codeowners_file(dir.path()).unwrap();
        assert!(found.ends_with(".github/CODEOWNERS"));
    }

    #[test]
    fn missing_codeowners_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_codeowners_file(dir.path()).is_none());
    }

    #[test]
    fn documents_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CodeOwners>();
        assert_send_sync::<GitIgnore>();
        assert_send_sync::<GitIgnoreFileSet>();
        assert_send_sync::<CompiledPattern>();
    }
}
