//! A set of ignore documents covering a directory tree.
//!
//! Documents are ordered by their base directory so that the root document
//! is consulted first and the deepest document last; the last
//! non-abstaining verdict wins, matching how nested `.gitignore` files
//! override their ancestors.

use super::{GitIgnore, Verdict};
use crate::pattern::{PatternError, normalize_path};
use log::{debug, error};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

/// A query used a path that cannot be interpreted under the project root.
///
/// Raised for absolute-mode queries only; project-relative queries are
/// taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("path `{path}` cannot be rebased under the project root `{project_root}`")]
pub struct QueryPathError {
    /// The query path as given.
    pub path: String,
    /// The configured project root.
    pub project_root: String,
}

/// An ordered collection of [`GitIgnore`] documents for one project tree.
#[derive(Debug, Clone)]
pub struct GitIgnoreFileSet {
    project_root: String,
    files: BTreeMap<String, Vec<GitIgnore>>,
    queries_are_project_relative: bool,
}

impl GitIgnoreFileSet {
    /// Creates an empty set for a project root. Queries are assumed to
    /// include the project root until told otherwise.
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_string_lossy();
        let mut normalized = normalize_path(&root);
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Self {
            project_root: normalized,
            files: BTreeMap::new(),
            queries_are_project_relative: false,
        }
    }

    /// Creates a set and loads every `.gitignore` document found under the
    /// project root. Unreadable files are logged and skipped; a document
    /// that fails to compile aborts the construction.
    pub fn discover(project_root: impl AsRef<Path>) -> Result<Self, PatternError> {
        let root = project_root.as_ref();
        let mut set = Self::new(root);
        for entry in WalkDir::new(root).follow_links(false) {
            match entry {
                Ok(entry)
                    if entry.file_type().is_file() && entry.file_name() == ".gitignore" =>
                {
                    set.add_gitignore_file(entry.path())?;
                }
                Ok(_) => {}
                Err(err) => error!("unable to scan for ignore files: {err}"),
            }
        }
        debug!(
            "discovered {} ignore document(s) under {}",
            set.files.values().map(Vec::len).sum::<usize>(),
            set.project_root
        );
        Ok(set)
    }

    /// Adds an already-parsed document. Documents sharing a base directory
    /// are evaluated in the order they were added.
    pub fn add(&mut self, gitignore: GitIgnore) {
        self.files
            .entry(gitignore.base_dir().to_string())
            .or_default()
            .push(gitignore);
    }

    /// Reads and adds one ignore file, deriving its base directory from
    /// the file's location relative to the project root. An unreadable
    /// file is logged and skipped.
    pub fn add_gitignore_file(&mut self, path: &Path) -> Result<(), PatternError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                error!("cannot read {}: {err}; skipping this file", path.display());
                return Ok(());
            }
        };
        let parent = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base_dir = self.rebase_dir(&parent);
        self.add(GitIgnore::with_base_dir(&base_dir, &content)?);
        Ok(())
    }

    /// True when no documents were added.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// After this call, queries are taken as project-relative paths.
    pub fn assume_queries_are_project_relative(&mut self) {
        self.queries_are_project_relative = true;
    }

    /// After this call, queries are expected to include the project root
    /// (the default).
    pub fn assume_queries_include_project_base_dir(&mut self) {
        self.queries_are_project_relative = false;
    }

    /// Resolves the combined verdict for a filename using the configured
    /// query mode.
    pub fn verdict(&self, filename: &str) -> Result<Verdict, QueryPathError> {
        self.verdict_with(filename, self.queries_are_project_relative)
    }

    /// Resolves the combined verdict, stating explicitly whether the
    /// filename is project-relative.
    ///
    /// Documents are consulted in ascending base-directory order (the root
    /// before anything nested); each non-abstaining per-document verdict
    /// overwrites the running result, so the deepest document that has an
    /// opinion wins.
    pub fn verdict_with(
        &self,
        filename: &str,
        is_project_relative: bool,
    ) -> Result<Verdict, QueryPathError> {
        let path = self.project_relative(filename, is_project_relative)?;
        let mut result = Verdict::Abstain;
        for documents in self.files.values() {
            for gitignore in documents {
                let verdict = gitignore.verdict_normalized(&path);
                if !verdict.is_abstain() {
                    result = verdict;
                }
            }
        }
        Ok(result)
    }

    /// True when the combined verdict is [`Verdict::Ignored`].
    pub fn ignore_file(&self, filename: &str) -> Result<bool, QueryPathError> {
        Ok(self.verdict(filename)?.is_ignored())
    }

    /// Like [`ignore_file`](Self::ignore_file) with an explicit query mode.
    pub fn ignore_file_with(
        &self,
        filename: &str,
        is_project_relative: bool,
    ) -> Result<bool, QueryPathError> {
        Ok(self.verdict_with(filename, is_project_relative)?.is_ignored())
    }

    /// True when the file is not ignored.
    pub fn keep_file(&self, filename: &str) -> Result<bool, QueryPathError> {
        Ok(!self.ignore_file(filename)?)
    }

    /// Like [`keep_file`](Self::keep_file) with an explicit query mode.
    pub fn keep_file_with(
        &self,
        filename: &str,
        is_project_relative: bool,
    ) -> Result<bool, QueryPathError> {
        Ok(!self.ignore_file_with(filename, is_project_relative)?)
    }

    /// Converts a query path to project-relative rooted form.
    fn project_relative(
        &self,
        filename: &str,
        is_project_relative: bool,
    ) -> Result<String, QueryPathError> {
        let normalized = normalize_path(filename);
        if is_project_relative || self.project_root == "/" {
            return Ok(normalized);
        }
        if normalized.as_str() == &self.project_root[..self.project_root.len() - 1] {
            return Ok("/".to_string());
        }
        match normalized.strip_prefix(&self.project_root) {
            Some(rest) => Ok(format!("/{rest}")),
            None => Err(QueryPathError {
                path: filename.to_string(),
                project_root: self.project_root.trim_end_matches('/').to_string(),
            }),
        }
    }

    /// Converts an on-disk directory to a base dir under the project root.
    fn rebase_dir(&self, directory: &str) -> String {
        let normalized = normalize_path(directory);
        if self.project_root == "/" {
            return normalized;
        }
        if normalized.as_str() == &self.project_root[..self.project_root.len() - 1] {
            return "/".to_string();
        }
        match normalized.strip_prefix(&self.project_root) {
            Some(rest) => format!("/{rest}"),
            None => normalized,
        }
    }
}

impl fmt::Display for GitIgnoreFileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# GitIgnoreFileSet for {}:", self.project_root)?;
        for documents in self.files.values() {
            for gitignore in documents {
                write!(f, "{gitignore}")?;
                writeln!(f, "# =========================")?;
            }
        }
        Ok(())
    }
}
