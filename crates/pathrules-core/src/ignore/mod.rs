//! Gitignore-style exclusion documents.
//!
//! A [`GitIgnore`] holds the ordered rules of one ignore document, scoped
//! to the directory the document lives in. Matching follows gitignore
//! semantics, including the documented quirk where a rule ignoring a whole
//! directory cannot be negated by a later rule in the same file.
//!
//! # Example
//!
//! ```rust
//! use pathrules_core::{GitIgnore, Verdict};
//!
//! let gitignore = GitIgnore::new("*.log\n!important.log\n")?;
//! assert_eq!(gitignore.verdict("logs/debug.log"), Verdict::Ignored);
//! assert_eq!(gitignore.verdict("important.log"), Verdict::Kept);
//! assert_eq!(gitignore.verdict("README.md"), Verdict::Abstain);
//! # Ok::<(), pathrules_core::PatternError>(())
//! ```

mod file_set;

pub use file_set::{GitIgnoreFileSet, QueryPathError};

use crate::parse::{IgnoreLine, parse_ignore_line};
use crate::pattern::{CompiledPattern, Dialect, PatternError, normalize_path};
use log::trace;
use std::borrow::Cow;
use std::fmt;

/// The outcome of asking an ignore document about one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A rule matched and the path must be ignored.
    Ignored,
    /// A negated rule matched and the path must be kept.
    Kept,
    /// No rule had an opinion.
    Abstain,
}

impl Verdict {
    /// True for [`Verdict::Ignored`].
    pub fn is_ignored(self) -> bool {
        self == Verdict::Ignored
    }

    /// True for anything but [`Verdict::Ignored`].
    pub fn is_kept(self) -> bool {
        !self.is_ignored()
    }

    /// True when no rule matched.
    pub fn is_abstain(self) -> bool {
        self == Verdict::Abstain
    }
}

/// One ignore rule scoped to a base directory.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    file_expression: String,
    negate: bool,
    pattern: CompiledPattern,
    whole_directory_match: bool,
    base_dir: String,
}

impl IgnoreRule {
    /// Builds a rule from an already-split negation flag and expression.
    pub fn new(base_dir: &str, negate: bool, expression: &str) -> Result<Self, PatternError> {
        let expression = expression.trim();
        let pattern = CompiledPattern::compile(expression, Dialect::Ignore)?;
        Ok(Self {
            file_expression: expression.to_string(),
            negate,
            pattern,
            whole_directory_match: !negate && expression.ends_with('/'),
            base_dir: normalize_base_dir(base_dir),
        })
    }

    /// The expression as it appeared in the document, negation included.
    pub fn ignore_expression(&self) -> String {
        if self.negate {
            format!("!{}", self.file_expression)
        } else {
            self.file_expression.clone()
        }
    }

    /// True for `!pattern` rules.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// True when this rule targets an entire directory subtree. Such a
    /// match disables later negations in the same file.
    pub fn is_whole_directory_match(&self) -> bool {
        self.whole_directory_match
    }

    /// The directory the owning document is scoped to.
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// The compiled matcher.
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    fn verdict(&self, relative_path: &str) -> Verdict {
        if !self.pattern.matches_normalized(relative_path) {
            return Verdict::Abstain;
        }
        if self.negate {
            Verdict::Kept
        } else {
            Verdict::Ignored
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ignore_expression())
    }
}

/// One parsed ignore document with the directory it is scoped to.
#[derive(Debug, Clone)]
pub struct GitIgnore {
    base_dir: String,
    rules: Vec<IgnoreRule>,
}

impl GitIgnore {
    /// Parses a document scoped to the project root.
    pub fn new(content: &str) -> Result<Self, PatternError> {
        Self::with_base_dir("", content)
    }

    /// Parses a document scoped to `base_dir` (the directory the ignore
    /// file lives in, relative to the project root).
    pub fn with_base_dir(base_dir: &str, content: &str) -> Result<Self, PatternError> {
        let base_dir = normalize_base_dir(base_dir);
        let mut rules = Vec::new();
        for line in content.lines() {
            match parse_ignore_line(line) {
                IgnoreLine::Blank | IgnoreLine::Comment(_) => {}
                IgnoreLine::Rule { negate, pattern } => {
                    rules.push(IgnoreRule::new(&base_dir, negate, pattern)?);
                }
            }
        }
        Ok(Self { base_dir, rules })
    }

    /// The normalized base directory, with exactly one leading and one
    /// trailing separator.
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// The document's rules in file order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Resolves the document's verdict for a filename.
    ///
    /// Paths outside the base directory abstain. Rules are scanned in file
    /// order, later matches overriding earlier ones, except that a match
    /// on a non-negated whole-directory rule is final: files inside an
    /// ignored directory cannot be un-ignored by a later rule.
    pub fn verdict(&self, filename: &str) -> Verdict {
        let path = normalize_path(filename);
        self.verdict_normalized(&path)
    }

    pub(crate) fn verdict_normalized(&self, path: &str) -> Verdict {
        let Some(relative) = self.relativize(path) else {
            trace!("{path} is outside base dir {}", self.base_dir);
            return Verdict::Abstain;
        };

        let mut verdict = Verdict::Abstain;
        for rule in &self.rules {
            let ruled = rule.verdict(&relative);
            if ruled == Verdict::Abstain {
                continue;
            }
            trace!("`{}` ruled {ruled:?} for {path}", rule.ignore_expression());
            verdict = ruled;
            if ruled == Verdict::Ignored && rule.whole_directory_match {
                // A directory-wide ignore is final within this file.
                break;
            }
        }
        verdict
    }

    /// Re-roots a normalized path below the base directory, or `None` when
    /// the path does not lie under it.
    fn relativize<'a>(&self, path: &'a str) -> Option<Cow<'a, str>> {
        if self.base_dir == "/" {
            return Some(Cow::Borrowed(path));
        }
        path.strip_prefix(&self.base_dir)
            .map(|rest| Cow::Owned(format!("/{rest}")))
    }
}

impl fmt::Display for GitIgnore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# GitIgnore file for {}:", self.base_dir)?;
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

/// Normalizes a base directory string: separators unified, surrounding
/// whitespace trimmed, exactly one leading and one trailing `/`.
fn normalize_base_dir(base_dir: &str) -> String {
    let trimmed = base_dir.trim();
    if trimmed.is_empty() || trimmed == "/" || trimmed == "\\" {
        return "/".to_string();
    }
    let mut normalized = normalize_path(trimmed);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gitignore(content: &str) -> GitIgnore {
        GitIgnore::new(content).unwrap()
    }

    fn assert_ignored(gitignore: &GitIgnore, filename: &str) {
        assert_eq!(
            gitignore.verdict(filename),
            Verdict::Ignored,
            "{filename} should be ignored"
        );
    }

    fn assert_kept(gitignore: &GitIgnore, filename: &str) {
        assert_eq!(
            gitignore.verdict(filename),
            Verdict::Kept,
            "{filename} should be explicitly kept"
        );
    }

    fn assert_abstain(gitignore: &GitIgnore, filename: &str) {
        assert_eq!(
            gitignore.verdict(filename),
            Verdict::Abstain,
            "{filename} should have no verdict"
        );
    }

    #[test]
    fn wildcard_extension() {
        let gitignore = gitignore("*.log\n");
        assert_ignored(&gitignore, "debug.log");
        assert_ignored(&gitignore, "foo.log");
        assert_ignored(&gitignore, ".log");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_abstain(&gitignore, "debug.txt");
    }

    #[test]
    fn negation_keeps_later_matches() {
        let gitignore = gitignore("*.log\n!important.log\n");
        assert_ignored(&gitignore, "debug.log");
        assert_ignored(&gitignore, "trace.log");
        assert_kept(&gitignore, "important.log");
        assert_kept(&gitignore, "logs/important.log");
    }

    #[test]
    fn rules_after_a_negation_reignore() {
        let gitignore = gitignore("*.log\n!important/*.log\ntrace.* \n");
        assert_ignored(&gitignore, "debug.log");
        assert_ignored(&gitignore, "important/trace.log");
        assert_kept(&gitignore, "important/debug.log");
        assert_ignored(&gitignore, "trace.txt");
    }

    #[test]
    fn leading_slash_pins_to_root() {
        let gitignore = gitignore("/debug.log \n");
        assert_ignored(&gitignore, "debug.log");
        assert_abstain(&gitignore, "logs/debug.log");
    }

    #[test]
    fn bare_name_matches_any_directory() {
        let gitignore = gitignore("debug.log\n");
        assert_ignored(&gitignore, "debug.log");
        assert_ignored(&gitignore, "logs/debug.log");
    }

    #[test]
    fn name_without_slash_matches_files_and_directories() {
        let gitignore = gitignore("logs\n");
        assert_ignored(&gitignore, "logs");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "logs/latest/foo.bar");
        assert_ignored(&gitignore, "build/logs");
        assert_ignored(&gitignore, "build/logs/debug.log");
    }

    #[test]
    fn trailing_slash_matches_directory_contents_anywhere() {
        let gitignore = gitignore("logs/\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "logs/latest/foo.bar");
        assert_ignored(&gitignore, "build/logs/foo.bar");
        assert_ignored(&gitignore, "build/logs/latest/debug.log");
        assert_abstain(&gitignore, "logs");
    }

    #[test]
    fn directory_ignore_cannot_be_negated() {
        // Git's documented quirk: a file inside an ignored directory
        // cannot be selectively un-ignored.
        let gitignore = gitignore("logs/\n!logs/important.log\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "logs/important.log");
    }

    #[test]
    fn directory_ignore_quirk_is_order_independent() {
        let gitignore = gitignore("!logs/important.log\nlogs/\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "logs/important.log");
    }

    #[test]
    fn directory_ignore_quirk_with_anchored_directories() {
        let gitignore = gitignore("/.idea/\n!/.idea/runConfigurations/\n");
        assert_ignored(&gitignore, ".idea/ignore.txt");
        assert_ignored(&gitignore, ".idea/runConfigurations/important.txt");
    }

    #[test]
    fn globstar_prefix() {
        let gitignore = gitignore("**/logs\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "logs/monday/foo.bar");
        assert_ignored(&gitignore, "build/logs/debug.log");
    }

    #[test]
    fn globstar_prefix_with_file() {
        let gitignore = gitignore("**/logs/debug.log\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "build/logs/debug.log");
        assert_abstain(&gitignore, "logs/build/debug.log");
    }

    #[test]
    fn globstar_between_directories() {
        let gitignore = gitignore("logs/**/debug.log\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "logs/monday/debug.log");
        assert_ignored(&gitignore, "logs/monday/pm/debug.log");
    }

    #[test]
    fn wildcard_in_directory_name() {
        let gitignore = gitignore("logs/*day/debug.log\n");
        assert_ignored(&gitignore, "logs/monday/debug.log");
        assert_ignored(&gitignore, "logs/tuesday/debug.log");
        assert_abstain(&gitignore, "logs/latest/debug.log");
    }

    #[test]
    fn single_char_wildcard() {
        let gitignore = gitignore("debug?.log \n");
        assert_ignored(&gitignore, "debug0.log");
        assert_ignored(&gitignore, "debugg.log");
        assert_abstain(&gitignore, "debug10.log");
    }

    #[test]
    fn char_ranges_and_sets() {
        let range = gitignore("debug[0-9].log \n");
        assert_ignored(&range, "debug0.log");
        assert_abstain(&range, "debug10.log");

        let set = gitignore("debug[01].log\n");
        assert_ignored(&set, "debug0.log");
        assert_ignored(&set, "debug1.log");
        assert_abstain(&set, "debug2.log");
        assert_abstain(&set, "debug01.log");

        let not_set = gitignore("debug[!01].log \n");
        assert_ignored(&not_set, "debug2.log");
        assert_abstain(&not_set, "debug0.log");
        assert_abstain(&not_set, "debug01.log");

        let alpha = gitignore("debug[a-z].log \n");
        assert_ignored(&alpha, "debuga.log");
        assert_abstain(&alpha, "debug1.log");
    }

    #[test]
    fn subdirectory_depth_exactness() {
        let gitignore = gitignore("/dir1/*\n/dir2/*/*\n/dir3/*/*/*\n/dir4/**/*\n");

        assert_ignored(&gitignore, "/dir1/bar.txt");
        assert_ignored(&gitignore, "/dir1//bar.txt");
        assert_abstain(&gitignore, "/dir1/foo/bar.txt");

        assert_abstain(&gitignore, "/dir2/bar.txt");
        assert_abstain(&gitignore, "/dir2//bar.txt");
        assert_ignored(&gitignore, "/dir2/foo/bar.txt");
        assert_abstain(&gitignore, "/dir2/foo/foo/bar.txt");

        assert_abstain(&gitignore, "/dir3/foo/bar.txt");
        assert_ignored(&gitignore, "/dir3/foo/foo/bar.txt");
        assert_ignored(&gitignore, "/dir3///foo///foo////bar.txt");
        assert_abstain(&gitignore, "/dir3///bar.txt");
        assert_abstain(&gitignore, "/dir3/foo/foo/foo/bar.txt");

        assert_ignored(&gitignore, "/dir4/bar.txt");
        assert_ignored(&gitignore, "/dir4/foo/bar.txt");
        assert_ignored(&gitignore, "/dir4/foo/foo/foo/bar.txt");
    }

    #[test]
    fn relative_path_is_root_anchored() {
        let gitignore = gitignore("logs/debug.log\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_ignored(&gitignore, "/logs/debug.log");
        assert_abstain(&gitignore, "debug.log");
        assert_abstain(&gitignore, "build/logs/debug.log");
    }

    #[test]
    fn escaped_specials_are_literal() {
        let gitignore = gitignore("foo\\[01\\].txt \n");
        assert_ignored(&gitignore, "foo[01].txt");
        assert_abstain(&gitignore, "foo01.txt");
        assert_abstain(&gitignore, "foo0.txt");
    }

    #[test]
    fn full_feature_expression_parses() {
        let gitignore =
            gitignore("*.log\n!\\#important?/debug[0-9]/debug[!01]/**/*debug[a-z]/*.log\n");
        assert_ignored(&gitignore, "logs/debug.log");
        assert_abstain(
            &gitignore,
            "#important_/debug4/debug4/something/something/local_debugb/Something.logxxx",
        );
        assert_kept(
            &gitignore,
            "#important_/debug4/debug4/something/something/local_debugb/Something.log",
        );
    }

    #[test]
    fn base_dir_scopes_the_whole_file() {
        for base_dir in ["src/test", "/src/test", "src/test/", "/src/test/"] {
            let gitignore = GitIgnore::with_base_dir(base_dir, "*.properties").unwrap();
            assert_eq!(gitignore.base_dir(), "/src/test/");
            assert_ignored(&gitignore, "src/test/test.properties");
            assert_ignored(&gitignore, "/src/test/test.properties");
            assert_ignored(&gitignore, "src/test/nested/test.properties");

            // Containing the base dir somewhere else is not enough.
            assert_abstain(&gitignore, "/somethingelse/src/test/test.properties");
            assert_abstain(&gitignore, "src/test.properties");
            assert_abstain(&gitignore, "foo/src/test/something.properties");
            assert_abstain(&gitignore, "src/main/test.properties");
            assert_abstain(&gitignore, "test.properties");
        }
    }

    #[test]
    fn base_dir_normalization() {
        assert_eq!(normalize_base_dir(""), "/");
        assert_eq!(normalize_base_dir("/"), "/");
        assert_eq!(normalize_base_dir("foo"), "/foo/");
        assert_eq!(normalize_base_dir("/foo"), "/foo/");
        assert_eq!(normalize_base_dir("foo/"), "/foo/");
        assert_eq!(normalize_base_dir("/foo/"), "/foo/");
        assert_eq!(normalize_base_dir("foo/bar"), "/foo/bar/");
        assert_eq!(normalize_base_dir("foo\\bar"), "/foo/bar/");
        assert_eq!(normalize_base_dir(" src/test "), "/src/test/");
    }

    #[test]
    fn root_anchored_rule_inside_base_dir() {
        let gitignore = GitIgnore::with_base_dir("src", "/main.rs\n").unwrap();
        assert_ignored(&gitignore, "src/main.rs");
        assert_abstain(&gitignore, "src/bin/main.rs");
        assert_abstain(&gitignore, "main.rs");
    }

    #[test]
    fn jetbrains_style_rules() {
        let gitignore = gitignore(
            "foo*\nfoo\n.~lock.*\n.log.*\n.log\n",
        );
        assert_ignored(&gitignore, "foo");
        assert_ignored(&gitignore, "/dir/foo");
        assert_ignored(&gitignore, "foobar");
        assert_ignored(&gitignore, ".log.something1234");
        assert_ignored(&gitignore, "/dir/.log.something1234");
        assert_ignored(&gitignore, ".~lock.something1234");
        assert_ignored(&gitignore, "/dir/.~lock.something1234");
        assert_abstain(&gitignore, ".logger");
        assert_abstain(&gitignore, "/dir/.logger");
        assert_abstain(&gitignore, ".~locker");
        assert_abstain(&gitignore, "/dir/.~locker");
    }

    #[test]
    fn extension_alternation_group() {
        let gitignore = gitignore("coverage*[.json, .xml, .info]\n");
        for extension in ["json", "xml", "info"] {
            assert_ignored(&gitignore, &format!("coverage.{extension}"));
            assert_ignored(&gitignore, &format!("coverage-001.{extension}"));
            assert_ignored(&gitignore, &format!("dir1/coverage-001.{extension}"));
            assert_abstain(&gitignore, &format!("foo_coverage-001.{extension}"));
        }
        assert_abstain(&gitignore, "coverage.j");
        assert_abstain(&gitignore, "coverage.");
    }

    #[test]
    fn special_character_rules() {
        let cases: &[(&str, &[&str], &[&str])] = &[
            ("*.project.~u", &["dummy.project.~u", "/dir/dummy.project.~u"], &[]),
            (".idea/**/workspace.xml", &[".idea/something/workspace.xml"], &[]),
            ("[Bb]uild/", &["build/foo.txt", "Build/foo.txt", "/dir/build/foo.txt"], &[]),
            ("Generated\\ Files/", &["Generated Files/foo.txt"], &[]),
            ("*~", &["foo.txt~", "/dir/foo.txt~"], &[]),
            ("*~.nib", &["foo.txt~.nib"], &["foo.txt~xnib"]),
            ("._*", &["._foo.txt", "/dir/._bar.txt"], &[]),
            ("@eaDir", &["@eaDir", "/dir/@eaDir"], &[]),
            ("\\#recycle", &["#recycle", "/dir/#recycle"], &[]),
            ("*.py[cod]", &["foo.pyc", "/dir/bar.pyo"], &["foo.pyx"]),
            ("*$py.class", &["foo.$py.class", "/dir/bar.$py.class"], &[]),
            ("*- [Bb]ackup ([0-9][0-9]).rdl", &["/dir/foo - Backup (42).rdl"], &[]),
            ("~$*.doc*", &["~$foo.docxx", "/dir/~$bar.doc"], &[]),
            ("*.l$?", &["foo.l$1", "/dir/bar.l$b"], &[]),
            ("*.$$$", &["foo.$$$", "/dir/bar.$$$"], &[]),
            (".#*", &[".#foo", "/dir/.#foo"], &[]),
            ("\\#*\\#", &["#foo#", "/dir/#foo#"], &[]),
            (".~lock.*#", &[".~lock.foo#", "/dir/.~lock.foo#"], &[]),
            ("*#", &["foo.#", "/dir/foo.#"], &[]),
            ("*#*#", &["foo.#bar#", "/dir/foo.#bar#"], &[]),
            (".#*.ss", &[".#foo.ss", "/dir/.#foo.ss"], &[]),
            ("\\#*.rkt#", &["#foo.rkt#", "/dir/#foo.rkt#"], &[]),
            ("*- Copy (*).*", &["Something - Copy (1).docx", "/dir/Something - Copy (1).docx"], &[]),
            ("_", &["_", "/dir/_"], &[]),
        ];
        for (pattern, ignored, kept) in cases {
            let gitignore = gitignore(&format!("{pattern}\n"));
            for filename in *ignored {
                assert_ignored(&gitignore, filename);
            }
            for filename in *kept {
                assert_abstain(&gitignore, filename);
            }
        }
    }

    #[test]
    fn bad_expression_fails_construction() {
        let err = GitIgnore::new("[\n").unwrap_err();
        assert!(matches!(err, PatternError::UnbalancedClass { .. }));
    }

    #[test]
    fn rule_introspection() {
        let gitignore = gitignore("*.log\n!important/*.log\nlogs/\n");
        let rules = gitignore.rules();
        assert_eq!(rules.len(), 3);

        assert_eq!(rules[0].ignore_expression(), "*.log");
        assert!(!rules[0].is_negated());
        assert!(!rules[0].is_whole_directory_match());

        assert_eq!(rules[1].ignore_expression(), "!important/*.log");
        assert!(rules[1].is_negated());
        assert!(!rules[1].is_whole_directory_match());

        assert_eq!(rules[2].ignore_expression(), "logs/");
        assert!(!rules[2].is_negated());
        assert!(rules[2].is_whole_directory_match());

        for rule in rules {
            assert_eq!(rule.base_dir(), "/");
        }
    }

    #[test]
    fn display_lists_rules() {
        let gitignore = gitignore("*.log\n!important.log\n");
        let rendered = gitignore.to_string();
        assert!(rendered.contains("*.log"));
        assert!(rendered.contains("!important.log"));
    }

    #[test]
    fn verdict_helpers() {
        assert!(Verdict::Ignored.is_ignored());
        assert!(!Verdict::Ignored.is_kept());
        assert!(Verdict::Kept.is_kept());
        assert!(!Verdict::Kept.is_abstain());
        assert!(Verdict::Abstain.is_kept());
        assert!(Verdict::Abstain.is_abstain());
    }
}
