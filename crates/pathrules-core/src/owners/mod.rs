//! Ownership documents: CODEOWNERS parsing and approver resolution.
//!
//! A document is an insertion-ordered collection of sections, each holding
//! an ordered list of rules. Rules preceding any section header land in an
//! implicit default section. Queries resolve a path to an ordered,
//! deduplicated approver list: within a section the last matching rule
//! wins, a matching exclusion rule (`!pattern`) removes the path from the
//! section outright, and sections contribute in insertion order.
//!
//! # Example
//!
//! ```rust
//! use pathrules_core::CodeOwners;
//!
//! let codeowners = CodeOwners::parse(
//!     "*.rs @rustacean\n\
//!      [Docs] @docs-team\n\
//!      docs/\n",
//! )?;
//! assert_eq!(codeowners.all_approvers("src/lib.rs"), vec!["@rustacean"]);
//! assert_eq!(codeowners.all_approvers("docs/index.md"), vec!["@docs-team"]);
//! # Ok::<(), pathrules_core::PatternError>(())
//! ```

mod problems;

pub use problems::StructuralProblem;

use crate::parse::{
    RuleLine, SectionHeader, is_blank_line, parse_comment_line, parse_rule_line,
    parse_section_header,
};
use crate::pattern::{CompiledPattern, Dialect, PatternError, normalize_path};
use log::{debug, error, trace, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The name given to the section collecting rules that precede any header.
pub const IMPLICIT_SECTION_NAME: &str = "Implicit Default Section";

/// One ownership rule: a compiled pattern and the approvers it names.
#[derive(Debug, Clone)]
pub struct OwnershipRule {
    file_expression: String,
    exclusion: bool,
    pattern: CompiledPattern,
    approvers: Vec<String>,
}

impl OwnershipRule {
    /// Builds a rule from a pattern token and its identifier tokens.
    ///
    /// A leading `!` marks the rule as an exclusion and is stripped before
    /// compilation. Identifiers are deduplicated in first-seen order and
    /// comment decorations around email addresses are removed.
    pub fn new(expression: &str, identifiers: &[&str]) -> Result<Self, PatternError> {
        let (exclusion, match_expression) = match expression.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, expression),
        };
        let pattern = CompiledPattern::compile(match_expression, Dialect::Ownership)?;

        let mut approvers = Vec::new();
        for identifier in identifiers {
            let cleaned = strip_email_comments(identifier.trim());
            if cleaned.is_empty() || approvers.contains(&cleaned) {
                continue;
            }
            approvers.push(cleaned);
        }

        Ok(Self {
            file_expression: expression.to_string(),
            exclusion,
            pattern,
            approvers,
        })
    }

    /// The pattern text exactly as written, including a leading `!`.
    pub fn file_expression(&self) -> &str {
        &self.file_expression
    }

    /// True when this rule excludes matching paths from its section.
    pub fn is_exclusion(&self) -> bool {
        self.exclusion
    }

    /// The compiled matcher.
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// The approvers named on the rule line, deduplicated in file order.
    pub fn approvers(&self) -> &[String] {
        &self.approvers
    }
}

impl fmt::Display for OwnershipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_expression)?;
        for approver in &self.approvers {
            write!(f, " {approver}")?;
        }
        Ok(())
    }
}

/// A named, ordered group of ownership rules with shared defaults.
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    optional: bool,
    min_approvers: u32,
    default_approvers: Vec<String>,
    rules: Vec<OwnershipRule>,
}

impl Section {
    fn implicit() -> Self {
        Self {
            name: IMPLICIT_SECTION_NAME.to_string(),
            optional: false,
            min_approvers: 0,
            default_approvers: Vec::new(),
            rules: Vec::new(),
        }
    }

    fn from_header(header: &SectionHeader<'_>) -> Self {
        let mut section = Self {
            name: header.name.to_string(),
            optional: header.optional,
            min_approvers: header.min_approvers.unwrap_or(0),
            default_approvers: Vec::new(),
            rules: Vec::new(),
        };
        for identifier in &header.default_approvers {
            section.add_default_approver(identifier);
        }
        section
    }

    fn add_default_approver(&mut self, identifier: &str) {
        let cleaned = identifier.trim();
        if cleaned.is_empty() || self.default_approvers.iter().any(|a| a == cleaned) {
            return;
        }
        self.default_approvers.push(cleaned.to_string());
    }

    /// The section name in its first-seen casing.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for `^[name]` sections, whose approvers are never mandatory.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The declared minimum approver count (0 when absent).
    pub fn min_approvers(&self) -> u32 {
        self.min_approvers
    }

    /// Approvers used when a matching rule names none.
    pub fn default_approvers(&self) -> &[String] {
        &self.default_approvers
    }

    /// The section's rules in file order.
    pub fn rules(&self) -> &[OwnershipRule] {
        &self.rules
    }

    /// True for the section collecting rules that precede any header.
    pub fn is_implicit(&self) -> bool {
        self.name == IMPLICIT_SECTION_NAME
    }

    /// Resolves this section's approvers for an already-normalized path.
    ///
    /// Last match wins. A matching exclusion rule empties the verdict and
    /// ends the scan: an excluded path cannot be re-included later in the
    /// same section.
    fn approvers_for(&self, path: &str) -> &[String] {
        let mut winner: Option<&OwnershipRule> = None;
        for rule in &self.rules {
            if !rule.pattern.matches_normalized(path) {
                continue;
            }
            if rule.exclusion {
                trace!(
                    "section [{}]: `{}` excludes {}",
                    self.name, rule.file_expression, path
                );
                return &[];
            }
            winner = Some(rule);
        }
        match winner {
            Some(rule) if !rule.approvers.is_empty() => &rule.approvers,
            Some(rule) => {
                trace!(
                    "section [{}]: `{}` matched without approvers, using defaults",
                    self.name, rule.file_expression
                );
                &self.default_approvers
            }
            None => &[],
        }
    }

    fn render(&self, out: &mut String, verbose: bool) {
        if self.optional {
            out.push('^');
        }
        out.push('[');
        out.push_str(&self.name);
        out.push(']');
        if self.min_approvers > 0 {
            out.push('[');
            out.push_str(&self.min_approvers.to_string());
            out.push(']');
        }
        for approver in &self.default_approvers {
            out.push(' ');
            out.push_str(approver);
        }
        out.push('\n');
        for rule in &self.rules {
            render_rule(out, rule, verbose);
        }
    }
}

fn render_rule(out: &mut String, rule: &OwnershipRule, verbose: bool) {
    if verbose {
        out.push_str("# Regex used for the next rule:   ");
        out.push_str(rule.pattern.as_regex_str());
        out.push('\n');
    }
    out.push_str(&rule.to_string());
    out.push('\n');
}

/// A parsed ownership document.
#[derive(Debug, Clone)]
pub struct CodeOwners {
    sections: Vec<Section>,
    problems: Vec<StructuralProblem>,
}

impl CodeOwners {
    /// Parses a document from its text.
    ///
    /// Structural problems never abort parsing; a pattern that cannot be
    /// compiled does.
    pub fn parse(content: &str) -> Result<Self, PatternError> {
        debug!("parsing ownership document ({} bytes)", content.len());
        let mut builder = DocumentBuilder::new();
        for (index, line) in content.lines().enumerate() {
            let line_number = index + 1;
            if is_blank_line(line) {
                continue;
            }
            if parse_comment_line(line).is_ok() {
                trace!("line {line_number}: comment");
                continue;
            }
            if let Ok((_, header)) = parse_section_header(line) {
                trace!("line {line_number}: section header [{}]", header.name);
                builder.open_section(&header);
                continue;
            }
            match parse_rule_line(line) {
                Ok((_, rule)) => builder.push_rule(&rule)?,
                Err(_) => warn!("line {line_number}: not a recognizable rule, skipped"),
            }
        }
        Ok(builder.finish())
    }

    /// All approvers for the given filename, in resolution order.
    ///
    /// Order reflects section insertion order, then the approver order of
    /// whichever rule won in each section; duplicates keep their first
    /// position.
    pub fn all_approvers(&self, filename: &str) -> Vec<String> {
        self.approvers(filename, false)
    }

    /// Approvers from non-optional sections only.
    pub fn mandatory_approvers(&self, filename: &str) -> Vec<String> {
        self.approvers(filename, true)
    }

    fn approvers(&self, filename: &str, mandatory_only: bool) -> Vec<String> {
        let path = normalize_path(filename);
        let mut result: Vec<String> = Vec::new();
        for section in &self.sections {
            if mandatory_only && section.optional {
                continue;
            }
            for approver in section.approvers_for(&path) {
                if !result.iter().any(|seen| seen == approver) {
                    result.push(approver.clone());
                }
            }
        }
        result
    }

    /// The document's sections in insertion order.
    pub fn defined_sections(&self) -> &[Section] {
        &self.sections
    }

    /// True if any non-fatal defect was found during parsing.
    pub fn has_structural_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    /// The collected defects, in detection order.
    pub fn problems(&self) -> &[StructuralProblem] {
        &self.problems
    }

    /// Renders the document in a form that parses back to an equivalent
    /// document.
    pub fn to_canonical_text(&self) -> String {
        self.render(false)
    }

    /// Like [`to_canonical_text`](Self::to_canonical_text), with the
    /// compiled regex of each rule interleaved as comments.
    pub fn to_verbose_text(&self) -> String {
        self.render(true)
    }

    fn render(&self, verbose: bool) -> String {
        let mut out = String::from("# CODEOWNERS file:\n");
        if self.sections.is_empty() {
            out.push_str("# No CODEOWNER rules were defined.\n");
            return out;
        }
        if let [only] = self.sections.as_slice() {
            if only.is_implicit() {
                for rule in &only.rules {
                    render_rule(&mut out, rule, verbose);
                }
                return out;
            }
        }
        for section in &self.sections {
            section.render(&mut out, verbose);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for CodeOwners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

impl FromStr for CodeOwners {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Folds parsed lines into the section list.
///
/// Holds the in-progress section; a new header (or end of input) flushes
/// it into the finished list, merging into an earlier same-named section
/// when one exists.
struct DocumentBuilder {
    sections: Vec<Section>,
    problems: Vec<StructuralProblem>,
    current: Section,
}

impl DocumentBuilder {
    fn new() -> Self {
        Self {
            sections: Vec::new(),
            problems: Vec::new(),
            current: Section::implicit(),
        }
    }

    fn open_section(&mut self, header: &SectionHeader<'_>) {
        self.flush();
        self.current = Section::from_header(header);
    }

    fn push_rule(&mut self, line: &RuleLine<'_>) -> Result<(), PatternError> {
        let rule = OwnershipRule::new(line.pattern, &line.identifiers)?;
        self.current.rules.push(rule);
        Ok(())
    }

    /// Moves the current section into the finished list. Sections without
    /// rules are dropped; name matching for merges is case-insensitive on
    /// the trimmed name, and the first-seen section keeps its casing,
    /// optional flag and minimum approver count.
    fn flush(&mut self) {
        let finished = std::mem::replace(&mut self.current, Section::implicit());
        if finished.rules.is_empty() {
            return;
        }
        let existing = self
            .sections
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(&finished.name));
        match existing {
            None => self.sections.push(finished),
            Some(index) => {
                if self.sections[index].optional != finished.optional {
                    error!(
                        "merging two sections with a different optional flag: [{}] has optional={} and [{}] has optional={}",
                        self.sections[index].name,
                        self.sections[index].optional,
                        finished.name,
                        finished.optional
                    );
                    self.problems.push(StructuralProblem::OptionalFlagConflict {
                        section: self.sections[index].name.clone(),
                    });
                }
                let target = &mut self.sections[index];
                for approver in &finished.default_approvers {
                    target.add_default_approver(approver);
                }
                target.rules.extend(finished.rules);
            }
        }
    }

    fn finish(mut self) -> CodeOwners {
        self.flush();
        let mut problems = self.problems;
        for section in &self.sections {
            if section.optional && section.min_approvers > 0 {
                warn!(
                    "section [{}] is optional so the minimal number of approvers {} is ignored",
                    section.name, section.min_approvers
                );
                problems.push(StructuralProblem::OptionalSectionWithMinApprovers {
                    section: section.name.clone(),
                    min_approvers: section.min_approvers,
                });
            }

            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for rule in &section.rules {
                *counts.entry(rule.file_expression.as_str()).or_default() += 1;
            }
            let duplicates: Vec<String> = counts
                .iter()
                .filter(|&(_, &count)| count > 1)
                .map(|(expression, _)| expression.to_string())
                .collect();
            if !duplicates.is_empty() {
                warn!(
                    "in section [{}] these file patterns occur multiple times: {}",
                    section.name,
                    duplicates.join(", ")
                );
                problems.push(StructuralProblem::DuplicatePatterns {
                    section: section.name.clone(),
                    expressions: duplicates,
                });
            }
        }
        CodeOwners {
            sections: self.sections,
            problems,
        }
    }
}

fn is_email_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+/=?^_`{|}~.-".contains(c)
}

/// Strips comment decorations around an email identifier:
/// `(note)user@example.com` and `user(note)@example.com` both become
/// `user@example.com`. Other identifiers pass through untouched.
fn strip_email_comments(token: &str) -> String {
    let mut out = token.to_string();
    if out.starts_with('(') {
        if let Some(close) = out.find(')') {
            if close > 1 && out[1..close].chars().all(is_email_atom_char) {
                out.replace_range(..=close, "");
            }
        }
    }
    if let Some(open) = out.find('(') {
        if let Some(close) = out[open..].find(')').map(|rel| open + rel) {
            if close > open + 1
                && out[close + 1..].starts_with('@')
                && out[open + 1..close].chars().all(is_email_atom_char)
            {
                out.replace_range(open..=close, "");
            }
        }
    }
    out
}
