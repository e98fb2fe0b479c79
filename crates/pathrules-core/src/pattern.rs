//! Path pattern compilation.
//!
//! This module turns the glob-like expression language used by CODEOWNERS
//! and gitignore documents into compiled path matchers. Patterns follow
//! these rules:
//!
//! - `*` matches any run of characters except `/`
//! - `?` matches exactly one character (excluding `/` in the Ignore dialect)
//! - `**` as a whole segment matches zero or more complete path segments
//! - `/` at the start anchors to the document root
//! - `/` at the end matches a directory and everything beneath it
//! - `[...]` and `[!...]` match character sets and ranges; a group with
//!   commas (`name*[.json, .xml]`) is an alternation of literal suffixes
//! - `\` escapes the next character, removing any wildcard meaning
//!
//! Matchers operate on normalized path strings: `/`-separated, rooted with
//! a single leading `/`, duplicate separators collapsed.

use regex::Regex;
use thiserror::Error;

/// Which expression language a pattern is written in.
///
/// The two dialects share almost all of their syntax but differ in
/// anchoring and in what `?` may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// CODEOWNERS rule patterns. Expressions not starting with `/` match
    /// at any depth, even when they contain separators.
    Ownership,
    /// Gitignore rule patterns. An expression containing a non-trailing
    /// separator is anchored to the document root.
    Ignore,
}

/// An error produced while compiling a pattern expression.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A `[` was opened but never closed.
    #[error("unbalanced character class in pattern `{expression}`")]
    UnbalancedClass {
        /// The offending source expression.
        expression: String,
    },

    /// The expression survived translation but the engine rejected it
    /// (e.g. an inverted range inside a character class).
    #[error("pattern `{expression}` does not compile to a valid matcher: {source}")]
    Regex {
        /// The offending source expression.
        expression: String,
        /// The underlying engine error.
        source: regex::Error,
    },
}

/// A compiled, immutable path matcher.
///
/// Compilation is deterministic and pure; matching never fails and never
/// allocates beyond the query normalization.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    expression: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles an expression in the given dialect.
    ///
    /// Leading negation markers (`!`) are not handled here; the owning
    /// rule strips them and records the flag before compiling.
    pub fn compile(expression: &str, dialect: Dialect) -> Result<Self, PatternError> {
        let trimmed = expression.trim();
        let parsed = parse_expression(trimmed, expression)?;
        let regex_src = assemble_regex(&parsed, dialect);
        let regex = Regex::new(&regex_src).map_err(|source| PatternError::Regex {
            expression: expression.to_string(),
            source,
        })?;
        Ok(Self {
            expression: expression.to_string(),
            regex,
        })
    }

    /// Returns the source expression this matcher was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the regex the expression was translated into.
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Checks whether this pattern matches the given path.
    ///
    /// The path is normalized first: host separators become `/`, duplicate
    /// separators collapse, and a leading `/` is added when missing.
    pub fn matches(&self, path: &str) -> bool {
        self.matches_normalized(&normalize_path(path))
    }

    /// Checks a path the caller has already passed through
    /// [`normalize_path`].
    pub(crate) fn matches_normalized(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Normalizes a query path for matching: backslashes become `/`, runs of
/// separators collapse to one, and a leading `/` is ensured.
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    let mut last_was_sep = true;
    for ch in path.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' {
            if !last_was_sep {
                out.push('/');
            }
            last_was_sep = true;
        } else {
            out.push(ch);
            last_was_sep = false;
        }
    }
    out
}

/// One building block inside a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    /// A run of literal characters (escapes already resolved).
    Literal(String),
    /// A single `*`.
    Star,
    /// Two or more adjacent `*` embedded in other segment content.
    DoubleStar,
    /// A `?`.
    AnyChar,
    /// A character class, `[...]` or `[!...]`.
    Class { negated: bool, body: String },
    /// A comma-separated alternation group of literal alternatives.
    Alternation(Vec<String>),
}

/// One `/`-delimited part of an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// A segment that is exactly `**`.
    Globstar,
    Normal(Vec<Piece>),
}

#[derive(Debug)]
struct ParsedExpression {
    leading_slash: bool,
    trailing_slash: bool,
    segments: Vec<Segment>,
}

fn parse_expression(trimmed: &str, original: &str) -> Result<ParsedExpression, PatternError> {
    let leading_slash = trimmed.starts_with('/');
    let mut segments = Vec::new();
    let mut pieces: Vec<Piece> = Vec::new();
    let mut literal = String::new();
    let mut stars = 0usize;
    let mut trailing_slash = false;

    let mut chars = trimmed.chars().peekable();

    // Closes out a pending star run into the piece list.
    fn flush_stars(pieces: &mut Vec<Piece>, stars: &mut usize) {
        match *stars {
            0 => {}
            1 => pieces.push(Piece::Star),
            _ => pieces.push(Piece::DoubleStar),
        }
        *stars = 0;
    }
    fn flush_literal(pieces: &mut Vec<Piece>, literal: &mut String) {
        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(literal)));
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '/' => {
                flush_literal(&mut pieces, &mut literal);
                // A segment holding nothing but a star run of length >= 2
                // is a globstar; shorter runs stay ordinary pieces.
                if pieces.is_empty() && stars >= 2 {
                    stars = 0;
                    segments.push(Segment::Globstar);
                } else {
                    flush_stars(&mut pieces, &mut stars);
                    if !pieces.is_empty() {
                        segments.push(Segment::Normal(std::mem::take(&mut pieces)));
                    }
                    // Empty segment: a duplicate or leading separator, collapsed.
                }
                trailing_slash = true;
                continue;
            }
            '*' => {
                flush_literal(&mut pieces, &mut literal);
                stars += 1;
            }
            '?' => {
                flush_stars(&mut pieces, &mut stars);
                flush_literal(&mut pieces, &mut literal);
                pieces.push(Piece::AnyChar);
            }
            '\\' => {
                flush_stars(&mut pieces, &mut stars);
                match chars.next() {
                    Some(escaped) => literal.push(escaped),
                    None => literal.push('\\'),
                }
            }
            '[' => {
                flush_stars(&mut pieces, &mut stars);
                flush_literal(&mut pieces, &mut literal);
                pieces.push(parse_class(&mut chars, original)?);
            }
            other => {
                flush_stars(&mut pieces, &mut stars);
                literal.push(other);
            }
        }
        trailing_slash = false;
    }

    flush_literal(&mut pieces, &mut literal);
    if pieces.is_empty() && stars >= 2 {
        segments.push(Segment::Globstar);
    } else {
        flush_stars(&mut pieces, &mut stars);
        if !pieces.is_empty() {
            segments.push(Segment::Normal(pieces));
        }
    }

    Ok(ParsedExpression {
        leading_slash,
        trailing_slash,
        segments,
    })
}

/// Parses the remainder of a `[...]` group. The opening bracket has
/// already been consumed.
fn parse_class(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    original: &str,
) -> Result<Piece, PatternError> {
    let mut body = String::new();
    let mut closed = false;
    while let Some(ch) = chars.next() {
        match ch {
            ']' => {
                closed = true;
                break;
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    body.push('\\');
                    body.push(escaped);
                } else {
                    body.push('\\');
                }
            }
            other => body.push(other),
        }
    }
    if !closed {
        return Err(PatternError::UnbalancedClass {
            expression: original.to_string(),
        });
    }

    if body.contains(',') {
        let alternatives = body
            .split(',')
            .map(|alt| alt.trim().to_string())
            .filter(|alt| !alt.is_empty())
            .collect();
        return Ok(Piece::Alternation(alternatives));
    }

    let (negated, rest) = match body.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, body.as_str()),
    };
    Ok(Piece::Class {
        negated,
        body: rest.to_string(),
    })
}

fn assemble_regex(parsed: &ParsedExpression, dialect: Dialect) -> String {
    let segments = &parsed.segments;
    let root_anchored = match dialect {
        Dialect::Ownership => parsed.leading_slash,
        Dialect::Ignore => parsed.leading_slash || segments.len() > 1,
    };

    let mut re = String::from("^/");
    let leading_globstar = matches!(segments.first(), Some(Segment::Globstar));
    if !root_anchored && !leading_globstar {
        re.push_str("(?:.*/)?");
    }

    if segments.is_empty() {
        // Expressions like `/` reduce to the root itself.
        return re;
    }

    let last_index = segments.len() - 1;
    let mut need_sep = false;
    let mut open_end = parsed.trailing_slash;

    for (i, segment) in segments.iter().enumerate() {
        let last = i == last_index;
        match segment {
            Segment::Globstar => {
                if last && i > 0 {
                    // Trailing `/**`: the directory's contents and deeper,
                    // never a sibling sharing the name as a prefix.
                    re.push_str("/.*");
                    open_end = true;
                } else if last {
                    re.push_str(".*");
                    open_end = true;
                } else if i == 0 {
                    re.push_str("(?:.*/)?");
                    need_sep = false;
                } else {
                    // `a/**/b` also matches `a/b`.
                    re.push_str("(?:/.*)?");
                    // The following segment still owns its separator.
                }
            }
            Segment::Normal(pieces) => {
                if need_sep {
                    re.push('/');
                }
                let bare_star = pieces.len() == 1 && pieces[0] == Piece::Star;
                if bare_star && !last {
                    // A lone `*` segment in the middle: exactly one level.
                    re.push_str("[^/]+");
                } else {
                    for piece in pieces {
                        emit_piece(&mut re, piece, dialect);
                    }
                }
                if last && !parsed.trailing_slash {
                    if bare_star {
                        // A final bare `*` segment matches direct children
                        // only; deeper levels need `**`.
                        re.push('$');
                        open_end = true;
                    } else if matches!(pieces.last(), Some(Piece::Star | Piece::DoubleStar)) {
                        open_end = true;
                    }
                }
                need_sep = true;
            }
        }
    }

    if parsed.trailing_slash && !matches!(segments.last(), Some(Segment::Globstar)) {
        re.push('/');
    } else if !open_end {
        // A name ending the expression may be a file (end of path) or a
        // directory (another separator follows).
        re.push_str("(?:/|$)");
    }

    re
}

fn emit_piece(re: &mut String, piece: &Piece, dialect: Dialect) {
    match piece {
        Piece::Literal(text) => {
            for ch in text.chars() {
                escape_into(re, ch);
            }
        }
        Piece::Star => re.push_str("[^/]*"),
        Piece::DoubleStar => re.push_str(".*"),
        Piece::AnyChar => re.push_str(match dialect {
            Dialect::Ignore => "[^/]",
            Dialect::Ownership => ".",
        }),
        Piece::Class { negated, body } => {
            re.push('[');
            if *negated {
                re.push('^');
            }
            let mut body_chars = body.chars().peekable();
            while let Some(ch) = body_chars.next() {
                match ch {
                    '\\' => {
                        re.push('\\');
                        if let Some(next) = body_chars.next() {
                            re.push(next);
                        }
                    }
                    '[' => re.push_str("\\["),
                    other => re.push(other),
                }
            }
            re.push(']');
        }
        Piece::Alternation(alternatives) => {
            re.push_str("(?:");
            for (i, alt) in alternatives.iter().enumerate() {
                if i > 0 {
                    re.push('|');
                }
                for ch in alt.chars() {
                    escape_into(re, ch);
                }
            }
            re.push(')');
        }
    }
}

/// Escapes a literal character for use in the generated regex.
fn escape_into(re: &mut String, ch: char) {
    if matches!(
        ch,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    ) {
        re.push('\\');
    }
    re.push(ch);
}
