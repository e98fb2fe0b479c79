//! Token parsers for single document lines.
//!
//! Ownership documents are whitespace-sensitive: a rule line is a pattern
//! token (which may contain escaped spaces) followed by identifier tokens,
//! and a `#` opens a comment only at the start of a line or after
//! whitespace. Ignore documents take the whole trimmed line as the
//! pattern, so internal spaces are significant there.

use nom::{
    IResult, Parser,
    bytes::complete::take_until,
    character::complete::{char, digit1, space0},
    combinator::{map_res, opt, rest},
};

/// A parsed section header line, e.g. `^[Docs][2] @docs-team`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader<'a> {
    /// True when the header was prefixed with `^`.
    pub optional: bool,
    /// The section name with surrounding whitespace trimmed.
    pub name: &'a str,
    /// The `[N]` minimum approver count, when present.
    pub min_approvers: Option<u32>,
    /// Default approver identifiers trailing the header.
    pub default_approvers: Vec<&'a str>,
}

/// A parsed rule line: one pattern token plus its identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleLine<'a> {
    /// The pattern exactly as written (escapes unresolved).
    pub pattern: &'a str,
    /// Identifier tokens following the pattern, in order.
    pub identifiers: Vec<&'a str>,
}

/// A classified gitignore line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreLine<'a> {
    /// Empty or whitespace-only.
    Blank,
    /// A `#` comment; the content follows the marker.
    Comment(&'a str),
    /// A rule: negation marker (if any) already split off the pattern.
    Rule { negate: bool, pattern: &'a str },
}

/// Checks if a line is blank (empty or only whitespace).
pub fn is_blank_line(input: &str) -> bool {
    input.trim().is_empty()
}

/// Parses a complete comment line (optional whitespace + `#` + content).
pub fn parse_comment_line(input: &str) -> IResult<&str, &str> {
    (space0, char('#'), rest)
        .map(|(_, _, content)| content)
        .parse(input)
}

/// Parses a section header line.
///
/// A line whose first token starts with `[` (optionally preceded by `^`)
/// and contains a closing `]` is a header; a pattern that genuinely starts
/// with a character class must escape the bracket (`\[`). The name is
/// everything up to the first `]`, trimmed, so elaborate names with inner
/// spaces and symbols are allowed.
pub fn parse_section_header(input: &str) -> IResult<&str, SectionHeader<'_>> {
    let (remaining, (_, optional, _, raw_name, _)) =
        (space0, opt(char('^')), char('['), take_until("]"), char(']')).parse(input)?;
    let (remaining, min_approvers) = opt(map_res(
        (char('['), digit1, char(']')),
        |(_, digits, _): (char, &str, char)| digits.parse::<u32>(),
    ))
    .parse(remaining)?;

    Ok((
        "",
        SectionHeader {
            optional: optional.is_some(),
            name: raw_name.trim(),
            min_approvers,
            default_approvers: identifier_list(remaining),
        },
    ))
}

/// Parses a rule line: leading whitespace, a pattern token, identifiers.
pub fn parse_rule_line(input: &str) -> IResult<&str, RuleLine<'_>> {
    let (remaining, _) = space0(input)?;
    let (remaining, pattern) = pattern_token(remaining)?;
    Ok((
        "",
        RuleLine {
            pattern,
            identifiers: identifier_list(remaining),
        },
    ))
}

/// Splits the remainder of a line into whitespace-separated identifier
/// tokens, stopping at a trailing comment.
pub fn identifier_list(input: &str) -> Vec<&str> {
    let mut identifiers = Vec::new();
    for token in input.split_whitespace() {
        if token.starts_with('#') {
            break;
        }
        identifiers.push(token);
    }
    identifiers
}

/// Consumes a pattern token: everything up to the first unescaped
/// whitespace. A backslash keeps the following character in the token, so
/// `internal\ stuff/README.md` stays one pattern.
fn pattern_token(input: &str) -> IResult<&str, &str> {
    let mut end = 0;
    let mut chars = input.char_indices();
    while let Some((idx, ch)) = chars.next() {
        if ch.is_whitespace() {
            break;
        }
        if ch == '\\' {
            match chars.next() {
                Some((next_idx, next_ch)) => end = next_idx + next_ch.len_utf8(),
                None => end = idx + 1,
            }
        } else {
            end = idx + ch.len_utf8();
        }
    }
    if end == 0 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TakeWhile1,
        )));
    }
    Ok((&input[end..], &input[..end]))
}

/// Classifies one line of a gitignore document.
///
/// Surrounding whitespace is trimmed; the rest of the line is the pattern,
/// internal spaces included. Only a leading `#` opens a comment.
pub fn parse_ignore_line(line: &str) -> IgnoreLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return IgnoreLine::Blank;
    }
    if let Some(content) = trimmed.strip_prefix('#') {
        return IgnoreLine::Comment(content);
    }
    match trimmed.strip_prefix('!') {
        Some(pattern) => IgnoreLine::Rule {
            negate: true,
            pattern,
        },
        None => IgnoreLine::Rule {
            negate: false,
            pattern: trimmed,
        },
    }
}
