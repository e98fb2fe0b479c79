//! Line-level parsers for ownership and ignore documents.
//!
//! The parsers here classify single lines of text; they know nothing about
//! document structure. Folding the classified lines into sections and
//! files happens in [`crate::owners`] and [`crate::ignore`].

mod lexer;

pub use lexer::{
    IgnoreLine, RuleLine, SectionHeader, identifier_list, is_blank_line, parse_comment_line,
    parse_ignore_line, parse_rule_line, parse_section_header,
};
