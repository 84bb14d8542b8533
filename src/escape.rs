use crate::error::{ParseError, ParseResult};

/// Decode the backslash escapes PO string literals may carry.
///
/// Only the closed two-character set `\"` `\'` `\\` `\a` `\b` `\f` `\n`
/// `\r` `\t` `\v` is recognized; any other sequence (including a trailing
/// lone backslash) fails.
pub fn unescape(input: &str) -> ParseResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0b'),
            Some(other) => {
                return Err(ParseError::UnknownEscape(format!("\\{}", other)));
            }
            None => return Err(ParseError::UnknownEscape("\\".to_string())),
        }
    }
    Ok(out)
}
