use crate::error::{ParseError, ParseResult};

/// The four comment subtypes a PO entry may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    /// `#` translator comment
    Translator,
    /// `#.` extracted comment
    Extracted,
    /// `#,` flag comment
    Flag,
    /// `#|` previous-entry comment
    Previous,
}

impl CommentKind {
    /// The marker as it appears at the start of a line.
    pub fn marker(&self) -> &'static str {
        match self {
            CommentKind::Translator => "#",
            CommentKind::Extracted => "#.",
            CommentKind::Flag => "#,",
            CommentKind::Previous => "#|",
        }
    }

    fn from_marker_char(c: char) -> Option<CommentKind> {
        match c {
            '.' => Some(CommentKind::Extracted),
            ',' => Some(CommentKind::Flag),
            '|' => Some(CommentKind::Previous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Blank or whitespace-only line
    Blank,
    /// Comment line: subtype plus the marker tail (leading separator kept)
    Comment(CommentKind, String),
    /// Bare keyword such as `msgid` or `msgstr[0]`
    Keyword(String),
    /// One quoted string literal, quotes stripped, escapes left intact
    Str(String),
    /// End of input
    End,
}

impl Token {
    pub(crate) fn comment_kind(&self) -> Option<CommentKind> {
        match self {
            Token::Comment(kind, _) => Some(*kind),
            _ => None,
        }
    }

    /// Short description for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Blank => "blank line".to_string(),
            Token::Comment(kind, _) => format!("comment {}", kind.marker()),
            Token::Keyword(keyword) => format!("keyword {}", keyword),
            Token::Str(text) => format!("string \"{}\"", text),
            Token::End => "end of input".to_string(),
        }
    }
}

/// Line lexer for PO catalog text.
///
/// Produces a finite, single-pass token stream. The iterator fuses after
/// the first error; a parse never resumes past a structural violation.
pub struct Lexer<'a> {
    lines: std::str::Lines<'a>,
    /// Unconsumed remainder of the current line.
    rest: &'a str,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            lines: input.lines(),
            rest: "",
            failed: false,
        }
    }

    fn lex_line(&mut self, line: &'a str) -> Option<ParseResult<Token>> {
        let line = line.trim_start();
        if line.is_empty() {
            return Some(Ok(Token::Blank));
        }
        if let Some(tail) = line.strip_prefix('#') {
            return Some(self.lex_comment(line, tail));
        }
        self.rest = line;
        Some(self.lex_inline())
    }

    fn lex_comment(&self, line: &'a str, tail: &'a str) -> ParseResult<Token> {
        let mut chars = tail.chars();
        match chars.next() {
            // `#` alone or followed by whitespace
            None => Ok(Token::Comment(CommentKind::Translator, String::new())),
            Some(c) if c.is_whitespace() => {
                Ok(Token::Comment(CommentKind::Translator, tail.to_string()))
            }
            Some(marker) => {
                let after = chars.as_str();
                let next = after.chars().next();
                if next.is_none() || next.is_some_and(char::is_whitespace) {
                    match CommentKind::from_marker_char(marker) {
                        Some(kind) => Ok(Token::Comment(kind, after.to_string())),
                        None => Err(ParseError::UnknownCommentMarker(line.to_string())),
                    }
                } else {
                    Err(ParseError::UnknownCommentMarker(line.to_string()))
                }
            }
        }
    }

    /// Lex one string or keyword token from the current line remainder.
    /// Callers guarantee the remainder is non-empty.
    fn lex_inline(&mut self) -> ParseResult<Token> {
        let rest = self.rest;
        let token = if let Some(body) = rest.strip_prefix('"') {
            // A backslash escapes the following character; decoding happens
            // later, here we only find the closing quote.
            let mut end = None;
            let mut chars = body.char_indices();
            while let Some((i, c)) = chars.next() {
                if c == '"' {
                    end = Some(i);
                    break;
                }
                if c == '\\' {
                    chars.next();
                }
            }
            match end {
                Some(i) => {
                    self.rest = &body[i + 1..];
                    Token::Str(body[..i].to_string())
                }
                None => return Err(ParseError::UnterminatedString(rest.to_string())),
            }
        } else if rest.starts_with(|c: char| c.is_alphabetic()) {
            // Brackets admitted so `msgstr[0]` lexes as one keyword.
            let end = rest
                .char_indices()
                .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '[' | ']')))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            self.rest = &rest[end..];
            Token::Keyword(rest[..end].to_string())
        } else {
            let c = rest.chars().next().unwrap_or_default();
            return Err(ParseError::UnknownCharacter(c));
        };

        self.rest = self.rest.trim_start();
        Ok(token)
    }
}

impl Iterator for Lexer<'_> {
    type Item = ParseResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = if self.rest.is_empty() {
            match self.lines.next() {
                Some(line) => self.lex_line(line),
                None => None,
            }
        } else {
            Some(self.lex_inline())
        };
        if let Some(Err(_)) = &item {
            self.failed = true;
        }
        item
    }
}
