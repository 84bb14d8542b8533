use crate::entry::Entry;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token};

/// Streaming entry assembler over the lexer's token stream.
///
/// Holds a single token of lookahead, primed at construction. Iteration
/// yields one [`Entry`] per pull and fuses after the first error.
pub struct EntryParser<'a> {
    tokens: Lexer<'a>,
    lookahead: ParseResult<Token>,
    failed: bool,
}

impl<'a> EntryParser<'a> {
    pub fn new(mut tokens: Lexer<'a>) -> Self {
        let lookahead = tokens.next().unwrap_or(Ok(Token::End));
        EntryParser {
            tokens,
            lookahead,
            failed: false,
        }
    }

    fn peek(&self) -> ParseResult<&Token> {
        match &self.lookahead {
            Ok(token) => Ok(token),
            Err(e) => Err(e.clone()),
        }
    }

    /// Consume the lookahead and pull the next token behind it.
    fn advance(&mut self) -> ParseResult<Token> {
        let next = self.tokens.next().unwrap_or(Ok(Token::End));
        std::mem::replace(&mut self.lookahead, next)
    }

    fn next_entry(&mut self) -> ParseResult<Option<Entry>> {
        if *self.peek()? == Token::End {
            return Ok(None);
        }

        let mut fields: Vec<(String, Vec<String>)> = Vec::new();

        // Comment runs, contiguous per subtype
        loop {
            let kind = match self.peek()?.comment_kind() {
                Some(kind) => kind,
                None => break,
            };
            if fields.iter().any(|(key, _)| key == kind.marker()) {
                return Err(ParseError::DiscontinuousComment(kind.marker().to_string()));
            }
            let mut lines = Vec::new();
            while self.peek()?.comment_kind() == Some(kind) {
                if let Token::Comment(_, text) = self.advance()? {
                    lines.push(text);
                }
            }
            fields.push((kind.marker().to_string(), lines));
        }

        // Keyword groups, each followed by its string lines
        loop {
            let keyword = match self.peek()? {
                Token::Keyword(keyword) => keyword.clone(),
                _ => break,
            };
            if fields.iter().any(|(key, _)| *key == keyword) {
                return Err(ParseError::DuplicateKeyword(keyword));
            }
            self.advance()?;
            let mut lines = Vec::new();
            while matches!(self.peek()?, Token::Str(_)) {
                if let Token::Str(text) = self.advance()? {
                    lines.push(text);
                }
            }
            if lines.is_empty() {
                return Err(ParseError::NoStringsAfterKeyword(keyword));
            }
            fields.push((keyword, lines));
        }

        // Only blank lines may follow; skip them to resynchronize.
        match self.peek()? {
            Token::Blank | Token::End => {}
            token => return Err(ParseError::ExpectedEndOfEntry(token.describe())),
        }
        while *self.peek()? == Token::Blank {
            self.advance()?;
        }

        Entry::new(fields).map(Some)
    }
}

impl Iterator for EntryParser<'_> {
    type Item = ParseResult<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a full PO document into its entries.
pub fn parse_entries(input: &str) -> ParseResult<Vec<Entry>> {
    EntryParser::new(Lexer::new(input)).collect()
}
