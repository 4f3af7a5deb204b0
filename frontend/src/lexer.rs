use logos::Logos;
use crate::ast::SourceLocation;
use crate::parser::error::{ParserError, ParserErrorKind, ParserResult};
use crate::token::{Kind, LexError, Token};

/// Wraps the `logos` scanner over `Kind` and adds 1-origin line and column
/// tracking, computed incrementally over the text between tokens.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Kind>,
    consumed: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { inner: Kind::lexer(input), consumed: 0, line: 1, column: 1 }
    }

    fn advance_to(&mut self, offset: usize) {
        for c in self.inner.source()[self.consumed..offset].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.consumed = offset;
    }

    fn location_at(&mut self, offset: usize) -> SourceLocation {
        self.advance_to(offset);
        SourceLocation::new(self.line, self.column, offset as u32)
    }

    /// Returns the next token, or a token of kind `EOF` at the end of input.
    pub fn next_token(&mut self) -> ParserResult<Token> {
        let Some(result) = self.inner.next() else {
            let end = self.inner.source().len();
            let location = self.location_at(end);
            return Ok(Token { kind: Kind::EOF, position: end..end, line: location.line, column: location.column });
        };
        let span = self.inner.span();
        let location = self.location_at(span.start);
        let kind = match result {
            // a complete comment is skipped by the scanner, so "/*" here never closes
            Ok(Kind::IDiv) if self.inner.remainder().starts_with('*') => {
                return Err(ParserError::new(ParserErrorKind::UnterminatedComment, location));
            }
            Ok(kind) => kind,
            Err(LexError::IntegerOutOfRange) => {
                let text = self.inner.slice().to_string();
                return Err(ParserError::new(ParserErrorKind::IntegerOutOfRange(text), location));
            }
            Err(LexError::UnexpectedCharacter) => {
                let c = self.inner.slice().chars().next().unwrap_or('\0');
                return Err(ParserError::new(ParserErrorKind::UnexpectedCharacter(c), location));
            }
        };
        self.advance_to(span.end);
        Ok(Token { kind, position: span, line: location.line, column: location.column })
    }
}
