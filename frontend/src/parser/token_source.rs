use std::collections::VecDeque;
use crate::lexer::Lexer;
use crate::parser::error::ParserResult;
use crate::token::{Kind, Token};

/// Trait for token sources that can provide tokens to the parser
pub trait TokenSource {
    /// Get the next token; the source yields `Kind::EOF` forever once exhausted
    fn next_token(&mut self) -> ParserResult<Token>;
}

impl<'a> TokenSource for Lexer<'a> {
    fn next_token(&mut self) -> ParserResult<Token> {
        Lexer::next_token(self)
    }
}

/// Token provider that pairs a TokenSource with a lookahead buffer
pub struct TokenProvider<T: TokenSource> {
    source: T,
    buffer: VecDeque<Token>,
}

impl<T: TokenSource> TokenProvider<T> {
    pub fn new(source: T) -> Self {
        TokenProvider {
            source,
            buffer: VecDeque::with_capacity(4),
        }
    }

    /// Peek at the current token without consuming it
    pub fn peek(&mut self) -> ParserResult<&Token> {
        self.peek_at(0)
    }

    /// Peek at a token at relative position without consuming
    pub fn peek_at(&mut self, relative_pos: usize) -> ParserResult<&Token> {
        while self.buffer.len() <= relative_pos {
            let token = self.source.next_token()?;
            self.buffer.push_back(token);
        }
        Ok(&self.buffer[relative_pos])
    }

    pub fn peek_kind_at(&mut self, relative_pos: usize) -> ParserResult<&Kind> {
        Ok(&self.peek_at(relative_pos)?.kind)
    }

    /// Consume the current token and return it
    pub fn advance(&mut self) -> ParserResult<Token> {
        match self.buffer.pop_front() {
            Some(token) => Ok(token),
            None => self.source.next_token(),
        }
    }
}
