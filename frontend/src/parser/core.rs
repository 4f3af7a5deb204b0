use string_interner::{DefaultStringInterner, DefaultSymbol};
use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{Kind, Token};
use super::error::{ParserError, ParserErrorKind, ParserResult};
use super::token_source::TokenProvider;

/// Nesting allowed for parenthesized, unary and call-argument expressions
/// and for function declarations inside `let` blocks together.
pub const MAX_RECURSION_DEPTH: usize = 64;

pub struct Parser<'a> {
    token_provider: TokenProvider<Lexer<'a>>,
    pub ast_builder: AstBuilder,
    string_interner: &'a mut DefaultStringInterner,
    recursion_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, string_interner: &'a mut DefaultStringInterner) -> Self {
        Parser {
            token_provider: TokenProvider::new(Lexer::new(input)),
            ast_builder: AstBuilder::with_capacity(256, 64),
            string_interner,
            recursion_depth: 0,
        }
    }

    pub fn peek(&mut self) -> ParserResult<&Kind> {
        self.token_provider.peek_kind_at(0)
    }

    pub fn next(&mut self) -> ParserResult<Token> {
        self.token_provider.advance()
    }

    /// Location of the token the parser is looking at
    pub fn current_source_location(&mut self) -> ParserResult<SourceLocation> {
        let token = self.token_provider.peek()?;
        Ok(SourceLocation::new(token.line, token.column, token.position.start as u32))
    }

    pub fn expect(&mut self, accept: &Kind) -> ParserResult<Token> {
        if self.peek()? == accept {
            self.next()
        } else {
            Err(self.unexpected(&format!("{:?}", accept))?)
        }
    }

    pub fn expect_identifier(&mut self) -> ParserResult<(DefaultSymbol, SourceLocation)> {
        let location = self.current_source_location()?;
        match self.peek()?.clone() {
            Kind::Identifier(name) => {
                self.next()?;
                Ok((self.intern(&name), location))
            }
            _ => Err(self.unexpected("identifier")?),
        }
    }

    /// Builds an `UnexpectedToken` error describing the current token.
    pub fn unexpected(&mut self, expected: &str) -> ParserResult<ParserError> {
        let location = self.current_source_location()?;
        let found = format!("{:?}", self.peek()?);
        Ok(ParserError::unexpected_token(location, expected, found))
    }

    pub fn intern(&mut self, name: &str) -> DefaultSymbol {
        self.string_interner.get_or_intern(name)
    }

    pub fn check_and_increment_recursion(&mut self) -> ParserResult<()> {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            let location = self.current_source_location()?;
            return Err(ParserError::new(ParserErrorKind::RecursionLimit(MAX_RECURSION_DEPTH), location));
        }
        self.recursion_depth += 1;
        Ok(())
    }

    pub fn decrement_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    // prog := "let" dec+ "in" exp ";" | exp ";"
    pub fn parse_program(mut self) -> ParserResult<Program> {
        let mut declarations = vec![];
        if *self.peek()? == Kind::Let {
            self.next()?;
            declarations = self.parse_declaration_list()?;
            self.expect(&Kind::In)?;
        }
        let body = self.parse_expr()?;
        self.expect(&Kind::Semicolon)?;
        self.expect(&Kind::EOF)?;
        Ok(self.ast_builder.build(declarations, body))
    }
}
