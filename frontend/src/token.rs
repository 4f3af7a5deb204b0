use logos::Logos;

/// Scanner failure; the lexer attaches the offending text and location.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    IntegerOutOfRange,
}

fn parse_number(lex: &mut logos::Lexer<Kind>) -> Result<i64, LexError> {
    lex.slice().parse().map_err(|_| LexError::IntegerOutOfRange)
}

/// Token kinds. Whitespace and complete `/* ... */` comments are skipped
/// by the scanner itself.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Kind {
    #[token("let")]
    Let,
    #[token("in")]
    In,
    #[token("var")]
    Var,
    #[token("fun")]
    Fun,
    #[token("class")]
    Class,
    #[token("new")]
    New,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("print")]
    Print,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("int")]
    Int,
    #[token("bool")]
    Bool,

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("->")]
    Arrow,

    #[token("=")]
    Assign,
    #[token("==")]
    Equal,
    #[token("<=")]
    LE,
    #[token(">=")]
    GE,
    #[token("!")]
    Not,
    #[token("&&")]
    DoubleAnd,
    #[token("||")]
    DoubleOr,

    #[token("+")]
    IAdd,
    #[token("-")]
    ISub,
    #[token("*")]
    IMul,
    #[token("/")]
    IDiv,

    #[regex("[0-9]+", parse_number)]
    Number(i64),
    #[regex("[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Never produced by the scanner; the lexer yields it at end of input.
    EOF,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: Kind,
    pub position: std::ops::Range<usize>,
    pub line: u32,
    pub column: u32,
}
