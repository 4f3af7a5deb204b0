use crate::ast::*;
use crate::token::Kind;
use super::core::Parser;
use super::error::{ParserError, ParserErrorKind, ParserResult};

pub struct OperatorGroup<'a> {
    pub tokens: Vec<(Kind, Operator)>,
    pub next_precedence: fn(&mut Parser<'a>) -> ParserResult<ExprRef>,
}

impl<'a> Parser<'a> {
    pub fn parse_expr(&mut self) -> ParserResult<ExprRef> {
        self.check_and_increment_recursion()?;
        let result = parse_logical_expr(self);
        self.decrement_recursion();
        result
    }

    fn parse_args(&mut self) -> ParserResult<Vec<ExprRef>> {
        self.expect(&Kind::ParenOpen)?;
        let mut args = vec![];
        if *self.peek()? != Kind::ParenClose {
            loop {
                args.push(self.parse_expr()?);
                if *self.peek()? != Kind::Comma {
                    break;
                }
                self.next()?;
            }
        }
        self.expect(&Kind::ParenClose)?;
        Ok(args)
    }
}

fn parse_binary<'a>(parser: &mut Parser<'a>, group: OperatorGroup<'a>) -> ParserResult<ExprRef> {
    let mut lhs = (group.next_precedence)(parser)?;
    loop {
        let next = parser.peek()?.clone();
        let op = match group.tokens.iter().find(|(kind, _)| *kind == next) {
            Some((_, op)) => *op,
            None => return Ok(lhs),
        };
        let location = parser.current_source_location()?;
        parser.next()?;
        let rhs = (group.next_precedence)(parser)?;
        lhs = parser.ast_builder.binary_expr(op, lhs, rhs, Some(location));
    }
}

// logical_expr := relational ("&&" relational | "||" relational)*
fn parse_logical_expr(parser: &mut Parser) -> ParserResult<ExprRef> {
    parse_binary(parser, OperatorGroup {
        tokens: vec![(Kind::DoubleAnd, Operator::LogicalAnd), (Kind::DoubleOr, Operator::LogicalOr)],
        next_precedence: parse_relational,
    })
}

// relational := add ("==" add | "<=" add | ">=" add)*
fn parse_relational(parser: &mut Parser) -> ParserResult<ExprRef> {
    parse_binary(parser, OperatorGroup {
        tokens: vec![(Kind::Equal, Operator::EQ), (Kind::LE, Operator::LE), (Kind::GE, Operator::GE)],
        next_precedence: parse_add,
    })
}

// add := mul ("+" mul | "-" mul)*
fn parse_add(parser: &mut Parser) -> ParserResult<ExprRef> {
    parse_binary(parser, OperatorGroup {
        tokens: vec![(Kind::IAdd, Operator::IAdd), (Kind::ISub, Operator::ISub)],
        next_precedence: parse_mul,
    })
}

// mul := unary ("*" unary | "/" unary)*
fn parse_mul(parser: &mut Parser) -> ParserResult<ExprRef> {
    parse_binary(parser, OperatorGroup {
        tokens: vec![(Kind::IMul, Operator::IMul), (Kind::IDiv, Operator::IDiv)],
        next_precedence: parse_unary,
    })
}

// unary := "!" unary | primary
fn parse_unary(parser: &mut Parser) -> ParserResult<ExprRef> {
    if *parser.peek()? == Kind::Not {
        let location = parser.current_source_location()?;
        parser.next()?;
        parser.check_and_increment_recursion()?;
        let operand = parse_unary(parser);
        parser.decrement_recursion();
        return Ok(parser.ast_builder.not_expr(operand?, Some(location)));
    }
    parse_primary(parser)
}

// primary := "-"? NUM | "true" | "false" | "null" | "(" expr ")"
//          | "if" expr "then" "{" expr "}" "else" "{" expr "}"
//          | "print" "(" expr ")" | "new" ID "(" expr_list ")"
//          | ID | ID "(" expr_list ")" | ID "." ID "(" expr_list ")"
fn parse_primary(parser: &mut Parser) -> ParserResult<ExprRef> {
    let location = parser.current_source_location()?;
    let loc = Some(location);
    match parser.peek()?.clone() {
        Kind::Number(n) => {
            parser.next()?;
            Ok(parser.ast_builder.int_expr(n, loc))
        }
        Kind::ISub => {
            parser.next()?;
            match parser.peek()?.clone() {
                Kind::Number(n) => {
                    parser.next()?;
                    Ok(parser.ast_builder.int_expr(-n, loc))
                }
                _ => Err(parser.unexpected("integer literal")?),
            }
        }
        Kind::True => {
            parser.next()?;
            Ok(parser.ast_builder.bool_expr(true, loc))
        }
        Kind::False => {
            parser.next()?;
            Ok(parser.ast_builder.bool_expr(false, loc))
        }
        Kind::Null => {
            parser.next()?;
            Ok(parser.ast_builder.null_expr(loc))
        }
        Kind::ParenOpen => {
            parser.next()?;
            let e = parser.parse_expr()?;
            parser.expect(&Kind::ParenClose)?;
            Ok(e)
        }
        Kind::If => parse_if(parser),
        Kind::Print => parse_print(parser),
        Kind::New => parse_new(parser),
        Kind::Identifier(_) => parse_name(parser),
        other => Err(ParserError::new(
            ParserErrorKind::ExpectedExpression(format!("{:?}", other)),
            location,
        )),
    }
}

fn parse_if(parser: &mut Parser) -> ParserResult<ExprRef> {
    let location = parser.current_source_location()?;
    parser.next()?;
    let cond = parser.parse_expr()?;
    parser.expect(&Kind::Then)?;
    parser.expect(&Kind::BraceOpen)?;
    let then_expr = parser.parse_expr()?;
    parser.expect(&Kind::BraceClose)?;
    parser.expect(&Kind::Else)?;
    parser.expect(&Kind::BraceOpen)?;
    let else_expr = parser.parse_expr()?;
    parser.expect(&Kind::BraceClose)?;
    Ok(parser.ast_builder.if_else_expr(cond, then_expr, else_expr, Some(location)))
}

fn parse_print(parser: &mut Parser) -> ParserResult<ExprRef> {
    let location = parser.current_source_location()?;
    parser.next()?;
    parser.expect(&Kind::ParenOpen)?;
    let e = parser.parse_expr()?;
    parser.expect(&Kind::ParenClose)?;
    Ok(parser.ast_builder.print_expr(e, Some(location)))
}

fn parse_new(parser: &mut Parser) -> ParserResult<ExprRef> {
    parser.next()?;
    let (class, class_location) = parser.expect_identifier()?;
    let args = parser.parse_args()?;
    Ok(parser.ast_builder.new_expr(class, args, Some(class_location)))
}

// ID | ID "(" expr_list ")" | ID "." ID "(" expr_list ")"
fn parse_name(parser: &mut Parser) -> ParserResult<ExprRef> {
    let (name, location) = parser.expect_identifier()?;
    let loc = Some(location);
    match parser.peek()?.clone() {
        Kind::ParenOpen => {
            let args = parser.parse_args()?;
            Ok(parser.ast_builder.call_expr(name, args, loc))
        }
        Kind::Dot => {
            parser.next()?;
            let (method, _) = parser.expect_identifier()?;
            let args = parser.parse_args()?;
            Ok(parser.ast_builder.method_call_expr(name, method, args, loc))
        }
        _ => Ok(parser.ast_builder.identifier_expr(name, loc)),
    }
}
