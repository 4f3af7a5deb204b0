use crate::ast::*;
use crate::token::Kind;
use crate::type_decl::TypeDecl;
use super::core::Parser;
use super::error::ParserResult;

impl<'a> Parser<'a> {
    fn at_declaration(&mut self) -> ParserResult<bool> {
        Ok(matches!(self.peek()?, Kind::Var | Kind::Fun | Kind::Class))
    }

    /// dec+ ; stops in front of the first token that cannot start a declaration
    pub fn parse_declaration_list(&mut self) -> ParserResult<Vec<DeclRef>> {
        if !self.at_declaration()? {
            return Err(self.unexpected("declaration")?);
        }
        let mut decls = vec![];
        while self.at_declaration()? {
            decls.push(self.parse_declaration()?);
        }
        Ok(decls)
    }

    pub fn parse_declaration(&mut self) -> ParserResult<DeclRef> {
        match self.peek()?.clone() {
            Kind::Var => self.parse_var_decl(),
            Kind::Fun => {
                let function = self.parse_function()?;
                Ok(self.ast_builder.fun_decl(function))
            }
            Kind::Class => self.parse_class_decl(),
            _ => Err(self.unexpected("declaration")?),
        }
    }

    // var_dec := "var" ID ":" hotype "=" exp ";"
    fn parse_var_decl(&mut self) -> ParserResult<DeclRef> {
        let location = self.current_source_location()?;
        self.expect(&Kind::Var)?;
        let (name, _) = self.expect_identifier()?;
        self.expect(&Kind::Colon)?;
        let ty = self.parse_hotype()?;
        self.expect(&Kind::Assign)?;
        let init = self.parse_expr()?;
        self.expect(&Kind::Semicolon)?;
        Ok(self.ast_builder.var_decl(name, ty, init, Some(location)))
    }

    // fun := "fun" ID ":" type "(" params? ")" ("let" dec+ "in")? exp ";"
    // Methods share this shape.
    fn parse_function(&mut self) -> ParserResult<Function> {
        let location = self.current_source_location()?;
        self.expect(&Kind::Fun)?;
        let (name, _) = self.expect_identifier()?;
        self.expect(&Kind::Colon)?;
        let return_type = self.parse_type()?;
        self.expect(&Kind::ParenOpen)?;
        let parameter = self.parse_parameter_list()?;
        self.expect(&Kind::ParenClose)?;

        self.check_and_increment_recursion()?;
        let declarations = self.parse_local_declarations();
        self.decrement_recursion();
        let declarations = declarations?;
        let body = self.parse_expr()?;
        self.expect(&Kind::Semicolon)?;

        Ok(Function {
            name,
            return_type,
            parameter,
            declarations,
            body,
            location: Some(location),
        })
    }

    // ("let" dec+ "in")?
    fn parse_local_declarations(&mut self) -> ParserResult<Vec<DeclRef>> {
        if *self.peek()? != Kind::Let {
            return Ok(vec![]);
        }
        self.next()?;
        let declarations = self.parse_declaration_list()?;
        self.expect(&Kind::In)?;
        Ok(declarations)
    }

    fn parse_parameter_list(&mut self) -> ParserResult<ParameterList> {
        let mut params = vec![];
        if *self.peek()? == Kind::ParenClose {
            return Ok(params);
        }
        loop {
            let (name, location) = self.expect_identifier()?;
            self.expect(&Kind::Colon)?;
            let ty = self.parse_hotype()?;
            params.push(Parameter { name, ty, location: Some(location) });
            if *self.peek()? != Kind::Comma {
                return Ok(params);
            }
            self.next()?;
        }
    }

    // class := "class" ID "(" fields? ")" "{" method* "}"
    fn parse_class_decl(&mut self) -> ParserResult<DeclRef> {
        let location = self.current_source_location()?;
        self.expect(&Kind::Class)?;
        let (name, _) = self.expect_identifier()?;

        self.expect(&Kind::ParenOpen)?;
        let mut fields = vec![];
        if *self.peek()? != Kind::ParenClose {
            loop {
                let (field_name, field_location) = self.expect_identifier()?;
                self.expect(&Kind::Colon)?;
                let ty = self.parse_type()?;
                fields.push(Field { name: field_name, ty, location: Some(field_location) });
                if *self.peek()? != Kind::Comma {
                    break;
                }
                self.next()?;
            }
        }
        self.expect(&Kind::ParenClose)?;

        self.expect(&Kind::BraceOpen)?;
        let mut methods = vec![];
        while *self.peek()? == Kind::Fun {
            methods.push(self.parse_function()?);
        }
        self.expect(&Kind::BraceClose)?;

        Ok(self.ast_builder.class_decl(ClassDecl {
            name,
            fields,
            methods,
            location: Some(location),
        }))
    }

    // type := "int" | "bool" | ID
    pub fn parse_type(&mut self) -> ParserResult<TypeDecl> {
        match self.peek()?.clone() {
            Kind::Int => {
                self.next()?;
                Ok(TypeDecl::Int)
            }
            Kind::Bool => {
                self.next()?;
                Ok(TypeDecl::Bool)
            }
            Kind::Identifier(_) => {
                let (name, _) = self.expect_identifier()?;
                Ok(TypeDecl::Class(name))
            }
            _ => Err(self.unexpected("type")?),
        }
    }

    // hotype := type | "(" (hotype ("," hotype)*)? ")" "->" type
    pub fn parse_hotype(&mut self) -> ParserResult<TypeDecl> {
        if *self.peek()? != Kind::ParenOpen {
            return self.parse_type();
        }
        self.next()?;
        let mut params = vec![];
        if *self.peek()? != Kind::ParenClose {
            loop {
                self.check_and_increment_recursion()?;
                let param = self.parse_hotype();
                self.decrement_recursion();
                params.push(param?);
                if *self.peek()? != Kind::Comma {
                    break;
                }
                self.next()?;
            }
        }
        self.expect(&Kind::ParenClose)?;
        self.expect(&Kind::Arrow)?;
        let ret = self.parse_type()?;
        Ok(TypeDecl::Arrow(params, Box::new(ret)))
    }
}
