use string_interner::DefaultSymbol;
use crate::type_decl::TypeDecl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, offset: u32) -> Self {
        SourceLocation { line, column, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprRef(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclRef(pub u32);

#[derive(Debug, Default)]
pub struct ExprPool(pub Vec<Expr>);

impl ExprPool {
    pub fn new() -> Self {
        ExprPool(Vec::new())
    }

    pub fn with_capacity(cap: usize) -> Self {
        ExprPool(Vec::with_capacity(cap))
    }

    pub fn add(&mut self, expr: Expr) -> ExprRef {
        let len = self.0.len();
        self.0.push(expr);
        ExprRef(len as u32)
    }

    pub fn get(&self, e: ExprRef) -> Option<&Expr> {
        self.0.get(e.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DeclPool(pub Vec<Decl>);

impl DeclPool {
    pub fn new() -> Self {
        DeclPool(Vec::new())
    }

    pub fn with_capacity(cap: usize) -> Self {
        DeclPool(Vec::with_capacity(cap))
    }

    pub fn add(&mut self, decl: Decl) -> DeclRef {
        let len = self.0.len();
        self.0.push(decl);
        DeclRef(len as u32)
    }

    pub fn get(&self, d: DeclRef) -> Option<&Decl> {
        self.0.get(d.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Source locations of expressions, indexed in parallel with the `ExprPool`.
#[derive(Debug, Default)]
pub struct LocationPool(pub Vec<Option<SourceLocation>>);

impl LocationPool {
    pub fn new() -> Self {
        LocationPool(Vec::new())
    }

    pub fn with_capacity(cap: usize) -> Self {
        LocationPool(Vec::with_capacity(cap))
    }

    pub fn add(&mut self, location: Option<SourceLocation>) {
        self.0.push(location);
    }

    pub fn get(&self, e: ExprRef) -> Option<SourceLocation> {
        self.0.get(e.0 as usize).copied().flatten()
    }
}

/// A whole compilation unit: `let <declarations> in <body>;` or just `<body>;`.
///
/// Nodes live in pools and refer to each other through `ExprRef` / `DeclRef`
/// indices, so later passes can attach data to a node by its index without
/// touching the tree itself.
#[derive(Debug)]
pub struct Program {
    pub declarations: Vec<DeclRef>,
    pub body: ExprRef,
    pub expression: ExprPool,
    pub declaration: DeclPool,
    pub location: LocationPool,
}

impl Program {
    pub fn expr(&self, e: ExprRef) -> Option<&Expr> {
        self.expression.get(e)
    }

    pub fn decl(&self, d: DeclRef) -> Option<&Decl> {
        self.declaration.get(d)
    }

    pub fn expr_location(&self, e: ExprRef) -> Option<SourceLocation> {
        self.location.get(e)
    }

    pub fn has_declarations(&self) -> bool {
        !self.declarations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: DefaultSymbol,
    pub ty: TypeDecl,
    pub location: Option<SourceLocation>,
}

pub type ParameterList = Vec<Parameter>;

/// A free function or a method; both share the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: DefaultSymbol,
    pub return_type: TypeDecl,
    pub parameter: ParameterList,
    pub declarations: Vec<DeclRef>,
    pub body: ExprRef,
    pub location: Option<SourceLocation>,
}

impl Function {
    pub fn arrow_type(&self) -> TypeDecl {
        TypeDecl::Arrow(
            self.parameter.iter().map(|p| p.ty.clone()).collect(),
            Box::new(self.return_type.clone()),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: DefaultSymbol,
    pub ty: TypeDecl,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: DefaultSymbol,
    pub fields: Vec<Field>,
    pub methods: Vec<Function>,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: DefaultSymbol,
    pub ty: TypeDecl,
    pub init: ExprRef,
    pub location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Fun(Function),
    Class(ClassDecl),
}

impl Decl {
    pub fn name(&self) -> DefaultSymbol {
        match self {
            Decl::Var(v) => v.name,
            Decl::Fun(f) => f.name,
            Decl::Class(c) => c.name,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Int(i64),
    True,
    False,
    Null,
    Binary(Operator, ExprRef, ExprRef),
    Not(ExprRef),
    IfElse(ExprRef, ExprRef, ExprRef),
    Print(ExprRef),
    Identifier(DefaultSymbol),
    Call(DefaultSymbol, Vec<ExprRef>),
    // receiver.method(args)
    MethodCall(DefaultSymbol, DefaultSymbol, Vec<ExprRef>),
    New(DefaultSymbol, Vec<ExprRef>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    IAdd,
    ISub,
    IMul,
    IDiv,

    // Comparison operator
    EQ, // ==
    LE, // <=
    GE, // >=

    LogicalAnd,
    LogicalOr,
}

/// Incrementally builds the pools of a `Program`.
#[derive(Debug, Default)]
pub struct AstBuilder {
    expr_pool: ExprPool,
    decl_pool: DeclPool,
    location_pool: LocationPool,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(expr_cap: usize, decl_cap: usize) -> Self {
        AstBuilder {
            expr_pool: ExprPool::with_capacity(expr_cap),
            decl_pool: DeclPool::with_capacity(decl_cap),
            location_pool: LocationPool::with_capacity(expr_cap),
        }
    }

    pub fn add_expr(&mut self, expr: Expr, location: Option<SourceLocation>) -> ExprRef {
        self.location_pool.add(location);
        self.expr_pool.add(expr)
    }

    pub fn add_decl(&mut self, decl: Decl) -> DeclRef {
        self.decl_pool.add(decl)
    }

    pub fn int_expr(&mut self, value: i64, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Int(value), location)
    }

    pub fn bool_expr(&mut self, value: bool, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(if value { Expr::True } else { Expr::False }, location)
    }

    pub fn null_expr(&mut self, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Null, location)
    }

    pub fn binary_expr(&mut self, op: Operator, lhs: ExprRef, rhs: ExprRef, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Binary(op, lhs, rhs), location)
    }

    pub fn not_expr(&mut self, operand: ExprRef, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Not(operand), location)
    }

    pub fn if_else_expr(&mut self, cond: ExprRef, then_expr: ExprRef, else_expr: ExprRef, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::IfElse(cond, then_expr, else_expr), location)
    }

    pub fn print_expr(&mut self, operand: ExprRef, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Print(operand), location)
    }

    pub fn identifier_expr(&mut self, name: DefaultSymbol, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Identifier(name), location)
    }

    pub fn call_expr(&mut self, name: DefaultSymbol, args: Vec<ExprRef>, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::Call(name, args), location)
    }

    pub fn method_call_expr(&mut self, receiver: DefaultSymbol, method: DefaultSymbol, args: Vec<ExprRef>, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::MethodCall(receiver, method, args), location)
    }

    pub fn new_expr(&mut self, class: DefaultSymbol, args: Vec<ExprRef>, location: Option<SourceLocation>) -> ExprRef {
        self.add_expr(Expr::New(class, args), location)
    }

    pub fn var_decl(&mut self, name: DefaultSymbol, ty: TypeDecl, init: ExprRef, location: Option<SourceLocation>) -> DeclRef {
        self.add_decl(Decl::Var(VarDecl { name, ty, init, location }))
    }

    pub fn fun_decl(&mut self, function: Function) -> DeclRef {
        self.add_decl(Decl::Fun(function))
    }

    pub fn class_decl(&mut self, class: ClassDecl) -> DeclRef {
        self.add_decl(Decl::Class(class))
    }

    pub fn build(self, declarations: Vec<DeclRef>, body: ExprRef) -> Program {
        Program {
            declarations,
            body,
            expression: self.expr_pool,
            declaration: self.decl_pool,
            location: self.location_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use string_interner::DefaultStringInterner;

    #[test]
    fn builder_keeps_locations_parallel_to_expressions() {
        let mut builder = AstBuilder::new();
        let a = builder.int_expr(2, Some(SourceLocation::new(1, 1, 0)));
        let b = builder.int_expr(3, None);
        let sum = builder.binary_expr(Operator::IAdd, a, b, Some(SourceLocation::new(1, 3, 2)));
        let program = builder.build(vec![], sum);

        assert_eq!(program.expression.len(), 3);
        assert_eq!(program.expr(sum), Some(&Expr::Binary(Operator::IAdd, a, b)));
        assert_eq!(program.expr_location(a).map(|l| l.column), Some(1));
        assert_eq!(program.expr_location(b), None);
        assert_eq!(program.expr_location(sum).map(|l| l.column), Some(3));
        assert!(!program.has_declarations());
    }

    #[test]
    fn function_arrow_type_lists_parameters_in_order() {
        let mut interner: DefaultStringInterner = DefaultStringInterner::new();
        let mut builder = AstBuilder::new();
        let body = builder.int_expr(0, None);
        let f = Function {
            name: interner.get_or_intern("f"),
            return_type: TypeDecl::Bool,
            parameter: vec![
                Parameter { name: interner.get_or_intern("a"), ty: TypeDecl::Int, location: None },
                Parameter { name: interner.get_or_intern("b"), ty: TypeDecl::Bool, location: None },
            ],
            declarations: vec![],
            body,
            location: None,
        };
        assert_eq!(
            f.arrow_type(),
            TypeDecl::Arrow(vec![TypeDecl::Int, TypeDecl::Bool], Box::new(TypeDecl::Bool))
        );
    }
}
