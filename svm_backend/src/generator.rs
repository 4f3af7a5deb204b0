use frontend::ast::*;
use frontend::binder::{Bindings, EntryKind, Resolution};
use svm::Instruction;
use tracing::{debug, trace};

use crate::error::CodegenError;
use crate::label::LabelGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Absolute address of the global frame, i.e. the machine's initial `$fp`.
    pub global_frame_base: i64,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions { global_frame_base: 10000 }
    }
}

/// Deepest expression nesting compiled before giving up.
pub const MAX_NESTING_DEPTH: usize = 512;

pub fn generate(program: &Program, bindings: &Bindings, options: CodegenOptions) -> Result<Vec<Instruction>, CodegenError> {
    CodeGenerator::new(program, bindings, options).generate()
}

fn joined(mut left: Vec<Instruction>, right: Vec<Instruction>, last: Instruction) -> Vec<Instruction> {
    left.extend(right);
    left.push(last);
    left
}

/// Stack machine code generator.
///
/// Function and method bodies are compiled out of line into `functions`
/// and appended after the final `halt`.
pub struct CodeGenerator<'a> {
    program: &'a Program,
    bindings: &'a Bindings,
    labels: LabelGenerator,
    functions: Vec<Instruction>,
    in_class: bool,
    nesting: usize,
    options: CodegenOptions,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(program: &'a Program, bindings: &'a Bindings, options: CodegenOptions) -> Self {
        CodeGenerator {
            program,
            bindings,
            labels: LabelGenerator::new(),
            functions: Vec::new(),
            in_class: false,
            nesting: 0,
            options,
        }
    }

    pub fn generate(mut self) -> Result<Vec<Instruction>, CodegenError> {
        if self.bindings.has_errors() {
            return Err(CodegenError::BindingErrors(self.bindings.error_count()));
        }
        let program = self.program;
        let mut codes = vec![];
        if program.has_declarations() {
            // unused cell at offset -1 of the global frame
            codes.push(Instruction::push(0));
            for d in &program.declarations {
                codes.append(&mut self.compile_decl(*d)?);
            }
        }
        codes.append(&mut self.compile_expr(program.body)?);
        codes.push(Instruction::Halt);
        codes.append(&mut self.functions);
        debug!(instructions = codes.len(), "code generated");
        Ok(codes)
    }

    fn resolution(&self, e: ExprRef) -> Result<&'a Resolution, CodegenError> {
        self.bindings.resolution(e).ok_or(CodegenError::Unresolved(e))
    }

    fn compile_decl(&mut self, d: DeclRef) -> Result<Vec<Instruction>, CodegenError> {
        let program = self.program;
        match program.decl(d).ok_or(CodegenError::MissingDeclaration(d))? {
            Decl::Var(var) => self.compile_expr(var.init),
            Decl::Fun(function) => {
                let label = self.labels.fresh_function();
                let mut body = self.compile_function(&label, function)?;
                self.functions.append(&mut body);
                Ok(vec![Instruction::push_label(&label)])
            }
            Decl::Class(class) => self.compile_class(class),
        }
    }

    /// Entry label, prologue, local declarations, body and epilogue of one
    /// function or method.
    fn compile_function(&mut self, label: &str, function: &Function) -> Result<Vec<Instruction>, CodegenError> {
        trace!(label, params = function.parameter.len(), "compile function body");
        let mut codes = vec![Instruction::Label(label.to_string()), Instruction::CopyFp, Instruction::LoadRa];
        for d in &function.declarations {
            codes.append(&mut self.compile_decl(*d)?);
        }
        codes.append(&mut self.compile_expr(function.body)?);

        codes.push(Instruction::StoreTm);
        codes.extend(function.declarations.iter().map(|_| Instruction::Pop));
        codes.push(Instruction::StoreRa);
        // access link
        codes.push(Instruction::Pop);
        codes.extend(function.parameter.iter().map(|_| Instruction::Pop));
        codes.extend([Instruction::StoreFp, Instruction::LoadTm, Instruction::LoadRa, Instruction::JumpSub]);
        Ok(codes)
    }

    /// Compiles the methods out of line, then writes the dispatch table to
    /// the heap. The table's address is left on the stack as the class's
    /// global value.
    fn compile_class(&mut self, class: &ClassDecl) -> Result<Vec<Instruction>, CodegenError> {
        let mut method_labels = Vec::with_capacity(class.methods.len());
        self.in_class = true;
        for method in &class.methods {
            let label = self.labels.fresh_function();
            let mut body = self.compile_function(&label, method)?;
            self.functions.append(&mut body);
            method_labels.push(label);
        }
        self.in_class = false;

        let mut codes = vec![Instruction::LoadHp];
        for label in &method_labels {
            codes.push(Instruction::push_label(label));
            codes.push(Instruction::LoadHp);
            codes.push(Instruction::StoreWord);
            codes.append(&mut Self::bump_heap_pointer());
        }
        Ok(codes)
    }

    fn bump_heap_pointer() -> Vec<Instruction> {
        vec![Instruction::LoadHp, Instruction::push(1), Instruction::Add, Instruction::StoreHp]
    }

    /// Address of the frame that declared `r.entry`, as seen from the
    /// referencing frame.
    fn frame_address(&self, r: &Resolution) -> Vec<Instruction> {
        if self.in_class && r.entry.depth == 0 {
            // the static chain inside a class body runs through an object
            return vec![Instruction::push(self.options.global_frame_base)];
        }
        let mut codes = vec![Instruction::LoadFp];
        codes.extend((0..r.hops()).map(|_| Instruction::LoadWord));
        codes
    }

    fn compile_args(&mut self, args: &[ExprRef]) -> Result<Vec<Instruction>, CodegenError> {
        let mut codes = vec![];
        for arg in args.iter().rev() {
            codes.append(&mut self.compile_expr(*arg)?);
        }
        Ok(codes)
    }

    /// `left right <branch> true; push 0; b end; true: push 1; end:`
    fn compare(&mut self, left: Vec<Instruction>, right: Vec<Instruction>, branch: fn(String) -> Instruction) -> Vec<Instruction> {
        let l_true = self.labels.fresh_label();
        let l_end = self.labels.fresh_label();
        let mut codes = left;
        codes.extend(right);
        codes.extend([
            branch(l_true.clone()),
            Instruction::push(0),
            Instruction::Branch(l_end.clone()),
            Instruction::Label(l_true),
            Instruction::push(1),
            Instruction::Label(l_end),
        ]);
        codes
    }

    /// Code for `left op right` once both operands are compiled. `>=` swaps
    /// its operands into `bleq`.
    fn combine(&mut self, op: Operator, left: Vec<Instruction>, right: Vec<Instruction>) -> Vec<Instruction> {
        match op {
            Operator::IAdd => joined(left, right, Instruction::Add),
            Operator::ISub => joined(left, right, Instruction::Sub),
            Operator::IMul => joined(left, right, Instruction::Mult),
            Operator::IDiv => joined(left, right, Instruction::Div),
            // both operands are 0 or 1 and both are always evaluated
            Operator::LogicalAnd => joined(left, right, Instruction::Mult),
            Operator::EQ => self.compare(left, right, Instruction::BranchEq),
            Operator::LE => self.compare(left, right, Instruction::BranchLessEq),
            Operator::GE => self.compare(right, left, Instruction::BranchLessEq),
            Operator::LogicalOr => {
                let l_true = self.labels.fresh_label();
                let l_end = self.labels.fresh_label();
                let mut codes = left;
                codes.extend([Instruction::push(1), Instruction::BranchEq(l_true.clone())]);
                codes.extend(right);
                codes.extend([
                    Instruction::push(1),
                    Instruction::BranchEq(l_true.clone()),
                    Instruction::push(0),
                    Instruction::Branch(l_end.clone()),
                    Instruction::Label(l_true),
                    Instruction::push(1),
                    Instruction::Label(l_end),
                ]);
                codes
            }
        }
    }

    /// Every operator but `>=` emits its left operand first, so the left
    /// spine of `a op b op c ...` is walked in a loop and only right
    /// operands recurse.
    fn compile_operator_chain(&mut self, e: ExprRef) -> Result<Vec<Instruction>, CodegenError> {
        let program = self.program;
        let mut chain = vec![];
        let mut current = e;
        while let Some(Expr::Binary(op, lhs, rhs)) = program.expr(current) {
            if *op == Operator::GE {
                break;
            }
            chain.push((*op, *rhs));
            current = *lhs;
        }
        let mut codes = match program.expr(current) {
            Some(Expr::Binary(op, lhs, rhs)) => {
                let left = self.compile_expr(*lhs)?;
                let right = self.compile_expr(*rhs)?;
                self.combine(*op, left, right)
            }
            _ => self.compile_expr(current)?,
        };
        for (op, rhs) in chain.into_iter().rev() {
            let right = self.compile_expr(rhs)?;
            codes = self.combine(op, codes, right);
        }
        Ok(codes)
    }

    fn compile_expr(&mut self, e: ExprRef) -> Result<Vec<Instruction>, CodegenError> {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Err(CodegenError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        self.nesting += 1;
        let codes = self.compile_node(e);
        self.nesting -= 1;
        codes
    }

    fn compile_node(&mut self, e: ExprRef) -> Result<Vec<Instruction>, CodegenError> {
        let program = self.program;
        match program.expr(e).ok_or(CodegenError::MissingExpression(e))? {
            Expr::Int(v) => Ok(vec![Instruction::push(*v)]),
            Expr::True => Ok(vec![Instruction::push(1)]),
            Expr::False => Ok(vec![Instruction::push(0)]),
            Expr::Null => Ok(vec![Instruction::push(-1)]),
            Expr::Binary(..) => self.compile_operator_chain(e),
            Expr::Not(operand) => self.compile_not(*operand),
            Expr::IfElse(cond, then_expr, else_expr) => self.compile_if(*cond, *then_expr, *else_expr),
            Expr::Print(operand) => {
                let mut codes = self.compile_expr(*operand)?;
                codes.extend([Instruction::StoreTm, Instruction::LoadTm, Instruction::LoadTm, Instruction::Print]);
                Ok(codes)
            }
            Expr::Identifier(_) => {
                let r = self.resolution(e)?;
                let mut codes = self.frame_address(r);
                codes.extend([Instruction::push(r.entry.offset as i64), Instruction::Add, Instruction::LoadWord]);
                Ok(codes)
            }
            Expr::Call(_, args) => self.compile_call(e, args),
            Expr::MethodCall(_, _, args) => self.compile_method_call(e, args),
            Expr::New(_, args) => self.compile_new(e, args),
        }
    }

    fn compile_not(&mut self, operand: ExprRef) -> Result<Vec<Instruction>, CodegenError> {
        let l_true = self.labels.fresh_label();
        let l_end = self.labels.fresh_label();
        let mut codes = self.compile_expr(operand)?;
        codes.extend([
            Instruction::push(0),
            Instruction::BranchEq(l_true.clone()),
            Instruction::push(0),
            Instruction::Branch(l_end.clone()),
            Instruction::Label(l_true),
            Instruction::push(1),
            Instruction::Label(l_end),
        ]);
        Ok(codes)
    }

    fn compile_if(&mut self, cond: ExprRef, then_expr: ExprRef, else_expr: ExprRef) -> Result<Vec<Instruction>, CodegenError> {
        let l_then = self.labels.fresh_label();
        let l_end = self.labels.fresh_label();
        let mut codes = self.compile_expr(cond)?;
        codes.extend([Instruction::push(1), Instruction::BranchEq(l_then.clone())]);
        codes.append(&mut self.compile_expr(else_expr)?);
        codes.extend([Instruction::Branch(l_end.clone()), Instruction::Label(l_then)]);
        codes.append(&mut self.compile_expr(then_expr)?);
        codes.push(Instruction::Label(l_end));
        Ok(codes)
    }

    /// `lfp; args; <access link>; <code address>; js`. A declared function
    /// gets its declaring frame as access link, a method its object, and a
    /// function value the global frame.
    fn compile_call(&mut self, e: ExprRef, args: &[ExprRef]) -> Result<Vec<Instruction>, CodegenError> {
        let r = self.resolution(e)?;
        let mut codes = vec![Instruction::LoadFp];
        codes.append(&mut self.compile_args(args)?);
        match r.entry.kind {
            EntryKind::Function | EntryKind::Method => {
                codes.append(&mut self.frame_address(r));
                codes.extend([Instruction::StoreTm, Instruction::LoadTm, Instruction::LoadTm]);
                if r.entry.kind == EntryKind::Method {
                    // implicit receiver: the access link is the object pointer
                    codes.push(Instruction::LoadWord);
                }
            }
            _ => {
                codes.push(Instruction::push(self.options.global_frame_base));
                codes.append(&mut self.frame_address(r));
            }
        }
        codes.extend([
            Instruction::push(r.entry.offset as i64),
            Instruction::Add,
            Instruction::LoadWord,
            Instruction::JumpSub,
        ]);
        Ok(codes)
    }

    fn compile_method_call(&mut self, e: ExprRef, args: &[ExprRef]) -> Result<Vec<Instruction>, CodegenError> {
        let r = self.resolution(e)?;
        let method = r.method.as_ref().ok_or(CodegenError::MissingMethod(e))?;
        let mut codes = vec![Instruction::LoadFp];
        codes.append(&mut self.compile_args(args)?);
        codes.append(&mut self.frame_address(r));
        codes.extend([
            Instruction::push(r.entry.offset as i64),
            Instruction::Add,
            Instruction::LoadWord,
            Instruction::StoreTm,
            Instruction::LoadTm,
            Instruction::LoadTm,
            Instruction::LoadWord,
            Instruction::push(method.offset as i64),
            Instruction::Add,
            Instruction::LoadWord,
            Instruction::JumpSub,
        ]);
        Ok(codes)
    }

    /// Fields go to the heap in reverse so field 1 ends up just below the
    /// dispatch pointer; the object pointer is left on the stack.
    fn compile_new(&mut self, e: ExprRef, args: &[ExprRef]) -> Result<Vec<Instruction>, CodegenError> {
        let r = self.resolution(e)?;
        let mut codes = vec![];
        for arg in args {
            codes.append(&mut self.compile_expr(*arg)?);
        }
        for _ in args {
            codes.extend([Instruction::LoadHp, Instruction::StoreWord]);
            codes.append(&mut Self::bump_heap_pointer());
        }
        codes.extend([
            Instruction::push(self.options.global_frame_base + r.entry.offset as i64),
            Instruction::LoadWord,
            Instruction::LoadHp,
            Instruction::StoreWord,
            Instruction::LoadHp,
        ]);
        codes.append(&mut Self::bump_heap_pointer());
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontend::binder::bind;
    use frontend::Parser;
    use rstest::rstest;
    use string_interner::DefaultStringInterner;

    fn asm(source: &str) -> Vec<String> {
        let mut interner = DefaultStringInterner::new();
        let program = Parser::new(source, &mut interner).parse_program().unwrap();
        let bindings = bind(&program, &interner);
        let codes = generate(&program, &bindings, CodegenOptions::default()).unwrap();
        codes.iter().map(|i| i.to_string()).collect()
    }

    #[rstest]
    #[case("2 + 3 * 4;", &["push 2", "push 3", "push 4", "mult", "add", "halt"])]
    #[case("null;", &["push -1", "halt"])]
    #[case("print(3);", &["push 3", "stm", "ltm", "ltm", "print", "halt"])]
    #[case("true && false;", &["push 1", "push 0", "mult", "halt"])]
    #[case("let var x:int = 5; in x;", &["push 0", "push 5", "lfp", "push -2", "add", "lw", "halt"])]
    #[case(
        "1 >= 2;",
        &["push 2", "push 1", "bleq label0", "push 0", "b label1", "label0:", "push 1", "label1:", "halt"]
    )]
    #[case(
        "1 == 2;",
        &["push 1", "push 2", "beq label0", "push 0", "b label1", "label0:", "push 1", "label1:", "halt"]
    )]
    #[case(
        "!true;",
        &["push 1", "push 0", "beq label0", "push 0", "b label1", "label0:", "push 1", "label1:", "halt"]
    )]
    #[case(
        "if true then { 1 } else { 2 };",
        &["push 1", "push 1", "beq label0", "push 2", "b label1", "label0:", "push 1", "label1:", "halt"]
    )]
    #[case(
        "true || false;",
        &[
            "push 1", "push 1", "beq label0",
            "push 0", "push 1", "beq label0",
            "push 0", "b label1", "label0:", "push 1", "label1:", "halt",
        ]
    )]
    fn expression_shapes(#[case] source: &str, #[case] expected: &[&str]) {
        assert_eq!(asm(source), expected);
    }

    #[test]
    fn function_call_and_activation_record() {
        let code = asm("let fun f:int(a:int, b:int) let var c:int = a; in c; in f(1, 2);");
        assert_eq!(
            code,
            vec![
                "push 0", "push function0",
                "lfp", "push 2", "push 1", "lfp", "stm", "ltm", "ltm", "push -2", "add", "lw", "js",
                "halt",
                "function0:", "cfp", "lra",
                "lfp", "push 1", "add", "lw",
                "lfp", "push -2", "add", "lw",
                "stm", "pop", "sra", "pop", "pop", "pop", "sfp", "ltm", "lra", "js",
            ]
        );
    }

    #[test]
    fn class_new_and_dotted_call() {
        let code = asm("let class P(x:int) { fun get:int() x; } var p:P = new P(7); in p.get();");
        assert_eq!(
            code,
            vec![
                "push 0",
                "lhp", "push function0", "lhp", "sw", "lhp", "push 1", "add", "shp",
                "push 7", "lhp", "sw", "lhp", "push 1", "add", "shp",
                "push 9998", "lw", "lhp", "sw", "lhp", "lhp", "push 1", "add", "shp",
                "lfp", "lfp", "push -3", "add", "lw", "stm", "ltm", "ltm", "lw", "push 0", "add", "lw", "js",
                "halt",
                "function0:", "cfp", "lra",
                "lfp", "lw", "push -1", "add", "lw",
                "stm", "sra", "pop", "sfp", "ltm", "lra", "js",
            ]
        );
    }

    #[test]
    fn implicit_receiver_call_goes_through_dispatch_table() {
        let code = asm("let class C() { fun a:int() 1; fun b:int() a(); } in 0;");
        let body_of_b: Vec<&str> = code
            .iter()
            .map(String::as_str)
            .skip_while(|i| *i != "function1:")
            .collect();
        assert_eq!(
            &body_of_b[3..14],
            &["lfp", "lfp", "lw", "stm", "ltm", "ltm", "lw", "push 0", "add", "lw", "js"]
        );
    }

    #[test]
    fn globals_inside_methods_use_the_global_frame_base() {
        let code = asm("let var g:int = 1; class C() { fun m:int() g; } in g;");
        let method: Vec<&str> = code.iter().map(String::as_str).skip_while(|i| *i != "function0:").collect();
        assert_eq!(&method[3..7], &["push 10000", "push -2", "add", "lw"]);
        // the same global read from the program body walks the chain
        let main: Vec<&str> = code.iter().map(String::as_str).take_while(|i| *i != "halt").collect();
        assert_eq!(&main[main.len() - 4..], &["lfp", "push -2", "add", "lw"]);
    }

    #[test]
    fn function_value_is_called_with_the_global_frame_as_access_link() {
        let code = asm("let fun apply:int(h:(int)->int) h(1); in 0;");
        let body: Vec<&str> = code.iter().map(String::as_str).skip_while(|i| *i != "function0:").collect();
        assert_eq!(&body[3..11], &["lfp", "push 1", "push 10000", "lfp", "push 1", "add", "lw", "js"]);
    }

    #[test]
    fn long_operator_chain_compiles_in_a_loop() {
        let code = asm(&format!("{}1;", "1 - ".repeat(5000)));
        assert_eq!(code.len(), 10002);
        assert_eq!(&code[..4], &["push 1", "push 1", "sub", "push 1"]);
    }

    #[test]
    fn nesting_beyond_limit_is_an_error() {
        let mut builder = AstBuilder::new();
        let mut e = builder.int_expr(1, None);
        for _ in 0..MAX_NESTING_DEPTH + 100 {
            e = builder.print_expr(e, None);
        }
        let program = builder.build(vec![], e);
        assert_eq!(
            generate(&program, &Bindings::default(), CodegenOptions::default()),
            Err(CodegenError::NestingTooDeep(MAX_NESTING_DEPTH))
        );
    }

    #[test]
    fn generation_requires_clean_binding() {
        let mut interner = DefaultStringInterner::new();
        let program = Parser::new("missing + 1;", &mut interner).parse_program().unwrap();
        let bindings = bind(&program, &interner);
        assert_eq!(
            generate(&program, &bindings, CodegenOptions::default()),
            Err(CodegenError::BindingErrors(1))
        );
    }
}
