//! Name resolution and storage layout.
//!
//! The binder walks a parsed `Program` once, left to right, and records for
//! every identifier, call, dotted call and `new` which declaration it refers
//! to and from how deep a scope it was referenced. Errors are collected and
//! binding carries on, so one run reports as many problems as it can.

pub mod class_registry;
pub mod error;
pub mod scope;
pub mod symbol;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::rc::Rc;
use string_interner::{DefaultStringInterner, DefaultSymbol};
use tracing::{debug, trace};

use crate::ast::*;
use crate::type_decl::TypeDecl;

pub use class_registry::{ClassInfo, ClassRegistry};
pub use error::{BindError, BindErrorKind};
pub use scope::{Scope, ScopeKind, ScopeStack};
pub use symbol::{ClassDescriptor, EntryKind, Resolution, SymbolTableEntry, TypeDescriptor};

/// Output of binding: the resolution side table, the class registry and
/// every error found.
#[derive(Debug, Default)]
pub struct Bindings {
    resolutions: HashMap<ExprRef, Resolution>,
    classes: ClassRegistry,
    errors: Vec<BindError>,
}

impl Bindings {
    pub fn resolution(&self, e: ExprRef) -> Option<&Resolution> {
        self.resolutions.get(&e)
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.len()
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn errors(&self) -> &[BindError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Deepest expression nesting walked before a subtree is rejected.
pub const MAX_NESTING_DEPTH: usize = 512;

pub fn bind(program: &Program, interner: &DefaultStringInterner) -> Bindings {
    Binder::new(program, interner).bind()
}

pub struct Binder<'a> {
    program: &'a Program,
    interner: &'a DefaultStringInterner,
    scopes: ScopeStack,
    classes: ClassRegistry,
    resolutions: HashMap<ExprRef, Resolution>,
    errors: Vec<BindError>,
    current_class: Option<DefaultSymbol>,
    nesting: usize,
}

impl<'a> Binder<'a> {
    pub fn new(program: &'a Program, interner: &'a DefaultStringInterner) -> Self {
        Binder {
            program,
            interner,
            scopes: ScopeStack::new(),
            classes: ClassRegistry::new(),
            resolutions: HashMap::new(),
            errors: Vec::new(),
            current_class: None,
            nesting: 0,
        }
    }

    pub fn bind(mut self) -> Bindings {
        let program = self.program;
        self.in_scope(Scope::new(ScopeKind::Global), |binder| {
            for d in &program.declarations {
                binder.bind_decl(*d);
            }
            binder.bind_expr(program.body);
        });
        debug!(
            resolutions = self.resolutions.len(),
            classes = self.classes.len(),
            errors = self.errors.len(),
            "binding finished"
        );
        Bindings {
            resolutions: self.resolutions,
            classes: self.classes,
            errors: self.errors,
        }
    }

    /// Runs `f` with `scope` pushed and hands the scope back once it is
    /// popped again.
    fn in_scope<R>(&mut self, scope: Scope, f: impl FnOnce(&mut Self) -> R) -> (R, Option<Scope>) {
        self.scopes.push(scope);
        trace!(depth = self.scopes.depth(), "enter scope");
        let result = f(self);
        trace!(depth = self.scopes.depth(), "leave scope");
        (result, self.scopes.pop())
    }

    fn name(&self, symbol: DefaultSymbol) -> String {
        self.interner.resolve(symbol).unwrap_or("<unknown>").to_string()
    }

    fn report(&mut self, kind: BindErrorKind, location: Option<SourceLocation>) {
        let error = BindError::new(kind).with_location(location);
        debug!(%error, "bind error");
        self.errors.push(error);
    }

    fn declare(&mut self, name: DefaultSymbol, ty: TypeDescriptor, kind: EntryKind, location: Option<SourceLocation>) -> Option<SymbolTableEntry> {
        let depth = self.scopes.depth();
        let entry = self
            .scopes
            .current_mut()
            .and_then(|scope| scope.declare(name, depth, ty, kind));
        match &entry {
            Some(e) => trace!(name = %self.name(name), depth, offset = e.offset, ?kind, "declare"),
            None => self.report(BindErrorKind::DuplicateDeclaration(self.name(name)), location),
        }
        entry
    }

    fn is_known_class(&self, name: DefaultSymbol) -> bool {
        self.current_class == Some(name) || self.classes.contains(name) || self.global_class(name).is_some()
    }

    fn global_class(&self, name: DefaultSymbol) -> Option<&SymbolTableEntry> {
        self.scopes
            .global()
            .and_then(|scope| scope.get(name))
            .filter(|entry| entry.kind == EntryKind::Class)
    }

    fn descriptor(&mut self, ty: &TypeDecl, location: Option<SourceLocation>) -> TypeDescriptor {
        match ty {
            TypeDecl::Int => TypeDescriptor::Int,
            TypeDecl::Bool => TypeDescriptor::Bool,
            TypeDecl::Class(name) => {
                if !self.is_known_class(*name) {
                    self.report(BindErrorKind::UnknownClass(self.name(*name)), location);
                }
                TypeDescriptor::ClassRef(*name)
            }
            TypeDecl::Arrow(params, ret) => {
                let params = params.iter().map(|p| self.descriptor(p, location)).collect();
                TypeDescriptor::Arrow(params, Box::new(self.descriptor(ret, location)))
            }
        }
    }

    fn bind_decl(&mut self, d: DeclRef) {
        let program = self.program;
        match program.decl(d) {
            Some(Decl::Var(var)) => {
                // the initializer cannot see the name it initializes
                self.bind_expr(var.init);
                let ty = self.descriptor(&var.ty, var.location);
                self.declare(var.name, ty, EntryKind::Variable, var.location);
            }
            Some(Decl::Fun(function)) => {
                let ty = self.descriptor(&function.arrow_type(), function.location);
                self.bind_function(function, ty, EntryKind::Function);
            }
            Some(Decl::Class(class)) => {
                if self.scopes.depth() == 0 {
                    self.bind_class(class);
                } else {
                    self.report(BindErrorKind::MisplacedClass(self.name(class.name)), class.location);
                }
            }
            None => {}
        }
    }

    /// Declares `function` in the current scope, then binds its parameters,
    /// local declarations and body one scope deeper.
    fn bind_function(&mut self, function: &Function, ty: TypeDescriptor, kind: EntryKind) {
        let param_types = match &ty {
            TypeDescriptor::Arrow(params, _) => params.clone(),
            _ => vec![],
        };
        self.declare(function.name, ty, kind, function.location);

        self.in_scope(Scope::new(ScopeKind::Function), |binder| {
            for (param, ty) in function.parameter.iter().zip(param_types) {
                binder.declare(param.name, ty, EntryKind::Parameter, param.location);
            }
            for d in &function.declarations {
                binder.bind_decl(*d);
            }
            binder.bind_expr(function.body);
        });
    }

    fn bind_class(&mut self, class: &ClassDecl) {
        self.current_class = Some(class.name);
        let fields = class.fields.iter().map(|f| self.descriptor(&f.ty, f.location)).collect();
        let methods = class
            .methods
            .iter()
            .map(|m| self.descriptor(&m.arrow_type(), m.location))
            .collect();
        let descriptor = Rc::new(ClassDescriptor { name: class.name, fields, methods });
        let declared = self
            .declare(class.name, TypeDescriptor::ClassDescriptor(descriptor.clone()), EntryKind::Class, class.location)
            .is_some();

        let (_, scope) = self.in_scope(Scope::new(ScopeKind::Class(class.name)), |binder| {
            for (field, ty) in class.fields.iter().zip(&descriptor.fields) {
                binder.declare(field.name, ty.clone(), EntryKind::Field, field.location);
            }
            for (method, ty) in class.methods.iter().zip(&descriptor.methods) {
                binder.bind_function(method, ty.clone(), EntryKind::Method);
            }
        });
        self.current_class = None;

        if let (true, Some(scope)) = (declared, scope) {
            debug!(class = %self.name(class.name), members = scope.len(), "register class");
            self.classes.register(class.name, descriptor, scope);
        }
    }

    fn bind_expr(&mut self, e: ExprRef) {
        if self.nesting >= MAX_NESTING_DEPTH {
            self.report(BindErrorKind::NestingTooDeep(MAX_NESTING_DEPTH), self.program.expr_location(e));
            return;
        }
        self.nesting += 1;
        self.bind_node(e);
        self.nesting -= 1;
    }

    fn bind_node(&mut self, e: ExprRef) {
        let program = self.program;
        let Some(expr) = program.expr(e) else {
            return;
        };
        match expr {
            Expr::Int(_) | Expr::True | Expr::False | Expr::Null => {}
            Expr::Binary(..) => self.bind_operator_chain(e),
            Expr::Not(operand) | Expr::Print(operand) => self.bind_expr(*operand),
            Expr::IfElse(cond, then_expr, else_expr) => {
                self.bind_expr(*cond);
                self.bind_expr(*then_expr);
                self.bind_expr(*else_expr);
            }
            Expr::Identifier(name) => self.bind_value(e, *name),
            Expr::Call(name, args) => {
                self.resolve_name(e, *name);
                self.bind_args(args);
            }
            Expr::MethodCall(receiver, method, args) => {
                self.resolve_method_call(e, *receiver, *method);
                self.bind_args(args);
            }
            Expr::New(class, args) => {
                self.resolve_new(e, *class);
                self.bind_args(args);
            }
        }
    }

    /// Binds `a op b op c ...` walking the left operands in a loop, so a
    /// long chain costs no stack.
    fn bind_operator_chain(&mut self, e: ExprRef) {
        let program = self.program;
        let mut right_operands = vec![];
        let mut current = e;
        while let Some(Expr::Binary(_, lhs, rhs)) = program.expr(current) {
            right_operands.push(*rhs);
            current = *lhs;
        }
        self.bind_expr(current);
        for rhs in right_operands.into_iter().rev() {
            self.bind_expr(rhs);
        }
    }

    /// A function value carries only its code address, so it must be a
    /// function of the global frame.
    fn bind_value(&mut self, e: ExprRef, name: DefaultSymbol) {
        let Some(resolution) = self.resolve_name(e, name) else {
            return;
        };
        let entry = &resolution.entry;
        if matches!(entry.kind, EntryKind::Function | EntryKind::Method) && entry.depth > 0 {
            self.report(BindErrorKind::LocalFunctionValue(self.name(name)), self.program.expr_location(e));
        }
    }

    fn bind_args(&mut self, args: &[ExprRef]) {
        for arg in args {
            self.bind_expr(*arg);
        }
    }

    fn resolve_name(&mut self, e: ExprRef, name: DefaultSymbol) -> Option<Resolution> {
        let call_depth = self.scopes.depth();
        match self.scopes.lookup(name).cloned() {
            Some(entry) => {
                let resolution = Resolution::new(entry, call_depth);
                self.resolutions.insert(e, resolution.clone());
                Some(resolution)
            }
            None => {
                self.report(BindErrorKind::UnresolvedIdentifier(self.name(name)), self.program.expr_location(e));
                None
            }
        }
    }

    fn resolve_method_call(&mut self, e: ExprRef, receiver: DefaultSymbol, method: DefaultSymbol) {
        let location = self.program.expr_location(e);
        let call_depth = self.scopes.depth();
        let Some(entry) = self.scopes.lookup(receiver).cloned() else {
            self.report(BindErrorKind::UnresolvedIdentifier(self.name(receiver)), location);
            return;
        };
        let Some(class) = entry.ty.class_name() else {
            self.report(BindErrorKind::NotAnObject(self.name(receiver)), location);
            return;
        };
        if !self.is_known_class(class) {
            // already reported where the receiver's type was declared
            return;
        }

        let member = match self.classes.member(class, method) {
            Some(member) => Some(member.clone()),
            None => self.scopes.class_scope(class).and_then(|scope| scope.get(method)).cloned(),
        };
        match member.filter(|m| m.kind == EntryKind::Method) {
            Some(method_entry) => {
                self.resolutions.insert(e, Resolution { entry, call_depth, method: Some(method_entry) });
            }
            None => self.report(
                BindErrorKind::UnknownMethod { class: self.name(class), method: self.name(method) },
                location,
            ),
        }
    }

    fn resolve_new(&mut self, e: ExprRef, class: DefaultSymbol) {
        let call_depth = self.scopes.depth();
        match self.global_class(class).cloned() {
            Some(entry) => {
                self.resolutions.insert(e, Resolution::new(entry, call_depth));
            }
            None => self.report(BindErrorKind::UnknownClass(self.name(class)), self.program.expr_location(e)),
        }
    }
}
