use proptest::prelude::*;
use rstest::rstest;
use string_interner::DefaultStringInterner;

use crate::ast::*;
use crate::parser::Parser;
use super::*;

fn parse(input: &str) -> (Program, DefaultStringInterner) {
    let mut interner = DefaultStringInterner::new();
    let program = Parser::new(input, &mut interner).parse_program().unwrap();
    (program, interner)
}

fn bind_source(input: &str) -> (Program, DefaultStringInterner, Bindings) {
    let (program, interner) = parse(input);
    let bindings = bind(&program, &interner);
    (program, interner, bindings)
}

/// Identifier nodes named `name`, in the order they were parsed.
fn identifiers(program: &Program, interner: &DefaultStringInterner, name: &str) -> Vec<ExprRef> {
    let symbol = interner.get(name);
    (0..program.expression.len() as u32)
        .map(ExprRef)
        .filter(|e| matches!(program.expr(*e), Some(Expr::Identifier(s)) if Some(*s) == symbol))
        .collect()
}

fn kinds(bindings: &Bindings) -> Vec<BindErrorKind> {
    bindings.errors().iter().map(|e| e.kind.clone()).collect()
}

#[test]
fn inner_declaration_shadows_outer_and_outer_is_visible_again() {
    let (program, interner, bindings) = bind_source(
        "let var x:int = 1;
             fun f:int() let var x:int = 2; in x;
         in f() + x;",
    );
    assert_eq!(bindings.error_count(), 0);
    let xs = identifiers(&program, &interner, "x");
    assert_eq!(xs.len(), 2);

    let inner = bindings.resolution(xs[0]).unwrap();
    assert_eq!((inner.entry.depth, inner.entry.offset, inner.call_depth), (1, -2, 1));

    let outer = bindings.resolution(xs[1]).unwrap();
    assert_eq!((outer.entry.depth, outer.entry.offset, outer.call_depth), (0, -2, 0));
}

#[test]
fn parameters_and_locals_get_opposite_offsets() {
    let (program, interner, bindings) = bind_source(
        "let var g:int = 0;
             fun f:int(a:int, b:bool) let var c:int = a; var d:int = c; in if b then { d } else { g };
         in f(1, true);",
    );
    assert_eq!(bindings.error_count(), 0);
    let offset = |name: &str| {
        let e = identifiers(&program, &interner, name)[0];
        let r = bindings.resolution(e).unwrap();
        (r.entry.kind, r.entry.offset, r.hops())
    };
    assert_eq!(offset("a"), (EntryKind::Parameter, 1, 0));
    assert_eq!(offset("b"), (EntryKind::Parameter, 2, 0));
    assert_eq!(offset("c"), (EntryKind::Variable, -2, 0));
    assert_eq!(offset("d"), (EntryKind::Variable, -3, 0));
    assert_eq!(offset("g"), (EntryKind::Variable, -2, 1));
}

#[test]
fn function_can_call_itself() {
    let (program, interner, bindings) = bind_source(
        "let fun fact:int(n:int) if n <= 1 then { 1 } else { n * fact(n - 1) }; in fact(5);",
    );
    assert_eq!(bindings.error_count(), 0);
    let fact = interner.get("fact");
    let calls: Vec<_> = (0..program.expression.len() as u32)
        .map(ExprRef)
        .filter(|e| matches!(program.expr(*e), Some(Expr::Call(s, _)) if Some(*s) == fact))
        .collect();
    assert_eq!(calls.len(), 2);
    let recursive = bindings.resolution(calls[0]).unwrap();
    assert_eq!(recursive.entry.kind, EntryKind::Function);
    assert_eq!((recursive.entry.depth, recursive.call_depth), (0, 1));
    assert!(matches!(recursive.entry.ty, TypeDescriptor::Arrow(ref params, _) if params.len() == 1));
}

#[test]
fn every_reference_is_resolved_when_there_are_no_errors() {
    let (program, _, bindings) = bind_source(
        "let class Point(x:int, y:int) {
                 fun getX:int() x;
                 fun sum:int(d:int) getX() + y + d;
             }
             var p:Point = new Point(3, 4);
             fun twice:int(h:(int)->int, v:int) h(h(v));
             fun inc:int(v:int) v + 1;
         in print(twice(inc, p.sum(1)));",
    );
    assert_eq!(bindings.error_count(), 0, "{:?}", bindings.errors());
    for i in 0..program.expression.len() as u32 {
        let e = ExprRef(i);
        let needs_resolution = matches!(
            program.expr(e),
            Some(Expr::Identifier(_) | Expr::Call(..) | Expr::MethodCall(..) | Expr::New(..))
        );
        assert_eq!(bindings.resolution(e).is_some(), needs_resolution, "node {:?}", program.expr(e));
    }
}

#[test]
fn dotted_call_records_receiver_and_method() {
    let (program, _, bindings) = bind_source(
        "let class Point(x:int, y:int) { fun getX:int() x; fun getY:int() y; }
             var p:Point = new Point(3, 4);
         in p.getY();",
    );
    assert_eq!(bindings.error_count(), 0);
    let resolution = bindings.resolution(program.body).unwrap();
    assert_eq!(resolution.entry.kind, EntryKind::Variable);
    assert_eq!(resolution.entry.offset, -3);
    let method = resolution.method.as_ref().unwrap();
    assert_eq!((method.kind, method.offset, method.depth), (EntryKind::Method, 1, 1));
}

#[test]
fn class_entry_takes_a_global_slot_and_new_resolves_to_it() {
    let (program, interner, bindings) = bind_source(
        "let var a:int = 1; class Box(v:int) { fun get:int() v; } in new Box(a);",
    );
    assert_eq!(bindings.error_count(), 0);
    let resolution = bindings.resolution(program.body).unwrap();
    assert_eq!(resolution.entry.kind, EntryKind::Class);
    assert_eq!((resolution.entry.depth, resolution.entry.offset), (0, -3));
    match &resolution.entry.ty {
        TypeDescriptor::ClassDescriptor(descriptor) => {
            assert_eq!(descriptor.fields, vec![TypeDescriptor::Int]);
            assert_eq!(descriptor.methods.len(), 1);
        }
        other => panic!("unexpected type {:?}", other),
    }
    let class = interner.get("Box").unwrap();
    assert!(bindings.classes().contains(class));
}

#[test]
fn field_access_inside_method_is_one_hop() {
    let (program, interner, bindings) = bind_source(
        "let class C(a:int, b:int) { fun m:int() b; } in 0;",
    );
    assert_eq!(bindings.error_count(), 0);
    let b = identifiers(&program, &interner, "b")[0];
    let resolution = bindings.resolution(b).unwrap();
    assert_eq!(resolution.entry.kind, EntryKind::Field);
    assert_eq!((resolution.entry.offset, resolution.hops()), (-2, 1));
}

#[test]
fn class_may_refer_to_itself() {
    let (_, _, bindings) = bind_source(
        "let class Node(v:int, next:Node) {
                 fun value:int() v;
                 fun nextValue:int() next.value();
                 fun same:bool(other:Node) other.value() == v;
             }
         in 0;",
    );
    assert_eq!(bindings.error_count(), 0, "{:?}", bindings.errors());
}

#[test]
fn duplicate_fields_are_one_error() {
    let (_, interner, bindings) = bind_source("let class P(x:int, x:int) { fun get:int() x; } in 0;");
    assert_eq!(kinds(&bindings), vec![BindErrorKind::DuplicateDeclaration("x".to_string())]);
    let class = interner.get("P").unwrap();
    assert_eq!(bindings.classes().get(class).unwrap().scope.len(), 2);
}

#[test]
fn new_of_undeclared_class_is_reported() {
    let (_, _, bindings) = bind_source("new Foo();");
    assert_eq!(kinds(&bindings), vec![BindErrorKind::UnknownClass("Foo".to_string())]);
}

#[rstest]
#[case("let var x:int = x; in 0;", BindErrorKind::UnresolvedIdentifier("x".to_string()))]
#[case("let fun f:int() g(); fun g:int() 1; in f();", BindErrorKind::UnresolvedIdentifier("g".to_string()))]
#[case("let var x:int = 1; var x:bool = true; in 0;", BindErrorKind::DuplicateDeclaration("x".to_string()))]
#[case("let fun f:int(a:int, a:int) a; in 0;", BindErrorKind::DuplicateDeclaration("a".to_string()))]
#[case("let class C() { fun m:int() 0; fun m:int() 1; } in 0;", BindErrorKind::DuplicateDeclaration("m".to_string()))]
#[case("let class C() { } class C() { } in 0;", BindErrorKind::DuplicateDeclaration("C".to_string()))]
#[case("let var x:int = 1; in x.get();", BindErrorKind::NotAnObject("x".to_string()))]
#[case("let var x:Thing = null; in 0;", BindErrorKind::UnknownClass("Thing".to_string()))]
#[case("let fun f:int() let class C() { } in 0; in 0;", BindErrorKind::MisplacedClass("C".to_string()))]
#[case("let class C(x:int) { } var c:C = new C(1); in c.x();", BindErrorKind::UnknownMethod { class: "C".to_string(), method: "x".to_string() })]
#[case("let class C() { } var c:C = new C(); in c.nothing();", BindErrorKind::UnknownMethod { class: "C".to_string(), method: "nothing".to_string() })]
#[case(
    "let fun apply:int(h:(int)->int) h(1); fun outer:int(k:int) let fun add:int(v:int) v + k; in apply(add); in outer(10);",
    BindErrorKind::LocalFunctionValue("add".to_string())
)]
#[case(
    "let fun apply:int(h:()->int) h(); class C() { fun m:int() 1; fun n:int() apply(m); } in 0;",
    BindErrorKind::LocalFunctionValue("m".to_string())
)]
fn single_binding_error(#[case] input: &str, #[case] expected: BindErrorKind) {
    let (_, _, bindings) = bind_source(input);
    assert_eq!(kinds(&bindings), vec![expected]);
}

#[test]
fn binding_continues_after_errors() {
    let (_, _, bindings) = bind_source(
        "let var a:int = b;
             var c:Foo = null;
         in if d then { foo(a, e) } else { 0 };",
    );
    assert_eq!(
        kinds(&bindings),
        vec![
            BindErrorKind::UnresolvedIdentifier("b".to_string()),
            BindErrorKind::UnknownClass("Foo".to_string()),
            BindErrorKind::UnresolvedIdentifier("d".to_string()),
            BindErrorKind::UnresolvedIdentifier("foo".to_string()),
            BindErrorKind::UnresolvedIdentifier("e".to_string()),
        ]
    );
}

#[test]
fn errors_carry_source_location() {
    let (_, _, bindings) = bind_source("let var a:int = 1;\nin a +\n   missing;");
    let error = &bindings.errors()[0];
    assert_eq!(error.location.map(|l| (l.line, l.column)), Some((3, 4)));
    assert_eq!(error.to_string(), "3:4: unresolved identifier 'missing'");
}

#[test]
fn global_function_may_be_passed_as_value() {
    let (_, _, bindings) = bind_source("let fun inc:int(v:int) v + 1; fun apply:int(h:(int)->int) h(1); in apply(inc);");
    assert!(!bindings.has_errors(), "{:?}", bindings.errors());
}

#[test]
fn long_operator_chain_binds_without_recursing() {
    let source = format!("let var x:int = 1; in {}x;", "x + ".repeat(5000));
    let (program, interner, bindings) = bind_source(&source);
    assert!(!bindings.has_errors());
    assert_eq!(identifiers(&program, &interner, "x").len(), 5001);
    assert_eq!(bindings.resolution_count(), 5001);
}

#[test]
fn nesting_beyond_limit_is_an_error() {
    let mut builder = AstBuilder::new();
    let mut e = builder.int_expr(1, None);
    for _ in 0..MAX_NESTING_DEPTH + 100 {
        e = builder.not_expr(e, None);
    }
    let program = builder.build(vec![], e);
    let bindings = bind(&program, &DefaultStringInterner::new());
    assert_eq!(kinds(&bindings), vec![BindErrorKind::NestingTooDeep(MAX_NESTING_DEPTH)]);
}

fn class_source(fields: usize, methods: usize) -> String {
    let fields: Vec<String> = (0..fields).map(|i| format!("f{}:int", i)).collect();
    let methods: Vec<String> = (0..methods).map(|i| format!("fun m{}:int() {};", i, i)).collect();
    format!("let class C({}) {{ {} }} in 0;", fields.join(", "), methods.join(" "))
}

proptest! {
    #[test]
    fn class_offsets_cover_exact_ranges(fields in 0usize..8, methods in 0usize..8) {
        let (_, interner, bindings) = bind_source(&class_source(fields, methods));
        prop_assert_eq!(bindings.error_count(), 0);
        let info = bindings.classes().get(interner.get("C").unwrap()).unwrap();

        let mut field_offsets: Vec<i32> = info.scope.entries()
            .filter(|(_, e)| e.kind == EntryKind::Field)
            .map(|(_, e)| e.offset)
            .collect();
        let mut method_offsets: Vec<i32> = info.scope.entries()
            .filter(|(_, e)| e.kind == EntryKind::Method)
            .map(|(_, e)| e.offset)
            .collect();
        field_offsets.sort_unstable();
        method_offsets.sort_unstable();

        prop_assert_eq!(field_offsets, (-(fields as i32)..=-1).collect::<Vec<_>>());
        prop_assert_eq!(method_offsets, (0..methods as i32).collect::<Vec<_>>());
        prop_assert_eq!(info.descriptor.fields.len(), fields);
        prop_assert_eq!(info.descriptor.methods.len(), methods);
    }

    #[test]
    fn field_offset_matches_declaration_position(fields in 1usize..8) {
        let (_, interner, bindings) = bind_source(&class_source(fields, 0));
        let class = interner.get("C").unwrap();
        for i in 0..fields {
            let field = interner.get(format!("f{}", i)).unwrap();
            let entry = bindings.classes().member(class, field).unwrap();
            prop_assert_eq!(entry.offset, -(i as i32) - 1);
        }
    }
}
