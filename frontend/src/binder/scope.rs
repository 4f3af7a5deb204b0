use std::collections::HashMap;
use string_interner::DefaultSymbol;
use super::symbol::{EntryKind, SymbolTableEntry, TypeDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Class(DefaultSymbol),
}

/// One lexical scope together with its own offset counters.
///
/// Ordinary scopes hand out declaration offsets -2, -3, ... and parameter
/// slots 1, 2, ...; class scopes hand out field offsets -1, -2, ... and
/// method slots 0, 1, ....
#[derive(Debug, Clone)]
pub struct Scope {
    kind: ScopeKind,
    entries: HashMap<DefaultSymbol, SymbolTableEntry>,
    next_declaration: i32,
    next_slot: i32,
}

impl Scope {
    pub fn new(kind: ScopeKind) -> Self {
        let (next_declaration, next_slot) = match kind {
            ScopeKind::Class(_) => (-1, 0),
            ScopeKind::Global | ScopeKind::Function => (-2, 1),
        };
        Scope { kind, entries: HashMap::new(), next_declaration, next_slot }
    }

    pub fn get(&self, name: DefaultSymbol) -> Option<&SymbolTableEntry> {
        self.entries.get(&name)
    }

    pub fn contains(&self, name: DefaultSymbol) -> bool {
        self.entries.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&DefaultSymbol, &SymbolTableEntry)> {
        self.entries.iter()
    }

    /// Inserts `name` with the next offset for its kind. Returns `None`
    /// without consuming an offset when the name is already taken.
    pub fn declare(&mut self, name: DefaultSymbol, depth: usize, ty: TypeDescriptor, kind: EntryKind) -> Option<SymbolTableEntry> {
        if self.entries.contains_key(&name) {
            return None;
        }
        let offset = if kind.takes_slot() {
            let offset = self.next_slot;
            self.next_slot += 1;
            offset
        } else {
            let offset = self.next_declaration;
            self.next_declaration -= 1;
            offset
        };
        let entry = SymbolTableEntry { depth, ty, offset, kind };
        self.entries.insert(name, entry.clone());
        Some(entry)
    }
}

/// Scopes currently open during binding; the innermost is last.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    pub fn current_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    pub fn global(&self) -> Option<&Scope> {
        self.scopes.first()
    }

    /// Innermost declaration of `name`.
    pub fn lookup(&self, name: DefaultSymbol) -> Option<&SymbolTableEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// The still-open scope of the class being bound, if `class` is that class.
    pub fn class_scope(&self, class: DefaultSymbol) -> Option<&Scope> {
        self.scopes.iter().rev().find(|scope| scope.kind == ScopeKind::Class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use string_interner::DefaultStringInterner;

    #[test]
    fn ordinary_scope_offsets() {
        let mut interner: DefaultStringInterner = DefaultStringInterner::new();
        let mut scope = Scope::new(ScopeKind::Function);
        let a = scope.declare(interner.get_or_intern("a"), 1, TypeDescriptor::Int, EntryKind::Parameter).unwrap();
        let x = scope.declare(interner.get_or_intern("x"), 1, TypeDescriptor::Int, EntryKind::Variable).unwrap();
        let b = scope.declare(interner.get_or_intern("b"), 1, TypeDescriptor::Int, EntryKind::Parameter).unwrap();
        let f = scope.declare(interner.get_or_intern("f"), 1, TypeDescriptor::Int, EntryKind::Function).unwrap();
        assert_eq!((a.offset, b.offset), (1, 2));
        assert_eq!((x.offset, f.offset), (-2, -3));
    }

    #[test]
    fn duplicate_does_not_consume_an_offset() {
        let mut interner: DefaultStringInterner = DefaultStringInterner::new();
        let x = interner.get_or_intern("x");
        let y = interner.get_or_intern("y");
        let mut scope = Scope::new(ScopeKind::Class(interner.get_or_intern("C")));
        assert_eq!(scope.declare(x, 1, TypeDescriptor::Int, EntryKind::Field).map(|e| e.offset), Some(-1));
        assert!(scope.declare(x, 1, TypeDescriptor::Bool, EntryKind::Field).is_none());
        assert_eq!(scope.declare(y, 1, TypeDescriptor::Int, EntryKind::Field).map(|e| e.offset), Some(-2));
        assert_eq!(scope.get(x).map(|e| e.ty.clone()), Some(TypeDescriptor::Int));
    }

    #[test]
    fn lookup_prefers_innermost_scope() {
        let mut interner: DefaultStringInterner = DefaultStringInterner::new();
        let x = interner.get_or_intern("x");
        let mut stack = ScopeStack::new();
        stack.push(Scope::new(ScopeKind::Global));
        stack.current_mut().unwrap().declare(x, 0, TypeDescriptor::Int, EntryKind::Variable);
        stack.push(Scope::new(ScopeKind::Function));
        stack.current_mut().unwrap().declare(x, 1, TypeDescriptor::Bool, EntryKind::Variable);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.lookup(x).map(|e| e.depth), Some(1));
        stack.pop();
        assert_eq!(stack.lookup(x).map(|e| e.depth), Some(0));
    }
}
