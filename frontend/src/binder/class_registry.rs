use std::collections::HashMap;
use std::rc::Rc;
use string_interner::DefaultSymbol;
use super::scope::Scope;
use super::symbol::{ClassDescriptor, SymbolTableEntry};

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub descriptor: Rc<ClassDescriptor>,
    pub scope: Scope,
}

/// Field and method scopes of every class, kept after the class body has
/// been bound.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<DefaultSymbol, ClassInfo>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and keeps the existing class if `name` is already registered.
    pub fn register(&mut self, name: DefaultSymbol, descriptor: Rc<ClassDescriptor>, scope: Scope) -> bool {
        if self.classes.contains_key(&name) {
            return false;
        }
        self.classes.insert(name, ClassInfo { descriptor, scope });
        true
    }

    pub fn get(&self, name: DefaultSymbol) -> Option<&ClassInfo> {
        self.classes.get(&name)
    }

    pub fn contains(&self, name: DefaultSymbol) -> bool {
        self.classes.contains_key(&name)
    }

    pub fn member(&self, class: DefaultSymbol, member: DefaultSymbol) -> Option<&SymbolTableEntry> {
        self.classes.get(&class).and_then(|info| info.scope.get(member))
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
