use std::rc::Rc;
use string_interner::DefaultSymbol;

/// Field and method types of one class, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub name: DefaultSymbol,
    pub fields: Vec<TypeDescriptor>,
    pub methods: Vec<TypeDescriptor>,
}

/// A declared type after class names have been checked against the
/// classes known to the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    Int,
    Bool,
    Arrow(Vec<TypeDescriptor>, Box<TypeDescriptor>),
    ClassRef(DefaultSymbol),
    ClassDescriptor(Rc<ClassDescriptor>),
    Null,
}

impl TypeDescriptor {
    pub fn class_name(&self) -> Option<DefaultSymbol> {
        match self {
            TypeDescriptor::ClassRef(name) => Some(*name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Variable,
    Parameter,
    Function,
    Class,
    Field,
    Method,
}

impl EntryKind {
    /// Kinds that take the next positive slot of their scope rather than
    /// the next negative declaration offset.
    pub fn takes_slot(&self) -> bool {
        matches!(self, EntryKind::Parameter | EntryKind::Method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTableEntry {
    /// Depth of the scope the name was declared in; the global scope is 0.
    pub depth: usize,
    pub ty: TypeDescriptor,
    pub offset: i32,
    pub kind: EntryKind,
}

/// What the binder attached to one reference node.
///
/// For a dotted call `entry` is the receiver and `method` the method; for
/// `new` it is the class's global entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub entry: SymbolTableEntry,
    pub call_depth: usize,
    pub method: Option<SymbolTableEntry>,
}

impl Resolution {
    pub fn new(entry: SymbolTableEntry, call_depth: usize) -> Self {
        Resolution { entry, call_depth, method: None }
    }

    /// Number of access links to follow from the referencing frame.
    pub fn hops(&self) -> usize {
        self.call_depth.saturating_sub(self.entry.depth)
    }
}
