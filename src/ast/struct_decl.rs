use super::position::Position;
use super::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct StructFieldDecl {
    pub name: String,
    pub declared_type: Type,
}

/// A struct declaration, generic or concrete (spec §3.3, §4.5). A generic
/// declaration (non-empty `type_params`) is never instantiated directly; the
/// struct registry only ever stores and looks up its monomorphized
/// descendants, keyed by the mangled `<name>_<T1>_<T2>_…` name.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<StructFieldDecl>,
    pub is_exported: bool,
    pub position: Position,
}

/// A plain enumeration of string-tagged variants. NAAb's enums carry no
/// payload; they exist as a closed set of named constants (spec §3.1 `Enum`
/// kind).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<String>,
    pub is_exported: bool,
    pub position: Position,
}
