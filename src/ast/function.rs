use super::expr::Param;
use super::position::Position;
use super::stmt::Block;
use super::types::Type;

/// A named, top-level function declaration (spec §3.1, §4.5). Functions that
/// declare type parameters are monomorphized per call-site binding the same
/// way generic structs are; functions with none are interpreted as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Type,
    pub body: Block,
    pub is_exported: bool,
    pub position: Position,
}
