use super::function::FunctionDef;
use super::position::Position;
use super::stmt::{Block, Stmt};
use super::struct_decl::{EnumDecl, StructDecl};

/// `use path.dotted as alias` (spec §4.4). Top-level only.
#[derive(Debug, Clone, PartialEq)]
pub struct UseDecl {
    pub path: String,
    pub alias: String,
    pub position: Position,
}

/// One top-level declaration. A source file is an unordered interleaving of
/// these, plus at most one [`Item::Main`] block (spec §3.1). [`Item::Stmt`]
/// covers a bare top-level statement outside of `main` (spec §8 S4: a
/// module's top-level `print("loaded")` runs exactly once, the moment the
/// module is first executed) — the surface grammar in spec §6 only names
/// `use`/`struct`/`enum`/function declarations plus `main`, but the S4
/// scenario requires module-level side effects, so the typed AST this crate
/// consumes carries them as their own item rather than folding them into a
/// synthetic implicit `main`.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Use(UseDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Function(FunctionDef),
    Stmt(Stmt),
    Main(Block),
}

/// The parsed contents of a single `.naab` file, pre-built and handed to the
/// module loader and interpreter (spec §1: parsing itself is out of scope).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn uses(&self) -> impl Iterator<Item = &UseDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Use(use_decl) => Some(use_decl),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Struct(struct_decl) => Some(struct_decl),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Enum(enum_decl) => Some(enum_decl),
            _ => None,
        })
    }

    pub fn main_block(&self) -> Option<&Block> {
        self.items.iter().find_map(|item| match item {
            Item::Main(block) => Some(block),
            _ => None,
        })
    }
}
