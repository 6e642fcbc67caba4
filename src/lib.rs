//! Runtime core for NAAb, a polyglot scripting language (spec §1-§2).
//!
//! This crate takes a parsed [`ast::Program`] as its only input — lexing and
//! parsing are a separate concern, supplied to [`Interpreter::new`] as a
//! [`module::SourceParser`] so the host embeds whichever front end produces
//! that tree. From there this crate owns everything downstream: the
//! tree-walking [`interpreter::Interpreter`], the [`value::Value`] model and
//! its [`gc::Collector`], the [`struct_registry::StructRegistry`] for
//! generics, the [`module::ModuleRegistry`] for `use` resolution, and the
//! [`polyglot::PolyglotEngine`] that hands `<<lang[...] >>` blocks to real
//! foreign-language toolchains.

pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod gc;
pub mod interpreter;
pub mod module;
pub mod polyglot;
pub mod struct_registry;
pub mod value;

pub use config::Config;
pub use environment::Environment;
pub use error::{NaabError, NaabResult};
pub use interpreter::{Interpreter, StackFrame};
pub use module::{Module, ModuleRegistry, SourceParser};
pub use value::Value;
