//! Lexical environments (spec §3.1 "Environment").
//!
//! Grounded in the teacher's `TypeScope`: a stack of heap-allocated frames
//! rather than a single parent-linked node. Cloning an [`Environment`] is
//! cheap (it clones the `Rc` pointers, not the frames themselves) and is
//! exactly how a lambda captures its defining scope — the closure keeps its
//! own `Vec` of frame handles, so later pushes on the defining scope's
//! original `Environment` value are invisible to it, while mutations made
//! *through* a shared frame remain visible to every holder of that frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Position;
use crate::error::{suggest, NaabError, NaabResult};
use crate::value::Value;

#[derive(Default, Debug)]
struct Frame {
    variables: HashMap<String, Value>,
    modules: HashMap<String, Rc<crate::module::Module>>,
}

type FrameRef = Rc<RefCell<Frame>>;

/// A chain of variable-binding frames, innermost last. See module docs.
#[derive(Clone, Debug)]
pub struct Environment {
    frames: Vec<FrameRef>,
}

impl Environment {
    /// A fresh environment with a single, empty frame — used for the root
    /// scope of a module or script.
    pub fn root() -> Self {
        Self {
            frames: vec![FrameRef::default()],
        }
    }

    /// Derive a child environment with one new frame pushed on top. Used
    /// when entering a block, function call, or lambda invocation.
    pub fn child(&self) -> Self {
        let mut frames = self.frames.clone();
        frames.push(FrameRef::default());
        Self { frames }
    }

    pub fn define(&self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last() {
            frame.borrow_mut().variables.insert(name.into(), value);
        }
    }

    pub fn get(&self, name: &str, position: Position) -> NaabResult<Value> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.borrow().variables.get(name) {
                return Ok(value.clone());
            }
        }
        Err(NaabError::NameError {
            name: name.to_owned(),
            position,
            suggestions: suggest(name, self.names().iter().map(String::as_str), 2),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frames.iter().rev().any(|frame| frame.borrow().variables.contains_key(name))
    }

    /// Reassign an existing binding, searching outward from the innermost
    /// frame (spec §4.1 assignment semantics). Fails if `name` is unbound
    /// anywhere in the chain — NAAb has no implicit global creation via `=`.
    pub fn assign(&self, name: &str, value: Value, position: Position) -> NaabResult<()> {
        for frame in self.frames.iter().rev() {
            let mut frame_mut = frame.borrow_mut();
            if frame_mut.variables.contains_key(name) {
                frame_mut.variables.insert(name.to_owned(), value);
                return Ok(());
            }
        }
        Err(NaabError::NameError {
            name: name.to_owned(),
            position,
            suggestions: suggest(name, self.names().iter().map(String::as_str), 2),
        })
    }

    pub fn define_module(&self, alias: impl Into<String>, module: Rc<crate::module::Module>) {
        if let Some(frame) = self.frames.last() {
            frame.borrow_mut().modules.insert(alias.into(), module);
        }
    }

    pub fn resolve_module(&self, alias: &str) -> Option<Rc<crate::module::Module>> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.borrow().modules.get(alias).cloned())
    }

    fn names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for frame in &self.frames {
            names.extend(frame.borrow().variables.keys().cloned());
        }
        names
    }

    /// Every value bound in any frame of this chain, used by [`crate::gc`]
    /// as mark roots in addition to whatever temporaries the interpreter
    /// passes explicitly.
    pub fn all_values(&self) -> Vec<Value> {
        let mut values = Vec::new();
        for frame in &self.frames {
            values.extend(frame.borrow().variables.values().cloned());
        }
        values
    }
}
