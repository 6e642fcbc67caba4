//! Non-local control-flow signals (spec §4.1 "Control flow").
//!
//! `break`, `continue`, and `return` are not expressible as Rust panics or
//! as `NaabError` variants — they are *not* exceptions, they do not unwind
//! through `try`/`catch`, and `finally` must still see them as an exit it
//! has to run before. Instead, every statement evaluator returns
//! `NaabResult<Flow>`: `Flow::Normal` means "fell off the end, keep going",
//! anything else means "stop executing this block/loop and propagate".
//! `throw` remains on the `Result::Err` channel via [`crate::error::NaabError`]
//! since it *does* unwind through `try`/`catch`.

use crate::ast::Position;
use crate::value::Value;

/// The outcome of executing one statement or block.
#[derive(Debug, Clone)]
pub enum Flow {
    /// Ran to completion; the enclosing block should continue with the
    /// next statement.
    Normal,
    Break(Position),
    Continue(Position),
    Return(Value, Position),
}

impl Flow {
    pub fn is_normal(&self) -> bool {
        matches!(self, Flow::Normal)
    }
}
