//! The tree-walking interpreter (spec §4.1) that drives every lower layer:
//! it allocates through the [`crate::gc`] collector, consults the
//! [`crate::struct_registry`] on struct-literal evaluation, triggers the
//! [`crate::module`] registry on `use`, and hands polyglot blocks to
//! [`crate::polyglot::PolyglotEngine`] — alone or, for a run of sibling
//! blocks, through the dependency analyzer's parallel layers (spec §4.8).
//!
//! Grounded in the teacher's `Interpreter`/`Scope`: a struct holding
//! mutable interpreter-wide state, dispatching over AST node variants by
//! `match` rather than a visitor. Where the teacher's `Scope` is a flat
//! `Vec<HashMap<String, VariableType>>` walked back to front, this crate's
//! [`Environment`] generalizes that into cheaply cloneable frame chains so
//! closures and modules can retain their own scope (see
//! `crate::environment`'s module docs).

pub mod control;

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use log::{debug, error, trace};

use crate::ast::{
    BinaryOp, Block, EnumDecl, Expr, ForInStmt, Item, LogicalOp, PolyglotBlock, Position, Program,
    Stmt, TryStmt, Type, UnaryOp,
};
use crate::config::Config;
use crate::environment::Environment;
use crate::error::{suggest, CallableSignature, NaabError, NaabResult};
use crate::gc::{Collector, GcConfig};
use crate::interpreter::control::Flow;
use crate::module::{read_source, ModuleRegistry, SourceParser};
use crate::polyglot::cache::CompilationCache;
use crate::polyglot::dependency;
use crate::polyglot::{LanguageTag, PolyglotEngine};
use crate::struct_registry::{self, StructRegistry};
use crate::value::{self, shared, FunctionValue, NativeFunction, StructInstance, Value};

/// One active call, for diagnostics (spec §3.7). `language` is `"naab"` for
/// both interpreted and native calls — foreign-language frames belong to
/// the polyglot subsystem's own error envelope (spec §4.9), not this stack.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub callable: String,
    pub language: &'static str,
    pub file: String,
    pub line: usize,
}

/// Owns every piece of interpreter-wide state: the global environment, the
/// struct and module registries, the cycle collector, the polyglot engine,
/// and the diagnostic call stack (spec §2 "drives all lower layers").
pub struct Interpreter {
    globals: Environment,
    structs: StructRegistry,
    modules: ModuleRegistry,
    collector: Collector,
    polyglot: PolyglotEngine,
    call_stack: Vec<StackFrame>,
}

fn register_builtins(globals: &Environment) {
    globals.define(
        "print",
        Value::InternalNative(Rc::new(NativeFunction::new("print", None, |args, _position| {
            let rendered: Vec<String> = args.iter().map(Value::stringify).collect();
            println!("{}", rendered.join(" "));
            Ok(Value::Null)
        }))),
    );

    globals.define(
        "len",
        Value::InternalNative(Rc::new(NativeFunction::new("len", Some(1), |args, position| {
            match &args[0] {
                Value::List(items) => Ok(Value::Int(items.borrow().len() as i64)),
                Value::Dict(entries) => Ok(Value::Int(entries.borrow().len() as i64)),
                Value::String(s) => Ok(Value::Int(s.chars().count() as i64)),
                other => Err(NaabError::TypeError {
                    message: format!("len() is not defined for {}", other.type_name()),
                    position,
                }),
            }
        }))),
    );
}

impl Interpreter {
    pub fn new(config: Config, parser: Box<dyn SourceParser>) -> Self {
        let globals = Environment::root();
        register_builtins(&globals);

        let modules = ModuleRegistry::new(parser, config.module_search_roots.clone());
        let cache = CompilationCache::new(config.cache_dir.clone());
        let polyglot = PolyglotEngine::new(cache, config.polyglot_timeout);
        let collector = Collector::new(GcConfig {
            threshold: config.gc_threshold,
        });

        Self {
            globals,
            structs: StructRegistry::new(),
            modules,
            collector,
            polyglot,
            call_stack: Vec::new(),
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn struct_registry(&self) -> &StructRegistry {
        &self.structs
    }

    pub fn call_stack(&self) -> &[StackFrame] {
        &self.call_stack
    }

    pub fn collections_run(&self) -> usize {
        self.collector.collections_run()
    }

    /// The host-exposed `collect` entry point (spec §4.3 "a collect entry
    /// point is exposed to host programs"), rooted at whatever environment
    /// the caller considers current.
    pub fn collect_garbage(&mut self, env: &Environment) {
        debug!("host-triggered cycle collection");
        self.collector.collect(env, &[]);
    }

    fn track_allocation(&mut self, env: &Environment) {
        if self.collector.note_allocation() {
            debug!(
                "gc threshold reached after {} collections, running cycle collection",
                self.collector.collections_run()
            );
            self.collector.collect(env, &[]);
        }
    }

    fn push_frame(&mut self, callable: String, position: &Position) {
        self.call_stack.push(StackFrame {
            callable,
            language: "naab",
            file: position.file.clone(),
            line: position.line,
        });
    }

    fn push_native_frame(&mut self, name: &str, position: &Position) {
        self.call_stack.push(StackFrame {
            callable: name.to_owned(),
            language: "naab",
            file: "<native>".to_owned(),
            line: position.line,
        });
    }

    fn pop_frame(&mut self) {
        self.call_stack.pop();
    }

    /// Run an entry-point program: resolve its `use`s, install its
    /// declarations, then execute its `main` block (spec §4.1 "A program
    /// executes top-level `use` statements in topological order, then
    /// evaluates top-level struct/enum/function declarations ... then
    /// executes the `main` block").
    pub fn run_program(&mut self, program: &Program, entry_dir: &Path) -> NaabResult<()> {
        let env = self.globals.clone();
        let result = self.execute_items(program, entry_dir, &env, true);
        if let Err(err) = &result {
            error!("uncaught error escaped program execution: {err}");
        }
        result
    }

    /// Three-pass execution of one file's items, shared by the entry
    /// program and by module loading (spec §4.4 step 3: "execute the
    /// file's top-level declarations"). Pass 1 resolves `use`s so aliases
    /// are bound before anything else runs; pass 2 hoists struct/enum/
    /// function declarations so forward and mutual references resolve;
    /// pass 3 runs bare top-level statements (spec §8 S4) and, only for an
    /// entry program (`run_main`), the `main` block — a module's `main` is
    /// never run on import (spec §4.4 step 4).
    fn execute_items(
        &mut self,
        program: &Program,
        dir: &Path,
        env: &Environment,
        run_main: bool,
    ) -> NaabResult<()> {
        for use_decl in program.uses() {
            self.load_module(&use_decl.path, &use_decl.alias, dir, use_decl.position.clone(), env)?;
        }

        for item in &program.items {
            match item {
                Item::Struct(decl) => self.structs.register(decl.clone()),
                Item::Enum(decl) => self.install_enum(decl, env),
                Item::Function(def) => {
                    let function = Rc::new(FunctionValue::from_def(def, env.clone()));
                    env.define(def.name.clone(), Value::Function(function));
                }
                Item::Use(_) | Item::Stmt(_) | Item::Main(_) => {}
            }
        }

        for item in &program.items {
            match item {
                Item::Stmt(stmt) => {
                    self.exec_stmt(stmt, env)?;
                }
                Item::Main(block) if run_main => {
                    self.exec_block(block, &env.child())?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Represent an enum as a namespace object: a `Struct` whose fields map
    /// each variant to a `"EnumName.Variant"` string (spec §3.1's `Value`
    /// enum has no dedicated enum payload, so `Color.Red` is answered by
    /// the same [`Expr::MemberAccess`] machinery a struct instance uses).
    fn install_enum(&mut self, decl: &EnumDecl, env: &Environment) {
        let mut fields = HashMap::with_capacity(decl.variants.len());
        for variant in &decl.variants {
            fields.insert(variant.clone(), Value::String(format!("{}.{}", decl.name, variant)));
        }
        let instance = StructInstance {
            type_name: decl.name.clone(),
            fields,
        };
        env.define(decl.name.clone(), Value::Struct(shared(instance)));
    }

    /// Load `path` under `alias` into `importer_env` (spec §4.4 "Loading
    /// protocol"). Reuses an already-executed module outright; otherwise
    /// parses (or reuses a cached-but-unexecuted parse), executes its
    /// top-level declarations into its own environment exactly once, and
    /// marks it executed before binding the alias.
    fn load_module(
        &mut self,
        path: &str,
        alias: &str,
        importer_dir: &Path,
        position: Position,
        importer_env: &Environment,
    ) -> NaabResult<()> {
        let canonical = self.modules.resolve(path, importer_dir, position.clone())?;

        if let Some(module) = self.modules.executed(&canonical) {
            trace!("reusing already-executed module '{path}'");
            importer_env.define_module(alias, module);
            return Ok(());
        }

        self.modules.begin_visit(&canonical, path, position.clone())?;

        let module = match self.modules.cached(&canonical) {
            Some(module) => module,
            None => {
                debug!("loading module '{path}' from {}", canonical.display());
                let source = read_source(&canonical)?;
                let program = self.modules.parse(&source, &canonical.display().to_string())?;
                self.modules.insert(path.to_owned(), canonical.clone(), program, &self.globals)
            }
        };

        let module_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        self.execute_items(&module.program, &module_dir, &module.env, false)?;
        module.mark_executed();
        self.modules.end_visit(&canonical);

        importer_env.define_module(alias, module);
        Ok(())
    }

    /// Execute every statement in `block`, detecting and dispatching any
    /// run of two-or-more sibling polyglot sites as a dependency-analyzed
    /// group (spec §4.8) rather than one-by-one.
    pub fn exec_block(&mut self, block: &Block, env: &Environment) -> NaabResult<Flow> {
        let mut index = 0;
        while index < block.len() {
            let run_len = dependency::collect_run(block, index).len();
            if run_len >= 2 {
                self.exec_polyglot_run(block, index, run_len, env)?;
                index += run_len;
                continue;
            }

            let flow = self.exec_stmt(&block[index], env)?;
            if !flow.is_normal() {
                return Ok(flow);
            }
            index += 1;
        }
        Ok(Flow::Normal)
    }

    /// Run one contiguous block of sibling polyglot-assignment statements
    /// (spec §4.8): layer them by RAW/WAW/WAR hazard, run each layer's
    /// sites concurrently via [`PolyglotEngine::execute_layer`], and write
    /// results back into `env` in source order so observable side effects
    /// stay deterministic regardless of worker completion order.
    fn exec_polyglot_run(&mut self, block: &Block, start: usize, len: usize, env: &Environment) -> NaabResult<()> {
        let sites = dependency::collect_run(block, start);
        let graph = dependency::analyze(&sites);
        let layer_indices = dependency::layers(&graph);
        debug!("dispatching polyglot run of {len} sibling block(s) across {} layer(s)", layer_indices.len());

        for layer in layer_indices {
            if layer.len() == 1 {
                let flow = self.exec_stmt(&block[start + layer[0]], env)?;
                debug_assert!(flow.is_normal(), "a bare polyglot-assignment statement never signals break/continue/return");
                continue;
            }

            let mut prepared = Vec::with_capacity(layer.len());
            for &site_index in &layer {
                let Some((block_ref, _)) = polyglot_site_of(&block[start + site_index]) else {
                    continue;
                };
                let tag = LanguageTag::parse(&block_ref.language, &block_ref.position)?;
                let bound = self.resolve_bound_vars(block_ref, env)?;
                prepared.push(self.polyglot.prepare(tag, &block_ref.code, &bound, &block_ref.position));
            }

            let results = self.polyglot.execute_layer(&prepared);
            for (&site_index, result) in layer.iter().zip(results.into_iter()) {
                let value = PolyglotEngine::to_value(result?);
                self.bind_polyglot_result(&block[start + site_index], value, env)?;
            }
        }
        Ok(())
    }

    fn bind_polyglot_result(&mut self, stmt: &Stmt, value: Value, env: &Environment) -> NaabResult<()> {
        match stmt {
            Stmt::Let(decl) => {
                env.define(decl.name.clone(), value);
                Ok(())
            }
            Stmt::Expr(Expr::Assignment { target, position, .. }) => {
                if let Expr::Ident(name, _) = target.as_ref() {
                    env.assign(name, value, position.clone())
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn resolve_bound_vars(&self, block: &PolyglotBlock, env: &Environment) -> NaabResult<Vec<(String, Value)>> {
        block
            .bound_vars
            .iter()
            .map(|name| {
                let value = env.get(name, block.position.clone())?;
                Ok((name.clone(), value))
            })
            .collect()
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> NaabResult<Flow> {
        match stmt {
            Stmt::Let(decl) => {
                let value = self.eval_expr(&decl.value, env)?;
                if let Some(declared_type) = &decl.declared_type {
                    if !value::matches_type(&value, declared_type) {
                        return Err(NaabError::TypeError {
                            message: format!(
                                "let '{}' declared as {declared_type} but got {}",
                                decl.name,
                                value.type_name()
                            ),
                            position: decl.position.clone(),
                        });
                    }
                }
                env.define(decl.name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => {
                let condition = self.eval_expr(&if_stmt.condition, env)?;
                if condition.is_truthy() {
                    self.exec_block(&if_stmt.then_block, &env.child())
                } else if let Some(else_block) = &if_stmt.else_block {
                    self.exec_block(else_block, &env.child())
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(while_stmt) => {
                loop {
                    let condition = self.eval_expr(&while_stmt.condition, env)?;
                    if !condition.is_truthy() {
                        break;
                    }
                    let flow = self.exec_block(&while_stmt.body, &env.child())?;
                    match flow {
                        Flow::Break(_) => break,
                        Flow::Return(..) => return Ok(flow),
                        Flow::Continue(_) | Flow::Normal => continue,
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForIn(for_stmt) => self.exec_for_in(for_stmt, env),
            Stmt::Break(position) => Ok(Flow::Break(position.clone())),
            Stmt::Continue(position) => Ok(Flow::Continue(position.clone())),
            Stmt::Return(expr, position) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value, position.clone()))
            }
            Stmt::Throw(expr, position) => {
                let value = self.eval_expr(expr, env)?;
                Err(NaabError::Thrown {
                    value,
                    position: position.clone(),
                })
            }
            Stmt::Try(try_stmt) => self.exec_try(try_stmt, env),
        }
    }

    fn exec_for_in(&mut self, stmt: &ForInStmt, env: &Environment) -> NaabResult<Flow> {
        if let Expr::Range { from, to, position } = &stmt.iterable {
            let start = self.eval_expr(from, env)?.as_int(position.clone())?;
            let end = self.eval_expr(to, env)?.as_int(position.clone())?;
            for i in start..end {
                let loop_env = env.child();
                loop_env.define(stmt.binding.clone(), Value::Int(i));
                let flow = self.exec_block(&stmt.body, &loop_env)?;
                match flow {
                    Flow::Break(_) => break,
                    Flow::Return(..) => return Ok(flow),
                    Flow::Continue(_) | Flow::Normal => continue,
                }
            }
            return Ok(Flow::Normal);
        }

        let iterable_position = stmt.iterable.position();
        let iterable = self.eval_expr(&stmt.iterable, env)?;
        let items = match iterable {
            Value::List(items) => items.borrow().clone(),
            other => {
                return Err(NaabError::TypeError {
                    message: format!("cannot iterate over {}", other.type_name()),
                    position: iterable_position,
                })
            }
        };

        for item in items {
            let loop_env = env.child();
            loop_env.define(stmt.binding.clone(), item);
            let flow = self.exec_block(&stmt.body, &loop_env)?;
            match flow {
                Flow::Break(_) => break,
                Flow::Return(..) => return Ok(flow),
                Flow::Continue(_) | Flow::Normal => continue,
            }
        }
        Ok(Flow::Normal)
    }

    /// `finally` always runs regardless of how `try`/`catch` exited, and an
    /// outcome it produces (return/break/continue/throw) overrides whatever
    /// the try/catch settled on (spec §4.9 "`finally` block always runs,
    /// including when the catch re-throws").
    fn exec_try(&mut self, stmt: &TryStmt, env: &Environment) -> NaabResult<Flow> {
        let outcome = match self.exec_block(&stmt.try_block, &env.child()) {
            Ok(flow) => Ok(flow),
            Err(err) => {
                let catch_env = env.child();
                catch_env.define(stmt.catch_binding.clone(), err.into_value());
                self.exec_block(&stmt.catch_block, &catch_env)
            }
        };

        if let Some(finally_block) = &stmt.finally_block {
            match self.exec_block(finally_block, &env.child())? {
                Flow::Normal => outcome,
                other_flow => Ok(other_flow),
            }
        } else {
            outcome
        }
    }

    pub fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> NaabResult<Value> {
        match expr {
            Expr::IntLiteral(n, _) => Ok(Value::Int(*n)),
            Expr::FloatLiteral(f, _) => Ok(Value::Float(*f)),
            Expr::BoolLiteral(b, _) => Ok(Value::Bool(*b)),
            Expr::StringLiteral(s, _) => Ok(Value::String(s.clone())),
            Expr::NullLiteral(_) => Ok(Value::Null),
            Expr::ListLiteral(items, _) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, env)?);
                }
                let value = Value::list(values);
                self.track_allocation(env);
                Ok(value)
            }
            Expr::DictLiteral(pairs, position) => {
                let mut entries = HashMap::with_capacity(pairs.len());
                for (key_expr, value_expr) in pairs {
                    let key = self.eval_expr(key_expr, env)?.as_string(position.clone())?;
                    let value = self.eval_expr(value_expr, env)?;
                    entries.insert(key, value);
                }
                let value = Value::dict(entries);
                self.track_allocation(env);
                Ok(value)
            }
            Expr::Ident(name, position) => env.get(name, position.clone()),
            Expr::StructLiteral {
                name,
                type_args,
                fields,
                position,
            } => {
                let mut field_values = Vec::with_capacity(fields.len());
                for (field_name, field_expr) in fields {
                    let value = self.eval_expr(field_expr, env)?;
                    field_values.push((field_name.clone(), value));
                }

                let resolved_type_args = if type_args.is_empty() {
                    match self.structs.declaration(name) {
                        Some(decl) if !decl.type_params.is_empty() => {
                            self.structs.infer_type_args(name, &field_values, position.clone())?
                        }
                        _ => Vec::new(),
                    }
                } else {
                    type_args.clone()
                };

                let value = self.structs.instantiate(name, &resolved_type_args, field_values, position.clone())?;
                self.track_allocation(env);
                Ok(value)
            }
            Expr::Binary { op, lhs, rhs, position } => {
                let lhs_value = self.eval_expr(lhs, env)?;
                let rhs_value = self.eval_expr(rhs, env)?;
                let value = eval_binary(*op, lhs_value, rhs_value, position.clone())?;
                self.track_allocation(env);
                Ok(value)
            }
            Expr::Logical { op, lhs, rhs, .. } => self.eval_logical(*op, lhs, rhs, env),
            Expr::Unary { op, operand, position } => {
                let operand_value = self.eval_expr(operand, env)?;
                let value = eval_unary(*op, operand_value, position.clone())?;
                self.track_allocation(env);
                Ok(value)
            }
            Expr::Pipeline { value, call, position } => {
                let piped = self.eval_expr(value, env)?;
                match call.as_ref() {
                    Expr::Call { callee, args, position: call_pos } => {
                        let callee_value = self.eval_expr(callee, env)?;
                        let mut arg_values = Vec::with_capacity(args.len() + 1);
                        arg_values.push(piped);
                        for arg in args {
                            arg_values.push(self.eval_expr(arg, env)?);
                        }
                        let result = self.call_function(callee_value, arg_values, call_pos.clone())?;
                        self.track_allocation(env);
                        Ok(result)
                    }
                    _ => Err(NaabError::TypeError {
                        message: "pipeline right-hand side must be a call expression".to_owned(),
                        position: position.clone(),
                    }),
                }
            }
            Expr::Call { callee, args, position } => {
                let callee_value = self.eval_expr(callee, env)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.eval_expr(arg, env)?);
                }
                let result = self.call_function(callee_value, arg_values, position.clone())?;
                self.track_allocation(env);
                Ok(result)
            }
            Expr::MemberAccess { object, field, position } => self.eval_member_access(object, field, position, env),
            Expr::Index { object, index, position } => {
                let object_value = self.eval_expr(object, env)?;
                let index_value = self.eval_expr(index, env)?;
                match object_value {
                    Value::List(items) => {
                        let idx = index_value.as_int(position.clone())?;
                        let items_ref = items.borrow();
                        let len = items_ref.len();
                        if idx < 0 || idx as usize >= len {
                            return Err(NaabError::IndexError {
                                index: idx,
                                len,
                                position: position.clone(),
                            });
                        }
                        Ok(items_ref[idx as usize].clone())
                    }
                    Value::Dict(entries) => {
                        let key = index_value.as_string(position.clone())?;
                        let entries_ref = entries.borrow();
                        entries_ref.get(&key).cloned().ok_or_else(|| NaabError::KeyError {
                            key: key.clone(),
                            position: position.clone(),
                            suggestions: suggest(&key, entries_ref.keys().map(String::as_str), 2),
                        })
                    }
                    other => Err(NaabError::TypeError {
                        message: format!("cannot index into {}", other.type_name()),
                        position: position.clone(),
                    }),
                }
            }
            Expr::Assignment { target, value, position } => self.eval_assignment(target, value, position, env),
            Expr::Lambda(lambda) => Ok(Value::Function(Rc::new(FunctionValue::from_lambda(lambda, env.clone())))),
            Expr::Polyglot(block) => {
                let tag = LanguageTag::parse(&block.language, &block.position)?;
                let bound = self.resolve_bound_vars(block, env)?;
                self.polyglot.execute_block(tag, &block.code, &bound, &block.position)
            }
            Expr::Range { position, .. } => Err(NaabError::TypeError {
                message: "range expressions are only valid in a for-loop header".to_owned(),
                position: position.clone(),
            }),
        }
    }

    fn eval_logical(&mut self, op: LogicalOp, lhs: &Expr, rhs: &Expr, env: &Environment) -> NaabResult<Value> {
        let left = self.eval_expr(lhs, env)?;
        match op {
            LogicalOp::And => {
                if left.is_truthy() {
                    self.eval_expr(rhs, env)
                } else {
                    Ok(left)
                }
            }
            LogicalOp::Or => {
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expr(rhs, env)
                }
            }
        }
    }

    /// Member access on a module alias yields the exported binding directly
    /// (spec §4.4 "Member access"); anything else evaluates the object and
    /// reads a struct field (spec §3.1).
    fn eval_member_access(
        &mut self,
        object: &Expr,
        field: &str,
        position: &Position,
        env: &Environment,
    ) -> NaabResult<Value> {
        if let Expr::Ident(name, _) = object {
            if let Some(module) = env.resolve_module(name) {
                let exported = exported_names(&module.program);
                if !exported.contains(field) {
                    return Err(NaabError::NameError {
                        name: field.to_owned(),
                        position: position.clone(),
                        suggestions: suggest(field, exported.iter().map(String::as_str), 2),
                    });
                }
                return module.env.get(field, position.clone());
            }
        }

        let object_value = self.eval_expr(object, env)?;
        match &object_value {
            Value::Struct(instance) => {
                let inst = instance.borrow();
                inst.fields.get(field).cloned().ok_or_else(|| NaabError::NameError {
                    name: field.to_owned(),
                    position: position.clone(),
                    suggestions: suggest(field, inst.fields.keys().map(String::as_str), 2),
                })
            }
            other => Err(NaabError::TypeError {
                message: format!("cannot access field '{field}' on {}", other.type_name()),
                position: position.clone(),
            }),
        }
    }

    /// Left side of `=` is one of: an identifier (rebind nearest scope), a
    /// member access on a Struct (in-place field write), or a subscript on
    /// a List/Dict (in-place write) — spec §4.1 "Assignment". The value of
    /// the assignment expression is the assigned value.
    fn eval_assignment(&mut self, target: &Expr, value: &Expr, position: &Position, env: &Environment) -> NaabResult<Value> {
        let new_value = self.eval_expr(value, env)?;
        match target {
            Expr::Ident(name, ident_pos) => {
                env.assign(name, new_value.clone(), ident_pos.clone())?;
            }
            Expr::MemberAccess { object, field, position: member_pos } => {
                let object_value = self.eval_expr(object, env)?;
                match object_value {
                    Value::Struct(instance) => {
                        let mut inst = instance.borrow_mut();
                        if !inst.fields.contains_key(field) {
                            return Err(NaabError::TypeError {
                                message: format!("unknown field '{field}' for struct '{}'", inst.type_name),
                                position: member_pos.clone(),
                            });
                        }
                        inst.fields.insert(field.clone(), new_value.clone());
                    }
                    other => {
                        return Err(NaabError::TypeError {
                            message: format!("cannot assign field '{field}' on {}", other.type_name()),
                            position: member_pos.clone(),
                        })
                    }
                }
            }
            Expr::Index { object, index, position: index_pos } => {
                let object_value = self.eval_expr(object, env)?;
                let index_value = self.eval_expr(index, env)?;
                match object_value {
                    Value::List(items) => {
                        let idx = index_value.as_int(index_pos.clone())?;
                        let mut items_mut = items.borrow_mut();
                        let len = items_mut.len();
                        if idx < 0 || idx as usize >= len {
                            return Err(NaabError::IndexError {
                                index: idx,
                                len,
                                position: index_pos.clone(),
                            });
                        }
                        items_mut[idx as usize] = new_value.clone();
                    }
                    Value::Dict(entries) => {
                        let key = index_value.as_string(index_pos.clone())?;
                        entries.borrow_mut().insert(key, new_value.clone());
                    }
                    other => {
                        return Err(NaabError::TypeError {
                            message: format!("cannot index-assign into {}", other.type_name()),
                            position: index_pos.clone(),
                        })
                    }
                }
            }
            _ => {
                return Err(NaabError::TypeError {
                    message: "invalid assignment target".to_owned(),
                    position: position.clone(),
                })
            }
        }
        Ok(new_value)
    }

    fn call_function(&mut self, callee: Value, args: Vec<Value>, position: Position) -> NaabResult<Value> {
        match callee {
            Value::InternalNative(native) => {
                self.push_native_frame(&native.name, &position);
                let result = native.call(&args, position.clone());
                self.pop_frame();
                result
            }
            Value::Function(func) => self.call_user_function(func, args, position),
            other => Err(NaabError::TypeError {
                message: format!("'{}' is not callable", other.type_name()),
                position,
            }),
        }
    }

    fn callable_signature(&self, func: &FunctionValue) -> CallableSignature {
        CallableSignature {
            name: func.name.clone().unwrap_or_else(|| "<lambda>".to_owned()),
            params: func.params.iter().map(|p| format!("{}: {}", p.name, p.declared_type)).collect(),
        }
    }

    /// Bind arguments (spec §4.1 "Function call"): arity-check, supply
    /// trailing defaults, infer/validate generic type-parameter bindings,
    /// and bind each parameter either as a shared handle (`ref`) or a deep
    /// copy — the sole mechanism isolating a callee from caller mutation
    /// (spec §8 invariants 1 and 2).
    fn call_user_function(&mut self, func: Rc<FunctionValue>, args: Vec<Value>, position: Position) -> NaabResult<Value> {
        if args.len() > func.params.len() {
            return Err(NaabError::ArgError {
                message: format!("expected at most {} argument(s), got {}", func.params.len(), args.len()),
                signature: self.callable_signature(&func),
                position,
            });
        }

        let call_env = func.closure.child();
        let mut bindings: HashMap<String, Type> = HashMap::new();

        for (i, param) in func.params.iter().enumerate() {
            let value = if i < args.len() {
                args[i].clone()
            } else if let Some(default_expr) = &param.default {
                self.eval_expr(default_expr, &call_env)?
            } else {
                return Err(NaabError::ArgError {
                    message: format!("missing required argument '{}'", param.name),
                    signature: self.callable_signature(&func),
                    position,
                });
            };

            if !func.type_params.is_empty() {
                let concrete = value::infer_type(&value);
                struct_registry::unify(&param.declared_type, &concrete, &mut bindings, position.clone())?;
            }

            let bound = if param.declared_type.is_reference { value } else { value.deep_copy() };
            call_env.define(param.name.clone(), bound);
        }

        self.push_frame(func.name.clone().unwrap_or_else(|| "<lambda>".to_owned()), &position);
        let flow = self.exec_block(&func.body, &call_env);
        self.pop_frame();

        match flow? {
            Flow::Return(value, _) => Ok(value),
            _ => Ok(Value::Null),
        }
    }
}

/// Pull the polyglot block and its optional write target out of a
/// statement, mirroring `crate::polyglot::dependency`'s private
/// `as_polyglot_site` (kept separate since that one is not `pub`).
fn polyglot_site_of(stmt: &Stmt) -> Option<(&PolyglotBlock, Option<&str>)> {
    match stmt {
        Stmt::Let(decl) => match &decl.value {
            Expr::Polyglot(block) => Some((block, Some(decl.name.as_str()))),
            _ => None,
        },
        Stmt::Expr(Expr::Assignment { target, value, .. }) => match value.as_ref() {
            Expr::Polyglot(block) => {
                let write = match target.as_ref() {
                    Expr::Ident(name, _) => Some(name.as_str()),
                    _ => None,
                };
                Some((block, write))
            }
            _ => None,
        },
        Stmt::Expr(Expr::Polyglot(block)) => Some((block, None)),
        _ => None,
    }
}

fn exported_names(program: &Program) -> std::collections::HashSet<String> {
    let mut names = std::collections::HashSet::new();
    for function in program.functions() {
        if function.is_exported {
            names.insert(function.name.clone());
        }
    }
    for decl in program.structs() {
        if decl.is_exported {
            names.insert(decl.name.clone());
        }
    }
    for decl in program.enums() {
        if decl.is_exported {
            names.insert(decl.name.clone());
        }
    }
    names
}

fn type_error(lhs: &Value, rhs: &Value, message: &str, position: Position) -> NaabError {
    NaabError::TypeError {
        message: format!("{message} ({} and {})", lhs.type_name(), rhs.type_name()),
        position,
    }
}

/// `+` / `-` / `*` / `/` / `%` (spec §4.1 "Operator semantics"). `/` always
/// widens to Float, per the spec's own flagged open question (this crate
/// picks "always float" and tests consistently against it rather than
/// truncating for Int/Int, per §9's instruction to pick one side and test
/// it). `+` additionally concatenates Strings and stringifies a non-Null,
/// non-String operand against a String.
fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value, position: Position) -> NaabResult<Value> {
    match op {
        BinaryOp::Add => eval_add(lhs, rhs, position),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => eval_arith(op, lhs, rhs, position),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => eval_compare(op, lhs, rhs, position),
        BinaryOp::Eq => Ok(Value::Bool(lhs.structural_eq(&rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!lhs.structural_eq(&rhs))),
    }
}

fn eval_add(lhs: Value, rhs: Value, position: Position) -> NaabResult<Value> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => Ok(Value::Float(a as f64 + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::String(a), other) if !matches!(other, Value::Null) => Ok(Value::String(a + &other.stringify())),
        (other, Value::String(b)) if !matches!(other, Value::Null) => Ok(Value::String(other.stringify() + &b)),
        (lhs, rhs) => Err(type_error(&lhs, &rhs, "cannot add", position)),
    }
}

fn as_float_pair(lhs: &Value, rhs: &Value) -> Option<(f64, f64)> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some((*a as f64, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some((*a, *b)),
        (Value::Int(a), Value::Float(b)) => Some((*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some((*a, *b as f64)),
        _ => None,
    }
}

fn eval_arith(op: BinaryOp, lhs: Value, rhs: Value, position: Position) -> NaabResult<Value> {
    match op {
        BinaryOp::Sub => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a - b)),
            _ => as_float_pair(&lhs, &rhs)
                .map(|(a, b)| Value::Float(a - b))
                .ok_or_else(|| type_error(&lhs, &rhs, "cannot subtract", position)),
        },
        BinaryOp::Mul => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
            _ => as_float_pair(&lhs, &rhs)
                .map(|(a, b)| Value::Float(a * b))
                .ok_or_else(|| type_error(&lhs, &rhs, "cannot multiply", position)),
        },
        BinaryOp::Div => {
            let (a, b) = as_float_pair(&lhs, &rhs).ok_or_else(|| type_error(&lhs, &rhs, "cannot divide", position.clone()))?;
            if b == 0.0 {
                return Err(NaabError::DivisionByZero { position });
            }
            Ok(Value::Float(a / b))
        }
        BinaryOp::Mod => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => {
                if *b == 0 {
                    return Err(NaabError::DivisionByZero { position });
                }
                Ok(Value::Int(a % b))
            }
            _ => {
                let (a, b) = as_float_pair(&lhs, &rhs).ok_or_else(|| type_error(&lhs, &rhs, "cannot take modulo of", position.clone()))?;
                if b == 0.0 {
                    return Err(NaabError::DivisionByZero { position });
                }
                Ok(Value::Float(a % b))
            }
        },
        _ => unreachable!("eval_arith only handles Sub/Mul/Div/Mod"),
    }
}

fn eval_compare(op: BinaryOp, lhs: Value, rhs: Value, position: Position) -> NaabResult<Value> {
    let ordering = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return Err(type_error(&lhs, &rhs, "cannot compare", position));
    };

    use std::cmp::Ordering::{Greater, Less};
    let result = match op {
        BinaryOp::Lt => ordering == Less,
        BinaryOp::Le => ordering != Greater,
        BinaryOp::Gt => ordering == Greater,
        BinaryOp::Ge => ordering != Less,
        _ => unreachable!("eval_compare only handles Lt/Le/Gt/Ge"),
    };
    Ok(Value::Bool(result))
}

fn eval_unary(op: UnaryOp, operand: Value, position: Position) -> NaabResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Int(n) => Ok(Value::Int(-n)),
            Value::Float(f) => Ok(Value::Float(-f)),
            other => Err(NaabError::TypeError {
                message: format!("cannot negate {}", other.type_name()),
                position,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDef, Param, StructDecl, StructFieldDecl};

    struct NoopParser;
    impl SourceParser for NoopParser {
        fn parse(&self, _source: &str, _file_path: &str) -> NaabResult<Program> {
            Ok(Program::default())
        }
    }

    fn interpreter() -> Interpreter {
        Interpreter::new(Config::default(), Box::new(NoopParser))
    }

    fn pos() -> Position {
        Position::unknown()
    }

    fn subtract_def() -> FunctionDef {
        FunctionDef {
            name: "subtract".to_owned(),
            type_params: Vec::new(),
            params: vec![
                Param {
                    name: "a".to_owned(),
                    declared_type: Type::int(),
                    default: None,
                },
                Param {
                    name: "b".to_owned(),
                    declared_type: Type::int(),
                    default: None,
                },
            ],
            return_type: Type::int(),
            body: vec![Stmt::Return(
                Some(Expr::Binary {
                    op: BinaryOp::Sub,
                    lhs: Box::new(Expr::Ident("a".to_owned(), pos())),
                    rhs: Box::new(Expr::Ident("b".to_owned(), pos())),
                    position: pos(),
                }),
                pos(),
            )],
            is_exported: false,
            position: pos(),
        }
    }

    #[test]
    fn test_pipeline_is_equivalent_to_prepended_call_s1() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        let function = Rc::new(FunctionValue::from_def(&subtract_def(), env.clone()));
        env.define("subtract", Value::Function(function));

        let pipeline = Expr::Pipeline {
            value: Box::new(Expr::IntLiteral(100, pos())),
            call: Box::new(Expr::Call {
                callee: Box::new(Expr::Ident("subtract".to_owned(), pos())),
                args: vec![Expr::IntLiteral(30, pos())],
                position: pos(),
            }),
            position: pos(),
        };

        let result = interp.eval_expr(&pipeline, &env).unwrap();
        assert!(matches!(result, Value::Int(70)));
    }

    fn box_struct_decl() -> StructDecl {
        StructDecl {
            name: "Box".to_owned(),
            type_params: Vec::new(),
            fields: vec![StructFieldDecl {
                name: "value".to_owned(),
                declared_type: Type::int(),
            }],
            is_exported: false,
            position: pos(),
        }
    }

    fn mutate_value_fn(name: &str, is_reference: bool) -> FunctionDef {
        FunctionDef {
            name: name.to_owned(),
            type_params: Vec::new(),
            params: vec![Param {
                name: "b".to_owned(),
                declared_type: {
                    let t = Type::struct_named("Box", None);
                    if is_reference {
                        t.by_ref()
                    } else {
                        t
                    }
                },
                default: None,
            }],
            return_type: Type::void(),
            body: vec![Stmt::Expr(Expr::Assignment {
                target: Box::new(Expr::MemberAccess {
                    object: Box::new(Expr::Ident("b".to_owned(), pos())),
                    field: "value".to_owned(),
                    position: pos(),
                }),
                value: Box::new(Expr::IntLiteral(if is_reference { 999 } else { 42 }, pos())),
                position: pos(),
            })],
            is_exported: false,
            position: pos(),
        }
    }

    #[test]
    fn test_value_param_is_deep_copied_s2() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        interp.structs.register(box_struct_decl());

        let by_val = Rc::new(FunctionValue::from_def(&mutate_value_fn("by_val", false), env.clone()));
        env.define("by_val", Value::Function(by_val));

        let instance = interp
            .structs
            .instantiate("Box", &[], vec![("value".to_owned(), Value::Int(1))], pos())
            .unwrap();
        env.define("x", instance);

        let call = Expr::Call {
            callee: Box::new(Expr::Ident("by_val".to_owned(), pos())),
            args: vec![Expr::Ident("x".to_owned(), pos())],
            position: pos(),
        };
        interp.eval_expr(&call, &env).unwrap();

        let field = interp
            .eval_expr(
                &Expr::MemberAccess {
                    object: Box::new(Expr::Ident("x".to_owned(), pos())),
                    field: "value".to_owned(),
                    position: pos(),
                },
                &env,
            )
            .unwrap();
        assert!(matches!(field, Value::Int(1)), "non-ref param mutation must not reach the caller");
    }

    #[test]
    fn test_ref_param_mutates_caller_s2() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        interp.structs.register(box_struct_decl());

        let by_ref = Rc::new(FunctionValue::from_def(&mutate_value_fn("by_ref", true), env.clone()));
        env.define("by_ref", Value::Function(by_ref));

        let instance = interp
            .structs
            .instantiate("Box", &[], vec![("value".to_owned(), Value::Int(1))], pos())
            .unwrap();
        env.define("x", instance);

        let call = Expr::Call {
            callee: Box::new(Expr::Ident("by_ref".to_owned(), pos())),
            args: vec![Expr::Ident("x".to_owned(), pos())],
            position: pos(),
        };
        interp.eval_expr(&call, &env).unwrap();

        let field = interp
            .eval_expr(
                &Expr::MemberAccess {
                    object: Box::new(Expr::Ident("x".to_owned(), pos())),
                    field: "value".to_owned(),
                    position: pos(),
                },
                &env,
            )
            .unwrap();
        assert!(matches!(field, Value::Int(999)), "ref param mutation must reach the caller");
    }

    fn pair_decl() -> StructDecl {
        StructDecl {
            name: "Pair".to_owned(),
            type_params: vec!["T".to_owned(), "U".to_owned()],
            fields: vec![
                StructFieldDecl {
                    name: "first".to_owned(),
                    declared_type: Type::type_param("T"),
                },
                StructFieldDecl {
                    name: "second".to_owned(),
                    declared_type: Type::type_param("U"),
                },
            ],
            is_exported: false,
            position: pos(),
        }
    }

    #[test]
    fn test_generic_struct_literal_infers_type_args_s3() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        interp.structs.register(pair_decl());

        let a = interp
            .eval_expr(
                &Expr::StructLiteral {
                    name: "Pair".to_owned(),
                    type_args: Vec::new(),
                    fields: vec![
                        ("first".to_owned(), Expr::IntLiteral(1, pos())),
                        ("second".to_owned(), Expr::StringLiteral("ok".to_owned(), pos())),
                    ],
                    position: pos(),
                },
                &env,
            )
            .unwrap();
        let b = interp
            .eval_expr(
                &Expr::StructLiteral {
                    name: "Pair".to_owned(),
                    type_args: Vec::new(),
                    fields: vec![
                        ("first".to_owned(), Expr::FloatLiteral(3.14, pos())),
                        ("second".to_owned(), Expr::BoolLiteral(true, pos())),
                    ],
                    position: pos(),
                },
                &env,
            )
            .unwrap();

        assert_eq!(a.type_name(), "Pair_int_string");
        assert_eq!(b.type_name(), "Pair_float_bool");
        assert_ne!(a.type_name(), b.type_name());
    }

    #[test]
    fn test_manual_cycle_survives_collection_while_rooted_s5() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        interp.structs.register(StructDecl {
            name: "Node".to_owned(),
            type_params: Vec::new(),
            fields: vec![
                StructFieldDecl {
                    name: "value".to_owned(),
                    declared_type: Type::int(),
                },
                StructFieldDecl {
                    name: "next".to_owned(),
                    declared_type: Type::struct_named("Node", None).nullable(),
                },
            ],
            is_exported: false,
            position: pos(),
        });

        let a = interp
            .structs
            .instantiate(
                "Node",
                &[],
                vec![("value".to_owned(), Value::Int(1)), ("next".to_owned(), Value::Null)],
                pos(),
            )
            .unwrap();
        let b = interp
            .structs
            .instantiate(
                "Node",
                &[],
                vec![("value".to_owned(), Value::Int(2)), ("next".to_owned(), Value::Null)],
                pos(),
            )
            .unwrap();

        if let (Value::Struct(a_inst), Value::Struct(b_inst)) = (&a, &b) {
            a_inst.borrow_mut().fields.insert("next".to_owned(), b.clone());
            b_inst.borrow_mut().fields.insert("next".to_owned(), a.clone());
        }

        env.define("a", a.clone());
        env.define("b", b.clone());

        interp.collect_garbage(&env);

        let a_value = interp
            .eval_expr(
                &Expr::MemberAccess {
                    object: Box::new(Expr::Ident("a".to_owned(), pos())),
                    field: "value".to_owned(),
                    position: pos(),
                },
                &env,
            )
            .unwrap();
        assert!(matches!(a_value, Value::Int(1)), "a live cycle must survive a rooted collection");
    }

    #[test]
    fn test_short_circuit_and_or() {
        let mut interp = interpreter();
        let env = interp.globals().clone();

        let and_false = Expr::Logical {
            op: LogicalOp::And,
            lhs: Box::new(Expr::BoolLiteral(false, pos())),
            rhs: Box::new(Expr::Call {
                callee: Box::new(Expr::Ident("undefined_fn".to_owned(), pos())),
                args: vec![],
                position: pos(),
            }),
            position: pos(),
        };
        assert!(matches!(interp.eval_expr(&and_false, &env).unwrap(), Value::Bool(false)));

        let or_true = Expr::Logical {
            op: LogicalOp::Or,
            lhs: Box::new(Expr::BoolLiteral(true, pos())),
            rhs: Box::new(Expr::Call {
                callee: Box::new(Expr::Ident("undefined_fn".to_owned(), pos())),
                args: vec![],
                position: pos(),
            }),
            position: pos(),
        };
        assert!(matches!(interp.eval_expr(&or_true, &env).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn test_division_always_widens_to_float() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        let expr = Expr::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(Expr::IntLiteral(7, pos())),
            rhs: Box::new(Expr::IntLiteral(2, pos())),
            position: pos(),
        };
        let result = interp.eval_expr(&expr, &env).unwrap();
        assert!(matches!(result, Value::Float(f) if (f - 3.5).abs() < 1e-9));
    }

    #[test]
    fn test_division_by_zero_raises() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        let expr = Expr::Binary {
            op: BinaryOp::Div,
            lhs: Box::new(Expr::IntLiteral(1, pos())),
            rhs: Box::new(Expr::IntLiteral(0, pos())),
            position: pos(),
        };
        assert!(matches!(interp.eval_expr(&expr, &env), Err(NaabError::DivisionByZero { .. })));
    }

    #[test]
    fn test_list_index_assignment_round_trips_s8_invariant_3() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        env.define("l", Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));

        let assign = Expr::Assignment {
            target: Box::new(Expr::Index {
                object: Box::new(Expr::Ident("l".to_owned(), pos())),
                index: Box::new(Expr::IntLiteral(1, pos())),
                position: pos(),
            }),
            value: Box::new(Expr::IntLiteral(99, pos())),
            position: pos(),
        };
        interp.eval_expr(&assign, &env).unwrap();

        let read = Expr::Index {
            object: Box::new(Expr::Ident("l".to_owned(), pos())),
            index: Box::new(Expr::IntLiteral(1, pos())),
            position: pos(),
        };
        assert!(matches!(interp.eval_expr(&read, &env).unwrap(), Value::Int(99)));
    }

    #[test]
    fn test_list_assignment_out_of_bounds_raises_index_error() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        env.define("l", Value::list(vec![Value::Int(1)]));

        let assign = Expr::Assignment {
            target: Box::new(Expr::Index {
                object: Box::new(Expr::Ident("l".to_owned(), pos())),
                index: Box::new(Expr::IntLiteral(1, pos())),
                position: pos(),
            }),
            value: Box::new(Expr::IntLiteral(0, pos())),
            position: pos(),
        };
        assert!(matches!(interp.eval_expr(&assign, &env), Err(NaabError::IndexError { .. })));
    }

    #[test]
    fn test_try_finally_always_runs() {
        let mut interp = interpreter();
        let env = interp.globals().clone();
        env.define("finally_ran", Value::Bool(false));

        let try_stmt = Stmt::Try(TryStmt {
            try_block: vec![Stmt::Throw(Expr::StringLiteral("boom".to_owned(), pos()), pos())],
            catch_binding: "e".to_owned(),
            catch_block: vec![],
            finally_block: Some(vec![Stmt::Expr(Expr::Assignment {
                target: Box::new(Expr::Ident("finally_ran".to_owned(), pos())),
                value: Box::new(Expr::BoolLiteral(true, pos())),
                position: pos(),
            })]),
            position: pos(),
        });

        interp.exec_stmt(&try_stmt, &env).unwrap();
        assert!(matches!(env.get("finally_ran", pos()).unwrap(), Value::Bool(true)));
    }
}
