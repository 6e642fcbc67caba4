//! The runtime value model (spec §3.1).
//!
//! `Value` is a tagged union, mirroring the teacher's `VariableType` but
//! widened to the full set NAAb needs. Composite values (`List`, `Dict`,
//! `Struct`) live behind a reference-counted, interior-mutable handle so that
//! struct instances and collections can be shared across environments (for
//! `ref` parameters) and reachable from more than one scope at a time, which
//! is exactly what the cycle collector in [`crate::gc`] has to account for.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{FunctionDef, Kind, Lambda, Param, Type};
use crate::environment::Environment;
use crate::error::{NaabError, NaabResult};
use crate::ast::Position;

/// A shared, mutable handle to a composite value. Equality is by `Rc`
/// pointer identity where identity matters (closures), and structural
/// everywhere else (see [`Value::structural_eq`]).
pub type Shared<T> = Rc<RefCell<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructInstance {
    /// Mangled name for generic instances, plain name otherwise (spec §3.3).
    pub type_name: String,
    pub fields: HashMap<String, Value>,
}

/// A user-defined function or lambda, closed over the environment in which
/// it was declared (spec §4.1 "Lambdas", §4.5 "Functions").
pub struct FunctionValue {
    pub name: Option<String>,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub body: crate::ast::Block,
    pub closure: Environment,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish()
    }
}

impl FunctionValue {
    pub fn from_def(def: &FunctionDef, closure: Environment) -> Self {
        Self {
            name: Some(def.name.clone()),
            type_params: def.type_params.clone(),
            params: def.params.clone(),
            body: def.body.clone(),
            closure,
        }
    }

    pub fn from_lambda(lambda: &Lambda, closure: Environment) -> Self {
        Self {
            name: None,
            type_params: Vec::new(),
            params: lambda.params.clone(),
            body: lambda.body.clone(),
            closure,
        }
    }
}

type NativeFn = dyn Fn(&[Value], Position) -> NaabResult<Value>;

/// A host-implemented function exposed into NAAb's call namespace. Used for
/// builtins that cannot be expressed as interpreted NAAb code (e.g. the
/// teacher's hardcoded `print`, generalized here into a registrable table).
pub struct NativeFunction {
    pub name: String,
    pub arity: Option<usize>,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        arity: Option<usize>,
        func: impl Fn(&[Value], Position) -> NaabResult<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            func: Box::new(func),
        }
    }

    pub fn call(&self, args: &[Value], position: Position) -> NaabResult<Value> {
        (self.func)(args, position)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Null,
    List(Shared<Vec<Value>>),
    Dict(Shared<HashMap<String, Value>>),
    Struct(Shared<StructInstance>),
    Function(Rc<FunctionValue>),
    InternalNative(Rc<NativeFunction>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(shared(items))
    }

    pub fn dict(entries: HashMap<String, Value>) -> Self {
        Value::Dict(shared(entries))
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Int(_) => "int".to_owned(),
            Value::Float(_) => "float".to_owned(),
            Value::Bool(_) => "bool".to_owned(),
            Value::String(_) => "string".to_owned(),
            Value::Null => "null".to_owned(),
            Value::List(_) => "List".to_owned(),
            Value::Dict(_) => "Dict".to_owned(),
            Value::Struct(inst) => inst.borrow().type_name.clone(),
            Value::Function(_) => "Function".to_owned(),
            Value::InternalNative(_) => "Function".to_owned(),
        }
    }

    /// Truthiness used by `if`/`while` conditions and the `!` unary operator
    /// (spec §4.1): `false`, `null`, `0`, `0.0`, `""`, and empty List/Dict are
    /// falsy; all else truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            Value::List(items) => !items.borrow().is_empty(),
            Value::Dict(entries) => !entries.borrow().is_empty(),
            Value::Struct(_) => true,
            Value::Function(_) | Value::InternalNative(_) => true,
        }
    }

    /// Deep-copy for value-semantics parameter binding (spec §4.1, §4.5):
    /// lists, dicts, and structs are cloned recursively so the callee cannot
    /// mutate the caller's data through a non-`ref` parameter. Functions
    /// are handles and are shared, not duplicated.
    ///
    /// Cyclic input is preserved as the same cycle in the copy (spec §8
    /// Boundary behaviors) rather than left to recurse forever: a
    /// pointer-identity map remembers every composite handle already
    /// entered, so re-encountering one (because it sits on a cycle) returns
    /// the in-progress copy instead of recursing into it again.
    pub fn deep_copy(&self) -> Value {
        let mut visited: HashMap<usize, Value> = HashMap::new();
        self.deep_copy_with(&mut visited)
    }

    fn deep_copy_with(&self, visited: &mut HashMap<usize, Value>) -> Value {
        match self {
            Value::List(items) => {
                let id = Rc::as_ptr(items) as usize;
                if let Some(existing) = visited.get(&id) {
                    return existing.clone();
                }
                let copy_handle = shared(Vec::new());
                let copy_value = Value::List(copy_handle.clone());
                visited.insert(id, copy_value.clone());
                let copied: Vec<Value> = items.borrow().iter().map(|v| v.deep_copy_with(visited)).collect();
                *copy_handle.borrow_mut() = copied;
                copy_value
            }
            Value::Dict(entries) => {
                let id = Rc::as_ptr(entries) as usize;
                if let Some(existing) = visited.get(&id) {
                    return existing.clone();
                }
                let copy_handle = shared(HashMap::new());
                let copy_value = Value::Dict(copy_handle.clone());
                visited.insert(id, copy_value.clone());
                let copied: HashMap<String, Value> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_with(visited)))
                    .collect();
                *copy_handle.borrow_mut() = copied;
                copy_value
            }
            Value::Struct(instance) => {
                let id = Rc::as_ptr(instance) as usize;
                if let Some(existing) = visited.get(&id) {
                    return existing.clone();
                }
                let copy_handle = shared(StructInstance {
                    type_name: instance.borrow().type_name.clone(),
                    fields: HashMap::new(),
                });
                let copy_value = Value::Struct(copy_handle.clone());
                visited.insert(id, copy_value.clone());
                let copied: HashMap<String, Value> = instance
                    .borrow()
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_with(visited)))
                    .collect();
                copy_handle.borrow_mut().fields = copied;
                copy_value
            }
            other => other.clone(),
        }
    }

    /// Structural equality for `==`/`!=` (spec §4.1). Functions compare by
    /// closure identity, never structurally.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|other| v.structural_eq(other)))
            }
            (Value::Struct(a), Value::Struct(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.borrow();
                let b = b.borrow();
                a.type_name == b.type_name
                    && a.fields.len() == b.fields.len()
                    && a.fields
                        .iter()
                        .all(|(k, v)| b.fields.get(k).is_some_and(|other| v.structural_eq(other)))
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::InternalNative(a), Value::InternalNative(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// String conversion used by string concatenation, `print`, and foreign
    /// marshalling fallbacks (spec §4.1, §4.6).
    pub fn stringify(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Bool(b) => b.to_string(),
            Value::String(s) => s.clone(),
            Value::Null => "null".to_owned(),
            Value::List(items) => {
                let rendered: Vec<String> = items.borrow().iter().map(Value::debug_render).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Dict(entries) => {
                let rendered: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.debug_render()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Struct(instance) => {
                let inst = instance.borrow();
                let mut fields: Vec<&String> = inst.fields.keys().collect();
                fields.sort();
                let rendered: Vec<String> = fields
                    .into_iter()
                    .map(|k| format!("{k}: {}", inst.fields[k].debug_render()))
                    .collect();
                format!("{}{{{}}}", inst.type_name, rendered.join(", "))
            }
            Value::Function(func) => match &func.name {
                Some(name) => format!("<function {name}>"),
                None => "<lambda>".to_owned(),
            },
            Value::InternalNative(native) => format!("<native {}>", native.name),
        }
    }

    /// Like [`Value::stringify`] but quotes strings, for use when a value is
    /// rendered as an element of a list/dict/struct rather than top-level.
    fn debug_render(&self) -> String {
        match self {
            Value::String(s) => format!("\"{s}\""),
            other => other.stringify(),
        }
    }

    pub fn as_int(&self, position: Position) -> NaabResult<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(NaabError::TypeError {
                message: format!("expected int, found {}", other.type_name()),
                position,
            }),
        }
    }

    pub fn as_string(&self, position: Position) -> NaabResult<String> {
        match self {
            Value::String(s) => Ok(s.clone()),
            other => Err(NaabError::TypeError {
                message: format!("expected string, found {}", other.type_name()),
                position,
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify())
    }
}

/// Infer a [`Type`] describing `value`'s runtime shape (spec §4.5 "infer
/// type-parameter bindings by unifying each initializer's inferred type
/// against the corresponding declared field type"). An empty List/Dict has
/// no element to inspect, so its element type widens to [`Type::any`]
/// rather than failing — unification against a concrete declared element
/// type still succeeds in that case since [`crate::struct_registry::unify`]
/// treats a non-matching concrete shape as "nothing more to learn here"
/// rather than a hard conflict.
pub fn infer_type(value: &Value) -> Type {
    match value {
        Value::Int(_) => Type::int(),
        Value::Float(_) => Type::float(),
        Value::Bool(_) => Type::bool(),
        Value::String(_) => Type::string(),
        Value::Null => Type::any().nullable(),
        Value::List(items) => match items.borrow().first() {
            Some(first) => Type::list(infer_type(first)),
            None => Type::list(Type::any()),
        },
        Value::Dict(entries) => match entries.borrow().values().next() {
            Some(first) => Type::dict(Type::string(), infer_type(first)),
            None => Type::dict(Type::string(), Type::any()),
        },
        Value::Struct(instance) => Type::struct_named(instance.borrow().type_name.clone(), None),
        Value::Function(_) | Value::InternalNative(_) => Type::any(),
    }
}

/// Does `value` satisfy declared type `ty` (spec §4.5 "coerce each value
/// against the declared field type")? This is a use-site check, not a
/// static type checker (see [`Type`]'s module docs): `Any` and
/// [`Kind::TypeParam`] always accept, nested List/Dict element types are
/// checked one level deep, and a `Struct` kind also accepts any
/// monomorphization of its named generic base.
pub fn matches_type(value: &Value, ty: &Type) -> bool {
    if matches!(value, Value::Null) {
        return ty.is_nullable || matches!(ty.kind, Kind::Any | Kind::TypeParam(_));
    }
    match &ty.kind {
        Kind::Any | Kind::TypeParam(_) => true,
        Kind::Int => matches!(value, Value::Int(_)),
        Kind::Float => matches!(value, Value::Float(_) | Value::Int(_)),
        Kind::String => matches!(value, Value::String(_)),
        Kind::Bool => matches!(value, Value::Bool(_)),
        Kind::Void => matches!(value, Value::Null),
        Kind::List(element) => match value {
            Value::List(items) => items.borrow().iter().all(|item| matches_type(item, element)),
            _ => false,
        },
        Kind::Dict(_, value_type) => match value {
            Value::Dict(entries) => entries.borrow().values().all(|v| matches_type(v, value_type)),
            _ => false,
        },
        Kind::Struct { name, .. } => match value {
            Value::Struct(instance) => {
                let type_name = &instance.borrow().type_name;
                type_name == name || type_name.starts_with(&format!("{name}_"))
            }
            _ => false,
        },
        Kind::Enum(name) => match value {
            Value::Struct(instance) => instance.borrow().type_name == *name,
            _ => false,
        },
        Kind::Function { .. } => matches!(value, Value::Function(_) | Value::InternalNative(_)),
        Kind::Union(members) => members.iter().any(|member| matches_type(value, member)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_falsy_scalars() {
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_empty_list_and_dict_are_falsy() {
        assert!(!Value::list(Vec::new()).is_truthy());
        assert!(!Value::dict(HashMap::new()).is_truthy());
    }

    #[test]
    fn test_nonempty_list_and_dict_are_truthy() {
        assert!(Value::list(vec![Value::Int(0)]).is_truthy());
        let mut entries = HashMap::new();
        entries.insert("k".to_owned(), Value::Null);
        assert!(Value::dict(entries).is_truthy());
    }

    #[test]
    fn test_nonzero_scalars_are_truthy() {
        assert!(Value::Int(1).is_truthy());
        assert!(Value::Float(0.1).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::String("x".to_owned()).is_truthy());
    }

    #[test]
    fn test_deep_copy_preserves_self_referential_list() {
        let handle = shared(Vec::new());
        handle.borrow_mut().push(Value::List(handle.clone()));
        let original = Value::List(handle);

        let copied = original.deep_copy();
        let Value::List(copy_handle) = &copied else { panic!("expected list") };
        assert_eq!(copy_handle.borrow().len(), 1);
        let Value::List(inner) = &copy_handle.borrow()[0] else { panic!("expected list") };
        assert!(Rc::ptr_eq(inner, copy_handle));
    }

    #[test]
    fn test_deep_copy_preserves_struct_cycle() {
        let a = shared(StructInstance {
            type_name: "Node".to_owned(),
            fields: HashMap::new(),
        });
        let b = shared(StructInstance {
            type_name: "Node".to_owned(),
            fields: HashMap::new(),
        });
        a.borrow_mut().fields.insert("next".to_owned(), Value::Struct(b.clone()));
        b.borrow_mut().fields.insert("next".to_owned(), Value::Struct(a.clone()));
        let original = Value::Struct(a);

        let copied = original.deep_copy();
        let Value::Struct(copy_a) = &copied else { panic!("expected struct") };
        let next = copy_a.borrow().fields.get("next").cloned().unwrap();
        let Value::Struct(copy_b) = &next else { panic!("expected struct") };
        let back = copy_b.borrow().fields.get("next").cloned().unwrap();
        let Value::Struct(back_to_a) = &back else { panic!("expected struct") };
        assert!(Rc::ptr_eq(back_to_a, copy_a));
    }
}
