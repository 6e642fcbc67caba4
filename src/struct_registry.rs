//! Struct declarations and generic monomorphization (spec §3.3, §4.5).
//!
//! A [`StructDecl`] with type parameters is never instantiated directly —
//! only its monomorphized descendants, keyed by the mangled name
//! `<Base>_<T1>_<T2>_…`, are ever turned into a [`StructInstance`]. The
//! registry caches each mangled instantiation the first time it is needed so
//! that two struct literals with the same base and type arguments share one
//! canonical field-type table.

use std::collections::HashMap;

use crate::ast::{Kind, Position, StructDecl, Type};
use crate::error::{NaabError, NaabResult};
use crate::value::{self, shared, StructInstance, Value};

/// One concrete (possibly monomorphized) struct shape: its mangled name and
/// the declared type of each field, in declaration order.
#[derive(Debug, Clone)]
pub struct StructShape {
    pub mangled_name: String,
    pub fields: Vec<(String, Type)>,
}

#[derive(Default)]
pub struct StructRegistry {
    /// Generic and non-generic declarations, keyed by their source name.
    declarations: HashMap<String, StructDecl>,
    /// Monomorphized shapes, keyed by mangled name.
    instances: HashMap<String, StructShape>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, decl: StructDecl) {
        if decl.type_params.is_empty() {
            let shape = StructShape {
                mangled_name: decl.name.clone(),
                fields: decl
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), field.declared_type.clone()))
                    .collect(),
            };
            self.instances.insert(decl.name.clone(), shape);
        }
        self.declarations.insert(decl.name.clone(), decl);
    }

    pub fn declaration(&self, name: &str) -> Option<&StructDecl> {
        self.declarations.get(name)
    }

    /// Resolve (and memoize) the monomorphized shape for `base` with
    /// `type_args` bound positionally to its declared type parameters. For a
    /// non-generic struct `type_args` must be empty.
    pub fn monomorphize(
        &mut self,
        base: &str,
        type_args: &[Type],
        position: Position,
    ) -> NaabResult<StructShape> {
        let decl = self.declarations.get(base).cloned().ok_or_else(|| NaabError::NameError {
            name: base.to_owned(),
            position: position.clone(),
            suggestions: crate::error::suggest(base, self.declarations.keys().map(String::as_str), 2),
        })?;

        if decl.type_params.len() != type_args.len() {
            return Err(NaabError::TypeError {
                message: format!(
                    "struct '{}' expects {} type argument(s), got {}",
                    base,
                    decl.type_params.len(),
                    type_args.len()
                ),
                position,
            });
        }

        if decl.type_params.is_empty() {
            return Ok(self.instances[base].clone());
        }

        let bindings: HashMap<String, Type> = decl
            .type_params
            .iter()
            .cloned()
            .zip(type_args.iter().cloned())
            .collect();

        let mangled_name = mangle(base, type_args);
        if let Some(existing) = self.instances.get(&mangled_name) {
            return Ok(existing.clone());
        }

        let fields: Vec<(String, Type)> = decl
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.declared_type.substitute(&bindings)))
            .collect();

        let shape = StructShape {
            mangled_name: mangled_name.clone(),
            fields,
        };
        self.instances.insert(mangled_name, shape.clone());
        Ok(shape)
    }

    /// Build a [`Value::Struct`] from field initializers, validating that
    /// every declared field is present and no unknown field is supplied
    /// (spec §4.5).
    pub fn instantiate(
        &mut self,
        base: &str,
        type_args: &[Type],
        fields: Vec<(String, Value)>,
        position: Position,
    ) -> NaabResult<Value> {
        let shape = self.monomorphize(base, type_args, position.clone())?;

        let mut values: HashMap<String, Value> = HashMap::new();
        let mut supplied: HashMap<String, Value> = fields.into_iter().collect();

        for (field_name, declared_type) in &shape.fields {
            let Some(value) = supplied.remove(field_name) else {
                return Err(NaabError::TypeError {
                    message: format!("missing field '{field_name}' in initializer for '{}'", shape.mangled_name),
                    position,
                });
            };
            if !value::matches_type(&value, declared_type) {
                return Err(NaabError::TypeError {
                    message: format!(
                        "field '{field_name}' of '{}' expects {declared_type}, got {}",
                        shape.mangled_name,
                        value.type_name(),
                    ),
                    position,
                });
            }
            values.insert(field_name.clone(), value);
        }

        if let Some((unknown, _)) = supplied.into_iter().next() {
            return Err(NaabError::TypeError {
                message: format!("unknown field '{unknown}' for struct '{}'", shape.mangled_name),
                position,
            });
        }

        Ok(Value::Struct(shared(StructInstance {
            type_name: shape.mangled_name,
            fields: values,
        })))
    }

    /// Infer `base`'s type arguments from a struct literal's field
    /// initializers when none were written explicitly (spec §4.5: "a
    /// generic struct literal may omit type arguments; the interpreter
    /// infers them by unifying each field's declared type against the
    /// initializer's runtime value"). Returns the inferred arguments in
    /// declaration order of `base`'s type parameters.
    pub fn infer_type_args(
        &self,
        base: &str,
        fields: &[(String, Value)],
        position: Position,
    ) -> NaabResult<Vec<Type>> {
        let decl = self.declarations.get(base).cloned().ok_or_else(|| NaabError::NameError {
            name: base.to_owned(),
            position: position.clone(),
            suggestions: crate::error::suggest(base, self.declarations.keys().map(String::as_str), 2),
        })?;

        let mut bindings: HashMap<String, Type> = HashMap::new();
        for (field_name, field_value) in fields {
            let Some(declared) = decl.fields.iter().find(|f| &f.name == field_name) else {
                continue;
            };
            let concrete = value::infer_type(field_value);
            unify(&declared.declared_type, &concrete, &mut bindings, position.clone())?;
        }

        decl.type_params
            .iter()
            .map(|param| {
                bindings.get(param).cloned().ok_or_else(|| NaabError::TypeError {
                    message: format!(
                        "cannot infer type argument '{param}' for struct '{base}' from the given fields"
                    ),
                    position: position.clone(),
                })
            })
            .collect()
    }
}

/// Unify a (possibly generic) declared type against a concrete type inferred
/// from a runtime value, recording each [`Kind::TypeParam`] binding it
/// discovers. A conflicting rebinding (the same parameter unified against
/// two different concrete types) is a [`NaabError::TypeError`]; a structural
/// mismatch that carries no type parameter (e.g. unifying `int` against
/// `string`) is silently ignored here; `matches_type` are what reject an
/// outright type mismatch once the shape of field values is checked during
/// instantiation.
pub(crate) fn unify(
    declared: &Type,
    concrete: &Type,
    bindings: &mut HashMap<String, Type>,
    position: Position,
) -> NaabResult<()> {
    match &declared.kind {
        Kind::TypeParam(name) => {
            if let Some(existing) = bindings.get(name) {
                if existing != concrete && existing.kind != Kind::Any && concrete.kind != Kind::Any {
                    return Err(NaabError::TypeError {
                        message: format!(
                            "conflicting type argument for '{name}': inferred both {existing} and {concrete}"
                        ),
                        position,
                    });
                }
            } else {
                bindings.insert(name.clone(), concrete.clone());
            }
            Ok(())
        }
        Kind::List(declared_elem) => {
            if let Kind::List(concrete_elem) = &concrete.kind {
                unify(declared_elem, concrete_elem, bindings, position)
            } else {
                Ok(())
            }
        }
        Kind::Dict(_, declared_value) => {
            if let Kind::Dict(_, concrete_value) = &concrete.kind {
                unify(declared_value, concrete_value, bindings, position)
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// `<Base>_<T1>_<T2>_…` mangled name (spec §3.3).
pub fn mangle(base: &str, type_args: &[Type]) -> String {
    if type_args.is_empty() {
        return base.to_owned();
    }
    let args: Vec<String> = type_args.iter().map(Type::canonical).collect();
    format!("{base}_{}", args.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::StructFieldDecl;

    fn pair_decl() -> StructDecl {
        StructDecl {
            name: "Pair".to_owned(),
            type_params: vec!["A".to_owned(), "B".to_owned()],
            fields: vec![
                StructFieldDecl {
                    name: "first".to_owned(),
                    declared_type: Type::type_param("A"),
                },
                StructFieldDecl {
                    name: "second".to_owned(),
                    declared_type: Type::type_param("B"),
                },
            ],
            is_exported: true,
            position: Position::unknown(),
        }
    }

    #[test]
    fn test_monomorphize_mangles_name() {
        let mut registry = StructRegistry::new();
        registry.register(pair_decl());
        let shape = registry
            .monomorphize("Pair", &[Type::int(), Type::string()], Position::unknown())
            .unwrap();
        assert_eq!(shape.mangled_name, "Pair_int_string");
        assert_eq!(shape.fields[0].1, Type::int());
    }

    #[test]
    fn test_monomorphize_caches_same_instantiation() {
        let mut registry = StructRegistry::new();
        registry.register(pair_decl());
        let a = registry
            .monomorphize("Pair", &[Type::int(), Type::int()], Position::unknown())
            .unwrap();
        let b = registry
            .monomorphize("Pair", &[Type::int(), Type::int()], Position::unknown())
            .unwrap();
        assert_eq!(a.mangled_name, b.mangled_name);
    }

    #[test]
    fn test_instantiate_rejects_missing_field() {
        let mut registry = StructRegistry::new();
        registry.register(pair_decl());
        let result = registry.instantiate(
            "Pair",
            &[Type::int(), Type::int()],
            vec![("first".to_owned(), Value::Int(1))],
            Position::unknown(),
        );
        assert!(result.is_err());
    }
}
