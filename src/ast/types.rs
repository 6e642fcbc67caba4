//! Type descriptors (spec §3.2).
//!
//! A [`Type`] is the structured descriptor the struct registry and
//! interpreter use to validate field initializers, parameter bindings, and
//! generic instantiation. It is *not* a static type checker: NAAb type-checks
//! at the point of use (struct instantiation, parameter binding), not ahead
//! of time, so `Type` only needs to support construction, equality, and
//! canonical string formatting for mangled monomorphization names.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Int,
    Float,
    String,
    Bool,
    Void,
    Any,
    List(Box<Type>),
    Dict(Box<Type>, Box<Type>),
    Struct {
        name: String,
        module: Option<String>,
    },
    Enum(String),
    Function {
        params: Vec<Type>,
        return_type: Box<Type>,
    },
    Union(Vec<Type>),
    TypeParam(String),
}

/// A structured type, carrying nullability and reference-parameter markers
/// alongside its [`Kind`] (spec §3.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    pub kind: Kind,
    pub is_nullable: bool,
    pub is_reference: bool,
}

impl Type {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            is_nullable: false,
            is_reference: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn by_ref(mut self) -> Self {
        self.is_reference = true;
        self
    }

    pub fn int() -> Self {
        Self::new(Kind::Int)
    }

    pub fn float() -> Self {
        Self::new(Kind::Float)
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn bool() -> Self {
        Self::new(Kind::Bool)
    }

    pub fn void() -> Self {
        Self::new(Kind::Void)
    }

    pub fn any() -> Self {
        Self::new(Kind::Any)
    }

    pub fn list(element: Type) -> Self {
        Self::new(Kind::List(Box::new(element)))
    }

    pub fn dict(key: Type, value: Type) -> Self {
        Self::new(Kind::Dict(Box::new(key), Box::new(value)))
    }

    pub fn struct_named(name: impl Into<String>, module: Option<String>) -> Self {
        Self::new(Kind::Struct {
            name: name.into(),
            module,
        })
    }

    pub fn type_param(name: impl Into<String>) -> Self {
        Self::new(Kind::TypeParam(name.into()))
    }

    pub fn union(mut members: Vec<Type>) -> Self {
        members.sort_by_key(|t| t.canonical());
        members.dedup_by_key(|t| t.canonical());
        Self::new(Kind::Union(members))
    }

    /// True if this type (or any type nested within it) references a
    /// [`Kind::TypeParam`]. A generic struct must never be instantiated
    /// directly (spec §3.3); this check is what the struct registry uses to
    /// enforce that invariant.
    pub fn contains_type_param(&self) -> bool {
        match &self.kind {
            Kind::TypeParam(_) => true,
            Kind::List(element) => element.contains_type_param(),
            Kind::Dict(key, value) => key.contains_type_param() || value.contains_type_param(),
            Kind::Function {
                params,
                return_type,
            } => {
                params.iter().any(Type::contains_type_param) || return_type.contains_type_param()
            }
            Kind::Union(members) => members.iter().any(Type::contains_type_param),
            _ => false,
        }
    }

    /// Substitute every [`Kind::TypeParam`] named in `bindings` with its bound
    /// concrete type. Used by struct monomorphization (spec §4.5).
    pub fn substitute(&self, bindings: &std::collections::HashMap<String, Type>) -> Type {
        let kind = match &self.kind {
            Kind::TypeParam(name) => {
                return bindings.get(name).cloned().unwrap_or_else(|| self.clone());
            }
            Kind::List(element) => Kind::List(Box::new(element.substitute(bindings))),
            Kind::Dict(key, value) => Kind::Dict(
                Box::new(key.substitute(bindings)),
                Box::new(value.substitute(bindings)),
            ),
            Kind::Function {
                params,
                return_type,
            } => Kind::Function {
                params: params.iter().map(|p| p.substitute(bindings)).collect(),
                return_type: Box::new(return_type.substitute(bindings)),
            },
            Kind::Union(members) => {
                Kind::Union(members.iter().map(|m| m.substitute(bindings)).collect())
            }
            other => other.clone(),
        };
        Type {
            kind,
            is_nullable: self.is_nullable,
            is_reference: self.is_reference,
        }
    }

    /// Canonical string form used to build mangled monomorphization names
    /// (`<Base>_<T1>_<T2>_…`, spec §3.3) and as a stable cache key fragment.
    pub fn canonical(&self) -> String {
        let base = match &self.kind {
            Kind::Int => "int".to_owned(),
            Kind::Float => "float".to_owned(),
            Kind::String => "string".to_owned(),
            Kind::Bool => "bool".to_owned(),
            Kind::Void => "void".to_owned(),
            Kind::Any => "any".to_owned(),
            Kind::List(element) => format!("List<{}>", element.canonical()),
            Kind::Dict(key, value) => format!("Dict<{},{}>", key.canonical(), value.canonical()),
            Kind::Struct { name, .. } => name.clone(),
            Kind::Enum(name) => name.clone(),
            Kind::Function {
                params,
                return_type,
            } => format!(
                "Fn({})->{}",
                params
                    .iter()
                    .map(Type::canonical)
                    .collect::<Vec<_>>()
                    .join(","),
                return_type.canonical()
            ),
            Kind::Union(members) => members
                .iter()
                .map(Type::canonical)
                .collect::<Vec<_>>()
                .join("|"),
            Kind::TypeParam(name) => name.clone(),
        };
        if self.is_nullable {
            format!("{base}?")
        } else {
            base
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_list_of_int() {
        assert_eq!(Type::list(Type::int()).canonical(), "List<int>");
    }

    #[test]
    fn test_nullable_suffix() {
        assert_eq!(Type::int().nullable().canonical(), "int?");
    }

    #[test]
    fn test_contains_type_param() {
        let t = Type::list(Type::type_param("T"));
        assert!(t.contains_type_param());
        assert!(!Type::list(Type::int()).contains_type_param());
    }

    #[test]
    fn test_substitute() {
        let mut bindings = std::collections::HashMap::new();
        bindings.insert("T".to_owned(), Type::int());
        let t = Type::list(Type::type_param("T"));
        assert_eq!(t.substitute(&bindings), Type::list(Type::int()));
    }
}
