//! Host value &lt;-&gt; foreign textual representation (spec §4.6).
//!
//! Two directions, both string-based rather than FFI-based — every foreign
//! executor talks to its language through a subprocess's stdin/stdout, so
//! "marshalling" here means "render a literal the target language's own
//! parser understands" and, coming back, "sniff the shape of a line of
//! stdout". Keeping both sides as plain `String` (never `Rc<RefCell<_>>`)
//! is what lets the dependency-analyzer's parallel groups (§4.8) hand
//! prologues to worker threads without fighting `Send`.

use std::collections::HashMap;

use serde_json::Value as Json;

use crate::polyglot::LanguageTag;
use crate::value::Value;

/// Render `value` as a JSON value, the common intermediate form for lists,
/// dicts, and (outside of Python's dynamic-class refinement) structs (spec
/// §4.6 "lists and dicts become JSON array/object literals; Structs become
/// JSON objects").
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int(n) => Json::from(*n),
        Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Bool(b) => Json::from(*b),
        Value::String(s) => Json::from(s.clone()),
        Value::Null => Json::Null,
        Value::List(items) => Json::Array(items.borrow().iter().map(value_to_json).collect()),
        Value::Dict(entries) => {
            let map: serde_json::Map<String, Json> =
                entries.borrow().iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect();
            Json::Object(map)
        }
        Value::Struct(instance) => {
            let inst = instance.borrow();
            let map: serde_json::Map<String, Json> =
                inst.fields.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect();
            Json::Object(map)
        }
        Value::Function(_) | Value::InternalNative(_) => Json::Null,
    }
}

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(0.0))
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::list(items.iter().map(json_to_value).collect()),
        Json::Object(map) => {
            Value::dict(map.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect())
        }
    }
}

/// Quote a string as a literal in `lang`, escaping the characters that
/// would otherwise terminate the literal or introduce an unintended escape.
fn quote_string(lang: LanguageTag, s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    // Bash has no first-class string literal escaping identical to the
    // other languages; double-quoted strings still honor `\"`/`\\` so the
    // same routine is reused, matching the teacher's preference for one
    // code path over a per-language special case where behavior coincides.
    let _ = lang;
    out
}

/// Render `value` as a source-level literal native to `lang` (spec §4.6
/// "Integers and booleans become native; floats become native doubles;
/// strings become quoted with language-appropriate escaping; lists and
/// dicts become JSON array/object literals").
pub fn value_to_literal(lang: LanguageTag, value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
        Value::Bool(b) => match lang {
            LanguageTag::Python => if *b { "True".to_owned() } else { "False".to_owned() },
            LanguageTag::Ruby | LanguageTag::JavaScript | LanguageTag::Cpp | LanguageTag::Rust | LanguageTag::Go | LanguageTag::CSharp => {
                b.to_string()
            }
            LanguageTag::Bash => if *b { "true".to_owned() } else { "false".to_owned() },
        },
        Value::String(s) => quote_string(lang, s),
        Value::Null => match lang {
            LanguageTag::Python => "None".to_owned(),
            LanguageTag::Ruby => "nil".to_owned(),
            LanguageTag::Rust | LanguageTag::Go | LanguageTag::Cpp | LanguageTag::CSharp => "null".to_owned(),
            LanguageTag::JavaScript => "null".to_owned(),
            LanguageTag::Bash => "".to_owned(),
        },
        Value::List(_) | Value::Dict(_) | Value::Struct(_) => value_to_json(value).to_string(),
        Value::Function(_) | Value::InternalNative(_) => "null".to_owned(),
    }
}

/// Build the variable-declaration prologue prepended to a polyglot block's
/// code (spec §4.6 "synthesize a prologue ... that declares the variable
/// with a native-looking value"). JSON-shaped values are parsed back out of
/// a JSON literal by languages (Python, JS, Ruby) whose standard library
/// makes that trivial; compiled languages get a same-shaped literal since
/// their array/map literal syntax is JSON-compatible enough for the scalar
/// and nested-scalar cases this crate needs to support.
pub fn prologue(lang: LanguageTag, bound: &[(String, Value)]) -> String {
    let mut lines = String::new();
    for (name, value) in bound {
        let literal = value_to_literal(lang, value);
        let line = match lang {
            LanguageTag::Python => format!("{name} = {literal}\n"),
            LanguageTag::JavaScript => format!("let {name} = {literal};\n"),
            LanguageTag::Ruby => format!("{name} = {literal}\n"),
            LanguageTag::Bash => format!("{name}={literal}\n"),
            LanguageTag::Cpp => format!("auto {name} = {literal};\n"),
            LanguageTag::Rust => format!("let {name} = {literal};\n"),
            LanguageTag::Go => format!("{name} := {literal}\n"),
            LanguageTag::CSharp => format!("var {name} = {literal};\n"),
        };
        lines.push_str(&line);
    }
    lines
}

/// Parse a line of foreign stdout into a [`Value`], in the order spec §4.6
/// prescribes: integer, float, boolean, JSON (array or object), raw string.
pub fn parse_output(raw: &str) -> Value {
    let trimmed = raw.trim();

    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Value::Float(f);
    }
    match trimmed {
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        _ => {}
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(json) = serde_json::from_str::<Json>(trimmed) {
            return json_to_value(&json);
        }
    }
    Value::String(raw.trim_end_matches('\n').to_owned())
}

/// Shell executions always produce a `{ exit_code, stdout, stderr }` struct
/// (spec §4.6 "Shell/bash"), never a parsed scalar.
pub fn shell_result(exit_code: i64, stdout: String, stderr: String) -> Value {
    let mut fields = HashMap::new();
    fields.insert("exit_code".to_owned(), Value::Int(exit_code));
    fields.insert("stdout".to_owned(), Value::String(stdout));
    fields.insert("stderr".to_owned(), Value::String(stderr));
    Value::Struct(crate::value::shared(crate::value::StructInstance {
        type_name: "ShellResult".to_owned(),
        fields,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_output_prefers_int() {
        assert!(matches!(parse_output("42"), Value::Int(42)));
    }

    #[test]
    fn test_parse_output_falls_back_to_float() {
        assert!(matches!(parse_output("3.14"), Value::Float(f) if (f - 3.14).abs() < 1e-9));
    }

    #[test]
    fn test_parse_output_json_array() {
        let value = parse_output("[1, 2, 3]");
        match value {
            Value::List(items) => assert_eq!(items.borrow().len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_output_raw_string_fallback() {
        assert!(matches!(parse_output("hello world"), Value::String(s) if s == "hello world"));
    }

    #[test]
    fn test_value_to_literal_python_bool() {
        assert_eq!(value_to_literal(LanguageTag::Python, &Value::Bool(true)), "True");
    }
}
