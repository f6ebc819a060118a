//! The fixed table of value kinds a `SharedPreferences` store can hold.
//!
//! Classification of an external type token happens once, in [`lookup`];
//! everything downstream works on the closed [`PrefKind`] enum and matches
//! exhaustively.

use serde::Serialize;

use crate::ir::PreferenceArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrefKind {
    Int,
    Long,
    Boolean,
    Float,
    String,
    StringSet,
}

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeMapping {
    pub kind: PrefKind,
    /// `Int` in `getInt` / `putInt`.
    pub accessor_suffix: &'static str,
    /// Kotlin type of the generated parameter and return value.
    pub native_type: &'static str,
}

impl PrefKind {
    pub const ALL: [PrefKind; 6] = [
        PrefKind::Int,
        PrefKind::Long,
        PrefKind::Boolean,
        PrefKind::Float,
        PrefKind::String,
        PrefKind::StringSet,
    ];

    pub fn mapping(self) -> TypeMapping {
        let (accessor_suffix, native_type) = match self {
            PrefKind::Int => ("Int", "Int"),
            PrefKind::Long => ("Long", "Long"),
            PrefKind::Boolean => ("Boolean", "Boolean"),
            PrefKind::Float => ("Float", "Float"),
            PrefKind::String => ("String", "String"),
            PrefKind::StringSet => ("StringSet", "Set<String>"),
        };
        TypeMapping { kind: self, accessor_suffix, native_type }
    }

    /// Picks the annotation parameter that applies to this kind.
    pub fn default_from(self, args: &PreferenceArgs) -> DefaultValue {
        match self {
            PrefKind::Int => DefaultValue::Int(args.default_int),
            PrefKind::Long => DefaultValue::Long(args.default_long),
            PrefKind::Boolean => DefaultValue::Boolean(args.default_boolean),
            PrefKind::Float => DefaultValue::Float(args.default_float),
            PrefKind::String => DefaultValue::String(args.default_string.clone()),
            PrefKind::StringSet => DefaultValue::EmptyStringSet,
        }
    }
}

/// Classifies a declared type. `None` for anything outside the table.
pub fn lookup(type_token: &str) -> Option<TypeMapping> {
    let normalized: String = type_token.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = normalized.strip_suffix('?').unwrap_or(&normalized);
    let kind = match normalized {
        "Int" | "kotlin.Int" | "int" | "java.lang.Integer" => PrefKind::Int,
        "Long" | "kotlin.Long" | "long" | "java.lang.Long" => PrefKind::Long,
        "Boolean" | "kotlin.Boolean" | "boolean" | "java.lang.Boolean" => PrefKind::Boolean,
        "Float" | "kotlin.Float" | "float" | "java.lang.Float" => PrefKind::Float,
        "String" | "kotlin.String" | "java.lang.String" => PrefKind::String,
        "java.util.Set<java.lang.String>" => PrefKind::StringSet,
        other => return string_set(other).then(|| PrefKind::StringSet.mapping()),
    };
    Some(kind.mapping())
}

fn string_set(token: &str) -> bool {
    let Some(inner) = token.strip_suffix('>') else { return false };
    let Some((outer, element)) = inner.split_once('<') else { return false };
    let outer = outer.strip_prefix("kotlin.collections.").unwrap_or(outer);
    matches!(outer, "Set" | "MutableSet") && matches!(element, "String" | "kotlin.String")
}

// ————————————————————————————————————————————————————————————————————————————
// DEFAULT VALUES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum DefaultValue {
    Int(i32),
    Long(i64),
    Boolean(bool),
    Float(f32),
    String(String),
    EmptyStringSet,
}

impl DefaultValue {
    /// Kotlin literal for the `defaultValue` parameter.
    pub fn render(&self) -> String {
        match self {
            DefaultValue::Int(value) => value.to_string(),
            DefaultValue::Long(value) => format!("{value}L"),
            DefaultValue::Boolean(value) => value.to_string(),
            // `{:?}` keeps a fractional part (`1.0`) and round-trips.
            DefaultValue::Float(value) => format!("{value:?}f"),
            DefaultValue::String(value) => kotlin_string_literal(value),
            DefaultValue::EmptyStringSet => "emptySet<String>()".to_string(),
        }
    }
}

pub fn kotlin_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
