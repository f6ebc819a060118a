// Strongly-typed IR shared by the scanners, the collector and codegen.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::registry::{DefaultValue, TypeMapping};

// ————————————————————————————————————————————————————————————————————————————
// IDENTITY
// ————————————————————————————————————————————————————————————————————————————

/// A declaring class: package plus one simple name per nesting level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassName {
    pub package: String,
    pub simple_names: Vec<String>,
}

impl ClassName {
    pub fn new(package: impl Into<String>, simple_names: Vec<String>) -> Self {
        Self { package: package.into(), simple_names }
    }

    /// `Outer.Inner` relative to `package`.
    pub fn nested(package: &str, dotted: &str) -> Self {
        Self::new(package, dotted.split('.').map(str::to_string).collect())
    }

    /// Splits `android.content.SharedPreferences.Editor` at the first
    /// capitalized segment, the usual Kotlin package/class boundary.
    pub fn parse_qualified(qualified: &str) -> Self {
        let segments: Vec<&str> = qualified.split('.').collect();
        let boundary = segments
            .iter()
            .position(|s| s.starts_with(|c: char| c.is_uppercase()))
            .unwrap_or(segments.len().saturating_sub(1));
        Self::new(
            segments[..boundary].join("."),
            segments[boundary..].iter().map(|s| s.to_string()).collect(),
        )
    }

    /// How the class is spelled once its outermost class is in scope.
    pub fn nested_name(&self) -> String {
        self.simple_names.join(".")
    }

    /// Fully qualified name of the outermost class (what gets imported).
    pub fn top_level(&self) -> String {
        let outer = self.simple_names.first().map(String::as_str).unwrap_or_default();
        if self.package.is_empty() {
            outer.to_string()
        } else {
            format!("{}.{outer}", self.package)
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.nested_name())
        } else {
            write!(f, "{}.{}", self.package, self.nested_name())
        }
    }
}

/// Source location of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    pub path: PathBuf,
    /// 1-based; 0 when unknown (manifest entries without `line`).
    pub line: usize,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            0 => write!(f, "{}", self.path.display()),
            line => write!(f, "{}:{line}", self.path.display()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATION ARGUMENTS
// ————————————————————————————————————————————————————————————————————————————

/// Literal parameters of `@Preference`, with the annotation's own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PreferenceArgs {
    pub default_int: i32,
    pub default_string: String,
    pub default_long: i64,
    pub default_boolean: bool,
    pub default_float: f32,
    pub key: String,
    pub file: String,
}

impl Default for PreferenceArgs {
    fn default() -> Self {
        Self {
            default_int: 0,
            default_string: String::new(),
            default_long: 0,
            default_boolean: false,
            default_float: 0.0,
            key: String::new(),
            file: String::new(),
        }
    }
}

/// Literal parameters of `@PreferenceFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PreferenceFileArgs {
    pub file_name: String,
}

// ————————————————————————————————————————————————————————————————————————————
// RAW INPUT (scanner output)
// ————————————————————————————————————————————————————————————————————————————

/// A property carrying `@Preference`, exactly as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedField {
    pub name: String,
    /// Declared type as written, e.g. `Set<String>?`.
    pub type_token: String,
    pub owner: ClassName,
    pub args: PreferenceArgs,
    pub origin: Origin,
}

/// A property carrying `@PreferenceFile`: a store owned by a wrapper class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrapperCandidate {
    /// Name of the store property inside `owner`.
    pub name: String,
    pub owner: ClassName,
    pub args: PreferenceFileArgs,
    pub origin: Origin,
}

// ————————————————————————————————————————————————————————————————————————————
// COLLECTED DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    pub name: String,
    pub owner: ClassName,
    pub mapping: TypeMapping,
    /// Store key: explicit `key` or the field name.
    pub key: String,
    pub default: DefaultValue,
    /// Explicit `file` reference, if any.
    pub file: Option<String>,
    pub origin: Origin,
}

impl FieldDecl {
    /// Suffix of the generated `get`/`put` functions.
    pub fn accessor_suffix(&self) -> String {
        capitalize(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrapperDecl {
    /// Property holding the store inside the wrapper.
    pub store_field: String,
    /// The wrapper class; generated wrapper extensions are bound to it.
    pub receiver: ClassName,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum WrapperKey {
    File(String),
    Class(ClassName),
}

impl fmt::Display for WrapperKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(name) => write!(f, "fileName = \"{name}\""),
            Self::Class(class) => write!(f, "class {class}"),
        }
    }
}

/// Upper-cases the first character only; `userSignedIn` → `UserSignedIn`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_touches_only_the_first_letter() {
        assert_eq!(capitalize("userSignedIn"), "UserSignedIn");
        assert_eq!(capitalize("URL"), "URL");
        assert_eq!(capitalize("peopleList"), "PeopleList");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn class_names_render_qualified_and_nested() {
        let class = ClassName::nested("com.example", "Outer.Inner");
        assert_eq!(class.to_string(), "com.example.Outer.Inner");
        assert_eq!(class.nested_name(), "Outer.Inner");
        assert_eq!(class.top_level(), "com.example.Outer");

        let editor = ClassName::parse_qualified("android.content.SharedPreferences.Editor");
        assert_eq!(editor.package, "android.content");
        assert_eq!(editor.nested_name(), "SharedPreferences.Editor");

        let root = ClassName::nested("", "Prefs");
        assert_eq!(root.to_string(), "Prefs");
        assert_eq!(root.top_level(), "Prefs");
    }

    #[test]
    fn preference_args_deserialize_with_annotation_defaults() {
        let args: PreferenceArgs = serde_json::from_str(r#"{"key": "customAge", "defaultInt": 2}"#).unwrap();
        assert_eq!(args.key, "customAge");
        assert_eq!(args.default_int, 2);
        assert_eq!(args.default_string, "");
        assert_eq!(args.default_float, 0.0);
        assert!(!args.default_boolean);
    }
}
