//! Kotlin extension emitter.
//!
//! Output is a pure function of the bindings and settings: same input,
//! byte-identical files.
use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ir::{ClassName, FieldDecl, WrapperDecl};
use crate::lower::Binding;

pub const HEADER: &str = "// Code generated by prefext. DO NOT EDIT.";

pub const DEFAULT_STORE_TYPE: &str = "android.content.SharedPreferences";
pub const DEFAULT_EDITOR_TYPE: &str = "android.content.SharedPreferences.Editor";

/// How generated setters finish their editor transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// `commit()`: synchronous, result ignored.
    #[default]
    Commit,
    /// `apply()`: asynchronous.
    Apply,
}

impl WriteMode {
    fn call(self) -> &'static str {
        match self {
            WriteMode::Commit => "commit()",
            WriteMode::Apply => "apply()",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CodegenSettings {
    /// Output package; defaults to the package of the first field.
    pub package: Option<String>,
    pub write_mode: WriteMode,
    /// Unit names, without `.kt`.
    pub extensions_file: String,
    pub wrapper_file: String,
    pub store_type: String,
    pub editor_type: String,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            package: None,
            write_mode: WriteMode::default(),
            extensions_file: "PreferenceExtensions".to_string(),
            wrapper_file: "PreferenceWrapperExtensions".to_string(),
            store_type: DEFAULT_STORE_TYPE.to_string(),
            editor_type: DEFAULT_EDITOR_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedUnit {
    /// `PreferenceExtensions.kt`
    pub file_name: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedSource {
    pub package: String,
    pub units: Vec<GeneratedUnit>,
}

impl GeneratedSource {
    /// Where a unit lands below the output directory: `com/example/X.kt`.
    pub fn relative_path(&self, unit: &GeneratedUnit) -> PathBuf {
        let mut path: PathBuf = self.package.split('.').filter(|s| !s.is_empty()).collect();
        path.push(&unit.file_name);
        path
    }

    pub fn unit(&self, file_name: &str) -> Option<&GeneratedUnit> {
        self.units.iter().find(|u| u.file_name == file_name)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EMISSION
// ————————————————————————————————————————————————————————————————————————————

pub fn emit(bindings: &[Binding<'_>], settings: &CodegenSettings) -> GeneratedSource {
    let Some(first) = bindings.first() else {
        return GeneratedSource::default();
    };
    let package = settings.package.clone().unwrap_or_else(|| first.field.owner.package.clone());
    let store = ClassName::parse_qualified(&settings.store_type);
    let editor = ClassName::parse_qualified(&settings.editor_type);

    let mut extensions = Codegen::new(&package);
    let mut wrappers = Codegen::new(&package);
    for binding in bindings {
        let field = binding.field;
        let store_name = extensions.import(&store);
        let editor_name = extensions.import(&editor);
        extensions.function(getter(&store_name, field, None));
        extensions.function(setter(&editor_name, field, None, settings.write_mode));

        if let Some(wrapper) = binding.wrapper {
            let receiver = wrappers.import(&wrapper.receiver);
            wrappers.function(getter(&receiver, field, Some(wrapper)));
            wrappers.function(setter(&receiver, field, Some(wrapper), settings.write_mode));
        }
    }

    let mut units = vec![GeneratedUnit {
        file_name: format!("{}.kt", settings.extensions_file),
        source: extensions.into_string(),
    }];
    if !wrappers.is_empty() {
        units.push(GeneratedUnit {
            file_name: format!("{}.kt", settings.wrapper_file),
            source: wrappers.into_string(),
        });
    }
    GeneratedSource { package, units }
}

fn getter(receiver: &str, field: &FieldDecl, wrapper: Option<&WrapperDecl>) -> String {
    let native = field.mapping.native_type;
    let target = match wrapper {
        Some(wrapper) => format!("{}.", wrapper.store_field),
        None => String::new(),
    };
    format!(
        "fun {receiver}.get{name}(defaultValue: {native} = {default}): {native} {{\n    return {target}get{suffix}(\"{key}\", defaultValue)\n}}\n",
        name = field.accessor_suffix(),
        default = field.default.render(),
        suffix = field.mapping.accessor_suffix,
        key = escape(&field.key),
    )
}

fn setter(receiver: &str, field: &FieldDecl, wrapper: Option<&WrapperDecl>, mode: WriteMode) -> String {
    let param = identifier(&field.name);
    let target = match wrapper {
        Some(wrapper) => format!("{}.edit().", wrapper.store_field),
        None => String::new(),
    };
    format!(
        "fun {receiver}.put{name}({param}: {native}) {{\n    {target}put{suffix}(\"{key}\", {param}).{finish}\n}}\n",
        name = field.accessor_suffix(),
        native = field.mapping.native_type,
        suffix = field.mapping.accessor_suffix,
        key = escape(&field.key),
        finish = mode.call(),
    )
}

/// Body of a Kotlin string literal (quotes not included).
fn escape(key: &str) -> String {
    let quoted = crate::registry::kotlin_string_literal(key);
    quoted[1..quoted.len() - 1].to_string()
}

const HARD_KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

fn identifier(name: &str) -> String {
    if HARD_KEYWORDS.contains(&name) {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FILE BUILDER
// ————————————————————————————————————————————————————————————————————————————

/// Accumulates one Kotlin file: package, sorted imports, functions.
pub struct Codegen {
    package: String,
    imports: BTreeSet<String>,
    functions: Vec<String>,
}

impl Codegen {
    pub fn new(package: &str) -> Self {
        Self { package: package.to_string(), imports: BTreeSet::new(), functions: Vec::new() }
    }

    /// Brings `class` into scope if needed and returns how to spell it.
    pub fn import(&mut self, class: &ClassName) -> String {
        if !class.package.is_empty() && class.package != self.package {
            self.imports.insert(class.top_level());
        }
        class.nested_name()
    }

    pub fn function(&mut self, source: String) {
        self.functions.push(source);
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn into_string(self) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');
        if !self.package.is_empty() {
            out.push_str(&format!("package {}\n", self.package));
        }
        if !self.imports.is_empty() {
            out.push('\n');
            for import in &self.imports {
                out.push_str(&format!("import {import}\n"));
            }
        }
        for function in &self.functions {
            out.push('\n');
            out.push_str(function);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;
    use crate::diagnostics::Diagnostics;
    use crate::ir::{AnnotatedField, Origin, PreferenceArgs, PreferenceFileArgs, WrapperCandidate};
    use crate::lower::{ClassFallback, resolve};
    use pretty_assertions::assert_eq;

    fn field(name: &str, type_token: &str, args: PreferenceArgs) -> AnnotatedField {
        AnnotatedField {
            name: name.into(),
            type_token: type_token.into(),
            owner: ClassName::nested("com.glassdoor.sample", "MyPreferences"),
            args,
            origin: Origin { path: "MyPreferences.kt".into(), line: 1 },
        }
    }

    fn generate(fields: &[AnnotatedField], wrappers: &[WrapperCandidate], settings: &CodegenSettings) -> GeneratedSource {
        let mut diagnostics = Diagnostics::new();
        let decls = collect(fields, wrappers, &mut diagnostics);
        let bindings = resolve(&decls, ClassFallback::default(), &mut diagnostics);
        emit(&bindings, settings)
    }

    #[test]
    fn string_field_with_default() {
        let args = PreferenceArgs { default_string: "hello".into(), ..PreferenceArgs::default() };
        let out = generate(&[field("message", "String?", args)], &[], &CodegenSettings::default());
        assert_eq!(out.package, "com.glassdoor.sample");
        assert_eq!(out.units.len(), 1);
        let expected = r#"// Code generated by prefext. DO NOT EDIT.
package com.glassdoor.sample

import android.content.SharedPreferences

fun SharedPreferences.getMessage(defaultValue: String = "hello"): String {
    return getString("message", defaultValue)
}

fun SharedPreferences.Editor.putMessage(message: String) {
    putString("message", message).commit()
}
"#;
        assert_eq!(out.units[0].source, expected);
        assert_eq!(out.units[0].file_name, "PreferenceExtensions.kt");
    }

    #[test]
    fn custom_key_and_int_default() {
        let args = PreferenceArgs { key: "customAge".into(), default_int: 2, ..PreferenceArgs::default() };
        let out = generate(&[field("age", "Int?", args)], &[], &CodegenSettings::default());
        let source = &out.units[0].source;
        assert!(source.contains("fun SharedPreferences.getAge(defaultValue: Int = 2): Int {\n    return getInt(\"customAge\", defaultValue)\n}"));
        assert!(source.contains("fun SharedPreferences.Editor.putAge(age: Int) {\n    putInt(\"customAge\", age).commit()\n}"));
    }

    #[test]
    fn default_defaults_for_each_kind() {
        let fields = [
            field("points", "Long", PreferenceArgs::default()),
            field("rating", "Float", PreferenceArgs::default()),
            field("peopleList", "Set<String>", PreferenceArgs::default()),
        ];
        let out = generate(&fields, &[], &CodegenSettings::default());
        let source = &out.units[0].source;
        assert!(source.contains("getPoints(defaultValue: Long = 0L): Long"));
        assert!(source.contains("getRating(defaultValue: Float = 0.0f): Float"));
        assert!(source.contains(
            "getPeopleList(defaultValue: Set<String> = emptySet<String>()): Set<String> {\n    return getStringSet(\"peopleList\", defaultValue)"
        ));
        assert!(source.contains("putStringSet(\"peopleList\", peopleList).commit()"));
    }

    #[test]
    fn wrapper_bindings_go_to_their_own_unit() {
        let fields = [field(
            "appStartCount",
            "Long?",
            PreferenceArgs { file: "startup".into(), ..PreferenceArgs::default() },
        )];
        let wrappers = [WrapperCandidate {
            name: "startupPreferences".into(),
            owner: ClassName::nested("com.glassdoor.app", "AppPreferences"),
            args: PreferenceFileArgs { file_name: "startup".into() },
            origin: Origin { path: "AppPreferences.kt".into(), line: 4 },
        }];
        let out = generate(&fields, &wrappers, &CodegenSettings::default());
        assert_eq!(out.units.len(), 2);
        let expected = r#"// Code generated by prefext. DO NOT EDIT.
package com.glassdoor.sample

import com.glassdoor.app.AppPreferences

fun AppPreferences.getAppStartCount(defaultValue: Long = 0L): Long {
    return startupPreferences.getLong("appStartCount", defaultValue)
}

fun AppPreferences.putAppStartCount(appStartCount: Long) {
    startupPreferences.edit().putLong("appStartCount", appStartCount).commit()
}
"#;
        assert_eq!(out.unit("PreferenceWrapperExtensions.kt").unwrap().source, expected);
    }

    #[test]
    fn apply_mode_and_package_override() {
        let settings = CodegenSettings {
            package: Some("com.example.generated".into()),
            write_mode: WriteMode::Apply,
            ..CodegenSettings::default()
        };
        let out = generate(&[field("flag", "Boolean", PreferenceArgs::default())], &[], &settings);
        assert_eq!(out.package, "com.example.generated");
        assert!(out.units[0].source.contains("putBoolean(\"flag\", flag).apply()"));
        assert_eq!(out.relative_path(&out.units[0]), PathBuf::from("com/example/generated/PreferenceExtensions.kt"));
    }

    #[test]
    fn keyword_field_names_are_quoted_in_setters() {
        let out = generate(&[field("in", "Int", PreferenceArgs::default())], &[], &CodegenSettings::default());
        assert!(out.units[0].source.contains("fun SharedPreferences.Editor.putIn(`in`: Int) {\n    putInt(\"in\", `in`).commit()"));
    }

    #[test]
    fn nothing_to_emit_without_bindings() {
        let out = generate(&[field("ratio", "Double", PreferenceArgs::default())], &[], &CodegenSettings::default());
        assert!(out.units.is_empty());
    }

    #[test]
    fn emission_is_deterministic() {
        let fields = [
            field("message", "String", PreferenceArgs::default()),
            field("age", "Int", PreferenceArgs { key: "customAge".into(), ..PreferenceArgs::default() }),
        ];
        let first = generate(&fields, &[], &CodegenSettings::default());
        let second = generate(&fields, &[], &CodegenSettings::default());
        assert_eq!(first, second);
    }
}
