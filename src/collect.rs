//! Declaration collection: raw annotated properties in, validated
//! declarations plus the wrapper lookup table out.
use std::collections::HashSet;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::diagnostics::Reporter;
use crate::ir::{AnnotatedField, FieldDecl, WrapperCandidate, WrapperDecl, WrapperKey};
use crate::registry;

// ————————————————————————————————————————————————————————————————————————————
// WRAPPER TABLE
// ————————————————————————————————————————————————————————————————————————————

/// Every `@PreferenceFile` declaration, keyed by file name or by owning
/// class, in registration order. First registration of a key wins.
#[derive(Debug, Clone, Default)]
pub struct WrapperTable {
    entries: IndexMap<WrapperKey, WrapperDecl>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrapperEntry<'a> {
    pub key: &'a WrapperKey,
    pub wrapper: &'a WrapperDecl,
}

impl WrapperTable {
    /// Registers `decl`; on collision keeps the existing entry and returns it.
    pub fn register(&mut self, key: WrapperKey, decl: WrapperDecl) -> Result<(), &WrapperDecl> {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => Err(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                entry.insert(decl);
                Ok(())
            }
        }
    }
    pub fn get(&self, key: &WrapperKey) -> Option<&WrapperDecl> {
        self.entries.get(key)
    }
    /// Whether any wrapper was declared with an explicit `fileName`.
    pub fn has_file_keys(&self) -> bool {
        self.entries.keys().any(|k| matches!(k, WrapperKey::File(_)))
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn entries(&self) -> impl Iterator<Item = WrapperEntry<'_>> {
        self.entries.iter().map(|(key, wrapper)| WrapperEntry { key, wrapper })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COLLECTION
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub fields: Vec<FieldDecl>,
    pub wrappers: WrapperTable,
}

pub fn collect(
    fields: &[AnnotatedField],
    candidates: &[WrapperCandidate],
    reporter: &mut dyn Reporter,
) -> Declarations {
    let mut out = Declarations::default();

    for candidate in candidates {
        let key = match candidate.args.file_name.as_str() {
            "" => WrapperKey::Class(candidate.owner.clone()),
            name => WrapperKey::File(name.to_string()),
        };
        let decl = WrapperDecl {
            store_field: candidate.name.clone(),
            receiver: candidate.owner.clone(),
            origin: candidate.origin.clone(),
        };
        if let Err(existing) = out.wrappers.register(key.clone(), decl) {
            let message = format!(
                "@PreferenceFile `{}` ignored: {key} is already bound to `{}.{}` ({})",
                candidate.name, existing.receiver, existing.store_field, existing.origin,
            );
            reporter.warning(message, Some(&candidate.origin));
        }
    }

    let mut accessors = HashSet::new();
    for field in fields {
        let Some(mapping) = registry::lookup(&field.type_token) else {
            let message = format!(
                "Couldn't recognize type `{}` of @Preference property `{}` in {}",
                field.type_token, field.name, field.owner,
            );
            reporter.error(message, Some(&field.origin));
            continue;
        };
        let decl = FieldDecl {
            name: field.name.clone(),
            owner: field.owner.clone(),
            mapping,
            key: match field.args.key.as_str() {
                "" => field.name.clone(),
                key => key.to_string(),
            },
            default: mapping.kind.default_from(&field.args),
            file: Some(field.args.file.clone()).filter(|f| !f.is_empty()),
            origin: field.origin.clone(),
        };
        // same name with another type is a legal overload
        if !accessors.insert((decl.accessor_suffix(), mapping.native_type)) {
            let message = format!(
                "@Preference property `{}` in {} skipped: get{suffix}/put{suffix} for {native} are already generated for another property",
                decl.name,
                decl.owner,
                suffix = decl.accessor_suffix(),
                native = mapping.native_type,
            );
            reporter.warning(message, Some(&decl.origin));
            continue;
        }
        out.fields.push(decl);
    }

    tracing::debug!(fields = out.fields.len(), wrappers = out.wrappers.len(), "collected declarations");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, Severity};
    use crate::ir::{ClassName, Origin, PreferenceArgs, PreferenceFileArgs};
    use crate::registry::{DefaultValue, PrefKind};

    fn origin(line: usize) -> Origin {
        Origin { path: "Prefs.kt".into(), line }
    }

    fn field(name: &str, type_token: &str, args: PreferenceArgs) -> AnnotatedField {
        AnnotatedField {
            name: name.into(),
            type_token: type_token.into(),
            owner: ClassName::nested("com.example", "MyPreferences"),
            args,
            origin: origin(1),
        }
    }

    fn candidate(name: &str, owner: &str, file_name: &str) -> WrapperCandidate {
        WrapperCandidate {
            name: name.into(),
            owner: ClassName::nested("com.example", owner),
            args: PreferenceFileArgs { file_name: file_name.into() },
            origin: origin(2),
        }
    }

    #[test]
    fn key_defaults_to_the_field_name() {
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&[field("userSignedIn", "Boolean?", PreferenceArgs::default())], &[], &mut diagnostics);
        assert_eq!(decls.fields[0].key, "userSignedIn");
        assert_eq!(decls.fields[0].default, DefaultValue::Boolean(false));
        assert_eq!(decls.fields[0].file, None);
        assert!(decls.wrappers.is_empty());
    }

    #[test]
    fn explicit_key_and_default_win() {
        let args = PreferenceArgs { key: "customAge".into(), default_int: 2, ..PreferenceArgs::default() };
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&[field("age", "Int?", args)], &[], &mut diagnostics);
        let age = &decls.fields[0];
        assert_eq!(age.key, "customAge");
        assert_eq!(age.mapping.kind, PrefKind::Int);
        assert_eq!(age.default, DefaultValue::Int(2));
    }

    #[test]
    fn unrecognized_types_are_reported_and_skipped() {
        let fields = [
            field("ratio", "Double", PreferenceArgs::default()),
            field("message", "String", PreferenceArgs::default()),
        ];
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&fields, &[], &mut diagnostics);
        assert_eq!(decls.fields.len(), 1);
        assert_eq!(decls.fields[0].name, "message");
        assert_eq!(diagnostics.error_count(), 1);
        let message = &diagnostics.iter().next().unwrap().message;
        assert!(message.contains("Double") && message.contains("ratio"), "{message}");
    }

    #[test]
    fn wrappers_register_by_file_name_or_class() {
        let candidates = [candidate("startupPreferences", "Startup", "startup"), candidate("prefs", "Wrapper", "")];
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&[], &candidates, &mut diagnostics);
        assert!(decls.wrappers.has_file_keys());
        let by_file = decls.wrappers.get(&WrapperKey::File("startup".into())).unwrap();
        assert_eq!(by_file.store_field, "startupPreferences");
        let by_class = decls
            .wrappers
            .get(&WrapperKey::Class(ClassName::nested("com.example", "Wrapper")))
            .unwrap();
        assert_eq!(by_class.store_field, "prefs");
    }

    #[test]
    fn first_registered_wrapper_wins() {
        let candidates = [candidate("first", "A", "startup"), candidate("second", "B", "startup")];
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&[], &candidates, &mut diagnostics);
        assert_eq!(decls.wrappers.len(), 1);
        assert_eq!(decls.wrappers.get(&WrapperKey::File("startup".into())).unwrap().store_field, "first");
        let severities: Vec<Severity> = diagnostics.iter().map(|d| d.severity).collect();
        assert_eq!(severities, [Severity::Warning]);
    }

    #[test]
    fn clashing_accessor_signatures_keep_the_first() {
        let fields = [
            field("token", "String", PreferenceArgs::default()),
            field("Token", "String?", PreferenceArgs::default()),
        ];
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&fields, &[], &mut diagnostics);
        assert_eq!(decls.fields.len(), 1);
        assert_eq!(decls.fields[0].name, "token");
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn same_accessor_name_with_another_type_is_an_overload() {
        let mut counter = field("token", "Int", PreferenceArgs::default());
        counter.owner = ClassName::nested("app", "Counter");
        let mut session = field("token", "String", PreferenceArgs::default());
        session.owner = ClassName::nested("app", "Session");
        let mut diagnostics = Diagnostics::new();
        let decls = collect(&[session, counter], &[], &mut diagnostics);
        let kinds: Vec<PrefKind> = decls.fields.iter().map(|f| f.mapping.kind).collect();
        assert_eq!(kinds, [PrefKind::String, PrefKind::Int]);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }
}
