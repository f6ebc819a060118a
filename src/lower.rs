//! Binding resolution: decides, per field, which wrapper (if any) gets a
//! second getter/setter pair. One lookup table, one rule:
//!
//! 1. a field with `file = "x"` binds to the wrapper declared with
//!    `fileName = "x"`, or to nothing (warning);
//! 2. a field without `file` binds to a wrapper declared without `fileName`
//!    in the field's own class, when [`ClassFallback`] allows it.
use serde::{Deserialize, Serialize};

use crate::collect::Declarations;
use crate::diagnostics::Reporter;
use crate::ir::{FieldDecl, WrapperDecl, WrapperKey};

/// When the class-identity match (rule 2) applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ClassFallback {
    /// Only while no wrapper in the pass declares a `fileName`.
    #[default]
    UnlessFileWrappers,
    /// Regardless of file-keyed wrappers elsewhere.
    Always,
}

#[derive(Debug, Clone, Serialize)]
pub struct Binding<'a> {
    pub field: &'a FieldDecl,
    pub wrapper: Option<&'a WrapperDecl>,
}

pub fn resolve<'a>(decls: &'a Declarations, policy: ClassFallback, reporter: &mut dyn Reporter) -> Vec<Binding<'a>> {
    let class_fallback = !decls.wrappers.is_empty()
        && match policy {
            ClassFallback::Always => true,
            ClassFallback::UnlessFileWrappers => !decls.wrappers.has_file_keys(),
        };

    decls
        .fields
        .iter()
        .map(|field| {
            let wrapper = match &field.file {
                Some(file) => {
                    let found = decls.wrappers.get(&WrapperKey::File(file.clone()));
                    if found.is_none() {
                        let message = format!(
                            "@Preference property `{}` names file \"{file}\" but no @PreferenceFile(fileName = \"{file}\") exists; only SharedPreferences extensions are generated",
                            field.name,
                        );
                        reporter.warning(message, Some(&field.origin));
                    }
                    found
                }
                None if class_fallback => decls.wrappers.get(&WrapperKey::Class(field.owner.clone())),
                None => None,
            };
            Binding { field, wrapper }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect;
    use crate::diagnostics::Diagnostics;
    use crate::ir::{AnnotatedField, ClassName, Origin, PreferenceArgs, PreferenceFileArgs, WrapperCandidate};

    fn origin() -> Origin {
        Origin { path: "W.kt".into(), line: 1 }
    }

    fn field(name: &str, owner: &str, file: &str) -> AnnotatedField {
        AnnotatedField {
            name: name.into(),
            type_token: "Long".into(),
            owner: ClassName::nested("app", owner),
            args: PreferenceArgs { file: file.into(), ..PreferenceArgs::default() },
            origin: origin(),
        }
    }

    fn wrapper(name: &str, owner: &str, file_name: &str) -> WrapperCandidate {
        WrapperCandidate {
            name: name.into(),
            owner: ClassName::nested("app", owner),
            args: PreferenceFileArgs { file_name: file_name.into() },
            origin: origin(),
        }
    }

    fn bound(
        fields: &[AnnotatedField],
        wrappers: &[WrapperCandidate],
        policy: ClassFallback,
    ) -> (Vec<Option<String>>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let decls = collect(fields, wrappers, &mut diagnostics);
        let bindings = resolve(&decls, policy, &mut diagnostics);
        let stores = bindings
            .iter()
            .map(|b| b.wrapper.map(|w| format!("{}.{}", w.receiver.nested_name(), w.store_field)))
            .collect();
        (stores, diagnostics)
    }

    #[test]
    fn explicit_file_binds_to_the_named_wrapper() {
        let (stores, diagnostics) = bound(
            &[field("appStartCount", "Settings", "startup")],
            &[wrapper("startupPreferences", "Startup", "startup"), wrapper("cookies", "Cookies", "cookies")],
            ClassFallback::UnlessFileWrappers,
        );
        assert_eq!(stores, [Some("Startup.startupPreferences".to_string())]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unknown_file_warns_and_binds_nothing() {
        let (stores, diagnostics) = bound(
            &[field("appStartCount", "Settings", "missing")],
            &[wrapper("startupPreferences", "Startup", "startup")],
            ClassFallback::Always,
        );
        assert_eq!(stores, [None]);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn class_fallback_matches_the_declaring_class() {
        let (stores, _) = bound(
            &[field("count", "Wrapper", ""), field("other", "Elsewhere", "")],
            &[wrapper("prefs", "Wrapper", "")],
            ClassFallback::UnlessFileWrappers,
        );
        assert_eq!(stores, [Some("Wrapper.prefs".to_string()), None]);
    }

    #[test]
    fn file_wrappers_suppress_class_fallback_by_default() {
        let fields = [field("count", "Wrapper", "")];
        let wrappers = [wrapper("prefs", "Wrapper", ""), wrapper("startup", "Startup", "startup")];

        let (stores, _) = bound(&fields, &wrappers, ClassFallback::UnlessFileWrappers);
        assert_eq!(stores, [None]);

        let (stores, _) = bound(&fields, &wrappers, ClassFallback::Always);
        assert_eq!(stores, [Some("Wrapper.prefs".to_string())]);
    }

    #[test]
    fn no_wrappers_means_no_bindings() {
        let (stores, diagnostics) = bound(&[field("count", "Wrapper", "")], &[], ClassFallback::Always);
        assert_eq!(stores, [None]);
        assert!(diagnostics.is_empty());
    }
}
