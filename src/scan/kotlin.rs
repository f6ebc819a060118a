//! Kotlin front end: finds properties annotated with `@Preference` or
//! `@PreferenceFile` and reads their literal arguments.
//!
//! This is not a Kotlin parser. It follows `package`, class nesting (bodies,
//! primary constructors, companion objects) and property declarations, and
//! steps over everything else token by token.

use std::path::Path;

use crate::diagnostics::Reporter;
use crate::error::Result;
use crate::ir::{AnnotatedField, ClassName, Origin, PreferenceArgs, PreferenceFileArgs, WrapperCandidate, capitalize};
use crate::scan::lexer::{self, NumLit, Tok, Token};

/// Parameter order of `@Preference`, used for positional arguments.
const PREFERENCE_PARAMS: [&str; 7] = [
    "defaultInt",
    "defaultString",
    "defaultLong",
    "defaultBoolean",
    "defaultFloat",
    "key",
    "file",
];
const PREFERENCE_FILE_PARAMS: [&str; 1] = ["fileName"];

/// Type token recorded for properties declared without an explicit type.
pub const INFERRED_TYPE: &str = "<inferred>";

const MODIFIERS: &[&str] = &[
    "private", "public", "protected", "internal", "lateinit", "override", "open", "final",
    "abstract", "const", "inner", "external", "expect", "actual", "vararg", "noinline",
    "crossinline", "value", "inline", "tailrec", "suspend", "operator", "infix",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scanned {
    pub package: String,
    pub fields: Vec<AnnotatedField>,
    pub wrappers: Vec<WrapperCandidate>,
}

pub fn scan_source(path: &Path, source: &str, reporter: &mut dyn Reporter) -> Result<Scanned> {
    let tokens = lexer::tokenize(path, source)?;
    let facade = facade_class(path);
    let mut scanner = Scanner {
        path,
        tokens,
        pos: 0,
        facade,
        scopes: Vec::new(),
        header: None,
        parens: 0,
        out: Scanned::default(),
    };
    scanner.run(reporter);
    Ok(scanner.out)
}

/// JVM class holding top-level declarations of `Prefs.kt`: `PrefsKt`.
fn facade_class(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    format!("{}Kt", capitalize(&stem))
}

// ————————————————————————————————————————————————————————————————————————————
// ANNOTATION ARGUMENTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
enum Lit {
    Str { value: String, template: bool },
    /// Integer literal; `suffix` is `L`, `u`/`U` or none.
    Int { value: i128, suffix: Option<char> },
    /// `single` for `f`/`F` literals, otherwise a `Double`.
    Float { value: f64, single: bool },
    Bool(bool),
    /// Anything that is not a plain literal (constant references, calls…).
    Expr,
}

#[derive(Debug)]
struct Arg {
    name: Option<String>,
    value: Lit,
    line: usize,
}

#[derive(Debug)]
enum Marker {
    Preference(PreferenceArgs),
    PreferenceFile(PreferenceFileArgs),
    /// One of ours, but with arguments that were rejected (already reported).
    Invalid,
}

fn preference_args(args: Vec<Arg>, origin: &Origin, reporter: &mut dyn Reporter) -> Marker {
    let mut out = PreferenceArgs::default();
    let mut ok = true;
    for (name, arg) in named(args, &PREFERENCE_PARAMS, "@Preference", origin, reporter, &mut ok) {
        let applied = match name {
            "defaultInt" => int(&arg.value).map(|v| out.default_int = v),
            "defaultLong" => long(&arg.value).map(|v| out.default_long = v),
            "defaultFloat" => float(&arg.value).map(|v| out.default_float = v),
            "defaultBoolean" => boolean(&arg.value).map(|v| out.default_boolean = v),
            "defaultString" => string(&arg.value).map(|v| out.default_string = v),
            "key" => string(&arg.value).map(|v| out.key = v),
            "file" => string(&arg.value).map(|v| out.file = v),
            _ => unreachable!("named() only yields declared parameters"),
        };
        if applied.is_none() {
            ok = false;
            reporter.error(invalid_value("@Preference", name, &arg.value), Some(&at(origin, arg.line)));
        }
    }
    if ok { Marker::Preference(out) } else { Marker::Invalid }
}

fn preference_file_args(args: Vec<Arg>, origin: &Origin, reporter: &mut dyn Reporter) -> Marker {
    let mut out = PreferenceFileArgs::default();
    let mut ok = true;
    for (name, arg) in named(args, &PREFERENCE_FILE_PARAMS, "@PreferenceFile", origin, reporter, &mut ok) {
        match string(&arg.value) {
            Some(v) => out.file_name = v,
            None => {
                ok = false;
                reporter.error(invalid_value("@PreferenceFile", name, &arg.value), Some(&at(origin, arg.line)));
            }
        }
    }
    if ok { Marker::PreferenceFile(out) } else { Marker::Invalid }
}

/// Pairs every argument with its parameter name (positional or named),
/// reporting unknown and repeated parameters.
fn named(
    args: Vec<Arg>,
    params: &[&'static str],
    annotation: &str,
    origin: &Origin,
    reporter: &mut dyn Reporter,
    ok: &mut bool,
) -> Vec<(&'static str, Arg)> {
    let mut out: Vec<(&'static str, Arg)> = Vec::new();
    for (index, arg) in args.into_iter().enumerate() {
        let param = match &arg.name {
            Some(name) => params.iter().copied().find(|p| p == name),
            None => params.get(index).copied(),
        };
        let Some(param) = param else {
            *ok = false;
            let what = match &arg.name {
                Some(name) => format!("unknown {annotation} parameter `{name}`"),
                None => format!("too many arguments for {annotation}"),
            };
            reporter.error(what, Some(&at(origin, arg.line)));
            continue;
        };
        if out.iter().any(|(p, _)| *p == param) {
            *ok = false;
            reporter.error(format!("{annotation} parameter `{param}` given twice"), Some(&at(origin, arg.line)));
            continue;
        }
        out.push((param, arg));
    }
    out
}

fn int(value: &Lit) -> Option<i32> {
    match value {
        Lit::Int { value, suffix: None } => i32::try_from(*value).ok(),
        _ => None,
    }
}

/// Unsuffixed literals are widened to `Long` by the expected type.
fn long(value: &Lit) -> Option<i64> {
    match value {
        Lit::Int { value, suffix: None | Some('L') } => i64::try_from(*value).ok(),
        _ => None,
    }
}

/// Only `f`-suffixed literals; Kotlin converts neither `Int` nor `Double` to `Float`.
fn float(value: &Lit) -> Option<f32> {
    match value {
        Lit::Float { value, single: true } => Some(*value as f32).filter(|v| v.is_finite()),
        _ => None,
    }
}

fn boolean(value: &Lit) -> Option<bool> {
    match value {
        Lit::Bool(v) => Some(*v),
        _ => None,
    }
}

fn string(value: &Lit) -> Option<String> {
    match value {
        Lit::Str { value, template: false } => Some(value.clone()),
        _ => None,
    }
}

fn invalid_value(annotation: &str, param: &str, value: &Lit) -> String {
    let found = match value {
        Lit::Str { template: true, .. } => "a string template",
        Lit::Str { .. } => "a string",
        Lit::Int { suffix: Some('L'), .. } => "a Long literal",
        Lit::Int { suffix: Some(_), .. } => "an unsigned literal",
        Lit::Int { .. } => "an integer",
        Lit::Float { single: true, .. } => "a Float literal",
        Lit::Float { .. } => "a Double literal",
        Lit::Bool(_) => "a boolean",
        Lit::Expr => "a non-literal expression",
    };
    format!("invalid value for {annotation}({param}): found {found}, expected a constant of the parameter's type")
}

fn at(origin: &Origin, line: usize) -> Origin {
    Origin { path: origin.path.clone(), line }
}

fn number(lit: &NumLit) -> Lit {
    let single = lit.radix == 10 && matches!(lit.suffix, Some('f' | 'F'));
    if lit.float || single {
        return match lit.digits.parse::<f64>() {
            Ok(value) => Lit::Float { value, single },
            Err(_) => Lit::Expr,
        };
    }
    match i128::from_str_radix(&lit.digits, lit.radix) {
        Ok(value) => Lit::Int { value, suffix: lit.suffix },
        Err(_) => Lit::Expr,
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SCANNER
// ————————————————————————————————————————————————————————————————————————————

/// A `class Name` seen but whose body (if any) has not been entered yet.
#[derive(Debug)]
struct Header {
    name: String,
    /// Paren depth at the `class` keyword; deeper means "inside the primary constructor".
    parens: usize,
}

struct Scanner<'a> {
    path: &'a Path,
    tokens: Vec<Token>,
    pos: usize,
    facade: String,
    /// One entry per open `{`; `Some` for class bodies.
    scopes: Vec<Option<String>>,
    header: Option<Header>,
    parens: usize,
    out: Scanned,
}

impl Scanner<'_> {
    fn run(&mut self, reporter: &mut dyn Reporter) {
        while let Some(token) = self.peek(0).cloned() {
            match &token.tok {
                Tok::Ident(word) if word == "package" && self.scopes.is_empty() => {
                    self.pos += 1;
                    self.out.package = self.dotted_name();
                }
                Tok::Ident(word) if word == "import" => {
                    self.pos += 1;
                    self.dotted_name();
                }
                Tok::Ident(word) if matches!(word.as_str(), "class" | "object" | "interface") => {
                    self.class_header(word == "object");
                }
                Tok::Ident(word) if word == "fun" => {
                    self.end_header_at_depth();
                    self.pos += 1;
                }
                Tok::Ident(word) if word == "val" || word == "var" => {
                    self.end_header_at_depth();
                    self.pos += 1;
                }
                Tok::Punct('@') => self.annotated_declaration(reporter),
                Tok::Punct('(') => {
                    self.parens += 1;
                    self.pos += 1;
                }
                Tok::Punct(')') => {
                    self.parens = self.parens.saturating_sub(1);
                    self.pos += 1;
                }
                Tok::Punct('{') => {
                    let class = match self.header.take() {
                        Some(header) if header.parens == self.parens => Some(header.name),
                        other => {
                            self.header = other;
                            None
                        }
                    };
                    self.scopes.push(class);
                    self.pos += 1;
                }
                Tok::Punct('}') => {
                    self.scopes.pop();
                    self.header = None;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn punct_at(&self, ahead: usize, c: char) -> bool {
        self.peek(ahead).is_some_and(|t| t.is_punct(c))
    }

    fn ident_at(&self, ahead: usize) -> Option<String> {
        self.peek(ahead).and_then(Token::ident).map(str::to_string)
    }

    fn dotted_name(&mut self) -> String {
        let mut parts = Vec::new();
        while let Some(part) = self.ident_at(0) {
            parts.push(part);
            self.pos += 1;
            if self.punct_at(0, '.') && self.ident_at(1).is_some() {
                self.pos += 1;
            } else {
                break;
            }
        }
        parts.join(".")
    }

    fn end_header_at_depth(&mut self) {
        if self.header.as_ref().is_some_and(|h| h.parens == self.parens) {
            self.header = None;
        }
    }

    fn class_header(&mut self, is_object: bool) {
        // `Foo::class` is an expression, not a declaration.
        let is_reference = self.pos >= 2
            && self.tokens[self.pos - 1].is_punct(':')
            && self.tokens[self.pos - 2].is_punct(':');
        let companion = self.pos >= 1 && self.tokens[self.pos - 1].is_ident("companion");
        self.pos += 1;
        if is_reference {
            return;
        }
        let name = match self.ident_at(0) {
            Some(name) => {
                self.pos += 1;
                name
            }
            None if is_object && companion => "Companion".to_string(),
            // anonymous `object : Foo { }` has no class to own its properties
            None => return,
        };
        self.header = Some(Header { name, parens: self.parens });
    }

    /// Simple names of the class a declaration at the current position belongs to.
    fn owner(&self) -> ClassName {
        let mut names: Vec<String> = self.scopes.iter().flatten().cloned().collect();
        if let Some(header) = self.header.as_ref().filter(|h| self.parens > h.parens) {
            names.push(header.name.clone());
        }
        if names.is_empty() {
            names.push(self.facade.clone());
        }
        ClassName::new(self.out.package.clone(), names)
    }

    /// Annotations and modifiers up to the declaration they decorate.
    fn annotated_declaration(&mut self, reporter: &mut dyn Reporter) {
        let mut markers: Vec<Marker> = Vec::new();
        let first_line = self.peek(0).map(|t| t.line).unwrap_or(1);
        loop {
            if self.punct_at(0, '@') {
                if let Some(marker) = self.annotation(reporter) {
                    markers.push(marker);
                }
                continue;
            }
            match self.ident_at(0) {
                Some(word) if MODIFIERS.contains(&word.as_str()) => self.pos += 1,
                _ => break,
            }
        }
        if markers.is_empty() {
            return;
        }
        let is_property = matches!(self.ident_at(0).as_deref(), Some("val" | "var"));
        if !is_property {
            let origin = Origin { path: self.path.to_path_buf(), line: first_line };
            reporter.warning("@Preference/@PreferenceFile ignored: not attached to a property".to_string(), Some(&origin));
            return;
        }
        if self.in_local_scope() {
            let origin = Origin { path: self.path.to_path_buf(), line: first_line };
            reporter.warning("@Preference/@PreferenceFile ignored: local properties have no backing field".to_string(), Some(&origin));
            return;
        }
        self.end_header_at_depth();
        self.pos += 1;
        self.property(markers);
    }

    /// Inside a function, initializer or lambda body rather than a class body
    /// or primary constructor.
    fn in_local_scope(&self) -> bool {
        let in_constructor = self.header.as_ref().is_some_and(|h| self.parens > h.parens);
        matches!(self.scopes.last(), Some(None)) && !in_constructor
    }

    fn property(&mut self, markers: Vec<Marker>) {
        let Some(name_token) = self.peek(0).cloned() else { return };
        let Some(name) = name_token.ident().map(str::to_string) else { return };
        self.pos += 1;
        // extension properties (`val Foo.bar`) have no backing field to annotate
        if self.punct_at(0, '.') {
            return;
        }
        let type_token = if self.punct_at(0, ':') {
            self.pos += 1;
            self.type_ref()
        } else {
            INFERRED_TYPE.to_string()
        };
        let owner = self.owner();
        let origin = Origin { path: self.path.to_path_buf(), line: name_token.line };
        for marker in markers {
            match marker {
                Marker::Preference(args) => self.out.fields.push(AnnotatedField {
                    name: name.clone(),
                    type_token: type_token.clone(),
                    owner: owner.clone(),
                    args,
                    origin: origin.clone(),
                }),
                Marker::PreferenceFile(args) => self.out.wrappers.push(WrapperCandidate {
                    name: name.clone(),
                    owner: owner.clone(),
                    args,
                    origin: origin.clone(),
                }),
                Marker::Invalid => {}
            }
        }
    }

    /// `a.b.C<T, out U>?`, or a parenthesized/function type as raw text.
    fn type_ref(&mut self) -> String {
        if self.punct_at(0, '(') {
            self.skip_balanced('(', ')');
            if self.punct_at(0, '-') && self.punct_at(1, '>') {
                self.pos += 2;
                self.type_ref();
            }
            return "<function>".to_string();
        }
        let mut out = self.dotted_name();
        if self.punct_at(0, '<') {
            self.pos += 1;
            out.push('<');
            loop {
                if self.punct_at(0, '*') {
                    self.pos += 1;
                    out.push('*');
                } else {
                    if let Some(variance) = self.ident_at(0).filter(|w| w == "in" || w == "out") {
                        if self.ident_at(1).is_some() {
                            self.pos += 1;
                            out.push_str(&variance);
                            out.push(' ');
                        }
                    }
                    out.push_str(&self.type_ref());
                }
                if self.punct_at(0, ',') {
                    self.pos += 1;
                    out.push_str(", ");
                    continue;
                }
                if self.punct_at(0, '>') {
                    self.pos += 1;
                }
                break;
            }
            out.push('>');
        }
        if self.punct_at(0, '?') {
            self.pos += 1;
            out.push('?');
        }
        out
    }

    fn skip_balanced(&mut self, open: char, close: char) {
        let mut depth = 0usize;
        while let Some(token) = self.peek(0) {
            if token.is_punct(open) {
                depth += 1;
            } else if token.is_punct(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.pos += 1;
                    return;
                }
            }
            self.pos += 1;
        }
    }

    /// Parses one `@...` annotation. Returns a marker for ours, `None` otherwise.
    fn annotation(&mut self, reporter: &mut dyn Reporter) -> Option<Marker> {
        let line = self.peek(0).map(|t| t.line).unwrap_or(1);
        self.pos += 1;
        // use-site target: `@field:Preference`
        if self.ident_at(0).is_some() && self.punct_at(1, ':') && !self.punct_at(2, ':') {
            self.pos += 2;
        }
        // `@[A B]` annotation groups are never ours
        if self.punct_at(0, '[') {
            self.skip_balanced('[', ']');
            return None;
        }
        let name = self.dotted_name();
        let simple = name.rsplit('.').next().unwrap_or_default().to_string();
        let ours = simple == "Preference" || simple == "PreferenceFile";
        if !self.punct_at(0, '(') {
            return ours.then(|| self.marker(&simple, Vec::new(), line, reporter));
        }
        if !ours {
            self.skip_balanced('(', ')');
            return None;
        }
        match self.arguments(reporter) {
            Some(args) => Some(self.marker(&simple, args, line, reporter)),
            None => Some(Marker::Invalid),
        }
    }

    fn marker(&self, simple: &str, args: Vec<Arg>, line: usize, reporter: &mut dyn Reporter) -> Marker {
        let origin = Origin { path: self.path.to_path_buf(), line };
        if simple == "Preference" {
            preference_args(args, &origin, reporter)
        } else {
            preference_file_args(args, &origin, reporter)
        }
    }

    /// Argument list of one of our annotations, or `None` when it is not
    /// a well-formed `( ... )` (already reported).
    fn arguments(&mut self, reporter: &mut dyn Reporter) -> Option<Vec<Arg>> {
        self.pos += 1; // '('
        let mut args = Vec::new();
        loop {
            let Some(token) = self.peek(0).cloned() else { break };
            if token.is_punct(')') {
                self.pos += 1;
                break;
            }
            if token.is_punct(',') {
                self.pos += 1;
                continue;
            }
            let mut name = None;
            if token.ident().is_some() && self.punct_at(1, '=') && !self.punct_at(2, '=') {
                name = token.ident().map(str::to_string);
                self.pos += 2;
            }
            let line = self.peek(0).map(|t| t.line).unwrap_or(token.line);
            let start = self.pos;
            let value = self.argument_value();
            // a missing value (`key = ,`) still yields `Lit::Expr`; a stray `]`
            // or `}` would stall here. The `}` is left for the scope tracking.
            if self.pos == start && !self.punct_at(0, ',') && !self.punct_at(0, ')') {
                let origin = Origin { path: self.path.to_path_buf(), line };
                reporter.error("malformed annotation arguments: unbalanced brackets".to_string(), Some(&origin));
                if self.punct_at(0, ']') {
                    self.pos += 1;
                }
                return None;
            }
            args.push(Arg { name, value, line });
        }
        Some(args)
    }

    /// One argument expression; anything but a lone literal becomes `Lit::Expr`.
    fn argument_value(&mut self) -> Lit {
        let start = self.pos;
        let negative = self.punct_at(0, '-');
        if negative {
            self.pos += 1;
        }
        let literal = match self.peek(0).map(|t| &t.tok) {
            Some(Tok::Number(lit)) => Some(match number(lit) {
                Lit::Int { value, suffix } if negative => Lit::Int { value: -value, suffix },
                Lit::Float { value, single } if negative => Lit::Float { value: -value, single },
                other => other,
            }),
            Some(Tok::Str { value, template }) if !negative => {
                Some(Lit::Str { value: value.clone(), template: *template })
            }
            Some(Tok::Ident(word)) if !negative && (word == "true" || word == "false") => {
                Some(Lit::Bool(word == "true"))
            }
            _ => None,
        };
        if let Some(literal) = literal {
            self.pos += 1;
            if self.punct_at(0, ',') || self.punct_at(0, ')') {
                return literal;
            }
        }
        self.pos = start;
        self.skip_expression();
        Lit::Expr
    }

    fn skip_expression(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek(0) {
            match token.tok {
                Tok::Punct('(' | '[' | '{') => depth += 1,
                Tok::Punct(')' | ']' | '}') if depth == 0 => return,
                Tok::Punct(')' | ']' | '}') => depth -= 1,
                Tok::Punct(',') if depth == 0 => return,
                _ => {}
            }
            self.pos += 1;
        }
    }
}
