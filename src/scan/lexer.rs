//! Just enough of a Kotlin tokenizer to find annotated declarations.
//!
//! Comments and whitespace are dropped; every token keeps its line so that
//! diagnostics can point back into the source.

use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Ident(String),
    /// String literal with escapes resolved. `template` is set when the
    /// literal contains `$name` / `${...}` interpolation.
    Str { value: String, template: bool },
    Char,
    Number(NumLit),
    Punct(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumLit {
    /// Digits without underscores, radix prefix or suffix.
    pub digits: String,
    pub radix: u32,
    pub float: bool,
    /// `L`, `f`/`F` or `u`/`U`; `uL` is kept as `u`.
    pub suffix: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub line: usize,
}

impl Token {
    pub fn is_punct(&self, c: char) -> bool {
        self.tok == Tok::Punct(c)
    }
    pub fn ident(&self) -> Option<&str> {
        match &self.tok {
            Tok::Ident(name) => Some(name),
            _ => None,
        }
    }
    pub fn is_ident(&self, name: &str) -> bool {
        self.ident() == Some(name)
    }
}

pub fn tokenize(path: &Path, source: &str) -> Result<Vec<Token>> {
    Lexer { path, chars: source.chars().collect(), pos: 0, line: 1 }.run()
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNALS
// ————————————————————————————————————————————————————————————————————————————

struct Lexer<'a> {
    path: &'a Path,
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Token>> {
        let mut out = Vec::new();
        while let Some(c) = self.peek(0) {
            let line = self.line;
            let tok = match c {
                '\n' => {
                    self.bump();
                    continue;
                }
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '/' if self.peek(1) == Some('/') => {
                    self.skip_line_comment();
                    continue;
                }
                '/' if self.peek(1) == Some('*') => {
                    self.skip_block_comment()?;
                    continue;
                }
                '"' => self.string()?,
                '\'' => self.char_literal()?,
                '`' => self.quoted_ident()?,
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                c if c.is_alphabetic() || c == '_' => self.ident(),
                c => {
                    self.bump();
                    Tok::Punct(c)
                }
            };
            out.push(Token { tok, line });
        }
        Ok(out)
    }

    fn peek(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn fail(&self, line: usize, message: &str) -> Error {
        Error::Syntax { path: self.path.to_path_buf(), line, message: message.to_string() }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    // Kotlin block comments nest.
    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.line;
        let mut depth = 0usize;
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.pos += 2;
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                (Some(_), _) => {
                    self.bump();
                }
                (None, _) => return Err(self.fail(start, "unterminated block comment")),
            }
        }
    }

    fn ident(&mut self) -> Tok {
        let mut name = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Tok::Ident(name)
    }

    fn quoted_ident(&mut self) -> Result<Tok> {
        let start = self.line;
        self.bump();
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('`') => return Ok(Tok::Ident(name)),
                Some('\n') | None => return Err(self.fail(start, "unterminated quoted identifier")),
                Some(c) => name.push(c),
            }
        }
    }

    fn number(&mut self) -> Tok {
        let mut lit = NumLit { digits: String::new(), radix: 10, float: false, suffix: None };
        if self.peek(0) == Some('0') {
            match self.peek(1) {
                Some('x' | 'X') => lit.radix = 16,
                Some('b' | 'B') => lit.radix = 2,
                _ => {}
            }
            if lit.radix != 10 {
                self.pos += 2;
            }
        }
        let digit = |c: char, radix: u32| c.is_digit(radix) || c == '_';
        while let Some(c) = self.peek(0).filter(|c| digit(*c, lit.radix)) {
            if c != '_' {
                lit.digits.push(c);
            }
            self.bump();
        }
        if lit.radix == 10 {
            if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                lit.float = true;
                lit.digits.push('.');
                self.bump();
                while let Some(c) = self.peek(0).filter(|c| digit(*c, 10)) {
                    if c != '_' {
                        lit.digits.push(c);
                    }
                    self.bump();
                }
            }
            if matches!(self.peek(0), Some('e' | 'E')) {
                let sign = matches!(self.peek(1), Some('+' | '-'));
                let first = if sign { self.peek(2) } else { self.peek(1) };
                if first.is_some_and(|c| c.is_ascii_digit()) {
                    lit.float = true;
                    lit.digits.push('e');
                    self.bump();
                    if sign {
                        lit.digits.extend(self.bump());
                    }
                    while let Some(c) = self.peek(0).filter(|c| c.is_ascii_digit()) {
                        lit.digits.push(c);
                        self.bump();
                    }
                }
            }
        }
        while let Some(c) = self.peek(0).filter(|c| matches!(c, 'L' | 'f' | 'F' | 'u' | 'U')) {
            if !matches!(lit.suffix, Some('u' | 'U')) {
                lit.suffix = Some(c);
            }
            self.bump();
        }
        Tok::Number(lit)
    }

    fn char_literal(&mut self) -> Result<Tok> {
        let start = self.line;
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some('\'') => return Ok(Tok::Char),
                Some('\n') | None => return Err(self.fail(start, "unterminated character literal")),
                Some(_) => {}
            }
        }
    }

    fn string(&mut self) -> Result<Tok> {
        if self.peek(1) == Some('"') && self.peek(2) == Some('"') {
            return self.raw_string();
        }
        let start = self.line;
        self.bump();
        let mut value = String::new();
        let mut template = false;
        loop {
            match self.bump() {
                Some('"') => return Ok(Tok::Str { value, template }),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('u') => {
                        let hex: String = (0..4).filter_map(|_| self.bump()).collect();
                        let c = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                        match c {
                            Some(c) => value.push(c),
                            None => return Err(self.fail(start, "invalid unicode escape")),
                        }
                    }
                    Some(c) => value.push(c),
                    None => return Err(self.fail(start, "unterminated string literal")),
                },
                Some('$') if self.starts_template() => {
                    template = true;
                    self.skip_template();
                }
                Some('\n') | None => return Err(self.fail(start, "unterminated string literal")),
                Some(c) => value.push(c),
            }
        }
    }

    fn raw_string(&mut self) -> Result<Tok> {
        let start = self.line;
        self.pos += 3;
        let mut value = String::new();
        let mut template = false;
        loop {
            if self.peek(0) == Some('"') && self.peek(1) == Some('"') && self.peek(2) == Some('"') {
                self.pos += 3;
                // `""""` closes with the extra quotes belonging to the content
                while self.peek(0) == Some('"') {
                    value.push('"');
                    self.pos += 1;
                }
                return Ok(Tok::Str { value, template });
            }
            match self.bump() {
                Some('$') if self.starts_template() => {
                    template = true;
                    self.skip_template();
                }
                Some(c) => value.push(c),
                None => return Err(self.fail(start, "unterminated raw string literal")),
            }
        }
    }

    fn starts_template(&self) -> bool {
        self.peek(0).is_some_and(|c| c == '{' || c.is_alphabetic() || c == '_')
    }

    fn skip_template(&mut self) {
        if self.peek(0) == Some('{') {
            let mut depth = 0usize;
            while let Some(c) = self.bump() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        } else {
            while self.peek(0).is_some_and(|c| c.is_alphanumeric() || c == '_') {
                self.bump();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(source: &str) -> Vec<Tok> {
        tokenize(Path::new("T.kt"), source).unwrap().into_iter().map(|t| t.tok).collect()
    }

    fn ident(name: &str) -> Tok {
        Tok::Ident(name.to_string())
    }

    #[test]
    fn skips_nested_comments_and_tracks_lines() {
        let source = "/* outer /* inner */ still */\n// line\nval x";
        let tokens = tokenize(Path::new("T.kt"), source).unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].tok, ident("val"));
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn reads_number_suffixes() {
        let got = toks("2 10L 1.0f 1_000 0x1F .5F 1e3 7uL");
        let lits: Vec<NumLit> = got
            .into_iter()
            .map(|t| match t {
                Tok::Number(n) => n,
                other => panic!("expected number, got {other:?}"),
            })
            .collect();
        assert_eq!(lits[0].digits, "2");
        assert_eq!(lits[1].suffix, Some('L'));
        assert!(lits[2].float && lits[2].suffix == Some('f'));
        assert_eq!(lits[3].digits, "1000");
        assert_eq!((lits[4].radix, lits[4].digits.as_str()), (16, "1F"));
        assert_eq!(lits[5].digits, ".5");
        assert!(lits[6].float);
        assert_eq!(lits[7].suffix, Some('u'));
    }

    #[test]
    fn range_operator_is_not_a_float() {
        let got = toks("1..2");
        assert!(matches!(got[0], Tok::Number(NumLit { float: false, .. })));
        assert_eq!(got[1], Tok::Punct('.'));
        assert_eq!(got[2], Tok::Punct('.'));
    }

    #[test]
    fn resolves_escapes_and_flags_templates() {
        let got = toks(r##""a\"b\n" "hi $name" "${1 + 2}" """raw $x""""##);
        assert_eq!(got[0], Tok::Str { value: "a\"b\n".into(), template: false });
        assert_eq!(got[1], Tok::Str { value: "hi ".into(), template: true });
        assert_eq!(got[2], Tok::Str { value: "".into(), template: true });
        assert_eq!(got[3], Tok::Str { value: "raw \"".into(), template: true });
    }

    #[test]
    fn dollar_without_identifier_is_literal() {
        assert_eq!(toks(r#""$5""#)[0], Tok::Str { value: "$5".into(), template: false });
    }

    #[test]
    fn quoted_identifiers_and_chars() {
        let got = toks("`when` 'x' '\\''");
        assert_eq!(got, vec![ident("when"), Tok::Char, Tok::Char]);
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let err = tokenize(Path::new("Bad.kt"), "val a = \"oops\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }), "{err}");
    }
}
