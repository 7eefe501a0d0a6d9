//! The tokenizer (§6's "Tokenizer" collaborator).
//!
//! Out of scope per the engine's own contract, but implemented here anyway
//! — in narrow form — because neither the expander nor the paster can be
//! exercised without something producing and re-tokenizing real tokens.
//! Grounded on the teacher's regex-driven, position-advancing `Lexer`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::CoreError,
    strtab::StrTab,
    token::{Kind, Number, NumberType, Payload, Token, Width},
};

static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"^(?P<ws>[ \t]+)"#,
        r#"|^(?P<newline>\r\n|\n)"#,
        r#"|^(?P<ident>[A-Za-z_][A-Za-z0-9_]*)"#,
        r#"|^(?P<number>[0-9]+(?:[uUlL]{0,2})?)"#,
        r#"|^(?P<string>"(?:\\.|[^"\\])*")"#,
        r#"|^(?P<hashhash>##)"#,
        r#"|^(?P<punct>[#(),])"#,
        r#"|^(?P<other>[+\-*/%=<>!&|^~.;:\[\]{}?])"#,
    ))
    .unwrap()
});

/// Reads one token at a time from a source buffer, tracking the
/// leading-whitespace count and the logical source line (for `__LINE__`).
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Tokenizer<'a> {
        Tokenizer { input, pos: 0, line: 1 }
    }

    pub fn current_line(&self) -> u32 {
        self.line
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Number of bytes consumed so far. Used by the paster to verify a
    /// pasted spelling was consumed in full by a single token.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// `tokenize(buf, &endp) -> token`: read one token, advancing past it.
    pub fn tokenize(&mut self, strtab: &mut StrTab) -> Result<Token, CoreError> {
        let mut leading_ws = 0u32;
        loop {
            if self.at_eof() {
                return Ok(Token::eof());
            }

            let rest = &self.input[self.pos..];
            let caps = TOKEN_REGEX
                .captures(rest)
                .ok_or_else(|| CoreError::UnexpectedChar(self.pos, rest.chars().next().unwrap()))?;

            if let Some(m) = caps.name("ws") {
                self.pos += m.end();
                leading_ws += m.as_str().chars().filter(|c| *c == ' ').count() as u32;
                continue;
            }
            if let Some(m) = caps.name("newline") {
                self.pos += m.end();
                self.line += 1;
                return Ok(Token { kind: Kind::Newline, payload: Payload::Num(Number::signed(0)), ws: leading_ws });
            }

            if let Some(m) = caps.name("ident") {
                let text = m.as_str();
                self.pos += text.len();
                let sym = strtab.intern(text);
                return Ok(Token::new(Kind::Ident, Payload::Str(sym)).with_ws(leading_ws));
            }
            if let Some(m) = caps.name("number") {
                let text = m.as_str();
                self.pos += text.len();
                return Ok(Token::new(Kind::Number, Payload::Num(parse_number(text))).with_ws(leading_ws));
            }
            if let Some(m) = caps.name("string") {
                let text = m.as_str();
                self.pos += text.len();
                let sym = strtab.intern(text);
                return Ok(Token::new(Kind::String, Payload::Str(sym)).with_ws(leading_ws));
            }
            if let Some(m) = caps.name("hashhash") {
                self.pos += m.end();
                let sym = strtab.intern("##");
                return Ok(Token::punct(Kind::HashHash, sym).with_ws(leading_ws));
            }
            if let Some(m) = caps.name("punct") {
                let text = m.as_str();
                self.pos += text.len();
                let kind = match text {
                    "#" => Kind::Hash,
                    "(" => Kind::LParen,
                    ")" => Kind::RParen,
                    "," => Kind::Comma,
                    _ => unreachable!(),
                };
                let sym = strtab.intern(text);
                return Ok(Token::punct(kind, sym).with_ws(leading_ws));
            }
            if let Some(m) = caps.name("other") {
                let text = m.as_str();
                self.pos += text.len();
                let sym = strtab.intern(text);
                return Ok(Token::new(Kind::Punct, Payload::Str(sym)).with_ws(leading_ws));
            }

            unreachable!("token regex matched but no named group was populated");
        }
    }

    /// Tokenize the entire remaining input. Used by callers assembling a
    /// logical line to hand to `Engine::expand`.
    pub fn tokenize_all(&mut self, strtab: &mut StrTab) -> Result<Vec<Token>, CoreError> {
        let mut out = Vec::new();
        loop {
            let tok = self.tokenize(strtab)?;
            if tok.is_eof() {
                break;
            }
            if tok.kind == Kind::Newline {
                continue;
            }
            out.push(tok);
        }
        Ok(out)
    }
}

fn parse_number(text: &str) -> Number {
    let (digits, suffix) = text
        .find(|c: char| c == 'u' || c == 'U' || c == 'l' || c == 'L')
        .map(|i| text.split_at(i))
        .unwrap_or((text, ""));
    let value: i64 = digits.parse().unwrap_or(0);
    let unsigned = suffix.to_ascii_lowercase().contains('u');
    let long = suffix.to_ascii_lowercase().contains('l');
    let width = if long { Width::W64 } else { Width::W32 };
    let ty = if unsigned { NumberType::Unsigned(width) } else { NumberType::Signed(width) };
    Number { ty, value }
}

/// Re-tokenize a single spelling (used by the paster). Returns an error if
/// zero or more than one token, or a trailing remainder, results.
pub fn tokenize_single(text: &str, strtab: &mut StrTab) -> Result<Token, CoreError> {
    let mut tokenizer = Tokenizer::new(text);
    let tok = tokenizer.tokenize(strtab)?;
    if tok.is_eof() || tokenizer.consumed() != text.len() {
        return Err(CoreError::InvalidPaste(text.to_string()));
    }
    // Ensure there isn't a second token hiding after it (e.g. "a b").
    let trailing = tokenizer.tokenize(strtab)?;
    if !trailing.is_eof() {
        return Err(CoreError::InvalidPaste(text.to_string()));
    }
    Ok(tok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> (Vec<Token>, StrTab) {
        let mut tab = StrTab::new();
        let mut lexer = Tokenizer::new(src);
        let tokens = lexer.tokenize_all(&mut tab).unwrap();
        (tokens, tab)
    }

    #[test]
    fn lexes_identifier_and_punct() {
        let (tokens, tab) = lex_all("F(1, 2)");
        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens[0].kind, Kind::Ident);
        assert_eq!(tab.resolve(tokens[0].str_symbol().unwrap()), "F");
        assert_eq!(tokens[1].kind, Kind::LParen);
        assert_eq!(tokens[2].kind, Kind::Number);
        assert_eq!(tokens[3].kind, Kind::Comma);
        assert_eq!(tokens[4].kind, Kind::Number);
        assert!(tokens[4].ws > 0);
        assert_eq!(tokens[5].kind, Kind::RParen);
    }

    #[test]
    fn lexes_hash_and_hashhash_distinctly() {
        let (tokens, _tab) = lex_all("a##b #c");
        assert_eq!(tokens[1].kind, Kind::HashHash);
        assert_eq!(tokens[3].kind, Kind::Hash);
    }

    #[test]
    fn tracks_line_number_across_newlines() {
        let mut tab = StrTab::new();
        let mut lexer = Tokenizer::new("a\nb\nc");
        assert_eq!(lexer.current_line(), 1);
        lexer.tokenize(&mut tab).unwrap(); // a
        lexer.tokenize(&mut tab).unwrap(); // newline
        assert_eq!(lexer.current_line(), 2);
    }
}
