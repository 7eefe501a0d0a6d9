//! Stringifier and paster (component F).
//!
//! Grounded on the teacher's `functions/def.rs` placeholder handling (the
//! `#`-in-replacement-list bookkeeping) and the `Lexer`'s role as the
//! thing that validates a pasted spelling is really one token.

use crate::{
    error::CoreError,
    lexer::tokenize_single,
    strtab::StrTab,
    token::{join_spellings, spelling, Kind, Payload, Token},
};

/// `#`: stringify an unexpanded argument. Interior whitespace folds to a
/// single space; the result is registered in the string interner.
pub fn stringify(args: &[Token], strtab: &mut StrTab) -> Token {
    let joined = join_spellings(args, strtab);
    let escaped = escape_for_string_literal(&joined);
    let sym = strtab.intern(&format!("\"{escaped}\""));
    Token::new(Kind::String, Payload::Str(sym))
}

fn escape_for_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `##`: paste two tokens' spellings and re-tokenize as one token. Fatal
/// if the tokenizer can't consume the pasted spelling whole. The result
/// inherits the left token's leading whitespace.
pub fn paste(left: &Token, right: &Token, strtab: &mut StrTab) -> Result<Token, CoreError> {
    let combined = format!("{}{}", spelling(left, strtab), spelling(right, strtab));
    let mut result = tokenize_single(&combined, strtab)
        .map_err(|_| CoreError::InvalidPaste(format!("{}' and '{}", spelling(left, strtab), spelling(right, strtab))))?;
    result.ws = left.ws;
    Ok(result)
}

/// Left-to-right fold fusing every `##`-adjacent pair of tokens. Pasting
/// is associative over sequences the tokenizer accepts, so `a ## b ## c`
/// folds the same as pasting `a`, `b`, `c` in one step would.
///
/// `Macro::validate` already rejects a literal `##` at either end of a
/// macro's *unexpanded* replacement list at definition time, so by the
/// time this runs on the *substituted* list, a `##` with no real operand
/// on one side can only be the result of an argument that substituted to
/// zero tokens (a placemarker, in ISO terms). In that case the operator
/// contributes nothing and is simply dropped — pasting `x` with an empty
/// argument yields `x` verbatim, not an error.
pub fn expand_paste_operators(tokens: Vec<Token>, strtab: &mut StrTab) -> Result<Vec<Token>, CoreError> {
    let mut out = Vec::new();
    let mut acc: Option<Token> = None;
    let mut pending_paste = false;

    for tok in tokens {
        if tok.kind == Kind::HashHash {
            pending_paste = true;
            continue;
        }

        match acc.take() {
            Some(left) if pending_paste => acc = Some(paste(&left, &tok, strtab)?),
            Some(left) => {
                out.push(left);
                acc = Some(tok);
            }
            None => acc = Some(tok),
        }
        pending_paste = false;
    }

    if let Some(last) = acc {
        out.push(last);
    }

    Ok(out)
}
