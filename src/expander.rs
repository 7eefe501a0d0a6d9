//! The expander (component D) — the driver that walks an input token
//! sequence, finds invocation sites, reads arguments, substitutes, and
//! re-expands the result.
//!
//! Grounded on the teacher's `expand_once`/`expand_tokens` loop in
//! `expander.rs` (pop a token, look up its expansion, splice the result
//! back in, keep going until nothing's left to expand) and its
//! `consume_arg`/`consume_args` paren-nesting argument reader.

use crate::{
    error::CoreError,
    macro_table::{Macro, MacroForm, MacroTable},
    paste::{expand_paste_operators, stringify},
    source::SourceContext,
    strtab::StrTab,
    expand_stack::ExpansionStack,
    token::{Kind, Payload, Token},
};

/// A simple forward cursor over an owned token list — this crate's stand-in
/// for the C source's pointer-advancing `buf`/`endp` pair.
struct TokenCursor {
    tokens: std::vec::IntoIter<Token>,
    peeked: Option<Token>,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> TokenCursor {
        TokenCursor { tokens: tokens.into_iter(), peeked: None }
    }

    fn next(&mut self) -> Option<Token> {
        self.peeked.take().or_else(|| self.tokens.next())
    }

    fn peek(&mut self) -> Option<&Token> {
        if self.peeked.is_none() {
            self.peeked = self.tokens.next();
        }
        self.peeked.as_ref()
    }
}

/// Caps runaway expansion work that the recursion guard alone doesn't
/// catch — deeply nested but legal chains of distinct macros. Analogous
/// to the teacher's `ParserConfig::max_expand`.
#[derive(Debug, Clone, Copy)]
pub struct EngineLimits {
    pub max_expansions: u32,
}

impl Default for EngineLimits {
    fn default() -> EngineLimits {
        EngineLimits { max_expansions: 100_000 }
    }
}

/// The macro-expansion context: table, recursion guard, string interner,
/// source location, and the expansion budget, bundled into one value
/// instead of process-wide globals (§9's redesign note).
pub struct Engine {
    pub table: MacroTable,
    pub strtab: StrTab,
    pub source: SourceContext,
    stack: ExpansionStack,
    limits: EngineLimits,
    expansion_count: u32,
}

impl Engine {
    pub fn new(source: SourceContext, limits: EngineLimits) -> Engine {
        Engine {
            table: MacroTable::new(),
            strtab: StrTab::new(),
            source,
            stack: ExpansionStack::new(),
            limits,
            expansion_count: 0,
        }
    }

    pub fn register_builtins(&mut self) {
        crate::builtins::register_builtin_definitions(&mut self.table, &mut self.strtab);
    }

    pub fn define(&mut self, m: Macro) -> Result<(), CoreError> {
        self.table.define(m, &self.strtab)
    }

    pub fn undef_name(&mut self, name: &str) {
        let sym = self.strtab.intern(name);
        self.table.undef(sym);
    }

    /// `expand(list) -> list`: the top-level entry point. The expansion
    /// stack is empty on entry and on exit (invariant 3 in §8).
    pub fn expand(&mut self, input: Vec<Token>) -> Result<Vec<Token>, CoreError> {
        debug_assert!(self.stack.is_empty(), "expansion stack was not empty at top-level entry");
        let result = self.expand_inner(input);
        debug_assert!(self.stack.is_empty(), "expansion stack was not empty at top-level exit");
        result
    }

    fn expand_inner(&mut self, input: Vec<Token>) -> Result<Vec<Token>, CoreError> {
        // Fast path (§4.D): nothing in the input resolves to a
        // non-guarded macro, so return it unchanged with no allocation.
        if !self.contains_expandable(&input) {
            return Ok(input);
        }

        let mut cursor = TokenCursor::new(input);
        let mut output = Vec::new();

        while let Some(tok) = cursor.next() {
            if tok.kind != Kind::Ident {
                output.push(tok);
                continue;
            }

            let Some(name) = tok.str_symbol() else {
                output.push(tok);
                continue;
            };

            if self.stack.contains(name) || !self.table.contains(name) {
                output.push(tok);
                continue;
            }

            let def = self.table.definition(name, &self.source, &mut self.strtab).expect("checked contains above");

            let is_invocation = match def.form {
                MacroForm::Object => true,
                MacroForm::Function { .. } => cursor.peek().map(|n| n.kind == Kind::LParen).unwrap_or(false),
            };

            if !is_invocation {
                output.push(tok);
                continue;
            }

            let ws = tok.ws;
            let args = self.read_args(&mut cursor, &def)?;
            let mut replaced = self.expand_macro(&def, args)?;
            if let Some(first) = replaced.first_mut() {
                first.ws = ws;
            }
            output.extend(replaced.drain(..));
        }

        Ok(output)
    }

    /// Whether any token in `list` is bound to a macro not currently
    /// blocked by the recursion guard — used only for the fast path, so
    /// it must not mutate `__LINE__`/`__FILE__` the way `definition` does.
    fn contains_expandable(&self, list: &[Token]) -> bool {
        list.iter().any(|t| {
            t.kind == Kind::Ident
                && t.str_symbol().map(|s| self.table.contains(s) && !self.stack.contains(s)).unwrap_or(false)
        })
    }

    /// `read_args`: empty for object-like macros. For function-like,
    /// consume `(`, read one argument per formal parameter, terminated by
    /// `)`.
    fn read_args(&mut self, cursor: &mut TokenCursor, def: &Macro) -> Result<Vec<Vec<Token>>, CoreError> {
        let params = match def.form {
            MacroForm::Object => return Ok(Vec::new()),
            MacroForm::Function { params } => params,
        };

        let lparen = cursor.next().ok_or(CoreError::TruncatedInvocation)?;
        if lparen.kind != Kind::LParen {
            return Err(CoreError::MalformedInvocation("expected '(' to begin macro invocation".into()));
        }

        if params == 0 {
            let rparen = cursor.next().ok_or(CoreError::TruncatedInvocation)?;
            if rparen.kind != Kind::RParen {
                return Err(CoreError::MalformedInvocation("expected ')' closing a zero-argument invocation".into()));
            }
            return Ok(Vec::new());
        }

        let mut args = Vec::with_capacity(params);
        for i in 0..params {
            let (toks, terminator) = self.read_arg(cursor)?;
            let is_last = i + 1 == params;
            if is_last && terminator != Kind::RParen {
                return Err(CoreError::MalformedInvocation("expected ')' closing macro invocation".into()));
            }
            if !is_last && terminator != Kind::Comma {
                return Err(CoreError::MalformedInvocation("expected ',' between macro arguments".into()));
            }
            args.push(toks);
        }

        Ok(args)
    }

    /// Read one argument, tracking parenthesis nesting: `(` increments,
    /// `)` decrements. The argument terminates when nesting is zero and
    /// the next token is `,` or `)`; that terminator is consumed and
    /// returned (but not included in the argument's tokens).
    fn read_arg(&mut self, cursor: &mut TokenCursor) -> Result<(Vec<Token>, Kind), CoreError> {
        let mut depth: i32 = 0;
        let mut out = Vec::new();

        loop {
            let tok = cursor.next().ok_or(CoreError::TruncatedInvocation)?;
            match tok.kind {
                Kind::Eof => return Err(CoreError::TruncatedInvocation),
                Kind::LParen => {
                    depth += 1;
                    out.push(tok);
                }
                Kind::RParen if depth == 0 => return Ok((out, Kind::RParen)),
                Kind::RParen => {
                    depth -= 1;
                    out.push(tok);
                }
                Kind::Comma if depth == 0 => return Ok((out, Kind::Comma)),
                _ => out.push(tok),
            }
        }
    }

    /// `expand_macro`: push the macro on the recursion guard, substitute
    /// parameters (re-`expand`ing each argument, or stringifying it when
    /// preceded by `#`), fold `##` operators, recursively `expand` the
    /// whole result, pop the guard, return.
    fn expand_macro(&mut self, def: &Macro, args: Vec<Vec<Token>>) -> Result<Vec<Token>, CoreError> {
        self.stack.push(def.name);

        let substituted = self.substitute(def, &args);
        let substituted = substituted.and_then(|toks| expand_paste_operators(toks, &mut self.strtab));

        let result = substituted.and_then(|toks| {
            self.expansion_count += 1;
            if self.expansion_count > self.limits.max_expansions {
                return Err(CoreError::MalformedInvocation("exceeded the maximum expansion count".into()));
            }
            self.expand_inner(toks)
        });

        self.stack.pop();
        result
    }

    fn substitute(&mut self, def: &Macro, args: &[Vec<Token>]) -> Result<Vec<Token>, CoreError> {
        let mut out = Vec::with_capacity(def.replacement.len());
        let mut i = 0;

        while i < def.replacement.len() {
            let tok = &def.replacement[i];

            if tok.kind == Kind::Hash {
                let next = def.replacement.get(i + 1).ok_or(CoreError::IncompletePlaceholder)?;
                let Payload::Param(idx) = next.payload else {
                    return Err(CoreError::IncompletePlaceholder);
                };
                let arg = args.get(idx).ok_or(CoreError::InvalidArgumentNumber)?;
                out.push(stringify(arg, &mut self.strtab));
                i += 2;
                continue;
            }

            if let Payload::Param(idx) = tok.payload {
                let arg = args.get(idx).ok_or(CoreError::InvalidArgumentNumber)?.clone();
                let expanded = self.expand_inner(arg)?;
                out.extend(expanded);
                i += 1;
                continue;
            }

            out.push(*tok);
            i += 1;
        }

        Ok(out)
    }
}
