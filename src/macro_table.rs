//! The macro table (component A).
//!
//! Grounded on the teacher's `Macros<V>` — a hashed mapping from name to
//! stored value — generalized from KaTeX's split back-slash/letter maps to
//! the single `HashMap<Symbol, Macro>` a C identifier namespace needs, and
//! owned by an [`crate::Engine`] instead of a process-wide global (per
//! §9's redesign note).

use std::collections::HashMap;

use crate::{
    error::CoreError,
    source::SourceContext,
    strtab::{StrTab, Symbol},
    token::{list_tok_cmp, Kind, Number, Payload, Token},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroForm {
    Object,
    Function { params: usize },
}

impl MacroForm {
    pub fn param_count(&self) -> usize {
        match self {
            MacroForm::Object => 0,
            MacroForm::Function { params } => *params,
        }
    }

    pub fn is_function_like(&self) -> bool {
        matches!(self, MacroForm::Function { .. })
    }
}

/// A macro definition. Formal parameters in `replacement` are pre-lowered
/// to `Kind::Param` placeholder tokens by whoever constructs the `Macro`
/// (the out-of-scope directive parser, or `builtins.rs` for built-ins).
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: Symbol,
    pub form: MacroForm,
    pub replacement: Vec<Token>,
}

impl Macro {
    pub fn new_object(name: Symbol, replacement: Vec<Token>) -> Macro {
        Macro { name, form: MacroForm::Object, replacement }
    }

    pub fn new_function(name: Symbol, params: usize, replacement: Vec<Token>) -> Macro {
        Macro { name, form: MacroForm::Function { params }, replacement }
    }

    /// Token-by-token identity, used to decide whether a redefinition is
    /// actually a conflict.
    fn same_definition_as(&self, other: &Macro) -> bool {
        self.form == other.form && list_tok_cmp(&self.replacement, &other.replacement)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if let Some(first) = self.replacement.first() {
            if first.kind == Kind::HashHash {
                return Err(CoreError::DanglingPaste);
            }
        }
        if let Some(last) = self.replacement.last() {
            if last.kind == Kind::HashHash {
                return Err(CoreError::DanglingPaste);
            }
        }
        for tok in &self.replacement {
            if let Payload::Param(idx) = tok.payload {
                if idx >= self.form.param_count() {
                    return Err(CoreError::InvalidArgumentNumber);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<Symbol, Macro>,
    line_sym: Option<Symbol>,
    file_sym: Option<Symbol>,
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable::default()
    }

    pub(crate) fn set_dynamic_names(&mut self, line_sym: Symbol, file_sym: Symbol) {
        self.line_sym = Some(line_sym);
        self.file_sym = Some(file_sym);
    }

    /// Pure existence check, with no `__LINE__`/`__FILE__` mutation —
    /// used by the expander's fast path (§4.D), which only needs to know
    /// *whether* a token is macro-bound, not its current value.
    pub fn contains(&self, name: Symbol) -> bool {
        self.macros.contains_key(&name)
    }

    /// Returns a clone of the macro bound to `name`, patching `__LINE__`
    /// and `__FILE__`'s stored replacement token from `ctx` first.
    pub fn definition(&mut self, name: Symbol, ctx: &SourceContext, strtab: &mut StrTab) -> Option<Macro> {
        if Some(name) == self.line_sym {
            if let Some(m) = self.macros.get_mut(&name) {
                if let Some(tok) = m.replacement.first_mut() {
                    tok.payload = Payload::Num(Number::signed(ctx.current_line() as i64));
                }
            }
        } else if Some(name) == self.file_sym {
            if let Some(m) = self.macros.get_mut(&name) {
                if let Some(tok) = m.replacement.first_mut() {
                    let sym = strtab.intern(&format!("\"{}\"", ctx.current_file()));
                    tok.payload = Payload::Str(sym);
                }
            }
        }

        self.macros.get(&name).cloned()
    }

    /// Insert `m`. Fatal if a conflicting definition already exists;
    /// silently drops `m` if an identical one is already present
    /// (invariant 2 in §8: re-defining identically must not leak or
    /// change behavior).
    pub fn define(&mut self, m: Macro, strtab: &StrTab) -> Result<(), CoreError> {
        m.validate()?;

        if let Some(existing) = self.macros.get(&m.name) {
            if existing.same_definition_as(&m) {
                return Ok(());
            }
            let name = strtab.resolve(m.name).to_string();
            return Err(CoreError::Redefinition(name));
        }

        self.macros.insert(m.name, m);
        Ok(())
    }

    /// Remove any binding for `name`. Silently succeeds if absent.
    pub fn undef(&mut self, name: Symbol) {
        self.macros.remove(&name);
    }
}
