//! `lcc`'s C preprocessor macro engine.
//!
//! Stores macro definitions, performs function-like and object-like macro
//! expansion, handles stringification (`#`) and token pasting (`##`),
//! guards against self-recursive expansion, and registers the standard
//! predefined macros a hosted C compiler needs. See `SPEC_FULL.md` for the
//! full component breakdown; the short version is [`Engine`], which
//! bundles the macro table, the recursion guard, the string interner, and
//! the current source location that `__LINE__`/`__FILE__` read from.

pub mod builtins;
pub mod error;
pub mod expand_stack;
pub mod expander;
pub mod lexer;
pub mod macro_table;
pub mod paste;
pub mod source;
pub mod strtab;
pub mod token;

pub use error::CoreError;
pub use expander::{Engine, EngineLimits};
pub use macro_table::{Macro, MacroForm};
pub use source::SourceContext;
pub use token::{print_list, Token};

/// Tokenize and fully expand one logical line of source, a convenience
/// wrapper around `Engine::expand` for callers (and tests) that don't
/// want to drive the tokenizer themselves. The out-of-scope directive
/// parser is expected to do its own tokenization and logical-line
/// assembly in a real compiler; this exists because the engine can't be
/// exercised end-to-end without *something* producing tokens.
pub fn expand_line(engine: &mut Engine, src: &str) -> Result<Vec<Token>, CoreError> {
    let mut tokenizer = lexer::Tokenizer::new(src);
    let tokens = tokenizer.tokenize_all(&mut engine.strtab)?;
    engine.expand(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_engine() -> Engine {
        let mut engine = Engine::new(SourceContext::new("test.c"), EngineLimits::default());
        engine.register_builtins();
        engine
    }

    fn define_object(engine: &mut Engine, name: &str, body: &str) {
        let mut tokenizer = lexer::Tokenizer::new(body);
        let tokens = tokenizer.tokenize_all(&mut engine.strtab).unwrap();
        let sym = engine.strtab.intern(name);
        engine.define(Macro::new_object(sym, tokens)).unwrap();
    }

    /// Stand-in for the out-of-scope directive parser's job of pre-lowering
    /// formal-parameter occurrences in a replacement list to placeholder
    /// tokens before handing the macro to `define` (§3's Macro lifecycle).
    fn lower_params(tokens: Vec<Token>, params: &[&str], engine: &Engine) -> Vec<Token> {
        tokens
            .into_iter()
            .map(|tok| match tok.str_symbol() {
                Some(sym) => match params.iter().position(|p| engine.strtab.resolve(sym) == *p) {
                    Some(idx) => Token::param(idx).with_ws(tok.ws),
                    None => tok,
                },
                None => tok,
            })
            .collect()
    }

    fn define_function(engine: &mut Engine, name: &str, params: &[&str], body: &str) {
        let mut tokenizer = lexer::Tokenizer::new(body);
        let tokens = tokenizer.tokenize_all(&mut engine.strtab).unwrap();
        let tokens = lower_params(tokens, params, engine);
        let sym = engine.strtab.intern(name);
        engine.define(Macro::new_function(sym, params.len(), tokens)).unwrap();
    }

    #[test]
    fn object_like_macro_expands_at_every_occurrence() {
        let mut engine = new_engine();
        define_object(&mut engine, "X", "42");
        let out = expand_line(&mut engine, "X + X").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "42 + 42");
    }

    #[test]
    fn function_like_macro_substitutes_arguments() {
        let mut engine = new_engine();
        define_function(&mut engine, "F", &["a", "b"], "a+b");

        let out = expand_line(&mut engine, "F(1, 2)").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "1+ 2");
    }

    #[test]
    fn stringify_operator_quotes_unexpanded_argument() {
        let mut engine = new_engine();
        define_function(&mut engine, "STR", &["x"], "#x");

        let out = expand_line(&mut engine, "STR(hello  world)").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(print_list(&out, &engine.strtab), "\"hello world\"");
    }

    #[test]
    fn paste_operator_fuses_argument_halves() {
        let mut engine = new_engine();
        define_function(&mut engine, "CAT", &["a", "b"], "a##b");
        define_object(&mut engine, "foo_bar", "7");

        let out = expand_line(&mut engine, "CAT(foo,_bar)").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "7");
    }

    #[test]
    fn mutually_recursive_macros_expand_exactly_once_along_the_path() {
        let mut engine = new_engine();
        define_object(&mut engine, "A", "B");
        define_object(&mut engine, "B", "A");

        let out = expand_line(&mut engine, "A").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "A");
    }

    #[test]
    fn builtins_report_line_and_file() {
        let mut engine = new_engine();
        engine.source.set_line(10);
        let out = expand_line(&mut engine, "__LINE__ __FILE__").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "10 \"test.c\"");
    }

    #[test]
    fn non_macro_input_round_trips_unchanged() {
        let mut engine = new_engine();
        let out = expand_line(&mut engine, "1 + 2 * 3").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "1 + 2 * 3");
    }

    #[test]
    fn function_like_macro_without_parens_is_left_unexpanded() {
        let mut engine = new_engine();
        let mut tokenizer = lexer::Tokenizer::new("1");
        let tokens = tokenizer.tokenize_all(&mut engine.strtab).unwrap();
        let sym = engine.strtab.intern("F");
        engine.define(Macro::new_function(sym, 0, tokens)).unwrap();

        let out = expand_line(&mut engine, "F").unwrap();
        assert_eq!(print_list(&out, &engine.strtab), "F");
    }

    #[test]
    fn redefining_with_different_body_is_fatal() {
        let mut engine = new_engine();
        define_object(&mut engine, "X", "1");
        let mut tokenizer = lexer::Tokenizer::new("2");
        let tokens = tokenizer.tokenize_all(&mut engine.strtab).unwrap();
        let sym = engine.strtab.intern("X");
        let result = engine.define(Macro::new_object(sym, tokens));
        assert!(matches!(result, Err(CoreError::Redefinition(_))));
    }
}
