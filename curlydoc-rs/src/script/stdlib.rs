//! The standard library, written in the document language itself.
//!
//! The source is baked into the binary at compile time via `include_str!()`
//! and evaluated once per interpreter, right after the natives are
//! registered.  Its definitions live in the contexts just above the root and
//! survive [`Interpreter::reset`].

use tracing::debug;

use super::interp::Interpreter;
use crate::error::{ErrorKind, EvalResult};
use crate::reader;

/// File name used for diagnostics raised while loading the library.
pub const STDLIB_FILE: &str = "<stdlib>";

/// Library source.
pub const STDLIB_SOURCE: &str = include_str!("../../../lib/cud/stdlib.cud");

/// Names the library defines.
pub const STDLIB_NAMES: &[&str] = &[
    "is_empty", "first", "last", "rest", "has_prm", "get_prm", "get_args",
];

/// Parse and evaluate the library into `interp`'s context stack.
pub(crate) fn install(interp: &mut Interpreter) -> EvalResult<()> {
    let forest = reader::parse(STDLIB_SOURCE).map_err(|source| ErrorKind::Parse {
        file: STDLIB_FILE.to_owned(),
        source,
    })?;
    let produced = interp.eval_in_file(STDLIB_FILE, &forest)?;
    debug!(
        contexts = interp.contexts().len(),
        output = produced.len(),
        "standard library loaded"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::write_forest;

    fn run(src: &str) -> EvalResult<String> {
        Interpreter::new().unwrap().eval_source(src).map(|f| write_forest(&f))
    }

    #[test]
    fn library_produces_no_output_and_defines_every_name() {
        let interp = Interpreter::new().unwrap();
        let contexts = interp.contexts();
        for name in STDLIB_NAMES {
            assert!(
                contexts.try_find(contexts.top(), name).value.is_some(),
                "{name} is not defined"
            );
        }
        let forest = reader::parse(STDLIB_SOURCE).unwrap();
        let mut fresh = Interpreter::with_config(crate::Config::new().with_stdlib(false)).unwrap();
        assert!(fresh.eval_preserving(&forest).unwrap().is_empty());
    }

    // ── Sequence helpers ──────────────────────────────────────────────────────

    #[test]
    fn first_last_rest() {
        assert_eq!(run("first{a b c}").unwrap(), "a");
        assert_eq!(run("last{a b c}").unwrap(), "c");
        assert_eq!(run("rest{a b c}").unwrap(), "b c");
        assert_eq!(run("rest{a}").unwrap(), "");
        assert_eq!(run("rest{not{x}}").unwrap(), "");
    }

    #[test]
    fn first_of_nothing_is_out_of_bounds() {
        let err = Interpreter::new().unwrap().eval_source("first{not{x}}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexOutOfBounds { index: 0, size: 0 });
        assert_eq!(err.trail[0].text, "at");
        assert_eq!(err.trail.last().unwrap().file, "<input>");
    }

    #[test]
    fn is_empty() {
        assert_eq!(run("is_empty{not{x}}").unwrap(), "true");
        assert_eq!(run("is_empty{a}").unwrap(), "");
    }

    // ── Named parameters ──────────────────────────────────────────────────────

    #[test]
    fn prm_record_is_split_from_arguments() {
        let src = "has_prm{prm{alt{x}} a b}";
        assert_eq!(run(src).unwrap(), "true");
        assert_eq!(run("get_prm{prm{alt{x} url{y}} a b}").unwrap(), "alt{x} url{y}");
        assert_eq!(run("get_args{prm{alt{x}} a b}").unwrap(), "a b");
    }

    #[test]
    fn without_prm_record() {
        assert_eq!(run("has_prm{a b}").unwrap(), "");
        assert_eq!(run("get_prm{a b}").unwrap(), "");
        assert_eq!(run("get_args{a b}").unwrap(), "a b");
        assert_eq!(run("has_prm{not{x}}").unwrap(), "");
    }

    #[test]
    fn bare_prm_word_is_an_ordinary_argument() {
        assert_eq!(run("has_prm{prm a b}").unwrap(), "");
        assert_eq!(run("get_prm{prm a b}").unwrap(), "");
        assert_eq!(run("get_args{prm a b}").unwrap(), "prm a b");
    }

    #[test]
    fn user_macro_with_named_parameters() {
        let src = "
            defs{ link{
                a{ get{href get_prm{$ {@}}} get_args{$ {@}} }
            } }
            link{prm{href{x.html}} click here}
        ";
        let mut interp = Interpreter::with_natives(crate::Config::new(), |reg| {
            reg.register("a", |interp, args| {
                Ok(vec![crate::tree::Node::call("a", interp.eval(args)?)])
            })
        })
        .unwrap();
        let out = interp.eval_source(src).unwrap();
        assert_eq!(write_forest(&out), "a{x.html click here}");
    }

    #[test]
    fn user_definitions_may_shadow_library_names() {
        assert_eq!(run("defs{first{mine}} first{a b}").unwrap(), "mine");
    }
}
