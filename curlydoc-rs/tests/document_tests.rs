/// End-to-end document tests: evaluate whole documents through the public
/// API (and the `cud2html` binary) and check the evaluated forest, the
/// rendered HTML, or the reported error.
use std::cell::Cell;
use std::fs;
use std::process::Command;
use std::rc::Rc;

use curlydoc::config::{Config, DEFAULT_MAX_DEPTH};
use curlydoc::error::ErrorKind;
use curlydoc::html::to_html;
use curlydoc::script::{fs_loader, memory_loader, Interpreter};
use curlydoc::tree::{write_forest, Forest};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn eval(src: &str) -> String {
    let mut interp = Interpreter::new().unwrap();
    write_forest(&interp.eval_source(src).unwrap())
}

fn html(src: &str) -> String {
    let mut interp = Interpreter::new().unwrap();
    to_html(&interp.eval_source(src).unwrap()).unwrap()
}

/// An interpreter with a `mark{..}` native that counts how often it runs.
fn with_marker() -> (Interpreter, Rc<Cell<usize>>) {
    let hits = Rc::new(Cell::new(0));
    let counter = hits.clone();
    let interp = Interpreter::with_natives(Config::new(), move |reg| {
        reg.register("mark", move |_, _| {
            counter.set(counter.get() + 1);
            Ok(Forest::new())
        })
    })
    .unwrap();
    (interp, hits)
}

/// Deep evaluations recurse once per level; give them room in debug builds.
fn run_with_large_stack<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .expect("failed to spawn test thread with larger stack")
        .join()
        .expect("test thread panicked");
}

/// Path to the `cud2html` binary built by this workspace.
fn binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_cud2html"))
}

// ── Evaluation ────────────────────────────────────────────────────────────────

#[test]
fn defined_variable_is_visible_to_later_siblings() {
    assert_eq!(eval("defs{x{hello}} $ {x}"), "hello");
}

#[test]
fn for_concatenates_in_order() {
    assert_eq!(eval("for{i{a b c} $ {i}}"), "a b c");
}

#[test]
fn indexing_and_slicing() {
    assert_eq!(eval("at{-1 a b c}"), "c");
    assert_eq!(eval("slice{1 end a b c}"), "b c");
    assert_eq!(eval("slice{1 2 a b c}"), "b");
    let err = Interpreter::new().unwrap().eval_source("at{3 a b c}").unwrap_err();
    assert_eq!(err.kind, ErrorKind::IndexOutOfBounds { index: 3, size: 3 });
}

#[test]
fn structural_equality() {
    assert_eq!(eval("eq{a a}"), "true");
    assert_eq!(eval("eq{a b}"), "");
}

#[test]
fn false_condition_never_evaluates_then_branch() {
    let (mut interp, hits) = with_marker();
    let out = interp.eval_source("if{not{x}} then{mark{x} x} else{y}").unwrap();
    assert_eq!(write_forest(&out), "y");
    assert_eq!(hits.get(), 0);

    // Empty braces read as a plain word, leaving the chain false.
    let out = interp.eval_source("if{} then{mark{x} x} else{y}").unwrap();
    assert_eq!(write_forest(&out), "if y");
    assert_eq!(hits.get(), 0);
}

#[test]
fn empty_if_leaves_the_open_chain_in_charge() {
    assert_eq!(eval("if{x} then{a} if{} then{x} else{y}"), "a if x");
    assert_eq!(eval("if{not{x}} then{a} if{} then{x} else{y}"), "if y");
}

#[test]
fn and_or_short_circuit() {
    let (mut interp, hits) = with_marker();
    interp.eval_source("if{not{x}} and{mark{x}} then{a}").unwrap();
    interp.eval_source("if{x} or{mark{x}} then{a}").unwrap();
    interp.eval_source("if{x} or{y} and{mark{x}} then{a}").unwrap();
    assert_eq!(hits.get(), 0);

    interp.eval_source("if{x} and{mark{x}} then{a}").unwrap();
    interp.eval_source("if{not{x}} or{mark{x}} then{a}").unwrap();
    assert_eq!(hits.get(), 2);
}

#[test]
fn rebinding_in_same_block_fails_but_shadowing_succeeds() {
    let err = Interpreter::new()
        .unwrap()
        .eval_source("defs{x{1} x{2}}")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateBinding("x".into()));
    assert_eq!(eval("defs{x{1}} for{i{z} defs{x{2}} $ {x}} $ {x}"), "2 1");
}

#[test]
fn macros_close_over_their_definition_context() {
    let src = "
        defs{ who{author} greet{hello $ {who}} }
        defs{ run{ defs{who{caller}} greet{} greet{x} } }
        run{go}
    ";
    assert_eq!(eval(src), "greet hello author");
}

#[test]
fn deep_failure_lists_every_call_site() {
    let src = "defs{ m{\n  if{x}\n  then{\n    for{i{a}\n      $ {nope}}}}}\nm{go}";
    let err = Interpreter::new().unwrap().eval_source(src).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedVariable("nope".into()));
    let lines: Vec<(&str, usize)> = err.trail.iter().map(|f| (f.text.as_str(), f.line)).collect();
    assert_eq!(lines, vec![("$", 5), ("for", 4), ("then", 3), ("m", 6)]);

    let message = err.to_string();
    assert!(message.starts_with("variable 'nope' not found"));
    assert!(message.contains("<input>:5:7: $"));
    assert!(message.contains("<input>:6:1: m"));
}

#[test]
fn runaway_recursion_is_an_error() {
    let mut interp = Interpreter::with_config(Config::new().with_max_depth(64)).unwrap();
    let err = interp.eval_source("defs{f{f{x}}} f{x}").unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit(64));
    assert_eq!(write_forest(&interp.eval_source("first{ok}").unwrap()), "ok");
}

#[test]
fn default_limit_admits_long_recursive_walks() {
    run_with_large_stack(|| {
        let items: Vec<String> = (0..100).map(|n| format!("w{n}")).collect();
        let src = format!(
            "defs{{down{{if{{$ {{@}}}} then{{size{{$ {{@}}}} down{{slice{{1 end $ {{@}}}}}}}}}}}} down{{{}}}",
            items.join(" ")
        );
        let out = eval(&src);
        let expected: Vec<String> = (1..=100).rev().map(|n| n.to_string()).collect();
        assert_eq!(out, expected.join(" "));
    });
}

#[test]
fn default_limit_admits_deep_markup() {
    run_with_large_stack(|| {
        let src = "b{".repeat(300) + "x" + &"}".repeat(300);
        assert_eq!(eval(&src), src);
    });
}

#[test]
fn default_limit_still_stops_runaway_recursion() {
    run_with_large_stack(|| {
        let err = Interpreter::new()
            .unwrap()
            .eval_source("defs{f{f{x}}} f{x}")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecursionLimit(DEFAULT_MAX_DEPTH));
    });
}

#[test]
fn deeply_nested_include_is_a_parse_error() {
    let deep = "{".repeat(100_000) + &"}".repeat(100_000);
    let mut interp = Interpreter::new()
        .unwrap()
        .with_file_loader(memory_loader([("deep.cud", deep.as_str())]));
    let err = interp.eval_source("include{deep.cud}").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse { ref file, .. } if file == "deep.cud"));
}

// ── Include ───────────────────────────────────────────────────────────────────

#[test]
fn include_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("parts")).unwrap();
    fs::write(dir.path().join("parts/defs.cud"), "defs{title{Report}}").unwrap();
    fs::write(
        dir.path().join("parts/body.cud"),
        "include{defs.cud} p{$ {title} body}",
    )
    .unwrap();
    let main = dir.path().join("main.cud");

    let mut interp =
        Interpreter::with_config(Config::new().with_root_file(main.to_string_lossy()))
            .unwrap()
            .with_file_loader(fs_loader());
    let out = interp
        .eval_source("include{parts/body.cud} h1{$ {title}}")
        .unwrap();
    assert_eq!(write_forest(&out), "p{Report body} h1{Report}");
}

#[test]
fn include_error_trail_names_both_files() {
    let mut interp = Interpreter::with_config(Config::new().with_root_file("book/main.cud"))
        .unwrap()
        .with_file_loader(memory_loader([("book/ch1.cud", "p{fine}\nbroken{x}")]));
    let err = interp.eval_source("\n\ninclude{ch1.cud}").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownCallee("broken".into()));
    assert_eq!(
        (err.trail[0].file.as_str(), err.trail[0].line),
        ("book/ch1.cud", 2)
    );
    assert_eq!(
        (err.trail[1].file.as_str(), err.trail[1].line),
        ("book/main.cud", 3)
    );
}

// ── Rendering ─────────────────────────────────────────────────────────────────

#[test]
fn paragraph_renders() {
    assert_eq!(html("p{hello world!}"), "<p>hello world!</p>");
}

#[test]
fn macros_expand_before_rendering() {
    let src = "
        defs{ em{ i{$ {@}} } }
        h1{Intro}
        p{Some em{emphasised} text.}
        list{ for{n{one two} {$ {n}}} }
    ";
    assert_eq!(
        html(src),
        "<h1>Intro</h1>\n<p>Some <i>emphasised</i> text.</p>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>"
    );
}

#[test]
fn spacing_survives_macro_expansion() {
    let src = "defs{ em{ i{$ {@}} } } p{Some em{x} text} p{Some i{x} text}";
    assert_eq!(
        html(src),
        "<p>Some <i>x</i> text</p>\n<p>Some <i>x</i> text</p>"
    );
}

#[test]
fn named_parameters_reach_the_renderer() {
    let src = "
        defs{ pic{ image{ prm{url{get{src get_prm{$ {@}}}} alt{get_args{$ {@}}}} } } }
        pic{prm{src{cat.png}} a cat}
    ";
    assert_eq!(html(src), r#"<img src="cat.png" alt="a cat"/>"#);
}

#[test]
fn table_from_data() {
    let src = "
        defs{ rows{ {{a}{1}} {{b}{2}} } }
        table{ $ {rows} }
    ";
    assert_eq!(
        html(src),
        "<table>\n<tr><td>a</td><td>1</td></tr>\n<tr><td>b</td><td>2</td></tr>\n</table>"
    );
}

// ── Binary ────────────────────────────────────────────────────────────────────

#[test]
fn cli_renders_html_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lib.cud"), "defs{name{World}}").unwrap();
    let input = dir.path().join("doc.cud");
    fs::write(&input, "include{lib.cud} p{Hello $ {name}!}").unwrap();
    let output = dir.path().join("doc.html");

    let status = Command::new(binary())
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(fs::read_to_string(&output).unwrap(), "<p>Hello World!</p>\n");
}

#[test]
fn cli_dump_prints_evaluated_forest() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.cud");
    fs::write(&input, "p{size{a b c}}").unwrap();

    let out = Command::new(binary()).arg("--dump").arg(&input).output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "p{3}\n");
}

#[test]
fn cli_reports_errors_with_location() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.cud");
    fs::write(&input, "p{ok}\nnope{x}").unwrap();

    let out = Command::new(binary()).arg(&input).output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("function/macro 'nope' not found"), "{stderr}");
    assert!(stderr.contains("bad.cud:2:1: nope"), "{stderr}");
}
