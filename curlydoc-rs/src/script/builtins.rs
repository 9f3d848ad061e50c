//! Built-in natives.
//!
//! Every native receives its call node's children *unevaluated*.  Most of
//! them evaluate all of their arguments first; the control-flow natives
//! (`if`, `and`, `or`, `then`, `else`) and the binding natives (`asis`,
//! `defs`, `for`, `map`, `prm`) decide for themselves what to evaluate.
//!
//! Truth is emptiness: an empty forest is false, anything else is true.
//! Predicates answer with a single `true` word or nothing.

use super::interp::Interpreter;
use super::registry::FunctionRegistry;
use crate::error::{ErrorKind, EvalError, EvalResult, InitError};
use crate::tree::{Forest, Node};

/// The word predicates return for "true".
pub const TRUE_WORD: &str = "true";

/// Index token meaning "one past the last element" in `slice`.
pub const END_WORD: &str = "end";

/// Tags understood by renderers.  Evaluating one of these evaluates its
/// arguments and keeps the tag, so markup survives evaluation.
pub const MARKUP_TAGS: &[&str] = &[
    "p", "b", "i", "u", "s", "m", "h1", "h2", "h3", "h4", "h5", "h6", "ins", "image", "table",
    "list",
];

/// Register every built-in native.
pub fn register_all(reg: &mut FunctionRegistry) -> Result<(), InitError> {
    // ── Evaluation control ───────────────────────────────────────────────────
    reg.register("asis", asis)?;
    reg.register("", anonymous)?;

    // ── Bindings ─────────────────────────────────────────────────────────────
    reg.register("defs", defs)?;
    reg.register("$", var)?;
    reg.register("for", for_each)?;

    // ── Conditionals ─────────────────────────────────────────────────────────
    reg.register("if", if_)?;
    reg.register("then", then)?;
    reg.register("else", else_)?;
    reg.register("and", and)?;
    reg.register("or", or)?;
    reg.register("not", not)?;

    // ── Structure ────────────────────────────────────────────────────────────
    reg.register("map", map)?;
    reg.register("prm", prm)?;
    reg.register("size", size)?;
    reg.register("at", at)?;
    reg.register("get", get)?;
    reg.register("slice", slice)?;
    reg.register("val", val)?;
    reg.register("children", children)?;

    // ── Predicates ───────────────────────────────────────────────────────────
    reg.register("eq", eq)?;
    reg.register("gt", gt)?;
    reg.register("is_word", is_word)?;

    // ── Files ────────────────────────────────────────────────────────────────
    reg.register("include", include)?;

    for &tag in MARKUP_TAGS {
        reg.register(tag, move |interp, args| markup(interp, tag, args))?;
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn truth(value: bool) -> Forest {
    if value {
        vec![Node::leaf(TRUE_WORD)]
    } else {
        Forest::new()
    }
}

/// The only node of `forest`, or an arity error naming `function`.
fn single<'a>(function: &str, forest: &'a [Node]) -> EvalResult<&'a Node> {
    match forest {
        [node] => Ok(node),
        _ => Err(EvalError::arity(
            function,
            format!("expected exactly one value, got {}", forest.len()),
        )),
    }
}

fn pair<'a>(function: &str, forest: &'a [Node]) -> EvalResult<(&'a Node, &'a Node)> {
    match forest {
        [a, b] => Ok((a, b)),
        _ => Err(EvalError::arity(
            function,
            format!("expected exactly 2 values, got {}", forest.len()),
        )),
    }
}

fn parse_index(node: &Node) -> EvalResult<i64> {
    if !node.is_literal() {
        return Err(ErrorKind::MalformedIndex(node.to_string()).into());
    }
    node.value
        .parse()
        .map_err(|_| ErrorKind::MalformedIndex(node.value.clone()).into())
}

fn parse_int(node: &Node) -> EvalResult<i64> {
    if !node.is_literal() {
        return Err(ErrorKind::NotAnInteger(node.to_string()).into());
    }
    node.value
        .parse()
        .map_err(|_| ErrorKind::NotAnInteger(node.value.clone()).into())
}

/// Map a possibly negative index onto `0..=size`.  Negative indices count
/// from the end.  `None` when the result would be negative or above `size`.
fn resolve_index(index: i64, size: usize) -> Option<usize> {
    let resolved = if index < 0 {
        (size as i64).checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|&i| i <= size)
}

fn out_of_bounds(index: i64, size: usize) -> EvalError {
    ErrorKind::IndexOutOfBounds { index, size }.into()
}

// ── Evaluation control ────────────────────────────────────────────────────────

/// `asis{X}` → X, unevaluated.
fn asis(_: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    Ok(args.to_vec())
}

/// `{X}` → one empty-valued node holding X evaluated.
fn anonymous(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    Ok(vec![Node::call("", interp.eval(args)?)])
}

// ── Bindings ──────────────────────────────────────────────────────────────────

/// `defs{name{body} ...}` binds each body, unevaluated, in a new context that
/// stays open for the rest of the enclosing evaluation.
fn defs(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let ctx = interp.contexts_mut().push(None);
    for entry in args {
        if let Err(kind) = interp
            .contexts_mut()
            .add(ctx, entry.value.clone(), entry.children.clone())
        {
            return Err(EvalError::new(kind).at(interp.current_file(), entry));
        }
    }
    Ok(Forest::new())
}

/// `$ {name}` → the forest bound to the name the arguments evaluate to.
fn var(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let names = interp.eval(args)?;
    let name = single("$", &names)?;
    let contexts = interp.contexts();
    Ok(contexts.find(contexts.top(), &name.value)?.clone())
}

/// `for{name{Items} Body...}` → Body once per item, with `name` bound to
/// that single item.
fn for_each(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let (head, body) = args
        .split_first()
        .ok_or_else(|| EvalError::arity("for", "missing loop variable"))?;
    let items = interp.eval(&head.children)?;
    let mut out = Forest::new();
    for item in items {
        let produced = interp.with_context(None, |interp, ctx| {
            interp.contexts_mut().add(ctx, head.value.clone(), vec![item])?;
            interp.eval(body)
        })?;
        out.extend(produced);
    }
    Ok(out)
}

// ── Conditionals ──────────────────────────────────────────────────────────────

fn if_(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let truth = interp.truth_of(args)?;
    interp.control_mut().begin(truth);
    Ok(Forest::new())
}

fn then(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    if !interp.control().takes_then() {
        return Ok(Forest::new());
    }
    interp.with_record(|interp| interp.eval(args))
}

fn else_(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    if !interp.control().takes_else() {
        return Ok(Forest::new());
    }
    interp.with_record(|interp| interp.eval(args))
}

fn and(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    if interp.control().and_needs_operand() {
        let truth = interp.truth_of(args)?;
        interp.control_mut().set_flag(truth);
    }
    Ok(Forest::new())
}

fn or(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    if interp.control_mut().or_needs_operand() {
        let truth = interp.truth_of(args)?;
        interp.control_mut().set_flag(truth);
    }
    Ok(Forest::new())
}

fn not(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    Ok(truth(!interp.truth_of(args)?))
}

// ── Structure ─────────────────────────────────────────────────────────────────

/// Evaluate each argument's children, keeping the argument's own tag.
fn eval_entries(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let mut out = Forest::with_capacity(args.len());
    for entry in args {
        out.push(Node {
            value: entry.value.clone(),
            children: interp.eval(&entry.children)?,
            location: entry.location,
            space_before: entry.space_before,
        });
    }
    Ok(out)
}

/// `map{k1{v1} k2{v2}}` → `k1{v1'} k2{v2'}`.
fn map(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    eval_entries(interp, args)
}

/// `prm{k1{v1} ...}` → a single `prm{k1{v1'} ...}` record (named parameters).
fn prm(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    Ok(vec![Node::call("prm", eval_entries(interp, args)?)])
}

fn size(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    Ok(vec![Node::leaf(vals.len().to_string())])
}

/// `at{Index E...}` → the indexed node of E.
fn at(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    let (index, rest) = vals
        .split_first()
        .ok_or_else(|| EvalError::arity("at", "missing index"))?;
    let index = parse_index(index)?;
    let pos = resolve_index(index, rest.len())
        .filter(|&p| p < rest.len())
        .ok_or_else(|| out_of_bounds(index, rest.len()))?;
    Ok(vec![rest[pos].clone()])
}

/// `get{Key E...}` → the children of the first node of E whose value is Key.
fn get(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    let (key, rest) = vals
        .split_first()
        .ok_or_else(|| EvalError::arity("get", "missing key"))?;
    rest.iter()
        .find(|n| n.value == key.value)
        .map(|n| n.children.clone())
        .ok_or_else(|| ErrorKind::KeyNotFound(key.value.clone()).into())
}

/// `slice{Begin End E...}` → E[Begin..End].  End may be `end`.
fn slice(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    if vals.len() < 2 {
        return Err(EvalError::arity(
            "slice",
            format!("expected begin and end indices, got {} values", vals.len()),
        ));
    }
    let rest = &vals[2..];
    let len = rest.len();

    let begin_index = parse_index(&vals[0])?;
    let begin = resolve_index(begin_index, len).ok_or_else(|| out_of_bounds(begin_index, len))?;

    let end = if vals[1].is_literal() && vals[1].value == END_WORD {
        len
    } else {
        let end_index = parse_index(&vals[1])?;
        resolve_index(end_index, len).ok_or_else(|| out_of_bounds(end_index, len))?
    };

    if begin > end {
        return Err(out_of_bounds(begin_index, len));
    }
    Ok(rest[begin..end].to_vec())
}

/// `val{E}` → the value of E's only node, as a word.
fn val(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    let node = single("val", &vals)?;
    Ok(vec![Node::leaf(node.value.clone()).at(node.location)])
}

/// `children{E}` → the children of E's only node.
fn children(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    Ok(single("children", &vals)?.children.clone())
}

// ── Predicates ────────────────────────────────────────────────────────────────

fn eq(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    let (a, b) = pair("eq", &vals)?;
    Ok(truth(a == b))
}

fn gt(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    let (a, b) = pair("gt", &vals)?;
    Ok(truth(parse_int(a)? > parse_int(b)?))
}

fn is_word(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    Ok(truth(matches!(vals.as_slice(), [node] if node.is_literal())))
}

// ── Files ─────────────────────────────────────────────────────────────────────

fn include(interp: &mut Interpreter, args: &[Node]) -> EvalResult<Forest> {
    let vals = interp.eval(args)?;
    let path = single("include", &vals)?.value.clone();
    interp.include(&path)
}

// ── Markup ────────────────────────────────────────────────────────────────────

/// Evaluate the arguments and keep `tag`.  Markup with no content left
/// produces nothing.
fn markup(interp: &mut Interpreter, tag: &str, args: &[Node]) -> EvalResult<Forest> {
    let content = interp.eval(args)?;
    if content.is_empty() {
        return Ok(Forest::new());
    }
    Ok(vec![Node::call(tag, content)])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
