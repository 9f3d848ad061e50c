use criterion::{black_box, criterion_group, criterion_main, Criterion};
use curlydoc::html::to_html;
use curlydoc::reader::parse;
use curlydoc::script::Interpreter;

/// A document with `sections` sections, each expanding a couple of macros
/// and a loop over a short list.
fn make_doc(sections: usize) -> String {
    let mut doc = String::from(
        "defs{
            section{ h2{first{$ {@}}} p{rest{$ {@}}} }
            bullets{ list{ for{x{$ {@}} {b{$ {x}}}} } }
        }\n",
    );
    for n in 0..sections {
        doc.push_str(&format!(
            "section{{Part-{n} The quick brown fox jumps over the lazy dog.}}\n\
             bullets{{one two three four}}\n"
        ));
    }
    doc
}

fn bench_eval(c: &mut Criterion) {
    let doc_small = make_doc(10);
    let doc_med = make_doc(100);
    let doc_large = make_doc(1000);

    let mut g = c.benchmark_group("document");

    g.bench_function("parse_med", |b| b.iter(|| parse(black_box(&doc_med))));

    for (name, doc) in [("small", &doc_small), ("med", &doc_med), ("large", &doc_large)] {
        let forest = parse(doc).unwrap();
        g.bench_function(format!("eval_{name}"), |b| {
            b.iter(|| {
                let mut interp = Interpreter::new().unwrap();
                interp.eval_preserving(black_box(&forest)).unwrap()
            })
        });
    }

    let mut interp = Interpreter::new().unwrap();
    let evaluated = interp.eval_source(&doc_med).unwrap();
    g.bench_function("html_med", |b| b.iter(|| to_html(black_box(&evaluated)).unwrap()));

    g.bench_function("interpreter_new", |b| b.iter(|| Interpreter::new().unwrap()));

    g.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
