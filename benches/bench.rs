use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use pike_regex::internal::{compile, run_default};
use pike_regex::{asm, Regex};

fn compile_patterns(c: &mut Criterion) {
    c.bench_function("compile_literal", |b| {
        b.iter(|| compile(black_box("the quick brown fox")).unwrap())
    });
    c.bench_function("compile_alternation", |b| {
        b.iter(|| compile(black_box(r"(\w+)@(\w+)\.(com|org|net)|[^\s]+?:\d*")).unwrap())
    });
}

fn run_pathological(c: &mut Criterion) {
    // (a?){n}a{n} style blowup for a backtracker; linear here
    let n = 30;
    let pattern = format!("{}{}", "a?".repeat(n), "a".repeat(n));
    let text = "a".repeat(n);
    let prog = Arc::new(compile(pattern.as_str()).unwrap());
    c.bench_function("run_optional_prefix", |b| {
        b.iter(|| run_default(prog.clone(), black_box(text.as_str()), 0))
    });

    let re = Regex::new("(a*)*b").unwrap();
    let text = "a".repeat(1000);
    c.bench_function("run_nested_star", |b| {
        b.iter(|| re.match_len(black_box(text.as_str())))
    });
}

fn scan_text(c: &mut Criterion) {
    let re = Regex::new(r"\d+-\d+").unwrap();
    let text = format!("{}2024-10", "lorem ipsum ".repeat(200));
    c.bench_function("find_late_match", |b| {
        b.iter(|| re.find(black_box(text.as_str())))
    });
    c.bench_function("captures_late_match", |b| {
        b.iter(|| re.captures_at(black_box(text.as_str()), 0).map(|caps| caps.len()))
    });
}

fn program_text(c: &mut Criterion) {
    let prog = compile(r"([a-z]+|\d+)*(\s|;)?x").unwrap();
    let text = asm::write(&prog);
    c.bench_function("asm_write", |b| b.iter(|| asm::write(black_box(&prog))));
    c.bench_function("asm_read", |b| b.iter(|| asm::read(black_box(&text)).unwrap()));
}

criterion_group!(
    benches,
    compile_patterns,
    run_pathological,
    scan_text,
    program_text
);
criterion_main!(benches);
