use criterion::{Criterion, criterion_group, criterion_main};
use docs_chat::chunking::{SplitConfig, split_text};
use std::hint::black_box;

fn synthetic_document() -> String {
    let paragraph = "Shipping terms are negotiated per order. Standard delivery takes five \
business days and expedited delivery takes two. Invoices are payable within thirty days of \
receipt, and late payments accrue interest at the statutory rate.\n\n";
    paragraph.repeat(200)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let text = synthetic_document();
    let config = SplitConfig::default();
    c.bench_function("chunking", |b| {
        b.iter(|| split_text(black_box(&text), black_box(&config)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
