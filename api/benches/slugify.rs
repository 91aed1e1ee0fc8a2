use blog_api::utils::slugify;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("slugify");
    for words in [1, 10, 100, 1000].iter() {
        let name = generate_name(*words);
        group.bench_function(BenchmarkId::new("slugify", words), |b| {
            b.iter(|| slugify(&name))
        });
    }
    group.finish();
}

fn generate_name(words: usize) -> String {
    let samples = ["Tech", "&", "Tips", "--", "Rust_lang", "Ünïcode", "  ", "2025!"];
    (0..words)
        .map(|i| samples[i % samples.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
