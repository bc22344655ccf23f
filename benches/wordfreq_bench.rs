use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use word_frequency::algo::keywords::{KeywordExtractor, TfidfKeywords};
use word_frequency::algo::{export, frequency, tokenizer};

/// Generate a synthetic novel-sized text: paragraphs of mixed prose.
fn generate_text(paragraphs: usize) -> String {
    let sentences = [
        "The old captain watched the grey sea from the deck of his ship.",
        "Elizabeth walked through the garden, thinking of the letter she had received.",
        "A storm gathered over the mountains, and the villagers closed their shutters.",
        "He counted 42 coins, then 17 more, before the candle burned out!",
        "The whale surfaced once more; the crew shouted and reached for their harpoons.",
        "In the library, dusty volumes lined every wall from floor to ceiling.",
    ];
    (0..paragraphs)
        .map(|i| {
            let a = sentences[i % sentences.len()];
            let b = sentences[(i * 7 + 3) % sentences.len()];
            format!("{a} {b} Chapter {i} continues.\n\n")
        })
        .collect()
}

fn bench_clean_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_text");
    for n in [100, 1_000, 10_000] {
        let text = generate_text(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| tokenizer::clean_text(black_box(text)))
        });
    }
    group.finish();
}

fn bench_word_stats(c: &mut Criterion) {
    let tokens = tokenizer::clean_text(&generate_text(10_000));
    c.bench_function("word_stats/10000_paragraphs", |b| {
        b.iter(|| frequency::word_stats(black_box(&tokens)))
    });
}

fn bench_keywords(c: &mut Criterion) {
    let mut group = c.benchmark_group("keywords");
    let text = generate_text(1_000);
    for ngram in [1, 2] {
        let extractor = TfidfKeywords::new(ngram);
        group.bench_with_input(BenchmarkId::new("ngram", ngram), &text, |b, text| {
            b.iter(|| extractor.extract(black_box(text), 5))
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let tokens = tokenizer::clean_text(&generate_text(1_000));
    let (_, rows) = frequency::word_stats(&tokens);
    c.bench_function("export/data_uri", |b| {
        b.iter(|| export::to_data_uri(&export::encode_csv(black_box(&rows))))
    });
}

criterion_group!(
    benches,
    bench_clean_text,
    bench_word_stats,
    bench_keywords,
    bench_export
);
criterion_main!(benches);
