use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ragex_core::backend::HashingEncoder;
use ragex_core::comparator::{LexicalComparator, NGramOverlapComparator};
use ragex_core::perturber::{LeaveOneOutPerturber, RandomWordPerturber, ReorderPerturber};
use ragex_core::retriever::semantic_search;
use ragex_core::scores::{normalize_scores, rank_features};
use ragex_core::tokenizer::{CustomTokenizer, Tokenizer};
use ragex_core::types::Granularity;

const PASSAGE: &str = "The Panthers defense gave up just 308 points, ranking sixth in the league, \
    while also leading the NFL in interceptions with 24 and boasting four Pro Bowl selections.\n\
    Pro Bowl defensive tackle Kawann Short led the team in sacks with 11, while also forcing \
    three fumbles and recovering two.";

fn bench_tokenizer(c: &mut Criterion) {
    let tokenizer = CustomTokenizer::new();

    for granularity in Granularity::ALL {
        c.bench_function(&format!("tokenize_{granularity}"), |b| {
            b.iter(|| tokenizer.tokenize(black_box(PASSAGE), granularity))
        });
    }
}

fn bench_perturbers(c: &mut Criterion) {
    let features = CustomTokenizer::new().tokenize(PASSAGE, Granularity::Phrase);

    let leave_one_out = LeaveOneOutPerturber::new();
    c.bench_function("perturb_leave_one_out", |b| {
        b.iter(|| leave_one_out.perturb_sync(black_box(PASSAGE), &features))
    });

    let random_word = RandomWordPerturber::default();
    c.bench_function("perturb_random_word", |b| {
        b.iter(|| random_word.perturb_sync(black_box(PASSAGE), &features))
    });

    let reorder = ReorderPerturber::default();
    c.bench_function("perturb_reorder", |b| {
        b.iter(|| reorder.perturb_sync(black_box(PASSAGE), &features))
    });
}

fn bench_comparators(c: &mut Criterion) {
    let features = CustomTokenizer::new().tokenize(PASSAGE, Granularity::Word);
    let perturbations = LeaveOneOutPerturber::new().perturb_sync(PASSAGE, &features);
    let candidates: Vec<&str> = perturbations.iter().map(String::as_str).collect();

    let levenshtein = LexicalComparator::levenshtein();
    c.bench_function("compare_levenshtein", |b| {
        b.iter(|| levenshtein.compare_texts(black_box(PASSAGE), &candidates, true))
    });

    let jaro_winkler = LexicalComparator::jaro_winkler();
    c.bench_function("compare_jaro_winkler", |b| {
        b.iter(|| jaro_winkler.compare_texts(black_box(PASSAGE), &candidates, true))
    });

    let ngram = NGramOverlapComparator::default();
    c.bench_function("compare_ngram_overlap", |b| {
        b.iter(|| ngram.compare_texts(black_box(PASSAGE), &candidates, true))
    });
}

fn bench_scores(c: &mut Criterion) {
    let scores: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64 / 7.0).collect();
    let features: Vec<String> = (0..500).map(|i| format!("feature-{i}")).collect();

    c.bench_function("normalize_500_scores", |b| {
        b.iter(|| normalize_scores(black_box(&scores)))
    });

    c.bench_function("rank_500_features", |b| {
        b.iter(|| rank_features(black_box(&features), black_box(&scores)))
    });
}

fn bench_search(c: &mut Criterion) {
    let encoder = HashingEncoder::default();
    let corpus: Vec<Vec<f32>> = PASSAGE
        .split_whitespace()
        .cycle()
        .take(1000)
        .collect::<Vec<_>>()
        .chunks(10)
        .map(|chunk| encoder.embed(&chunk.join(" ")))
        .collect();
    let query = encoder.embed("Panthers defense interceptions");

    c.bench_function("semantic_search_100_docs", |b| {
        b.iter(|| semantic_search(black_box(&query), &corpus, 3))
    });
}

criterion_group!(
    benches,
    bench_tokenizer,
    bench_perturbers,
    bench_comparators,
    bench_scores,
    bench_search,
);
criterion_main!(benches);
