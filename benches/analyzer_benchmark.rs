use criterion::{black_box, criterion_group, criterion_main, Criterion};
use amygdala::{preprocessing, AnalysisService, SentimentAnalyzer, ServiceConfig, DEFAULT_THRESHOLD};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sentiment_model.json");

const SHORT_TEXT: &str = "Feeling anxious today";
const MEDIUM_TEXT: &str = "Woke up tired again. The meeting went better than I expected, \
     but I still can't shake this lonely feeling when I get home in the evening.";
const LONG_TEXT: &str = "This is a much longer journal entry covering several parts of the day. \
     The morning was calm and I was grateful for the quiet coffee before work.\n\n\
     By the afternoon things had turned awful: a deadline slipped, my manager was \
     upset, and I felt terrible about letting the team down.\n\n\
     In the evening I called a friend, which helped a little, though I still hate \
     how anxious these weeks make me and I would love for things to feel wonderful again.";

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Normalization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| preprocessing::normalize(black_box(SHORT_TEXT))));
    group.bench_function("medium_text", |b| b.iter(|| preprocessing::normalize(black_box(MEDIUM_TEXT))));
    group.bench_function("long_text", |b| b.iter(|| preprocessing::normalize(black_box(LONG_TEXT))));

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let analyzer = SentimentAnalyzer::load(FIXTURE, DEFAULT_THRESHOLD).unwrap();
    let mut group = c.benchmark_group("Analysis");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for (name, text) in [("short_text", SHORT_TEXT), ("medium_text", MEDIUM_TEXT), ("long_text", LONG_TEXT)] {
        group.bench_function(name, |b| b.iter(|| analyzer.analyze(black_box(text)).unwrap()));
    }

    group.finish();
}

fn bench_service(c: &mut Criterion) {
    let service = AnalysisService::new(&ServiceConfig::with_model_path(FIXTURE));
    service.ensure_loaded().unwrap();
    let mut group = c.benchmark_group("Service");
    group.sample_size(50);

    // Includes the counter and the already-loaded check on every call.
    group.bench_function("analyze_sentiment", |b| b.iter(|| {
        service.ensure_loaded().unwrap();
        service.analyze_sentiment(black_box(MEDIUM_TEXT)).unwrap()
    }));

    group.finish();
}

criterion_group!(
    benches,
    bench_normalization,
    bench_analysis,
    bench_service
);
criterion_main!(benches);
