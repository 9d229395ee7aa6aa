use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdspell::{CheckSettings, DictionaryEngine, LanguageRegistry, ResultCache, SpellChecker};
use std::sync::Arc;

const AFF: &str = "SET UTF-8\nTRY esianrtolcdugmphbyfvkwz\n";
const DIC: &str = "12\nthe\nquick\nbrown\nfox\njumps\nover\nlazy\ndog\nreturn\nvalue\ncompute\ntotal\n";

fn document(sections: usize) -> String {
    let section = "The quick brown fox jumps over the lazy dgo.\n\n\
                   ```rust\n// compute the totl value\nlet total = compute();\n```\n\n\
                   Inline `code` and https://example.com/path are skipped.\n\n";
    section.repeat(sections)
}

fn checker() -> SpellChecker {
    let engine = DictionaryEngine::builder().with_inline("en_US", AFF, DIC).build();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(engine.init()).unwrap();

    SpellChecker::new(
        Arc::new(engine),
        Arc::new(LanguageRegistry::builtin()),
        Arc::new(ResultCache::new(100)),
        CheckSettings::default(),
    )
}

fn bench_check_text(c: &mut Criterion) {
    let checker = checker();
    let small = document(4);
    let large = document(200);

    c.bench_function("check_text_small", |b| {
        b.iter(|| checker.check_text(black_box(&small), &[], 0).unwrap())
    });
    c.bench_function("check_text_large", |b| {
        b.iter(|| checker.check_text(black_box(&large), &[], 0).unwrap())
    });
    c.bench_function("find_code_regions_large", |b| {
        b.iter(|| mdspell::find_code_regions(black_box(&large)))
    });
}

criterion_group!(benches, bench_check_text);
criterion_main!(benches);
