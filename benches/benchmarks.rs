//! Performance benchmarks for termroute.
//!
//! This module contains benchmarks for:
//! - Name resolution across growing target sets
//! - Suggestion ranking
//! - Contextual query splitting and command validation
//! - History recording
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use termroute::core::{BackendKind, DispatchHistory, HistoryEntry, Target, TargetInfo};
use termroute::registry::{resolve_name, suggest, AliasTable};
use termroute::router::{phrase_candidates, split_contextual};
use termroute::security::CommandValidator;

// ============================================================================
// Mock Data Fixtures
// ============================================================================

mod fixtures {
    use super::*;

    /// Generate targets spread over every backend.
    pub fn generate_targets(count: usize) -> Vec<TargetInfo> {
        let titles = ["zsh", "npm run dev", "cargo watch", "ssh prod", "logs", "vim"];
        (0..count)
            .map(|i| {
                let kind = BackendKind::ALL[i % BackendKind::ALL.len()];
                let ordinal = (i / BackendKind::ALL.len()) as u32 + 1;
                let title = format!("{} {}", titles[i % titles.len()], i);
                TargetInfo::new(Target::new(kind, i, title).with_ordinal(ordinal))
            })
            .collect()
    }

    /// Alias every tenth target.
    pub fn generate_aliases(targets: &[TargetInfo]) -> AliasTable {
        let mut aliases = AliasTable::new();
        for (i, info) in targets.iter().enumerate().step_by(10) {
            aliases.set(info.id(), &format!("svc-{i}"));
        }
        aliases
    }

    /// Names covering each resolution step.
    pub fn lookup_names() -> Vec<(&'static str, &'static str)> {
        vec![
            ("alias", "svc-10"),
            ("id", "terminal:0"),
            ("fuzzy", "cargo watch"),
            ("ordinal", "warp 3"),
            ("synonym", "vs code"),
            ("miss", "emacs"),
        ]
    }
}

// ============================================================================
// Resolution Benchmarks
// ============================================================================

fn bench_resolve_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_name");

    for count in [10, 100, 1000] {
        let targets = fixtures::generate_targets(count);
        let aliases = fixtures::generate_aliases(&targets);
        group.throughput(Throughput::Elements(count as u64));

        for (label, name) in fixtures::lookup_names() {
            group.bench_with_input(
                BenchmarkId::new(label, count),
                &name,
                |b, &name| {
                    b.iter(|| black_box(resolve_name(&targets, &aliases, black_box(name))));
                },
            );
        }
    }

    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let mut group = c.benchmark_group("suggest");

    for count in [10, 100, 1000] {
        let targets = fixtures::generate_targets(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("short_query", count), &targets, |b, targets| {
            b.iter(|| black_box(suggest(targets, black_box("ter"))));
        });
    }

    group.finish();
}

// ============================================================================
// Parsing & Validation Benchmarks
// ============================================================================

fn bench_contextual(c: &mut Criterion) {
    let mut group = c.benchmark_group("contextual");

    group.bench_function("split", |b| {
        b.iter(|| black_box(split_contextual(black_box("in the main session, cargo test --all"))));
    });

    group.bench_function("split_miss", |b| {
        b.iter(|| black_box(split_contextual(black_box("cargo test --all"))));
    });

    group.bench_function("phrase_candidates", |b| {
        b.iter(|| black_box(phrase_candidates(black_box("the warp tab"))));
    });

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let validator = CommandValidator::new().with_blocked_patterns(["git push --force"]);

    group.bench_function("safe_command", |b| {
        b.iter(|| black_box(validator.validate(black_box("npm run build -- --watch"), false)));
    });

    group.bench_function("remote_command", |b| {
        b.iter(|| black_box(validator.validate(black_box("sudo systemctl restart api"), true)));
    });

    group.finish();
}

// ============================================================================
// History Benchmarks
// ============================================================================

fn bench_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    group.bench_function("push_1000_bounded", |b| {
        b.iter(|| {
            let mut history = DispatchHistory::new(50);
            for i in 0..1000 {
                history.push("Terminal:1", HistoryEntry::command(format!("echo {i}")));
            }
            black_box(history.total())
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Groups and Main
// ============================================================================

criterion_group!(resolution_benches, bench_resolve_name, bench_suggest,);

criterion_group!(parsing_benches, bench_contextual, bench_validation,);

criterion_group!(history_benches, bench_history,);

criterion_main!(resolution_benches, parsing_benches, history_benches,);
