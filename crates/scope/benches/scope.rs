use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use warden_core::{Cause, FailureDetail, FailureKind, WardenError};
use warden_resource::{Behavior, Probe, Release};
use warden_scope::Scope;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Release is a no-op so the numbers measure bookkeeping only.
struct Noop;

impl Release for Noop {
    fn release(&mut self) -> Result<(), Cause> {
        Ok(())
    }
}

fn noop() -> Result<Noop, Cause> {
    Ok(Noop)
}

fn failing(name: &'static str) -> impl FnOnce() -> Result<Probe, Cause> {
    move || Probe::open(name, Behavior::Succeed, Behavior::fail("close"))
}

// ---------------------------------------------------------------------------
// Benchmark: clean scopes
// ---------------------------------------------------------------------------

fn bench_clean(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_scope");

    group.bench_function(BenchmarkId::from_parameter(1), |b| {
        b.iter(|| black_box(Scope::new().acquire(noop).run(|_| Ok::<_, Cause>(1))))
    });
    group.bench_function(BenchmarkId::from_parameter(2), |b| {
        b.iter(|| {
            black_box(
                Scope::new()
                    .acquire(noop)
                    .acquire(noop)
                    .run(|_| Ok::<_, Cause>(2)),
            )
        })
    });
    group.bench_function(BenchmarkId::from_parameter(3), |b| {
        b.iter(|| {
            black_box(
                Scope::new()
                    .acquire(noop)
                    .acquire(noop)
                    .acquire(noop)
                    .run(|_| Ok::<_, Cause>(3)),
            )
        })
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: body failure with every release failing
// ---------------------------------------------------------------------------

fn bench_suppression(c: &mut Criterion) {
    c.bench_function("body_and_three_releases_fail", |b| {
        b.iter(|| {
            let failure = Scope::new()
                .acquire(failing("r1"))
                .acquire(failing("r2"))
                .acquire(failing("r3"))
                .run(|_| Err::<(), _>(WardenError::Scripted("body".into())))
                .unwrap_err();
            black_box(failure.secondary().len())
        })
    });
}

// ---------------------------------------------------------------------------
// Benchmark: Failure::suppress
// ---------------------------------------------------------------------------

fn bench_suppress(c: &mut Criterion) {
    let mut group = c.benchmark_group("suppress");
    for count in [4usize, 16, 64] {
        let causes: Vec<Cause> = (0..count)
            .map(|i| Cause::new(WardenError::Scripted(format!("close {i}"))))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &causes, |b, causes| {
            b.iter(|| {
                let primary = FailureDetail::new(FailureKind::Body, WardenError::Scripted("body".into()));
                let mut failure = warden_core::Failure::new(primary);
                for cause in causes {
                    failure.suppress(FailureDetail::new(FailureKind::Release, cause.clone()));
                }
                black_box(failure)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_clean, bench_suppression, bench_suppress);
criterion_main!(benches);
