use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use core_sim::{to_micros, MarketRegime, SimConfig};
use runtime::{logging::InMemoryRunLogWriter, run_session, Allocation, SimSession};

const BENCH_MONTHS: u32 = 360;

fn bench_session_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_throughput");
    group.throughput(Throughput::Elements(u64::from(BENCH_MONTHS)));

    for regime in [MarketRegime::StableGrowth, MarketRegime::LiquidityCrunch] {
        let config = SimConfig::new(regime, i64::from(BENCH_MONTHS), 100.0, true)
            .expect("bench config should be valid");

        group.bench_function(BenchmarkId::new("run_session", regime.as_str()), |b| {
            b.iter(|| {
                let mut session = SimSession::with_allocation(
                    config,
                    7,
                    to_micros(100_000_000.0),
                    &Allocation::balanced_default(),
                )
                .expect("default allocation fits default capital");
                let mut log = InMemoryRunLogWriter::new();
                black_box(run_session(&mut session, &mut log).expect("bench run should not fault"));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_session_throughput);
criterion_main!(benches);
