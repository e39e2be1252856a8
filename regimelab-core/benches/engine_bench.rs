//! Criterion benchmarks for RegimeLab hot paths.
//!
//! Benchmarks:
//! 1. Full backtest run (event loop + regime column + strategy)
//! 2. Indicator batch computation
//! 3. Regime classification of a full series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use regimelab_core::domain::{Candle, CandleSeries, Timeframe};
use regimelab_core::engine::{BacktestEngine, EngineConfig};
use regimelab_core::indicators::{Adx, Indicator, Macd, MacdOutput, Rsi, Sma};
use regimelab_core::regime::RegimeClassifier;
use regimelab_core::strategy::{MaCrossover, MaType};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> CandleSeries {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Candle {
                open_time: base + Duration::hours(i as i64),
                open,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0 + (i % 500_000) as f64,
            }
        })
        .collect();
    CandleSeries::new("BTC/USDT", Timeframe::H1, candles).unwrap()
}

fn bench_full_backtest(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_backtest");
    for n in [1_000_usize, 5_000] {
        group.bench_with_input(BenchmarkId::new("ma_crossover", n), &n, |b, &n| {
            b.iter(|| {
                let series = make_series(n);
                let strategy = Box::new(MaCrossover::new(20, 50, MaType::Sma).unwrap());
                let engine =
                    BacktestEngine::new(series, strategy, EngineConfig::default()).unwrap();
                black_box(engine.run())
            });
        });
    }
    group.finish();
}

fn bench_indicators(c: &mut Criterion) {
    let series = make_series(5_000);
    let candles = series.candles();
    let mut group = c.benchmark_group("indicators");
    group.bench_function("sma_200", |b| {
        b.iter(|| black_box(Sma::new(200).compute(candles)))
    });
    group.bench_function("rsi_14", |b| {
        b.iter(|| black_box(Rsi::new(14).compute(candles)))
    });
    group.bench_function("adx_14", |b| {
        b.iter(|| black_box(Adx::new(14).compute(candles)))
    });
    group.bench_function("macd_12_26_9", |b| {
        b.iter(|| black_box(Macd::new(12, 26, 9, MacdOutput::Histogram).compute(candles)))
    });
    group.finish();
}

fn bench_regime_classification(c: &mut Criterion) {
    let series = make_series(5_000);
    c.bench_function("regime_classify_5000", |b| {
        b.iter(|| {
            let mut classifier = RegimeClassifier::default();
            black_box(classifier.classify_series(series.candles()))
        })
    });
}

criterion_group!(
    benches,
    bench_full_backtest,
    bench_indicators,
    bench_regime_classification
);
criterion_main!(benches);
