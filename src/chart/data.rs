//! OHLC candle series backing the chart.
//!
//! The series is generated deterministically (seeded random walk) so the
//! app runs without any market-data dependency, and a small live-feed
//! system keeps mutating the last candle to exercise data-change
//! reconciliation.

use bevy::prelude::*;

use crate::constants::{CANDLE_COUNT, CANDLE_INTERVAL_SECS, LIVE_TICK_SECS, SERIES_EPOCH};
use crate::overlay::{SeriesDataChanged, SnapField};

#[derive(Debug, Clone, Copy)]
pub struct Candle {
    /// Unix timestamp (seconds) of the candle open.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn field(&self, field: SnapField) -> f64 {
        match field {
            SnapField::Open => self.open,
            SnapField::High => self.high,
            SnapField::Low => self.low,
            SnapField::Close => self.close,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Resource)]
pub struct ChartData {
    candles: Vec<Candle>,
    pub interval: i64,
    rng_state: u64,
}

impl Default for ChartData {
    fn default() -> Self {
        Self::generate(CANDLE_COUNT, CANDLE_INTERVAL_SECS, 0x5eed_cafe)
    }
}

impl ChartData {
    /// Seeded random-walk series: same seed, same chart.
    pub fn generate(count: usize, interval: i64, seed: u64) -> Self {
        let mut data = Self {
            candles: Vec::with_capacity(count),
            interval,
            rng_state: seed,
        };

        let mut price = 100.0;
        for i in 0..count {
            let time = SERIES_EPOCH + i as i64 * interval;
            let open = price;
            let drift = data.next_noise() * 1.2;
            let close = (open + drift).max(1.0);
            let high = open.max(close) + data.next_noise().abs() * 0.6;
            let low = (open.min(close) - data.next_noise().abs() * 0.6).max(0.5);
            data.candles.push(Candle {
                time,
                open,
                high,
                low,
                close,
            });
            price = close;
        }
        data
    }

    /// Uniform noise in [-1, 1] from a multiplicative LCG.
    fn next_noise(&mut self) -> f64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.rng_state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Candle whose open time is closest to `time`.
    pub fn nearest_candle(&self, time: i64) -> Option<&Candle> {
        self.candles
            .iter()
            .min_by_key(|candle| (candle.time - time).abs())
    }

    pub fn time_bounds(&self) -> Option<(i64, i64)> {
        let first = self.candles.first()?;
        let last = self.candles.last()?;
        Some((first.time, last.time))
    }

    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let mut low = f64::MAX;
        let mut high = f64::MIN;
        for candle in &self.candles {
            low = low.min(candle.low);
            high = high.max(candle.high);
        }
        (low < high).then_some((low, high))
    }

    /// Simulate one live tick against the last candle.
    pub fn apply_tick(&mut self) {
        let noise = self.next_noise() * 0.4;
        if let Some(last) = self.candles.last_mut() {
            last.close = (last.close + noise).max(0.5);
            last.high = last.high.max(last.close);
            last.low = last.low.min(last.close);
        }
    }
}

/// Timer driving the simulated feed.
#[derive(Resource)]
pub struct LiveFeed {
    timer: Timer,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(LIVE_TICK_SECS, TimerMode::Repeating),
        }
    }
}

pub fn live_feed(
    time: Res<Time>,
    mut feed: ResMut<LiveFeed>,
    mut data: ResMut<ChartData>,
    mut changed: MessageWriter<SeriesDataChanged>,
) {
    if feed.timer.tick(time.delta()).just_finished() {
        data.apply_tick();
        changed.write(SeriesDataChanged);
    }
}
