//! Centralized constants used across the application.
//!
//! This module contains magic numbers and configuration values that are used
//! in multiple places or would benefit from being named constants.

/// Default window width in pixels (also the initial chart surface width)
pub const DEFAULT_WINDOW_WIDTH: f32 = 1600.0;

/// Default window height in pixels (also the initial chart surface height)
pub const DEFAULT_WINDOW_HEIGHT: f32 = 900.0;

/// Number of candles in the generated series
pub const CANDLE_COUNT: usize = 240;

/// Candle interval in seconds (1-minute bars)
pub const CANDLE_INTERVAL_SECS: i64 = 60;

/// Open time of the first candle (unix seconds)
pub const SERIES_EPOCH: i64 = 1_700_000_000;

/// Seconds between simulated live ticks against the last candle
pub const LIVE_TICK_SECS: f32 = 0.5;

/// Hit-test tolerance around strokes, in CSS pixels
pub const HIT_TOLERANCE_CSS_PX: f64 = 5.0;

/// Maximum pointer distance to an OHLC value for snapping, in CSS pixels
pub const SNAP_THRESHOLD_PX: f64 = 8.0;
