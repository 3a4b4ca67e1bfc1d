// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Randomized reconnect delays.
//!
//! The delay after a transient close is drawn uniformly from
//! `[0, BASE_DELAY_MS * min(attempts + 1, MAX_MULTIPLIER))`, so the ceiling
//! grows linearly with consecutive failures and tops out at 10 seconds.

use std::time::Duration;

use rand::Rng;

/// Base unit of the reconnect ceiling.
pub const BASE_DELAY_MS: u64 = 2000;

/// Cap on the ceiling multiplier.
pub const MAX_MULTIPLIER: u32 = 5;

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

impl<F> RandomSource for F
where
    F: FnMut() -> f64 + Send,
{
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// Upper bound (exclusive) of the delay after `attempts` connection attempts.
pub fn delay_ceiling(attempts: u32) -> Duration {
    let multiplier = attempts.saturating_add(1).min(MAX_MULTIPLIER);
    Duration::from_millis(BASE_DELAY_MS * u64::from(multiplier))
}

/// Delay before the next attempt, given a sample `unit` in `[0, 1)`.
///
/// Samples outside that range are treated as zero.
pub fn reconnect_delay(attempts: u32, unit: f64) -> Duration {
    let unit = if (0.0..1.0).contains(&unit) { unit } else { 0.0 };
    let ceiling_ms = delay_ceiling(attempts).as_millis() as f64;
    Duration::from_millis((unit * ceiling_ms) as u64)
}
