//! Simulated sensor front-end.
//!
//! Emulates the memory-mapped temperature/humidity peripheral the original
//! hardware targeted: measurements are latched as 20-bit register codes and
//! read back through the register interface, then converted to engineering
//! units. [`generate_readings`] drives the emulated part with a
//! caller-supplied RNG to produce one reading per day, shuffled so the store
//! is not fed a monotonic (worst-case) timestamp sequence.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::Reading;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Upper bound on the number of days a single run may generate.
pub const MAX_DAYS: u32 = 100;

/// Register codes are 20-bit, matching the ADC width of the emulated part.
const CODE_SPAN: u64 = 1 << 20;

/// Temperature span covered by the register: -50 °C at code 0, +150 °C at
/// full scale.
const TEMP_SPAN_C: f64 = 200.0;
const TEMP_OFFSET_C: f64 = 50.0;

/// Rejected day counts; generation never starts with an out-of-range count.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("day count must be between 1 and {MAX_DAYS}, got {0}")]
pub struct InvalidDayCount(pub u32);

// =============================================================================
// Register file
// =============================================================================

/// Emulated sensor register file.
///
/// [`SensorSim::set_sensor`] latches a measurement as raw register codes; the
/// read side hands those codes back the way a memory-mapped peripheral would.
#[derive(Debug, Default)]
pub struct SensorSim {
    temp_code: u32,
    humid_code: u32,
}

impl SensorSim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches a measurement. Values outside the register span saturate.
    pub fn set_sensor(&mut self, temp_c: f64, humid_pct: f64) {
        let t = (temp_c + TEMP_OFFSET_C) / TEMP_SPAN_C * CODE_SPAN as f64;
        let h = humid_pct / 100.0 * CODE_SPAN as f64;
        self.temp_code = (t.max(0.0) as u64).min(CODE_SPAN - 1) as u32;
        self.humid_code = (h.max(0.0) as u64).min(CODE_SPAN - 1) as u32;
    }

    /// Raw 20-bit temperature register.
    #[inline]
    pub fn temp_reg(&self) -> u32 {
        self.temp_code
    }

    /// Raw 20-bit humidity register.
    #[inline]
    pub fn humid_reg(&self) -> u32 {
        self.humid_code
    }
}

/// Converts a raw temperature code to whole degrees Celsius.
#[inline]
pub fn temp_from_code(code: u32) -> i64 {
    (u64::from(code) * 200 / CODE_SPAN) as i64 - 50
}

/// Converts a raw humidity code to whole percent relative humidity.
#[inline]
pub fn humidity_from_code(code: u32) -> u32 {
    (u64::from(code) * 100 / CODE_SPAN) as u32
}

// =============================================================================
// Record generation
// =============================================================================

/// Generates one reading per day starting at `base_timestamp`, day-spaced,
/// with temperatures drawn in 0..=100 °C and humidity in 0..100 %RH through
/// the register model. The batch is shuffled before being returned so the
/// store receives timestamps in a non-sorted order.
///
/// The RNG is caller-supplied: a fixed seed reproduces the exact batch,
/// shuffle included.
pub fn generate_readings<R: Rng>(
    rng: &mut R,
    base_timestamp: i64,
    days: u32,
) -> Result<Vec<Reading>, InvalidDayCount> {
    if days == 0 || days > MAX_DAYS {
        return Err(InvalidDayCount(days));
    }

    let mut sensor = SensorSim::new();
    let mut readings = Vec::with_capacity(days as usize);
    for day in 0..days {
        sensor.set_sensor(
            f64::from(rng.gen_range(0u32..=100)),
            f64::from(rng.gen_range(0u32..100)),
        );

        // Generated temperatures are non-negative, so the signed decode
        // always fits the payload field.
        let temperature = temp_from_code(sensor.temp_reg()).max(0) as u32;
        let humidity = humidity_from_code(sensor.humid_reg());

        readings.push(Reading {
            timestamp: base_timestamp + i64::from(day) * SECONDS_PER_DAY,
            temperature,
            humidity,
        });
    }

    readings.shuffle(rng);
    Ok(readings)
}
