use crate::{Result, ThermalError};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Heat source and mean temperature shared between the thermal elements of one
/// electrical unit (e.g. one cell).
///
/// The power dissipation is a step function of time: each sample holds from its
/// time stamp until the next one. Elements sample it through [`ThermalState::power_dissipation`]
/// and report their temperature back via [`ThermalState::add_temperature`].
#[derive(Debug)]
pub struct ThermalState {
    inner: Mutex<StateInner>,
}

#[derive(Debug, Clone, Copy)]
struct PowerSample {
    time: f64,
    value: f64,
}

#[derive(Debug)]
struct StateInner {
    samples: Vec<PowerSample>,
    fixed_power: f64,
    temperature: f64,
    total_volume: f64,
}

impl ThermalState {
    pub fn new(initial_temperature: f64) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                samples: vec![PowerSample {
                    time: 0.0,
                    value: 0.0,
                }],
                fixed_power: 0.0,
                temperature: initial_temperature,
                total_volume: 0.0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Volume weighted mean temperature of all reported elements.
    pub fn temperature(&self) -> f64 {
        self.lock().temperature
    }

    pub fn add_temperature(&self, temperature: f64, volume: f64) -> Result<()> {
        if volume <= 0.0 {
            return Err(ThermalError::invalid(
                "volume",
                format!("must be positive, got {volume}"),
            ));
        }
        let mut inner = self.lock();
        let new_volume = inner.total_volume + volume;
        inner.temperature =
            (temperature * volume + inner.temperature * inner.total_volume) / new_volume;
        inner.total_volume = new_volume;
        Ok(())
    }

    pub fn reset_temperature(&self) {
        let mut inner = self.lock();
        inner.temperature = 0.0;
        inner.total_volume = 0.0;
    }

    /// Appends a sample valid from `time` on. Time stamps must not decrease.
    pub fn add_power_dissipation(&self, value: f64, time: f64) -> Result<()> {
        let mut inner = self.lock();
        if let Some(last) = inner.samples.last()
            && time < last.time
        {
            return Err(ThermalError::invalid(
                "time",
                format!("power sample at {time} is older than the last one at {}", last.time),
            ));
        }
        inner.samples.push(PowerSample { time, value });
        Ok(())
    }

    /// Drops every sample but the most recent one.
    pub fn reset_power_dissipation(&self) {
        let mut inner = self.lock();
        let n = inner.samples.len();
        if n > 1 {
            inner.samples.drain(..n - 1);
        }
    }

    /// Drops all samples after `time`, keeping at least the first two.
    pub fn reset_power_dissipation_to_time(&self, time: f64) {
        let mut inner = self.lock();
        let keep = inner
            .samples
            .iter()
            .enumerate()
            .skip(2)
            .find(|(_, s)| s.time > time)
            .map(|(i, _)| i);
        if let Some(keep) = keep {
            inner.samples.truncate(keep);
        }
    }

    /// Replaces the time series by a constant power.
    pub fn set_fixed_power_dissipation(&self, value: f64) {
        let mut inner = self.lock();
        inner.samples.clear();
        inner.fixed_power = value;
    }

    /// Mean power over `[time - dt, time]`.
    ///
    /// Returns the fixed power when no samples exist and zero for `dt == 0`.
    /// Times before the first sample contribute no power.
    pub fn power_dissipation(&self, time: f64, dt: f64) -> f64 {
        let inner = self.lock();
        if inner.samples.is_empty() {
            return inner.fixed_power;
        }
        if dt <= 0.0 {
            return 0.0;
        }
        let start = time - dt;
        let mut integral = 0.0;
        for (k, sample) in inner.samples.iter().enumerate() {
            let seg_start = sample.time.max(start);
            let seg_end = inner
                .samples
                .get(k + 1)
                .map_or(time, |next| next.time.min(time));
            if seg_end > seg_start {
                integral += sample.value * (seg_end - seg_start);
            }
        }
        integral / dt
    }
}

impl Default for ThermalState {
    fn default() -> Self {
        Self::new(0.0)
    }
}
