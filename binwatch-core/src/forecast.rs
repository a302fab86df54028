//! Next-day fill forecasts from independent per-bin linear trends.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{BinId, Forecast, PickupBucket};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Ordinary least-squares line over sample positions `0, 1, 2, …`.
pub struct LinearTrend {
    /// Change in fill level per day.
    pub slope: f64,
    /// Fitted fill level at day 0.
    pub intercept: f64,
}

impl LinearTrend {
    /// Fit a line through `samples`, using each sample's position as its day.
    ///
    /// Returns `None` for an empty series. A single sample yields a flat line through it.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below 2^52"
    )]
    pub fn fit(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len() as f64;
        let mean_day = (count - 1.0) / 2.0;
        let mean_fill = samples.iter().sum::<f64>() / count;

        let (covariance, variance) = samples.iter().enumerate().fold(
            (0.0, 0.0),
            |(covariance, variance), (day, fill)| {
                let day_offset = day as f64 - mean_day;
                (
                    covariance + day_offset * (fill - mean_fill),
                    variance + day_offset * day_offset,
                )
            },
        );

        let slope = if variance > 0.0 {
            covariance / variance
        } else {
            0.0
        };

        Some(Self {
            slope,
            intercept: mean_fill - slope * mean_day,
        })
    }

    /// Evaluate the line at `day`.
    #[must_use]
    pub fn predict(&self, day: f64) -> f64 {
        self.intercept + self.slope * day
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Forecast for a single bin.
pub struct BinForecast {
    /// Bin the forecast belongs to.
    pub bin: BinId,
    /// Predicted fill for the next unseen day, rounded to two decimals.
    pub predicted: f64,
    /// Pickup slot for the prediction.
    pub bucket: PickupBucket,
}

/// Forecast a single bin's next-day fill level.
///
/// Returns `None` when the bin has no samples.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "sample counts are far below 2^52"
)]
pub fn forecast_bin(bin: &BinId, samples: &[f64]) -> Option<BinForecast> {
    let trend = LinearTrend::fit(samples)?;
    // bucket from the raw value; only the stored prediction is rounded
    let raw = trend.predict(samples.len() as f64);
    Some(BinForecast {
        bin: bin.clone(),
        predicted: round_to_cents(raw),
        bucket: PickupBucket::from_prediction(raw),
    })
}

/// Forecast every bin independently.
///
/// Bins are fitted in parallel; bins without samples are left out of both maps.
#[must_use]
pub fn forecast(history: &BTreeMap<BinId, Vec<f64>>) -> Forecast {
    let records = history
        .par_iter()
        .filter_map(|(bin, samples)| forecast_bin(bin, samples))
        .collect::<Vec<_>>();

    debug!(
        bins = history.len(),
        forecasts = records.len(),
        "fill forecast computed"
    );

    records.into_iter().collect()
}

impl FromIterator<BinForecast> for Forecast {
    fn from_iter<T: IntoIterator<Item = BinForecast>>(iter: T) -> Self {
        let mut forecast = Forecast::default();
        for record in iter {
            forecast.schedule.insert(record.bin.clone(), record.bucket);
            forecast.predictions.insert(record.bin, record.predicted);
        }
        forecast
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        let trend = LinearTrend::fit(&[10.0, 20.0, 30.0]).expect("non-empty");
        assert!((trend.slope - 10.0).abs() < 1e-12, "slope {}", trend.slope);
        assert!((trend.intercept - 10.0).abs() < 1e-12, "intercept {}", trend.intercept);
    }

    #[test]
    fn single_sample_is_flat() {
        let trend = LinearTrend::fit(&[50.0]).expect("non-empty");
        assert!(trend.slope == 0.0, "single point has no slope");
        assert!((trend.predict(1.0) - 50.0).abs() < f64::EPSILON, "flat at the sample");
    }

    #[test]
    fn empty_series_has_no_fit() {
        assert!(LinearTrend::fit(&[]).is_none(), "nothing to fit");
    }

    #[test]
    fn prediction_is_rounded_to_two_decimals() {
        let record = forecast_bin(&BinId::from("A"), &[0.0, 0.0, 1.0]).expect("non-empty");
        // slope 0.5, intercept -1/6, day 3 -> 1.3333…
        assert!((record.predicted - 1.33).abs() < 1e-9, "got {}", record.predicted);
    }

    #[test]
    fn predictions_are_not_clamped() {
        let rising = forecast_bin(&BinId::from("A"), &[80.0, 95.0, 110.0]).expect("non-empty");
        assert!((rising.predicted - 125.0).abs() < 1e-9, "got {}", rising.predicted);
        assert_eq!(rising.bucket, PickupBucket::Early, "overflowing bin goes first");

        let falling = forecast_bin(&BinId::from("B"), &[20.0, 10.0, 0.0]).expect("non-empty");
        assert!((falling.predicted + 10.0).abs() < 1e-9, "got {}", falling.predicted);
    }

    #[test]
    fn bucket_follows_unrounded_prediction() {
        let below_early = forecast_bin(&BinId::from("A"), &[89.996]).expect("non-empty");
        assert!((below_early.predicted - 90.0).abs() < 1e-9, "got {}", below_early.predicted);
        assert_eq!(below_early.bucket, PickupBucket::Midday, "89.996 is below 90");

        let below_midday = forecast_bin(&BinId::from("B"), &[69.996]).expect("non-empty");
        assert!((below_midday.predicted - 70.0).abs() < 1e-9, "got {}", below_midday.predicted);
        assert_eq!(below_midday.bucket, PickupBucket::Afternoon, "69.996 is below 70");
    }
}
