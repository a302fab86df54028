//! Domain data structures for bins, fill history, routes, and forecasts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
/// Identifier for a physical waste bin.
pub struct BinId(pub String);

impl fmt::Display for BinId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for BinId {
    fn from(id: &str) -> Self {
        BinId(id.to_owned())
    }
}

impl From<String> for BinId {
    fn from(id: String) -> Self {
        BinId(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Geographic position in decimal degrees.
pub struct Coordinate {
    /// Latitude, expected within `[-90, 90]`.
    pub lat: f64,
    /// Longitude, expected within `[-180, 180]`.
    pub lon: f64,
}

impl Coordinate {
    /// Construct a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Snapshot of a single bin at request time.
pub struct Bin {
    /// Unique identifier.
    pub id: BinId,
    /// Where the bin stands.
    pub coordinate: Coordinate,
    /// Current fill level in percent (0–100).
    pub fill_level: f64,
}

impl Bin {
    /// Construct a bin snapshot.
    #[must_use]
    pub fn new<I: Into<BinId>>(id: I, coordinate: Coordinate, fill_level: f64) -> Self {
        Self {
            id: id.into(),
            coordinate,
            fill_level,
        }
    }

    /// Marker band used when drawing this bin.
    #[must_use]
    pub fn band(&self) -> FillBand {
        FillBand::from_fill(self.fill_level)
    }
}

/// Keep bins whose fill level is at or above `threshold`, preserving input order.
#[must_use]
pub fn flag_bins(bins: &[Bin], threshold: f64) -> Vec<Bin> {
    bins.iter()
        .filter(|bin| bin.fill_level >= threshold)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One historical fill reading.
pub struct HistorySample {
    /// Bin the reading belongs to.
    pub bin: BinId,
    /// Ordinal day of the reading as recorded by the source.
    pub day: u32,
    /// Fill level in percent.
    pub fill_level: f64,
}

/// Group samples by bin, keeping each bin's samples in insertion order.
///
/// Insertion order is treated as temporal order; the recorded `day` is carried for
/// display only and does not reorder anything.
#[must_use]
pub fn group_history(samples: &[HistorySample]) -> BTreeMap<BinId, Vec<f64>> {
    let mut grouped = BTreeMap::<BinId, Vec<f64>>::new();
    for sample in samples {
        grouped
            .entry(sample.bin.clone())
            .or_default()
            .push(sample.fill_level);
    }
    grouped
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Ordered visiting sequence over flagged bins.
pub struct Route {
    /// Bins in visiting order. Each flagged bin appears exactly once.
    pub stops: Vec<BinId>,
    /// Length of the open path through `stops` in kilometers.
    pub distance_km: f64,
}

impl Route {
    /// Number of stops on the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Whether the route visits no bins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Pickup time slot derived from a predicted fill level.
pub enum PickupBucket {
    /// First round of the day.
    Early,
    /// Late-morning round.
    Midday,
    /// Afternoon round.
    Afternoon,
}

impl PickupBucket {
    /// Bucket for a predicted fill level.
    #[must_use]
    pub fn from_prediction(predicted: f64) -> Self {
        if predicted >= 90.0 {
            PickupBucket::Early
        } else if predicted >= 70.0 {
            PickupBucket::Midday
        } else {
            PickupBucket::Afternoon
        }
    }

    /// Wall-clock pickup time shown to crews.
    #[must_use]
    pub fn time_label(self) -> &'static str {
        match self {
            PickupBucket::Early => "08:00 AM",
            PickupBucket::Midday => "11:00 AM",
            PickupBucket::Afternoon => "03:00 PM",
        }
    }
}

impl fmt::Display for PickupBucket {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            PickupBucket::Early => "early",
            PickupBucket::Midday => "midday",
            PickupBucket::Afternoon => "afternoon",
        };
        write!(formatter, "{slug}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Coarse fill band used for marker colouring.
pub enum FillBand {
    /// 80% and above.
    High,
    /// 50% up to 80%.
    Medium,
    /// Below 50%.
    Low,
}

impl FillBand {
    /// Band for a current fill level.
    #[must_use]
    pub fn from_fill(fill_level: f64) -> Self {
        if fill_level >= 80.0 {
            FillBand::High
        } else if fill_level >= 50.0 {
            FillBand::Medium
        } else {
            FillBand::Low
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// Next-day predictions and the pickup schedule derived from them.
///
/// A bin without history is absent from both maps; absence means "no forecast".
pub struct Forecast {
    /// Predicted fill level per bin, rounded to two decimals and not clamped.
    pub predictions: BTreeMap<BinId, f64>,
    /// Pickup bucket per bin.
    pub schedule: BTreeMap<BinId, PickupBucket>,
}

impl Forecast {
    /// Whether no bin received a forecast.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Alert raised for a flagged bin.
pub struct FillAlert {
    /// Bin that crossed the threshold.
    pub bin: BinId,
    /// Fill level at the time of the snapshot.
    pub fill_level: f64,
}

impl FillAlert {
    /// Human-readable alert line.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Bin {} is {}% full!", self.bin, self.fill_level)
    }

    /// Body sent through notification channels.
    #[must_use]
    pub fn notification(&self) -> String {
        format!("Bin {} has reached {}% fill level!", self.bin, self.fill_level)
    }
}

impl From<&Bin> for FillAlert {
    fn from(bin: &Bin) -> Self {
        Self {
            bin: bin.id.clone(),
            fill_level: bin.fill_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(id: &str, fill_level: f64) -> Bin {
        Bin::new(id, Coordinate::new(18.52, 73.85), fill_level)
    }

    #[test]
    fn flagging_keeps_input_order_and_includes_threshold() {
        let bins = vec![bin("B1", 85.0), bin("B2", 40.0), bin("B3", 92.0), bin("B4", 80.0)];
        let flagged = flag_bins(&bins, 80.0);
        let ids: Vec<&str> = flagged.iter().map(|bin| bin.id.0.as_str()).collect();
        assert_eq!(ids, ["B1", "B3", "B4"], "flagged bins keep snapshot order");
    }

    #[test]
    fn grouping_preserves_insertion_order_per_bin() {
        let samples = vec![
            HistorySample { bin: "A".into(), day: 5, fill_level: 30.0 },
            HistorySample { bin: "B".into(), day: 0, fill_level: 1.0 },
            HistorySample { bin: "A".into(), day: 1, fill_level: 10.0 },
        ];
        let grouped = group_history(&samples);
        assert_eq!(grouped.get(&BinId::from("A")), Some(&vec![30.0, 10.0]), "no reordering by day");
        assert_eq!(grouped.get(&BinId::from("B")), Some(&vec![1.0]), "single sample kept");
    }

    #[test]
    fn pickup_bucket_boundaries() {
        assert_eq!(PickupBucket::from_prediction(90.0), PickupBucket::Early, "90 is early");
        assert_eq!(PickupBucket::from_prediction(89.99), PickupBucket::Midday, "just below 90");
        assert_eq!(PickupBucket::from_prediction(70.0), PickupBucket::Midday, "70 is midday");
        assert_eq!(PickupBucket::from_prediction(69.99), PickupBucket::Afternoon, "below 70");
        assert_eq!(PickupBucket::from_prediction(-5.0), PickupBucket::Afternoon, "unclamped low");
        assert_eq!(PickupBucket::Early.time_label(), "08:00 AM", "early slot label");
    }

    #[test]
    fn fill_bands_follow_marker_colours() {
        assert_eq!(FillBand::from_fill(80.0), FillBand::High, "80 is high");
        assert_eq!(FillBand::from_fill(79.9), FillBand::Medium, "below 80");
        assert_eq!(FillBand::from_fill(50.0), FillBand::Medium, "50 is medium");
        assert_eq!(FillBand::from_fill(49.9), FillBand::Low, "below 50");
    }

    #[test]
    fn alert_message_mentions_bin_and_fill() {
        let alert = FillAlert::from(&bin("Bin003", 92.0));
        assert_eq!(alert.message(), "Bin Bin003 is 92% full!", "f64 display drops .0");
        assert_eq!(
            alert.notification(),
            "Bin Bin003 has reached 92% fill level!",
            "notification body"
        );
    }
}
