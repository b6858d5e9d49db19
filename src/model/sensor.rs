//! Per-floor sensor snapshot.
//!
//! Every reading is optional: `None` means "no signal", which is different
//! from a reading of `0.0`.

use serde::{Deserialize, Deserializer, Serialize};

/// One snapshot of the sensors on a floor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    /// Numeric intensity; digital sensors reporting a boolean coerce to 1.0 / 0.0.
    #[serde(default, deserialize_with = "flame_reading", skip_serializing_if = "Option::is_none")]
    pub flame: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<bool>,
    /// Identity reported by face recognition, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Numeric features tracked by the anomaly detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Temp,
    Humidity,
    Gas,
    Vibration,
    Flame,
}

impl Feature {
    pub const ALL: [Feature; 5] =
        [Feature::Temp, Feature::Humidity, Feature::Gas, Feature::Vibration, Feature::Flame];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Temp => "temp",
            Feature::Humidity => "humidity",
            Feature::Gas => "gas",
            Feature::Vibration => "vibration",
            Feature::Flame => "flame",
        }
    }
}

impl SensorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temp(mut self, v: f64) -> Self {
        self.temp = Some(v);
        self
    }

    pub fn with_humidity(mut self, v: f64) -> Self {
        self.humidity = Some(v);
        self
    }

    pub fn with_gas(mut self, v: f64) -> Self {
        self.gas = Some(v);
        self
    }

    pub fn with_vibration(mut self, v: f64) -> Self {
        self.vibration = Some(v);
        self
    }

    pub fn with_flame(mut self, v: f64) -> Self {
        self.flame = Some(v);
        self
    }

    pub fn with_motion(mut self, motion: bool) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reading for a numeric feature. NaN counts as absent.
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        let value = match feature {
            Feature::Temp => self.temp,
            Feature::Humidity => self.humidity,
            Feature::Gas => self.gas,
            Feature::Vibration => self.vibration,
            Feature::Flame => self.flame,
        };
        value.filter(|v| !v.is_nan())
    }
}

fn flame_reading<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Level(f64),
        Detected(bool),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Level(v) => v,
        Raw::Detected(true) => 1.0,
        Raw::Detected(false) => 0.0,
    }))
}
