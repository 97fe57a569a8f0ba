use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::{
    models::bar::Bar,
    providers::{ApiSnafu, DecodeSnafu, ProviderError},
};

/// Bitstamp encodes numbers as JSON strings; accept either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum {
    Str(String),
    Num(serde_json::Number),
}

fn de_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match StrOrNum::deserialize(d)? {
        StrOrNum::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        StrOrNum::Num(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom(format!("not a float: {n}"))),
    }
}

fn de_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match StrOrNum::deserialize(d)? {
        StrOrNum::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        StrOrNum::Num(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("not an integer: {n}"))),
    }
}

#[derive(Deserialize, Debug)]
pub struct BitstampBar {
    #[serde(deserialize_with = "de_i64")]
    pub timestamp: i64,
    #[serde(deserialize_with = "de_f64")]
    pub open: f64,
    #[serde(deserialize_with = "de_f64")]
    pub high: f64,
    #[serde(deserialize_with = "de_f64")]
    pub low: f64,
    #[serde(deserialize_with = "de_f64")]
    pub close: f64,
    #[serde(deserialize_with = "de_f64")]
    pub volume: f64,
}

impl From<BitstampBar> for Bar {
    fn from(b: BitstampBar) -> Self {
        Bar::new(b.timestamp, b.open, b.high, b.low, b.close, b.volume)
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct BitstampOhlcData {
    #[serde(default)]
    pub pair: Option<String>,
    #[serde(default)]
    pub ohlc: Vec<BitstampBar>,
}

/// Envelope for both success and error bodies.
#[derive(Deserialize, Debug, Default)]
pub struct BitstampResponse {
    #[serde(default)]
    pub data: Option<BitstampOhlcData>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub reason: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

impl BitstampResponse {
    /// Parses a raw body. A missing `data.ohlc` is an empty result.
    pub fn parse(body: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(body).map_err(|e| {
            DecodeSnafu {
                message: e.to_string(),
            }
            .build()
        })
    }

    pub fn into_bars(self) -> Result<Vec<Bar>, ProviderError> {
        let is_error = self.status.as_deref() == Some("error")
            || self.errors.as_ref().is_some_and(|e| !e.is_empty());
        if is_error {
            let mut parts = Vec::new();
            if let Some(code) = &self.code {
                parts.push(code.clone());
            }
            if let Some(reason) = &self.reason {
                parts.push(reason.to_string());
            }
            for e in self.errors.iter().flatten() {
                parts.push(e.to_string());
            }
            return ApiSnafu {
                message: parts.join("; "),
            }
            .fail();
        }

        Ok(self
            .data
            .unwrap_or_default()
            .ohlc
            .into_iter()
            .map(Bar::from)
            .collect())
    }
}
