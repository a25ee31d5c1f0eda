use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single smart-meter measurement as it is written to the data lake.
///
/// Field names on the wire follow the downstream JSON contract
/// (`meterId`, `measurementInKWh`, `zipCode`, `measurementDate`), with the
/// date rendered as RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReading {
    pub meter_id: String,
    #[serde(rename = "measurementInKWh")]
    pub measurement_in_kwh: f64,
    pub zip_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub measurement_date: OffsetDateTime,
}

impl MeterReading {
    /// Build a reading stamped with the current wall-clock time.
    pub fn new(zip_code: impl Into<String>, meter_index: u32, measurement_in_kwh: f64) -> Self {
        Self::at(zip_code, meter_index, measurement_in_kwh, OffsetDateTime::now_utc())
    }

    pub fn at(
        zip_code: impl Into<String>,
        meter_index: u32,
        measurement_in_kwh: f64,
        measurement_date: OffsetDateTime,
    ) -> Self {
        let zip_code = zip_code.into();
        Self {
            meter_id: meter_id(&zip_code, meter_index),
            measurement_in_kwh,
            zip_code,
            measurement_date,
        }
    }
}

/// Composite meter identifier, `{zip_code}-{meter_index}`.
pub fn meter_id(zip_code: &str, meter_index: u32) -> String {
    format!("{zip_code}-{meter_index}")
}
