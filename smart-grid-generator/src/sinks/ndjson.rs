use bytes::Bytes;
use smart_grid_client::MeterReading;
use uuid::Uuid;

use crate::pipeline::PipelineError;

/// One batch ready for upload: a unique destination path plus its body.
#[derive(Debug, Clone)]
pub struct SerializedBatch {
    pub path: String,
    pub body: Bytes,
}

/// `{folder}/smartGridData-{uuid}.json`, with a fresh v4 uuid on every call.
pub fn data_file_path(folder: &str) -> String {
    let file_name = format!("smartGridData-{}.json", Uuid::new_v4());
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name
    } else {
        format!("{folder}/{file_name}")
    }
}

/// Encode readings as newline-delimited JSON, one object per line and no
/// trailing newline.
pub fn encode_readings(readings: &[MeterReading]) -> Result<Bytes, PipelineError> {
    // Heuristic capacity: ~120 bytes per line.
    let mut out = Vec::with_capacity(readings.len().saturating_mul(120));
    for (i, reading) in readings.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        serde_json::to_writer(&mut out, reading)
            .map_err(|e| PipelineError::Serialize(format!("failed to encode reading {}: {e}", reading.meter_id)))?;
    }
    Ok(Bytes::from(out))
}

pub fn serialize_batch(readings: &[MeterReading], folder: &str) -> Result<SerializedBatch, PipelineError> {
    Ok(SerializedBatch {
        path: data_file_path(folder),
        body: encode_readings(readings)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample() -> Vec<MeterReading> {
        vec![
            MeterReading::at("98001", 1, 8.0, datetime!(2024-03-01 08:00:00 UTC)),
            MeterReading::at("98002", 4, 13.371, datetime!(2024-03-01 08:00:00.5 UTC)),
            MeterReading::new("98003", 2, 20.0),
        ]
    }

    #[test]
    fn path_is_under_folder_with_uuid_name() {
        let path = data_file_path("raw/smart-grid/");
        let name = path.strip_prefix("raw/smart-grid/smartGridData-").unwrap();
        let id = name.strip_suffix(".json").unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn path_without_folder_is_bare_file_name() {
        assert!(data_file_path("").starts_with("smartGridData-"));
    }

    #[test]
    fn body_has_one_json_line_per_reading() {
        let body = encode_readings(&sample()).unwrap();
        let text = std::str::from_utf8(&body).unwrap();

        assert!(!text.ends_with('\n'));
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            for key in ["meterId", "measurementInKWh", "zipCode", "measurementDate"] {
                assert!(v.get(key).is_some(), "missing {key}");
            }
        }
    }

    #[test]
    fn body_decodes_to_original_readings() {
        let readings = sample();
        let body = encode_readings(&readings).unwrap();

        let decoded: Vec<MeterReading> = std::str::from_utf8(&body)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(decoded, readings);
    }

    #[test]
    fn full_precision_measurements_decode_exactly() {
        use crate::sources::synthesize_readings;
        use rand::{rngs::StdRng, SeedableRng};

        let zip_codes: Vec<String> = (98001..=98100).map(|z: u32| z.to_string()).collect();
        let readings = synthesize_readings(&zip_codes, &[1, 2, 3, 4], 100, &mut StdRng::seed_from_u64(11));
        let body = encode_readings(&readings).unwrap();

        let decoded: Vec<MeterReading> = std::str::from_utf8(&body)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(decoded.len(), 10_000);
        for (orig, back) in readings.iter().zip(&decoded) {
            assert_eq!(orig.measurement_in_kwh.to_bits(), back.measurement_in_kwh.to_bits());
        }
        assert_eq!(decoded, readings);
    }

    #[test]
    fn same_readings_get_same_body_but_new_path() {
        let readings = sample();
        let a = serialize_batch(&readings, "out").unwrap();
        let b = serialize_batch(&readings, "out").unwrap();

        assert_eq!(a.body, b.body);
        assert_ne!(a.path, b.path);
    }

    #[test]
    fn empty_batch_encodes_to_empty_body() {
        assert!(encode_readings(&[]).unwrap().is_empty());
    }
}
