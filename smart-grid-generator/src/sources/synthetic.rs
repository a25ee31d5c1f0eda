use rand::{seq::IndexedRandom, Rng};
use smart_grid_client::MeterReading;

pub const MEASUREMENT_MIN: f64 = 8.0;
pub const MEASUREMENT_MAX: f64 = 20.0;

/// Generate `zip_codes.len() * readings_per_zip` readings for one batch.
///
/// Every reading draws its zip code and meter index independently, with
/// replacement, so a zip code gets `readings_per_zip` readings on average
/// rather than exactly. Measurements are uniform over
/// `[MEASUREMENT_MIN, MEASUREMENT_MAX]` and stamped with the current time.
///
/// `zip_codes` and `meter_ids` must be non-empty. Debug builds assert this;
/// release builds return an empty list instead of panicking.
pub fn synthesize_readings<R>(
    zip_codes: &[String],
    meter_ids: &[u32],
    readings_per_zip: usize,
    rng: &mut R,
) -> Vec<MeterReading>
where
    R: Rng + ?Sized,
{
    debug_assert!(
        !zip_codes.is_empty() && !meter_ids.is_empty(),
        "synthesize_readings needs at least one zip code and one meter id"
    );

    let count = zip_codes.len() * readings_per_zip;
    let mut readings = Vec::with_capacity(count);

    for _ in 0..count {
        let (Some(&meter_index), Some(zip_code)) = (meter_ids.choose(rng), zip_codes.choose(rng)) else {
            break;
        };
        let kwh = rng.random_range(MEASUREMENT_MIN..=MEASUREMENT_MAX);
        readings.push(MeterReading::new(zip_code.as_str(), meter_index, kwh));
    }

    metrics::counter!("smart_grid_readings_generated_total").increment(readings.len() as u64);
    readings
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn zips(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|z| z.to_string()).collect()
    }

    #[test]
    fn produces_readings_per_zip_for_every_zip() {
        let mut rng = StdRng::seed_from_u64(7);
        let zip_codes = zips(&["98001", "98002", "98003"]);

        let readings = synthesize_readings(&zip_codes, &[1, 2, 3, 4], 5, &mut rng);
        assert_eq!(readings.len(), 15);
    }

    #[test]
    fn readings_stay_within_inputs_and_interval() {
        let mut rng = StdRng::seed_from_u64(42);
        let zip_codes = zips(&["98010", "98011"]);
        let meter_ids = [1, 2];

        for r in synthesize_readings(&zip_codes, &meter_ids, 500, &mut rng) {
            assert!(zip_codes.contains(&r.zip_code));
            assert!(r.measurement_in_kwh >= MEASUREMENT_MIN && r.measurement_in_kwh <= MEASUREMENT_MAX);

            let (zip, index) = r.meter_id.rsplit_once('-').unwrap();
            assert_eq!(zip, r.zip_code);
            assert!(meter_ids.contains(&index.parse::<u32>().unwrap()));
        }
    }

    #[test]
    fn draws_cover_every_zip_code_and_meter() {
        let mut rng = StdRng::seed_from_u64(1);
        let zip_codes = zips(&["98001", "98002"]);

        let readings = synthesize_readings(&zip_codes, &[1, 2], 200, &mut rng);
        for zip in &zip_codes {
            assert!(readings.iter().any(|r| &r.zip_code == zip));
        }
        for id in ["98001-1", "98001-2", "98002-1", "98002-2"] {
            assert!(readings.iter().any(|r| r.meter_id == id), "missing {id}");
        }
    }

    #[test]
    #[should_panic(expected = "at least one zip code and one meter id")]
    #[cfg(debug_assertions)]
    fn empty_meter_ids_violate_precondition() {
        let mut rng = StdRng::seed_from_u64(5);
        synthesize_readings(&zips(&["98001"]), &[], 1, &mut rng);
    }

    #[test]
    fn zero_readings_per_zip_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let readings = synthesize_readings(&zips(&["98001"]), &[1], 0, &mut rng);
        assert!(readings.is_empty());
    }
}
