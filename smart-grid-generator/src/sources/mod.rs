pub mod synthetic;

pub use synthetic::{synthesize_readings, MEASUREMENT_MAX, MEASUREMENT_MIN};
