use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng, rngs::StdRng};

pub const HEADER: &str =
    "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome";

/// Widely cited first row of the public dataset, labeled diabetic.
pub const REFERENCE_ROW: [f64; 8] = [6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0];

/// Pima-shaped CSV whose label follows glucose, with a gap around the boundary.
///
/// Roughly a third of the rows are diabetic; the first row is [`REFERENCE_ROW`].
pub fn synthetic_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = format!("{HEADER}\n6,148,72,35,0,33.6,0.627,50,1\n");
    for _ in 1..rows {
        let diabetic = rng.random_bool(0.35);
        let glucose = if diabetic {
            rng.random_range(135..200)
        } else {
            rng.random_range(65..118)
        };
        let bmi: f64 = if diabetic {
            rng.random_range(27.0..45.0)
        } else {
            rng.random_range(18.0..38.0)
        };
        text.push_str(&format!(
            "{},{},{},{},{},{:.1},{:.3},{},{}\n",
            rng.random_range(0..12),
            glucose,
            rng.random_range(50..100),
            rng.random_range(0..50),
            rng.random_range(0..300),
            bmi,
            rng.random_range(0.08..1.6),
            rng.random_range(21..75),
            u8::from(diabetic),
        ));
    }
    text
}

pub fn write_synthetic_csv(dir: &Path, rows: usize, seed: u64) -> PathBuf {
    let path = dir.join("diabetes.csv");
    std::fs::write(&path, synthetic_csv(rows, seed)).unwrap();
    path
}
