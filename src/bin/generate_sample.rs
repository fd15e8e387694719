use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

const FEATURES: [&str; 4] = ["sepal length", "sepal width", "petal length", "petal width"];

/// Per-class mean and standard deviation of each feature, plus how strongly
/// the petal measurements follow sepal length.
struct ClassProfile {
    name: &'static str,
    means: [f64; 4],
    std_devs: [f64; 4],
    coupling: f64,
}

const CLASSES: [ClassProfile; 3] = [
    ClassProfile {
        name: "setosa",
        means: [5.0, 3.4, 1.5, 0.25],
        std_devs: [0.35, 0.38, 0.17, 0.1],
        coupling: 0.2,
    },
    ClassProfile {
        name: "versicolor",
        means: [5.9, 2.8, 4.3, 1.3],
        std_devs: [0.5, 0.31, 0.47, 0.2],
        coupling: 0.7,
    },
    ClassProfile {
        name: "virginica",
        means: [6.6, 3.0, 5.6, 2.0],
        std_devs: [0.63, 0.32, 0.55, 0.27],
        coupling: 0.85,
    },
];

fn sample_flower(profile: &ClassProfile, rng: &mut SimpleRng) -> [f64; 4] {
    let z0 = rng.gauss(0.0, 1.0);
    let mut out = [0.0; 4];
    for (i, slot) in out.iter_mut().enumerate() {
        let own = rng.gauss(0.0, 1.0);
        // Petal features share part of their noise with sepal length.
        let z = if i >= 2 {
            profile.coupling * z0 + (1.0 - profile.coupling.powi(2)).sqrt() * own
        } else if i == 0 {
            z0
        } else {
            own
        };
        let v = profile.means[i] + profile.std_devs[i] * z;
        *slot = (v.max(0.1) * 10.0).round() / 10.0;
    }
    out
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let per_class = 50;
    let mut classes: Vec<&str> = Vec::new();
    let mut columns: [Vec<f64>; 4] = Default::default();

    for profile in &CLASSES {
        for _ in 0..per_class {
            let flower = sample_flower(profile, &mut rng);
            for (col, v) in columns.iter_mut().zip(flower) {
                col.push(v);
            }
            classes.push(profile.name);
        }
    }

    // CSV, with one malformed record and a trailing blank record the way
    // hand-exported files often end.
    let csv_path = "sample_iris.csv";
    let mut writer = csv::Writer::from_path(csv_path).context("creating CSV output")?;
    writer.write_record(FEATURES.iter().copied().chain(["class"]))?;
    for (row, class) in classes.iter().enumerate() {
        let mut record: Vec<String> = columns.iter().map(|c| c[row].to_string()).collect();
        if row == 17 {
            record[1] = "n/a".to_string();
        }
        record.push(class.to_string());
        writer.write_record(&record)?;
    }
    writer.write_record(["", "", "", "", ""])?;
    writer.flush()?;

    // Parquet with the same rows (no malformed one).
    let mut fields: Vec<Field> = FEATURES
        .iter()
        .map(|name| Field::new(*name, DataType::Float64, false))
        .collect();
    fields.push(Field::new("class", DataType::Utf8, false));
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<Arc<dyn arrow::array::Array>> = columns
        .iter()
        .map(|c| Arc::new(Float64Array::from(c.clone())) as Arc<dyn arrow::array::Array>)
        .collect();
    arrays.push(Arc::new(StringArray::from(classes.clone())));

    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let parquet_path = "sample_iris.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    let preview = pretty_format_batches(&[batch.slice(0, 5)]).context("formatting preview")?;
    println!("{preview}");
    println!(
        "Wrote {} flowers in {} classes to {csv_path} and {parquet_path}",
        classes.len(),
        CLASSES.len()
    );
    Ok(())
}
