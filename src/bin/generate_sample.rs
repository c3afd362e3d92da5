use std::path::Path;
use std::sync::Arc;

use arrow::array::{Int16Array, Int32Array, Int64Array, Int8Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Years covered by the published registration data.
const YEAR_RANGE: (i32, i32) = (1984, 2022);

/// Seeded splitmix64 stream.
struct Noise(u64);

impl Noise {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        (z >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Registrations around `mean`, Poisson-like spread.
    fn registrations(&mut self, mean: f64) -> i64 {
        let u1 = self.next_unit().max(1e-15);
        let u2 = self.next_unit();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        (mean + mean.sqrt().max(0.5) * z).round() as i64
    }
}

/// One synthetic name: spelling, gender code, yearly popularity at the start
/// of the range, and relative change per year.
struct NameProfile {
    name: &'static str,
    gender: i8,
    base: f64,
    trend: f64,
}

#[derive(Default)]
struct Columns {
    year: Vec<i32>,
    district: Vec<i16>,
    gender: Vec<i8>,
    name: Vec<String>,
    count: Vec<i64>,
}

fn main() {
    let mut noise = Noise(42);

    // District ISO codes with a population weight.
    let districts: [(i16, f64); 6] = [
        (101, 0.6),
        (201, 1.0),
        (302, 0.8),
        (401, 1.4),
        (501, 0.9),
        (601, 1.7),
    ];

    let names = [
        NameProfile { name: "Anna", gender: 2, base: 40.0, trend: -0.01 },
        NameProfile { name: "Maria", gender: 2, base: 30.0, trend: -0.03 },
        NameProfile { name: "Emma", gender: 2, base: 5.0, trend: 0.06 },
        NameProfile { name: "Lena", gender: 2, base: 12.0, trend: 0.01 },
        NameProfile { name: "Alex", gender: 2, base: 0.6, trend: 0.02 },
        NameProfile { name: "Alex", gender: 1, base: 3.0, trend: 0.0 },
        NameProfile { name: "Lukas", gender: 1, base: 25.0, trend: 0.0 },
        NameProfile { name: "Jonas", gender: 1, base: 8.0, trend: 0.04 },
        NameProfile { name: "Florian", gender: 1, base: 20.0, trend: -0.02 },
        NameProfile { name: "Quirin", gender: 1, base: 0.4, trend: 0.0 },
    ];

    let mut columns = Columns::default();

    for year in YEAR_RANGE.0..=YEAR_RANGE.1 {
        let age = (year - YEAR_RANGE.0) as f64;
        for profile in &names {
            let expected = profile.base * (1.0 + profile.trend).powf(age);
            for &(district, weight) in &districts {
                let count = noise.registrations(expected * weight);
                // The published data has no zero rows.
                if count <= 0 {
                    continue;
                }
                columns.year.push(year);
                columns.district.push(district);
                columns.gender.push(profile.gender);
                columns.name.push(profile.name.to_string());
                columns.count.push(count);
            }
        }
    }

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "OGDEXT_VORNAMEN_1.parquet".to_string());

    if output_path.ends_with(".csv") {
        write_csv(Path::new(&output_path), &columns);
    } else {
        write_parquet(Path::new(&output_path), columns.to_batch());
    }

    println!(
        "Wrote {} registrations ({} names, years {}-{}) to {output_path}",
        columns.year.len(),
        names.len(),
        YEAR_RANGE.0,
        YEAR_RANGE.1
    );
}

impl Columns {
    fn to_batch(&self) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("C-JAHR-0", DataType::Int32, false),
            Field::new("C-WOHNBEZIRK-0", DataType::Int16, false),
            Field::new("C-GESCHLECHT-0", DataType::Int8, false),
            Field::new("F-VORNAME_NORMALISIERT", DataType::Utf8, false),
            Field::new("F-ANZAHL_LGEB", DataType::Int64, false),
        ]));

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(self.year.clone())),
                Arc::new(Int16Array::from(self.district.clone())),
                Arc::new(Int8Array::from(self.gender.clone())),
                Arc::new(StringArray::from(
                    self.name.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(self.count.clone())),
            ],
        )
        .expect("Failed to create RecordBatch")
    }
}

fn write_parquet(path: &Path, batch: RecordBatch) {
    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

/// Same layout as the published CSV: `;`-separated with the original headers.
fn write_csv(path: &Path, columns: &Columns) {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .expect("Failed to create output file");
    writer
        .write_record([
            "C-JAHR-0",
            "C-WOHNBEZIRK-0",
            "C-GESCHLECHT-0",
            "F-VORNAME_NORMALISIERT",
            "F-ANZAHL_LGEB",
        ])
        .expect("Failed to write header");
    for i in 0..columns.year.len() {
        writer
            .write_record([
                columns.year[i].to_string(),
                columns.district[i].to_string(),
                columns.gender[i].to_string(),
                columns.name[i].clone(),
                columns.count[i].to_string(),
            ])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}
