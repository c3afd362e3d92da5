use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type, UInt32Type, UInt64Type,
    UInt8Type,
};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{DistrictValue, Gender, NamesDataset, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the registration table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – `;`-separated (the published format) or `,`-separated
/// * `.parquet` – one row per registration, integer or string columns
/// * `.json`    – `[{ "Year": 2000, "District": 101, ... }, ...]`
///
/// Columns may carry either the published headers (`C-JAHR-0`, ...) or the
/// short names (`Year`, `District`, `Gender`, `Name`, `Count`). A missing
/// column or an unreadable value aborts the load.
pub fn load_file(path: &Path) -> Result<NamesDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    let dataset = NamesDataset::from_records(records);
    info!(
        "loaded {} records from {} ({} districts, years {:?})",
        dataset.len(),
        path.display(),
        dataset.districts().len(),
        dataset.year_span()
    );
    for record in dataset.head(5) {
        debug!("{record:?}");
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Column naming
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Year,
    District,
    Gender,
    Name,
    Count,
}

impl Column {
    const ALL: [Column; 5] = [
        Column::Year,
        Column::District,
        Column::Gender,
        Column::Name,
        Column::Count,
    ];

    fn label(self) -> &'static str {
        match self {
            Column::Year => "Year",
            Column::District => "District",
            Column::Gender => "Gender",
            Column::Name => "Name",
            Column::Count => "Count",
        }
    }

    /// Header names accepted for this column, compared ignoring ASCII case.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Year => &["Year", "C-JAHR-0"],
            Column::District => &["District", "C-WOHNBEZIRK-0"],
            Column::Gender => &["Gender", "C-GESCHLECHT-0"],
            Column::Name => &["Name", "F-VORNAME_NORMALISIERT"],
            Column::Count => &["Count", "F-ANZAHL_LGEB", "c"],
        }
    }

    fn matches(self, header: &str) -> bool {
        let header = header.trim_start_matches('\u{feff}').trim();
        self.aliases().iter().any(|a| a.eq_ignore_ascii_case(header))
    }
}

/// Position of every required column, in [`Column::ALL`] order.
fn locate_columns(headers: &[&str], source: &str) -> Result<[usize; 5]> {
    let mut positions = [0usize; 5];
    for (slot, column) in positions.iter_mut().zip(Column::ALL) {
        *slot = headers
            .iter()
            .position(|h| column.matches(h))
            .with_context(|| format!("{source} missing '{}' column", column.label()))?;
    }
    Ok(positions)
}

fn to_gender(code: i64) -> Result<Gender> {
    let code = u8::try_from(code).with_context(|| format!("gender code {code} out of range"))?;
    Ok(Gender::try_from(code)?)
}

fn to_count(count: i64) -> Result<u64> {
    u64::try_from(count).with_context(|| format!("negative count {count}"))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, then one registration per line.
/// The published file uses `;` as separator; `,` is accepted as well.
fn load_csv(path: &Path) -> Result<Vec<Record>> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening CSV")?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let [year_idx, district_idx, gender_idx, name_idx, count_idx] =
        locate_columns(&header_refs, "CSV")?;

    let columns = [year_idx, district_idx, gender_idx, name_idx, count_idx];
    let mut records = Vec::new();

    // Line numbers as seen in an editor: 1-based, after the header line.
    for (line, result) in (2..).zip(reader.records()) {
        let record = result.with_context(|| format!("CSV line {line}"))?;
        records.push(csv_record(&record, columns).with_context(|| format!("CSV line {line}"))?);
    }

    Ok(records)
}

fn csv_record(record: &csv::StringRecord, columns: [usize; 5]) -> Result<Record> {
    let [year_idx, district_idx, gender_idx, name_idx, count_idx] = columns;

    let year = parse_int(csv_field(record, year_idx, "Year")?, "Year")?;
    let year = i32::try_from(year).with_context(|| format!("year {year} out of range"))?;
    let gender = parse_int(csv_field(record, gender_idx, "Gender")?, "Gender")?;
    let count = parse_int(csv_field(record, count_idx, "Count")?, "Count")?;

    Ok(Record {
        year,
        district: csv_field(record, district_idx, "District")?.to_string(),
        gender: to_gender(gender)?,
        name: csv_field(record, name_idx, "Name")?.to_string(),
        count: to_count(count)?,
    })
}

fn csv_field<'r>(record: &'r csv::StringRecord, idx: usize, col: &str) -> Result<&'r str> {
    record
        .get(idx)
        .map(str::trim)
        .with_context(|| format!("missing '{col}' value"))
}

/// Pick `;` unless the header line only splits on `,`.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    use std::io::BufRead;

    let file = std::fs::File::open(path).context("opening CSV")?;
    let mut first_line = String::new();
    std::io::BufReader::new(file)
        .read_line(&mut first_line)
        .context("reading CSV header line")?;

    if !first_line.contains(';') && first_line.contains(',') {
        Ok(b',')
    } else {
        Ok(b';')
    }
}

fn parse_int(s: &str, col: &str) -> Result<i64> {
    s.parse::<i64>()
        .with_context(|| format!("{col}: '{s}' is not an integer"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// One JSON row. Keys follow the same aliases as the CSV / Parquet headers.
#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(alias = "C-JAHR-0", alias = "year")]
    #[serde(rename = "Year")]
    year: i32,
    #[serde(alias = "C-WOHNBEZIRK-0", alias = "district")]
    #[serde(rename = "District")]
    district: DistrictValue,
    #[serde(alias = "C-GESCHLECHT-0", alias = "gender")]
    #[serde(rename = "Gender")]
    gender: Gender,
    #[serde(alias = "F-VORNAME_NORMALISIERT", alias = "name")]
    #[serde(rename = "Name")]
    name: String,
    #[serde(alias = "F-ANZAHL_LGEB", alias = "count", alias = "c")]
    #[serde(rename = "Count")]
    count: u64,
}

impl From<JsonRecord> for Record {
    fn from(raw: JsonRecord) -> Self {
        Record {
            year: raw.year,
            district: raw.district.into(),
            gender: raw.gender,
            name: raw.name,
            count: raw.count,
        }
    }
}

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`).
fn load_json(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<JsonRecord> = serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(rows.into_iter().map(Record::from).collect())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one registration per row.
///
/// Year, gender and count may be any integer type; district may be an integer
/// code or a string; name must be a string.
fn load_parquet(path: &Path) -> Result<Vec<Record>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let field_names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let [year_idx, district_idx, gender_idx, name_idx, count_idx] =
        locate_columns(&field_names, "Parquet file")?;

    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut offset = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let year_col = batch.column(year_idx);
        let district_col = batch.column(district_idx);
        let gender_col = batch.column(gender_idx);
        let name_col = batch.column(name_idx);
        let count_col = batch.column(count_idx);

        for row in 0..batch.num_rows() {
            let row_no = offset + row;
            let year = int_value(year_col, row).with_context(|| format!("Row {row_no}: failed to read 'Year'"))?;
            let year = i32::try_from(year).with_context(|| format!("Row {row_no}: year {year} out of range"))?;
            let gender = int_value(gender_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'Gender'"))?;
            let count = int_value(count_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'Count'"))?;

            records.push(Record {
                year,
                district: text_value(district_col, row)
                    .with_context(|| format!("Row {row_no}: failed to read 'District'"))?,
                gender: to_gender(gender).with_context(|| format!("Row {row_no}"))?,
                name: text_value(name_col, row)
                    .with_context(|| format!("Row {row_no}: failed to read 'Name'"))?,
                count: to_count(count).with_context(|| format!("Row {row_no}"))?,
            });
        }
        offset += batch.num_rows();
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Read an integer cell of any integer column type (or a numeric string).
fn int_value(col: &ArrayRef, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null value");
    }
    let value = match col.data_type() {
        DataType::Int8 => col.as_primitive::<Int8Type>().value(row) as i64,
        DataType::Int16 => col.as_primitive::<Int16Type>().value(row) as i64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as i64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row),
        DataType::UInt8 => col.as_primitive::<UInt8Type>().value(row) as i64,
        DataType::UInt16 => col.as_primitive::<UInt16Type>().value(row) as i64,
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row) as i64,
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).with_context(|| format!("value {v} out of range"))?
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let s = text_value(col, row)?;
            s.trim()
                .parse::<i64>()
                .with_context(|| format!("'{s}' is not an integer"))?
        }
        other => bail!("Expected an integer column, got {other:?}"),
    };
    Ok(value)
}

/// Read a cell as text; integer columns are rendered in decimal.
fn text_value(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        _ => Ok(int_value(col, row)?.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Int16Array, Int32Array, Int64Array, Int8Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_with_published_headers_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "names.csv",
            "\u{feff}C-JAHR-0;C-WOHNBEZIRK-0;C-GESCHLECHT-0;F-VORNAME_NORMALISIERT;F-ANZAHL_LGEB\n\
             2000;101;1;Alex;4\n\
             2001;102;2;Maria;5\n",
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.records()[1],
            Record {
                year: 2001,
                district: "102".into(),
                gender: Gender::Female,
                name: "Maria".into(),
                count: 5,
            }
        );
    }

    #[test]
    fn csv_with_commas_and_short_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "names.csv",
            "Name,Count,Year,District,Gender\nJonas,7,1999,Graz,1\n",
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0].name, "Jonas");
        assert_eq!(ds.records()[0].district, "Graz");
        assert_eq!(ds.year_span(), Some((1999, 1999)));
    }

    #[test]
    fn csv_missing_column_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "names.csv", "Year;District;Gender;Name\n2000;1;1;Alex\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'Count' column"));
    }

    #[test]
    fn csv_bad_values_report_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "names.csv",
            "Year;District;Gender;Name;Count\n2000;1;1;Alex;3\n2000;1;7;Alex;3\n",
        );
        let err = format!("{:#}", load_file(&path).unwrap_err());
        assert!(err.contains("CSV line 3"), "{err}");
        assert!(err.contains("unknown gender code 7"), "{err}");

        let path = write_file(
            &dir,
            "negative.csv",
            "Year;District;Gender;Name;Count\n2000;1;1;Alex;-3\n",
        );
        let err = format!("{:#}", load_file(&path).unwrap_err());
        assert!(err.contains("CSV line 2"), "{err}");
        assert!(err.contains("negative count -3"), "{err}");
    }

    #[test]
    fn missing_file_and_unknown_extension_fail() {
        assert!(load_file(Path::new("/definitely/not/here.csv")).is_err());
        let err = load_file(Path::new("names.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn json_accepts_numeric_and_text_districts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "names.json",
            r#"[
                {"Year": 2000, "District": 101, "Gender": 1, "Name": "Alex", "Count": 4},
                {"year": 2001, "district": "Linz", "gender": 2, "name": "Maria", "c": 5}
            ]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0].district, "101");
        assert_eq!(ds.records()[1].district, "Linz");
        assert_eq!(ds.records()[1].count, 5);
    }

    #[test]
    fn json_rejects_unknown_gender() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "names.json",
            r#"[{"Year": 2000, "District": 1, "Gender": 5, "Name": "Alex", "Count": 1}]"#,
        );
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn parquet_with_narrow_integer_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("C-JAHR-0", DataType::Int32, false),
            Field::new("C-WOHNBEZIRK-0", DataType::Int16, false),
            Field::new("C-GESCHLECHT-0", DataType::Int8, false),
            Field::new("F-VORNAME_NORMALISIERT", DataType::Utf8, false),
            Field::new("F-ANZAHL_LGEB", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int32Array::from(vec![2000, 2001])),
                Arc::new(Int16Array::from(vec![101, 902])),
                Arc::new(Int8Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["Alex", "Maria"])),
                Arc::new(Int64Array::from(vec![4, 5])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[1].district, "902");
        assert_eq!(ds.records()[1].gender, Gender::Female);
        assert_eq!(ds.records()[0].count, 4);
    }
}
