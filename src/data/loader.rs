use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Dataset;
use super::parse::{DatasetBuilder, Field};
use super::schema::TableSchema;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.data` / `.txt` – delimited text, delimiter from the schema
/// * `.tsv`     – tab-delimited text
/// * `.json`    – `[{ "class": "setosa", "sepal length": 5.1, ... }, ...]`
/// * `.parquet` – flat columns, one per feature plus the group column
pub fn load_file(path: &Path, schema: &TableSchema) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" | "data" | "txt" => load_delimited(path, schema)?,
        "tsv" => load_delimited(path, &schema.clone().with_delimiter('\t'))?,
        "json" => load_json(path, schema)?,
        "parquet" | "pq" => load_parquet(path, schema)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!(
        "Loaded {} rows in {} groups from {}",
        dataset.len(),
        dataset.group_keys().count(),
        path.display()
    );
    Ok(dataset)
}

fn load_delimited(path: &Path, schema: &TableSchema) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Dataset::parse(&text, schema).context("parsing delimited text")
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "sepal length": 5.1, "sepal width": 3.5, "class": "setosa" },
///   ...
/// ]
/// ```
///
/// Numbers may also be given as numeric strings.
fn load_json(path: &Path, schema: &TableSchema) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut builder = DatasetBuilder::new(schema);

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let group = json_field(obj.get(&schema.group_column));
        let values: Vec<Field<'_>> = schema
            .features
            .iter()
            .map(|f| json_field(obj.get(f)))
            .collect();

        builder.push(i + 1, group, &values);
    }

    Ok(builder.finish()?)
}

fn json_field(val: Option<&JsonValue>) -> Field<'_> {
    match val {
        Some(JsonValue::String(s)) => Field::Text(s),
        Some(JsonValue::Number(n)) => n.as_f64().map(Field::Number).unwrap_or(Field::Missing),
        Some(JsonValue::Bool(b)) => Field::Text(if *b { "true" } else { "false" }),
        // Nested values are neither labels nor measurements.
        Some(JsonValue::Array(_) | JsonValue::Object(_) | JsonValue::Null) | None => Field::Missing,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding one flat column per feature.
///
/// Expected schema:
/// - the group column: Utf8 / LargeUtf8 (or an integer code)
/// - each feature: Float64, Float32, Int64 or Int32
/// - nulls count as missing fields and skip the row
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, schema: &TableSchema) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut dataset = DatasetBuilder::new(schema);
    let mut record_no = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_schema = batch.schema();

        let column = |name: &str| -> Result<Arc<dyn Array>> {
            let idx = batch_schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            Ok(batch.column(idx).clone())
        };

        let group_col = column(schema.group_column.as_str())?;
        let feature_cols = schema
            .features
            .iter()
            .map(column)
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            record_no += 1;
            let group = extract_field(&group_col, row)
                .with_context(|| format!("Row {record_no}: failed to read group column"))?;
            let values = feature_cols
                .iter()
                .map(|col| extract_field(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {record_no}: failed to read features"))?;

            dataset.push(record_no, group, &values);
        }
    }

    Ok(dataset.finish()?)
}

// -- Parquet / Arrow helpers --

/// Extract a single scalar from an Arrow column at the given row.
fn extract_field(col: &Arc<dyn Array>, row: usize) -> Result<Field<'_>> {
    if col.is_null(row) {
        return Ok(Field::Missing);
    }
    let field = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Field::Text(arr.value(row))
        }
        DataType::LargeUtf8 => Field::Text(col.as_string::<i64>().value(row)),
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Field::Number(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Field::Number(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Field::Number(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Field::Number(arr.value(row) as f64)
        }
        other => bail!("Unsupported column type {other:?}"),
    };
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FeatureList, GroupKey};
    use crate::error::ParseError;
    use std::io::Write;

    fn schema() -> TableSchema {
        TableSchema::new("class", FeatureList::new(["x", "y"]).unwrap())
    }

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_csv_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "t.csv", "x,y,class\n1,2,a\n3,4,b\n");
        let ds = load_file(&path, &schema()).unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn tsv_forces_tab_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "t.tsv", "x\ty\tclass\n1\t2\ta\n");
        let ds = load_file(&path, &schema()).unwrap();
        assert_eq!(ds.rows()[0].values, vec![1.0, 2.0]);
    }

    #[test]
    fn loads_json_records_and_skips_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.json",
            r#"[
                {"x": 1, "y": 2.5, "class": "a"},
                {"x": "3", "y": 4, "class": "a"},
                {"x": null, "y": 4, "class": "b"},
                {"x": 1, "y": 1, "class": 7}
            ]"#,
        );
        let ds = load_file(&path, &schema()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.group(&GroupKey::named("a")).unwrap().len(), 2);
        assert_eq!(ds.group(&GroupKey::named("7")).unwrap().len(), 1);
        assert_eq!(ds.report().skipped_count(), 1);
    }

    #[test]
    fn json_booleans_are_labels_and_nested_values_are_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "t.json",
            r#"[
                {"x": 1, "y": 2, "class": true},
                {"x": 2, "y": 3, "class": false},
                {"x": 3, "y": 4, "class": [1]},
                {"x": {"v": 4}, "y": 5, "class": "a"}
            ]"#,
        );
        let ds = load_file(&path, &schema()).unwrap();
        let labels: Vec<String> = ds.group_keys().map(GroupKey::to_string).collect();
        assert_eq!(labels, vec!["false", "true"]);
        assert_eq!(
            ds.report().skipped,
            vec![
                ParseError::MissingGroupKey {
                    record: 3,
                    column: "class".into()
                },
                ParseError::MissingField {
                    record: 4,
                    column: "x".into()
                },
            ]
        );
    }

    #[test]
    fn json_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "t.json", r#"{"x": 1}"#);
        assert!(load_file(&path, &schema()).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "t.xlsx", "");
        let err = load_file(&path, &schema()).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
