use super::model::{Dataset, ParseReport, Row};
use super::schema::TableSchema;
use crate::error::{DatasetError, ParseError};

// ---------------------------------------------------------------------------
// Field – one raw cell as handed over by a reader
// ---------------------------------------------------------------------------

/// A raw cell value before conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Field<'a> {
    Missing,
    Text(&'a str),
    Number(f64),
}

impl Field<'_> {
    fn is_blank(&self) -> bool {
        match self {
            Field::Missing => true,
            Field::Text(s) => s.trim().is_empty(),
            Field::Number(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetBuilder – shared skip/bucket policy for every input format
// ---------------------------------------------------------------------------

/// Accumulates records into rows, recording every record it drops.
pub(crate) struct DatasetBuilder<'s> {
    schema: &'s TableSchema,
    rows: Vec<Row>,
    report: ParseReport,
}

impl<'s> DatasetBuilder<'s> {
    pub(crate) fn new(schema: &'s TableSchema) -> Self {
        DatasetBuilder {
            schema,
            rows: Vec::new(),
            report: ParseReport::default(),
        }
    }

    /// Offer one record. `values` is aligned with `schema.features`.
    pub(crate) fn push(&mut self, record: usize, group: Field<'_>, values: &[Field<'_>]) {
        if group.is_blank() && values.iter().all(Field::is_blank) {
            self.report.blank_records += 1;
            return;
        }
        self.report.records_read += 1;

        match self.convert(record, group, values) {
            Ok(row) => {
                self.rows.push(row);
                self.report.rows_kept += 1;
            }
            Err(e) => {
                log::warn!("Skipping {e}");
                self.report.skipped.push(e);
            }
        }
    }

    fn convert(&self, record: usize, group: Field<'_>, values: &[Field<'_>]) -> Result<Row, ParseError> {
        let key = match group {
            Field::Text(s) if !s.trim().is_empty() => self.schema.classify(s.trim()),
            Field::Number(n) if n.is_finite() => self.schema.classify(&n.to_string()),
            _ => {
                return Err(ParseError::MissingGroupKey {
                    record,
                    column: self.schema.group_column.clone(),
                })
            }
        };

        let parsed = self
            .schema
            .features
            .iter()
            .zip(values)
            .map(|(column, field)| parse_number(record, column, *field))
            .collect::<Result<Vec<f64>, ParseError>>()?;

        Ok(Row::new(key, parsed))
    }

    pub(crate) fn finish(self) -> Result<Dataset, DatasetError> {
        self.schema.check_aliases()?;
        let report = self.report;
        log::info!(
            "Parsed {} rows ({} skipped, {} blank) from {} records",
            report.rows_kept,
            report.skipped_count(),
            report.blank_records,
            report.records_read
        );
        Dataset::from_rows(self.schema.features.clone(), self.rows, report)
    }
}

fn parse_number(record: usize, column: &str, field: Field<'_>) -> Result<f64, ParseError> {
    let value = match field {
        Field::Number(n) => Some(n),
        Field::Text(s) if s.trim().is_empty() => None,
        Field::Text(s) => {
            let s = s.trim();
            match s.parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    return Err(ParseError::NonNumeric {
                        record,
                        column: column.to_string(),
                        value: s.to_string(),
                    })
                }
            }
        }
        Field::Missing => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(ParseError::NonNumeric {
            record,
            column: column.to_string(),
            value: v.to_string(),
        }),
        None => Err(ParseError::MissingField {
            record,
            column: column.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

impl Dataset {
    /// Parse delimited text into a grouped dataset.
    ///
    /// Malformed records are skipped and listed in [`Dataset::report`];
    /// only table-level problems (unreadable text, absent columns) fail.
    pub fn parse(raw: &str, schema: &TableSchema) -> Result<Dataset, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(schema.delimiter_byte()?)
            .has_headers(schema.has_headers)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(raw.as_bytes());

        let headers: Vec<String> = if schema.has_headers {
            reader.headers()?.iter().map(|h| h.to_string()).collect()
        } else {
            schema
                .column_names
                .clone()
                .ok_or(DatasetError::MissingColumnNames)?
        };

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };
        let group_idx = position(schema.group_column.as_str())?;
        let feature_idx = schema
            .features
            .iter()
            .map(position)
            .collect::<Result<Vec<usize>, DatasetError>>()?;

        let mut builder = DatasetBuilder::new(schema);

        for (n, result) in reader.records().enumerate() {
            let record = result?;
            let record_no = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(n + 1);

            let field = |i: usize| record.get(i).map(Field::Text).unwrap_or(Field::Missing);

            let values: Vec<Field<'_>> = feature_idx.iter().map(|&i| field(i)).collect();
            builder.push(record_no, field(group_idx), &values);
        }

        builder.finish()
    }
}
