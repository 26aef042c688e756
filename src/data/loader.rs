use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::LoadError;
use super::model::{
    AdmissionDataset, AdmissionRecord, COL_AVERAGE_AGE, COL_CODE, COL_DESCRIPTION, COL_FEMALE,
    COL_MAJORITY_SEX, COL_MALE, COL_OCCURRENCES, COL_UNKNOWN_SEX, COL_VALUE, REQUIRED_COLUMNS,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the admissions table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – comma-separated, header row with the upstream column names
/// * `.json`    – `[{ "DIAG_PRINC": "A01", ... }, ...]`
/// * `.parquet` – flat columns with the same names
///
/// Extra columns are ignored. The resulting dataset is validated (unique
/// codes, non-negative values) before it is returned.
pub fn load_file(path: &Path) -> Result<AdmissionDataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    AdmissionDataset::from_records(records)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<AdmissionRecord>, LoadError> {
    // Header names are matched after trimming, both here and by serde.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(BufReader::new(open(path)?));

    let headers = reader.headers()?.clone();
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }

    reader
        .deserialize::<AdmissionRecord>()
        .map(|row| row.map_err(LoadError::from))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default of `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Vec<AdmissionRecord>, LoadError> {
    let records: Vec<AdmissionRecord> = serde_json::from_reader(BufReader::new(open(path)?))?;
    Ok(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per field.
///
/// Text columns must be Utf8 or LargeUtf8; numeric columns may be
/// Int32, Int64, Float32 or Float64. Nulls are rejected.
fn load_parquet(path: &Path) -> Result<Vec<AdmissionRecord>, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;

    for required in REQUIRED_COLUMNS {
        if builder.schema().index_of(required).is_err() {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }

    let reader = builder.build()?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let column = |name: &str| -> Result<ArrayRef, LoadError> {
            Ok(batch.column(schema.index_of(name)?).clone())
        };

        let code = column(COL_CODE)?;
        let description = column(COL_DESCRIPTION)?;
        let occurrences = column(COL_OCCURRENCES)?;
        let value = column(COL_VALUE)?;
        let female = column(COL_FEMALE)?;
        let male = column(COL_MALE)?;
        let unknown = column(COL_UNKNOWN_SEX)?;
        let age = column(COL_AVERAGE_AGE)?;
        let majority = column(COL_MAJORITY_SEX)?;

        for row in 0..batch.num_rows() {
            let at = Cell {
                row,
                file_row: records.len(),
            };
            records.push(AdmissionRecord {
                diagnosis_code: at.string(&code, COL_CODE)?,
                disease_description: at.string(&description, COL_DESCRIPTION)?,
                total_occurrences: at.count(&occurrences, COL_OCCURRENCES)?,
                total_value: at.number(&value, COL_VALUE)?,
                count_female: at.count(&female, COL_FEMALE)?,
                count_male: at.count(&male, COL_MALE)?,
                count_unknown_sex: at.count(&unknown, COL_UNKNOWN_SEX)?,
                average_age: at.number(&age, COL_AVERAGE_AGE)?,
                majority_sex: at.string(&majority, COL_MAJORITY_SEX)?,
            });
        }
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Position of a cell: `row` inside the current batch, `file_row` for messages.
struct Cell {
    row: usize,
    file_row: usize,
}

impl Cell {
    fn invalid(&self, column: &'static str, message: String) -> LoadError {
        LoadError::InvalidValue {
            row: self.file_row,
            column,
            message,
        }
    }

    fn check_null(&self, col: &ArrayRef, column: &'static str) -> Result<(), LoadError> {
        if col.is_null(self.row) {
            Err(self.invalid(column, "null value".to_string()))
        } else {
            Ok(())
        }
    }

    fn string(&self, col: &ArrayRef, column: &'static str) -> Result<String, LoadError> {
        self.check_null(col, column)?;
        match col.data_type() {
            DataType::Utf8 => Ok(col.as_string::<i32>().value(self.row).to_string()),
            DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(self.row).to_string()),
            other => Err(self.invalid(column, format!("expected a string column, got {other:?}"))),
        }
    }

    fn number(&self, col: &ArrayRef, column: &'static str) -> Result<f64, LoadError> {
        self.check_null(col, column)?;
        match col.data_type() {
            DataType::Int32 => Ok(col.as_primitive::<Int32Type>().value(self.row) as f64),
            DataType::Int64 => Ok(col.as_primitive::<Int64Type>().value(self.row) as f64),
            DataType::Float32 => Ok(col.as_primitive::<Float32Type>().value(self.row) as f64),
            DataType::Float64 => Ok(col.as_primitive::<Float64Type>().value(self.row)),
            other => Err(self.invalid(column, format!("expected a numeric column, got {other:?}"))),
        }
    }

    fn count(&self, col: &ArrayRef, column: &'static str) -> Result<u64, LoadError> {
        if let DataType::Int64 = col.data_type() {
            self.check_null(col, column)?;
            let v = col.as_primitive::<Int64Type>().value(self.row);
            return u64::try_from(v).map_err(|_| self.invalid(column, format!("{v} is negative")));
        }
        let v = self.number(col, column)?;
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
            Ok(v as u64)
        } else {
            Err(self.invalid(column, format!("{v} is not a non-negative whole count")))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "DIAG_PRINC,descricao_cid,TOTAL_OCORRENCIAS,valor_total,total_feminino,total_masculino,total_ignorado,idade_media,sexo_majoritario";

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_csv_with_float_counts_and_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!(
            "{HEADER},Faixa\n\
             A01,Cholera,10.0,500.5,6,4,0,30.0,Feminino,Adulto\n\
             B02,\"Typhoid, unspecified\",3,1200,1.0,2,0,70,Masculino,Idoso\n"
        );
        let path = write_file(&dir, "dados.csv", &contents);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        let b02 = &ds.records()[1];
        assert_eq!(b02.diagnosis_code, "B02");
        assert_eq!(b02.disease_description, "Typhoid, unspecified");
        assert_eq!(b02.total_occurrences, 3);
        assert_eq!(b02.total_value, 1200.0);
        assert_eq!(b02.count_female, 1);
        assert_eq!(ds.records()[0].total_occurrences, 10);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "dados.csv",
            "DIAG_PRINC,descricao_cid,TOTAL_OCORRENCIAS\nA01,Cholera,1\n",
        );
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(col) if col == "valor_total"));
    }

    #[test]
    fn padded_header_names_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let contents = "DIAG_PRINC, descricao_cid ,TOTAL_OCORRENCIAS, valor_total,total_feminino,total_masculino,total_ignorado,idade_media,sexo_majoritario\n\
                        A01,Cholera,10,500.5,6,4,0,30,Feminino\n";
        let path = write_file(&dir, "dados.csv", contents);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0].total_value, 500.5);
        assert_eq!(ds.records()[0].disease_description, "Cholera");
    }

    #[test]
    fn fractional_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!("{HEADER}\nA01,Cholera,2.5,1,0,0,0,3,Ignorado\n");
        let path = write_file(&dir, "dados.csv", &contents);
        assert!(matches!(load_file(&path).unwrap_err(), LoadError::Csv(_)));
    }

    #[test]
    fn duplicate_codes_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!(
            "{HEADER}\nA01,Cholera,1,1,0,0,0,3,Ignorado\nA01,Cholera again,1,1,0,0,0,3,Ignorado\n"
        );
        let path = write_file(&dir, "dados.csv", &contents);
        assert!(matches!(
            load_file(&path).unwrap_err(),
            LoadError::DuplicateCode(code) if code == "A01"
        ));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("dados.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "dados.json",
            r#"[{"DIAG_PRINC":"J18","descricao_cid":"Pneumonia","TOTAL_OCORRENCIAS":40.0,
                 "valor_total":9000.25,"total_feminino":18,"total_masculino":22,
                 "total_ignorado":0,"idade_media":64.2,"sexo_majoritario":"Masculino"}]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records()[0].total_occurrences, 40);
        assert_eq!(ds.records()[0].majority_sex, "Masculino");
    }

    #[test]
    fn loads_parquet_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.parquet");

        let text = |name: &str| Field::new(name, DataType::Utf8, false);
        let schema = Arc::new(Schema::new(vec![
            text(COL_CODE),
            text(COL_DESCRIPTION),
            Field::new(COL_OCCURRENCES, DataType::Int64, false),
            Field::new(COL_VALUE, DataType::Float64, false),
            Field::new(COL_FEMALE, DataType::Int64, false),
            Field::new(COL_MALE, DataType::Int64, false),
            Field::new(COL_UNKNOWN_SEX, DataType::Float64, false),
            Field::new(COL_AVERAGE_AGE, DataType::Float64, false),
            text(COL_MAJORITY_SEX),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["A01", "B02"])),
                Arc::new(StringArray::from(vec!["Cholera", "Typhoid"])),
                Arc::new(Int64Array::from(vec![10, 3])),
                Arc::new(Float64Array::from(vec![500.0, 1200.0])),
                Arc::new(Int64Array::from(vec![6, 1])),
                Arc::new(Int64Array::from(vec![4, 2])),
                Arc::new(Float64Array::from(vec![0.0, 0.0])),
                Arc::new(Float64Array::from(vec![30.0, 70.0])),
                Arc::new(StringArray::from(vec!["Feminino", "Masculino"])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[1].diagnosis_code, "B02");
        assert_eq!(ds.records()[1].count_male, 2);
        assert_eq!(ds.records()[0].average_age, 30.0);
    }
}
