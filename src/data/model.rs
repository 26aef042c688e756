use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::LoadError;

// ---------------------------------------------------------------------------
// Column names as written by the upstream aggregation
// ---------------------------------------------------------------------------

pub const COL_CODE: &str = "DIAG_PRINC";
pub const COL_DESCRIPTION: &str = "descricao_cid";
pub const COL_OCCURRENCES: &str = "TOTAL_OCORRENCIAS";
pub const COL_VALUE: &str = "valor_total";
pub const COL_FEMALE: &str = "total_feminino";
pub const COL_MALE: &str = "total_masculino";
pub const COL_UNKNOWN_SEX: &str = "total_ignorado";
pub const COL_AVERAGE_AGE: &str = "idade_media";
pub const COL_MAJORITY_SEX: &str = "sexo_majoritario";

/// Every column a loaded table must carry, in export order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_CODE,
    COL_DESCRIPTION,
    COL_OCCURRENCES,
    COL_VALUE,
    COL_FEMALE,
    COL_MALE,
    COL_UNKNOWN_SEX,
    COL_AVERAGE_AGE,
    COL_MAJORITY_SEX,
];

// ---------------------------------------------------------------------------
// AdmissionRecord – one row of the table
// ---------------------------------------------------------------------------

/// Admissions for one diagnosis code, pre-aggregated upstream.
///
/// Field order matches [`REQUIRED_COLUMNS`] so that CSV export writes the
/// same header the loader expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionRecord {
    #[serde(rename = "DIAG_PRINC")]
    pub diagnosis_code: String,
    #[serde(rename = "descricao_cid")]
    pub disease_description: String,
    #[serde(rename = "TOTAL_OCORRENCIAS", deserialize_with = "deserialize_count")]
    pub total_occurrences: u64,
    /// Total billed value in R$.
    #[serde(rename = "valor_total")]
    pub total_value: f64,
    #[serde(rename = "total_feminino", deserialize_with = "deserialize_count")]
    pub count_female: u64,
    #[serde(rename = "total_masculino", deserialize_with = "deserialize_count")]
    pub count_male: u64,
    #[serde(rename = "total_ignorado", deserialize_with = "deserialize_count")]
    pub count_unknown_sex: u64,
    #[serde(rename = "idade_media")]
    pub average_age: f64,
    /// One of "Masculino", "Feminino", "Ignorado".
    #[serde(rename = "sexo_majoritario")]
    pub majority_sex: String,
}

impl AdmissionRecord {
    /// Admissions counted for the given sex.
    pub fn count_for(&self, sex: Sex) -> u64 {
        match sex {
            Sex::Female => self.count_female,
            Sex::Male => self.count_male,
        }
    }
}

/// Accept `12`, `"12"` and `"12.0"`; dataframe exports often write counts as floats.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Float(f64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(i) => return Ok(i),
        Raw::Float(f) => f,
        Raw::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<u64>() {
                return Ok(i);
            }
            s.parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a count")))?
        }
    };

    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(serde::de::Error::custom(format!(
            "{value} is not a non-negative whole count"
        )))
    }
}

// ---------------------------------------------------------------------------
// Sex and AgeBracket – derived labels
// ---------------------------------------------------------------------------

/// The two sexes ranked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    /// Label used by the upstream data (`sexo_majoritario` values).
    pub fn label(self) -> &'static str {
        match self {
            Sex::Female => "Feminino",
            Sex::Male => "Masculino",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse life stage derived from a diagnosis' average patient age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBracket {
    Child,
    Young,
    Adult,
    Elderly,
}

impl AgeBracket {
    /// Display and grouping order.
    pub const ALL: [AgeBracket; 4] = [
        AgeBracket::Child,
        AgeBracket::Young,
        AgeBracket::Adult,
        AgeBracket::Elderly,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeBracket::Child => "Child",
            AgeBracket::Young => "Young",
            AgeBracket::Adult => "Adult",
            AgeBracket::Elderly => "Elderly",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// AdmissionDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full, validated record set. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionDataset {
    records: Vec<AdmissionRecord>,
}

impl AdmissionDataset {
    /// Validate and wrap the loaded rows.
    ///
    /// Rejects duplicate diagnosis codes and negative or non-finite
    /// value / age cells.
    pub fn from_records(records: Vec<AdmissionRecord>) -> Result<Self, LoadError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
        for (row, rec) in records.iter().enumerate() {
            if !seen.insert(rec.diagnosis_code.as_str()) {
                return Err(LoadError::DuplicateCode(rec.diagnosis_code.clone()));
            }
            check_non_negative(rec.total_value, row, COL_VALUE)?;
            check_non_negative(rec.average_age, row, COL_AVERAGE_AGE)?;
        }
        Ok(AdmissionDataset { records })
    }

    /// All rows in file order.
    pub fn records(&self) -> &[AdmissionRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_non_negative(value: f64, row: usize, column: &'static str) -> Result<(), LoadError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LoadError::InvalidValue {
            row,
            column,
            message: format!("{value} is not a finite non-negative number"),
        })
    }
}
