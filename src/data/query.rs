//! Derived views over the loaded admissions table.
//!
//! Every function here is pure: it borrows the record slice, never mutates it
//! and returns a fresh view. Rankings use a stable sort so ties keep file
//! order.

use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{AdmissionRecord, AgeBracket, Sex};

// ---------------------------------------------------------------------------
// View rows
// ---------------------------------------------------------------------------

/// One entry of the per-sex ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct SexRankRow {
    pub diagnosis_code: String,
    pub disease_description: String,
    pub count: u64,
    pub sex: Sex,
}

/// One entry of the per-age-bracket ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketRankRow {
    pub diagnosis_code: String,
    pub disease_description: String,
    pub total_occurrences: u64,
    pub bracket: AgeBracket,
}

/// Outcome of a lookup by diagnosis code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a AdmissionRecord),
    NotFound,
}

/// An average age outside the domain of [`classify_age_bracket`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid average age: {0}")]
pub struct InvalidAge(pub f64);

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// Indices of the `k` largest rows by `key`, descending, stable on ties.
fn top_indices<F>(records: &[AdmissionRecord], k: usize, key: F) -> Vec<usize>
where
    F: Fn(&AdmissionRecord) -> f64,
{
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| key(&records[b]).total_cmp(&key(&records[a])));
    order.truncate(k);
    order
}

/// The `k` records with the largest `total_value`.
pub fn top_by_value(records: &[AdmissionRecord], k: usize) -> Vec<&AdmissionRecord> {
    top_indices(records, k, |r| r.total_value)
        .into_iter()
        .map(|i| &records[i])
        .collect()
}

/// Top `k` by female count followed by top `k` by male count.
///
/// The two rankings are independent: a diagnosis may appear in both.
pub fn top_by_sex(records: &[AdmissionRecord], k: usize) -> Vec<SexRankRow> {
    Sex::ALL
        .into_iter()
        .flat_map(|sex| {
            top_indices(records, k, move |r| r.count_for(sex) as f64)
                .into_iter()
                .map(move |i| {
                    let rec = &records[i];
                    SexRankRow {
                        diagnosis_code: rec.diagnosis_code.clone(),
                        disease_description: rec.disease_description.clone(),
                        count: rec.count_for(sex),
                        sex,
                    }
                })
        })
        .collect()
}

/// Map an average age onto its bracket. Upper bounds are inclusive.
pub fn classify_age_bracket(average_age: f64) -> Result<AgeBracket, InvalidAge> {
    if !average_age.is_finite() || average_age < 0.0 {
        return Err(InvalidAge(average_age));
    }
    Ok(if average_age <= 12.0 {
        AgeBracket::Child
    } else if average_age <= 24.0 {
        AgeBracket::Young
    } else if average_age <= 59.0 {
        AgeBracket::Adult
    } else {
        AgeBracket::Elderly
    })
}

/// Top `k` by `total_occurrences` within each bracket, in [`AgeBracket::ALL`] order.
///
/// Brackets with fewer than `k` rows contribute what they have. Rows whose
/// age cannot be classified belong to no bracket.
pub fn top_per_bracket(records: &[AdmissionRecord], k: usize) -> Vec<BracketRankRow> {
    let mut out = Vec::new();
    for bracket in AgeBracket::ALL {
        let members: Vec<&AdmissionRecord> = records
            .iter()
            .filter(|r| classify_age_bracket(r.average_age) == Ok(bracket))
            .collect();

        let mut order: Vec<usize> = (0..members.len()).collect();
        order.sort_by(|&a, &b| {
            members[b]
                .total_occurrences
                .cmp(&members[a].total_occurrences)
        });

        out.extend(order.into_iter().take(k).map(|i| {
            let rec = members[i];
            BracketRankRow {
                diagnosis_code: rec.diagnosis_code.clone(),
                disease_description: rec.disease_description.clone(),
                total_occurrences: rec.total_occurrences,
                bracket,
            }
        }));
    }
    out
}

// ---------------------------------------------------------------------------
// Lookup and listing
// ---------------------------------------------------------------------------

/// Exact-match lookup. On duplicate codes the first row in file order wins.
pub fn lookup_by_code<'a>(records: &'a [AdmissionRecord], code: &str) -> Lookup<'a> {
    records
        .iter()
        .find(|r| r.diagnosis_code == code)
        .map_or(Lookup::NotFound, Lookup::Found)
}

/// Distinct diagnosis codes, ascending.
pub fn available_codes(records: &[AdmissionRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.diagnosis_code.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// The first `n` rows, unchanged, for the raw-data preview.
pub fn sample(records: &[AdmissionRecord], n: usize) -> &[AdmissionRecord] {
    &records[..n.min(records.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn scenario() -> Vec<AdmissionRecord> {
        let mut a01 = record("A01", 500.0, 10, 30.0);
        a01.count_female = 6;
        a01.count_male = 4;
        let mut b02 = record("B02", 1200.0, 3, 70.0);
        b02.count_female = 1;
        b02.count_male = 2;
        vec![a01, b02]
    }

    fn codes<'a>(records: impl IntoIterator<Item = &'a AdmissionRecord>) -> Vec<&'a str> {
        records
            .into_iter()
            .map(|r| r.diagnosis_code.as_str())
            .collect()
    }

    #[test]
    fn concrete_scenario() {
        let r = scenario();
        assert_eq!(codes(top_by_value(&r, 1)), ["B02"]);
        assert_eq!(classify_age_bracket(30.0), Ok(AgeBracket::Adult));
        assert_eq!(classify_age_bracket(70.0), Ok(AgeBracket::Elderly));
        assert_eq!(lookup_by_code(&r, "A01"), Lookup::Found(&r[0]));
        assert_eq!(lookup_by_code(&r, "Z99"), Lookup::NotFound);
    }

    #[test]
    fn top_by_value_length_and_order() {
        let r = vec![
            record("A", 5.0, 1, 1.0),
            record("B", 50.0, 1, 1.0),
            record("C", 20.0, 1, 1.0),
            record("D", 0.0, 1, 1.0),
        ];
        for k in 0..7 {
            let top = top_by_value(&r, k);
            assert_eq!(top.len(), k.min(r.len()));
            assert!(top.windows(2).all(|w| w[0].total_value >= w[1].total_value));
        }
        assert_eq!(codes(top_by_value(&r, 3)), ["B", "C", "A"]);
        assert_eq!(top_by_value(&r, 3), top_by_value(&r, 3));
    }

    #[test]
    fn top_by_value_ties_keep_file_order() {
        let r = vec![
            record("X", 10.0, 1, 1.0),
            record("Y", 30.0, 1, 1.0),
            record("Z", 10.0, 1, 1.0),
            record("W", 10.0, 1, 1.0),
        ];
        assert_eq!(codes(top_by_value(&r, 3)), ["Y", "X", "Z"]);
    }

    #[test]
    fn top_by_value_on_empty_input() {
        assert!(top_by_value(&[], 10).is_empty());
    }

    #[test]
    fn top_by_sex_keeps_independent_rankings() {
        let r = scenario();
        let rows = top_by_sex(&r, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sex, Sex::Female);
        assert_eq!(rows[0].diagnosis_code, "A01");
        assert_eq!(rows[0].count, 6);
        // A01 leads both rankings and is listed twice.
        assert_eq!(rows[1].sex, Sex::Male);
        assert_eq!(rows[1].diagnosis_code, "A01");
        assert_eq!(rows[1].count, 4);
    }

    #[test]
    fn top_by_sex_ranks_each_sex_by_its_own_count() {
        let mut a = record("A", 1.0, 10, 30.0);
        a.count_female = 9;
        a.count_male = 1;
        let mut b = record("B", 1.0, 10, 30.0);
        b.count_female = 2;
        b.count_male = 8;
        let mut c = record("C", 1.0, 10, 30.0);
        c.count_female = 5;
        c.count_male = 5;
        let r = vec![a, b, c];

        let leaders = top_by_sex(&r, 1);
        let got: Vec<(&str, Sex, u64)> = leaders
            .iter()
            .map(|row| (row.diagnosis_code.as_str(), row.sex, row.count))
            .collect();
        assert_eq!(got, [("A", Sex::Female, 9), ("B", Sex::Male, 8)]);

        let rows = top_by_sex(&r, 3);
        let order: Vec<(&str, Sex, u64)> = rows
            .iter()
            .map(|row| (row.diagnosis_code.as_str(), row.sex, row.count))
            .collect();
        assert_eq!(
            order,
            [
                ("A", Sex::Female, 9),
                ("C", Sex::Female, 5),
                ("B", Sex::Female, 2),
                ("B", Sex::Male, 8),
                ("C", Sex::Male, 5),
                ("A", Sex::Male, 1),
            ]
        );
    }

    #[test]
    fn top_by_sex_ties_keep_file_order() {
        let mut x = record("X", 1.0, 1, 1.0);
        x.count_male = 4;
        let mut y = record("Y", 1.0, 1, 1.0);
        y.count_male = 7;
        let mut z = record("Z", 1.0, 1, 1.0);
        z.count_male = 4;
        let mut w = record("W", 1.0, 1, 1.0);
        w.count_male = 4;
        let r = vec![x, y, z, w];

        let rows = top_by_sex(&r, 3);
        let male: Vec<&str> = rows
            .iter()
            .filter(|row| row.sex == Sex::Male)
            .map(|row| row.diagnosis_code.as_str())
            .collect();
        assert_eq!(male, ["Y", "X", "Z"]);
    }

    #[test]
    fn top_by_sex_is_bounded_by_two_k() {
        let r = scenario();
        assert_eq!(top_by_sex(&r, 5).len(), 4);
        assert!(top_by_sex(&r, 0).is_empty());
    }

    #[test]
    fn bracket_boundaries_belong_to_the_lower_bracket() {
        assert_eq!(classify_age_bracket(0.0), Ok(AgeBracket::Child));
        assert_eq!(classify_age_bracket(12.0), Ok(AgeBracket::Child));
        assert_eq!(classify_age_bracket(12.01), Ok(AgeBracket::Young));
        assert_eq!(classify_age_bracket(24.0), Ok(AgeBracket::Young));
        assert_eq!(classify_age_bracket(24.5), Ok(AgeBracket::Adult));
        assert_eq!(classify_age_bracket(59.0), Ok(AgeBracket::Adult));
        assert_eq!(classify_age_bracket(59.1), Ok(AgeBracket::Elderly));
        assert_eq!(classify_age_bracket(120.0), Ok(AgeBracket::Elderly));
    }

    #[test]
    fn invalid_ages_are_signalled() {
        assert_eq!(classify_age_bracket(-1.0), Err(InvalidAge(-1.0)));
        assert_eq!(InvalidAge(-1.0).to_string(), "invalid average age: -1");
        assert!(classify_age_bracket(f64::NAN).is_err());
        assert!(classify_age_bracket(f64::INFINITY).is_err());
    }

    #[test]
    fn top_per_bracket_labels_match_classification() {
        let r = vec![
            record("C1", 1.0, 5, 3.0),
            record("C2", 1.0, 9, 10.0),
            record("C3", 1.0, 7, 12.0),
            record("Y1", 1.0, 2, 20.0),
            record("A1", 1.0, 4, 40.0),
            record("A2", 1.0, 4, 59.0),
            record("E1", 1.0, 1, 80.0),
        ];
        let rows = top_per_bracket(&r, 2);
        let got: Vec<(&str, AgeBracket)> = rows
            .iter()
            .map(|row| (row.diagnosis_code.as_str(), row.bracket))
            .collect();
        assert_eq!(
            got,
            [
                ("C2", AgeBracket::Child),
                ("C3", AgeBracket::Child),
                ("Y1", AgeBracket::Young),
                ("A1", AgeBracket::Adult),
                ("A2", AgeBracket::Adult),
                ("E1", AgeBracket::Elderly),
            ]
        );
        for row in &rows {
            let Lookup::Found(rec) = lookup_by_code(&r, &row.diagnosis_code) else {
                panic!("{} missing", row.diagnosis_code);
            };
            assert_eq!(classify_age_bracket(rec.average_age), Ok(row.bracket));
        }
    }

    #[test]
    fn top_per_bracket_skips_unclassifiable_rows() {
        let r = vec![record("N", 1.0, 100, f64::NAN), record("A", 1.0, 1, 30.0)];
        let rows = top_per_bracket(&r, 5);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].diagnosis_code, "A");
    }

    #[test]
    fn lookup_takes_first_row_on_duplicate_codes() {
        let r = vec![record("A01", 1.0, 1, 1.0), record("A01", 2.0, 1, 1.0)];
        match lookup_by_code(&r, "A01") {
            Lookup::Found(rec) => assert_eq!(rec.total_value, 1.0),
            Lookup::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn lookup_is_exact() {
        let r = scenario();
        assert_eq!(lookup_by_code(&r, "a01"), Lookup::NotFound);
        assert_eq!(lookup_by_code(&r, "A0"), Lookup::NotFound);
    }

    #[test]
    fn available_codes_are_sorted_and_distinct() {
        let r = vec![
            record("J18", 1.0, 1, 1.0),
            record("A01", 1.0, 1, 1.0),
            record("J18", 1.0, 1, 1.0),
            record("C50", 1.0, 1, 1.0),
        ];
        let got = available_codes(&r);
        assert_eq!(got, ["A01", "C50", "J18"]);
        assert!(got.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(got, available_codes(&r));
    }

    #[test]
    fn sample_is_a_prefix() {
        let r = scenario();
        assert_eq!(sample(&r, 1).len(), 1);
        assert_eq!(sample(&r, 20), &r[..]);
        assert!(sample(&r, 0).is_empty());
    }
}
