use eframe::egui::{Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{AdmissionRecord, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Raw-data preview
// ---------------------------------------------------------------------------

/// Render `rows` unchanged, one column per input field.
pub fn sample_table(ui: &mut Ui, rows: &[AdmissionRecord]) {
    TableBuilder::new(ui)
        .id_salt("sample_table")
        .striped(true)
        .resizable(true)
        .vscroll(false)
        .cell_layout(Layout::left_to_right(Align::Center))
        .column(Column::auto())
        .column(Column::initial(260.0).clip(true))
        .columns(Column::auto(), REQUIRED_COLUMNS.len() - 2)
        .header(20.0, |mut header| {
            for name in REQUIRED_COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let rec = &rows[row.index()];
                let cells = [
                    rec.diagnosis_code.clone(),
                    rec.disease_description.clone(),
                    rec.total_occurrences.to_string(),
                    format!("{:.2}", rec.total_value),
                    rec.count_female.to_string(),
                    rec.count_male.to_string(),
                    rec.count_unknown_sex.to_string(),
                    format!("{:.1}", rec.average_age),
                    rec.majority_sex.clone(),
                ];
                for text in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}
