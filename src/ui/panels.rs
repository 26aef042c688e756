use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::ColorMap;
use crate::data::export::export_csv;
use crate::data::query::{lookup_by_code, sample, Lookup};
use crate::state::AppState;
use crate::ui::{charts, table};

// ---------------------------------------------------------------------------
// Left side panel – code selector and detail
// ---------------------------------------------------------------------------

/// Render the diagnosis lookup panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Lookup by diagnosis");
    ui.separator();

    let Some(dataset) = &state.dataset else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.strong("Diagnosis code");
    let current = state.selected_code.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("diagnosis_code")
        .selected_text(&current)
        .height(400.0)
        .show_ui(ui, |ui: &mut Ui| {
            for code in &state.codes {
                ui.selectable_value(&mut state.selected_code, Some(code.clone()), code);
            }
        });
    ui.separator();

    let Some(code) = state.selected_code.as_deref() else {
        return;
    };

    match lookup_by_code(dataset.records(), code) {
        Lookup::Found(rec) => {
            ui.label(RichText::new(format!("Diagnosis {code}")).strong().size(16.0));
            ui.add_space(4.0);
            egui::Grid::new("detail_grid")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    let rows = [
                        ("Disease", rec.disease_description.clone()),
                        ("Occurrences", rec.total_occurrences.to_string()),
                        ("Total value", format!("R$ {}", format_currency(rec.total_value))),
                        ("Women", rec.count_female.to_string()),
                        ("Men", rec.count_male.to_string()),
                        ("Sex not recorded", rec.count_unknown_sex.to_string()),
                        ("Average age", format!("{:.1}", rec.average_age)),
                        ("Majority sex", rec.majority_sex.clone()),
                    ];
                    for (label, value) in rows {
                        ui.label(label);
                        ui.label(value);
                        ui.end_row();
                    }
                });
        }
        Lookup::NotFound => {
            ui.label(
                RichText::new("No data found for the selected diagnosis.")
                    .color(Color32::YELLOW),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Central panel – charts and raw data
// ---------------------------------------------------------------------------

/// Render every chart and the data preview.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if let Some(err) = &state.load_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(
                RichText::new(format!("Cannot load data\n\n{err}\n\nUse File → Open… to pick another file."))
                    .color(Color32::RED)
                    .size(16.0),
            );
        });
        return;
    }

    let Some(dataset) = &state.dataset else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view admissions  (File → Open…)");
        });
        return;
    };

    if dataset.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("The loaded table has no rows.");
        });
        return;
    }

    let records = dataset.records();
    let config = &state.config;
    let sex_colors = ColorMap::sexes();
    let bracket_colors = ColorMap::age_brackets();
    let mut download = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("SUS Hospital Admissions 2024");
            ui.label(
                "Incidence of diseases in hospital admissions, from the SUS hospital \
                 information system (SIH) for 2024, patients resident in Rio Grande do Sul.",
            );
            ui.separator();

            ui.strong("Diagnoses with the highest total value");
            charts::value_chart(ui, records, config.top_value_k, &sex_colors);
            ui.separator();

            ui.strong(format!("Top {} diagnoses per sex", config.top_sex_k));
            charts::sex_chart(ui, records, config.top_sex_k, &sex_colors);
            ui.separator();

            ui.strong(format!(
                "Top {} diagnoses per age bracket (by average age)",
                config.top_bracket_k
            ));
            charts::bracket_treemap(ui, records, config.top_bracket_k, &bracket_colors);
            ui.separator();

            ui.strong("Data sample");
            table::sample_table(ui, sample(records, config.sample_rows));
            ui.add_space(6.0);
            download = ui.button("Download data as CSV").clicked();
        });

    if download {
        export_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!("{} diagnosis codes loaded", ds.len()));
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            ui.label(msg);
        }
        if let Some(err) = &state.load_error {
            ui.label(RichText::new(format!("Error: {err}")).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open admissions data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load(&path);
    }
}

/// Ask where to save the full table and write it there.
pub fn export_dialog(state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Export admissions data")
        .set_file_name(&state.config.export_file_name)
        .add_filter("CSV", &["csv"])
        .save_file();

    let Some(path) = file else {
        return;
    };

    state.status_message = Some(match export_csv(&path, dataset.records()) {
        Ok(()) => format!("Saved {}", path.display()),
        Err(e) => {
            log::error!("Failed to export: {e:#}");
            format!("Export failed: {e:#}")
        }
    });
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `1234567.891` → `"1,234,567.89"`.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0.0), "0.00");
        assert_eq!(format_currency(999.999), "1,000.00");
        assert_eq!(format_currency(1200.0), "1,200.00");
        assert_eq!(format_currency(1234567.891), "1,234,567.89");
        assert_eq!(format_currency(-5000.5), "-5,000.50");
    }
}
