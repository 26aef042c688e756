use std::collections::BTreeMap;

use eframe::egui::{pos2, vec2, Align2, Color32, FontId, Painter, Rect, RichText, Sense, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::ColorMap;
use crate::data::model::{AdmissionRecord, AgeBracket, Sex};
use crate::data::query::{top_by_sex, top_by_value, top_per_bracket, BracketRankRow};
use crate::ui::panels::format_currency;

const CHART_HEIGHT: f32 = 320.0;
const TREEMAP_HEIGHT: f32 = 420.0;
const TREEMAP_HEADER: f32 = 20.0;

// ---------------------------------------------------------------------------
// Shared plot setup
// ---------------------------------------------------------------------------

/// Label for a grid mark sitting on a category slot, empty elsewhere.
fn category_label(labels: &[String], mark: GridMark) -> String {
    let slot = mark.value.round();
    if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    labels.get(slot as usize).cloned().unwrap_or_default()
}

fn legend_row(ui: &mut Ui, entries: &[(String, Color32)]) {
    ui.horizontal(|ui: &mut Ui| {
        for (label, color) in entries {
            ui.label(RichText::new("■").color(*color));
            ui.label(label);
            ui.add_space(8.0);
        }
    });
}

// ---------------------------------------------------------------------------
// Highest total value
// ---------------------------------------------------------------------------

/// Vertical bars of the `k` most expensive diagnoses, coloured by majority sex.
pub fn value_chart(ui: &mut Ui, records: &[AdmissionRecord], k: usize, colors: &ColorMap) {
    let top = top_by_value(records, k);
    let labels: Vec<String> = top.iter().map(|r| r.diagnosis_code.clone()).collect();

    // One chart per majority-sex label so the legend groups them.
    let mut groups: BTreeMap<&str, Vec<Bar>> = BTreeMap::new();
    for (slot, rec) in top.iter().enumerate() {
        let bar = Bar::new(slot as f64, rec.total_value)
            .name(format!("{} – {}", rec.diagnosis_code, rec.disease_description))
            .fill(colors.color_for(&rec.majority_sex))
            .width(0.7);
        groups.entry(rec.majority_sex.as_str()).or_default().push(bar);
    }

    Plot::new("value_chart")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_label("Diagnosis")
        .y_axis_label("Total value (R$)")
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark))
        .show(ui, |plot_ui| {
            for (sex, bars) in groups {
                let chart = BarChart::new(bars)
                    .name(sex)
                    .color(colors.color_for(sex))
                    .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
                        format!("{}\nR$ {}", bar.name, format_currency(bar.value))
                    }));
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Most frequent per sex
// ---------------------------------------------------------------------------

/// Horizontal bars: top `k` for women, then top `k` for men.
pub fn sex_chart(ui: &mut Ui, records: &[AdmissionRecord], k: usize, colors: &ColorMap) {
    let rows = top_by_sex(records, k);
    let labels: Vec<String> = rows.iter().map(|r| r.diagnosis_code.clone()).collect();

    Plot::new("sex_chart")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_label("Patients")
        .y_axis_label("Diagnosis")
        .y_axis_formatter(move |mark, _range| category_label(&labels, mark))
        .show(ui, |plot_ui| {
            for sex in Sex::ALL {
                let bars: Vec<Bar> = rows
                    .iter()
                    .enumerate()
                    .filter(|(_, row)| row.sex == sex)
                    .map(|(slot, row)| {
                        Bar::new(slot as f64, row.count as f64)
                            .name(format!("{} – {}", row.diagnosis_code, row.disease_description))
                            .width(0.7)
                    })
                    .collect();
                let chart = BarChart::new(bars)
                    .name(sex)
                    .color(colors.color_for(sex.label()))
                    .horizontal()
                    .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
                        format!("{}\n{} patients", bar.name, bar.value)
                    }));
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Most frequent per age bracket
// ---------------------------------------------------------------------------

/// Treemap of the top `k` diagnoses per bracket: one column per bracket,
/// sized by its share of occurrences, split into one tile per diagnosis.
pub fn bracket_treemap(ui: &mut Ui, records: &[AdmissionRecord], k: usize, colors: &ColorMap) {
    let rows = top_per_bracket(records, k);
    legend_row(ui, &colors.legend_entries());

    let groups: Vec<(AgeBracket, Vec<&BracketRankRow>)> = AgeBracket::ALL
        .into_iter()
        .map(|bracket| (bracket, rows.iter().filter(|r| r.bracket == bracket).collect()))
        .filter(|(_, members): &(AgeBracket, Vec<&BracketRankRow>)| !members.is_empty())
        .collect();

    let size = vec2(ui.available_width(), TREEMAP_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let weights: Vec<f64> = groups
        .iter()
        .map(|(_, members)| members.iter().map(|r| r.total_occurrences as f64).sum())
        .collect();

    let hover = response.hover_pos();
    let mut hovered: Option<String> = None;

    for ((bracket, members), column) in groups
        .iter()
        .zip(slice_rect(response.rect, &weights, true))
    {
        if column.width() < 1.0 {
            continue;
        }
        let color = colors.color_for(&bracket.to_string());
        let (header, body) = column.split_top_bottom_at_y(column.top() + TREEMAP_HEADER);
        painter.rect_filled(header.shrink(1.0), 0.0, color.gamma_multiply(0.6));
        tile_text(&painter, header, &bracket.to_string());

        let tile_weights: Vec<f64> = members.iter().map(|r| r.total_occurrences as f64).collect();
        for (row, tile) in members.iter().zip(slice_rect(body, &tile_weights, false)) {
            painter.rect_filled(tile.shrink(1.0), 0.0, color);
            tile_text(
                &painter,
                tile,
                &format!("{}\n{}", row.disease_description, row.total_occurrences),
            );
            if hover.is_some_and(|pos| tile.contains(pos)) {
                hovered = Some(format!(
                    "{bracket}\n{} – {}\n{} patients",
                    row.diagnosis_code, row.disease_description, row.total_occurrences
                ));
            }
        }
    }

    if let Some(text) = hovered {
        response.on_hover_text_at_pointer(text);
    }
}

fn tile_text(painter: &Painter, rect: Rect, text: &str) {
    painter.with_clip_rect(rect.shrink(2.0)).text(
        rect.left_top() + vec2(4.0, 3.0),
        Align2::LEFT_TOP,
        text,
        FontId::proportional(12.0),
        Color32::WHITE,
    );
}

/// Split `rect` into consecutive slices proportional to `weights`, left to
/// right when `horizontal`, top to bottom otherwise. Zero total weight gives
/// empty slices at the leading edge.
pub(crate) fn slice_rect(rect: Rect, weights: &[f64], horizontal: bool) -> Vec<Rect> {
    let total: f64 = weights.iter().sum();
    let extent = if horizontal { rect.width() } else { rect.height() };
    let mut offset = 0.0_f32;

    weights
        .iter()
        .map(|&w| {
            let len = if total > 0.0 {
                (w / total) as f32 * extent
            } else {
                0.0
            };
            let slice = if horizontal {
                Rect::from_min_size(pos2(rect.left() + offset, rect.top()), vec2(len, rect.height()))
            } else {
                Rect::from_min_size(pos2(rect.left(), rect.top() + offset), vec2(rect.width(), len))
            };
            offset += len;
            slice
        })
        .collect()
}
