use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::AgeBracket;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps category labels (sex, age bracket) to chart colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Distinct palette colours for the given labels, in order.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let palette = generate_palette(labels.len());
        ColorMap {
            mapping: labels.into_iter().zip(palette).collect(),
            default_color: Color32::GRAY,
        }
    }

    /// Colours for `majority_sex` / `Sex` labels.
    pub fn sexes() -> Self {
        let mapping = [
            ("Masculino", Color32::from_rgb(0x1f, 0x77, 0xb4)),
            ("Feminino", Color32::from_rgb(0xff, 0x7f, 0x0e)),
            ("Ignorado", Color32::from_rgb(0x2c, 0xa0, 0x2c)),
        ]
        .into_iter()
        .map(|(label, color)| (label.to_string(), color))
        .collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// One palette colour per age bracket.
    pub fn age_brackets() -> Self {
        Self::new(AgeBracket::ALL.iter().map(ToString::to_string))
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(label, c)| (label.clone(), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn sex_colours_are_fixed() {
        let cm = ColorMap::sexes();
        assert_eq!(cm.color_for("Masculino"), Color32::from_rgb(31, 119, 180));
        assert_eq!(cm.color_for("Feminino"), Color32::from_rgb(255, 127, 14));
        assert_eq!(cm.color_for("Ignorado"), Color32::from_rgb(44, 160, 44));
        assert_eq!(cm.color_for("Outro"), Color32::GRAY);
    }

    #[test]
    fn every_bracket_has_its_own_colour() {
        let cm = ColorMap::age_brackets();
        assert_eq!(cm.legend_entries().len(), 4);
        assert_ne!(cm.color_for("Child"), cm.color_for("Elderly"));
        assert_ne!(cm.color_for("Adult"), Color32::GRAY);
    }
}
