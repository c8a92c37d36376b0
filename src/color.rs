//! Surface color lookup table and packed annotation values
//!
//! Annotations are stored per vertex as a single integer packing the red, green
//! and blue bytes of the label color (`r + g * 2^8 + b * 2^16`). The color
//! table maps them back to named entries.

use crate::label::{Label, LabelTable, Rgba};
use crate::Error;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// seed used to make up colors for labels that do not carry one, so that the
/// same file always yields the same table
pub const MISSING_COLOR_SEED: u64 = 12;

/// pack an RGB triple into an annotation value
pub fn pack_annotation(r: u8, g: u8, b: u8) -> i32 {
    r as i32 + ((g as i32) << 8) + ((b as i32) << 16)
}

/// inverse of [`pack_annotation`]
pub fn unpack_annotation(annotation: i32) -> (u8, u8, u8) {
    (
        (annotation & 0xff) as u8,
        ((annotation >> 8) & 0xff) as u8,
        ((annotation >> 16) & 0xff) as u8,
    )
}

/// convert a `[0, 1]` color component to a byte, `1.0` saturates at 255
pub fn unit_to_byte(component: f32) -> u8 {
    (component * 256.0).floor().clamp(0.0, 255.0) as u8
}

/// A named color of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorEntry {
    pub name: String,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorEntry {
    pub fn new<S: Into<String>>(name: S, r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            name: name.into(),
            r,
            g,
            b,
            a,
        }
    }

    pub fn annotation(&self) -> i32 {
        pack_annotation(self.r, self.g, self.b)
    }
}

/// Color lookup table owned by a surface.
///
/// Slots may be empty; only occupied slots count as valid entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    entries: Vec<Option<ColorEntry>>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Option<ColorEntry>>) -> Self {
        Self { entries }
    }

    /// Build a table with one entry per label of `labels`, in the same order.
    ///
    /// Labels without a color get a random one drawn from a generator seeded
    /// with [`MISSING_COLOR_SEED`].
    pub fn from_label_table(labels: &LabelTable) -> Result<Self, Error> {
        let mut entries = Vec::new();
        entries.try_reserve_exact(labels.len())?;

        let mut rng = StdRng::seed_from_u64(MISSING_COLOR_SEED);

        for label in labels.iter() {
            let entry = match label.color {
                Some([r, g, b, a]) => ColorEntry::new(
                    label.name.clone(),
                    unit_to_byte(r),
                    unit_to_byte(g),
                    unit_to_byte(b),
                    unit_to_byte(a),
                ),
                None => {
                    let (r, g, b) = (rng.gen(), rng.gen(), rng.gen());
                    log::debug!("label `{}` has no color, using ({r}, {g}, {b})", label.name);
                    ColorEntry::new(label.name.clone(), r, g, b, 255)
                }
            };
            entries.push(Some(entry));
        }

        let table = Self { entries };

        for name in table.duplicate_names() {
            log::warn!("color table has more than one entry named `{name}`");
        }

        Ok(table)
    }

    /// Build the GIFTI label table for this color table.
    ///
    /// Keys are table indices. Entries named `unknown` / `Unknown` or without a
    /// name are fully transparent black, every other entry is opaque. Missing
    /// names are replaced by `unknown_<index>`.
    pub fn to_label_table(&self) -> LabelTable {
        let mut table = LabelTable::new();

        for (index, entry) in self.entries.iter().enumerate() {
            let name = entry.as_ref().map(|e| e.name.as_str()).unwrap_or("");

            let color: Rgba = match entry {
                Some(e) if !is_unknown_name(&e.name) => [
                    e.r as f32 / 255.0,
                    e.g as f32 / 255.0,
                    e.b as f32 / 255.0,
                    1.0,
                ],
                _ => [0.0, 0.0, 0.0, 0.0],
            };

            let name = if name.is_empty() {
                let made_up = format!("unknown_{index}");
                log::warn!("color table entry {index} has no name, writing it as `{made_up}`");
                made_up
            } else {
                name.to_string()
            };

            table.push(Label::new(index as i32, name, Some(color)));
        }

        table
    }

    /// number of slots, occupied or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Option<ColorEntry>] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ColorEntry> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn push(&mut self, entry: ColorEntry) {
        self.entries.push(Some(entry));
    }

    /// number of occupied slots
    pub fn valid_entries(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// index of the first entry whose color packs to `annotation`
    pub fn find_annotation(&self, annotation: i32) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry
                .as_ref()
                .map(|e| e.annotation() == annotation)
                .unwrap_or(false)
        })
    }

    /// names used by more than one entry
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        for entry in self.entries.iter().flatten() {
            if !seen.insert(entry.name.as_str()) && !duplicates.contains(&entry.name) {
                duplicates.push(entry.name.clone());
            }
        }

        duplicates
    }
}

fn is_unknown_name(name: &str) -> bool {
    name.is_empty() || name == "unknown" || name == "Unknown"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ColorTable {
        let mut ct = ColorTable::new();
        ct.push(ColorEntry::new("unknown", 25, 5, 25, 255));
        ct.push(ColorEntry::new("A", 220, 20, 10, 255));
        ct.push(ColorEntry::new("B", 0, 118, 14, 255));
        ct
    }

    #[test]
    fn packing() {
        assert_eq!(pack_annotation(220, 20, 10), 220 + 20 * 256 + 10 * 65536);
        assert_eq!(unpack_annotation(pack_annotation(1, 2, 3)), (1, 2, 3));
    }

    #[test]
    fn unit_components() {
        assert_eq!(unit_to_byte(0.0), 0);
        assert_eq!(unit_to_byte(0.1), 25);
        assert_eq!(unit_to_byte(0.5), 128);
        assert_eq!(unit_to_byte(1.0), 255);
        assert_eq!(unit_to_byte(-0.2), 0);
        for byte in 0..=255u8 {
            assert_eq!(unit_to_byte(byte as f32 / 255.0), byte);
        }
    }

    #[test]
    fn annotation_lookup() {
        let ct = table();
        assert_eq!(ct.find_annotation(pack_annotation(0, 118, 14)), Some(2));
        assert_eq!(ct.find_annotation(pack_annotation(1, 1, 1)), None);
    }

    #[test]
    fn label_table_conversion() {
        let labels = table().to_label_table();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.labels[0].key, 0);
        assert_eq!(labels.labels[0].color, Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(labels.labels[2].key, 2);
        assert_eq!(labels.labels[2].color.unwrap()[3], 1.0);

        let back = ColorTable::from_label_table(&labels).unwrap();
        assert_eq!(back.entry(1), table().entry(1));
        assert_eq!(back.entry(2), table().entry(2));
        assert_eq!(back.entry(0).unwrap().annotation(), 0);
    }

    #[test]
    fn empty_names_are_made_up() {
        let ct = ColorTable::from_entries(vec![None, Some(ColorEntry::new("", 1, 2, 3, 255))]);
        let labels = ct.to_label_table();
        assert_eq!(labels.labels[0].name, "unknown_0");
        assert_eq!(labels.labels[1].name, "unknown_1");
        assert_eq!(labels.labels[1].color, Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(ct.valid_entries(), 1);
    }

    #[test]
    fn missing_colors_are_deterministic() {
        let mut labels = LabelTable::new();
        labels.push(Label::new(0, "a", None));
        labels.push(Label::new(1, "b", None));

        let first = ColorTable::from_label_table(&labels).unwrap();
        let second = ColorTable::from_label_table(&labels).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.valid_entries(), 2);
    }

    #[test]
    fn duplicate_names() {
        let mut ct = table();
        ct.push(ColorEntry::new("A", 1, 1, 1, 255));
        ct.push(ColorEntry::new("A", 2, 2, 2, 255));
        assert_eq!(ct.duplicate_names(), vec!["A".to_string()]);
    }
}
