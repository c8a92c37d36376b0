//! The `<LabelTable>` of a GIFTI container

use crate::Error;

use std::collections::HashSet;

/// RGBA color with every component in `[0, 1]`
pub type Rgba = [f32; 4];

/// A single entry of a label table
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// integer value stored in `NIFTI_INTENT_LABEL` arrays
    pub key: i32,
    pub name: String,
    /// colors are optional in a GIFTI file
    pub color: Option<Rgba>,
}

impl Label {
    pub fn new<S: Into<String>>(key: i32, name: S, color: Option<Rgba>) -> Self {
        Self {
            key,
            name: name.into(),
            color,
        }
    }
}

/// Ordered list of labels. Keys need not be contiguous, nor match the position
/// of the label inside the table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    pub labels: Vec<Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn push(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.labels.iter()
    }

    /// position of the label with `key` inside the table
    pub fn position_of_key(&self, key: i32) -> Option<usize> {
        self.labels.iter().position(|label| label.key == key)
    }

    /// Keys must be unique and colors, when present, must be within `[0, 1]`
    pub fn check(&self) -> Result<(), Error> {
        let mut seen = HashSet::with_capacity(self.labels.len());

        for label in &self.labels {
            if !seen.insert(label.key) {
                return Err(Error::InvalidContainer(format!(
                    "label key {} appears more than once in the label table",
                    label.key
                )));
            }

            if let Some(color) = label.color {
                if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                    return Err(Error::InvalidContainer(format!(
                        "label `{}` has color {color:?} outside of [0, 1]",
                        label.name
                    )));
                }
            }
        }

        Ok(())
    }
}
