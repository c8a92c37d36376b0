//! Sorting the arrays of a container by the part they play for a surface

use crate::array::{DataArray, Intent};
use crate::Error;

/// How a non-geometry array is folded into a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// per-vertex shape value (curvature, thickness, ...)
    Shape,
    /// keys into the label table
    Label,
    /// displacement vector
    Vector,
    /// per-vertex color, with or without an alpha column
    Color { alpha: bool },
    /// recognised but not representable on a surface
    Unsupported,
    /// statistics and everything else: per-vertex value
    Scalar,
}

impl Role {
    pub fn of(intent: Intent) -> Self {
        match intent {
            Intent::Shape => Role::Shape,
            Intent::Label => Role::Label,
            Intent::Vector | Intent::DispVect => Role::Vector,
            Intent::RgbVector => Role::Color { alpha: false },
            Intent::RgbaVector => Role::Color { alpha: true },
            Intent::GenMatrix | Intent::SymMatrix | Intent::Quaternion => Role::Unsupported,
            _ => Role::Scalar,
        }
    }
}

/// The arrays of a container sorted by role
#[derive(Debug, Clone, Default)]
pub struct Classified<'a> {
    pub coords: Option<&'a DataArray>,
    pub faces: Option<&'a DataArray>,
    pub node_index: Option<&'a DataArray>,
    /// everything else, in container order
    pub rest: Vec<(&'a DataArray, Role)>,
}

impl<'a> Classified<'a> {
    /// true when both coordinates and faces were found
    pub fn has_geometry(&self) -> bool {
        self.coords.is_some() && self.faces.is_some()
    }

    /// Number of rows every non-geometry array must have: the node index
    /// length when one is present, the vertex count otherwise.
    fn expected_rows(&self, vertices: Option<usize>) -> Option<usize> {
        match self.node_index {
            Some(nodes) => Some(nodes.rows()),
            None => vertices.or_else(|| self.coords.map(DataArray::rows)),
        }
    }
}

/// Sort `arrays` by role and check their shapes.
///
/// `vertices` is the vertex count of an already known surface. Without it the
/// row count of the coordinate array is used.
///
/// The first `POINTSET` and `TRIANGLE` arrays are the geometry; further ones are
/// skipped. A `NODE_INDEX` array must be the first array of the container.
/// Every array must have the column count its intent requires, and every
/// non-geometry array one row per vertex (or per node index entry).
pub fn classify(arrays: &[DataArray], vertices: Option<usize>) -> Result<Classified<'_>, Error> {
    let mut classified = Classified::default();

    for (index, array) in arrays.iter().enumerate() {
        let expected = array.intent.expected_columns();
        if array.columns() != expected {
            return Err(Error::MalformedDataArray(format!(
                "data array {index} ({}) has {} columns, expected {expected}",
                array.intent,
                array.columns()
            )));
        }

        match array.intent {
            Intent::NodeIndex if index == 0 => classified.node_index = Some(array),
            Intent::NodeIndex => {
                return Err(Error::MalformedSparseIndex(format!(
                    "node index found at data array {index}, it must be the first array"
                )))
            }
            Intent::PointSet if classified.coords.is_none() => classified.coords = Some(array),
            Intent::Triangle if classified.faces.is_none() => classified.faces = Some(array),
            Intent::PointSet | Intent::Triangle => {
                log::warn!("skipping additional {} array at index {index}", array.intent);
            }
            intent => classified.rest.push((array, Role::of(intent))),
        }
    }

    let vertices = vertices.or_else(|| classified.coords.map(DataArray::rows));

    if let (Some(nodes), Some(vertices)) = (classified.node_index, vertices) {
        if nodes.rows() > vertices {
            return Err(Error::MalformedSparseIndex(format!(
                "node index lists {} vertices, the surface has {vertices}",
                nodes.rows()
            )));
        }
    }

    if let Some(rows) = classified.expected_rows(vertices) {
        for (array, _) in &classified.rest {
            if array.rows() != rows {
                return Err(Error::MalformedDataArray(format!(
                    "{} array has {} rows, expected {rows}",
                    array.intent,
                    array.rows()
                )));
            }
        }
    }

    log::debug!(
        "classified {} arrays: geometry {}, node index {}, {} overlays",
        arrays.len(),
        classified.has_geometry(),
        classified.node_index.is_some(),
        classified.rest.len()
    );

    Ok(classified)
}
