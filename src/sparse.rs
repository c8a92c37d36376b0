//! Sparse node indexing
//!
//! A container may start with a `NIFTI_INTENT_NODE_INDEX` array listing vertex
//! ids. When it does, row `i` of every other non-geometry array holds data for
//! vertex `nodes[i]` rather than vertex `i`.

use crate::array::{DataArray, ElementKind, Intent, IndexOrder};
use crate::Error;

/// Maps the row of a data array to the vertex it describes
#[derive(Debug, Clone, Copy)]
pub struct SparseIndex<'a> {
    nodes: Option<&'a DataArray>,
}

impl<'a> SparseIndex<'a> {
    /// every row describes the vertex with the same index
    pub fn dense() -> Self {
        Self { nodes: None }
    }

    pub fn from_array(nodes: &'a DataArray) -> Result<Self, Error> {
        if nodes.intent != Intent::NodeIndex {
            return Err(Error::MalformedSparseIndex(format!(
                "a node index needs intent NIFTI_INTENT_NODE_INDEX, got {}",
                nodes.intent
            )));
        }

        if nodes.columns() != 1 {
            return Err(Error::MalformedSparseIndex(format!(
                "node index has {} columns, expected 1",
                nodes.columns()
            )));
        }

        Ok(Self { nodes: Some(nodes) })
    }

    /// build from an optional node index array
    pub fn new(nodes: Option<&'a DataArray>) -> Result<Self, Error> {
        match nodes {
            Some(array) => Self::from_array(array),
            None => Ok(Self::dense()),
        }
    }

    pub fn is_sparse(&self) -> bool {
        self.nodes.is_some()
    }

    /// number of listed vertices, `None` for a dense index
    pub fn node_count(&self) -> Option<usize> {
        self.nodes.map(DataArray::rows)
    }

    /// The vertex described by row `position`.
    ///
    /// `Ok(None)` marks the end of the sparse data: `position` is past the last
    /// listed vertex. A dense index resolves every position to itself.
    pub fn resolve(&self, position: usize) -> Result<Option<usize>, Error> {
        let nodes = match self.nodes {
            Some(nodes) => nodes,
            None => return Ok(Some(position)),
        };

        if position >= nodes.rows() {
            return Ok(None);
        }

        let value = nodes.get(position, 0)?;

        if value < 0.0 || value.fract() != 0.0 {
            return Err(Error::MalformedSparseIndex(format!(
                "node index entry {position} is {value}, not a vertex id"
            )));
        }

        Ok(Some(value as usize))
    }
}

/// Build the `NIFTI_INTENT_NODE_INDEX` array listing `nodes`
pub fn node_index_array(nodes: &[usize]) -> Result<DataArray, Error> {
    if nodes.is_empty() {
        return Err(Error::MalformedSparseIndex(
            "a node index must list at least one vertex".into(),
        ));
    }

    let mut array = DataArray::allocate(
        Intent::NodeIndex,
        ElementKind::Int32,
        IndexOrder::RowMajor,
        &[nodes.len()],
    )?;

    for (row, node) in nodes.iter().enumerate() {
        array.set(row, 0, *node as f64)?;
    }

    Ok(array)
}
