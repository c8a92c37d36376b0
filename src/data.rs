use crate::array::{DataArray, Intent};
use crate::label::LabelTable;
use crate::Error;

use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;
use std::str::FromStr;

/// The GIFTI file version written by this crate
pub const GIFTI_VERSION: &str = "1.0";

#[derive(Debug, Default, Clone, PartialEq)]
/// Container type that GIFTI files are read into and written from.
///
/// `Gifti` holds the file level metadata, the (possibly empty) label table and
/// the ordered list of data arrays. Nothing here knows about surfaces: turning
/// a container into a [`Surface`](`crate::Surface`) is done by
/// [`ingest`](`crate::ingest()`), the reverse by [`emit`](`crate::emit()`).
pub struct Gifti {
    pub version: String,
    pub meta: MetaData,
    pub labels: LabelTable,
    pub arrays: Vec<DataArray>,
}

impl Gifti {
    /// Construct an empty container for writing to a file
    pub fn new() -> Self {
        Self {
            version: GIFTI_VERSION.into(),
            ..Self::default()
        }
    }

    /// Returns true if the container is structurally sound. See [`Gifti::check`]
    /// for the reason of a failure.
    pub fn validate(&self) -> bool {
        self.check().is_ok()
    }

    /// Check the structural invariants of the container:
    ///
    /// * every array has between 1 and 6 dimensions, all of them non-zero
    /// * every buffer holds exactly `product(dims) * element width` bytes
    /// * label keys are unique
    /// * there is at most one `NIFTI_INTENT_NODE_INDEX` array
    pub fn check(&self) -> Result<(), Error> {
        for (index, array) in self.arrays.iter().enumerate() {
            if array.dims.is_empty() || array.dims.len() > 6 {
                return Err(Error::InvalidContainer(format!(
                    "data array {index} has dimensionality {}",
                    array.dims.len()
                )));
            }

            if array.dims.iter().any(|dim| *dim == 0) {
                return Err(Error::InvalidContainer(format!(
                    "data array {index} has a zero extent in {:?}",
                    array.dims
                )));
            }

            if !array.is_consistent() {
                return Err(Error::InvalidContainer(format!(
                    "data array {index} holds {} bytes, dimensions {:?} of {} require {:?}",
                    array.bytes().len(),
                    array.dims,
                    array.kind,
                    array.expected_byte_len()
                )));
            }
        }

        let node_indices = self
            .arrays
            .iter()
            .filter(|array| array.intent == Intent::NodeIndex)
            .count();

        if node_indices > 1 {
            return Err(Error::InvalidContainer(format!(
                "{node_indices} NIFTI_INTENT_NODE_INDEX arrays found, at most one is allowed"
            )));
        }

        self.labels.check()?;

        Ok(())
    }

    /// Append a new array to the end of the container
    pub fn push_array(&mut self, array: DataArray) -> Result<(), Error> {
        self.arrays.try_reserve(1)?;
        self.arrays.push(array);
        Ok(())
    }
}

/// String keyed metadata attached to the container or to a single array.
///
/// Keys are unique; their order carries no meaning.
#[derive(Debug, Default, Clone, PartialEq, Deref, DerefMut)]
pub struct MetaData(BTreeMap<String, String>);

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert (or replace) a value rendered with its `Display` impl
    pub fn set<K: Into<String>, V: ToString>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// look up a value and parse it, `None` if missing or unparsable
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|value| value.trim().parse().ok())
    }
}
