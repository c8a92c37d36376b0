//! The `DataArray` container type and the descriptors that go with it
//!
//! A `DataArray` is a rectangular block of numbers of a single element kind
//! together with everything the GIFTI `<DataArray>` element says about it:
//! what it means (its [`Intent`]), how it is laid out in memory
//! ([`IndexOrder`]), its byte order and its metadata. The raw bytes are kept
//! exactly as they were decoded from the file; reading and writing single
//! elements goes through [`DataArray::get`] and [`DataArray::set`] which
//! take care of storage order and element width.

pub(crate) mod codec;
mod element;
mod intent;
pub(crate) mod numeric;

pub use element::OutOfRangeWrite;
pub use intent::{Intent, StatIntent};

use crate::data::MetaData;
use crate::transform::CoordTransform;
use crate::Error;
use numeric::Lane;

use std::fmt;

/// The element type of a data array (`DataType` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Rgb24,
    Rgba32,
}

const ELEMENT_NAMES: [(ElementKind, &str); 14] = [
    (ElementKind::Int8, "NIFTI_TYPE_INT8"),
    (ElementKind::UInt8, "NIFTI_TYPE_UINT8"),
    (ElementKind::Int16, "NIFTI_TYPE_INT16"),
    (ElementKind::UInt16, "NIFTI_TYPE_UINT16"),
    (ElementKind::Int32, "NIFTI_TYPE_INT32"),
    (ElementKind::UInt32, "NIFTI_TYPE_UINT32"),
    (ElementKind::Int64, "NIFTI_TYPE_INT64"),
    (ElementKind::UInt64, "NIFTI_TYPE_UINT64"),
    (ElementKind::Float32, "NIFTI_TYPE_FLOAT32"),
    (ElementKind::Float64, "NIFTI_TYPE_FLOAT64"),
    (ElementKind::Complex64, "NIFTI_TYPE_COMPLEX64"),
    (ElementKind::Complex128, "NIFTI_TYPE_COMPLEX128"),
    (ElementKind::Rgb24, "NIFTI_TYPE_RGB24"),
    (ElementKind::Rgba32, "NIFTI_TYPE_RGBA32"),
];

impl ElementKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ELEMENT_NAMES
            .iter()
            .find(|(_, text)| *text == name)
            .map(|(kind, _)| *kind)
    }

    pub fn name(&self) -> &'static str {
        ELEMENT_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, text)| *text)
            .unwrap_or("NIFTI_TYPE_FLOAT32")
    }

    /// number of bytes one element occupies in the buffer
    pub fn byte_width(&self) -> usize {
        self.lanes() * self.lane_width()
    }

    /// whether single elements of this kind can be read and written through
    /// [`DataArray::get`] / [`DataArray::set`]
    pub fn is_accessible(&self) -> bool {
        !matches!(
            self,
            Self::Int64 | Self::UInt64 | Self::Complex128 | Self::Rgb24 | Self::Rgba32
        )
    }

    pub(crate) fn lane(&self) -> Lane {
        match self {
            Self::Int8 => Lane::I8,
            Self::UInt8 | Self::Rgb24 | Self::Rgba32 => Lane::U8,
            Self::Int16 => Lane::I16,
            Self::UInt16 => Lane::U16,
            Self::Int32 => Lane::I32,
            Self::UInt32 => Lane::U32,
            Self::Int64 => Lane::I64,
            Self::UInt64 => Lane::U64,
            Self::Float32 | Self::Complex64 => Lane::F32,
            Self::Float64 | Self::Complex128 => Lane::F64,
        }
    }

    pub(crate) fn lanes(&self) -> usize {
        match self {
            Self::Complex64 | Self::Complex128 => 2,
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
            _ => 1,
        }
    }

    pub(crate) fn lane_width(&self) -> usize {
        match self.lane() {
            Lane::I8 | Lane::U8 => 1,
            Lane::I16 | Lane::U16 => 2,
            Lane::I32 | Lane::U32 | Lane::F32 => 4,
            Lane::I64 | Lane::U64 | Lane::F64 => 8,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Storage order of a two dimensional array (`ArrayIndexingOrder` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    #[default]
    RowMajor,
    ColumnMajor,
}

impl IndexOrder {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "RowMajorOrder" => Some(Self::RowMajor),
            "ColumnMajorOrder" => Some(Self::ColumnMajor),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RowMajor => "RowMajorOrder",
            Self::ColumnMajor => "ColumnMajorOrder",
        }
    }
}

/// How the contents of `<Data>` are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Ascii,
    #[default]
    Base64Binary,
    GZipBase64Binary,
    ExternalFileBinary,
}

impl Encoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "ASCII" => Some(Self::Ascii),
            "Base64Binary" => Some(Self::Base64Binary),
            "GZipBase64Binary" => Some(Self::GZipBase64Binary),
            "ExternalFileBinary" => Some(Self::ExternalFileBinary),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ascii => "ASCII",
            Self::Base64Binary => "Base64Binary",
            Self::GZipBase64Binary => "GZipBase64Binary",
            Self::ExternalFileBinary => "ExternalFileBinary",
        }
    }
}

/// Byte order of the binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "LittleEndian" => Some(Self::Little),
            "BigEndian" => Some(Self::Big),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Little => "LittleEndian",
            Self::Big => "BigEndian",
        }
    }
}

/// A single typed, ordered array of a GIFTI container
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub intent: Intent,
    pub kind: ElementKind,
    pub order: IndexOrder,
    pub dims: Vec<usize>,
    pub encoding: Encoding,
    pub endian: Endian,
    pub meta: MetaData,
    pub transforms: Vec<CoordTransform>,
    data: Vec<u8>,
}

impl DataArray {
    /// Allocate a zero filled array with the given shape.
    ///
    /// The allocation is fallible: a buffer that cannot be reserved is reported
    /// as [`Error::OutOfMemory`] instead of aborting the process.
    pub fn allocate(
        intent: Intent,
        kind: ElementKind,
        order: IndexOrder,
        dims: &[usize],
    ) -> Result<Self, Error> {
        let len = byte_len(kind, dims).ok_or_else(|| {
            Error::MalformedDataArray(format!("dimensions {dims:?} overflow the address space"))
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0);

        Ok(Self {
            intent,
            kind,
            order,
            dims: dims.to_vec(),
            encoding: Encoding::default(),
            endian: Endian::default(),
            meta: MetaData::default(),
            transforms: Vec::new(),
            data,
        })
    }

    /// Build an array around an already decoded buffer. The buffer length is
    /// not checked here, see [`DataArray::is_consistent`].
    pub fn from_bytes(
        intent: Intent,
        kind: ElementKind,
        order: IndexOrder,
        dims: Vec<usize>,
        endian: Endian,
        data: Vec<u8>,
    ) -> Self {
        Self {
            intent,
            kind,
            order,
            dims,
            encoding: Encoding::default(),
            endian,
            meta: MetaData::default(),
            transforms: Vec::new(),
            data,
        }
    }

    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    /// number of records (the first dimension)
    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// number of values per record. One dimensional arrays have a single column.
    pub fn columns(&self) -> usize {
        if self.dims.len() <= 1 {
            1
        } else {
            self.dims[1..].iter().product()
        }
    }

    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// the number of bytes the declared dimensions require
    pub fn expected_byte_len(&self) -> Option<usize> {
        byte_len(self.kind, &self.dims)
    }

    /// true when the buffer holds exactly `product(dims) * element width` bytes
    pub fn is_consistent(&self) -> bool {
        self.expected_byte_len() == Some(self.data.len())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// the `Name` metadata entry, if any
    pub fn name(&self) -> Option<&str> {
        self.meta.get("Name").map(String::as_str)
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

fn byte_len(kind: ElementKind, dims: &[usize]) -> Option<usize> {
    dims.iter()
        .try_fold(kind.byte_width(), |acc, dim| acc.checked_mul(*dim))
}
