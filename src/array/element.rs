//! Single element access into a `DataArray`
//!
//! Callers always address an element by `(row, col)` where `row` is the record
//! (vertex, face, ...) and `col` is the field within the record. The accessor
//! translates that to a physical element index according to the array's
//! [`IndexOrder`] and decodes the bytes according to its [`ElementKind`].

use super::numeric::Numeric;
use super::{DataArray, ElementKind, Endian, IndexOrder};
use crate::Error;

/// What [`DataArray::set_with`] does with a write outside the array bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutOfRangeWrite {
    /// log a warning and leave the buffer untouched
    #[default]
    Ignore,
    /// report [`Error::IndexOutOfRange`], like reads do
    Fail,
}

impl DataArray {
    /// Read the element at logical `(row, col)` widened to `f64`.
    ///
    /// Complex elements yield their real part.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, Error> {
        let index = self.physical_index(row, col)?;
        let bytes = self.element_bytes(index)?;
        decode_element(self.kind, bytes, self.endian)
    }

    /// Write `value` to the element at logical `(row, col)`, narrowing it to the
    /// element kind of the array. Out of range writes are an error.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), Error> {
        let index = self.physical_index(row, col)?;
        let kind = self.kind;
        let endian = self.endian;
        let width = kind.byte_width();
        let range = index * width..(index + 1) * width;

        let bytes = self
            .bytes_mut()
            .get_mut(range)
            .ok_or_else(|| buffer_too_short(index))?;

        encode_element(kind, value, bytes, endian)
    }

    /// Like [`DataArray::set`], but an out of range write is handled according
    /// to `policy`. Any other failure is still reported.
    pub fn set_with(
        &mut self,
        row: usize,
        col: usize,
        value: f64,
        policy: OutOfRangeWrite,
    ) -> Result<(), Error> {
        match self.set(row, col, value) {
            Err(Error::IndexOutOfRange {
                row,
                col,
                dims0,
                dims1,
            }) if policy == OutOfRangeWrite::Ignore => {
                log::warn!(
                    "ignoring write to ({row}, {col}) outside of {} array with shape {dims0}x{dims1}",
                    self.intent
                );
                Ok(())
            }
            other => other,
        }
    }

    /// logical `(dims0, dims1)` as seen by the accessor
    fn logical_shape(&self, col: usize) -> Result<(usize, usize), Error> {
        match self.dims.as_slice() {
            [dims0] => {
                if col != 0 {
                    return Err(Error::InvalidAccess(format!(
                        "column {col} requested from a one dimensional array"
                    )));
                }
                Ok((*dims0, 1))
            }
            [dims0, dims1] => Ok((*dims0, *dims1)),
            dims => Err(Error::InvalidAccess(format!(
                "element access needs a one or two dimensional array, got {} dimensions",
                dims.len()
            ))),
        }
    }

    fn physical_index(&self, row: usize, col: usize) -> Result<usize, Error> {
        let (dims0, dims1) = self.logical_shape(col)?;

        if row >= dims0 || col >= dims1 {
            return Err(Error::IndexOutOfRange {
                row,
                col,
                dims0,
                dims1,
            });
        }

        let index = match self.order {
            IndexOrder::RowMajor => row * dims1 + col,
            IndexOrder::ColumnMajor => row + col * dims0,
        };

        Ok(index)
    }

    fn element_bytes(&self, index: usize) -> Result<&[u8], Error> {
        let width = self.kind.byte_width();
        self.bytes()
            .get(index * width..(index + 1) * width)
            .ok_or_else(|| buffer_too_short(index))
    }
}

fn buffer_too_short(index: usize) -> Error {
    Error::InvalidContainer(format!(
        "data buffer is shorter than its dimensions, element {index} is missing"
    ))
}

fn decode_element(kind: ElementKind, bytes: &[u8], endian: Endian) -> Result<f64, Error> {
    let value = match kind {
        ElementKind::Int8 => i8::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::UInt8 => u8::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::Int16 => i16::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::UInt16 => u16::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::Int32 => i32::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::UInt32 => u32::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::Float32 => f32::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::Float64 => f64::decode(bytes, endian).map(Numeric::to_f64),
        // real part first, imaginary part second
        ElementKind::Complex64 => f32::decode(bytes, endian).map(Numeric::to_f64),
        ElementKind::Int64
        | ElementKind::UInt64
        | ElementKind::Complex128
        | ElementKind::Rgb24
        | ElementKind::Rgba32 => return Err(Error::UnsupportedType(kind)),
    };

    value.ok_or_else(|| buffer_too_short(0))
}

fn encode_element(
    kind: ElementKind,
    value: f64,
    bytes: &mut [u8],
    endian: Endian,
) -> Result<(), Error> {
    let written = match kind {
        ElementKind::Int8 => i8::from_f64(value).encode(bytes, endian),
        ElementKind::UInt8 => u8::from_f64(value).encode(bytes, endian),
        ElementKind::Int16 => i16::from_f64(value).encode(bytes, endian),
        ElementKind::UInt16 => u16::from_f64(value).encode(bytes, endian),
        ElementKind::Int32 => i32::from_f64(value).encode(bytes, endian),
        ElementKind::UInt32 => u32::from_f64(value).encode(bytes, endian),
        ElementKind::Float32 => f32::from_f64(value).encode(bytes, endian),
        ElementKind::Float64 => value.encode(bytes, endian),
        ElementKind::Complex64 => {
            let (real, imaginary) = bytes.split_at_mut(f32::SIZE);
            f32::from_f64(value)
                .encode(real, endian)
                .and_then(|_| 0f32.encode(imaginary, endian))
        }
        ElementKind::Int64
        | ElementKind::UInt64
        | ElementKind::Complex128
        | ElementKind::Rgb24
        | ElementKind::Rgba32 => return Err(Error::UnsupportedType(kind)),
    };

    written.ok_or_else(|| buffer_too_short(0))
}
