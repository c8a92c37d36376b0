//! primitive number types that can live inside a `DataArray` buffer

use super::Endian;
use num_traits::AsPrimitive;

/// A primitive scalar that can be decoded from / encoded into the raw bytes
/// of a data array.
///
/// Every element kind of a GIFTI array is made up of one or more "lanes"
/// of one of these primitives (a `NIFTI_TYPE_COMPLEX64` element is two `f32`
/// lanes, a `NIFTI_TYPE_RGB24` element is three `u8` lanes, and so on).
pub(crate) trait Numeric: Copy + AsPrimitive<f64> {
    /// number of bytes a single value occupies
    const SIZE: usize;

    fn decode(bytes: &[u8], endian: Endian) -> Option<Self>;

    fn encode(self, bytes: &mut [u8], endian: Endian) -> Option<()>;

    /// narrowing conversion with `as` semantics (truncation toward zero, saturating)
    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64 {
        self.as_()
    }

    fn parse_ascii(token: &str) -> Option<Self>;

    fn format_ascii(self, out: &mut String);
}

macro_rules! numeric_bytes {
    ($t:ty) => {
        const SIZE: usize = std::mem::size_of::<$t>();

        fn decode(bytes: &[u8], endian: Endian) -> Option<Self> {
            let arr: [u8; std::mem::size_of::<$t>()] = bytes.get(0..Self::SIZE)?.try_into().ok()?;
            let value = match endian {
                Endian::Little => <$t>::from_le_bytes(arr),
                Endian::Big => <$t>::from_be_bytes(arr),
            };
            Some(value)
        }

        fn encode(self, bytes: &mut [u8], endian: Endian) -> Option<()> {
            let arr = match endian {
                Endian::Little => self.to_le_bytes(),
                Endian::Big => self.to_be_bytes(),
            };
            bytes.get_mut(0..Self::SIZE)?.copy_from_slice(&arr);
            Some(())
        }

        fn from_f64(value: f64) -> Self {
            AsPrimitive::<$t>::as_(value)
        }
    };
}

macro_rules! numeric_int {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                numeric_bytes!($t);

                fn parse_ascii(token: &str) -> Option<Self> {
                    // some writers emit integers with a trailing `.000000`
                    token
                        .parse::<$t>()
                        .ok()
                        .or_else(|| token.parse::<f64>().ok().map(Self::from_f64))
                }

                fn format_ascii(self, out: &mut String) {
                    out.push_str(&self.to_string());
                }
            }
        )*
    };
}

macro_rules! numeric_float {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                numeric_bytes!($t);

                fn parse_ascii(token: &str) -> Option<Self> {
                    token.parse::<$t>().ok()
                }

                fn format_ascii(self, out: &mut String) {
                    let mut buffer = ryu::Buffer::new();
                    out.push_str(buffer.format(self));
                }
            }
        )*
    };
}

numeric_int!(i8, u8, i16, u16, i32, u32, i64, u64);
numeric_float!(f32, f64);

/// The primitive a lane of an element kind is stored as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lane {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// run `$body` with `$t` aliased to the primitive type of `$lane`
macro_rules! on_lane {
    ($lane:expr, $t:ident => $body:expr) => {
        match $lane {
            $crate::array::numeric::Lane::I8 => {
                type $t = i8;
                $body
            }
            $crate::array::numeric::Lane::U8 => {
                type $t = u8;
                $body
            }
            $crate::array::numeric::Lane::I16 => {
                type $t = i16;
                $body
            }
            $crate::array::numeric::Lane::U16 => {
                type $t = u16;
                $body
            }
            $crate::array::numeric::Lane::I32 => {
                type $t = i32;
                $body
            }
            $crate::array::numeric::Lane::U32 => {
                type $t = u32;
                $body
            }
            $crate::array::numeric::Lane::I64 => {
                type $t = i64;
                $body
            }
            $crate::array::numeric::Lane::U64 => {
                type $t = u64;
                $body
            }
            $crate::array::numeric::Lane::F32 => {
                type $t = f32;
                $body
            }
            $crate::array::numeric::Lane::F64 => {
                type $t = f64;
                $body
            }
        }
    };
}

pub(crate) use on_lane;
