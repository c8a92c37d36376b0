//! Common traits and types that are useful for working with `gifti`

pub use crate::array::{DataArray, ElementKind, Encoding, Endian, IndexOrder, Intent, StatIntent};
pub use crate::data::{Gifti, MetaData};
pub use crate::emit::{EmitOptions, OverlaySelection, Output, ScalarSource};
pub use crate::ingest::ReadOptions;
pub use crate::label::{Label, LabelTable};
pub use crate::mesh::{Face, Hemisphere, Surface, Vertex};
pub use crate::overlay::OverlayVolume;
pub use crate::traits::{FrameVolume, TransformSource};
pub use crate::volume::VolumeHeader;
pub use crate::Error;
