//! # Traits
//!
//! Interfaces to the collaborators the surface pipelines talk to without
//! owning them. Both come with an implementation in this crate
//! ([`OverlayVolume`](`crate::OverlayVolume`) and
//! [`XfmTransformSource`](`crate::XfmTransformSource`)) but can be implemented
//! by callers that keep this data elsewhere.

use crate::mesh::Surface;
use crate::transform::Affine;
use crate::Error;

use std::path::Path;

/// A multi-frame, per-vertex scalar volume.
///
/// This is the collaborator overlay data is round-tripped through: on read every
/// captured SHAPE or statistic array is written into the next frame, on write
/// every requested frame becomes an array.
pub trait FrameVolume {
    /// number of vertices (voxels along the first axis)
    fn vertices(&self) -> usize;

    fn frames(&self) -> usize;

    fn value(&self, vertex: usize, frame: usize) -> Option<f32>;

    /// Store `value` for `vertex` in `frame`. Implementations may grow the number
    /// of frames to make room.
    fn set_value(&mut self, vertex: usize, frame: usize, value: f32) -> Result<(), Error>;

    /// time between frames, written as `TimeStep` for time series
    fn time_step(&self) -> f32 {
        0.0
    }
}

/// Where a stored Talairach matrix for a surface can be found when the
/// surface's own volume geometry does not provide a transform.
pub trait TransformSource {
    /// `path_hint` is the path the surface is being written to
    fn stored_transform(&self, surface: &Surface, path_hint: Option<&Path>) -> Option<Affine>;
}
