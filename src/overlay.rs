//! ndarray backed per-vertex, multi-frame scalar data

use crate::traits::FrameVolume;
use crate::Error;

use ndarray::{Array1, Array2, Axis};

/// Overlay values with one row per vertex and one column per frame.
///
/// Writing past the last frame appends zero filled frames, which is how reading
/// a container with several SHAPE / statistic arrays fills it up.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayVolume {
    values: Array2<f32>,
    time_step: f32,
}

impl OverlayVolume {
    /// an overlay for `vertices` vertices without any frames yet
    pub fn new(vertices: usize) -> Self {
        Self {
            values: Array2::zeros((vertices, 0)),
            time_step: 0.0,
        }
    }

    /// wrap existing values laid out as `(vertex, frame)`
    pub fn from_values(values: Array2<f32>) -> Self {
        Self {
            values,
            time_step: 0.0,
        }
    }

    /// a single frame overlay
    pub fn from_frame(frame: &[f32]) -> Self {
        let values = Array1::from(frame.to_vec()).insert_axis(Axis(1));
        Self::from_values(values)
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    /// the values of a single frame, `None` if the frame does not exist
    pub fn frame(&self, frame: usize) -> Option<Vec<f32>> {
        if frame >= self.values.ncols() {
            return None;
        }
        Some(self.values.column(frame).to_vec())
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f32> {
        self.values
    }
}

impl FrameVolume for OverlayVolume {
    fn vertices(&self) -> usize {
        self.values.nrows()
    }

    fn frames(&self) -> usize {
        self.values.ncols()
    }

    fn value(&self, vertex: usize, frame: usize) -> Option<f32> {
        self.values.get((vertex, frame)).copied()
    }

    fn set_value(&mut self, vertex: usize, frame: usize, value: f32) -> Result<(), Error> {
        let vertices = self.values.nrows();
        if vertex >= vertices {
            return Err(Error::IndexOutOfRange {
                row: vertex,
                col: frame,
                dims0: vertices,
                dims1: self.values.ncols(),
            });
        }

        while self.values.ncols() <= frame {
            let empty = Array1::<f32>::zeros(vertices);
            self.values
                .push_column(empty.view())
                .map_err(|e| Error::InvalidAccess(format!("could not add an overlay frame: {e}")))?;
        }

        self.values[[vertex, frame]] = value;
        Ok(())
    }

    fn time_step(&self) -> f32 {
        self.time_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_frames_on_write() {
        let mut volume = OverlayVolume::new(4);
        assert_eq!(volume.frames(), 0);

        volume.set_value(2, 1, 3.5).unwrap();
        assert_eq!(volume.frames(), 2);
        assert_eq!(volume.value(2, 1), Some(3.5));
        assert_eq!(volume.value(2, 0), Some(0.0));
        assert_eq!(volume.value(2, 2), None);
    }

    #[test]
    fn vertex_out_of_range() {
        let mut volume = OverlayVolume::new(2);
        assert!(matches!(
            volume.set_value(2, 0, 1.0),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn single_frame() {
        let volume = OverlayVolume::from_frame(&[1.0, 2.0, 3.0]);
        assert_eq!(volume.frames(), 1);
        assert_eq!(volume.vertices(), 3);
        assert_eq!(volume.frame(0), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(volume.frame(1), None);
    }
}
