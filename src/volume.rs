//! # Per-vertex frames without a surface
//!
//! Functional and time series data is often stored as a GIFTI file holding
//! nothing but one scalar array per frame. [`read_volume`] turns such a
//! container into an [`OverlayVolume`], [`emit_volume`] builds one from any
//! [`FrameVolume`].

use crate::array::{DataArray, ElementKind, IndexOrder, Intent, StatIntent};
use crate::data::Gifti;
use crate::emit::{write_user_and_date, EmitOptions};
use crate::overlay::OverlayVolume;
use crate::traits::FrameVolume;
use crate::Error;

use ndarray::Array2;

/// Intents searched for frames, in order of preference. Only arrays of the
/// first intent present in a container are read.
pub const FRAME_INTENTS: [Intent; 4] = [
    Intent::TimeSeries,
    Intent::Shape,
    Intent::None,
    Intent::Stat(StatIntent::Normal),
];

const TIME_STEP_KEY: &str = "TimeStep";

/// Size of the volume a container holds, see [`volume_header`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeHeader {
    pub intent: Intent,
    pub vertices: usize,
    pub frames: usize,
    /// `TimeStep` of the first array, 0 when absent
    pub time_step: f32,
}

/// Find the frame arrays of `gifti` and check they all have the same shape
fn frame_arrays(gifti: &Gifti) -> Result<(Intent, Vec<&DataArray>), Error> {
    let (intent, arrays) = FRAME_INTENTS
        .iter()
        .map(|intent| {
            let arrays: Vec<&DataArray> = gifti
                .arrays
                .iter()
                .filter(|array| array.intent == *intent)
                .collect();
            (*intent, arrays)
        })
        .find(|(_, arrays)| !arrays.is_empty())
        .ok_or_else(|| Error::InvalidContainer("no overlay data found".into()))?;

    let vertices = arrays[0].rows();

    for (frame, array) in arrays.iter().enumerate() {
        if array.rows() != vertices || array.columns() != 1 {
            return Err(Error::MalformedDataArray(format!(
                "{intent} frame {frame} has {} rows and {} columns, expected {vertices} rows and 1 column",
                array.rows(),
                array.columns()
            )));
        }
    }

    Ok((intent, arrays))
}

fn time_step(gifti: &Gifti) -> f32 {
    gifti
        .arrays
        .first()
        .and_then(|array| array.meta.get_parsed::<f32>(TIME_STEP_KEY))
        .unwrap_or(0.0)
}

/// Dimensions and time step of the volume in `gifti`, without reading any
/// values
pub fn volume_header(gifti: &Gifti) -> Result<VolumeHeader, Error> {
    gifti.check()?;
    let (intent, arrays) = frame_arrays(gifti)?;

    Ok(VolumeHeader {
        intent,
        vertices: arrays[0].rows(),
        frames: arrays.len(),
        time_step: time_step(gifti),
    })
}

/// Read every array of the first intent of [`FRAME_INTENTS`] present in
/// `gifti` as one frame.
pub fn read_volume(gifti: &Gifti) -> Result<OverlayVolume, Error> {
    gifti.check()?;
    let (intent, arrays) = frame_arrays(gifti)?;
    let vertices = arrays[0].rows();

    let mut values = Array2::<f32>::zeros((vertices, arrays.len()));
    for (frame, array) in arrays.iter().enumerate() {
        for vertex in 0..vertices {
            values[[vertex, frame]] = array.get(vertex, 0)? as f32;
        }
    }

    log::debug!("read {} {intent} frames of {vertices} vertices", arrays.len());

    Ok(OverlayVolume::from_values(values).with_time_step(time_step(gifti)))
}

/// One float32 array per frame of `volume`: `NIFTI_INTENT_NONE` for a single
/// frame, `NIFTI_INTENT_TIME_SERIES` with a `TimeStep` for more.
pub fn emit_volume(volume: &dyn FrameVolume, options: &EmitOptions) -> Result<Gifti, Error> {
    let frames = volume.frames();
    if frames == 0 {
        return Err(Error::InvalidAccess("volume has no frames to write".into()));
    }

    let mut gifti = Gifti::new();
    write_user_and_date(&mut gifti, options);

    let intent = if frames > 1 {
        Intent::TimeSeries
    } else {
        Intent::None
    };

    for frame in 0..frames {
        let mut array = DataArray::allocate(
            intent,
            ElementKind::Float32,
            IndexOrder::RowMajor,
            &[volume.vertices()],
        )?;

        for vertex in 0..volume.vertices() {
            let value = volume.value(vertex, frame).ok_or(Error::IndexOutOfRange {
                row: vertex,
                col: frame,
                dims0: volume.vertices(),
                dims1: frames,
            })?;
            array.set_with(vertex, 0, value as f64, options.out_of_range)?;
        }

        if intent == Intent::TimeSeries {
            array
                .meta
                .set(TIME_STEP_KEY, format!("{:.6}", volume.time_step()));
        }
        array.encoding = options.encoding;

        gifti.push_array(array)?;
    }

    gifti.check()?;

    Ok(gifti)
}

/// Number of arrays holding shape or statistic data, i.e. every array that
/// is not geometry, a label, a node index, a matrix or a vector
pub fn count_scalar_arrays(gifti: &Gifti) -> usize {
    gifti
        .arrays
        .iter()
        .filter(|array| {
            !matches!(
                array.intent,
                Intent::PointSet
                    | Intent::Triangle
                    | Intent::Label
                    | Intent::NodeIndex
                    | Intent::GenMatrix
                    | Intent::Vector
                    | Intent::RgbVector
                    | Intent::RgbaVector
            )
        })
        .count()
}
