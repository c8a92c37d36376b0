//! Read and write FreeSurfer triangulated surfaces and their per-vertex data as
//! [GIFTI](https://www.nitrc.org/projects/gifti/) xml files.
//!
//! A GIFTI file is parsed into a [`Gifti`] container: file level metadata, a
//! label table and an ordered list of typed [`DataArray`]s. The container is
//! then folded into a [`Surface`] by [`ingest()`], which recognises the arrays by
//! their intent: coordinates and triangles become the mesh, shape and
//! statistic arrays become per-vertex scalars, labels become annotations and
//! so on. [`emit()`] goes the other way.
//!
//! ```no_run
//! use gifti::{Output, EmitOptions};
//!
//! let surface = gifti::read_surface("lh.white.gii")?;
//! println!("{} vertices", surface.num_vertices());
//!
//! let options = EmitOptions::default();
//! gifti::write_output(&surface, Output::Surface, "lh.white.copy.gii", options)?;
//! # Ok::<(), gifti::Error>(())
//! ```

pub mod array;
pub mod classify;
pub mod color;
mod data;
pub mod emit;
pub mod ingest;
mod label;
pub mod mesh;
pub mod naming;
mod overlay;
pub mod parse;
pub mod prelude;
pub mod sparse;
mod traits;
pub mod transform;
mod utils;
pub mod volume;
mod write_gifti;

pub use array::{DataArray, ElementKind, Encoding, Endian, IndexOrder, Intent, OutOfRangeWrite, StatIntent};
pub use color::{ColorEntry, ColorTable};
pub use data::{Gifti, MetaData, GIFTI_VERSION};
pub use emit::{emit, EmitOptions, OverlaySelection, Output, ScalarSource};
pub use ingest::{ingest, ReadOptions};
pub use label::{Label, LabelTable, Rgba};
pub use mesh::{Face, Hemisphere, Surface, Vertex};
pub use overlay::OverlayVolume;
pub use traits::{FrameVolume, TransformSource};
pub use transform::XfmTransformSource;
pub use volume::{count_scalar_arrays, emit_volume, read_volume, volume_header, VolumeHeader};

pub use parse::{parse_gifti, read_gifti, ParseError};
pub use write_gifti::{to_string, write_gifti, write_gifti_file};

pub use ndarray;

pub use quick_xml::reader::Reader;
pub use quick_xml::writer::Writer;

use std::path::Path;

/// general purpose error enumeration for possible causes of failure.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("An io error occured: `{0}`")]
    Io(#[from] std::io::Error),
    #[error("Error while parsing GIFTI xml: {0}")]
    Parse(#[from] parse::ParseError),
    #[error("Could not write XML data to file: `{0}`")]
    XmlWrite(#[from] quick_xml::Error),
    #[error("Invalid GIFTI container: {0}")]
    InvalidContainer(String),
    #[error("Malformed data array: {0}")]
    MalformedDataArray(String),
    #[error("Malformed NODE_INDEX array: {0}")]
    MalformedSparseIndex(String),
    #[error("Missing color table: {0}")]
    MissingColorTable(String),
    #[error("Label table and color table disagree: {0}")]
    LabelConsistency(String),
    #[error("Element ({row}, {col}) is outside of an array with dimensions ({dims0}, {dims1})")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        dims0: usize,
        dims1: usize,
    },
    #[error("Element access is not supported for {0} arrays")]
    UnsupportedType(ElementKind),
    #[error("Could not allocate memory: {0}")]
    OutOfMemory(#[from] std::collections::TryReserveError),
    #[error("Invalid access: {0}")]
    InvalidAccess(String),
}

/// Read a surface (coordinates and triangles, plus any other arrays the file
/// holds) from a GIFTI file
pub fn read_surface<P: AsRef<Path>>(path: P) -> Result<Surface, Error> {
    read_surface_with(path, &mut ReadOptions::default())
}

/// [`read_surface`] with control over the command history cap and an optional
/// sink for scalar frames
pub fn read_surface_with<P: AsRef<Path>>(
    path: P,
    options: &mut ReadOptions,
) -> Result<Surface, Error> {
    let path = path.as_ref();
    let gifti = read_gifti(path)?;

    let mut surface = ingest(&gifti, None, options)?;
    surface.name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string);

    log::info!(
        "read {} with {} vertices and {} faces",
        path.display(),
        surface.num_vertices(),
        surface.num_faces()
    );

    Ok(surface)
}

/// Apply the per-vertex arrays of a GIFTI file (shapes, labels, statistics,
/// vectors and colors) to an existing surface. Any geometry in the file is
/// ignored.
///
/// On failure `surface` is left untouched.
pub fn read_overlay_into<P: AsRef<Path>>(
    surface: &mut Surface,
    path: P,
    options: &mut ReadOptions,
) -> Result<(), Error> {
    let gifti = read_gifti(path.as_ref())?;
    *surface = ingest(&gifti, Some(surface.clone()), options)?;
    Ok(())
}

/// Write the geometry of `surface` to a GIFTI file
pub fn write_surface<P: AsRef<Path>>(surface: &Surface, path: P) -> Result<(), Error> {
    write_output(surface, Output::Surface, path, EmitOptions::default())
}

/// Write `output` of `surface` to a GIFTI file. The path is also used for the
/// naming conventions of the written arrays unless `options` carries one.
pub fn write_output<P: AsRef<Path>>(
    surface: &Surface,
    output: Output,
    path: P,
    mut options: EmitOptions,
) -> Result<(), Error> {
    let path = path.as_ref();
    if options.path.is_none() {
        options.path = Some(path.to_path_buf());
    }

    let gifti = emit(surface, output, &options)?;
    write_gifti_file(path, &gifti)?;

    log::info!("wrote {} arrays to {}", gifti.arrays.len(), path.display());

    Ok(())
}

/// Read the frames of a GIFTI file holding per-vertex functional or time
/// series data, see [`volume::read_volume`]
pub fn read_overlay_volume<P: AsRef<Path>>(path: P) -> Result<OverlayVolume, Error> {
    let gifti = read_gifti(path.as_ref())?;
    read_volume(&gifti)
}

/// Vertex count, frame count and time step of the volume in a GIFTI file
pub fn read_overlay_header<P: AsRef<Path>>(path: P) -> Result<VolumeHeader, Error> {
    let gifti = read_gifti(path.as_ref())?;
    volume_header(&gifti)
}

/// Write every frame of `volume` as its own array, see [`volume::emit_volume`]
pub fn write_volume<P: AsRef<Path>>(
    volume: &dyn FrameVolume,
    path: P,
    options: &EmitOptions,
) -> Result<(), Error> {
    let path = path.as_ref();
    let gifti = emit_volume(volume, options)?;
    write_gifti_file(path, &gifti)?;

    log::info!("wrote {} frames to {}", gifti.arrays.len(), path.display());

    Ok(())
}
