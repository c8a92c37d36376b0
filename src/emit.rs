//! # Writing surfaces into a container
//!
//! [`emit`] is the inverse of [`ingest`](`crate::ingest()`): it turns a
//! [`Surface`] (and optionally frames of an external [`FrameVolume`]) into the
//! arrays, label table and metadata of a [`Gifti`] container. What ends up in
//! the container is chosen with an [`Output`].

use crate::array::{DataArray, ElementKind, Encoding, IndexOrder, Intent, OutOfRangeWrite, StatIntent};
use crate::data::Gifti;
use crate::ingest::{cmdline_key, GROUP_AVG_AREA_KEY, NUM_CMDLINE_KEY};
use crate::mesh::{Surface, Vertex};
use crate::naming::{infer_shape, infer_surface, topological_type};
use crate::sparse::node_index_array;
use crate::traits::{FrameVolume, TransformSource};
use crate::transform::{emit_transform, XfmTransformSource};
use crate::utils;
use crate::Error;

use std::ops::Range;
use std::path::{Path, PathBuf};

/// Where the values of a scalar array come from
#[derive(Clone, Copy)]
pub enum ScalarSource<'a> {
    /// the `curv` field of every vertex
    Curvature,
    /// the `val` field of every vertex
    Value,
    /// the `stat` field of every vertex
    Statistic,
    /// the only frame of a volume
    Volume(&'a dyn FrameVolume),
}

/// One overlay of a combined output: every frame in `frames` becomes an array
#[derive(Clone)]
pub struct OverlaySelection<'a> {
    pub intent: Intent,
    pub volume: &'a dyn FrameVolume,
    pub frames: Range<usize>,
    /// written as the `Name` metadata of every array
    pub name: Option<String>,
    pub kind: ElementKind,
}

impl<'a> OverlaySelection<'a> {
    /// all frames of `volume`, written as float32
    pub fn new(intent: Intent, volume: &'a dyn FrameVolume) -> Self {
        Self {
            intent,
            volume,
            frames: 0..volume.frames(),
            name: None,
            kind: ElementKind::Float32,
        }
    }

    pub fn with_frames(mut self, frames: Range<usize>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What [`emit`] writes
#[derive(Clone)]
pub enum Output<'a> {
    /// coordinates and faces
    Surface,
    /// a single SHAPE array
    Shape { source: ScalarSource<'a> },
    /// the color table as label table plus a LABEL array
    Label,
    /// a single statistic array
    Statistic {
        intent: Intent,
        source: ScalarSource<'a>,
    },
    /// the surface followed by every frame of every overlay
    Combined { overlays: Vec<OverlaySelection<'a>> },
}

/// Behaviour of [`emit`]
pub struct EmitOptions {
    pub encoding: Encoding,
    /// Output path. Used for naming conventions and to locate a stored
    /// Talairach transform.
    pub path: Option<PathBuf>,
    /// write scalar and label data only for these vertices, preceded by a
    /// NODE_INDEX array
    pub node_index: Option<Vec<usize>>,
    pub out_of_range: OutOfRangeWrite,
    /// Read the three channels of RGB overlays from three consecutive frames.
    /// Off by default, where the first frame feeds all three channels.
    pub rgb_overlay_from_consecutive_frames: bool,
    /// `UserName` metadata, defaults to `$USER`
    pub user_name: Option<String>,
    /// `Date` metadata, defaults to the current time
    pub date: Option<String>,
    /// defaults to [`XfmTransformSource`]
    pub transform_source: Option<Box<dyn TransformSource>>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            encoding: Encoding::Base64Binary,
            path: None,
            node_index: None,
            out_of_range: OutOfRangeWrite::default(),
            rgb_overlay_from_consecutive_frames: false,
            user_name: None,
            date: None,
            transform_source: None,
        }
    }
}

impl EmitOptions {
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_node_index(mut self, nodes: Vec<usize>) -> Self {
        self.node_index = Some(nodes);
        self
    }

    /// file name naming conventions are matched against
    fn naming_source<'s>(&'s self, surface: &'s Surface) -> &'s str {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .or(surface.name.as_deref())
            .unwrap_or("")
    }
}

/// Build a container holding `output` of `surface`
pub fn emit(surface: &Surface, output: Output, options: &EmitOptions) -> Result<Gifti, Error> {
    let mut gifti = Gifti::new();
    write_provenance(&mut gifti, surface, options);

    let rows = overlay_rows(surface, &output, options)?;

    match output {
        Output::Surface => emit_geometry(&mut gifti, surface, options)?,
        Output::Shape { source } => {
            let array = emit_shape(surface, source, &rows, options)?;
            gifti.push_array(array)?;
        }
        Output::Label => emit_label(&mut gifti, surface, &rows, options)?,
        Output::Statistic { intent, source } => {
            let array = emit_statistic(surface, intent, source, &rows, options)?;
            gifti.push_array(array)?;
        }
        Output::Combined { overlays } => {
            emit_geometry(&mut gifti, surface, options)?;
            for overlay in &overlays {
                emit_overlay(&mut gifti, surface, overlay, &rows, options)?;
            }
        }
    }

    if let (Some(nodes), false) = (&options.node_index, rows.is_empty()) {
        gifti.arrays.try_reserve(1)?;
        gifti.arrays.insert(0, node_index_array(nodes)?);
    }

    for array in gifti.arrays.iter_mut() {
        array.encoding = options.encoding;
    }

    gifti.check()?;

    log::debug!("emitted container with {} arrays", gifti.arrays.len());

    Ok(gifti)
}

/// Vertices written by scalar and label arrays, in row order. Empty for a
/// surface only output, which never uses a node index.
fn overlay_rows(surface: &Surface, output: &Output, options: &EmitOptions) -> Result<Vec<usize>, Error> {
    if matches!(output, Output::Surface) {
        return Ok(Vec::new());
    }

    let num_vertices = surface.num_vertices();

    match &options.node_index {
        Some(nodes) => {
            if let Some(bad) = nodes.iter().find(|node| **node >= num_vertices) {
                return Err(Error::MalformedSparseIndex(format!(
                    "node index lists vertex {bad}, the surface has {num_vertices} vertices"
                )));
            }
            let mut rows = Vec::new();
            rows.try_reserve_exact(nodes.len())?;
            rows.extend_from_slice(nodes);
            Ok(rows)
        }
        None => {
            let mut rows = Vec::new();
            rows.try_reserve_exact(num_vertices)?;
            rows.extend(0..num_vertices);
            Ok(rows)
        }
    }
}

fn write_provenance(gifti: &mut Gifti, surface: &Surface, options: &EmitOptions) {
    write_user_and_date(gifti, options);

    if let Some(subject) = &surface.subject {
        gifti.meta.set("SubjectID", subject);
    }
}

/// `UserName` and `Date` container metadata
pub(crate) fn write_user_and_date(gifti: &mut Gifti, options: &EmitOptions) {
    let user = options
        .user_name
        .clone()
        .or_else(|| std::env::var("USER").ok());
    if let Some(user) = user {
        gifti.meta.set("UserName", user);
    }

    let date = options.date.clone().unwrap_or_else(utils::current_date);
    gifti.meta.set("Date", date);
}

fn emit_geometry(gifti: &mut Gifti, surface: &Surface, options: &EmitOptions) -> Result<(), Error> {
    let num_vertices = surface.num_vertices();

    let mut coords = DataArray::allocate(
        Intent::PointSet,
        ElementKind::Float32,
        IndexOrder::RowMajor,
        &[num_vertices, 3],
    )?;

    for (row, vertex) in surface.vertices.iter().enumerate() {
        for (col, value) in vertex.position().into_iter().enumerate() {
            coords.set_with(row, col, value as f64, options.out_of_range)?;
        }
    }

    let fallback = XfmTransformSource;
    let source: &dyn TransformSource = match &options.transform_source {
        Some(source) => source.as_ref(),
        None => &fallback,
    };

    if let Some(transform) = emit_transform(surface, options.path.as_deref(), source)? {
        coords.transforms.push(transform);
    }

    let name = options.naming_source(surface);
    let topological = topological_type(surface.patch);
    let meta = &mut coords.meta;

    if !name.is_empty() {
        let naming = infer_surface(name);
        if let Some(primary) = naming.primary {
            meta.set("AnatomicalStructurePrimary", primary);
        }
        if let Some(secondary) = naming.secondary {
            meta.set("AnatomicalStructureSecondary", secondary);
        }
        if let Some(geometric) = naming.geometric {
            meta.set("GeometricType", geometric);
        }
        meta.set("Name", name);
    }

    if surface.volume_geometry.valid {
        surface.volume_geometry.write_meta(meta);

        let [cx, cy, cz] = surface.dimensions.center;
        meta.set("SurfaceCenterX", utils::format_float(cx as f64));
        meta.set("SurfaceCenterY", utils::format_float(cy as f64));
        meta.set("SurfaceCenterZ", utils::format_float(cz as f64));
    }

    if surface.group_avg_area != 0.0 {
        meta.set(
            GROUP_AVG_AREA_KEY,
            utils::format_float(surface.group_avg_area as f64),
        );
    }

    if !surface.commands.is_empty() {
        meta.set(NUM_CMDLINE_KEY, surface.commands.len());
        for (index, command) in surface.commands.iter().enumerate() {
            meta.set(cmdline_key(index), command);
        }
    }

    let kept: Vec<_> = surface
        .faces
        .iter()
        .filter(|face| !surface.face_is_ripped(face))
        .collect();

    if kept.is_empty() {
        return Err(Error::InvalidAccess(
            "every face of the surface touches a ripped vertex".into(),
        ));
    }

    let mut faces = DataArray::allocate(
        Intent::Triangle,
        ElementKind::Int32,
        IndexOrder::RowMajor,
        &[kept.len(), 3],
    )?;

    for (row, face) in kept.iter().enumerate() {
        for (col, vertex) in face.vertices.iter().enumerate() {
            faces.set_with(row, col, *vertex as f64, options.out_of_range)?;
        }
    }
    if !name.is_empty() {
        faces.meta.set("TopologicalType", topological);
        faces.meta.set("Name", name);
    }

    if kept.len() != surface.num_faces() {
        log::info!(
            "{} faces touching ripped vertices not written",
            surface.num_faces() - kept.len()
        );
    }

    gifti.push_array(coords)?;
    gifti.push_array(faces)?;

    Ok(())
}

/// A one column float array with one row per entry of `rows`. Rows of ripped
/// vertices stay zero.
fn scalar_array<F>(
    surface: &Surface,
    intent: Intent,
    kind: ElementKind,
    rows: &[usize],
    options: &EmitOptions,
    value: F,
) -> Result<DataArray, Error>
where
    F: Fn(usize) -> Result<f32, Error>,
{
    let mut array = DataArray::allocate(intent, kind, IndexOrder::RowMajor, &[rows.len()])?;

    for (row, vertex) in unripped(surface, rows) {
        array.set_with(row, 0, value(vertex)? as f64, options.out_of_range)?;
    }

    Ok(array)
}

/// `(row, vertex)` pairs of `rows` whose vertex is not ripped
fn unripped<'r>(surface: &'r Surface, rows: &'r [usize]) -> impl Iterator<Item = (usize, usize)> + 'r {
    rows.iter()
        .copied()
        .enumerate()
        .filter(move |(_, vertex)| !surface.vertices[*vertex].ripped)
}

type Values<'v> = Box<dyn Fn(usize) -> Result<f32, Error> + 'v>;

fn field_values(surface: &Surface, field: fn(&Vertex) -> f32) -> Values<'_> {
    Box::new(move |vertex| Ok(field(&surface.vertices[vertex])))
}

/// per-vertex values of a scalar source
fn source_values<'v>(surface: &'v Surface, source: ScalarSource<'v>) -> Result<Values<'v>, Error> {
    let values = match source {
        ScalarSource::Curvature => field_values(surface, |v| v.curv),
        ScalarSource::Value => field_values(surface, |v| v.val),
        ScalarSource::Statistic => field_values(surface, |v| v.stat),
        ScalarSource::Volume(volume) => {
            if volume.frames() != 1 {
                return Err(Error::InvalidAccess(format!(
                    "a single array needs a volume with one frame, got {}",
                    volume.frames()
                )));
            }
            frame_values(volume, 0)
        }
    };

    Ok(values)
}

fn frame_value(volume: &dyn FrameVolume, vertex: usize, frame: usize) -> Result<f32, Error> {
    volume.value(vertex, frame).ok_or(Error::IndexOutOfRange {
        row: vertex,
        col: frame,
        dims0: volume.vertices(),
        dims1: volume.frames(),
    })
}

fn frame_values(volume: &dyn FrameVolume, frame: usize) -> Values<'_> {
    Box::new(move |vertex| frame_value(volume, vertex, frame))
}

fn emit_shape(
    surface: &Surface,
    source: ScalarSource,
    rows: &[usize],
    options: &EmitOptions,
) -> Result<DataArray, Error> {
    let values = source_values(surface, source)?;
    let mut array = scalar_array(surface, Intent::Shape, ElementKind::Float32, rows, options, values)?;

    let name = options.naming_source(surface);
    if let Some(shape) = infer_shape(name) {
        array.meta.set("ShapeDataType", shape);
    }
    if !name.is_empty() {
        array.meta.set("Name", name);
    }

    Ok(array)
}

fn statistic_meta(array: &mut DataArray, intent: Intent) {
    array.meta.set("Intent_code", intent.name());
    if intent == Intent::Stat(StatIntent::Uniform) {
        array.meta.set("Intent_p1", "0");
        array.meta.set("Intent_p2", "1");
    }
}

fn emit_statistic(
    surface: &Surface,
    intent: Intent,
    source: ScalarSource,
    rows: &[usize],
    options: &EmitOptions,
) -> Result<DataArray, Error> {
    let values = source_values(surface, source)?;
    let mut array = scalar_array(surface, intent, ElementKind::Float32, rows, options, values)?;
    statistic_meta(&mut array, intent);
    Ok(array)
}

fn emit_label(
    gifti: &mut Gifti,
    surface: &Surface,
    rows: &[usize],
    options: &EmitOptions,
) -> Result<(), Error> {
    let table = match &surface.color_table {
        Some(table) if !table.is_empty() => table,
        _ => {
            return Err(Error::MissingColorTable(
                "writing labels needs a surface with a color table".into(),
            ))
        }
    };

    gifti.labels = table.to_label_table();

    let mut array =
        DataArray::allocate(Intent::Label, ElementKind::Int32, IndexOrder::RowMajor, &[rows.len()])?;

    for (row, vertex) in unripped(surface, rows) {
        let annotation = surface.vertices[vertex].annotation;
        let index = table.find_annotation(annotation).ok_or_else(|| {
            Error::LabelConsistency(format!(
                "annotation {annotation} of vertex {vertex} is not in the color table"
            ))
        })?;
        array.set_with(row, 0, index as f64, options.out_of_range)?;
    }

    array.meta.set("Name", "node label");
    // a single structure besides `unknown` names the array
    if table.len() == 2 {
        if let Some(entry) = table.entry(1) {
            array.meta.set("Name", &entry.name);
        }
    }

    gifti.push_array(array)
}

fn emit_overlay(
    gifti: &mut Gifti,
    surface: &Surface,
    overlay: &OverlaySelection,
    rows: &[usize],
    options: &EmitOptions,
) -> Result<(), Error> {
    let volume = overlay.volume;

    if overlay.frames.end > volume.frames() {
        return Err(Error::InvalidAccess(format!(
            "overlay frames {:?} requested from a volume with {} frames",
            overlay.frames,
            volume.frames()
        )));
    }

    if let Some(bad) = rows.iter().find(|v| **v >= volume.vertices()) {
        return Err(Error::InvalidAccess(format!(
            "overlay has {} vertices, vertex {bad} requested",
            volume.vertices()
        )));
    }

    match overlay.intent {
        Intent::RgbVector | Intent::RgbaVector => {
            emit_color_overlay(gifti, surface, overlay, rows, options)?
        }
        intent => {
            for frame in overlay.frames.clone() {
                let values = frame_values(volume, frame);
                let mut array = scalar_array(surface, intent, overlay.kind, rows, options, values)?;

                match intent {
                    Intent::Shape => {
                        if let Some(shape) = infer_shape(options.naming_source(surface)) {
                            array.meta.set("ShapeDataType", shape);
                        }
                    }
                    Intent::TimeSeries => {
                        array
                            .meta
                            .set("TimeStep", utils::format_float(volume.time_step() as f64));
                    }
                    Intent::Stat(_) => statistic_meta(&mut array, intent),
                    _ => (),
                }

                if let Some(name) = &overlay.name {
                    array.meta.set("Name", name);
                }

                gifti.push_array(array)?;
            }
        }
    }

    Ok(())
}

/// RGB(A) overlays. Without `rgb_overlay_from_consecutive_frames` every frame
/// produces one array with that frame's value in each color channel; with it,
/// each group of consecutive frames fills the channels of one array.
fn emit_color_overlay(
    gifti: &mut Gifti,
    surface: &Surface,
    overlay: &OverlaySelection,
    rows: &[usize],
    options: &EmitOptions,
) -> Result<(), Error> {
    let volume = overlay.volume;
    let channels = overlay.intent.expected_columns();
    let step = if options.rgb_overlay_from_consecutive_frames {
        channels
    } else {
        1
    };

    for first in overlay.frames.clone().step_by(step) {
        if first + step > overlay.frames.end {
            return Err(Error::InvalidAccess(format!(
                "{} overlay needs {step} frames starting at {first}, only {:?} selected",
                overlay.intent, overlay.frames
            )));
        }

        let mut array = DataArray::allocate(
            overlay.intent,
            overlay.kind,
            IndexOrder::RowMajor,
            &[rows.len(), channels],
        )?;

        for (row, vertex) in unripped(surface, rows) {
            for channel in 0..channels {
                let frame = if step == 1 { first } else { first + channel };
                let value = frame_value(volume, vertex, frame)?;
                array.set_with(row, channel, value as f64, options.out_of_range)?;
            }
        }

        if let Some(name) = &overlay.name {
            array.meta.set("Name", name);
        }

        gifti.push_array(array)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorEntry, ColorTable};
    use crate::overlay::OverlayVolume;

    fn square() -> Surface {
        Surface::from_geometry(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    fn options() -> EmitOptions {
        EmitOptions {
            user_name: Some("tester".into()),
            date: Some("Thu Jan  1 00:00:00 1970".into()),
            ..EmitOptions::default()
        }
    }

    #[test]
    fn surface_arrays() {
        let mut surface = square();
        surface.name = Some("lh.white".into());
        surface.commands = vec!["mris_make_surfaces".into()];

        let gifti = emit(&surface, Output::Surface, &options()).unwrap();
        assert_eq!(gifti.arrays.len(), 2);
        assert_eq!(gifti.meta.get_str("UserName"), Some("tester"));

        let coords = &gifti.arrays[0];
        assert_eq!(coords.intent, Intent::PointSet);
        assert_eq!(coords.dims, vec![4, 3]);
        assert_eq!(coords.get(2, 1).unwrap(), 1.0);
        assert_eq!(coords.meta.get_str("AnatomicalStructurePrimary"), Some("CortexLeft"));
        assert_eq!(coords.meta.get_str("NUM_TAG_CMDLINE"), Some("1"));
        assert_eq!(coords.meta.get_str("TAG_CMDLINE#0"), Some("mris_make_surfaces"));
        assert!(coords.meta.get_str(GROUP_AVG_AREA_KEY).is_none());
        assert!(coords.meta.get_str("VolGeomWidth").is_none());
        assert_eq!(coords.transforms.len(), 0);

        assert_eq!(coords.meta.get_str("GeometricType"), Some("Anatomical"));
        assert_eq!(coords.meta.get_str("Name"), Some("lh.white"));
        assert!(coords.meta.get_str("TopologicalType").is_none());
        assert!(coords.meta.get_str("SurfaceCenterX").is_none());

        let faces = &gifti.arrays[1];
        assert_eq!(faces.kind, ElementKind::Int32);
        assert_eq!(faces.get(1, 2).unwrap(), 3.0);
        assert_eq!(faces.meta.get_str("TopologicalType"), Some("Closed"));
        assert_eq!(faces.meta.get_str("Name"), Some("lh.white"));
    }

    #[test]
    fn unnamed_surface_has_no_naming_metadata() {
        let mut surface = square();
        surface.patch = true;
        let gifti = emit(&surface, Output::Surface, &options()).unwrap();
        for array in &gifti.arrays {
            assert!(array.meta.get_str("Name").is_none());
            assert!(array.meta.get_str("GeometricType").is_none());
            assert!(array.meta.get_str("TopologicalType").is_none());
        }

        let gifti = emit(&surface, Output::Surface, &options().with_path("lh.cortex.patch.3d.gii")).unwrap();
        let coords = &gifti.arrays[0];
        assert_eq!(coords.meta.get_str("AnatomicalStructurePrimary"), Some("CortexLeft"));
        assert!(coords.meta.get_str("GeometricType").is_none());
        assert_eq!(gifti.arrays[1].meta.get_str("TopologicalType"), Some("Cut"));
    }

    #[test]
    fn surface_center_needs_volume_geometry() {
        let mut surface = square();
        let mut meta = crate::data::MetaData::new();
        for (key, value) in [
            ("VolGeomWidth", "256"),
            ("VolGeomHeight", "256"),
            ("VolGeomDepth", "256"),
            ("VolGeomXsize", "1"),
            ("VolGeomYsize", "1"),
            ("VolGeomZsize", "1"),
            ("VolGeomX_R", "-1"),
            ("VolGeomX_A", "0"),
            ("VolGeomX_S", "0"),
            ("VolGeomY_R", "0"),
            ("VolGeomY_A", "0"),
            ("VolGeomY_S", "-1"),
            ("VolGeomZ_R", "0"),
            ("VolGeomZ_A", "1"),
            ("VolGeomZ_S", "0"),
            ("VolGeomC_R", "0"),
            ("VolGeomC_A", "0"),
            ("VolGeomC_S", "0"),
        ] {
            meta.set(key, value);
        }
        surface.volume_geometry = crate::transform::VolumeGeometry::from_meta(&meta);
        assert!(surface.volume_geometry.valid);

        let gifti = emit(&surface, Output::Surface, &options()).unwrap();
        let coords = &gifti.arrays[0];
        assert_eq!(coords.meta.get_str("VolGeomWidth"), Some("256"));
        assert_eq!(coords.meta.get_str("SurfaceCenterX"), Some("0.5"));
        assert_eq!(coords.meta.get_str("SurfaceCenterY"), Some("0.5"));
        assert_eq!(coords.meta.get_str("SurfaceCenterZ"), Some("0"));
    }

    #[test]
    fn ripped_faces_are_dropped() {
        let mut surface = square();
        surface.vertices[3].ripped = true;
        let gifti = emit(&surface, Output::Surface, &options()).unwrap();
        assert_eq!(gifti.arrays[1].dims, vec![1, 3]);
    }

    #[test]
    fn real_ras_without_geometry_is_identity() {
        let mut surface = square();
        surface.real_ras = true;
        let gifti = emit(&surface, Output::Surface, &options()).unwrap();
        let transform = &gifti.arrays[0].transforms[0];
        assert_eq!(transform.matrix, crate::transform::identity());
    }

    #[test]
    fn uniform_statistic() {
        let mut surface = square();
        for (index, vertex) in surface.vertices.iter_mut().enumerate() {
            vertex.stat = index as f32 / 4.0;
        }

        let output = Output::Statistic {
            intent: Intent::Stat(StatIntent::Uniform),
            source: ScalarSource::Statistic,
        };
        let gifti = emit(&surface, output, &options()).unwrap();
        let array = &gifti.arrays[0];
        assert_eq!(array.meta.get_str("Intent_code"), Some("NIFTI_INTENT_UNIFORM"));
        assert_eq!(array.meta.get_str("Intent_p1"), Some("0"));
        assert_eq!(array.meta.get_str("Intent_p2"), Some("1"));
        assert_eq!(array.get(3, 0).unwrap(), 0.75);
    }

    #[test]
    fn shape_needs_single_frame() {
        let surface = square();
        let mut volume = OverlayVolume::new(4);
        volume.set_value(0, 1, 1.0).unwrap();

        let output = Output::Shape {
            source: ScalarSource::Volume(&volume),
        };
        assert!(matches!(
            emit(&surface, output, &options()),
            Err(Error::InvalidAccess(_))
        ));
    }

    #[test]
    fn shape_naming() {
        let surface = square();
        let volume = OverlayVolume::from_frame(&[1.0, 2.0, 3.0, 4.0]);
        let output = Output::Shape {
            source: ScalarSource::Volume(&volume),
        };
        let gifti = emit(&surface, output, &options().with_path("surf/lh.thickness.gii")).unwrap();
        assert_eq!(gifti.arrays[0].meta.get_str("ShapeDataType"), Some("Thickness"));
        assert_eq!(gifti.arrays[0].get(1, 0).unwrap(), 2.0);
    }

    #[test]
    fn label_without_table() {
        assert!(matches!(
            emit(&square(), Output::Label, &options()),
            Err(Error::MissingColorTable(_))
        ));
    }

    #[test]
    fn two_entry_label_table_names_the_array() {
        let mut surface = square();
        let table = ColorTable::from_entries(vec![
            Some(ColorEntry::new("unknown", 0, 0, 0, 0)),
            Some(ColorEntry::new("cortex", 10, 20, 30, 255)),
        ]);
        surface.vertices[1].annotation = table.entry(1).unwrap().annotation();
        surface.color_table = Some(table);

        let gifti = emit(&surface, Output::Label, &options()).unwrap();
        let array = &gifti.arrays[0];
        assert_eq!(array.name(), Some("cortex"));
        assert_eq!(array.get(0, 0).unwrap(), 0.0);
        assert_eq!(array.get(1, 0).unwrap(), 1.0);
    }

    fn three_labels() -> ColorTable {
        ColorTable::from_entries(vec![
            Some(ColorEntry::new("unknown", 0, 0, 0, 0)),
            Some(ColorEntry::new("precentral", 60, 20, 220, 255)),
            Some(ColorEntry::new("insula", 255, 192, 32, 255)),
        ])
    }

    #[test]
    fn ripped_vertices_skip_label_lookup() {
        let mut surface = square();
        let table = three_labels();
        surface.vertices[0].annotation = table.entry(2).unwrap().annotation();
        surface.vertices[3].annotation = 12345;
        surface.vertices[3].ripped = true;
        surface.color_table = Some(table);

        let gifti = emit(&surface, Output::Label, &options()).unwrap();
        let array = &gifti.arrays[0];
        assert_eq!(array.name(), Some("node label"));
        assert_eq!(array.get(0, 0).unwrap(), 2.0);
        assert_eq!(array.get(3, 0).unwrap(), 0.0);
    }

    #[test]
    fn unknown_annotation_is_an_error() {
        let mut surface = square();
        surface.vertices[1].annotation = 12345;
        surface.color_table = Some(three_labels());
        assert!(matches!(
            emit(&surface, Output::Label, &options()),
            Err(Error::LabelConsistency(_))
        ));
    }

    #[test]
    fn ripped_vertices_write_zero() {
        let mut surface = square();
        for vertex in surface.vertices.iter_mut() {
            vertex.curv = -1.5;
        }
        surface.vertices[2].ripped = true;

        let output = Output::Shape {
            source: ScalarSource::Curvature,
        };
        let gifti = emit(&surface, output, &options()).unwrap();
        let array = &gifti.arrays[0];
        assert_eq!(array.get(1, 0).unwrap(), -1.5);
        assert_eq!(array.get(2, 0).unwrap(), 0.0);

        let output = Output::Statistic {
            intent: Intent::Stat(StatIntent::ZScore),
            source: ScalarSource::Curvature,
        };
        let gifti = emit(&surface, output, &options()).unwrap();
        assert_eq!(gifti.arrays[0].get(2, 0).unwrap(), 0.0);
        assert_eq!(gifti.arrays[0].get(3, 0).unwrap(), -1.5);
    }

    #[test]
    fn sparse_statistic() {
        let mut surface = square();
        surface.vertices[2].val = 5.0;
        let output = Output::Statistic {
            intent: Intent::Stat(StatIntent::TTest),
            source: ScalarSource::Value,
        };
        let gifti = emit(&surface, output, &options().with_node_index(vec![2, 0])).unwrap();

        assert_eq!(gifti.arrays.len(), 2);
        assert_eq!(gifti.arrays[0].intent, Intent::NodeIndex);
        assert_eq!(gifti.arrays[0].get(0, 0).unwrap(), 2.0);
        assert_eq!(gifti.arrays[1].dims, vec![2]);
        assert_eq!(gifti.arrays[1].get(0, 0).unwrap(), 5.0);
    }

    #[test]
    fn combined_time_series() {
        let surface = square();
        let mut volume = OverlayVolume::new(4).with_time_step(2.5);
        for frame in 0..3 {
            for vertex in 0..4 {
                volume.set_value(vertex, frame, (frame * 10 + vertex) as f32).unwrap();
            }
        }

        let output = Output::Combined {
            overlays: vec![OverlaySelection::new(Intent::TimeSeries, &volume).with_frames(1..3)],
        };
        let gifti = emit(&surface, output, &options()).unwrap();

        assert_eq!(gifti.arrays.len(), 4);
        assert_eq!(gifti.arrays[2].meta.get_str("TimeStep"), Some("2.5"));
        assert_eq!(gifti.arrays[3].get(1, 0).unwrap(), 21.0);
    }

    #[test]
    fn rgb_overlay_channels() {
        let surface = square();
        let mut volume = OverlayVolume::new(4);
        for frame in 0..3 {
            for vertex in 0..4 {
                volume.set_value(vertex, frame, frame as f32 + 1.0).unwrap();
            }
        }
        let overlays = vec![OverlaySelection::new(Intent::RgbVector, &volume)];

        let legacy = emit(
            &surface,
            Output::Combined {
                overlays: overlays.clone(),
            },
            &options(),
        )
        .unwrap();
        // one array per frame, channels all taken from that frame
        assert_eq!(legacy.arrays.len(), 5);
        let first = &legacy.arrays[2];
        assert_eq!(
            (first.get(0, 0).unwrap(), first.get(0, 1).unwrap(), first.get(0, 2).unwrap()),
            (1.0, 1.0, 1.0)
        );

        let fixed = EmitOptions {
            rgb_overlay_from_consecutive_frames: true,
            ..options()
        };
        let gifti = emit(&surface, Output::Combined { overlays }, &fixed).unwrap();
        assert_eq!(gifti.arrays.len(), 3);
        let rgb = &gifti.arrays[2];
        assert_eq!(
            (rgb.get(3, 0).unwrap(), rgb.get(3, 1).unwrap(), rgb.get(3, 2).unwrap()),
            (1.0, 2.0, 3.0)
        );
    }
}
