//! # Reading surfaces out of a container
//!
//! [`ingest`] folds the arrays of a [`Gifti`] container into a [`Surface`]:
//!
//! 1. the container is checked and its label table turned into a [`ColorTable`]
//! 2. arrays are classified (see [`classify`](`crate::classify::classify`))
//! 3. the surface is allocated from the coordinate and face arrays, with
//!    topology, coordinate space and provenance recovered from their metadata
//! 4. every other array is dispatched by intent onto the vertices, honouring a
//!    sparse node index when the container has one
//! 5. the color table is attached after a last consistency check
//!
//! Only the first SHAPE array and the first statistic (or other scalar) array
//! are used; the rest are skipped with a warning.

use crate::array::DataArray;
use crate::classify::{classify, Classified, Role};
use crate::color::{pack_annotation, ColorTable};
use crate::data::{Gifti, MetaData};
use crate::label::LabelTable;
use crate::mesh::{Hemisphere, Surface};
use crate::sparse::SparseIndex;
use crate::traits::FrameVolume;
use crate::transform::{ingest_transforms, VolumeGeometry};
use crate::Error;

/// default number of command lines kept from a file
pub const DEFAULT_MAX_COMMANDS: usize = 1000;

pub(crate) const NUM_CMDLINE_KEY: &str = "NUM_TAG_CMDLINE";
pub(crate) const GROUP_AVG_AREA_KEY: &str = "TAG_GROUP_AVG_SURFACE_AREA";

pub(crate) fn cmdline_key(index: usize) -> String {
    format!("TAG_CMDLINE#{index}")
}

/// Behaviour of [`ingest`]
pub struct ReadOptions<'a> {
    /// Only the most recent `max_commands` command lines are kept
    pub max_commands: usize,
    /// receives every captured SHAPE / scalar array as a frame
    pub overlay: Option<&'a mut dyn FrameVolume>,
    /// Container index of the only per-vertex array to read. Geometry and the
    /// node index are read regardless.
    pub array: Option<usize>,
}

impl Default for ReadOptions<'_> {
    fn default() -> Self {
        Self {
            max_commands: DEFAULT_MAX_COMMANDS,
            overlay: None,
            array: None,
        }
    }
}

impl<'a> ReadOptions<'a> {
    pub fn with_overlay(mut self, overlay: &'a mut dyn FrameVolume) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_max_commands(mut self, max_commands: usize) -> Self {
        self.max_commands = max_commands;
        self
    }

    pub fn with_array(mut self, index: usize) -> Self {
        self.array = Some(index);
        self
    }
}

/// Whether an array of a single-winner role has been used yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Capture {
    #[default]
    Unseen,
    Captured,
}

/// per-vertex field a scalar array is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarTarget {
    Curvature,
    ValueAndStat,
}

/// Fold the arrays of `gifti` into a surface.
///
/// Geometry in the container builds a new surface. Without geometry the
/// arrays are applied to `surface`, which must then be given. When both are
/// present the given surface is kept and the container's coordinates must
/// match its vertex count.
pub fn ingest(
    gifti: &Gifti,
    surface: Option<Surface>,
    options: &mut ReadOptions,
) -> Result<Surface, Error> {
    gifti.check()?;

    let color_table = if gifti.labels.is_empty() {
        None
    } else {
        Some(ColorTable::from_label_table(&gifti.labels)?)
    };

    let known_vertices = surface.as_ref().map(Surface::num_vertices);
    let classified = classify(&gifti.arrays, known_vertices)?;

    let mut surface = match (surface, &classified) {
        (
            Some(surface),
            Classified {
                coords: Some(coords),
                ..
            },
        ) => {
            if coords.rows() != surface.num_vertices() {
                return Err(Error::MalformedDataArray(format!(
                    "coordinates hold {} vertices, the surface has {}",
                    coords.rows(),
                    surface.num_vertices()
                )));
            }
            log::debug!("container geometry ignored, applying arrays to the given surface");
            surface
        }
        (Some(surface), _) => surface,
        (
            None,
            Classified {
                coords: Some(coords),
                faces: Some(faces),
                ..
            },
        ) => read_geometry(gifti, coords, faces, options.max_commands)?,
        (None, _) => {
            return Err(Error::InvalidContainer(
                "container holds no POINTSET and TRIANGLE arrays".into(),
            ))
        }
    };

    let sparse = SparseIndex::new(classified.node_index)?;

    let selected = match options.array {
        Some(index) => Some(gifti.arrays.get(index).ok_or_else(|| {
            Error::InvalidAccess(format!(
                "data array {index} requested, the container has {}",
                gifti.arrays.len()
            ))
        })?),
        None => None,
    };

    let mut shape = Capture::Unseen;
    let mut scalar = Capture::Unseen;
    let mut frame = 0;

    for (array, role) in &classified.rest {
        if selected.map_or(false, |selected| !std::ptr::eq(selected, *array)) {
            continue;
        }

        match role {
            Role::Shape => {
                (shape, frame) = capture_scalar(
                    &mut surface,
                    array,
                    sparse,
                    shape,
                    ScalarTarget::Curvature,
                    frame,
                    options,
                )?;
            }
            Role::Scalar => {
                (scalar, frame) = capture_scalar(
                    &mut surface,
                    array,
                    sparse,
                    scalar,
                    ScalarTarget::ValueAndStat,
                    frame,
                    options,
                )?;
            }
            Role::Label => {
                let table = color_table.as_ref().ok_or_else(|| {
                    Error::MissingColorTable(
                        "a NIFTI_INTENT_LABEL array needs a label table".into(),
                    )
                })?;
                read_labels(&mut surface, array, sparse, gifti, table)?;
            }
            Role::Vector => read_vectors(&mut surface, array, sparse)?,
            Role::Color { .. } => read_colors(&mut surface, array, sparse)?,
            Role::Unsupported => {
                log::warn!("{} arrays are not supported, skipping", array.intent);
            }
        }
    }

    if let Some(table) = color_table {
        check_label_count(&table, &gifti.labels)?;
        surface.color_table = Some(table);
    }

    Ok(surface)
}

/// every label must have produced exactly one color table entry
fn check_label_count(table: &ColorTable, labels: &LabelTable) -> Result<(), Error> {
    if table.valid_entries() != labels.len() {
        return Err(Error::LabelConsistency(format!(
            "color table has {} entries, label table has {}",
            table.valid_entries(),
            labels.len()
        )));
    }
    Ok(())
}

/// allocate and fill a new surface from its coordinate and face arrays
fn read_geometry(
    gifti: &Gifti,
    coords: &DataArray,
    faces: &DataArray,
    max_commands: usize,
) -> Result<Surface, Error> {
    let num_vertices = coords.rows();
    let mut surface = Surface::allocate(num_vertices, faces.rows())?;

    for (index, vertex) in surface.vertices.iter_mut().enumerate() {
        vertex.x = coords.get(index, 0)? as f32;
        vertex.y = coords.get(index, 1)? as f32;
        vertex.z = coords.get(index, 2)? as f32;
    }

    for (index, face) in surface.faces.iter_mut().enumerate() {
        for corner in 0..3 {
            let value = faces.get(index, corner)?;
            if value < 0.0 || value.fract() != 0.0 || value >= num_vertices as f64 {
                return Err(Error::MalformedDataArray(format!(
                    "face {index} references vertex {value}, the surface has {num_vertices} vertices"
                )));
            }
            face.vertices[corner] = value as usize;
        }
    }

    surface.build_topology()?;

    let space = ingest_transforms(&coords.transforms);
    surface.real_ras = space.real_ras;
    surface.talairach = space.talairach;
    surface.volume_geometry = VolumeGeometry::from_meta(&coords.meta);

    surface.group_avg_area = lookup(&coords.meta, &gifti.meta, GROUP_AVG_AREA_KEY)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0.0);
    surface.commands = read_commands(&coords.meta, &gifti.meta, max_commands);
    surface.subject = gifti.meta.get_str("SubjectID").map(str::to_string);

    let topology = lookup(&coords.meta, &faces.meta, "TopologicalType");
    surface.patch = topology == Some("Cut");
    surface.hemisphere = coords
        .meta
        .get_str("AnatomicalStructurePrimary")
        .map(Hemisphere::from_structure)
        .unwrap_or_default();

    surface.compute_dimensions();
    surface.compute_normals();

    log::debug!(
        "read surface with {} vertices, {} faces",
        surface.num_vertices(),
        surface.num_faces()
    );

    Ok(surface)
}

/// look a key up in the array metadata first, the container metadata second
fn lookup<'m>(first: &'m MetaData, second: &'m MetaData, key: &str) -> Option<&'m str> {
    first.get_str(key).or_else(|| second.get_str(key))
}

/// Read the `TAG_CMDLINE#<n>` entries, keeping the last `max_commands`.
/// A missing entry ends the history early.
fn read_commands(array_meta: &MetaData, file_meta: &MetaData, max_commands: usize) -> Vec<String> {
    let count: usize = match lookup(array_meta, file_meta, NUM_CMDLINE_KEY)
        .and_then(|value| value.trim().parse().ok())
    {
        Some(count) => count,
        None => return Vec::new(),
    };

    let skip = count.saturating_sub(max_commands);
    if skip > 0 {
        log::warn!("{count} command lines stored, only the last {max_commands} are kept");
    }

    let mut commands = Vec::new();
    for index in skip..count {
        match lookup(array_meta, file_meta, &cmdline_key(index)) {
            Some(command) => commands.push(command.to_string()),
            None => {
                log::warn!(
                    "command line {index} of {count} is missing, command history truncated"
                );
                break;
            }
        }
    }

    commands
}

/// Vertices covered by an array: `(row, vertex)` pairs, skipping ripped
/// vertices and stopping at the end of a sparse index.
fn covered_vertices(
    surface: &Surface,
    array: &DataArray,
    sparse: SparseIndex,
) -> Result<Vec<(usize, usize)>, Error> {
    let num_vertices = surface.num_vertices();
    let mut covered = Vec::new();
    covered.try_reserve_exact(array.rows())?;

    for row in 0..array.rows() {
        let vertex = match sparse.resolve(row)? {
            Some(vertex) => vertex,
            None => break,
        };

        let ripped = surface
            .vertices
            .get(vertex)
            .map(|v| v.ripped)
            .ok_or_else(|| {
                Error::MalformedSparseIndex(format!(
                    "row {row} refers to vertex {vertex}, the surface has {num_vertices} vertices"
                ))
            })?;

        if !ripped {
            covered.push((row, vertex));
        }
    }

    Ok(covered)
}

/// Write the first array of a single-winner role into `target`. Returns the
/// new capture state and the next overlay frame.
fn capture_scalar(
    surface: &mut Surface,
    array: &DataArray,
    sparse: SparseIndex,
    state: Capture,
    target: ScalarTarget,
    frame: usize,
    options: &mut ReadOptions,
) -> Result<(Capture, usize), Error> {
    if state == Capture::Captured {
        log::warn!(
            "skipping {} array `{}`, an earlier one was already read",
            array.intent,
            array.name().unwrap_or("")
        );
        return Ok((state, frame));
    }

    let mut overlay = options.overlay.as_deref_mut();

    for (row, vertex) in covered_vertices(surface, array, sparse)? {
        let value = array.get(row, 0)? as f32;
        let v = &mut surface.vertices[vertex];

        match target {
            ScalarTarget::Curvature => v.curv = value,
            ScalarTarget::ValueAndStat => {
                v.val = value;
                v.stat = value;
            }
        }

        if let Some(volume) = overlay.as_deref_mut() {
            volume.set_value(vertex, frame, value)?;
        }
    }

    let frame = if options.overlay.is_some() {
        frame + 1
    } else {
        frame
    };

    Ok((Capture::Captured, frame))
}

fn read_labels(
    surface: &mut Surface,
    array: &DataArray,
    sparse: SparseIndex,
    gifti: &Gifti,
    table: &ColorTable,
) -> Result<(), Error> {
    if gifti.labels.is_empty() || table.is_empty() {
        return Err(Error::MissingColorTable(
            "label table of the container is empty".into(),
        ));
    }

    for (row, vertex) in covered_vertices(surface, array, sparse)? {
        let key = array.get(row, 0)? as i32;

        // keys missing from the label table fall back to annotation 0
        let (annotation, name) = match gifti.labels.position_of_key(key) {
            Some(position) => {
                let entry = table.entry(position).ok_or_else(|| {
                    Error::LabelConsistency(format!("label {key} has no color table entry"))
                })?;
                (entry.annotation(), entry.name.as_str())
            }
            None => (0, ""),
        };

        if table.find_annotation(annotation).is_none() {
            return Err(Error::LabelConsistency(format!(
                "annotation {annotation} of label key {key} `{name}` at vertex {vertex} is not in the color table"
            )));
        }

        surface.vertices[vertex].annotation = annotation;
    }

    Ok(())
}

fn read_vectors(surface: &mut Surface, array: &DataArray, sparse: SparseIndex) -> Result<(), Error> {
    for (row, vertex) in covered_vertices(surface, array, sparse)? {
        let v = &mut surface.vertices[vertex];
        v.dx = array.get(row, 0)? as f32;
        v.dy = array.get(row, 1)? as f32;
        v.dz = array.get(row, 2)? as f32;
    }
    Ok(())
}

/// Color components above 1 are bytes already and get truncated, the rest are
/// fractions scaled by 256
fn component_to_byte(component: f64) -> u8 {
    let scaled = if component > 1.0 {
        component.trunc()
    } else {
        (component * 256.0).floor()
    };
    scaled.clamp(0.0, 255.0) as u8
}

fn read_colors(surface: &mut Surface, array: &DataArray, sparse: SparseIndex) -> Result<(), Error> {
    for (row, vertex) in covered_vertices(surface, array, sparse)? {
        // alpha, when present, is ignored
        let r = component_to_byte(array.get(row, 0)?);
        let g = component_to_byte(array.get(row, 1)?);
        let b = component_to_byte(array.get(row, 2)?);
        surface.vertices[vertex].annotation = pack_annotation(r, g, b);
    }
    Ok(())
}
