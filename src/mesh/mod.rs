//! # Surface model
//!
//! A [`Surface`] is a triangulated mesh with per-vertex attributes in the shape
//! FreeSurfer keeps them: every vertex carries its position, a handful of scalar
//! fields (curvature, value, statistic), a packed color annotation, a
//! displacement vector and a "ripped" flag excluding it from processing.
//!
//! Besides geometry a surface records where its coordinates live (see
//! [`transform`](`crate::transform`)), the command lines that produced it and,
//! optionally, the color table its annotations refer to.
//!
//! Surfaces are created with [`Surface::allocate`] once the vertex and face
//! counts are known and then filled in place. [`Surface::build_topology`]
//! derives the per-vertex face incidence from the faces.

mod topology;

use crate::color::ColorTable;
use crate::transform::{Affine, VolumeGeometry};
use crate::Error;

/// A single vertex of a surface and everything attached to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// curvature, or any other SHAPE overlay
    pub curv: f32,
    pub val: f32,
    pub stat: f32,
    /// packed `r + g << 8 + b << 16` color of the vertex label
    pub annotation: i32,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    /// unit normal, see [`Surface::compute_normals`]
    pub nx: f32,
    pub ny: f32,
    pub nz: f32,
    /// excluded from processing and from written output
    pub ripped: bool,
    /// faces this vertex is a corner of
    pub faces: Vec<usize>,
    /// for every entry of `faces`, which corner (0, 1 or 2) of that face this
    /// vertex is
    pub slots: Vec<u8>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// number of faces incident to this vertex
    pub fn degree(&self) -> usize {
        self.faces.len()
    }

    pub fn normal(&self) -> [f32; 3] {
        [self.nx, self.ny, self.nz]
    }
}

/// A triangle referencing three vertices by index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Face {
    pub vertices: [usize; 3],
}

impl Face {
    pub fn new(v0: usize, v1: usize, v2: usize) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }
}

/// Axis aligned bounding box of the unripped vertices
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub center: [f32; 3],
}

/// Which cortical hemisphere a surface belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Hemisphere {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Hemisphere {
    /// from an `AnatomicalStructurePrimary` value
    pub fn from_structure(structure: &str) -> Self {
        match structure.trim() {
            "CortexLeft" => Self::Left,
            "CortexRight" => Self::Right,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    /// file name the surface was read from or is known by, e.g. `lh.white`.
    /// Naming conventions applied on write are matched against it.
    pub name: Option<String>,
    pub subject: Option<String>,
    /// coordinates are in scanner RAS rather than tkregister RAS
    pub real_ras: bool,
    pub volume_geometry: VolumeGeometry,
    /// stored Talairach transform captured when the surface was read
    pub talairach: Option<Affine>,
    pub group_avg_area: f32,
    /// command lines that produced this surface, oldest first
    pub commands: Vec<String>,
    pub color_table: Option<ColorTable>,
    /// the surface is a cut patch rather than a closed surface
    pub patch: bool,
    pub hemisphere: Hemisphere,
    pub dimensions: Dimensions,
}

impl Surface {
    /// Allocate a surface with `vertices` zeroed vertices and `faces` faces all
    /// referencing vertex 0.
    pub fn allocate(vertices: usize, faces: usize) -> Result<Self, Error> {
        let mut surface = Self::default();

        surface.vertices.try_reserve_exact(vertices)?;
        surface.vertices.resize_with(vertices, Vertex::default);

        surface.faces.try_reserve_exact(faces)?;
        surface.faces.resize(faces, Face::default());

        log::debug!("allocated surface with {vertices} vertices and {faces} faces");

        Ok(surface)
    }

    /// Build a complete surface from positions and triangles: allocates it,
    /// checks the face indices, derives the topology and computes the
    /// dimensions.
    pub fn from_geometry(positions: &[[f32; 3]], triangles: &[[usize; 3]]) -> Result<Self, Error> {
        let mut surface = Self::allocate(positions.len(), triangles.len())?;

        for (vertex, [x, y, z]) in surface.vertices.iter_mut().zip(positions) {
            vertex.x = *x;
            vertex.y = *y;
            vertex.z = *z;
        }

        for (face, triangle) in surface.faces.iter_mut().zip(triangles) {
            face.vertices = *triangle;
        }

        surface.build_topology()?;
        surface.compute_dimensions();
        surface.compute_normals();

        Ok(surface)
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// true if any corner of `face` is ripped
    pub fn face_is_ripped(&self, face: &Face) -> bool {
        face.vertices
            .iter()
            .any(|v| self.vertices.get(*v).map(|vertex| vertex.ripped).unwrap_or(true))
    }

    /// Recompute the bounding box and center from the unripped vertices
    pub fn compute_dimensions(&mut self) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        let mut any = false;

        for vertex in self.vertices.iter().filter(|v| !v.ripped) {
            any = true;
            for (axis, value) in vertex.position().into_iter().enumerate() {
                min[axis] = min[axis].min(value);
                max[axis] = max[axis].max(value);
            }
        }

        if !any {
            self.dimensions = Dimensions::default();
            return;
        }

        let mut center = [0f32; 3];
        for axis in 0..3 {
            center[axis] = (min[axis] + max[axis]) / 2.0;
        }

        self.dimensions = Dimensions { min, max, center };
    }

    /// Area weighted vertex normals from the unripped faces. Vertices without
    /// such a face get a zero normal.
    pub fn compute_normals(&mut self) {
        let mut sums = vec![[0f32; 3]; self.vertices.len()];

        for face in self.faces.iter().filter(|f| !self.face_is_ripped(f)) {
            let [a, b, c] = face.vertices.map(|v| self.vertices[v].position());
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let w = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            // length is twice the face area
            let cross = [
                u[1] * w[2] - u[2] * w[1],
                u[2] * w[0] - u[0] * w[2],
                u[0] * w[1] - u[1] * w[0],
            ];

            for v in face.vertices {
                for axis in 0..3 {
                    sums[v][axis] += cross[axis];
                }
            }
        }

        for (vertex, [x, y, z]) in self.vertices.iter_mut().zip(sums) {
            let len = (x * x + y * y + z * z).sqrt();
            if len > f32::EPSILON {
                vertex.nx = x / len;
                vertex.ny = y / len;
                vertex.nz = z / len;
            } else {
                vertex.nx = 0.0;
                vertex.ny = 0.0;
                vertex.nz = 0.0;
            }
        }
    }
}
