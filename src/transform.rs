//! # Coordinate transforms
//!
//! A surface's vertex coordinates either live in "scanner" RAS space or in the
//! FreeSurfer "tkregister" space of the volume the surface was generated from.
//! The `<CoordinateSystemTransformMatrix>` elements attached to the coordinate
//! array record which one it is, and [`VolumeGeometry`] (stored as `VolGeom*`
//! metadata) is what allows moving between the two.
//!
//! [`ingest_transforms`] recovers that information on read and
//! [`emit_transform`] derives the transform to attach on write.

use crate::data::MetaData;
use crate::mesh::Surface;
use crate::traits::TransformSource;
use crate::Error;

use ndarray::{arr2, Array2};
use std::path::{Path, PathBuf};

/// 4x4 affine matrix, row major
pub type Affine = Array2<f64>;

/// The `NIFTI_XFORM_*` codes naming the space on either side of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XformSpace {
    Unknown,
    ScannerAnat,
    AlignedAnat,
    Talairach,
    Mni152,
}

impl XformSpace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "NIFTI_XFORM_UNKNOWN" => Some(Self::Unknown),
            "NIFTI_XFORM_SCANNER_ANAT" => Some(Self::ScannerAnat),
            "NIFTI_XFORM_ALIGNED_ANAT" => Some(Self::AlignedAnat),
            "NIFTI_XFORM_TALAIRACH" => Some(Self::Talairach),
            "NIFTI_XFORM_MNI_152" => Some(Self::Mni152),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "NIFTI_XFORM_UNKNOWN",
            Self::ScannerAnat => "NIFTI_XFORM_SCANNER_ANAT",
            Self::AlignedAnat => "NIFTI_XFORM_ALIGNED_ANAT",
            Self::Talairach => "NIFTI_XFORM_TALAIRACH",
            Self::Mni152 => "NIFTI_XFORM_MNI_152",
        }
    }
}

/// A `<CoordinateSystemTransformMatrix>` element
#[derive(Debug, Clone, PartialEq)]
pub struct CoordTransform {
    pub data_space: XformSpace,
    pub transformed_space: XformSpace,
    pub matrix: Affine,
}

impl CoordTransform {
    pub fn new(data_space: XformSpace, transformed_space: XformSpace, matrix: Affine) -> Self {
        Self {
            data_space,
            transformed_space,
            matrix,
        }
    }
}

pub fn identity() -> Affine {
    Array2::eye(4)
}

/// Invert a 4x4 matrix with Gauss-Jordan elimination, `None` when singular
pub fn invert(matrix: &Affine) -> Option<Affine> {
    if matrix.dim() != (4, 4) {
        return None;
    }

    let mut a = matrix.clone();
    let mut inverse = identity();

    for col in 0..4 {
        // partial pivoting
        let pivot = (col..4).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }

        if pivot != col {
            for k in 0..4 {
                a.swap([pivot, k], [col, k]);
                inverse.swap([pivot, k], [col, k]);
            }
        }

        let scale = a[[col, col]];
        for k in 0..4 {
            a[[col, k]] /= scale;
            inverse[[col, k]] /= scale;
        }

        for row in 0..4 {
            if row == col {
                continue;
            }
            let factor = a[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for k in 0..4 {
                a[[row, k]] -= factor * a[[col, k]];
                inverse[[row, k]] -= factor * inverse[[col, k]];
            }
        }
    }

    Some(inverse)
}

/// Geometry of the volume a surface was generated from.
///
/// Only meaningful when `valid` is set, which on read requires all 18 `VolGeom*`
/// metadata values to be present and numeric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeGeometry {
    pub valid: bool,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub xsize: f64,
    pub ysize: f64,
    pub zsize: f64,
    pub x_r: f64,
    pub x_a: f64,
    pub x_s: f64,
    pub y_r: f64,
    pub y_a: f64,
    pub y_s: f64,
    pub z_r: f64,
    pub z_a: f64,
    pub z_s: f64,
    pub c_r: f64,
    pub c_a: f64,
    pub c_s: f64,
}

const VOLGEOM_KEYS: [&str; 18] = [
    "VolGeomWidth",
    "VolGeomHeight",
    "VolGeomDepth",
    "VolGeomXsize",
    "VolGeomYsize",
    "VolGeomZsize",
    "VolGeomX_R",
    "VolGeomX_A",
    "VolGeomX_S",
    "VolGeomY_R",
    "VolGeomY_A",
    "VolGeomY_S",
    "VolGeomZ_R",
    "VolGeomZ_A",
    "VolGeomZ_S",
    "VolGeomC_R",
    "VolGeomC_A",
    "VolGeomC_S",
];

impl VolumeGeometry {
    fn values(&self) -> [f64; 18] {
        [
            self.width as f64,
            self.height as f64,
            self.depth as f64,
            self.xsize,
            self.ysize,
            self.zsize,
            self.x_r,
            self.x_a,
            self.x_s,
            self.y_r,
            self.y_a,
            self.y_s,
            self.z_r,
            self.z_a,
            self.z_s,
            self.c_r,
            self.c_a,
            self.c_s,
        ]
    }

    /// Read the 18 `VolGeom*` entries. If any of them is missing or not a
    /// number the returned geometry is marked invalid.
    pub fn from_meta(meta: &MetaData) -> Self {
        let mut values = [0f64; 18];
        for (value, key) in values.iter_mut().zip(VOLGEOM_KEYS) {
            match meta.get_parsed::<f64>(key) {
                Some(parsed) => *value = parsed,
                None => {
                    log::debug!("volume geometry key {key} missing, geometry marked invalid");
                    return Self::default();
                }
            }
        }

        let [width, height, depth, xsize, ysize, zsize, x_r, x_a, x_s, y_r, y_a, y_s, z_r, z_a, z_s, c_r, c_a, c_s] =
            values;

        Self {
            valid: true,
            width: width as i32,
            height: height as i32,
            depth: depth as i32,
            xsize,
            ysize,
            zsize,
            x_r,
            x_a,
            x_s,
            y_r,
            y_a,
            y_s,
            z_r,
            z_a,
            z_s,
            c_r,
            c_a,
            c_s,
        }
    }

    /// Write the 18 `VolGeom*` entries
    pub fn write_meta(&self, meta: &mut MetaData) {
        for (key, value) in VOLGEOM_KEYS.iter().zip(self.values()) {
            if key.ends_with("Width") || key.ends_with("Height") || key.ends_with("Depth") {
                meta.set(*key, value as i32);
            } else {
                let mut buffer = ryu::Buffer::new();
                meta.set(*key, buffer.format(value));
            }
        }
    }

    /// voxel (column, row, slice) to scanner RAS
    pub fn vox2ras(&self) -> Affine {
        let mdc = [
            [self.x_r, self.y_r, self.z_r],
            [self.x_a, self.y_a, self.z_a],
            [self.x_s, self.y_s, self.z_s],
        ];
        let sizes = [self.xsize, self.ysize, self.zsize];
        let center_voxel = [
            self.width as f64 / 2.0,
            self.height as f64 / 2.0,
            self.depth as f64 / 2.0,
        ];
        let center = [self.c_r, self.c_a, self.c_s];

        let mut m = identity();
        for row in 0..3 {
            let mut p0 = center[row];
            for col in 0..3 {
                m[[row, col]] = mdc[row][col] * sizes[col];
                p0 -= m[[row, col]] * center_voxel[col];
            }
            m[[row, 3]] = p0;
        }
        m
    }

    /// voxel to "tkregister" RAS, the native space of FreeSurfer surfaces
    pub fn tkr_vox2ras(&self) -> Affine {
        let (w, h, d) = (self.width as f64, self.height as f64, self.depth as f64);
        arr2(&[
            [-self.xsize, 0.0, 0.0, self.xsize * w / 2.0],
            [0.0, 0.0, self.zsize, -self.zsize * d / 2.0],
            [0.0, -self.ysize, 0.0, self.ysize * h / 2.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

/// What the transforms attached to a coordinate array say about the surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestedSpace {
    /// coordinates are scanner RAS rather than tkregister RAS
    pub real_ras: bool,
    /// a stored (UNKNOWN -> TALAIRACH) matrix
    pub talairach: Option<Affine>,
}

/// Scan the transforms of the coordinate array.
///
/// A transform whose data space is `SCANNER_ANAT` marks the coordinates as real
/// scanner space. An `UNKNOWN -> TALAIRACH` transform is captured verbatim.
/// Every other combination is ignored.
pub fn ingest_transforms(transforms: &[CoordTransform]) -> IngestedSpace {
    let mut space = IngestedSpace::default();

    for transform in transforms {
        match (transform.data_space, transform.transformed_space) {
            (XformSpace::ScannerAnat, _) => space.real_ras = true,
            (XformSpace::Unknown, XformSpace::Talairach) => {
                space.talairach = Some(transform.matrix.clone())
            }
            (data, transformed) => {
                log::debug!(
                    "ignoring coordinate transform {} -> {}",
                    data.name(),
                    transformed.name()
                )
            }
        }
    }

    space
}

/// Derive the transform to attach to the coordinate array of `surface`.
///
/// `path_hint` is the output path, which `source` may use to locate a stored
/// Talairach transform when nothing better is known.
pub fn emit_transform(
    surface: &Surface,
    path_hint: Option<&Path>,
    source: &dyn TransformSource,
) -> Result<Option<CoordTransform>, Error> {
    let vg = &surface.volume_geometry;

    if surface.real_ras {
        if vg.valid {
            let s_inv = invert(&vg.vox2ras()).ok_or_else(|| singular("vox2ras"))?;
            let matrix = vg.tkr_vox2ras().dot(&s_inv);
            return Ok(Some(CoordTransform::new(
                XformSpace::ScannerAnat,
                XformSpace::Unknown,
                matrix,
            )));
        }

        return Ok(Some(CoordTransform::new(
            XformSpace::ScannerAnat,
            XformSpace::ScannerAnat,
            identity(),
        )));
    }

    if vg.valid {
        let t_inv = invert(&vg.tkr_vox2ras()).ok_or_else(|| singular("tkr vox2ras"))?;
        let matrix = vg.vox2ras().dot(&t_inv);
        return Ok(Some(CoordTransform::new(
            XformSpace::Unknown,
            XformSpace::ScannerAnat,
            matrix,
        )));
    }

    match source.stored_transform(surface, path_hint) {
        Some(matrix) if matrix.dim() == (4, 4) => Ok(Some(CoordTransform::new(
            XformSpace::Unknown,
            XformSpace::Talairach,
            matrix,
        ))),
        Some(matrix) => {
            log::warn!(
                "stored talairach transform has shape {:?}, expected 4x4; not attached",
                matrix.dim()
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

fn singular(what: &str) -> Error {
    Error::InvalidAccess(format!("volume geometry {what} matrix is singular"))
}

/// Looks for a stored Talairach transform.
///
/// The matrix captured on the surface when it was read takes precedence.
/// Otherwise the MNI `.xfm` file at `<subject>/mri/transforms/talairach.xfm` is
/// read, where `<subject>` is two levels above the output path
/// (`<subject>/surf/lh.white.gii`).
#[derive(Debug, Clone, Default)]
pub struct XfmTransformSource;

impl XfmTransformSource {
    /// the talairach.xfm location for an output path
    pub fn xfm_path(path_hint: &Path) -> Option<PathBuf> {
        let subject = path_hint.parent()?.parent()?;
        Some(subject.join("mri").join("transforms").join("talairach.xfm"))
    }
}

impl TransformSource for XfmTransformSource {
    fn stored_transform(&self, surface: &Surface, path_hint: Option<&Path>) -> Option<Affine> {
        if let Some(matrix) = &surface.talairach {
            return Some(matrix.clone());
        }

        let path = Self::xfm_path(path_hint?)?;
        let contents = std::fs::read_to_string(&path).ok()?;
        let matrix = parse_xfm(&contents);

        if matrix.is_none() {
            log::warn!("{} does not hold a linear transform", path.display());
        }

        matrix
    }
}

/// Parse the `Linear_Transform` of an MNI `.xfm` file: three rows of four
/// numbers terminated by `;`.
pub fn parse_xfm(contents: &str) -> Option<Affine> {
    let start = contents.find("Linear_Transform")?;
    let rest = &contents[start..];
    let rest = &rest[rest.find('=')? + 1..];
    let body = &rest[..rest.find(';')?];

    let values = body
        .split_ascii_whitespace()
        .map(|token| token.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    if values.len() != 12 {
        return None;
    }

    let mut matrix = identity();
    for (index, value) in values.into_iter().enumerate() {
        matrix[[index / 4, index % 4]] = value;
    }

    Some(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> VolumeGeometry {
        VolumeGeometry {
            valid: true,
            width: 256,
            height: 256,
            depth: 256,
            xsize: 1.0,
            ysize: 1.0,
            zsize: 1.0,
            x_r: -1.0,
            x_a: 0.0,
            x_s: 0.0,
            y_r: 0.0,
            y_a: 0.0,
            y_s: -1.0,
            z_r: 0.0,
            z_a: 1.0,
            z_s: 0.0,
            c_r: 5.0,
            c_a: -3.0,
            c_s: 12.0,
        }
    }

    fn assert_close(a: &Affine, b: &Affine) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{a} != {b}");
        }
    }

    #[test]
    fn inverse_of_tkr() {
        let tkr = geometry().tkr_vox2ras();
        let inv = invert(&tkr).unwrap();
        assert_close(&tkr.dot(&inv), &identity());
    }

    #[test]
    fn singular_matrix() {
        let zero = Array2::<f64>::zeros((4, 4));
        assert!(invert(&zero).is_none());
    }

    #[test]
    fn coronal_conformed_volume_only_differs_by_center() {
        // for a conformed volume scanner RAS = tkr RAS + c_ras
        let vg = geometry();
        let scanner_from_tkr = vg.vox2ras().dot(&invert(&vg.tkr_vox2ras()).unwrap());
        let mut expected = identity();
        expected[[0, 3]] = 5.0;
        expected[[1, 3]] = -3.0;
        expected[[2, 3]] = 12.0;
        assert_close(&scanner_from_tkr, &expected);
    }

    #[test]
    fn volume_geometry_metadata_round_trip() {
        let vg = geometry();
        let mut meta = MetaData::new();
        vg.write_meta(&mut meta);
        assert_eq!(meta.len(), 18);
        assert_eq!(VolumeGeometry::from_meta(&meta), vg);
    }

    #[test]
    fn volume_geometry_needs_all_keys() {
        let mut meta = MetaData::new();
        geometry().write_meta(&mut meta);
        meta.remove("VolGeomC_S");
        assert!(!VolumeGeometry::from_meta(&meta).valid);

        geometry().write_meta(&mut meta);
        meta.set("VolGeomXsize", "wide");
        assert!(!VolumeGeometry::from_meta(&meta).valid);
    }

    #[test]
    fn ingest_scanner_and_talairach() {
        let mut tal = identity();
        tal[[0, 3]] = 2.0;
        let transforms = vec![
            CoordTransform::new(XformSpace::ScannerAnat, XformSpace::Unknown, identity()),
            CoordTransform::new(XformSpace::Unknown, XformSpace::Talairach, tal.clone()),
            CoordTransform::new(XformSpace::AlignedAnat, XformSpace::Mni152, identity()),
        ];
        let space = ingest_transforms(&transforms);
        assert!(space.real_ras);
        assert_eq!(space.talairach, Some(tal));
    }

    #[test]
    fn xfm_file_contents() {
        let contents = "MNI Transform File\n% tkregister\n\nTransform_Type = Linear;\nLinear_Transform =\n 1.0 0.0 0.0 10.5\n 0.0 1.0 0.0 -2\n 0.0 0.0 1.0 3 ;\n";
        let matrix = parse_xfm(contents).unwrap();
        assert_eq!(matrix[[0, 3]], 10.5);
        assert_eq!(matrix[[1, 3]], -2.0);
        assert_eq!(matrix[[3, 3]], 1.0);

        assert!(parse_xfm("Linear_Transform = 1 2 3 ;").is_none());
    }

    struct FixedSource(Option<Affine>);

    impl TransformSource for FixedSource {
        fn stored_transform(&self, _: &Surface, _: Option<&Path>) -> Option<Affine> {
            self.0.clone()
        }
    }

    fn triangle(volume_geometry: VolumeGeometry, real_ras: bool) -> Surface {
        let mut surface =
            Surface::from_geometry(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[[0, 1, 2]])
                .unwrap();
        surface.volume_geometry = volume_geometry;
        surface.real_ras = real_ras;
        surface
    }

    fn center_shift(sign: f64) -> Affine {
        let mut expected = identity();
        expected[[0, 3]] = 5.0 * sign;
        expected[[1, 3]] = -3.0 * sign;
        expected[[2, 3]] = 12.0 * sign;
        expected
    }

    #[test]
    fn scanner_coordinates_with_geometry() {
        let surface = triangle(geometry(), true);
        let transform = emit_transform(&surface, None, &FixedSource(None))
            .unwrap()
            .unwrap();
        assert_eq!(transform.data_space, XformSpace::ScannerAnat);
        assert_eq!(transform.transformed_space, XformSpace::Unknown);
        // tkr_vox2ras * vox2ras^-1
        assert_close(&transform.matrix, &center_shift(-1.0));
    }

    #[test]
    fn tkregister_coordinates_with_geometry() {
        let surface = triangle(geometry(), false);
        let transform = emit_transform(&surface, None, &FixedSource(Some(identity())))
            .unwrap()
            .unwrap();
        assert_eq!(transform.data_space, XformSpace::Unknown);
        assert_eq!(transform.transformed_space, XformSpace::ScannerAnat);
        // vox2ras * tkr_vox2ras^-1
        assert_close(&transform.matrix, &center_shift(1.0));
    }

    #[test]
    fn talairach_from_source() {
        let surface = triangle(VolumeGeometry::default(), false);
        let mut tal = identity();
        tal[[1, 3]] = -7.5;

        let transform = emit_transform(&surface, None, &FixedSource(Some(tal.clone())))
            .unwrap()
            .unwrap();
        assert_eq!(transform.data_space, XformSpace::Unknown);
        assert_eq!(transform.transformed_space, XformSpace::Talairach);
        assert_eq!(transform.matrix, tal);

        let wrong_shape = FixedSource(Some(Array2::zeros((3, 4))));
        assert!(emit_transform(&surface, None, &wrong_shape).unwrap().is_none());
        assert!(emit_transform(&surface, None, &FixedSource(None)).unwrap().is_none());
    }

    #[test]
    fn captured_talairach_wins() {
        let mut surface = triangle(VolumeGeometry::default(), false);
        let mut tal = identity();
        tal[[2, 2]] = 1.1;
        surface.talairach = Some(tal.clone());
        assert_eq!(XfmTransformSource.stored_transform(&surface, None), Some(tal));
    }

    #[test]
    fn xfm_location() {
        let path = XfmTransformSource::xfm_path(Path::new("/subjects/bert/surf/lh.white.gii"));
        assert_eq!(
            path,
            Some(PathBuf::from("/subjects/bert/mri/transforms/talairach.xfm"))
        );
    }
}
