//! Metadata inferred from FreeSurfer file naming conventions
//!
//! Rules are evaluated in the order they are listed and a later match
//! overrides an earlier one, so `lh.pial-outer` ends up with the `Hull`
//! geometric type even though `.pial` also matches, and `rh.graymid` ends up
//! `Pial` because `.gray` is tested after `.graymid`.

/// metadata field a rule assigns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    PrimaryStructure,
    SecondaryStructure,
    GeometricType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub pattern: &'static str,
    pub field: Field,
    pub value: &'static str,
}

const fn rule(pattern: &'static str, field: Field, value: &'static str) -> Rule {
    Rule {
        pattern,
        field,
        value,
    }
}

pub const SURFACE_RULES: &[Rule] = &[
    rule("lh.", Field::PrimaryStructure, "CortexLeft"),
    rule("rh.", Field::PrimaryStructure, "CortexRight"),
    rule(".orig", Field::SecondaryStructure, "GrayWhite"),
    rule(".smoothwm", Field::SecondaryStructure, "GrayWhite"),
    rule(".white", Field::SecondaryStructure, "GrayWhite"),
    rule(".graymid", Field::SecondaryStructure, "MidThickness"),
    rule(".gray", Field::SecondaryStructure, "Pial"),
    rule(".pial", Field::SecondaryStructure, "Pial"),
    rule(".orig", Field::GeometricType, "Reconstruction"),
    rule(".smoothwm", Field::GeometricType, "Reconstruction"),
    rule(".white", Field::GeometricType, "Anatomical"),
    rule(".gray", Field::GeometricType, "Anatomical"),
    rule(".graymid", Field::GeometricType, "Anatomical"),
    rule(".pial", Field::GeometricType, "Anatomical"),
    rule(".inflated", Field::GeometricType, "Inflated"),
    rule(".sphere", Field::GeometricType, "Sphere"),
    rule(".qsphere", Field::GeometricType, "Sphere"),
    rule("pial-outer", Field::GeometricType, "Hull"),
];

/// `(pattern, ShapeDataType)` for shape overlays
pub const SHAPE_RULES: &[(&str, &str)] = &[
    (".thickness", "Thickness"),
    (".curv", "CurvatureRadial"),
    (".sulc", "SulcalDepth"),
    (".area", "Area"),
    (".volume", "Volume"),
    (".jacobian", "Jacobian"),
];

/// Anatomical metadata of a surface array
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceNaming {
    pub primary: Option<&'static str>,
    pub secondary: Option<&'static str>,
    pub geometric: Option<&'static str>,
}

/// Apply [`SURFACE_RULES`] to a file name
pub fn infer_surface(name: &str) -> SurfaceNaming {
    let mut naming = SurfaceNaming::default();

    for rule in SURFACE_RULES.iter().filter(|r| name.contains(r.pattern)) {
        match rule.field {
            Field::PrimaryStructure => naming.primary = Some(rule.value),
            Field::SecondaryStructure => naming.secondary = Some(rule.value),
            Field::GeometricType => naming.geometric = Some(rule.value),
        }
    }

    naming
}

/// `TopologicalType` of a surface: only patches are `Cut`
pub fn topological_type(patch: bool) -> &'static str {
    if patch {
        "Cut"
    } else {
        "Closed"
    }
}

/// The `ShapeDataType` of a shape file name, last matching rule wins
pub fn infer_shape(name: &str) -> Option<&'static str> {
    SHAPE_RULES
        .iter()
        .filter(|(pattern, _)| name.contains(pattern))
        .map(|(_, value)| *value)
        .last()
}
