//! NIFTI intent codes as used in the `Intent` attribute of a `DataArray`

use std::fmt;

/// The statistical-distribution family of intents. Arrays carrying one of these
/// hold one statistic value per vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatIntent {
    Correl,
    TTest,
    FTest,
    ZScore,
    ChiSq,
    Beta,
    Binom,
    Gamma,
    Poisson,
    Normal,
    FTestNonc,
    ChiSqNonc,
    Logistic,
    Laplace,
    Uniform,
    TTestNonc,
    Weibull,
    Chi,
    InvGauss,
    ExtVal,
    PVal,
    LogPVal,
    Log10PVal,
    Estimate,
}

const STAT_INTENTS: [(StatIntent, &str, u16); 24] = [
    (StatIntent::Correl, "NIFTI_INTENT_CORREL", 2),
    (StatIntent::TTest, "NIFTI_INTENT_TTEST", 3),
    (StatIntent::FTest, "NIFTI_INTENT_FTEST", 4),
    (StatIntent::ZScore, "NIFTI_INTENT_ZSCORE", 5),
    (StatIntent::ChiSq, "NIFTI_INTENT_CHISQ", 6),
    (StatIntent::Beta, "NIFTI_INTENT_BETA", 7),
    (StatIntent::Binom, "NIFTI_INTENT_BINOM", 8),
    (StatIntent::Gamma, "NIFTI_INTENT_GAMMA", 9),
    (StatIntent::Poisson, "NIFTI_INTENT_POISSON", 10),
    (StatIntent::Normal, "NIFTI_INTENT_NORMAL", 11),
    (StatIntent::FTestNonc, "NIFTI_INTENT_FTEST_NONC", 12),
    (StatIntent::ChiSqNonc, "NIFTI_INTENT_CHISQ_NONC", 13),
    (StatIntent::Logistic, "NIFTI_INTENT_LOGISTIC", 14),
    (StatIntent::Laplace, "NIFTI_INTENT_LAPLACE", 15),
    (StatIntent::Uniform, "NIFTI_INTENT_UNIFORM", 16),
    (StatIntent::TTestNonc, "NIFTI_INTENT_TTEST_NONC", 17),
    (StatIntent::Weibull, "NIFTI_INTENT_WEIBULL", 18),
    (StatIntent::Chi, "NIFTI_INTENT_CHI", 19),
    (StatIntent::InvGauss, "NIFTI_INTENT_INVGAUSS", 20),
    (StatIntent::ExtVal, "NIFTI_INTENT_EXTVAL", 21),
    (StatIntent::PVal, "NIFTI_INTENT_PVAL", 22),
    (StatIntent::LogPVal, "NIFTI_INTENT_LOGPVAL", 23),
    (StatIntent::Log10PVal, "NIFTI_INTENT_LOG10PVAL", 24),
    (StatIntent::Estimate, "NIFTI_INTENT_ESTIMATE", 1001),
];

/// What a data array means. Parsed from and written to the `Intent` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    None,
    Stat(StatIntent),
    Label,
    NeuroName,
    GenMatrix,
    SymMatrix,
    DispVect,
    Vector,
    PointSet,
    Triangle,
    Quaternion,
    Dimless,
    TimeSeries,
    NodeIndex,
    RgbVector,
    RgbaVector,
    Shape,
}

const STRUCTURAL_INTENTS: [(Intent, &str, u16); 16] = [
    (Intent::None, "NIFTI_INTENT_NONE", 0),
    (Intent::Label, "NIFTI_INTENT_LABEL", 1002),
    (Intent::NeuroName, "NIFTI_INTENT_NEURONAME", 1003),
    (Intent::GenMatrix, "NIFTI_INTENT_GENMATRIX", 1004),
    (Intent::SymMatrix, "NIFTI_INTENT_SYMMATRIX", 1005),
    (Intent::DispVect, "NIFTI_INTENT_DISPVECT", 1006),
    (Intent::Vector, "NIFTI_INTENT_VECTOR", 1007),
    (Intent::PointSet, "NIFTI_INTENT_POINTSET", 1008),
    (Intent::Triangle, "NIFTI_INTENT_TRIANGLE", 1009),
    (Intent::Quaternion, "NIFTI_INTENT_QUATERNION", 1010),
    (Intent::Dimless, "NIFTI_INTENT_DIMLESS", 1011),
    (Intent::TimeSeries, "NIFTI_INTENT_TIME_SERIES", 2001),
    (Intent::NodeIndex, "NIFTI_INTENT_NODE_INDEX", 2002),
    (Intent::RgbVector, "NIFTI_INTENT_RGB_VECTOR", 2003),
    (Intent::RgbaVector, "NIFTI_INTENT_RGBA_VECTOR", 2004),
    (Intent::Shape, "NIFTI_INTENT_SHAPE", 2005),
];

impl Intent {
    /// parse the textual form found in a GIFTI file (`NIFTI_INTENT_*`)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        STRUCTURAL_INTENTS
            .iter()
            .find(|(_, text, _)| *text == name)
            .map(|(intent, _, _)| *intent)
            .or_else(|| {
                STAT_INTENTS
                    .iter()
                    .find(|(_, text, _)| *text == name)
                    .map(|(stat, _, _)| Intent::Stat(*stat))
            })
    }

    /// the textual form written to a GIFTI file
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Stat(stat) => STAT_INTENTS
                .iter()
                .find(|(s, _, _)| s == stat)
                .map(|(_, text, _)| *text)
                .unwrap_or("NIFTI_INTENT_NONE"),
            other => STRUCTURAL_INTENTS
                .iter()
                .find(|(i, _, _)| i == other)
                .map(|(_, text, _)| *text)
                .unwrap_or("NIFTI_INTENT_NONE"),
        }
    }

    /// numeric NIFTI intent code
    pub fn code(&self) -> u16 {
        match self {
            Intent::Stat(stat) => STAT_INTENTS
                .iter()
                .find(|(s, _, _)| s == stat)
                .map(|(_, _, code)| *code)
                .unwrap_or(0),
            other => STRUCTURAL_INTENTS
                .iter()
                .find(|(i, _, _)| i == other)
                .map(|(_, _, code)| *code)
                .unwrap_or(0),
        }
    }

    /// Number of columns (values per record) an array with this intent must have.
    pub fn expected_columns(&self) -> usize {
        match self {
            Intent::PointSet | Intent::Triangle => 3,
            Intent::Vector | Intent::DispVect | Intent::RgbVector => 3,
            Intent::RgbaVector | Intent::Quaternion => 4,
            Intent::SymMatrix => 6,
            Intent::GenMatrix => 9,
            _ => 1,
        }
    }

    pub fn is_statistic(&self) -> bool {
        matches!(self, Intent::Stat(_))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
