//! Automatic detection of series irregularities: outliers and seasonality.

mod decomposition;
mod outlier;
mod seasonality;

pub use decomposition::{additive_decompose, Decomposition};
pub use outlier::{
    DetectionMethod, OutlierDetector, OutlierReport, OutlierTreatment,
};
pub use seasonality::{SeasonalityDetector, SeasonalityReport};
