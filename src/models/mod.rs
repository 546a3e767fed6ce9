pub mod directive;
pub mod metrics;
pub mod script;
pub mod wellness;

pub use directive::{Diagnosis, IntensityGuidance, PercentBand, WattRange, WorkoutDirective};
pub use metrics::{AthleteMetrics, HrvKind, HrvSample};
pub use script::{IntensityToken, Section, SectionHeader, Step, WorkoutScript};
pub use wellness::{AccountSettings, SportInfo, SportSettings, WellnessRecord};
