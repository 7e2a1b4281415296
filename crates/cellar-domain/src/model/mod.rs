//! Domain model types

pub mod correlation;
pub mod extract;
pub mod material;
pub mod reading;
pub mod settings;
pub mod summary;
pub mod vessel;

pub use correlation::ExtractCorrelation;
pub use extract::{ExtractResult, VolumeResult};
pub use material::{MaterialCatalog, MaterialSpec, BLANK_MATERIAL};
pub use reading::Reading;
pub use settings::{round_to, CalculationSettings, LevelPolicy};
pub use summary::{BatchSummary, ClassTotal, LastReading, MaterialTotal, VesselTotal};
pub use vessel::{
    normalize_vessel_id, LevelUnit, StrappingPoint, VesselCatalog, VesselClass, VesselShape,
    VesselSpec,
};
