//! Domain services

pub mod aggregation;
pub mod batch;
pub mod extract_calculator;
pub mod geometry;
pub mod variations;

pub use aggregation::{aggregate, daily_summaries};
pub use batch::{BatchOutcome, BatchProcessor, ReadingFailure, ReadingFilter};
pub use extract_calculator::{extract_mass_kg, ExtractCalculator};
pub use geometry::VesselGeometryResolver;
pub use variations::{daily_variations, DailyVariation, Trend, VariationStats};
