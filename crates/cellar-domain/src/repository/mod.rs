//! Repository trait definitions for reference data

use crate::model::VesselSpec;

/// Read-only vessel registry
///
/// Passed explicitly to the geometry resolver; implementations must not
/// change between lookups of the same run.
pub trait VesselRegistry {
    /// Find a vessel by id; ids are matched in normalized form
    fn find_vessel(&self, vessel_id: &str) -> Option<&VesselSpec>;

    /// All vessels, ordered by class then id
    fn all_vessels(&self) -> Vec<&VesselSpec>;

    /// Number of registered vessels
    fn count(&self) -> usize;
}
