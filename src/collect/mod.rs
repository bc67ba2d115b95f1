//! Collectors: accumulate mapped entities for one council, deduplicate and
//! validate them, and persist them in bulk.
mod addresses;
mod assign;
mod districts;
mod stations;

pub use addresses::{AddressCheck, AddressList};
pub use assign::{AssignPollingStations, AssignmentOutcome};
pub use districts::DistrictSet;
pub use stations::StationSet;

/// What became of the raw records offered to a collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CollectStats {
    /// Records the mapper excluded.
    pub skipped: usize,
    /// Records dropped as repeats of an already seen record.
    pub duplicates: usize,
    /// Entities added.
    pub collected: usize,
}
