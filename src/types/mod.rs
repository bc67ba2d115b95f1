mod address;
mod council;
mod district;
mod station;
mod uprn;

pub use address::{Address, AddressRecord, AssignmentRecord, ResidentialAddress};
pub(crate) use address::postcodes_match;
pub use council::Council;
pub use district::{DistrictRecord, PollingDistrict};
pub use station::{PollingStation, StationRecord};
pub use uprn::{canonical_uprn, Uprn};
