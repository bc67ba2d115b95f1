//! The storage engine the pipeline persists into.
mod mem;

use anyhow::Result;
use geo::Point;

use crate::{
    pipeline::DataQuality,
    types::{Address, AssignmentRecord, Council, PollingDistrict, PollingStation, ResidentialAddress, Uprn},
};

pub use mem::MemStore;

/// Long-term storage of councils, imported entities and the address register.
///
/// Geometry passed in and out is in the store's spatial reference, [`Store::srid`].
pub trait Store {
    /// EPSG code of stored geometry.
    fn srid(&self) -> u32;

    fn council(&self, council_id: &str) -> Result<Option<Council>>;

    /// Councils whose area covers `point`, boundary included, by id.
    fn councils_containing(&self, point: &Point<f64>) -> Result<Vec<String>>;

    /// Delete the council's stations, districts and imported addresses and
    /// clear the station id of its assignment records. A council with no
    /// data is not an error.
    fn delete_council_data(&mut self, council_id: &str) -> Result<()>;

    fn insert_stations(&mut self, stations: Vec<PollingStation>) -> Result<()>;
    fn insert_districts(&mut self, districts: Vec<PollingDistrict>) -> Result<()>;
    fn insert_addresses(&mut self, addresses: Vec<ResidentialAddress>) -> Result<()>;

    fn stations(&self, council_id: &str) -> Result<Vec<PollingStation>>;
    fn districts(&self, council_id: &str) -> Result<Vec<PollingDistrict>>;
    fn addresses(&self, council_id: &str) -> Result<Vec<ResidentialAddress>>;

    /// Register entry for a UPRN.
    fn address(&self, uprn: &Uprn) -> Result<Option<Address>>;

    fn assignment(&self, uprn: &Uprn) -> Result<Option<AssignmentRecord>>;

    /// Assignment records governed by the council, ordered by UPRN.
    fn assignments(&self, council_id: &str) -> Result<Vec<AssignmentRecord>>;

    /// Overwrite `polling_station_id` on the given assignment records.
    fn set_polling_station_ids(&mut self, updates: Vec<(Uprn, String)>) -> Result<()>;

    fn postcode_centroid(&self, postcode: &str) -> Result<Option<Point<f64>>>;

    fn save_data_quality(&mut self, report: DataQuality) -> Result<()>;
}
