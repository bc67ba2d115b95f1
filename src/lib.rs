#![doc = "Polling-station import pipeline: per-council election datasets in, UPRN to polling-station assignments out"]
mod collect;
mod config;
mod geom;
mod mapper;
mod pipeline;
mod resolve;
mod source;
mod store;
mod types;

#[doc(inline)]
pub use types::{
    canonical_uprn, Address, AddressRecord, AssignmentRecord, Council, DistrictRecord, PollingDistrict,
    PollingStation, ResidentialAddress, StationRecord, Uprn,
};

#[doc(inline)]
pub use source::{normalize_header, read, read_tagged, Fields, FormatOptions, RawRecord, SourceError, SourceFormat};

#[doc(inline)]
pub use geom::{overlap_percentage, reproject_multipolygon, reproject_point, GeometryError};

#[doc(inline)]
pub use mapper::{AddressSource, DistrictSource, ImportConfig, MapOutcome, SourceSpec, StationSource};

#[doc(inline)]
pub use collect::{AddressCheck, AddressList, AssignPollingStations, AssignmentOutcome, CollectStats, DistrictSet, StationSet};

#[doc(inline)]
pub use resolve::{merge_lookups, SpatialAssignmentResolver, StationLookup};

#[doc(inline)]
pub use store::{MemStore, Store};

#[doc(inline)]
pub use pipeline::{
    check_districts, check_stations, CheckWarning, DataLocation, DataQuality, Hook, ImportState, ImportSummary,
    Importer, SourceKind, SourceSummary, MIN_DISTRICT_OVERLAP,
};

#[doc(inline)]
pub use config::ImportOptions;
