//! The contract between the pipeline and a jurisdiction's import configuration.
//!
//! A configuration implements any subset of [`StationSource`], [`DistrictSource`]
//! and [`AddressSource`], and advertises them through [`ImportConfig`].
use std::path::PathBuf;

use crate::{
    source::{FormatOptions, RawRecord, SourceFormat},
    types::{AddressRecord, DistrictRecord, StationRecord},
};

/// Result of mapping one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome<E> {
    /// Exclude the record.
    Skip,
    One(E),
    /// Several entities from one record; `None` entries are dropped.
    Many(Vec<Option<E>>),
}

impl<E> MapOutcome<E> {
    /// Flatten into the entities to collect, in order.
    pub fn into_entities(self) -> Vec<E> {
        match self {
            Self::Skip => Vec::new(),
            Self::One(entity) => vec![entity],
            Self::Many(entities) => entities.into_iter().flatten().collect(),
        }
    }

    #[inline] pub fn is_skip(&self) -> bool { matches!(self, Self::Skip) }
}

impl<E> From<Option<E>> for MapOutcome<E> {
    fn from(entity: Option<E>) -> Self {
        entity.map_or(Self::Skip, Self::One)
    }
}

impl<E> From<Vec<Option<E>>> for MapOutcome<E> {
    fn from(entities: Vec<Option<E>>) -> Self { Self::Many(entities) }
}

/// Where one source file lives and how to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    /// Relative to the jurisdiction's data directory, unless absolute.
    pub file: PathBuf,
    pub format: SourceFormat,
    pub options: FormatOptions,
}

impl SourceSpec {
    pub fn new(file: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self { file: file.into(), format, options: FormatOptions::default() }
    }

    pub fn with_options(mut self, options: FormatOptions) -> Self {
        self.options = options;
        self
    }
}

/// A configuration that supplies polling stations.
pub trait StationSource {
    fn stations_file(&self) -> SourceSpec;

    fn station_record_to_entity(&self, record: &RawRecord) -> MapOutcome<StationRecord>;

    /// Identity of the station a record describes, for files that repeat a
    /// station once per address. Records whose hash was already seen are
    /// skipped before mapping.
    fn station_record_hash(&self, _record: &RawRecord) -> Option<String> { None }
}

/// A configuration that supplies polling districts.
pub trait DistrictSource {
    fn districts_file(&self) -> SourceSpec;

    fn district_record_to_entity(&self, record: &RawRecord) -> Option<DistrictRecord>;

    /// EPSG code of the district geometry, when it differs from the import default.
    fn srid(&self) -> Option<u32> { None }
}

/// A configuration that supplies addresses with their station assignments.
pub trait AddressSource {
    fn addresses_file(&self) -> SourceSpec;

    fn address_record_to_entity(&self, record: &RawRecord) -> Option<AddressRecord>;
}

/// One jurisdiction's import configuration.
pub trait ImportConfig {
    /// GSS code of the council being imported.
    fn council_id(&self) -> &str;

    fn as_station_source(&self) -> Option<&dyn StationSource> { None }
    fn as_district_source(&self) -> Option<&dyn DistrictSource> { None }
    fn as_address_source(&self) -> Option<&dyn AddressSource> { None }
}
