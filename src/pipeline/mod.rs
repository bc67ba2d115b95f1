//! One council's import run.
//!
//! An [`Importer`] moves through [`ImportState`]s in order: the council's
//! previous data is torn down, every configured source is read and mapped
//! into its collector, the collectors are persisted together with the
//! resulting station assignments, and a data-quality record is written.
//! Any error moves the importer to [`ImportState::Failed`]. All sources are
//! read before anything is persisted, and a failed write tears the council
//! down again, so a failed run leaves the council with no stations or
//! districts rather than a mix of old and new.
mod checks;
mod location;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    collect::{AddressCheck, AddressList, AssignPollingStations, AssignmentOutcome, CollectStats, DistrictSet, StationSet},
    config::ImportOptions,
    mapper::{ImportConfig, SourceSpec},
    resolve::{merge_lookups, StationLookup},
    source::{self, RawRecord},
    store::Store,
};

pub use checks::{check_districts, check_stations, CheckWarning, MIN_DISTRICT_OVERLAP};
pub use location::DataLocation;
pub use report::DataQuality;

/// Where an import run has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportState {
    Init,
    TornDown,
    Extracting,
    Collecting,
    Persisted,
    Reported,
    Done,
    Failed,
}

/// An optional step run against the store before extraction or after persistence.
/// Its failure is logged and does not stop the run.
pub type Hook = Box<dyn Fn(&mut dyn Store) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Stations,
    Districts,
    Addresses,
}

/// What came of one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub kind: SourceKind,
    pub path: PathBuf,
    /// Raw records read from the file.
    pub read: usize,
    pub stats: CollectStats,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub council_id: String,
    pub state: ImportState,
    pub sources: Vec<SourceSummary>,
    pub address_check: Option<AddressCheck>,
    pub assignment: Option<AssignmentOutcome>,
    pub warnings: Vec<CheckWarning>,
    pub data_quality: DataQuality,
}

/// Raw records read from one source.
struct Extracted {
    spec: SourceSpec,
    path: PathBuf,
    records: Vec<RawRecord>,
}

/// Runs the import for one council configuration.
pub struct Importer<'c> {
    config: &'c dyn ImportConfig,
    options: ImportOptions,
    location: DataLocation,
    state: ImportState,
    pre_import: Option<Hook>,
    post_import: Option<Hook>,
}

impl<'c> Importer<'c> {
    /// Resolve the council's data location and check the configuration supplies
    /// at least one source.
    pub fn new(config: &'c dyn ImportConfig, options: ImportOptions) -> Result<Self> {
        let council_id = config.council_id();
        if config.as_station_source().is_none()
            && config.as_district_source().is_none()
            && config.as_address_source().is_none()
        {
            anyhow::bail!("[import] configuration for {council_id} supplies no stations, districts or addresses");
        }

        let location = match &options.data_root {
            Some(root) => DataLocation::resolve(root, council_id)?,
            None => DataLocation::unrooted(),
        };

        Ok(Self { config, options, location, state: ImportState::Init, pre_import: None, post_import: None })
    }

    pub fn with_pre_import(mut self, hook: impl Fn(&mut dyn Store) -> Result<()> + 'static) -> Self {
        self.pre_import = Some(Box::new(hook));
        self
    }

    pub fn with_post_import(mut self, hook: impl Fn(&mut dyn Store) -> Result<()> + 'static) -> Self {
        self.post_import = Some(Box::new(hook));
        self
    }

    #[inline] pub fn state(&self) -> ImportState { self.state }
    #[inline] pub fn location(&self) -> &DataLocation { &self.location }

    /// Run the import. The caller must ensure no other run for the same council
    /// uses `store` concurrently.
    pub fn run(&mut self, store: &mut dyn Store) -> Result<ImportSummary> {
        self.state = ImportState::Init;
        let result = self.run_steps(store);
        if let Err(err) = &result {
            warn!("[import] {} failed in state {:?}: {err:#}", self.config.council_id(), self.state);
            self.transition(ImportState::Failed);
        }
        result
    }

    fn transition(&mut self, next: ImportState) {
        debug!("[import] {}: {:?} -> {:?}", self.config.council_id(), self.state, next);
        self.state = next;
    }

    fn run_steps(&mut self, store: &mut dyn Store) -> Result<ImportSummary> {
        let config = self.config;
        let council_id = config.council_id();
        let council = store.council(council_id)?
            .with_context(|| format!("[import] unknown council {council_id}"))?;

        store.delete_council_data(council_id)
            .with_context(|| format!("[import] failed to tear down {council_id}"))?;
        self.transition(ImportState::TornDown);

        run_hook(self.pre_import.as_ref(), "pre-import", council_id, store);

        self.transition(ImportState::Extracting);
        let station_input = config.as_station_source().map(|s| self.extract(s.stations_file())).transpose()?;
        let district_input = config.as_district_source().map(|s| self.extract(s.districts_file())).transpose()?;
        let address_input = config.as_address_source().map(|s| self.extract(s.addresses_file())).transpose()?;

        self.transition(ImportState::Collecting);
        let store_srid = store.srid();
        let mut sources = Vec::new();

        let mut stations = None;
        if let (Some(source), Some(input)) = (config.as_station_source(), station_input) {
            let mut set = StationSet::new(council_id, self.options.srid, store_srid)?;
            for record in &input.records {
                set.import_record(source, record, input.spec.format)?;
            }
            if self.options.use_postcode_centroids {
                let filled = set.fill_postcode_centroids(store)?;
                debug!("[import] {filled} stations located by postcode centroid");
            }
            sources.push(input.summary(SourceKind::Stations, set.stats()));
            stations = Some(set);
        }

        let mut districts = None;
        if let (Some(source), Some(input)) = (config.as_district_source(), district_input) {
            let srid = source.srid().unwrap_or(self.options.srid);
            let mut set = DistrictSet::new(council_id, srid, store_srid)?;
            for record in &input.records {
                set.import_record(source, record, input.spec.format)?;
            }
            sources.push(input.summary(SourceKind::Districts, set.stats()));
            districts = Some(set);
        }

        let mut addresses = None;
        let mut address_check = None;
        if let (Some(source), Some(input)) = (config.as_address_source(), address_input) {
            let mut list = AddressList::new(council_id);
            for record in &input.records {
                list.import_record(source, record);
            }
            address_check = Some(list.check_records(store)?);
            sources.push(input.summary(SourceKind::Addresses, list.stats()));
            addresses = Some(list);
        }

        let mut warnings = Vec::new();
        if self.options.validation_checks {
            if let Some(set) = &stations {
                warnings.extend(check_stations(set.iter(), store)?);
            }
            if let Some(set) = &districts {
                warnings.extend(check_districts(set.iter(), &council));
            }
        }

        let persisted = persist(stations.as_ref(), districts.as_ref(), addresses.as_ref(), store);
        let assignment = match persisted {
            Ok(assignment) => assignment,
            Err(err) => {
                if let Err(cleanup) = store.delete_council_data(council_id) {
                    warn!("[import] failed to roll back {council_id}: {cleanup:#}");
                }
                return Err(err);
            }
        };
        self.transition(ImportState::Persisted);

        run_hook(self.post_import.as_ref(), "post-import", council_id, store);

        let data_quality = DataQuality::compute(store, council_id, &warnings)?;
        store.save_data_quality(data_quality.clone())
            .with_context(|| format!("[import] failed to save data quality for {council_id}"))?;
        self.transition(ImportState::Reported);

        info!("Imported {council_id}: {} stations, {} districts, {} addresses assigned",
            data_quality.num_stations, data_quality.num_districts, data_quality.num_addresses);
        self.transition(ImportState::Done);

        Ok(ImportSummary {
            council_id: council_id.to_string(),
            state: self.state,
            sources,
            address_check,
            assignment,
            warnings,
            data_quality,
        })
    }

    fn extract(&self, spec: SourceSpec) -> Result<Extracted> {
        let path = self.location.path(&spec.file);
        let records = source::read(spec.format, &path, &spec.options)
            .with_context(|| format!("[import] failed to read {} as {}", path.display(), spec.format))?;
        debug!("[import] read {} records from {}", records.len(), path.display());
        Ok(Extracted { spec, path, records })
    }
}

impl Extracted {
    fn summary(&self, kind: SourceKind, stats: CollectStats) -> SourceSummary {
        SourceSummary { kind, path: self.path.clone(), read: self.records.len(), stats }
    }
}

/// Save the collected entities and write station assignments. The caller
/// tears the council down again if this fails part way.
fn persist(
    stations: Option<&StationSet>,
    districts: Option<&DistrictSet>,
    addresses: Option<&AddressList>,
    store: &mut dyn Store,
) -> Result<Option<AssignmentOutcome>> {
    if let Some(set) = stations {
        set.save(store)?;
    }
    if let Some(set) = districts {
        set.save(store)?;
    }
    if let Some(list) = addresses {
        list.save(store)?;
    }

    match (addresses, districts) {
        (Some(list), _) => {
            let lookup = list.get_polling_station_lookup();
            Ok(Some(list.update_uprn_to_council_model(store, &lookup)?))
        }
        (None, Some(set)) => {
            let lookup = district_lookup(set, stations, store)?;
            Ok(Some(set.update_uprn_to_council_model(store, &lookup)?))
        }
        (None, None) => Ok(None),
    }
}

/// District-derived lookup, merged with the station-derived one when stations
/// name the districts they serve.
fn district_lookup(districts: &DistrictSet, stations: Option<&StationSet>, store: &dyn Store) -> Result<StationLookup> {
    let by_district = districts.get_polling_station_lookup(store)?;
    match stations {
        Some(stations) => Ok(merge_lookups(by_district, stations.get_polling_station_lookup(districts, store)?)),
        None => Ok(by_district),
    }
}

fn run_hook(hook: Option<&Hook>, name: &str, council_id: &str, store: &mut dyn Store) {
    let Some(hook) = hook else { return };
    if let Err(err) = hook(store) {
        warn!("{name} hook for {council_id} failed: {err:#}");
    }
}
