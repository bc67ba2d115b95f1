use ahash::AHashSet;
use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{
    geom::{station_point, GeometryError, Reprojector, StationPoint},
    mapper::StationSource,
    resolve::{SpatialAssignmentResolver, StationLookup},
    source::{RawRecord, SourceFormat},
    store::Store,
    types::{PollingStation, StationRecord},
};
use super::{CollectStats, DistrictSet};

/// Polling stations collected for one council.
#[derive(Debug)]
pub struct StationSet {
    council_id: String,
    reprojector: Option<Reprojector>,
    seen: AHashSet<String>,
    elements: Vec<PollingStation>,
    stats: CollectStats,
}

impl StationSet {
    /// Collect stations whose source geometry is in `source_srid`, to be stored in `store_srid`.
    pub fn new(council_id: impl Into<String>, source_srid: u32, store_srid: u32) -> Result<Self, GeometryError> {
        Ok(Self {
            council_id: council_id.into(),
            reprojector: Reprojector::between(source_srid, store_srid)?,
            seen: AHashSet::new(),
            elements: Vec::new(),
            stats: CollectStats::default(),
        })
    }

    #[inline] pub fn council_id(&self) -> &str { &self.council_id }
    #[inline] pub fn len(&self) -> usize { self.elements.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.elements.is_empty() }
    #[inline] pub fn stats(&self) -> CollectStats { self.stats }

    pub fn iter(&self) -> impl Iterator<Item = &PollingStation> { self.elements.iter() }

    /// Map one raw record through `source` and add the stations it yields.
    /// Returns how many were added.
    pub fn import_record(&mut self, source: &dyn StationSource, record: &RawRecord, format: SourceFormat) -> Result<usize> {
        if let Some(hash) = source.station_record_hash(record) {
            if !self.seen.insert(hash.clone()) {
                debug!("[stations] skipping repeat of station {hash}");
                self.stats.duplicates += 1;
                return Ok(0);
            }
        }

        let outcome = source.station_record_to_entity(record);
        if outcome.is_skip() {
            info!("Skipping station record: {record:?}");
            self.stats.skipped += 1;
            return Ok(0);
        }

        let mut added = 0;
        for mut station in outcome.into_entities() {
            if station.location.is_none() && format.is_shapefile() {
                station.location = record.geometry().and_then(|geometry| self.derive_location(&station, geometry));
            }
            self.add(station)?;
            added += 1;
        }
        Ok(added)
    }

    fn derive_location(&self, station: &StationRecord, geometry: &geo::Geometry<f64>) -> Option<geo::Point<f64>> {
        match station_point(geometry)? {
            StationPoint::Exact(point) => Some(point),
            StationPoint::Centroid(point) => {
                warn!("Station {} has polygon geometry; using its centroid", station.internal_council_id);
                Some(point)
            }
        }
    }

    /// Add a mapped station, filling in the council and moving its location
    /// into the store's spatial reference.
    pub fn add(&mut self, mut record: StationRecord) -> Result<()> {
        if let (Some(reprojector), Some(point)) = (&self.reprojector, record.location) {
            record.location = Some(reprojector.point(point)
                .with_context(|| format!("[stations] failed to reproject station {}", record.internal_council_id))?);
        }
        self.elements.push(PollingStation::from_record(record, &self.council_id));
        self.stats.collected += 1;
        Ok(())
    }

    /// Give stations without a location their postcode's centroid, where the store knows it.
    /// Returns how many were filled.
    pub fn fill_postcode_centroids(&mut self, store: &dyn Store) -> Result<usize> {
        let mut filled = 0;
        for station in self.elements.iter_mut().filter(|s| s.location.is_none() && !s.postcode.is_empty()) {
            if let Some(centroid) = store.postcode_centroid(&station.postcode)? {
                debug!("[stations] station {} located at centroid of {}", station.internal_council_id, station.postcode);
                station.location = Some(centroid);
                filled += 1;
            }
        }
        Ok(filled)
    }

    /// Station id → UPRNs inside the districts each station names as served.
    pub fn get_polling_station_lookup(&self, districts: &DistrictSet, store: &dyn Store) -> Result<StationLookup> {
        let by_district = SpatialAssignmentResolver::new(&self.council_id, districts.iter())
            .district_lookup(store)?;

        let mut lookup = StationLookup::new();
        for station in self.elements.iter().filter(|s| !s.polling_district_id.is_empty()) {
            if let Some(uprns) = by_district.get(&station.polling_district_id) {
                lookup.entry(station.internal_council_id.clone())
                    .or_default()
                    .extend(uprns.iter().cloned());
            }
        }
        Ok(lookup)
    }

    /// Persist all collected stations. Returns how many were written.
    pub fn save(&self, store: &mut dyn Store) -> Result<usize> {
        let count = self.elements.len();
        store.insert_stations(self.elements.clone())
            .with_context(|| format!("[stations] failed to save stations for {}", self.council_id))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry, MultiPolygon, Point};

    use std::collections::BTreeSet;

    use crate::{
        mapper::{MapOutcome, SourceSpec},
        source::Fields,
        store::MemStore,
        types::{Address, DistrictRecord, Uprn},
    };

    /// Maps `id`/`name` fields; records named "skip" are excluded, and an `also`
    /// field adds a second station.
    struct Stations { dedupe: bool }

    impl StationSource for Stations {
        fn stations_file(&self) -> SourceSpec { SourceSpec::new("stations.csv", SourceFormat::DelimitedText) }

        fn station_record_to_entity(&self, record: &RawRecord) -> MapOutcome<StationRecord> {
            if record.field("name") == "skip" {
                return MapOutcome::Skip;
            }
            let first = Some(StationRecord::new(record.field("id"), record.field("name")).with_postcode(record.field("postcode")));
            let second = record.get("also").map(|id| StationRecord::new(id, record.field("name")));
            MapOutcome::Many(vec![first, second])
        }

        fn station_record_hash(&self, record: &RawRecord) -> Option<String> {
            self.dedupe.then(|| record.field("id").to_string())
        }
    }

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord::Row(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Fields>())
    }

    fn set() -> StationSet { StationSet::new("X01", 27700, 27700).unwrap() }

    #[test]
    fn council_is_filled_in() {
        let mut stations = set();
        stations.import_record(&Stations { dedupe: false }, &row(&[("id", "1"), ("name", "Hall")]), SourceFormat::DelimitedText).unwrap();
        assert_eq!(stations.iter().next().map(|s| s.council_id.as_str()), Some("X01"));
    }

    #[test]
    fn skipped_records_add_nothing() {
        let mut stations = set();
        let added = stations.import_record(&Stations { dedupe: false }, &row(&[("id", "1"), ("name", "skip")]), SourceFormat::DelimitedText).unwrap();
        assert_eq!(added, 0);
        assert!(stations.is_empty());
        assert_eq!(stations.stats().skipped, 1);
    }

    #[test]
    fn one_record_may_yield_several_stations() {
        let mut stations = set();
        let record = row(&[("id", "1"), ("name", "Hall"), ("also", "2")]);
        assert_eq!(stations.import_record(&Stations { dedupe: false }, &record, SourceFormat::DelimitedText).unwrap(), 2);
        assert_eq!(stations.len(), 2);
    }

    #[test]
    fn repeated_hash_is_skipped() {
        let mut stations = set();
        let source = Stations { dedupe: true };
        for _ in 0..3 {
            stations.import_record(&source, &row(&[("id", "1"), ("name", "Hall")]), SourceFormat::DelimitedText).unwrap();
        }
        assert_eq!(stations.len(), 1);
        assert_eq!(stations.stats().duplicates, 2);
    }

    #[test]
    fn shapefile_geometry_supplies_location() {
        let mut stations = set();
        let source = Stations { dedupe: false };
        let point = RawRecord::Feature {
            geometry: Some(Geometry::Point(Point::new(3.0, 4.0))),
            properties: [("id".to_string(), "1".to_string())].into(),
        };
        let square = RawRecord::Feature {
            geometry: Some(Geometry::MultiPolygon(MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 2.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0)]]))),
            properties: [("id".to_string(), "2".to_string())].into(),
        };
        stations.import_record(&source, &point, SourceFormat::Shapefile).unwrap();
        stations.import_record(&source, &square, SourceFormat::ShapefileZip).unwrap();
        // GeoJSON geometry is left to the mapper.
        stations.import_record(&source, &point, SourceFormat::GeoJson).unwrap();

        let locations: Vec<_> = stations.iter().map(|s| s.location).collect();
        assert_eq!(locations, vec![Some(Point::new(3.0, 4.0)), Some(Point::new(1.0, 1.0)), None]);
    }

    #[test]
    fn locations_are_reprojected() {
        let mut stations = StationSet::new("X01", 4326, 27700).unwrap();
        stations.add(StationRecord::new("1", "Hall").with_location(Point::new(-0.1281, 51.508))).unwrap();
        let location = stations.iter().next().and_then(|s| s.location).unwrap();
        assert!((location.x() - 530_000.0).abs() < 1_000.0);
        assert!((location.y() - 180_500.0).abs() < 1_000.0);
    }

    #[test]
    fn postcode_centroid_fills_missing_location() {
        let mut store = MemStore::default();
        store.add_postcode_centroid("AB1 2CD", Point::new(5.0, 6.0));
        let mut stations = set();
        stations.add(StationRecord::new("1", "Hall").with_postcode("ab1 2cd")).unwrap();
        stations.add(StationRecord::new("2", "School").with_postcode("ZZ9 9ZZ")).unwrap();

        assert_eq!(stations.fill_postcode_centroids(&store).unwrap(), 1);
        assert_eq!(stations.iter().next().and_then(|s| s.location), Some(Point::new(5.0, 6.0)));
    }

    #[test]
    fn lookup_follows_the_district_each_station_names() {
        let mut store = MemStore::default();
        for (uprn, x) in [("1", 0.5), ("2", 1.5), ("3", 1.75), ("4", 5.0)] {
            store.add_assignment(uprn, "X01");
            store.add_address(Address { uprn: uprn.into(), address: String::new(), postcode: String::new(), location: Some(Point::new(x, 0.5)) });
        }
        let strip = |x0: f64, x1: f64| MultiPolygon(vec![polygon![(x: x0, y: 0.0), (x: x0, y: 1.0), (x: x1, y: 1.0), (x: x1, y: 0.0)]]);
        let mut districts = DistrictSet::new("X01", 27700, 27700).unwrap();
        districts.add(DistrictRecord::new("A", "A").with_area(strip(0.0, 1.0))).unwrap();
        districts.add(DistrictRecord::new("B", "B").with_area(strip(1.0, 2.0))).unwrap();

        let mut stations = set();
        stations.add(StationRecord::new("S1", "Hall").with_district("A")).unwrap();
        stations.add(StationRecord::new("S2", "School").with_district("B")).unwrap();
        stations.add(StationRecord::new("S3", "Church")).unwrap();
        stations.add(StationRecord::new("S4", "Library").with_district("Z")).unwrap();

        let lookup = stations.get_polling_station_lookup(&districts, &store).unwrap();
        assert_eq!(lookup.keys().map(String::as_str).collect::<Vec<_>>(), vec!["S1", "S2"]);
        assert_eq!(lookup["S1"], BTreeSet::from([Uprn::new("1")]));
        assert_eq!(lookup["S2"], BTreeSet::from([Uprn::new("2"), Uprn::new("3")]));
    }
}
