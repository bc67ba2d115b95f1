use anyhow::{Context, Result};
use log::info;

use crate::{
    geom::{to_multipolygon, GeometryError, Reprojector},
    mapper::DistrictSource,
    resolve::{SpatialAssignmentResolver, StationLookup},
    source::{RawRecord, SourceFormat},
    store::Store,
    types::{DistrictRecord, PollingDistrict},
};
use super::{AssignPollingStations, CollectStats};

/// Polling districts collected for one council.
#[derive(Debug)]
pub struct DistrictSet {
    council_id: String,
    reprojector: Option<Reprojector>,
    elements: Vec<PollingDistrict>,
    stats: CollectStats,
}

impl DistrictSet {
    /// Collect districts whose geometry is in `source_srid`, to be stored in `store_srid`.
    pub fn new(council_id: impl Into<String>, source_srid: u32, store_srid: u32) -> Result<Self, GeometryError> {
        Ok(Self {
            council_id: council_id.into(),
            reprojector: Reprojector::between(source_srid, store_srid)?,
            elements: Vec::new(),
            stats: CollectStats::default(),
        })
    }

    #[inline] pub fn len(&self) -> usize { self.elements.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.elements.is_empty() }
    #[inline] pub fn stats(&self) -> CollectStats { self.stats }

    pub fn iter(&self) -> impl Iterator<Item = &PollingDistrict> { self.elements.iter() }

    /// Map one raw record through `source` and add the district it yields, if any.
    pub fn import_record(&mut self, source: &dyn DistrictSource, record: &RawRecord, format: SourceFormat) -> Result<bool> {
        let Some(mut district) = source.district_record_to_entity(record) else {
            info!("Skipping district record: {:?}", record.fields());
            self.stats.skipped += 1;
            return Ok(false);
        };

        if district.area.is_none() && matches!(format, SourceFormat::Shapefile | SourceFormat::ShapefileZip | SourceFormat::GeoJson) {
            district.area = record.geometry().cloned().and_then(to_multipolygon);
        }
        self.add(district)?;
        Ok(true)
    }

    /// Add a mapped district, filling in the council and moving its area
    /// into the store's spatial reference.
    pub fn add(&mut self, mut record: DistrictRecord) -> Result<()> {
        if let Some(reprojector) = &self.reprojector {
            record.area = record.area.as_ref()
                .map(|area| reprojector.multipolygon(area))
                .transpose()
                .with_context(|| format!("[districts] failed to reproject district {}", record.internal_council_id))?;
        }
        self.elements.push(PollingDistrict::from_record(record, &self.council_id));
        self.stats.collected += 1;
        Ok(())
    }

    /// Station id → UPRNs whose register point lies strictly inside one of
    /// that station's districts.
    pub fn get_polling_station_lookup(&self, store: &dyn Store) -> Result<StationLookup> {
        SpatialAssignmentResolver::new(&self.council_id, &self.elements).station_lookup(store)
    }

    /// Persist all collected districts. Returns how many were written.
    pub fn save(&self, store: &mut dyn Store) -> Result<usize> {
        let count = self.elements.len();
        store.insert_districts(self.elements.clone())
            .with_context(|| format!("[districts] failed to save districts for {}", self.council_id))?;
        Ok(count)
    }
}

impl AssignPollingStations for DistrictSet {
    fn council_id(&self) -> &str { &self.council_id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Geometry, MultiPolygon, Point};

    use crate::{collect::AssignmentOutcome, mapper::SourceSpec, store::MemStore, types::Address};

    struct Districts;

    impl DistrictSource for Districts {
        fn districts_file(&self) -> SourceSpec { SourceSpec::new("districts.geojson", SourceFormat::GeoJson) }

        fn district_record_to_entity(&self, record: &RawRecord) -> Option<DistrictRecord> {
            let id = record.get("code")?;
            Some(DistrictRecord::new(id, id).with_station(id))
        }
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x0, y: y1), (x: x1, y: y1), (x: x1, y: y0)]])
    }

    fn feature(code: Option<&str>, area: MultiPolygon<f64>) -> RawRecord {
        RawRecord::Feature {
            geometry: Some(Geometry::MultiPolygon(area)),
            properties: code.map(|c| ("code".to_string(), c.to_string())).into_iter().collect(),
        }
    }

    fn located(store: &mut MemStore, uprn: &str, x: f64, y: f64) {
        store.add_assignment(uprn, "X01");
        store.add_address(Address { uprn: uprn.into(), address: String::new(), postcode: String::new(), location: Some(Point::new(x, y)) });
    }

    #[test]
    fn area_comes_from_feature_geometry() {
        let mut districts = DistrictSet::new("X01", 27700, 27700).unwrap();
        districts.import_record(&Districts, &feature(Some("01"), rect(0.0, 0.0, 1.0, 1.0)), SourceFormat::GeoJson).unwrap();
        districts.import_record(&Districts, &feature(Some("02"), rect(0.0, 0.0, 1.0, 1.0)), SourceFormat::Kml).unwrap();

        let areas: Vec<_> = districts.iter().map(|d| d.area.is_some()).collect();
        assert_eq!(areas, vec![true, false]);
        assert!(districts.iter().all(|d| d.council_id == "X01"));
    }

    #[test]
    fn unmapped_records_are_skipped() {
        let mut districts = DistrictSet::new("X01", 27700, 27700).unwrap();
        assert!(!districts.import_record(&Districts, &feature(None, rect(0.0, 0.0, 1.0, 1.0)), SourceFormat::GeoJson).unwrap());
        assert!(districts.is_empty());
        assert_eq!(districts.stats().skipped, 1);
    }

    #[test]
    fn ambiguous_uprns_are_left_unassigned() {
        let mut store = MemStore::default();
        located(&mut store, "1", 0.5, 0.5);
        located(&mut store, "2", 1.5, 0.5);
        located(&mut store, "3", 2.5, 0.5);
        store.add_assignment("4", "X01");

        let mut districts = DistrictSet::new("X01", 27700, 27700).unwrap();
        districts.add(DistrictRecord::new("A", "A").with_station("SA").with_area(rect(0.0, 0.0, 2.0, 1.0))).unwrap();
        districts.add(DistrictRecord::new("B", "B").with_station("SB").with_area(rect(1.0, 0.0, 3.0, 1.0))).unwrap();

        let lookup = districts.get_polling_station_lookup(&store).unwrap();
        let outcome = districts.update_uprn_to_council_model(&mut store, &lookup).unwrap();

        assert_eq!(store.polling_station_id("1"), Some("SA"));
        assert_eq!(store.polling_station_id("2"), Some(""));
        assert_eq!(store.polling_station_id("3"), Some("SB"));
        assert_eq!(store.polling_station_id("4"), Some(""));
        assert_eq!(outcome, AssignmentOutcome { assigned: 2, ambiguous: 1, unassigned: 1 });
    }

    #[test]
    fn overlapping_districts_of_one_station_still_assign() {
        let mut store = MemStore::default();
        located(&mut store, "1", 1.5, 0.5);

        let mut districts = DistrictSet::new("X01", 27700, 27700).unwrap();
        districts.add(DistrictRecord::new("A", "A").with_station("S").with_area(rect(0.0, 0.0, 2.0, 1.0))).unwrap();
        districts.add(DistrictRecord::new("B", "B").with_station("S").with_area(rect(1.0, 0.0, 3.0, 1.0))).unwrap();

        let lookup = districts.get_polling_station_lookup(&store).unwrap();
        districts.update_uprn_to_council_model(&mut store, &lookup).unwrap();
        assert_eq!(store.polling_station_id("1"), Some("S"));
    }
}
