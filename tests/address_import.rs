use std::fs;

use geo::{polygon, MultiPolygon, Point};
use polling_import::{
    Address, AddressRecord, AddressSource, Council, FormatOptions, ImportConfig, ImportOptions, Importer, MapOutcome,
    MemStore, RawRecord, SourceFormat, SourceKind, SourceSpec, StationRecord, StationSource, Store, Uprn,
};

const COUNCIL: &str = "E07000001";

/// A council that publishes one combined file: every address row repeats its
/// station's details.
struct CombinedExport;

impl StationSource for CombinedExport {
    fn stations_file(&self) -> SourceSpec {
        SourceSpec::new("export.tsv", SourceFormat::DelimitedText)
            .with_options(FormatOptions::default().with_delimiter('\t').with_encoding("windows-1252"))
    }

    fn station_record_to_entity(&self, record: &RawRecord) -> MapOutcome<StationRecord> {
        let id = record.field("polling_station_id");
        if id.is_empty() {
            return MapOutcome::Skip;
        }
        MapOutcome::One(StationRecord::new(id, record.field("station_address")).with_postcode(record.field("station_postcode")))
    }

    fn station_record_hash(&self, record: &RawRecord) -> Option<String> {
        Some(record.field("polling_station_id").to_string())
    }
}

impl AddressSource for CombinedExport {
    fn addresses_file(&self) -> SourceSpec {
        self.stations_file()
    }

    fn address_record_to_entity(&self, record: &RawRecord) -> Option<AddressRecord> {
        let station = record.field("polling_station_id");
        if station.is_empty() {
            return None;
        }
        Some(AddressRecord::new(record.field("property_urn"), record.field("address_line_1"), record.field("post_code"))
            .with_station(station))
    }
}

impl ImportConfig for CombinedExport {
    fn council_id(&self) -> &str { COUNCIL }

    fn as_station_source(&self) -> Option<&dyn StationSource> { Some(self) }
    fn as_address_source(&self) -> Option<&dyn AddressSource> { Some(self) }
}

const EXPORT: &[&str] = &[
    "Property URN\tPolling Station Id\tAddress Line 1\tPost Code\tStation Address\tStation Postcode",
    "000001\t1\t1 Church Road\tBH16 5HT\tVillage Hall\tBH16 6AA",
    "1\t2\t1 Church Road\tBH16 5HT\tSt Mary's School\tBH16 6BB",
    "2\t3\t2 Church Road\tBH16 5HT\tCaf\u{e9} Annexe\tBH16 6CC",
    "3\t3\t3 Church Road\tBH16 5HT\tCaf\u{e9} Annexe\tBH16 6CC",
    "4\t1\t4 Church Road\tbh16 5ht\tVillage Hall\tBH16 6AA",
    "5\t\t5 Church Road\tBH16 5HT\t\t",
    "6\t2\t6 Church Road\tBH16 5HT\tSt Mary's School\tBH16 6BB",
    "7\t3\t7 Church Road\tBH17 5HT\tCaf\u{e9} Annexe\tBH16 6CC",
];

fn write_export(dir: &std::path::Path) {
    let text = EXPORT.join("\n") + "\n";
    // Windows-1252 has a single byte for every character used here.
    let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).collect();
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("export.tsv"), bytes).unwrap();
}

fn store() -> MemStore {
    let mut store = MemStore::default();
    let area = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 100.0), (x: 100.0, y: 100.0), (x: 100.0, y: 0.0)]]);
    store.add_council(Council::new(COUNCIL, "Example District", area));
    for uprn in 1..=7 {
        let uprn = uprn.to_string();
        store.add_assignment(uprn.as_str(), COUNCIL);
        if uprn != "2" {
            store.add_address(Address {
                uprn: Uprn::new(&uprn),
                address: format!("{uprn} Church Road"),
                postcode: "BH16 5HT".into(),
                location: Some(Point::new(50.0, 50.0)),
            });
        }
    }
    store.add_postcode_centroid("BH16 6AA", Point::new(10.0, 10.0));
    store
}

#[test]
fn address_file_assigns_consistent_uprns_only() {
    let root = tempfile::tempdir().unwrap();
    write_export(&root.path().join(COUNCIL));
    let mut store = store();

    let options = ImportOptions { use_postcode_centroids: true, ..ImportOptions::default() }.with_data_root(root.path());
    let summary = Importer::new(&CombinedExport, options).unwrap().run(&mut store).unwrap();

    let assigned: Vec<(String, String)> = store.assignments(COUNCIL).unwrap().into_iter()
        .filter(|record| !record.polling_station_id.is_empty())
        .map(|record| (record.uprn.to_string(), record.polling_station_id))
        .collect();
    assert_eq!(assigned, vec![
        ("3".to_string(), "3".to_string()),
        ("4".to_string(), "1".to_string()),
        ("6".to_string(), "2".to_string()),
    ]);
    assert_eq!(summary.data_quality.num_addresses, 3);

    let check = summary.address_check.unwrap();
    assert_eq!((check.not_in_register, check.postcode_mismatch, check.conflicting_station), (1, 1, 2));

    let addresses = summary.sources.iter().find(|s| s.kind == SourceKind::Addresses).unwrap();
    assert_eq!((addresses.read, addresses.stats.skipped, addresses.stats.collected), (8, 1, 7));
}

#[test]
fn repeated_stations_are_collected_once() {
    let root = tempfile::tempdir().unwrap();
    write_export(&root.path().join(COUNCIL));
    let mut store = store();

    let options = ImportOptions { use_postcode_centroids: true, ..ImportOptions::default() }.with_data_root(root.path());
    let summary = Importer::new(&CombinedExport, options).unwrap().run(&mut store).unwrap();

    let mut stations = store.stations(COUNCIL).unwrap();
    stations.sort_by(|a, b| a.internal_council_id.cmp(&b.internal_council_id));
    let ids: Vec<&str> = stations.iter().map(|s| s.internal_council_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(stations[2].address, "Caf\u{e9} Annexe");
    // Only station 1's postcode has a known centroid.
    assert_eq!(stations[0].location, Some(Point::new(10.0, 10.0)));
    assert_eq!(stations[1].location, None);

    let source = summary.sources.iter().find(|s| s.kind == SourceKind::Stations).unwrap();
    assert_eq!((source.stats.duplicates, source.stats.skipped, source.stats.collected), (4, 1, 3));
    assert_eq!(summary.data_quality.num_stations, 3);
}

#[test]
fn reimport_replaces_previous_rows() {
    let root = tempfile::tempdir().unwrap();
    write_export(&root.path().join(COUNCIL));
    let mut store = store();
    let options = ImportOptions::default().with_data_root(root.path());

    Importer::new(&CombinedExport, options.clone()).unwrap().run(&mut store).unwrap();
    let first = (store.stations(COUNCIL).unwrap(), store.addresses(COUNCIL).unwrap(), store.assignments(COUNCIL).unwrap());
    Importer::new(&CombinedExport, options).unwrap().run(&mut store).unwrap();
    let second = (store.stations(COUNCIL).unwrap(), store.addresses(COUNCIL).unwrap(), store.assignments(COUNCIL).unwrap());

    assert_eq!(first, second);
    assert_eq!(second.0.len(), 3);
}
