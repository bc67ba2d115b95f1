use geo::Point;

/// A polling station as produced by a jurisdiction's mapper.
///
/// `council_id` and `location` may be left unset; the collector fills in the
/// importing council and, for shapefile sources, derives the location from
/// the record geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRecord {
    pub internal_council_id: String,
    pub postcode: String,
    pub address: String,
    pub location: Option<Point<f64>>,
    pub council_id: Option<String>,
    pub polling_district_id: String, // District served, when the source names it
}

impl StationRecord {
    pub fn new(internal_council_id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            internal_council_id: internal_council_id.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = postcode.into();
        self
    }

    pub fn with_location(mut self, location: Point<f64>) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_district(mut self, polling_district_id: impl Into<String>) -> Self {
        self.polling_district_id = polling_district_id.into();
        self
    }
}

/// A polling station ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingStation {
    pub council_id: String,
    pub internal_council_id: String,
    pub postcode: String,
    pub address: String,
    pub location: Option<Point<f64>>,
    pub polling_district_id: String,
}

impl PollingStation {
    pub(crate) fn from_record(record: StationRecord, default_council: &str) -> Self {
        Self {
            council_id: record.council_id.unwrap_or_else(|| default_council.to_string()),
            internal_council_id: record.internal_council_id,
            postcode: record.postcode,
            address: record.address,
            location: record.location,
            polling_district_id: record.polling_district_id,
        }
    }
}
