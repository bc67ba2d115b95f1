use geo::MultiPolygon;

/// A polling district as produced by a jurisdiction's mapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictRecord {
    pub internal_council_id: String,
    pub name: String,
    pub area: Option<MultiPolygon<f64>>, // Derived from the record geometry when unset
    pub polling_station_id: String,
    pub council_id: Option<String>,
}

impl DistrictRecord {
    pub fn new(internal_council_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            internal_council_id: internal_council_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_station(mut self, polling_station_id: impl Into<String>) -> Self {
        self.polling_station_id = polling_station_id.into();
        self
    }

    pub fn with_area(mut self, area: MultiPolygon<f64>) -> Self {
        self.area = Some(area);
        self
    }
}

/// A polling district ready to persist. `area` is in the store's spatial reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PollingDistrict {
    pub council_id: String,
    pub internal_council_id: String,
    pub name: String,
    pub area: Option<MultiPolygon<f64>>,
    pub polling_station_id: String,
}

impl PollingDistrict {
    pub(crate) fn from_record(record: DistrictRecord, default_council: &str) -> Self {
        Self {
            council_id: record.council_id.unwrap_or_else(|| default_council.to_string()),
            internal_council_id: record.internal_council_id,
            name: record.name,
            area: record.area,
            polling_station_id: record.polling_station_id,
        }
    }
}
