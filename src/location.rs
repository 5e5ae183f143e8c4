// Location records as delivered by the feed, and the observations attached to them.
use std::collections::HashMap;
use std::path::Path;

use super::error::{Error, Result};
use super::geometry::{GeoPoint, LineSegment};


/// A location as it comes off the wire.  Nothing in here has been validated yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLocation {
    pub id: Option<String>,
    pub to_longitude: Option<String>,
    pub to_latitude: Option<String>,
    pub from_longitude: Option<String>,
    pub from_latitude: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub id: String,
    pub to: GeoPoint,
    pub from: GeoPoint,
}

impl Location {
    pub fn new(id: &str, from: GeoPoint, to: GeoPoint) -> Location {
        Location{id: String::from(id), to, from}
    }

    pub fn segment(&self) -> LineSegment {
        LineSegment::new(self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location_id: String,
    /// None is an explicit "no data" reading, which is not the same as a measured zero.
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(location_id: &str, value: Option<f64>) -> Observation {
        Observation{location_id: String::from(location_id), value}
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Measured(f64),
    Absent,
}

impl Measurement {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measurement::Measured(val) => Some(*val),
            Measurement::Absent => None,
        }
    }

    pub fn value_or(&self, missing_default: f64) -> f64 {
        self.value().unwrap_or(missing_default)
    }
}

/// Which of the feed's measurements an observation list carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    Flow,
    Occupancy,
    Speed,
}

impl MeasurementKind {
    pub fn from_name(name: &str) -> Option<MeasurementKind> {
        match name {
            "flow" => Some(MeasurementKind::Flow),
            "occupancy" => Some(MeasurementKind::Occupancy),
            "speed" => Some(MeasurementKind::Speed),
            _ => None,
        }
    }

    /// The xsi:type of the basicDataValue element carrying this measurement.
    pub fn data_type(&self) -> &'static str {
        match self {
            MeasurementKind::Flow => "TrafficFlow",
            MeasurementKind::Occupancy => "TrafficConcentration",
            MeasurementKind::Speed => "TrafficSpeed",
        }
    }

    /// The element inside the basicDataValue that holds the reading.
    pub fn value_element(&self) -> &'static str {
        match self {
            MeasurementKind::Flow => "vehicleFlow",
            MeasurementKind::Occupancy => "occupancy",
            MeasurementKind::Speed => "averageVehicleSpeed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorPolicy {
    /// Log the bad record and carry on with the rest of the batch.
    Skip,
    Abort,
}

impl ParseErrorPolicy {
    pub fn from_name(name: &str) -> Option<ParseErrorPolicy> {
        match name {
            "skip" => Some(ParseErrorPolicy::Skip),
            "abort" => Some(ParseErrorPolicy::Abort),
            _ => None,
        }
    }
}


fn parse_coordinate(field: &Option<String>, name: &str, record: &str) -> Result<f64> {
    let text = match field {
        Some(text) => text.trim(),
        None => return Err(Error::parse(record, &format!("missing {}", name))),
    };
    match text.parse::<f64>() {
        Ok(val) if val.is_finite() => Ok(val),
        _ => Err(Error::parse(record, &format!("{} is not a number: {:?}", name, text))),
    }
}

/// Returns the "to" and "from" points of a location, in that order.
pub fn extract_endpoints(raw: &RawLocation) -> Result<(GeoPoint, GeoPoint)> {
    let record = raw.id.as_deref().unwrap_or("<unidentified>");
    let to_lon = parse_coordinate(&raw.to_longitude, "to longitude", record)?;
    let to_lat = parse_coordinate(&raw.to_latitude, "to latitude", record)?;
    let from_lon = parse_coordinate(&raw.from_longitude, "from longitude", record)?;
    let from_lat = parse_coordinate(&raw.from_latitude, "from latitude", record)?;
    Ok((GeoPoint::new(to_lon, to_lat), GeoPoint::new(from_lon, from_lat)))
}

pub fn extract_identifier(raw: &RawLocation) -> Result<String> {
    match &raw.id {
        Some(id) if ! id.trim().is_empty() => Ok(String::from(id.trim())),
        _ => Err(Error::parse("<unidentified>", "location has no id")),
    }
}

pub fn extract_location(raw: &RawLocation) -> Result<Location> {
    let id = extract_identifier(raw)?;
    let (to, from) = extract_endpoints(raw)?;
    Ok(Location{id, to, from})
}

/// Parses a batch of raw records, keeping their order.  What happens to a bad record depends on
/// `policy`.
pub fn parse_locations(raws: &[RawLocation], policy: ParseErrorPolicy) -> Result<Vec<Location>> {
    let mut locations = Vec::with_capacity(raws.len());
    for (ii, raw) in raws.iter().enumerate() {
        match extract_location(raw) {
            Ok(location) => locations.push(location),
            Err(err) => match policy {
                ParseErrorPolicy::Abort => return Err(err),
                ParseErrorPolicy::Skip => log::warn!("Skipping location record {}: {}", ii, err),
            },
        }
    }
    if locations.len() < raws.len() {
        log::info!("Parsed {} of {} location records", locations.len(), raws.len());
    }
    Ok(locations)
}

/// Finds the reading for a location by scanning the observations.  If the location is observed
/// more than once, the last observation wins.
pub fn lookup_observation(location_id: &str, observations: &[Observation]) -> Measurement {
    let mut found = None;
    for obs in observations {
        if obs.location_id == location_id {
            found = Some(obs.value);
        }
    }
    match found {
        Some(Some(val)) => Measurement::Measured(val),
        _ => Measurement::Absent,
    }
}

/// Hashed equivalent of `lookup_observation`, for looking up many locations at once.
pub struct ObservationIndex {
    values: HashMap<String, Option<f64>>,
}

impl ObservationIndex {
    pub fn new(observations: &[Observation]) -> ObservationIndex {
        let values = observations.iter()
            .map(|obs| (obs.location_id.clone(), obs.value))
            .collect();
        ObservationIndex{values}
    }

    pub fn lookup(&self, location_id: &str) -> Measurement {
        match self.values.get(location_id) {
            Some(Some(val)) => Measurement::Measured(*val),
            _ => Measurement::Absent,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Reads observations from a csv file with "id" and "value" columns.  Empty values are "no data".
pub fn observations_from_csv(path: &Path) -> Result<Vec<Observation>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut observations = vec![];
    for result in reader.deserialize() {
        let row: HashMap<String, String> = result?;
        let id = match row.get("id") {
            Some(id) => id.trim(),
            None => return Err(Error::parse("<csv row>", "no id column")),
        };
        let value = row.get("value").and_then(|vv| vv.trim().parse::<f64>().ok());
        observations.push(Observation::new(id, value));
    }
    Ok(observations)
}

/// Keeps the locations whose segment passes within `radius` of `centre`.
pub fn localise(locations: &[Location], centre: &GeoPoint, radius: f64) -> Vec<Location> {
    locations.iter()
        .filter(|loc| centre.distance_to_segment(&loc.segment()) <= radius)
        .cloned()
        .collect()
}


#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;

    fn raw(id: &str, to: (&str, &str), from: (&str, &str)) -> RawLocation {
        RawLocation {
            id: Some(String::from(id)),
            to_longitude: Some(String::from(to.0)),
            to_latitude: Some(String::from(to.1)),
            from_longitude: Some(String::from(from.0)),
            from_latitude: Some(String::from(from.1)),
        }
    }

    #[test]
    fn test_extract_endpoints() {
        let rr = raw("L1", ("-1.5", "52.25"), (" -1.25 ", "52"));
        let (to, from) = extract_endpoints(&rr).unwrap();
        assert_eq!(to, GeoPoint::new(-1.5, 52.25));
        assert_eq!(from, GeoPoint::new(-1.25, 52.));

        let mut missing = rr.clone();
        missing.from_latitude = None;
        assert!(matches!(extract_endpoints(&missing), Err(Error::Parse{..})));

        let mut garbage = rr.clone();
        garbage.to_longitude = Some(String::from("west"));
        assert!(matches!(extract_endpoints(&garbage), Err(Error::Parse{..})));

        let mut nan = rr.clone();
        nan.to_latitude = Some(String::from("NaN"));
        assert!(extract_endpoints(&nan).is_err());
    }

    #[test]
    fn test_extract_identifier() {
        let rr = raw(" L7 ", ("0", "0"), ("1", "1"));
        assert_eq!(extract_identifier(&rr).unwrap(), "L7");

        let mut blank = rr.clone();
        blank.id = Some(String::from("  "));
        assert!(extract_identifier(&blank).is_err());
        blank.id = None;
        assert!(extract_identifier(&blank).is_err());
    }

    #[test]
    fn test_lookup_observation() {
        let observations = vec![
            Observation::new("A", Some(3.)),
            Observation::new("B", Some(0.)),
            Observation::new("C", None),
            Observation::new("A", Some(7.)),
        ];
        // last match wins
        assert_eq!(lookup_observation("A", &observations), Measurement::Measured(7.));
        // a measured zero is kept distinct from no data
        assert_eq!(lookup_observation("B", &observations), Measurement::Measured(0.));
        assert_eq!(lookup_observation("C", &observations), Measurement::Absent);
        assert_eq!(lookup_observation("D", &observations), Measurement::Absent);
        assert_eq!(lookup_observation("D", &observations).value_or(2.5), 2.5);

        let index = ObservationIndex::new(&observations);
        for id in &["A", "B", "C", "D"] {
            assert_eq!(index.lookup(id), lookup_observation(id, &observations));
        }
    }

    #[test]
    fn test_parse_locations_policy() {
        let mut bad = raw("bad", ("0", "0"), ("1", "1"));
        bad.to_latitude = None;
        let raws = vec![
            raw("one", ("0", "0"), ("1", "1")),
            bad,
            raw("two", ("1", "1"), ("2", "2")),
        ];
        let locations = parse_locations(&raws, ParseErrorPolicy::Skip).unwrap();
        let ids: Vec<&str> = locations.iter().map(|ll| ll.id.as_str()).collect();
        assert_eq!(ids, vec!["one", "two"]);

        match parse_locations(&raws, ParseErrorPolicy::Abort) {
            Err(Error::Parse{record, ..}) => assert_eq!(record, "bad"),
            _ => panic!("expected a parse error"),
        }
    }

    #[test]
    fn test_observations_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,value").unwrap();
        writeln!(file, "L1,12.5").unwrap();
        writeln!(file, "L2,").unwrap();
        writeln!(file, "L3,0").unwrap();
        file.flush().unwrap();

        let observations = observations_from_csv(file.path()).unwrap();
        assert_eq!(observations, vec![
            Observation::new("L1", Some(12.5)),
            Observation::new("L2", None),
            Observation::new("L3", Some(0.)),
        ]);
    }

    #[test]
    fn test_localise() {
        let locations = vec![
            Location::new("near", GeoPoint::new(-1., 0.), GeoPoint::new(1., 0.)),
            Location::new("far", GeoPoint::new(5., 5.), GeoPoint::new(6., 5.)),
        ];
        let kept = localise(&locations, &GeoPoint::new(0., 0.5), 1.);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "near");
    }
}
