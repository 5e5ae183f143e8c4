// Readers for the DATEX II documents the traffic feed publishes: the predefined location set,
// and the elaborated traffic data that refers to it.
use std::io::Read;
use std::path::Path;

use xml::reader::{EventReader, XmlEvent};

use super::config_utils;
use super::error::Result;
use super::location::{MeasurementKind, Observation, RawLocation};


/// Reads every predefined location in a location document, in document order.
pub fn read_locations(path: &Path) -> Result<Vec<RawLocation>> {
    let parser = config_utils::xml_parser_from_path(path)?;
    let locations = collect_locations(parser)?;
    log::info!("Read {} locations from {}", locations.len(), path.display());
    Ok(locations)
}

pub fn parse_locations_xml<R: Read>(source: R) -> Result<Vec<RawLocation>> {
    collect_locations(EventReader::new(source))
}

fn collect_locations<R: Read>(parser: EventReader<R>) -> Result<Vec<RawLocation>> {
    let mut locations = vec![];
    let mut stack: Vec<String> = vec![];
    // the stack depth at which the current location record began
    let mut record_depth = None;
    let mut current = RawLocation::default();

    for event in parser {
        match event? {
            XmlEvent::StartElement{name, attributes, ..} => {
                let is_record = name.local_name == "predefinedLocation" &&
                    stack.last().map(|ss| ss == "predefinedLocationSet").unwrap_or(false);
                stack.push(name.local_name);
                if is_record && record_depth.is_none() {
                    record_depth = Some(stack.len());
                    current = RawLocation {
                        id: config_utils::get_xml_attribute_value(&attributes, "id"),
                        ..RawLocation::default()
                    };
                }
            }
            XmlEvent::Characters(text) => {
                if record_depth.is_some() {
                    set_coordinate(&mut current, &stack, text);
                }
            }
            XmlEvent::EndElement{..} => {
                if record_depth == Some(stack.len()) {
                    locations.push(std::mem::take(&mut current));
                    record_depth = None;
                }
                stack.pop();
            }
            XmlEvent::EndDocument => break,
            _ => (),
        }
    }
    Ok(locations)
}

/// Stores `text` in the matching field if the stack ends in
/// to|from / pointCoordinates / longitude|latitude.
fn set_coordinate(location: &mut RawLocation, stack: &[String], text: String) {
    if stack.len() < 3 {
        return;
    }
    let tail = &stack[stack.len() - 3..];
    if tail[1] != "pointCoordinates" {
        return;
    }
    let field = match (tail[0].as_str(), tail[2].as_str()) {
        ("to", "longitude") => &mut location.to_longitude,
        ("to", "latitude") => &mut location.to_latitude,
        ("from", "longitude") => &mut location.from_longitude,
        ("from", "latitude") => &mut location.from_latitude,
        _ => return,
    };
    *field = Some(text);
}


/// Reads the readings of one kind from a traffic data document.  Readings whose value element
/// doesn't hold a number are kept as "no data".
pub fn read_observations(path: &Path, kind: MeasurementKind) -> Result<Vec<Observation>> {
    let parser = config_utils::xml_parser_from_path(path)?;
    let observations = collect_observations(parser, kind)?;
    log::info!("Read {} {:?} observations from {}", observations.len(), kind, path.display());
    Ok(observations)
}

pub fn parse_observations_xml<R: Read>(source: R, kind: MeasurementKind)
                                       -> Result<Vec<Observation>> {
    collect_observations(EventReader::new(source), kind)
}

#[derive(Default)]
struct ElaboratedData {
    data_type: Option<String>,
    location_id: Option<String>,
    value_text: Option<String>,
}

fn collect_observations<R: Read>(parser: EventReader<R>, kind: MeasurementKind)
                                 -> Result<Vec<Observation>> {
    let mut observations = vec![];
    let mut stack: Vec<String> = vec![];
    let mut current: Option<ElaboratedData> = None;
    // the stack depth of the value element we're inside, if any
    let mut value_depth = None;

    for event in parser {
        match event? {
            XmlEvent::StartElement{name, attributes, ..} => {
                let local_name = name.local_name;
                if local_name == "elaboratedData" {
                    current = Some(ElaboratedData::default());
                }
                if let Some(data) = &mut current {
                    if local_name == "basicDataValue" {
                        data.data_type = config_utils::get_xml_attribute_value(&attributes,
                                                                               "type");
                    } else if local_name == kind.value_element() &&
                              stack.last().map(|ss| ss == "basicDataValue").unwrap_or(false) {
                        value_depth = Some(stack.len() + 1);
                        data.value_text.get_or_insert_with(String::new);
                    }
                }
                stack.push(local_name);
            }
            XmlEvent::Characters(text) => {
                if let Some(data) = &mut current {
                    if stack.last().map(|ss| ss == "predefinedLocationReference")
                        .unwrap_or(false) {
                        data.location_id = Some(String::from(text.trim()));
                    } else if value_depth.is_some() {
                        if let Some(value_text) = &mut data.value_text {
                            value_text.push_str(text.trim());
                        }
                    }
                }
            }
            XmlEvent::EndElement{name} => {
                if value_depth == Some(stack.len()) {
                    value_depth = None;
                }
                stack.pop();
                if name.local_name == "elaboratedData" {
                    if let Some(data) = current.take() {
                        if let Some(obs) = to_observation(data, kind) {
                            observations.push(obs);
                        }
                    }
                }
            }
            XmlEvent::EndDocument => break,
            _ => (),
        }
    }
    Ok(observations)
}

fn to_observation(data: ElaboratedData, kind: MeasurementKind) -> Option<Observation> {
    let is_kind = data.data_type.as_deref()
        .map(|dt| dt.rsplit(':').next() == Some(kind.data_type()))
        .unwrap_or(false);
    if ! is_kind {
        return None;
    }
    let location_id = data.location_id?;
    // no value element at all means this record doesn't report this measurement
    let value_text = data.value_text?;
    let value = value_text.parse::<f64>().ok().filter(|vv| vv.is_finite());
    Some(Observation{location_id, value})
}


#[cfg(test)]
mod tests {
    use std::io::Write;
    use super::*;
    use super::super::location::{extract_endpoints, extract_identifier};
    use super::super::GeoPoint;

    static LOCATIONS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d2LogicalModel xmlns="http://datex2.eu/schema/1_0/1_0"
                xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <payloadPublication xsi:type="PredefinedLocationsPublication">
    <predefinedLocationSet id="NTCC_DCN">
      <predefinedLocation id="LINK_1">
        <predefinedLocationName><value lang="en">M1 J19-J20</value></predefinedLocationName>
        <predefinedLocation xsi:type="Linear">
          <tpeglinearLocation>
            <to xsi:type="TPEGNonJunctionPoint">
              <pointCoordinates><latitude>52.41</latitude><longitude>-1.17</longitude></pointCoordinates>
            </to>
            <from xsi:type="TPEGNonJunctionPoint">
              <pointCoordinates><latitude>52.40</latitude><longitude>-1.18</longitude></pointCoordinates>
            </from>
          </tpeglinearLocation>
        </predefinedLocation>
      </predefinedLocation>
      <predefinedLocation id="LINK_2">
        <predefinedLocation xsi:type="Linear">
          <tpeglinearLocation>
            <to><pointCoordinates><latitude>52.42</latitude></pointCoordinates></to>
            <from><pointCoordinates><latitude>52.41</latitude><longitude>-1.17</longitude></pointCoordinates></from>
          </tpeglinearLocation>
        </predefinedLocation>
      </predefinedLocation>
    </predefinedLocationSet>
  </payloadPublication>
</d2LogicalModel>
"#;

    static TRAFFIC_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d2LogicalModel xmlns="http://datex2.eu/schema/1_0/1_0"
                xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <payloadPublication xsi:type="ElaboratedDataPublication">
    <elaboratedData>
      <basicDataValue xsi:type="TrafficFlow">
        <affectedLocation><locationContainedInGroup>
          <predefinedLocationReference>LINK_1</predefinedLocationReference>
        </locationContainedInGroup></affectedLocation>
        <vehicleFlow>1200</vehicleFlow>
      </basicDataValue>
    </elaboratedData>
    <elaboratedData>
      <basicDataValue xsi:type="TrafficSpeed">
        <affectedLocation><locationContainedInGroup>
          <predefinedLocationReference>LINK_1</predefinedLocationReference>
        </locationContainedInGroup></affectedLocation>
        <averageVehicleSpeed>97.5</averageVehicleSpeed>
      </basicDataValue>
    </elaboratedData>
    <elaboratedData>
      <basicDataValue xsi:type="TrafficFlow">
        <affectedLocation><locationContainedInGroup>
          <predefinedLocationReference>LINK_2</predefinedLocationReference>
        </locationContainedInGroup></affectedLocation>
        <vehicleFlow></vehicleFlow>
      </basicDataValue>
    </elaboratedData>
    <elaboratedData>
      <basicDataValue xsi:type="TrafficFlow">
        <affectedLocation><locationContainedInGroup>
          <predefinedLocationReference>LINK_3</predefinedLocationReference>
        </locationContainedInGroup></affectedLocation>
      </basicDataValue>
    </elaboratedData>
  </payloadPublication>
</d2LogicalModel>
"#;

    #[test]
    fn test_parse_locations_xml() {
        let raws = parse_locations_xml(LOCATIONS_XML.as_bytes()).unwrap();
        assert_eq!(raws.len(), 2);

        assert_eq!(extract_identifier(&raws[0]).unwrap(), "LINK_1");
        let (to, from) = extract_endpoints(&raws[0]).unwrap();
        assert_eq!(to, GeoPoint::new(-1.17, 52.41));
        assert_eq!(from, GeoPoint::new(-1.18, 52.40));

        // the second location has no "to" longitude
        assert_eq!(extract_identifier(&raws[1]).unwrap(), "LINK_2");
        assert_eq!(raws[1].to_longitude, None);
        assert!(extract_endpoints(&raws[1]).is_err());
    }

    #[test]
    fn test_parse_observations_xml() {
        let flows = parse_observations_xml(TRAFFIC_XML.as_bytes(), MeasurementKind::Flow)
            .unwrap();
        assert_eq!(flows, vec![
            Observation::new("LINK_1", Some(1200.)),
            Observation::new("LINK_2", None),
        ]);

        let speeds = parse_observations_xml(TRAFFIC_XML.as_bytes(), MeasurementKind::Speed)
            .unwrap();
        assert_eq!(speeds, vec![Observation::new("LINK_1", Some(97.5))]);

        let occupancies = parse_observations_xml(TRAFFIC_XML.as_bytes(),
                                                 MeasurementKind::Occupancy).unwrap();
        assert!(occupancies.is_empty());
    }

    #[test]
    fn test_read_from_files() {
        let mut loc_file = tempfile::NamedTempFile::new().unwrap();
        loc_file.write_all(LOCATIONS_XML.as_bytes()).unwrap();
        loc_file.flush().unwrap();
        assert_eq!(read_locations(loc_file.path()).unwrap().len(), 2);

        let mut traffic_file = tempfile::NamedTempFile::new().unwrap();
        traffic_file.write_all(TRAFFIC_XML.as_bytes()).unwrap();
        traffic_file.flush().unwrap();
        assert_eq!(read_observations(traffic_file.path(), MeasurementKind::Flow).unwrap().len(),
                   2);

        assert!(read_locations(Path::new("/nonexistent/locations.xml")).is_err());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(parse_locations_xml("<a><b></a>".as_bytes()).is_err());
    }
}
