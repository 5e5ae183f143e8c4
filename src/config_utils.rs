use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use xml::reader::EventReader;
use xml::attribute::OwnedAttribute;

use super::error::Result;


/// Opens the file at `path` for streaming xml parsing.
pub fn xml_parser_from_path(path: &Path) -> Result<EventReader<BufReader<File>>> {
    Ok(EventReader::new(BufReader::new(File::open(path)?)))
}

/// The value of the attribute with this local name, ignoring any namespace prefix.  DATEX II
/// feeds write the type attribute as `xsi:type`.
pub fn get_xml_attribute_value(attributes: &[OwnedAttribute], local_name: &str)
                               -> Option<String> {
    attributes.iter()
        .find(|attr| attr.name.local_name == local_name)
        .map(|attr| attr.value.clone())
}

/// Paths in a config are relative to the config's own directory, unless they're absolute.
pub fn str_to_absolute_path(path_str: &str, config_dir: &Path) -> PathBuf {
    let path = Path::new(path_str);
    match path.is_absolute() {
        true => path.to_path_buf(),
        false => config_dir.join(path),
    }
}
