use std::collections::BTreeMap;
use std::sync::Arc;

use dicom::dictionary_std::tags;
use dicom::object::{DefaultDicomObject, OpenFileOptions};

use super::{DecodeHandle, Entry, ObjectRecord, SeriesTag};
use crate::utils::{clean_text, parse_integer_string};

const PREAMBLE_LEN: usize = 128;
const DICM_MAGIC: &[u8] = b"DICM";

/// Attribute values recovered from one object, keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<SeriesTag, String>,
}

impl Attributes {
    pub fn insert(&mut self, tag: SeriesTag, value: impl Into<String>) {
        self.values.insert(tag, value.into());
    }

    pub fn get(&self, tag: SeriesTag) -> Option<&str> {
        self.values.get(&tag).map(String::as_str)
    }
}

/// Looks up named attributes in a raw DICOM stream (starting at `DICM`).
pub trait AttributeSource: Send + Sync {
    /// Returns `None` when the stream cannot be read as an object at all.
    fn read_attributes(&self, stream: &[u8]) -> Option<Attributes>;
}

/// Attribute lookup backed by the `dicom` crate's standard dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomAttributeSource;

impl AttributeSource for DicomAttributeSource {
    fn read_attributes(&self, stream: &[u8]) -> Option<Attributes> {
        let object = match OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .from_reader(stream)
        {
            Ok(object) => object,
            Err(err) => {
                log::warn!("Unable to read DICOM header: {err}");
                return None;
            }
        };

        let mut attributes = Attributes::default();
        for tag in SeriesTag::ALL {
            if let Some(value) = attribute_text(&object, tag.keyword()) {
                attributes.insert(tag, value);
            }
        }
        Some(attributes)
    }
}

/// Turns entries into records. Never fails: anything it cannot recognize
/// becomes a record carrying sentinel values.
#[derive(Clone)]
pub struct MetadataReader {
    source: Arc<dyn AttributeSource>,
}

impl MetadataReader {
    pub fn new(source: Arc<dyn AttributeSource>) -> Self {
        Self { source }
    }

    pub fn read(&self, entry: Entry) -> ObjectRecord {
        let Some(offset) = locate_dicom_stream(entry.bytes()) else {
            log::debug!("{}: no DICOM signature, keeping as unrecognized", entry.name());
            return ObjectRecord::unrecognized(entry);
        };

        let Some(attributes) = self.source.read_attributes(&entry.bytes()[offset..]) else {
            log::debug!("{}: DICOM header unreadable, keeping as unrecognized", entry.name());
            return ObjectRecord::unrecognized(entry);
        };

        let series_id = attributes
            .get(SeriesTag::SeriesInstanceUid)
            .and_then(clean_text);
        let description = attributes
            .get(SeriesTag::SeriesDescription)
            .and_then(clean_text);
        let instance_number = attributes
            .get(SeriesTag::InstanceNumber)
            .and_then(|raw| {
                let parsed = parse_integer_string(raw);
                if parsed.is_none() {
                    log::warn!("{}: ignoring malformed InstanceNumber `{raw}`", entry.name());
                }
                parsed
            });

        log::debug!(
            "{}: series={:?} instance={:?}",
            entry.name(),
            series_id,
            instance_number
        );

        ObjectRecord::new(
            entry,
            series_id,
            description,
            instance_number,
            true,
            DecodeHandle::at(offset),
        )
    }
}

/// Finds the `DICM` magic either after the standard preamble or at offset 0.
pub fn locate_dicom_stream(bytes: &[u8]) -> Option<usize> {
    if bytes.get(PREAMBLE_LEN..PREAMBLE_LEN + DICM_MAGIC.len()) == Some(DICM_MAGIC) {
        Some(PREAMBLE_LEN)
    } else if bytes.starts_with(DICM_MAGIC) {
        Some(0)
    } else {
        None
    }
}

pub(crate) fn attribute_text(object: &DefaultDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .and_then(|value| clean_text(&value))
}
