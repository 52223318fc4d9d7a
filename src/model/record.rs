use super::Entry;

pub const UNKNOWN_SERIES_ID: &str = "unknown-series";
pub const UNKNOWN_SERIES_DESCRIPTION: &str = "Unknown Series";
pub const DEFAULT_INSTANCE_NUMBER: i64 = 0;

/// The three attributes a record is identified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeriesTag {
    SeriesInstanceUid,
    SeriesDescription,
    InstanceNumber,
}

impl SeriesTag {
    pub const ALL: [SeriesTag; 3] = [
        SeriesTag::SeriesInstanceUid,
        SeriesTag::SeriesDescription,
        SeriesTag::InstanceNumber,
    ];

    /// DICOM dictionary keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            SeriesTag::SeriesInstanceUid => "SeriesInstanceUID",
            SeriesTag::SeriesDescription => "SeriesDescription",
            SeriesTag::InstanceNumber => "InstanceNumber",
        }
    }
}

/// Where the DICOM stream (starting at the `DICM` magic) sits inside the entry bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeHandle {
    stream_offset: Option<usize>,
}

impl DecodeHandle {
    pub(crate) fn at(offset: usize) -> Self {
        Self {
            stream_offset: Some(offset),
        }
    }

    pub(crate) fn unrecognized() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct ObjectRecord {
    entry: Entry,
    series_id: String,
    series_description: String,
    instance_number: i64,
    parsed: bool,
    decode_handle: DecodeHandle,
}

impl ObjectRecord {
    /// Builds a record, substituting sentinels for every missing attribute.
    pub fn new(
        entry: Entry,
        series_id: Option<String>,
        series_description: Option<String>,
        instance_number: Option<i64>,
        parsed: bool,
        decode_handle: DecodeHandle,
    ) -> Self {
        Self {
            entry,
            series_id: series_id.unwrap_or_else(|| UNKNOWN_SERIES_ID.to_string()),
            series_description: series_description
                .unwrap_or_else(|| UNKNOWN_SERIES_DESCRIPTION.to_string()),
            instance_number: instance_number.unwrap_or(DEFAULT_INSTANCE_NUMBER),
            parsed,
            decode_handle,
        }
    }

    pub(crate) fn unrecognized(entry: Entry) -> Self {
        Self::new(entry, None, None, None, false, DecodeHandle::unrecognized())
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn series_description(&self) -> &str {
        &self.series_description
    }

    pub fn has_description(&self) -> bool {
        self.series_description != UNKNOWN_SERIES_DESCRIPTION
    }

    pub fn instance_number(&self) -> i64 {
        self.instance_number
    }

    pub fn parsed(&self) -> bool {
        self.parsed
    }

    pub fn decode_handle(&self) -> DecodeHandle {
        self.decode_handle
    }

    /// The DICOM stream without its preamble, if one was located.
    pub fn object_bytes(&self) -> Option<&[u8]> {
        let offset = self.decode_handle.stream_offset?;
        self.entry.bytes().get(offset..)
    }
}
