use std::sync::Arc;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";

/// How an uploaded buffer should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Single,
    Archive,
}

impl InputKind {
    /// Classifies an upload by ZIP signature first, then by file extension.
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_LOCAL_HEADER) || bytes.starts_with(ZIP_EMPTY_ARCHIVE) {
            return Self::Archive;
        }

        let is_zip_name = file_name
            .map(|name| name.trim().to_ascii_lowercase().ends_with(".zip"))
            .unwrap_or(false);
        if is_zip_name {
            Self::Archive
        } else {
            Self::Single
        }
    }
}

/// One named binary member of an upload.
#[derive(Debug, Clone)]
pub struct Entry {
    name: String,
    bytes: Arc<[u8]>,
}

impl Entry {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
