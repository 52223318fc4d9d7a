use std::io::{Cursor, Read};
use std::sync::Arc;

use thiserror::Error;
use zip::ZipArchive;

use crate::error::ExtractionError;
use crate::model::{Entry, InputKind};

/// Name given to the entry of a non-archive upload when none is known.
pub const SINGLE_ENTRY_NAME: &str = "upload";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ArchiveFault(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub index: usize,
    pub name: String,
    pub is_dir: bool,
}

/// An opened container: member listing plus member reads.
pub trait ArchiveMembers {
    /// Every member, directories included, in container order.
    fn members(&mut self) -> Result<Vec<MemberInfo>, ArchiveFault>;

    fn read_member(&mut self, index: usize) -> Result<Vec<u8>, ArchiveFault>;
}

pub trait ArchiveReader: Send + Sync {
    /// Parses the container index. Fails when the index is unreadable.
    fn open<'a>(&self, data: &'a [u8]) -> Result<Box<dyn ArchiveMembers + 'a>, ArchiveFault>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveReader;

struct ZipMembers<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl ArchiveReader for ZipArchiveReader {
    fn open<'a>(&self, data: &'a [u8]) -> Result<Box<dyn ArchiveMembers + 'a>, ArchiveFault> {
        let archive =
            ZipArchive::new(Cursor::new(data)).map_err(|err| ArchiveFault(err.to_string()))?;
        Ok(Box::new(ZipMembers { archive }))
    }
}

impl ArchiveMembers for ZipMembers<'_> {
    fn members(&mut self) -> Result<Vec<MemberInfo>, ArchiveFault> {
        (0..self.archive.len())
            .map(|index| {
                let file = self
                    .archive
                    .by_index_raw(index)
                    .map_err(|err| ArchiveFault(format!("member #{index}: {err}")))?;
                Ok(MemberInfo {
                    index,
                    name: file.name().to_string(),
                    is_dir: file.is_dir(),
                })
            })
            .collect()
    }

    fn read_member(&mut self, index: usize) -> Result<Vec<u8>, ArchiveFault> {
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|err| ArchiveFault(format!("member #{index}: {err}")))?;
        let mut bytes = Vec::with_capacity(file.size().min(64 * 1024 * 1024) as usize);
        file.read_to_end(&mut bytes)
            .map_err(|err| ArchiveFault(format!("{}: {err}", file.name())))?;
        Ok(bytes)
    }
}

/// Splits an upload into named entries.
///
/// A single upload is always exactly one entry, named `name` or
/// [`SINGLE_ENTRY_NAME`]. An archive yields every non-directory member in
/// container order, with no filtering by name or content; `name` is unused.
pub fn extract(
    buffer: Arc<[u8]>,
    kind: InputKind,
    name: Option<&str>,
    reader: &dyn ArchiveReader,
) -> Result<Vec<Entry>, ExtractionError> {
    match kind {
        InputKind::Single => {
            let name = name.unwrap_or(SINGLE_ENTRY_NAME);
            log::debug!("Single upload `{name}` of {} bytes", buffer.len());
            Ok(vec![Entry::new(name, buffer)])
        }
        InputKind::Archive => extract_archive(&buffer, reader),
    }
}

fn extract_archive(
    buffer: &[u8],
    reader: &dyn ArchiveReader,
) -> Result<Vec<Entry>, ExtractionError> {
    let corrupt = |fault: ArchiveFault| {
        log::warn!("Archive rejected: {fault}");
        ExtractionError::Corrupt { reason: fault.0 }
    };

    let mut archive = reader.open(buffer).map_err(corrupt)?;
    let members = archive.members().map_err(corrupt)?;

    let mut entries = Vec::with_capacity(members.len());
    for member in members.into_iter().filter(|member| !member.is_dir) {
        let bytes = archive.read_member(member.index).map_err(corrupt)?;
        log::debug!("Extracted `{}` ({} bytes)", member.name, bytes.len());
        entries.push(Entry::new(member.name, bytes));
    }

    if entries.is_empty() {
        log::warn!("Archive parsed but holds no file members");
        return Err(ExtractionError::Empty);
    }

    log::info!("Extracted {} archive member(s)", entries.len());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_of(members: &[(&str, Option<&[u8]>)]) -> Arc<[u8]> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in members {
            match contents {
                Some(bytes) => {
                    writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                    writer.write_all(bytes).unwrap();
                }
                None => writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap(),
            }
        }
        Arc::from(writer.finish().unwrap().into_inner())
    }

    #[test]
    fn single_upload_is_one_entry() {
        let buffer: Arc<[u8]> = Arc::from(b"whatever".to_vec());
        let entries = extract(buffer, InputKind::Single, None, &ZipArchiveReader).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), SINGLE_ENTRY_NAME);
        assert_eq!(entries[0].bytes(), b"whatever");
    }

    #[test]
    fn single_upload_is_named_after_the_file() {
        let buffer: Arc<[u8]> = Arc::from(b"whatever".to_vec());
        let entries =
            extract(buffer, InputKind::Single, Some("scan.dcm"), &ZipArchiveReader).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "scan.dcm");
    }

    #[test]
    fn archive_members_ignore_the_upload_name() {
        let buffer = zip_of(&[("inner.dcm", Some(&b"one"[..]))]);
        let entries =
            extract(buffer, InputKind::Archive, Some("study.zip"), &ZipArchiveReader).unwrap();
        let names: Vec<&str> = entries.iter().map(Entry::name).collect();
        assert_eq!(names, ["inner.dcm"]);
    }

    #[test]
    fn empty_single_upload_still_yields_an_entry() {
        let entries =
            extract(Arc::from(Vec::new()), InputKind::Single, None, &ZipArchiveReader).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_empty());
    }

    #[test]
    fn archive_members_keep_container_order_and_skip_directories() {
        let buffer = zip_of(&[
            ("z-last-alphabetically.dcm", Some(&b"one"[..])),
            ("series/", None),
            ("series/readme.txt", Some(&b"two"[..])),
            ("a.dcm", Some(&b"three"[..])),
        ]);
        let entries = extract(buffer, InputKind::Archive, None, &ZipArchiveReader).unwrap();
        let names: Vec<&str> = entries.iter().map(Entry::name).collect();
        assert_eq!(
            names,
            ["z-last-alphabetically.dcm", "series/readme.txt", "a.dcm"]
        );
        assert_eq!(entries[2].bytes(), b"three");
    }

    #[test]
    fn garbage_archive_is_corrupt() {
        let err = extract(
            Arc::from(b"definitely not a zip".to_vec()),
            InputKind::Archive,
            None,
            &ZipArchiveReader,
        )
        .unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }

    #[test]
    fn archive_without_files_is_empty() {
        let only_dirs = zip_of(&[("a/", None), ("a/b/", None)]);
        assert_eq!(
            extract(only_dirs, InputKind::Archive, None, &ZipArchiveReader).unwrap_err(),
            ExtractionError::Empty
        );

        let nothing = zip_of(&[]);
        assert_eq!(
            extract(nothing, InputKind::Archive, None, &ZipArchiveReader).unwrap_err(),
            ExtractionError::Empty
        );
    }
}
