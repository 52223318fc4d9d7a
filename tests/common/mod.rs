#![allow(dead_code)]

use std::io::{Cursor, Write};

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::dictionary_std::tags;
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const EXPLICIT_VR_LE: &str = "1.2.840.10008.1.2.1";
const SECONDARY_CAPTURE: &str = "1.2.840.10008.5.1.4.1.1.7";

pub enum Samples {
    Unsigned16(Vec<u16>),
    Signed8(Vec<i8>),
}

/// A single MONOCHROME2 frame.
pub struct Frame {
    pub rows: u16,
    pub columns: u16,
    pub samples: Samples,
}

#[derive(Default)]
pub struct ObjectSpec<'a> {
    pub series_uid: Option<&'a str>,
    pub description: Option<&'a str>,
    pub instance_number: Option<&'a str>,
    pub frame: Option<Frame>,
}

pub fn dicom_bytes(fields: ObjectSpec<'_>) -> Vec<u8> {
    let mut object = InMemDicomObject::new_empty();
    object.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(SECONDARY_CAPTURE),
    ));
    object.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from("2.25.1001"),
    ));
    if let Some(uid) = fields.series_uid {
        object.put(DataElement::new(
            tags::SERIES_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(uid),
        ));
    }
    if let Some(description) = fields.description {
        object.put(DataElement::new(
            tags::SERIES_DESCRIPTION,
            VR::LO,
            PrimitiveValue::from(description),
        ));
    }
    if let Some(number) = fields.instance_number {
        object.put(DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(number),
        ));
    }
    if let Some(frame) = fields.frame {
        let us = |tag, value: u16| DataElement::new(tag, VR::US, PrimitiveValue::from(value));
        object.put(us(tags::ROWS, frame.rows));
        object.put(us(tags::COLUMNS, frame.columns));
        object.put(us(tags::SAMPLES_PER_PIXEL, 1));
        object.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        match frame.samples {
            Samples::Unsigned16(samples) => {
                object.put(us(tags::BITS_ALLOCATED, 16));
                object.put(us(tags::BITS_STORED, 16));
                object.put(us(tags::HIGH_BIT, 15));
                object.put(us(tags::PIXEL_REPRESENTATION, 0));
                object.put(DataElement::new(
                    tags::PIXEL_DATA,
                    VR::OW,
                    PrimitiveValue::U16(samples.into()),
                ));
            }
            Samples::Signed8(samples) => {
                let bytes: Vec<u8> = samples.into_iter().map(|value| value as u8).collect();
                object.put(us(tags::BITS_ALLOCATED, 8));
                object.put(us(tags::BITS_STORED, 8));
                object.put(us(tags::HIGH_BIT, 7));
                object.put(us(tags::PIXEL_REPRESENTATION, 1));
                object.put(DataElement::new(
                    tags::PIXEL_DATA,
                    VR::OB,
                    PrimitiveValue::U8(bytes.into()),
                ));
            }
        }
    }

    let file = object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LE)
                .media_storage_sop_class_uid(SECONDARY_CAPTURE)
                .media_storage_sop_instance_uid("2.25.1001"),
        )
        .expect("valid file meta");

    let mut bytes = Vec::new();
    file.write_all(&mut bytes).expect("object serializes");
    bytes
}

pub fn tagged(series_uid: &str, instance_number: &str) -> Vec<u8> {
    dicom_bytes(ObjectSpec {
        series_uid: Some(series_uid),
        description: Some("AX T1"),
        instance_number: Some(instance_number),
        ..ObjectSpec::default()
    })
}

pub fn zip_of(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in members {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("zip member starts");
        writer.write_all(bytes).expect("zip member writes");
    }
    writer.finish().expect("zip finishes").into_inner()
}
