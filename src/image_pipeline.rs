use dicom::object::{DefaultDicomObject, OpenFileOptions};
use dicom::pixeldata::{
    DecodedPixelData, PhotometricInterpretation, PixelDecoder, PlanarConfiguration,
};

use crate::decode::{FrameDecoder, PixelFrame};
use crate::error::DecodeError;
use crate::model::loader::attribute_text;
use crate::model::{DisplayParams, ObjectRecord};

/// Frame decoder backed by the `dicom` crate's pixel data pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomFrameDecoder;

impl FrameDecoder for DicomFrameDecoder {
    fn decode(
        &self,
        record: &ObjectRecord,
        params: &DisplayParams,
    ) -> Result<PixelFrame, DecodeError> {
        let stream = record
            .object_bytes()
            .ok_or_else(|| malformed("no DICOM stream in entry"))?;
        let object = OpenFileOptions::new()
            .from_reader(stream)
            .map_err(|err| malformed(format!("failed to open DICOM object ({err})")))?;
        FrameImagePipeline::render_first_frame(&object, params)
    }
}

pub struct FrameImagePipeline;

impl FrameImagePipeline {
    pub fn render_first_frame(
        object: &DefaultDicomObject,
        params: &DisplayParams,
    ) -> Result<PixelFrame, DecodeError> {
        let decoded = object
            .decode_pixel_data()
            .map_err(|err| malformed(format!("failed to decode pixel data: {err}")))?;

        if decoded.number_of_frames() == 0 {
            return Err(malformed("object holds no frames"));
        }

        Self::frame_to_pixels(object, &decoded, 0, params)
    }

    pub fn frame_to_pixels(
        object: &DefaultDicomObject,
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        params: &DisplayParams,
    ) -> Result<PixelFrame, DecodeError> {
        if frame_idx >= decoded.number_of_frames() {
            return Err(malformed(format!(
                "requested frame {frame_idx}, but only {} frame(s) are available",
                decoded.number_of_frames()
            )));
        }

        let (width, height, rgba) = match decoded.photometric_interpretation() {
            photometric if photometric.is_monochrome() => {
                Self::monochrome_to_rgba(object, decoded, frame_idx, params)
            }
            PhotometricInterpretation::Rgb => Self::rgb_to_rgba(decoded, frame_idx, params),
            other => Self::fallback_to_dynamic(decoded, frame_idx, other.as_str(), params),
        }
        .map_err(malformed)?;

        PixelFrame::new(width, height, rgba)
    }

    fn monochrome_to_rgba(
        object: &DefaultDicomObject,
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        params: &DisplayParams,
    ) -> Result<(u32, u32, Vec<u8>), String> {
        let width = decoded.columns();
        let height = decoded.rows();
        let stored_inverted = matches!(
            decoded.photometric_interpretation(),
            PhotometricInterpretation::Monochrome1
        );
        let invert = stored_inverted != params.invert;
        let rescale = Rescale::from_object(object);
        let signed = attribute_text(object, "PixelRepresentation").as_deref() == Some("1");

        let samples: Vec<f64> = match decoded.bits_allocated() {
            0..=8 if signed => decoded
                .to_vec_frame::<i8>(frame_idx)
                .map_err(materialize)?
                .into_iter()
                .map(f64::from)
                .collect(),
            0..=8 => decoded
                .to_vec_frame::<u8>(frame_idx)
                .map_err(materialize)?
                .into_iter()
                .map(f64::from)
                .collect(),
            9..=16 if signed => decoded
                .to_vec_frame::<i16>(frame_idx)
                .map_err(materialize)?
                .into_iter()
                .map(f64::from)
                .collect(),
            9..=16 => decoded
                .to_vec_frame::<u16>(frame_idx)
                .map_err(materialize)?
                .into_iter()
                .map(f64::from)
                .collect(),
            _ if signed => decoded
                .to_vec_frame::<i32>(frame_idx)
                .map_err(materialize)?
                .into_iter()
                .map(f64::from)
                .collect(),
            _ => decoded
                .to_vec_frame::<u32>(frame_idx)
                .map_err(materialize)?
                .into_iter()
                .map(f64::from)
                .collect(),
        };

        let gray: Vec<u8> = samples
            .into_iter()
            .map(|raw| apply_window(rescale.apply(raw), params, invert))
            .collect();
        Ok((width, height, gray_to_rgba(&gray)))
    }

    fn rgb_to_rgba(
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        params: &DisplayParams,
    ) -> Result<(u32, u32, Vec<u8>), String> {
        let width = decoded.columns();
        let height = decoded.rows();
        let pixel_count = (width * height) as usize;

        let mut rgba = if decoded.bits_allocated() <= 8 {
            let samples = decoded
                .to_vec_frame::<u8>(frame_idx)
                .map_err(|err| format!("Failed to materialize RGB frame: {err}"))?;
            match decoded.planar_configuration() {
                PlanarConfiguration::Standard => rgb_interleaved_to_rgba(&samples)?,
                PlanarConfiguration::PixelFirst => {
                    let samples: Vec<u16> = samples.into_iter().map(u16::from).collect();
                    rgb_planar_to_rgba(&samples, pixel_count, |value| value as u8)?
                }
            }
        } else {
            let samples = decoded
                .to_vec_frame::<u16>(frame_idx)
                .map_err(|err| format!("Failed to materialize RGB frame: {err}"))?;
            let (min, max) = min_max_u16(&samples).unwrap_or((0, 0));
            let scale = |value| normalize_u16(value, min, max);
            match decoded.planar_configuration() {
                PlanarConfiguration::Standard => {
                    let scaled: Vec<u8> = samples.into_iter().map(scale).collect();
                    rgb_interleaved_to_rgba(&scaled)?
                }
                PlanarConfiguration::PixelFirst => {
                    rgb_planar_to_rgba(&samples, pixel_count, scale)?
                }
            }
        };

        if params.invert {
            invert_rgba(&mut rgba);
        }
        Ok((width, height, rgba))
    }

    fn fallback_to_dynamic(
        decoded: &DecodedPixelData<'_>,
        frame_idx: u32,
        interpretation: &str,
        params: &DisplayParams,
    ) -> Result<(u32, u32, Vec<u8>), String> {
        let image = decoded.to_dynamic_image(frame_idx).map_err(|err| {
            format!("Unsupported photometric interpretation `{interpretation}`: {err}")
        })?;
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgba = rgba.into_raw();
        if params.invert {
            invert_rgba(&mut rgba);
        }
        Ok((width, height, rgba))
    }
}

/// Modality LUT as a linear slope/intercept pair.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rescale {
    slope: f64,
    intercept: f64,
}

impl Rescale {
    fn from_object(object: &DefaultDicomObject) -> Self {
        let number = |name: &str| {
            attribute_text(object, name)
                .and_then(|text| text.split('\\').next().map(str::trim).map(str::to_owned))
                .and_then(|text| text.parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };
        Self {
            slope: number("RescaleSlope").filter(|slope| *slope != 0.0).unwrap_or(1.0),
            intercept: number("RescaleIntercept").unwrap_or(0.0),
        }
    }

    fn apply(self, raw: f64) -> f64 {
        raw * self.slope + self.intercept
    }
}

/// Linear VOI windowing of one modality value to 8-bit gray.
pub fn apply_window(value: f64, params: &DisplayParams, invert: bool) -> u8 {
    let center = params.window_level - 0.5;
    let span = (params.window_width - 1.0).max(0.0);
    let lower = center - span / 2.0;
    let upper = center + span / 2.0;

    let gray = if value <= lower {
        0
    } else if value > upper {
        255
    } else {
        (((value - center) / span + 0.5) * 255.0).clamp(0.0, 255.0).round() as u8
    };

    if invert {
        255 - gray
    } else {
        gray
    }
}

pub fn gray_to_rgba(gray: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(gray.len() * 4);
    for &value in gray {
        rgba.extend_from_slice(&[value, value, value, 255]);
    }
    rgba
}

fn invert_rgba(rgba: &mut [u8]) {
    for pixel in rgba.chunks_mut(4) {
        for channel in pixel.iter_mut().take(3) {
            *channel = 255 - *channel;
        }
    }
}

fn materialize(err: impl std::fmt::Display) -> String {
    format!("Failed to materialize frame data: {err}")
}

fn malformed(reason: impl Into<String>) -> DecodeError {
    DecodeError::Malformed {
        reason: reason.into(),
    }
}

fn rgb_interleaved_to_rgba(samples: &[u8]) -> Result<Vec<u8>, String> {
    if samples.len() % 3 != 0 {
        return Err(format!(
            "RGB buffer length {} is not divisible by 3",
            samples.len()
        ));
    }
    let mut rgba = Vec::with_capacity(samples.len() / 3 * 4);
    for chunk in samples.chunks(3) {
        if let [r, g, b] = *chunk {
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    Ok(rgba)
}

fn rgb_planar_to_rgba(
    samples: &[u16],
    pixel_count: usize,
    to_u8: impl Fn(u16) -> u8,
) -> Result<Vec<u8>, String> {
    if samples.len() < pixel_count * 3 {
        return Err(format!(
            "RGB buffer length {} is too small for {pixel_count} pixels",
            samples.len()
        ));
    }
    let (r_plane, rest) = samples.split_at(pixel_count);
    let (g_plane, b_plane) = rest.split_at(pixel_count);

    let mut rgba = Vec::with_capacity(pixel_count * 4);
    for idx in 0..pixel_count {
        rgba.extend_from_slice(&[
            to_u8(r_plane[idx]),
            to_u8(g_plane[idx]),
            to_u8(b_plane[idx]),
            255,
        ]);
    }
    Ok(rgba)
}

fn min_max_u16(values: &[u16]) -> Option<(u16, u16)> {
    values.iter().copied().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

fn normalize_u16(value: u16, min: u16, max: u16) -> u8 {
    if max <= min {
        return 0;
    }

    let range = (max - min) as f32;
    let normalized = (value.saturating_sub(min)) as f32 / range;
    (normalized * 255.0).clamp(0.0, 255.0).round() as u8
}
