use std::sync::Arc;

use crate::error::DecodeError;
use crate::image_pipeline::{apply_window, gray_to_rgba};
use crate::model::{DisplayParams, ObjectRecord};

/// Edge length of the placeholder frame.
pub const PLACEHOLDER_SIZE: u32 = 256;

const PHANTOM_RADIUS: i64 = 112;
const PHANTOM_AIR: f64 = -1000.0;

/// An 8-bit RGBA image, row major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFrame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl PixelFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(DecodeError::Malformed {
                reason: format!(
                    "{width}x{height} frame needs {expected} RGBA bytes, got {}",
                    rgba.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Pixel decode capability, injected into the viewer when available.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, record: &ObjectRecord, params: &DisplayParams)
        -> Result<PixelFrame, DecodeError>;
}

/// A frame ready for display. `warning` is set when `frame` is the placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub frame: PixelFrame,
    pub warning: Option<DecodeError>,
}

impl RenderedFrame {
    pub fn is_placeholder(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Clone, Default)]
pub struct DecodeAdapter {
    decoder: Option<Arc<dyn FrameDecoder>>,
}

impl DecodeAdapter {
    pub fn new(decoder: Option<Arc<dyn FrameDecoder>>) -> Self {
        Self { decoder }
    }

    pub fn decode(
        &self,
        record: &ObjectRecord,
        params: &DisplayParams,
    ) -> Result<PixelFrame, DecodeError> {
        match &self.decoder {
            Some(decoder) => decoder.decode(record, params),
            None => Err(DecodeError::Unavailable),
        }
    }

    /// Decodes `record`, substituting the placeholder on any decode failure.
    pub fn render(&self, record: &ObjectRecord, params: &DisplayParams) -> RenderedFrame {
        match self.decode(record, params) {
            Ok(frame) => RenderedFrame {
                frame,
                warning: None,
            },
            Err(err) => {
                log::warn!("{}: showing placeholder ({err})", record.name());
                RenderedFrame {
                    frame: placeholder_frame(params),
                    warning: Some(err),
                }
            }
        }
    }
}

/// Synthetic ring phantom pushed through the same window mapping as real
/// frames. Depends only on `params`.
pub fn placeholder_frame(params: &DisplayParams) -> PixelFrame {
    let size = PLACEHOLDER_SIZE as i64;
    let center = size / 2;
    let mut gray = Vec::with_capacity((size * size) as usize);

    for y in 0..size {
        for x in 0..size {
            let (dx, dy) = (x - center, y - center);
            let distance_sq = dx * dx + dy * dy;
            let value = if distance_sq > PHANTOM_RADIUS * PHANTOM_RADIUS {
                PHANTOM_AIR
            } else {
                let band = (distance_sq / 256) % 8;
                (band * 100 - 300) as f64
            };
            gray.push(apply_window(value, params, params.invert));
        }
    }

    PixelFrame {
        width: PLACEHOLDER_SIZE,
        height: PLACEHOLDER_SIZE,
        rgba: gray_to_rgba(&gray),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;

    struct Rejecting;

    impl FrameDecoder for Rejecting {
        fn decode(
            &self,
            _record: &ObjectRecord,
            _params: &DisplayParams,
        ) -> Result<PixelFrame, DecodeError> {
            Err(DecodeError::Malformed {
                reason: String::from("bad bytes"),
            })
        }
    }

    struct Solid;

    impl FrameDecoder for Solid {
        fn decode(
            &self,
            _record: &ObjectRecord,
            _params: &DisplayParams,
        ) -> Result<PixelFrame, DecodeError> {
            PixelFrame::new(1, 1, vec![9, 9, 9, 255])
        }
    }

    fn record() -> ObjectRecord {
        ObjectRecord::unrecognized(Entry::new("x", b"junk".to_vec()))
    }

    #[test]
    fn missing_decoder_degrades_to_placeholder() {
        let adapter = DecodeAdapter::new(None);
        let rendered = adapter.render(&record(), &DisplayParams::default());
        assert_eq!(rendered.warning, Some(DecodeError::Unavailable));
        assert_eq!(rendered.frame.width(), PLACEHOLDER_SIZE);
        assert!(rendered.is_placeholder());
    }

    #[test]
    fn placeholder_is_bit_identical_across_retries() {
        let adapter = DecodeAdapter::new(Some(Arc::new(Rejecting)));
        let params = DisplayParams::default();
        let first = adapter.render(&record(), &params);
        let second = adapter.render(&record(), &params);
        assert!(matches!(first.warning, Some(DecodeError::Malformed { .. })));
        assert_eq!(first, second);
        assert_eq!(first.frame.rgba(), second.frame.rgba());
    }

    #[test]
    fn placeholder_follows_invert() {
        let params = DisplayParams::default();
        let inverted = DisplayParams {
            invert: true,
            ..params
        };
        let normal = placeholder_frame(&params);
        let flipped = placeholder_frame(&inverted);
        for (a, b) in normal.rgba().chunks(4).zip(flipped.rgba().chunks(4)) {
            assert_eq!(a[0], 255 - b[0]);
            assert_eq!(a[3], 255);
        }
    }

    #[test]
    fn placeholder_has_contrast_at_default_window() {
        let frame = placeholder_frame(&DisplayParams::default());
        let distinct: std::collections::BTreeSet<u8> =
            frame.rgba().chunks(4).map(|pixel| pixel[0]).collect();
        assert!(distinct.len() > 2);
    }

    #[test]
    fn successful_decode_has_no_warning() {
        let adapter = DecodeAdapter::new(Some(Arc::new(Solid)));
        let rendered = adapter.render(&record(), &DisplayParams::default());
        assert!(!rendered.is_placeholder());
        assert_eq!(rendered.frame.rgba(), &[9u8, 9, 9, 255]);
    }

    #[test]
    fn frame_size_is_checked() {
        assert!(PixelFrame::new(2, 2, vec![0; 15]).is_err());
        assert!(PixelFrame::new(2, 2, vec![0; 16]).is_ok());
    }
}
