use std::sync::Arc;

use super::{ObjectRecord, Series};
use crate::config::ViewerConfig;
use crate::error::LoadError;

/// Window and view adjustments applied when a frame is rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayParams {
    pub window_level: f64,
    pub window_width: f64,
    pub zoom: f64,
    pub invert: bool,
}

impl DisplayParams {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            window_level: config.default_window_level,
            window_width: config.default_window_width,
            zoom: config.default_zoom,
            invert: false,
        }
    }
}

impl Default for DisplayParams {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Extracting,
    Aggregating,
    Ready,
    Failed(LoadError),
}

impl LoadPhase {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadPhase::Ready)
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadPhase::Idle => "idle",
            LoadPhase::Extracting => "extracting",
            LoadPhase::Aggregating => "aggregating",
            LoadPhase::Ready => "ready",
            LoadPhase::Failed(_) => "failed",
        }
    }
}

/// State of one viewer: the resolved series, the cursor into them and the
/// display adjustments. Published as a snapshot after every transition.
#[derive(Debug, Clone, Default)]
pub struct ViewerSession {
    pub(crate) series: Arc<Vec<Series>>,
    pub(crate) current_series: usize,
    pub(crate) current_frame: usize,
    pub(crate) display: DisplayParams,
    pub(crate) phase: LoadPhase,
    pub(crate) generation: u64,
}

impl ViewerSession {
    pub(crate) fn new(display: DisplayParams) -> Self {
        Self {
            display,
            ..Self::default()
        }
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn current_series_index(&self) -> usize {
        self.current_series
    }

    pub fn current_frame_index(&self) -> usize {
        self.current_frame
    }

    pub fn current_series(&self) -> Option<&Series> {
        self.series.get(self.current_series)
    }

    pub fn current_record(&self) -> Option<&ObjectRecord> {
        self.current_series()?.frame(self.current_frame)
    }

    /// Frames in the selected series.
    pub fn frame_count(&self) -> usize {
        self.current_series().map(Series::len).unwrap_or(0)
    }

    pub fn display(&self) -> DisplayParams {
        self.display
    }

    pub fn window_level(&self) -> f64 {
        self.display.window_level
    }

    pub fn window_width(&self) -> f64 {
        self.display.window_width
    }

    pub fn zoom(&self) -> f64 {
        self.display.zoom
    }

    pub fn invert(&self) -> bool {
        self.display.invert
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        match &self.phase {
            LoadPhase::Failed(err) => Some(err),
            _ => None,
        }
    }
}
