use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::ViewerConfig;
use crate::decode::{DecodeAdapter, FrameDecoder, RenderedFrame};
use crate::error::{LoadError, ValidationError};
use crate::extract::{extract, ArchiveReader, ZipArchiveReader};
use crate::image_pipeline::DicomFrameDecoder;
use crate::message::{Direction, ViewCommand};
use crate::model::{
    aggregate, AttributeSource, DicomAttributeSource, DisplayParams, InputKind, LoadPhase,
    MetadataReader, ObjectRecord, Series, ViewerSession,
};

/// External capabilities the viewer depends on, fixed at construction.
#[derive(Clone)]
pub struct Capabilities {
    pub archive: Arc<dyn ArchiveReader>,
    pub attributes: Arc<dyn AttributeSource>,
    pub decoder: Option<Arc<dyn FrameDecoder>>,
}

impl Capabilities {
    /// ZIP archives, DICOM attribute lookup and DICOM pixel decoding.
    pub fn dicom() -> Self {
        Self {
            archive: Arc::new(ZipArchiveReader),
            attributes: Arc::new(DicomAttributeSource),
            decoder: Some(Arc::new(DicomFrameDecoder)),
        }
    }

    pub fn without_decoder(self) -> Self {
        Self {
            decoder: None,
            ..self
        }
    }

    pub fn with_archive_reader(self, archive: Arc<dyn ArchiveReader>) -> Self {
        Self { archive, ..self }
    }

    pub fn with_attribute_source(self, attributes: Arc<dyn AttributeSource>) -> Self {
        Self { attributes, ..self }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::dicom()
    }
}

/// Owns one viewer session and every transition applied to it.
///
/// `load` is the only asynchronous operation. Each call takes a new
/// generation; results of older generations are dropped without touching the
/// session, so the most recent load always wins. Every other operation is a
/// synchronous state change and is ignored unless the session is `Ready`.
/// Each transition is published to `subscribe`rs.
pub struct ViewportController {
    archive: Arc<dyn ArchiveReader>,
    metadata: MetadataReader,
    decode: DecodeAdapter,
    config: ViewerConfig,
    state: watch::Sender<ViewerSession>,
}

impl ViewportController {
    pub fn new(capabilities: Capabilities, config: ViewerConfig) -> Self {
        if capabilities.decoder.is_none() {
            log::warn!("No pixel decoder configured; frames will render as placeholders");
        }
        let (state, _) = watch::channel(ViewerSession::new(DisplayParams::from_config(&config)));
        Self {
            archive: capabilities.archive,
            metadata: MetadataReader::new(capabilities.attributes),
            decode: DecodeAdapter::new(capabilities.decoder),
            config,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewerSession> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewerSession {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.borrow().phase.clone()
    }

    /// Extracts, reads and groups `buffer`, then commits the series list in
    /// one step. With a `deadline`, a load still running when it elapses
    /// fails with [`LoadError::DeadlineExceeded`].
    pub async fn load(
        &self,
        buffer: impl Into<Arc<[u8]>>,
        kind: InputKind,
        deadline: Option<Duration>,
    ) -> Result<(), LoadError> {
        self.load_named(None, buffer, kind, deadline).await
    }

    /// Like [`load`](Self::load), naming a single upload's entry after
    /// `name` instead of the generic upload name.
    ///
    /// Dropping the returned future before it settles moves the session to
    /// `Failed(Interrupted)`, unless a newer load has started since.
    pub async fn load_named(
        &self,
        name: Option<&str>,
        buffer: impl Into<Arc<[u8]>>,
        kind: InputKind,
        deadline: Option<Duration>,
    ) -> Result<(), LoadError> {
        let buffer = buffer.into();
        let generation = self.begin_load();
        let mut pending = PendingLoad::new(&self.state, generation);
        log::info!("Load #{generation}: {} bytes as {kind:?}", buffer.len());

        let pipeline = self.run_pipeline(generation, name.map(str::to_owned), buffer, kind);
        let outcome = match deadline {
            Some(limit) => tokio::time::timeout(limit, pipeline)
                .await
                .unwrap_or(Err(LoadError::DeadlineExceeded { deadline: limit })),
            None => pipeline.await,
        };
        pending.settle();

        match outcome {
            Ok(series) => self.commit(generation, series),
            Err(LoadError::Superseded) => {
                log::info!("Load #{generation} superseded, result discarded");
                Err(LoadError::Superseded)
            }
            Err(err) => self.fail(generation, err),
        }
    }

    async fn run_pipeline(
        &self,
        generation: u64,
        name: Option<String>,
        buffer: Arc<[u8]>,
        kind: InputKind,
    ) -> Result<Vec<Series>, LoadError> {
        let archive = Arc::clone(&self.archive);
        let entries =
            run_blocking(move || extract(buffer, kind, name.as_deref(), archive.as_ref()))
                .await??;

        self.advance(generation, LoadPhase::Aggregating)?;

        let metadata = self.metadata.clone();
        let series = run_blocking(move || {
            let records: Vec<ObjectRecord> = entries
                .into_iter()
                .map(|entry| metadata.read(entry))
                .collect();
            aggregate(records)
        })
        .await??;
        Ok(series)
    }

    fn begin_load(&self) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|session| {
            session.generation += 1;
            generation = session.generation;
            session.phase = LoadPhase::Extracting;
        });
        generation
    }

    fn advance(&self, generation: u64, phase: LoadPhase) -> Result<(), LoadError> {
        let current = self.state.send_if_modified(|session| {
            if session.generation != generation {
                return false;
            }
            session.phase = phase;
            true
        });
        if current {
            Ok(())
        } else {
            Err(LoadError::Superseded)
        }
    }

    fn commit(&self, generation: u64, series: Vec<Series>) -> Result<(), LoadError> {
        let defaults = DisplayParams::from_config(&self.config);
        let series_count = series.len();
        let frame_count: usize = series.iter().map(Series::len).sum();

        let applied = self.state.send_if_modified(|session| {
            if session.generation != generation {
                return false;
            }
            session.series = Arc::new(series);
            session.current_series = 0;
            session.current_frame = 0;
            session.display = defaults;
            session.phase = LoadPhase::Ready;
            true
        });

        if applied {
            log::info!("Load #{generation} ready: {series_count} series, {frame_count} frame(s)");
            Ok(())
        } else {
            log::info!("Load #{generation} superseded, result discarded");
            Err(LoadError::Superseded)
        }
    }

    fn fail(&self, generation: u64, err: LoadError) -> Result<(), LoadError> {
        let failed = err.clone();
        let applied = self.state.send_if_modified(|session| {
            if session.generation != generation {
                return false;
            }
            session.phase = LoadPhase::Failed(failed);
            true
        });

        if applied {
            log::error!("Load #{generation} failed: {err}");
            Err(err)
        } else {
            log::info!("Load #{generation} superseded, failure discarded ({err})");
            Err(LoadError::Superseded)
        }
    }

    /// Selects a series, clamping out-of-range indices. Returns whether the
    /// position changed.
    pub fn select_series(&self, index: usize) -> bool {
        self.state.send_if_modified(|session| {
            if !session.phase.is_ready() || session.series.is_empty() {
                return false;
            }
            let clamped = index.min(session.series.len() - 1);
            if clamped != index {
                log::debug!("Series index {index} clamped to {clamped}");
            }
            let changed = session.current_series != clamped || session.current_frame != 0;
            session.current_series = clamped;
            session.current_frame = 0;
            changed
        })
    }

    /// Steps one frame; stepping past either end is a no-op.
    pub fn navigate(&self, direction: Direction) -> bool {
        self.state.send_if_modified(|session| {
            if !session.phase.is_ready() {
                return false;
            }
            let count = session.frame_count();
            if count == 0 {
                return false;
            }
            let target = match direction {
                Direction::Next => (session.current_frame + 1).min(count - 1),
                Direction::Previous => session.current_frame.saturating_sub(1),
            };
            if target == session.current_frame {
                return false;
            }
            session.current_frame = target;
            true
        })
    }

    pub fn set_window(&self, level: f64, width: f64) -> Result<(), ValidationError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|session| {
            if !session.phase.is_ready() {
                return false;
            }
            if !(level.is_finite() && width.is_finite() && width > 0.0) {
                outcome = Err(ValidationError::InvalidWindow { level, width });
                return false;
            }
            let display = &mut session.display;
            let changed = display.window_level != level || display.window_width != width;
            display.window_level = level;
            display.window_width = width;
            changed
        });
        outcome
    }

    pub fn set_zoom(&self, factor: f64) -> Result<(), ValidationError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|session| {
            if !session.phase.is_ready() {
                return false;
            }
            if !(factor.is_finite() && factor > 0.0) {
                outcome = Err(ValidationError::InvalidZoom { factor });
                return false;
            }
            let changed = session.display.zoom != factor;
            session.display.zoom = factor;
            changed
        });
        outcome
    }

    pub fn toggle_invert(&self) {
        self.state.send_if_modified(|session| {
            if !session.phase.is_ready() {
                return false;
            }
            session.display.invert = !session.display.invert;
            true
        });
    }

    /// Restores window, zoom and invert to the configured defaults.
    pub fn reset_view(&self) {
        let defaults = DisplayParams::from_config(&self.config);
        self.state.send_if_modified(|session| {
            if !session.phase.is_ready() || session.display == defaults {
                return false;
            }
            session.display = defaults;
            true
        });
    }

    pub fn update(&self, command: ViewCommand) -> Result<(), ValidationError> {
        match command {
            ViewCommand::SelectSeries(index) => {
                self.select_series(index);
            }
            ViewCommand::Navigate(direction) => {
                self.navigate(direction);
            }
            ViewCommand::SetWindow { level, width } => self.set_window(level, width)?,
            ViewCommand::SetZoom(factor) => self.set_zoom(factor)?,
            ViewCommand::ToggleInvert => self.toggle_invert(),
            ViewCommand::ResetView => self.reset_view(),
        }
        Ok(())
    }

    /// The selected record and the params to decode it with.
    pub fn current_frame(&self) -> Option<(ObjectRecord, DisplayParams)> {
        let session = self.state.borrow();
        if !session.phase.is_ready() {
            return None;
        }
        session
            .current_record()
            .map(|record| (record.clone(), session.display))
    }

    /// Decodes the selected frame, falling back to the placeholder.
    pub fn render_current(&self) -> Option<RenderedFrame> {
        let (record, params) = self.current_frame()?;
        Some(self.decode.render(&record, &params))
    }
}

/// Marks a load as interrupted if it is dropped before settling.
struct PendingLoad<'a> {
    state: &'a watch::Sender<ViewerSession>,
    generation: u64,
    settled: bool,
}

impl<'a> PendingLoad<'a> {
    fn new(state: &'a watch::Sender<ViewerSession>, generation: u64) -> Self {
        Self {
            state,
            generation,
            settled: false,
        }
    }

    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let generation = self.generation;
        let applied = self.state.send_if_modified(|session| {
            if session.generation != generation {
                return false;
            }
            session.phase = LoadPhase::Failed(LoadError::Interrupted {
                reason: "load cancelled before completion".to_string(),
            });
            true
        });
        if applied {
            log::warn!("Load #{generation} cancelled, session marked interrupted");
        }
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, LoadError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| LoadError::Interrupted {
            reason: err.to_string(),
        })
}
