/// Frame step within the selected series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Synchronous viewer interactions, dispatched through `ViewportController::update`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewCommand {
    SelectSeries(usize),
    Navigate(Direction),
    SetWindow { level: f64, width: f64 },
    SetZoom(f64),
    ToggleInvert,
    ResetView,
}
