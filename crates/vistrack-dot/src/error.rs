/// Errors returned by the dot tracker.
///
/// Every variant except `NoClick` means the dot was lost for this frame. The
/// tracker keeps its previous centre; re-seed with one of the
/// `init_tracking*` methods to continue.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DotTrackError {
    #[error("seed ({x}, {y}) lies outside the image")]
    SeedOutOfImage { x: i64, y: i64 },
    #[error("dot lost: no pixel >= {threshold} found by the spiral search")]
    NotFound { threshold: u8 },
    #[error("dot lost: region of {pixels} pixels is smaller than {min}")]
    TooSmall { pixels: usize, min: usize },
    #[error("dot lost: region exceeds {max} pixels (set a larger max_region_size if expected)")]
    TooLarge { pixels: usize, max: usize },
    #[error("click source closed before a click was received")]
    NoClick,
}

impl DotTrackError {
    /// `true` for the outcomes that mean the tracked feature is gone.
    pub fn is_feature_lost(&self) -> bool {
        !matches!(self, DotTrackError::NoClick)
    }
}
