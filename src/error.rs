use snafu::prelude::*;

/// Error type for range algebra, views and loaders.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ViewError {
    #[snafu(display("malformed range '{input}': {reason}"))]
    MalformedRange { input: String, reason: String },

    #[snafu(display(
        "axis {axis} out of range for {ndim} dimension(s)"
    ))]
    AxisOutOfRange { axis: usize, ndim: usize },

    #[snafu(display(
        "index {index} out of bounds for extent {extent}"
    ))]
    OutOfBounds { index: usize, extent: usize },

    #[snafu(display("index {index} is not part of the range"))]
    NotFound { index: usize },

    #[snafu(display(
        "group {index} out of range ({ngroups} groups)"
    ))]
    GroupOutOfRange { index: usize, ngroups: usize },

    #[snafu(display("unknown dataset: {id}"))]
    UnknownDataset { id: String },

    #[snafu(display("cannot restore {what} from {persisted}"))]
    UnsupportedPersisted { what: String, persisted: String },

    #[snafu(display("invalid table: {msg}"))]
    InvalidTable { msg: String },

    /// Transport or backend failure raised by a loader implementation.
    #[snafu(display("loader failed for '{dataset}': {source}"))]
    Loader {
        dataset: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(context(false))]
    Json { source: serde_json::Error },

    #[snafu(context(false))]
    Io { source: std::io::Error },
}

impl ViewError {
    /// Wrap a loader-side failure for `dataset`.
    pub fn loader(
        dataset: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> ViewError {
        ViewError::Loader {
            dataset: dataset.into(),
            source: source.into(),
        }
    }

    pub fn malformed(
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> ViewError {
        ViewError::MalformedRange {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the backend.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ViewError::MalformedRange { .. }
                | ViewError::AxisOutOfRange { .. }
                | ViewError::OutOfBounds { .. }
                | ViewError::NotFound { .. }
                | ViewError::GroupOutOfRange { .. }
        )
    }
}

pub type ViewResult<T> = Result<T, ViewError>;
