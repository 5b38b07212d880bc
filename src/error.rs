use thiserror::Error;

#[derive(Error, Debug)]
pub enum YtteError {
    #[error("Please paste a video URL")]
    EmptyUrl,

    #[error("Please select a video quality")]
    MissingVideoSelection,

    #[error("Please select an audio quality to combine with the video")]
    MissingCombinedAudioSelection,

    #[error("Please select an audio quality")]
    MissingAudioSelection,

    #[error("Format {0} is not one of the offered options")]
    UnknownFormat(String),

    #[error("No video information loaded, fetch a URL first")]
    NoMetadata,

    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timeout for URL: {0}")]
    RequestTimeout(String),

    #[error("HTTP error {status} for URL: {url}")]
    HttpError { status: u16, url: String },

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Service rejected the request: {0}")]
    ServiceRejected(String),

    #[error("Invalid header value: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl YtteError {
    /// Errors caused by what the user typed or selected, as opposed to the service.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            YtteError::EmptyUrl
                | YtteError::MissingVideoSelection
                | YtteError::MissingCombinedAudioSelection
                | YtteError::MissingAudioSelection
                | YtteError::UnknownFormat(_)
                | YtteError::NoMetadata
        )
    }
}

pub type Result<T> = std::result::Result<T, YtteError>;
