use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::classify::{ClassifiedFormats, describe_quality, describe_size};
use crate::core::FormatDescriptor;

/// One selectable entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatOption {
    pub format_id: String,
    pub label: String,
}

impl Display for FormatOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.format_id, self.label)
    }
}

/// Options for a combined download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoTab {
    pub video: Vec<FormatOption>,
    /// Audio streams to mux with the chosen video
    pub audio: Vec<FormatOption>,
}

/// Options for a standalone audio download
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudioTab {
    pub audio: Vec<FormatOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoView {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub video_tab: VideoTab,
    pub audio_tab: AudioTab,
}

/// `1080p (mp4) - 2.00 MB`
pub fn video_option(label: &str, format: &FormatDescriptor) -> FormatOption {
    FormatOption {
        format_id: format.format_id.clone(),
        label: format!("{} ({}) - {}", label, format.extension, describe_size(format)),
    }
}

/// `129kbps (m4a) - N/A`
pub fn audio_option(format: &FormatDescriptor) -> FormatOption {
    FormatOption {
        format_id: format.format_id.clone(),
        label: format!(
            "{} ({}) - {}",
            describe_quality(format),
            format.extension,
            describe_size(format)
        ),
    }
}

impl InfoView {
    pub fn new(title: &str, thumbnail: Option<&str>, formats: &ClassifiedFormats) -> Self {
        let audio: Vec<FormatOption> = formats.audio_sorted.iter().map(audio_option).collect();
        Self {
            title: title.to_string(),
            thumbnail: thumbnail.map(str::to_string),
            video_tab: VideoTab {
                video: formats
                    .video_representatives()
                    .map(|(label, f)| video_option(label, f))
                    .collect(),
                audio: audio.clone(),
            },
            audio_tab: AudioTab { audio },
        }
    }
}
