use url::Url;

use crate::classify::ClassifiedFormats;
use crate::config::Config;
use crate::core::DownloadKind;
use crate::error::{Result, YtteError};

/// Format ids picked by the user, as typed or clicked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub video: Option<String>,
    pub audio: Option<String>,
}

impl Selection {
    pub fn new(video: Option<&str>, audio: Option<&str>) -> Self {
        Self {
            video: video.map(str::to_string),
            audio: audio.map(str::to_string),
        }
    }
}

/// What gets handed to the download endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub source_url: String,
    pub video_format_id: Option<String>,
    pub audio_format_id: String,
}

impl DownloadRequest {
    pub fn kind(&self) -> DownloadKind {
        if self.video_format_id.is_some() {
            DownloadKind::Combined
        } else {
            DownloadKind::AudioOnly
        }
    }

    /// `{base}/download?url=..&video_format_id=..&audio_format_id=..`
    pub fn url(&self, config: &Config) -> Result<Url> {
        let mut url = config.endpoint("download")?;
        let mut query = format!("url={}", urlencoding::encode(&self.source_url));
        if let Some(video) = &self.video_format_id {
            query.push_str("&video_format_id=");
            query.push_str(&urlencoding::encode(video));
        }
        query.push_str("&audio_format_id=");
        query.push_str(&urlencoding::encode(&self.audio_format_id));
        url.set_query(Some(&query));
        Ok(url)
    }
}

fn picked(id: &Option<String>) -> Option<&str> {
    id.as_deref().map(str::trim).filter(|id| !id.is_empty())
}

fn offered_video(formats: &ClassifiedFormats, id: &str) -> bool {
    formats.video_representatives().any(|(_, f)| f.format_id == id)
}

fn offered_audio(formats: &ClassifiedFormats, id: &str) -> bool {
    formats.audio_sorted.iter().any(|f| f.format_id == id)
}

/// Video plus audio to mux. Video is checked before audio.
pub fn validate_combined(
    source_url: &str,
    selection: &Selection,
    formats: &ClassifiedFormats,
) -> Result<DownloadRequest> {
    let video = picked(&selection.video).ok_or(YtteError::MissingVideoSelection)?;
    let audio = picked(&selection.audio).ok_or(YtteError::MissingCombinedAudioSelection)?;
    if !offered_video(formats, video) {
        return Err(YtteError::UnknownFormat(video.to_string()));
    }
    if !offered_audio(formats, audio) {
        return Err(YtteError::UnknownFormat(audio.to_string()));
    }
    Ok(DownloadRequest {
        source_url: source_url.to_string(),
        video_format_id: Some(video.to_string()),
        audio_format_id: audio.to_string(),
    })
}

/// Audio stream on its own. Any video selection is ignored.
pub fn validate_audio_only(
    source_url: &str,
    selection: &Selection,
    formats: &ClassifiedFormats,
) -> Result<DownloadRequest> {
    let audio = picked(&selection.audio).ok_or(YtteError::MissingAudioSelection)?;
    if !offered_audio(formats, audio) {
        return Err(YtteError::UnknownFormat(audio.to_string()));
    }
    Ok(DownloadRequest {
        source_url: source_url.to_string(),
        video_format_id: None,
        audio_format_id: audio.to_string(),
    })
}
