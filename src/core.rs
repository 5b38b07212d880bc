use serde::{Deserialize, Deserializer, Serialize};
pub use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Codec value the service uses for a stream that is not present
pub const NO_CODEC: &str = "none";

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One downloadable stream variant as reported by `/info`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatDescriptor {
    pub format_id: String,
    /// `None` when the service did not know the codec, which is not the `"none"` sentinel
    #[serde(rename = "vcodec")]
    #[serde(default)]
    pub video_codec: Option<String>,
    #[serde(rename = "acodec")]
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(rename = "ext")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub extension: String,
    #[serde(rename = "filesize")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(rename = "abr")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_audio_bitrate_kbps: Option<f64>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FormatDescriptor {
    /// Create a descriptor with only the mandatory fields
    pub fn new(format_id: &str, video_codec: &str, audio_codec: &str, extension: &str) -> Self {
        Self {
            format_id: format_id.to_string(),
            video_codec: Some(video_codec.to_string()),
            audio_codec: Some(audio_codec.to_string()),
            resolution: None,
            extension: extension.to_string(),
            file_size_bytes: None,
            average_audio_bitrate_kbps: None,
            note: None,
        }
    }

    /// Set resolution, e.g. `1920x1080`
    pub fn with_resolution(mut self, resolution: &str) -> Self {
        self.resolution = Some(resolution.to_string());
        self
    }

    /// Set file size in bytes
    pub fn with_file_size(mut self, bytes: u64) -> Self {
        self.file_size_bytes = Some(bytes);
        self
    }

    /// Set average audio bitrate in kbps
    pub fn with_bitrate(mut self, kbps: f64) -> Self {
        self.average_audio_bitrate_kbps = Some(kbps);
        self
    }

    /// Set free-text note
    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    /// Only the literal `"none"` rules a stream out
    pub fn has_video(&self) -> bool {
        self.video_codec.as_deref() != Some(NO_CODEC)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.as_deref() != Some(NO_CODEC)
    }
}

/// Response body of `GET /info`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

/// Fetch state indicator
#[derive(EnumIter, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Idle,
    Fetching,
    Ready,
    Failed,
}

/// The two download actions
#[derive(EnumIter, Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadKind {
    /// Video-only stream muxed with an audio-only stream
    #[strum(to_string = "video with audio")]
    Combined,
    #[strum(to_string = "audio only")]
    AudioOnly,
}

impl DownloadKind {
    /// Container the service produces for this kind of download
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadKind::Combined => ".mp4",
            DownloadKind::AudioOnly => ".m4a",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_service_payload() {
        let json = r#"{
            "title": "Some talk",
            "thumbnail": "https://i.ytimg.com/vi/abc/hq.jpg",
            "formats": [
                {"format_id": "137", "ext": "mp4", "resolution": "1920x1080",
                 "vcodec": "avc1.640028", "acodec": "none", "filesize": 2097152, "note": "1080p"},
                {"format_id": "251", "ext": "webm", "resolution": "audio only",
                 "vcodec": "none", "acodec": "opus", "filesize": null, "abr": 160.3, "note": null}
            ]
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.title, "Some talk");
        assert_eq!(info.formats.len(), 2);
        assert_eq!(info.formats[0].video_codec.as_deref(), Some("avc1.640028"));
        assert_eq!(info.formats[0].file_size_bytes, Some(2097152));
        assert_eq!(info.formats[1].average_audio_bitrate_kbps, Some(160.3));
        assert_eq!(info.formats[1].file_size_bytes, None);
        assert_eq!(info.formats[1].note, None);
    }

    #[test]
    fn test_unknown_codecs_are_not_the_sentinel() {
        let json = r#"{"format_id": "sb0", "ext": null, "vcodec": null}"#;
        let f: FormatDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(f.video_codec, None);
        assert_eq!(f.audio_codec, None);
        assert!(f.has_video());
        assert!(f.has_audio());
        assert_eq!(f.extension, "");

        let json = r#"{"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2"}"#;
        let f: FormatDescriptor = serde_json::from_str(json).unwrap();
        assert!(!f.has_video());
        assert!(f.has_audio());
    }

    #[test]
    fn test_download_kind_extension() {
        assert_eq!(DownloadKind::Combined.extension(), ".mp4");
        assert_eq!(DownloadKind::AudioOnly.extension(), ".m4a");
        assert_eq!(DownloadKind::iter().count(), 2);
    }
}
