use crate::core::FormatDescriptor;
use tracing::{debug, warn};

/// Video formats sharing one resolution label, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionGroup {
    pub label: String,
    pub formats: Vec<FormatDescriptor>,
}

impl ResolutionGroup {
    /// The format shown for this resolution
    pub fn representative(&self) -> Option<&FormatDescriptor> {
        self.formats.first()
    }
}

/// Video and audio views over one `/info` response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedFormats {
    /// Labels in first-seen order
    pub video_by_resolution: Vec<ResolutionGroup>,
    pub audio_sorted: Vec<FormatDescriptor>,
    /// Descriptors dropped for an unparsable resolution
    pub skipped: usize,
}

impl ClassifiedFormats {
    pub fn video_group(&self, label: &str) -> Option<&ResolutionGroup> {
        self.video_by_resolution.iter().find(|g| g.label == label)
    }

    /// First format of every resolution group
    pub fn video_representatives(&self) -> impl Iterator<Item = (&str, &FormatDescriptor)> {
        self.video_by_resolution
            .iter()
            .filter_map(|g| g.representative().map(|f| (g.label.as_str(), f)))
    }

    pub fn is_empty(&self) -> bool {
        self.video_by_resolution.is_empty() && self.audio_sorted.is_empty()
    }
}

/// `"1920x1080"` -> `"1080p"`. `None` when there is no numeric height after the `x`.
pub fn resolution_label(resolution: &str) -> Option<String> {
    let (_, rest) = resolution.split_once('x')?;
    let height = rest.split('x').next()?.trim();
    if height.is_empty() || !height.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}p", height))
}

fn treated_bitrate(format: &FormatDescriptor) -> f64 {
    format.average_audio_bitrate_kbps.unwrap_or(0.0)
}

/// Split raw formats into resolution groups and bitrate-sorted audio
pub fn classify(formats: &[FormatDescriptor]) -> ClassifiedFormats {
    let mut classified = ClassifiedFormats::default();

    for format in formats {
        if format.has_video()
            && let Some(resolution) = format.resolution.as_deref().filter(|r| !r.is_empty())
        {
            let Some(label) = resolution_label(resolution) else {
                warn!(
                    format_id = %format.format_id,
                    resolution = %resolution,
                    "skipping format with malformed resolution"
                );
                classified.skipped += 1;
                continue;
            };
            match classified
                .video_by_resolution
                .iter_mut()
                .find(|g| g.label == label)
            {
                Some(group) => group.formats.push(format.clone()),
                None => classified.video_by_resolution.push(ResolutionGroup {
                    label,
                    formats: vec![format.clone()],
                }),
            }
        } else if !format.has_video() && format.has_audio() {
            classified.audio_sorted.push(format.clone());
        }
    }

    // sort_by is stable, ties keep input order
    classified
        .audio_sorted
        .sort_by(|a, b| treated_bitrate(b).total_cmp(&treated_bitrate(a)));

    debug!(
        input = formats.len(),
        resolutions = classified.video_by_resolution.len(),
        audio = classified.audio_sorted.len(),
        skipped = classified.skipped,
        "classified formats"
    );
    classified
}

/// Bitrate, then note, then extension. A zero bitrate counts as unknown.
pub fn describe_quality(format: &FormatDescriptor) -> String {
    if let Some(kbps) = format.average_audio_bitrate_kbps
        && kbps > 0.0
    {
        return format!("{}kbps", kbps.round() as i64);
    }
    match &format.note {
        Some(note) if !note.is_empty() => note.clone(),
        _ => format.extension.clone(),
    }
}

/// Size in MiB with two decimals, or `N/A` when unknown or zero
pub fn describe_size(format: &FormatDescriptor) -> String {
    match format.file_size_bytes {
        Some(bytes) if bytes > 0 => format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0),
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, resolution: &str) -> FormatDescriptor {
        FormatDescriptor::new(id, "vp9", "none", "webm").with_resolution(resolution)
    }

    fn audio(id: &str, kbps: Option<f64>) -> FormatDescriptor {
        let f = FormatDescriptor::new(id, "none", "opus", "webm");
        match kbps {
            Some(k) => f.with_bitrate(k),
            None => f,
        }
    }

    #[test]
    fn test_resolution_label() {
        assert_eq!(resolution_label("1920x1080").as_deref(), Some("1080p"));
        assert_eq!(resolution_label("1280x720").as_deref(), Some("720p"));
        assert_eq!(resolution_label("audio only"), None);
        assert_eq!(resolution_label("1920x"), None);
        assert_eq!(resolution_label("1080"), None);
    }

    #[test]
    fn test_classify_video_and_audio() {
        let formats = vec![video("248", "1920x1080"), audio("251", Some(160.0))];
        let classified = classify(&formats);

        assert_eq!(classified.video_by_resolution.len(), 1);
        let group = classified.video_group("1080p").unwrap();
        assert_eq!(group.formats, vec![formats[0].clone()]);
        assert_eq!(classified.audio_sorted, vec![formats[1].clone()]);
        assert_eq!(classified.skipped, 0);
    }

    #[test]
    fn test_classify_empty() {
        let classified = classify(&[]);
        assert!(classified.is_empty());
        assert_eq!(classified.skipped, 0);
    }

    #[test]
    fn test_groups_keep_input_order() {
        let formats = vec![
            video("137", "1920x1080"),
            video("136", "1280x720"),
            video("248", "1920x1080"),
        ];
        let classified = classify(&formats);
        let labels: Vec<_> = classified
            .video_by_resolution
            .iter()
            .map(|g| g.label.as_str())
            .collect();
        assert_eq!(labels, vec!["1080p", "720p"]);

        let ids: Vec<_> = classified
            .video_group("1080p")
            .unwrap()
            .formats
            .iter()
            .map(|f| f.format_id.as_str())
            .collect();
        assert_eq!(ids, vec!["137", "248"]);

        let reps: Vec<_> = classified
            .video_representatives()
            .map(|(label, f)| (label, f.format_id.as_str()))
            .collect();
        assert_eq!(reps, vec![("1080p", "137"), ("720p", "136")]);
    }

    #[test]
    fn test_drops_unclassifiable() {
        let muxed_without_resolution = FormatDescriptor::new("18", "avc1", "mp4a", "mp4");
        let storyboard = FormatDescriptor::new("sb0", "none", "none", "mhtml");
        let classified = classify(&[muxed_without_resolution, storyboard]);
        assert!(classified.is_empty());
        assert_eq!(classified.skipped, 0);
    }

    #[test]
    fn test_muxed_with_resolution_is_video() {
        let muxed = FormatDescriptor::new("18", "avc1", "mp4a", "mp4").with_resolution("640x360");
        let classified = classify(&[muxed]);
        assert!(classified.video_group("360p").is_some());
        assert!(classified.audio_sorted.is_empty());
    }

    #[test]
    fn test_unknown_video_codec_is_never_audio() {
        let json = r#"[
            {"format_id": "18", "vcodec": null, "acodec": "mp4a.40.2", "resolution": null, "ext": "mp4"},
            {"format_id": "22", "vcodec": null, "acodec": "mp4a.40.2", "resolution": "1280x720", "ext": "mp4"}
        ]"#;
        let formats: Vec<FormatDescriptor> = serde_json::from_str(json).unwrap();
        let classified = classify(&formats);
        assert!(classified.audio_sorted.is_empty());
        let reps: Vec<_> = classified
            .video_representatives()
            .map(|(label, f)| (label, f.format_id.as_str()))
            .collect();
        assert_eq!(reps, vec![("720p", "22")]);
    }

    #[test]
    fn test_unknown_audio_codec_with_no_video_is_audio() {
        let json = r#"[{"format_id": "599", "vcodec": "none", "acodec": null, "ext": "m4a"}]"#;
        let formats: Vec<FormatDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(classify(&formats).audio_sorted.len(), 1);
    }

    #[test]
    fn test_empty_resolution_is_dropped_not_skipped() {
        let classified = classify(&[video("137", "")]);
        assert!(classified.is_empty());
        assert_eq!(classified.skipped, 0);
    }

    #[test]
    fn test_malformed_resolution_is_skipped() {
        let formats = vec![
            video("bad", "audio only"),
            video("137", "1920x1080"),
            audio("140", Some(128.0)),
        ];
        let classified = classify(&formats);
        assert_eq!(classified.skipped, 1);
        assert_eq!(classified.video_by_resolution.len(), 1);
        assert_eq!(classified.audio_sorted.len(), 1);
    }

    #[test]
    fn test_each_descriptor_in_at_most_one_view() {
        let formats = vec![
            video("137", "1920x1080"),
            audio("140", Some(128.0)),
            FormatDescriptor::new("18", "avc1", "mp4a", "mp4").with_resolution("640x360"),
            FormatDescriptor::new("sb0", "none", "none", "mhtml"),
            audio("251", None),
        ];
        let classified = classify(&formats);
        for f in &formats {
            let in_video = classified
                .video_by_resolution
                .iter()
                .flat_map(|g| g.formats.iter())
                .filter(|v| v.format_id == f.format_id)
                .count();
            let in_audio = classified
                .audio_sorted
                .iter()
                .filter(|a| a.format_id == f.format_id)
                .count();
            assert!(in_video + in_audio <= 1, "{} classified twice", f.format_id);
        }
    }

    #[test]
    fn test_audio_sorted_descending_and_stable() {
        let formats = vec![
            audio("a", Some(64.0)),
            audio("b", None),
            audio("c", Some(160.0)),
            audio("d", Some(64.0)),
            audio("e", Some(128.0)),
        ];
        let ids: Vec<_> = classify(&formats)
            .audio_sorted
            .iter()
            .map(|f| f.format_id.clone())
            .collect();
        assert_eq!(ids, vec!["c", "e", "a", "d", "b"]);
    }

    #[test]
    fn test_unknown_bitrate_sorts_last() {
        let formats = vec![audio("unknown", None), audio("known", Some(128.0))];
        let ids: Vec<_> = classify(&formats)
            .audio_sorted
            .iter()
            .map(|f| f.format_id.clone())
            .collect();
        assert_eq!(ids, vec!["known", "unknown"]);
    }

    #[test]
    fn test_describe_quality() {
        let f = FormatDescriptor::new("140", "none", "mp4a", "m4a");
        assert_eq!(describe_quality(&f.clone().with_bitrate(128.6)), "129kbps");
        assert_eq!(describe_quality(&f.clone().with_bitrate(128.5)), "129kbps");
        assert_eq!(describe_quality(&f.clone().with_note("DASH audio")), "DASH audio");
        assert_eq!(describe_quality(&f), "m4a");
        assert_eq!(describe_quality(&f.clone().with_bitrate(0.0)), "m4a");
    }

    #[test]
    fn test_describe_size() {
        let f = FormatDescriptor::new("140", "none", "mp4a", "m4a");
        assert_eq!(describe_size(&f.clone().with_file_size(2097152)), "2.00 MB");
        assert_eq!(describe_size(&f.clone().with_file_size(1572864)), "1.50 MB");
        assert_eq!(describe_size(&f), "N/A");
        assert_eq!(describe_size(&f), describe_size(&f));
    }
}
