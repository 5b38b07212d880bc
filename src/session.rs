use tracing::{debug, warn};

use crate::api::MetadataService;
use crate::classify::{ClassifiedFormats, classify};
use crate::core::{Status, VideoInfo};
use crate::error::{Result, YtteError};
use crate::selection::{DownloadRequest, Selection, validate_audio_only, validate_combined};
use crate::view::InfoView;

/// Issued when a fetch starts, handed back when it finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub url: String,
}

#[derive(Debug, Clone)]
struct Loaded {
    title: String,
    thumbnail: Option<String>,
    formats: ClassifiedFormats,
}

/// State of one user session: the URL being worked on and what the service said about it
#[derive(Debug, Clone, Default)]
pub struct Session {
    current_url: Option<String>,
    loaded: Option<Loaded>,
    status: Status,
    last_error: Option<String>,
    latest_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn formats(&self) -> Option<&ClassifiedFormats> {
        self.loaded.as_ref().map(|l| &l.formats)
    }

    pub fn view(&self) -> Option<InfoView> {
        self.loaded
            .as_ref()
            .map(|l| InfoView::new(&l.title, l.thumbnail.as_deref(), &l.formats))
    }

    /// Start a fetch. An empty URL is rejected without touching the state.
    pub fn begin_fetch(&mut self, url: &str) -> Result<FetchTicket> {
        let url = url.trim();
        if url.is_empty() {
            return Err(YtteError::EmptyUrl);
        }
        self.latest_seq += 1;
        self.current_url = Some(url.to_string());
        self.loaded = None;
        self.last_error = None;
        self.status = Status::Fetching;
        debug!(seq = self.latest_seq, url, "fetch started");
        Ok(FetchTicket {
            seq: self.latest_seq,
            url: url.to_string(),
        })
    }

    fn is_latest(&self, ticket: &FetchTicket) -> bool {
        if ticket.seq == self.latest_seq {
            return true;
        }
        warn!(
            seq = ticket.seq,
            latest = self.latest_seq,
            url = %ticket.url,
            "discarding stale fetch result"
        );
        false
    }

    /// Apply a fetch result. Returns false when a newer fetch has been started since.
    pub fn complete_fetch(&mut self, ticket: &FetchTicket, info: VideoInfo) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        let formats = classify(&info.formats);
        self.loaded = Some(Loaded {
            title: info.title,
            thumbnail: info.thumbnail,
            formats,
        });
        self.status = Status::Ready;
        true
    }

    /// Record a failed fetch. Returns false for a stale ticket.
    pub fn fail_fetch(&mut self, ticket: &FetchTicket, error: &YtteError) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.loaded = None;
        self.last_error = Some(error.to_string());
        self.status = Status::Failed;
        true
    }

    /// Fetch and classify `url`, replacing whatever was loaded
    pub async fn fetch<S>(&mut self, service: &S, url: &str) -> Result<()>
    where
        S: MetadataService + ?Sized,
    {
        let ticket = self.begin_fetch(url)?;
        match service.fetch_info(&ticket.url).await {
            Ok(info) => {
                self.complete_fetch(&ticket, info);
                Ok(())
            }
            Err(e) => {
                self.fail_fetch(&ticket, &e);
                Err(e)
            }
        }
    }

    fn ready(&self) -> Result<(&str, &ClassifiedFormats)> {
        match (&self.current_url, &self.loaded, self.status) {
            (Some(url), Some(loaded), Status::Ready) => Ok((url.as_str(), &loaded.formats)),
            _ => Err(YtteError::NoMetadata),
        }
    }

    pub fn combined_request(&self, selection: &Selection) -> Result<DownloadRequest> {
        let (url, formats) = self.ready()?;
        validate_combined(url, selection, formats)
    }

    pub fn audio_request(&self, selection: &Selection) -> Result<DownloadRequest> {
        let (url, formats) = self.ready()?;
        validate_audio_only(url, selection, formats)
    }
}
