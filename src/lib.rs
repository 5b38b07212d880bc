pub mod api;
pub mod classify;
pub mod config;
pub mod core;
pub mod error;
pub mod selection;
pub mod session;
pub mod view;

pub use api::{Download, HttpService, MetadataService};
pub use classify::{ClassifiedFormats, classify, describe_quality, describe_size};
pub use config::Config;
pub use crate::core::{DownloadKind, FormatDescriptor, Status, VideoInfo};
pub use selection::{DownloadRequest, Selection};
pub use session::Session;
pub use view::{FormatOption, InfoView};

