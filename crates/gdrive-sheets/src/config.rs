//! Session configuration.

use std::time::Duration;

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the Drive v3 API.
    pub drive_base_url: String,

    /// Base URL for Drive media uploads.
    pub upload_base_url: String,

    /// Base URL of the Sheets v4 API.
    pub sheets_base_url: String,

    /// Base URL of the spreadsheet web UI, used for export links and
    /// worksheet URLs.
    pub docs_base_url: String,

    /// Timeout for a single HTTP round trip.
    pub timeout: Duration,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// `pageSize` used when listing files and permissions.
    pub page_size: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            drive_base_url: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base_url: "https://www.googleapis.com/upload/drive/v3".to_string(),
            sheets_base_url: "https://sheets.googleapis.com/v4".to_string(),
            docs_base_url: "https://docs.google.com".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("gdrive-sheets/", env!("CARGO_PKG_VERSION")).to_string(),
            page_size: 100,
        }
    }
}
