//! # gdrive-sheets
//!
//! A client for Google Drive and Google Sheets.
//!
//! Drive files, folders and permissions are thin wrappers over the REST API.
//! Worksheets are different: each [`Worksheet`] keeps a local copy of its
//! cells, fetched on first access. Edits stay local until
//! [`Worksheet::save`] pushes them in as few requests as possible.
//!
//! ## Features
//!
//! - Search, download, export, upload and trash Drive files
//! - Folder navigation and membership
//! - Permission listing, granting and revocation
//! - Cell reads and writes by coordinates or by name (`"B3"`)
//! - Row insertion and deletion, resizing and renaming of worksheets
//! - A header-keyed row view ([`List`])
//! - Queued formatting requests (merges, number formats, borders, colors)
//!
//! ## Example
//!
//! ```no_run
//! use gdrive_sheets::prelude::*;
//!
//! # fn main() -> gdrive_sheets::Result<()> {
//! let session = Session::from_access_token("ya29.token")?;
//! let spreadsheet = session.spreadsheet_by_key("1AbCdEf")?;
//! let mut worksheet = spreadsheet.worksheets()?.remove(0);
//!
//! worksheet.set_cell_by_name("A1", "3")?;
//! worksheet.set_cell(1, 2, "5")?;
//! worksheet.set_cell(1, 3, "=A1+B1")?;
//! worksheet.synchronize()?;
//!
//! assert_eq!(worksheet.cell(1, 3)?, "8");
//! # Ok(())
//! # }
//! ```

pub mod acl;
pub mod collection;
pub mod config;
pub mod error;
pub mod file;
pub mod prelude;
pub mod query;
pub mod session;
pub mod spreadsheet;
pub mod transport;
pub mod urls;
pub mod worksheet;

pub use acl::{Acl, NotificationOptions};
pub use collection::Collection;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use file::{DriveItem, File};
pub use query::{Field, Literal, Operator, Query};
pub use session::{AuthFailHook, FileListOptions, FilePage, Session, UploadOptions};
pub use spreadsheet::Spreadsheet;
pub use transport::{
    AccessTokenProvider, HttpRequest, HttpResponse, Method, RequestBody, StaticToken, Transport,
    TransportError,
};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use worksheet::{SyncState, Worksheet};

// Re-export core types
pub use gdrive_sheets_core::{
    name_to_coords, CellAddress, CellContent, CellRange, CellStore, List, Record,
};

pub use gdrive_sheets_protocol as protocol;
