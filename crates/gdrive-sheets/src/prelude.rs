//! Prelude module - common imports for gdrive-sheets users
//!
//! ```rust
//! use gdrive_sheets::prelude::*;
//! ```

pub use crate::{
    // Addressing
    name_to_coords,
    CellAddress,
    CellRange,

    Collection,
    DriveItem,
    // Error types
    Error,
    File,
    FileListOptions,
    List,
    Query,
    Record,
    Result,

    // Main types
    Session,
    SessionConfig,
    Spreadsheet,
    SyncState,
    UploadOptions,
    Worksheet,
};
