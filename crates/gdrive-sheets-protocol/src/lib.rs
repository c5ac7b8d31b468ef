//! Shared payload types for the Google Drive v3 and Sheets v4 REST APIs.
//!
//! Only the fields the client actually reads or writes are modelled. Google
//! omits fields holding their default value (a `sheetId` of 0, an `index` of
//! 0, ...), so almost everything is optional or `#[serde(default)]`.

pub mod drive;
pub mod requests;
pub mod sheets;

use serde::{Deserialize, Serialize};

pub use drive::{
    mime, File, FileList, FileMetadata, Permission, PermissionList, PermissionRole,
    PermissionType, FILE_FIELDS,
};
pub use requests::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, Border, BorderStyle, Borders, CellFormat,
    Color, DeleteSheetRequest, GridRange, HorizontalAlign, MergeCellsRequest, MergeType,
    NumberFormat, NumberFormatType, RepeatCellRequest, Request, TextFormat, UnmergeCellsRequest,
    UpdateBordersRequest, UpdateSheetPropertiesRequest, VerticalAlign,
};
pub use sheets::{
    AddSheetReply, BatchUpdateSpreadsheetResponse, CellData, ErrorValue, ExtendedValue,
    GridData, GridProperties, Reply, RowData, Sheet, SheetProperties, Spreadsheet,
    SpreadsheetProperties, UpdateValuesResponse, ValueRange,
};

/// Error envelope returned by Google APIs on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Body of [`ApiErrorResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ApiErrorResponse {
    /// Best-effort extraction of the human-readable message from a raw body
    pub fn message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ApiErrorResponse>(body)
            .ok()
            .map(|r| r.error.message)
            .filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_fields_cover_classification() {
        let fields: Vec<&str> = FILE_FIELDS.split(',').collect();
        for field in ["id", "name", "mimeType", "parents", "trashed"] {
            assert!(fields.contains(&field), "missing {field}");
        }
    }

    #[test]
    fn test_error_message_from_body() {
        let body = r#"{"error":{"code":404,"message":"File not found: abc.","status":"NOT_FOUND"}}"#;
        assert_eq!(
            ApiErrorResponse::message_from_body(body).as_deref(),
            Some("File not found: abc.")
        );
        assert_eq!(ApiErrorResponse::message_from_body("<html>"), None);
    }
}
