//! Sheets v4 resources: spreadsheets, sheets, grid data and value ranges.

use serde::{Deserialize, Serialize};

use crate::requests::CellFormat;

/// A spreadsheet resource (only the parts requested through `fields`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<SpreadsheetProperties>,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetProperties {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// One tab of a spreadsheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    #[serde(default)]
    pub properties: SheetProperties,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<GridData>,
}

/// Sheet properties; `sheetId` and `index` are omitted by the API when 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_properties: Option<GridProperties>,
}

impl SheetProperties {
    /// The sheet id (gid); absent on the wire means 0
    pub fn sheet_id(&self) -> i64 {
        self.sheet_id.unwrap_or(0)
    }

    /// Position among the spreadsheet's tabs; absent on the wire means 0
    pub fn index(&self) -> u32 {
        self.index.unwrap_or(0)
    }

    /// Declared row count
    pub fn row_count(&self) -> u32 {
        self.grid_properties
            .as_ref()
            .and_then(|g| g.row_count)
            .unwrap_or(0)
    }

    /// Declared column count
    pub fn column_count(&self) -> u32 {
        self.grid_properties
            .as_ref()
            .and_then(|g| g.column_count)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_row_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_column_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,
    #[serde(default)]
    pub row_data: Vec<RowData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowData {
    #[serde(default)]
    pub values: Vec<CellData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_entered_value: Option<ExtendedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_value: Option<ExtendedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_entered_format: Option<CellFormat>,
}

/// A typed cell value; exactly one field is set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_value: Option<ErrorValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorValue {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `values.update`; `None` cells serialize as JSON `null`
/// ("leave this cell unchanged").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: u32,
    #[serde(default)]
    pub updated_columns: u32,
    #[serde(default)]
    pub updated_cells: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateSpreadsheetResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// One reply per request of a batch update; empty for most request kinds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_sheet: Option<AddSheetReply>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddSheetReply {
    pub properties: SheetProperties,
}
