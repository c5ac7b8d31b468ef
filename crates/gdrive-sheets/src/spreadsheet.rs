//! Spreadsheets: worksheet listing, creation and batch updates.

use gdrive_sheets_protocol::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, BatchUpdateSpreadsheetResponse,
    GridProperties, Request, SheetProperties, Spreadsheet as SpreadsheetResource,
};

use crate::error::{Error, Result};
use crate::file::File;
use crate::session::Session;
use crate::transport::Method;
use crate::worksheet::Worksheet;

/// A Google spreadsheet
#[derive(Debug, Clone)]
pub struct Spreadsheet<'s> {
    file: File<'s>,
}

impl<'s> Spreadsheet<'s> {
    pub(crate) fn new(file: File<'s>) -> Self {
        Self { file }
    }

    /// The spreadsheet key (its Drive file id)
    pub fn key(&self) -> &str {
        self.file.id()
    }

    pub fn title(&self) -> &str {
        self.file.title()
    }

    pub fn human_url(&self) -> Option<&str> {
        self.file.human_url()
    }

    pub fn as_file(&self) -> &File<'s> {
        &self.file
    }

    pub fn into_file(self) -> File<'s> {
        self.file
    }

    fn session(&self) -> &'s Session {
        self.file.session()
    }

    /// All worksheets, in tab order. Cells are fetched lazily per worksheet.
    pub fn worksheets(&self) -> Result<Vec<Worksheet<'s>>> {
        let mut url = self.session().sheets_url(&["spreadsheets", self.key()])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties");

        let resource: SpreadsheetResource = self.session().get_json(url)?;
        let mut worksheets: Vec<Worksheet<'s>> = resource
            .sheets
            .into_iter()
            .map(|sheet| Worksheet::new(self.session(), self.key(), sheet.properties))
            .collect();
        worksheets.sort_by_key(|ws| ws.index());
        Ok(worksheets)
    }

    pub fn worksheet_by_title(&self, title: &str) -> Result<Option<Worksheet<'s>>> {
        Ok(self.worksheets()?.into_iter().find(|ws| ws.title() == title))
    }

    pub fn worksheet_by_sheet_id(&self, sheet_id: i64) -> Result<Option<Worksheet<'s>>> {
        Ok(self
            .worksheets()?
            .into_iter()
            .find(|ws| ws.sheet_id() == sheet_id))
    }

    /// Add a worksheet; `index` defaults to the end.
    pub fn add_worksheet(
        &self,
        title: &str,
        max_rows: u32,
        max_cols: u32,
        index: Option<u32>,
    ) -> Result<Worksheet<'s>> {
        let request = Request::AddSheet(AddSheetRequest {
            properties: SheetProperties {
                title: title.to_string(),
                index,
                grid_properties: Some(GridProperties {
                    row_count: Some(max_rows),
                    column_count: Some(max_cols),
                    ..GridProperties::default()
                }),
                ..SheetProperties::default()
            },
        });

        tracing::info!("Adding worksheet '{title}' ({max_rows}x{max_cols}) to {}", self.key());
        let response = self.batch_update(vec![request])?;
        let properties = response
            .replies
            .into_iter()
            .find_map(|reply| reply.add_sheet)
            .map(|reply| reply.properties)
            .ok_or_else(|| Error::UnexpectedResponse("addSheet returned no properties".into()))?;

        Ok(Worksheet::new(self.session(), self.key(), properties))
    }

    /// Send `requests` in one `spreadsheets.batchUpdate` call.
    pub fn batch_update(&self, requests: Vec<Request>) -> Result<BatchUpdateSpreadsheetResponse> {
        batch_update(self.session(), self.key(), requests)
    }
}

pub(crate) fn batch_update(
    session: &Session,
    key: &str,
    requests: Vec<Request>,
) -> Result<BatchUpdateSpreadsheetResponse> {
    let url = session.sheets_url(&["spreadsheets", &format!("{key}:batchUpdate")])?;
    tracing::debug!(
        "batchUpdate on {key}: {}",
        requests.iter().map(Request::kind).collect::<Vec<_>>().join(", ")
    );
    session.send_json(Method::Post, url, &BatchUpdateSpreadsheetRequest { requests })
}
