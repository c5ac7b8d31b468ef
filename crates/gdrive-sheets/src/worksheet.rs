//! Worksheet synchronizer.
//!
//! A [`Worksheet`] keeps a local [`CellStore`] of one sheet. Reads fetch the
//! whole sheet on first access; writes only touch the local copy until
//! [`Worksheet::save`] pushes them.
//!
//! `save` runs up to three requests, in this order, and stops at the first
//! failure. Whatever an earlier step already pushed stays pushed; the failed
//! step and every later one keep their pending state for the next `save`.
//!
//! 1. `updateSheetProperties` when the title, index or declared bounds
//!    changed (including growth caused by writing outside the grid)
//! 2. one `batchUpdate` carrying every queued structural request
//! 3. one `values.update` covering the bounding rectangle of the dirty cells,
//!    with `null` for the cells inside it that were not written

use std::path::Path;

use gdrive_sheets_core::{
    name_to_coords, quote_sheet_title, CellContent, CellRange, CellStore, Error as CoreError,
    List,
};
use gdrive_sheets_protocol::{
    Borders, CellData, CellFormat, Color, DeleteSheetRequest, ExtendedValue, GridProperties,
    GridRange, HorizontalAlign, MergeCellsRequest, MergeType, NumberFormat, RepeatCellRequest,
    Request, Sheet, SheetProperties, Spreadsheet as SpreadsheetResource, TextFormat,
    UnmergeCellsRequest, UpdateBordersRequest, UpdateSheetPropertiesRequest,
    UpdateValuesResponse, ValueRange, VerticalAlign,
};

use crate::error::{Error, Result};
use crate::session::Session;
use crate::spreadsheet::batch_update;
use crate::transport::Method;

/// Partial response requested by a reload
const RELOAD_FIELDS: &str =
    "sheets(properties,data.rowData.values(formattedValue,userEnteredValue,effectiveValue))";

/// Which properties were changed locally since the last fetch or push.
///
/// Each flag maps to one entry of the `updateSheetProperties` field mask, so
/// the metadata step never overwrites a property nobody touched.
#[derive(Debug, Default, Clone, Copy)]
struct MetadataEdits {
    title: bool,
    index: bool,
    rows: bool,
    cols: bool,
}

impl MetadataEdits {
    fn any(&self) -> bool {
        self.title || self.index || self.rows || self.cols
    }

    fn mask(&self) -> String {
        let fields = [
            (self.title, "title"),
            (self.index, "index"),
            (self.rows, "gridProperties.rowCount"),
            (self.cols, "gridProperties.columnCount"),
        ];
        fields
            .iter()
            .filter(|(edited, _)| *edited)
            .map(|(_, field)| *field)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Where a worksheet stands relative to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No cells fetched yet, nothing pending
    Uninitialized,
    /// Cells fetched, nothing pending
    Clean,
    /// Dirty cells, changed metadata or queued structural requests
    Dirty,
}

/// One sheet of a spreadsheet, with a local cell cache
#[derive(Debug)]
pub struct Worksheet<'s> {
    session: &'s Session,
    spreadsheet_key: String,
    sheet_id: i64,
    title: String,
    /// Title the server currently knows; used to address the sheet
    remote_title: String,
    index: u32,
    cells: CellStore,
    loaded: bool,
    edits: MetadataEdits,
    pending: Vec<Request>,
    deleted: bool,
}

impl<'s> Worksheet<'s> {
    pub(crate) fn new(session: &'s Session, spreadsheet_key: &str, properties: SheetProperties) -> Self {
        Self {
            session,
            spreadsheet_key: spreadsheet_key.to_string(),
            sheet_id: properties.sheet_id(),
            remote_title: properties.title.clone(),
            index: properties.index(),
            cells: CellStore::new(properties.row_count(), properties.column_count()),
            title: properties.title,
            loaded: false,
            edits: MetadataEdits::default(),
            pending: Vec::new(),
            deleted: false,
        }
    }

    pub fn state(&self) -> SyncState {
        if self.metadata_modified() || !self.pending.is_empty() || self.cells.is_dirty() {
            SyncState::Dirty
        } else if self.loaded {
            SyncState::Clean
        } else {
            SyncState::Uninitialized
        }
    }

    /// Is anything waiting for [`save`](Self::save)?
    pub fn is_dirty(&self) -> bool {
        self.state() == SyncState::Dirty
    }

    /// Whether a queued `deleteSheet` has been flushed
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Local metadata edits plus bounds grown by out-of-grid writes
    fn metadata_edits(&self) -> MetadataEdits {
        let grew = self.cells.declared_bounds_grew();
        MetadataEdits {
            rows: self.edits.rows || grew,
            cols: self.edits.cols || grew,
            ..self.edits
        }
    }

    fn metadata_modified(&self) -> bool {
        self.metadata_edits().any()
    }

    // -- Synchronization --

    /// Discard local state and fetch cells and properties from the server.
    ///
    /// Pending writes, metadata changes and queued requests are dropped.
    pub fn reload(&mut self) -> Result<()> {
        let sheet = self.fetch()?;
        self.adopt_properties(&sheet.properties);
        let (rows, cols) = (sheet.properties.row_count(), sheet.properties.column_count());
        self.cells.load(grid_cells(sheet), rows, cols);

        self.loaded = true;
        self.edits = MetadataEdits::default();
        self.pending.clear();
        tracing::info!(
            "Reloaded worksheet '{}': {} cells, {}x{} grid",
            self.title,
            self.cells.cell_count(),
            rows,
            cols
        );
        Ok(())
    }

    /// Push pending changes. Returns whether any request was sent.
    pub fn save(&mut self) -> Result<bool> {
        let mut sent = false;

        let edits = self.metadata_edits();
        if edits.any() {
            let request = Request::UpdateSheetProperties(UpdateSheetPropertiesRequest {
                properties: SheetProperties {
                    sheet_id: Some(self.sheet_id),
                    title: self.title.clone(),
                    index: Some(self.index),
                    sheet_type: None,
                    grid_properties: Some(GridProperties {
                        row_count: Some(self.cells.max_rows()),
                        column_count: Some(self.cells.max_cols()),
                        ..GridProperties::default()
                    }),
                },
                fields: edits.mask(),
            });
            batch_update(self.session, &self.spreadsheet_key, vec![request])?;

            self.edits = MetadataEdits::default();
            self.cells.clear_declared_bounds_grew();
            self.remote_title = self.title.clone();
            sent = true;
        }

        if !self.pending.is_empty() {
            let requests = self.pending.clone();
            let deletes = requests
                .iter()
                .any(|r| matches!(r, Request::DeleteSheet(_)));
            batch_update(self.session, &self.spreadsheet_key, requests)?;

            let flushed = self.pending.len();
            self.pending.clear();
            sent = true;

            if deletes {
                // The sheet is gone, so there is nowhere to write the cells
                self.deleted = true;
                self.cells.clear_dirty();
                tracing::info!("Deleted worksheet '{}'", self.title);
                return Ok(sent);
            }
            tracing::debug!("Flushed {flushed} queued requests for '{}'", self.title);
        }

        if let Some(range) = self.cells.dirty_range() {
            let reference = range.to_r1c1_reference(&self.remote_title);
            let values: Vec<Vec<Option<String>>> = (range.start.row..=range.end.row)
                .map(|row| {
                    (range.start.col..=range.end.col)
                        .map(|col| {
                            self.cells
                                .is_cell_dirty(row, col)
                                .then(|| self.cells.get_input(row, col).to_string())
                        })
                        .collect()
                })
                .collect();

            let mut url = self.session.sheets_url(&[
                "spreadsheets",
                &self.spreadsheet_key,
                "values",
                &reference,
            ])?;
            url.query_pairs_mut()
                .append_pair("valueInputOption", "USER_ENTERED");

            let body = ValueRange {
                range: reference.clone(),
                major_dimension: Some("ROWS".to_string()),
                values,
            };
            let _: UpdateValuesResponse = self.session.send_json(Method::Put, url, &body)?;

            tracing::info!(
                "Saved {} cells of '{}' in {reference}",
                self.cells.dirty_count(),
                self.title
            );
            self.cells.clear_dirty();
            sent = true;
        }

        Ok(sent)
    }

    /// [`save`](Self::save), then [`reload`](Self::reload).
    pub fn synchronize(&mut self) -> Result<()> {
        self.save()?;
        self.reload()
    }

    fn fetch(&self) -> Result<Sheet> {
        let mut url = self
            .session
            .sheets_url(&["spreadsheets", &self.spreadsheet_key])?;
        url.query_pairs_mut()
            .append_pair("ranges", &quote_sheet_title(&self.remote_title))
            .append_pair("fields", RELOAD_FIELDS);

        let resource: SpreadsheetResource = self.session.get_json(url)?;
        resource.sheets.into_iter().next().ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "spreadsheet {} has no sheet '{}'",
                self.spreadsheet_key, self.remote_title
            ))
        })
    }

    fn adopt_properties(&mut self, properties: &SheetProperties) {
        self.sheet_id = properties.sheet_id();
        self.title = properties.title.clone();
        self.remote_title = properties.title.clone();
        self.index = properties.index();
    }

    /// First cell access: fetch the cells without dropping local metadata
    /// edits or queued requests.
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        let sheet = self.fetch()?;
        let (title, index) = (self.title.clone(), self.index);
        let (local_rows, local_cols) = (self.cells.max_rows(), self.cells.max_cols());
        self.adopt_properties(&sheet.properties);
        if self.edits.title {
            self.title = title;
        }
        if self.edits.index {
            self.index = index;
        }

        // Bounds nobody edited follow the server, which may have grown since
        // the sheet was listed
        let (rows, cols) = (sheet.properties.row_count(), sheet.properties.column_count());
        self.cells.load(grid_cells(sheet), rows, cols);
        if self.edits.rows {
            self.cells.set_max_rows(local_rows);
        }
        if self.edits.cols {
            self.cells.set_max_cols(local_cols);
        }

        self.loaded = true;
        tracing::debug!("Loaded {} cells of '{}'", self.cells.cell_count(), self.title);
        Ok(())
    }

    // -- Cells --

    /// Formatted value of a cell
    pub fn cell(&mut self, row: u32, col: u32) -> Result<&str> {
        self.ensure_loaded()?;
        Ok(self.cells.get(row, col))
    }

    /// Formatted value of a cell by name, e.g. `"B3"`
    pub fn cell_by_name(&mut self, name: &str) -> Result<&str> {
        let (row, col) = name_to_coords(name)?;
        self.cell(row, col)
    }

    /// Input value (literal or formula) of a cell
    pub fn input_value(&mut self, row: u32, col: u32) -> Result<&str> {
        self.ensure_loaded()?;
        Ok(self.cells.get_input(row, col))
    }

    /// Numeric value of a cell, known once the server has seen it
    pub fn numeric_value(&mut self, row: u32, col: u32) -> Result<Option<f64>> {
        self.ensure_loaded()?;
        Ok(self.cells.get_numeric(row, col))
    }

    pub fn set_cell(&mut self, row: u32, col: u32, value: impl Into<String>) -> Result<()> {
        self.ensure_loaded()?;
        self.cells.set(row, col, value)?;
        Ok(())
    }

    pub fn set_cell_by_name(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let (row, col) = name_to_coords(name)?;
        self.set_cell(row, col, value)
    }

    /// Write a block of values with its top-left corner at (`top`, `left`).
    ///
    /// Every value is checked before anything is written.
    pub fn update_cells<R, S>(&mut self, top: u32, left: u32, values: &[R]) -> Result<()>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.ensure_loaded()?;
        check_block(top, left, values)?;
        for (i, row) in values.iter().enumerate() {
            for (j, value) in row.as_ref().iter().enumerate() {
                self.cells
                    .set(top + i as u32, left + j as u32, value.as_ref())?;
            }
        }
        Ok(())
    }

    /// Highest row holding a value
    pub fn num_rows(&mut self) -> Result<u32> {
        self.ensure_loaded()?;
        Ok(self.cells.num_rows())
    }

    /// Highest column holding a value
    pub fn num_cols(&mut self) -> Result<u32> {
        self.ensure_loaded()?;
        Ok(self.cells.num_cols())
    }

    /// Formatted values over the content bounds, skipping `skip` rows
    pub fn rows(&mut self, skip: u32) -> Result<Vec<Vec<String>>> {
        self.ensure_loaded()?;
        Ok(self.cells.rows(skip))
    }

    /// Read-only access to the local cell store
    pub fn cells(&mut self) -> Result<&CellStore> {
        self.ensure_loaded()?;
        Ok(&self.cells)
    }

    /// Row-oriented view keyed by the header row
    pub fn list(&mut self) -> Result<List<'_>> {
        self.ensure_loaded()?;
        Ok(List::new(&mut self.cells))
    }

    // -- Metadata --

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.edits.title = true;
    }

    /// Position among the spreadsheet's tabs (0-based)
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn set_index(&mut self, index: u32) {
        self.index = index;
        self.edits.index = true;
    }

    /// The sheet id (`gid`)
    pub fn sheet_id(&self) -> i64 {
        self.sheet_id
    }

    pub fn spreadsheet_key(&self) -> &str {
        &self.spreadsheet_key
    }

    /// Declared row count
    pub fn max_rows(&self) -> u32 {
        self.cells.max_rows()
    }

    /// Change the declared row count; shrinking drops the removed rows.
    pub fn set_max_rows(&mut self, rows: u32) {
        self.cells.set_max_rows(rows);
        self.edits.rows = true;
    }

    /// Declared column count
    pub fn max_cols(&self) -> u32 {
        self.cells.max_cols()
    }

    /// Change the declared column count; shrinking drops the removed columns.
    pub fn set_max_cols(&mut self, cols: u32) {
        self.cells.set_max_cols(cols);
        self.edits.cols = true;
    }

    /// URL of this sheet in the web UI
    pub fn human_url(&self) -> String {
        format!(
            "{}/spreadsheets/d/{}/edit#gid={}",
            self.session.config().docs_base_url.trim_end_matches('/'),
            self.spreadsheet_key,
            self.sheet_id
        )
    }

    // -- Row structure --

    /// Insert `rows` before row `row`, shifting the rows below it down.
    ///
    /// `row` may be one past the last declared row to append. Each inserted
    /// row is filled from the corresponding slice; missing values are blank.
    pub fn insert_rows<R, S>(&mut self, row: u32, rows: &[R]) -> Result<()>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        self.ensure_loaded()?;
        let max_rows = self.cells.max_rows();
        if row == 0 || row > max_rows + 1 {
            return Err(CoreError::out_of_range(format!(
                "cannot insert at row {row} of a worksheet with {max_rows} rows"
            ))
            .into());
        }
        if rows.is_empty() {
            return Ok(());
        }
        check_block(row, 1, rows)?;

        let count = rows.len() as u32;
        self.set_max_rows(max_rows + count);

        let num_rows = self.cells.num_rows();
        let num_cols = self.cells.num_cols();
        for r in (row..=num_rows).rev() {
            for c in 1..=num_cols {
                let value = self.cells.get_input(r, c).to_string();
                self.cells.set(r + count, c, value)?;
            }
        }

        let width = rows
            .iter()
            .map(|values| values.as_ref().len() as u32)
            .max()
            .unwrap_or(0)
            .max(num_cols);
        for (i, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            for c in 1..=width {
                let value = values.get(c as usize - 1).map_or("", |v| v.as_ref());
                self.cells.set(row + i as u32, c, value)?;
            }
        }
        Ok(())
    }

    /// Insert `count` blank rows before row `row`.
    pub fn insert_blank_rows(&mut self, row: u32, count: u32) -> Result<()> {
        let rows: Vec<Vec<&str>> = vec![Vec::new(); count as usize];
        self.insert_rows(row, &rows)
    }

    /// Delete `count` rows starting at `row`, shifting the rows below up.
    pub fn delete_rows(&mut self, row: u32, count: u32) -> Result<()> {
        self.ensure_loaded()?;
        let max_rows = self.cells.max_rows();
        let in_range = row >= 1 && row.checked_add(count).map_or(false, |end| end - 1 <= max_rows);
        if !in_range {
            return Err(CoreError::out_of_range(format!(
                "cannot delete {count} rows at row {row} of a worksheet with {max_rows} rows"
            ))
            .into());
        }
        if count == 0 {
            return Ok(());
        }

        let last = self.cells.num_rows().min(max_rows - count);
        let num_cols = self.cells.num_cols();
        for r in row..=last {
            for c in 1..=num_cols {
                let value = self.cells.get_input(r + count, c).to_string();
                self.cells.set(r, c, value)?;
            }
        }
        self.set_max_rows(max_rows - count);
        Ok(())
    }

    // -- Structural requests (sent by the next save) --

    /// Queued requests not yet sent
    pub fn pending_requests(&self) -> &[Request] {
        &self.pending
    }

    /// Queue any batch-update request.
    pub fn add_request(&mut self, request: Request) {
        self.pending.push(request);
    }

    pub fn merge_cells(&mut self, range: CellRange, merge_type: MergeType) {
        let range = self.grid_range(&range);
        self.add_request(Request::MergeCells(MergeCellsRequest { range, merge_type }));
    }

    pub fn unmerge_cells(&mut self, range: CellRange) {
        let range = self.grid_range(&range);
        self.add_request(Request::UnmergeCells(UnmergeCellsRequest { range }));
    }

    pub fn set_number_format(&mut self, range: CellRange, format: NumberFormat) {
        self.repeat_format(
            range,
            CellFormat {
                number_format: Some(format),
                ..CellFormat::default()
            },
            "numberFormat",
        );
    }

    pub fn set_horizontal_alignment(&mut self, range: CellRange, alignment: HorizontalAlign) {
        self.repeat_format(
            range,
            CellFormat {
                horizontal_alignment: Some(alignment),
                ..CellFormat::default()
            },
            "horizontalAlignment",
        );
    }

    pub fn set_vertical_alignment(&mut self, range: CellRange, alignment: VerticalAlign) {
        self.repeat_format(
            range,
            CellFormat {
                vertical_alignment: Some(alignment),
                ..CellFormat::default()
            },
            "verticalAlignment",
        );
    }

    pub fn set_text_format(&mut self, range: CellRange, format: TextFormat) {
        self.repeat_format(
            range,
            CellFormat {
                text_format: Some(format),
                ..CellFormat::default()
            },
            "textFormat",
        );
    }

    pub fn set_background_color(&mut self, range: CellRange, color: Color) {
        self.repeat_format(
            range,
            CellFormat {
                background_color: Some(color),
                ..CellFormat::default()
            },
            "backgroundColor",
        );
    }

    /// Set the outer borders of a range.
    pub fn update_borders(&mut self, range: CellRange, borders: Borders) {
        let range = self.grid_range(&range);
        self.add_request(Request::UpdateBorders(UpdateBordersRequest {
            range,
            top: borders.top,
            bottom: borders.bottom,
            left: borders.left,
            right: borders.right,
            inner_horizontal: None,
            inner_vertical: None,
        }));
    }

    /// Queue deletion of this sheet. Once saved, pending cell writes are
    /// discarded.
    pub fn delete(&mut self) {
        self.add_request(Request::DeleteSheet(DeleteSheetRequest {
            sheet_id: self.sheet_id,
        }));
    }

    fn repeat_format(&mut self, range: CellRange, format: CellFormat, field: &str) {
        let range = self.grid_range(&range);
        self.add_request(Request::RepeatCell(RepeatCellRequest {
            range,
            cell: CellData {
                user_entered_format: Some(format),
                ..CellData::default()
            },
            fields: format!("userEnteredFormat.{field}"),
        }));
    }

    /// 1-based inclusive range to the API's 0-based half-open grid range
    fn grid_range(&self, range: &CellRange) -> GridRange {
        GridRange {
            sheet_id: self.sheet_id,
            start_row_index: range.start.row.saturating_sub(1),
            end_row_index: range.end.row,
            start_column_index: range.start.col.saturating_sub(1),
            end_column_index: range.end.col,
        }
    }

    // -- Export --

    /// This sheet as CSV
    pub fn export_as_bytes(&self) -> Result<Vec<u8>> {
        let mut url = self
            .session
            .docs_url(&["spreadsheets", "d", &self.spreadsheet_key, "export"])?;
        url.query_pairs_mut()
            .append_pair("format", "csv")
            .append_pair("gid", &self.sheet_id.to_string());
        self.session.get_bytes(url)
    }

    pub fn export_as_string(&self) -> Result<String> {
        String::from_utf8(self.export_as_bytes()?)
            .map_err(|e| Error::UnexpectedResponse(format!("CSV export is not UTF-8: {e}")))
    }

    pub fn export_as_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.export_as_bytes()?)?;
        Ok(())
    }
}

fn check_block<R, S>(top: u32, left: u32, values: &[R]) -> Result<()>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    for (i, row) in values.iter().enumerate() {
        for (j, value) in row.as_ref().iter().enumerate() {
            CellStore::check_value(top + i as u32, left + j as u32, value.as_ref())?;
        }
    }
    Ok(())
}

/// Cells of a fetched sheet, keyed by 1-based coordinates
fn grid_cells(sheet: Sheet) -> Vec<((u32, u32), CellContent)> {
    let mut cells = Vec::new();
    for grid in sheet.data {
        let top = grid.start_row.unwrap_or(0);
        let left = grid.start_column.unwrap_or(0);
        for (r, row) in grid.row_data.into_iter().enumerate() {
            for (c, cell) in row.values.into_iter().enumerate() {
                let coords = (top + r as u32 + 1, left + c as u32 + 1);
                cells.push((coords, cell_content(cell)));
            }
        }
    }
    cells
}

fn cell_content(cell: CellData) -> CellContent {
    CellContent::remote(
        cell.formatted_value.unwrap_or_default(),
        cell.user_entered_value
            .as_ref()
            .map(input_text)
            .unwrap_or_default(),
        cell.effective_value.and_then(|v| v.number_value),
    )
}

/// Text of a user-entered value, as it would be typed
fn input_text(value: &ExtendedValue) -> String {
    if let Some(formula) = &value.formula_value {
        formula.clone()
    } else if let Some(s) = &value.string_value {
        s.clone()
    } else if let Some(n) = value.number_value {
        format_number(n)
    } else if let Some(b) = value.bool_value {
        if b { "TRUE" } else { "FALSE" }.to_string()
    } else {
        String::new()
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
