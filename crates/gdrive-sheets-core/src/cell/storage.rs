//! Sparse cell store
//!
//! Holds the local copy of a worksheet's cells together with the set of
//! coordinates written since the last save or reload. Only non-empty cells
//! are stored, using a row-based BTreeMap structure.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use super::value::find_invalid_char;
use super::{CellContent, CellRange};
use crate::error::{Error, Result};

/// Sparse row-based storage for worksheet cells with dirty tracking
///
/// Structure: `BTreeMap<row, BTreeMap<col, CellContent>>`, 1-based.
///
/// Declared bounds (`max_rows`/`max_cols`) are worksheet metadata and are
/// independent from the content bounds (`num_rows`/`num_cols`), which are
/// derived from the highest non-empty input value and memoized.
#[derive(Debug, Default)]
pub struct CellStore {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u32, CellContent>>,

    /// Coordinates written since the last save/reload
    dirty: BTreeSet<(u32, u32)>,

    /// Declared row count
    max_rows: u32,

    /// Declared column count
    max_cols: u32,

    /// Set when a write pushed the declared bounds outwards
    declared_grew: bool,

    /// Memoized content bounds (`None` = unknown, recompute on next read)
    num_rows: Cell<Option<u32>>,
    num_cols: Cell<Option<u32>>,
}

impl CellStore {
    /// Create an empty store with the given declared bounds
    pub fn new(max_rows: u32, max_cols: u32) -> Self {
        Self {
            max_rows,
            max_cols,
            ..Self::default()
        }
    }

    /// Replace the whole store with server-authoritative content
    ///
    /// Clears the dirty set and the declared-bounds-grew flag.
    pub fn load<I>(&mut self, cells: I, max_rows: u32, max_cols: u32)
    where
        I: IntoIterator<Item = ((u32, u32), CellContent)>,
    {
        self.rows.clear();
        for ((row, col), content) in cells {
            if row == 0 || col == 0 || (content.is_empty() && content.formatted.is_empty()) {
                continue;
            }
            self.rows.entry(row).or_default().insert(col, content);
        }
        self.dirty.clear();
        self.max_rows = max_rows;
        self.max_cols = max_cols;
        self.declared_grew = false;
        self.invalidate_bounds();
    }

    /// Get the full content of a cell, if any
    pub fn content(&self, row: u32, col: u32) -> Option<&CellContent> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Formatted (display) value; empty string if absent
    pub fn get(&self, row: u32, col: u32) -> &str {
        self.content(row, col).map_or("", |c| c.formatted.as_str())
    }

    /// Input value (literal or formula); empty string if absent
    pub fn get_input(&self, row: u32, col: u32) -> &str {
        self.content(row, col).map_or("", |c| c.input.as_str())
    }

    /// Numeric value, known only after a round-trip to the server
    pub fn get_numeric(&self, row: u32, col: u32) -> Option<f64> {
        self.content(row, col).and_then(|c| c.numeric)
    }

    /// Write a value locally
    ///
    /// The value becomes both the formatted and the input value, the numeric
    /// value becomes unknown, and the coordinate joins the dirty set.
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<String>) -> Result<()> {
        if row == 0 || col == 0 {
            return Err(Error::out_of_range(format!(
                "cell R{}C{} (rows and columns start at 1)",
                row, col
            )));
        }

        let value = value.into();
        Self::check_value(row, col, &value)?;

        let empty = value.is_empty();
        if empty {
            if let Some(row_map) = self.rows.get_mut(&row) {
                row_map.remove(&col);
                if row_map.is_empty() {
                    self.rows.remove(&row);
                }
            }
        } else {
            self.rows
                .entry(row)
                .or_default()
                .insert(col, CellContent::local(value));
        }
        self.dirty.insert((row, col));

        if row > self.max_rows {
            self.max_rows = row;
            self.declared_grew = true;
        }
        if col > self.max_cols {
            self.max_cols = col;
            self.declared_grew = true;
        }

        if empty {
            // Cannot tell cheaply whether this cell defined a bound
            self.invalidate_bounds();
        } else {
            if let Some(n) = self.num_rows.get() {
                self.num_rows.set(Some(n.max(row)));
            }
            if let Some(n) = self.num_cols.get() {
                self.num_cols.set(Some(n.max(col)));
            }
        }

        Ok(())
    }

    /// Check that `value` can be written to a cell, without writing it
    pub fn check_value(row: u32, col: u32, value: &str) -> Result<()> {
        match find_invalid_char(value) {
            Some(c) => Err(Error::InvalidCellValue {
                row,
                col,
                reason: format!("contains invalid character {:?} for XML 1.0", c),
            }),
            None => Ok(()),
        }
    }

    /// Highest row holding a non-empty input value (0 if none)
    pub fn num_rows(&self) -> u32 {
        if let Some(n) = self.num_rows.get() {
            return n;
        }
        let n = self
            .rows
            .iter()
            .rev()
            .find(|(_, cols)| cols.values().any(|c| !c.is_empty()))
            .map_or(0, |(&row, _)| row);
        self.num_rows.set(Some(n));
        n
    }

    /// Highest column holding a non-empty input value (0 if none)
    pub fn num_cols(&self) -> u32 {
        if let Some(n) = self.num_cols.get() {
            return n;
        }
        let n = self
            .rows
            .values()
            .filter_map(|cols| {
                cols.iter()
                    .rev()
                    .find(|(_, c)| !c.is_empty())
                    .map(|(&col, _)| col)
            })
            .max()
            .unwrap_or(0);
        self.num_cols.set(Some(n));
        n
    }

    /// Declared row count
    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    /// Declared column count
    pub fn max_cols(&self) -> u32 {
        self.max_cols
    }

    /// Change the declared row count
    ///
    /// Shrinking drops the cells (and pending writes) of the removed rows,
    /// since the remote grid discards them too.
    pub fn set_max_rows(&mut self, rows: u32) {
        if rows < self.max_rows {
            self.rows.retain(|&row, _| row <= rows);
            self.dirty.retain(|&(row, _)| row <= rows);
            self.invalidate_bounds();
        }
        self.max_rows = rows;
    }

    /// Change the declared column count
    ///
    /// Shrinking drops the cells (and pending writes) of the removed columns.
    pub fn set_max_cols(&mut self, cols: u32) {
        if cols < self.max_cols {
            for row_map in self.rows.values_mut() {
                row_map.retain(|&col, _| col <= cols);
            }
            self.rows.retain(|_, row_map| !row_map.is_empty());
            self.dirty.retain(|&(_, col)| col <= cols);
            self.invalidate_bounds();
        }
        self.max_cols = cols;
    }

    /// Whether a `set` has grown the declared bounds since the last load
    pub fn declared_bounds_grew(&self) -> bool {
        self.declared_grew
    }

    /// Forget that declared bounds grew (after pushing them)
    pub fn clear_declared_bounds_grew(&mut self) {
        self.declared_grew = false;
    }

    /// Iterate over the dirty coordinates in row-major order
    pub fn dirty(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.dirty.iter().copied()
    }

    /// Check whether a coordinate has been written since the last save
    pub fn is_cell_dirty(&self, row: u32, col: u32) -> bool {
        self.dirty.contains(&(row, col))
    }

    /// Is there anything waiting to be pushed?
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Number of dirty coordinates
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Minimal rectangle covering every dirty coordinate
    pub fn dirty_range(&self) -> Option<CellRange> {
        CellRange::bounding(self.dirty())
    }

    /// Forget all dirty coordinates (after a successful push)
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Formatted values as a 2-D array covering the content bounds,
    /// skipping the first `skip` rows
    pub fn rows(&self, skip: u32) -> Vec<Vec<String>> {
        let num_cols = self.num_cols();
        (skip + 1..=self.num_rows())
            .map(|row| {
                (1..=num_cols)
                    .map(|col| self.get(row, col).to_string())
                    .collect()
            })
            .collect()
    }

    /// Invalidate cached content bounds
    fn invalidate_bounds(&mut self) {
        self.num_rows.set(None);
        self.num_cols.set(None);
    }
}
