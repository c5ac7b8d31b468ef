//! Named-column view
//!
//! Presents a [`CellStore`] as a sequence of records keyed by the header
//! values in row 1. Logical record `i` lives on physical row `i + 2`.
//!
//! Column names are resolved against row 1 on every access, so editing the
//! header row between two accesses is always observed.

use indexmap::IndexMap;

use crate::cell::CellStore;
use crate::error::{Error, Result};

/// Physical row of the header
const HEADER_ROW: u32 = 1;

/// Row-oriented view over a worksheet's cells
#[derive(Debug)]
pub struct List<'a> {
    store: &'a mut CellStore,
}

impl<'a> List<'a> {
    /// Create a view over a loaded cell store
    pub fn new(store: &'a mut CellStore) -> Self {
        Self { store }
    }

    /// Header names from row 1, left to right, without duplicates
    pub fn column_names(&self) -> Vec<String> {
        header_names(self.store)
    }

    /// Overwrite the header row, blanking any trailing header cells
    pub fn set_column_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for (i, name) in names.iter().enumerate() {
            self.store.set(HEADER_ROW, i as u32 + 1, name.as_ref())?;
        }
        for col in names.len() as u32 + 1..=self.store.num_cols() {
            self.store.set(HEADER_ROW, col, "")?;
        }
        Ok(())
    }

    /// Number of records (content rows minus the header row)
    pub fn row_count(&self) -> u32 {
        self.store.num_rows().saturating_sub(1)
    }

    /// Physical column of a header name
    pub fn column_of(&self, name: &str) -> Result<u32> {
        resolve_column(self.store, name)
    }

    /// Formatted value of a record's column
    pub fn get(&self, index: u32, name: &str) -> Result<&str> {
        let col = resolve_column(self.store, name)?;
        Ok(self.store.get(physical_row(index)?, col))
    }

    /// Write a record's column
    pub fn set(&mut self, index: u32, name: &str, value: impl Into<String>) -> Result<()> {
        let col = resolve_column(self.store, name)?;
        self.store.set(physical_row(index)?, col, value)
    }

    /// Borrow a single record
    pub fn record(&mut self, index: u32) -> Result<Record<'_>> {
        Ok(Record {
            store: &mut *self.store,
            row: physical_row(index)?,
        })
    }

    /// Append a record after the last one and fill in the given columns
    ///
    /// All names and values are checked before anything is written, so an
    /// unknown column or an invalid value leaves the grid untouched.
    pub fn push<I, K, V>(&mut self, pairs: I) -> Result<Record<'_>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let index = self.row_count();
        let mut record = self.record(index)?;
        record.update(pairs)?;
        Ok(record)
    }

    /// All records as ordered `header -> formatted value` maps
    pub fn to_maps(&self) -> Vec<IndexMap<String, String>> {
        let names = self.column_names();
        (HEADER_ROW + 1..=self.store.num_rows())
            .map(|row| record_map(self.store, &names, row))
            .collect()
    }
}

/// A single record of a [`List`], bound to one physical row
#[derive(Debug)]
pub struct Record<'a> {
    store: &'a mut CellStore,
    row: u32,
}

impl<'a> Record<'a> {
    /// Physical row backing this record
    pub fn row(&self) -> u32 {
        self.row
    }

    /// Formatted value of a column
    pub fn get(&self, name: &str) -> Result<&str> {
        let col = resolve_column(self.store, name)?;
        Ok(self.store.get(self.row, col))
    }

    /// Input value (formula or literal) of a column
    pub fn input_value(&self, name: &str) -> Result<&str> {
        let col = resolve_column(self.store, name)?;
        Ok(self.store.get_input(self.row, col))
    }

    /// Numeric value of a column, if the server reported one
    pub fn numeric_value(&self, name: &str) -> Result<Option<f64>> {
        let col = resolve_column(self.store, name)?;
        Ok(self.store.get_numeric(self.row, col))
    }

    /// Write a column
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let col = resolve_column(self.store, name)?;
        self.store.set(self.row, col, value)
    }

    /// Write several columns; unknown names and invalid values fail before
    /// anything is written
    pub fn update<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let resolved = self.resolve(pairs)?;

        for (col, value) in resolved {
            self.store.set(self.row, col, value)?;
        }
        Ok(())
    }

    /// Blank every named column, then write the given ones
    pub fn replace<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let resolved = self.resolve(pairs)?;

        let named: Vec<u32> = header_names(self.store)
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| resolve_column(self.store, name))
            .collect::<Result<_>>()?;

        for col in named {
            self.store.set(self.row, col, "")?;
        }
        for (col, value) in resolved {
            self.store.set(self.row, col, value)?;
        }
        Ok(())
    }

    /// This record as an ordered `header -> formatted value` map
    pub fn to_map(&self) -> IndexMap<String, String> {
        record_map(self.store, &header_names(self.store), self.row)
    }

    /// Map names to columns and check every value against this row
    fn resolve<I, K, V>(&self, pairs: I) -> Result<Vec<(u32, String)>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(name, value)| {
                let col = resolve_column(self.store, name.as_ref())?;
                let value = value.into();
                CellStore::check_value(self.row, col, &value)?;
                Ok((col, value))
            })
            .collect()
    }
}

fn physical_row(index: u32) -> Result<u32> {
    index
        .checked_add(HEADER_ROW + 1)
        .ok_or_else(|| Error::out_of_range(format!("record index {} is past the last row", index)))
}

fn header_names(store: &CellStore) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for col in 1..=store.max_cols() {
        let name = store.get(HEADER_ROW, col);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn resolve_column(store: &CellStore, name: &str) -> Result<u32> {
    (1..=store.max_cols())
        .find(|&col| store.get(HEADER_ROW, col) == name)
        .ok_or_else(|| Error::UnknownColumn(name.to_string()))
}

fn record_map(store: &CellStore, names: &[String], row: u32) -> IndexMap<String, String> {
    names
        .iter()
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            resolve_column(store, name)
                .ok()
                .map(|col| (name.clone(), store.get(row, col).to_string()))
        })
        .collect()
}
