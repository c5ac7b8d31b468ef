//! # gdrive-sheets-core
//!
//! Core data structures for the gdrive-sheets client library.
//!
//! This crate has no I/O. It provides:
//! - [`CellAddress`], [`CellRange`] and [`name_to_coords`] - cell addressing
//! - [`CellStore`] - the local sparse copy of a worksheet with dirty tracking
//! - [`List`] and [`Record`] - a row-oriented view keyed by the header row
//!
//! ## Example
//!
//! ```rust
//! use gdrive_sheets_core::{CellStore, List};
//!
//! let mut store = CellStore::new(100, 2);
//! store.set(1, 1, "name").unwrap();
//! store.set(1, 2, "score").unwrap();
//!
//! let mut list = List::new(&mut store);
//! list.push([("name", "alice"), ("score", "10")]).unwrap();
//! assert_eq!(list.row_count(), 1);
//! drop(list);
//!
//! assert_eq!(store.get(2, 1), "alice");
//! assert_eq!(store.dirty_range().unwrap().to_r1c1_reference("Sheet1"), "'Sheet1'!R1C1:R2C2");
//! ```

pub mod cell;
pub mod error;
pub mod list;

pub use cell::{
    find_invalid_char, name_to_coords, quote_sheet_title, CellAddress, CellContent, CellRange,
    CellStore,
};
pub use error::{Error, Result};
pub use list::{List, Record};

/// Declared row count of a worksheet created without explicit bounds
pub const DEFAULT_MAX_ROWS: u32 = 100;

/// Declared column count of a worksheet created without explicit bounds
pub const DEFAULT_MAX_COLS: u32 = 20;
