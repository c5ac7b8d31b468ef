//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangle of cells (e.g., "A1:B10")
//! - [`CellContent`] - Formatted, input and numeric facets of a cell
//! - [`CellStore`] - Sparse storage with dirty tracking

mod address;
mod storage;
mod value;

pub use address::{name_to_coords, quote_sheet_title, CellAddress, CellRange};
pub use storage::CellStore;
pub use value::{find_invalid_char, CellContent};
