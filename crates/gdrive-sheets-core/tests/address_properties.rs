//! Property tests for the cell address codec and the cell store laws

use gdrive_sheets_core::{name_to_coords, CellAddress, CellStore, Error};
use proptest::prelude::*;

proptest! {
    #[test]
    fn name_round_trips_through_coords(row in 1u32..=10_000_000, col in 1u32..=50_000) {
        let name = format!("{}{}", CellAddress::column_to_letters(col), row);
        prop_assert_eq!(name_to_coords(&name).unwrap(), (row, col));
        prop_assert_eq!(name_to_coords(&name.to_lowercase()).unwrap(), (row, col));
        prop_assert_eq!(CellAddress::new(row, col).to_string(), name);
    }

    #[test]
    fn digits_first_is_rejected(row in 1u32..10_000, letters in "[A-Z]{1,3}") {
        let name = format!("{}{}", row, letters);
        prop_assert!(matches!(name_to_coords(&name), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn written_input_reads_back(row in 1u32..500, col in 1u32..200, value in "[ -~]{0,40}") {
        let mut store = CellStore::new(100, 26);
        store.set(row, col, value.clone()).unwrap();
        prop_assert_eq!(store.get_input(row, col), value.as_str());
        prop_assert!(store.is_cell_dirty(row, col));
    }

    #[test]
    fn clearing_only_cell_resets_bounds(row in 1u32..500, col in 1u32..200) {
        let mut store = CellStore::new(10, 10);
        store.set(row, col, "x").unwrap();
        prop_assert_eq!((store.num_rows(), store.num_cols()), (row, col));
        store.set(row, col, "").unwrap();
        prop_assert_eq!((store.num_rows(), store.num_cols()), (0, 0));
    }
}

#[test]
fn known_addresses() {
    assert_eq!(name_to_coords("A1").unwrap(), (1, 1));
    assert_eq!(name_to_coords("Z1").unwrap(), (1, 26));
    assert_eq!(name_to_coords("AA1").unwrap(), (1, 27));
    assert_eq!(name_to_coords("AB2").unwrap(), (2, 28));
    assert_eq!(name_to_coords("AA2").unwrap(), (2, 27));
    assert!(matches!(name_to_coords("2A"), Err(Error::InvalidAddress(_))));
}
