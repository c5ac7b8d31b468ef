//! Cell address and range types

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Convert a cell name such as `"A2"` into 1-based `(row, col)`.
///
/// # Examples
/// ```
/// use gdrive_sheets_core::name_to_coords;
///
/// assert_eq!(name_to_coords("A1").unwrap(), (1, 1));
/// assert_eq!(name_to_coords("AA2").unwrap(), (2, 27));
/// assert!(name_to_coords("2A").is_err());
/// ```
pub fn name_to_coords(name: &str) -> Result<(u32, u32)> {
    let addr = CellAddress::parse(name)?;
    Ok((addr.row, addr.col))
}

/// A cell address (e.g., "A1", "AB100")
///
/// Rows and columns are 1-based, matching what the Sheets API and users see.
/// Absolute-reference markers (`$`) are not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    /// Row number (1-based)
    pub row: u32,
    /// Column number (1-based, A=1, Z=26, AA=27)
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation (case-insensitive)
    ///
    /// # Examples
    /// ```
    /// use gdrive_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("b3").unwrap();
    /// assert_eq!(addr.row, 3);
    /// assert_eq!(addr.col, 2);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let letters_end = s
            .bytes()
            .position(|b| !b.is_ascii_alphabetic())
            .unwrap_or(s.len());

        if letters_end == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let (letters, digits) = s.split_at(letters_end);
        if digits.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "unexpected characters after row number in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(letters)
            .map_err(|_| Error::InvalidAddress(format!("column out of range in '{}'", s)))?;

        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        Ok(Self { row, col })
    }

    /// Convert a 1-based column number to letters (1 = A, 26 = Z, 27 = AA)
    ///
    /// Column 0 has no letter form and yields an empty string.
    pub fn column_to_letters(col: u32) -> String {
        let mut result = Vec::new();
        let mut n = col;

        while n > 0 {
            n -= 1;
            result.push((n % 26) as u8 + b'A');
            n /= 26;
        }

        result.reverse();
        String::from_utf8(result).unwrap_or_default()
    }

    /// Convert column letters to a 1-based number (A = 1, Z = 26, AA = 27)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| Error::InvalidAddress(format!("column '{}' too large", letters)))?;
        }

        Ok(col)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<(u32, u32)> for CellAddress {
    fn from((row, col): (u32, u32)) -> Self {
        Self::new(row, col)
    }
}

/// An inclusive rectangle of cells (e.g., "A1:B10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Top-left corner
    pub start: CellAddress,
    /// Bottom-right corner
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range, normalized so `start` is top-left
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Create a range from 1-based corner coordinates
    pub fn from_coords(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Minimal rectangle covering every coordinate, or `None` for no coordinates
    pub fn bounding<I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        coords.into_iter().fold(None, |acc, (row, col)| {
            Some(match acc {
                None => CellRange::from_coords(row, col, row, col),
                Some(r) => CellRange::from_coords(
                    r.start.row.min(row),
                    r.start.col.min(col),
                    r.end.row.max(row),
                    r.end.col.max(col),
                ),
            })
        })
    }

    /// Check if a cell is within this range
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start.row && row <= self.end.row && col >= self.start.col && col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// Format as a sheet-qualified R1C1 reference: `'Sheet1'!R1C1:R2C3`
    ///
    /// Single quotes in the title are doubled.
    pub fn to_r1c1_reference(&self, sheet_title: &str) -> String {
        format!(
            "{}!R{}C{}:R{}C{}",
            quote_sheet_title(sheet_title),
            self.start.row,
            self.start.col,
            self.end.row,
            self.end.col
        )
    }
}

/// Quote a sheet title for use in a range reference: `It's` -> `'It''s'`
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
