//! Translation between `A1` cell names and zero-based `(column, row)` pairs.

use std::cmp::Ordering;

use crate::AddressError;

/// Converts a cell name (e.g., "B3", "aa10") to a zero-based `(column, row)` pair.
///
/// The name must be exactly one run of letters followed by one run of digits.
pub fn excel_name_to_coord(name: &str) -> Result<(u32, u32), AddressError> {
    let upper = name.trim().to_ascii_uppercase();
    let Some((letters, digits)) = split_name(&upper) else {
        return Err(AddressError::InvalidName(name.to_string()));
    };
    tracing::debug!("Matrix: [{}, {}]", letters, digits);

    let col = column_letters_to_index(letters)?;
    let row_number: u32 = digits
        .parse()
        .map_err(|_| AddressError::InvalidRow(digits.to_string()))?;
    if row_number == 0 {
        return Err(AddressError::InvalidRow(digits.to_string()));
    }

    tracing::debug!("Col, Row: {}, {}", col, row_number - 1);
    Ok((col, row_number - 1))
}

/// Converts a zero-based `(column, row)` pair to its cell name.
pub fn coord_to_excel_name(col: u32, row: u32) -> String {
    format!("{}{}", column_index_to_letters(col), u64::from(row) + 1)
}

/// Convert column index to letters (0 -> A, 25 -> Z, 26 -> AA, etc.).
pub fn column_index_to_letters(index: u32) -> String {
    let mut n = u64::from(index) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Convert column letters to a zero-based index (A -> 0, Z -> 25, AA -> 26, etc.).
pub fn column_letters_to_index(letters: &str) -> Result<u32, AddressError> {
    if letters.is_empty() {
        return Err(AddressError::InvalidColumn(letters.to_string()));
    }
    let mut result: u32 = 0;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return Err(AddressError::InvalidColumn(letters.to_string()));
        }
        let value = u32::from(upper as u8 - b'A' + 1);
        result = result
            .checked_mul(26)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(|| AddressError::InvalidColumn(letters.to_string()))?;
    }
    Ok(result - 1)
}

/// Natural ordering for cell names: digit runs compare by value, everything
/// else compares as text, so `A2` sorts before `A10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l, r) {
                    (Chunk::Digits(l), Chunk::Digits(r)) => compare_digit_runs(l, r),
                    (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
                    (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
                    (Chunk::Text(l), Chunk::Text(r)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn split_name(upper: &str) -> Option<(&str, &str)> {
    let split = upper.find(|c: char| !c.is_ascii_uppercase())?;
    let (letters, digits) = upper.split_at(split);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((letters, digits))
}

fn compare_digit_runs(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}

enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_name_to_coord_basic() {
        assert_eq!(excel_name_to_coord("A1").unwrap(), (0, 0));
        assert_eq!(excel_name_to_coord("B2").unwrap(), (1, 1));
        assert_eq!(excel_name_to_coord("Z1").unwrap(), (25, 0));
        assert_eq!(excel_name_to_coord("AA1").unwrap(), (26, 0));
        assert_eq!(excel_name_to_coord("ZZ1").unwrap(), (701, 0));
        assert_eq!(excel_name_to_coord("a2").unwrap(), (0, 1));
    }

    #[test]
    fn test_excel_name_to_coord_errors() {
        for bad in ["", "A", "1", "A0", "1A", "A1B", "A-1", "$A$1", "A1:B2"] {
            assert!(excel_name_to_coord(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_column_index_to_letters() {
        assert_eq!(column_index_to_letters(0), "A");
        assert_eq!(column_index_to_letters(25), "Z");
        assert_eq!(column_index_to_letters(26), "AA");
        assert_eq!(column_index_to_letters(701), "ZZ");
        assert_eq!(column_index_to_letters(702), "AAA");
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["A10", "B1", "A2", "A1"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["A1", "A2", "A10", "B1"]);
        assert_eq!(natural_cmp("A02", "A2"), Ordering::Equal);
    }
}
