use std::cmp::Ordering;

use xlrobot_primitives::address::{column_index_to_letters, column_letters_to_index};
use xlrobot_primitives::{
    coord_to_excel_name, excel_name_to_coord, natural_cmp, AddressError, CellCoord,
};

#[test]
fn test_coord_round_trip_from_coordinates() {
    for col in (0..2000).step_by(7) {
        for row in [0, 1, 9, 99, 65_535, 1_048_575] {
            let name = coord_to_excel_name(col, row);
            assert_eq!(excel_name_to_coord(&name).unwrap(), (col, row), "{name}");
        }
    }
}

#[test]
fn test_coord_round_trip_from_names() {
    for name in ["a1", "B7", "xfd1048576", "Iv65536", "AA10"] {
        let (col, row) = excel_name_to_coord(name).unwrap();
        assert_eq!(coord_to_excel_name(col, row), name.to_ascii_uppercase());
    }
}

#[test]
fn test_invalid_names_report_original_text() {
    assert_eq!(
        excel_name_to_coord("12AB"),
        Err(AddressError::InvalidName("12AB".to_string()))
    );
    assert!(matches!(
        excel_name_to_coord("A0"),
        Err(AddressError::InvalidRow(_))
    ));
}

#[test]
fn test_column_overflow_is_rejected() {
    assert!(matches!(
        column_letters_to_index("ZZZZZZZZZ"),
        Err(AddressError::InvalidColumn(_))
    ));
}

#[test]
fn test_cell_coord_display() {
    let coord = CellCoord::from_name("c4").unwrap();
    assert_eq!(coord, CellCoord::new(2, 3));
    assert_eq!(coord.to_string(), "C4");
    assert_eq!(column_index_to_letters(16_383), "XFD");
}

#[test]
fn test_natural_order_of_addresses() {
    let mut names = vec!["A10", "A9", "AA1", "B2", "A1", "B10"];
    names.sort_by(|a, b| natural_cmp(a, b));
    assert_eq!(names, vec!["A1", "A9", "A10", "AA1", "B2", "B10"]);
    assert_eq!(natural_cmp("Sheet2", "Sheet10"), Ordering::Less);
}
