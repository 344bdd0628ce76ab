//! 96-well plate coordinates
//!
//! Wells are addressed row-major: `A01..A12`, `B01..`, through `H12`.

pub const WELL_COUNT: usize = 96;

const ROWS: &[u8] = b"ABCDEFGH";
const COLS: usize = 12;

/// Canonical label for a well index (`0` => `A01`, `95` => `H12`).
pub fn well_label(index: usize) -> String {
    let index = index % WELL_COUNT;
    let row = ROWS[index / COLS] as char;
    let col = index % COLS + 1;
    format!("{row}{col:02}")
}

/// Parse a label like `A01`. Case-insensitive, unpadded columns accepted;
/// anything outside `A..H` x `1..12` is rejected.
pub fn well_index(label: &str) -> Option<usize> {
    let mut chars = label.trim().chars();
    let row = chars.next()?.to_ascii_uppercase();
    if !('A'..='H').contains(&row) {
        return None;
    }
    let col: usize = chars.as_str().parse().ok()?;
    if !(1..=COLS).contains(&col) {
        return None;
    }
    Some((row as usize - 'A' as usize) * COLS + col - 1)
}

/// The well proposed after `last`; a fresh session starts at `A01`, and a
/// full plate wraps back around (the collision check forces a new plate).
pub fn next_well(last: Option<usize>) -> usize {
    last.map(|w| (w + 1) % WELL_COUNT).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_row_major() {
        assert_eq!(well_label(0), "A01");
        assert_eq!(well_label(11), "A12");
        assert_eq!(well_label(12), "B01");
        assert_eq!(well_label(95), "H12");
    }

    #[test]
    fn index_roundtrips_every_well() {
        for i in 0..WELL_COUNT {
            assert_eq!(well_index(&well_label(i)), Some(i));
        }
    }

    #[test]
    fn parsing_is_tolerant_but_bounded() {
        assert_eq!(well_index("a1"), Some(0));
        assert_eq!(well_index(" h12 "), Some(95));
        assert_eq!(well_index("A00"), None);
        assert_eq!(well_index("A13"), None);
        assert_eq!(well_index("I01"), None);
        assert_eq!(well_index("A"), None);
        assert_eq!(well_index(""), None);
    }

    #[test]
    fn cursor_starts_at_a01_and_wraps() {
        assert_eq!(next_well(None), 0);
        assert_eq!(next_well(Some(0)), 1);
        assert_eq!(next_well(Some(95)), 0);
    }
}
