//! Parsing of the `hide_faces` form field.

use crate::error::CoreError;

/// Parse a comma-separated list of face indices, e.g. `"0, 2,3"`.
///
/// An empty (or all-whitespace) value means no faces are hidden. Empty items
/// between commas are skipped; anything else that is not a non-negative
/// integer is a validation error.
pub fn parse_hide_faces(raw: &str) -> Result<Vec<u32>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<u32>().map_err(|_| {
                CoreError::Validation(format!(
                    "hide_faces must be a comma-separated list of face indices, got '{item}'"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_indices_in_order() {
        assert_eq!(parse_hide_faces("2,0,5").unwrap(), vec![2, 0, 5]);
    }

    #[test]
    fn tolerates_whitespace_and_empty_items() {
        assert_eq!(parse_hide_faces(" 1 , 3,, ").unwrap(), vec![1, 3]);
        assert!(parse_hide_faces("").unwrap().is_empty());
        assert!(parse_hide_faces("   ").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_integers() {
        assert_matches!(parse_hide_faces("1,two"), Err(CoreError::Validation(_)));
        assert_matches!(parse_hide_faces("-1"), Err(CoreError::Validation(_)));
    }
}
