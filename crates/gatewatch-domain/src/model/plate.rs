//! Plate text normalization

/// Normalize raw plate text: drop whitespace, hyphens and periods, uppercase.
///
/// Applying it twice gives the same result as applying it once.
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_plate("abc-1d23"), "ABC1D23");
        assert_eq!(normalize_plate(" ab c.12 34 "), "ABC1234");
        assert_eq!(normalize_plate("ABC\t1234"), "ABC1234");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["abc-1234", "BRA.2E19", "  x y z ", "", "ÄBC-1"] {
            let once = normalize_plate(raw);
            assert_eq!(normalize_plate(&once), once);
        }
    }
}
