//! Unit strings for the output files.
//!
//! Carbon products like to tag the mass in their units with the species, e.g. `gC m-2 day-1`.
//! That is not something a CF unit parser understands, so the species is removed and only the
//! mass unit is kept.

/// Mass units that may carry a carbon tag and their replacement.
const CARBON_MASS_RULES: &[(&str, &str)] = &[
    ("PgC", "Pg"),
    ("TgC", "Tg"),
    ("GgC", "Gg"),
    ("MgC", "Mg"),
    ("kgC", "kg"),
    ("mgC", "mg"),
    ("gC", "g"),
];

/// Rewrite carbon mass notation into mass only notation.
///
/// The string is split into tokens on whitespace, `/`, `.` and `*`, and each token is checked
/// against the rule table. A token matches when it starts with a carbon mass unit and what
/// follows is not a letter, so `gC` and `kgC` are rewritten but `gCO2` is left alone. Everything
/// else, including spacing, passes through untouched.
pub fn normalize_unit_string(units: &str) -> String {
    let mut out = String::with_capacity(units.len());
    let mut token = String::new();

    for c in units.chars() {
        if c.is_whitespace() || c == '/' || c == '.' || c == '*' {
            out.push_str(&rewrite_token(&token));
            token.clear();
            out.push(c);
        } else {
            token.push(c);
        }
    }
    out.push_str(&rewrite_token(&token));

    out
}

fn rewrite_token(token: &str) -> String {
    for (from, to) in CARBON_MASS_RULES {
        if let Some(rest) = token.strip_prefix(from) {
            if !rest.starts_with(|c: char| c.is_alphabetic()) {
                return format!("{}{}", to, rest);
            }
        }
    }

    token.to_owned()
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    #[test]
    fn test_grams_carbon() {
        assert_eq!(normalize_unit_string("gC m-2 day-1"), "g m-2 day-1");
        assert_eq!(normalize_unit_string("gC/m2/day"), "g/m2/day");
        assert_eq!(normalize_unit_string("gC.m-2.d-1"), "g.m-2.d-1");
    }

    #[test]
    fn test_other_prefixes() {
        assert_eq!(normalize_unit_string("kgC m-2 s-1"), "kg m-2 s-1");
        assert_eq!(normalize_unit_string("PgC yr-1"), "Pg yr-1");
        assert_eq!(normalize_unit_string("mgC m-2"), "mg m-2");
    }

    #[test]
    fn test_left_alone() {
        assert_eq!(normalize_unit_string("g m-2 year-1"), "g m-2 year-1");
        assert_eq!(normalize_unit_string("gCO2 m-2"), "gCO2 m-2");
        assert_eq!(normalize_unit_string("degC"), "degC");
        assert_eq!(normalize_unit_string(""), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_unit_string("gC m-2 day-1");
        assert_eq!(normalize_unit_string(&once), once);
    }
}
