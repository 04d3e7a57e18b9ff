//! Municipality name normalization.
//!
//! Every join between spreadsheets, the boundary file and the population
//! table goes through [`normalize_name`]. Both sides of a comparison must
//! use it or the join silently misses.

/// Strips diacritics, uppercases and trims a municipality name.
///
/// `"  Recife "`, `"RECIFE"` and `"récife"` all become `"RECIFE"`. The
/// output is ASCII, so applying the function again is a no-op.
#[must_use]
pub fn normalize_name(input: &str) -> String {
    deunicode::deunicode(input).to_uppercase().trim().to_string()
}

/// Normalizes a raw cell value. Non-text cells normalize to an empty
/// string.
#[must_use]
pub fn normalize_value(value: &serde_json::Value) -> String {
    value.as_str().map_or_else(String::new, normalize_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize_name("São José do Egito"), "SAO JOSE DO EGITO");
        assert_eq!(normalize_name("  Recife "), "RECIFE");
        assert_eq!(normalize_name("IGARASSÚ"), "IGARASSU");
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in ["Cabo de Santo Agostinho", "  jaboatão dos guararapes ", "Ç", ""] {
            let once = normalize_name(input);
            assert_eq!(normalize_name(&once), once);
        }
    }

    #[test]
    fn non_text_values_normalize_to_empty() {
        assert_eq!(normalize_value(&serde_json::json!(42)), "");
        assert_eq!(normalize_value(&serde_json::Value::Null), "");
        assert_eq!(normalize_value(&serde_json::json!("Caruaru")), "CARUARU");
    }
}
