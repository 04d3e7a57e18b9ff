//! Column resolution for spreadsheets whose header text drifts between
//! releases.
//!
//! Each logical field has an ordered alias table. Resolution tries the
//! exact aliases first (whitespace-insensitive), then falls back to
//! substring markers, most specific first.

use strum_macros::{AsRefStr, Display};

use crate::normalize::normalize_name;

/// Logical fields looked up in victim spreadsheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Field {
    /// Municipality where the fact happened.
    Municipality,
    /// Date of the fact.
    FactDate,
    /// Number of victims in the row.
    VictimCount,
    /// Offense nature.
    Category,
    /// Explicit year column (per-month layouts only).
    Year,
}

/// Alias table entry for one [`Field`].
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    /// Field this entry describes.
    pub field: Field,
    /// Exact header names, in priority order.
    pub exact: &'static [&'static str],
    /// Substrings matched against the uppercased header, in priority order.
    pub markers: &'static [&'static str],
}

/// Known header names for each field.
pub const FIELD_ALIASES: &[FieldAliases] = &[
    FieldAliases {
        field: Field::Municipality,
        exact: &[
            "MUNICÍPIO DO FATO",
            "MUNICIPIO DO FATO",
            "MUNICÍPIO",
            "MUNICIPIO",
        ],
        markers: &["MUNICÍPIO", "MUNICIPIO"],
    },
    FieldAliases {
        field: Field::FactDate,
        exact: &["DATA DO FATO", "DATA_DO_FATO", "DATA FATO", "DATA"],
        markers: &["DATA DO FATO", "DATA"],
    },
    FieldAliases {
        field: Field::VictimCount,
        exact: &[
            "TOTAL DE VÍTIMAS",
            "TOTAL DE VITIMAS",
            "TOTAL DE V√çTIMAS",
            "TOTAL_VITIMAS",
            "QUANTIDADE DE VÍTIMAS",
            "QUANTIDADE DE VITIMAS",
        ],
        markers: &["TOTAL DE V", "QUANTIDADE DE V"],
    },
    FieldAliases {
        field: Field::Category,
        exact: &[
            "NATUREZA",
            "NATUREZA DO FATO",
            "NATUREZA JURÍDICA",
            "NATUREZA JURIDICA",
            "TIPO DE VIOLÊNCIA",
            "TIPO DE VIOLENCIA",
        ],
        markers: &["NATUREZA"],
    },
    FieldAliases {
        field: Field::Year,
        exact: &["ANO", "ANO DO FATO", "ANO_FATO"],
        markers: &[],
    },
];

/// Three-letter Portuguese month abbreviations, January first.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// Returns the alias table entry for `field`.
#[must_use]
pub fn aliases_for(field: Field) -> &'static FieldAliases {
    FIELD_ALIASES
        .iter()
        .find(|entry| entry.field == field)
        .unwrap_or(&FIELD_ALIASES[0])
}

/// Resolves `field` against `headers` using the built-in alias tables.
#[must_use]
pub fn resolve_column(headers: &[String], field: Field) -> Option<&str> {
    resolve_with(headers, aliases_for(field))
}

/// Resolves a column using an explicit alias table entry.
///
/// Exact aliases are tried in priority order; a header matches when it is
/// equal to the alias after collapsing whitespace. If none match, markers
/// are tried in priority order and the first header (in file order) whose
/// uppercased or accent-folded text contains the marker wins.
#[must_use]
pub fn resolve_with<'a>(headers: &'a [String], aliases: &FieldAliases) -> Option<&'a str> {
    for alias in aliases.exact {
        if let Some(header) = headers.iter().find(|h| collapse_whitespace(h) == *alias) {
            return Some(header);
        }
    }

    let searchable: Vec<(String, String)> = headers
        .iter()
        .map(|header| (header.to_uppercase(), normalize_name(header)))
        .collect();

    aliases.markers.iter().find_map(|marker| {
        searchable
            .iter()
            .position(|(upper, folded)| upper.contains(marker) || folded.contains(marker))
            .map(|i| headers[i].as_str())
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A per-month count column, e.g. `JAN`, `FEV/2024`, `MAR_24`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthColumn {
    /// Header text, verbatim.
    pub header: String,
    /// Month number, `1..=12`.
    pub month: u32,
    /// Year taken from the header suffix, if present.
    pub year: Option<i32>,
}

/// Finds every per-month column in `headers`, in file order.
#[must_use]
pub fn month_columns(headers: &[String]) -> Vec<MonthColumn> {
    headers
        .iter()
        .filter_map(|header| {
            parse_month_header(header).map(|(month, year)| MonthColumn {
                header: header.clone(),
                month,
                year,
            })
        })
        .collect()
}

/// Parses a month header into `(month, optional year)`.
///
/// Accepts the abbreviation alone or followed by a two- or four-digit year,
/// separated by `/`, `_`, `-`, `.`, whitespace, or nothing.
#[must_use]
pub fn parse_month_header(header: &str) -> Option<(u32, Option<i32>)> {
    let folded = normalize_name(header);
    let tokens: Vec<&str> = folded
        .split(|c: char| matches!(c, '/' | '_' | '-' | '.') || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    let (abbr, suffix) = match tokens.as_slice() {
        [single] if single.len() > 3 && single.is_char_boundary(3) => single.split_at(3),
        [single] => (*single, ""),
        [abbr, suffix] => (*abbr, *suffix),
        _ => return None,
    };

    let month = MONTH_ABBREVIATIONS.iter().position(|m| *m == abbr)?;
    let year = match suffix.len() {
        0 => None,
        2 | 4 if suffix.chars().all(|c| c.is_ascii_digit()) => {
            let value: i32 = suffix.parse().ok()?;
            Some(if suffix.len() == 2 { 2000 + value } else { value })
        }
        _ => return None,
    };

    let month = u32::try_from(month).ok()? + 1;
    Some((month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn exact_alias_wins_over_earlier_fuzzy_match() {
        let h = headers(&["MUNICIPIO DE RESIDENCIA", "MUNICÍPIO DO FATO"]);
        assert_eq!(
            resolve_column(&h, Field::Municipality),
            Some("MUNICÍPIO DO FATO")
        );
    }

    #[test]
    fn exact_match_ignores_whitespace_differences() {
        let h = headers(&[" DATA  DO FATO "]);
        assert_eq!(resolve_column(&h, Field::FactDate), Some(" DATA  DO FATO "));
    }

    #[test]
    fn fuzzy_match_is_case_and_accent_insensitive() {
        let h = headers(&["Cidade", "Município (PE)"]);
        assert_eq!(
            resolve_column(&h, Field::Municipality),
            Some("Município (PE)")
        );
    }

    #[test]
    fn specific_marker_beats_generic_marker_in_earlier_column() {
        let h = headers(&["DATA DO REGISTRO", "Data do Fato (local)"]);
        assert_eq!(
            resolve_column(&h, Field::FactDate),
            Some("Data do Fato (local)")
        );

        let h = headers(&["Data do Registro", "Idade"]);
        assert_eq!(resolve_column(&h, Field::FactDate), Some("Data do Registro"));
    }

    #[test]
    fn resolves_mojibake_victim_header() {
        let h = headers(&["TOTAL DE V√çTIMAS"]);
        assert_eq!(
            resolve_column(&h, Field::VictimCount),
            Some("TOTAL DE V√çTIMAS")
        );
    }

    #[test]
    fn missing_column_resolves_to_none() {
        let h = headers(&["IDADE", "SEXO"]);
        assert_eq!(resolve_column(&h, Field::VictimCount), None);
        assert_eq!(resolve_column(&h, Field::Category), None);
    }

    #[test]
    fn alias_tables_cover_every_field() {
        for field in [
            Field::Municipality,
            Field::FactDate,
            Field::VictimCount,
            Field::Category,
            Field::Year,
        ] {
            assert_eq!(aliases_for(field).field, field);
        }
    }

    #[test]
    fn parses_month_headers() {
        assert_eq!(parse_month_header("JAN"), Some((1, None)));
        assert_eq!(parse_month_header("fev/2024"), Some((2, Some(2024))));
        assert_eq!(parse_month_header("MAR_24"), Some((3, Some(2024))));
        assert_eq!(parse_month_header("Dez 2023"), Some((12, Some(2023))));
        assert_eq!(parse_month_header("ABR2025"), Some((4, Some(2025))));
        assert_eq!(parse_month_header("MUNICIPIO"), None);
        assert_eq!(parse_month_header("JAN/20245"), None);
    }

    #[test]
    fn lists_month_columns_in_file_order() {
        let h = headers(&["MUNICIPIO", "JAN/2024", "FEV/2024", "TOTAL"]);
        let months = month_columns(&h);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, 1);
        assert_eq!(months[1].header, "FEV/2024");
        assert_eq!(months[1].year, Some(2024));
    }
}
