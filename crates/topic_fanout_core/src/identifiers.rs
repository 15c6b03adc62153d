/// Splits a comma-delimited list into ordered identifiers.
///
/// Tokens are trimmed and empty tokens are dropped; order and duplicates are
/// preserved.
pub fn split_static_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Identifiers projected from one table scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedRows {
    pub identifiers: Vec<String>,
    pub skipped_rows: usize,
}

/// Keeps the attribute value of every row in scan order. Rows where the
/// attribute is absent, not a string, or blank are counted as skipped.
pub fn project_rows(rows: impl IntoIterator<Item = Option<String>>) -> ProjectedRows {
    let mut projected = ProjectedRows::default();
    for row in rows {
        match row {
            Some(value) if !value.trim().is_empty() => projected.identifiers.push(value),
            _ => projected.skipped_rows += 1,
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_comma_delimited_list_in_order() {
        assert_eq!(split_static_list("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn single_token_yields_one_identifier() {
        assert_eq!(split_static_list("rust"), vec!["rust"]);
    }

    #[test]
    fn trims_tokens_and_drops_empty_ones() {
        assert_eq!(
            split_static_list(" rust , ,programming,"),
            vec!["rust", "programming"]
        );
    }

    #[test]
    fn keeps_duplicates() {
        assert_eq!(split_static_list("a,b,a"), vec!["a", "b", "a"]);
    }

    #[test]
    fn projects_rows_in_scan_order() {
        let projected = project_rows(vec![
            Some("zeta".to_string()),
            Some("alpha".to_string()),
            Some("zeta".to_string()),
        ]);

        assert_eq!(projected.identifiers, vec!["zeta", "alpha", "zeta"]);
        assert_eq!(projected.skipped_rows, 0);
    }

    #[test]
    fn counts_rows_without_usable_attribute() {
        let projected = project_rows(vec![
            Some("rust".to_string()),
            None,
            Some("".to_string()),
            Some("golang".to_string()),
        ]);

        assert_eq!(projected.identifiers, vec!["rust", "golang"]);
        assert_eq!(projected.skipped_rows, 2);
    }
}
