use std::collections::HashMap;

pub const FIELD_TOKEN: &str = "token";

pub fn column_name_field(index: usize) -> String {
    format!("column_name_{index}")
}

pub fn column_type_field(index: usize) -> String {
    format!("column_type_{index}")
}

/// Collects `column_name_<i>`/`column_type_<i>` pairs for i = 0, 1, … up to
/// the first missing name. A name without a type is an error.
pub fn parse_confirmed_columns(form: &HashMap<String, String>) -> Result<Vec<(String, String)>, String> {
    let mut columns = Vec::new();
    for index in 0.. {
        let Some(name) = form.get(&column_name_field(index)) else {
            break;
        };
        let kind = form
            .get(&column_type_field(index))
            .ok_or_else(|| format!("Missing type for column {index}"))?;
        columns.push((name.to_owned(), kind.to_owned()));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
    }

    #[test]
    fn collects_columns_in_index_order() {
        let form = form(&[
            ("column_type_1", "REAL"),
            ("column_name_0", "Start_Date"),
            ("column_name_1", "Pay"),
            ("column_type_0", "TEXT"),
            ("column_name_3", "skipped"),
            ("column_type_3", "TEXT"),
        ]);
        assert_eq!(
            parse_confirmed_columns(&form).unwrap(),
            vec![
                ("Start_Date".to_owned(), "TEXT".to_owned()),
                ("Pay".to_owned(), "REAL".to_owned()),
            ]
        );
    }

    #[test]
    fn requires_type_for_each_name() {
        let form = form(&[("column_name_0", "a")]);
        assert_eq!(parse_confirmed_columns(&form).unwrap_err(), "Missing type for column 0");
        assert!(parse_confirmed_columns(&HashMap::new()).unwrap().is_empty());
    }
}
