//! Minimal CSV parse/stringify utility.
//!
//! Handles commas, quotes, and newlines inside quoted fields. Used by the
//! result exporter and its round-trip tests; the pairing-table parser in
//! `pipeline::config_parser` deliberately uses a simpler line split (see there).

/// Parses CSV text into rows of fields. Quoted fields may contain commas,
/// escaped quotes (`""`), and newlines. `\r` is dropped outside quotes.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    // escaped quote
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    row.push(std::mem::take(&mut field));
                }
                '\r' => {}
                '\n' => {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                _ => field.push(c),
            }
        }
    }

    // trailing field without a final newline
    if !field.is_empty() || in_quotes || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/// Serializes rows to CSV. A field is quoted only when it contains a comma,
/// quote, or newline; internal quotes are doubled.
pub fn stringify_csv(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|v| escape_field(v))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn escape_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rows() {
        let rows = parse_csv("a,b,c\n1,2,3\n");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_parse_quoted_comma_and_newline() {
        let rows = parse_csv("name,blob\nx,\"a,b\nc\"\n");
        assert_eq!(rows[1], vec!["x".to_string(), "a,b\nc".to_string()]);
    }

    #[test]
    fn test_parse_escaped_quote() {
        let rows = parse_csv("a\n\"he said \"\"hi\"\"\"");
        assert_eq!(rows[1][0], "he said \"hi\"");
    }

    #[test]
    fn test_parse_trailing_field_without_newline() {
        let rows = parse_csv("a,b\n1,2");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["1", "2"]);
    }

    #[test]
    fn test_stringify_quotes_only_when_needed() {
        let rows = vec![vec!["plain".to_string(), "with,comma".to_string()]];
        assert_eq!(stringify_csv(&rows), "plain,\"with,comma\"");
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let rows = vec![
            vec!["cv_file_name".to_string(), "notes".to_string()],
            vec!["john_doe".to_string(), "strong \"fit\", maybe\nfollow up".to_string()],
            vec!["jane".to_string(), "42".to_string()],
        ];
        let text = stringify_csv(&rows);
        assert_eq!(parse_csv(&text), rows);
    }
}
