//! Minimal tabular-file collaborator: CSV text in, header-addressable rows
//! out. The header list is available before any row is touched, which the
//! ingestion drivers rely on for required-column checks.

use anyhow::bail;

#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_csv(text: &str) -> anyhow::Result<Table> {
        let mut lines = text.lines();
        let Some(header_line) = lines.next() else {
            bail!("empty file: no header row");
        };
        let headers: Vec<String> = parse_csv_record(header_line)
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            bail!("header row is blank");
        }

        let mut rows = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            rows.push(parse_csv_record(line));
        }
        Ok(Table { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            headers: &self.headers,
            cells,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell under the named header, if the row extends that far. Short rows
    /// (trailing blank cells dropped by the exporter) read as absent.
    pub fn cell(&self, header: &str) -> Option<&'a str> {
        let idx = self.headers.iter().position(|h| h == header)?;
        self.cells.get(idx).map(|s| s.as_str())
    }
}

fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '"' {
            if in_quotes && i + 1 < chars.len() && chars[i + 1] == '"' {
                buf.push('"');
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if ch == ',' && !in_quotes {
            out.push(buf);
            buf = String::new();
            i += 1;
            continue;
        }
        buf.push(ch);
        i += 1;
    }
    out.push(buf);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_exposed_before_rows() {
        let t = Table::from_csv("Reg No,Name,CO1\nA1,Asha,25\n").expect("parse");
        assert_eq!(t.headers(), &["Reg No", "Name", "CO1"]);
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell("Reg No"), Some("A1"));
        assert_eq!(rows[0].cell("CO1"), Some("25"));
        assert_eq!(rows[0].cell("CO2"), None);
    }

    #[test]
    fn quoted_fields_and_embedded_commas() {
        let t = Table::from_csv("Reg,Name\nA1,\"Iyer, Asha\"\nA2,\"say \"\"hi\"\"\"\n")
            .expect("parse");
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows[0].cell("Name"), Some("Iyer, Asha"));
        assert_eq!(rows[1].cell("Name"), Some("say \"hi\""));
    }

    #[test]
    fn blank_lines_skipped_short_rows_tolerated() {
        let t = Table::from_csv("Reg,CO1,CO2\n\nA1,10\n").expect("parse");
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell("CO1"), Some("10"));
        assert_eq!(rows[0].cell("CO2"), None);
    }

    #[test]
    fn empty_input_is_a_structural_failure() {
        assert!(Table::from_csv("").is_err());
        assert!(Table::from_csv(",,\n").is_err());
    }
}
