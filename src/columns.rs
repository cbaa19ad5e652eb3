//! Fuzzy header resolution for uploaded mark sheets.
//!
//! Sheets arrive from many hands, so "REG NO.", "Reg_No" and "REGNO" all have
//! to land on the same column. Matching is substring containment over a
//! normalized form rather than exact equality.

/// Uppercase and strip `.` / `_` so punctuation and case variants collapse.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '.' && *c != '_')
        .collect::<String>()
        .to_uppercase()
}

/// Find the header a hint set refers to, or None.
///
/// Iteration order is a contract, not an accident: outer loop over headers in
/// original column order, inner loop over hints in priority order, return on
/// the first hit. When two columns could each satisfy a different hint, the
/// leftmost column wins regardless of hint priority.
pub fn resolve<'a>(headers: &'a [String], hints: &[&str]) -> Option<&'a str> {
    for header in headers {
        let clean = normalize_header(header);
        for hint in hints {
            if clean.contains(&normalize_header(hint)) {
                return Some(header.as_str());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_through_punctuation_and_case() {
        let h = headers(&["S.No", "Reg_No.", "Student Name", "co1"]);
        assert_eq!(resolve(&h, &["REG"]), Some("Reg_No."));
        assert_eq!(resolve(&h, &["NAME", "STUDENT"]), Some("Student Name"));
        assert_eq!(resolve(&h, &["CO1"]), Some("co1"));
    }

    #[test]
    fn absent_when_no_header_qualifies() {
        let h = headers(&["S.No", "Marks"]);
        assert_eq!(resolve(&h, &["REG", "ROLL"]), None);
    }

    #[test]
    fn header_order_wins_over_hint_priority() {
        // "Roll No" sits left of "Register Number"; even though "REG" is the
        // higher-priority hint, the leftmost matching column is returned.
        let h = headers(&["Roll No", "Register Number"]);
        assert_eq!(resolve(&h, &["REG", "ROLL"]), Some("Roll No"));
    }

    #[test]
    fn deterministic_across_repeated_calls() {
        let h = headers(&["Reg No", "Roll No", "CO1", "CO1 (A)"]);
        let first = resolve(&h, &["REG", "ROLL"]);
        for _ in 0..10 {
            assert_eq!(resolve(&h, &["REG", "ROLL"]), first);
        }
        assert_eq!(resolve(&h, &["CO1"]), Some("CO1"));
    }

    #[test]
    fn empty_inputs_resolve_to_none() {
        assert_eq!(resolve(&[], &["REG"]), None);
        let h = headers(&["Reg No"]);
        assert_eq!(resolve(&h, &[]), None);
    }
}
