//! Composite list columns.
//!
//! List attributes (`"SYN,ACK"`) explode into one `Yes`/`No` indicator per
//! declared label. List values (`"ttl = 64\nservice = dns"`) split into one
//! column per declared key.

pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Indicator state for each declared label, in label order.
pub fn attribute_flags(cell: &str, delimiter: &str, labels: &[&str]) -> Vec<bool> {
    let present: Vec<&str> = cell.split(delimiter).collect();
    labels
        .iter()
        .map(|label| present.contains(label))
        .collect()
}

/// Joins the labels whose indicator is set.
pub fn collapse_attributes<'a>(
    labels: impl IntoIterator<Item = (&'a str, bool)>,
    delimiter: &str,
) -> String {
    labels
        .into_iter()
        .filter(|(_, set)| *set)
        .map(|(label, _)| label)
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Parses `key <delimiter> value` lines. Lines without the delimiter are
/// skipped; keys and values are trimmed.
pub fn split_values<'a>(cell: &'a str, delimiter: &str) -> Vec<(&'a str, &'a str)> {
    let delimiter = delimiter.trim();
    cell.lines()
        .filter_map(|line| line.split_once(delimiter))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

/// Value recorded for `key`, if present.
pub fn lookup_value<'a>(pairs: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, value)| *value)
}

/// Reassembles `key <delimiter> value` lines joined by newline.
pub fn join_values<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    delimiter: &str,
) -> String {
    let delimiter = delimiter.trim();
    pairs
        .into_iter()
        .map(|(key, value)| format!("{key} {delimiter} {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_flags_follow_declared_order() {
        let flags = attribute_flags("A,B", ",", &["A", "B", "C"]);
        assert_eq!(flags, vec![true, true, false]);
        let flags = attribute_flags("C,A", ",", &["A", "B", "C"]);
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn test_undeclared_labels_ignored() {
        let flags = attribute_flags("A,Z", ",", &["A", "B"]);
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_collapse_attributes() {
        let joined = collapse_attributes([("A", true), ("B", true), ("C", false)], ",");
        assert_eq!(joined, "A,B");
        assert_eq!(collapse_attributes([("A", false)], ","), "");
    }

    #[test]
    fn test_split_values() {
        let pairs = split_values("ttl = 64\nservice = dns\nnoise", "=");
        assert_eq!(pairs, vec![("ttl", "64"), ("service", "dns")]);
        assert_eq!(lookup_value(&pairs, "service"), Some("dns"));
        assert_eq!(lookup_value(&pairs, "rate"), None);
    }

    #[test]
    fn test_value_with_delimiter_keeps_remainder() {
        let pairs = split_values("query = a=b", " = ");
        assert_eq!(pairs, vec![("query", "a=b")]);
    }

    #[test]
    fn test_join_values() {
        let text = join_values([("ttl", "64"), ("service", "dns")], " = ");
        insta::assert_snapshot!(text, @r"
        ttl = 64
        service = dns
        ");
    }
}
