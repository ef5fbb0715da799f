use std::collections::HashSet;

/// Case-insensitive overlap ratio between two string lists
///
/// Counts the entries of `a` that also appear in `b` and divides by the
/// larger of the two lengths. Returns 0.0 when either list is empty.
pub fn overlap_ratio(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let lookup: HashSet<String> = b.iter().map(|item| item.to_lowercase()).collect();
    let shared = a
        .iter()
        .filter(|item| lookup.contains(&item.to_lowercase()))
        .count();

    shared as f64 / a.len().max(b.len()) as f64
}

/// Whether `needle` appears in `haystack`, ignoring case
#[inline]
pub fn contains_ignore_case(haystack: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    haystack.iter().any(|item| item.to_lowercase() == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_lists_have_no_overlap() {
        assert_eq!(overlap_ratio(&[], &list(&["rust"])), 0.0);
        assert_eq!(overlap_ratio(&list(&["rust"]), &[]), 0.0);
        assert_eq!(overlap_ratio(&[], &[]), 0.0);
    }

    #[test]
    fn test_full_overlap_ignores_case() {
        let ratio = overlap_ratio(&list(&["Go", "SQL"]), &list(&["sql", "go"]));
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_uses_larger_list_as_denominator() {
        // 1 shared out of max(1, 4)
        let ratio = overlap_ratio(&list(&["rust"]), &list(&["rust", "go", "c", "java"]));
        assert_eq!(ratio, 0.25);

        let ratio = overlap_ratio(&list(&["rust", "go", "c", "java"]), &list(&["rust"]));
        assert_eq!(ratio, 0.25);
    }

    #[test]
    fn test_disjoint_lists() {
        assert_eq!(overlap_ratio(&list(&["rust"]), &list(&["python"])), 0.0);
    }

    #[test]
    fn test_contains_ignore_case() {
        let roles = list(&["SWE", "Data Engineer"]);
        assert!(contains_ignore_case(&roles, "swe"));
        assert!(contains_ignore_case(&roles, "data engineer"));
        assert!(!contains_ignore_case(&roles, "PM"));
    }
}
