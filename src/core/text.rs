//! String helpers: edit distance, similarity ranking, case conversion, split/join

use crate::error::OfficeResult;
use indexmap::IndexSet;
use regex::Regex;
use std::fmt::Display;

/// How many of the most similar candidates [`similar_list`] appends
const SIMILAR_TOP_N: usize = 3;

/// Levenshtein distance counted in chars
pub fn edit_distance(a: &str, target: &str) -> usize {
    if a == target {
        return 0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = target.chars().collect();

    // Single rolling row of the DP table
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let above = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                diag
            } else {
                1 + diag.min(above).min(row[j - 1])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// `(len(target) - distance) / len(target)`, may be negative for very different strings
pub fn similarity(a: Option<&str>, target: Option<&str>) -> f64 {
    match (a, target) {
        (None, None) => 1.0,
        (None, _) | (_, None) => 0.0,
        (Some(a), Some(target)) => {
            let len = target.chars().count();
            if len == 0 {
                return if a.is_empty() { 1.0 } else { 0.0 };
            }
            (len as f64 - edit_distance(a, target) as f64) / len as f64
        }
    }
}

/// Candidates related to `target`.
///
/// Containment matches come first in input order, then up to three of the
/// most similar candidates not already listed.
pub fn similar_list<S: AsRef<str>>(candidates: &[S], target: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    let mut scored: Vec<(&str, f64)> = Vec::new();

    for candidate in candidates {
        let candidate = candidate.as_ref();
        if target.contains(candidate) || candidate.contains(target) {
            if !result.iter().any(|r| r == candidate) {
                result.push(candidate.to_string());
            }
        }
        if !scored.iter().any(|(c, _)| *c == candidate) {
            scored.push((candidate, similarity(Some(candidate), Some(target))));
        }
    }

    // Stable sort keeps input order among equal scores
    scored.sort_by(|x, y| y.1.total_cmp(&x.1));
    for (candidate, _) in scored.into_iter().take(SIMILAR_TOP_N) {
        if !result.iter().any(|r| r == candidate) {
            result.push(candidate.to_string());
        }
    }
    result
}

/// `userName` -> `user_name`
pub fn to_under_line(param: &str) -> Option<String> {
    if is_blank(param) {
        return None;
    }
    let mut out = String::with_capacity(param.len() + 4);
    for (i, c) in param.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    Some(out)
}

/// `user_name` -> `userName`
pub fn to_camel(param: &str) -> Option<String> {
    if is_blank(param) {
        return None;
    }
    let lower = param.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut chars = lower.chars();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.next() {
                out.extend(next.to_uppercase());
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Split on a regex, dropping blank pieces
pub fn str_split(text: &str, regex: &str) -> OfficeResult<Vec<String>> {
    if is_blank(text) {
        return Ok(Vec::new());
    }
    let re = Regex::new(regex)?;
    Ok(re
        .split(text)
        .filter(|piece| !is_blank(piece))
        .map(str::to_string)
        .collect())
}

/// Join with `separator`, `None` when there is nothing to join
pub fn str_join<T: Display>(separator: &str, items: &[T]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator),
    )
}

/// Add `element` to a separator-joined string unless already present.
///
/// The separator is given as a regex; it is joined back with backslashes removed.
pub fn str_set_add<T: Display>(original: &str, element: T, regex: &str) -> OfficeResult<String> {
    let mut set: IndexSet<String> = str_split(original, regex)?.into_iter().collect();
    set.insert(element.to_string());
    let items: Vec<String> = set.into_iter().collect();
    Ok(str_join(&regex.replace('\\', ""), &items).unwrap_or_default())
}

/// Like [`str_set_add`] but keeps duplicates
pub fn str_list_add<T: Display>(original: &str, element: T, regex: &str) -> OfficeResult<String> {
    let mut items = str_split(original, regex)?;
    items.push(element.to_string());
    Ok(str_join(&regex.replace('\\', ""), &items).unwrap_or_default())
}

/// First match of `regex` in `text`
pub fn pattern_part(text: &str, regex: &str) -> OfficeResult<Option<String>> {
    let re = Regex::new(regex)?;
    Ok(re.find(text).map(|m| m.as_str().to_string()))
}

/// Digits with at most one interior `.`
pub fn is_number(text: &str) -> bool {
    fn numeric(s: &str) -> bool {
        !s.is_empty() && s.chars().all(char::is_numeric)
    }
    match text.split_once('.') {
        None => numeric(text),
        Some((int_part, frac_part)) => numeric(int_part) && numeric(frac_part),
    }
}

/// Optional sign followed by digits
pub fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Case-insensitive equality; two `None`s or two empty strings are equal, a blank side never is
pub fn lower_compare(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(""), Some("")) => true,
        (Some(a), Some(b)) if !is_blank(a) && !is_blank(b) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

/// Round to four decimals
pub fn double_format(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Comma-separated ids to numbers
pub fn ids_to_list(ids: &str) -> OfficeResult<Vec<i64>> {
    ids.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i64>().map_err(|e| {
                crate::error::OfficeError::Conversion(format!("Invalid id '{}': {}", id, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("同名", "同名"), 0);
        assert_eq!(edit_distance("名字", "名"), 1);
    }

    #[test]
    fn test_similarity_edges() {
        assert_eq!(similarity(None, None), 1.0);
        assert_eq!(similarity(Some("a"), None), 0.0);
        assert_eq!(similarity(Some(""), Some("")), 1.0);
        assert_eq!(similarity(Some("x"), Some("")), 0.0);
        assert_eq!(similarity(Some("abcd"), Some("abcd")), 1.0);
        assert_eq!(similarity(Some("abcx"), Some("abcd")), 0.75);
    }

    #[test]
    fn test_similar_list_containment_first() {
        let candidates = ["apple pie", "banana", "apples", "grape"];
        let found = similar_list(&candidates, "apple");
        assert_eq!(found[0], "apple pie");
        assert_eq!(found[1], "apples");
        assert!(found.len() <= 4);
        assert!(found.iter().any(|c| c == "grape"));
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(to_under_line("userName").as_deref(), Some("user_name"));
        assert_eq!(to_under_line("UserName").as_deref(), Some("user_name"));
        assert_eq!(to_camel("user_name").as_deref(), Some("userName"));
        assert_eq!(to_camel("USER_NAME").as_deref(), Some("userName"));
        assert_eq!(to_camel(" "), None);
    }

    #[test]
    fn test_split_join() {
        assert_eq!(str_split("a, ,b,,c", ",").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(str_join::<String>(",", &[]), None);
        assert_eq!(str_join(",", &[1, 2]).as_deref(), Some("1,2"));
    }

    #[test]
    fn test_str_set_add() {
        assert_eq!(str_set_add("a|b", "b", r"\|").unwrap(), "a|b");
        assert_eq!(str_set_add("a|b", "c", r"\|").unwrap(), "a|b|c");
        assert_eq!(str_set_add("", 7, ",").unwrap(), "7");
    }

    #[test]
    fn test_number_checks() {
        assert!(is_number("12"));
        assert!(is_number("12.50"));
        assert!(!is_number("1.2.3"));
        assert!(!is_number("1."));
        assert!(!is_number("-1"));
        assert!(is_integer("-12"));
        assert!(is_integer("+7"));
        assert!(!is_integer("1.0"));
        assert!(!is_integer(""));
    }

    #[test]
    fn test_lower_compare() {
        assert!(lower_compare(Some("ABC"), Some("abc")));
        assert!(lower_compare(None, None));
        assert!(lower_compare(Some(""), Some("")));
        assert!(!lower_compare(Some(" "), Some(" ")));
        assert!(!lower_compare(Some("a"), None));
    }

    #[test]
    fn test_double_format() {
        assert_eq!(double_format(1.234_56), 1.2346);
        assert_eq!(double_format(2.0), 2.0);
    }
}
