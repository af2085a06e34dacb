//! Column edits on in-memory data sets

use std::collections::HashSet;

/// Where [`set_column_value`] puts the new column values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddType {
    /// Replace the cell at `column`
    Override,
    /// Insert at `column`, shifting the rest right
    InsertBefore,
    /// Insert at `column + 1`
    InsertAfter,
}

/// Write `column_data` down `column`, one value per non-skipped row.
///
/// Rows are created as needed and padded with `None`. Rows past the end of
/// `column_data` receive `None`, so inserted columns stay aligned.
pub fn set_column_value<T: Clone>(
    data: &mut Vec<Vec<Option<T>>>,
    column: usize,
    column_data: &[T],
    add_type: AddType,
    skip_rows: &[usize],
) {
    let skip: HashSet<usize> = skip_rows.iter().copied().collect();
    let mut next = 0;
    let mut row_index = 0;

    while next < column_data.len() || row_index < data.len() {
        if skip.contains(&row_index) {
            row_index += 1;
            continue;
        }
        if data.len() <= row_index {
            data.resize_with(row_index + 1, Vec::new);
        }

        let value = column_data.get(next).cloned();
        if value.is_some() {
            next += 1;
        }

        let row = &mut data[row_index];
        match add_type {
            AddType::Override => {
                if row.len() <= column {
                    row.resize(column + 1, None);
                }
                row[column] = value;
            }
            AddType::InsertBefore => {
                if row.len() < column {
                    row.resize(column, None);
                }
                row.insert(column, value);
            }
            AddType::InsertAfter => {
                if row.len() <= column {
                    row.resize(column + 1, None);
                }
                row.insert(column + 1, value);
            }
        }
        row_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(rows: &[&[&str]]) -> Vec<Vec<Option<String>>> {
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect()
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_override_pads_rows() {
        let mut data = sheet(&[&["a"], &["b"]]);
        set_column_value(&mut data, 2, &["x".to_string(), "y".to_string()], AddType::Override, &[]);
        assert_eq!(data[0], vec![s("a"), None, s("x")]);
        assert_eq!(data[1], vec![s("b"), None, s("y")]);
    }

    #[test]
    fn test_insert_before_with_header_skipped() {
        let mut data = sheet(&[&["Name", "Age"], &["Tom", "3"], &["Ann", "4"]]);
        set_column_value(&mut data, 0, &["1".to_string(), "2".to_string()], AddType::InsertBefore, &[0]);
        assert_eq!(data[0], vec![s("Name"), s("Age")]);
        assert_eq!(data[1], vec![s("1"), s("Tom"), s("3")]);
        assert_eq!(data[2], vec![s("2"), s("Ann"), s("4")]);
    }

    #[test]
    fn test_insert_after_appends_rows() {
        let mut data = sheet(&[&["a"]]);
        set_column_value(&mut data, 0, &[1, 2, 3].map(|n: i32| n.to_string()), AddType::InsertAfter, &[]);
        assert_eq!(data.len(), 3);
        assert_eq!(data[0], vec![s("a"), s("1")]);
        assert_eq!(data[2], vec![None, s("3")]);
    }

    #[test]
    fn test_short_column_fills_none() {
        let mut data = sheet(&[&["a"], &["b"], &["c"]]);
        set_column_value(&mut data, 0, &["x".to_string()], AddType::InsertBefore, &[]);
        assert_eq!(data[0], vec![s("x"), s("a")]);
        assert_eq!(data[1], vec![None, s("b")]);
        assert_eq!(data[2], vec![None, s("c")]);
    }

    #[test]
    fn test_skipped_row_beyond_data_is_left_empty() {
        let mut data: Vec<Vec<Option<i32>>> = Vec::new();
        set_column_value(&mut data, 0, &[7, 8], AddType::Override, &[1]);
        assert_eq!(data, vec![vec![Some(7)], vec![], vec![Some(8)]]);
    }
}
