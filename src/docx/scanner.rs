//! `${name}` placeholder scan over the runs of one paragraph
//!
//! Word splits text into runs wherever formatting or editing history
//! changes, so a single placeholder can span several runs (`$`, `{na`, `me}`).

use indexmap::IndexMap;
use std::ops::RangeInclusive;

/// Runs `first_run..=last_run` whose joined text contains one placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSpan {
    pub first_run: usize,
    pub last_run: usize,
}

impl PlaceholderSpan {
    pub fn runs(&self) -> RangeInclusive<usize> {
        self.first_run..=self.last_run
    }
}

/// Find every placeholder in the run texts of a paragraph.
///
/// Names map to their spans in paragraph order. A `$` not followed by `{`
/// is ordinary text and a placeholder still open at the last run is dropped.
pub fn find_placeholders<S: AsRef<str>>(runs: &[S]) -> IndexMap<String, Vec<PlaceholderSpan>> {
    let mut found: IndexMap<String, Vec<PlaceholderSpan>> = IndexMap::new();

    // Run holding the `$` that may start a placeholder
    let mut armed: Option<usize> = None;
    // First run of the placeholder being read
    let mut open: Option<usize> = None;
    let mut key = String::new();

    for (run_index, text) in runs.iter().enumerate() {
        for ch in text.as_ref().chars() {
            if let Some(dollar_run) = armed.take() {
                if ch == '{' {
                    open = Some(dollar_run);
                    key.clear();
                    continue;
                }
                if open.is_some() {
                    key.push('$');
                }
            }

            if ch == '$' {
                armed = Some(run_index);
                continue;
            }

            match open {
                Some(first_run) if ch == '}' => {
                    found
                        .entry(std::mem::take(&mut key))
                        .or_default()
                        .push(PlaceholderSpan {
                            first_run,
                            last_run: run_index,
                        });
                    open = None;
                }
                Some(_) => key.push(ch),
                None => {}
            }
        }
    }

    found
}
