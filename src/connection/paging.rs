//! Cursor and range paging for engines without native cursors.

use crate::error::NosqlResult;
use crate::pattern::matches;
use crate::types::{Cursor, KeyString, ScanPage};

/// Offset-cursor scan over keys in engine order.
///
/// The cursor counts matching keys already returned: the first `cursor`
/// matches are skipped, then up to `count` are collected. When the page
/// fills and the iteration has any key left, the next cursor is
/// `cursor + count`; otherwise it is `0`. Every page costs a walk from the
/// first key.
pub fn offset_scan<I>(keys: I, cursor: Cursor, pattern: &str, count: u64) -> NosqlResult<ScanPage>
where
    I: IntoIterator<Item = NosqlResult<KeyString>>,
{
    let mut iter = keys.into_iter();
    let mut skipped: u64 = 0;
    let mut page = Vec::new();

    if count > 0 {
        for key in iter.by_ref() {
            let key = key?;
            if !matches(pattern, key.as_bytes()) {
                continue;
            }
            if skipped < cursor {
                skipped += 1;
                continue;
            }
            page.push(key);
            if page.len() as u64 >= count {
                break;
            }
        }
    }

    let full = page.len() as u64 >= count;
    let next = if full && iter.next().is_some() {
        cursor.saturating_add(count)
    } else {
        0
    };
    Ok(ScanPage { keys: page, cursor: next })
}

/// Collects keys with `start < key < end`, at most `limit` of them.
///
/// `keys` should already be positioned at `start`; anything sorting at or
/// before it is skipped and iteration stops at the first key `>= end`.
pub fn range_keys<I>(keys: I, start: &KeyString, end: &KeyString, limit: u64) -> NosqlResult<Vec<KeyString>>
where
    I: IntoIterator<Item = NosqlResult<KeyString>>,
{
    let mut out = Vec::new();
    for key in keys {
        if out.len() as u64 >= limit {
            break;
        }
        let key = key?;
        if key <= *start {
            continue;
        }
        if key >= *end {
            break;
        }
        out.push(key);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<NosqlResult<KeyString>> {
        names.iter().map(|n| Ok(KeyString::from(*n))).collect()
    }

    fn names(page: &[KeyString]) -> Vec<String> {
        page.iter().map(|k| k.to_string_lossy()).collect()
    }

    #[test]
    fn pages_until_cursor_returns_to_zero() {
        let all = ["a", "b", "c", "d", "e"];
        let first = offset_scan(keys(&all), 0, "*", 2).unwrap();
        assert_eq!(names(&first.keys), vec!["a", "b"]);
        assert_eq!(first.cursor, 2);

        let second = offset_scan(keys(&all), first.cursor, "*", 2).unwrap();
        assert_eq!(names(&second.keys), vec!["c", "d"]);
        assert_eq!(second.cursor, 4);

        let last = offset_scan(keys(&all), second.cursor, "*", 2).unwrap();
        assert_eq!(names(&last.keys), vec!["e"]);
        assert!(last.is_last());
    }

    #[test]
    fn exact_fill_with_no_remainder_ends() {
        let page = offset_scan(keys(&["a", "b"]), 0, "*", 2).unwrap();
        assert_eq!(page.keys.len(), 2);
        assert_eq!(page.cursor, 0);
    }

    #[test]
    fn pattern_filters_before_offset() {
        let all = ["user:1", "post:1", "user:2", "post:2", "user:3"];
        let first = offset_scan(keys(&all), 0, "user:*", 1).unwrap();
        assert_eq!(names(&first.keys), vec!["user:1"]);
        let second = offset_scan(keys(&all), first.cursor, "user:*", 1).unwrap();
        assert_eq!(names(&second.keys), vec!["user:2"]);
    }

    #[test]
    fn trailing_non_matching_keys_give_empty_terminal_page() {
        let all = ["user:1", "post:1"];
        let first = offset_scan(keys(&all), 0, "user:*", 1).unwrap();
        assert_eq!(first.cursor, 1);
        let second = offset_scan(keys(&all), first.cursor, "user:*", 1).unwrap();
        assert!(second.keys.is_empty());
        assert!(second.is_last());
    }

    #[test]
    fn range_is_exclusive_on_both_ends() {
        let all = ["a", "b", "c", "d"];
        let got = range_keys(keys(&all), &"a".into(), &"d".into(), 10).unwrap();
        assert_eq!(names(&got), vec!["b", "c"]);

        let got = range_keys(keys(&all), &"".into(), &"z".into(), 10).unwrap();
        assert_eq!(names(&got), vec!["a", "b", "c", "d"]);

        let got = range_keys(keys(&all), &"".into(), &"z".into(), 3).unwrap();
        assert_eq!(got.len(), 3);
    }
}
