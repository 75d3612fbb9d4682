//! Query-string codec.
//!
//! The address bar is modelled as an explicit `QueryParams` value: an ordered
//! list of key/value pairs plus a version counter that moves whenever a write
//! actually changes the content. `decode` reads the filter/sort state out of
//! it; `encode` writes the full state back over a copy, touching only the keys
//! this module owns and keeping every other pair as it was.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::fields::{SortOption, Status};
use crate::filter::FilterState;

/// Bytes left unescaped by `application/x-www-form-urlencoded`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'*').remove(b'-').remove(b'.').remove(b'_');

pub const KEY_STATUS: &str = "status";
pub const KEY_ASSIGNEES: &str = "assignees";
pub const KEY_FROM: &str = "from";
pub const KEY_TO: &str = "to";
pub const KEY_SEARCH: &str = "search";
pub const KEY_INCLUDE_WITHOUT_DATE: &str = "includeWithoutDate";
pub const KEY_SORT: &str = "sort";

/// Ordered, versioned query parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
    version: u64,
}

impl PartialEq for QueryParams {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

impl Eq for QueryParams {}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a form-encoded query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let pairs = query
            .trim_start_matches('?')
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        QueryParams { pairs, version: 0 }
    }

    /// Bumped by every write that changed the pairs.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set `key` to `value`. The first occurrence keeps its position, any
    /// duplicates are removed, and a missing key is appended.
    pub fn set(&mut self, key: &str, value: &str) {
        let before = self.pairs.clone();
        let mut seen = false;
        self.pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.to_string();
            true
        });
        if !seen {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self.bump_if_changed(&before);
    }

    /// Remove every occurrence of `key`.
    pub fn delete(&mut self, key: &str) {
        let len = self.pairs.len();
        self.pairs.retain(|(k, _)| k != key);
        if self.pairs.len() != len {
            self.version += 1;
        }
    }

    fn bump_if_changed(&mut self, before: &[(String, String)]) {
        if self.pairs != before {
            self.version += 1;
        }
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", encode_component(key), encode_component(value))?;
        }
        Ok(())
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, FORM).to_string().replace("%20", "+")
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

/// Read the filter and sort state. Missing or malformed parameters fall back
/// to empty selections, absent dates and the default sort.
pub fn decode(params: &QueryParams) -> (FilterState, SortOption) {
    let statuses = split_list(params.get(KEY_STATUS)).filter_map(Status::parse).collect();
    let assignee_ids = split_list(params.get(KEY_ASSIGNEES)).map(str::to_string).collect();
    let include_without_date = matches!(
        params.get(KEY_INCLUDE_WITHOUT_DATE),
        Some("1") | Some("true") | Some("yes")
    );
    let sort = params
        .get(KEY_SORT)
        .and_then(SortOption::parse)
        .unwrap_or_default();

    let filter = FilterState {
        statuses,
        assignee_ids,
        from: non_blank(params.get(KEY_FROM)),
        to: non_blank(params.get(KEY_TO)),
        search: params.get(KEY_SEARCH).unwrap_or("").to_string(),
        include_without_date,
    };
    (filter, sort)
}

/// Write the complete filter and sort state over a copy of `existing`.
/// Parameters at their empty value are removed; `sort` is always written.
pub fn encode(existing: &QueryParams, filter: &FilterState, sort: SortOption) -> QueryParams {
    let mut next = existing.clone();

    let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
    write_or_delete(&mut next, KEY_STATUS, Some(statuses.join(",")));

    let assignees: Vec<&str> = filter.assignee_ids.iter().map(String::as_str).collect();
    write_or_delete(&mut next, KEY_ASSIGNEES, Some(assignees.join(",")));

    write_or_delete(&mut next, KEY_FROM, filter.from.clone());
    write_or_delete(&mut next, KEY_TO, filter.to.clone());
    write_or_delete(&mut next, KEY_SEARCH, Some(filter.search.trim().to_string()));
    write_or_delete(
        &mut next,
        KEY_INCLUDE_WITHOUT_DATE,
        filter.include_without_date.then(|| "1".to_string()),
    );

    next.set(KEY_SORT, sort.as_str());
    next
}

fn write_or_delete(params: &mut QueryParams, key: &str, value: Option<String>) {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => params.set(key, &v),
        None => params.delete(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_encode_default_state_only_writes_sort() {
        let params = encode(&QueryParams::new(), &FilterState::default(), SortOption::default());
        assert_eq!(params.to_string(), "sort=created_at_desc");
    }

    #[test]
    fn test_encode_full_state() {
        let filter = FilterState {
            statuses: BTreeSet::from([Status::Done, Status::ToStart]),
            assignee_ids: BTreeSet::from(["u1".to_string(), "u2".to_string()]),
            from: Some("2024-01-15".to_string()),
            to: None,
            search: "  release notes ".to_string(),
            include_without_date: true,
        };
        let params = encode(&QueryParams::new(), &filter, SortOption::DueDateAsc);
        assert_eq!(
            params.to_string(),
            "status=to_start%2Cdone&assignees=u1%2Cu2&from=2024-01-15&search=release+notes&includeWithoutDate=1&sort=due_date_asc"
        );
    }

    #[test]
    fn test_encode_preserves_unknown_keys_and_clears_owned_ones() {
        let existing = QueryParams::parse("?tab=board&status=done&search=x&utm=a%26b");
        let params = encode(&existing, &FilterState::default(), SortOption::CreatedAtAsc);
        assert_eq!(params.to_string(), "tab=board&utm=a%26b&sort=created_at_asc");
        assert_eq!(params.get("utm"), Some("a&b"));
    }

    #[test]
    fn test_decode_defaults_on_garbage() {
        let params = QueryParams::parse("status=,bogus,%20done%20&sort=priority&from=&includeWithoutDate=0");
        let (filter, sort) = decode(&params);
        assert_eq!(filter.statuses, BTreeSet::from([Status::Done]));
        assert!(filter.assignee_ids.is_empty());
        assert_eq!(filter.from, None);
        assert!(!filter.include_without_date);
        assert_eq!(sort, SortOption::CreatedAtDesc);
    }

    #[test]
    fn test_decode_include_without_date_spellings() {
        for raw in ["1", "true", "yes"] {
            let params = QueryParams::parse(&format!("includeWithoutDate={raw}"));
            assert!(decode(&params).0.include_without_date, "{raw}");
        }
    }

    #[test]
    fn test_version_moves_only_on_change() {
        let mut params = QueryParams::new();
        params.set("sort", "due_date_asc");
        assert_eq!(params.version(), 1);
        params.set("sort", "due_date_asc");
        params.delete("missing");
        assert_eq!(params.version(), 1);
        params.delete("sort");
        assert_eq!(params.version(), 2);
    }

    #[test]
    fn test_set_collapses_duplicates_in_place() {
        let mut params = QueryParams::parse("a=1&sort=x&b=2&sort=y");
        params.set("sort", "z");
        assert_eq!(params.to_string(), "a=1&sort=z&b=2");
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("sort", "z"), ("b", "2")]);
    }

    fn filter_strategy() -> impl Strategy<Value = FilterState> {
        let date = proptest::option::of("20[0-9]{2}-(0[1-9]|1[0-2])-(0[1-9]|1[0-9]|2[0-8])");
        (
            prop::collection::btree_set(prop::sample::select(Status::ALL.to_vec()), 0..4),
            prop::collection::btree_set("[a-z0-9-]{1,8}", 0..4),
            date.clone(),
            date,
            proptest::option::of("[a-zA-Z0-9&=%+?#]([a-zA-Z0-9 &=%+?#]{0,10}[a-zA-Z0-9&=%+?#])?"),
            any::<bool>(),
        )
            .prop_map(|(statuses, assignee_ids, from, to, search, include_without_date)| FilterState {
                statuses,
                assignee_ids,
                from,
                to,
                search: search.unwrap_or_default(),
                include_without_date,
            })
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            filter in filter_strategy(),
            sort in prop::sample::select(SortOption::ALL.to_vec()),
        ) {
            let encoded = encode(&QueryParams::new(), &filter, sort);
            let reparsed = QueryParams::parse(&encoded.to_string());
            prop_assert_eq!(decode(&encoded), (filter.clone(), sort));
            prop_assert_eq!(decode(&reparsed), (filter, sort));
        }
    }
}
