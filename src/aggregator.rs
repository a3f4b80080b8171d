use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use tracing::{info, warn};

use crate::cleaner::CleanTable;

/// Per-URL totals for one report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub url: String,
    pub pageviews: u64,
    pub visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateTable {
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub const COLUMNS: [&'static str; 3] = ["url", "pageviews", "visitors"];

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Default)]
struct UrlAccumulator<'a> {
    pageviews: u64,
    visitors: HashSet<&'a str>,
}

/// Counts page views and distinct visitors per URL for events with
/// `from <= timestamp <= to`. Rows come out sorted by URL.
///
/// Events without a URL are not grouped. Events without a user id count as
/// page views but not as visitors.
pub fn aggregate(table: &CleanTable, from: DateTime<Utc>, to: DateTime<Utc>) -> AggregateTable {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "range_aggregator",
        from = %from,
        to = %to,
        record_count = table.records.len(),
        "Aggregating visits by URL"
    );

    if from > to {
        warn!(
            action = "validate",
            component = "range_aggregator",
            from = %from,
            to = %to,
            "Window start is after window end"
        );
    }

    let mut groups: BTreeMap<&str, UrlAccumulator> = BTreeMap::new();
    let mut in_window = 0usize;
    for record in &table.records {
        if record.timestamp < from || record.timestamp > to {
            continue;
        }
        in_window += 1;

        let Some(url) = record.url.as_deref() else {
            continue;
        };
        let acc = groups.entry(url).or_default();
        acc.pageviews += 1;
        if let Some(userid) = record.userid.as_deref() {
            acc.visitors.insert(userid);
        }
    }

    let rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|(url, acc)| AggregateRow {
            url: url.to_string(),
            pageviews: acc.pageviews,
            visitors: acc.visitors.len() as u64,
        })
        .collect();

    info!(
        action = "complete",
        component = "range_aggregator",
        records_in_window = in_window,
        url_count = rows.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Aggregation completed"
    );
    AggregateTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::EventRecord;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 9, 1, hour, minute, 0).unwrap()
    }

    fn event(timestamp: DateTime<Utc>, url: Option<&str>, userid: Option<&str>) -> EventRecord {
        EventRecord {
            timestamp,
            url: url.map(str::to_string),
            userid: userid.map(str::to_string),
            extra: vec![],
        }
    }

    fn table(records: Vec<EventRecord>) -> CleanTable {
        CleanTable {
            columns: vec!["timestamp".into(), "url".into(), "userid".into()],
            records,
        }
    }

    fn row(url: &str, pageviews: u64, visitors: u64) -> AggregateRow {
        AggregateRow {
            url: url.to_string(),
            pageviews,
            visitors,
        }
    }

    #[test]
    fn counts_views_and_distinct_visitors_inside_window() {
        // Arrange
        let logs = table(vec![
            event(at(9, 0), Some("/contact.html"), Some("12345")),
            event(at(9, 0), Some("/contact.html"), Some("12346")),
            event(at(10, 0), Some("/contact.html"), Some("12345")),
            event(at(11, 0), Some("/contact.html"), Some("12347")),
        ]);

        // Act
        let result = aggregate(&logs, at(9, 0), at(9, 59));

        // Assert
        assert_eq!(result.rows, vec![row("/contact.html", 2, 2)]);
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let logs = table(vec![
            event(at(8, 59), Some("/a"), Some("1")),
            event(at(9, 0), Some("/a"), Some("2")),
            event(at(10, 0), Some("/a"), Some("3")),
            event(at(10, 1), Some("/a"), Some("4")),
        ]);

        let result = aggregate(&logs, at(9, 0), at(10, 0));

        assert_eq!(result.rows, vec![row("/a", 2, 2)]);
    }

    #[test]
    fn repeat_visits_count_as_views_not_visitors() {
        let logs = table(vec![
            event(at(9, 0), Some("/a"), Some("1")),
            event(at(9, 1), Some("/a"), Some("1")),
            event(at(9, 2), Some("/a"), Some("1")),
        ]);

        let result = aggregate(&logs, at(9, 0), at(9, 59));

        assert_eq!(result.rows, vec![row("/a", 3, 1)]);
    }

    #[test]
    fn rows_are_sorted_by_url() {
        let logs = table(vec![
            event(at(9, 0), Some("/z"), Some("1")),
            event(at(9, 0), Some("/a"), Some("1")),
            event(at(9, 0), Some("/m"), Some("2")),
            event(at(9, 5), Some("/a"), Some("2")),
        ]);

        let result = aggregate(&logs, at(9, 0), at(9, 59));

        assert_eq!(
            result.rows,
            vec![row("/a", 2, 2), row("/m", 1, 1), row("/z", 1, 1)]
        );
    }

    #[test]
    fn empty_window_yields_no_rows() {
        let logs = table(vec![event(at(9, 0), Some("/a"), Some("1"))]);

        assert!(aggregate(&logs, at(10, 0), at(11, 0)).is_empty());
        assert!(aggregate(&logs, at(9, 30), at(8, 0)).is_empty());
        assert!(aggregate(&table(vec![]), at(0, 0), at(23, 59)).is_empty());
    }

    #[test]
    fn null_url_is_skipped_and_null_userid_is_not_a_visitor() {
        let logs = table(vec![
            event(at(9, 0), None, Some("1")),
            event(at(9, 0), Some("/a"), None),
            event(at(9, 1), Some("/a"), Some("2")),
        ]);

        let result = aggregate(&logs, at(9, 0), at(9, 59));

        assert_eq!(result.rows, vec![row("/a", 2, 1)]);
    }

    #[test]
    fn visitors_never_exceed_pageviews_and_views_match_window_counts() {
        // Arrange
        let urls = ["/a", "/b", "/c"];
        let records: Vec<EventRecord> = (0..60u32)
            .map(|i| {
                let url = urls[(i % 3) as usize];
                let user = (i % 7).to_string();
                event(at(i / 6 + 8, i % 60), Some(url), Some(user.as_str()))
            })
            .collect();
        let logs = table(records.clone());
        let (from, to) = (at(9, 0), at(12, 0));

        // Act
        let result = aggregate(&logs, from, to);

        // Assert
        assert!(!result.is_empty());
        for r in &result.rows {
            let expected = records
                .iter()
                .filter(|e| e.url.as_deref() == Some(r.url.as_str()))
                .filter(|e| e.timestamp >= from && e.timestamp <= to)
                .count() as u64;
            assert!(r.visitors <= r.pageviews, "{r:?}");
            assert_eq!(r.pageviews, expected, "{r:?}");
        }
    }
}
