use crate::models::{QuerySpec, VideoRecord};
use crate::utils::{coerce_date, contains_ignore_case};
use chrono::NaiveDate;

/// Which predicates a query honours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// Every predicate the query carries.
    Listing,
    /// Date range, region and type only; channel, hashtag and minViews are ignored.
    Aggregate,
}

struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    fn from_spec(spec: &QuerySpec) -> Option<Self> {
        if spec.start_date.is_none() && spec.end_date.is_none() {
            return None;
        }
        Some(Self {
            start: spec.start_date,
            end: spec.end_date,
        })
    }

    /// Records whose date can't be read never fall inside a bounded range.
    fn contains(&self, raw_date: &str) -> bool {
        let Some(date) = coerce_date(raw_date) else {
            return false;
        };
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn matches(record: &VideoRecord, spec: &QuerySpec, scope: FilterScope) -> bool {
    if let Some(range) = DateRange::from_spec(spec) {
        if !range.contains(&record.record_date) {
            return false;
        }
    }

    if let Some(region) = present(&spec.region) {
        if record.region != region {
            return false;
        }
    }

    if let Some(video_type) = &spec.video_type {
        if &record.video_type != video_type {
            return false;
        }
    }

    if scope == FilterScope::Aggregate {
        return true;
    }

    if let Some(channel) = present(&spec.channel) {
        if !contains_ignore_case(&record.channel_title, channel) {
            return false;
        }
    }

    // Substring over the raw tag list, so "#ca" also matches "#cat".
    if let Some(hashtag) = present(&spec.hashtag) {
        if !contains_ignore_case(&record.hashtags, hashtag) {
            return false;
        }
    }

    if let Some(min_views) = spec.min_views {
        if record.view_count < min_views {
            return false;
        }
    }

    true
}

/// Keeps the records matching every present predicate, in source order.
pub fn filter_records<'a>(
    records: &'a [VideoRecord],
    spec: &QuerySpec,
    scope: FilterScope,
) -> Vec<&'a VideoRecord> {
    records
        .iter()
        .filter(|record| matches(record, spec, scope))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoType;

    fn record(id: &str, date: &str, region: &str, channel: &str, tags: &str, views: u64) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            record_date: date.to_string(),
            region: region.to_string(),
            video_type: if id.starts_with('s') {
                VideoType::Shorts
            } else {
                VideoType::Videos
            },
            channel_title: channel.to_string(),
            hashtags: tags.to_string(),
            view_count: views,
            ..Default::default()
        }
    }

    fn fixture() -> Vec<VideoRecord> {
        vec![
            record("v1", "2025-09-10", "TW", "Mystery cat", "#ai,#cat,#funny", 96_079_554),
            record("v2", "2025-09-11", "TW", "Cooking Master", "#cooking,#food", 45_678_901),
            record("s3", "2025-09-12", "US", "Tech Reviewer", "#tech,#review", 23_456_789),
            record("v4", "not-a-date", "TW", "Mystery Cat Shorts", "#cat", 500),
            record("s5", "2025-09-13T08:00:00Z", "JP", "Travel Explorer", "", 12_345_678),
        ]
    }

    fn ids(records: &[&VideoRecord]) -> Vec<String> {
        records.iter().map(|r| r.video_id.clone()).collect()
    }

    #[test]
    fn test_no_predicates_is_identity() {
        let records = fixture();
        let filtered = filter_records(&records, &QuerySpec::default(), FilterScope::Listing);
        assert_eq!(ids(&filtered), vec!["v1", "v2", "s3", "v4", "s5"]);
    }

    #[test]
    fn test_date_range_is_inclusive_and_fails_closed() {
        let records = fixture();
        let spec = QuerySpec {
            start_date: NaiveDate::from_ymd_opt(2025, 9, 11),
            end_date: NaiveDate::from_ymd_opt(2025, 9, 13),
            ..Default::default()
        };

        let filtered = filter_records(&records, &spec, FilterScope::Listing);
        assert_eq!(ids(&filtered), vec!["v2", "s3", "s5"]);
    }

    #[test]
    fn test_open_ended_range_still_drops_malformed_dates() {
        let records = fixture();
        let spec = QuerySpec {
            end_date: NaiveDate::from_ymd_opt(2025, 9, 10),
            ..Default::default()
        };

        let filtered = filter_records(&records, &spec, FilterScope::Listing);
        assert_eq!(ids(&filtered), vec!["v1"]);
    }

    #[test]
    fn test_region_and_type_are_exact() {
        let records = fixture();
        let spec = QuerySpec {
            region: Some("TW".to_string()),
            video_type: Some(VideoType::Videos),
            ..Default::default()
        };

        let filtered = filter_records(&records, &spec, FilterScope::Listing);
        assert_eq!(ids(&filtered), vec!["v1", "v2", "v4"]);

        let lowercase = QuerySpec {
            region: Some("tw".to_string()),
            ..Default::default()
        };
        assert!(filter_records(&records, &lowercase, FilterScope::Listing).is_empty());
    }

    #[test]
    fn test_channel_and_hashtag_are_case_insensitive_substrings() {
        let records = fixture();
        let by_channel = QuerySpec {
            channel: Some("MYSTERY".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_records(&records, &by_channel, FilterScope::Listing)),
            vec!["v1", "v4"]
        );

        let by_partial_tag = QuerySpec {
            hashtag: Some("#CA".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_records(&records, &by_partial_tag, FilterScope::Listing)),
            vec!["v1", "v4"]
        );
    }

    #[test]
    fn test_min_views_floor_is_inclusive() {
        let records = fixture();
        let spec = QuerySpec {
            min_views: Some(23_456_789),
            ..Default::default()
        };

        let filtered = filter_records(&records, &spec, FilterScope::Listing);
        assert_eq!(ids(&filtered), vec!["v1", "v2", "s3"]);
    }

    #[test]
    fn test_aggregate_scope_ignores_listing_only_predicates() {
        let records = fixture();
        let spec = QuerySpec {
            region: Some("TW".to_string()),
            channel: Some("cooking".to_string()),
            hashtag: Some("#nothing".to_string()),
            min_views: Some(u64::MAX),
            ..Default::default()
        };

        assert!(filter_records(&records, &spec, FilterScope::Listing).is_empty());
        assert_eq!(
            ids(&filter_records(&records, &spec, FilterScope::Aggregate)),
            vec!["v1", "v2", "v4"]
        );
    }

    #[test]
    fn test_adding_predicates_never_grows_result() {
        let records = fixture();
        let steps = [
            QuerySpec::default(),
            QuerySpec {
                region: Some("TW".to_string()),
                ..Default::default()
            },
            QuerySpec {
                region: Some("TW".to_string()),
                channel: Some("cat".to_string()),
                ..Default::default()
            },
            QuerySpec {
                region: Some("TW".to_string()),
                channel: Some("cat".to_string()),
                min_views: Some(1_000),
                ..Default::default()
            },
        ];

        let sizes: Vec<usize> = steps
            .iter()
            .map(|spec| filter_records(&records, spec, FilterScope::Listing).len())
            .collect();
        assert!(sizes.windows(2).all(|w| w[1] <= w[0]), "{sizes:?}");
    }
}
