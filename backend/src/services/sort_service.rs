use crate::models::VideoRecord;
use crate::utils::{coerce_timestamp, compare_with_order};
use std::cmp::{Ordering, Reverse};

const DEFAULT_SORT_FIELD: &str = "viewCount";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Anything other than `asc` sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(order) if order.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    ViewCount,
    LikeCount,
    CommentCount,
    DurationSeconds,
    Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalField {
    PublishedAt,
    RecordDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalField {
    VideoId,
    Title,
    ChannelTitle,
    Region,
    Type,
    Url,
    Hashtags,
    /// Not a record column; every record compares equal.
    Unknown,
}

/// Comparison domain of a sort key, fixed once per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Numeric(NumericField),
    Temporal(TemporalField),
    Lexical(LexicalField),
}

impl SortField {
    pub fn resolve(name: &str) -> Self {
        match name.trim() {
            "viewCount" => SortField::Numeric(NumericField::ViewCount),
            "likeCount" => SortField::Numeric(NumericField::LikeCount),
            "commentCount" => SortField::Numeric(NumericField::CommentCount),
            "durationSeconds" => SortField::Numeric(NumericField::DurationSeconds),
            "rank" => SortField::Numeric(NumericField::Rank),
            "publishedAt" => SortField::Temporal(TemporalField::PublishedAt),
            "recordDate" => SortField::Temporal(TemporalField::RecordDate),
            "videoId" => SortField::Lexical(LexicalField::VideoId),
            "title" => SortField::Lexical(LexicalField::Title),
            "channelTitle" => SortField::Lexical(LexicalField::ChannelTitle),
            "region" => SortField::Lexical(LexicalField::Region),
            "type" => SortField::Lexical(LexicalField::Type),
            "url" => SortField::Lexical(LexicalField::Url),
            "hashtags" => SortField::Lexical(LexicalField::Hashtags),
            _ => SortField::Lexical(LexicalField::Unknown),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::resolve(DEFAULT_SORT_FIELD),
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    pub fn new(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        Self {
            field: SortField::resolve(sort_by.unwrap_or(DEFAULT_SORT_FIELD)),
            order: SortOrder::parse(sort_order),
        }
    }
}

fn numeric_key(record: &VideoRecord, field: NumericField) -> u64 {
    match field {
        NumericField::ViewCount => record.view_count,
        NumericField::LikeCount => record.like_count,
        NumericField::CommentCount => record.comment_count,
        NumericField::DurationSeconds => record.duration_seconds,
        NumericField::Rank => record.rank,
    }
}

/// Unparsable dates sort as the oldest possible instant.
fn temporal_key(record: &VideoRecord, field: TemporalField) -> i64 {
    let raw = match field {
        TemporalField::PublishedAt => &record.published_at,
        TemporalField::RecordDate => &record.record_date,
    };
    coerce_timestamp(raw).unwrap_or(i64::MIN)
}

fn lexical_key(record: &VideoRecord, field: LexicalField) -> &str {
    match field {
        LexicalField::VideoId => &record.video_id,
        LexicalField::Title => &record.title,
        LexicalField::ChannelTitle => &record.channel_title,
        LexicalField::Region => &record.region,
        LexicalField::Type => record.video_type.as_str(),
        LexicalField::Url => &record.url,
        LexicalField::Hashtags => &record.hashtags,
        LexicalField::Unknown => "",
    }
}

pub fn compare_records(a: &VideoRecord, b: &VideoRecord, sort: &SortSpec) -> Ordering {
    match sort.field {
        SortField::Numeric(field) => {
            compare_with_order(numeric_key(a, field), numeric_key(b, field), &sort.order)
        }
        SortField::Temporal(field) => {
            compare_with_order(temporal_key(a, field), temporal_key(b, field), &sort.order)
        }
        SortField::Lexical(field) => {
            compare_with_order(lexical_key(a, field), lexical_key(b, field), &sort.order)
        }
    }
}

/// Orders records in place. The sort is stable, so equal keys keep source order.
pub fn sort_records(records: &mut [&VideoRecord], sort: &SortSpec) {
    match (sort.field, sort.order) {
        // Date parsing is the expensive part; do it once per record.
        (SortField::Temporal(field), SortOrder::Asc) => {
            records.sort_by_cached_key(|r| temporal_key(r, field));
        }
        (SortField::Temporal(field), SortOrder::Desc) => {
            records.sort_by_cached_key(|r| Reverse(temporal_key(r, field)));
        }
        _ => records.sort_by(|a, b| compare_records(a, b, sort)),
    }
}
