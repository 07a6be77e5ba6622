use crate::models::{ChannelStat, HashtagStat, TrendBucket, VideoRecord};
use crate::utils::coerce_date;
use std::collections::HashMap;

pub const TOP_HASHTAGS: usize = 20;
pub const TOP_CHANNELS: usize = 10;

/// Insertion-ordered map from a bucket key to its accumulator.
///
/// Built fresh for every call; ranking ties fall back to first-seen order.
struct Buckets<A> {
    index: HashMap<String, usize>,
    entries: Vec<(String, A)>,
}

impl<A: Default> Buckets<A> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut A {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key.to_string(), A::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot].1
    }

    fn into_entries(self) -> Vec<(String, A)> {
        self.entries
    }
}

#[derive(Default)]
struct DayTotals {
    views: u64,
    likes: u64,
    comments: u64,
    videos: u64,
}

#[derive(Default)]
struct TagTotals {
    count: u64,
    views: u64,
}

#[derive(Default)]
struct ChannelTotals {
    videos: u64,
    views: u64,
    likes: u64,
}

/// Rolls records up per literal `recordDate`, oldest day first.
pub fn trend_rollup<'a>(records: impl IntoIterator<Item = &'a VideoRecord>) -> Vec<TrendBucket> {
    let mut days: Buckets<DayTotals> = Buckets::new();

    for record in records {
        let day = days.entry(&record.record_date);
        day.views = day.views.saturating_add(record.view_count);
        day.likes = day.likes.saturating_add(record.like_count);
        day.comments = day.comments.saturating_add(record.comment_count);
        day.videos += 1;
    }

    let mut trends: Vec<TrendBucket> = days
        .into_entries()
        .into_iter()
        .map(|(date, totals)| TrendBucket {
            date,
            total_views: totals.views,
            total_likes: totals.likes,
            total_comments: totals.comments,
            video_count: totals.videos,
        })
        .collect();

    // Unreadable dates (None) sort first; same calendar day orders by text.
    trends.sort_by_cached_key(|bucket| (coerce_date(&bucket.date), bucket.date.clone()));
    trends
}

/// Splits a raw tag list on commas, trimming and dropping empty tokens.
pub fn explode_hashtags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|tag| !tag.is_empty())
}

/// Counts every tag occurrence. Each occurrence adds the record's full view count.
pub fn hashtag_ranking<'a>(
    records: impl IntoIterator<Item = &'a VideoRecord>,
    top: usize,
) -> Vec<HashtagStat> {
    let mut tags: Buckets<TagTotals> = Buckets::new();

    for record in records {
        for tag in explode_hashtags(&record.hashtags) {
            let totals = tags.entry(tag);
            totals.count += 1;
            totals.views = totals.views.saturating_add(record.view_count);
        }
    }

    let mut ranking: Vec<HashtagStat> = tags
        .into_entries()
        .into_iter()
        .map(|(hashtag, totals)| HashtagStat {
            hashtag,
            count: totals.count,
            total_views: totals.views,
        })
        .collect();

    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking.truncate(top);
    ranking
}

pub fn average_views(total_views: u64, video_count: u64) -> u64 {
    if video_count == 0 {
        return 0;
    }
    // Round half up without going through floats.
    let quotient = total_views / video_count;
    let remainder = total_views % video_count;
    if remainder >= video_count - remainder {
        quotient + 1
    } else {
        quotient
    }
}

/// Ranks channels by total views. Records without a channel title are skipped.
pub fn channel_ranking<'a>(
    records: impl IntoIterator<Item = &'a VideoRecord>,
    top: usize,
) -> Vec<ChannelStat> {
    let mut channels: Buckets<ChannelTotals> = Buckets::new();

    for record in records.into_iter().filter(|r| !r.channel_title.is_empty()) {
        let totals = channels.entry(&record.channel_title);
        totals.videos += 1;
        totals.views = totals.views.saturating_add(record.view_count);
        totals.likes = totals.likes.saturating_add(record.like_count);
    }

    let mut ranking: Vec<ChannelStat> = channels
        .into_entries()
        .into_iter()
        .map(|(channel_title, totals)| ChannelStat {
            channel_title,
            video_count: totals.videos,
            total_views: totals.views,
            total_likes: totals.likes,
            avg_views: average_views(totals.views, totals.videos),
        })
        .collect();

    ranking.sort_by(|a, b| b.total_views.cmp(&a.total_views));
    ranking.truncate(top);
    ranking
}
