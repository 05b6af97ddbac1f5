use chrono::{DateTime, Utc};

use crate::entity::user::WatchHistoryItem;

/// Maximum number of history entries retained per user.
pub const HISTORY_CAP: usize = 100;

/// Record a watch event in a history list.
///
/// An existing entry for the video is refreshed in place: its timestamp
/// moves to `now` and its duration only ever grows. An unseen video is
/// pushed to the front, after which the list is truncated to
/// `HISTORY_CAP`, discarding the oldest entries.
pub fn record_watch(
    history: &mut Vec<WatchHistoryItem>,
    video_id: i32,
    watch_duration: f64,
    now: DateTime<Utc>,
) {
    if let Some(entry) = history.iter_mut().find(|e| e.video_id == video_id) {
        entry.watched_at = now;
        entry.watch_duration = entry.watch_duration.max(watch_duration);
    } else {
        history.insert(
            0,
            WatchHistoryItem {
                video_id,
                watched_at: now,
                watch_duration,
            },
        );
        history.truncate(HISTORY_CAP);
    }
}

/// Drop every entry referencing the given video. No-op when absent.
pub fn remove_video(history: &mut Vec<WatchHistoryItem>, video_id: i32) {
    history.retain(|e| e.video_id != video_id);
}
