//! Read-only view of the rotation record.

use chrono::{DateTime, FixedOffset, Utc};
use pipeline::{
    ArticleNumber, PostingSchedule, RotationPointer, RunFailure, RunStep, StateStore, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Summary of one cached article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedArticle {
    pub number: ArticleNumber,
    pub title: String,
    pub has_url: bool,
    pub word_count: usize,
    pub analysed: bool,
}

/// What `status` shows the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub current: RotationPointer,
    pub last_published: Option<Timestamp>,
    pub total_published: u64,
    pub articles: Vec<CachedArticle>,
    pub schedule: PostingSchedule,
    pub next_slot: DateTime<FixedOffset>,
}

/// Loads the rotation record and summarises it. Never writes.
pub async fn status(
    store: &dyn StateStore,
    schedule: PostingSchedule,
    now: DateTime<Utc>,
) -> Result<StatusReport, RunFailure> {
    let state = store
        .load()
        .await
        .map_err(|e| RunFailure::new(RunStep::LoadState, e))?;

    let articles = state
        .articles_cache
        .iter()
        .map(|a| CachedArticle {
            number: a.number,
            title: a.title.clone(),
            has_url: a.has_url(),
            word_count: a.word_count,
            analysed: state.analysis(a.number).is_some(),
        })
        .collect();

    Ok(StatusReport {
        current: state.pointer(),
        last_published: state.last_published,
        total_published: state.total_published,
        articles,
        schedule,
        next_slot: schedule
            .slot(schedule.first_slot_date(now), 0)
            .fixed_offset(),
    })
}
