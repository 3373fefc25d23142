mod support;

use std::sync::atomic::Ordering;

use chrono::{DateTime, TimeZone, Utc};
use nodes::{status, Scheduler};
use pipeline::{
    ArticleNumber, FocusTheme, PipelineError, PostingSchedule, RunStep, VariationNumber,
    MAX_PREVIEW_WEEKS,
};
use support::{warmed_state, Harness};

fn monday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 12, 0, 0).unwrap()
}

fn scheduler(harness: &Harness) -> Scheduler {
    Scheduler::new(
        harness.collaborators(),
        harness.settings(),
        PostingSchedule::default(),
    )
}

#[tokio::test]
async fn test_preview_walks_pointer_across_article_boundary() {
    let harness = Harness::new(Some(warmed_state(1, 3)));

    let preview = scheduler(&harness).preview(4, monday_noon()).await.unwrap();

    let pointers: Vec<(u32, u32)> = preview
        .items
        .iter()
        .map(|i| (i.article_number.get(), i.variation_number.get()))
        .collect();
    assert_eq!(pointers, vec![(1, 3), (1, 4), (2, 1), (2, 2)]);
    assert_eq!(preview.items[0].focus, FocusTheme::PracticalApplication);
    assert_eq!(preview.items[2].article_title, "Article 2");
}

#[tokio::test]
async fn test_preview_dates_follow_the_weekly_slot() {
    let harness = Harness::new(Some(warmed_state(1, 1)));

    let preview = scheduler(&harness).preview(3, monday_noon()).await.unwrap();

    let dates: Vec<String> = preview
        .items
        .iter()
        .map(|i| i.scheduled_for.to_rfc3339())
        .collect();
    assert_eq!(
        dates,
        vec![
            "2025-01-09T11:30:00-05:00",
            "2025-01-16T11:30:00-05:00",
            "2025-01-23T11:30:00-05:00",
        ]
    );
    assert_eq!(preview.items[0].week, 1);
}

#[tokio::test]
async fn test_preview_never_moves_the_stored_pointer() {
    let harness = Harness::new(Some(warmed_state(2, 4)));
    let before = harness.store.snapshot();

    let preview = scheduler(&harness).preview(6, monday_noon()).await.unwrap();

    assert_eq!(preview.items.len(), 6);
    assert!(!preview.cache_written);
    assert_eq!(harness.store.snapshot(), before);
    assert_eq!(harness.publisher.calls(), 0);
}

#[tokio::test]
async fn test_preview_persists_new_analyses_once() {
    let harness = Harness::new(None);

    let preview = scheduler(&harness).preview(5, monday_noon()).await.unwrap();

    assert!(preview.cache_written);
    assert_eq!(harness.store.saves(), 1);
    assert_eq!(harness.extractor.calls.load(Ordering::SeqCst), 2);

    let state = harness.store.state();
    assert_eq!(state.current_article, ArticleNumber::first());
    assert_eq!(state.current_variation, VariationNumber::first());
    assert!(state.analysis(ArticleNumber::new(1)).is_some());
    assert!(state.analysis(ArticleNumber::new(2)).is_some());
    assert!(state.analysis(ArticleNumber::new(3)).is_none());
}

#[tokio::test]
async fn test_preview_of_zero_weeks_is_empty() {
    let harness = Harness::new(Some(warmed_state(1, 1)));

    let preview = scheduler(&harness).preview(0, monday_noon()).await.unwrap();

    assert!(preview.items.is_empty());
    assert_eq!(harness.composer.calls(), 0);
}

#[tokio::test]
async fn test_status_summarises_without_writing() {
    let harness = Harness::new(Some(warmed_state(3, 2)));

    let report = status(
        harness.store.as_ref(),
        PostingSchedule::default(),
        monday_noon(),
    )
    .await
    .unwrap();

    assert_eq!(report.current.to_string(), "article #3 variation 2");
    assert_eq!(report.articles.len(), 5);
    assert!(report.articles.iter().all(|a| a.analysed));
    assert!(!report.articles[4].has_url);
    assert_eq!(report.next_slot.to_rfc3339(), "2025-01-09T11:30:00-05:00");
    assert_eq!(harness.store.saves(), 0);
}

#[tokio::test]
async fn test_preview_beyond_maximum_weeks_fails_before_any_work() {
    let harness = Harness::new(Some(warmed_state(1, 1)));

    let failure = scheduler(&harness)
        .preview(u32::MAX, monday_noon())
        .await
        .unwrap_err();

    assert_eq!(failure.step, RunStep::ProjectSchedule);
    assert!(matches!(
        failure.error,
        PipelineError::PreviewTooLong {
            weeks: u32::MAX,
            max: MAX_PREVIEW_WEEKS
        }
    ));
    assert_eq!(harness.composer.calls(), 0);
    assert_eq!(harness.store.saves(), 0);
}
