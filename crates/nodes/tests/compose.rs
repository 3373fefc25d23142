mod support;

use nodes::compose_batch;
use pipeline::{
    Analysis, Article, ArticleNumber, FocusTheme, InsightExtraction, PipelineError,
    PLATFORM_LIMIT,
};
use support::{articles, insights, FakeComposer};

fn analysis_with(article: &Article, insights: Vec<String>, themes: &[&str]) -> Analysis {
    Analysis::from_extraction(
        article,
        InsightExtraction {
            key_insights: insights,
            themes: themes.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_batch_of_four_uses_four_distinct_insights() {
    let article = &articles()[0];
    let analysis = analysis_with(article, insights(7), &["Leadership"]);
    let composer = FakeComposer::default();

    let batch = compose_batch(&composer, article, &analysis, 4).await.unwrap();

    assert_eq!(batch.len(), 4);
    let featured: Vec<&str> = batch.iter().map(|v| v.insights_used[0].as_str()).collect();
    let mut distinct = featured.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 4);

    let focuses: Vec<FocusTheme> = batch.iter().map(|v| v.focus).collect();
    assert_eq!(
        focuses,
        vec![
            FocusTheme::StrategicValue,
            FocusTheme::SystematicApproach,
            FocusTheme::PracticalApplication,
            FocusTheme::ExpertInsights,
        ]
    );
}

#[tokio::test]
async fn test_two_insights_cycle_across_four_variations() {
    let article = &articles()[1];
    let analysis = analysis_with(article, insights(2), &[]);
    let composer = FakeComposer::default();

    let batch = compose_batch(&composer, article, &analysis, 4).await.unwrap();

    let featured: Vec<&str> = batch.iter().map(|v| v.insights_used[0].as_str()).collect();
    assert_eq!(featured, vec!["Insight 1", "Insight 2", "Insight 1", "Insight 2"]);
}

#[tokio::test]
async fn test_single_insight_repeats_for_every_variation() {
    let article = &articles()[2];
    let analysis = analysis_with(article, insights(1), &[]);
    let composer = FakeComposer::default();

    let batch = compose_batch(&composer, article, &analysis, 4).await.unwrap();

    assert_eq!(batch.len(), 4);
    assert!(batch.iter().all(|v| v.insights_used == ["Insight 1"]));
}

#[tokio::test]
async fn test_batch_calls_composer_in_variation_order() {
    let article = &articles()[0];
    let analysis = analysis_with(article, insights(7), &[]);
    let composer = FakeComposer::default();

    compose_batch(&composer, article, &analysis, 4).await.unwrap();

    let requests = composer.requests.lock().unwrap();
    let order: Vec<u32> = requests.iter().map(|r| r.variation.get()).collect();
    assert_eq!(order, vec![1, 2, 3, 4]);
    assert!(requests.iter().all(|r| r.max_chars < PLATFORM_LIMIT));
}

#[tokio::test]
async fn test_posts_carry_link_and_hashtags() {
    let article = &articles()[0];
    let analysis = analysis_with(article, insights(7), &["Machine learning at scale"]);
    let composer = FakeComposer::default();

    let batch = compose_batch(&composer, article, &analysis, 4).await.unwrap();

    for variant in &batch {
        assert!(variant.content.contains(&article.url));
        assert!(variant.content.ends_with(&variant.hashtags.join(" ")));
        assert_eq!(variant.hashtags[0], "#AI");
        assert!(variant.character_count <= PLATFORM_LIMIT);
        assert_eq!(variant.article_number, ArticleNumber::new(1));
    }
}

#[tokio::test]
async fn test_empty_pool_is_rejected() {
    let article = &articles()[0];
    let analysis = analysis_with(article, Vec::new(), &[]);
    let composer = FakeComposer::default();

    let err = compose_batch(&composer, article, &analysis, 4).await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyInsightPool { .. }));
    assert_eq!(composer.calls(), 0);
}
