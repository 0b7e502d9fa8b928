use std::sync::Arc;
use std::time::Duration;

use parley_llm::{GeneratedTitleSuggester, HeuristicTitleSuggester, ScriptedGenerator, TitleSuggester};

#[tokio::test]
async fn test_generated_title_is_cleaned() {
    let generator = Arc::new(ScriptedGenerator::new(vec!["\"Kyoto".into(), " trip\"".into()]));
    let titles = GeneratedTitleSuggester::new(generator, Duration::from_secs(1));

    assert_eq!(titles.suggest_title("Help me plan a trip to Kyoto").await, "Kyoto trip");
}

#[tokio::test]
async fn test_timeout_falls_back_to_heuristic() {
    let slow = Arc::new(ScriptedGenerator::new(vec!["Never".into()]).with_delay(Duration::from_secs(5)));
    let titles = GeneratedTitleSuggester::new(slow, Duration::from_millis(20));

    assert_eq!(titles.suggest_title("Weekend plans").await, "Weekend plans");
}

#[tokio::test]
async fn test_stream_error_falls_back_to_heuristic() {
    let broken = Arc::new(ScriptedGenerator::new(vec!["Par".into()]).failing_after(1, "model offline"));
    let titles = GeneratedTitleSuggester::new(broken, Duration::from_secs(1))
        .with_fallback(HeuristicTitleSuggester::new(8));

    assert_eq!(titles.suggest_title("Grocery list for the week").await, "Grocery…");
}

#[tokio::test]
async fn test_empty_answer_falls_back_to_heuristic() {
    let silent = Arc::new(ScriptedGenerator::new(vec![]));
    let titles = GeneratedTitleSuggester::new(silent, Duration::from_secs(1));

    assert_eq!(titles.suggest_title("Hello").await, "Hello");
}
