//! End-to-end query tests
//!
//! Queries run through the evaluator against fixture pages under
//! `tests/fixtures`, served by a `MemoryFetcher`.

use std::path::Path;
use std::sync::Arc;
use wikipediabase::config::Config;
use wikipediabase::evaluator::Evaluator;
use wikipediabase::fetcher::MemoryFetcher;
use wikipediabase::Knowledgebase;

const BASE_URL: &str = "https://en.wikipedia.org/w/";

/// Creates an evaluator over the fixture pages
fn create_evaluator() -> Evaluator {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let fetcher = MemoryFetcher::from_dir(BASE_URL, &fixtures).expect("Failed to load fixtures");
    let kb = Knowledgebase::new(&Config::default(), Arc::new(fetcher));
    Evaluator::new(Arc::new(kb))
}

async fn ask(query: &str) -> String {
    create_evaluator().eval_str(query).await.to_string()
}

#[tokio::test]
async fn test_mountain_elevation_by_code() {
    assert_eq!(
        ask(r#"(get "wikipedia-mountain" "Mount Everest" (:code "ELEVATION_M"))"#).await,
        r#"((:html "8848"))"#
    );
}

#[tokio::test]
async fn test_president_birth_date() {
    assert_eq!(
        ask(r#"(get "wikibase-person" "Bill Clinton" "BIRTH-DATE")"#).await,
        "((:yyyymmdd 19460819))"
    );
}

#[tokio::test]
async fn test_birth_date_through_redirect() {
    assert_eq!(
        ask(r#"(get "Clinton" "BIRTH-DATE")"#).await,
        "((:yyyymmdd 19460819))"
    );
}

#[tokio::test]
async fn test_living_person_death_date() {
    assert_eq!(
        ask(r#"(get "wikibase-person" "Barack Obama" "DEATH-DATE")"#).await,
        r#"((:error attribute-value-not-found :reply "Currently alive"))"#
    );
}

#[tokio::test]
async fn test_sea_coordinates() {
    assert_eq!(
        ask(r#"(get "wikibase-term" "Black Sea" "COORDINATES")"#).await,
        "((:coordinates 44 35))"
    );
}

#[tokio::test]
async fn test_president_classes() {
    let answer = ask(r#"(get-classes "Bill Clinton")"#).await;
    for cls in [
        "wikipedia-president",
        "wikipedia-officeholder",
        "wikibase-person",
        "wikibase-term",
        "wikibase-sections",
    ] {
        assert!(answer.contains(&format!("\"{}\"", cls)), "{} missing from {}", cls, answer);
    }
}

#[tokio::test]
async fn test_classes_are_stable() {
    let evaluator = create_evaluator();
    let first = evaluator.eval_str(r#"(get-classes "Barack Obama")"#).await;
    let second = evaluator.eval_str(r#"(get-classes "Barack Obama")"#).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sort_symbols_by_length() {
    assert_eq!(
        ask(r#"(sort-symbols "Mary Shakespeare" "Batman")"#).await,
        r#"("Batman" "Mary Shakespeare")"#
    );
}

#[tokio::test]
async fn test_gender() {
    assert_eq!(
        ask(r#"(get "Barack Obama" "GENDER")"#).await,
        r#"((:calculated "masculine"))"#
    );
}

#[tokio::test]
async fn test_infobox_value_by_rendered_label() {
    assert_eq!(
        ask(r#"(get "wikipedia-comics-character" "Batman" "ALTER-EGO")"#).await,
        r#"((:html "Bruce Wayne"))"#
    );
}

#[tokio::test]
async fn test_mountain_attributes() {
    let answer = ask(r#"(get-attributes "wikipedia-mountain" "Mount Everest")"#).await;
    assert!(answer.contains(r#"(:code "ELEVATION_M" :rendered "Elevation")"#), "{}", answer);
    assert!(answer.contains(r#"(:code "RANGE" :rendered "Parent range")"#), "{}", answer);
}

#[tokio::test]
async fn test_url() {
    assert_eq!(
        ask(r#"(get "wikibase-term" "Clinton" "URL")"#).await,
        r#"((:url "https://en.wikipedia.org/wiki/Bill_Clinton"))"#
    );
}

#[tokio::test]
async fn test_sections() {
    let answer = ask(r#"(get "wikibase-sections" "Batman" "SECTIONS")"#).await;
    assert!(answer.contains("Publication history"), "{}", answer);
    assert!(answer.contains("Fictional character biography"), "{}", answer);
}

#[tokio::test]
async fn test_missing_attribute() {
    assert_eq!(
        ask(r#"(get "wikibase-term" "Black Sea" "SPOUSE")"#).await,
        r#"((:error attribute-value-not-found :reply "No value for SPOUSE of Black Sea"))"#
    );
}

#[tokio::test]
async fn test_missing_article() {
    assert_eq!(
        ask(r#"(get "Atlantis" "URL")"#).await,
        r#"((:error attribute-value-not-found :reply "No article named Atlantis"))"#
    );
}

#[tokio::test]
async fn test_malformed_query() {
    let answer = ask(r#"(get "Batman" "URL""#).await;
    assert!(answer.starts_with("(:error syntax-error :reply"), "{}", answer);
}

#[tokio::test]
async fn test_date_keyword_at_integer_extremes() {
    for n in [i64::MIN, i64::MAX] {
        let answer = ask(&format!("(:yyyymmdd {})", n)).await;
        assert!(answer.starts_with("(:error no-date-found"), "{}", answer);
    }
    assert_eq!(ask("(:yyyymmdd -440315)").await, "(:yyyymmdd -00440315)");
}

#[tokio::test]
async fn test_numbers_where_names_belong() {
    for query in [
        "(sort-symbols 9223372036854775807)",
        "(get-classes -9223372036854775808)",
        r#"(get "Batman" 1e400)"#,
    ] {
        let answer = ask(query).await;
        assert!(answer.starts_with("(:error"), "{} answered {}", query, answer);
    }
}

#[tokio::test]
async fn test_unterminated_and_deep_input() {
    let deep = format!("{}get-classes", "(".repeat(10_000));
    for query in [r#"(get "Batman"#, r#"(get "Batman\"#, deep.as_str()] {
        let answer = ask(query).await;
        assert!(answer.starts_with("(:error syntax-error"), "{}", answer);
    }
}
