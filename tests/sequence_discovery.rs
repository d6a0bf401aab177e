mod common;

use std::sync::Arc;

use common::{FlakyTransport, OracleTransport};
use ebook_fetcher::parser::sequence::SequenceSearchState;
use ebook_fetcher::parser::{ParseError, SequenceDiscoverer, UrlTemplate};

const PREFIX: &str = "https://x/img";
const SUFFIX: &str = ".png";

fn template() -> UrlTemplate {
    UrlTemplate::parse("https://x/img{:03}.png").unwrap()
}

async fn discover(max: i64, start: u64, step: i64) -> Result<u64, ParseError> {
    let transport = Arc::new(OracleTransport::new(PREFIX, SUFFIX, max));
    SequenceDiscoverer::new(transport)
        .find_upper_bound(&template(), start, step)
        .await
}

#[tokio::test]
async fn test_finds_last_number_for_many_steps() {
    let maxima = [0i64, 1, 99, 100, 101, 10000];
    let steps = [1i64, 3, 100, 1000, -1, -7, -100, 0];

    for &max in &maxima {
        for &step in &steps {
            let found = discover(max, 0, step).await.unwrap();
            assert_eq!(found, max as u64, "max={} step={} start=0", max, step);

            if max >= 1 {
                let found = discover(max, 1, step).await.unwrap();
                assert_eq!(found, max as u64, "max={} step={} start=1", max, step);
            }
        }
    }
}

#[tokio::test]
async fn test_forty_seven_images() {
    let transport = Arc::new(OracleTransport::new(PREFIX, SUFFIX, 47));
    let found = SequenceDiscoverer::new(transport.clone())
        .find_upper_bound(&template(), 1, 100)
        .await
        .unwrap();

    assert_eq!(found, 47);
    // 初始步长超过总数，二分几次就能收敛
    assert!(transport.calls() < 20, "too many probes: {}", transport.calls());
}

#[tokio::test]
async fn test_start_is_the_last_number() {
    assert_eq!(discover(5, 5, 100).await.unwrap(), 5);
}

#[tokio::test]
async fn test_probe_count_stays_reasonable() {
    let transport = Arc::new(OracleTransport::new(PREFIX, SUFFIX, 10000));
    let found = SequenceDiscoverer::new(transport.clone())
        .find_upper_bound(&template(), 0, 100)
        .await
        .unwrap();

    assert_eq!(found, 10000);
    assert!(transport.calls() < 150, "too many probes: {}", transport.calls());
}

#[tokio::test]
async fn test_missing_start_is_an_error() {
    match discover(0, 1, 100).await {
        Err(ParseError::StartNotFound(url)) => assert_eq!(url, "https://x/img001.png"),
        other => panic!("expected StartNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transport_error_aborts_search() {
    let transport = Arc::new(FlakyTransport::new(
        OracleTransport::new(PREFIX, SUFFIX, 500),
        3,
    ));
    let result = SequenceDiscoverer::new(transport)
        .find_upper_bound(&template(), 1, 100)
        .await;

    assert!(matches!(result, Err(ParseError::Transport(_))), "{:?}", result);
}

#[tokio::test]
async fn test_probe_limit() {
    let transport = Arc::new(OracleTransport::new(PREFIX, SUFFIX, 1_000_000_000));
    let result = SequenceDiscoverer::new(transport)
        .with_max_probes(Some(5))
        .find_upper_bound(&template(), 1, 100)
        .await;

    assert!(matches!(result, Err(ParseError::ProbeLimitExceeded(5))), "{:?}", result);
}

#[test]
fn test_step_never_becomes_zero() {
    let mut state = SequenceSearchState::new(10, 1);
    state.record(11, false);
    assert_eq!(state.step, -1);

    let mut state = SequenceSearchState::new(10, -1);
    state.record(11, true);
    assert_eq!(state.step, 1);

    assert_eq!(SequenceSearchState::new(0, 0).step, 1);
}

#[test]
fn test_candidates_stay_inside_bracket() {
    let mut state = SequenceSearchState::new(0, 100);
    assert_eq!(state.next_candidate(), Some(100));

    state.record(100, false);
    assert_eq!(state.step, -50);
    assert_eq!(state.next_candidate(), Some(50));

    state.record(50, true);
    assert_eq!(state.lower, 50);
    assert_eq!(state.step, 25);
    assert_eq!(state.next_candidate(), Some(75));

    state.record(99, true);
    assert_eq!(state.next_candidate(), None);
    assert_eq!(state.result(), 99);
}
