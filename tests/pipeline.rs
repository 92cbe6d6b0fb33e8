//! End-to-end runs through the public API with scripted services.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use accessmap::discovery::{discover_candidates, DiscoveryOptions, PlacesPage};
use accessmap::geometry::SearchArea;
use accessmap::io::{load_candidates, load_samples, write_candidates, write_results_to_path};
use accessmap::models::{OutcomeStatus, Point};
use accessmap::orchestrator::{BatchOrchestrator, RunOptions};
use accessmap::routing::{MatrixElement, MatrixResponse};
use accessmap::testing::{place, ScriptedDiscoveryClient, ScriptedRoutingClient};
use accessmap::{RunError, TransportError};

fn run_options(concurrency: usize) -> RunOptions {
    RunOptions {
        k: 3,
        concurrency,
        min_request_interval: Duration::from_millis(5),
        max_attempts: 1,
        retry_delay: Duration::from_millis(10),
        max_consecutive_failures: 50,
    }
}

fn page(ids: &[&str], token: Option<&str>) -> PlacesPage {
    PlacesPage {
        status: "OK".to_string(),
        results: ids
            .iter()
            .enumerate()
            .map(|(i, id)| place(id, 31.2 + i as f64 * 0.01, 121.4 + i as f64 * 0.01))
            .collect(),
        next_page_token: token.map(String::from),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_discovered_candidates_feed_a_run() {
    let dir = tempfile::tempdir().unwrap();

    let discovery = ScriptedDiscoveryClient::new(vec![
        page(&["a", "b"], Some("t1")),
        page(&["c", "d"], Some("t2")),
        page(&["e"], None),
    ]);
    let area = SearchArea::new(Point::new(121.45, 31.22), 20_000.0);
    let found = discover_candidates(&discovery, &area, &DiscoveryOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 5);
    assert_eq!(
        discovery.tokens(),
        vec![None, Some("t1".to_string()), Some("t2".to_string())]
    );

    let hospitals_path = dir.path().join("hospitals.csv");
    write_candidates(&hospitals_path, &found).unwrap();

    let samples_path = dir.path().join("samples.csv");
    let mut file = std::fs::File::create(&samples_path).unwrap();
    writeln!(file, "sample_idx,lat,lng").unwrap();
    for i in 1..=6 {
        writeln!(file, "{},{},121.41", 100 + i, 31.2 + i as f64 * 0.005).unwrap();
    }
    drop(file);

    let samples = load_samples(&samples_path).unwrap();
    let candidates = load_candidates(&hospitals_path).unwrap();
    assert_eq!(samples.len(), 6);

    let client = Arc::new(ScriptedRoutingClient::new(|req| {
        Ok(MatrixResponse {
            elements: (0..req.destinations.len())
                .map(|i| MatrixElement::Route {
                    duration_seconds: 900 - i as u64 * 100,
                    distance_meters: 5000,
                })
                .collect(),
        })
    }));
    let report = BatchOrchestrator::new(candidates, client.clone(), run_options(3))
        .run(&samples)
        .await
        .unwrap();

    assert_eq!(client.calls(), 6);
    assert_eq!(report.summary.resolved, 6);
    assert_eq!(
        report.records.iter().map(|r| r.sample.index).collect::<Vec<_>>(),
        vec![101, 102, 103, 104, 105, 106]
    );
    // the last of the three nearest answers fastest
    for record in &report.records {
        assert_eq!(record.to_row().dur_s, Some(700));
    }

    let output = dir.path().join("results/travel_times.csv");
    write_results_to_path(&output, &report.records).unwrap();
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().count(), 7);
    assert!(text.lines().skip(1).all(|l| l.contains(",resolved,")));
}

#[tokio::test(start_paused = true)]
async fn test_one_failed_sample_does_not_stop_the_rest() {
    let candidates = vec![accessmap::Candidate::new("h", "General", "", Point::new(0.0, 0.0))];
    let samples: Vec<_> = (0..10)
        .map(|i| accessmap::SampleRecord::new(i, Point::new(0.001, i as f64 * 0.001)))
        .collect();

    let client = Arc::new(ScriptedRoutingClient::new(|req| {
        if (req.origin.lat * 1000.0).round() as u64 == 5 {
            Err(TransportError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE))
        } else {
            Ok(MatrixResponse {
                elements: vec![MatrixElement::Route {
                    duration_seconds: 120,
                    distance_meters: 800,
                }],
            })
        }
    }));

    let report = BatchOrchestrator::new(candidates, client, run_options(4))
        .run(&samples)
        .await
        .unwrap();

    assert_eq!(report.records.len(), 10);
    assert_eq!(report.summary.resolved, 9);
    assert_eq!(report.summary.errored, 1);
    assert_eq!(report.records[5].outcome.status(), OutcomeStatus::Errored);
    assert_eq!(report.records[5].sample.index, 5);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_returns_partial_report() {
    let candidates = vec![accessmap::Candidate::new("h", "General", "", Point::new(0.0, 0.0))];
    let samples: Vec<_> = (0..4)
        .map(|i| accessmap::SampleRecord::new(i, Point::new(0.001, 0.0)))
        .collect();
    let client = Arc::new(ScriptedRoutingClient::fixed(vec![MatrixElement::Route {
        duration_seconds: 1,
        distance_meters: 1,
    }]));

    let orchestrator = BatchOrchestrator::new(candidates, client.clone(), run_options(1));
    orchestrator.cancel_handle().cancel();

    match orchestrator.run(&samples).await {
        Err(RunError::Aborted { total, report, .. }) => {
            assert_eq!(total, 4);
            assert!(report.records.is_empty());
        }
        other => panic!("expected abort, got {:?}", other.map(|r| r.summary)),
    }
    assert_eq!(client.calls(), 0);
}
