mod common;

use common::{png, FakeServer};
use std::sync::Arc;
use viewer_core::controller::{GridView, ResultSetController, SubmitOutcome, NO_RESULTS, SEARCH_FAILED};
use viewer_core::resource::{ResourceStatus, LOAD_FAILED};

fn controller(server: FakeServer) -> ResultSetController {
    let server = Arc::new(server);
    ResultSetController::new(server.clone(), server)
}

#[tokio::test]
async fn sunset_search_grid_and_viewer_walkthrough() {
    let ctl = controller(
        FakeServer::default()
            .answer(
                "sunset",
                &[
                    ("screenshots/one.png", "Photos", 0.11),
                    ("screenshots/two.png", "Firefox", 0.23),
                    ("screenshots/three.png", "", 0.37),
                ],
            )
            .image("one.png", png(4, 3))
            .image("two.png", png(8, 6))
            .image("three.png", png(2, 2)),
    );

    let outcome = ctl.submit_query("sunset").await;
    assert!(matches!(outcome, SubmitOutcome::Applied(ref r) if r.len() == 3));

    let grid = ctl.grid().expect("results present");
    let cells = grid.cells();
    assert_eq!(cells.len(), 3);
    let labels: Vec<_> = cells.iter().map(|c| c.record.display_name()).collect();
    assert_eq!(labels, vec!["Photos", "Firefox", "Unknown"]);
    for load in grid.load_all() {
        load.await;
    }
    assert!(cells.iter().all(|c| matches!(c.status(), ResourceStatus::Ready { .. })));

    ctl.select_for_viewing(1).unwrap().await;
    let state = ctl.viewer_state().unwrap();
    assert_eq!(state.current_index(), 1);
    assert_eq!(state.sequence().len(), 3);
    assert_eq!(ctl.with_viewer_handle(|h| h.width()), Some(8));

    ctl.next().unwrap().await;
    assert_eq!(ctl.viewer_state().unwrap().current_index(), 2);
    ctl.next().unwrap().await;
    assert_eq!(ctl.viewer_state().unwrap().current_index(), 0);
    assert_eq!(ctl.with_viewer_handle(|h| h.width()), Some(4));

    // Three thumbnails plus the one viewer image.
    assert_eq!(ctl.tracker().live(), 4);
    ctl.close_viewer();
    drop(grid);
    assert_eq!(ctl.tracker().live(), 0);
}

#[tokio::test]
async fn zero_matches_show_empty_state() {
    let ctl = controller(FakeServer::default().answer("nothing", &[]));
    ctl.submit_query("nothing").await;
    match ctl.grid() {
        Some(GridView::Empty { message }) => assert_eq!(message, NO_RESULTS),
        other => panic!("expected empty state, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_image_only_affects_its_cell() {
    let ctl = controller(
        FakeServer::default()
            .answer(
                "q",
                &[("s/ok.png", "A", 0.1), ("s/gone.png", "B", 0.2), ("s/ok2.png", "C", 0.3)],
            )
            .image("ok.png", png(1, 1))
            .image("ok2.png", png(1, 1)),
    );
    ctl.submit_query("q").await;
    let grid = ctl.grid().unwrap();
    for load in grid.load_all() {
        load.await;
    }
    let statuses: Vec<_> = grid.cells().iter().map(|c| c.status()).collect();
    assert!(matches!(statuses[0], ResourceStatus::Ready { .. }));
    assert!(matches!(statuses[1], ResourceStatus::Failed { .. }));
    assert!(matches!(statuses[2], ResourceStatus::Ready { .. }));
    assert_eq!(LOAD_FAILED, "Failed to load image");

    ctl.select_for_viewing(1).unwrap().await;
    assert!(matches!(ctl.viewer_image(), Some(ResourceStatus::Failed { .. })));
    ctl.next().unwrap().await;
    assert!(matches!(ctl.viewer_image(), Some(ResourceStatus::Ready { .. })));
}

#[tokio::test]
async fn viewer_keeps_its_snapshot_until_reopened() {
    let ctl = controller(
        FakeServer::default()
            .answer("first", &[("s/a.png", "A", 0.1), ("s/b.png", "B", 0.2)])
            .answer("second", &[("s/c.png", "C", 0.1)])
            .image("a.png", png(1, 1))
            .image("b.png", png(1, 1))
            .image("c.png", png(1, 1)),
    );
    ctl.submit_query("first").await;
    ctl.select_for_viewing(0).unwrap().await;
    let snapshot = ctl.viewer_state().unwrap();
    assert_eq!(snapshot.sequence().to_vec(), vec!["s/a.png", "s/b.png"]);

    ctl.submit_query("second").await;
    assert!(ctl.viewer_state().is_none());
    ctl.select_for_viewing(0).unwrap().await;
    assert_eq!(ctl.viewer_state().unwrap().sequence().to_vec(), vec!["s/c.png"]);
}

#[tokio::test]
async fn server_error_becomes_message() {
    let ctl = controller(FakeServer::default());
    let outcome = ctl.submit_query("unknown").await;
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    let snap = ctl.snapshot();
    assert!(!snap.loading);
    assert_eq!(snap.error.as_deref(), Some(SEARCH_FAILED));
    assert!(snap.results.is_none());
    assert!(snap.viewer.is_none());
}
