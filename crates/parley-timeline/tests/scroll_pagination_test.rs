//! A view driving backfill through the scroll controller

use parley_persistence::MemoryStore;
use parley_session::{RecordingNotifier, SessionContext};
use parley_timeline::{
    LoadOutcome, ScrollCommand, ScrollController, ScrollMetrics, Timeline, TimelineConfig,
};
use parley_types::{MessageDraft, RoomId, User};
use std::sync::Arc;

const ROW_HEIGHT: f64 = 40.0;
const VIEWPORT: f64 = 400.0;

async fn open() -> Timeline {
    let ctx = SessionContext::new(
        User::new("+1", "5551234567"),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
    );
    Timeline::builder(ctx, RoomId::new("room-1"))
        .with_config(TimelineConfig::default())
        .open()
        .await
        .expect("open timeline")
}

fn metrics(timeline: &Timeline, scroll_top: f64) -> ScrollMetrics {
    ScrollMetrics::new(scroll_top, timeline.len() as f64 * ROW_HEIGHT, VIEWPORT)
}

#[tokio::test(start_paused = true)]
async fn test_scrolling_to_top_pages_in_history() {
    let timeline = open().await;
    let mut view = ScrollController::new(timeline.config().scroll_restore_offset);

    let bottom = timeline.len() as f64 * ROW_HEIGHT - VIEWPORT;
    assert!(!view.on_scroll(
        metrics(&timeline, bottom),
        timeline.is_loading_older(),
        timeline.has_more()
    ));
    assert!(view.is_at_bottom());

    let mut pages = 0;
    loop {
        let wants_page = view.on_scroll(
            metrics(&timeline, 0.0),
            timeline.is_loading_older(),
            timeline.has_more(),
        );
        if !wants_page {
            break;
        }
        match timeline.load_older_page(timeline.config().page_size).await {
            LoadOutcome::Loaded(_) => {
                pages += 1;
                let ScrollCommand::ScrollTo(offset) = view.after_page_loaded() else {
                    panic!("expected an offset restore");
                };
                // Landing just below the top must not trigger another fetch
                assert!(!view.on_scroll(
                    metrics(&timeline, offset),
                    timeline.is_loading_older(),
                    timeline.has_more()
                ));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    assert_eq!(pages, 5);
    assert_eq!(timeline.len(), 100);
    assert!(!timeline.has_more());
}

#[tokio::test(start_paused = true)]
async fn test_new_message_while_scrolled_up_offers_jump() {
    let timeline = open().await;
    let mut view = ScrollController::default();

    view.on_scroll(metrics(&timeline, 120.0), false, timeline.has_more());
    timeline
        .append(MessageDraft::text("while reading"))
        .await
        .expect("accepted");

    assert_eq!(view.on_timeline_mutated(), None);
    assert!(view.show_jump_to_latest());
    assert_eq!(view.jump_to_latest(), ScrollCommand::ScrollToBottom);

    timeline
        .append(MessageDraft::text("back at the bottom"))
        .await
        .expect("accepted");
    assert_eq!(
        view.on_timeline_mutated(),
        Some(ScrollCommand::ScrollToBottom)
    );
}
