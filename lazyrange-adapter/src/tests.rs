use crate::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use lazyrange::{
    DataViewOptions, EndpointEvent, FetchError, Keyed, Layout, Navigator, Page, QueryEndpoint,
    QueryEndpointOptions, SelectorOptions, Viewport, Window,
};
use parking_lot::Mutex;

fn list(min_update_delta: usize) -> Controller {
    Controller::new(
        WindowOptions::new(Layout::List { row_height: 20.0 })
            .with_min_update_delta(min_update_delta),
    )
}

fn grid(column_count: usize) -> Controller {
    Controller::new(WindowOptions::new(Layout::Grid {
        column_count,
        aspect_ratio: 1.0,
    }))
}

#[test]
fn first_window_always_propagates() {
    let mut c = list(5);
    assert!(c.on_update(0, 20).is_some());
    assert_eq!(c.last_request(), Some(Window::new(0, 20)));
}

#[test]
fn small_offset_changes_are_held_back() {
    let mut c = list(5);
    assert!(c.on_update(0, 20).is_some());
    assert!(c.on_update(3, 20).is_none());
    // Compared against the last propagated window, not the last proposal.
    assert!(c.on_update(5, 20).is_some());
    assert!(c.on_update(5, 20).is_none());
    assert!(c.on_update(5, 21).is_some());
    assert_eq!(c.last_request(), Some(Window::new(5, 21)));
}

#[test]
fn grid_threshold_counts_rows() {
    let mut c = Controller::new(
        WindowOptions::new(Layout::Grid {
            column_count: 4,
            aspect_ratio: 1.0,
        })
        .with_min_update_delta(5),
    );
    assert!(c.on_update(0, 40).is_some());
    assert!(c.on_update(16, 40).is_none());
    assert!(c.on_update(20, 40).is_some());
}

#[test]
fn zero_delta_propagates_every_change() {
    let mut c = list(0);
    assert!(c.on_update(0, 20).is_some());
    assert!(c.on_update(1, 20).is_some());
    assert!(c.on_update(1, 20).is_none());
}

#[test]
fn newer_window_supersedes_ticket() {
    let mut c = list(0);
    let first = c.on_update(0, 20).unwrap();
    let second = c.on_update(40, 20).unwrap();
    assert_ne!(first, second);
    assert_eq!(
        c.request_state(),
        RequestState::Requesting {
            target: Window::new(40, 20),
            ticket: second,
        }
    );

    assert!(!c.complete(first));
    assert!(c.complete(second));
    assert_eq!(c.request_state(), RequestState::Idle);
    assert!(!c.complete(second));
}

#[test]
fn viewport_and_scroll_produce_buffered_windows() {
    let mut c = Controller::new(
        WindowOptions::new(Layout::List { row_height: 20.0 }).with_buffer_rows(2),
    );
    assert!(c.on_scroll(0.0).is_none(), "no viewport yet");

    let req = c.on_viewport(Viewport::new(400.0, 200.0)).unwrap();
    assert_eq!(req.window, Window::new(0, 12));
    assert!(c.complete(req.ticket));

    c.set_total(Some(100));
    let req = c.on_scroll(100.0).unwrap();
    assert_eq!(req.window, Window::new(3, 14));

    // Same window again: nothing to do.
    assert!(c.on_scroll(100.0).is_none());
}

#[test]
fn window_is_clamped_to_total() {
    let mut c = list(0);
    c.set_total(Some(5));
    let req = c.on_viewport(Viewport::new(400.0, 200.0)).unwrap();
    assert_eq!(req.window, Window::new(0, 5));
}

#[test]
fn proposal_tracks_scroll_position() {
    let mut c = list(0);
    assert!(c.proposal().is_none());
    c.on_viewport(Viewport::new(400.0, 200.0));
    c.set_total(Some(100));
    c.on_scroll(100.0);

    let p = c.proposal().unwrap();
    assert_eq!(p.offset_top, 60.0);
    assert_eq!(p.offset_height, 280.0);
    assert_eq!(p.scroll_height, 1800.0);
}

#[test]
fn column_change_keeps_first_visible_item() {
    let mut c = grid(4);
    c.on_viewport(Viewport::new(400.0, 300.0));
    c.set_total(Some(100));
    c.on_scroll(500.0);
    // Row 5 of a 4-column grid starts with item 20.
    assert_eq!(
        c.geometry()
            .first_visible_index(c.viewport().unwrap(), c.scroll_top()),
        20
    );

    let req = c.set_column_count(5);
    assert!(req.is_some());
    // Item 20 is now at the start of row 4, rows are 80px high.
    assert_eq!(c.scroll_top(), 320.0);
    assert_eq!(
        c.geometry()
            .first_visible_index(c.viewport().unwrap(), c.scroll_top()),
        20
    );

    assert!(c.set_column_count(5).is_none());
}

#[test]
fn width_change_keeps_first_visible_item() {
    let mut c = grid(4);
    c.on_viewport(Viewport::new(400.0, 300.0));
    c.set_total(Some(100));
    c.on_scroll(500.0);

    c.on_viewport(Viewport::new(500.0, 300.0));
    assert_eq!(c.scroll_top(), 625.0);

    // Height-only changes do not move the scroll position.
    c.on_viewport(Viewport::new(500.0, 400.0));
    assert_eq!(c.scroll_top(), 625.0);
}

#[test]
fn lists_ignore_column_changes() {
    let mut c = list(0);
    c.on_viewport(Viewport::new(400.0, 200.0));
    assert!(c.set_column_count(3).is_none());
    assert_eq!(c.geometry().column_count(), 1);
}

#[test]
fn unknown_total_resets_controller() {
    let mut c = list(0);
    c.on_viewport(Viewport::new(400.0, 200.0));
    c.set_total(Some(100));
    c.on_scroll(100.0);
    assert!(c.last_request().is_some());

    c.set_total(None);
    assert_eq!(c.scroll_top(), 0.0);
    assert_eq!(c.total(), None);
    assert_eq!(c.last_request(), None);
    assert_eq!(c.request_state(), RequestState::Idle);

    let req = c.refresh_window().unwrap();
    assert_eq!(req.window, Window::new(0, 12));
}

#[test]
fn shrinking_total_clamps_scroll() {
    let mut c = list(0);
    c.on_viewport(Viewport::new(400.0, 200.0));
    c.set_total(Some(100));
    c.on_scroll(1500.0);
    c.set_total(Some(20));
    assert_eq!(c.scroll_top(), 200.0);
}

#[test]
fn view_state_reports_visible_items() {
    let mut c = list(0);
    assert_eq!(c.view_state(), ViewState::default());
    c.on_viewport(Viewport::new(400.0, 200.0));
    c.set_total(Some(100));
    c.on_scroll(100.0);
    assert_eq!(
        c.view_state(),
        ViewState {
            item_offset: 5,
            item_limit: 10,
            item_total: Some(100),
        }
    );
}

#[test]
fn navigate_scrolls_minimally() {
    let mut c = list(0);
    c.on_viewport(Viewport::new(400.0, 200.0));
    c.set_total(Some(100));

    assert_eq!(c.navigate_to(3), None);
    assert_eq!(c.navigate_to(20), Some(220.0));
    assert_eq!(c.navigate_to(2), Some(40.0));
    assert_eq!(c.navigate_to(100), None);
}

#[test]
fn shared_controller_reports_navigation() {
    let shared = SharedController::new(list(0));
    {
        let mut c = shared.lock();
        c.on_viewport(Viewport::new(400.0, 200.0));
        c.set_total(Some(100));
    }
    let seen = Arc::new(Mutex::new(Vec::new()));
    let id = shared.on_navigate({
        let seen = Arc::clone(&seen);
        move |offset| seen.lock().push(*offset)
    });

    Navigator::navigate_to(&shared, 5);
    Navigator::navigate_to(&shared, 20);
    assert_eq!(*seen.lock(), vec![220.0]);
    assert_eq!(shared.lock().scroll_top(), 220.0);
    assert_eq!(shared.visible_window(), Window::new(11, 10));

    assert!(shared.unsubscribe(id));
    assert_eq!(Navigator::column_count(&shared), None);
    assert_eq!(
        Navigator::column_count(&SharedController::new(grid(3))),
        Some(3)
    );
}

#[test]
fn dialog_resolves_with_answer() {
    let slot = DialogSlot::<&'static str, u32>::new();
    assert!(!slot.is_open());
    assert!(!slot.resolve(1));

    let ticket = slot.push("confirm");
    assert!(slot.is_open());
    assert_eq!(slot.current(), Some("confirm"));

    assert!(slot.resolve(7));
    assert!(!slot.is_open());
    assert_eq!(ticket.now_or_never(), Some(DialogOutcome::Resolved(7)));
}

#[test]
fn dialog_cancel_and_replace() {
    let slot = DialogSlot::<u8, ()>::new();
    let events = Arc::new(Mutex::new(Vec::new()));
    slot.subscribe({
        let events = Arc::clone(&events);
        move |ctx| events.lock().push(*ctx)
    });

    let first = slot.push(1);
    let second = slot.push(2);
    assert_eq!(first.now_or_never(), Some(DialogOutcome::Cancelled));
    assert_eq!(slot.current(), Some(2));

    assert!(slot.cancel());
    assert_eq!(second.now_or_never().and_then(DialogOutcome::resolved), None);
    assert!(!slot.cancel());

    assert_eq!(*events.lock(), vec![Some(1), Some(2), None]);
}

#[tokio::test]
async fn dialog_ticket_can_be_awaited() {
    let slot = Arc::new(DialogSlot::<DialogRequest, DuplicateChoice>::new());
    let request = DialogRequest::AddToAlbum {
        album_id: 9,
        images: vec![1, 2, 3],
        duplicates: vec![Duplicate { id: 2, ordinal: 0 }],
    };
    let ticket = slot.push(request.clone());
    let answer = tokio::join!(ticket, async {
        slot.resolve(DuplicateChoice::Ignore);
    })
    .0;
    let choice = answer.resolved().unwrap();
    assert_eq!(request.images_to_add(choice), vec![1, 3]);
    assert_eq!(request.images_to_add(DuplicateChoice::Move), vec![1, 2, 3]);
}

#[test]
fn dialog_titles_and_plain_requests() {
    let choose = DialogRequest::AddToFolder(AddToFolder::ChooseFolder { images: vec![4] });
    assert_eq!(choose.title(), "Choose folder");
    assert_eq!(choose.images_to_add(DuplicateChoice::Ignore), vec![4]);

    let clone = DialogRequest::CloneProperties {
        from: Some(1),
        to: None,
    };
    assert_eq!(clone.title(), "Clone image properties");
    assert!(clone.images_to_add(DuplicateChoice::Move).is_empty());
}

#[tokio::test(start_paused = true)]
async fn settle_gate_yields_only_latest_input() {
    let gate = SettleGate::new(Duration::from_millis(100));
    let (first, second) = tokio::join!(gate.settle("ca"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        gate.settle("cat").await
    });
    assert_eq!(first, None);
    assert_eq!(second, Some("cat"));
}

#[tokio::test(start_paused = true)]
async fn settle_gate_invalidate_drops_pending() {
    let gate = SettleGate::default();
    assert_eq!(gate.delay(), Duration::from_millis(DEFAULT_SETTLE_MS));
    let (value, ()) = tokio::join!(gate.settle(1), async { gate.invalidate() });
    assert_eq!(value, None);
    assert_eq!(gate.settle(2).await, Some(2));
}

#[test]
fn click_modifiers_follow_platform() {
    use ClickAction::*;
    assert_eq!(ClickAction::from_click(Modifiers::NONE, Platform::Other), Select);
    assert_eq!(ClickAction::from_click(Modifiers::ctrl(), Platform::Other), Append);
    assert_eq!(ClickAction::from_click(Modifiers::meta(), Platform::Other), Select);
    assert_eq!(ClickAction::from_click(Modifiers::meta(), Platform::MacOs), Append);
    assert_eq!(ClickAction::from_click(Modifiers::ctrl(), Platform::MacOs), Select);

    let both = Modifiers {
        ctrl: true,
        ..Modifiers::shift()
    };
    assert_eq!(ClickAction::from_click(both, Platform::Other), Range);
}

#[test]
fn keys_map_to_moves() {
    use lazyrange::Direction;
    assert_eq!(
        KeyAction::from_key(Key::ArrowLeft, Modifiers::NONE),
        KeyAction::Move {
            direction: Direction::Left,
            extend: false,
        }
    );
    assert_eq!(
        KeyAction::from_key(Key::ArrowDown, Modifiers::shift()),
        KeyAction::Move {
            direction: Direction::Down,
            extend: true,
        }
    );
    assert_eq!(KeyAction::from_key(Key::Enter, Modifiers::NONE), KeyAction::Enter);
    assert_eq!(KeyAction::from_key(Key::Other, Modifiers::shift()), KeyAction::Ignore);
}

#[test]
fn view_stack_closes_emptied_view() {
    let mut stack = ViewStack::new();
    stack.push("album");
    stack.push("folder");
    assert_eq!(stack.peek(), Some(&"folder"));

    assert_eq!(
        stack.on_endpoint_event(EndpointEvent::Remove { index: 0 }, Some(3)),
        None
    );
    assert_eq!(stack.on_endpoint_event(EndpointEvent::Refresh, Some(0)), None);
    assert_eq!(
        stack.on_endpoint_event(EndpointEvent::Remove { index: 0 }, Some(0)),
        Some("folder")
    );
    assert_eq!(stack.len(), 1);

    stack.push("image");
    assert_eq!(stack.close_all(), vec!["album", "image"]);
    assert!(stack.is_empty());
}

#[derive(Clone, Debug, PartialEq)]
struct Photo {
    id: u64,
}

impl Keyed for Photo {
    fn key(&self) -> u64 {
        self.id
    }
}

const PHOTOS: usize = 100;

fn photo_endpoint(requests: Arc<AtomicUsize>) -> QueryEndpoint<Photo, u64> {
    QueryEndpoint::from_fn(
        move |offset: usize, limit: usize, base: &u64| {
            let base = *base;
            requests.fetch_add(1, Ordering::SeqCst);
            async move {
                let result = (offset..(offset + limit).min(PHOTOS))
                    .map(|i| Photo { id: base + i as u64 })
                    .collect();
                Ok::<_, FetchError>(Page::new(PHOTOS, result))
            }
        },
        0u64,
        QueryEndpointOptions::new().with_segment_size(10),
    )
}

fn session(requests: Arc<AtomicUsize>) -> ListSession<Photo, u64> {
    ListSession::new(
        photo_endpoint(requests),
        WindowOptions::new(Layout::List { row_height: 20.0 }),
        DataViewOptions::default().with_query_delay_ms(0),
        SelectorOptions::new(),
        Platform::Other,
    )
}

fn ids(photos: &[Photo]) -> Vec<u64> {
    photos.iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn session_loads_windows_and_learns_total() {
    let requests = Arc::new(AtomicUsize::new(0));
    let s = session(Arc::clone(&requests));

    s.on_viewport(Viewport::new(400.0, 200.0)).await;
    let data = s.view().data();
    assert_eq!(data.metrics.offset, 0);
    assert_eq!(ids(&data.result), (0..12u64).collect::<Vec<_>>());
    assert_eq!(s.controller().lock().total(), Some(PHOTOS));
    assert_eq!(
        s.controller().lock().request_state(),
        RequestState::Idle
    );

    s.on_scroll(100.0).await;
    let data = s.view().data();
    assert_eq!(data.metrics.window(), Window::new(3, 14));
    assert_eq!(data.result.first().map(|p| p.id), Some(3));
    // The first segment already covers the scrolled window.
    assert_eq!(requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_dispatches_clicks_and_keys() {
    let s = session(Arc::new(AtomicUsize::new(0)));
    s.on_viewport(Viewport::new(400.0, 200.0)).await;

    s.click(2, 2, Modifiers::NONE).await;
    assert_eq!(s.selector().selected(), vec![2]);

    s.click(5, 5, Modifiers::shift()).await;
    assert_eq!(s.selector().selected(), vec![2, 3, 4, 5]);
    assert_eq!(s.selector().last_selected(), Some(5));

    s.click(3, 3, Modifiers::ctrl()).await;
    assert_eq!(s.selector().selected(), vec![2, 4, 5]);
    assert_eq!(s.selector().last_selected(), None);

    s.click(7, 7, Modifiers::NONE).await;
    assert_eq!(s.key(Key::ArrowDown, Modifiers::shift()).await, None);
    assert_eq!(s.selector().selected(), vec![7, 8]);
    assert_eq!(s.key(Key::Enter, Modifiers::NONE).await, Some(8));
    assert_eq!(s.key(Key::Other, Modifiers::NONE).await, None);
}

#[tokio::test]
async fn arrow_key_scrolls_selection_into_view() {
    let s = session(Arc::new(AtomicUsize::new(0)));
    let scrolled = Arc::new(Mutex::new(Vec::new()));
    s.controller().on_navigate({
        let scrolled = Arc::clone(&scrolled);
        move |offset| scrolled.lock().push(*offset)
    });
    s.on_viewport(Viewport::new(400.0, 200.0)).await;

    s.click(9, 9, Modifiers::NONE).await;
    s.key(Key::ArrowDown, Modifiers::NONE).await;
    assert_eq!(s.selector().selected(), vec![10]);
    assert_eq!(*scrolled.lock(), vec![20.0]);
}

#[tokio::test]
async fn local_edits_adjust_scroll_height() {
    let s = session(Arc::new(AtomicUsize::new(0)));
    s.on_viewport(Viewport::new(400.0, 200.0)).await;
    assert_eq!(s.controller().lock().total(), Some(PHOTOS));

    assert!(s.endpoint().remove(0));
    assert_eq!(s.controller().lock().total(), Some(PHOTOS - 1));

    assert!(s.endpoint().insert(0, Photo { id: 500 }));
    assert_eq!(s.controller().lock().total(), Some(PHOTOS));
}

#[tokio::test]
async fn filter_change_starts_from_top() {
    let s = session(Arc::new(AtomicUsize::new(0)));
    s.on_viewport(Viewport::new(400.0, 200.0)).await;
    s.on_scroll(400.0).await;
    assert_eq!(s.controller().lock().scroll_top(), 400.0);

    s.set_filter(1000).await;
    assert_eq!(s.controller().lock().scroll_top(), 0.0);
    let data = s.view().data();
    assert_eq!(data.metrics.offset, 0);
    assert_eq!(data.result.first().map(|p| p.id), Some(1000));
    assert_eq!(s.controller().lock().total(), Some(PHOTOS));
}

#[tokio::test]
async fn refresh_keeps_scroll_position() {
    let requests = Arc::new(AtomicUsize::new(0));
    let s = session(Arc::clone(&requests));
    s.on_viewport(Viewport::new(400.0, 200.0)).await;
    s.on_scroll(100.0).await;
    let before = requests.load(Ordering::SeqCst);

    s.refresh().await;
    assert!(requests.load(Ordering::SeqCst) > before);
    assert_eq!(s.controller().lock().scroll_top(), 100.0);
    assert_eq!(s.view().window(), Window::new(3, 14));
}

#[tokio::test]
async fn grid_session_moves_by_rows() {
    let s = ListSession::new(
        photo_endpoint(Arc::new(AtomicUsize::new(0))),
        WindowOptions::new(Layout::Grid {
            column_count: 4,
            aspect_ratio: 1.0,
        }),
        DataViewOptions::default().with_query_delay_ms(0),
        SelectorOptions::new(),
        Platform::MacOs,
    );
    s.on_viewport(Viewport::new(400.0, 300.0)).await;

    s.click(1, 1, Modifiers::NONE).await;
    s.key(Key::ArrowDown, Modifiers::NONE).await;
    assert_eq!(s.selector().selected(), vec![5]);

    s.set_column_count(5).await;
    s.key(Key::ArrowDown, Modifiers::NONE).await;
    assert_eq!(s.selector().selected(), vec![10]);

    s.click(11, 11, Modifiers::meta()).await;
    assert_eq!(s.selector().selected(), vec![10, 11]);
}
