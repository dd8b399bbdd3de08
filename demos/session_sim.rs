use std::sync::Arc;
use std::time::Duration;

use lazyrange_kit::lazyrange_adapter::DuplicateChoice;
use lazyrange_kit::{
    DataViewOptions, DialogRequest, DialogSlot, FetchError, Key, Keyed, Layout, ListSession,
    Modifiers, Page, Platform, QueryEndpoint, QueryEndpointOptions, SelectorOptions, SettleGate,
    Viewport, WindowOptions,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Image {
    id: u64,
}

impl Keyed for Image {
    fn key(&self) -> u64 {
        self.id
    }
}

const IMAGES: usize = 5_000;

// Simulates a UI adapter: a grid view of images, a search box and an add-to-album dialog.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = QueryEndpoint::from_fn(
        |offset: usize, limit: usize, tag: &Option<String>| {
            let step = if tag.is_some() { 3 } else { 1 };
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let total = IMAGES / step;
                let result = (offset..(offset + limit).min(total))
                    .map(|i| Image {
                        id: (i * step) as u64,
                    })
                    .collect();
                Ok::<_, FetchError>(Page::new(total, result))
            }
        },
        None,
        QueryEndpointOptions::new(),
    );

    let session = ListSession::new(
        endpoint,
        WindowOptions::new(Layout::Grid {
            column_count: 6,
            aspect_ratio: 1.0,
        })
        .with_min_update_delta(2),
        DataViewOptions::default().with_query_delay_ms(50),
        SelectorOptions::new(),
        Platform::current(),
    );
    session.controller().on_navigate(|offset| println!("scroll container -> {offset}"));

    session.on_viewport(Viewport::new(1200.0, 800.0)).await;
    for offset in [100.0, 250.0, 420.0, 900.0] {
        session.on_scroll(offset).await;
    }
    println!("view state: {:?}", session.controller().lock().view_state());
    println!("window: {:?}", session.view().window());

    session.click(40, 40, Modifiers::NONE).await;
    session.click(45, 45, Modifiers::shift()).await;
    session.key(Key::ArrowDown, Modifiers::shift()).await;
    println!("selected: {:?}", session.selector().selected());

    // Search box: only the last keystroke reaches the endpoint.
    let gate = SettleGate::new(Duration::from_millis(100));
    let (a, b) = tokio::join!(gate.settle("su"), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        gate.settle("sunset").await
    });
    for tag in [a, b].into_iter().flatten() {
        session.set_filter(Some(tag.to_owned())).await;
    }
    println!(
        "after filter: total={:?} first={:?}",
        session.controller().lock().total(),
        session.view().data().result.first()
    );

    let dialogs = Arc::new(DialogSlot::<DialogRequest, DuplicateChoice>::new());
    let request = DialogRequest::AddToAlbum {
        album_id: 1,
        images: session.selector().selected(),
        duplicates: Vec::new(),
    };
    let ticket = dialogs.push(request.clone());
    dialogs.resolve(DuplicateChoice::Ignore);
    if let Some(choice) = ticket.await.resolved() {
        println!(
            "{}: adding {:?}",
            request.title(),
            request.images_to_add(choice)
        );
    }
}
