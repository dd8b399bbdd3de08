use std::sync::Arc;

use lazyrange_kit::lazyrange::Navigator;
use lazyrange_kit::{
    DataViewOptions, FetchError, Keyed, Page, PaginationDataView, QueryEndpoint,
    QueryEndpointOptions, Selector, SelectorOptions, Window,
};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug)]
struct Row {
    id: u64,
    title: String,
}

impl Keyed for Row {
    fn key(&self) -> u64 {
        self.id
    }
}

/// Pretends the first 20 rows are on screen.
struct FixedScreen;

impl Navigator for FixedScreen {
    fn visible_window(&self) -> Window {
        Window::new(0, 20)
    }

    fn navigate_to(&self, index: usize) {
        println!("navigate_to({index})");
    }
}

const TOTAL: usize = 10_000;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let endpoint = QueryEndpoint::from_fn(
        |offset: usize, limit: usize, _: &()| async move {
            let result = (offset..(offset + limit).min(TOTAL))
                .map(|i| Row {
                    id: i as u64,
                    title: format!("row #{i}"),
                })
                .collect();
            Ok::<_, FetchError>(Page::new(TOTAL, result))
        },
        (),
        QueryEndpointOptions::new(),
    );

    let view = PaginationDataView::new(endpoint.clone(), DataViewOptions::default());
    view.data_update(0, 20).await;
    let data = view.data();
    println!("total={:?} window={:?}", data.metrics.total, data.metrics.window());
    println!("first={:?}", data.result.first());

    let row = endpoint.query_one(9_999).await;
    println!("last={:?}", row.map(|r| r.title));

    let selector = Selector::new(view, Arc::new(FixedScreen), SelectorOptions::new());
    selector.select(3, 3);
    selector.shift_select(8, 8).await;
    println!("selected={:?}", selector.selected());
}
