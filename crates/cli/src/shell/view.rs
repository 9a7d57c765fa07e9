use crate::pages::TextView;
use scanline_core::router::{HistoryEntry, Route, StatusPage, ViewHandle};
use std::time::Instant;
use tabled::Tabled;

/// One row of the back history
#[derive(Tabled)]
pub struct HistoryView {
    #[tabled(rename = "#")]
    pub index: usize,
    pub path: String,
    pub title: String,
    pub cached: String,
}

impl HistoryView {
    /// `index` counts back steps: 1 is the page `back` returns to.
    pub fn from_entry(index: usize, entry: &HistoryEntry, now: Instant) -> Self {
        let cached = if entry.view.is_none() {
            "no"
        } else if entry.is_expired_at(now) {
            "expired"
        } else {
            "yes"
        };
        Self {
            index,
            path: entry.path.clone(),
            title: entry.page_title.clone(),
            cached: cached.to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct RouteView {
    pub pattern: String,
    pub params: usize,
    pub example: String,
}

impl RouteView {
    pub fn from_route(route: &Route) -> Self {
        let placeholders: Vec<String> = (1..=route.param_count())
            .map(|i| format!("<arg{i}>"))
            .collect();
        Self {
            pattern: route.pattern().to_string(),
            params: route.param_count(),
            example: route.path(&placeholders),
        }
    }
}

/// Text shown for a rendered view, whichever page produced it.
pub fn describe(view: &ViewHandle) -> Option<String> {
    if let Some(text) = view.downcast_ref::<TextView>() {
        Some(text.to_string())
    } else {
        view.downcast_ref::<StatusPage>()
            .map(|status| format!("{}\n{}", status.title, status.description))
    }
}
