//! Demo library pages served by the shell.

use anyhow::anyhow;
use scanline_core::error::RegistrationError;
use scanline_core::router::{Renderable, Response, Route, Router, ViewHandle};
use std::fmt;
use std::time::{Duration, Instant};

/// Search results go stale quickly; going back to them re-runs the search.
const SEARCH_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Movie,
    Show,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Movie => write!(f, "movie"),
            ItemKind::Show => write!(f, "show"),
        }
    }
}

pub struct Section {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ItemKind,
}

pub struct MediaItem {
    pub rating_key: &'static str,
    pub title: &'static str,
    pub year: u16,
    pub kind: ItemKind,
    pub summary: &'static str,
}

impl MediaItem {
    fn deep_link(&self, server: &str) -> String {
        format!("{}/{}/{}", self.kind, server, self.rating_key)
    }
}

/// In-memory stand-in for a media server, handed to every page handler.
pub struct Catalog {
    pub server: String,
    sections: Vec<Section>,
    items: Vec<MediaItem>,
}

impl Catalog {
    pub fn demo() -> Self {
        Self {
            server: "local".to_string(),
            sections: vec![
                Section {
                    id: "1",
                    title: "Movies",
                    kind: ItemKind::Movie,
                },
                Section {
                    id: "2",
                    title: "TV Shows",
                    kind: ItemKind::Show,
                },
            ],
            items: vec![
                MediaItem {
                    rating_key: "101",
                    title: "Alien",
                    year: 1979,
                    kind: ItemKind::Movie,
                    summary: "The crew of a commercial towing ship answers a distress call.",
                },
                MediaItem {
                    rating_key: "102",
                    title: "Heat",
                    year: 1995,
                    kind: ItemKind::Movie,
                    summary: "A detective hunts a crew of professional thieves in Los Angeles.",
                },
                MediaItem {
                    rating_key: "103",
                    title: "Ran",
                    year: 1985,
                    kind: ItemKind::Movie,
                    summary: "An aging warlord divides his kingdom among his three sons.",
                },
                MediaItem {
                    rating_key: "201",
                    title: "The Wire",
                    year: 2002,
                    kind: ItemKind::Show,
                    summary: "The drug trade in Baltimore, seen from both sides.",
                },
                MediaItem {
                    rating_key: "202",
                    title: "Twin Peaks",
                    year: 1990,
                    kind: ItemKind::Show,
                    summary: "An FBI agent investigates a murder in a small logging town.",
                },
            ],
        }
    }

    fn check_server(&self, server: &str) -> anyhow::Result<()> {
        if server == self.server {
            Ok(())
        } else {
            Err(anyhow!("unknown server '{server}'"))
        }
    }

    fn section(&self, server: &str, id: &str) -> anyhow::Result<&Section> {
        self.check_server(server)?;
        self.sections
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| anyhow!("no library section '{id}' on {server}"))
    }

    fn item(&self, server: &str, kind: ItemKind, rating_key: &str) -> anyhow::Result<&MediaItem> {
        self.check_server(server)?;
        self.items
            .iter()
            .find(|i| i.kind == kind && i.rating_key == rating_key)
            .ok_or_else(|| anyhow!("no {kind} with rating key {rating_key} on {server}"))
    }

    fn items_of(&self, kind: ItemKind) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(move |i| i.kind == kind)
    }
}

/// Plain text page body, one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextView {
    pub lines: Vec<String>,
}

impl TextView {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

impl fmt::Display for TextView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

impl Renderable for TextView {
    fn render(self: Box<Self>) -> ViewHandle {
        ViewHandle::new(*self)
    }
}

fn page(title: impl Into<String>, lines: Vec<String>) -> Response {
    Response::new(title).with_view(TextView::new(lines))
}

/// Turns a failed lookup into a response carrying the error, so the router
/// shows its error page and does not cache the result.
fn respond(title: &str, result: anyhow::Result<Response>) -> Response {
    result.unwrap_or_else(|err| Response::from_error(title, err))
}

fn home(catalog: &Catalog) -> Response {
    let lines = catalog
        .sections
        .iter()
        .map(|s| {
            let count = catalog.items_of(s.kind).count();
            format!("library/{}/{}  {} ({} items)", catalog.server, s.id, s.title, count)
        })
        .collect();
    page("Home", lines)
}

fn library(catalog: &Catalog, server: String, section: String) -> Response {
    respond(
        "Library",
        catalog.section(&server, &section).map(|section| {
            let lines = catalog
                .items_of(section.kind)
                .map(|i| format!("{}  {} ({})", i.deep_link(&server), i.title, i.year))
                .collect();
            page(section.title, lines)
        }),
    )
}

fn item_page(
    catalog: &Catalog,
    kind: ItemKind,
    server: &str,
    rating_key: &str,
) -> anyhow::Result<Response> {
    let item = catalog.item(server, kind, rating_key)?;
    let toolbar = match kind {
        ItemKind::Movie => "[play] [mark watched]",
        ItemKind::Show => "[play next episode] [mark watched]",
    };
    Ok(page(
        item.title,
        vec![format!("{} ({})", item.title, item.year), item.summary.to_string()],
    )
    .with_toolbar(TextView::new(vec![toolbar.to_string()])))
}

fn movie(catalog: &Catalog, server: String, rating_key: String) -> Response {
    respond("Movie", item_page(catalog, ItemKind::Movie, &server, &rating_key))
}

fn show(catalog: &Catalog, server: String, rating_key: String) -> Response {
    respond("Show", item_page(catalog, ItemKind::Show, &server, &rating_key))
}

fn search(catalog: &Catalog, query: String) -> Response {
    let needle = query.to_lowercase();
    let mut lines: Vec<String> = catalog
        .items
        .iter()
        .filter(|i| i.title.to_lowercase().contains(&needle))
        .map(|i| format!("{}  {}", i.deep_link(&catalog.server), i.title))
        .collect();
    if lines.is_empty() {
        lines.push(format!("No results for '{query}'"));
    }
    page(format!("Search: {query}"), lines).expires_at(Instant::now() + SEARCH_TTL)
}

fn unavailable() -> Response {
    Response::from_error("Unavailable", anyhow!("the server refused the connection"))
}

/// Registers every demo page. Returns the routes in lookup order.
pub fn register(router: &Router<Catalog>) -> Result<Vec<Route>, RegistrationError> {
    Ok(vec![
        router.route("home", home)?,
        router.route("library/:server/:section", library)?,
        router.route("movie/:server/:ratingKey", movie)?,
        router.route("show/:server/:ratingKey", show)?,
        router.route("search/:query", search)?,
        router.route("unavailable", unavailable)?,
    ])
}
