use crate::pages;
use crate::shell::view::RouteView;
use scanline_core::router::Router;
use std::sync::Arc;
use tabled::{Table, settings::Style};
use tokio::runtime::Handle;

pub fn run(runtime: Handle) -> Result<(), Box<dyn std::error::Error>> {
    let router: Router<pages::Catalog> = Router::new(runtime, Arc::new(0usize));
    let routes = pages::register(&router)?;

    let views: Vec<RouteView> = routes.iter().map(RouteView::from_route).collect();
    println!("{}", Table::new(&views).with(Style::psql()));
    Ok(())
}
