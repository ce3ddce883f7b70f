mod cache;
mod cli;
mod decode;
mod error;
mod files;
mod nav;
mod ops;
mod prefetch;
mod session;
mod transform;
mod ui;

use std::sync::Arc;

use clap::Parser;
use winit::event_loop::EventLoop;

use crate::cli::Cli;
use crate::prefetch::Prefetcher;
use crate::session::ViewerSession;
use crate::ui::App;

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let session = Arc::new(ViewerSession::new(
        cli.root.clone(),
        cli.recursive,
        cli.cache_capacity,
    ));
    if session.len() == 0 {
        // Keep going: the window shows the empty-state placeholder and a
        // rescan can pick up files later.
        log::warn!("no image files found in {}", cli.root.display());
    }

    let prefetcher = Prefetcher::spawn(Arc::clone(&session));
    prefetcher.signal().set_enabled(true);

    let event_loop = EventLoop::new().expect("create event loop");
    let mut app = App::new(Arc::clone(&session), prefetcher.signal(), cli.mark_output);
    event_loop.run_app(&mut app).expect("run event loop");

    // Teardown order: stop and join the prefetcher first, so nothing can
    // repopulate the cache while the session is going away.
    prefetcher.signal().set_enabled(false);
    prefetcher.shutdown();
    session.cache().clear();
}
