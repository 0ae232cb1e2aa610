use anyhow::Result;

mod app;
mod client;
mod config;
mod handler;
mod logging;
mod markdown;
mod tui;
mod ui;

use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    logging::init(&config)?;
    tracing::info!(endpoint = %config.endpoint, "starting agentpane");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(&config, events.sender());
    // Downstream consumers (e.g. a live preview) key their refresh off
    // completed turns; a log event is the hook point for now.
    app.on_turn_complete = Some(Box::new(|| tracing::info!("turn complete")));

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    tui::restore()?;
    Ok(())
}
