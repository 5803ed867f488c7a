use std::sync::Arc;

use shelf_core::{config::Config, dispatch::Dispatcher, door::DoorRelay, store::BorrowStore};
use shelf_door::HttpDoorRelay;

#[tokio::main]
async fn main() -> Result<(), shelf_core::Error> {
    shelf_core::logging::init("shelf")?;

    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(BorrowStore::new(cfg.borrowings_file.clone()));
    let relay: Arc<dyn DoorRelay> = Arc::new(HttpDoorRelay::new(
        cfg.door_service_url.clone(),
        cfg.door_timeout,
    )?);
    let dispatcher = Arc::new(Dispatcher::new(cfg.clone(), store, relay));

    shelf_discord::router::run(cfg, dispatcher)
        .await
        .map_err(|e| shelf_core::Error::Platform(format!("discord bot failed: {e}")))?;

    Ok(())
}
