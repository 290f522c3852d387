use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use pow_ledger::api::{self, AppState};
use pow_ledger::blockchain::{Ledger, LedgerSnapshot};
use pow_ledger::config::{LedgerConfig, ServerConfig};
use pow_ledger::error::StorageError;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let server = ServerConfig::from_env();
    let ledger = open_ledger(&server, LedgerConfig::from_env())
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        server.host, server.port
    );

    let state = web::Data::new(AppState::new(ledger, server.data_file.clone()));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}

/// Resume from the snapshot file when one exists, otherwise start a fresh chain.
fn open_ledger(server: &ServerConfig, config: LedgerConfig) -> Result<Ledger, StorageError> {
    match &server.data_file {
        Some(path) if path.exists() => {
            let snapshot = LedgerSnapshot::load(path)?;
            Ok(Ledger::from_snapshot(snapshot, config)?)
        }
        _ => {
            info!("No snapshot to resume from, creating a new chain");
            Ok(Ledger::new(config)?)
        }
    }
}
