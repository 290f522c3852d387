use actix_web::{HttpResponse, Responder, post, web};
use log::info;
use std::time::Instant;

use super::models::{AppState, MineRequest, MineResponse, error_response};

/// Mine the whole mempool, paying rewards to `miner_address`.
/// Proof-of-Work runs inline; the request blocks until every pass is sealed.
#[post("/mine/")]
pub async fn mine(state: web::Data<AppState>, req: web::Json<MineRequest>) -> impl Responder {
    let miner_address = req.miner_address.trim();
    if miner_address.is_empty() {
        return HttpResponse::BadRequest().body("miner_address required");
    }

    let t0 = Instant::now();
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let report = match ledger.handle_transactions(miner_address) {
        Ok(report) => report,
        Err(e) => return error_response(&e),
    };

    if !report.hashes.is_empty() {
        state.persist(&ledger);
    }
    info!(
        "POST /mine/ - {} block(s) for {} in {} ms",
        report.hashes.len(),
        miner_address,
        t0.elapsed().as_millis()
    );

    HttpResponse::Ok().json(MineResponse {
        height: ledger.len(),
        difficulty: ledger.difficulty(),
        report,
    })
}
