use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let config = ledger.config();

    HttpResponse::Ok().json(StatsResponse {
        height: ledger.len(),
        difficulty: ledger.difficulty(),
        reward: ledger.reward(),
        blocks_mined: ledger.blocks_mined(),
        capacity: config.capacity,
        direction: config.direction,
        reward_policy: config.reward_policy,
        mempool_size: ledger.mempool().len(),
    })
}
