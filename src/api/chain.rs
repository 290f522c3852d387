use actix_web::{HttpResponse, Responder, get, post, web};
use log::info;

use super::models::{
    AppState, ChainResponse, DifficultyResponse, RecoverResponse, ValidateResponse, error_response,
};
use crate::blockchain::ChainState;

/// Get the full chain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        length: ledger.len(),
        difficulty: ledger.difficulty(),
        chain: &ledger.chain,
    })
}

/// Validate the whole chain without changing it.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let status = ledger.status();
    HttpResponse::Ok().json(ValidateResponse {
        valid: status == ChainState::Consistent,
        length: ledger.len(),
        difficulty: ledger.difficulty(),
        status,
    })
}

/// Truncate a chain with a broken link. Tampered chains are refused.
#[post("/recover/")]
pub async fn recover_chain(state: web::Data<AppState>) -> impl Responder {
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    match ledger.recover() {
        Ok(recovery) => {
            info!("POST /recover/ - {:?}", recovery);
            state.persist(&ledger);
            HttpResponse::Ok().json(RecoverResponse {
                recovery,
                length: ledger.len(),
            })
        }
        Err(e) => error_response(&e),
    }
}

#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: ledger.difficulty(),
    })
}
