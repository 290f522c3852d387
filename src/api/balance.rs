use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse, HistoryResponse};

#[get("/balance/{address}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let balance = state
        .ledger
        .lock()
        .expect("mutex poisoned")
        .balance(&address);

    HttpResponse::Ok().json(BalanceResponse { address, balance })
}

/// Chain transactions sent or received by an address.
#[get("/history/{address}/")]
pub async fn get_history(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let transactions = ledger.history(&address);

    HttpResponse::Ok().json(HistoryResponse {
        address,
        transactions,
    })
}
