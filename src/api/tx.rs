use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{
    AppState, FaucetRequest, FaucetResponse, MempoolResponse, NewTxResponse, SignTxRequest,
    error_response,
};
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// DEV Faucet: queue an authority-signed transfer, bypassing balance checks.
#[post("/faucet/")]
pub async fn post_faucet(
    state: web::Data<AppState>,
    body: web::Json<FaucetRequest>,
) -> impl Responder {
    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    if let Err(e) = ledger.force_transaction(&body.address, body.amount) {
        return error_response(&e);
    }
    debug!(
        "FAUCET - queued {} for {}; mempool size now {}",
        body.amount,
        body.address,
        ledger.mempool().len()
    );

    HttpResponse::Ok().json(FaucetResponse {
        address: body.address.clone(),
        amount: body.amount,
        mempool_size: ledger.mempool().len(),
    })
}

/// Submit a transaction signed client-side into the mempool.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<Transaction>,
) -> impl Responder {
    admit(&state, body.into_inner())
}

/// Sign with the supplied key, then admit. Dev convenience only.
#[post("/tx/sign/")]
pub async fn post_signed_transaction(
    state: web::Data<AppState>,
    body: web::Json<SignTxRequest>,
) -> impl Responder {
    let req = body.into_inner();
    match Transaction::create(req.source, req.destination, req.amount, &req.private_key) {
        Ok(tx) => admit(&state, tx),
        Err(e) => {
            warn!("POST /tx/sign/ - rejected: {e}");
            error_response(&LedgerError::Crypto(e))
        }
    }
}

fn admit(state: &AppState, tx: Transaction) -> HttpResponse {
    let t0 = Instant::now();
    let digest = tx.digest.clone();

    let mut ledger = state.ledger.lock().expect("mutex poisoned");
    let before = ledger.mempool().len();
    if let Err(e) = ledger.add_transaction(tx) {
        warn!("POST /tx/ - admission failed for {digest}: {e}");
        return error_response(&LedgerError::Admission(e));
    }

    info!(
        "POST /tx/ - {} OK (mempool {} -> {}, {} ms)",
        digest,
        before,
        ledger.mempool().len(),
        t0.elapsed().as_millis()
    );
    HttpResponse::Ok().json(NewTxResponse { digest })
}

/// List current mempool (just digests to keep it compact).
#[get("/mempool/")]
pub async fn get_mempool(state: web::Data<AppState>) -> impl Responder {
    let ledger = state.ledger.lock().expect("mutex poisoned");
    let digests = ledger
        .mempool()
        .iter()
        .map(|t| t.digest.clone())
        .collect::<Vec<_>>();
    HttpResponse::Ok().json(MempoolResponse {
        size: digests.len(),
        transactions: digests,
    })
}
