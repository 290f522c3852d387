use actix_web::{HttpResponse, Responder, post};

use crate::wallet::Wallet;

#[post("/wallet/new/")]
pub async fn create_wallet() -> impl Responder {
    HttpResponse::Ok().json(Wallet::generate())
}
