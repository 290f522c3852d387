mod balance;
mod chain;
mod health;
mod mining;
pub mod models;
mod stats;
mod tx;
mod wallet;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::recover_chain)
            .service(chain::get_difficulty)
            .service(tx::post_faucet)
            .service(tx::post_transaction)
            .service(tx::post_signed_transaction)
            .service(tx::get_mempool)
            .service(mining::mine)
            .service(balance::get_balance)
            .service(balance::get_history)
            .service(stats::get_stats)
            .service(wallet::create_wallet),
    );
}

#[cfg(test)]
mod tests {
    use super::{AppState, init_routes};
    use crate::blockchain::Ledger;
    use crate::config::LedgerConfig;
    use crate::transaction::Transaction;
    use crate::wallet::Wallet;
    use actix_web::{App, http::StatusCode, test, web};
    use serde_json::{Value, json};

    fn state() -> web::Data<AppState> {
        let ledger = Ledger::new(LedgerConfig::new(1, 10)).unwrap();
        web::Data::new(AppState::new(ledger, None))
    }

    #[actix_web::test]
    async fn faucet_then_mine_credits_both_addresses() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/faucet/")
            .set_json(json!({ "address": "person1", "amount": 100 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(json!({ "miner_address": "miner1" }))
            .to_request();
        let mined: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mined["height"], 2);
        assert_eq!(mined["approved"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/balance/person1/")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"], 100);

        let req = test::TestRequest::get()
            .uri("/api/v1/validate/")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["valid"], true);
        assert_eq!(body["status"]["state"], "consistent");
    }

    #[actix_web::test]
    async fn overdraft_is_a_bad_request() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let req = test::TestRequest::post().uri("/api/v1/wallet/new/").to_request();
        let wallet: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/sign/")
            .set_json(json!({
                "source": wallet["address"],
                "destination": "person2",
                "amount": 5,
                "private_key": wallet["secret_key"],
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/v1/mempool/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["size"], 0);
    }

    #[actix_web::test]
    async fn faucet_refuses_non_positive_amounts() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        for amount in [0, -100] {
            let req = test::TestRequest::post()
                .uri("/api/v1/faucet/")
                .set_json(json!({ "address": "person1", "amount": amount }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let req = test::TestRequest::get().uri("/api/v1/mempool/").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["size"], 0);
    }

    #[actix_web::test]
    async fn submitted_transaction_must_be_pending() {
        let app = test::init_service(App::new().app_data(state()).configure(init_routes)).await;

        let alice = Wallet::generate();
        let tx = Transaction::create(&alice.address, "person2", 5, &alice.secret_key).unwrap();
        let mut body = serde_json::to_value(&tx).unwrap();
        body["status"] = json!("approved");

        let req = test::TestRequest::post()
            .uri("/api/v1/tx/")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = test::read_body_json(resp).await;
        assert!(err["error"].as_str().unwrap().contains("not pending"));
    }
}
