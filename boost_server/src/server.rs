use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use boost_engine::{events::EventProducers, CatalogApi, SettlementApi, SqliteDatabase};
use log::*;

use crate::{
    auth::TokenVerifier,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::paygate::PayGateClient,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory, SignaturePolicy},
    routes::{
        health,
        BoostRoute,
        ClaimTickerRoute,
        ForceExpireRoute,
        MyNotificationsRoute,
        PackagesRoute,
        SettlementWebhookRoute,
        SweepRoute,
        TickerRoute,
        TransactionByIdRoute,
        TransactionByReferenceRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let worker = start_expiry_worker(db.clone(), EventProducers::default(), config.sweep_interval_secs);
    let srv = create_server_instance(config, db)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    worker.abort();
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<actix_web::dev::Server, ServerError> {
    let paygate = PayGateClient::new(&config.paygate).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let settlement_api = SettlementApi::new(db.clone(), EventProducers::default());
        let catalog_api = CatalogApi::new(db.clone());
        let verifier = TokenVerifier::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bps::access_log"))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(paygate.clone()))
            .app_data(web::Data::new(config.clone()));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(verifier))
            .service(PackagesRoute::<SqliteDatabase>::new())
            .service(BoostRoute::<SqliteDatabase, PayGateClient>::new())
            .service(TransactionByIdRoute::<SqliteDatabase>::new())
            .service(TransactionByReferenceRoute::<SqliteDatabase>::new())
            .service(TickerRoute::<SqliteDatabase>::new())
            .service(ClaimTickerRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase>::new())
            .service(ForceExpireRoute::<SqliteDatabase>::new())
            .service(SweepRoute::<SqliteDatabase>::new());
        // The settlement webhook authenticates with an HMAC signature instead of a user token
        let webhook_scope = web::scope("/webhook")
            .wrap(HmacMiddlewareFactory::new(SignaturePolicy::for_paygate(&config.paygate)))
            .service(SettlementWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    info!("🚀️ Server instance created");
    Ok(srv)
}
