use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use marketplace_engine::{
    events::{EventHandlers, EventProducers},
    AuthApi,
    QcApi,
    QueryApi,
    QuoteFlowApi,
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    integrations::notifications::create_notification_hooks,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AuthRoute,
        CheckTokenRoute,
        CreateRfqRoute,
        DecideQuoteRoute,
        MyQuotesRoute,
        OrderByIdRoute,
        QcReportsRoute,
        ReleaseTransactionRoute,
        RfqByIdRoute,
        SubmitQcReportRoute,
        SubmitQuoteRoute,
        TransactionsSearchRoute,
        UpdateRolesRoute,
    },
};

/// Event channel depth. Notification handlers are cheap, so a modest buffer is plenty.
const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, create_notification_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Notification handlers started");
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<actix_web::dev::Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let quote_api = QuoteFlowApi::new(db.clone(), producers.clone());
        let qc_api = QcApi::new(db.clone(), producers.clone(), config.qc_threshold);
        let settlement_api = SettlementApi::new(db.clone(), producers.clone());
        let query_api = QueryApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth.hs256_key());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tms::access_log"))
            .app_data(web::Data::new(quote_api))
            .app_data(web::Data::new(qc_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(query_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(config.auth.hs256_key()))
            .service(CreateRfqRoute::<SqliteDatabase>::new())
            .service(RfqByIdRoute::<SqliteDatabase>::new())
            .service(SubmitQuoteRoute::<SqliteDatabase>::new())
            .service(DecideQuoteRoute::<SqliteDatabase>::new())
            .service(MyQuotesRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(SubmitQcReportRoute::<SqliteDatabase>::new())
            .service(QcReportsRoute::<SqliteDatabase>::new())
            .service(ReleaseTransactionRoute::<SqliteDatabase>::new())
            .service(TransactionsSearchRoute::<SqliteDatabase>::new())
            .service(UpdateRolesRoute::<SqliteDatabase>::new())
            .service(CheckTokenRoute::new());
        app.service(health).service(AuthRoute::<SqliteDatabase>::new()).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
