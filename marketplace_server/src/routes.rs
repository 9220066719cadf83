//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use marketplace_engine::{
    db_types::{NewQcReport, NewQuote, NewRfq, Order, Role, Roles},
    query_objects::TransactionQueryFilter,
    traits::{AuthManagement, MarketplaceDatabase, QueryManagement},
    AuthApi,
    QcApi,
    QueryApi,
    QuoteFlowApi,
    SettlementApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{JsonResponse, LoginRequest, OrderResult, QcReportQuery, QuoteDecisionRequest, RoleUpdateRequest},
    errors::ServerError,
    helpers::get_remote_ip,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(auth => Post "/auth" impl AuthManagement);
/// Route handler for the auth endpoint
///
/// This route is used to authenticate a user and issue a JWT token.
///
/// Users supply their user id, api key, a nonce and the roles they want on the token (see [`LoginRequest`]).
/// The nonce must increase on every call (not necessarily by 1 - a unix time epoch can be used, for example), which
/// stops a captured login request from being replayed.
///
/// If successful, the server will issue a JWT token that can be used to authenticate future requests.
/// The JWT is valid for a relatively short period and will NOT refresh.
pub async fn auth<A>(
    req: HttpRequest,
    options: web::Data<ServerOptions>,
    api: web::Data<AuthApi<A>>,
    signer: web::Data<TokenIssuer>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
{
    trace!("💻️ Received auth request");
    let LoginRequest { user_id, api_key, nonce, roles } = body.into_inner();
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    debug!("💻️ Login attempt for user #{user_id} from {peer:?}");
    api.authenticate(user_id, &api_key, nonce, &roles).await.map_err(|e| {
        debug!("💻️ User #{user_id} could not be authenticated. {e}");
        ServerError::from(e)
    })?;
    let claims = JwtClaims { user_id, roles: Roles::from(roles) };
    let access_token =
        signer.issue_token(claims, None).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))?;
    trace!("💻️ Issued access token for user #{user_id}");
    Ok(HttpResponse::Ok().content_type("application/json").body(access_token))
}

//----------------------------------------------   RFQs  ----------------------------------------------------
route!(create_rfq => Post "/rfqs" impl MarketplaceDatabase where requires [Role::Buyer]);
/// Buyers open a new request-for-quote with `POST /api/rfqs`.
///
/// The buyer id on the submitted body is ignored; the RFQ always belongs to the authenticated caller.
pub async fn create_rfq<B: MarketplaceDatabase>(
    claims: JwtClaims,
    body: web::Json<NewRfq>,
    api: web::Data<QuoteFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let mut rfq = body.into_inner();
    rfq.buyer_id = claims.user_id;
    debug!("💻️ POST create_rfq '{}' for buyer #{}", rfq.title, rfq.buyer_id);
    let rfq = api.create_rfq(rfq).await?;
    Ok(HttpResponse::Created().json(rfq))
}

route!(rfq_by_id => Get "/rfqs/{id}" impl QueryManagement where requires [Role::User]);
pub async fn rfq_by_id<B: QueryManagement>(
    path: web::Path<i64>,
    api: web::Data<QueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let rfq_id = path.into_inner();
    debug!("💻️ GET rfq_by_id({rfq_id})");
    let rfq = api.rfq_by_id(rfq_id).await.map_err(|e| {
        debug!("💻️ Could not fetch RFQ. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    match rfq {
        Some(rfq) => Ok(HttpResponse::Ok().json(rfq)),
        None => Err(ServerError::NoRecordFound(format!("RFQ {rfq_id} does not exist"))),
    }
}

//----------------------------------------------   Quotes  ----------------------------------------------------
route!(submit_quote => Post "/quotes" impl MarketplaceDatabase where requires [Role::Supplier]);
/// Suppliers submit a quote against an open RFQ with `POST /api/quotes`.
///
/// The supplier id on the body is ignored; the quote is always filed under the caller's own supplier profile. Callers
/// without a supplier profile are rejected, Supplier role notwithstanding.
pub async fn submit_quote<B: MarketplaceDatabase>(
    claims: JwtClaims,
    body: web::Json<NewQuote>,
    api: web::Data<QuoteFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let mut quote = body.into_inner();
    let supplier = api
        .db()
        .fetch_supplier_for_user(claims.user_id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or(marketplace_engine::MarketplaceError::NoSupplierProfile)?;
    quote.supplier_id = supplier.id;
    debug!("💻️ POST submit_quote on RFQ #{} for supplier #{}", quote.rfq_id, quote.supplier_id);
    let quote = api.submit_quote(quote).await?;
    Ok(HttpResponse::Created().json(quote))
}

route!(decide_quote => Patch "/quotes/{id}" impl MarketplaceDatabase where requires [Role::Buyer]);
/// The RFQ owner accepts or rejects a pending quote with `PATCH /api/quotes/{id}`.
///
/// Acceptance is the pivotal operation of the marketplace: it closes the RFQ, creates the transaction, order and
/// funded escrow account in one atomic step, and returns the whole bundle. Rejection just finalizes the quote.
pub async fn decide_quote<B: MarketplaceDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<QuoteDecisionRequest>,
    api: web::Data<QuoteFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let quote_id = path.into_inner();
    let decision = body.into_inner().status;
    info!("💻️ Buyer #{} decides quote #{quote_id}: {decision:?}", claims.user_id);
    let decided = api.decide_quote(quote_id, decision, claims.user_id).await.map_err(|e| {
        debug!("💻️ Could not decide quote. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(decided))
}

route!(my_quotes => Get "/quotes/buyer" impl QueryManagement where requires [Role::Buyer]);
/// Buyers fetch all quotes across their RFQs, grouped per RFQ.
pub async fn my_quotes<B: QueryManagement>(
    claims: JwtClaims,
    api: web::Data<QueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_quotes for buyer #{}", claims.user_id);
    let quotes = api.quotes_for_buyer(claims.user_id).await.map_err(|e| {
        debug!("💻️ Could not fetch quotes. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(quotes))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(order_by_id => Get "/orders/{id}" impl QueryManagement where requires [Role::User]);
/// Fetch an order and its escrow account with `GET /api/orders/{id}`.
///
/// Only the order's buyer, its supplier, and admins (ReadAll or SuperAdmin roles) may see it.
pub async fn order_by_id<B: QueryManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<QueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order_by_id({order_id}) for user #{}", claims.user_id);
    let order = api
        .order_by_id(order_id)
        .await
        .map_err(|e| {
            debug!("💻️ Could not fetch order. {e}");
            ServerError::BackendError(e.to_string())
        })?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    check_order_party(&claims, &order, api.as_ref()).await?;
    let escrow = api.escrow_for_order(order.id).await.map_err(|e| {
        debug!("💻️ Could not fetch escrow account. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(OrderResult { order, escrow }))
}

/// Admins pass unconditionally; everyone else must be the order's buyer or its supplier.
async fn check_order_party<B: QueryManagement>(
    claims: &JwtClaims,
    order: &Order,
    api: &QueryApi<B>,
) -> Result<(), ServerError> {
    if claims.roles.contains(Role::ReadAll) {
        return Ok(());
    }
    if order.buyer_id == claims.user_id {
        return Ok(());
    }
    let supplier = api.supplier_for_user(claims.user_id).await.map_err(|e| {
        debug!("💻️ Could not resolve supplier profile. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    if supplier.map(|s| s.id) == Some(order.supplier_id) {
        return Ok(());
    }
    Err(marketplace_engine::MarketplaceError::NotOrderParty.into())
}

//----------------------------------------------   QC  ----------------------------------------------------
route!(submit_qc_report => Post "/qc/reports" impl MarketplaceDatabase where requires [Role::User]);
/// File a quality-control report for an order with `POST /api/qc/reports`.
///
/// Either party to the order may file a report, and it must carry at least one photo or video as evidence. A passing
/// score settles the order and pays the supplier out of escrow; a failing score opens a dispute while the funds stay
/// frozen.
pub async fn submit_qc_report<B: MarketplaceDatabase>(
    claims: JwtClaims,
    body: web::Json<NewQcReport>,
    api: web::Data<QcApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let report = body.into_inner();
    let order = api
        .db()
        .fetch_order(report.order_id)
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?
        .ok_or(marketplace_engine::MarketplaceError::OrderNotFound(report.order_id))?;
    check_qc_party(&claims, &order, api.db()).await?;
    info!("💻️ QC report for order #{} scored {} by user #{}", order.id, report.score, claims.user_id);
    let report = api.submit_report(report).await.map_err(|e| {
        debug!("💻️ Could not submit QC report. {e}");
        e
    })?;
    Ok(HttpResponse::Created().json(report))
}

async fn check_qc_party<B: QueryManagement>(
    claims: &JwtClaims,
    order: &Order,
    db: &B,
) -> Result<(), ServerError> {
    if claims.roles.contains(Role::Write) {
        return Ok(());
    }
    if order.buyer_id == claims.user_id {
        return Ok(());
    }
    let supplier =
        db.fetch_supplier_for_user(claims.user_id).await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    if supplier.map(|s| s.id) == Some(order.supplier_id) {
        return Ok(());
    }
    Err(marketplace_engine::MarketplaceError::NotOrderParty.into())
}

route!(qc_reports => Get "/qc/reports" impl QueryManagement where requires [Role::User]);
/// Fetch the QC reports filed for an order (`GET /api/qc/reports?order_id=`), newest first. Same visibility rules as
/// the order itself.
pub async fn qc_reports<B: QueryManagement>(
    claims: JwtClaims,
    query: web::Query<QcReportQuery>,
    api: web::Data<QueryApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = query.into_inner().order_id;
    debug!("💻️ GET qc_reports for order #{order_id}");
    let order = api
        .order_by_id(order_id)
        .await
        .map_err(|e| {
            debug!("💻️ Could not fetch order. {e}");
            ServerError::BackendError(e.to_string())
        })?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id} does not exist")))?;
    check_order_party(&claims, &order, api.as_ref()).await?;
    let reports = api.qc_reports_for_order(order_id).await.map_err(|e| {
        debug!("💻️ Could not fetch QC reports. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(reports))
}

//----------------------------------------------   Settlement  ----------------------------------------------------
route!(release_transaction => Patch "/transactions/{id}/release" impl MarketplaceDatabase where requires [Role::Buyer]);
/// The buyer releases a held transaction to the supplier with `PATCH /api/transactions/{id}/release`.
///
/// The order's escrow account is released along with it. Releasing a transaction that is not held returns a 409.
pub async fn release_transaction<B: MarketplaceDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let transaction_id = path.into_inner();
    info!("💻️ Buyer #{} releases transaction #{transaction_id}", claims.user_id);
    let tx = api.release_transaction(transaction_id, claims.user_id).await.map_err(|e| {
        debug!("💻️ Could not release transaction. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(tx))
}

route!(transactions_search => Get "/transactions" impl MarketplaceDatabase where requires [Role::User]);
/// Paginated transaction search with `GET /api/transactions?status=&offset=&limit=`.
///
/// Ordinary callers only ever see transactions they are a party to, as the buyer or through their supplier profile.
/// Admins (ReadAll) may search across all parties.
pub async fn transactions_search<B: MarketplaceDatabase>(
    claims: JwtClaims,
    query: web::Query<TransactionQueryFilter>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET transactions search for [{query}] by user #{}", claims.user_id);
    let mut query = query.into_inner();
    if !claims.roles.contains(Role::ReadAll) {
        query = query.for_user(claims.user_id);
    }
    let transactions = api.search_transactions(query).await.map_err(|e| {
        debug!("💻️ Could not fetch transactions. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(transactions))
}

//----------------------------------------------   SuperAdmin  ----------------------------------------------------
route!(update_roles => Post "/roles" impl AuthManagement where requires [Role::SuperAdmin]);
pub async fn update_roles<B: AuthManagement>(
    api: web::Data<AuthApi<B>>,
    body: web::Json<Vec<RoleUpdateRequest>>,
) -> Result<HttpResponse, ServerError> {
    let mut count = 0;
    for acl_request in body.into_inner() {
        debug!("💻️ POST update roles for user #{}", acl_request.user_id);
        api.assign_roles(acl_request.user_id, &acl_request.apply).await?;
        api.remove_roles(acl_request.user_id, &acl_request.revoke).await?;
        count += 1;
    }
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Roles updated for {count} users"))))
}

//----------------------------------------------  Check Token  ----------------------------------------------------
route!(check_token => Get "/check_token" requires [Role::User]);
pub async fn check_token(claims: JwtClaims) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET check_token for user #{}", claims.user_id);
    Ok(HttpResponse::Ok().body("Token is valid."))
}
