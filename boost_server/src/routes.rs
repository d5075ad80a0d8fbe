//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread
//! will cause the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O,
//! database calls, charge dispatches) must therefore be async so the worker can interleave other requests.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use boost_engine::{
    db_types::{Role, Transaction},
    traits::{CatalogManagement, PromoGatewayDatabase},
    CatalogApi,
    SettlementApi,
    SettlementEffect,
};
use log::*;

use crate::{
    auth::JwtClaims,
    config::ServerConfig,
    data_objects::{
        ForceExpireRequest,
        JsonResponse,
        PaymentInitRequest,
        PaymentInitResponse,
        SettlementNotification,
        TickerClaimRequest,
    },
    errors::ServerError,
    helpers::get_remote_ip,
    integrations::paygate::{ChargeRequest, MobileMoneyGateway},
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

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(packages => Get "/packages" impl CatalogManagement);
/// The active promotion packages. Any authenticated user can browse them.
pub async fn packages<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET packages");
    let packages = api.active_packages().await?;
    Ok(HttpResponse::Ok().json(packages))
}

//----------------------------------------------   Boost purchase  ---------------------------------------------
route!(boost => Post "/boost" impl PromoGatewayDatabase, MobileMoneyGateway);
/// Route handler for boost purchases.
///
/// Opens a `Pending` ledger row for the caller, then dispatches the charge to the mobile-money aggregator.
/// If the aggregator queues the charge, its reference is recorded against the row and returned; the actual
/// verdict arrives later via the settlement webhook. If the aggregator rejects the charge outright, the row
/// is failed immediately and a 502 is returned so no transaction is ever left dangling behind a rejection.
pub async fn boost<B, G>(
    claims: JwtClaims,
    body: web::Json<PaymentInitRequest>,
    api: web::Data<SettlementApi<B>>,
    gateway: web::Data<G>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: PromoGatewayDatabase,
    G: MobileMoneyGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST boost for listing #{} by {}", request.listing_id, claims.sub);
    let tx = api
        .initiate_boost(
            request.listing_id,
            &claims.sub,
            request.package_id,
            request.network,
            request.phone_number.clone(),
            config.payment_window,
        )
        .await?;
    let charge = ChargeRequest {
        identifier: tx.id,
        amount: tx.amount,
        network: request.network,
        phone_number: request.phone_number,
        description: format!("Boost for listing #{}", request.listing_id),
    };
    match gateway.request_charge(charge).await {
        Ok(ack) => {
            let tx = api.record_gateway_ack(tx.id, &ack.reference).await?;
            Ok(HttpResponse::Ok().json(PaymentInitResponse {
                success: true,
                transaction_id: tx.id,
                reference: ack.reference,
                amount: tx.amount,
                status: tx.status,
                expires_at: tx.expires_at,
                message: "Charge dispatched. Awaiting approval on the subscriber's handset".to_string(),
            }))
        },
        Err(e) => {
            warn!("💻️ Charge dispatch for transaction #{} failed. {e}", tx.id);
            api.reject_charge(tx.id, &e.to_string()).await?;
            Err(ServerError::PaymentGatewayError(e.to_string()))
        },
    }
}

//----------------------------------------------   Transactions  -----------------------------------------------
route!(transaction_by_id => Get "/transaction/{id}" impl PromoGatewayDatabase);
/// A single ledger row. Users can read their own transactions; `ReadAll` and `Admin` can read any.
pub async fn transaction_by_id<B: PromoGatewayDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET transaction #{id} for {}", claims.sub);
    let tx = api.transaction(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Transaction {id}")))?;
    ensure_transaction_visible(&claims, &tx)?;
    Ok(HttpResponse::Ok().json(tx))
}

route!(transaction_by_reference => Get "/transaction/by_reference/{reference}" impl PromoGatewayDatabase);
/// Polling alias for clients that only hold the `tx_reference` from the payment response.
pub async fn transaction_by_reference<B: PromoGatewayDatabase>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = path.into_inner();
    debug!("💻️ GET transaction by reference {reference} for {}", claims.sub);
    let tx = api
        .transaction_by_reference(&reference)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Transaction with reference {reference}")))?;
    ensure_transaction_visible(&claims, &tx)?;
    Ok(HttpResponse::Ok().json(tx))
}

fn ensure_transaction_visible(claims: &JwtClaims, tx: &Transaction) -> Result<(), ServerError> {
    let may_read_all = claims.roles.contains(&Role::ReadAll) || claims.roles.contains(&Role::Admin);
    if tx.user_id != claims.sub && !may_read_all {
        return Err(ServerError::InsufficientPermissions("You may only view your own transactions".to_string()));
    }
    Ok(())
}

//----------------------------------------------   Ticker  -----------------------------------------------------
route!(ticker => Get "/ticker" impl CatalogManagement);
/// The current occupant of the ticker slot.
pub async fn ticker<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET ticker");
    let slot = api.ticker_slot().await?;
    Ok(HttpResponse::Ok().json(slot))
}

route!(claim_ticker => Post "/ticker/claim" impl PromoGatewayDatabase);
/// Claims the ticker slot for one of the caller's approved listings. Settles synchronously.
pub async fn claim_ticker<B: PromoGatewayDatabase>(
    claims: JwtClaims,
    body: web::Json<TickerClaimRequest>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let listing_id = body.into_inner().listing_id;
    debug!("💻️ POST ticker claim for listing #{listing_id} by {}", claims.sub);
    let outcome = api.claim_ticker(listing_id, &claims.sub).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "transaction_id": outcome.transaction.id,
        "effect": outcome.effect,
    })))
}

//----------------------------------------------   Notifications  ----------------------------------------------
route!(my_notifications => Get "/notifications" impl PromoGatewayDatabase);
/// The caller's notifications, newest first.
pub async fn my_notifications<B: PromoGatewayDatabase>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET notifications for {}", claims.sub);
    let notes = api.notifications_for(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(notes))
}

//----------------------------------------------   Settlement webhook  -----------------------------------------
route!(settlement_webhook => Post "/settlement" impl PromoGatewayDatabase);
/// Route handler for settlement callbacks from the aggregator.
///
/// The surrounding scope verifies the HMAC signature before this handler runs. The engine does the rest:
/// unknown references come back as 404, late settlements as 410 (the aggregator must not retry those), and
/// duplicate deliveries as a 200 no-op so redeliveries always converge.
pub async fn settlement_webhook<B: PromoGatewayDatabase>(
    req: HttpRequest,
    body: web::Json<SettlementNotification>,
    api: web::Data<SettlementApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let note = body.into_inner();
    let source = get_remote_ip(&req, config.use_x_forwarded_for, config.use_forwarded)
        .map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
    info!("💻️ Settlement callback for {} ({:?}) from {source}", note.reference, note.status);
    let outcome = api.process_settlement(&note.reference, note.status, note.message.as_deref()).await?;
    let response = if outcome.duplicate {
        JsonResponse::success("Already settled; duplicate delivery ignored")
    } else {
        match &outcome.effect {
            SettlementEffect::None => JsonResponse::success("Settlement recorded"),
            SettlementEffect::Boosted(listing) => JsonResponse::success(format!("Listing #{} boosted", listing.id)),
            SettlementEffect::TickerReassigned { .. } => JsonResponse::success("Ticker slot reassigned"),
            SettlementEffect::EffectFailed(e) => {
                JsonResponse::failure(format!("Payment captured, but the promotion could not be applied: {e}"))
            },
        }
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Admin  ------------------------------------------------------
route!(force_expire => Post "/admin/expire_boost" impl PromoGatewayDatabase where requires [Role::Admin]);
/// Immediately strips a listing's premium status. Leaves an audit record naming the operator and reason.
pub async fn force_expire<A: PromoGatewayDatabase>(
    claims: JwtClaims,
    body: web::Json<ForceExpireRequest>,
    api: web::Data<SettlementApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    info!("💻️ POST force_expire for listing #{} by {}", request.listing_id, claims.sub);
    let listing = api.force_expire(request.listing_id, &claims.sub, &request.reason).await?;
    Ok(HttpResponse::Ok().json(listing))
}

route!(sweep => Post "/admin/sweep" impl PromoGatewayDatabase where requires [Role::Admin]);
/// Runs one expiry sweep on demand, ahead of the worker's next tick.
pub async fn sweep<A: PromoGatewayDatabase>(
    claims: JwtClaims,
    api: web::Data<SettlementApi<A>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ POST sweep by {}", claims.sub);
    let result = api.expire_promotions().await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!(
        "{} lapsed boost(s) demoted, {} abandoned transaction(s) reconciled",
        result.demoted.len(),
        result.reconciled.len()
    ))))
}
