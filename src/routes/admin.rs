use actix_web::http::header::AUTHORIZATION;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, Secret};

use crate::dispatch::{CycleSummary, DispatchError, Dispatcher};
use crate::store::{StoreError, SubscriptionStore};

/// Bearer token expected on every admin endpoint.
pub struct AdminApiKey(pub Secret<String>);

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchResponse {
    summary: CycleSummary,
    triggered_at: DateTime<Utc>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionSummary {
    email: String,
    location: String,
    subscribed_at: DateTime<Utc>,
    last_alert_sent: Option<DateTime<Utc>>,
}

#[derive(serde::Serialize)]
struct SubscriptionsResponse {
    count: usize,
    subscriptions: Vec<SubscriptionSummary>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceStats {
    active_subscriptions: usize,
    version: &'static str,
}

#[derive(serde::Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum StatusResponse {
    Healthy {
        timestamp: DateTime<Utc>,
        stats: ServiceStats,
    },
    Unhealthy {
        error: &'static str,
        timestamp: DateTime<Utc>,
    },
}

/// Unauthenticated service status. Unlike `/health_check` it reads the
/// subscription store and answers 503 when the store cannot be reached.
#[tracing::instrument(name = "Service status handler", skip(store))]
pub async fn handle_status(store: web::Data<dyn SubscriptionStore>) -> HttpResponse {
    match store.list_active().await {
        Ok(subscribers) => HttpResponse::Ok().json(StatusResponse::Healthy {
            timestamp: Utc::now(),
            stats: ServiceStats {
                active_subscriptions: subscribers.len(),
                version: env!("CARGO_PKG_VERSION"),
            },
        }),
        Err(err) => {
            tracing::error!("Subscription store is unreachable: {:?}", err);
            HttpResponse::ServiceUnavailable().json(StatusResponse::Unhealthy {
                error: "Subscription store unreachable",
                timestamp: Utc::now(),
            })
        }
    }
}

#[tracing::instrument(name = "Manual weather dispatch handler", skip(request, dispatcher, api_key))]
pub async fn handle_trigger_dispatch(
    request: HttpRequest,
    dispatcher: web::Data<Dispatcher>,
    api_key: web::Data<AdminApiKey>,
) -> Result<HttpResponse, AdminError> {
    authorize(&request, &api_key)?;

    let triggered_at = Utc::now();
    let summary = dispatcher.run_cycle().await?;

    Ok(HttpResponse::Ok().json(DispatchResponse {
        summary,
        triggered_at,
    }))
}

#[tracing::instrument(name = "List active subscriptions handler", skip(request, store, api_key))]
pub async fn handle_list_subscriptions(
    request: HttpRequest,
    store: web::Data<dyn SubscriptionStore>,
    api_key: web::Data<AdminApiKey>,
) -> Result<HttpResponse, AdminError> {
    authorize(&request, &api_key)?;

    let subscriptions: Vec<SubscriptionSummary> = store
        .list_active()
        .await
        .map_err(AdminError::ListSubscriptionsError)?
        .into_iter()
        .map(|subscriber| SubscriptionSummary {
            email: subscriber.email.to_string(),
            location: subscriber.location.to_string(),
            subscribed_at: subscriber.subscribed_at,
            last_alert_sent: subscriber.last_alert_sent,
        })
        .collect();

    Ok(HttpResponse::Ok().json(SubscriptionsResponse {
        count: subscriptions.len(),
        subscriptions,
    }))
}

fn authorize(request: &HttpRequest, api_key: &AdminApiKey) -> Result<(), AdminError> {
    let expected = format!("Bearer {}", api_key.0.expose_secret());
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(provided) if provided == expected => Ok(()),
        _ => Err(AdminError::Unauthorized),
    }
}

#[derive(thiserror::Error)]
pub enum AdminError {
    #[error("Missing or invalid admin credentials.")]
    Unauthorized,
    #[error("Failed to run the dispatch cycle.")]
    DispatchError(#[from] DispatchError),
    #[error("Failed to list the active subscriptions.")]
    ListSubscriptionsError(#[source] StoreError),
}

impl std::fmt::Debug for AdminError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::dispatch::error_chain_fmt(self, f)
    }
}

impl ResponseError for AdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdminError::DispatchError(DispatchError::CycleInProgress) => StatusCode::CONFLICT,
            AdminError::DispatchError(DispatchError::StoreFetch(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AdminError::ListSubscriptionsError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
