use axum::{
    body::Body,
    extract::State,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use offer_store::{Collection, DocumentStore};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
struct HttpState {
    store: DocumentStore,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthBody {
    status: &'static str,
    data_dir: String,
}

/// Read-only routes over the three collections. Every request re-reads the
/// file it serves.
pub fn router(store: DocumentStore) -> Router {
    let state = Arc::new(HttpState { store });
    Router::new()
        .route("/offers", get(offers))
        .route("/offerPayouts", get(base_payouts))
        .route("/influencerCustomPayouts", get(custom_payouts))
        .route("/customPayouts", get(custom_payouts))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn offers(State(state): State<Arc<HttpState>>) -> Result<Response, StatusCode> {
    collection_response(&state.store, Collection::Offers).await
}

async fn base_payouts(State(state): State<Arc<HttpState>>) -> Result<Response, StatusCode> {
    collection_response(&state.store, Collection::BasePayouts).await
}

async fn custom_payouts(State(state): State<Arc<HttpState>>) -> Result<Response, StatusCode> {
    collection_response(&state.store, Collection::CustomPayouts).await
}

async fn health(State(state): State<Arc<HttpState>>) -> Result<Response, StatusCode> {
    let body = HealthBody {
        status: "ok",
        data_dir: state.store.dir().display().to_string(),
    };
    build_response(StatusCode::OK, &body)
}

// Records are served as stored, without going through the typed model.
async fn collection_response(
    store: &DocumentStore,
    collection: Collection,
) -> Result<Response, StatusCode> {
    match store.read::<serde_json::Value>(collection).await {
        Ok(records) => build_response(StatusCode::OK, &records),
        Err(err) => {
            log::error!("Failed to read {}: {err}", collection.name());
            let body = ErrorBody {
                error: err.to_string(),
            };
            build_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
        }
    }
}

fn build_response<T: Serialize>(status: StatusCode, body: &T) -> Result<Response, StatusCode> {
    let bytes = serde_json::to_vec(body).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
