//! HTTP Endpoints
//!
//! Voice webhooks, the website call-context endpoint, provider
//! compatibility aliases, and health. Every voice handler returns a valid
//! markup document no matter what failed underneath - the caller always
//! hears something.

use std::collections::HashMap;

use axum::{
    extract::{Form, Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use call_router_core::Category;
use call_router_dialogue::{CategoryNext, ProductPath};
use call_router_persistence::LeadContext;
use call_router_telephony::{VoiceResponse, VoiceWebhookForm};

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Voice IVR webhooks
        .route("/voice", post(voice_entry))
        .route("/voice/intent", post(voice_intent))
        .route("/voice/name", post(voice_name))
        .route("/voice/name-fallback", post(voice_name_fallback))
        .route("/voice/assist-type", post(voice_assist_type))
        .route("/voice/product-id", post(voice_product_id))
        .route("/voice/product-category", post(voice_product_category))
        .route("/voice/price-product", post(voice_price_product))
        .route("/voice/category-name", post(voice_category_name))
        .route("/voice/description", post(voice_description))
        .route("/voice/dial-complete", post(voice_dial_complete))

        // Website context registration
        .route("/call-context", post(register_call_context))

        // Compatibility aliases for older webhook URL names
        .route("/twilio/incoming-call", post(voice_entry))
        .route("/twilio/call-status", post(call_status))
        .route("/twilio/error-log", post(error_log))
        .route("/twilio/fallback", post(provider_fallback))

        // Health check
        .route("/health", get(health_check))

        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Wrap a rendered voice document in an XML response.
fn xml(response: VoiceResponse) -> Response {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        response.render(),
    )
        .into_response()
}

// ==================== voice webhooks ====================

async fn voice_entry(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.entry(&form).await)
}

async fn voice_intent(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.intent(&form).await)
}

async fn voice_name(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.name(&form).await)
}

async fn voice_name_fallback(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.name_fallback(&form).await)
}

async fn voice_assist_type(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.assist_type(&form).await)
}

async fn voice_product_id(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.product_name(&form, ProductPath::General).await)
}

async fn voice_price_product(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.product_name(&form, ProductPath::Price).await)
}

async fn voice_category_name(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.category(&form, CategoryNext::Connect).await)
}

async fn voice_product_category(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.category(&form, CategoryNext::ProductName).await)
}

async fn voice_description(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.description(&form).await)
}

async fn voice_dial_complete(
    State(state): State<AppState>,
    Form(form): Form<VoiceWebhookForm>,
) -> Response {
    xml(state.machine.dial_complete(&form).await)
}

// ==================== call context ====================

/// Website-provided context for an upcoming or in-progress call.
#[derive(Debug, Deserialize)]
struct CallContextPayload {
    call_sid: String,
    page_context: Option<String>,
    currency: Option<String>,
    user_type: Option<String>,
    customer_id: Option<String>,
    product_id: Option<String>,
    product_category: Option<String>,
    preferred_language: Option<String>,
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct CallContextResponse {
    lead_id: String,
    preferred_language: String,
}

async fn register_call_context(
    State(state): State<AppState>,
    Json(payload): Json<CallContextPayload>,
) -> Result<Json<CallContextResponse>, StatusCode> {
    if payload.call_sid.len() < 10 {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let product_category = match payload.product_category.as_deref() {
        Some(label) => match Category::parse(label) {
            Some(category) => Some(category),
            None => return Err(StatusCode::UNPROCESSABLE_ENTITY),
        },
        None => None,
    };

    let ctx = LeadContext {
        call_sid: payload.call_sid,
        page_context: payload.page_context,
        currency: payload.currency,
        user_type: payload.user_type,
        customer_id: payload.customer_id,
        product_id: payload.product_id,
        product_category,
        preferred_language: payload.preferred_language,
        metadata: payload.metadata,
    };

    match state.leads.upsert_context(&ctx).await {
        Ok(lead) => Ok(Json(CallContextResponse {
            lead_id: lead.id.to_string(),
            preferred_language: lead.preferred_language.unwrap_or_else(|| "en-IN".to_string()),
        })),
        Err(e) => {
            tracing::error!(error = %e, "Call context upsert failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ==================== provider logging endpoints ====================

async fn call_status(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let call_sid = form.get("CallSid").cloned();
    state
        .events
        .audit(call_sid.as_deref(), "PROVIDER_CALL_STATUS", json!({ "form": form }))
        .await;
    Json(json!({ "status": "ok" }))
}

async fn error_log(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let call_sid = form.get("CallSid").cloned();
    state
        .events
        .audit(call_sid.as_deref(), "PROVIDER_ERROR_LOG", json!({ "form": form }))
        .await;
    Json(json!({ "status": "ok" }))
}

async fn provider_fallback(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let call_sid = form.get("CallSid").cloned();
    state
        .events
        .audit(call_sid.as_deref(), "PROVIDER_FALLBACK", json!({ "form": form }))
        .await;
    Json(json!({ "status": "ok" }))
}

// ==================== health ====================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
