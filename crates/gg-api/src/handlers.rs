//! # gg-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the gossip
//! service.

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use gg_core::models::{
    DeleteGossipRequest, LocationPreference, ListGossipsResponse, Submission,
    SubmitGossipRequest, SubmitGossipResponse,
};
use gg_core::GossipService;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;

/// State shared across all actix-web workers.
pub struct AppState {
    pub service: GossipService,
}

/// Malformed JSON bodies get the same `{error}` shape as every other 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "rejected malformed JSON body");
        ApiError::BadRequest(format!("Invalid JSON body: {err}")).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("Invalid query string: {err}")).into())
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

/// `POST /submitGossip`
pub async fn submit_gossip(
    data: web::Data<AppState>,
    body: web::Json<SubmitGossipRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = body.into_inner();
    if !(present(&payload.subject) && present(&payload.description) && present(&payload.gossip_type)) {
        return Err(ApiError::BadRequest("Missing required fields".to_string()));
    }

    let submission = Submission {
        subject: payload.subject.unwrap_or_default(),
        description: payload.description.unwrap_or_default(),
        category: payload.gossip_type,
        location_preference: LocationPreference::parse_lossy(payload.location_preference.as_deref()),
        coordinates: payload.location,
        expires_in_hours: payload.expires_in_hours,
    };

    let id = data.service.submit(submission).await?;
    Ok(HttpResponse::Created().json(SubmitGossipResponse { id }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub include_expired: Option<String>,
    pub category: Option<String>,
}

impl ListParams {
    fn include_expired(&self) -> bool {
        self.include_expired
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
    }
}

/// `GET /listGossips?includeExpired=true&category=Traffic`
pub async fn list_gossips(
    data: web::Data<AppState>,
    params: web::Query<ListParams>,
) -> Result<HttpResponse, ApiError> {
    let items = data
        .service
        .list(params.include_expired(), params.category.as_deref())
        .await?;

    debug!(count = items.len(), "listed gossips");
    Ok(HttpResponse::Ok().json(ListGossipsResponse { items }))
}

/// `DELETE /deleteGossip?id=...`, or with the id in a JSON body.
pub async fn delete_gossip(
    data: web::Data<AppState>,
    query: web::Query<DeleteGossipRequest>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let from_query = query.into_inner().id.filter(|id| !id.trim().is_empty());
    let raw_id = match from_query {
        Some(id) => Some(id),
        None if body.is_empty() => None,
        None => {
            serde_json::from_slice::<DeleteGossipRequest>(&body)
                .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {err}")))?
                .id
        }
    }
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| ApiError::BadRequest("Missing gossip id".to_string()))?;

    // Ids are minted by the store; anything that is not one cannot exist.
    let id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| ApiError::NotFound(format!("Gossip {raw_id} not found")))?;

    data.service.delete(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// CORS preflight answer for a single resource.
pub fn preflight(methods: &'static str) -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, methods))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .finish()
}

pub async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::MethodNotAllowed)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use chrono::{TimeDelta, TimeZone, Utc};
    use gg_core::clock::ManualClock;
    use gg_core::models::{ErrorBody, ListGossipsResponse};
    use gg_core::traits::FixedAuthor;
    use gg_store_memory::MemoryGossipStore;
    use serde_json::json;
    use std::sync::Arc;

    fn state(clock: Arc<ManualClock>) -> web::Data<AppState> {
        web::Data::new(AppState {
            service: GossipService::new(
                Arc::new(MemoryGossipStore::new()),
                clock,
                Arc::new(FixedAuthor::default()),
            ),
        })
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 7, 1, 20, 0, 0).unwrap()))
    }

    #[actix_web::test]
    async fn test_submit_then_list() {
        let app = test::init_service(
            App::new().app_data(state(clock())).configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/submitGossip")
            .set_json(json!({
                "subject": "Live band",
                "description": "Walk-in allowed, starts 8pm.",
                "gossipType": "Event",
                "locationPreference": "map",
                "location": { "latitude": 17.43, "longitude": 78.40 },
                "expiresInHours": 6
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: SubmitGossipResponse = test::read_body_json(resp).await;

        let req = test::TestRequest::get().uri("/listGossips").to_request();
        let listed: ListGossipsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.items.len(), 1);
        let item = &listed.items[0];
        assert_eq!(item.id, created.id);
        assert_eq!(item.category, "Event");
        assert_eq!(item.freshness, "2024-07-01T20:00:00.000Z");
        assert_eq!(item.expires_at.as_deref(), Some("2024-07-02T02:00:00.000Z"));
        assert_eq!(item.location_preference, Some(LocationPreference::Map));
        assert!(!item.expired);
    }

    #[actix_web::test]
    async fn test_missing_fields_are_rejected() {
        let app = test::init_service(
            App::new().app_data(state(clock())).configure(crate::configure_routes),
        )
        .await;

        for body in [
            json!({ "description": "no subject", "gossipType": "General" }),
            json!({ "subject": "no body", "gossipType": "General" }),
            json!({ "subject": "no type", "description": "body" }),
            json!({ "subject": "  ", "description": "body", "gossipType": "General" }),
        ] {
            let req = test::TestRequest::post().uri("/submitGossip").set_json(&body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
            let err: ErrorBody = test::read_body_json(resp).await;
            assert!(!err.error.is_empty());
        }

        let req = test::TestRequest::post()
            .uri("/submitGossip")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_include_expired_flag() {
        let clock = clock();
        let app = test::init_service(
            App::new().app_data(state(clock.clone())).configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/submitGossip")
            .set_json(json!({
                "subject": "Speed trap",
                "description": "Checking till 9pm",
                "gossipType": "Safety",
                "expiresInHours": 1
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        clock.advance(TimeDelta::minutes(61));

        let req = test::TestRequest::get().uri("/listGossips").to_request();
        let active: ListGossipsResponse = test::call_and_read_body_json(&app, req).await;
        assert!(active.items.is_empty());

        let req = test::TestRequest::get().uri("/listGossips?includeExpired=true").to_request();
        let all: ListGossipsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.items.len(), 1);
        assert!(all.items[0].expired);
    }

    #[actix_web::test]
    async fn test_delete_flow() {
        let app = test::init_service(
            App::new().app_data(state(clock())).configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/submitGossip")
            .set_json(json!({ "subject": "s", "description": "d", "gossipType": "News" }))
            .to_request();
        let created: SubmitGossipResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::delete().uri("/deleteGossip").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete()
            .uri("/deleteGossip")
            .set_json(json!({ "id": created.id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri(&format!("/deleteGossip?id={}", created.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/deleteGossip?id=abc").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_query_id_wins_over_stray_body() {
        let app = test::init_service(
            App::new().app_data(state(clock())).configure(crate::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/submitGossip")
            .set_json(json!({ "subject": "s", "description": "d", "gossipType": "News" }))
            .to_request();
        let created: SubmitGossipResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/deleteGossip?id={}", created.id))
            .set_payload("not json at all")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::delete()
            .uri("/deleteGossip")
            .set_payload("not json at all")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_preflight_and_wrong_method() {
        let app = test::init_service(
            App::new().app_data(state(clock())).configure(crate::configure_routes),
        )
        .await;

        for uri in ["/submitGossip", "/listGossips", "/deleteGossip"] {
            let req = test::TestRequest::default()
                .method(actix_web::http::Method::OPTIONS)
                .uri(uri)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NO_CONTENT, "{uri}");
            assert_eq!(
                resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                "*"
            );
        }

        let req = test::TestRequest::get().uri("/submitGossip").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        let err: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(err.error, "Method not allowed");
    }
}
