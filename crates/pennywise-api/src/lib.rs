//! JSON HTTP API over the document store and statistics
//!
//! Routes are organized into modules:
//! - routes::operations: Operation list query, create, update, delete
//! - routes::categories: Category list, create, update, delete
//! - routes::stats: Period totals, trend, category breakdown, monthly balance

pub mod error;
mod feeds;
pub mod routes;

use axum::{
    routing::{get, put},
    Router,
};
use pennywise_config::Config;
use pennywise_core::{Calendar, DocumentStore, LiveFeed};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use feeds::FeedCache;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    /// Live feeds of recently active users, attached on first use
    feeds: Arc<Mutex<FeedCache>>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let feeds = FeedCache::new(config.server.max_live_feeds);
        Self {
            store,
            feeds: Arc::new(Mutex::new(feeds)),
            config,
        }
    }

    pub fn calendar(&self) -> Calendar {
        Calendar::from_config(&self.config.stats)
    }

    /// Live feed of `user`, attaching it if needed
    pub fn feed(&self, user: &str) -> Arc<LiveFeed> {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        feeds.get_or_attach(user, || {
            LiveFeed::attach(self.store.as_ref(), user).with_calendar(self.calendar())
        })
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::categories::{create_category, delete_category, list_categories, update_category};
    use routes::operations::{create_operation, delete_operation, list_operations, update_operation};
    use routes::stats;

    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/users/:user_id/operations",
            get(list_operations).post(create_operation),
        )
        .route(
            "/api/users/:user_id/operations/:id",
            put(update_operation).delete(delete_operation),
        )
        .route(
            "/api/users/:user_id/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/users/:user_id/categories/:id",
            put(update_category).delete(delete_category),
        )
        .route("/api/users/:user_id/stats/totals", get(stats::totals))
        .route("/api/users/:user_id/stats/trend", get(stats::trend))
        .route("/api/users/:user_id/stats/categories", get(stats::categories))
        .route("/api/users/:user_id/stats/balance", get(stats::balance))
        .route("/api/users/:user_id/stats/overview", get(stats::overview))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Start the HTTP server
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `store` - The shared document store
pub async fn start_server(config: Config, store: Arc<dyn DocumentStore>) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(AppState::new(config, store));

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting Pennywise server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /api/health");
    log::info!("  - /api/users/:user_id/operations (list, create, update, delete)");
    log::info!("  - /api/users/:user_id/categories (list, create, update, delete)");
    log::info!("  - /api/users/:user_id/stats/{{totals,trend,categories,balance,overview}}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use pennywise_core::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::new(Config::default(), Arc::new(MemoryStore::new())))
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn seed_january(app: &Router) -> (String, String) {
        let salary = send(
            app,
            "POST",
            "/api/users/u1/categories",
            Some(json!({"name": "Salary", "type": "income"})),
        )
        .await;
        let salary = body_json(salary).await["id"].as_str().unwrap().to_string();
        let groceries = send(
            app,
            "POST",
            "/api/users/u1/categories",
            Some(json!({"name": "Groceries", "type": "expense"})),
        )
        .await;
        let groceries = body_json(groceries).await["id"].as_str().unwrap().to_string();

        let response = send(
            app,
            "POST",
            "/api/users/u1/operations",
            Some(json!({
                "type": "income",
                "amount": "1000",
                "description": "January pay",
                "categoryId": salary,
                "timestamp": "2024-01-01T09:00:00Z"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = send(
            app,
            "POST",
            "/api/users/u1/operations",
            Some(json!({
                "type": "expense",
                "amount": "50",
                "description": "Weekly shop",
                "categoryId": groceries,
                "timestamp": "2024-01-05T12:00:00Z"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        (salary, groceries)
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(&app(), "GET", "/api/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_list_and_search_operations() {
        let app = app();
        let (_, groceries) = seed_january(&app).await;

        let response = send(&app, "GET", "/api/users/u1/operations", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["matchedCount"], 2);
        assert_eq!(body["items"][0]["description"], "Weekly shop");
        assert_eq!(body["categoryIds"].as_array().unwrap().len(), 2);

        let response = send(&app, "GET", "/api/users/u1/operations?q=groc", None).await;
        let body = body_json(response).await;
        assert_eq!(body["matchedCount"], 1);
        assert_eq!(body["items"][0]["categoryId"], groceries);

        let response = send(
            &app,
            "GET",
            "/api/users/u1/operations?sort=amount&dir=asc&from=2024-01-01&to=2024-01-31",
            None,
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["items"][0]["description"], "Weekly shop");
        assert_eq!(body["items"][1]["description"], "January pay");
    }

    #[tokio::test]
    async fn test_monthly_totals() {
        let app = app();
        seed_january(&app).await;

        let response = send(
            &app,
            "GET",
            "/api/users/u1/stats/totals?period=monthly&at=2024-01-20T10:00:00Z",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["income"], "1000");
        assert_eq!(body["expense"], "50");
        assert_eq!(body["balance"], "950");

        let response = send(
            &app,
            "GET",
            "/api/users/u1/stats/overview?at=2024-01-20T10:00:00Z",
            None,
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["display"]["balance"], "950.00€");
        assert_eq!(body["operationCount"], 2);
    }

    #[tokio::test]
    async fn test_trend_and_balance_lengths() {
        let app = app();
        seed_january(&app).await;

        let response = send(
            &app,
            "GET",
            "/api/users/u1/stats/trend?at=2024-01-20T10:00:00Z",
            None,
        )
        .await;
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 30);

        let response = send(
            &app,
            "GET",
            "/api/users/u1/stats/balance?months=6&at=2024-01-20T10:00:00Z",
            None,
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 6);
        assert_eq!(body[5]["label"], "Jan 2024");

        let response = send(&app, "GET", "/api/users/u1/stats/trend?days=0", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_longest_trend_and_balance() {
        let app = app();
        seed_january(&app).await;

        let response = send(
            &app,
            "GET",
            "/api/users/u1/stats/trend?days=366&at=2024-12-31T12:00:00Z",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let days = body.as_array().unwrap();
        assert_eq!(days.len(), 366);
        assert_eq!(days[0]["date"], "2024-01-01");
        assert_eq!(days[0]["income"], "1000");

        let response = send(
            &app,
            "GET",
            "/api/users/u1/stats/balance?months=120&at=2024-01-20T10:00:00Z",
            None,
        )
        .await;
        let body = body_json(response).await;
        let months = body.as_array().unwrap();
        assert_eq!(months.len(), 120);
        assert_eq!(months[0]["month"], "2014-02-01");
        assert_eq!(months[119]["balance"], "950");

        let response = send(&app, "GET", "/api/users/u1/stats/trend?days=367", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = send(&app, "GET", "/api/users/u1/stats/balance?months=121", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_far_future_dates_are_answered() {
        let app = app();
        seed_january(&app).await;

        let response = send(&app, "GET", "/api/users/u1/operations?to=%2B262142-12-31", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["matchedCount"], 2);

        for path in ["totals?period=weekly", "trend?days=366", "balance?months=120", "overview?period=annual"] {
            let uri = format!("/api/users/u1/stats/{}&at=%2B262142-12-31T23:00:00Z", path);
            let response = send(&app, "GET", &uri, None).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_validation_errors_are_unprocessable() {
        let app = app();
        let (salary, _) = seed_january(&app).await;

        let response = send(
            &app,
            "POST",
            "/api/users/u1/operations",
            Some(json!({
                "type": "expense",
                "amount": "12.50",
                "description": "Mismatched category",
                "categoryId": salary,
                "timestamp": "2024-01-06T12:00:00Z"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "categoryId");

        let response = send(
            &app,
            "POST",
            "/api/users/u1/categories",
            Some(json!({"name": "   ", "type": "expense"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_update_and_delete_operation() {
        let app = app();
        seed_january(&app).await;
        let list = body_json(send(&app, "GET", "/api/users/u1/operations", None).await).await;
        let id = list["items"][0]["id"].as_str().unwrap().to_string();
        let created_at = list["items"][0]["createdAt"].clone();

        let response = send(
            &app,
            "PUT",
            &format!("/api/users/u1/operations/{}", id),
            Some(json!({
                "type": "expense",
                "amount": "75",
                "description": "Big shop",
                "timestamp": "2024-01-05T12:00:00Z"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["description"], "Big shop");
        assert_eq!(body["createdAt"], created_at);

        let uri = format!("/api/users/u1/operations/{}", id);
        assert_eq!(send(&app, "DELETE", &uri, None).await.status(), StatusCode::NO_CONTENT);
        let response = send(&app, "DELETE", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "OPERATION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let app = app();
        let response = send(&app, "GET", "/api/users/u1/operations?page=abc", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

        let request = Request::builder()
            .method("POST")
            .uri("/api/users/u1/categories")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_categories_filtered_by_type() {
        let app = app();
        seed_january(&app).await;
        let body = body_json(send(&app, "GET", "/api/users/u1/categories?type=expense", None).await).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Groceries"]);
    }
}
