// Spend Analyzer - JSON API server
// CRUD, summaries, and chart configs over the expense store

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use chrono::{Days, Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use spend_analyzer::{
    all_categories, category_breakdown, charts, daily_totals, db, default_export_filename,
    export_csv_string, stats, Category, ChartConfig, NewExpense, RangeFilter, TrendKind,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

fn internal_error(context: &str, err: anyhow::Error) -> Response {
    log::error!("{}: {:#}", context, err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

#[derive(Deserialize, Default)]
struct ListQuery {
    range: Option<String>,
    category: Option<String>,
}

#[derive(Deserialize, Default)]
struct DailyQuery {
    days: Option<u64>,
    kind: Option<String>,
}

/// Resolve the `range` query param; absent means `all`
fn resolve_range(raw: &Option<String>) -> Result<RangeFilter, Response> {
    match raw {
        None => Ok(RangeFilter::All),
        Some(token) => RangeFilter::parse(token).ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid range {:?} (today|week|month|year|all)", token),
            )
        }),
    }
}

/// Fetch expenses for the given range/category filters
fn fetch_filtered(
    conn: &Connection,
    query: &ListQuery,
) -> Result<Vec<spend_analyzer::Expense>, Response> {
    let range = resolve_range(&query.range)?;
    let (start, end) = range.bounds(today());

    let mut expenses = db::expenses_by_date_range(conn, start, end)
        .map_err(|e| internal_error("Failed to query expenses", e))?;

    if let Some(raw) = &query.category {
        let category = Category::parse(raw);
        expenses.retain(|e| e.category == category);
    }

    Ok(expenses)
}

// ============================================================================
// API HANDLERS
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/expenses?range=&category=
async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let conn = state.db.lock().unwrap();

    match fetch_filtered(&conn, &query) {
        Ok(expenses) => (StatusCode::OK, Json(ApiResponse::ok(expenses))).into_response(),
        Err(response) => response,
    }
}

/// POST /api/expenses
async fn create_expense(
    State(state): State<AppState>,
    Json(expense): Json<NewExpense>,
) -> Response {
    if let Err(errors) = expense.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: Some(errors),
                error: Some("Validation failed".to_string()),
            }),
        )
            .into_response();
    }

    let conn = state.db.lock().unwrap();

    match db::insert_expense(&conn, &expense) {
        Ok(id) => (
            StatusCode::CREATED,
            Json(ApiResponse::ok(serde_json::json!({ "id": id }))),
        )
            .into_response(),
        Err(e) => internal_error("Failed to insert expense", e),
    }
}

/// PUT /api/expenses/:id
async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(updates): Json<NewExpense>,
) -> Response {
    if let Err(errors) = updates.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: Some(errors),
                error: Some("Validation failed".to_string()),
            }),
        )
            .into_response();
    }

    let conn = state.db.lock().unwrap();

    match db::get_expense(&conn, id) {
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Expense {} not found", id)),
        Ok(Some(_)) => match db::update_expense(&conn, id, &updates) {
            Ok(updated) => (StatusCode::OK, Json(ApiResponse::ok(updated))).into_response(),
            Err(e) => internal_error("Failed to update expense", e),
        },
        Err(e) => internal_error("Failed to load expense", e),
    }
}

/// DELETE /api/expenses/:id
async fn delete_expense(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let conn = state.db.lock().unwrap();

    match db::get_expense(&conn, id) {
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Expense {} not found", id)),
        Ok(Some(_)) => match db::delete_expense(&conn, id) {
            Ok(()) => (
                StatusCode::OK,
                Json(ApiResponse::ok(serde_json::json!({ "deleted": id }))),
            )
                .into_response(),
            Err(e) => internal_error("Failed to delete expense", e),
        },
        Err(e) => internal_error("Failed to load expense", e),
    }
}

/// DELETE /api/expenses — full wipe
async fn wipe_expenses(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().unwrap();

    match db::delete_all_expenses(&conn) {
        Ok(removed) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({ "removed": removed }))),
        )
            .into_response(),
        Err(e) => internal_error("Failed to wipe expenses", e),
    }
}

/// GET /api/summary
async fn get_summary(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().unwrap();

    match db::get_all_expenses(&conn) {
        Ok(expenses) => {
            let summary = stats::summarize(&expenses, today());
            (StatusCode::OK, Json(ApiResponse::ok(summary))).into_response()
        }
        Err(e) => internal_error("Failed to build summary", e),
    }
}

/// GET /api/breakdown?range=
async fn get_breakdown(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Response {
    let conn = state.db.lock().unwrap();

    match fetch_filtered(&conn, &query) {
        Ok(expenses) => {
            let breakdown = category_breakdown(&expenses);
            (StatusCode::OK, Json(ApiResponse::ok(breakdown))).into_response()
        }
        Err(response) => response,
    }
}

/// Expenses over the trailing `days` window, newest day last
fn fetch_daily(
    conn: &Connection,
    days: u64,
) -> Result<std::collections::BTreeMap<NaiveDate, f64>, anyhow::Error> {
    let end = today();
    let start = end.checked_sub_days(Days::new(days)).unwrap_or(end);

    let expenses = db::expenses_by_date_range(conn, start, end)?;
    Ok(daily_totals(&expenses))
}

/// GET /api/daily?days=
async fn get_daily(State(state): State<AppState>, Query(query): Query<DailyQuery>) -> Response {
    let conn = state.db.lock().unwrap();
    let days = query.days.unwrap_or(30);

    match fetch_daily(&conn, days) {
        Ok(daily) => (StatusCode::OK, Json(ApiResponse::ok(daily))).into_response(),
        Err(e) => internal_error("Failed to build daily totals", e),
    }
}

/// GET /api/charts/pie?range=
async fn chart_pie(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let conn = state.db.lock().unwrap();

    match fetch_filtered(&conn, &query) {
        Ok(expenses) => {
            let config: Option<ChartConfig> = charts::pie_chart(&category_breakdown(&expenses));
            (StatusCode::OK, Json(ApiResponse::ok(config))).into_response()
        }
        Err(response) => response,
    }
}

/// GET /api/charts/trend?days=&kind=
async fn chart_trend(State(state): State<AppState>, Query(query): Query<DailyQuery>) -> Response {
    let kind = match &query.kind {
        None => TrendKind::Line,
        Some(token) => match TrendKind::parse(token) {
            Some(kind) => kind,
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid chart kind {:?} (line|bar)", token),
                )
            }
        },
    };

    let conn = state.db.lock().unwrap();
    let days = query.days.unwrap_or(30);

    match fetch_daily(&conn, days) {
        Ok(daily) => {
            let config: Option<ChartConfig> = charts::trend_chart(&daily, kind);
            (StatusCode::OK, Json(ApiResponse::ok(config))).into_response()
        }
        Err(e) => internal_error("Failed to build trend chart", e),
    }
}

/// GET /api/categories — fixed set with display metadata
async fn list_categories() -> impl IntoResponse {
    let categories: Vec<serde_json::Value> = all_categories()
        .iter()
        .map(|c| {
            serde_json::json!({
                "name": c.name(),
                "emoji": c.emoji(),
                "color": c.color(),
            })
        })
        .collect();

    Json(ApiResponse::ok(categories))
}

/// GET /api/categories/:name — expenses in one category
async fn expenses_for_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    // Decode URL-encoded names ("Pet%20Supplies")
    let decoded = urlencoding::decode(&name)
        .unwrap_or_else(|_| name.clone().into())
        .into_owned();
    let category = Category::parse(&decoded);

    let conn = state.db.lock().unwrap();

    match db::expenses_by_category(&conn, &category) {
        Ok(expenses) => (StatusCode::OK, Json(ApiResponse::ok(expenses))).into_response(),
        Err(e) => internal_error("Failed to query category", e),
    }
}

/// GET /api/export — CSV download
async fn export_expenses(State(state): State<AppState>) -> Response {
    let conn = state.db.lock().unwrap();

    let expenses = match db::get_all_expenses(&conn) {
        Ok(expenses) => expenses,
        Err(e) => return internal_error("Failed to load expenses", e),
    };

    if expenses.is_empty() {
        return error_response(StatusCode::NOT_FOUND, "No expenses to export");
    }

    match export_csv_string(&expenses) {
        Ok(csv) => {
            let filename = default_export_filename(today());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => internal_error("Failed to export CSV", e),
    }
}

// ============================================================================
// MAIN SERVER
// ============================================================================

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    println!("🌐 Spend Analyzer - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::var("SPEND_DB").unwrap_or_else(|_| "spend.db".to_string());
    let conn = spend_analyzer::open_database(std::path::Path::new(&db_path))
        .expect("Failed to open database");
    println!("✓ Database opened: {}", db_path);

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route(
            "/expenses",
            get(list_expenses).post(create_expense).delete(wipe_expenses),
        )
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .route("/summary", get(get_summary))
        .route("/breakdown", get(get_breakdown))
        .route("/daily", get(get_daily))
        .route("/charts/pie", get(chart_pie))
        .route("/charts/trend", get(chart_trend))
        .route("/categories", get(list_categories))
        .route("/categories/:name", get(expenses_for_category))
        .route("/export", get(export_expenses))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let addr = std::env::var("SPEND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://{}", addr);
    println!("   Try: http://{}/api/summary", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
