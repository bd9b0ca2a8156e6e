//! Query-data and query-menu handlers

use axum::extract::Extension;
use axum::Json;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::aggregator::{
    available_filters, build_menu, merge_menus, prune_empty_columns, GlobalFilterValues,
};
use super::models::{IndicatorRecord, Sector, FILTERABLE_COLUMNS};
use crate::common::{ApiError, ApiJson, AppState};

const INVALID_SECTOR_MSG: &str =
    "Invalid sector. Supported sectors: Education, Agriculture, Economic";

/// POST /api/query-data
/// Filters one sector table and returns matching records together with
/// the available-filter map
///
/// # Request Body
/// ```json
/// {
///   "sector": "Education",
///   "subsector_1": "Primary",
///   "year": "2020"
/// }
/// ```
pub async fn query_data(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    ApiJson(body): ApiJson<Map<String, Value>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let sector = body
        .get("sector")
        .and_then(|v| v.as_str())
        .and_then(Sector::from_name)
        .ok_or_else(|| ApiError::BadRequest(INVALID_SECTOR_MSG.to_string()))?;

    // Equality filters: every provided key except the sector selector and
    // the opaque blob column, empty values skipped
    let mut applied_filters: Vec<(&str, &Value)> = Vec::new();
    for (key, value) in &body {
        if key == "sector" || key == "filters" {
            continue;
        }
        if value.is_null() || value.as_str().map(str::is_empty).unwrap_or(false) {
            continue;
        }
        if !FILTERABLE_COLUMNS.contains(&key.as_str()) {
            warn!(column = %key, "Rejected unknown filter column");
            return Err(ApiError::BadRequest(format!(
                "Unknown filter column: {}",
                key
            )));
        }
        applied_filters.push((key.as_str(), value));
    }

    let table = sector.table();
    let mut query = sqlx::QueryBuilder::new(format!("SELECT * FROM {} WHERE 1=1", table));
    for (column, value) in &applied_filters {
        query.push(format!(" AND {} = ", column));
        match value {
            Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    query.push_bind(f);
                }
            }
            other => {
                query.push_bind(other.as_str().unwrap_or_default().to_string());
            }
        }
    }

    let rows: Vec<IndicatorRecord> = query
        .build_query_as()
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    debug!(table = %table, matched = rows.len(), "Query-data scan complete");

    if rows.is_empty() {
        return Err(ApiError::NotFound(
            "No data found matching the criteria.".to_string(),
        ));
    }

    let mut records: Vec<Map<String, Value>> = rows.iter().map(|r| r.expand()).collect();
    prune_empty_columns(&mut records);

    // Table-wide distinct scans for the pinned filter keys; subsector_2 is
    // restricted to the currently selected subsector_1
    let selected_subsector = body.get("subsector_1").and_then(|v| v.as_str());
    let global = GlobalFilterValues {
        sector: distinct_column(&state.db, table, "sector", None).await?,
        series_name: distinct_column(&state.db, table, "series_name", None).await?,
        subsector_1: distinct_column(&state.db, table, "subsector_1", None).await?,
        subsector_2: distinct_column(&state.db, table, "subsector_2", selected_subsector).await?,
    };

    let filters = available_filters(&records, &global);

    Ok(Json(serde_json::json!({
        "data": records,
        "filters": filters,
    })))
}

/// GET /api/query-menu
/// Builds the hierarchical navigation menu and flat data-explorer list
/// across all three sector tables
pub async fn query_menu(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let mut parts = Vec::new();
    for sector in Sector::all() {
        parts.push(sector_menu(&state.db, sector).await?);
    }

    let (menu, data_explorer) = merge_menus(parts);

    info!(
        sectors = menu.len(),
        series = data_explorer.len(),
        "Aggregated menu built"
    );

    Ok(Json(serde_json::json!({
        "menu": menu,
        "data_explorer": data_explorer,
    })))
}

/// The three distinct scans for one sector table, fed to the menu builder
async fn sector_menu(
    db: &SqlitePool,
    sector: Sector,
) -> Result<(super::models::Menu, Vec<super::models::SeriesEntry>), ApiError> {
    let table = sector.table();

    let sectors: Vec<(String,)> = sqlx::query_as(&format!(
        "SELECT DISTINCT sector FROM {} WHERE sector IS NOT NULL AND sector != ''",
        table
    ))
    .fetch_all(db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let sector_subsectors: Vec<(String, String)> = sqlx::query_as(&format!(
        "SELECT DISTINCT sector, subsector_1 FROM {} \
         WHERE sector IS NOT NULL AND sector != '' \
         AND subsector_1 IS NOT NULL AND subsector_1 != ''",
        table
    ))
    .fetch_all(db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let subsector_series: Vec<(String, String)> = sqlx::query_as(&format!(
        "SELECT DISTINCT subsector_1, series_name FROM {} \
         WHERE subsector_1 IS NOT NULL AND subsector_1 != '' \
         AND series_name IS NOT NULL AND series_name != ''",
        table
    ))
    .fetch_all(db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let sectors: Vec<String> = sectors.into_iter().map(|(s,)| s).collect();

    Ok(build_menu(&sectors, &sector_subsectors, &subsector_series))
}

/// Distinct non-empty values of one column, optionally restricted to rows
/// matching a subsector_1 selection
async fn distinct_column(
    db: &SqlitePool,
    table: &str,
    column: &str,
    subsector_1: Option<&str>,
) -> Result<Vec<String>, ApiError> {
    let values: Vec<(String,)> = match subsector_1 {
        Some(selected) => sqlx::query_as(&format!(
            "SELECT DISTINCT {col} FROM {table} \
             WHERE {col} IS NOT NULL AND {col} != '' AND subsector_1 = ?",
            col = column,
            table = table
        ))
        .bind(selected)
        .fetch_all(db)
        .await
        .map_err(ApiError::DatabaseError)?,
        None => sqlx::query_as(&format!(
            "SELECT DISTINCT {col} FROM {table} WHERE {col} IS NOT NULL AND {col} != ''",
            col = column,
            table = table
        ))
        .fetch_all(db)
        .await
        .map_err(ApiError::DatabaseError)?,
    };

    Ok(values.into_iter().map(|(v,)| v).collect())
}
