//! Admin-only endpoints: user management, broadcasts and reports.

use api_types::{
    notification::{Broadcast, BroadcastSent},
    report::{ReportQuery, ReportSummaryView},
    user::{UserAdminUpdate, UserView},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use engine::ReportRange;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list_users(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<Vec<UserView>>), ServerError> {
    let users = state.engine.list_users(user.id).await?;
    Ok((StatusCode::OK, Json(users.iter().map(views::user_view).collect())))
}

pub async fn update_user(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserAdminUpdate>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let change = engine::AccountUpdate {
        role: payload.role.map(views::role),
        active: payload.active,
    };
    let updated = state.engine.update_account(user.id, user_id, change).await?;
    Ok((StatusCode::OK, Json(views::user_view(&updated))))
}

pub async fn broadcast(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<Broadcast>,
) -> Result<(StatusCode, Json<BroadcastSent>), ServerError> {
    let sent = state
        .engine
        .broadcast(user.id, &payload.title, &payload.message, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(BroadcastSent { sent })))
}

pub async fn report_summary(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<(StatusCode, Json<ReportSummaryView>), ServerError> {
    let range = ReportRange::new(query.from, query.to)?;
    let summary = state.engine.report_summary(user.id, range).await?;
    Ok((StatusCode::OK, Json(views::report_view(range, summary))))
}

pub async fn export_bookings(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let range = ReportRange::new(query.from, query.to)?;
    let csv = state.engine.export_bookings_csv(user.id, range).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    ))
}
