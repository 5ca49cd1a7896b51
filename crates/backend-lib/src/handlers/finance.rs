//! Ledger, payments and the financial report.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use matchday_common::requests::{
    CreateFinanceRequest, CreatePaymentRequest, UpdatePaymentRequest,
};
use matchday_common::{FinancialReport, MatchFinance, MatchId, UserPayment};
use uuid::Uuid;

use super::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::{finance, AppState};

pub async fn list_finances(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<MatchFinance>>, AppError> {
    Ok(Json(
        finance::list_ledger(state.storage.as_ref(), match_id).await?,
    ))
}

pub async fn add_finance(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<CreateFinanceRequest>,
) -> Result<(StatusCode, Json<MatchFinance>), AppError> {
    let line =
        finance::add_ledger_line(state.storage.as_ref(), &current.user, match_id, request).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

pub async fn financial_report(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<FinancialReport>, AppError> {
    Ok(Json(
        finance::financial_report(state.storage.as_ref(), match_id).await?,
    ))
}

pub async fn request_payment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<UserPayment>), AppError> {
    let payment =
        finance::request_payment(state.storage.as_ref(), &current.user, match_id, request).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(payment_id): Path<Uuid>,
    ApiJson(request): ApiJson<UpdatePaymentRequest>,
) -> Result<Json<UserPayment>, AppError> {
    Ok(Json(
        finance::update_payment_status(
            state.storage.as_ref(),
            &current.user,
            payment_id,
            request.status,
        )
        .await?,
    ))
}
