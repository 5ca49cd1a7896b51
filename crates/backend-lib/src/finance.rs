// ============================
// crates/backend-lib/src/finance.rs
// ============================
//! Per-match ledger, payment requests and the financial report.
//!
//! Amounts are integer minor units throughout; nothing here touches floats.
use std::collections::BTreeMap;

use chrono::Utc;
use matchday_common::requests::{CreateFinanceRequest, CreatePaymentRequest};
use matchday_common::{
    FinancialReport, LedgerKind, Match, MatchFinance, MatchId, NotificationKind, PaymentStatus,
    User, UserPayment,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::notifications;
use crate::storage::Storage;
use crate::validation::{validate_amount, validate_category, validate_text};

const MAX_LEDGER_DESCRIPTION: usize = 500;

async fn managed_match(
    storage: &dyn Storage,
    actor: &User,
    match_id: MatchId,
) -> Result<Match, AppError> {
    let m = storage
        .get_match(match_id)
        .await?
        .ok_or_else(|| AppError::not_found("match"))?;
    if m.created_by != actor.id && !actor.role.is_admin() {
        return Err(AppError::Forbidden(
            "only the creator or an admin may manage match finances".to_string(),
        ));
    }
    Ok(m)
}

pub async fn add_ledger_line(
    storage: &dyn Storage,
    author: &User,
    match_id: MatchId,
    request: CreateFinanceRequest,
) -> Result<MatchFinance, AppError> {
    managed_match(storage, author, match_id).await?;
    let amount = validate_amount(request.amount)?;
    let category = validate_category(&request.category)?.to_string();
    if let Some(description) = &request.description {
        validate_text("description", description, MAX_LEDGER_DESCRIPTION, true)?;
    }

    storage
        .insert_finance(MatchFinance {
            id: Uuid::new_v4(),
            match_id,
            kind: request.kind,
            category,
            description: request.description,
            amount,
            created_by: author.id,
            created_at: Utc::now(),
        })
        .await
}

pub async fn list_ledger(
    storage: &dyn Storage,
    match_id: MatchId,
) -> Result<Vec<MatchFinance>, AppError> {
    if storage.get_match(match_id).await?.is_none() {
        return Err(AppError::not_found("match"));
    }
    storage.list_finances_by_match(match_id).await
}

pub async fn request_payment(
    storage: &dyn Storage,
    author: &User,
    match_id: MatchId,
    request: CreatePaymentRequest,
) -> Result<UserPayment, AppError> {
    let m = managed_match(storage, author, match_id).await?;
    let amount = validate_amount(request.amount)?;
    if storage.get_user(request.user_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }

    let payment = storage
        .insert_payment(UserPayment {
            id: Uuid::new_v4(),
            match_id,
            user_id: request.user_id,
            amount,
            status: PaymentStatus::Pending,
            due_date: request.due_date,
            paid_at: None,
            created_at: Utc::now(),
        })
        .await?;

    notifications::notify(
        storage,
        payment.user_id,
        NotificationKind::PaymentDue,
        "Payment due",
        format!("You owe {} for \"{}\"", payment.amount, m.title),
        Some(payment.id),
    )
    .await;
    Ok(payment)
}

/// The caller's payments, with past-due pending ones reported as overdue
pub async fn payments_for_user(
    storage: &dyn Storage,
    user: &User,
) -> Result<Vec<UserPayment>, AppError> {
    let now = Utc::now();
    Ok(storage
        .list_payments_by_user(user.id)
        .await?
        .into_iter()
        .map(|mut payment| {
            payment.status = payment.effective_status(now);
            payment
        })
        .collect())
}

/// The creator or an admin may set any status; a payer may only settle
/// their own payment
pub async fn update_payment_status(
    storage: &dyn Storage,
    actor: &User,
    payment_id: Uuid,
    status: PaymentStatus,
) -> Result<UserPayment, AppError> {
    let mut payment = storage
        .get_payment(payment_id)
        .await?
        .ok_or_else(|| AppError::not_found("payment"))?;
    let m = storage
        .get_match(payment.match_id)
        .await?
        .ok_or_else(|| AppError::not_found("match"))?;

    let manager = m.created_by == actor.id || actor.role.is_admin();
    let settling_own = payment.user_id == actor.id && status == PaymentStatus::Paid;
    if !(manager || settling_own) {
        return Err(AppError::Forbidden(
            "not allowed to change this payment".to_string(),
        ));
    }

    payment.status = status;
    payment.paid_at = match status {
        PaymentStatus::Paid => Some(payment.paid_at.unwrap_or_else(Utc::now)),
        PaymentStatus::Pending | PaymentStatus::Overdue => None,
    };
    storage.update_payment(payment).await
}

pub async fn financial_report(
    storage: &dyn Storage,
    match_id: MatchId,
) -> Result<FinancialReport, AppError> {
    let lines = list_ledger(storage, match_id).await?;
    let payments = storage.list_payments_by_match(match_id).await?;
    Ok(build_report(match_id, &lines, &payments, Utc::now()))
}

/// Summarize ledger lines and payments. Per-category figures are net
/// (revenue minus expenses).
pub fn build_report(
    match_id: MatchId,
    lines: &[MatchFinance],
    payments: &[UserPayment],
    now: chrono::DateTime<Utc>,
) -> FinancialReport {
    let mut total_revenue = 0i64;
    let mut total_expenses = 0i64;
    let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
    for line in lines {
        let signed = match line.kind {
            LedgerKind::Revenue => {
                total_revenue += line.amount;
                line.amount
            },
            LedgerKind::Expense => {
                total_expenses += line.amount;
                -line.amount
            },
        };
        *by_category.entry(line.category.clone()).or_default() += signed;
    }

    let mut payments_expected = 0i64;
    let mut payments_collected = 0i64;
    let mut overdue_count = 0u32;
    for payment in payments {
        payments_expected += payment.amount;
        match payment.effective_status(now) {
            PaymentStatus::Paid => payments_collected += payment.amount,
            PaymentStatus::Overdue => overdue_count += 1,
            PaymentStatus::Pending => {},
        }
    }

    FinancialReport {
        match_id,
        total_revenue,
        total_expenses,
        balance: total_revenue - total_expenses,
        by_category,
        payments_expected,
        payments_collected,
        payments_outstanding: payments_expected - payments_collected,
        overdue_count,
    }
}
