//! Transactional outbox. Emails describing a state change are inserted in the
//! same transaction as the change; a background worker delivers them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::Value;
use tokio::{task::JoinHandle, time::interval};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::outbox::{OutboxList, OutboxQuery, OutboxStatus},
    entity::outbox_events::{
        ActiveModel as OutboxActive, Column as OutboxCol, Entity as OutboxEvents,
        Model as OutboxModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::OutboxEvent,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::email::{Mailer, OutboxMessage},
    state::AppState,
};

pub const MAX_ATTEMPTS: i32 = 5;
const BATCH_SIZE: i64 = 20;
const BASE_DELAY_SECS: i64 = 30;
const MAX_DELAY_SECS: i64 = 3600;
const CLAIM_LEASE_SECS: f64 = 300.0;

#[derive(Debug, sqlx::FromRow)]
struct ClaimedEvent {
    id: Uuid,
    payload: Value,
    attempts: i32,
}

pub async fn enqueue<C: ConnectionTrait>(
    conn: &C,
    message: &OutboxMessage,
    idempotency_key: Option<String>,
) -> AppResult<Uuid> {
    let payload = serde_json::to_value(message).map_err(anyhow::Error::from)?;
    let now = Utc::now();
    let id = Uuid::new_v4();

    OutboxActive {
        id: Set(id),
        kind: Set(message.kind().to_string()),
        payload: Set(payload),
        idempotency_key: Set(idempotency_key),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now.into()),
        next_attempt_at: Set(now.into()),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(conn)
    .await?;

    tracing::debug!(%id, kind = message.kind(), "outbox event queued");
    Ok(id)
}

/// Delay before retry number `attempts`: 30s doubling, capped at one hour.
pub fn retry_delay(attempts: i32) -> chrono::Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
    let secs = BASE_DELAY_SECS.saturating_mul(1 << exponent).min(MAX_DELAY_SECS);
    chrono::Duration::seconds(secs)
}

/// Claim due events and try to deliver them. Claiming pushes
/// `next_attempt_at` out by a lease in one short transaction, so other
/// workers skip the batch; each send's outcome is then recorded on its own.
/// Returns the number of events handled.
#[tracing::instrument(skip_all)]
pub async fn process_due(pool: &DbPool, mailer: &Mailer, limit: i64) -> AppResult<usize> {
    let events: Vec<ClaimedEvent> = sqlx::query_as(
        r#"
        UPDATE outbox_events
        SET next_attempt_at = now() + make_interval(secs => $2)
        WHERE id IN (
            SELECT id
            FROM outbox_events
            WHERE processed_at IS NULL
              AND failed_at IS NULL
              AND next_attempt_at <= now()
            ORDER BY created_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
        )
        RETURNING id, payload, attempts
        "#,
    )
    .bind(limit)
    .bind(CLAIM_LEASE_SECS)
    .fetch_all(pool)
    .await?;

    let handled = events.len();
    for event in events {
        let outcome = deliver(mailer, &event.payload).await;
        if let Err(err) = record_outcome(pool, &event, outcome).await {
            // The lease expires and the event is retried.
            tracing::error!(id = %event.id, error = %err, "failed to record outbox outcome");
        }
    }

    Ok(handled)
}

async fn record_outcome(
    pool: &DbPool,
    event: &ClaimedEvent,
    outcome: anyhow::Result<()>,
) -> AppResult<()> {
    match outcome {
        Ok(()) => {
            sqlx::query(
                "UPDATE outbox_events SET processed_at = now(), last_error = NULL WHERE id = $1",
            )
            .bind(event.id)
            .execute(pool)
            .await?;
        }
        Err(err) => {
            let attempts = event.attempts + 1;
            let give_up = attempts >= MAX_ATTEMPTS;
            let next_attempt_at: DateTime<Utc> = Utc::now() + retry_delay(attempts);
            tracing::warn!(id = %event.id, attempts, give_up, error = %err, "outbox delivery failed");
            sqlx::query(
                r#"
                UPDATE outbox_events
                SET attempts = $2,
                    last_error = $3,
                    next_attempt_at = $4,
                    failed_at = CASE WHEN $5 THEN now() ELSE NULL END
                WHERE id = $1
                "#,
            )
            .bind(event.id)
            .bind(attempts)
            .bind(format!("{err:#}"))
            .bind(next_attempt_at)
            .bind(give_up)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

async fn deliver(mailer: &Mailer, payload: &Value) -> anyhow::Result<()> {
    let message: OutboxMessage = serde_json::from_value(payload.clone())?;
    let email = message.render()?;
    mailer.send(&email).await?;
    Ok(())
}

/// Start the polling worker. Without SMTP the worker is not started and
/// events stay pending until a configured instance picks them up.
pub fn spawn_worker(state: AppState) -> Option<JoinHandle<()>> {
    if !state.mailer.is_configured() {
        tracing::warn!("SMTP not configured; outbox worker not started");
        return None;
    }

    let period = Duration::from_secs(state.config.outbox_poll_seconds.max(1));
    Some(tokio::spawn(async move {
        let mut timer = interval(period);
        loop {
            timer.tick().await;
            match process_due(&state.pool, &state.mailer, BATCH_SIZE).await {
                Ok(0) => {}
                Ok(handled) => tracing::info!(handled, "outbox batch processed"),
                Err(err) => tracing::error!(error = %err, "outbox worker error"),
            }
        }
    }))
}

pub fn event_status(model: &OutboxModel) -> &'static str {
    if model.processed_at.is_some() {
        "processed"
    } else if model.failed_at.is_some() {
        "failed"
    } else {
        "pending"
    }
}

pub fn event_from_entity(model: OutboxModel) -> OutboxEvent {
    let status = event_status(&model).to_string();
    OutboxEvent {
        id: model.id,
        kind: model.kind,
        status,
        attempts: model.attempts,
        last_error: model.last_error,
        created_at: model.created_at.with_timezone(&Utc),
        next_attempt_at: model.next_attempt_at.with_timezone(&Utc),
        processed_at: model.processed_at.map(|t| t.with_timezone(&Utc)),
        failed_at: model.failed_at.map(|t| t.with_timezone(&Utc)),
    }
}

pub async fn list_events(
    state: &AppState,
    user: &AuthUser,
    query: OutboxQuery,
) -> AppResult<ApiResponse<OutboxList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = Pagination {
        page: query.page,
        per_page: query.per_page,
    }
    .normalize();

    let condition = match query.status {
        None => Condition::all(),
        Some(OutboxStatus::Processed) => Condition::all().add(OutboxCol::ProcessedAt.is_not_null()),
        Some(OutboxStatus::Failed) => Condition::all().add(OutboxCol::FailedAt.is_not_null()),
        Some(OutboxStatus::Pending) => Condition::all()
            .add(OutboxCol::ProcessedAt.is_null())
            .add(OutboxCol::FailedAt.is_null()),
    };

    let finder = OutboxEvents::find()
        .filter(condition)
        .order_by_desc(OutboxCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(event_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Outbox events",
        OutboxList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Put a failed or pending event back in the queue with a fresh attempt budget.
pub async fn retry_event(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OutboxEvent>> {
    ensure_admin(user)?;

    let event = OutboxEvents::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Outbox event not found".into()))?;

    if event.processed_at.is_some() {
        return Err(AppError::BadRequest("Event already processed".into()));
    }

    let mut active: OutboxActive = event.into();
    active.attempts = Set(0);
    active.failed_at = Set(None);
    active.next_attempt_at = Set(Utc::now().into());
    let event = active.update(&state.orm).await?;

    tracing::info!(%id, admin = %user.user_key, "outbox event requeued");
    Ok(ApiResponse::success(
        "Event requeued",
        event_from_entity(event),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_and_caps() {
        assert_eq!(retry_delay(1).num_seconds(), 30);
        assert_eq!(retry_delay(2).num_seconds(), 60);
        assert_eq!(retry_delay(4).num_seconds(), 240);
        assert_eq!(retry_delay(20).num_seconds(), 3600);
        assert_eq!(retry_delay(0).num_seconds(), 30);
    }

    #[test]
    fn status_is_derived_from_timestamps() {
        let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
        let mut model = OutboxModel {
            id: Uuid::new_v4(),
            kind: "back_in_stock".into(),
            payload: serde_json::json!({}),
            idempotency_key: None,
            attempts: 0,
            last_error: None,
            created_at: now,
            next_attempt_at: now,
            processed_at: None,
            failed_at: None,
        };
        assert_eq!(event_status(&model), "pending");
        model.failed_at = Some(now);
        assert_eq!(event_status(&model), "failed");
        model.processed_at = Some(now);
        assert_eq!(event_status(&model), "processed");
    }
}
