use std::future::Future;

use rand::Rng;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};

use crate::{
    entity::reserved_ids::{ActiveModel as ReservedActive, Entity as ReservedIds},
    error::{AppError, AppResult},
};

/// Identifier families, each with its own reservation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdCategory {
    Orders,
    Invoices,
    Returns,
    JobApplications,
}

impl IdCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdCategory::Orders => "ORD",
            IdCategory::Invoices => "INV",
            IdCategory::Returns => "RET",
            IdCategory::JobApplications => "JOB",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdCategory::Orders => "orders",
            IdCategory::Invoices => "invoices",
            IdCategory::Returns => "returns",
            IdCategory::JobApplications => "job_applications",
        }
    }
}

pub trait ReservationIndex {
    fn is_reserved(
        &self,
        category: IdCategory,
        id: &str,
    ) -> impl Future<Output = AppResult<bool>> + Send;
}

/// Reservation index backed by the `reserved_ids` table.
pub struct DbReservations<'a, C>(pub &'a C);

impl<C: ConnectionTrait> ReservationIndex for DbReservations<'_, C> {
    async fn is_reserved(&self, category: IdCategory, id: &str) -> AppResult<bool> {
        let found = ReservedIds::find_by_id((category.as_str().to_string(), id.to_string()))
            .one(self.0)
            .await?;
        Ok(found.is_some())
    }
}

/// Random `{prefix}{digits}` identifiers. After `attempts` collisions at the
/// primary width the candidates widen to `fallback_digits`; when that budget
/// is spent too, allocation fails.
#[derive(Debug, Clone, Copy)]
pub struct IdAllocator {
    pub digits: u32,
    pub attempts: u32,
    pub fallback_digits: u32,
    pub fallback_attempts: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            digits: 5,
            attempts: 8,
            fallback_digits: 8,
            fallback_attempts: 8,
        }
    }
}

impl IdAllocator {
    pub async fn generate<R: ReservationIndex>(
        &self,
        index: &R,
        category: IdCategory,
    ) -> AppResult<String> {
        let rounds = [
            (self.digits, self.attempts),
            (self.fallback_digits, self.fallback_attempts),
        ];
        for (digits, attempts) in rounds {
            for _ in 0..attempts {
                let candidate = candidate(category.prefix(), digits);
                if !index.is_reserved(category, &candidate).await? {
                    return Ok(candidate);
                }
                tracing::debug!(category = category.as_str(), %candidate, "id collision");
            }
            tracing::warn!(
                category = category.as_str(),
                digits,
                "id retry budget spent"
            );
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "identifier space exhausted for {}",
            category.as_str()
        )))
    }
}

fn candidate(prefix: &str, digits: u32) -> String {
    let upper = 10u64.pow(digits);
    let n: u64 = rand::rng().random_range(0..upper);
    format!("{prefix}{n:0width$}", width = digits as usize)
}

/// Record `id` as issued. Runs inside the caller's transaction.
pub async fn reserve<C: ConnectionTrait>(conn: &C, category: IdCategory, id: &str) -> AppResult<()> {
    ReservedActive {
        category: Set(category.as_str().to_string()),
        id: Set(id.to_string()),
        reserved_at: Set(chrono::Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}
