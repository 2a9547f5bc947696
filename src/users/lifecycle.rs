//! Account activation state machine.
//!
//! An account is either active, permanently deactivated, or temporarily
//! deactivated with an expiry. Expired temporary deactivations are lifted by
//! [`sweep`], which the background [`Sweeper`] runs on an interval and the
//! admin API can trigger manually.
//!
//! [`Sweeper`]: crate::sweeper::Sweeper

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::repo::{User, USER_COLUMNS};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum DeactivationType {
    Permanent,
    Temporary,
}

impl DeactivationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeactivationType::Permanent => "permanent",
            DeactivationType::Temporary => "temporary",
        }
    }
}

impl std::str::FromStr for DeactivationType {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permanent" => Ok(DeactivationType::Permanent),
            "temporary" => Ok(DeactivationType::Temporary),
            other => Err(LifecycleError::InvalidArgument(format!(
                "deactivation_type must be 'permanent' or 'temporary', got '{other}'"
            ))),
        }
    }
}

/// Fixed deactivation durations. A month is 30 days and a year 365, not
/// calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationPeriod {
    OneDay,
    OneWeek,
    OneMonth,
    OneYear,
}

impl DeactivationPeriod {
    pub fn length(&self) -> Duration {
        match self {
            DeactivationPeriod::OneDay => Duration::days(1),
            DeactivationPeriod::OneWeek => Duration::days(7),
            DeactivationPeriod::OneMonth => Duration::days(30),
            DeactivationPeriod::OneYear => Duration::days(365),
        }
    }
}

impl std::str::FromStr for DeactivationPeriod {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1day" => Ok(DeactivationPeriod::OneDay),
            "1week" => Ok(DeactivationPeriod::OneWeek),
            "1month" => Ok(DeactivationPeriod::OneMonth),
            "1year" => Ok(DeactivationPeriod::OneYear),
            other => Err(LifecycleError::InvalidArgument(format!(
                "duration must be one of 1day, 1week, 1month, 1year, got '{other}'"
            ))),
        }
    }
}

/// Validated inputs for a deactivation, computed before any store write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivationPlan {
    pub deactivation_type: DeactivationType,
    pub reason: Option<String>,
    pub end_date: Option<OffsetDateTime>,
}

/// Parses and validates the raw request fields.
///
/// A temporary deactivation requires a recognized duration and gets
/// `end_date = now + duration`, recomputed on every call. A permanent one
/// carries no end date.
pub fn plan_deactivation(
    kind: &str,
    duration: Option<&str>,
    reason: Option<&str>,
    now: OffsetDateTime,
) -> Result<DeactivationPlan, LifecycleError> {
    let deactivation_type: DeactivationType = kind.parse()?;
    let end_date = match deactivation_type {
        DeactivationType::Permanent => None,
        DeactivationType::Temporary => {
            let period: DeactivationPeriod = duration
                .ok_or_else(|| {
                    LifecycleError::InvalidArgument(
                        "duration is required for temporary deactivation".into(),
                    )
                })?
                .parse()?;
            Some(now + period.length())
        }
    };
    Ok(DeactivationPlan {
        deactivation_type,
        reason: reason.map(str::to_owned),
        end_date,
    })
}

pub async fn deactivate(
    db: &PgPool,
    id: Uuid,
    plan: &DeactivationPlan,
) -> Result<User, LifecycleError> {
    let sql = format!(
        r#"
        UPDATE users SET
            status = 'inactive',
            deactivation_type = $2,
            deactivation_reason = $3,
            deactivation_end_date = $4,
            updated_at = $5
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(plan.deactivation_type.as_str())
        .bind(plan.reason.as_deref())
        .bind(plan.end_date)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(db)
        .await?;
    user.ok_or(LifecycleError::NotFound)
}

/// Unconditionally reactivates, clearing all deactivation fields.
pub async fn activate(db: &PgPool, id: Uuid) -> Result<User, LifecycleError> {
    let sql = format!(
        r#"
        UPDATE users SET
            status = 'active',
            deactivation_type = NULL,
            deactivation_reason = NULL,
            deactivation_end_date = NULL,
            updated_at = $2
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(db)
        .await?;
    user.ok_or(LifecycleError::NotFound)
}

/// Reactivates every account whose temporary deactivation has expired by
/// `now`; returns the number of rows changed.
///
/// The expiry predicate is evaluated inside the UPDATE itself, so a
/// deactivation refreshed to a later end date between our read and write
/// keeps its new expiry. Rows change independently; there is no
/// all-or-nothing guarantee across the batch.
pub async fn sweep(db: &PgPool, now: OffsetDateTime) -> Result<u64, LifecycleError> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            status = 'active',
            deactivation_type = NULL,
            deactivation_reason = NULL,
            deactivation_end_date = NULL,
            updated_at = $1
        WHERE status = 'inactive'
          AND deactivation_type = 'temporary'
          AND deactivation_end_date <= $1
        "#,
    )
    .bind(now)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn periods_parse_and_have_fixed_lengths() {
        assert_eq!(
            "1day".parse::<DeactivationPeriod>().unwrap().length(),
            Duration::days(1)
        );
        assert_eq!(
            "1week".parse::<DeactivationPeriod>().unwrap().length(),
            Duration::days(7)
        );
        assert_eq!(
            "1month".parse::<DeactivationPeriod>().unwrap().length(),
            Duration::days(30)
        );
        assert_eq!(
            "1year".parse::<DeactivationPeriod>().unwrap().length(),
            Duration::days(365)
        );
    }

    #[test]
    fn unknown_period_is_rejected() {
        let err = "2weeks".parse::<DeactivationPeriod>().unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidArgument(_)));
    }

    #[test]
    fn plan_temporary_computes_exact_end_date() {
        let now = datetime!(2026-03-01 12:00:00 UTC);
        let plan = plan_deactivation("temporary", Some("1week"), Some("vacation"), now).unwrap();
        assert_eq!(plan.deactivation_type, DeactivationType::Temporary);
        assert_eq!(plan.end_date, Some(now + Duration::days(7)));
        assert_eq!(plan.reason.as_deref(), Some("vacation"));
    }

    #[test]
    fn plan_one_day_is_exactly_24_hours() {
        let now = datetime!(2026-02-28 23:30:00 UTC);
        let plan = plan_deactivation("temporary", Some("1day"), None, now).unwrap();
        assert_eq!(plan.end_date, Some(datetime!(2026-03-01 23:30:00 UTC)));
    }

    #[test]
    fn plan_permanent_has_no_end_date() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let plan = plan_deactivation("permanent", None, Some("ban"), now).unwrap();
        assert_eq!(plan.deactivation_type, DeactivationType::Permanent);
        assert_eq!(plan.end_date, None);
    }

    #[test]
    fn plan_permanent_ignores_duration() {
        let now = OffsetDateTime::UNIX_EPOCH;
        let plan = plan_deactivation("permanent", Some("1day"), None, now).unwrap();
        assert_eq!(plan.end_date, None);
    }

    #[test]
    fn plan_rejects_unknown_type() {
        let err = plan_deactivation("temp", None, None, OffsetDateTime::UNIX_EPOCH).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidArgument(_)));
        assert!(err.to_string().contains("temp"));
    }

    #[test]
    fn plan_rejects_temporary_without_duration() {
        let err =
            plan_deactivation("temporary", None, None, OffsetDateTime::UNIX_EPOCH).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidArgument(_)));
        assert!(err.to_string().contains("duration"));
    }

    #[test]
    fn deactivation_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeactivationType::Temporary).unwrap(),
            "\"temporary\""
        );
        assert_eq!(
            serde_json::to_string(&DeactivationType::Permanent).unwrap(),
            "\"permanent\""
        );
    }
}
