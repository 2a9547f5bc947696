use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::{Date, OffsetDateTime};
use tracing::instrument;

use crate::{
    auth::services::AdminUser,
    state::AppState,
    users::{dto::StatsResponse, repo as users_repo},
};

use super::dto::{
    AgeBucketCount, AgeDistributionResponse, GenderCount, GenderDemographicsResponse, GrowthPoint,
    UserGrowthResponse,
};
use super::repo;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/gender-demographics", get(gender_demographics))
        .route("/dashboard/user-growth", get(user_growth))
        .route("/dashboard/age-distribution", get(age_distribution))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Timeframe {
    /// The matching `date_trunc` field.
    fn unit(&self) -> &'static str {
        match self {
            Timeframe::Daily => "day",
            Timeframe::Weekly => "week",
            Timeframe::Monthly => "month",
            Timeframe::Yearly => "year",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
            Timeframe::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Timeframe {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            "yearly" => Ok(Timeframe::Yearly),
            _ => Err(()),
        }
    }
}

fn format_period(tf: Timeframe, period_start: OffsetDateTime) -> String {
    let date = period_start.date();
    match tf {
        Timeframe::Daily | Timeframe::Weekly => format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        ),
        Timeframe::Monthly => format!("{:04}-{:02}", date.year(), u8::from(date.month())),
        Timeframe::Yearly => format!("{:04}", date.year()),
    }
}

fn age_years(birthdate: Date, today: Date) -> i32 {
    let mut age = today.year() - birthdate.year();
    if (u8::from(today.month()), today.day()) < (u8::from(birthdate.month()), birthdate.day()) {
        age -= 1;
    }
    age
}

const AGE_BUCKETS: [&str; 6] = ["under-18", "18-24", "25-34", "35-44", "45-54", "55+"];

fn age_bucket(age: i32) -> &'static str {
    match age {
        i32::MIN..=17 => "under-18",
        18..=24 => "18-24",
        25..=34 => "25-34",
        35..=44 => "35-44",
        45..=54 => "45-54",
        _ => "55+",
    }
}

#[instrument(skip(state))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let counts = users_repo::count_stats(&state.db).await.map_err(internal)?;
    Ok(Json(counts.into()))
}

#[instrument(skip(state))]
pub async fn gender_demographics(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<GenderDemographicsResponse>, (StatusCode, String)> {
    let rows = repo::gender_counts(&state.db).await.map_err(internal)?;
    Ok(Json(GenderDemographicsResponse {
        gender_distribution: rows
            .into_iter()
            .map(|(gender, count)| GenderCount { gender, count })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct GrowthQuery {
    pub timeframe: Option<String>,
}

#[instrument(skip(state))]
pub async fn user_growth(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
    Query(q): Query<GrowthQuery>,
) -> Result<Json<UserGrowthResponse>, (StatusCode, String)> {
    let tf: Timeframe = q
        .timeframe
        .as_deref()
        .unwrap_or("monthly")
        .parse()
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "Timeframe must be one of daily, weekly, monthly, yearly".to_string(),
            )
        })?;

    let rows = repo::growth_counts(&state.db, tf.unit())
        .await
        .map_err(internal)?;
    Ok(Json(UserGrowthResponse {
        timeframe: tf.as_str().to_string(),
        growth_data: rows
            .into_iter()
            .map(|(period, count)| GrowthPoint {
                period: format_period(tf, period),
                count,
            })
            .collect(),
    }))
}

#[instrument(skip(state))]
pub async fn age_distribution(
    State(state): State<AppState>,
    AdminUser(_admin_id): AdminUser,
) -> Result<Json<AgeDistributionResponse>, (StatusCode, String)> {
    let birthdates = repo::birthdates(&state.db).await.map_err(internal)?;
    let today = OffsetDateTime::now_utc().date();

    let mut counts: HashMap<&'static str, i64> = HashMap::new();
    for birthdate in birthdates {
        *counts.entry(age_bucket(age_years(birthdate, today))).or_default() += 1;
    }

    let age_distribution = AGE_BUCKETS
        .iter()
        .map(|bucket| AgeBucketCount {
            age_range: bucket.to_string(),
            count: counts.get(bucket).copied().unwrap_or(0),
        })
        .collect();
    Ok(Json(AgeDistributionResponse { age_distribution }))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    tracing::error!(error = %e, "dashboard query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn timeframe_parses_known_values_only() {
        assert_eq!("daily".parse::<Timeframe>(), Ok(Timeframe::Daily));
        assert_eq!("yearly".parse::<Timeframe>(), Ok(Timeframe::Yearly));
        assert!("hourly".parse::<Timeframe>().is_err());
    }

    #[test]
    fn period_labels_follow_timeframe() {
        let start = datetime!(2026-08-03 00:00:00 UTC);
        assert_eq!(format_period(Timeframe::Daily, start), "2026-08-03");
        assert_eq!(format_period(Timeframe::Weekly, start), "2026-08-03");
        assert_eq!(format_period(Timeframe::Monthly, start), "2026-08");
        assert_eq!(format_period(Timeframe::Yearly, start), "2026");
    }

    #[test]
    fn age_counts_completed_years_only() {
        let today = date!(2026 - 08 - 06);
        assert_eq!(age_years(date!(2000 - 08 - 06), today), 26); // birthday today
        assert_eq!(age_years(date!(2000 - 08 - 07), today), 25); // birthday tomorrow
        assert_eq!(age_years(date!(2000 - 01 - 01), today), 26);
        assert_eq!(age_years(date!(2026 - 01 - 01), today), 0);
    }

    #[test]
    fn age_bucket_boundaries() {
        assert_eq!(age_bucket(17), "under-18");
        assert_eq!(age_bucket(18), "18-24");
        assert_eq!(age_bucket(24), "18-24");
        assert_eq!(age_bucket(25), "25-34");
        assert_eq!(age_bucket(54), "45-54");
        assert_eq!(age_bucket(55), "55+");
        assert_eq!(age_bucket(90), "55+");
    }

    #[test]
    fn buckets_cover_every_age_in_order() {
        for age in 0..120 {
            assert!(AGE_BUCKETS.contains(&age_bucket(age)));
        }
    }
}
