use sqlx::PgPool;
use time::{Date, OffsetDateTime};

pub async fn gender_counts(db: &PgPool) -> anyhow::Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT COALESCE(gender, 'unspecified'), COUNT(*)
        FROM users
        GROUP BY 1
        ORDER BY 2 DESC, 1
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// New registrations per period; `unit` is a `date_trunc` field name.
pub async fn growth_counts(db: &PgPool, unit: &str) -> anyhow::Result<Vec<(OffsetDateTime, i64)>> {
    let rows = sqlx::query_as::<_, (OffsetDateTime, i64)>(
        r#"
        SELECT date_trunc($1::text, created_at) AS period, COUNT(*)
        FROM users
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(unit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn birthdates(db: &PgPool) -> anyhow::Result<Vec<Date>> {
    let rows = sqlx::query_scalar::<_, Date>(
        "SELECT birthdate FROM users WHERE birthdate IS NOT NULL",
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
