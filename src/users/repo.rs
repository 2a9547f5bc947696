use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::users::lifecycle::DeactivationType;

/// Account status. `Inactive` always comes with a deactivation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            _ => Err(()),
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub profile_pic: Option<String>,
    pub birthdate: Option<Date>,
    pub gender: Option<String>,
    pub status: UserStatus,
    pub deactivation_type: Option<DeactivationType>,
    pub deactivation_reason: Option<String>,
    pub deactivation_end_date: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, \
     profile_pic, birthdate, gender, status, deactivation_type, deactivation_reason, \
     deactivation_end_date, created_at, updated_at";

pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn create(
    db: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
    role: UserRole,
) -> anyhow::Result<User> {
    let sql = format!(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .bind(role.as_str())
        .fetch_one(db)
        .await?;
    Ok(user)
}

pub async fn list(
    db: &PgPool,
    role: Option<UserRole>,
    status: Option<UserStatus>,
    skip: i64,
    limit: i64,
) -> anyhow::Result<Vec<User>> {
    let sql = format!(
        r#"
        SELECT {USER_COLUMNS} FROM users
        WHERE ($1::text IS NULL OR role = $1::text)
          AND ($2::text IS NULL OR status = $2::text)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    );
    let users = sqlx::query_as::<_, User>(&sql)
        .bind(role.map(|r| r.as_str()))
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(skip)
        .fetch_all(db)
        .await?;
    Ok(users)
}

/// Counts by role and by status, in a single scan.
#[derive(Debug, Clone, Copy)]
pub struct UserCounts {
    pub total: i64,
    pub admins: i64,
    pub users: i64,
    pub active: i64,
    pub inactive: i64,
}

pub async fn count_stats(db: &PgPool) -> anyhow::Result<UserCounts> {
    let (total, admins, users, active, inactive) =
        sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE role = 'admin'),
                   COUNT(*) FILTER (WHERE role = 'user'),
                   COUNT(*) FILTER (WHERE status = 'active'),
                   COUNT(*) FILTER (WHERE status = 'inactive')
            FROM users
            "#,
        )
        .fetch_one(db)
        .await?;
    Ok(UserCounts {
        total,
        admins,
        users,
        active,
        inactive,
    })
}

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    first_name: Option<&str>,
    last_name: Option<&str>,
    birthdate: Option<Date>,
    gender: Option<&str>,
) -> anyhow::Result<Option<User>> {
    let sql = format!(
        r#"
        UPDATE users SET
            first_name = COALESCE($2, first_name),
            last_name  = COALESCE($3, last_name),
            birthdate  = COALESCE($4, birthdate),
            gender     = COALESCE($5, gender),
            updated_at = $6
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(first_name)
        .bind(last_name)
        .bind(birthdate)
        .bind(gender)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn set_profile_pic(
    db: &PgPool,
    id: Uuid,
    key: Option<&str>,
) -> anyhow::Result<Option<User>> {
    let sql = format!(
        r#"
        UPDATE users SET profile_pic = $2, updated_at = $3
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(key)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn set_role(db: &PgPool, id: Uuid, role: UserRole) -> anyhow::Result<Option<User>> {
    let sql = format!(
        r#"
        UPDATE users SET role = $2, updated_at = $3
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .bind(role.as_str())
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_role_parse_known_values_only() {
        assert_eq!("active".parse::<UserStatus>(), Ok(UserStatus::Active));
        assert_eq!("inactive".parse::<UserStatus>(), Ok(UserStatus::Inactive));
        assert!("pending".parse::<UserStatus>().is_err());
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("user".parse::<UserRole>(), Ok(UserRole::User));
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn status_and_role_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserStatus::Inactive).unwrap(),
            "\"inactive\""
        );
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
    }
}
