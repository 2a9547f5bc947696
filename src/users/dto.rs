use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::lifecycle::DeactivationType;
use super::repo::{User, UserCounts, UserRole, UserStatus};

/// User as returned to the console. Optional fields are always present as
/// null, timestamps are RFC 3339 strings.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: UserRole,
    pub profile_pic: Option<String>,
    pub birthdate: Option<Date>,
    pub gender: Option<String>,
    pub status: UserStatus,
    pub deactivation_type: Option<DeactivationType>,
    pub deactivation_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deactivation_end_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserOut {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            profile_pic: u.profile_pic,
            birthdate: u.birthdate,
            gender: u.gender,
            status: u.status,
            deactivation_type: u.deactivation_type,
            deactivation_reason: u.deactivation_reason,
            deactivation_end_date: u.deactivation_end_date,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub role: Option<String>,
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct DeactivateRequest {
    pub deactivation_type: String,
    pub duration: Option<String>,
    pub deactivation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: String,
    pub deactivation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleParams {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub user_ids: Vec<Uuid>,
    pub status: String,
    pub deactivation_reason: Option<String>,
}

/// Per-id outcome of a bulk update. Partial success is data, not an error.
#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub id: Uuid,
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkStatusResponse {
    pub modified_count: u64,
    pub status: UserStatus,
    pub results: Vec<BulkOutcome>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub reactivated_count: u64,
}

#[derive(Debug, Serialize)]
pub struct RoleCounts {
    pub admin: i64,
    pub user: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusCounts {
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_users: i64,
    pub by_role: RoleCounts,
    pub by_status: StatusCounts,
}

impl From<UserCounts> for StatsResponse {
    fn from(c: UserCounts) -> Self {
        Self {
            total_users: c.total,
            by_role: RoleCounts {
                admin: c.admins,
                user: c.users,
            },
            by_status: StatusCounts {
                active: c.active,
                inactive: c.inactive,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn active_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "admin@example.com".into(),
            password_hash: "secret".into(),
            first_name: None,
            last_name: None,
            role: UserRole::Admin,
            profile_pic: None,
            birthdate: None,
            gender: None,
            status: UserStatus::Active,
            deactivation_type: None,
            deactivation_reason: None,
            deactivation_end_date: None,
            created_at: datetime!(2026-01-15 10:00:00 UTC),
            updated_at: datetime!(2026-01-15 10:00:00 UTC),
        }
    }

    #[test]
    fn absent_optionals_serialize_as_null_not_omitted() {
        let out = UserOut::from(active_user());
        let json: serde_json::Value = serde_json::to_value(&out).unwrap();
        for field in [
            "first_name",
            "last_name",
            "profile_pic",
            "birthdate",
            "gender",
            "deactivation_type",
            "deactivation_reason",
            "deactivation_end_date",
        ] {
            assert!(json.get(field).is_some(), "{field} missing");
            assert!(json[field].is_null(), "{field} should be null");
        }
    }

    #[test]
    fn timestamps_serialize_rfc3339() {
        let mut user = active_user();
        user.deactivation_end_date = Some(datetime!(2026-02-01 00:30:00 UTC));
        let json: serde_json::Value = serde_json::to_value(UserOut::from(user)).unwrap();
        assert_eq!(json["created_at"], "2026-01-15T10:00:00Z");
        assert_eq!(json["deactivation_end_date"], "2026-02-01T00:30:00Z");
    }

    #[test]
    fn password_hash_never_serialized() {
        let json = serde_json::to_value(active_user()).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
