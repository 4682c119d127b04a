//! Member directory models and lifecycle operations.
//!
//! Uniqueness of `phone` and `cid` is owned by the store: both columns carry
//! UNIQUE constraints, and the functions here translate a constraint
//! violation into the matching domain error instead of pre-checking. Two
//! writers racing on the same phone or cid therefore lose deterministically
//! at commit, never both.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;

/// `member_type` value that selects the short trial expiry window.
pub const TRIAL_MEMBER_TYPE: &str = "test";

const TRIAL_EXPIRY_DAYS: i64 = 3;
const STANDARD_EXPIRY_DAYS: i64 = 40;

/// Fixed page size for member listings.
pub const MEMBERS_PER_PAGE: i64 = 20;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors surfaced by the member lifecycle. All of them are recovered into
/// a client-visible response; none are fatal and nothing is retried.
#[derive(Debug, Error)]
pub enum MemberError {
    #[error("Phone number is already registered")]
    DuplicatePhone,
    #[error("CID is already registered")]
    DuplicateIdentityCode,
    #[error("Member not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub cid: String,
    /// ISO `YYYY-MM-DD`; never null.
    pub expire_date: String,
    pub amount: i64,
    pub recommender: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Member {
    /// A membership is active through its expiry date, with no grace period.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        NaiveDate::parse_from_str(&self.expire_date, DATE_FORMAT)
            .map(|d| d >= today)
            .unwrap_or(false)
    }
}

/// Create inputs. Missing fields deserialize to their defaults and are
/// rejected by the field validators, so the caller always sees a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemberRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub member_type: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub recommender: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub cid: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub recommender: Option<String>,
    /// Optional ISO `YYYY-MM-DD` override; the stored date is kept when absent.
    #[serde(default)]
    pub expire_date: Option<String>,
}

/// Query parameters for listing members
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemberListQuery {
    /// Substring filter across name, phone, and recommender
    pub search: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<i64>,
}

/// Response for listing members with pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberListResponse {
    pub items: Vec<Member>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

/// Dashboard aggregates over the full member set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberStats {
    pub active_count: i64,
    pub expired_count: i64,
    pub total_amount: i64,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Expiry assigned at creation: trial memberships get the short window,
/// every other kind the standard one.
pub fn expire_date_for(member_type: &str, from: NaiveDate) -> NaiveDate {
    let days = if member_type == TRIAL_MEMBER_TYPE {
        TRIAL_EXPIRY_DAYS
    } else {
        STANDARD_EXPIRY_DAYS
    };
    from + Duration::days(days)
}

/// Map a storage-level UNIQUE violation onto the duplicate it represents.
fn translate_unique(err: sqlx::Error) -> MemberError {
    if let sqlx::Error::Database(db_err) = &err {
        let msg = db_err.message();
        if msg.contains("UNIQUE constraint failed: members.phone") {
            return MemberError::DuplicatePhone;
        }
        if msg.contains("UNIQUE constraint failed: members.cid") {
            return MemberError::DuplicateIdentityCode;
        }
    }
    MemberError::Database(err)
}

pub async fn get_member(db: &SqlitePool, id: i64) -> Result<Member, MemberError> {
    sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(MemberError::NotFound)
}

/// Insert a new member with a derived expiry date. The single INSERT is the
/// consistency boundary: either the full row commits or nothing does.
pub async fn create_member(
    db: &SqlitePool,
    req: &CreateMemberRequest,
) -> Result<Member, MemberError> {
    if req.amount < 0 {
        return Err(MemberError::Validation(
            "Amount must not be negative".to_string(),
        ));
    }

    let expire_date = expire_date_for(&req.member_type, today())
        .format(DATE_FORMAT)
        .to_string();
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO members (name, phone, cid, expire_date, amount, recommender, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&req.name)
    .bind(&req.phone)
    .bind(&req.cid)
    .bind(&expire_date)
    .bind(req.amount)
    .bind(&req.recommender)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await
    .map_err(translate_unique)?;

    let id = result.last_insert_rowid();
    tracing::debug!(member_id = id, "Member created");

    get_member(db, id).await
}

/// Replace all mutable fields of an existing member. A failed update leaves
/// the stored row untouched; an UPDATE never conflicts with the row it
/// targets, so keeping one's own phone or cid is always allowed.
pub async fn update_member(
    db: &SqlitePool,
    id: i64,
    req: &UpdateMemberRequest,
) -> Result<Member, MemberError> {
    if req.amount < 0 {
        return Err(MemberError::Validation(
            "Amount must not be negative".to_string(),
        ));
    }

    // Parse the override up front so a malformed date cannot half-apply.
    let expire_override = match req.expire_date.as_deref() {
        Some(s) if !s.is_empty() => Some(
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map_err(|_| MemberError::Validation(format!("Invalid expire date: {}", s)))?
                .format(DATE_FORMAT)
                .to_string(),
        ),
        _ => None,
    };

    get_member(db, id).await?;

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        UPDATE members SET
            name = ?,
            phone = ?,
            cid = ?,
            amount = ?,
            recommender = ?,
            expire_date = COALESCE(?, expire_date),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.phone)
    .bind(&req.cid)
    .bind(req.amount)
    .bind(&req.recommender)
    .bind(&expire_override)
    .bind(&now)
    .bind(id)
    .execute(db)
    .await
    .map_err(translate_unique)?;

    get_member(db, id).await
}

/// Hard delete. No cascading relations exist on members.
pub async fn delete_member(db: &SqlitePool, id: i64) -> Result<(), MemberError> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(MemberError::NotFound);
    }

    tracing::debug!(member_id = id, "Member deleted");
    Ok(())
}

/// List members, newest first. A non-empty search term substring-matches
/// name, phone, or recommender; matching is case-insensitive for ASCII
/// (SQLite LIKE collation). Pages past the end come back empty.
pub async fn list_members(
    db: &SqlitePool,
    query: &MemberListQuery,
) -> Result<MemberListResponse, MemberError> {
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * MEMBERS_PER_PAGE;

    let search = query.search.as_deref().unwrap_or("").trim().to_string();
    let (where_clause, pattern) = if search.is_empty() {
        ("", None)
    } else {
        (
            "WHERE name LIKE ? OR phone LIKE ? OR recommender LIKE ?",
            Some(format!("%{}%", search)),
        )
    };

    let count_sql = format!("SELECT COUNT(*) FROM members {}", where_clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(p) = &pattern {
        count_query = count_query.bind(p).bind(p).bind(p);
    }
    let total = count_query.fetch_one(db).await?;

    // id breaks ties between rows created within the same timestamp tick
    let sql = format!(
        "SELECT * FROM members {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut rows = sqlx::query_as::<_, Member>(&sql);
    if let Some(p) = &pattern {
        rows = rows.bind(p).bind(p).bind(p);
    }
    let items = rows
        .bind(MEMBERS_PER_PAGE)
        .bind(offset)
        .fetch_all(db)
        .await?;

    let total_pages = (total as f64 / MEMBERS_PER_PAGE as f64).ceil() as i64;

    Ok(MemberListResponse {
        items,
        total,
        page,
        per_page: MEMBERS_PER_PAGE,
        total_pages,
    })
}

/// Dashboard aggregates. The three queries run without an enclosing
/// transaction, so a write racing this call can make the counts straddle
/// two snapshots. Acceptable for a dashboard read.
pub async fn member_stats(db: &SqlitePool) -> Result<MemberStats, MemberError> {
    let today = today().format(DATE_FORMAT).to_string();

    let active_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members WHERE expire_date >= ?")
            .bind(&today)
            .fetch_one(db)
            .await?;

    let expired_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members WHERE expire_date < ?")
            .bind(&today)
            .fetch_one(db)
            .await?;

    let total_amount =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(amount), 0) FROM members")
            .fetch_one(db)
            .await?;

    Ok(MemberStats {
        active_count,
        expired_count,
        total_amount,
    })
}
