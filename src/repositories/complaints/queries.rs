use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Complaint;
use crate::repositories::clamp_page;
use crate::db::types::{Category, ComplaintStatus, Urgency};

use super::types::{ComplaintFilter, ComplaintStats, COLUMNS};

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Complaint>, sqlx::Error> {
    sqlx::query_as::<_, Complaint>(&format!("SELECT {COLUMNS} FROM complaints WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &ComplaintFilter,
) -> Result<Vec<Complaint>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM complaints WHERE TRUE"));
    push_filters(&mut builder, filter);

    let (skip, limit) = clamp_page(filter.skip, filter.limit);
    builder.push(" ORDER BY created_at DESC OFFSET ");
    builder.push_bind(skip);
    builder.push(" LIMIT ");
    builder.push_bind(limit);

    builder.build_query_as::<Complaint>().fetch_all(pool).await
}

pub(crate) async fn count(pool: &PgPool, filter: &ComplaintFilter) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM complaints WHERE TRUE");
    push_filters(&mut builder, filter);

    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub(crate) async fn stats(pool: &PgPool) -> Result<ComplaintStats, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM complaints").fetch_one(pool).await?;

    let by_status = sqlx::query_as::<_, (ComplaintStatus, i64)>(
        "SELECT status, COUNT(*) FROM complaints GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await?;

    let by_urgency = sqlx::query_as::<_, (Urgency, i64)>(
        "SELECT urgency, COUNT(*) FROM complaints GROUP BY urgency ORDER BY urgency",
    )
    .fetch_all(pool)
    .await?;

    let by_category = sqlx::query_as::<_, (Category, i64)>(
        "SELECT category, COUNT(*) FROM complaints GROUP BY category ORDER BY category",
    )
    .fetch_all(pool)
    .await?;

    Ok(ComplaintStats { total, by_status, by_urgency, by_category })
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &ComplaintFilter) {
    if let Some(user_id) = &filter.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    if filter.active {
        builder.push(" AND status IN (");
        let mut statuses = builder.separated(", ");
        for status in ComplaintStatus::ACTIVE {
            statuses.push_bind(status);
        }
        statuses.push_unseparated(")");
    }
    if let Some(urgency) = filter.urgency {
        builder.push(" AND urgency = ");
        builder.push_bind(urgency);
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|value| !value.is_empty())
    {
        let pattern = like_pattern(search);
        for (index, column) in ["title", "description", "user_name", "user_room"].iter().enumerate() {
            builder.push(if index == 0 { " AND (" } else { " OR " });
            builder.push(*column);
            builder.push(" ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(r" ESCAPE '\'");
        }
        builder.push(")");
    }
}

/// Substring pattern with `%`, `_` and `\` in user input matched literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
