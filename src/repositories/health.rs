use sqlx::PgPool;

/// Probes the connection and the complaints table in one round trip.
pub(crate) async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1 FROM complaints LIMIT 1").fetch_optional(pool).await?;
    Ok(())
}
