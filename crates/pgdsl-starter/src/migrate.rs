//! Embedded schema migrations, applied with [`refinery`].

use pgdsl::{OrmError, OrmResult};
use refinery::Report;

mod embedded {
    refinery::embed_migrations!("migrations");
}

fn migration_error(err: refinery::Error) -> OrmError {
    OrmError::Other(format!("migration failed: {err}"))
}

/// Apply every pending migration on `client`.
pub async fn run(client: &mut tokio_postgres::Client) -> OrmResult<Report> {
    let report = embedded::migrations::runner()
        .run_async(client)
        .await
        .map_err(migration_error)?;
    for migration in report.applied_migrations() {
        tracing::info!(
            target: "pgdsl.migrate",
            version = migration.version(),
            name = migration.name(),
            "applied migration"
        );
    }
    Ok(report)
}

/// Pool variant of [`run`].
pub async fn run_pool(pool: &deadpool_postgres::Pool) -> OrmResult<Report> {
    let mut client = pool.get().await?;
    run(&mut client).await
}

#[cfg(test)]
mod tests {
    #[test]
    fn embeds_the_schema_migration() {
        let runner = super::embedded::migrations::runner();
        let versions: Vec<_> = runner
            .get_migrations()
            .iter()
            .map(|m| (m.version(), m.name().to_string()))
            .collect();
        assert_eq!(versions, vec![(1, "create_schema".to_string())]);
    }
}
