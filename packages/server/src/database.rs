use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use tracing::info;

use crate::entity::{category, comment, genre, review, title, title_genre, user};

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    create_schema(&db).await?;

    Ok(db)
}

/// Create every table (parents before children) and the unique indexes that
/// cannot be declared on a single column.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, user::Entity).await?;
    create_table(db, category::Entity).await?;
    create_table(db, genre::Entity).await?;
    create_table(db, title::Entity).await?;
    create_table(db, title_genre::Entity).await?;
    create_table(db, review::Entity).await?;
    create_table(db, comment::Entity).await?;

    // The authoritative guard against duplicate reviews, including racing inserts.
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_review_author_title")
        .table(review::Entity)
        .col(review::Column::AuthorId)
        .col(review::Column::TitleId)
        .to_owned();
    let backend = db.get_database_backend();
    db.execute_raw(backend.build(&stmt)).await?;

    info!("Database schema is up to date");
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute_raw(backend.build(&stmt)).await?;
    Ok(())
}
