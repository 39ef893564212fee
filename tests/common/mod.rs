use std::sync::Arc;

use axum::Router;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};
use uuid::Uuid;

use usersearch::auth::AllowAll;
use usersearch::entities::{group, group_membership, user, user_attribute};
use usersearch::routes::{AppState, router};

/// Fresh in-memory database with the search schema in place. Migrations are
/// out of scope for the engine, so the tables are created directly.
#[allow(dead_code)]
pub async fn setup_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// A connection with no schema at all — used to prove that rejected input
/// never reaches the store (any issued query would fail loudly).
#[allow(dead_code)]
pub async fn setup_empty_db() -> Result<DatabaseConnection, DbErr> {
    Database::connect("sqlite::memory:").await
}

async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared(
        "CREATE TABLE users (
            id uuid NOT NULL PRIMARY KEY,
            realm_id varchar NOT NULL,
            username varchar NOT NULL,
            email varchar NULL,
            first_name varchar NULL,
            last_name varchar NULL,
            email_verified boolean NOT NULL,
            enabled boolean NOT NULL,
            created_timestamp bigint NOT NULL,
            service_account_client_link varchar NULL
        )",
    )
    .await?;
    db.execute_unprepared(
        "CREATE TABLE user_attributes (
            id uuid NOT NULL PRIMARY KEY,
            user_id uuid NOT NULL,
            name varchar NOT NULL,
            value varchar NOT NULL
        )",
    )
    .await?;
    db.execute_unprepared(
        r#"CREATE TABLE "groups" (
            id uuid NOT NULL PRIMARY KEY,
            realm_id varchar NOT NULL,
            parent_id uuid NULL,
            name varchar NOT NULL
        )"#,
    )
    .await?;
    db.execute_unprepared(
        "CREATE TABLE user_group_memberships (
            user_id uuid NOT NULL,
            group_id uuid NOT NULL,
            PRIMARY KEY (user_id, group_id)
        )",
    )
    .await?;
    Ok(())
}

#[allow(dead_code)]
pub fn setup_app(db: DatabaseConnection) -> Router {
    router(AppState::new(db, Arc::new(AllowAll)))
}

#[allow(dead_code)]
pub async fn seed_user(
    db: &DatabaseConnection,
    realm: &str,
    username: &str,
    created_timestamp: i64,
) -> Uuid {
    seed_user_full(db, realm, username, None, true, created_timestamp, None).await
}

#[allow(dead_code)]
pub async fn seed_user_full(
    db: &DatabaseConnection,
    realm: &str,
    username: &str,
    email: Option<&str>,
    enabled: bool,
    created_timestamp: i64,
    service_account_client_link: Option<&str>,
) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        realm_id: Set(realm.to_owned()),
        username: Set(username.to_owned()),
        email: Set(email.map(str::to_owned)),
        first_name: Set(None),
        last_name: Set(None),
        email_verified: Set(false),
        enabled: Set(enabled),
        created_timestamp: Set(created_timestamp),
        service_account_client_link: Set(service_account_client_link.map(str::to_owned)),
    }
    .insert(db)
    .await
    .expect("failed to insert user");
    id
}

#[allow(dead_code)]
pub async fn seed_attribute(db: &DatabaseConnection, user_id: Uuid, name: &str, value: &str) {
    user_attribute::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_owned()),
        value: Set(value.to_owned()),
    }
    .insert(db)
    .await
    .expect("failed to insert attribute");
}

#[allow(dead_code)]
pub async fn seed_group(
    db: &DatabaseConnection,
    realm: &str,
    parent_id: Option<Uuid>,
    name: &str,
) -> Uuid {
    let id = Uuid::new_v4();
    group::ActiveModel {
        id: Set(id),
        realm_id: Set(realm.to_owned()),
        parent_id: Set(parent_id),
        name: Set(name.to_owned()),
    }
    .insert(db)
    .await
    .expect("failed to insert group");
    id
}

#[allow(dead_code)]
pub async fn seed_membership(db: &DatabaseConnection, user_id: Uuid, group_id: Uuid) {
    group_membership::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(group_id),
    }
    .insert(db)
    .await
    .expect("failed to insert membership");
}
