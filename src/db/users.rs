use sqlx::SqlitePool;

use super::{new_id, AuthWith, User};

const USER_COLUMNS: &str = "id,name,email,password_hash,auth_with,google_id";

pub async fn create_local(
    db_pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: new_id(),
        name: name.to_owned(),
        email: email.to_owned(),
        password_hash: Some(password_hash.to_owned()),
        auth_with: AuthWith::Local,
        google_id: None,
    };
    insert(db_pool, &user).await?;
    Ok(user)
}

pub async fn create_google(
    db_pool: &SqlitePool,
    google_id: &str,
    name: &str,
    email: &str,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: new_id(),
        name: name.to_owned(),
        email: email.to_owned(),
        password_hash: None,
        auth_with: AuthWith::Google,
        google_id: Some(google_id.to_owned()),
    };
    insert(db_pool, &user).await?;
    Ok(user)
}

async fn insert(db_pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id,name,email,password_hash,auth_with,google_id) VALUES (?,?,?,?,?,?)")
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.auth_with)
        .bind(&user.google_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn find_by_id(db_pool: &SqlitePool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?"))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_local_by_email(db_pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE auth_with='local' AND email=?"))
        .bind(email)
        .fetch_optional(db_pool)
        .await
}

pub async fn find_by_google_id(db_pool: &SqlitePool, google_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE auth_with='google' AND google_id=?"))
        .bind(google_id)
        .fetch_optional(db_pool)
        .await
}

pub async fn set_name(db_pool: &SqlitePool, user_id: &str, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET name=? WHERE id=?")
        .bind(name)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// The user's rooms in the order they were joined.
pub async fn room_ids(db_pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT room_id FROM user_rooms WHERE user_id=? ORDER BY position")
        .bind(user_id)
        .fetch_all(db_pool)
        .await?;
    Ok(rows.into_iter().map(|(room_id,)| room_id).collect())
}

/// Appends `room_id` to the user's rooms. Already-present rooms keep their position.
pub async fn push_room(db_pool: &SqlitePool, user_id: &str, room_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO user_rooms (user_id,room_id,position) \
         VALUES (?,?,(SELECT COALESCE(MAX(position),0)+1 FROM user_rooms WHERE user_id=?))",
    )
        .bind(user_id)
        .bind(room_id)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

pub async fn pull_room(db_pool: &SqlitePool, user_id: &str, room_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM user_rooms WHERE user_id=? AND room_id=?")
        .bind(user_id)
        .bind(room_id)
        .execute(db_pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn local_and_google_lookups_are_separate() {
        let db_pool = test_pool().await;
        let local = create_local(&db_pool, "Ann", "ann@example.com", "hash").await.unwrap();
        let google = create_google(&db_pool, "g-1", "Ann G", "ann@example.com").await.unwrap();

        let found = find_local_by_email(&db_pool, "ann@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, local.id);
        assert_eq!(found.auth_with, AuthWith::Local);

        let found = find_by_google_id(&db_pool, "g-1").await.unwrap().unwrap();
        assert_eq!(found.id, google.id);
        assert!(found.password_hash.is_none());
    }

    #[tokio::test]
    async fn rooms_keep_join_order_and_ignore_duplicates() {
        let db_pool = test_pool().await;
        let user = create_local(&db_pool, "Ann", "ann@example.com", "hash").await.unwrap();

        push_room(&db_pool, &user.id, "r2").await.unwrap();
        push_room(&db_pool, &user.id, "r1").await.unwrap();
        push_room(&db_pool, &user.id, "r2").await.unwrap();
        assert_eq!(room_ids(&db_pool, &user.id).await.unwrap(), vec!["r2", "r1"]);

        pull_room(&db_pool, &user.id, "r2").await.unwrap();
        push_room(&db_pool, &user.id, "r3").await.unwrap();
        assert_eq!(room_ids(&db_pool, &user.id).await.unwrap(), vec!["r1", "r3"]);
    }

    #[tokio::test]
    async fn set_name_reports_missing_users() {
        let db_pool = test_pool().await;
        let user = create_local(&db_pool, "Ann", "ann@example.com", "hash").await.unwrap();

        assert!(set_name(&db_pool, &user.id, "Annie").await.unwrap());
        assert!(!set_name(&db_pool, "nobody", "Annie").await.unwrap());
        assert_eq!(find_by_id(&db_pool, &user.id).await.unwrap().unwrap().name, "Annie");
    }
}
