use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, Statement, TransactionTrait,
};

use crate::entity;
use crate::error::{UserError, UserResult};
use crate::models::{ConfirmToken, Contact, CreateContact, NewUser, User, UserType};
use crate::repository::{ContactRepository, UserRepository};

fn db_error(e: DbErr) -> UserError {
    UserError::Internal(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    let err_str = e.to_string();
    err_str.contains("duplicate key") || err_str.contains("unique constraint")
}

/// PostgreSQL implementation of UserRepository using SeaORM raw statements
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Helper struct for deserializing user rows from the database
#[derive(Debug, FromQueryResult)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    user_type: String,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            user_type: row.user_type.parse().unwrap_or(UserType::Buyer),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ConfirmTokenRow {
    id: i64,
    user_id: i64,
    token: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, user_type, is_active, created_at, updated_at";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> UserResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, user_type, is_active)
            VALUES (LOWER($1), $2, $3, $4, $5, FALSE)
            RETURNING {USER_COLUMNS}
            "#
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.email.clone().into(),
                user.password_hash.into(),
                user.first_name.into(),
                user.last_name.into(),
                user.user_type.to_string().into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::DuplicateEmail(user.email.to_lowercase())
                } else {
                    db_error(e)
                }
            })?
            .ok_or_else(|| UserError::Internal("Failed to create user".to_string()))?;

        tracing::info!(user_id = row.id, "Created user");
        Ok(row.into())
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [id.into()]);

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)");
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [email.into()]);

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(row.map(|r| r.into()))
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let sql = format!(
            r#"
            UPDATE users
            SET email = LOWER($2), password_hash = $3, first_name = $4, last_name = $5,
                user_type = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                user.id.into(),
                user.email.clone().into(),
                user.password_hash.into(),
                user.first_name.into(),
                user.last_name.into(),
                user.user_type.to_string().into(),
                user.is_active.into(),
            ],
        );

        let row = UserRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::DuplicateEmail(user.email.to_lowercase())
                } else {
                    db_error(e)
                }
            })?;

        row.map(|r| r.into()).ok_or(UserError::NotFound(user.id))
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        let sql = "SELECT EXISTS(SELECT 1 FROM users WHERE email = LOWER($1)) as exists";
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, sql, [email.into()]);

        #[derive(FromQueryResult)]
        struct ExistsResult {
            exists: bool,
        }

        let result = ExistsResult::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(result.map(|r| r.exists).unwrap_or(false))
    }

    async fn create_confirm_token(&self, user_id: i64, token: &str) -> UserResult<ConfirmToken> {
        let sql = r#"
            INSERT INTO confirm_tokens (user_id, token)
            VALUES ($1, $2)
            RETURNING id, user_id, token, created_at
        "#;
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [user_id.into(), token.into()]);

        let row = ConfirmTokenRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .map_err(db_error)?
            .ok_or_else(|| UserError::Internal("Failed to create confirm token".to_string()))?;

        Ok(ConfirmToken {
            id: row.id,
            user_id: row.user_id,
            token: row.token,
            created_at: row.created_at,
        })
    }

    async fn consume_confirm_token(&self, token: &str, email: &str) -> UserResult<Option<User>> {
        let txn = self.db.begin().await.map_err(db_error)?;

        // Deleting first locks the token row; a concurrent confirm sees nothing.
        let sql = r#"
            DELETE FROM confirm_tokens t
            USING users u
            WHERE t.token = $1 AND t.user_id = u.id AND u.email = LOWER($2)
            RETURNING t.id, t.user_id, t.token, t.created_at
        "#;
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [token.into(), email.into()]);

        let Some(consumed) = ConfirmTokenRow::find_by_statement(stmt)
            .one(&txn)
            .await
            .map_err(db_error)?
        else {
            txn.rollback().await.map_err(db_error)?;
            return Ok(None);
        };

        let sql = format!(
            "UPDATE users SET is_active = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, sql, [consumed.user_id.into()]);

        let row = UserRow::find_by_statement(stmt)
            .one(&txn)
            .await
            .map_err(db_error)?
            .ok_or(UserError::NotFound(consumed.user_id))?;

        txn.commit().await.map_err(db_error)?;

        tracing::info!(user_id = row.id, "Confirmed email");
        Ok(Some(row.into()))
    }
}

/// PostgreSQL implementation of ContactRepository using the sea-orm entity
#[derive(Clone)]
pub struct PgContactRepository {
    db: DatabaseConnection,
}

impl PgContactRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn create(&self, user_id: i64, input: CreateContact) -> UserResult<Contact> {
        let model = entity::ActiveModel::for_insert(user_id, input)
            .insert(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(contact_id = model.id, user_id, "Created contact");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<Contact>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(model.map(Into::into))
    }

    async fn list_by_user(&self, user_id: i64) -> UserResult<Vec<Contact>> {
        let models = entity::Entity::find()
            .filter(entity::Column::UserId.eq(user_id))
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, contact: Contact) -> UserResult<Contact> {
        let id = contact.id;
        let active_model: entity::ActiveModel = contact.into();

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => UserError::ContactNotFound(id),
            other => db_error(other),
        })?;

        Ok(model.into())
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        let result = entity::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected > 0)
    }
}
