use crate::entities::UserRole;
use crate::error::StoreError;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub full_name: String,
    #[sqlx(rename = "group_name")]
    pub group: Option<String>,
    pub role: UserRole,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
/// Insert a user. Outputs `None` if the email is already taken.
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub group: Option<String>,
    pub role: UserRole,
}

impl Processor<CreateUser> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateUser")]
    async fn process(&self, insert: CreateUser) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name, group_name, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, email, password_hash, full_name, group_name, role, created_at
            "#,
        )
        .bind(insert.email)
        .bind(insert.password_hash)
        .bind(insert.full_name)
        .bind(insert.group)
        .bind(insert.role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetUserById {
    pub id: i64,
}

impl Processor<GetUserById> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserById")]
    async fn process(&self, query: GetUserById) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, group_name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Debug, Clone)]
pub struct GetUserByEmail {
    pub email: String,
}

impl Processor<GetUserByEmail> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserByEmail")]
    async fn process(&self, query: GetUserByEmail) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, group_name, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(query.email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Debug, Clone, Default)]
/// Patch a profile. Outputs `None` if the user does not exist.
pub struct UpdateUserProfile {
    pub id: i64,
    pub full_name: Option<String>,
    pub group: Option<String>,
}

impl Processor<UpdateUserProfile> for DatabaseProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateUserProfile")]
    async fn process(&self, update: UpdateUserProfile) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                group_name = COALESCE($3, group_name)
            WHERE id = $1
            RETURNING id, email, password_hash, full_name, group_name, role, created_at
            "#,
        )
        .bind(update.id)
        .bind(update.full_name)
        .bind(update.group)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Users in id order. A `None` limit returns everyone after `offset`.
pub struct ListUsers {
    pub offset: i64,
    pub limit: Option<i64>,
}

impl Processor<ListUsers> for DatabaseProcessor {
    type Output = Vec<User>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListUsers")]
    async fn process(&self, query: ListUsers) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, group_name, role, created_at
            FROM users
            ORDER BY id ASC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(query.offset)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
