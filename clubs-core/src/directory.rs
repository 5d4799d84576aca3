//! User directory: identities, roles and credentials.

use clubs_sdk::objects::clamp_skip_limit;
use kanau::processor::Processor;

use crate::credentials::{hash_secret_blocking, verify_secret_blocking};
use crate::entities::UserRole;
use crate::entities::users::{
    CreateUser, GetUserByEmail, GetUserById, ListUsers, UpdateUserProfile, User,
};
use crate::error::{ClubError, ConflictReason, Resource, StoreError};

/// Storage needed by [`UserDirectory`].
pub trait DirectoryStore:
    Processor<CreateUser, Output = Option<User>, Error = StoreError>
    + Processor<GetUserById, Output = Option<User>, Error = StoreError>
    + Processor<GetUserByEmail, Output = Option<User>, Error = StoreError>
    + Processor<UpdateUserProfile, Output = Option<User>, Error = StoreError>
    + Processor<ListUsers, Output = Vec<User>, Error = StoreError>
    + Clone
    + Send
    + Sync
{
}

impl<T> DirectoryStore for T where
    T: Processor<CreateUser, Output = Option<User>, Error = StoreError>
        + Processor<GetUserById, Output = Option<User>, Error = StoreError>
        + Processor<GetUserByEmail, Output = Option<User>, Error = StoreError>
        + Processor<UpdateUserProfile, Output = Option<User>, Error = StoreError>
        + Processor<ListUsers, Output = Vec<User>, Error = StoreError>
        + Clone
        + Send
        + Sync
{
}

/// Sign-up data for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub group: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn normalize_group(group: Option<String>) -> Option<String> {
    group.map(|g| g.trim().to_string()).filter(|g| !g.is_empty())
}

#[derive(Debug, Clone)]
pub struct UserDirectory<S> {
    store: S,
}

impl<S: DirectoryStore> UserDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an account. The password is stored as an argon2 hash.
    #[tracing::instrument(skip_all, fields(role = role.as_str()))]
    pub async fn create(&self, new: NewUser, role: UserRole) -> Result<User, ClubError> {
        let email = normalize_email(&new.email);
        if !email.contains('@') {
            return Err(ClubError::validation("email must be a valid address"));
        }
        if new.password.is_empty() {
            return Err(ClubError::validation("password must not be empty"));
        }
        let full_name = new.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(ClubError::validation("full_name must not be blank"));
        }
        let password_hash = hash_secret_blocking(new.password).await?;

        let user = self
            .store
            .process(CreateUser {
                email,
                password_hash,
                full_name,
                group: normalize_group(new.group),
                role,
            })
            .await?
            .ok_or(ClubError::Conflict(ConflictReason::EmailTaken))?;
        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, ClubError> {
        self.store
            .process(GetUserById { id })
            .await?
            .ok_or(ClubError::NotFound(Resource::User))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, ClubError> {
        let user = self
            .store
            .process(GetUserByEmail {
                email: normalize_email(email),
            })
            .await?;
        Ok(user)
    }

    /// Check credentials. `None` means unknown email or wrong password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, ClubError> {
        let user = self.get_by_email(email).await?;
        let Some(user) = user else {
            return Ok(None);
        };
        let matches =
            verify_secret_blocking(password.to_string(), user.password_hash.clone()).await;
        Ok(matches.then_some(user))
    }

    pub async fn update_profile(&self, id: i64, patch: ProfilePatch) -> Result<User, ClubError> {
        let full_name = match patch.full_name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(ClubError::validation("full_name must not be blank"));
                }
                Some(name)
            }
            None => None,
        };
        self.store
            .process(UpdateUserProfile {
                id,
                full_name,
                group: normalize_group(patch.group),
            })
            .await?
            .ok_or(ClubError::NotFound(Resource::User))
    }

    /// A page of users in id order. `limit` is clamped to `1..=200`.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<User>, ClubError> {
        let (offset, limit) = clamp_skip_limit(skip, limit);
        let users = self
            .store
            .process(ListUsers {
                offset,
                limit: Some(limit),
            })
            .await?;
        Ok(users)
    }

    /// Every user, for exports.
    pub async fn list_all(&self) -> Result<Vec<User>, ClubError> {
        let users = self.store.process(ListUsers::default()).await?;
        Ok(users)
    }
}
