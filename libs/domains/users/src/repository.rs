use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{ConfirmToken, Contact, CreateContact, NewUser, User};

/// Repository trait for users and their confirmation tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; the email must not be taken (case-insensitive)
    async fn create(&self, user: NewUser) -> UserResult<User>;

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>>;

    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Persist every mutable field of `user`
    async fn update(&self, user: User) -> UserResult<User>;

    async fn email_exists(&self, email: &str) -> UserResult<bool>;

    async fn create_confirm_token(&self, user_id: i64, token: &str) -> UserResult<ConfirmToken>;

    /// Activate the owner of `token` when their email matches and delete the
    /// token. Returns `None` if the pair does not match.
    async fn consume_confirm_token(&self, token: &str, email: &str) -> UserResult<Option<User>>;
}

/// Repository trait for user contacts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, user_id: i64, input: CreateContact) -> UserResult<Contact>;

    async fn get_by_id(&self, id: i64) -> UserResult<Option<Contact>>;

    /// Contacts of one user, oldest first
    async fn list_by_user(&self, user_id: i64) -> UserResult<Vec<Contact>>;

    async fn update(&self, contact: Contact) -> UserResult<Contact>;

    async fn delete(&self, id: i64) -> UserResult<bool>;
}

#[derive(Debug, Default)]
struct UserTables {
    next_user_id: i64,
    next_token_id: i64,
    users: HashMap<i64, User>,
    tokens: HashMap<String, ConfirmToken>,
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<UserTables>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, input: NewUser) -> UserResult<User> {
        let mut tables = self.tables.write().await;

        let email = input.email.to_lowercase();
        if tables.users.values().any(|u| u.email == email) {
            return Err(UserError::DuplicateEmail(email));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            user_type: input.user_type,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        tracing::info!(user_id = user.id, email = %user.email, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, mut user: User) -> UserResult<User> {
        let mut tables = self.tables.write().await;

        user.email = user.email.to_lowercase();
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(UserError::DuplicateEmail(user.email));
        }

        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or(UserError::NotFound(user.id))?;
        user.updated_at = Utc::now();
        *stored = user.clone();

        tracing::info!(user_id = user.id, "Updated user");
        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> UserResult<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    async fn create_confirm_token(&self, user_id: i64, token: &str) -> UserResult<ConfirmToken> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&user_id) {
            return Err(UserError::NotFound(user_id));
        }

        tables.next_token_id += 1;
        let confirm_token = ConfirmToken {
            id: tables.next_token_id,
            user_id,
            token: token.to_string(),
            created_at: Utc::now(),
        };
        tables
            .tokens
            .insert(confirm_token.token.clone(), confirm_token.clone());

        Ok(confirm_token)
    }

    async fn consume_confirm_token(&self, token: &str, email: &str) -> UserResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let email = email.to_lowercase();

        let Some(user_id) = tables.tokens.get(token).map(|t| t.user_id) else {
            return Ok(None);
        };

        let Some(user) = tables
            .users
            .get_mut(&user_id)
            .filter(|u| u.email == email)
        else {
            return Ok(None);
        };

        user.is_active = true;
        user.updated_at = Utc::now();
        let activated = user.clone();
        tables.tokens.remove(token);

        tracing::info!(user_id, "Confirmed email");
        Ok(Some(activated))
    }
}

#[derive(Debug, Default)]
struct ContactTable {
    next_id: i64,
    rows: HashMap<i64, Contact>,
}

/// In-memory implementation of ContactRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryContactRepository {
    table: Arc<RwLock<ContactTable>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn create(&self, user_id: i64, input: CreateContact) -> UserResult<Contact> {
        let mut table = self.table.write().await;
        table.next_id += 1;

        let contact = Contact {
            id: table.next_id,
            city: input.city,
            street: input.street,
            house: input.house,
            structure: input.structure,
            building: input.building,
            apartment: input.apartment,
            phone: input.phone,
            additional_desc: input.additional_desc,
            user_id,
        };
        table.rows.insert(contact.id, contact.clone());

        tracing::info!(contact_id = contact.id, user_id, "Created contact");
        Ok(contact)
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<Contact>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: i64) -> UserResult<Vec<Contact>> {
        let table = self.table.read().await;
        let mut contacts: Vec<Contact> = table
            .rows
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        contacts.sort_by_key(|c| c.id);
        Ok(contacts)
    }

    async fn update(&self, contact: Contact) -> UserResult<Contact> {
        let mut table = self.table.write().await;
        let stored = table
            .rows
            .get_mut(&contact.id)
            .ok_or(UserError::ContactNotFound(contact.id))?;
        *stored = contact.clone();
        Ok(contact)
    }

    async fn delete(&self, id: i64) -> UserResult<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
