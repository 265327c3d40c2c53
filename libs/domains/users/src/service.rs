use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use domain_notifications::NotificationService;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{
    Contact, CreateContact, NewUser, RegisterRequest, UpdateContact, UpdateUserRequest, User,
};
use crate::repository::{ContactRepository, UserRepository};

/// Service layer for accounts: registration, confirmation, login, profile
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    notifications: Option<NotificationService>,
    public_base_url: String,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, public_base_url: impl Into<String>) -> Self {
        Self {
            repository: Arc::new(repository),
            notifications: None,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_notifications(mut self, notifications: NotificationService) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Create an inactive account and email its confirmation link
    pub async fn register(&self, input: RegisterRequest) -> UserResult<User> {
        self.validate_password(&input.password)?;

        let email = input.email.trim().to_lowercase();
        if self.repository.email_exists(&email).await? {
            return Err(UserError::DuplicateEmail(email));
        }

        let password_hash = self.hash_password(&input.password)?;
        let user = self
            .repository
            .create(NewUser {
                email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                user_type: input.user_type,
            })
            .await?;

        self.issue_confirmation(&user).await?;
        Ok(user)
    }

    /// Activate the account owning `token`; the token is consumed
    pub async fn confirm_email(&self, token: &str, email: &str) -> UserResult<User> {
        self.repository
            .consume_confirm_token(token, email)
            .await?
            .ok_or(UserError::InvalidConfirmToken)
    }

    pub async fn get_user(&self, id: i64) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Check credentials for login. Only active accounts may log in.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> UserResult<User> {
        let user = self
            .repository
            .get_by_email(email.trim())
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(UserError::Inactive);
        }

        Ok(user)
    }

    /// Apply a partial profile update. A new email deactivates the account
    /// until the new address is confirmed.
    pub async fn update_user(&self, id: i64, input: UpdateUserRequest) -> UserResult<User> {
        let mut user = self.get_user(id).await?;

        let mut email_changed = false;
        if let Some(new_email) = input.email {
            let new_email = new_email.trim().to_lowercase();
            if new_email != user.email {
                if self.repository.email_exists(&new_email).await? {
                    return Err(UserError::DuplicateEmail(new_email));
                }
                user.email = new_email;
                user.is_active = false;
                email_changed = true;
            }
        }

        if let Some(password) = input.password {
            self.validate_password(&password)?;
            user.password_hash = self.hash_password(&password)?;
        }
        if let Some(first_name) = input.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            user.last_name = last_name;
        }
        if let Some(user_type) = input.user_type {
            user.user_type = user_type;
        }

        let updated = self.repository.update(user).await?;

        if email_changed {
            tracing::info!(user_id = updated.id, "Email changed, account deactivated until confirmed");
            self.issue_confirmation(&updated).await?;
        }

        Ok(updated)
    }

    /// Link a user follows to confirm their email
    pub fn confirmation_link(&self, token: &str, email: &str) -> String {
        format!(
            "{}/api/v1/confirm_email/{}/{}",
            self.public_base_url, token, email
        )
    }

    async fn issue_confirmation(&self, user: &User) -> UserResult<()> {
        let token = Uuid::new_v4().simple().to_string();
        self.repository.create_confirm_token(user.id, &token).await?;

        let link = self.confirmation_link(&token, &user.email);
        match &self.notifications {
            Some(notifications) => {
                if let Err(e) = notifications.send_email_confirmation(&user.email, &link).await {
                    tracing::warn!(
                        user_id = user.id,
                        email = %user.email,
                        error = %e,
                        "Failed to send confirmation email"
                    );
                }
            }
            None => {
                tracing::debug!(user_id = user.id, link = %link, "Notifications disabled, confirmation link not sent");
            }
        }

        Ok(())
    }

    // Password helpers

    fn hash_password(&self, password: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify_password(&self, password: &str, hash: &str) -> UserResult<bool> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    // Field rules are enforced by ValidatedJson; this guards direct callers.
    fn validate_password(&self, password: &str) -> UserResult<()> {
        let len = password.chars().count();
        if len < 6 {
            return Err(UserError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        if len > 128 {
            return Err(UserError::Validation(
                "Password cannot exceed 128 characters".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service layer for contacts; every call is scoped to the calling user
#[derive(Clone)]
pub struct ContactService<C: ContactRepository> {
    repository: Arc<C>,
}

impl<C: ContactRepository> ContactService<C> {
    pub fn new(repository: C) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn add_contact(&self, user_id: i64, input: CreateContact) -> UserResult<Contact> {
        self.repository.create(user_id, input).await
    }

    pub async fn list_contacts(&self, user_id: i64) -> UserResult<Vec<Contact>> {
        self.repository.list_by_user(user_id).await
    }

    pub async fn update_contact(
        &self,
        user_id: i64,
        id: i64,
        input: UpdateContact,
    ) -> UserResult<Contact> {
        let mut contact = self.owned_contact(user_id, id).await?;
        contact.apply_update(input);

        let updated = self.repository.update(contact).await?;
        tracing::info!(contact_id = id, user_id, "Updated contact");
        Ok(updated)
    }

    pub async fn delete_contact(&self, user_id: i64, id: i64) -> UserResult<()> {
        self.owned_contact(user_id, id).await?;

        if !self.repository.delete(id).await? {
            return Err(UserError::ContactNotFound(id));
        }

        tracing::info!(contact_id = id, user_id, "Deleted contact");
        Ok(())
    }

    async fn owned_contact(&self, user_id: i64, id: i64) -> UserResult<Contact> {
        let contact = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::ContactNotFound(id))?;

        if contact.user_id != user_id {
            tracing::warn!(contact_id = id, user_id, owner = contact.user_id, "Contact access denied");
            return Err(UserError::ContactForbidden(id));
        }

        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::repository::{InMemoryContactRepository, InMemoryUserRepository, MockUserRepository};
    use domain_notifications::InMemoryEmailProvider;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "secret-pass".to_string(),
            first_name: "Ivan".to_string(),
            last_name: "Petrov".to_string(),
            user_type: UserType::Buyer,
        }
    }

    fn service_with_mailbox() -> (UserService<InMemoryUserRepository>, InMemoryEmailProvider) {
        let provider = InMemoryEmailProvider::new();
        let notifications = NotificationService::new(Arc::new(provider.clone())).unwrap();
        let service = UserService::new(InMemoryUserRepository::new(), "http://127.0.0.1:8080/")
            .with_notifications(notifications);
        (service, provider)
    }

    fn token_from_link(body: &str) -> String {
        let start = body.find("/confirm_email/").unwrap() + "/confirm_email/".len();
        body[start..start + 32].to_string()
    }

    #[tokio::test]
    async fn test_register_creates_inactive_user_and_sends_link() {
        let (service, mailbox) = service_with_mailbox();

        let user = service.register(register_request("Buyer@Example.com")).await.unwrap();
        assert_eq!(user.email, "buyer@example.com");
        assert!(!user.is_active);
        assert_ne!(user.password_hash, "secret-pass");

        let sent = mailbox.sent_to("buyer@example.com").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Registration on retail site");
        assert!(sent[0]
            .text_body
            .contains("http://127.0.0.1:8080/api/v1/confirm_email/"));
        assert!(sent[0].text_body.contains("/buyer@example.com"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, _) = service_with_mailbox();
        service.register(register_request("buyer@example.com")).await.unwrap();

        let result = service.register(register_request("BUYER@example.com")).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_confirm_then_login() {
        let (service, mailbox) = service_with_mailbox();
        service.register(register_request("buyer@example.com")).await.unwrap();

        let inactive = service.verify_credentials("buyer@example.com", "secret-pass").await;
        assert!(matches!(inactive, Err(UserError::Inactive)));

        let token = token_from_link(&mailbox.sent().await[0].text_body);
        let user = service.confirm_email(&token, "buyer@example.com").await.unwrap();
        assert!(user.is_active);

        let again = service.confirm_email(&token, "buyer@example.com").await;
        assert!(matches!(again, Err(UserError::InvalidConfirmToken)));

        let logged_in = service
            .verify_credentials("buyer@example.com", "secret-pass")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let wrong = service.verify_credentials("buyer@example.com", "nope-nope").await;
        assert!(matches!(wrong, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_email_change_deactivates_and_reissues_token() {
        let (service, mailbox) = service_with_mailbox();
        let user = service.register(register_request("old@example.com")).await.unwrap();
        let token = token_from_link(&mailbox.sent().await[0].text_body);
        service.confirm_email(&token, "old@example.com").await.unwrap();

        let updated = service
            .update_user(
                user.id,
                UpdateUserRequest {
                    email: Some("new@example.com".to_string()),
                    first_name: Some("Pyotr".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.first_name, "Pyotr");
        assert!(!updated.is_active);

        let sent = mailbox.sent_to("new@example.com").await;
        assert_eq!(sent.len(), 1);
        let new_token = token_from_link(&sent[0].text_body);
        assert_ne!(new_token, token);
        assert!(service.confirm_email(&new_token, "new@example.com").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_user_same_email_keeps_account_active() {
        let mut repo = MockUserRepository::new();
        let user = User {
            id: 1,
            email: "buyer@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            user_type: UserType::Buyer,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let stored = user.clone();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_email_exists().never();
        repo.expect_create_confirm_token().never();
        repo.expect_update()
            .withf(|u| u.is_active && u.user_type == UserType::Shop)
            .returning(Ok);

        let service = UserService::new(repo, "http://localhost");
        let updated = service
            .update_user(
                1,
                UpdateUserRequest {
                    email: Some("BUYER@example.com".to_string()),
                    user_type: Some(UserType::Shop),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_email() {
        let (service, _) = service_with_mailbox();
        let first = service.register(register_request("first@example.com")).await.unwrap();
        service.register(register_request("second@example.com")).await.unwrap();

        let result = service
            .update_user(
                first.id,
                UpdateUserRequest {
                    email: Some("second@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_registration_survives_mail_failure() {
        let notifications =
            NotificationService::new(Arc::new(InMemoryEmailProvider::failing())).unwrap();
        let service = UserService::new(InMemoryUserRepository::new(), "http://localhost")
            .with_notifications(notifications);

        assert!(service.register(register_request("buyer@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_contact_ownership() {
        let service = ContactService::new(InMemoryContactRepository::new());
        let contact = service
            .add_contact(
                1,
                CreateContact {
                    city: "Moscow".to_string(),
                    street: "Arbat".to_string(),
                    phone: "+7000".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let foreign = service
            .update_contact(2, contact.id, UpdateContact::default())
            .await;
        assert!(matches!(foreign, Err(UserError::ContactForbidden(_))));

        let missing = service.delete_contact(1, 999).await;
        assert!(matches!(missing, Err(UserError::ContactNotFound(999))));

        let updated = service
            .update_contact(
                1,
                contact.id,
                UpdateContact {
                    apartment: Some("12".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.apartment, "12");

        assert!(matches!(
            service.delete_contact(2, contact.id).await,
            Err(UserError::ContactForbidden(_))
        ));
        service.delete_contact(1, contact.id).await.unwrap();
        assert!(service.list_contacts(1).await.unwrap().is_empty());
    }
}
