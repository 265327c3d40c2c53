use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Account type. Shops may upload catalogs; buyers place orders.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum UserType {
    #[default]
    Buyer,
    Shop,
}

/// Stored user record
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    /// Always lowercase
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    /// False until the email is confirmed, and again after an email change
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a user; the repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            user_type: user.user_type,
            is_active: user.is_active,
        }
    }
}

/// One-time credential proving control of an email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Rejects addresses whose domain has no dot, such as `user@mailru`.
pub fn validate_email_domain(email: &str) -> Result<(), ValidationError> {
    match email.rsplit_once('@') {
        Some((_, domain)) if domain.contains('.') && !domain.ends_with('.') => Ok(()),
        _ => Err(ValidationError::new("email_domain")
            .with_message("Enter a valid email address.".into())),
    }
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."), custom(function = "validate_email_domain"))]
    #[schema(example = "buyer@example.com")]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(rename = "type", default)]
    pub user_type: UserType,
}

/// Partial profile update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Enter a valid email address."), custom(function = "validate_email_domain"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[serde(rename = "type")]
    pub user_type: Option<UserType>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Postal/phone details owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    pub id: i64,
    pub city: String,
    pub street: String,
    pub house: String,
    pub structure: String,
    pub building: String,
    pub apartment: String,
    pub phone: String,
    pub additional_desc: String,
    /// Owning user id
    #[serde(rename = "user")]
    pub user_id: i64,
}

impl Contact {
    pub fn apply_update(&mut self, input: UpdateContact) {
        let UpdateContact {
            city,
            street,
            house,
            structure,
            building,
            apartment,
            phone,
            additional_desc,
        } = input;

        if let Some(v) = city {
            self.city = v;
        }
        if let Some(v) = street {
            self.street = v;
        }
        if let Some(v) = house {
            self.house = v;
        }
        if let Some(v) = structure {
            self.structure = v;
        }
        if let Some(v) = building {
            self.building = v;
        }
        if let Some(v) = apartment {
            self.apartment = v;
        }
        if let Some(v) = phone {
            self.phone = v;
        }
        if let Some(v) = additional_desc {
            self.additional_desc = v;
        }
    }
}

/// New contact. City, street and phone are required.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateContact {
    #[validate(length(min = 1, max = 50))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub street: String,
    #[serde(default)]
    #[validate(length(max = 15))]
    pub house: String,
    #[serde(default)]
    #[validate(length(max = 15))]
    pub structure: String,
    #[serde(default)]
    #[validate(length(max = 15))]
    pub building: String,
    #[serde(default)]
    #[validate(length(max = 15))]
    pub apartment: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub additional_desc: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateContact {
    #[validate(length(min = 1, max = 50))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub street: Option<String>,
    #[validate(length(max = 15))]
    pub house: Option<String>,
    #[validate(length(max = 15))]
    pub structure: Option<String>,
    #[validate(length(max = 15))]
    pub building: Option<String>,
    #[validate(length(max = 15))]
    pub apartment: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub additional_desc: Option<String>,
}
