//! Users Domain
//!
//! Identity store of the retail backend: accounts with email confirmation,
//! stateless login and the delivery contacts each user owns.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← /registration, /confirm_email, /login, /update_user, contacts
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← UserService, ContactService
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← In-memory or Postgres
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{
//!     handlers, ContactService, InMemoryContactRepository, InMemoryUserRepository, UserService,
//! };
//!
//! let users = UserService::new(InMemoryUserRepository::new(), "http://127.0.0.1:8080");
//! let contacts = ContactService::new(InMemoryContactRepository::new());
//! let router = handlers::router(users, contacts, jwt_auth);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{
    ConfirmToken, Contact, CreateContact, LoginRequest, LoginResponse, NewUser, RegisterRequest,
    UpdateContact, UpdateUserRequest, User, UserResponse, UserType,
};
pub use postgres::{PgContactRepository, PgUserRepository};
pub use repository::{
    ContactRepository, InMemoryContactRepository, InMemoryUserRepository, UserRepository,
};
pub use service::{ContactService, UserService};
