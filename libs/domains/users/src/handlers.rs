use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, ErrorResponse, IdPath, JwtAuth, SuccessResponse,
    ValidatedJson, extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{
    Contact, CreateContact, LoginRequest, LoginResponse, RegisterRequest, UpdateContact,
    UpdateUserRequest, UserResponse, UserType,
};
use crate::repository::{ContactRepository, UserRepository};
use crate::service::{ContactService, UserService};

const USERS_TAG: &str = "users";
const CONTACTS_TAG: &str = "contacts";

/// OpenAPI documentation for the identity endpoints
#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        confirm_email,
        login,
        update_user,
        add_contact,
        list_contacts,
        update_contact,
        delete_contact,
    ),
    components(schemas(
        RegisterRequest,
        UpdateUserRequest,
        LoginRequest,
        LoginResponse,
        UserResponse,
        UserType,
        Contact,
        CreateContact,
        UpdateContact,
        SuccessResponse,
        ErrorResponse,
    )),
    tags(
        (name = USERS_TAG, description = "Registration, email confirmation, login and profile"),
        (name = CONTACTS_TAG, description = "Delivery contacts of the current user")
    )
)]
pub struct ApiDoc;

/// Shared state of the identity router
pub struct UsersState<R: UserRepository, C: ContactRepository> {
    pub users: Arc<UserService<R>>,
    pub contacts: Arc<ContactService<C>>,
    pub jwt: JwtAuth,
}

impl<R: UserRepository, C: ContactRepository> Clone for UsersState<R, C> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            contacts: Arc::clone(&self.contacts),
            jwt: self.jwt.clone(),
        }
    }
}

/// Create the identity router with all HTTP endpoints
pub fn router<R, C>(users: UserService<R>, contacts: ContactService<C>, jwt: JwtAuth) -> Router
where
    R: UserRepository + 'static,
    C: ContactRepository + 'static,
{
    let state = UsersState {
        users: Arc::new(users),
        contacts: Arc::new(contacts),
        jwt,
    };

    Router::new()
        .route("/registration", post(register::<R, C>))
        .route("/confirm_email/{token}/{email}", get(confirm_email::<R, C>))
        .route("/login", post(login::<R, C>))
        .route("/update_user", patch(update_user::<R, C>))
        .route("/add_contact", post(add_contact::<R, C>))
        .route("/contacts", get(list_contacts::<R, C>))
        .route(
            "/update_contact/{id}",
            put(update_contact::<R, C>).patch(update_contact::<R, C>),
        )
        .route("/delete_contact/{id}", delete(delete_contact::<R, C>))
        .with_state(state)
}

/// Register a new account
///
/// The account stays inactive until the emailed link is followed.
#[utoipa::path(
    post,
    path = "/registration",
    tag = USERS_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SuccessResponse),
        (status = 400, description = "Invalid data or email taken", body = ErrorResponse),
    )
)]
async fn register<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let user = state.users.register(input).await?;

    AuditEvent::new(
        Some(user.id),
        "user.register",
        Some(format!("user:{}", user.id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .with_details(json!({ "type": user.user_type.to_string() }))
    .log();

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(
            "Account created successfully, please confirm your email",
        )),
    ))
}

/// Confirm an email address with the token from the confirmation link
#[utoipa::path(
    get,
    path = "/confirm_email/{token}/{email}",
    tag = USERS_TAG,
    params(
        ("token" = String, Path, description = "Confirmation token"),
        ("email" = String, Path, description = "Address being confirmed")
    ),
    responses(
        (status = 201, description = "Email confirmed", body = SuccessResponse),
        (status = 404, description = "Invalid token or email", body = ErrorResponse),
    )
)]
async fn confirm_email<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    headers: HeaderMap,
    Path((token, email)): Path<(String, String)>,
) -> UserResult<impl IntoResponse> {
    let result = state.users.confirm_email(&token, &email).await;

    let (user_id, outcome) = match &result {
        Ok(user) => (Some(user.id), AuditOutcome::Success),
        Err(_) => (None, AuditOutcome::Failure),
    };
    AuditEvent::new(user_id, "user.confirm_email", None, outcome)
        .with_ip(extract_ip_from_headers(&headers))
        .log();

    result?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Email confirmed successfully")),
    ))
}

/// Exchange email and password for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = USERS_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "User inactive", body = ErrorResponse),
    )
)]
async fn login<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<LoginResponse>> {
    let user = match state.users.verify_credentials(&input.email, &input.password).await {
        Ok(user) => user,
        Err(e) => {
            AuditEvent::new(None, "user.login", None, AuditOutcome::Denied)
                .with_ip(extract_ip_from_headers(&headers))
                .with_user_agent(extract_user_agent(&headers))
                .with_details(json!({ "email": input.email }))
                .log();
            return Err(e);
        }
    };

    let access_token = state
        .jwt
        .create_access_token(&user.id.to_string(), &user.email, &[user.user_type.to_string()])
        .map_err(|e| {
            tracing::error!("Failed to create access token: {:?}", e);
            UserError::Internal("Failed to create token".to_string())
        })?;

    AuditEvent::new(
        Some(user.id),
        "user.login",
        Some(format!("user:{}", user.id)),
        AuditOutcome::Success,
    )
    .with_ip(extract_ip_from_headers(&headers))
    .with_user_agent(extract_user_agent(&headers))
    .log();

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.access_token_ttl(),
    }))
}

/// Update the current user's profile
///
/// Changing the email deactivates the account until the new address is confirmed.
#[utoipa::path(
    patch,
    path = "/update_user",
    tag = USERS_TAG,
    request_body = UpdateUserRequest,
    responses(
        (status = 201, description = "Profile updated", body = SuccessResponse),
        (status = 400, description = "Invalid data or email taken", body = ErrorResponse),
        (status = 401, description = "Log in required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn update_user<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<UpdateUserRequest>,
) -> UserResult<impl IntoResponse> {
    state.users.update_user(user.id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Profile updated successfully")),
    ))
}

/// Add a contact for the current user
#[utoipa::path(
    post,
    path = "/add_contact",
    tag = CONTACTS_TAG,
    request_body = CreateContact,
    responses(
        (status = 201, description = "Contact created", body = Contact),
        (status = 400, description = "Invalid data", body = ErrorResponse),
        (status = 401, description = "Log in required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn add_contact<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<CreateContact>,
) -> UserResult<impl IntoResponse> {
    let contact = state.contacts.add_contact(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// List the current user's contacts
#[utoipa::path(
    get,
    path = "/contacts",
    tag = CONTACTS_TAG,
    responses(
        (status = 200, description = "Contacts", body = Vec<Contact>),
        (status = 401, description = "Log in required", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn list_contacts<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    user: AuthUser,
) -> UserResult<Json<Vec<Contact>>> {
    Ok(Json(state.contacts.list_contacts(user.id).await?))
}

/// Update one of the current user's contacts (PUT or PATCH)
#[utoipa::path(
    patch,
    path = "/update_contact/{id}",
    tag = CONTACTS_TAG,
    params(("id" = i64, Path, description = "Contact ID")),
    request_body = UpdateContact,
    responses(
        (status = 200, description = "Contact updated", body = Contact),
        (status = 403, description = "Contact of another user", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn update_contact<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    user: AuthUser,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateContact>,
) -> UserResult<Json<Contact>> {
    Ok(Json(state.contacts.update_contact(user.id, id, input).await?))
}

/// Delete one of the current user's contacts
#[utoipa::path(
    delete,
    path = "/delete_contact/{id}",
    tag = CONTACTS_TAG,
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 403, description = "Contact of another user", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse),
    ),
    security(("bearer_auth" = []))
)]
async fn delete_contact<R: UserRepository, C: ContactRepository>(
    State(state): State<UsersState<R, C>>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> UserResult<StatusCode> {
    state.contacts.delete_contact(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
