use axum::{Json, extract::State};
use tracing::instrument;

use crate::accounts::ConfirmationFlow;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{SignupRequest, SignupResponse, TokenRequest, TokenResponse};
use crate::state::AppState;
use crate::utils::jwt;
use crate::utils::mail::{self, OutgoingMail};

fn flow(state: &AppState) -> ConfirmationFlow<'_, sea_orm::DatabaseConnection> {
    ConfirmationFlow::new(
        &state.db,
        state.policy.rules(),
        state.config.auth.confirmation_code_length,
    )
}

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Register or re-request a confirmation code",
    description = "Creates a pending account and emails a confirmation code. Repeating the call with the same username and email issues a new code and invalidates the previous one. A username or email already used with a different counterpart is a conflict.",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Confirmation code sent", body = SignupResponse),
        (status = 400, description = "Validation error or conflict (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    let (account, code) = flow(&state).request_signup(username, email).await?;

    mail::dispatch(
        state.mailer.clone(),
        OutgoingMail {
            from: state.config.mail.from.clone(),
            to: account.email.clone(),
            subject: "YaMDb confirmation code".into(),
            body: format!("Confirmation code for {}: {}", account.username, code),
        },
    );

    Ok(Json(SignupResponse {
        username: account.username,
        email: account.email,
    }))
}

#[utoipa::path(
    post,
    path = "/token",
    tag = "Auth",
    operation_id = "obtainToken",
    summary = "Exchange a confirmation code for an access token",
    description = "Confirms the account on first use and returns a bearer token carrying the account's current role. The code stays valid until the next signup call for the account.",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Access token", body = TokenResponse),
        (status = 400, description = "Wrong code or malformed body (INVALID_CREDENTIALS, VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such user (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn obtain_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let account = flow(&state)
        .exchange_token(payload.username.trim(), payload.confirmation_code.trim())
        .await?;

    let token = jwt::sign(
        account.id,
        &account.username,
        account.role,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    tracing::info!(user_id = account.id, "Access token issued");
    Ok(Json(TokenResponse { token }))
}
