use serde::{Deserialize, Serialize};

/// Request body for signup and confirmation-code re-issue.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// Letters, digits and `.@+-_`; "me" is reserved.
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Echo of the accepted signup. The code itself is only sent by email.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Request body for exchanging a confirmation code for an access token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct TokenRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "q3ZtP0aLx9Kf2mVb")]
    pub confirmation_code: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// Bearer token for the `Authorization` header.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}
