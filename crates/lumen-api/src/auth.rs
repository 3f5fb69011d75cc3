use axum::{Extension, extract::State, response::IntoResponse};
use chrono::Utc;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use lumen_db::users::NewUser;
use lumen_types::api::{
    AuthPayload, MessagePayload, SendCodeRequest, UserPayload, VerifyCodeRequest,
};

use crate::error::{ApiError, ok};
use crate::extract::Json;
use crate::token::Claims;
use crate::{AppState, with_db};

/// POST /api/auth/email/send-code
///
/// Stages a fresh one-time code (invalidating all prior codes for the
/// address) and emails it. A mail failure fails the request; the client must
/// never be told a code is on the way when none was sent.
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::invalid("a valid email address is required"));
    }

    let code = generate_code();
    let english = req.language.as_deref() == Some("en");

    {
        let email = email.clone();
        let code = code.clone();
        with_db(state.clone(), move |db| {
            db.create_verification(&email, &code, Utc::now())
        })
        .await?;
    }

    state
        .mailer
        .send_verification_code(&email, &code, english)
        .await
        .map_err(|e| {
            tracing::error!("verification email to {} failed: {}", email, e);
            ApiError::unavailable("failed to send verification code")
        })?;

    Ok(ok(MessagePayload {
        message: "Verification code sent".to_string(),
    }))
}

/// POST /api/auth/email/verify
///
/// Consumes the code, upserts the user, and issues a session token. Expired,
/// used, and unknown codes all produce the same response so a caller cannot
/// probe which addresses have pending codes.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::invalid("a valid email address is required"));
    }
    if req.code.len() != 6 || !req.code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::invalid_with(
            "code must be 6 digits",
            serde_json::json!({ "field": "code" }),
        ));
    }

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let user = {
        let email = email.clone();
        let code = req.code.clone();
        with_db(state.clone(), move |db| {
            let now = Utc::now();
            if !db.consume_verification(&email, &code, now)? {
                return Ok(None);
            }

            let user = match db.get_user_by_email(&email)? {
                Some(existing) => {
                    db.record_sign_in(existing.id, name.as_deref(), now)?;
                    db.get_user_by_id(existing.id)?
                        .ok_or_else(|| anyhow::anyhow!("user vanished during sign-in"))?
                }
                None => {
                    let fallback_name = email.split('@').next().unwrap_or(&email).to_string();
                    db.create_user(
                        NewUser {
                            open_id: format!("email_{}", Uuid::new_v4().simple()),
                            email: email.clone(),
                            name: name.unwrap_or(fallback_name),
                            login_method: "email".to_string(),
                        },
                        now,
                    )?
                }
            };
            Ok(Some(user))
        })
        .await?
    };

    let user =
        user.ok_or_else(|| ApiError::unauthorized("invalid or expired verification code"))?;

    let token = state.tokens.issue(&user).map_err(|e| {
        tracing::error!("token issuance failed: {:#}", e);
        ApiError::internal("failed to issue session token")
    })?;

    info!("User {} signed in via email", user.id);
    Ok(ok(AuthPayload { token, user }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = with_db(state, move |db| db.get_user_by_id(claims.sub))
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(ok(UserPayload { user }))
}

/// POST /api/auth/logout
///
/// Sessions are stateless JWTs; the server only acknowledges and the client
/// discards its token.
pub async fn logout(Extension(_claims): Extension<Claims>) -> impl IntoResponse {
    ok(MessagePayload {
        message: "Logged out successfully".to_string(),
    })
}

fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
