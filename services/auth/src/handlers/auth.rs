use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

use nimbus_core::response::data;
use nimbus_domain::user::PublicUser;

use crate::domain::repository::ProfileRepository;
use crate::error::AuthServiceError;
use crate::middleware::AuthContext;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};
use crate::usecase::register::{RegisterInput, RegisterUseCase};
use crate::usecase::reset::{ForgotPasswordUseCase, ResetPasswordUseCase};
use crate::usecase::token::{LogoutUseCase, RefreshSessionUseCase};
use crate::usecase::verify_email::{ResendVerificationUseCase, VerifyEmailUseCase};

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    /// Unix seconds; the client schedules its refresh off this.
    pub access_token_exp: u64,
}

// ── POST /auth/register ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RegisterUseCase {
        users: state.user_repo(),
        email: state.email.clone(),
        frontend_origin: state.frontend_origin.clone(),
    };

    usecase
        .execute(RegisterInput {
            email: body.email,
            password: body.password,
            display_name: body.display_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        data(json!({ "message": "verification email sent" })),
    ))
}

// ── POST /auth/login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        profiles: state.profile_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };

    let out = usecase
        .execute(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;

    let profile = state.profile_repo().find_by_user(out.user.id).await?;
    let jar = state.cookies.set_access_token(jar, out.access_token);
    let jar = state.cookies.set_refresh_token(jar, out.refresh_token);

    Ok((
        jar,
        data(SessionResponse {
            user: out.user.to_public(profile.as_ref()),
            access_token_exp: out.access_token_exp,
        }),
    ))
}

// ── POST /auth/logout ─────────────────────────────────────────────────────────

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let refresh_value = jar
        .get(&state.cookies.refresh_token_name())
        .map(|c| c.value().to_owned());

    let usecase = LogoutUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    usecase.execute(refresh_value.as_deref()).await?;

    let jar = state.cookies.clear_session(jar);
    Ok((jar, data(json!({ "message": "logged out" }))))
}

// ── POST /auth/refresh ────────────────────────────────────────────────────────

pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthServiceError> {
    let refresh_value = jar
        .get(&state.cookies.refresh_token_name())
        .map(|c| c.value().to_owned())
        .ok_or(AuthServiceError::NoRefreshToken)?;

    let usecase = RefreshSessionUseCase {
        users: state.user_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase.execute(&refresh_value).await?;

    let jar = state.cookies.set_access_token(jar, out.access_token);
    let jar = state.cookies.set_refresh_token(jar, out.refresh_token);

    Ok((
        jar,
        data(json!({ "access_token_exp": out.access_token_exp })),
    ))
}

// ── POST /auth/verify-email/{token} ───────────────────────────────────────────

pub async fn verify_email(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = VerifyEmailUseCase {
        users: state.user_repo(),
        profiles: state.profile_repo(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase.execute(&token).await?;

    let profile = state.profile_repo().find_by_user(out.user.id).await?;
    let jar = state.cookies.set_access_token(jar, out.access_token);
    let jar = state.cookies.set_refresh_token(jar, out.refresh_token);

    Ok((
        jar,
        data(SessionResponse {
            user: out.user.to_public(profile.as_ref()),
            access_token_exp: out.access_token_exp,
        }),
    ))
}

// ── POST /auth/resend-verification-email ──────────────────────────────────────

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ResendVerificationUseCase {
        users: state.user_repo(),
        email: state.email.clone(),
        frontend_origin: state.frontend_origin.clone(),
    };
    usecase.execute(&body.email).await?;

    Ok(data(json!({
        "message": "if that account exists, a verification email was sent"
    })))
}

// ── POST /auth/forgot-password ────────────────────────────────────────────────

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ForgotPasswordUseCase {
        users: state.user_repo(),
        email: state.email.clone(),
        frontend_origin: state.frontend_origin.clone(),
    };
    usecase.execute(&body.email).await?;

    Ok(data(json!({
        "message": "if that account exists, a reset email was sent"
    })))
}

// ── POST /auth/reset-password/{token} ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&token, &body.password).await?;

    Ok(data(json!({ "message": "password updated" })))
}

// ── GET /auth/me ──────────────────────────────────────────────────────────────

pub async fn me(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, AuthServiceError> {
    let profile = state.profile_repo().find_by_user(ctx.user.id).await?;
    Ok(data(ctx.user.to_public(profile.as_ref())))
}
