//! Provider sign-in handlers. Both providers share the reconciliation flow
//! here; only the credential exchange differs.

pub mod apple;
pub mod google;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::generate_session_token;
use crate::database::users::{self, NewProviderUser, User};
use crate::error::ApiError;
use crate::i18n::{self, Lang};
use crate::providers::{Provider, ProviderIdentity};

/// Sign-in endpoints collapse to a concrete language: `all` has no meaning
/// for a user record.
pub(crate) fn auth_lang(headers: &axum::http::HeaderMap) -> Lang {
    match Lang::resolve(headers) {
        Lang::Ar => Lang::Ar,
        _ => Lang::En,
    }
}

pub(crate) struct SignInOutcome {
    pub user: User,
    pub message: String,
    pub complete_profile: bool,
}

/// Reconcile verified provider claims against the local account store.
pub(crate) async fn reconcile(
    pool: &PgPool,
    identity: ProviderIdentity,
    provider: Provider,
    notification_token: Option<String>,
) -> Result<SignInOutcome, ApiError> {
    let notification_token = notification_token.unwrap_or_default();

    let Some(user) = users::find_by_email(pool, &identity.email).await? else {
        if !identity.email_verified {
            let message = match provider {
                Provider::Apple => "Your apple account email is not verified",
                Provider::Google => "Your account email is not verified",
            };
            return Err(ApiError::email_not_verified(message));
        }
        let user = users::insert_provider_user(
            pool,
            &NewProviderUser {
                email: identity.email.clone(),
                first_name: identity.first_name,
                last_name: identity.last_name,
                image: identity.picture,
                provider,
                notification_token,
            },
        )
        .await?;
        return Ok(SignInOutcome {
            message: format!("Registered successfully as {}", user.email),
            complete_profile: true,
            user,
        });
    };

    // Provider-link enforcement is intentionally relaxed: any account with
    // this email may sign in through either provider.
    if user.is_blocked {
        return Err(ApiError::account_blocked(
            "Your account is blocked, please contact the support team",
        ));
    }

    if !user.has_complete_profile() {
        return Ok(SignInOutcome {
            user,
            message: "Please complete your profile to continue".to_string(),
            complete_profile: true,
        });
    }

    users::update_notification_token(pool, user.id, &notification_token).await?;
    let message = format!(
        "Welcome back {}!",
        user.first_name.clone().unwrap_or_default()
    );
    Ok(SignInOutcome {
        user: User {
            notification_token: Some(notification_token),
            ..user
        },
        message,
        complete_profile: false,
    })
}

/// Issue the session token and build the shared sign-in envelope.
pub(crate) fn respond(
    outcome: SignInOutcome,
    lang: Lang,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let token = generate_session_token(&outcome.user)?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": i18n::translate(&outcome.message, lang),
            "completeProfile": outcome.complete_profile,
            "data": outcome.user.public(),
            "token": token,
        })),
    ))
}
