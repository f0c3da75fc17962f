mod common;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chrono::{Duration, Utc};
use nila_store_api::{
    dto::auth::VerifyOtpRequest,
    entity::verification_challenges::{ActiveModel as ChallengeActive, Entity as Challenges},
    services::auth_service::{self, MAX_OTP_ATTEMPTS},
    state::AppState,
};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

const OTP: &str = "482913";

async fn signup_challenge(state: &AppState) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let otp_hash = Argon2::default()
        .hash_password(OTP.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    let token = Uuid::new_v4();
    let now = Utc::now();
    ChallengeActive {
        token: Set(token),
        purpose: Set("signup".into()),
        email: Set(format!("{}@example.com", common::unique("otp"))),
        phone: Set("9876543210".into()),
        otp_hash: Set(otp_hash),
        attempts: Set(0),
        verified: Set(false),
        expires_at: Set((now + Duration::minutes(5)).into()),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(token)
}

fn attempt(token: Uuid, otp: &str) -> VerifyOtpRequest {
    VerifyOtpRequest {
        challenge_token: token,
        otp: otp.to_string(),
    }
}

// Concurrent wrong guesses cannot push the counter past the budget, and a
// spent challenge rejects even the right code.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_guesses_respect_the_attempt_budget() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, _root) = common::setup_state(&database_url).await?;
    let token = signup_challenge(&state).await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            auth_service::verify_signup_otp(&state, attempt(token, "000000")).await
        }));
    }
    for handle in handles {
        let err = handle.await?.expect_err("wrong code");
        assert_eq!(err.to_string(), "Incorrect OTP or session expired.");
    }

    let challenge = Challenges::find_by_id(token)
        .one(&state.orm)
        .await?
        .expect("challenge");
    assert_eq!(challenge.attempts, MAX_OTP_ATTEMPTS);

    let err = auth_service::verify_signup_otp(&state, attempt(token, OTP))
        .await
        .expect_err("budget spent");
    assert_eq!(err.to_string(), "Incorrect OTP or session expired.");

    Ok(())
}

#[tokio::test]
async fn right_code_within_budget_verifies() -> anyhow::Result<()> {
    let Some(database_url) = common::database_url() else {
        return Ok(());
    };
    let (state, _root) = common::setup_state(&database_url).await?;
    let token = signup_challenge(&state).await?;

    for _ in 0..2 {
        assert!(
            auth_service::verify_signup_otp(&state, attempt(token, "111111"))
                .await
                .is_err()
        );
    }
    let resp = auth_service::verify_signup_otp(&state, attempt(token, OTP)).await?;
    assert_eq!(resp.message, "OTP verified!");

    let challenge = Challenges::find_by_id(token)
        .one(&state.orm)
        .await?
        .expect("challenge");
    assert!(challenge.verified);
    assert_eq!(challenge.attempts, 3);

    Ok(())
}
