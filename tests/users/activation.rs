use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{
    factory::{self, UserFactory},
    settings::get_test_settings,
};
use db_adapters::user_adapter::{UserAdapter, UserMutation, UserQuery};
use sea_orm::{ActiveModelTrait, DbErr};
use test_utils::RecordingMailer;
use use_cases::{
    constants::{EMAIL_NOT_FOUND, STALE_TOKEN_ERROR},
    signals::EventBus,
    users::{
        activate::activate_user,
        register::register_user,
        resend_activation::resend_activation_email,
        subscribers::subscribe_confirmation_email,
        types::{ActivationRequest, RegisterRequest},
    },
    UseCaseError,
};
use utils::auth::uid::encode_uid;

use crate::utils::{confirming_settings, init_app, uid_and_token, Connections};

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "password".to_string(),
        first_name: "Lynx".to_string(),
        last_name: "Levin".to_string(),
    }
}

fn assert_stale(res: Result<impl std::fmt::Debug, UseCaseError>) {
    match res {
        Err(UseCaseError::BadRequest(message)) => {
            let errors: serde_json::Value = serde_json::from_str(&message).unwrap();
            assert_eq!(
                errors,
                serde_json::json!({ "non_field_errors": [STALE_TOKEN_ERROR] })
            );
        }
        other => panic!("Expected a stale token error, got {:?}", other),
    }
}

#[tokio::test]
async fn register_then_activate_from_email() -> Result<(), DbErr> {
    let Connections {
        db,
        settings,
        tokens,
        bus,
        mailer,
    } = init_app(confirming_settings()).await?;

    let registered = register_user(
        register_request("lynx@test.com"),
        &settings,
        &tokens,
        mailer.as_ref(),
        UserAdapter::init(&db),
    )
    .await
    .unwrap();
    assert!(!registered.is_active);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let (uid, token) = uid_and_token(&settings, &sent[0].text);
    assert_eq!(uid, encode_uid(registered.id));

    let activated = activate_user(
        &db,
        tokens.clone(),
        bus.clone(),
        ActivationRequest::new(uid.clone(), token.clone()),
    )
    .await
    .unwrap();
    assert_eq!(activated.id, registered.id);
    assert!(activated.is_active);

    let user_in_db = UserAdapter::init(&db)
        .get_by_id(registered.id)
        .await?
        .unwrap();
    assert!(user_in_db.is_active);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.ends_with("Your account is active"));

    // Same link again.
    let res = activate_user(&db, tokens, bus, ActivationRequest::new(uid, token)).await;
    assert_stale(res);
    assert_eq!(mailer.sent().len(), 2);

    Ok(())
}

#[tokio::test]
async fn html_and_text_links_match() -> Result<(), DbErr> {
    let Connections {
        db,
        settings,
        tokens,
        mailer,
        ..
    } = init_app(get_test_settings()).await?;

    register_user(
        register_request("lynx@test.com"),
        &settings,
        &tokens,
        mailer.as_ref(),
        UserAdapter::init(&db),
    )
    .await
    .unwrap();

    let sent = mailer.sent();
    assert_eq!(
        uid_and_token(&settings, &sent[0].text),
        uid_and_token(&settings, &sent[0].html)
    );
    Ok(())
}

#[tokio::test]
async fn resent_link_goes_stale_once_another_link_is_used() -> Result<(), DbErr> {
    let Connections {
        db,
        settings,
        tokens,
        bus,
        mailer,
    } = init_app(get_test_settings()).await?;
    let user = factory::user().is_active(false).insert(&db).await?;

    for _ in 0..2 {
        resend_activation_email(
            user.email.clone(),
            &settings,
            &tokens,
            mailer.as_ref(),
            UserAdapter::init(&db),
        )
        .await
        .unwrap();
    }
    let sent = mailer.sent();
    let (uid, first_token) = uid_and_token(&settings, &sent[0].text);
    let (_, second_token) = uid_and_token(&settings, &sent[1].text);

    activate_user(
        &db,
        tokens.clone(),
        bus.clone(),
        ActivationRequest::new(uid.clone(), second_token),
    )
    .await
    .unwrap();

    let res = activate_user(
        &db,
        tokens.clone(),
        bus,
        ActivationRequest::new(uid, first_token),
    )
    .await;
    assert_stale(res);

    // Nothing left to resend.
    let res = resend_activation_email(
        user.email.clone(),
        &settings,
        &tokens,
        mailer.as_ref(),
        UserAdapter::init(&db),
    )
    .await;
    match res {
        Err(UseCaseError::NotFound(message)) => assert_eq!(message, EMAIL_NOT_FOUND),
        other => panic!("Unexpected resend result: {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn failing_confirmation_mail_does_not_undo_activation() -> Result<(), DbErr> {
    let settings = confirming_settings();
    let Connections { db, tokens, .. } = init_app(settings.clone()).await?;
    let bus = Arc::new(EventBus::new());
    subscribe_confirmation_email(&bus, &settings, Arc::new(RecordingMailer::failing()));
    let user = factory::user().is_active(false).insert(&db).await?;
    let request = ActivationRequest::new(encode_uid(user.id), tokens.make_token(&user).unwrap());

    let res = activate_user(&db, tokens, bus, request).await;

    assert!(matches!(res, Err(UseCaseError::InternalServerError(_))));
    let user_in_db = UserAdapter::init(&db).get_by_id(user.id).await?.unwrap();
    assert!(user_in_db.is_active);
    Ok(())
}

#[tokio::test]
async fn login_after_link_was_issued_makes_it_stale() -> Result<(), DbErr> {
    let Connections { db, tokens, bus, .. } = init_app(get_test_settings()).await?;
    let first_login = Utc::now() - Duration::days(1);
    let user = factory::user()
        .is_active(false)
        .last_login(Some(first_login.into()))
        .insert(&db)
        .await?;
    let request = ActivationRequest::new(encode_uid(user.id), tokens.make_token(&user).unwrap());

    UserAdapter::init(&db)
        .update_last_login(user.clone(), Utc::now().into())
        .await?;
    let res = activate_user(&db, tokens, bus, request).await;

    assert_stale(res);
    let user_in_db = UserAdapter::init(&db).get_by_id(user.id).await?.unwrap();
    assert!(!user_in_db.is_active);
    Ok(())
}
