//! `HttpEmailSender` against a mock email API.

mod support;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reminders::config::ReminderSettings;
use reminders::email::{EmailMessage, EmailSender, HttpEmailSender};
use reminders::errors::ReminderError;
use reminders::jobs::{run_subscription_reminders, DeliveryOutcome};
use reminders::subscription::ProviderKind;

use support::{add_account, setup_db};

const FROM: &str = "reminders@marketplace.example.dz";

fn sender(server: &MockServer) -> HttpEmailSender {
    HttpEmailSender::new(format!("{}/emails", server.uri()), "re_test_key", FROM)
        .expect("client builds")
}

fn message(to: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Your subscription expires in 2 days".to_string(),
        html: "<p>Renew soon</p>".to_string(),
    }
}

#[tokio::test]
async fn posts_message_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .and(body_partial_json(json!({
            "from": FROM,
            "to": ["sara@example.com"],
            "subject": "Your subscription expires in 2 days",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_123" })))
        .expect(1)
        .mount(&server)
        .await;

    sender(&server)
        .send(&message("sara@example.com"))
        .await
        .expect("send succeeds");
}

#[tokio::test]
async fn rejected_request_is_an_email_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "invalid `to` field" })),
        )
        .mount(&server)
        .await;

    let err = sender(&server)
        .send(&message("sara@example.com"))
        .await
        .unwrap_err();

    match err {
        ReminderError::EmailError(detail) => {
            assert!(detail.contains("422"));
            assert!(detail.contains("invalid `to` field"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_recipient_never_reaches_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = sender(&server).send(&message("not-an-address")).await;

    assert!(matches!(result, Err(ReminderError::EmailError(_))));
}

#[tokio::test]
async fn job_delivers_through_http_sender() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({ "to": ["cook-mail@example.com"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_1" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(json!({ "to": ["worker-mail@example.com"] })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let db = setup_db().await;
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    add_account(
        &db,
        ProviderKind::Cook,
        "cook-mail",
        "Hana",
        "active",
        Some(now + Duration::days(2)),
    )
    .await;
    add_account(
        &db,
        ProviderKind::Worker,
        "worker-mail",
        "Omar",
        "trial",
        Some(now + Duration::days(1)),
    )
    .await;

    let mailer = sender(&server);
    let report = run_subscription_reminders(&*db, Some(&mailer), &ReminderSettings::default(), now)
        .await
        .unwrap();

    assert_eq!(report.sent, 2);
    assert_eq!(report.emails_sent(), 1);
    assert_eq!(report.emails_failed(), 1);

    let cook = report
        .deliveries
        .iter()
        .find(|d| d.user_id == "cook-mail")
        .unwrap();
    assert_eq!(cook.outcome, DeliveryOutcome::EmailSent);
}
