// End-to-end escalation flows against mocked Groq and Resend endpoints

use smart_escalate::{
    BotError, Decision, GroqProvider, ResendSender, SupportBot, TicketPriority, UserProfile,
};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
    })
}

async fn mock_groq(server: &MockServer, reply: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mock_resend(server: &MockServer, to: &str, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(body_partial_json(serde_json::json!({ "to": [to] })))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({"id": "em_1"})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn create_bot(groq: &MockServer, resend: &MockServer) -> SupportBot {
    SupportBot::builder()
        .name("Smart Escalate AI")
        .provider(Box::new(GroqProvider::with_base_url("gsk-test", groq.uri())))
        .email_sender(Box::new(
            ResendSender::new("re_test", "tickets@smartescalate.ai")
                .with_send_url(format!("{}/emails", resend.uri())),
        ))
        .build()
        .expect("Failed to build bot")
}

#[tokio::test]
async fn test_company_issue_goes_to_assistant() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_groq(&groq, "1. Restart your JioFiber router.\n2. Check the LOS light.", 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    let response = bot
        .send_message(session_id, "My Jio network is not working")
        .await
        .expect("Failed to process message");

    assert_eq!(response.decision, Decision::ConsultAssistant);
    assert_eq!(response.company.as_deref(), Some("Jio"));
    assert!(response.ticket.is_none());
    assert!(response.message.contains("Restart your JioFiber router"));
    assert!(bot.tickets(&session_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_affirmative_after_offer_creates_ticket() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_groq(
        &groq,
        "Please restart your phone. If that doesn't help, I can create a ticket for you.",
        1,
    )
    .await;
    mock_resend(&resend, "customercare@myvi.in", 200, 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot
        .create_session(UserProfile::new("Asha", "asha@example.com"))
        .await
        .unwrap();

    let first = bot
        .send_message(session_id, "My Vodafone Idea sim shows no service")
        .await
        .unwrap();
    assert_eq!(first.decision, Decision::ConsultAssistant);
    assert_eq!(first.company.as_deref(), Some("Vi"));

    let second = bot.send_message(session_id, "yes please escalate").await.unwrap();
    assert_eq!(second.decision, Decision::CreateTicket);

    let ticket = second.ticket.expect("ticket should be created");
    assert_eq!(ticket.company, "Vi");
    assert_eq!(ticket.company_email, "customercare@myvi.in");
    assert_eq!(ticket.description, "My Vodafone Idea sim shows no service");
    assert!(ticket.email_sent);
    assert!(second.message.contains(&ticket.ticket_number));
}

#[tokio::test]
async fn test_plain_yes_without_offer_stays_with_assistant() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_groq(&groq, "Great, is the router light green now?", 2).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    bot.send_message(session_id, "My BSNL landline is dead").await.unwrap();
    let response = bot.send_message(session_id, "yes").await.unwrap();

    assert_eq!(response.decision, Decision::ConsultAssistant);
    assert!(response.ticket.is_none());
}

#[tokio::test]
async fn test_escalation_without_company_asks_first() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_groq(&groq, "unused", 0).await;
    mock_resend(&resend, "helpdesk@actcorp.in", 200, 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    let asked = bot
        .send_message(session_id, "I need to talk to someone about my broadband")
        .await
        .unwrap();
    assert_eq!(asked.decision, Decision::AskForCompany);
    assert!(asked.ticket.is_none());
    assert!(asked.message.contains("Which company"));

    let answered = bot.send_message(session_id, "ACT Fibernet").await.unwrap();
    assert_eq!(answered.decision, Decision::CreateTicket);
    let ticket = answered.ticket.unwrap();
    assert_eq!(ticket.company_email, "helpdesk@actcorp.in");
    assert_eq!(
        ticket.description,
        "I need to talk to someone about my broadband"
    );
}

#[tokio::test]
async fn test_urgent_escalation_priority() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_resend(&resend, "121@in.airtel.com", 200, 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    let response = bot
        .send_message(
            session_id,
            "Airtel outage at our office, this is urgent, escalate now",
        )
        .await
        .unwrap();

    let ticket = response.ticket.unwrap();
    assert_eq!(ticket.priority, TicketPriority::Urgent);
    assert_eq!(ticket.company_email, "121@in.airtel.com");
    assert!(response.message.contains("Priority: URGENT"));
}

#[tokio::test]
async fn test_repeated_attempts_raise_priority() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_groq(&groq, "Have you tried reinstalling the app?", 3).await;
    mock_resend(&resend, "help@tataplay.com", 200, 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    bot.send_message(session_id, "Tata Play app will not load channels")
        .await
        .unwrap();
    bot.send_message(session_id, "Reinstalled it, still broken").await.unwrap();
    bot.send_message(session_id, "Cleared the cache too").await.unwrap();

    let response = bot
        .send_message(session_id, "Please raise a ticket")
        .await
        .unwrap();
    assert_eq!(response.ticket.unwrap().priority, TicketPriority::High);
}

#[tokio::test]
async fn test_provider_error_offers_ticket() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {"message": "model is not available", "type": "invalid_request_error", "param": null, "code": "model_not_found"}
        })))
        .mount(&groq)
        .await;
    mock_resend(&resend, "helpdesk@actcorp.in", 200, 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    let failed = bot
        .send_message(session_id, "My ACT Fibernet connection keeps dropping")
        .await
        .expect("provider errors should not fail the turn");
    assert_eq!(failed.decision, Decision::ConsultAssistant);
    assert!(failed.message.contains("technical difficulties"));

    let confirmed = bot.send_message(session_id, "yes").await.unwrap();
    assert_eq!(confirmed.decision, Decision::CreateTicket);
    assert!(confirmed.ticket.unwrap().email_sent);
}

#[tokio::test]
async fn test_email_failure_still_records_ticket() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    mock_resend(&resend, "pgcell@bsnl.co.in", 500, 1).await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    let response = bot
        .send_message(session_id, "BSNL complaint about billing")
        .await
        .unwrap();

    let ticket = response.ticket.unwrap();
    assert!(!ticket.email_sent);
    assert!(response.message.contains("pgcell@bsnl.co.in"));

    let stored = bot.tickets(&session_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].email_sent);
}

#[tokio::test]
async fn test_concurrent_turn_is_rejected() {
    let groq = MockServer::start().await;
    let resend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("Checking..."))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&groq)
        .await;

    let bot = create_bot(&groq, &resend);
    let session_id = bot.create_session(UserProfile::guest()).await.unwrap();

    let (first, second) = tokio::join!(
        bot.send_message(session_id, "Wifi is slow"),
        bot.send_message(session_id, "Still slow")
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(BotError::TurnInProgress(id)) if id == session_id));

    let session = bot.get_session(&session_id).await.unwrap().unwrap();
    assert_eq!(session.conversation.context.attempt_count, 1);

    // the lock is released once the first turn finishes
    assert!(bot.send_message(session_id, "Any update?").await.is_ok());
}
