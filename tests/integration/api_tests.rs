//! API integration tests
//!
//! These need a running server and database: `cargo test -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Username that does not collide with earlier runs
fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..12])
}

async fn register(client: &Client, username: &str, user_type: &str, journal_name: Option<&str>) -> Value {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username,
            "email": format!("{}@example.org", username),
            "password": "correct-horse-battery",
            "user_type": user_type,
            "journal_name": journal_name
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse register response")
}

async fn login(client: &Client, username: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": username,
            "password": "correct-horse-battery"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a publisher and open its journal for submissions
async fn open_journal(client: &Client) -> (String, i64) {
    let username = unique("pub");
    let registration = register(client, &username, "publisher", Some("Test Law Review")).await;
    let journal_id = registration["journal"]["id"].as_i64().expect("No journal provisioned");
    let token = login(client, &username).await;

    let response = client
        .put(format!("{}/journals/mine", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "status": "open", "rubric": "Originality, rigor, clarity" }))
        .send()
        .await
        .expect("Failed to open journal");
    assert!(response.status().is_success());

    (token, journal_id)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_creates_profile() {
    let client = Client::new();
    let username = unique("res");
    let registration = register(&client, &username, "researcher", None).await;
    assert_eq!(registration["profile"]["user_type"], "researcher");
    assert_eq!(registration["profile"]["billing_confirmed"], false);
    assert!(registration["journal"].is_null());

    let token = login(&client, &username).await;
    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["user"]["username"], username.as_str());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_username_conflicts() {
    let client = Client::new();
    let username = unique("dup");
    register(&client, &username, "researcher", None).await;

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "username": username.to_uppercase(),
            "email": "other@example.org",
            "password": "correct-horse-battery",
            "user_type": "researcher"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "nobody-here",
            "password": "wrong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/papers", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_editor_roster_rules() {
    let client = Client::new();
    let (publisher, _) = open_journal(&client).await;

    let erin = unique("erin");
    register(&client, &erin, "editor", None).await;
    let response = client
        .post(format!("{}/account/editors", BASE_URL))
        .bearer_auth(&publisher)
        .json(&json!({ "editor": erin }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    // A researcher cannot be assigned nor removed, and a refused removal
    // leaves the existing roster alone
    let alice = unique("alice");
    register(&client, &alice, "researcher", None).await;
    for request in [
        client
            .post(format!("{}/account/editors", BASE_URL))
            .json(&json!({ "editor": alice })),
        client.delete(format!("{}/account/editors/{}", BASE_URL, alice)),
    ] {
        let response = request.bearer_auth(&publisher).send().await.expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "InvalidRole");
    }

    let roster: Value = client
        .get(format!("{}/account/editors", BASE_URL))
        .bearer_auth(&publisher)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let roster = roster.as_array().expect("Not an array");
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0]["editor_username"], erin.as_str());

    // Unknown user
    let response = client
        .post(format!("{}/account/editors", BASE_URL))
        .bearer_auth(&publisher)
        .json(&json!({ "editor": unique("ghost") }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // An editor holds at most one assignment

    let (other_publisher, _) = open_journal(&client).await;
    let response = client
        .post(format!("{}/account/editors", BASE_URL))
        .bearer_auth(&other_publisher)
        .json(&json!({ "editor": erin }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .delete(format!("{}/account/editors/{}", BASE_URL, erin))
        .bearer_auth(&publisher)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore]
async fn test_billing_customer_is_created_once() {
    let client = Client::new();
    let rhoda = unique("rhoda");
    register(&client, &rhoda, "researcher", None).await;
    let token = login(&client, &rhoda).await;

    let mut results = Vec::new();
    for _ in 0..2 {
        let response = client
            .post(format!("{}/account/billing/customer", BASE_URL))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status();
        let body: Value = response.json().await.expect("Failed to parse response");
        results.push((status, body));
    }

    let status: Value = client
        .get(format!("{}/account/billing", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    if results[0].0 == StatusCode::OK {
        // Replaying returns the id on record instead of a new customer
        let billing_id = results[0].1["billing_id"].as_str().expect("No billing id");
        assert_eq!(results[1].0, StatusCode::OK);
        assert_eq!(results[1].1["billing_id"], billing_id);
        assert_eq!(status["billing_id"], billing_id);
    } else {
        // Without a reachable provider nothing is recorded
        assert_eq!(results[0].0, StatusCode::BAD_GATEWAY);
        assert_eq!(results[1].0, StatusCode::BAD_GATEWAY);
        assert!(status["billing_id"].is_null());
    }
    assert_eq!(status["billing_confirmed"], false);

    // Path-like intent ids never reach the provider
    let response = client
        .post(format!("{}/account/billing/confirm", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "setup_intent": "../customers/cus_other" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_evaluation_scenario() {
    let client = Client::new();
    let (publisher, journal_id) = open_journal(&client).await;

    let erin = unique("erin");
    register(&client, &erin, "editor", None).await;
    let response = client
        .post(format!("{}/account/editors", BASE_URL))
        .bearer_auth(&publisher)
        .json(&json!({ "editor": erin }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let editor = login(&client, &erin).await;

    let rhoda = unique("rhoda");
    register(&client, &rhoda, "researcher", None).await;
    let researcher = login(&client, &rhoda).await;

    // Submit
    let response = client
        .post(format!("{}/papers", BASE_URL))
        .bearer_auth(&researcher)
        .json(&json!({
            "title": "The Limits of Standing",
            "field_of_law": "constitutional",
            "authors": "R. Researcher",
            "significance": "Reframes the injury-in-fact inquiry",
            "best_offer": "top50",
            "submission_criteria_satisfied": true,
            "journal_ids": [journal_id, journal_id]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let paper: Value = response.json().await.expect("Failed to parse response");
    let uuid = paper["uuid"].as_str().expect("No uuid").to_string();
    assert_eq!(paper["journals"].as_array().map(Vec::len), Some(1));

    // Re-associating does not create a second evaluation
    let response = client
        .post(format!("{}/papers/{}/journals", BASE_URL, uuid))
        .bearer_auth(&researcher)
        .json(&json!({ "journal_ids": [journal_id] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let evaluations: Value = client
        .get(format!("{}/papers/{}/evaluations", BASE_URL, uuid))
        .bearer_auth(&researcher)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let evaluations = evaluations.as_array().expect("Not an array");
    assert_eq!(evaluations.len(), 1);
    let evaluation = &evaluations[0];
    assert_eq!(evaluation["status"], "not_started");
    assert!(evaluation["offered"].is_null());
    assert!(evaluation["rating"].is_null());
    // The journal's rubric stays with the journal
    assert!(evaluation["rubric"].is_null());
    let id = evaluation["id"].as_i64().expect("No id");

    let as_researcher: Value = client
        .get(format!("{}/evaluations/{}", BASE_URL, id))
        .bearer_auth(&researcher)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(as_researcher["id"], id);
    assert!(as_researcher["rubric"].is_null());

    let as_editor: Value = client
        .get(format!("{}/evaluations/{}", BASE_URL, id))
        .bearer_auth(&editor)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(as_editor["rubric"], "Originality, rigor, clarity");

    // The editor sees it in the journal queue
    let queue: Value = client
        .get(format!("{}/journals/mine/submissions?status=not_started", BASE_URL))
        .bearer_auth(&editor)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(queue
        .as_array()
        .expect("Not an array")
        .iter()
        .any(|s| s["evaluation"]["id"] == id));

    // A decision before review starts is rejected
    let response = client
        .post(format!("{}/evaluations/{}/decision", BASE_URL, id))
        .bearer_auth(&editor)
        .json(&json!({ "offered": "accept", "rating": 8 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Start review
    let response = client
        .post(format!("{}/evaluations/{}/start", BASE_URL, id))
        .bearer_auth(&editor)
        .json(&json!({ "decision": "accept_for_review" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "under_review");
    assert!(body["review_start_time"].is_string());

    // Out of range rating changes nothing
    let response = client
        .post(format!("{}/evaluations/{}/decision", BASE_URL, id))
        .bearer_auth(&editor)
        .json(&json!({ "offered": "accept", "rating": 11 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Decide
    let response = client
        .post(format!("{}/evaluations/{}/decision", BASE_URL, id))
        .bearer_auth(&editor)
        .json(&json!({ "offered": "accept", "rating": 8, "comments": "Strong piece" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "complete");
    assert_eq!(body["offered"], "accept");
    assert_eq!(body["rating"], 8);

    // Only the researcher answers the offer, and only once
    let response = client
        .post(format!("{}/evaluations/{}/offer-response", BASE_URL, id))
        .bearer_auth(&editor)
        .json(&json!({ "offer_accepted": "yes" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{}/evaluations/{}/offer-response", BASE_URL, id))
        .bearer_auth(&researcher)
        .json(&json!({ "offer_accepted": "yes" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["offer_accepted"], "yes");
    assert_eq!(body["status"], "complete");
    assert!(body["rubric"].is_null());

    let response = client
        .post(format!("{}/evaluations/{}/offer-response", BASE_URL, id))
        .bearer_auth(&researcher)
        .json(&json!({ "offer_accepted": "no" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_closed_journal_rejects_submissions() {
    let client = Client::new();
    let username = unique("pub");
    let registration = register(&client, &username, "publisher", Some("Closed Review")).await;
    let journal_id = registration["journal"]["id"].as_i64().expect("No journal provisioned");

    let rhoda = unique("rhoda");
    register(&client, &rhoda, "researcher", None).await;
    let researcher = login(&client, &rhoda).await;

    let response = client
        .post(format!("{}/papers", BASE_URL))
        .bearer_auth(&researcher)
        .json(&json!({
            "title": "Too Early",
            "field_of_law": "contracts",
            "authors": "R. Researcher",
            "significance": "None yet",
            "submission_criteria_satisfied": true,
            "journal_ids": [journal_id]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_contact_form_is_public() {
    let client = Client::new();

    let response = client
        .post(format!("{}/contact", BASE_URL))
        .json(&json!({
            "email": "reader@example.org",
            "subject": "Question",
            "message": "How do I submit?"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
}
