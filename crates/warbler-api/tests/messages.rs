mod common;

use axum::http::StatusCode;

use common::{TestApp, assert_redirect, json, session_cookie, set_cookie};

#[tokio::test]
async fn anonymous_post_creates_nothing() {
    let app = TestApp::new();
    let alice = app.create_user("alice");

    let resp = app.post("/messages/new", "text=sneaky", None).await;
    assert_redirect(&resp, "/");
    assert!(set_cookie(&resp, "flash").is_some());

    assert_eq!(app.message_count(alice.id), 0);
    assert!(app.db().list_messages().unwrap().is_empty());
}

#[tokio::test]
async fn message_length_boundary() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let cookie = app.session_for(&alice);

    let at_limit = format!("text={}", "a".repeat(140));
    let resp = app.post("/messages/new", &at_limit, Some(&cookie)).await;
    assert_redirect(&resp, &format!("/users/{}", alice.id));

    let over_limit = format!("text={}", "a".repeat(141));
    let resp = app.post("/messages/new", &over_limit, Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json(resp).await;
    assert!(body["errors"]["text"].is_array());

    let resp = app.post("/messages/new", "text=", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(app.message_count(alice.id), 1);
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let cookie = app.session_for(&alice);

    for form in ["text=+++", "text=%0A%09", "text="] {
        let resp = app.post("/messages/new", form, Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", form);
        let body = json(resp).await;
        assert_eq!(body["errors"]["text"][0], "This field is required.");
    }

    assert_eq!(app.message_count(alice.id), 0);
}

#[tokio::test]
async fn length_counts_characters_not_bytes() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let cookie = app.session_for(&alice);

    // 140 two-byte characters
    let text = "é".repeat(140);
    let encoded: String = text.chars().map(|_| "%C3%A9").collect();
    let resp = app
        .post("/messages/new", &format!("text={}", encoded), Some(&cookie))
        .await;
    assert_redirect(&resp, &format!("/users/{}", alice.id));
    assert_eq!(app.message_count(alice.id), 1);
}

#[tokio::test]
async fn message_lifecycle_end_to_end() {
    let app = TestApp::new();

    let resp = app
        .post(
            "/signup",
            "username=alice&email=alice%40test.com&password=password123",
            None,
        )
        .await;
    assert_redirect(&resp, "/");

    let alice = app.db().get_user_by_username("alice").unwrap().unwrap();
    assert_ne!(alice.password, "password123");

    let resp = app.post("/login", "username=alice&password=password123", None).await;
    assert_redirect(&resp, "/");
    let cookie = session_cookie(&resp).expect("session cookie");

    let resp = app.post("/messages/new", "text=hello+world", Some(&cookie)).await;
    assert_redirect(&resp, &format!("/users/{}", alice.id));
    assert_eq!(app.message_count(alice.id), 1);

    let profile = json(app.get(&format!("/users/{}", alice.id), None).await).await;
    assert_eq!(profile["user"]["username"], "alice");
    assert_eq!(profile["stats"]["messages"], 1);
    assert_eq!(profile["messages"][0]["text"], "hello world");
    assert_eq!(profile["messages"][0]["user_id"], alice.id);
    let message_id = profile["messages"][0]["id"].as_i64().unwrap();

    let feed = json(app.get("/", Some(&cookie)).await).await;
    assert_eq!(feed["view"], "feed");
    assert_eq!(feed["messages"][0]["text"], "hello world");
    assert_eq!(feed["messages"][0]["username"], "alice");

    let resp = app
        .post(&format!("/messages/{}/delete", message_id), "", Some(&cookie))
        .await;
    assert_redirect(&resp, &format!("/users/{}", alice.id));
    assert_eq!(app.message_count(alice.id), 0);
}

#[tokio::test]
async fn feed_is_newest_first_across_users() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let alice_cookie = app.session_for(&alice);
    let bob_cookie = app.session_for(&bob);

    app.post("/messages/new", "text=first", Some(&alice_cookie)).await;
    app.post("/messages/new", "text=second", Some(&bob_cookie)).await;
    app.post("/messages/new", "text=third", Some(&alice_cookie)).await;

    let feed = json(app.get("/", Some(&bob_cookie)).await).await;
    let texts: Vec<&str> = feed["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["third", "second", "first"]);
}

#[tokio::test]
async fn only_the_owner_can_delete_a_message() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let mallory = app.create_user("mallory");
    let message = app.db().insert_message(alice.id, "mine").unwrap();

    let uri = format!("/messages/{}/delete", message.id);

    let resp = app.post(&uri, "", Some(&app.session_for(&mallory))).await;
    assert_redirect(&resp, "/");
    assert!(set_cookie(&resp, "flash").is_some());
    assert_eq!(app.message_count(alice.id), 1);

    let resp = app.post(&uri, "", None).await;
    assert_redirect(&resp, "/");
    assert_eq!(app.message_count(alice.id), 1);

    let resp = app.post(&uri, "", Some(&app.session_for(&alice))).await;
    assert_redirect(&resp, &format!("/users/{}", alice.id));
    assert_eq!(app.message_count(alice.id), 0);
}

#[tokio::test]
async fn deleting_unknown_message_is_not_found() {
    let app = TestApp::new();
    let alice = app.create_user("alice");

    let resp = app
        .post("/messages/999/delete", "", Some(&app.session_for(&alice)))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_route_is_post_only() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let message = app.db().insert_message(alice.id, "keep me").unwrap();

    let resp = app
        .get(&format!("/messages/{}/delete", message.id), Some(&app.session_for(&alice)))
        .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(app.message_count(alice.id), 1);
}

#[tokio::test]
async fn profile_shows_at_most_one_hundred_messages() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    for i in 0..105 {
        app.db().insert_message(alice.id, &format!("warble {}", i)).unwrap();
    }

    let profile = json(app.get(&format!("/users/{}", alice.id), None).await).await;
    let messages = profile["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 100);
    assert_eq!(messages[0]["text"], "warble 104");
    assert_eq!(profile["stats"]["messages"], 105);
}

#[tokio::test]
async fn likes_are_recorded_per_call() {
    let app = TestApp::new();
    let alice = app.create_user("alice");
    let bob = app.create_user("bob");
    let message = app.db().insert_message(bob.id, "likeable").unwrap();
    let cookie = app.session_for(&alice);
    let like_uri = format!("/messages/{}/like", message.id);

    // Repeated likes are kept as separate rows.
    assert_redirect(&app.post(&like_uri, "", Some(&cookie)).await, "/");
    assert_redirect(&app.post(&like_uri, "", Some(&cookie)).await, "/");
    assert_eq!(app.db().user_stats(alice.id).unwrap().likes, 2);

    let liked = json(app.get(&format!("/users/{}/likes", alice.id), None).await).await;
    assert_eq!(liked["messages"].as_array().unwrap().len(), 1);
    assert_eq!(liked["messages"][0]["text"], "likeable");

    let resp = app
        .post(&format!("/messages/{}/unlike", message.id), "", Some(&cookie))
        .await;
    assert_redirect(&resp, "/");
    assert_eq!(app.db().user_stats(alice.id).unwrap().likes, 0);

    let resp = app.post("/messages/999/like", "", Some(&cookie)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.post(&like_uri, "", None).await;
    assert_redirect(&resp, "/");
    assert_eq!(app.db().user_stats(alice.id).unwrap().likes, 0);
}
