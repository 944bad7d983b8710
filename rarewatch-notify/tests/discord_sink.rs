//! Discord sink against a local mock of the REST API.

use httpmock::prelude::*;
use serde_json::json;

use rarewatch_core::{Action, Creation};
use rarewatch_notify::{Announcement, DiscordNotifier, Notifier, NotifyError};

fn announcement() -> Announcement {
    let creation = Creation::new("Genesis", "https://superrare.com/artwork/1");
    let action = Action::new("Bid 1 ETH", Some("0xbid".to_string()));
    Announcement::new(&creation, &action)
}

async fn mock_login(server: &MockServer, guild_id: &str) {
    server.mock_async(|when, then| {
        when.method(GET)
            .path("/users/@me")
            .header("Authorization", "Bot secret");
        then.status(200)
            .json_body(json!({"id": "42", "username": "rarebot", "avatar": "abc"}));
    })
    .await;
    server.mock_async(|when, then| {
        when.method(GET).path("/channels/7");
        then.status(200)
            .json_body(json!({"id": "7", "guild_id": guild_id, "name": "bids"}));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_resolves_author_and_posts_embed() {
    let server = MockServer::start_async().await;
    mock_login(&server, "99").await;
    let post = server.mock_async(|when, then| {
        when.method(POST)
            .path("/channels/7/messages")
            .header("Authorization", "Bot secret")
            .body_contains("\"title\":\"Genesis\"")
            .body_contains("[0xbid](https://etherscan.io/tx/0xbid)")
            .body_contains("https://cdn.discordapp.com/avatars/42/abc.png");
        then.status(200).json_body(json!({"id": "1000"}));
    })
    .await;

    let notifier = DiscordNotifier::new("secret", 7)
        .with_api_base(server.base_url())
        .connect(99)
        .await
        .expect("connect");
    assert_eq!(notifier.author().map(|a| a.name.as_str()), Some("rarebot"));

    notifier.notify(&announcement()).await.expect("notify");
    post.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn channel_on_other_server_is_misconfigured() {
    let server = MockServer::start_async().await;
    mock_login(&server, "12345").await;

    let err = DiscordNotifier::new("secret", 7)
        .with_api_base(server.base_url())
        .connect(99)
        .await
        .expect_err("connect should fail");
    assert!(matches!(err, NotifyError::Misconfigured(_)), "unexpected: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_post_surfaces_http_status() {
    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(POST).path("/channels/7/messages");
        then.status(403).body(r#"{"message": "Missing Permissions"}"#);
    })
    .await;

    let err = DiscordNotifier::new("secret", 7)
        .with_api_base(server.base_url())
        .notify(&announcement())
        .await
        .expect_err("post should fail");
    match err {
        NotifyError::Http { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Missing Permissions"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
