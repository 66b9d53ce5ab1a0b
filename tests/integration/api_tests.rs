//! Integration tests against a running inventory backend
//!
//! Configure with `TOOLDESK_API_URL`, `TOOLDESK_ACCESS_TOKEN` and
//! `TOOLDESK_REFRESH_TOKEN`, then run with: cargo test -- --ignored

use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;

use tooldesk::{
    client::{ApiClient, MemoryTokenStore, ReqwestTransport, Session, SessionEvent, Tokens},
    config::ApiConfig,
    models::{
        accessory::AccessoryFilter, hierarchy::AssetTree, sub_tool::SubToolFilter, tool::ToolFilter,
    },
    repository::Repository,
};

fn base_url() -> String {
    std::env::var("TOOLDESK_API_URL").unwrap_or_else(|_| ApiConfig::default().base_url)
}

fn stored_tokens() -> Tokens {
    Tokens {
        access_token: std::env::var("TOOLDESK_ACCESS_TOKEN").ok(),
        refresh_token: std::env::var("TOOLDESK_REFRESH_TOKEN").ok(),
    }
}

/// Repository over a live backend with an in-memory session
fn connect(tokens: Tokens) -> (Repository, Arc<Session>) {
    let config = ApiConfig {
        base_url: base_url(),
        ..Default::default()
    };
    let transport = Arc::new(ReqwestTransport::new(&config).expect("Failed to build transport"));
    let session = Arc::new(
        Session::new(Arc::new(MemoryTokenStore::new(tokens))).expect("Failed to open session"),
    );
    (Repository::new(ApiClient::new(transport, session.clone())), session)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_tools_require_authentication() {
    let client = Client::new();

    let response = client
        .get(format!("{}/tools", base_url()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_tools() {
    let (repository, _) = connect(stored_tokens());

    let listed = repository
        .tools
        .list(&ToolFilter::default())
        .await
        .expect("Failed to list tools");

    assert!(listed.success);
    for tool in listed.data.unwrap_or_default() {
        assert!(!tool.id.is_empty());
        assert!(!tool.lifecycle.is_delete);
    }
}

#[tokio::test]
#[ignore]
async fn test_deleted_tools_report_consistent_counts() {
    let (repository, _) = connect(stored_tokens());

    let deleted = repository
        .tools
        .list_deleted()
        .await
        .expect("Failed to list deleted tools")
        .data
        .unwrap_or_default();

    for row in deleted {
        let count = row.children_count;
        assert_eq!(count.total, count.sub_tools + count.accessories);
    }
}

#[tokio::test]
#[ignore]
async fn test_asset_tree_from_live_lists() {
    let (repository, _) = connect(stored_tokens());

    let (tool_filter, sub_tool_filter, accessory_filter) = (
        ToolFilter::default(),
        SubToolFilter::default(),
        AccessoryFilter::default(),
    );
    let (tools, sub_tools, accessories) = tokio::try_join!(
        repository.tools.list(&tool_filter),
        repository.sub_tools.list(&sub_tool_filter),
        repository.accessories.list(&accessory_filter),
    )
    .expect("Failed to load hierarchy");
    let sub_tool_count = sub_tools.data.as_ref().map(Vec::len).unwrap_or(0);

    let tree = AssetTree::build(
        tools.data.unwrap_or_default(),
        sub_tools.data.unwrap_or_default(),
        accessories.data.unwrap_or_default(),
    );

    let placed: usize = tree.tools.iter().map(|t| t.sub_tools.len()).sum();
    assert_eq!(placed + tree.detached_sub_tools.len(), sub_tool_count);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_requests_share_one_refresh() {
    let mut tokens = stored_tokens();
    tokens.access_token = Some("expired-access-token".to_string());
    let (repository, session) = connect(tokens);

    let calls = (0..5).map(|_| {
        let repository = repository.clone();
        async move { repository.tools.list(&ToolFilter::default()).await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(session.current_event(), SessionEvent::Active);
    assert_ne!(session.access_token().as_deref(), Some("expired-access-token"));
}

#[tokio::test]
#[ignore]
async fn test_rejected_refresh_ends_session() {
    let (repository, session) = connect(Tokens {
        access_token: Some("bogus".to_string()),
        refresh_token: Some("bogus".to_string()),
    });

    let result = repository.tools.list(&ToolFilter::default()).await;

    assert!(result.is_err());
    assert!(!session.is_authenticated());
    assert_eq!(session.current_event(), SessionEvent::LoginRequired);
}

#[tokio::test]
#[ignore]
async fn test_unknown_tool_is_not_found() {
    let (repository, _) = connect(stored_tokens());

    let result = repository.tools.get("000000000000000000000000").await;

    match result {
        Err(e) => assert_eq!(e.kind(), tooldesk::error::ErrorKind::BusinessRule),
        Ok(envelope) => assert!(!envelope.success || envelope.data.is_none()),
    }
}
