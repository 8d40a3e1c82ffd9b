mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use common::{spawn_server, test_app, FakeProvider};
use edc_console_api::client::{ApiClient, ClientError, CredentialStore, MemoryCredentialStore, SessionState};
use edc_console_api::store::{ConnectorPatch, ConnectorStatus, NewConnector};

async fn server(provider: Arc<FakeProvider>) -> Result<String> {
    let (app, _) = test_app(provider);
    spawn_server(app).await
}

fn provider_edc() -> NewConnector {
    NewConnector {
        name: "Provider EDC".into(),
        version: "0.6.0".into(),
        bpn: "BPNL0001".into(),
        endpoint: "http://host/management".into(),
    }
}

#[tokio::test]
async fn calls_without_login_require_reauthentication() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let client = ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?;

    let err = client.list_connectors().await.unwrap_err();

    assert!(err.is_reauthentication_required(), "unexpected error: {:?}", err);
    assert_eq!(client.session_state(), SessionState::Anonymous);
    Ok(())
}

#[tokio::test]
async fn login_then_manage_connectors() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?;

    let credential = client.login(common::USERNAME, common::PASSWORD, false).await?;
    assert_eq!(client.session_state(), SessionState::Authenticated);
    assert_eq!(store.load()?, Some(credential));

    let created = client.create_connector(&provider_edc()).await?;
    assert_eq!(created.status, ConnectorStatus::Connected);

    let patch = ConnectorPatch { name: Some("Provider EDC 2".into()), ..Default::default() };
    let updated = client.update_connector(created.id, &patch).await?;
    assert_eq!(updated.name, "Provider EDC 2");

    let flagged = client.set_connector_status(created.id, ConnectorStatus::Error).await?;
    assert_eq!(flagged.status, ConnectorStatus::Error);

    assert_eq!(client.list_connectors().await?, vec![flagged]);
    assert_eq!(client.stats().await?.connectors, 1);

    client.delete_connector(created.id).await?;
    assert!(client.list_connectors().await?.is_empty());

    let err = client.get_connector(created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    Ok(())
}

#[tokio::test]
async fn wrong_password_leaves_client_anonymous() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?;

    let err = client.login(common::USERNAME, "wrong", false).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(client.session_state(), SessionState::Anonymous);
    assert!(store.load()?.is_none());
    Ok(())
}

#[tokio::test]
async fn credential_near_expiry_is_refreshed_before_the_call() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;
    // every 300s token is inside a ten minute margin
    let client = ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?
        .with_refresh_margin(Duration::from_secs(600));

    let first = client.login(common::USERNAME, common::PASSWORD, false).await?;
    client.list_connectors().await?;

    assert_eq!(provider.refreshes(), 1);
    let current = client.credential()?.unwrap();
    assert!(current.expires_at > first.expires_at);
    assert_ne!(current.refresh_token, first.refresh_token);
    assert_eq!(client.session_state(), SessionState::Authenticated);
    Ok(())
}

#[tokio::test]
async fn credential_outside_margin_is_not_refreshed() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;
    let client = ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?;

    client.login(common::USERNAME, common::PASSWORD, false).await?;
    client.list_connectors().await?;
    client.stats().await?;

    assert_eq!(provider.refreshes(), 0);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_clears_the_session() -> Result<()> {
    let provider = Arc::new(FakeProvider::with_lifetimes(300, 0));
    let base = server(provider.clone()).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?.with_refresh_margin(Duration::from_secs(600));

    client.login(common::USERNAME, common::PASSWORD, false).await?;
    let err = client.list_connectors().await.unwrap_err();

    assert!(matches!(err, ClientError::ReauthenticationRequired(_)));
    assert_eq!(client.session_state(), SessionState::Anonymous);
    assert!(store.load()?.is_none());
    Ok(())
}

#[tokio::test]
async fn refresh_outage_keeps_the_session() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?.with_refresh_margin(Duration::from_secs(600));

    let first = client.login(common::USERNAME, common::PASSWORD, false).await?;
    provider.set_refresh_outage(true);

    // the token is inside the margin but unexpired, so the call still goes through
    assert!(client.list_connectors().await?.is_empty());
    assert_eq!(provider.refreshes(), 1);
    assert_eq!(client.session_state(), SessionState::Authenticated);
    assert_eq!(store.load()?, Some(first.clone()));

    let err = client.refresh().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(!err.is_reauthentication_required());
    assert_eq!(store.load()?, Some(first.clone()));

    provider.set_refresh_outage(false);
    let fresh = client.refresh().await?;
    assert_ne!(fresh.refresh_token, first.refresh_token);
    assert_eq!(client.session_state(), SessionState::Authenticated);
    Ok(())
}

#[tokio::test]
async fn expired_credential_surfaces_refresh_outage() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?;

    let mut credential = client.login(common::USERNAME, common::PASSWORD, false).await?;
    credential.expires_at = Utc::now() - chrono::Duration::seconds(5);
    store.save(&credential)?;
    provider.set_refresh_outage(true);

    let err = client.list_connectors().await.unwrap_err();

    assert!(err.is_transient(), "unexpected error: {:?}", err);
    assert_eq!(client.session_state(), SessionState::Authenticated);
    assert_eq!(store.load()?, Some(credential));
    Ok(())
}

#[tokio::test]
async fn background_task_survives_refresh_outage() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;
    let client = Arc::new(
        ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?
            .with_refresh_margin(Duration::from_secs(600)),
    );
    client.login(common::USERNAME, common::PASSWORD, false).await?;
    provider.set_refresh_outage(true);

    let task = client.spawn_refresh_task(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!task.is_finished());

    provider.set_refresh_outage(false);
    let during_outage = provider.refreshes();
    tokio::time::sleep(Duration::from_millis(200)).await;
    task.abort();

    assert!(during_outage >= 1);
    assert!(provider.refreshes() > during_outage);
    assert_eq!(client.session_state(), SessionState::Authenticated);
    Ok(())
}

#[tokio::test]
async fn redirect_login_completes_in_a_fresh_client() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;

    let starter = ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?;
    let request = starter.begin_authorization().await?;
    assert_eq!(starter.session_state(), SessionState::PendingProviderRedirect);

    let store = Arc::new(MemoryCredentialStore::new());
    let finisher = ApiClient::new(&base, store.clone())?;
    let credential = finisher.complete_authorization(common::GOOD_CODE, &request.state).await?;

    assert_eq!(finisher.session_state(), SessionState::Authenticated);
    assert_eq!(store.load()?, Some(credential));
    assert_eq!(provider.code_exchanges(), 1);
    assert_eq!(finisher.me().await?.user.username, common::USERNAME);
    Ok(())
}

#[tokio::test]
async fn rejected_callback_stores_nothing() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let starter = ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?;
    let request = starter.begin_authorization().await?;

    let store = Arc::new(MemoryCredentialStore::new());
    let finisher = ApiClient::new(&base, store.clone())?;
    let err = finisher.complete_authorization("stolen-code", &request.state).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(finisher.session_state(), SessionState::Anonymous);
    assert!(store.load()?.is_none());
    Ok(())
}

#[tokio::test]
async fn server_rejection_clears_stored_credential() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?;

    let mut credential = client.login(common::USERNAME, common::PASSWORD, false).await?;
    // still unexpired locally, but signed with a key the server does not trust
    credential.access_token = common::mint_token(common::ISSUER, "revoked-key", Utc::now().timestamp() + 300);
    store.save(&credential)?;

    let err = client.list_connectors().await.unwrap_err();

    assert!(err.is_reauthentication_required());
    assert_eq!(client.session_state(), SessionState::Anonymous);
    assert!(store.load()?.is_none());
    Ok(())
}

#[tokio::test]
async fn logout_forgets_credential() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let store = Arc::new(MemoryCredentialStore::new());
    let client = ApiClient::new(&base, store.clone())?;

    client.login(common::USERNAME, common::PASSWORD, false).await?;
    client.logout().await?;

    assert!(store.load()?.is_none());
    assert_eq!(client.session_state(), SessionState::Anonymous);
    assert!(client.me().await.unwrap_err().is_reauthentication_required());
    Ok(())
}

#[tokio::test]
async fn stored_credential_resumes_session() -> Result<()> {
    let base = server(Arc::new(FakeProvider::new())).await?;
    let store = Arc::new(MemoryCredentialStore::new());

    ApiClient::new(&base, store.clone())?
        .login(common::USERNAME, common::PASSWORD, true)
        .await?;

    let resumed = ApiClient::new(&base, store)?;
    assert_eq!(resumed.session_state(), SessionState::Authenticated);
    assert_eq!(resumed.me().await?.user.username, common::USERNAME);
    Ok(())
}

#[tokio::test]
async fn background_task_keeps_credential_fresh() -> Result<()> {
    let provider = Arc::new(FakeProvider::new());
    let base = server(provider.clone()).await?;
    let client = Arc::new(
        ApiClient::new(&base, Arc::new(MemoryCredentialStore::new()))?
            .with_refresh_margin(Duration::from_secs(600)),
    );
    client.login(common::USERNAME, common::PASSWORD, false).await?;

    let task = client.spawn_refresh_task(Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(300)).await;
    task.abort();

    assert!(provider.refreshes() >= 1);
    assert_eq!(client.session_state(), SessionState::Authenticated);
    Ok(())
}
