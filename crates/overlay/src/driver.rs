//! Runs overlay requests on the tokio runtime and routes results back.

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::explainer::{Completion, Request};
use providers::ExplanationClient;

/// Perform one request. The language preference is read fresh each time.
pub async fn run_request(client: &ExplanationClient, request: Request) -> Completion {
    let session = request.session();
    let kind = request.kind();
    let language = client.preferred_language().await;
    let outcome = match request {
        Request::Explain { text, .. } => client.request_explanation(&text, &language).await,
        Request::FollowUp { conversation, .. } => {
            client.follow_up_turn(&conversation, &language).await
        }
    };
    Completion {
        session,
        kind,
        outcome,
    }
}

/// Spawn `request` and deliver its [`Completion`] on `tx`.
pub fn spawn_request(
    client: Arc<ExplanationClient>,
    request: Request,
    tx: UnboundedSender<Completion>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let completion = run_request(&client, request).await;
        if tx.send(completion).is_err() {
            debug!("overlay gone, completion dropped");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explainer::RequestKind;
    use crate::popup::SessionId;
    use providers::EndpointConfig;
    use shared::settings::Settings;
    use shared::store::MemoryStore;
    use shared::{Conversation, FailureKind};
    use tokio::sync::mpsc;

    fn client_without_key() -> Arc<ExplanationClient> {
        Arc::new(
            ExplanationClient::new(
                EndpointConfig::default(),
                Arc::new(MemoryStore::new(Settings::default())),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_spawned_request_reports_back() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = SessionId::new();
        spawn_request(
            client_without_key(),
            Request::Explain {
                session,
                text: "Photosynthesis".into(),
            },
            tx,
        )
        .await
        .unwrap();

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.session, session);
        assert_eq!(completion.kind, RequestKind::Explain);
        assert_eq!(completion.outcome, Err(FailureKind::MissingCredential));
    }

    #[tokio::test]
    async fn test_follow_up_kind_is_preserved() {
        let mut conversation = Conversation::start("text");
        conversation.push_user("why?");
        let completion = run_request(
            &client_without_key(),
            Request::FollowUp {
                session: SessionId::new(),
                conversation,
            },
        )
        .await;
        assert_eq!(completion.kind, RequestKind::FollowUp);
        assert_eq!(completion.outcome, Err(FailureKind::MissingCredential));
    }

    #[tokio::test]
    async fn test_closed_channel_is_not_an_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let handle = spawn_request(
            client_without_key(),
            Request::Explain {
                session: SessionId::new(),
                text: "text".into(),
            },
            tx,
        );
        assert!(handle.await.is_ok());
    }
}
