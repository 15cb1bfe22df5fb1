//! # Integration Test Flows
//!
//! Exercises the full delivery path: client messenger → transport
//! classification → one-shot primitive or persistent channel → coordinator
//! acceptor → handler registry → reply, all over the loopback runtime.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use coordinator_runtime::{CoordinatorConfig, CoordinatorRuntime};
    use serde_json::{json, Value};
    use shared_messaging::{handler_fn, HandlerOutcome, SendOptions};
    use shared_types::{Action, ContextKind, Envelope, SendError};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// A started coordinator runtime with a translate handler registered.
    async fn started_runtime() -> CoordinatorRuntime {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("runtime start");
        runtime.registry().register(
            Action::Translate,
            handler_fn(|envelope, _| {
                let text = envelope.payload["text"].as_str().unwrap_or("").to_string();
                HandlerOutcome::deferred(async move {
                    // Long-running work stands in for a real translation call.
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok(json!({"translated": text.to_uppercase()}))
                })
            }),
        );
        runtime
    }

    // =============================================================================
    // FAST PATH (one-shot primitive)
    // =============================================================================

    /// The ping scenario: a fast action against a live one-shot listener
    /// resolves within the fast timeout without touching a channel.
    #[tokio::test]
    async fn test_ping_pong_over_one_shot() {
        let runtime = started_runtime().await;
        let messenger = runtime.client_messenger();

        let envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::Page);
        let reply = timeout(
            Duration::from_secs(3),
            messenger.send(envelope, SendOptions::default()),
        )
        .await
        .expect("within the fast timeout")
        .expect("reply");

        assert!(reply.success);
        assert_eq!(reply.payload["message"], "pong");
    }

    /// Replies echo the request's correlation id across the whole stack.
    #[tokio::test]
    async fn test_reply_echoes_correlation_id() {
        let runtime = started_runtime().await;
        let messenger = runtime.client_messenger();

        let envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::Options);
        let id = envelope.correlation_id;
        let reply = messenger
            .send(envelope, SendOptions::default())
            .await
            .expect("reply");
        assert_eq!(reply.correlation_id, id);
    }

    /// An unknown action settles deterministically with a failure reply,
    /// not a timeout.
    #[tokio::test]
    async fn test_unknown_action_fails_fast() {
        let runtime = started_runtime().await;
        let messenger = runtime.client_messenger();

        let envelope = Envelope::request(
            Action::Other("definitelyNotRegistered".to_string()),
            Value::Null,
            ContextKind::Page,
        );
        let reply = messenger
            .send(envelope, SendOptions::default())
            .await
            .expect("a failure reply is still a delivered reply");
        assert!(!reply.success);
        assert!(reply
            .error
            .unwrap()
            .contains("definitelyNotRegistered"));
    }

    /// When the one-shot listener disappears, fast actions fall back to the
    /// persistent channel and still resolve.
    #[tokio::test]
    async fn test_fast_action_falls_back_without_listener() {
        let runtime = started_runtime().await;
        let messenger = runtime.client_messenger();

        runtime.host().clear_one_shot_responder();

        let envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::Page);
        let reply = timeout(
            Duration::from_secs(3),
            messenger.send(envelope, SendOptions::default()),
        )
        .await
        .expect("timeout")
        .expect("fallback reply");
        assert!(reply.success);
        assert_eq!(reply.payload["message"], "pong");
    }

    // =============================================================================
    // SLOW PATH (persistent channel)
    // =============================================================================

    /// The translate scenario: a slow action opens the smart-messaging
    /// channel, is acknowledged, and resolves with the handler's payload.
    #[tokio::test]
    async fn test_translate_over_persistent_channel() {
        let runtime = started_runtime().await;
        let messenger = runtime.client_messenger();

        let envelope = Envelope::request(
            Action::Translate,
            json!({"text": "guten tag"}),
            ContextKind::Page,
        );
        let reply = timeout(
            Duration::from_secs(2),
            messenger.send(envelope, SendOptions::default()),
        )
        .await
        .expect("timeout")
        .expect("reply");

        assert!(reply.success);
        assert_eq!(reply.payload["translated"], "GUTEN TAG");
    }

    /// `force_persistent` routes a fast action over the channel.
    #[tokio::test]
    async fn test_force_persistent_ping() {
        let runtime = started_runtime().await;
        let messenger = runtime.client_messenger();

        // Remove the one-shot listener entirely; only the channel can serve.
        runtime.host().clear_one_shot_responder();

        let envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::SidePanel);
        let options = SendOptions {
            force_persistent: true,
            ..SendOptions::default()
        };
        let reply = messenger.send(envelope, options).await.expect("reply");
        assert!(reply.success);
        assert_eq!(reply.payload["message"], "pong");
    }

    /// A slow handler that never finishes is bounded by the caller's
    /// timeout override.
    #[tokio::test]
    async fn test_slow_handler_bounded_by_timeout() {
        let runtime = started_runtime().await;
        runtime.registry().register(
            Action::CaptureScreen,
            handler_fn(|_, _| {
                HandlerOutcome::deferred(async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(json!("never delivered"))
                })
            }),
        );
        let messenger = runtime.client_messenger();

        let envelope = Envelope::request(Action::CaptureScreen, json!({}), ContextKind::Page);
        let options = SendOptions {
            timeout: Some(Duration::from_millis(100)),
            ..SendOptions::default()
        };
        let err = messenger
            .send(envelope, options)
            .await
            .expect_err("must time out");
        assert!(matches!(err, SendError::TotalTimeout { .. }));
    }

    // =============================================================================
    // CONCURRENT REQUESTS
    // =============================================================================

    /// A slow request never blocks a fast one; each settles its own
    /// correlation id.
    #[tokio::test]
    async fn test_slow_request_does_not_block_fast() {
        let runtime = started_runtime().await;
        let messenger = Arc::new(runtime.client_messenger());

        let slow_envelope = Envelope::request(
            Action::Translate,
            json!({"text": "langsam"}),
            ContextKind::Page,
        );
        let slow_messenger = messenger.clone();
        let slow = tokio::spawn(async move {
            slow_messenger
                .send(slow_envelope, SendOptions::default())
                .await
        });

        let fast_envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::Page);
        let fast_reply = timeout(
            Duration::from_millis(500),
            messenger.send(fast_envelope, SendOptions::default()),
        )
        .await
        .expect("fast request must not wait for the slow one")
        .expect("reply");
        assert_eq!(fast_reply.payload["message"], "pong");

        let slow_reply = timeout(Duration::from_secs(2), slow)
            .await
            .expect("timeout")
            .expect("join")
            .expect("reply");
        assert_eq!(slow_reply.payload["translated"], "LANGSAM");
    }

    /// Many interleaved requests with jittered start times all settle their
    /// own correlation ids.
    #[tokio::test]
    async fn test_many_concurrent_pings() {
        use rand::Rng;

        let runtime = started_runtime().await;
        let messenger = Arc::new(runtime.client_messenger());

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..20));
            let messenger = messenger.clone();
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(jitter).await;
                let envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::Page);
                let id = envelope.correlation_id;
                let reply = messenger
                    .send(envelope, SendOptions::default())
                    .await
                    .expect("reply");
                assert_eq!(reply.correlation_id, id);
                assert!(reply.success);
            }));
        }
        for task in tasks {
            timeout(Duration::from_secs(3), task)
                .await
                .expect("timeout")
                .expect("join");
        }
    }

    /// Requests issued before the runtime starts are queued by the
    /// listener and served once startup completes.
    #[tokio::test]
    async fn test_request_before_start_is_served_after_start() {
        let runtime = Arc::new(CoordinatorRuntime::new(CoordinatorConfig::default()));
        let messenger = runtime.client_messenger();

        let envelope = Envelope::request(Action::Ping, Value::Null, ContextKind::Popup);
        let options = SendOptions {
            force_persistent: true,
            ..SendOptions::default()
        };
        let send = tokio::spawn(async move { messenger.send(envelope, options).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        runtime.start().await.expect("start");

        let reply = timeout(Duration::from_secs(2), send)
            .await
            .expect("timeout")
            .expect("join")
            .expect("reply");
        assert!(reply.success);
        assert_eq!(reply.payload["message"], "pong");
    }
}
