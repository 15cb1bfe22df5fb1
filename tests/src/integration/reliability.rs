//! # Reliability Flows
//!
//! Retry/backoff accounting, fallback sequencing, context-invalidation
//! short-circuits, correlation hygiene on a live channel, and surface
//! lifecycle signals.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{timeout, Instant};
    use tokio_stream::StreamExt;

    use async_trait::async_trait;
    use coordinator_runtime::{CoordinatorConfig, CoordinatorRuntime, SurfaceEvent};
    use serde_json::{json, Value};
    use shared_messaging::adapters::OneShotResponder;
    use shared_messaging::{
        OneShotResponse, ReliableOptions, SendOptions, SIDEPANEL_LIFECYCLE_CHANNEL,
        SMART_MESSAGING_CHANNEL,
    };
    use shared_types::{Action, ContextKind, Envelope, Frame, Reply, SendError, TransportError};
    use uuid::Uuid;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// One-shot listener that fails every send, counting attempts.
    struct DeafResponder {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl OneShotResponder for DeafResponder {
        async fn respond(
            &self,
            _envelope: Envelope,
        ) -> Result<OneShotResponse, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::NoListener)
        }
    }

    /// One-shot listener that acknowledges but never resolves.
    struct AckOnlyResponder {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl OneShotResponder for AckOnlyResponder {
        async fn respond(
            &self,
            envelope: Envelope,
        ) -> Result<OneShotResponse, TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Ok(OneShotResponse::AckOnly {
                correlation_id: envelope.correlation_id,
            })
        }
    }

    /// One-shot listener reporting the execution context as gone.
    struct InvalidatedResponder;

    #[async_trait]
    impl OneShotResponder for InvalidatedResponder {
        async fn respond(
            &self,
            _envelope: Envelope,
        ) -> Result<OneShotResponse, TransportError> {
            Err(TransportError::ContextInvalidated)
        }
    }

    fn ping() -> Envelope {
        Envelope::request(Action::Ping, Value::Null, ContextKind::Page)
    }

    // =============================================================================
    // RETRY + FALLBACK SEQUENCING
    // =============================================================================

    /// The spec'd retry scenario: retries=2 means attempts 0, 1, 2 with
    /// exactly two backoff waits before the fallback channel opens, which
    /// then delivers the result.
    #[tokio::test]
    async fn test_reliable_send_retry_accounting() {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("start");

        let deaf = Arc::new(DeafResponder {
            attempts: AtomicU32::new(0),
        });
        runtime.host().set_one_shot_responder(deaf.clone());

        let messenger = runtime.client_messenger();
        let options = ReliableOptions {
            ack_timeout: Duration::from_millis(200),
            retries: 2,
            backoff: vec![Duration::from_millis(30), Duration::from_millis(100)],
            total_timeout: Duration::from_secs(2),
        };

        let started = Instant::now();
        let reply = messenger
            .send_reliable(ping(), options)
            .await
            .expect("fallback must deliver");
        let elapsed = started.elapsed();

        assert!(reply.success);
        assert_eq!(reply.payload["message"], "pong");
        assert_eq!(deaf.attempts.load(Ordering::SeqCst), 3, "attempts 0, 1, 2");
        assert!(
            elapsed >= Duration::from_millis(130),
            "two backoff waits (30ms + 100ms) must elapse, got {elapsed:?}"
        );
    }

    /// An ack-only response aborts the retry loop: the receiver is alive,
    /// retrying the one-shot path cannot help, only the channel can.
    #[tokio::test]
    async fn test_ack_only_goes_to_fallback_without_retrying() {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("start");

        let acker = Arc::new(AckOnlyResponder {
            attempts: AtomicU32::new(0),
        });
        runtime.host().set_one_shot_responder(acker.clone());

        let messenger = runtime.client_messenger();
        let options = ReliableOptions {
            retries: 5,
            backoff: vec![Duration::from_millis(10)],
            ..ReliableOptions::default()
        };
        let reply = messenger
            .send_reliable(ping(), options)
            .await
            .expect("reply via channel");
        assert!(reply.success);
        assert_eq!(
            acker.attempts.load(Ordering::SeqCst),
            1,
            "no retries after an ack-only response"
        );
    }

    /// Context invalidation is terminal: no retries, no fallback, the error
    /// surfaces immediately.
    #[tokio::test]
    async fn test_context_invalidation_short_circuits() {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("start");
        runtime
            .host()
            .set_one_shot_responder(Arc::new(InvalidatedResponder));

        let messenger = runtime.client_messenger();

        let started = Instant::now();
        let err = messenger
            .send(ping(), SendOptions::default())
            .await
            .expect_err("must reject");
        assert!(matches!(err, SendError::ContextInvalidated));
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "no fallback phase may run"
        );

        let err = messenger
            .send_reliable(ping(), ReliableOptions::default())
            .await
            .expect_err("must reject");
        assert!(matches!(err, SendError::ContextInvalidated));
    }

    // =============================================================================
    // CORRELATION HYGIENE ON A LIVE CHANNEL
    // =============================================================================

    /// A raw channel conversation with the coordinator: the ACK and RESULT
    /// both echo the request's correlation id, and frames for other ids do
    /// not disturb the session.
    #[tokio::test]
    async fn test_channel_frames_echo_correlation_id() {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("start");

        use shared_messaging::ChannelConnector;
        let mut channel = runtime
            .host()
            .connect(SMART_MESSAGING_CHANNEL)
            .await
            .expect("connect");

        // A frame for a foreign correlation id first; the acceptor ignores
        // non-request frames entirely.
        channel
            .send(Frame::Ack {
                correlation_id: Uuid::new_v4(),
            })
            .expect("send");

        let envelope = ping();
        let id = envelope.correlation_id;
        channel.send(Frame::Request(envelope)).expect("send");

        let ack = timeout(Duration::from_secs(1), channel.recv())
            .await
            .expect("timeout")
            .expect("ack frame");
        assert!(matches!(ack, Frame::Ack { correlation_id } if correlation_id == id));

        let result = timeout(Duration::from_secs(1), channel.recv())
            .await
            .expect("timeout")
            .expect("result frame");
        match result {
            Frame::Result(reply) => {
                assert_eq!(reply.correlation_id, id);
                assert!(reply.success);
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    /// Two interleaved requests on one channel settle their own ids.
    #[tokio::test]
    async fn test_interleaved_requests_settle_independently() {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("start");
        runtime.registry().register(
            Action::Translate,
            shared_messaging::handler_fn(|envelope, _| {
                let text = envelope.payload["text"].as_str().unwrap_or("").to_string();
                shared_messaging::HandlerOutcome::deferred(async move {
                    tokio::time::sleep(Duration::from_millis(40)).await;
                    Ok(json!({"translated": text}))
                })
            }),
        );

        use shared_messaging::ChannelConnector;
        let mut channel = runtime
            .host()
            .connect(SMART_MESSAGING_CHANNEL)
            .await
            .expect("connect");

        let slow = Envelope::request(Action::Translate, json!({"text": "a"}), ContextKind::Page);
        let fast = ping();
        let slow_id = slow.correlation_id;
        let fast_id = fast.correlation_id;
        channel.send(Frame::Request(slow)).expect("send");
        channel.send(Frame::Request(fast)).expect("send");

        let mut replies: Vec<Reply> = Vec::new();
        while replies.len() < 2 {
            match timeout(Duration::from_secs(1), channel.recv())
                .await
                .expect("timeout")
                .expect("frame")
            {
                Frame::Result(reply) => replies.push(reply),
                Frame::Ack { .. } => {}
                other => panic!("unexpected frame {other:?}"),
            }
        }

        // Fast settles first even though it was sent second.
        assert_eq!(replies[0].correlation_id, fast_id);
        assert_eq!(replies[1].correlation_id, slow_id);
    }

    // =============================================================================
    // SURFACE LIFECYCLE
    // =============================================================================

    /// A lifecycle channel's disconnect is the signal: the tracker reports
    /// the surface closed and broadcasts the stop event.
    #[tokio::test]
    async fn test_sidepanel_lifecycle_roundtrip() {
        let runtime = CoordinatorRuntime::new(CoordinatorConfig::default());
        runtime.start().await.expect("start");
        let mut events = runtime.surfaces().events();

        use shared_messaging::ChannelConnector;
        let channel = runtime
            .host()
            .connect(SIDEPANEL_LIFECYCLE_CHANNEL)
            .await
            .expect("connect");

        let opened = timeout(Duration::from_secs(1), events.next())
            .await
            .expect("timeout")
            .expect("stream open")
            .expect("no lag");
        assert_eq!(opened, SurfaceEvent::Opened("sidepanel".to_string()));
        assert!(runtime.surfaces().is_open("sidepanel"));

        channel.disconnect();

        let closed = timeout(Duration::from_secs(1), events.next())
            .await
            .expect("timeout")
            .expect("stream open")
            .expect("no lag");
        assert_eq!(closed, SurfaceEvent::Closed("sidepanel".to_string()));
        assert!(!runtime.surfaces().is_open("sidepanel"));
    }
}
