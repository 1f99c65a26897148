//! # Integration Tests
//!
//! End-to-end scenarios across discovery, reconciler, workers and relay.
//!
//! - Membership change with unchanged producer count
//! - Atomic swap as seen by an in-flight stream
//! - Full stack over TCP: registry file, HTTP producers, HTTP relay

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_blueprint_is_valid() {
        let blueprint = contracts::RelayBlueprint::default();
        assert!(config_loader::ConfigLoader::validate(&blueprint).is_ok());
        assert_eq!(blueprint.version, contracts::ConfigVersion::V1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use bytes::Bytes;
    use contracts::{DiscoveryResult, Endpoint, PrimaryResolution};
    use discovery::ScriptedDiscovery;
    use http_body_util::BodyExt;
    use ingestion::{MockFrameFetcher, WorkerConfig};
    use reconciler::{DiscoveryReconciler, ReconcilerConfig, SharedProducerSet};
    use relay_server::{build_router, MultipartEncoder, RelayState};
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";

    fn ep(s: &str) -> Endpoint {
        Endpoint::parse(s).unwrap()
    }

    fn fast_config() -> ReconcilerConfig {
        ReconcilerConfig {
            interval: Duration::from_millis(20),
            primary_resolution: PrimaryResolution::Startup,
            worker: WorkerConfig {
                poll_interval: Duration::from_millis(5),
                retry_interval: Duration::from_millis(5),
                fetch_timeout: Duration::from_millis(200),
            },
        }
    }

    async fn wait_for_generation(producers: &SharedProducerSet, generation: u64) {
        timeout(Duration::from_secs(2), async {
            while producers.read().await.generation() < generation {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("producer set did not reach expected generation");
    }

    async fn open_stream(app: &Router, index: usize) -> Body {
        let resp = app
            .clone()
            .oneshot(
                Request::get(format!("/stream/{index}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.into_body()
    }

    /// Frame payload of the next multipart part
    async fn next_frame(body: &mut Body) -> Option<String> {
        let frame = timeout(Duration::from_secs(1), body.frame())
            .await
            .expect("no part within a second")?
            .unwrap();
        let part: Bytes = frame.into_data().ok()?;
        assert!(part.starts_with(PART_HEADER));
        let payload = &part[PART_HEADER.len()..part.len() - 2];
        Some(String::from_utf8(payload.to_vec()).unwrap())
    }

    /// Discovery goes from A,[B,C] to A,[C,D]: same count, different members.
    ///
    /// A restart must happen, the old stream at index 1 sees only B frames
    /// followed by closure, and index 1 is re-resolved against the new set.
    #[tokio::test]
    async fn test_e2e_membership_change_with_equal_count() {
        let script = ScriptedDiscovery::new(DiscoveryResult::new(
            Some(ep("a:1")),
            vec![ep("b:1"), ep("c:1")],
        ));
        let fetcher = Arc::new(MockFrameFetcher::default());
        let reconciler = Arc::new(DiscoveryReconciler::new(
            script.clone(),
            Arc::clone(&fetcher),
            fast_config(),
        ));
        let producers = reconciler.producers();
        let state = RelayState::new(producers.clone(), MultipartEncoder::default());
        let app = build_router(state.clone());

        let token = CancellationToken::new();
        let task = tokio::spawn({
            let reconciler = Arc::clone(&reconciler);
            let token = token.clone();
            async move { reconciler.run(token).await }
        });

        wait_for_generation(&producers, 1).await;

        // Stream from index 0, 1, 2
        let mut streams = Vec::new();
        for (index, expected) in ["a:1#", "b:1#", "c:1#"].into_iter().enumerate() {
            let mut body = open_stream(&app, index).await;
            let frame = next_frame(&mut body).await.unwrap();
            assert!(frame.starts_with(expected), "index {index} served {frame}");
            streams.push(body);
        }

        // Several unchanged cycles: no restart
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(reconciler.stats().snapshot().swaps, 1);

        script.set(DiscoveryResult::new(
            Some(ep("a:1")),
            vec![ep("c:1"), ep("d:1")],
        ));
        wait_for_generation(&producers, 2).await;

        let snapshot = reconciler.stats().snapshot();
        assert_eq!(snapshot.swaps, 2);
        assert_eq!(snapshot.restarts(), 1);

        // The in-flight index 1 stream drains B frames, then ends
        let mut old_index_1 = streams.remove(1);
        let drained = timeout(Duration::from_secs(1), async {
            while let Some(frame) = next_frame(&mut old_index_1).await {
                assert!(frame.starts_with("b:1#"), "old stream mixed in {frame}");
            }
        })
        .await;
        assert!(drained.is_ok());

        // Reconnecting resolves against the new set
        let mut new_index_1 = open_stream(&app, 1).await;
        let frame = next_frame(&mut new_index_1).await.unwrap();
        assert!(frame.starts_with("c:1#"), "index 1 served {frame}");
        assert!(!frame.starts_with("b:1#"));

        let mut new_index_2 = open_stream(&app, 2).await;
        let frame = next_frame(&mut new_index_2).await.unwrap();
        assert!(frame.starts_with("d:1#"), "index 2 served {frame}");

        // B is no longer polled
        let b_calls = fetcher.calls_for(&ep("b:1"));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(fetcher.calls_for(&ep("b:1")), b_calls);

        drop(streams);
        drop(new_index_1);
        drop(new_index_2);
        token.cancel();
        timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert_eq!(state.metrics.active_streams(), 0);
        assert_eq!(reconciler.ingestion_metrics().snapshot().live_workers(), 0);
    }

    /// Discovery outages never disturb the live set or its streams.
    #[tokio::test]
    async fn test_e2e_discovery_outage_keeps_streaming() {
        let script = ScriptedDiscovery::new(DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]));
        let reconciler = Arc::new(DiscoveryReconciler::new(
            script.clone(),
            Arc::new(MockFrameFetcher::default()),
            fast_config(),
        ));
        let producers = reconciler.producers();
        let app = build_router(RelayState::new(producers.clone(), MultipartEncoder::default()));

        let token = CancellationToken::new();
        let task = tokio::spawn({
            let reconciler = Arc::clone(&reconciler);
            let token = token.clone();
            async move { reconciler.run(token).await }
        });
        wait_for_generation(&producers, 1).await;

        let mut body = open_stream(&app, 1).await;
        assert!(next_frame(&mut body).await.is_some());

        script.fail("registry unreachable");
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(reconciler.stats().snapshot().discovery_failures >= 2);
        assert_eq!(producers.read().await.generation(), 1);
        let frame = next_frame(&mut body).await.unwrap();
        assert!(frame.starts_with("b:1#"));

        script.recover();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(reconciler.stats().snapshot().swaps, 1);

        drop(body);
        token.cancel();
        timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    }
}

#[cfg(test)]
mod tcp_tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::routing::get;
    use axum::Router;
    use contracts::{Endpoint, PrimaryResolution};
    use discovery::FileDiscovery;
    use ingestion::{HttpFrameFetcher, WorkerConfig};
    use reconciler::{DiscoveryReconciler, ReconcilerConfig};
    use relay_server::{MultipartEncoder, RelayState};
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_util::sync::CancellationToken;

    /// Producer answering `GET /frame` with a fixed payload
    async fn spawn_producer(payload: &'static str) -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/frame", get(move || async move { payload }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Endpoint::parse(&addr.to_string()).unwrap()
    }

    /// Read from a streaming response until `needle` shows up
    async fn read_until(resp: &mut reqwest::Response, needle: &str) -> bool {
        let mut seen = Vec::new();
        timeout(Duration::from_secs(2), async {
            while let Ok(Some(chunk)) = resp.chunk().await {
                seen.extend_from_slice(&chunk);
                if String::from_utf8_lossy(&seen).contains(needle) {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_full_stack_over_tcp() {
        let primary = spawn_producer("primary-frame").await;
        let first = spawn_producer("first-frame").await;
        let second = spawn_producer("second-frame").await;

        let registry = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        std::fs::write(
            registry.path(),
            format!("primary = \"{primary}\"\nsecondaries = [\"{first}\"]\n"),
        )
        .unwrap();

        let reconciler = Arc::new(DiscoveryReconciler::new(
            FileDiscovery::new(registry.path()).unwrap(),
            Arc::new(HttpFrameFetcher::new("/frame").unwrap()),
            ReconcilerConfig {
                interval: Duration::from_millis(20),
                primary_resolution: PrimaryResolution::Startup,
                worker: WorkerConfig {
                    poll_interval: Duration::from_millis(10),
                    retry_interval: Duration::from_millis(10),
                    fetch_timeout: Duration::from_millis(500),
                },
            },
        ));
        let state = RelayState::new(reconciler.producers(), MultipartEncoder::default());

        let listener = relay_server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let relay = listener.local_addr().unwrap();

        let token = CancellationToken::new();
        let reconciler_task = tokio::spawn({
            let reconciler = Arc::clone(&reconciler);
            let token = token.clone();
            async move { reconciler.run(token).await }
        });
        let server_task = tokio::spawn(relay_server::serve(listener, state, token.clone()));

        let client = reqwest::Client::new();
        let base = format!("http://{relay}");

        let mut label = String::new();
        for _ in 0..100 {
            label = client
                .get(format!("{base}/producers"))
                .send()
                .await
                .unwrap()
                .text()
                .await
                .unwrap();
            if !label.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(label, format!("{primary}+{first}"));

        let mut stream = client
            .get(format!("{base}/stream/1"))
            .send()
            .await
            .unwrap();
        assert_eq!(
            stream.headers()["content-type"],
            "multipart/x-mixed-replace; boundary=frame"
        );
        assert!(read_until(&mut stream, "first-frame").await);

        let status = client.get(format!("{base}/stream/5")).send().await.unwrap().status();
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);

        // Registry edit: the secondary is replaced
        std::fs::write(
            registry.path(),
            format!("primary = \"{primary}\"\nsecondaries = [\"{second}\"]\n"),
        )
        .unwrap();

        // Old stream ends once its channel closes
        let ended = timeout(Duration::from_secs(2), async {
            while let Ok(Some(_)) = stream.chunk().await {}
        })
        .await;
        assert!(ended.is_ok());

        let mut stream = client
            .get(format!("{base}/stream/1"))
            .send()
            .await
            .unwrap();
        assert!(read_until(&mut stream, "second-frame").await);
        drop(stream);

        token.cancel();
        timeout(Duration::from_secs(2), reconciler_task).await.unwrap().unwrap();
        timeout(Duration::from_secs(2), server_task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
