//! Integration tests for the streamed entry surface and the tag registry.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use cairn_core::api::{API_KEY_HEADER, EntryFrame};
use cairn_core::{Digest, STREAM_CHUNK_SIZE};
use cairn_store::ObjectWrite;
use common::{RO_KEY, RW_KEY, test_server};
use serde_json::json;

const EMPTY_DIGEST: &str =
    "sha2-256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

fn parse_frames(body: &[u8]) -> Vec<EntryFrame> {
    std::str::from_utf8(body)
        .unwrap()
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

async fn put_entry(server: &common::TestServer, chunks: Vec<Bytes>) -> (StatusCode, serde_json::Value) {
    let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, std::io::Error>));
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/entries")
        .header(API_KEY_HEADER, RW_KEY)
        .body(Body::from_stream(stream))
        .unwrap();
    let (status, bytes) = server.send(request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

fn wire_digest(value: &serde_json::Value) -> Digest {
    let wire: cairn_core::WireDigest =
        serde_json::from_value(value["digests"][0].clone()).unwrap();
    Digest::from_wire(&wire).unwrap()
}

#[tokio::test]
async fn streamed_put_assembles_chunks() {
    let server = test_server();

    let (status, metadata) = put_entry(
        &server,
        vec![Bytes::from_static(b"hello "), Bytes::from_static(b"world")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wire_digest(&metadata), Digest::compute(b"hello world"));

    // The blob is readable through the plain store.
    let (status, bytes) = server
        .raw_get(Some(RO_KEY), &Digest::compute(b"hello world").to_human())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, Bytes::from_static(b"hello world"));
}

#[tokio::test]
async fn streamed_put_of_empty_stream_stores_empty_blob() {
    let server = test_server();

    let (status, metadata) = put_entry(&server, vec![]).await;
    assert_eq!(status, StatusCode::OK);
    let digest = wire_digest(&metadata);
    assert_eq!(digest.to_human(), EMPTY_DIGEST);

    let (status, bytes) = server.raw_get(Some(RO_KEY), EMPTY_DIGEST).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn streamed_put_accepts_odd_chunk_sizes() {
    let server = test_server();
    let blob: Vec<u8> = (0..STREAM_CHUNK_SIZE / 128).map(|i| (i % 251) as u8).collect();
    let chunks: Vec<Bytes> = blob.chunks(777).map(Bytes::copy_from_slice).collect();

    let (status, metadata) = put_entry(&server, chunks).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wire_digest(&metadata), Digest::compute(&blob));
}

#[tokio::test]
async fn streamed_get_sends_metadata_then_one_chunk() {
    let server = test_server();
    let digest = server
        .ctx
        .store
        .put(Bytes::from_static(b"streamed payload"))
        .await
        .unwrap();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/entries/{}", digest.to_human()))
        .header(API_KEY_HEADER, RO_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, body) = server.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let frames = parse_frames(&body);
    assert_eq!(frames.len(), 2);
    match &frames[0] {
        EntryFrame::Metadata(metadata) => {
            assert_eq!(Digest::from_wire(&metadata.digests[0]).unwrap(), digest);
        }
        other => panic!("expected metadata first, got {other:?}"),
    }
    match &frames[1] {
        EntryFrame::Chunk(chunk) => assert_eq!(chunk.data, b"streamed payload"),
        other => panic!("expected chunk, got {other:?}"),
    }
}

#[tokio::test]
async fn streamed_get_missing_entry_is_404() {
    let server = test_server();
    let absent = Digest::compute(b"absent entry");

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/entries/{}", absent.to_human()))
        .header(API_KEY_HEADER, RO_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, _) = server.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metadata_probe() {
    let server = test_server();
    let digest = server
        .ctx
        .store
        .put(Bytes::from_static(b"probe me"))
        .await
        .unwrap();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/entries/{}/metadata", digest.to_human()))
        .header(API_KEY_HEADER, RO_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, body) = server.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let metadata: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(wire_digest(&metadata), digest);

    let absent = Digest::compute(b"never stored");
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/v1/entries/{}/metadata", absent.to_human()))
        .header(API_KEY_HEADER, RO_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, _) = server.send(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tag_roundtrip_and_tamper_rejection() {
    let server = test_server();

    let target = server
        .ctx
        .store
        .put(Bytes::from_static(b"release artifact"))
        .await
        .unwrap();

    let key = cairn_registry::generate_key();
    let signed = cairn_registry::sign_tag(
        &key,
        cairn_registry::Tag {
            label: "v1".to_string(),
            target: target.clone(),
        },
    )
    .unwrap();

    let (status, _) = server
        .post_json(
            "/api/v1/tags/set",
            Some(RW_KEY),
            &json!({ "signed_tag": &signed }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = server
        .post_json(
            "/api/v1/tags/get",
            Some(RO_KEY),
            &json!({
                "public_key": common::b64(&signed.public_key),
                "label": "v1"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signed_tag"]["tag"]["target"], target.to_human());

    // Tamper with the target without re-signing.
    let mut tampered = signed.clone();
    tampered.tag.target = Digest::compute(b"attacker artifact");
    let (status, body) = server
        .post_json(
            "/api/v1/tags/set",
            Some(RW_KEY),
            &json!({ "signed_tag": &tampered }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "registry_error");

    // The registry still serves the original target.
    let (_, body) = server
        .post_json(
            "/api/v1/tags/get",
            Some(RO_KEY),
            &json!({
                "public_key": common::b64(&signed.public_key),
                "label": "v1"
            }),
        )
        .await;
    assert_eq!(body["signed_tag"]["tag"]["target"], target.to_human());
}

#[tokio::test]
async fn newest_tag_wins() {
    let server = test_server();
    let key = cairn_registry::generate_key();

    for payload in [b"one".as_slice(), b"two".as_slice()] {
        let target = server.ctx.store.put(Bytes::copy_from_slice(payload)).await.unwrap();
        let signed = cairn_registry::sign_tag(
            &key,
            cairn_registry::Tag {
                label: "head".to_string(),
                target,
            },
        )
        .unwrap();
        let (status, _) = server
            .post_json(
                "/api/v1/tags/set",
                Some(RW_KEY),
                &json!({ "signed_tag": &signed }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let signed = cairn_registry::sign_tag(
        &key,
        cairn_registry::Tag {
            label: "ignored".to_string(),
            target: Digest::compute(b"x"),
        },
    )
    .unwrap();
    let (_, body) = server
        .post_json(
            "/api/v1/tags/get",
            Some(RO_KEY),
            &json!({
                "public_key": common::b64(&signed.public_key),
                "label": "head"
            }),
        )
        .await;
    assert_eq!(
        body["signed_tag"]["tag"]["target"],
        Digest::compute(b"two").to_human()
    );
}

#[tokio::test]
async fn tag_set_requires_write_capability() {
    let server = test_server();
    let key = cairn_registry::generate_key();
    let signed = cairn_registry::sign_tag(
        &key,
        cairn_registry::Tag {
            label: "v1".to_string(),
            target: Digest::compute(b"x"),
        },
    )
    .unwrap();

    let (status, _) = server
        .post_json(
            "/api/v1/tags/set",
            Some(RO_KEY),
            &json!({ "signed_tag": &signed }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
