mod common;

use bytes::Bytes;
use serde_json::json;
use tracing_test::traced_test;

use cdn_blob::{BlobOp, BlobStore, ObjectAcl};
use cdn_core::ErrorKind;
use cdn_docs::{DocOp, DocumentStore};

use common::*;

/// Ten bytes named photo.png: extension and size kept, both URLs on one key.
#[tokio::test]
async fn upload_png_scenario() {
    let h = harness();

    let record = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap();
    assert_eq!(record.ext, ".png");
    assert_eq!(record.size, 10);
    assert_eq!(record.id.len(), 8);
    assert!(record.id.chars().all(|c| c.is_ascii_alphanumeric()));

    let key = format!("{}.png", record.id);
    assert_eq!(record.key(), key);
    assert_eq!(h.files.cdn_url(&record), format!("{}/{}", CDN, key));
    assert_eq!(h.files.storage_url(&record), format!("{}/{}", BUCKET_URL, key));

    let head = h.blobs.head(&key).await.unwrap();
    assert_eq!(head.size_bytes, 10);
    assert_eq!(head.content_type.as_deref(), Some("image/png"));
    assert_eq!(h.blobs.acl_of(&key), Some(ObjectAcl::PublicRead));
}

#[tokio::test]
async fn upload_then_resolve_keeps_owner_size_and_extension() {
    let h = harness();

    for (name, body) in [
        ("a.txt", &b"plain text"[..]),
        ("noext", &b"\x00\x01binary"[..]),
        ("dir/clip.mp4", &b"not really a video"[..]),
    ] {
        let uploaded = h
            .files
            .upload(&alice(), Bytes::copy_from_slice(body), name)
            .await
            .unwrap();
        let resolved = h.files.resolve(&uploaded.id).await.unwrap();

        assert_eq!(resolved.owner, uploaded.owner);
        assert_eq!(resolved.size, body.len() as u64);
        assert_eq!(resolved.ext, uploaded.ext);
        assert_eq!(resolved, uploaded);
    }
}

#[tokio::test]
async fn content_type_comes_from_bytes_not_name() {
    let h = harness();

    let record = h
        .files
        .upload(&alice(), Bytes::from_static(b"just some notes"), "notes.png")
        .await
        .unwrap();
    let head = h.blobs.head(&record.key()).await.unwrap();
    assert_eq!(head.content_type.as_deref(), Some("text/plain; charset=utf-8"));
}

#[tokio::test]
async fn empty_upload_is_rejected_before_any_write() {
    let h = harness();

    let err = h.files.upload(&alice(), Bytes::new(), "empty.png").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.code(), 400);
    assert!(h.blobs.is_empty());
    assert_eq!(h.docs.count("files"), 0);
}

#[tokio::test]
async fn taken_id_is_skipped() {
    let h = harness();
    h.docs
        .create("files", "taken001", json!({"id": "taken001", "ext": "", "owner": "bob", "size": 1}))
        .await
        .unwrap();

    let files = h.files.clone().with_ids(ScriptedIds::new(&["taken001", "fresh001"]));
    let record = files.upload(&alice(), png_10(), "p.png").await.unwrap();

    assert_eq!(record.id, "fresh001");
    assert!(h.blobs.contains("fresh001.png"));
    assert!(!h.blobs.contains("taken001.png"));
}

#[tokio::test]
async fn id_allocation_gives_up_after_configured_attempts() {
    let h = harness();
    h.docs
        .create("files", "same0001", json!({"id": "same0001", "ext": "", "owner": "bob", "size": 1}))
        .await
        .unwrap();

    let files = h
        .files
        .clone()
        .with_ids(ScriptedIds::new(&["same0001", "same0001", "same0001", "never001"]));
    let err = files.upload(&alice(), png_10(), "p.png").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(h.blobs.calls(BlobOp::Put), 0);
}

#[tokio::test]
#[traced_test]
async fn metadata_failure_after_blob_write_is_partial() {
    let h = harness();
    h.docs.fail_on(DocOp::Create);

    let err = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap_err();

    assert!(err.is_partial_failure());
    assert_eq!(err.code(), 500);
    // the orphan stays behind and is reported
    assert_eq!(h.blobs.len(), 1);
    assert_eq!(h.docs.count("files"), 0);
    assert!(logs_contain("blob left orphaned"));
}

#[tokio::test]
async fn blob_failure_writes_no_metadata() {
    let h = harness();
    h.blobs.fail_on(BlobOp::Put);

    let err = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Store);
    assert_eq!(h.docs.calls(DocOp::Create), 0);
}

#[tokio::test]
async fn delete_then_resolve_is_not_found() {
    let h = harness();
    let record = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap();

    h.files.delete(&record).await.unwrap();

    let err = h.files.resolve(&record.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(!h.blobs.contains(&record.key()));
}

#[tokio::test]
async fn failed_blob_delete_keeps_metadata() {
    let h = harness();
    let record = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap();
    h.blobs.fail_on(BlobOp::Delete);

    let err = h.files.delete(&record).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Store);
    assert_eq!(h.docs.calls(DocOp::Delete), 0);
    assert!(h.files.resolve(&record.id).await.is_ok());
}

#[tokio::test]
async fn failed_metadata_delete_is_partial() {
    let h = harness();
    let record = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap();
    h.docs.fail_on(DocOp::Delete);

    let err = h.files.delete(&record).await.unwrap_err();
    assert!(err.is_partial_failure());
    assert!(!h.blobs.contains(&record.key()));
    assert!(h.files.resolve(&record.id).await.is_ok());
}

#[tokio::test]
async fn owner_check_matches_exactly() {
    let h = harness();
    let record = h.files.upload(&alice(), png_10(), "photo.png").await.unwrap();

    assert!(h.files.check_owner(&record, &alice()).is_ok());
    let err = h.files.check_owner(&record, &bob()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    assert_eq!(err.code(), 403);
}

#[tokio::test]
async fn delete_many_checks_every_owner_first() {
    let h = harness();
    let mine = h.files.upload(&alice(), png_10(), "a.png").await.unwrap();
    let theirs = h.files.upload(&bob(), png_10(), "b.png").await.unwrap();

    let err = h
        .files
        .delete_many(&alice(), &[mine.id.as_str(), theirs.id.as_str()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
    assert_eq!(h.blobs.len(), 2);

    let deleted = h.files.delete_many(&alice(), &[mine.id.as_str()]).await.unwrap();
    assert_eq!(deleted, vec![mine.clone()]);
    assert!(h.files.resolve(&mine.id).await.is_err());
    assert!(h.files.resolve(&theirs.id).await.is_ok());
}

#[tokio::test]
async fn resolve_store_failure_is_not_not_found() {
    let h = harness();
    h.docs.fail_on(DocOp::Get);

    let err = h.files.resolve("whatever").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Store);
}
