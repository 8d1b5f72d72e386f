//! End-to-end fetch scenarios against a mock build index.

mod support;

use std::sync::Arc;

use mockito::{Matcher, Server};
use mozdl_cli::NullReporter;
use mozdl_cli::ops::{self, Context, FetchError, FetchOutcome};
use mozdl_core::{IndexConfig, ResolveError};
use mozdl_schema::{OsId, Product, Selectors};
use sha2::{Digest, Sha256};
use tempfile::tempdir;

use support::{
    context, entry_count, mock_artifacts, mock_download, mock_task, tar_bz2, zip_archive,
};

const LINUX_NS: &str = "gecko.v2.mozilla-central.latest.firefox.linux-x86_64";

#[tokio::test]
async fn test_linux_build_is_unpacked_and_archive_removed() {
    let mut server = Server::new_async().await;
    let archive = tar_bz2(&[("firefox/firefox", b"#!/bin/sh\n")]);
    let archive_len = archive.len() as u64;
    let archive_digest = hex::encode(Sha256::digest(&archive));
    let task = mock_task(&mut server, LINUX_NS).await;
    let listing = mock_artifacts(
        &mut server,
        &["public/logs/live.log", "public/build/target.tar.bz2"],
    )
    .await;
    let body = mock_download(&mut server, "public/build/target.tar.bz2", archive).await;

    let work = tempdir().unwrap();
    let dest = work.path().join("dest");
    let downloads = work.path().join("downloads");
    let selectors = Selectors::new(Product::Firefox, OsId::new("linux-x86_64"), &dest);
    let ctx = context(&server, &downloads);

    let outcome = ops::run(&selectors, &ctx).await.unwrap();

    task.assert_async().await;
    listing.assert_async().await;
    body.assert_async().await;
    match outcome {
        FetchOutcome::Installed {
            artifact,
            files,
            bytes,
            sha256,
            archive,
        } => {
            assert_eq!(artifact.name, "public/build/target.tar.bz2");
            assert_eq!(files, 1);
            assert_eq!(bytes, archive_len);
            assert_eq!(sha256, archive_digest);
            assert_eq!(archive, None);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(dest.join("firefox/firefox").is_file());
    assert_eq!(entry_count(&downloads), 0);
}

#[tokio::test]
async fn test_existing_product_folder_skips_network() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let work = tempdir().unwrap();
    std::fs::create_dir(work.path().join("firefox")).unwrap();
    let selectors = Selectors::new(Product::Firefox, OsId::new("linux-x86_64"), work.path());
    let ctx = context(&server, &work.path().join("downloads"));

    let outcome = ops::run(&selectors, &ctx).await.unwrap();

    any.assert_async().await;
    assert_eq!(
        outcome,
        FetchOutcome::AlreadyPresent {
            folder: work.path().join("firefox")
        }
    );
}

#[tokio::test]
async fn test_file_suffix_overrides_platform_format() {
    let mut server = Server::new_async().await;
    let archive = zip_archive(&[("firefox/firefox", b"binary")]);
    let _task = mock_task(
        &mut server,
        "gecko.v2.mozilla-central.latest.firefox.mac64",
    )
    .await;
    let _listing = mock_artifacts(
        &mut server,
        &["public/build/target.dmg", "public/build/target.zip"],
    )
    .await;
    let body = mock_download(&mut server, "public/build/target.zip", archive).await;

    let work = tempdir().unwrap();
    let dest = work.path().join("dest");
    let selectors = Selectors::new(Product::Firefox, OsId::new("mac64"), &dest)
        .with_file_suffix(".zip");
    let ctx = context(&server, &work.path().join("downloads"));

    let outcome = ops::run(&selectors, &ctx).await.unwrap();

    body.assert_async().await;
    assert!(matches!(outcome, FetchOutcome::Installed { files: 1, .. }));
    assert!(dest.join("firefox/firefox").is_file());
}

#[tokio::test]
async fn test_missing_artifact_fails_without_download() {
    let mut server = Server::new_async().await;
    let _task = mock_task(
        &mut server,
        "gecko.v2.mozilla-central.latest.firefox.mac64",
    )
    .await;
    let _listing = mock_artifacts(&mut server, &["public/build/target.tar.bz2"]).await;
    let download = server
        .mock("GET", Matcher::Regex("^/api/queue/v1/task/T1/artifacts/.+".to_string()))
        .expect(0)
        .create_async()
        .await;

    let work = tempdir().unwrap();
    let dest = work.path().join("dest");
    let selectors = Selectors::new(Product::Firefox, OsId::new("mac64"), &dest);
    let ctx = context(&server, &work.path().join("downloads"));

    let err = ops::run(&selectors, &ctx).await.unwrap_err();

    download.assert_async().await;
    match err {
        FetchError::Resolution(ResolveError::NoMatchingArtifact { suffix, task_id }) => {
            assert_eq!(suffix, ".dmg");
            assert_eq!(task_id, "T1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_unknown_os_fails_before_any_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let work = tempdir().unwrap();
    let selectors = Selectors::new(Product::Firefox, OsId::new(OsId::UNKNOWN), work.path());
    let ctx = context(&server, &work.path().join("downloads"));

    let err = ops::run(&selectors, &ctx).await.unwrap_err();

    any.assert_async().await;
    assert!(matches!(err, FetchError::UnknownFiletype(_)), "{err}");
    assert!(err.to_string().contains("--os"));
}

#[tokio::test]
async fn test_product_without_folder_always_fetches() {
    let mut server = Server::new_async().await;
    let archive = tar_bz2(&[("thunderbird/thunderbird", b"bin")]);
    let _task = mock_task(
        &mut server,
        "gecko.v2.mozilla-central.latest.thunderbird.linux-x86_64",
    )
    .await;
    let _listing = mock_artifacts(&mut server, &["public/build/target.tar.bz2"]).await;
    let body = mock_download(&mut server, "public/build/target.tar.bz2", archive).await;

    let work = tempdir().unwrap();
    std::fs::create_dir(work.path().join("thunderbird")).unwrap();
    let selectors = Selectors::new(
        Product::new("thunderbird"),
        OsId::new("linux-x86_64"),
        work.path(),
    );
    let ctx = context(&server, &work.path().join("downloads"));

    let outcome = ops::run(&selectors, &ctx).await.unwrap();

    body.assert_async().await;
    assert!(matches!(outcome, FetchOutcome::Installed { .. }));
    assert!(work.path().join("thunderbird/thunderbird").is_file());
}

#[tokio::test]
async fn test_keep_archive_persists_download() {
    let mut server = Server::new_async().await;
    let archive = tar_bz2(&[("firefox/firefox", b"bin")]);
    let _task = mock_task(&mut server, LINUX_NS).await;
    let _listing = mock_artifacts(&mut server, &["public/build/target.tar.bz2"]).await;
    let _body = mock_download(&mut server, "public/build/target.tar.bz2", archive.clone()).await;

    let work = tempdir().unwrap();
    let downloads = work.path().join("downloads");
    let selectors = Selectors::new(
        Product::Firefox,
        OsId::new("linux-x86_64"),
        work.path().join("dest"),
    );
    let ctx = context(&server, &downloads).with_keep_archive(true);

    let outcome = ops::run(&selectors, &ctx).await.unwrap();

    let kept = match outcome {
        FetchOutcome::Installed {
            archive: Some(kept),
            ..
        } => kept,
        other => panic!("archive was not kept: {other:?}"),
    };
    assert!(kept.starts_with(&downloads));
    assert_eq!(std::fs::read(&kept).unwrap(), archive);
}

#[tokio::test]
async fn test_corrupt_archive_is_removed_even_when_kept() {
    let mut server = Server::new_async().await;
    let _task = mock_task(&mut server, LINUX_NS).await;
    let _listing = mock_artifacts(&mut server, &["public/build/target.tar.bz2"]).await;
    let _body = mock_download(
        &mut server,
        "public/build/target.tar.bz2",
        b"not a bzip2 stream".to_vec(),
    )
    .await;

    let work = tempdir().unwrap();
    let downloads = work.path().join("downloads");
    let selectors = Selectors::new(
        Product::Firefox,
        OsId::new("linux-x86_64"),
        work.path().join("dest"),
    );
    let ctx = context(&server, &downloads).with_keep_archive(true);

    let err = ops::run(&selectors, &ctx).await.unwrap_err();

    assert!(matches!(err, FetchError::Extraction(_)), "{err}");
    assert_eq!(entry_count(&downloads), 0);
}

#[tokio::test]
async fn test_download_failure_is_reported() {
    let mut server = Server::new_async().await;
    let _task = mock_task(&mut server, LINUX_NS).await;
    let _listing = mock_artifacts(&mut server, &["public/build/target.tar.bz2"]).await;
    let _body = server
        .mock("GET", "/api/queue/v1/task/T1/artifacts/public/build/target.tar.bz2")
        .with_status(500)
        .create_async()
        .await;

    let work = tempdir().unwrap();
    let downloads = work.path().join("downloads");
    let selectors = Selectors::new(
        Product::Firefox,
        OsId::new("linux-x86_64"),
        work.path().join("dest"),
    );
    let ctx = Context::new(
        IndexConfig::with_root_url(server.url()),
        Arc::new(NullReporter),
    )
    .unwrap()
    .with_download_dir(Some(downloads.clone()));

    let err = ops::run(&selectors, &ctx).await.unwrap_err();

    assert!(matches!(err, FetchError::Download(_)), "{err}");
    assert_eq!(entry_count(&downloads), 0);
}
