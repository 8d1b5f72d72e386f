//! Fixtures shared by the integration tests: archives and a mock build index.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use bzip2::Compression;
use bzip2::write::BzEncoder;
use mockito::{Mock, ServerGuard};
use mozdl_cli::NullReporter;
use mozdl_cli::ops::Context;
use mozdl_core::IndexConfig;

pub const TASK_ID: &str = "T1";
pub const EXPIRES: &str = "2030-01-01T00:00:00.000Z";

/// A tar.bz2 archive holding `entries`, all marked executable.
pub fn tar_bz2(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(BzEncoder::new(Vec::new(), Compression::default()));
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A zip archive holding `entries`.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
    for (path, data) in entries {
        writer.start_file(*path, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Index lookup for `namespace`, answering with [`TASK_ID`].
pub async fn mock_task(server: &mut ServerGuard, namespace: &str) -> Mock {
    server
        .mock("GET", format!("/api/index/v1/task/{namespace}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"namespace":"{namespace}","taskId":"{TASK_ID}"}}"#))
        .create_async()
        .await
}

/// Single-page artifact listing for [`TASK_ID`].
pub async fn mock_artifacts(server: &mut ServerGuard, names: &[&str]) -> Mock {
    let artifacts: Vec<String> = names
        .iter()
        .map(|name| format!(r#"{{"name":"{name}","expires":"{EXPIRES}"}}"#))
        .collect();
    server
        .mock("GET", format!("/api/queue/v1/task/{TASK_ID}/artifacts").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"artifacts":[{}]}}"#, artifacts.join(",")))
        .create_async()
        .await
}

/// Artifact body for `name` in [`TASK_ID`].
pub async fn mock_download(server: &mut ServerGuard, name: &str, body: Vec<u8>) -> Mock {
    server
        .mock(
            "GET",
            format!("/api/queue/v1/task/{TASK_ID}/artifacts/{name}").as_str(),
        )
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

/// Context against the mock index, downloading into `download_dir`.
pub fn context(server: &ServerGuard, download_dir: &Path) -> Context {
    Context::new(
        IndexConfig::with_root_url(server.url()),
        Arc::new(NullReporter),
    )
    .unwrap()
    .with_download_dir(Some(download_dir.to_path_buf()))
}

pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}
