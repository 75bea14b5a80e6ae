//! Shared helpers for the feed integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use feed_server::{build_router, AppState, Config};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Keeps the temporary data directory alive for the duration of a test.
pub struct TestSetup {
    pub temp_dir: TempDir,
    pub server: TestServer,
}

pub fn app_state(temp_dir: &TempDir, config: Config) -> AppState {
    AppState::new(
        temp_dir.path().to_path_buf(),
        "http://localhost:5000".to_string(),
        config,
    )
}

pub fn test_server(temp_dir: &TempDir) -> TestServer {
    TestServer::new(build_router(app_state(temp_dir, Config::default())))
        .expect("should create test server")
}

pub fn create_test_setup() -> TestSetup {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let server = test_server(&temp_dir);
    TestSetup { temp_dir, server }
}

/// Builds a minimal but valid `.nupkg` archive in memory.
pub fn nupkg(id: &str, version: &str, description: &str) -> Vec<u8> {
    let nuspec = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>{id}</id>
    <version>{version}</version>
    <authors>Integration Tests</authors>
    <description>{description}</description>
  </metadata>
</package>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer
        .start_file(format!("{id}.nuspec"), options)
        .expect("should start nuspec entry");
    writer
        .write_all(nuspec.as_bytes())
        .expect("should write nuspec");
    writer
        .start_file(format!("lib/net8.0/{id}.dll"), options)
        .expect("should start lib entry");
    writer.write_all(b"not really a dll").expect("should write lib");
    writer
        .finish()
        .expect("should finish archive")
        .into_inner()
}

pub fn upload_form(filename: &str, content: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(content)
        .file_name(filename.to_string())
        .mime_type("application/octet-stream");
    MultipartForm::new().add_part("package", part)
}

/// Pushes a generated archive and returns the HTTP status.
pub async fn push(server: &TestServer, id: &str, version: &str, description: &str) -> u16 {
    let form = upload_form(
        &format!("{id}.{version}.nupkg"),
        nupkg(id, version, description),
    );
    server
        .put("/api/v2/package")
        .multipart(form)
        .await
        .status_code()
        .as_u16()
}
