//! # Client Operations
//!
//! Blocking HTTP client used by the CLI to talk to a running feed, plus the
//! command functions that print its results.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::response::{FeedResponse, FeedStatus};
use crate::types::PackageRecord;

pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Decodes the response envelope. Error statuses still carry a body, so
    /// the envelope is read regardless of the HTTP status.
    fn envelope<T: DeserializeOwned>(response: Response, operation: &str) -> Result<FeedResponse<T>> {
        let status = response.status();
        debug!(%status, operation, "Received feed response");
        response
            .json::<FeedResponse<T>>()
            .with_context(|| format!("{operation}: unexpected response from server ({status})"))
    }

    fn expect_success<T>(response: FeedResponse<T>, operation: &str) -> Result<FeedResponse<T>> {
        if response.is_success() {
            Ok(response)
        } else {
            anyhow::bail!(
                "{} failed ({}): {}",
                operation,
                response.status(),
                response.message().unwrap_or("no message")
            )
        }
    }

    /// Listing payload of a response. An empty feed answers `NotFound`, which
    /// is an empty listing from the client's point of view.
    fn listing(
        response: FeedResponse<Vec<PackageRecord>>,
        operation: &str,
    ) -> Result<Vec<PackageRecord>> {
        if response.status() == FeedStatus::NotFound {
            debug!(operation, "Feed is empty");
            return Ok(Vec::new());
        }
        Ok(Self::expect_success(response, operation)?
            .into_payload()
            .unwrap_or_default())
    }

    pub fn is_server_running(&self) -> bool {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    /// Upload a `.nupkg` archive.
    pub fn push<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let file_path = file_path.as_ref();
        info!(file_path = %file_path.display(), "Pushing package");

        let form = reqwest::blocking::multipart::Form::new()
            .file("package", file_path)
            .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

        let response = self
            .client
            .put(format!("{}/api/v2/package", self.base_url))
            .multipart(form)
            .send()
            .context("Failed to send package to server")?;

        Self::expect_success(Self::envelope::<()>(response, "Push")?, "Push")?;
        Ok(())
    }

    /// Latest version of each package matching `query`.
    pub fn search(&self, query: Option<&str>) -> Result<Vec<PackageRecord>> {
        let mut request = self.client.get(format!("{}/api/packages", self.base_url));
        if let Some(query) = query {
            request = request.query(&[("q", query)]);
        }
        let response = request.send().context("Failed to search packages")?;

        Self::listing(Self::envelope(response, "Search")?, "Search")
    }

    /// Every stored package version. An empty feed is an empty list.
    pub fn list(&self) -> Result<Vec<PackageRecord>> {
        let response = self
            .client
            .get(format!("{}/api/catalog", self.base_url))
            .send()
            .context("Failed to get package list")?;

        Self::listing(Self::envelope(response, "List")?, "List")
    }
}

fn ensure_running(client: &FeedClient, server_url: &str) -> Result<()> {
    if !client.is_server_running() {
        anyhow::bail!("Package feed is not reachable at {server_url}");
    }
    Ok(())
}

fn print_records(records: &[PackageRecord]) {
    for record in records {
        println!("  {} {}", record.id, record.version);
        if !record.description.is_empty() {
            println!("      {}", record.description);
        }
    }
}

pub fn push_package<P: AsRef<Path>>(server_url: &str, file_path: P) -> Result<()> {
    let client = FeedClient::new(server_url);
    ensure_running(&client, server_url)?;

    client.push(file_path.as_ref())?;
    println!("✅ Pushed {}", file_path.as_ref().display());
    Ok(())
}

pub fn search_packages(server_url: &str, query: Option<&str>) -> Result<()> {
    let client = FeedClient::new(server_url);
    ensure_running(&client, server_url)?;

    let results = client.search(query)?;
    if results.is_empty() {
        println!("No matching packages");
    } else {
        println!("🔍 {} package(s):", results.len());
        print_records(&results);
    }
    Ok(())
}

pub fn list_packages(server_url: &str) -> Result<()> {
    let client = FeedClient::new(server_url);
    ensure_running(&client, server_url)?;

    let records = client.list()?;
    if records.is_empty() {
        println!("📦 No packages in feed");
    } else {
        println!("📦 {} package version(s):", records.len());
        print_records(&records);
    }
    Ok(())
}
