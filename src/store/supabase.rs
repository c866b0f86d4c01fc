use super::{InterviewStore, InterviewUpdate, NewInterview, ResponseRecord};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const INTERVIEWS_TABLE: &str = "interviews";
const RESPONSES_TABLE: &str = "interview_responses";

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. https://xxxx.supabase.co
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    id: serde_json::Value,
}

/// PostgREST-backed store for a hosted Supabase project
pub struct SupabaseStore {
    config: SupabaseConfig,
    http: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, http })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", self.config.anon_key))
    }

    async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Failed to {what} ({status}): {body}")
    }
}

#[async_trait::async_trait]
impl InterviewStore for SupabaseStore {
    async fn create_interview(&self, interview: NewInterview) -> Result<String> {
        let request = self
            .http
            .post(self.table_url(INTERVIEWS_TABLE))
            .header("Prefer", "return=representation")
            .json(&interview);

        let resp = self
            .authed(request)
            .send()
            .await
            .context("Failed to reach Supabase")?;
        let resp = Self::check(resp, "create interview").await?;

        let rows: Vec<CreatedRow> = resp
            .json()
            .await
            .context("Failed to parse created interview")?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Interview creation returned empty response"))?;

        let id = match row.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        debug!("Created interview row {}", id);
        Ok(id)
    }

    async fn update_interview(&self, id: &str, update: InterviewUpdate) -> Result<()> {
        let request = self
            .http
            .patch(self.table_url(INTERVIEWS_TABLE))
            .query(&[("id", format!("eq.{id}"))])
            .json(&update);

        let resp = self
            .authed(request)
            .send()
            .await
            .context("Failed to reach Supabase")?;
        Self::check(resp, "update interview").await?;
        Ok(())
    }

    async fn append_response(&self, record: ResponseRecord) -> Result<()> {
        let request = self.http.post(self.table_url(RESPONSES_TABLE)).json(&record);

        let resp = self
            .authed(request)
            .send()
            .await
            .context("Failed to reach Supabase")?;
        Self::check(resp, "save response").await?;
        Ok(())
    }
}
