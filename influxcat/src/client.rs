//! InfluxDB 1.x HTTP client

use async_trait::async_trait;
use influxcat_core::{
    BatchPoints, InfluxcatError, QueryExecutor, QueryResult, Result, WriteSink,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use tracing::debug;

use crate::config::InfluxConfig;
use crate::line_protocol;

/// One JSON object of a (possibly chunked) `/query` response
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Speaks `/query` and `/write`
pub struct InfluxClient {
    http: Client,
    base: String,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        let url = Url::parse(&config.addr).map_err(|e| {
            InfluxcatError::InvalidArgument(format!("invalid address {:?}: {}", config.addr, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(InfluxcatError::InvalidArgument(format!(
                "address {:?} must start with http:// or https://",
                config.addr
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| InfluxcatError::ConnectionError(e.to_string()))?;

        Ok(Self {
            http,
            base: config.addr.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }
}

#[async_trait]
impl QueryExecutor for InfluxClient {
    async fn execute(&self, statement: &str, database: &str) -> Result<Vec<QueryResult>> {
        debug!("Query {:?} on database {}", statement, database);

        let resp = self
            .authorize(self.http.get(self.endpoint("query")))
            .query(&[("db", database), ("q", statement), ("chunked", "true")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(InfluxcatError::QueryError(format!(
                "{}: {}",
                status,
                server_message(&body)
            )));
        }

        parse_query_response(&body)
    }
}

#[async_trait]
impl WriteSink for InfluxClient {
    async fn write(&self, batch: BatchPoints) -> Result<()> {
        let body = line_protocol::encode_batch(&batch.points)?;
        debug!(
            "Writing {} points ({} bytes) to database {}",
            batch.len(),
            body.len(),
            batch.database
        );

        let resp = self
            .authorize(self.http.post(self.endpoint("write")))
            .query(&[("db", batch.database.as_str()), ("precision", "ns")])
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.bytes().await.map_err(transport_error)?;
        Err(InfluxcatError::WriteError(format!(
            "{}: {}",
            status,
            server_message(&body)
        )))
    }
}

/// Decode the concatenated chunks of a `/query` response into one result per statement
pub fn parse_query_response(body: &[u8]) -> Result<Vec<QueryResult>> {
    let mut merged: Vec<QueryResult> = Vec::new();

    for chunk in serde_json::Deserializer::from_slice(body).into_iter::<QueryResponse>() {
        let chunk = chunk
            .map_err(|e| InfluxcatError::QueryError(format!("malformed query response: {}", e)))?;

        if let Some(error) = chunk.error {
            return Err(InfluxcatError::QueryError(error));
        }

        for result in chunk.results {
            if let Some(error) = result.error {
                return Err(InfluxcatError::QueryError(error));
            }
            merge_result(&mut merged, result);
        }
    }

    Ok(merged)
}

fn merge_result(merged: &mut Vec<QueryResult>, result: QueryResult) {
    let Some(index) = merged
        .iter()
        .rposition(|r| r.statement_id == result.statement_id)
    else {
        merged.push(result);
        return;
    };

    let existing = &mut merged[index];
    for series in result.series {
        match existing.series.last_mut() {
            Some(last) if last.partial && last.name == series.name && last.tags == series.tags => {
                last.values.extend(series.values);
                last.partial = series.partial;
            }
            _ => existing.series.push(series),
        }
    }
}

fn transport_error(e: reqwest::Error) -> InfluxcatError {
    InfluxcatError::ConnectionError(e.to_string())
}

fn server_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    }
}
