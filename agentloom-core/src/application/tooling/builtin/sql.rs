//! Natural-language database queries: a completion model writes the SQL,
//! the database runs it.

use crate::application::tooling::{ParamType, ToolDescriptor, ToolExecutionError, ToolHandler};
use crate::infrastructure::database::{Database, render_rows};
use crate::model::{CompletionRequest, ModelParams, ModelProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub const NAME: &str = "query_db";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "Query the database using natural language. The question is translated to SQL and the resulting rows are returned.",
    )
    .with_required(
        "query",
        ParamType::String,
        "The question to answer from the database.",
    )
}

pub fn build_prompt(schema: &str, question: &str) -> String {
    format!(
        "{schema}\n\n-- Using valid SQLite, answer the following questions for the tables provided above.\n\n-- {question}\n\nSELECT"
    )
}

/// Turn a completion of the `SELECT` prompt into one statement.
///
/// Returns `None` when the model produced nothing usable.
pub fn complete_select(completion: &str) -> Option<String> {
    let mut body = completion.trim_start();
    if let (Some(head), Some(rest)) = (body.get(..6), body.get(6..))
        && head.eq_ignore_ascii_case("select")
        && rest.chars().next().is_none_or(char::is_whitespace)
    {
        body = rest;
    }
    let body = body.split(';').next().unwrap_or_default().trim();
    if body.is_empty() {
        None
    } else {
        Some(format!("SELECT {body}"))
    }
}

pub struct SqlQueryTool {
    descriptor: ToolDescriptor,
    provider: Arc<dyn ModelProvider>,
    database: Arc<dyn Database>,
    params: ModelParams,
}

impl SqlQueryTool {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        database: Arc<dyn Database>,
        params: ModelParams,
    ) -> Self {
        Self {
            descriptor: descriptor(),
            provider,
            database,
            params,
        }
    }
}

#[async_trait]
impl ToolHandler for SqlQueryTool {
    async fn call(&self, input: Value) -> Result<String, ToolExecutionError> {
        let args = self.descriptor.validate(&input)?;
        let question = args
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let schema = self.database.schema().await?;
        let request = CompletionRequest::new(build_prompt(&schema, question), self.params.clone());
        let completion = self.provider.complete(request).await?;

        let sql = complete_select(&completion.text).ok_or_else(|| {
            ToolExecutionError::Generation("model returned an empty SQL statement".to_string())
        })?;
        debug!(%sql, "Executing generated SQL");

        let rows = self.database.execute(&sql).await?;
        Ok(render_rows(&rows))
    }
}
