//! Question pipeline
//!
//! question + schema -> prompt -> model -> extractor -> SQLite -> answer.
//! Every failure is folded into an [`Answer`] so one bad question never
//! affects the next one.

use crate::config::AppConfig;
use crate::error::Result;
use crate::extractor::extract_sql;
use crate::llm::CompletionBackend;
use crate::presentation::{OutputFormat, ResultTable};
use crate::prompt::Prompt;
use crate::store::{QueryExecutor, QueryResult};
use tracing::{info, warn};

/// Outcome of one question
#[derive(Debug, Clone)]
pub enum Answer {
    /// The model backend could not be reached or returned an error
    BackendUnavailable { model: String, message: String },

    /// The completion contained nothing that looks like a statement
    NoSqlFound { completion: String },

    /// SQLite rejected the statement
    ExecutionFailed { sql: String, message: String },

    /// The statement ran but produced no rows
    NoRows { sql: String, result: QueryResult },

    Rows { sql: String, result: QueryResult },
}

impl Answer {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Answer::ExecutionFailed { sql, .. } | Answer::NoRows { sql, .. } | Answer::Rows { sql, .. } => {
                Some(sql.as_str())
            }
            Answer::BackendUnavailable { .. } | Answer::NoSqlFound { .. } => None,
        }
    }

    /// True for outcomes the user should treat as a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Answer::BackendUnavailable { .. } | Answer::NoSqlFound { .. } | Answer::ExecutionFailed { .. }
        )
    }

    /// Whether [`Answer::describe`] yields data in `format` rather than a
    /// status message. `Json` and `Csv` only carry data for answers with rows.
    pub fn is_data(&self, format: OutputFormat) -> bool {
        format == OutputFormat::Table || matches!(self, Answer::Rows { .. })
    }

    /// User-facing text for this answer.
    ///
    /// With `Json` or `Csv`, an answer with rows renders only the data; every
    /// other answer stays a status message, which [`Answer::is_data`] reports.
    pub fn describe(&self, format: OutputFormat) -> Result<String> {
        let text = match self {
            Answer::BackendUnavailable { model, message } => format!(
                "Error communicating with Ollama ({model}): {message}\n\
                 Please ensure Ollama is running and the '{model}' model is downloaded (`ollama run {model}`).",
                model = model,
                message = message
            ),
            Answer::NoSqlFound { .. } => {
                "SQL generation failed. Please try a different question or check Ollama server status."
                    .to_string()
            }
            Answer::ExecutionFailed { sql, message } => format!(
                "Generated SQL:\n{}\n\nError executing SQL query against database: {}\n\
                 The generated SQL might be incorrect or incompatible with the database schema.",
                sql, message
            ),
            Answer::NoRows { sql, result } if result.rows_affected > 0 => format!(
                "Generated SQL:\n{}\n\n{} row(s) affected.",
                sql, result.rows_affected
            ),
            Answer::NoRows { sql, .. } => format!(
                "Generated SQL:\n{}\n\nNo results found for this query or the query returned an empty set.",
                sql
            ),
            Answer::Rows { sql, result } => {
                let rendered = ResultTable::new(result).render(format)?;
                match format {
                    OutputFormat::Table => format!("Generated SQL:\n{}\n\nQuery Results:\n{}", sql, rendered),
                    OutputFormat::Json | OutputFormat::Csv => rendered,
                }
            }
        };
        Ok(text)
    }
}

pub struct SqlAssistant<B> {
    backend: B,
    executor: QueryExecutor,
    schema: String,
}

impl<B: CompletionBackend> SqlAssistant<B> {
    pub fn new(config: &AppConfig, backend: B) -> Self {
        Self {
            backend,
            executor: QueryExecutor::new(config.db_path.clone()),
            schema: config.schema.clone(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Startup check: the session cannot continue without the database
    pub fn ensure_database(&self) -> Result<()> {
        self.executor.ensure_exists()
    }

    /// Raw model completion for a question
    pub async fn complete(&self, question: &str) -> Result<String> {
        let prompt = Prompt::new(self.schema.as_str(), question);
        self.backend.complete(&prompt.to_messages()).await
    }

    /// Prompt the model and extract a statement, without executing it
    pub async fn generate_sql(&self, question: &str) -> Result<Option<String>> {
        let completion = self.complete(question).await?;
        Ok(extract_sql(&completion))
    }

    /// Answer one question end to end
    pub async fn ask(&self, question: &str) -> Answer {
        info!("Question: {}", question);

        let completion = match self.complete(question).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!("Model backend failed: {}", e);
                return Answer::BackendUnavailable {
                    model: self.backend.model().to_string(),
                    message: e.to_string(),
                };
            }
        };

        match extract_sql(&completion) {
            Some(sql) => {
                info!("Extracted SQL: {}", sql);
                self.run_sql(&sql)
            }
            None => {
                warn!("No SQL found in completion: {:?}", completion);
                Answer::NoSqlFound { completion }
            }
        }
    }

    /// Execute a statement directly and classify the outcome
    pub fn run_sql(&self, sql: &str) -> Answer {
        let sql = sql.to_string();
        match self.executor.execute(&sql) {
            Ok(result) if result.is_empty() => Answer::NoRows { sql, result },
            Ok(result) => Answer::Rows { sql, result },
            Err(e) => {
                warn!("Execution failed for '{}': {}", sql, e);
                Answer::ExecutionFailed {
                    sql,
                    message: e.to_string(),
                }
            }
        }
    }
}
