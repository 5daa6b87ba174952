//! Prompt assembly for SQL generation

use crate::llm::ChatMessage;

/// Fixed instructions sent ahead of the schema and question
pub const SQL_ONLY_INSTRUCTIONS: &str = "You are an expert SQL generator.
Your ONLY task is to convert natural language questions into accurate SQL queries.
You MUST respond with *only* the SQL query.
Do NOT include any explanations, internal thoughts, conversational text, markdown formatting (like ```sql), or any other text before or after the SQL.
Your response should be *solely* the SQL query.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    instructions: String,
    schema: String,
    question: String,
}

impl Prompt {
    /// Prompt with the default SQL-only instructions
    pub fn new(schema: impl Into<String>, question: impl Into<String>) -> Self {
        Self::with_instructions(SQL_ONLY_INSTRUCTIONS, schema, question)
    }

    pub fn with_instructions(
        instructions: impl Into<String>,
        schema: impl Into<String>,
        question: impl Into<String>,
    ) -> Self {
        Self {
            instructions: instructions.into(),
            schema: schema.into(),
            question: question.into(),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Render to the single string handed to the model.
    ///
    /// Ends with a bare `SQL:` cue so the completion starts with the statement.
    pub fn render(&self) -> String {
        format!(
            "{}\n\nHere is the database schema:\n{}\n\nQuestion: {}\nSQL:",
            self.instructions.trim(),
            self.schema.trim(),
            self.question.trim()
        )
    }

    /// The rendered prompt as a single user message
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![ChatMessage::user(self.render())]
    }
}
