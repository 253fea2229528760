//! Plain terminal rendering of an update stream

use std::io::{self, Write};

use murmur_ai::classify::{
    as_tool_call_update, as_tool_error_update, as_tool_result_update, as_web_search_error_update,
    as_web_search_general_update, as_web_search_sources_update,
};
use murmur_ai::{MessageUpdate, MessageUpdateStatus, ResponseBuilder, ToolResultStatus};

use crate::utils::truncate_chars;

/// Writes updates to `out` as they arrive and folds them into a response
pub struct Renderer<W: Write> {
    out: W,
    response: ResponseBuilder,
    mid_line: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            response: ResponseBuilder::new(),
            mid_line: false,
        }
    }

    /// Render one update
    pub fn render(&mut self, update: &MessageUpdate) -> io::Result<()> {
        self.response.process_update(update);

        if let Some(search) = as_web_search_general_update(update) {
            return self.note(&format!("Searching: {}", search.message));
        }
        if let Some(sources) = as_web_search_sources_update(update) {
            self.note(&sources.message)?;
            for source in &sources.sources {
                let label = source.title.as_deref().unwrap_or(&source.link);
                self.note(&format!("  {} <{}>", label, source.link))?;
            }
            return Ok(());
        }
        if let Some(err) = as_web_search_error_update(update) {
            return self.note(&format!("Web search failed: {}", err.message));
        }
        if let Some(call) = as_tool_call_update(update) {
            return self.note(&format!("Running {}...", call.call.name));
        }
        if let Some(result) = as_tool_result_update(update) {
            let outcome = match result.result.status {
                ToolResultStatus::Success => "done",
                ToolResultStatus::Error => "failed",
            };
            return self.note(&format!("Tool {}: {}", result.uuid, outcome));
        }
        if let Some(err) = as_tool_error_update(update) {
            return self.note(&format!("Tool {} failed: {}", err.uuid, err.message));
        }

        match update {
            MessageUpdate::Stream { token } => {
                write!(self.out, "{}", token)?;
                self.mid_line = !token.ends_with('\n');
                self.out.flush()
            }
            MessageUpdate::Status {
                status: MessageUpdateStatus::Finished,
                ..
            } => self.end_line(),
            MessageUpdate::Status {
                status: MessageUpdateStatus::Error,
                message,
            } => {
                let message = message.as_deref().unwrap_or("unknown error");
                self.note(&format!("Error: {}", truncate_chars(message, 500)))
            }
            MessageUpdate::WebSearch(_) | MessageUpdate::Tool(_) => Ok(()),
        }
    }

    /// Annotation on its own line, set apart from the answer text
    fn note(&mut self, text: &str) -> io::Result<()> {
        self.end_line()?;
        writeln!(self.out, "[{}]", text)?;
        self.out.flush()
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }

    /// Stop rendering, returning the folded response
    pub fn finish(mut self) -> io::Result<ResponseBuilder> {
        self.end_line()?;
        Ok(self.response)
    }
}
