pub mod json;
pub mod markdown;
pub mod terminal;

pub use json::JsonWriter;
pub use markdown::MarkdownWriter;
pub use terminal::TerminalWriter;

use crate::report::ReportContext;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

impl OutputFormat {
    /// File extension used when the format is written to disk.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Terminal => "txt",
        }
    }
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &ReportContext) -> anyhow::Result<()>;
}

pub fn create_writer<'a>(format: OutputFormat, writer: Box<dyn Write + 'a>) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

/// Render a report into a string with the given format.
pub fn render_to_string(format: OutputFormat, report: &ReportContext) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    create_writer(format, Box::new(&mut buffer)).write_report(report)?;
    Ok(String::from_utf8(buffer)?)
}
