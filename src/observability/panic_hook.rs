//! Panic hook printing a crash report with the pipeline context.

use super::context::{get_current_context, get_progress, PipelineContext};
use std::panic::PanicHookInfo;
use tracing::Span;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const WIDTH: usize = 76;

/// Install the crash report hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprint!("{}", crash_report(info));
    }));
}

fn crash_report(info: &PanicHookInfo<'_>) -> String {
    let context = get_current_context();
    let (processed, total) = get_progress();
    let span = Span::current();

    let mut lines = vec![
        format!("tsrgen {} crashed", VERSION),
        format!("Platform: {}", std::env::consts::OS),
        format!("Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")),
        format!("Panic: {}", panic_message(info)),
    ];
    if let Some(location) = info.location() {
        lines.push(format!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ));
    }
    lines.extend(context_lines(&context, processed, total));
    if let Some(metadata) = span.metadata() {
        lines.push(format!("Span: {}", metadata.name()));
    }
    if std::env::var("RUST_BACKTRACE").is_err() {
        lines.push("Run with RUST_BACKTRACE=1 for a stack trace".to_string());
    }

    let border = "═".repeat(WIDTH);
    let mut out = format!("\n{border}\n");
    for line in lines {
        out.push_str(&format!("  {}\n", truncate(&line, WIDTH - 2)));
    }
    out.push_str(&format!("{border}\n"));
    if std::env::var("RUST_BACKTRACE").is_ok() {
        out.push_str(&format!("{}\n", std::backtrace::Backtrace::capture()));
    }
    out
}

fn context_lines(context: &PipelineContext, processed: usize, total: usize) -> Vec<String> {
    let mut lines = Vec::new();
    match context.phase {
        Some(phase) => lines.push(format!("Phase: {phase}")),
        None => lines.push("Phase: (not set)".to_string()),
    }
    if let Some(input) = &context.current_input {
        lines.push(format!("Input: {}", input.display()));
    }
    if total > 0 {
        lines.push(format!("Progress: {processed} / {total} inputs"));
    }
    lines
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::PipelinePhase;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        let long = truncate("this is a long string that needs truncation", 20);
        assert_eq!(long.chars().count(), 20);
        assert!(long.ends_with("..."));
        assert_eq!(truncate("hello", 3), "...");
    }

    #[test]
    fn test_context_lines() {
        let context = PipelineContext {
            phase: Some(PipelinePhase::Narrative),
            current_input: Some("runs.csv".into()),
        };
        assert_eq!(
            context_lines(&context, 1, 3),
            vec!["Phase: narrative", "Input: runs.csv", "Progress: 1 / 3 inputs"]
        );
        assert_eq!(
            context_lines(&PipelineContext::new(), 0, 0),
            vec!["Phase: (not set)"]
        );
    }
}
