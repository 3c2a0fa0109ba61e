//! Terminal and JSON renderers for the result stream.
//!
//! Records go to **stdout** as they arrive. In human mode, per-item
//! problems go to stderr so stdout stays readable; in JSON mode every
//! event is one object per line on stdout, so a script sees a single
//! ordered log.

use std::io::Write;

use flight_stream_core::models::{DisplayRecord, ProviderSummary};
use flight_stream_core::render::{Renderer, StreamEnd};

/// Human-friendly output: one block per record, a provider table at the end.
pub struct TerminalRenderer<W: Write + Send, E: Write + Send> {
    out: W,
    err: E,
    summaries: Vec<ProviderSummary>,
}

impl<W: Write + Send, E: Write + Send> TerminalRenderer<W, E> {
    pub fn new(out: W, err: E) -> Self {
        Self {
            out,
            err,
            summaries: Vec::new(),
        }
    }

    /// Latest summary per provider, first-seen order.
    pub fn summaries(&self) -> &[ProviderSummary] {
        &self.summaries
    }

    pub fn into_inner(self) -> (W, E) {
        (self.out, self.err)
    }
}

impl<W: Write + Send, E: Write + Send> Renderer for TerminalRenderer<W, E> {
    fn on_records_appended(&mut self, records: &[DisplayRecord]) {
        for record in records {
            let _ = writeln!(
                self.out,
                "{}  {}",
                record.price, record.provider_presentation_name
            );
            for line in &record.lines {
                let _ = writeln!(self.out, "    {}", plain_line(line));
            }
            let _ = writeln!(self.out, "    -> {}", record.redirect_uri);
        }
        let _ = self.out.flush();
    }

    fn on_provider_summary(&mut self, summary: &ProviderSummary) {
        match self
            .summaries
            .iter_mut()
            .find(|s| s.provider_id == summary.provider_id)
        {
            Some(existing) => *existing = summary.clone(),
            None => self.summaries.push(summary.clone()),
        }
    }

    fn on_error(&mut self, message: &str) {
        let _ = writeln!(self.err, "warning: {}", message);
        let _ = self.err.flush();
    }

    fn on_closed(&mut self, end: &StreamEnd) {
        let _ = writeln!(self.out);
        let _ = print_summary(&mut self.out, &self.summaries);
        match end {
            StreamEnd::Stopped | StreamEnd::Ended => {}
            StreamEnd::Cancelled => {
                let _ = writeln!(self.err, "search cancelled");
            }
            StreamEnd::Failed(e) => {
                let _ = writeln!(self.err, "error: {}", e);
            }
        }
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}

/// Machine-readable output: one JSON object per line.
pub struct JsonRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, value: serde_json::Value) {
        if let Ok(line) = serde_json::to_string(&value) {
            let _ = writeln!(self.out, "{}", line);
            let _ = self.out.flush();
        }
    }
}

impl<W: Write + Send> Renderer for JsonRenderer<W> {
    fn on_records_appended(&mut self, records: &[DisplayRecord]) {
        for record in records {
            self.emit(serde_json::json!({
                "event": "record",
                "record": record,
            }));
        }
    }

    fn on_provider_summary(&mut self, summary: &ProviderSummary) {
        self.emit(serde_json::json!({
            "event": "provider",
            "summary": summary,
        }));
    }

    fn on_error(&mut self, message: &str) {
        self.emit(serde_json::json!({
            "event": "error",
            "message": message,
        }));
    }

    fn on_closed(&mut self, end: &StreamEnd) {
        let obj = match end {
            StreamEnd::Stopped => serde_json::json!({"event": "closed", "end": "stopped"}),
            StreamEnd::Ended => serde_json::json!({"event": "closed", "end": "ended"}),
            StreamEnd::Cancelled => serde_json::json!({"event": "closed", "end": "cancelled"}),
            StreamEnd::Failed(e) => serde_json::json!({
                "event": "closed",
                "end": "failed",
                "error": e.to_string(),
            }),
        };
        self.emit(obj);
    }
}

/// Output mode for the CLI.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderMode {
    Human,
    Json,
}

impl RenderMode {
    /// Default: human output when stdout is a TTY, otherwise JSON.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stdout) {
            RenderMode::Human
        } else {
            RenderMode::Json
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "human" => Some(RenderMode::Human),
            "json" => Some(RenderMode::Json),
            _ => None,
        }
    }

    /// Renderer writing to the process's stdout/stderr.
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            RenderMode::Human => Box::new(TerminalRenderer::new(
                std::io::stdout(),
                std::io::stderr(),
            )),
            RenderMode::Json => Box::new(JsonRenderer::new(std::io::stdout())),
        }
    }
}

/// Provider table: name, result count, badge style.
pub fn print_summary<W: Write>(out: &mut W, summaries: &[ProviderSummary]) -> std::io::Result<()> {
    if summaries.is_empty() {
        return writeln!(out, "No results.");
    }

    writeln!(out, "{:<24} {:>8}  {:<8}", "PROVIDER", "RESULTS", "STYLE")?;
    let mut total = 0u64;
    for s in summaries {
        writeln!(
            out,
            "{:<24} {:>8}  {:<8}",
            s.presentation_name,
            s.count,
            s.style.as_str()
        )?;
        total += s.count;
    }
    writeln!(out, "{:<24} {:>8}", "total", total)
}

/// Strip the inline markup normalized lines carry for HTML renderers.
fn plain_line(line: &str) -> String {
    line.replace("<br />", "")
        .replace("<small>", "")
        .replace("</small>", "")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flight_stream_core::accumulate::BadgeStyle;
    use flight_stream_core::models::Price;
    use flight_stream_core::stream::StreamError;

    fn record(provider: &str, id: &str) -> DisplayRecord {
        let line = "A3100 - ATH > SKG <small>2024-01-01T08:00:00</small><br />".to_string();
        DisplayRecord {
            provider_id: provider.to_string(),
            result_id: id.to_string(),
            group_id: "g".to_string(),
            lines: vec![line.clone()],
            message: line,
            price: Price {
                total: 99.5,
                currency: "EUR".to_string(),
            },
            redirect_uri: format!("api/v1/redirect?resourceId=j&id={}&provider={}", id, provider),
            provider_presentation_name: "Acme Air".to_string(),
        }
    }

    fn summary(count: u64) -> ProviderSummary {
        ProviderSummary {
            provider_id: "acme".to_string(),
            presentation_name: "Acme Air".to_string(),
            count,
            style: BadgeStyle::ALL[0],
        }
    }

    #[test]
    fn test_plain_line_strips_markup() {
        assert_eq!(
            plain_line("A3100 - ATH > SKG <small>2024-01-01T08:00:00</small><br />"),
            "A3100 - ATH > SKG 2024-01-01T08:00:00"
        );
    }

    #[test]
    fn test_terminal_renderer_writes_records_and_table() {
        let mut r = TerminalRenderer::new(Vec::new(), Vec::new());
        r.on_records_appended(&[record("acme", "1")]);
        r.on_provider_summary(&summary(1));
        r.on_provider_summary(&summary(2));
        r.on_error("skipped result 2");
        r.on_closed(&StreamEnd::Stopped);

        assert_eq!(r.summaries().len(), 1);
        assert_eq!(r.summaries()[0].count, 2);

        let (out, err) = r.into_inner();
        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();
        assert!(out.contains("99.5EUR  Acme Air"));
        assert!(out.contains("    A3100 - ATH > SKG 2024-01-01T08:00:00\n"));
        assert!(out.contains("provider=acme"));
        assert!(out.contains("PROVIDER"));
        assert!(out.lines().any(|l| l.starts_with("Acme Air") && l.contains(" 2 ")));
        assert_eq!(err, "warning: skipped result 2\n");
    }

    #[test]
    fn test_terminal_renderer_reports_failure() {
        let mut r = TerminalRenderer::new(Vec::new(), Vec::new());
        r.on_closed(&StreamEnd::Failed(StreamError::Transport("connection reset".to_string())));
        let (out, err) = r.into_inner();
        assert!(String::from_utf8(out).unwrap().contains("No results."));
        assert!(String::from_utf8(err).unwrap().starts_with("error: "));
    }

    #[test]
    fn test_json_renderer_emits_one_object_per_line() {
        let mut r = JsonRenderer::new(Vec::new());
        r.on_records_appended(&[record("acme", "1"), record("acme", "2")]);
        r.on_provider_summary(&summary(2));
        r.on_error("bad frame");
        r.on_closed(&StreamEnd::Stopped);

        let out = String::from_utf8(r.into_inner()).unwrap();
        let events: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0]["event"], "record");
        assert_eq!(events[0]["record"]["resultId"], "1");
        assert_eq!(events[1]["record"]["price"]["currency"], "EUR");
        assert_eq!(events[2]["event"], "provider");
        assert_eq!(events[2]["summary"]["count"], 2);
        assert_eq!(events[3]["message"], "bad frame");
        assert_eq!(events[4]["end"], "stopped");
    }

    #[test]
    fn test_render_mode_parse() {
        assert_eq!(RenderMode::parse("human"), Some(RenderMode::Human));
        assert_eq!(RenderMode::parse("json"), Some(RenderMode::Json));
        assert_eq!(RenderMode::parse("xml"), None);
    }
}
