use super::OutputWriter;
use crate::core::AnalysisResult;
use crate::session::{Action, Session};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ActionReport<'a> {
    action: Action,
    #[serde(flatten)]
    result: &'a AnalysisResult,
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_session(&mut self, session: &Session) -> anyhow::Result<()> {
        self.write_json(session)
    }

    fn write_action(&mut self, action: Action, result: &AnalysisResult) -> anyhow::Result<()> {
        self.write_json(&ActionReport { action, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LintReport, SourceText};
    use serde_json::Value;

    #[test]
    fn test_action_report_is_tagged() {
        let mut out = Vec::new();
        let result = AnalysisResult::Lint(LintReport {
            text: "C0114: missing-module-docstring".into(),
        });
        JsonWriter::new(&mut out)
            .write_action(Action::Lint, &result)
            .unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["action"], "lint");
        assert_eq!(value["result"], "lint");
        assert_eq!(value["text"], "C0114: missing-module-docstring");
    }

    #[test]
    fn test_session_round_trips() {
        let mut session = Session::new();
        session.receive(SourceText::uploaded("a.py", "x = 1\n"));
        let mut out = Vec::new();
        JsonWriter::new(&mut out).write_session(&session).unwrap();

        let restored: Session = serde_json::from_slice(&out).unwrap();
        assert_eq!(restored, session);
    }
}
