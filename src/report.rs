use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub level: Level,
    pub message: String,
}

/// Ordered narration of what an operation did.
///
/// The caller owns the report and passes it down as `&mut Report`, so events
/// recorded before an error are still available for rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub events: Vec<Event>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.events.push(Event {
            level: Level::Info,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.events.push(Event {
            level: Level::Warn,
            message: message.into(),
        });
    }

    /// Append every event of a sub-operation's report.
    pub fn merge(&mut self, other: Report) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.events
            .iter()
            .filter(|e| e.level == Level::Warn)
            .map(|e| e.message.as_str())
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.message.as_str())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages().any(|m| m.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_keep_insertion_order() {
        let mut report = Report::new();
        report.info("first");
        report.warn("second");
        report.info("third");
        let messages: Vec<&str> = report.messages().collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[test]
    fn merge_appends_sub_report() {
        let mut report = Report::new();
        report.info("created worktree");
        let mut sub = Report::new();
        sub.warn("shared resource missing");
        report.merge(sub);
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.warnings().collect::<Vec<_>>(), vec!["shared resource missing"]);
    }

    #[test]
    fn serializes_levels_lowercase() {
        let mut report = Report::new();
        report.warn("careful");
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"events":[{"level":"warn","message":"careful"}]}"#);
    }
}
