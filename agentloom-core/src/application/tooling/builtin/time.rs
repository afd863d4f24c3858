use crate::application::tooling::{ParamType, ToolDescriptor, ToolExecutionError, ToolHandler};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::Value;

pub const NAME: &str = "get_time";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(NAME, "Get the current date and time.").with_optional(
        "kind",
        ParamType::String,
        "The type of information to retrieve: 'date', 'time', or 'both'.",
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Date,
    Time,
    Both,
}

impl TimeKind {
    /// Unrecognised or missing values fall back to `Both`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref() {
            Some("date") => TimeKind::Date,
            Some("time") => TimeKind::Time,
            _ => TimeKind::Both,
        }
    }
}

pub fn describe(kind: TimeKind, now: NaiveDateTime) -> String {
    let date = now.format("%d/%m/%Y");
    let time = now.format("%H:%M:%S");
    match kind {
        TimeKind::Date => format!("Current date: {date}"),
        TimeKind::Time => format!("Current time: {time}"),
        TimeKind::Both => format!("Current date: {date}, Current time: {time}"),
    }
}

#[derive(Debug)]
pub struct TimeTool {
    descriptor: ToolDescriptor,
}

impl TimeTool {
    pub fn new() -> Self {
        Self {
            descriptor: descriptor(),
        }
    }
}

impl Default for TimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolHandler for TimeTool {
    async fn call(&self, input: Value) -> Result<String, ToolExecutionError> {
        let args = self.descriptor.validate(&input)?;
        let kind = TimeKind::parse(args.get("kind").and_then(Value::as_str));
        Ok(describe(kind, Local::now().naive_local()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|date| date.and_hms_opt(9, 5, 1))
            .expect("valid timestamp")
    }

    #[test]
    fn formats_each_kind() {
        assert_eq!(describe(TimeKind::Date, fixed()), "Current date: 07/03/2024");
        assert_eq!(describe(TimeKind::Time, fixed()), "Current time: 09:05:01");
        assert_eq!(
            describe(TimeKind::Both, fixed()),
            "Current date: 07/03/2024, Current time: 09:05:01"
        );
    }

    #[test]
    fn unknown_kind_means_both() {
        assert_eq!(TimeKind::parse(Some("weekday")), TimeKind::Both);
        assert_eq!(TimeKind::parse(None), TimeKind::Both);
        assert_eq!(TimeKind::parse(Some(" DATE ")), TimeKind::Date);
    }
}
