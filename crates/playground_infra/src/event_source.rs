use playground_core::ChangeKind;
use serde_json::{json, Value};

use crate::error::{StackError, ValidationProblem};
use crate::iam::PolicyStatement;
use crate::template::{get_att, reference, Resource};

pub const DEFAULT_BATCH_SIZE: u32 = 100;
pub const MAX_BATCH_SIZE: u32 = 10_000;

const STREAM_READ_ACTIONS: [&str; 3] = [
    "dynamodb:DescribeStream",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartingPosition {
    TrimHorizon,
    Latest,
}

impl StartingPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrimHorizon => "TRIM_HORIZON",
            Self::Latest => "LATEST",
        }
    }
}

/// One server-side filter pattern, evaluated before the function is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pattern: Value,
}

impl FilterCriteria {
    pub fn new(pattern: Value) -> Self {
        Self { pattern }
    }

    /// Matches only records whose `eventName` is `kind`.
    pub fn event_name_equals(kind: ChangeKind) -> Self {
        Self::new(json!({ "eventName": [kind.as_str()] }))
    }

    /// Compact JSON text, the form the mapping expects.
    pub fn render(&self) -> Result<String, StackError> {
        serde_json::to_string(&self.pattern).map_err(|source| StackError::Serialize {
            artifact: "event filter pattern",
            source,
        })
    }

    /// Change kinds this filter lets through, when it filters on `eventName`.
    pub fn event_names(&self) -> Vec<ChangeKind> {
        self.pattern
            .get("eventName")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|name| name.parse().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEventSource {
    pub starting_position: StartingPosition,
    pub batch_size: u32,
    pub filters: Vec<FilterCriteria>,
    pub report_batch_item_failures: bool,
    pub enabled: bool,
}

impl StreamEventSource {
    pub fn new(starting_position: StartingPosition) -> Self {
        Self {
            starting_position,
            batch_size: DEFAULT_BATCH_SIZE,
            filters: Vec::new(),
            report_batch_item_failures: false,
            enabled: true,
        }
    }

    /// Stream source delivering only `kind` records, oldest first, with
    /// per-record failure reporting.
    pub fn for_change_kind(kind: ChangeKind) -> Self {
        let mut source = Self::new(StartingPosition::TrimHorizon)
            .with_filter(FilterCriteria::event_name_equals(kind));
        source.report_batch_item_failures = true;
        source
    }

    pub fn with_filter(mut self, filter: FilterCriteria) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn validate(&self, path: &str, table_has_stream: bool) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();
        if !table_has_stream {
            problems.push(ValidationProblem::new(
                path,
                "DynamoDB Streams must be enabled on the table to attach a stream event source",
            ));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            problems.push(ValidationProblem::new(
                path,
                format!(
                    "batch size {} is outside 1..={MAX_BATCH_SIZE}",
                    self.batch_size
                ),
            ));
        }
        if self
            .filters
            .iter()
            .any(|filter| {
                filter
                    .pattern
                    .as_object()
                    .map_or(true, |fields| fields.is_empty())
            })
        {
            problems.push(ValidationProblem::new(
                path,
                "filter patterns must be non-empty JSON objects",
            ));
        }
        problems
    }

    /// Statements the consuming function's role needs to read the stream.
    pub fn read_statements(table_logical_id: &str) -> Vec<PolicyStatement> {
        vec![
            PolicyStatement::allow(&["dynamodb:ListStreams"], json!("*")),
            PolicyStatement::allow(
                &STREAM_READ_ACTIONS,
                get_att(table_logical_id, "StreamArn"),
            ),
        ]
    }

    /// Renders the `AWS::Lambda::EventSourceMapping` resource. The mapping
    /// waits for `policy_logical_id` so the role can read the stream first.
    pub fn render(
        &self,
        function_logical_id: &str,
        table_logical_id: &str,
        policy_logical_id: &str,
    ) -> Result<Resource, StackError> {
        let mut properties = json!({
            "FunctionName": reference(function_logical_id),
            "EventSourceArn": get_att(table_logical_id, "StreamArn"),
            "StartingPosition": self.starting_position.as_str(),
            "BatchSize": self.batch_size,
        });

        if !self.filters.is_empty() {
            let filters = self
                .filters
                .iter()
                .map(|filter| filter.render().map(|pattern| json!({ "Pattern": pattern })))
                .collect::<Result<Vec<_>, _>>()?;
            properties["FilterCriteria"] = json!({ "Filters": filters });
        }
        if self.report_batch_item_failures {
            properties["FunctionResponseTypes"] = json!(["ReportBatchItemFailures"]);
        }
        if !self.enabled {
            properties["Enabled"] = json!(false);
        }

        Ok(Resource::new("AWS::Lambda::EventSourceMapping", properties)
            .depends_on(policy_logical_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_filter_renders_compact_pattern() {
        let filter = FilterCriteria::event_name_equals(ChangeKind::Remove);

        assert_eq!(
            filter.render().expect("pattern should render"),
            r#"{"eventName":["REMOVE"]}"#
        );
        assert_eq!(filter.event_names(), vec![ChangeKind::Remove]);
    }

    #[test]
    fn change_kind_source_renders_mapping() {
        let source = StreamEventSource::for_change_kind(ChangeKind::Insert);
        let resource = source
            .render("InsertFn", "Table", "InsertPolicy")
            .expect("mapping should render");

        assert_eq!(resource.depends_on, vec!["InsertPolicy".to_string()]);
        assert_eq!(
            resource.properties,
            json!({
                "FunctionName": {"Ref": "InsertFn"},
                "EventSourceArn": {"Fn::GetAtt": ["Table", "StreamArn"]},
                "StartingPosition": "TRIM_HORIZON",
                "BatchSize": 100,
                "FilterCriteria": {"Filters": [{"Pattern": "{\"eventName\":[\"INSERT\"]}"}]},
                "FunctionResponseTypes": ["ReportBatchItemFailures"]
            })
        );
    }

    #[test]
    fn requires_stream_on_table() {
        let source = StreamEventSource::new(StartingPosition::Latest);
        let problems = source.validate("fn/source", false);

        assert_eq!(problems.len(), 1);
        assert!(problems[0].message().contains("Streams must be enabled"));
    }

    #[test]
    fn rejects_empty_filter_and_zero_batch() {
        let mut source =
            StreamEventSource::new(StartingPosition::Latest).with_filter(FilterCriteria::new(json!({})));
        source.batch_size = 0;

        assert_eq!(source.validate("fn/source", true).len(), 2);
    }

    #[test]
    fn flags_batch_size_above_limit() {
        let mut source = StreamEventSource::new(StartingPosition::TrimHorizon);
        source.batch_size = 10_000;
        assert!(source.validate("fn/source", true).is_empty());

        source.batch_size = 10_001;
        let problems = source.validate("fn/source", true);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].message(), "batch size 10001 is outside 1..=10000");
    }

    #[test]
    fn disabled_mapping_renders_enabled_flag() {
        let mut source = StreamEventSource::new(StartingPosition::Latest);
        source.enabled = false;
        let resource = source.render("Fn", "Table", "Policy").expect("mapping should render");

        assert_eq!(resource.properties["Enabled"], json!(false));
        assert!(resource.property("FilterCriteria").is_none());
    }
}
