use std::collections::BTreeSet;

use playground_core::ChangeKind;
use playground_infra::event_source::FilterCriteria;
use playground_infra::template::Template;
use playground_infra::{Environment, PlaygroundStack, DEV_STACK_NAME};
use serde_json::{json, Value};

fn synthesized_template() -> Template {
    PlaygroundStack::new(DEV_STACK_NAME, Environment::default())
        .expect("stack should build")
        .synthesize()
        .expect("stack should synthesize")
        .template
}

#[test]
fn declares_one_table_with_key_schema_and_single_index() {
    let template = synthesized_template();
    let tables: Vec<_> = template.resources_of_type("AWS::DynamoDB::Table").collect();
    assert_eq!(tables.len(), 1);

    let (_, table) = tables[0];
    assert_eq!(
        table.properties["KeySchema"],
        json!([
            {"AttributeName": "id", "KeyType": "HASH"},
            {"AttributeName": "cpf", "KeyType": "RANGE"}
        ])
    );
    assert_eq!(table.properties["BillingMode"], "PAY_PER_REQUEST");
    assert_eq!(
        table.properties["StreamSpecification"]["StreamViewType"],
        "NEW_AND_OLD_IMAGES"
    );
    assert_eq!(table.deletion_policy.as_deref(), Some("Delete"));

    let indexes = table.properties["GlobalSecondaryIndexes"]
        .as_array()
        .expect("indexes should be an array");
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0]["IndexName"], "secundary");
    assert_eq!(
        indexes[0]["KeySchema"],
        json!([
            {"AttributeName": "cpf", "KeyType": "HASH"},
            {"AttributeName": "nome", "KeyType": "RANGE"}
        ])
    );
}

#[test]
fn three_functions_share_the_stream_with_distinct_single_kind_filters() {
    let template = synthesized_template();
    let (table_id, _) = template
        .resources_of_type("AWS::DynamoDB::Table")
        .next()
        .expect("table should exist");
    let stream_arn = json!({"Fn::GetAtt": [table_id, "StreamArn"]});

    let functions: BTreeSet<&String> = template
        .resources_of_type("AWS::Lambda::Function")
        .map(|(id, _)| id)
        .collect();
    assert_eq!(functions.len(), 3);

    let mut seen_kinds = BTreeSet::new();
    let mut targeted_functions = BTreeSet::new();
    for (_, mapping) in template.resources_of_type("AWS::Lambda::EventSourceMapping") {
        assert_eq!(mapping.properties["EventSourceArn"], stream_arn);
        assert_eq!(mapping.properties["StartingPosition"], "TRIM_HORIZON");

        let filters = mapping.properties["FilterCriteria"]["Filters"]
            .as_array()
            .expect("filters should be an array");
        assert_eq!(filters.len(), 1);
        let pattern: Value = serde_json::from_str(
            filters[0]["Pattern"]
                .as_str()
                .expect("pattern should be a string"),
        )
        .expect("pattern should be JSON");
        let kinds = FilterCriteria::new(pattern).event_names();
        assert_eq!(kinds.len(), 1);
        assert!(seen_kinds.insert(kinds[0]), "filter kind repeated");

        let function_ref = mapping.properties["FunctionName"]["Ref"]
            .as_str()
            .expect("function name should be a Ref")
            .to_string();
        targeted_functions.insert(function_ref);
    }

    assert_eq!(seen_kinds, BTreeSet::from(ChangeKind::all()));
    assert_eq!(
        targeted_functions.iter().collect::<BTreeSet<_>>(),
        functions
    );
}

#[test]
fn every_function_role_can_read_the_stream() {
    let template = synthesized_template();
    let policies: Vec<_> = template.resources_of_type("AWS::IAM::Policy").collect();
    assert_eq!(policies.len(), 3);

    for (_, policy) in policies {
        let statements = &policy.properties["PolicyDocument"]["Statement"];
        assert_eq!(statements[0]["Action"], "dynamodb:ListStreams");
        assert_eq!(
            statements[1]["Action"],
            json!([
                "dynamodb:DescribeStream",
                "dynamodb:GetRecords",
                "dynamodb:GetShardIterator"
            ])
        );
    }
}

#[test]
fn template_round_trips_through_json() {
    let template = synthesized_template();
    let text = template.to_json_pretty().expect("template should serialize");
    let parsed: Template = serde_json::from_str(&text).expect("template should parse");

    assert_eq!(parsed, template);
    assert!(text.contains("\"CheckBootstrapVersion\""));
}
