use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{StackError, ValidationProblem};
use crate::template::Resource;

pub const MAX_GLOBAL_SECONDARY_INDEXES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::String,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::Number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
    Provisioned {
        read_capacity: u32,
        write_capacity: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamViewType {
    KeysOnly,
    NewImage,
    OldImage,
    NewAndOldImages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    Destroy,
    Retain,
    Snapshot,
}

impl RemovalPolicy {
    fn policy_name(self) -> &'static str {
        match self {
            Self::Destroy => "Delete",
            Self::Retain => "Retain",
            Self::Snapshot => "Snapshot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    KeysOnly,
    Include(Vec<String>),
}

impl Projection {
    fn render(&self) -> Value {
        match self {
            Self::All => json!({ "ProjectionType": "ALL" }),
            Self::KeysOnly => json!({ "ProjectionType": "KEYS_ONLY" }),
            Self::Include(attributes) => json!({
                "ProjectionType": "INCLUDE",
                "NonKeyAttributes": attributes,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSecondaryIndex {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub projection: Projection,
}

impl GlobalSecondaryIndex {
    pub fn new(
        name: impl Into<String>,
        partition_key: KeyAttribute,
        sort_key: Option<KeyAttribute>,
    ) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key,
            projection: Projection::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub id: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub billing_mode: BillingMode,
    pub stream: Option<StreamViewType>,
    pub removal_policy: RemovalPolicy,
    indexes: Vec<GlobalSecondaryIndex>,
}

impl TableDefinition {
    /// On-demand table without a stream that is retained on stack deletion.
    pub fn new(
        id: impl Into<String>,
        partition_key: KeyAttribute,
        sort_key: Option<KeyAttribute>,
    ) -> Self {
        Self {
            id: id.into(),
            partition_key,
            sort_key,
            billing_mode: BillingMode::PayPerRequest,
            stream: None,
            removal_policy: RemovalPolicy::Retain,
            indexes: Vec::new(),
        }
    }

    pub fn add_global_secondary_index(
        &mut self,
        index: GlobalSecondaryIndex,
    ) -> Result<(), StackError> {
        if self
            .indexes
            .iter()
            .any(|existing| existing.name == index.name)
        {
            return Err(StackError::DuplicateIndex(index.name));
        }
        self.indexes.push(index);
        Ok(())
    }

    pub fn global_secondary_indexes(&self) -> &[GlobalSecondaryIndex] {
        &self.indexes
    }

    pub fn validate(&self) -> Vec<ValidationProblem> {
        let mut problems = Vec::new();
        let path = self.id.as_str();

        if self.id.trim().is_empty() {
            problems.push(ValidationProblem::new("<table>", "table id cannot be empty"));
        }
        check_key_pair(
            path,
            "table",
            &self.partition_key,
            self.sort_key.as_ref(),
            &mut problems,
        );

        if let BillingMode::Provisioned {
            read_capacity,
            write_capacity,
        } = self.billing_mode
        {
            if read_capacity == 0 || write_capacity == 0 {
                problems.push(ValidationProblem::new(
                    path,
                    "provisioned billing requires positive read and write capacity",
                ));
            }
        }

        if self.indexes.len() > MAX_GLOBAL_SECONDARY_INDEXES {
            problems.push(ValidationProblem::new(
                path,
                format!(
                    "a table supports at most {MAX_GLOBAL_SECONDARY_INDEXES} global secondary indexes, found {}",
                    self.indexes.len()
                ),
            ));
        }

        for index in &self.indexes {
            let index_path = format!("{path}/{}", index.name);
            if index.name.trim().is_empty() {
                problems.push(ValidationProblem::new(
                    &index_path,
                    "index name cannot be empty",
                ));
            }
            check_key_pair(
                &index_path,
                "index",
                &index.partition_key,
                index.sort_key.as_ref(),
                &mut problems,
            );
        }

        let mut declared: BTreeMap<&str, AttributeType> = BTreeMap::new();
        for key in self.key_attributes() {
            match declared.get(key.name.as_str()) {
                Some(existing) if *existing != key.attribute_type => {
                    problems.push(ValidationProblem::new(
                        path,
                        format!(
                            "attribute '{}' is declared with conflicting types",
                            key.name
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    declared.insert(key.name.as_str(), key.attribute_type);
                }
            }
        }

        problems
    }

    /// Renders the `AWS::DynamoDB::Table` resource.
    pub fn render(&self) -> Resource {
        let mut properties = json!({
            "KeySchema": key_schema(&self.partition_key, self.sort_key.as_ref()),
            "AttributeDefinitions": self.attribute_definitions(),
        });

        match self.billing_mode {
            BillingMode::PayPerRequest => {
                properties["BillingMode"] = json!("PAY_PER_REQUEST");
            }
            BillingMode::Provisioned {
                read_capacity,
                write_capacity,
            } => {
                properties["ProvisionedThroughput"] = json!({
                    "ReadCapacityUnits": read_capacity,
                    "WriteCapacityUnits": write_capacity,
                });
            }
        }

        if let Some(view_type) = self.stream {
            properties["StreamSpecification"] = json!({ "StreamViewType": view_type });
        }

        if !self.indexes.is_empty() {
            let indexes: Vec<Value> = self
                .indexes
                .iter()
                .map(|index| self.render_index(index))
                .collect();
            properties["GlobalSecondaryIndexes"] = Value::Array(indexes);
        }

        let policy = self.removal_policy.policy_name().to_string();
        Resource {
            update_replace_policy: Some(policy.clone()),
            deletion_policy: Some(policy),
            ..Resource::new("AWS::DynamoDB::Table", properties)
        }
    }

    fn render_index(&self, index: &GlobalSecondaryIndex) -> Value {
        let mut rendered = json!({
            "IndexName": index.name,
            "KeySchema": key_schema(&index.partition_key, index.sort_key.as_ref()),
            "Projection": index.projection.render(),
        });
        if let BillingMode::Provisioned {
            read_capacity,
            write_capacity,
        } = self.billing_mode
        {
            rendered["ProvisionedThroughput"] = json!({
                "ReadCapacityUnits": read_capacity,
                "WriteCapacityUnits": write_capacity,
            });
        }
        rendered
    }

    fn key_attributes(&self) -> impl Iterator<Item = &KeyAttribute> {
        std::iter::once(&self.partition_key)
            .chain(self.sort_key.as_ref())
            .chain(self.indexes.iter().flat_map(|index| {
                std::iter::once(&index.partition_key).chain(index.sort_key.as_ref())
            }))
    }

    fn attribute_definitions(&self) -> Vec<Value> {
        let mut seen = Vec::<&str>::new();
        let mut definitions = Vec::new();
        for key in self.key_attributes() {
            if seen.contains(&key.name.as_str()) {
                continue;
            }
            seen.push(&key.name);
            definitions.push(json!({
                "AttributeName": key.name,
                "AttributeType": key.attribute_type,
            }));
        }
        definitions
    }
}

fn check_key_pair(
    path: &str,
    what: &str,
    partition_key: &KeyAttribute,
    sort_key: Option<&KeyAttribute>,
    problems: &mut Vec<ValidationProblem>,
) {
    if partition_key.name.trim().is_empty() {
        problems.push(ValidationProblem::new(
            path,
            format!("{what} partition key name cannot be empty"),
        ));
    }
    if let Some(sort_key) = sort_key {
        if sort_key.name.trim().is_empty() {
            problems.push(ValidationProblem::new(
                path,
                format!("{what} sort key name cannot be empty"),
            ));
        } else if sort_key.name == partition_key.name {
            problems.push(ValidationProblem::new(
                path,
                format!(
                    "{what} sort key '{}' must differ from the partition key",
                    sort_key.name
                ),
            ));
        }
    }
}

fn key_schema(partition_key: &KeyAttribute, sort_key: Option<&KeyAttribute>) -> Value {
    let mut schema = vec![json!({
        "AttributeName": partition_key.name,
        "KeyType": "HASH",
    })];
    if let Some(sort_key) = sort_key {
        schema.push(json!({
            "AttributeName": sort_key.name,
            "KeyType": "RANGE",
        }));
    }
    Value::Array(schema)
}
