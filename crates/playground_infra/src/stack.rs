use std::collections::BTreeSet;
use std::path::Path;

use playground_core::record::{
    INDEX_NAME, INDEX_PARTITION_KEY, INDEX_SORT_KEY, PARTITION_KEY, SORT_KEY, TABLE_ID,
};
use playground_core::ChangeKind;

use crate::asset::ResolvedAsset;
use crate::environment::Environment;
use crate::error::{StackError, ValidationProblem};
use crate::event_source::StreamEventSource;
use crate::function::FunctionDefinition;
use crate::iam::{lambda_service_role, role_policy};
use crate::logical_id::LogicalIds;
use crate::table::{
    GlobalSecondaryIndex, KeyAttribute, RemovalPolicy, StreamViewType, TableDefinition,
};
use crate::template::Template;

pub const DEV_STACK_NAME: &str = "dynamodb-playground-dev";
const MAX_STACK_NAME_LEN: usize = 128;
const EVENT_SOURCE_ID: &str = "DynamoDBEventSource";

/// A function attached to the table's stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSubscription {
    pub function: FunctionDefinition,
    pub source: StreamEventSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaygroundStack {
    name: String,
    environment: Environment,
    table: TableDefinition,
    subscriptions: Vec<StreamSubscription>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStack {
    pub stack_name: String,
    pub environment: Environment,
    pub template: Template,
    pub assets: Vec<ResolvedAsset>,
}

impl PlaygroundStack {
    /// The people table with its change stream and one subscribed function
    /// per change kind, each filtered server-side to that kind.
    pub fn new(name: impl Into<String>, environment: Environment) -> Result<Self, StackError> {
        let mut stack = Self::with_table(name, environment, people_table()?);
        for kind in ChangeKind::all() {
            stack.add_stream_function(
                FunctionDefinition::for_change_kind(kind),
                StreamEventSource::for_change_kind(kind),
            );
        }
        Ok(stack)
    }

    pub fn with_table(
        name: impl Into<String>,
        environment: Environment,
        table: TableDefinition,
    ) -> Self {
        Self {
            name: name.into(),
            environment,
            table,
            subscriptions: Vec::new(),
        }
    }

    pub fn add_stream_function(
        &mut self,
        function: FunctionDefinition,
        source: StreamEventSource,
    ) -> &mut Self {
        self.subscriptions
            .push(StreamSubscription { function, source });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn table(&self) -> &TableDefinition {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableDefinition {
        &mut self.table
    }

    pub fn subscriptions(&self) -> &[StreamSubscription] {
        &self.subscriptions
    }

    /// Collects every configuration problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), StackError> {
        let mut problems = Vec::new();

        if !is_valid_stack_name(&self.name) {
            problems.push(ValidationProblem::new(
                &self.name,
                format!(
                    "stack name must start with a letter, contain only letters, digits and hyphens, and be at most {MAX_STACK_NAME_LEN} characters"
                ),
            ));
        }

        problems.extend(self.table.validate());

        let mut function_ids = BTreeSet::new();
        for subscription in &self.subscriptions {
            let function = &subscription.function;
            if !function_ids.insert(function.id.as_str()) {
                problems.push(ValidationProblem::new(
                    &function.id,
                    "function id is used more than once",
                ));
            }
            problems.extend(function.validate());
            problems.extend(subscription.source.validate(
                &format!("{}/{EVENT_SOURCE_ID}", function.id),
                self.table.stream.is_some(),
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(StackError::Validation(problems))
        }
    }

    pub fn synthesize(&self) -> Result<SynthesizedStack, StackError> {
        self.synthesize_with_assets(None)
    }

    /// Validates and renders the template. Code assets are hashed from
    /// `asset_dir` when their zips have been packaged there.
    pub fn synthesize_with_assets(
        &self,
        asset_dir: Option<&Path>,
    ) -> Result<SynthesizedStack, StackError> {
        self.validate()?;

        let mut ids = LogicalIds::default();
        let mut template = Template::bootstrapped();
        let mut assets: Vec<ResolvedAsset> = Vec::new();

        let table_id = ids.allocate(&[self.table.id.as_str(), "Resource"])?;
        template.add_resource(&table_id, self.table.render());

        for subscription in &self.subscriptions {
            let construct = subscription.function.id.as_str();
            let role_id = ids.allocate(&[construct, "ServiceRole", "Resource"])?;
            let policy_id =
                ids.allocate(&[construct, "ServiceRole", "DefaultPolicy", "Resource"])?;
            let function_id = ids.allocate(&[construct, "Resource"])?;
            let mapping_id = ids.allocate(&[
                construct,
                EVENT_SOURCE_ID,
                self.table.id.as_str(),
                "Resource",
            ])?;

            let asset = subscription.function.code.resolve(asset_dir)?;

            template.add_resource(&role_id, lambda_service_role());
            template.add_resource(
                &policy_id,
                role_policy(
                    &policy_id,
                    &role_id,
                    &StreamEventSource::read_statements(&table_id),
                ),
            );
            template.add_resource(
                &function_id,
                subscription
                    .function
                    .render(&role_id, &asset)
                    .depends_on(&policy_id),
            );
            template.add_resource(
                &mapping_id,
                subscription
                    .source
                    .render(&function_id, &table_id, &policy_id)?,
            );

            tracing::debug!(
                stack = %self.name,
                function = construct,
                logical_id = %function_id,
                asset_hash = %asset.hash,
                "rendered stream subscription"
            );

            if !assets.iter().any(|known| known.hash == asset.hash) {
                assets.push(asset);
            }
        }

        Ok(SynthesizedStack {
            stack_name: self.name.clone(),
            environment: self.environment.clone(),
            template,
            assets,
        })
    }
}

/// Table keyed by `id`/`cpf`, with a `cpf`/`nome` index and a stream of
/// both record images. Removed together with the stack.
pub fn people_table() -> Result<TableDefinition, StackError> {
    let mut table = TableDefinition::new(
        TABLE_ID,
        KeyAttribute::string(PARTITION_KEY),
        Some(KeyAttribute::string(SORT_KEY)),
    );
    table.stream = Some(StreamViewType::NewAndOldImages);
    table.removal_policy = RemovalPolicy::Destroy;
    table.add_global_secondary_index(GlobalSecondaryIndex::new(
        INDEX_NAME,
        KeyAttribute::string(INDEX_PARTITION_KEY),
        Some(KeyAttribute::string(INDEX_SORT_KEY)),
    ))?;
    Ok(table)
}

fn is_valid_stack_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_with_letter = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic());
    starts_with_letter
        && name.len() <= MAX_STACK_NAME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}
