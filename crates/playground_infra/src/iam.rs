use serde_json::{json, Value};

use crate::template::{partition_arn, reference, Resource};

const POLICY_VERSION: &str = "2012-10-17";
const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";
const BASIC_EXECUTION_POLICY: &str = ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resource: Value,
}

impl PolicyStatement {
    pub fn allow(actions: &[&str], resource: Value) -> Self {
        Self {
            actions: actions.iter().map(|action| action.to_string()).collect(),
            resource,
        }
    }

    fn render(&self) -> Value {
        let action = match self.actions.as_slice() {
            [single] => json!(single),
            many => json!(many),
        };
        json!({
            "Action": action,
            "Effect": "Allow",
            "Resource": self.resource,
        })
    }
}

/// Execution role assumed by a Lambda function, with CloudWatch Logs access.
pub fn lambda_service_role() -> Resource {
    Resource::new(
        "AWS::IAM::Role",
        json!({
            "AssumeRolePolicyDocument": {
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": LAMBDA_SERVICE_PRINCIPAL },
                }],
                "Version": POLICY_VERSION,
            },
            "ManagedPolicyArns": [partition_arn(BASIC_EXECUTION_POLICY)],
        }),
    )
}

/// Inline policy attached to `role_logical_id`.
pub fn role_policy(
    policy_name: &str,
    role_logical_id: &str,
    statements: &[PolicyStatement],
) -> Resource {
    let statements: Vec<Value> = statements.iter().map(PolicyStatement::render).collect();
    Resource::new(
        "AWS::IAM::Policy",
        json!({
            "PolicyDocument": {
                "Statement": statements,
                "Version": POLICY_VERSION,
            },
            "PolicyName": policy_name,
            "Roles": [reference(role_logical_id)],
        }),
    )
}
