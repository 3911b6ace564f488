pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

const UNKNOWN_ACCOUNT: &str = "unknown-account";
const UNKNOWN_REGION: &str = "unknown-region";

/// Deployment target of a stack. Unset parts make the stack
/// environment-agnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Environment {
    pub fn new(account: Option<String>, region: Option<String>) -> Self {
        Self {
            account: non_blank(account),
            region: non_blank(region),
        }
    }

    /// Reads the account and region the deployment CLI exports.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(lookup(ACCOUNT_ENV), lookup(REGION_ENV))
    }

    /// Explicit values win over the ones already resolved.
    pub fn with_overrides(self, account: Option<String>, region: Option<String>) -> Self {
        Self {
            account: non_blank(account).or(self.account),
            region: non_blank(region).or(self.region),
        }
    }

    pub fn is_agnostic(&self) -> bool {
        self.account.is_none() || self.region.is_none()
    }

    pub fn assembly_uri(&self) -> String {
        format!(
            "aws://{}/{}",
            self.account.as_deref().unwrap_or(UNKNOWN_ACCOUNT),
            self.region.as_deref().unwrap_or(UNKNOWN_REGION),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
