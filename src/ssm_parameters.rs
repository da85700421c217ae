use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::errors::ResolveError;

/// Largest listing page the service accepts for DescribeParameters.
pub const MAX_PAGE_SIZE: i64 = 50;

/// One stored parameter, shaped the way Parameter Store reports it.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SSMParameter {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub p_type: Option<String>,
    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(rename = "ARN", skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(rename = "LastModifiedDate", skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
    #[serde(rename = "LastModifiedUser", skip_serializing_if = "Option::is_none")]
    pub last_modified_user: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "KeyId", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    #[serde(rename = "AllowedPattern", skip_serializing_if = "Option::is_none")]
    pub allowed_pattern: Option<String>,
    #[serde(rename = "Tier", skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(rename = "Policies", skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<SSMParameterPolicy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

/// A policy attached to a parameter (expiration, notification...).
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SSMParameterPolicy {
    #[serde(rename = "PolicyText", skip_serializing_if = "Option::is_none")]
    pub policy_text: Option<String>,
    #[serde(rename = "PolicyType", skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(rename = "PolicyStatus", skip_serializing_if = "Option::is_none")]
    pub policy_status: Option<String>,
}

impl SSMParameter {
    /// Drops the value unless the caller asked for it.
    pub fn keep_value(mut self, return_values: bool) -> Self {
        if !return_values {
            self.value = None;
        }
        self
    }

    /// Folds a freshly fetched copy of this parameter into a listing record.
    pub fn merge_fetched(&mut self, fetched: SSMParameter) {
        self.value = fetched.value;
        if self.arn.is_none() {
            self.arn = fetched.arn;
        }
        if self.p_type.is_none() {
            self.p_type = fetched.p_type;
        }
    }
}

#[derive(Debug, Default)]
pub struct SSMParametersResult {
    pub parameters: Vec<SSMParameter>,
    pub invalid_parameters: Vec<String>,
}

/// One page of a catalog listing. Listings never carry values.
#[derive(Debug, Default)]
pub struct SSMParametersPage {
    pub parameters: Vec<SSMParameter>,
    pub next_token: Option<String>,
}

/// Raw options as a caller hands them over, either from flags or an args file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RequestArgs {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub return_values: Option<bool>,
}

impl RequestArgs {
    pub fn from_json_file(path: &Path) -> Result<Self, ResolveError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ResolveError::config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| ResolveError::config(format!("cannot parse {}: {}", path.display(), e)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestMode {
    Single(String),
    Batch(Vec<String>),
    Catalog,
}

/// A validated, immutable lookup request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub mode: RequestMode,
    pub return_values: bool,
    pub with_decryption: bool,
    pub page_size: Option<i64>,
}

impl ResolveRequest {
    /// Empty `name` and empty `names` count as not given.
    pub fn new(args: RequestArgs) -> Result<Self, ResolveError> {
        let name = args.name.filter(|n| !n.is_empty());
        let names = args.names.filter(|n| !n.is_empty());

        let mode = match (name, names) {
            (Some(_), Some(_)) => {
                return Err(ResolveError::config("name and names are mutually exclusive"));
            }
            (Some(name), None) => RequestMode::Single(name),
            (None, Some(names)) => {
                if names.iter().any(|n| n.is_empty()) {
                    return Err(ResolveError::config("names must not contain empty entries"));
                }
                RequestMode::Batch(names)
            }
            (None, None) => RequestMode::Catalog,
        };

        Ok(ResolveRequest {
            mode,
            return_values: args.return_values.unwrap_or(false),
            with_decryption: false,
            page_size: None,
        })
    }

    pub fn with_decryption(mut self, decrypt: bool) -> Self {
        self.with_decryption = decrypt;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<i64>) -> Result<Self, ResolveError> {
        if let Some(size) = page_size {
            if size < 1 || size > MAX_PAGE_SIZE {
                return Err(ResolveError::config(format!(
                    "page size must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, size
                )));
            }
        }
        self.page_size = page_size;
        Ok(self)
    }
}
