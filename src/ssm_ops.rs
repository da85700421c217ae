use std::fmt;

use chrono::{SecondsFormat, TimeZone, Utc};
use rusoto_core::{Region, RusotoError};
use rusoto_ssm::{
    DescribeParametersRequest, GetParametersRequest, Parameter, ParameterInlinePolicy,
    ParameterMetadata, Ssm, SsmClient,
};
use tracing::{debug, warn};

use crate::errors::{ResolveError, ServiceContext};
use crate::retry::RetryPolicy;
use crate::ssm_parameters::{
    SSMParameter, SSMParameterPolicy, SSMParametersPage, SSMParametersResult,
};

/// GetParameters accepts at most this many names per call.
pub const MAX_NAMES_PER_CALL: usize = 10;

const RETRIABLE_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "Unavailable",
    "ServiceUnavailable",
    "InternalFailure",
    "InternalError",
];

const RETRIABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// The two read calls the resolver needs from a parameter store.
pub trait ParameterCatalog {
    /// Fetches the named parameters, values included. At most
    /// `MAX_NAMES_PER_CALL` names.
    fn get_parameters(
        &self,
        names: &[String],
        with_decryption: bool,
    ) -> Result<SSMParametersResult, ResolveError>;

    /// One listing page. Values are never part of a listing.
    fn describe_parameters(
        &self,
        next_token: Option<String>,
        page_size: Option<i64>,
    ) -> Result<SSMParametersPage, ResolveError>;
}

pub struct SSMOps {
    region: String,
    ssm_client: SsmClient,
    retry: RetryPolicy,
}

impl fmt::Debug for SSMOps {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ region: {}, retry: {:?} }}", self.region, self.retry)
    }
}

impl SSMOps {
    pub fn new(region: &str, retry: RetryPolicy) -> Self {
        let parsed = region.parse::<Region>().unwrap_or_else(|_| {
            warn!(region = %region, "unknown region, falling back to the default chain");
            Region::default()
        });
        SSMOps::with_client(region, SsmClient::new(parsed), retry)
    }

    pub fn with_client(region: &str, ssm_client: SsmClient, retry: RetryPolicy) -> Self {
        SSMOps {
            region: region.to_string(),
            ssm_client,
            retry,
        }
    }
}

impl ParameterCatalog for SSMOps {
    fn get_parameters(
        &self,
        names: &[String],
        with_decryption: bool,
    ) -> Result<SSMParametersResult, ResolveError> {
        debug!(region = %self.region, names = ?names, "GetParameters");
        let output = self
            .retry
            .run(
                "GetParameters",
                || {
                    let input = GetParametersRequest {
                        names: names.to_vec(),
                        with_decryption: Some(with_decryption),
                    };
                    self.ssm_client.get_parameters(input).sync()
                },
                |err| is_retriable(err),
            )
            .map_err(|err| {
                ResolveError::service("GetParameters", ServiceContext::Names(names.to_vec()), err)
            })?;

        Ok(SSMParametersResult {
            parameters: output
                .parameters
                .unwrap_or_default()
                .into_iter()
                .map(parameter_from)
                .collect(),
            invalid_parameters: output.invalid_parameters.unwrap_or_default(),
        })
    }

    fn describe_parameters(
        &self,
        next_token: Option<String>,
        page_size: Option<i64>,
    ) -> Result<SSMParametersPage, ResolveError> {
        debug!(region = %self.region, next_token = ?next_token, "DescribeParameters");
        let output = self
            .retry
            .run(
                "DescribeParameters",
                || {
                    let input = DescribeParametersRequest {
                        next_token: next_token.clone(),
                        max_results: page_size,
                        ..Default::default()
                    };
                    self.ssm_client.describe_parameters(input).sync()
                },
                |err| is_retriable(err),
            )
            .map_err(|err| {
                ResolveError::service("DescribeParameters", ServiceContext::Page(next_token.clone()), err)
            })?;

        Ok(SSMParametersPage {
            parameters: output
                .parameters
                .unwrap_or_default()
                .into_iter()
                .map(metadata_from)
                .collect(),
            next_token: output.next_token.filter(|t| !t.is_empty()),
        })
    }
}

/// Dispatch failures, throttling and transient server faults are worth another try.
fn is_retriable<E>(err: &RusotoError<E>) -> bool {
    match err {
        RusotoError::HttpDispatch(_) => true,
        RusotoError::Unknown(response) => {
            let body = String::from_utf8_lossy(&response.body);
            RETRIABLE_STATUSES.contains(&response.status.as_u16())
                || RETRIABLE_CODES.iter().any(|code| body.contains(code))
        }
        _ => false,
    }
}

fn parameter_from(p: Parameter) -> SSMParameter {
    SSMParameter {
        name: p.name.unwrap_or_default(),
        p_type: p.type_,
        value: p.value,
        version: p.version,
        arn: p.arn,
        last_modified_date: p.last_modified_date.and_then(format_timestamp),
        ..Default::default()
    }
}

fn metadata_from(m: ParameterMetadata) -> SSMParameter {
    SSMParameter {
        name: m.name.unwrap_or_default(),
        p_type: m.type_,
        value: None,
        version: m.version,
        arn: None,
        last_modified_date: m.last_modified_date.and_then(format_timestamp),
        last_modified_user: m.last_modified_user,
        description: m.description,
        key_id: m.key_id,
        allowed_pattern: m.allowed_pattern,
        tier: m.tier,
        policies: m
            .policies
            .map(|policies| policies.into_iter().map(policy_from).collect()),
        tags: None,
    }
}

fn policy_from(p: ParameterInlinePolicy) -> SSMParameterPolicy {
    SSMParameterPolicy {
        policy_text: p.policy_text,
        policy_type: p.policy_type,
        policy_status: p.policy_status,
    }
}

// The store reports fractional epoch seconds.
fn format_timestamp(epoch: f64) -> Option<String> {
    let millis = (epoch * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}
