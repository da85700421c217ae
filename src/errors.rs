use std::fmt;

/// Everything that can stop a parameter lookup.
#[derive(Debug, Fail)]
pub enum ResolveError {
    /// The caller asked for an impossible combination of options.
    #[fail(display = "invalid request: {}", reason)]
    Config { reason: String },
    /// Single-name lookup of a key the store does not hold.
    #[fail(display = "parameter not found: {}", name)]
    NotFound { name: String },
    /// The store (or the path to it) failed after retries were exhausted.
    #[fail(display = "{} failed for {}", operation, context)]
    Service {
        operation: &'static str,
        context: ServiceContext,
        #[cause]
        cause: failure::Error,
    },
    /// The result could not be written out as JSON.
    #[fail(display = "cannot serialize result")]
    Output {
        #[cause]
        cause: serde_json::Error,
    },
}

impl ResolveError {
    pub fn config<S: Into<String>>(reason: S) -> Self {
        ResolveError::Config { reason: reason.into() }
    }

    pub fn service<E>(operation: &'static str, context: ServiceContext, cause: E) -> Self
    where
        E: Into<failure::Error>,
    {
        ResolveError::Service { operation, context, cause: cause.into() }
    }
}

/// What a failed service call was about.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceContext {
    Names(Vec<String>),
    Page(Option<String>),
}

impl fmt::Display for ServiceContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ServiceContext::Names(names) => write!(f, "[{}]", names.join(", ")),
            ServiceContext::Page(None) => write!(f, "first page"),
            ServiceContext::Page(Some(token)) => write!(f, "page after token {}", token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use failure::Fail;

    #[test]
    fn service_error_keeps_its_cause() {
        let err = ResolveError::service(
            "GetParameters",
            ServiceContext::Names(vec!["Hello".to_string(), "World".to_string()]),
            failure::err_msg("AccessDeniedException"),
        );
        assert_eq!(err.to_string(), "GetParameters failed for [Hello, World]");
        let cause = err.cause().expect("cause attached");
        assert_eq!(cause.to_string(), "AccessDeniedException");
    }

    #[test]
    fn causes_are_listed_once_after_the_message() {
        let err = ResolveError::service(
            "DescribeParameters",
            ServiceContext::Page(None),
            failure::err_msg("ThrottlingException: Rate exceeded"),
        );
        let causes: Vec<String> = (&err as &dyn Fail).iter_causes().map(|c| c.to_string()).collect();
        assert_eq!(err.to_string(), "DescribeParameters failed for first page");
        assert_eq!(causes, vec!["ThrottlingException: Rate exceeded".to_string()]);
    }

    #[test]
    fn output_error_is_not_blamed_on_the_request() {
        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ResolveError::Output { cause };
        assert_eq!(err.to_string(), "cannot serialize result");
        assert!(err.cause().is_some());
    }

    #[test]
    fn page_context_names_the_token() {
        assert_eq!(ServiceContext::Page(None).to_string(), "first page");
        assert_eq!(ServiceContext::Page(Some("abc".to_string())).to_string(), "page after token abc");
    }

    #[test]
    fn not_found_names_the_parameter() {
        let err = ResolveError::NotFound { name: "/app/db/url".to_string() };
        assert_eq!(err.to_string(), "parameter not found: /app/db/url");
    }
}
