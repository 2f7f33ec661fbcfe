//! Shared AWS SDK plumbing: configuration loading and error classification.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::{DispatchFailure, SdkError};
use aws_smithy_types::date_time::{DateTime, Format};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use aws_smithy_types::retry::RetryConfig;
use tracing::debug;

use super::failure::{BackendFailure, FailureClass};
use crate::core::config::AwsConfig;

/// Load the shared SDK configuration; credentials come from the default chain.
///
/// SDK-level retries are disabled: every attempt is made by `RetryPolicy`.
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).retry_config(RetryConfig::disabled());
    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}

/// Accept an SDK accessor result whether or not the model marks it optional.
pub(crate) fn optional<T>(value: impl Into<Option<T>>) -> Option<T> {
    value.into()
}

/// RFC 3339 rendering of an SDK timestamp.
pub(crate) fn timestamp(value: &DateTime) -> Option<String> {
    value.fmt(Format::DateTime).ok()
}

/// Error codes shared by most AWS services.
fn common_class(code: &str) -> Option<FailureClass> {
    let class = match code {
        "Throttling"
        | "ThrottlingException"
        | "ThrottledException"
        | "TooManyRequestsException"
        | "RequestLimitExceeded"
        | "RequestThrottled"
        | "RequestThrottledException"
        | "SlowDown"
        | "ProvisionedThroughputExceededException" => FailureClass::Throttled,
        "ServiceUnavailable"
        | "ServiceUnavailableException"
        | "InternalError"
        | "InternalFailure"
        | "RequestTimeout"
        | "RequestTimeoutException" => FailureClass::Unavailable,
        "ExpiredToken" | "ExpiredTokenException" | "RequestExpired" | "TokenRefreshRequired" => {
            FailureClass::AuthExpired
        }
        "AccessDenied" | "AccessDeniedException" | "UnrecognizedClientException"
        | "InvalidClientTokenId" => FailureClass::AccessDenied,
        _ => return None,
    };
    Some(class)
}

/// Classify an SDK error.
///
/// `service_class` sees the error code and message first; common codes and
/// the HTTP status are the fallbacks.
///
/// A client-side timeout leaves the outcome unknown (the request may have
/// run), so it is never retried internally. Connection-level dispatch
/// failures are transient.
pub(crate) fn classify_sdk_error<E>(
    err: SdkError<E, HttpResponse>,
    service_class: fn(&str, &str) -> Option<FailureClass>,
) -> BackendFailure
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::TimeoutError(_) => {
            debug!(error = %DisplayErrorContext(&err), "Request timed out on the client");
            return BackendFailure::new(
                FailureClass::StatementTimeout,
                "ClientTimeout",
                DisplayErrorContext(&err).to_string(),
            );
        }
        SdkError::DispatchFailure(failure) => {
            debug!(error = %DisplayErrorContext(&err), "Request dispatch failed");
            return BackendFailure::new(
                dispatch_class(failure),
                "DispatchFailure",
                DisplayErrorContext(&err).to_string(),
            );
        }
        _ => {}
    }

    let status = err.raw_response().map(|response| response.status().as_u16());
    let code = err.code().unwrap_or("Unknown").to_string();
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    let class = service_class(&code, &message)
        .or_else(|| common_class(&code))
        .or_else(|| status.map(FailureClass::from_status))
        .unwrap_or(FailureClass::Other);

    debug!(code = %code, status, ?class, "Classified backend failure");
    BackendFailure::new(class, code, message)
}

fn dispatch_class(failure: &DispatchFailure) -> FailureClass {
    if failure.is_io() || failure.is_timeout() {
        FailureClass::Unavailable
    } else {
        FailureClass::Other
    }
}
