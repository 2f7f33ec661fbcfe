//! [`DataApi`] on top of `aws-sdk-rdsdata`.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_rdsdata::Client;
use aws_sdk_rdsdata::primitives::Blob;
use aws_sdk_rdsdata::types::{ArrayValue, ColumnMetadata, Field, SqlParameter};

use super::{ColumnMeta, DataApi, FieldValue, StatementOutput, StatementRequest};
use crate::core::config::{AuroraConfig, AwsConfig};
use crate::domains::adapters::aws::{classify_sdk_error, load_sdk_config, optional};
use crate::domains::adapters::failure::{BackendFailure, FailureClass};
use crate::domains::adapters::session::Connector;

/// Data API error codes with a known meaning.
fn classify(code: &str, message: &str) -> Option<FailureClass> {
    let class = match code {
        "StatementTimeoutException" => FailureClass::StatementTimeout,
        "DatabaseResumingException"
        | "DatabaseUnavailableException"
        | "ServiceUnavailableError"
        | "InternalServerErrorException" => FailureClass::Unavailable,
        "NotFoundException" | "DatabaseNotFoundException" | "TransactionNotFoundException" => {
            FailureClass::NotFound
        }
        "ForbiddenException" | "HttpEndpointNotEnabledException" | "SecretsErrorException"
        | "InvalidSecretException" => FailureClass::AccessDenied,
        "BadRequestException" => {
            let message = message.to_lowercase();
            if message.contains("too many connections") || message.contains("connection limit") {
                FailureClass::Unavailable
            } else {
                FailureClass::BadRequest
            }
        }
        "DatabaseErrorException" | "UnsupportedResultException" => FailureClass::BadRequest,
        _ => return None,
    };
    Some(class)
}

/// Data API client bound to one cluster and secret.
pub struct RdsDataApi {
    client: Client,
    resource_arn: String,
    secret_arn: String,
}

impl RdsDataApi {
    pub fn new(client: Client, resource_arn: impl Into<String>, secret_arn: impl Into<String>) -> Self {
        Self {
            client,
            resource_arn: resource_arn.into(),
            secret_arn: secret_arn.into(),
        }
    }
}

fn to_field(value: FieldValue) -> Field {
    match value {
        FieldValue::Null => Field::IsNull(true),
        FieldValue::Boolean(b) => Field::BooleanValue(b),
        FieldValue::Long(i) => Field::LongValue(i),
        FieldValue::Double(f) => Field::DoubleValue(f),
        FieldValue::String(s) => Field::StringValue(s),
        FieldValue::Blob(bytes) => Field::BlobValue(Blob::new(bytes)),
        FieldValue::Array(items) => Field::ArrayValue(to_array(items)),
    }
}

/// Data API arrays are homogeneous; the first non-null element decides the
/// type. Null elements are kept as `None`.
fn to_array(items: Vec<FieldValue>) -> ArrayValue {
    let kind = items.iter().find(|item| !matches!(item, FieldValue::Null));
    match kind {
        Some(FieldValue::Boolean(_)) => ArrayValue::BooleanValues(
            items
                .into_iter()
                .map(|item| match item {
                    FieldValue::Boolean(b) => Some(b),
                    _ => None,
                })
                .collect(),
        ),
        Some(FieldValue::Long(_)) => ArrayValue::LongValues(
            items
                .into_iter()
                .map(|item| match item {
                    FieldValue::Long(i) => Some(i),
                    _ => None,
                })
                .collect(),
        ),
        Some(FieldValue::Double(_)) => ArrayValue::DoubleValues(
            items
                .into_iter()
                .map(|item| match item {
                    FieldValue::Double(f) => Some(f),
                    _ => None,
                })
                .collect(),
        ),
        Some(FieldValue::Array(_)) => ArrayValue::ArrayValues(
            items
                .into_iter()
                .map(|item| match item {
                    FieldValue::Array(inner) => Some(to_array(inner)),
                    _ => None,
                })
                .collect(),
        ),
        _ => ArrayValue::StringValues(
            items
                .into_iter()
                .map(|item| match item {
                    FieldValue::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
    }
}

fn from_field(field: Field) -> FieldValue {
    match field {
        Field::IsNull(_) => FieldValue::Null,
        Field::BooleanValue(b) => FieldValue::Boolean(b),
        Field::LongValue(i) => FieldValue::Long(i),
        Field::DoubleValue(f) => FieldValue::Double(f),
        Field::StringValue(s) => FieldValue::String(s),
        Field::BlobValue(blob) => FieldValue::Blob(blob.into_inner()),
        Field::ArrayValue(array) => from_array(array),
        _ => FieldValue::Null,
    }
}

fn nullable<T>(values: Vec<Option<T>>, convert: impl Fn(T) -> FieldValue) -> Vec<FieldValue> {
    values
        .into_iter()
        .map(|value| value.map_or(FieldValue::Null, &convert))
        .collect()
}

fn from_array(array: ArrayValue) -> FieldValue {
    let items = match array {
        ArrayValue::BooleanValues(values) => nullable(values, FieldValue::Boolean),
        ArrayValue::LongValues(values) => nullable(values, FieldValue::Long),
        ArrayValue::DoubleValues(values) => nullable(values, FieldValue::Double),
        ArrayValue::StringValues(values) => nullable(values, FieldValue::String),
        ArrayValue::ArrayValues(values) => nullable(values, from_array),
        _ => Vec::new(),
    };
    FieldValue::Array(items)
}

#[async_trait]
impl DataApi for RdsDataApi {
    async fn execute_statement(
        &self,
        request: StatementRequest,
    ) -> Result<StatementOutput, BackendFailure> {
        let parameters = request
            .parameters
            .into_iter()
            .map(|param| {
                SqlParameter::builder()
                    .name(param.name)
                    .value(to_field(param.value))
                    .build()
            })
            .collect::<Vec<_>>();

        let output = self
            .client
            .execute_statement()
            .resource_arn(&self.resource_arn)
            .secret_arn(&self.secret_arn)
            .database(request.database)
            .sql(request.sql)
            .set_parameters(Some(parameters))
            .include_result_metadata(true)
            .continue_after_timeout(request.continue_after_timeout)
            .set_transaction_id(request.transaction_id)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let metadata: &[ColumnMetadata] = optional(output.column_metadata()).unwrap_or_default();
        let columns = metadata
            .iter()
            .map(|column| ColumnMeta {
                label: optional::<&str>(column.label()).map(str::to_string),
                name: optional::<&str>(column.name()).map(str::to_string),
            })
            .collect();
        let records_updated: Option<i64> = optional(output.number_of_records_updated());

        Ok(StatementOutput {
            columns,
            records: output.records.map(|records| {
                records
                    .into_iter()
                    .map(|record| record.into_iter().map(from_field).collect())
                    .collect()
            }),
            records_updated: records_updated.unwrap_or_default(),
            generated_fields: output
                .generated_fields
                .unwrap_or_default()
                .into_iter()
                .map(from_field)
                .collect(),
        })
    }

    async fn begin_transaction(&self, database: &str) -> Result<String, BackendFailure> {
        let output = self
            .client
            .begin_transaction()
            .resource_arn(&self.resource_arn)
            .secret_arn(&self.secret_arn)
            .database(database)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        optional::<&str>(output.transaction_id())
            .map(str::to_string)
            .ok_or_else(|| {
                BackendFailure::new(
                    FailureClass::Other,
                    "MissingTransactionId",
                    "BeginTransaction returned no transaction id",
                )
            })
    }

    async fn commit_transaction(&self, transaction_id: &str) -> Result<String, BackendFailure> {
        let output = self
            .client
            .commit_transaction()
            .resource_arn(&self.resource_arn)
            .secret_arn(&self.secret_arn)
            .transaction_id(transaction_id)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;
        Ok(optional::<&str>(output.transaction_status())
            .unwrap_or("Transaction Committed")
            .to_string())
    }

    async fn rollback_transaction(&self, transaction_id: &str) -> Result<String, BackendFailure> {
        let output = self
            .client
            .rollback_transaction()
            .resource_arn(&self.resource_arn)
            .secret_arn(&self.secret_arn)
            .transaction_id(transaction_id)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;
        Ok(optional::<&str>(output.transaction_status())
            .unwrap_or("Rollback Complete")
            .to_string())
    }
}

/// Builds [`RdsDataApi`] clients from the process configuration.
pub struct RdsDataConnector {
    aws: AwsConfig,
    aurora: AuroraConfig,
}

impl RdsDataConnector {
    pub fn new(aws: AwsConfig, aurora: AuroraConfig) -> Self {
        Self { aws, aurora }
    }
}

#[async_trait]
impl Connector<dyn DataApi> for RdsDataConnector {
    async fn connect(&self) -> Result<Arc<dyn DataApi>, BackendFailure> {
        let (Some(cluster_arn), Some(secret_arn)) =
            (&self.aurora.cluster_arn, &self.aurora.secret_arn)
        else {
            return Err(BackendFailure::new(
                FailureClass::AccessDenied,
                "MissingConfiguration",
                "DB_CLUSTER_ARN and DB_SECRET_ARN must be set",
            ));
        };

        let sdk_config = load_sdk_config(&self.aws).await;
        Ok(Arc::new(RdsDataApi::new(
            Client::new(&sdk_config),
            cluster_arn.clone(),
            secret_arn.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_limit_is_transient() {
        assert_eq!(
            classify("BadRequestException", "FATAL: too many connections for role"),
            Some(FailureClass::Unavailable)
        );
        assert_eq!(
            classify("BadRequestException", "syntax error at or near \"SELEC\""),
            Some(FailureClass::BadRequest)
        );
    }

    #[test]
    fn test_statement_timeout_and_not_found() {
        assert_eq!(
            classify("StatementTimeoutException", ""),
            Some(FailureClass::StatementTimeout)
        );
        assert_eq!(
            classify("TransactionNotFoundException", ""),
            Some(FailureClass::NotFound)
        );
        assert_eq!(classify("ThrottlingException", ""), None);
    }

    #[test]
    fn test_field_conversion_round_trip() {
        assert_eq!(from_field(to_field(FieldValue::Null)), FieldValue::Null);
        assert_eq!(from_field(to_field(FieldValue::Long(5))), FieldValue::Long(5));
        assert_eq!(
            from_field(to_field(FieldValue::Blob(vec![1, 2]))),
            FieldValue::Blob(vec![1, 2])
        );
    }

    #[test]
    fn test_array_fields() {
        let array = FieldValue::Array(vec![FieldValue::Long(1), FieldValue::Long(2)]);
        assert_eq!(from_field(to_field(array.clone())), array);

        let nested = FieldValue::Array(vec![FieldValue::Array(vec![FieldValue::Boolean(true)])]);
        assert_eq!(from_field(to_field(nested.clone())), nested);
    }

    #[test]
    fn test_array_null_elements_survive() {
        let array = FieldValue::Array(vec![
            FieldValue::Null,
            FieldValue::String("x".to_string()),
            FieldValue::Null,
        ]);
        let Field::ArrayValue(ArrayValue::StringValues(values)) = to_field(array.clone()) else {
            panic!("expected a string array");
        };
        assert_eq!(values, vec![None, Some("x".to_string()), None]);
        assert_eq!(from_field(to_field(array.clone())), array);

        let longs = FieldValue::Array(vec![FieldValue::Long(1), FieldValue::Null]);
        assert_eq!(from_field(to_field(longs.clone())), longs);
    }
}
