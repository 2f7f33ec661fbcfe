//! Aurora PostgreSQL through the RDS Data API.
//!
//! The adapter marshals bind parameters, enforces local transaction
//! bookkeeping and reshapes statement output into [`TabularResult`]s. The
//! backend itself is reached through the [`DataApi`] trait.

mod aws;
pub mod marshal;
pub mod tabular;
pub mod transactions;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use tracing::{info, instrument};

use super::failure::BackendFailure;
use super::retry::RetryPolicy;
use super::session::AdapterSession;
use crate::domains::tools::{ToolError, TransactionState, Value};

pub use aws::{RdsDataApi, RdsDataConnector};
pub use marshal::marshal_parameters;
pub use tabular::{TabularResult, reshape};
pub use transactions::TransactionTracker;

/// A Data API field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
    Array(Vec<FieldValue>),
}

/// A named bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParam {
    pub name: String,
    pub value: FieldValue,
}

/// One ExecuteStatement call.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRequest {
    pub database: String,
    pub sql: String,
    pub parameters: Vec<SqlParam>,
    pub continue_after_timeout: bool,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMeta {
    pub label: Option<String>,
    pub name: Option<String>,
}

/// Raw ExecuteStatement output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOutput {
    pub columns: Vec<ColumnMeta>,
    /// `None` for statements that produce no result set.
    pub records: Option<Vec<Vec<FieldValue>>>,
    pub records_updated: i64,
    pub generated_fields: Vec<FieldValue>,
}

/// The RDS Data API operations used by the Aurora server.
#[async_trait]
pub trait DataApi: Send + Sync {
    async fn execute_statement(
        &self,
        request: StatementRequest,
    ) -> Result<StatementOutput, BackendFailure>;

    /// Returns the new transaction id.
    async fn begin_transaction(&self, database: &str) -> Result<String, BackendFailure>;

    /// Returns the backend's transaction status text.
    async fn commit_transaction(&self, transaction_id: &str) -> Result<String, BackendFailure>;

    /// Returns the backend's transaction status text.
    async fn rollback_transaction(&self, transaction_id: &str) -> Result<String, BackendFailure>;
}

/// Arguments of one statement execution.
#[derive(Debug, Clone, Default)]
pub struct Statement<'a> {
    pub sql: &'a str,
    pub database: Option<&'a str>,
    pub parameters: Option<&'a Value>,
    pub continue_after_timeout: bool,
    pub transaction_id: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStarted {
    pub transaction_id: String,
    pub database: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnded {
    pub transaction_id: String,
    #[schemars(with = "String")]
    pub state: TransactionState,
    /// Status text reported by the Data API.
    pub status: String,
}

pub struct AuroraAdapter {
    session: AdapterSession<dyn DataApi>,
    policy: RetryPolicy,
    default_database: String,
    transactions: TransactionTracker,
}

impl AuroraAdapter {
    pub fn new(
        session: AdapterSession<dyn DataApi>,
        policy: RetryPolicy,
        default_database: impl Into<String>,
    ) -> Self {
        Self {
            session,
            policy,
            default_database: default_database.into(),
            transactions: TransactionTracker::default(),
        }
    }

    fn database(&self, requested: Option<&str>) -> String {
        requested.unwrap_or(&self.default_database).to_string()
    }

    #[instrument(skip_all, fields(in_transaction = statement.transaction_id.is_some()))]
    pub async fn execute(&self, statement: Statement<'_>) -> Result<TabularResult, ToolError> {
        let parameters = marshal_parameters(statement.parameters)?;
        if let Some(transaction_id) = statement.transaction_id {
            self.transactions.ensure_usable(transaction_id)?;
        }

        let request = StatementRequest {
            database: self.database(statement.database),
            sql: statement.sql.to_string(),
            parameters,
            continue_after_timeout: statement.continue_after_timeout,
            transaction_id: statement.transaction_id.map(str::to_string),
        };

        let output = self
            .session
            .call(&self.policy, "execute_statement", |api| {
                let request = request.clone();
                async move { api.execute_statement(request).await }
            })
            .await?;

        Ok(reshape(output)?)
    }

    #[instrument(skip_all)]
    pub async fn begin(&self, database: Option<&str>) -> Result<TransactionStarted, ToolError> {
        let database = self.database(database);
        let transaction_id = self
            .session
            .call(&self.policy, "begin_transaction", |api| {
                let database = database.clone();
                async move { api.begin_transaction(&database).await }
            })
            .await?;

        self.transactions.started(&transaction_id);
        info!("Transaction started");

        Ok(TransactionStarted {
            transaction_id,
            database,
            started_at: Utc::now(),
        })
    }

    #[instrument(skip_all)]
    pub async fn commit(&self, transaction_id: &str) -> Result<TransactionEnded, ToolError> {
        self.transactions.ensure_usable(transaction_id)?;
        let status = self
            .session
            .call(&self.policy, "commit_transaction", |api| async move {
                api.commit_transaction(transaction_id).await
            })
            .await?;
        self.end(transaction_id, TransactionState::Committed, status)
    }

    #[instrument(skip_all)]
    pub async fn rollback(&self, transaction_id: &str) -> Result<TransactionEnded, ToolError> {
        self.transactions.ensure_usable(transaction_id)?;
        let status = self
            .session
            .call(&self.policy, "rollback_transaction", |api| async move {
                api.rollback_transaction(transaction_id).await
            })
            .await?;
        self.end(transaction_id, TransactionState::RolledBack, status)
    }

    fn end(
        &self,
        transaction_id: &str,
        state: TransactionState,
        status: String,
    ) -> Result<TransactionEnded, ToolError> {
        self.transactions.finish(transaction_id, state);
        info!(%state, "Transaction ended");
        Ok(TransactionEnded {
            transaction_id: transaction_id.to_string(),
            state,
            status,
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory Data API used by adapter and tool tests.

    use super::*;
    use crate::domains::adapters::failure::FailureClass;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct FakeDataApi {
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<StatementRequest>>,
        /// Failures returned, in order, before calls start succeeding.
        pub failures: Mutex<VecDeque<BackendFailure>>,
        pub next_output: Mutex<Option<StatementOutput>>,
    }

    impl FakeDataApi {
        pub fn failing_with(failures: impl IntoIterator<Item = BackendFailure>) -> Self {
            Self {
                failures: Mutex::new(failures.into_iter().collect()),
                ..Self::default()
            }
        }

        pub fn returning(output: StatementOutput) -> Self {
            Self {
                next_output: Mutex::new(Some(output)),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn record_call(&self) -> Result<(), BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.failures.lock().unwrap().pop_front() {
                Some(failure) => Err(failure),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl DataApi for FakeDataApi {
        async fn execute_statement(
            &self,
            request: StatementRequest,
        ) -> Result<StatementOutput, BackendFailure> {
            self.record_call()?;
            if request.sql.contains("no_such_table") {
                return Err(BackendFailure::new(
                    FailureClass::BadRequest,
                    "BadRequestException",
                    "relation \"no_such_table\" does not exist",
                ));
            }
            self.requests.lock().unwrap().push(request.clone());
            if let Some(output) = self.next_output.lock().unwrap().clone() {
                return Ok(output);
            }
            // Every statement behaves like `SELECT 1`.
            Ok(StatementOutput {
                columns: vec![ColumnMeta::default()],
                records: Some(vec![vec![FieldValue::Long(1)]]),
                ..StatementOutput::default()
            })
        }

        async fn begin_transaction(&self, _database: &str) -> Result<String, BackendFailure> {
            self.record_call()?;
            Ok(format!("tx-{}", self.calls()))
        }

        async fn commit_transaction(&self, _transaction_id: &str) -> Result<String, BackendFailure> {
            self.record_call()?;
            Ok("Transaction Committed".to_string())
        }

        async fn rollback_transaction(
            &self,
            _transaction_id: &str,
        ) -> Result<String, BackendFailure> {
            self.record_call()?;
            Ok("Rollback Complete".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeDataApi;
    use super::*;
    use crate::domains::adapters::failure::FailureClass;
    use crate::domains::tools::ErrorKind;
    use serde_json::json;
    use std::sync::Arc;

    fn adapter(api: Arc<FakeDataApi>) -> AuroraAdapter {
        AuroraAdapter::new(
            AdapterSession::<dyn DataApi>::new(api),
            RetryPolicy::immediate(3),
            "postgres",
        )
    }

    #[tokio::test]
    async fn test_select_one() {
        let api = Arc::new(FakeDataApi::default());
        let table = adapter(api.clone())
            .execute(Statement {
                sql: "SELECT 1",
                ..Statement::default()
            })
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({ "columns": ["?column?"], "rows": [{ "?column?": 1 }], "rowCount": 1 })
        );
        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].database, "postgres");
        assert!(requests[0].parameters.is_empty());
    }

    #[tokio::test]
    async fn test_parameters_and_database_forwarded() {
        let api = Arc::new(FakeDataApi::default());
        let parameters = Value::from_json(json!({ "id": 7 }));
        adapter(api.clone())
            .execute(Statement {
                sql: "SELECT * FROM users WHERE id = :id",
                database: Some("app"),
                parameters: Some(&parameters),
                continue_after_timeout: true,
                transaction_id: None,
            })
            .await
            .unwrap();

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].database, "app");
        assert!(requests[0].continue_after_timeout);
        assert_eq!(
            requests[0].parameters,
            vec![SqlParam {
                name: "id".to_string(),
                value: FieldValue::Long(7)
            }]
        );
    }

    #[tokio::test]
    async fn test_bad_parameters_fail_before_remote_call() {
        let api = Arc::new(FakeDataApi::default());
        let parameters = Value::from_json(json!({ "ids": [1, 2] }));
        let err = adapter(api.clone())
            .execute(Statement {
                sql: "SELECT 1",
                parameters: Some(&parameters),
                ..Statement::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParameterTypeError);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_connection_limit_retried_then_throttled() {
        let failures = (0..5).map(|_| {
            BackendFailure::new(FailureClass::Unavailable, "BadRequestException", "too many connections")
        });
        let api = Arc::new(FakeDataApi::failing_with(failures));
        let err = adapter(api.clone())
            .execute(Statement {
                sql: "SELECT 1",
                ..Statement::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Throttled);
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test]
    async fn test_sql_error_is_not_retried() {
        let api = Arc::new(FakeDataApi::default());
        let err = adapter(api.clone())
            .execute(Statement {
                sql: "SELECT * FROM no_such_table",
                ..Statement::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendError);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_transaction_lifecycle() {
        let api = Arc::new(FakeDataApi::default());
        let adapter = adapter(api.clone());

        let started = adapter.begin(None).await.unwrap();
        assert_eq!(started.database, "postgres");

        adapter
            .execute(Statement {
                sql: "INSERT INTO t VALUES (1)",
                transaction_id: Some(&started.transaction_id),
                ..Statement::default()
            })
            .await
            .unwrap();

        let ended = adapter.commit(&started.transaction_id).await.unwrap();
        assert_eq!(ended.state, TransactionState::Committed);
        let calls_after_commit = api.calls();

        let err = adapter
            .execute(Statement {
                sql: "SELECT 1",
                transaction_id: Some(&started.transaction_id),
                ..Statement::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionStateError);

        let err = adapter.rollback(&started.transaction_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionStateError);
        assert_eq!(api.calls(), calls_after_commit);
    }

    #[tokio::test]
    async fn test_foreign_transaction_passes_through() {
        let api = Arc::new(FakeDataApi::default());
        let ended = adapter(api.clone()).rollback("tx-elsewhere").await.unwrap();
        assert_eq!(ended.status, "Rollback Complete");
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_statement_after_foreign_commit_is_rejected() {
        let api = Arc::new(FakeDataApi::default());
        let adapter = adapter(api.clone());
        adapter.commit("tx-elsewhere").await.unwrap();
        let calls_after_commit = api.calls();

        let err = adapter
            .execute(Statement {
                sql: "SELECT 1",
                transaction_id: Some("tx-elsewhere"),
                ..Statement::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransactionStateError);
        assert_eq!(api.calls(), calls_after_commit);
    }
}
