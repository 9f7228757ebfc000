//! Named-operation surface over the record store.
//!
//! # Responsibility
//! - Expose the published operation names with their exact argument orders.
//! - Perform the surface-level argument guards before any store call.
//! - Dispatch `invoke` calls and encode read results as JSON bytes.
//!
//! # Invariants
//! - Operation names and argument orders are frozen: `GetEvaluationByID`
//!   takes the identifier first, while the TestResult and Judgement
//!   owner-checked point reads take the owner first.
//! - `GetTestResultsByTestID` and `GetJudgementByJudgementID` skip the
//!   ownership check on purpose.
//! - Mutations return empty bytes; reads return JSON.

use crate::ledger::LedgerGateway;
use crate::model::record::{Evaluation, Judgement, LedgerRecord, RecordKind, TestResult};
use crate::store::record_store::{RecordStore, StoreError};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ContractResult<T> = Result<T, ContractError>;

/// Operation-surface error for dispatch and argument handling.
#[derive(Debug)]
pub enum ContractError {
    /// Operation name outside the published surface.
    UnknownOperation(String),
    WrongArgumentCount {
        operation: String,
        expected: usize,
        found: usize,
    },
    /// A required string argument was empty.
    EmptyArgument(&'static str),
    Store(StoreError),
}

impl Display for ContractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOperation(operation) => {
                write!(f, "unknown operation `{operation}`")
            }
            Self::WrongArgumentCount {
                operation,
                expected,
                found,
            } => write!(
                f,
                "operation `{operation}` expects {expected} arguments, got {found}"
            ),
            Self::EmptyArgument(name) => write!(f, "argument `{name}` must not be empty"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownOperation(_) => None,
            Self::WrongArgumentCount { .. } => None,
            Self::EmptyArgument(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ContractError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Published operation surface bound to one ledger gateway.
///
/// Every operation exists twice: as a typed method and as an `invoke` target
/// under its frozen name. Both paths run the same guards.
pub struct RecordContract<L: LedgerGateway> {
    store: RecordStore<L>,
}

impl<L: LedgerGateway> RecordContract<L> {
    /// Creates a contract over the provided gateway.
    pub fn new(ledger: L) -> Self {
        Self {
            store: RecordStore::new(ledger),
        }
    }

    /// Shared access to the underlying store.
    pub fn store(&self) -> &RecordStore<L> {
        &self.store
    }

    /// Creates an evaluation from its JSON payload.
    pub fn upload_evaluation(&self, evaluation_json: &str) -> ContractResult<()> {
        let record: Evaluation = decode_payload(evaluation_json)?;
        self.store.create(record)?;
        Ok(())
    }

    /// Replaces the evaluation at `evaluation_id` with the supplied payload.
    ///
    /// The target must exist and the payload may not change the identifier.
    pub fn modify_evaluation(
        &self,
        evaluation_id: &str,
        new_evaluation_json: &str,
    ) -> ContractResult<()> {
        self.store
            .update::<Evaluation>(evaluation_id, new_evaluation_json.as_bytes())?;
        Ok(())
    }

    /// Reads one evaluation, verifying `user_id` owns it.
    ///
    /// Identifier first, owner second.
    pub fn get_evaluation_by_id(
        &self,
        evaluation_id: &str,
        user_id: &str,
    ) -> ContractResult<Evaluation> {
        ensure_not_empty(evaluation_id, "evaluation_id")?;
        ensure_not_empty(user_id, "user_id")?;
        Ok(self.store.get_owned(evaluation_id, user_id)?)
    }

    /// Lists all evaluations owned by `user_id`.
    pub fn get_evaluation_by_user(&self, user_id: &str) -> ContractResult<Vec<Evaluation>> {
        ensure_not_empty(user_id, "user_id")?;
        Ok(self.store.list_by_owner(user_id)?)
    }

    /// Lists every evaluation regardless of owner.
    ///
    /// Unrestricted bulk read; large ledgers should page on the client side.
    pub fn get_all_evaluations(&self) -> ContractResult<Vec<Evaluation>> {
        Ok(self.store.list_all()?)
    }

    /// Creates a test result from its JSON payload.
    pub fn upload_test_result(&self, test_json: &str) -> ContractResult<()> {
        let record: TestResult = decode_payload(test_json)?;
        self.store.create(record)?;
        Ok(())
    }

    /// Lists all test results owned by `user_id`.
    pub fn get_test_results_by_user(&self, user_id: &str) -> ContractResult<Vec<TestResult>> {
        ensure_not_empty(user_id, "user_id")?;
        Ok(self.store.list_by_owner(user_id)?)
    }

    /// Reads one test result by identifier with no ownership check.
    pub fn get_test_results_by_test_id(&self, test_id: &str) -> ContractResult<TestResult> {
        ensure_not_empty(test_id, "test_id")?;
        Ok(self.store.get(test_id)?)
    }

    /// Reads one test result, verifying `user_id` owns it.
    ///
    /// Owner first, identifier second.
    pub fn get_test_results_by_id(
        &self,
        user_id: &str,
        test_id: &str,
    ) -> ContractResult<TestResult> {
        ensure_not_empty(user_id, "user_id")?;
        ensure_not_empty(test_id, "test_id")?;
        Ok(self.store.get_owned(test_id, user_id)?)
    }

    /// Creates a judgement from its JSON payload.
    pub fn upload_judgement(&self, judgement_json: &str) -> ContractResult<()> {
        let record: Judgement = decode_payload(judgement_json)?;
        self.store.create(record)?;
        Ok(())
    }

    /// Lists all judgements owned by `user_id`.
    pub fn get_judgement_by_user(&self, user_id: &str) -> ContractResult<Vec<Judgement>> {
        ensure_not_empty(user_id, "user_id")?;
        Ok(self.store.list_by_owner(user_id)?)
    }

    /// Reads one judgement, verifying `user_id` owns it.
    ///
    /// Owner first, identifier second.
    pub fn get_judgement_by_id(
        &self,
        user_id: &str,
        judgement_id: &str,
    ) -> ContractResult<Judgement> {
        ensure_not_empty(user_id, "user_id")?;
        ensure_not_empty(judgement_id, "judgement_id")?;
        Ok(self.store.get_owned(judgement_id, user_id)?)
    }

    /// Reads one judgement by identifier with no ownership check.
    pub fn get_judgement_by_judgement_id(&self, judgement_id: &str) -> ContractResult<Judgement> {
        ensure_not_empty(judgement_id, "judgement_id")?;
        Ok(self.store.get(judgement_id)?)
    }

    /// Removes the record of `record_type` at `record_id`.
    ///
    /// `record_type` must be one of the canonical kind names. Succeeds for
    /// missing records and checks no ownership.
    pub fn delete_record(&self, record_type: &str, record_id: &str) -> ContractResult<()> {
        ensure_not_empty(record_id, "record_id")?;
        let kind = RecordKind::parse(record_type)
            .ok_or_else(|| StoreError::UnsupportedKind(record_type.to_string()))?;
        self.store.delete(kind, record_id)?;
        Ok(())
    }

    /// Seeds one sample record per kind. Development use only; repeating the
    /// call overwrites the seeds.
    pub fn init_ledger(&self) -> ContractResult<()> {
        self.store.bootstrap()?;
        Ok(())
    }

    /// Invokes one operation by its published name.
    ///
    /// Checks arity, runs the operation, and returns raw JSON bytes for
    /// reads or empty bytes for mutations.
    ///
    /// # Side effects
    /// - Emits `contract_invoke` logging events with duration and status.
    pub fn invoke(&self, operation: &str, args: &[String]) -> ContractResult<Vec<u8>> {
        let started_at = Instant::now();
        info!(
            "event=contract_invoke module=contract status=start operation={operation} args={}",
            args.len()
        );

        match self.dispatch(operation, args) {
            Ok(response) => {
                info!(
                    "event=contract_invoke module=contract status=ok operation={operation} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(response)
            }
            Err(err) => {
                error!(
                    "event=contract_invoke module=contract status=error operation={operation} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn dispatch(&self, operation: &str, args: &[String]) -> ContractResult<Vec<u8>> {
        match operation {
            "UploadEvaluation" => {
                expect_args(operation, args, 1)?;
                self.upload_evaluation(&args[0])?;
                Ok(Vec::new())
            }
            "ModifyEvaluation" => {
                expect_args(operation, args, 2)?;
                self.modify_evaluation(&args[0], &args[1])?;
                Ok(Vec::new())
            }
            "GetEvaluationByID" => {
                expect_args(operation, args, 2)?;
                encode_response(&self.get_evaluation_by_id(&args[0], &args[1])?)
            }
            "GetEvaluationByUser" => {
                expect_args(operation, args, 1)?;
                encode_response(&self.get_evaluation_by_user(&args[0])?)
            }
            "GetAllEvaluations" => {
                expect_args(operation, args, 0)?;
                encode_response(&self.get_all_evaluations()?)
            }
            "UploadTestResult" => {
                expect_args(operation, args, 1)?;
                self.upload_test_result(&args[0])?;
                Ok(Vec::new())
            }
            "GetTestResultsByUser" => {
                expect_args(operation, args, 1)?;
                encode_response(&self.get_test_results_by_user(&args[0])?)
            }
            "GetTestResultsByTestID" => {
                expect_args(operation, args, 1)?;
                encode_response(&self.get_test_results_by_test_id(&args[0])?)
            }
            "GetTestResultsByID" => {
                expect_args(operation, args, 2)?;
                encode_response(&self.get_test_results_by_id(&args[0], &args[1])?)
            }
            "UploadJudgement" => {
                expect_args(operation, args, 1)?;
                self.upload_judgement(&args[0])?;
                Ok(Vec::new())
            }
            "GetJudgementByUser" => {
                expect_args(operation, args, 1)?;
                encode_response(&self.get_judgement_by_user(&args[0])?)
            }
            "GetJudgementByID" => {
                expect_args(operation, args, 2)?;
                encode_response(&self.get_judgement_by_id(&args[0], &args[1])?)
            }
            "GetJudgementByJudgementID" => {
                expect_args(operation, args, 1)?;
                encode_response(&self.get_judgement_by_judgement_id(&args[0])?)
            }
            "DeleteRecord" => {
                expect_args(operation, args, 2)?;
                self.delete_record(&args[0], &args[1])?;
                Ok(Vec::new())
            }
            "InitLedger" => {
                expect_args(operation, args, 0)?;
                self.init_ledger()?;
                Ok(Vec::new())
            }
            other => Err(ContractError::UnknownOperation(other.to_string())),
        }
    }
}

fn decode_payload<R: LedgerRecord>(payload: &str) -> ContractResult<R> {
    serde_json::from_str(payload)
        .map_err(|err| ContractError::Store(StoreError::Deserialization(err)))
}

fn encode_response<T: Serialize>(value: &T) -> ContractResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|err| ContractError::Store(StoreError::Serialization(err)))
}

fn ensure_not_empty(value: &str, name: &'static str) -> ContractResult<()> {
    if value.is_empty() {
        return Err(ContractError::EmptyArgument(name));
    }
    Ok(())
}

fn expect_args(operation: &str, args: &[String], expected: usize) -> ContractResult<()> {
    if args.len() != expected {
        return Err(ContractError::WrongArgumentCount {
            operation: operation.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}
