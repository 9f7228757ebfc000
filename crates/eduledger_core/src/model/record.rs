//! Record kinds, wire shapes and validation.
//!
//! # Responsibility
//! - Define the three record kinds and their fixed JSON field names.
//! - Provide the composite-key scheme used for every ledger lookup.
//! - Validate required fields before any write reaches the ledger.
//!
//! # Invariants
//! - `docType` on a persisted record always equals `RecordKind::name()`; the
//!   store stamps it and never trusts caller input.
//! - Composite keys are prefix-disjoint across kinds because kind names are
//!   distinct and contain no `-` separator.
//! - Identifiers are opaque: no trimming, no case folding, no normalization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wire name of the discriminator field on every record.
pub const DOC_TYPE_FIELD: &str = "docType";

/// Wire name of the owner field shared by all three kinds.
pub const OWNER_FIELD: &str = "User_ID";

/// Closed set of record kinds handled by the store.
///
/// Keeping this an enum (rather than a string) makes an unsupported kind
/// impossible past the operation surface; only the string-typed
/// `DeleteRecord` argument ever needs [`RecordKind::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Graded evaluation issued to a user.
    Evaluation,
    /// Raw test outcome for one paper.
    TestResult,
    /// User-filed judgement about another record.
    Judgement,
}

impl RecordKind {
    /// Stable kind name used as discriminator value and key prefix.
    pub fn name(self) -> &'static str {
        match self {
            Self::Evaluation => "Evaluation",
            Self::TestResult => "TestResult",
            Self::Judgement => "Judgement",
        }
    }

    /// Parses one canonical kind name.
    ///
    /// Returns `None` for anything but the exact names; callers at the
    /// string boundary map that to their unsupported-kind error.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Evaluation" => Some(Self::Evaluation),
            "TestResult" => Some(Self::TestResult),
            "Judgement" => Some(Self::Judgement),
            _ => None,
        }
    }

    /// Builds the ledger lookup key `"<KindName>-<id>"`.
    ///
    /// Deterministic and injective per kind; the identifier is used verbatim.
    pub fn composite_key(self, id: &str) -> String {
        format!("{}-{id}", self.name())
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Validation errors for record payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Identifier field is empty.
    MissingIdentifier(RecordKind),
    /// Owner field is empty.
    MissingOwner(RecordKind),
    /// Update payload carries an identifier other than the target's.
    IdentifierMismatch {
        kind: RecordKind,
        expected: String,
        found: String,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier(kind) => {
                write!(f, "{kind} identifier must not be empty")
            }
            Self::MissingOwner(kind) => {
                write!(f, "{kind} owner ({OWNER_FIELD}) must not be empty")
            }
            Self::IdentifierMismatch {
                kind,
                expected,
                found,
            } => write!(
                f,
                "{kind} identifier is immutable: target is `{expected}`, payload carries `{found}`"
            ),
        }
    }
}

impl Error for RecordValidationError {}

/// Contract every persisted record type fulfills.
///
/// The constant kind plus the field accessors are all the store needs to
/// validate, key and stamp a record without knowing its concrete shape.
pub trait LedgerRecord: Serialize + DeserializeOwned + Clone {
    /// Kind this record type belongs to.
    const KIND: RecordKind;

    /// Identifier unique within the kind's namespace.
    fn record_id(&self) -> &str;

    /// Owner the record is scoped to.
    fn owner_id(&self) -> &str;

    /// Current discriminator value (may be caller-supplied garbage until the
    /// store stamps it).
    fn doc_type(&self) -> &str;

    /// Mutable discriminator access for stamping.
    fn doc_type_mut(&mut self) -> &mut String;

    /// Rejects records whose identifier or owner field is empty.
    ///
    /// No other field is required to be non-empty.
    fn validate(&self) -> Result<(), RecordValidationError> {
        if self.record_id().is_empty() {
            return Err(RecordValidationError::MissingIdentifier(Self::KIND));
        }
        if self.owner_id().is_empty() {
            return Err(RecordValidationError::MissingOwner(Self::KIND));
        }
        Ok(())
    }

    /// Returns the record with `docType` forced to the canonical kind name,
    /// overriding whatever the caller supplied.
    fn with_discriminator(mut self) -> Self {
        *self.doc_type_mut() = Self::KIND.name().to_string();
        self
    }

    /// Ledger key for this record.
    fn composite_key(&self) -> String {
        Self::KIND.composite_key(self.record_id())
    }
}

/// Graded evaluation record.
///
/// Wire shape: `docType`, `Evaluation_ID`, `User_ID`, `Points_Degree`,
/// `Feedback`. Absent fields decode to the empty string; unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Discriminator; stamped by the store.
    #[serde(rename = "docType", default)]
    pub doc_type: String,
    /// Unique evaluation identifier.
    #[serde(rename = "Evaluation_ID", default)]
    pub evaluation_id: String,
    /// Owner user.
    #[serde(rename = "User_ID", default)]
    pub user_id: String,
    /// Grade level, e.g. `"A"` or `"B+"`.
    #[serde(rename = "Points_Degree", default)]
    pub points_degree: String,
    /// Free-form feedback text.
    #[serde(rename = "Feedback", default)]
    pub feedback: String,
}

impl Evaluation {
    /// Creates an evaluation with an unstamped discriminator.
    pub fn new(
        evaluation_id: impl Into<String>,
        user_id: impl Into<String>,
        points_degree: impl Into<String>,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: String::new(),
            evaluation_id: evaluation_id.into(),
            user_id: user_id.into(),
            points_degree: points_degree.into(),
            feedback: feedback.into(),
        }
    }
}

impl LedgerRecord for Evaluation {
    const KIND: RecordKind = RecordKind::Evaluation;

    fn record_id(&self) -> &str {
        &self.evaluation_id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }

    fn doc_type_mut(&mut self) -> &mut String {
        &mut self.doc_type
    }
}

/// Test outcome record.
///
/// Wire shape: `docType`, `Test_ID`, `User_ID`, `Score_Sum`, `Paper_Number`,
/// `Answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Discriminator; stamped by the store.
    #[serde(rename = "docType", default)]
    pub doc_type: String,
    /// Unique test identifier.
    #[serde(rename = "Test_ID", default)]
    pub test_id: String,
    /// Owner user.
    #[serde(rename = "User_ID", default)]
    pub user_id: String,
    /// Total score, kept as text exactly as submitted.
    #[serde(rename = "Score_Sum", default)]
    pub score_sum: String,
    /// Paper the result belongs to.
    #[serde(rename = "Paper_Number", default)]
    pub paper_number: String,
    /// Submitted answer content.
    #[serde(rename = "Answer", default)]
    pub answer: String,
}

impl TestResult {
    /// Creates a test result with an unstamped discriminator.
    pub fn new(
        test_id: impl Into<String>,
        user_id: impl Into<String>,
        score_sum: impl Into<String>,
        paper_number: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: String::new(),
            test_id: test_id.into(),
            user_id: user_id.into(),
            score_sum: score_sum.into(),
            paper_number: paper_number.into(),
            answer: answer.into(),
        }
    }
}

impl LedgerRecord for TestResult {
    const KIND: RecordKind = RecordKind::TestResult;

    fn record_id(&self) -> &str {
        &self.test_id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }

    fn doc_type_mut(&mut self) -> &mut String {
        &mut self.doc_type
    }
}

/// Judgement filed by a user about another record.
///
/// Wire shape: `docType`, `Judgement_ID`, `User_ID`, `Judgement_Objection`,
/// `Judgement_ObjectID`, `Judgement_Rating`, `Judgement_Content`,
/// `Judgement_Time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    /// Discriminator; stamped by the store.
    #[serde(rename = "docType", default)]
    pub doc_type: String,
    /// Unique judgement identifier.
    #[serde(rename = "Judgement_ID", default)]
    pub judgement_id: String,
    /// Owner user.
    #[serde(rename = "User_ID", default)]
    pub user_id: String,
    /// Objection text, if any.
    #[serde(rename = "Judgement_Objection", default)]
    pub judgement_objection: String,
    /// Identifier of the record being judged.
    #[serde(rename = "Judgement_ObjectID", default)]
    pub judgement_object_id: String,
    /// Rating value, kept as text.
    #[serde(rename = "Judgement_Rating", default)]
    pub judgement_rating: String,
    /// Judgement body.
    #[serde(rename = "Judgement_Content", default)]
    pub judgement_content: String,
    /// Timestamp as an opaque string (RFC 3339 in seeded data).
    #[serde(rename = "Judgement_Time", default)]
    pub judgement_time: String,
}

impl Judgement {
    /// Creates a judgement with an unstamped discriminator.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        judgement_id: impl Into<String>,
        user_id: impl Into<String>,
        judgement_objection: impl Into<String>,
        judgement_object_id: impl Into<String>,
        judgement_rating: impl Into<String>,
        judgement_content: impl Into<String>,
        judgement_time: impl Into<String>,
    ) -> Self {
        Self {
            doc_type: String::new(),
            judgement_id: judgement_id.into(),
            user_id: user_id.into(),
            judgement_objection: judgement_objection.into(),
            judgement_object_id: judgement_object_id.into(),
            judgement_rating: judgement_rating.into(),
            judgement_content: judgement_content.into(),
            judgement_time: judgement_time.into(),
        }
    }
}

impl LedgerRecord for Judgement {
    const KIND: RecordKind = RecordKind::Judgement;

    fn record_id(&self) -> &str {
        &self.judgement_id
    }

    fn owner_id(&self) -> &str {
        &self.user_id
    }

    fn doc_type(&self) -> &str {
        &self.doc_type
    }

    fn doc_type_mut(&mut self) -> &mut String {
        &mut self.doc_type
    }
}

#[cfg(test)]
mod tests {
    use super::{LedgerRecord, RecordKind, RecordValidationError, TestResult};

    #[test]
    fn kind_names_roundtrip_through_parse() {
        for kind in [
            RecordKind::Evaluation,
            RecordKind::TestResult,
            RecordKind::Judgement,
        ] {
            assert_eq!(RecordKind::parse(kind.name()), Some(kind));
        }
    }

    #[test]
    fn parse_rejects_unknown_and_non_canonical_names() {
        assert_eq!(RecordKind::parse("Homework"), None);
        assert_eq!(RecordKind::parse("evaluation"), None);
        assert_eq!(RecordKind::parse(""), None);
        assert_eq!(RecordKind::parse(" Evaluation"), None);
    }

    #[test]
    fn composite_key_uses_identifier_verbatim() {
        assert_eq!(
            RecordKind::Evaluation.composite_key("eval_001"),
            "Evaluation-eval_001"
        );
        assert_eq!(RecordKind::TestResult.composite_key(""), "TestResult-");
        assert_eq!(
            RecordKind::Judgement.composite_key("a-b-c"),
            "Judgement-a-b-c"
        );
    }

    #[test]
    fn validate_requires_identifier_and_owner() {
        let ok = TestResult::new("test_9", "user_9", "70", "P-1", "");
        assert!(ok.validate().is_ok());

        let no_id = TestResult::new("", "user_9", "70", "P-1", "");
        assert!(matches!(
            no_id.validate(),
            Err(RecordValidationError::MissingIdentifier(
                RecordKind::TestResult
            ))
        ));

        let no_owner = TestResult::new("test_9", "", "70", "P-1", "");
        assert!(matches!(
            no_owner.validate(),
            Err(RecordValidationError::MissingOwner(RecordKind::TestResult))
        ));
    }

    #[test]
    fn with_discriminator_overrides_caller_value() {
        let mut record = TestResult::new("test_9", "user_9", "70", "P-1", "x");
        record.doc_type = "Forged".to_string();
        let stamped = record.with_discriminator();
        assert_eq!(stamped.doc_type, "TestResult");
    }
}