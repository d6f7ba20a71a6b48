use thiserror::Error;

/// Errors that can occur while parsing fiscal documents, building boletos,
/// or emitting remittance files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReceivablesError {
    /// Input XML did not parse.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// XML root element was neither an NFe nor a CTe.
    #[error("unrecognized document kind: {0}")]
    UnknownKind(String),

    /// A required field was absent from the parsed document.
    #[error("missing required field: {0}")]
    MissingRequired(String),

    /// A CPF/CNPJ failed check-digit verification.
    #[error("invalid tax id: {0}")]
    InvalidTaxId(String),

    /// The bank profile selected for this operation is not active.
    #[error("bank profile disabled: {0}")]
    BankDisabled(String),

    /// A nosso-número counter has reached its configured maximum.
    #[error("nosso-número counter exhausted: {0}")]
    Exhausted(String),

    /// A CNAB emitter could not fit a value into its column without
    /// dropping information.
    #[error("CNAB build error in field {field}: {message}")]
    CnabBuildError { field: String, message: String },

    /// An operation conflicts with the current lifecycle state of an entity
    /// (e.g. cancelling a registered boleto).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),
}

/// A single validation error with field path and message.
///
/// Used wherever a caller needs every problem with an input reported at
/// once rather than failing on the first one (batch CPF/CNPJ checks,
/// multi-field boleto construction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "payer.tax_id").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// Named rule this error violates, if applicable (e.g. "cpf-check-digit").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a named rule.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error naming the rule it violates.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}
