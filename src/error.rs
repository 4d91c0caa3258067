use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FloorCutError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("syntax error at '{fragment}': {message}")]
    Syntax { fragment: String, message: String },

    #[error("no relational operator in '{0}', expected one of <=, >=, ==")]
    Operator(String),

    #[error("invalid objective direction '{0}', expected max or min")]
    InvalidDirection(String),

    #[error("invalid variable name: '{0}'")]
    InvalidVariableName(String),

    #[error("variable names must be unique, {0} was added twice")]
    DuplicateVariable(String),

    #[error("the objective has already been set")]
    ObjectiveAlreadySet,

    #[error("constraint label {0} is already used")]
    DuplicateLabel(String),

    #[error("incomplete model: {0}")]
    IncompleteModel(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("relaxation is infeasible{}", .reason.as_ref().map(|r| format!(" ({})", r)).unwrap_or_default())]
    Infeasible { reason: Option<String> },

    #[error("relaxation is unbounded")]
    Unbounded,

    #[error("stalled after {iterations} iterations, no fractional variable could be cut")]
    Stalled { iterations: u64 },

    #[error("no integer solution found within {iterations} iterations")]
    IterationLimit { iterations: u64 },

    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl FloorCutError {
    pub fn syntax(fragment: &str, message: &str) -> Self {
        Self::Syntax {
            fragment: fragment.to_string(),
            message: message.to_string(),
        }
    }
}

pub type FloorCutResult<T> = Result<T, FloorCutError>;
