use thiserror::Error;

pub type GuardResult<T> = Result<T, GuardError>;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown view type '{value}'. Expected one of: list, form_create, form_edit, form_view")]
    UnknownViewType { value: String },

    #[error("Unknown condition operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("Malformed condition rule: {reason}")]
    MalformedRule { reason: String },

    #[error("No active template for entity '{entity}' in view '{view}'")]
    TemplateNotFound { entity: String, view: String },
}
