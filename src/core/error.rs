use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclError {
    #[error("Cycle detected: adding '{child}' under '{parent}' would make '{parent}' its own descendant")]
    CycleDetected { parent: String, child: String },

    #[error("Access denied: '{subject}' may not '{action}' on '{object}'")]
    AccessDenied {
        subject: String,
        object: String,
        action: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AclError>;
