use exitpass_db::DbError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    #[diagnostic(code(exitpass::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(
        code(exitpass::config),
        help("check the config file and EXITPASS__* environment variables")
    )]
    Config(#[from] config::ConfigError),

    #[error("Database connection error: {0}")]
    #[diagnostic(code(exitpass::db))]
    Db(#[from] surrealdb::Error),

    #[error("Database setup error: {0}")]
    #[diagnostic(code(exitpass::migration))]
    Migration(#[from] DbError),

    #[error("Invalid listen address {addr}: {reason}")]
    #[diagnostic(code(exitpass::addr))]
    Addr { addr: String, reason: String },
}
