//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes.

use cmdrelay_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const THROTTLED: i32 = 4003;
    pub const CONFIG_ERROR: i32 = 4004;
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const PERSISTENCE_ERROR: i32 = 5001;
    pub const SYSTEM_ERROR: i32 = 5002;
    pub const REMOTE_ERROR: i32 = 5003;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Config(_) => code::CONFIG_ERROR,
        AppError::Transport(_) | AppError::Authenticity(_) | AppError::Parse(_) => {
            code::REMOTE_ERROR
        }
        AppError::Persistence(_) => code::PERSISTENCE_ERROR,
        AppError::Execution(_) | AppError::Io(_) => code::SYSTEM_ERROR,
        AppError::Serialization(_) => code::VALIDATION_ERROR,
        AppError::Internal(_) => code::INTERNAL_ERROR,
    };
    ErrorObjectOwned::owned(code, err.to_string(), None::<()>)
}

pub fn throttled() -> ErrorObjectOwned {
    ErrorObjectOwned::owned(
        code::THROTTLED,
        "Rate limit exceeded. Please slow down.",
        None::<()>,
    )
}

pub fn invalid_params(message: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code::VALIDATION_ERROR, message.into(), None::<()>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_error_kind() {
        assert_eq!(
            to_rpc_error(AppError::Config("apiKey is required".into())).code(),
            code::CONFIG_ERROR
        );
        assert_eq!(
            to_rpc_error(AppError::Transport("refused".into())).code(),
            code::REMOTE_ERROR
        );
        assert_eq!(
            to_rpc_error(AppError::Persistence("disk full".into())).code(),
            code::PERSISTENCE_ERROR
        );
    }
}
