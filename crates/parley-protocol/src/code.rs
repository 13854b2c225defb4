//! Numeric codes carried in `error` envelopes.

use std::fmt;

/// Error codes sent to clients in an [`ErrorPayload`](crate::ErrorPayload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidCredentials,
    NotAuthenticated,
    /// Bad payload shape or a type the server doesn't route.
    InvalidMessage,
    UserNotFound,
    GroupNotFound,
    AccessDenied,
    /// Not a member of the group, or not the recipient of a request.
    NotAuthorized,
    AlreadyExists,
    InvalidRequest,
    Internal,
}

impl ErrorCode {
    /// Returns the numeric wire value.
    pub fn code(self) -> u16 {
        match self {
            ErrorCode::InvalidCredentials => 1000,
            ErrorCode::NotAuthenticated => 1001,
            ErrorCode::InvalidMessage => 1002,
            ErrorCode::UserNotFound => 1003,
            ErrorCode::GroupNotFound => 1004,
            ErrorCode::AccessDenied => 1005,
            ErrorCode::NotAuthorized => 1006,
            ErrorCode::AlreadyExists => 1007,
            ErrorCode::InvalidRequest => 1008,
            ErrorCode::Internal => 1009,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_contiguous_from_1000() {
        let all = [
            ErrorCode::InvalidCredentials,
            ErrorCode::NotAuthenticated,
            ErrorCode::InvalidMessage,
            ErrorCode::UserNotFound,
            ErrorCode::GroupNotFound,
            ErrorCode::AccessDenied,
            ErrorCode::NotAuthorized,
            ErrorCode::AlreadyExists,
            ErrorCode::InvalidRequest,
            ErrorCode::Internal,
        ];
        for (i, code) in all.iter().enumerate() {
            assert_eq!(code.code(), 1000 + i as u16);
        }
    }
}
