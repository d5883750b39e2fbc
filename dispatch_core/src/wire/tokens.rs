use crate::error::Error;
use std::fmt;

/// The closed alphabet of control-message tokens exchanged across all four
/// wire sub-protocols (REG, SUB, UTIL, EXEC).
///
/// Representing these as a tagged enum instead of raw strings means a
/// handler can never mistake a `{FAILED_*}` reply for a `{SUCCESSFULLY_*}`
/// one by a typo in a string comparison (spec §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    SuccessfullyAddedSlave(u32),
    FailedToAddSlave(u32),
    SuccessfullyReceivedJobRequest,
    FailedToReceiveJobRequest,
    SuccessfullyReceivedBuffer,
    FailedToReceiveBuffer,
    RequestJobOutput,
    SuccessfullyReceivedJobOutput,
    FailedToReceiveJobOutput,
    SuccessfullyUpdatedCpuUtilization,
    FailedToUpdateCpuUtilization,
}

impl Token {
    /// Renders this token to its exact wire representation.
    pub fn to_wire(&self) -> String {
        match self {
            Token::SuccessfullyAddedSlave(id) => {
                format!("{{SUCCESSFULLY_ADDED_SLAVE}} {}", id)
            }
            Token::FailedToAddSlave(id) => {
                format!("{{FAILED_TO_ADD_SLAVE}} {}", id)
            }
            Token::SuccessfullyReceivedJobRequest => {
                "{SUCCESSFULLY_RECEIVED_JOB_REQUEST}".to_string()
            }
            Token::FailedToReceiveJobRequest => {
                "{FAILED_TO_RECEIVE_JOB_REQUEST}".to_string()
            }
            Token::SuccessfullyReceivedBuffer => {
                "{SUCCESSFULLY_RECEIVED_BUFFER}".to_string()
            }
            Token::FailedToReceiveBuffer => {
                "{FAILED_TO_RECEIVE_BUFFER}".to_string()
            }
            Token::RequestJobOutput => "{REQUEST_JOB_OUTPUT}".to_string(),
            Token::SuccessfullyReceivedJobOutput => {
                "{SUCCESSFULLY_RECEIVED_JOB_OUTPUT}".to_string()
            }
            Token::FailedToReceiveJobOutput => {
                "{FAILED_TO_RECEIVE_JOB_OUTPUT}".to_string()
            }
            Token::SuccessfullyUpdatedCpuUtilization => {
                "{SUCCESSFULLY_UPDATED_CPU_UTILIZATION}".to_string()
            }
            Token::FailedToUpdateCpuUtilization => {
                "{FAILED_TO_UPDATE_CPU_UTILIZATION}".to_string()
            }
        }
    }

    /// Parses a trimmed frame (already stripped of trailing NULs) into a
    /// token. The first word (up to the first space) identifies the token;
    /// tokens that carry an id parse the remainder as a decimal integer.
    pub fn parse(text: &str) -> Result<Token, Error> {
        let text = text.trim();
        let (head, rest) = match text.find(' ') {
            Some(idx) => (&text[..idx], text[idx + 1..].trim()),
            None => (text, ""),
        };

        match head {
            "{SUCCESSFULLY_ADDED_SLAVE}" => rest
                .parse::<u32>()
                .map(Token::SuccessfullyAddedSlave)
                .map_err(|_| {
                    Error::Protocol(format!("malformed slave id in {:?}", text))
                }),
            "{FAILED_TO_ADD_SLAVE}" => rest
                .parse::<u32>()
                .map(Token::FailedToAddSlave)
                .map_err(|_| {
                    Error::Protocol(format!("malformed slave id in {:?}", text))
                }),
            "{SUCCESSFULLY_RECEIVED_JOB_REQUEST}" => {
                Ok(Token::SuccessfullyReceivedJobRequest)
            }
            "{FAILED_TO_RECEIVE_JOB_REQUEST}" => {
                Ok(Token::FailedToReceiveJobRequest)
            }
            "{SUCCESSFULLY_RECEIVED_BUFFER}" => {
                Ok(Token::SuccessfullyReceivedBuffer)
            }
            "{FAILED_TO_RECEIVE_BUFFER}" => Ok(Token::FailedToReceiveBuffer),
            "{REQUEST_JOB_OUTPUT}" => Ok(Token::RequestJobOutput),
            "{SUCCESSFULLY_RECEIVED_JOB_OUTPUT}" => {
                Ok(Token::SuccessfullyReceivedJobOutput)
            }
            "{FAILED_TO_RECEIVE_JOB_OUTPUT}" => {
                Ok(Token::FailedToReceiveJobOutput)
            }
            "{SUCCESSFULLY_UPDATED_CPU_UTILIZATION}" => {
                Ok(Token::SuccessfullyUpdatedCpuUtilization)
            }
            "{FAILED_TO_UPDATE_CPU_UTILIZATION}" => {
                Ok(Token::FailedToUpdateCpuUtilization)
            }
            other => Err(Error::Protocol(format!("unknown token: {:?}", other))),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_simple_tokens() {
        for token in [
            Token::SuccessfullyReceivedJobRequest,
            Token::FailedToReceiveJobRequest,
            Token::SuccessfullyReceivedBuffer,
            Token::FailedToReceiveBuffer,
            Token::RequestJobOutput,
            Token::SuccessfullyReceivedJobOutput,
            Token::FailedToReceiveJobOutput,
            Token::SuccessfullyUpdatedCpuUtilization,
            Token::FailedToUpdateCpuUtilization,
        ] {
            let wire = token.to_wire();
            assert_eq!(Token::parse(&wire).unwrap(), token);
        }
    }

    #[test]
    fn round_trips_id_carrying_tokens() {
        let added = Token::SuccessfullyAddedSlave(7);
        assert_eq!(Token::parse(&added.to_wire()).unwrap(), added);

        let failed = Token::FailedToAddSlave(0);
        assert_eq!(Token::parse(&failed.to_wire()).unwrap(), failed);
    }

    #[test]
    fn rejects_unknown_token() {
        assert!(Token::parse("{NOT_A_REAL_TOKEN}").is_err());
    }

    #[test]
    fn tolerates_trailing_whitespace() {
        assert_eq!(
            Token::parse("{REQUEST_JOB_OUTPUT}   ").unwrap(),
            Token::RequestJobOutput
        );
    }
}
