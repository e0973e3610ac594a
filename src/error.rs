use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use awc::error::SendRequestError;
use derivative::Derivative;
use mongodb::error::Error as DatabaseError;
use redis::RedisError;
use serde::{Serialize, Serializer};
use serde_json::Error as JsonError;

#[derive(Debug, Serialize, Derivative)]
#[derivative(PartialEq, Eq)]
#[serde(untagged)]
pub enum Error {
    // 400
    #[serde(serialize_with = "display")]
    InvalidJson(#[derivative(PartialEq = "ignore")] JsonPayloadError),
    #[serde(serialize_with = "display")]
    InvalidQuery(#[derivative(PartialEq = "ignore")] QueryPayloadError),
    MissingRequiredFields {
        missing_fields: Vec<&'static str>,
    },
    UnknownCampaignType {
        campaign_type: String,
    },

    // 404
    PathDoesNotExist,

    // 409
    ConcurrentModificationDetected,

    // 500
    StoreRoundTripMismatch {
        key: String,
    },
    StoreRejectedCommand {
        reason: String,
    },
    #[serde(serialize_with = "display")]
    FailedStoreRequest(#[derivative(PartialEq = "ignore")] SendRequestError),
    #[serde(serialize_with = "display")]
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),
    #[serde(serialize_with = "display")]
    FailedRedisCall(#[derivative(PartialEq = "ignore")] RedisError),
    #[serde(serialize_with = "display")]
    FailedToDecodeStoredValue(#[derivative(PartialEq = "ignore")] JsonError),
    MissingConfiguration {
        variable: &'static str,
    },
    InvalidConfiguration {
        variable: &'static str,
        value: String,
    },
    #[serde(serialize_with = "display")]
    IoError(#[derivative(PartialEq = "ignore")] IoError),
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "E4001000",
            Error::InvalidQuery(_) => "E4001001",
            Error::MissingRequiredFields { .. } => "E4001002",
            Error::UnknownCampaignType { .. } => "E4001003",
            Error::PathDoesNotExist => "E4041000",
            Error::ConcurrentModificationDetected => "E4091000",
            Error::StoreRoundTripMismatch { .. } => "E5001000",
            Error::StoreRejectedCommand { .. } => "E5001001",
            Error::FailedStoreRequest(_) => "E5001002",
            Error::FailedDatabaseCall(_) => "E5001003",
            Error::FailedToDecodeStoredValue(_) => "E5001004",
            Error::MissingConfiguration { .. } => "E5001005",
            Error::InvalidConfiguration { .. } => "E5001006",
            Error::IoError(_) => "E5001007",
            Error::FailedRedisCall(_) => "E5001008",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "The given json could not be parsed",
            Error::InvalidQuery(_) => "The given query could not be parsed",
            Error::MissingRequiredFields { .. } => "Missing required fields",
            Error::UnknownCampaignType { .. } => "The given campaign type is not recognized",
            Error::PathDoesNotExist => "The requested path was not found",
            Error::ConcurrentModificationDetected => {
                "The server detected a concurrent modification"
            }
            Error::StoreRoundTripMismatch { .. } => {
                "The value read back from the store did not match the value written"
            }
            Error::StoreRejectedCommand { .. } => "The key-value store rejected the command",
            Error::FailedStoreRequest(_) => {
                "An error occurred when communicating with the key-value store"
            }
            Error::FailedDatabaseCall(_) => {
                "An error occurred when communicating with the database"
            }
            Error::FailedRedisCall(_) => "An error occurred when communicating with redis",
            Error::FailedToDecodeStoredValue(_) => "The stored campaigns could not be decoded",
            Error::MissingConfiguration { .. } => "A required configuration value is missing",
            Error::InvalidConfiguration { .. } => "A configuration value could not be parsed",
            Error::IoError(_) => "An error occurred during an I/O operation",
        }
    }

    fn has_details(&self) -> bool {
        !matches!(
            self,
            Error::PathDoesNotExist | Error::ConcurrentModificationDetected
        )
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::MissingRequiredFields { .. } => StatusCode::BAD_REQUEST,
            Error::UnknownCampaignType { .. } => StatusCode::BAD_REQUEST,
            Error::PathDoesNotExist => StatusCode::NOT_FOUND,
            Error::ConcurrentModificationDetected => StatusCode::CONFLICT,
            Error::StoreRoundTripMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::StoreRejectedCommand { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedStoreRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedDatabaseCall(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedRedisCall(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedToDecodeStoredValue(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::MissingConfiguration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidConfiguration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct Dummy<'a> {
            error_code: &'static str,
            error: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<&'a Error>,
        }

        HttpResponse::build(self.status_code()).json(&Dummy {
            error_code: self.error_code(),
            error: self.error_message(),
            details: Some(self).filter(|err| err.has_details()),
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<RedisError> for Error {
    fn from(error: RedisError) -> Error {
        Error::FailedRedisCall(error)
    }
}

impl From<SendRequestError> for Error {
    fn from(error: SendRequestError) -> Error {
        Error::FailedStoreRequest(error)
    }
}

impl From<JsonError> for Error {
    fn from(error: JsonError) -> Error {
        Error::FailedToDecodeStoredValue(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidJson(err) => Some(err),
            Error::InvalidQuery(err) => Some(err),
            Error::FailedStoreRequest(err) => Some(err),
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedRedisCall(err) => Some(err),
            Error::FailedToDecodeStoredValue(err) => Some(err),
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
