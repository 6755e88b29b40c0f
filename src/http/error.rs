use rouille::Response;

use crate::storage::error::StorageError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unauthorized(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TrackNotFound(_)
            | StorageError::AlbumNotFound(_)
            | StorageError::UserNotFound(_) => ApiError::NotFound(err.to_string()),

            StorageError::UsernameTaken(_) => ApiError::Conflict(err.to_string()),

            StorageError::InvalidId(_) | StorageError::MissingField(_) => {
                ApiError::BadRequest(err.to_string())
            }

            StorageError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),

            StorageError::Database(_) | StorageError::Decode(_) | StorageError::Internal(_) => {
                ApiError::Internal("internal server error".into())
            }
        }
    }
}

impl ApiError {
    pub fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => Response::text(msg).with_status_code(404),

            ApiError::BadRequest(msg) => Response::text(msg).with_status_code(400),

            ApiError::Conflict(msg) => Response::text(msg).with_status_code(409),

            ApiError::Unauthorized(msg) => Response::text(msg).with_status_code(401),

            ApiError::Internal(msg) => Response::text(msg).with_status_code(500),
        }
    }
}
