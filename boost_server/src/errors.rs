use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use boost_engine::{CatalogApiError, PromoGatewayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Access token invalid or not provided")]
    CouldNotDeserializeAuthToken,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("This request cannot be fulfilled. {0}")]
    UnprocessableRequest(String),
    #[error("The payment window for this transaction has closed. {0}")]
    PaymentWindowClosed(String),
    #[error("The payment gateway could not process the charge. {0}")]
    PaymentGatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializeAuthToken => StatusCode::UNAUTHORIZED,
            Self::AuthenticationError(e) => match e {
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::BAD_REQUEST,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::UnprocessableRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PaymentWindowClosed(_) => StatusCode::GONE,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

/// Engine errors map onto HTTP statuses here, in one place, so that every route reports the same
/// conditions the same way. Notably: an unknown settlement reference is a 404, an expired payment window
/// is a 410, and validation failures on purchases are 4xx, never 5xx.
impl From<PromoGatewayError> for ServerError {
    fn from(e: PromoGatewayError) -> Self {
        match e {
            PromoGatewayError::TransactionNotFound(_) |
            PromoGatewayError::TransactionIdNotFound(_) |
            PromoGatewayError::PackageNotFound(_) |
            PromoGatewayError::ListingNotFound(_) => Self::NoRecordFound(e.to_string()),
            PromoGatewayError::TransactionExpired(_) => Self::PaymentWindowClosed(e.to_string()),
            PromoGatewayError::TransactionAlreadyFinal(_) => Self::UnprocessableRequest(e.to_string()),
            PromoGatewayError::PackageInactive(_) |
            PromoGatewayError::NoTickerPackage |
            PromoGatewayError::ListingNotApproved(_) |
            PromoGatewayError::UnsupportedAction(_) => Self::UnprocessableRequest(e.to_string()),
            PromoGatewayError::NotListingOwner { .. } => Self::InsufficientPermissions(e.to_string()),
            PromoGatewayError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        Self::BackendError(e.to_string())
    }
}
