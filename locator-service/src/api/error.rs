use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// The identifier space a request failed to resolve in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    Code,
    Serial,
    Customer,
    Substation,
    Switch,
    OrgUnit,
    SubstationName,
    Document,
}

impl Identifier {
    fn not_supplied(self) -> &'static str {
        match self {
            Identifier::Code => "Šifra nije unesena.",
            Identifier::Serial => "Serijski broj nije unesen.",
            Identifier::Customer => "Kupac nije unesen.",
            Identifier::Substation => "Naziv trafostanice nije unesen.",
            Identifier::Switch => "Šifra ili naziv rastavljača nije unesen.",
            Identifier::OrgUnit => "OJ i OH moraju biti uneseni.",
            Identifier::SubstationName => "Naziv TS nije unesen.",
            Identifier::Document => "Naziv dokumenta nije unesen.",
        }
    }

    fn wrong_type(self) -> &'static str {
        match self {
            Identifier::Code => "Pogrešan tip podatka: šifra mora sadržavati samo cifre.",
            Identifier::Serial => "Pogrešan tip podatka: serijski broj mora sadržavati samo cifre.",
            _ => "Pogrešan tip podatka.",
        }
    }

    fn not_found(self) -> &'static str {
        match self {
            Identifier::Code => "Šifra nije pronađena u bazi.",
            Identifier::Serial => "Serijski broj nije pronađen u bazi.",
            Identifier::Customer => "Kupac nije pronađen u bazi.",
            Identifier::Substation => "Trafostanica nije pronađena.",
            Identifier::Switch => "Rastavljač nije pronađen.",
            Identifier::OrgUnit => "Nema brojila za odabranu OJ i OH.",
            Identifier::SubstationName => "Nema brojila za traženi naziv TS.",
            Identifier::Document => "Dokument nije pronađen.",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{}", .0.not_supplied())]
    NotSupplied(Identifier),
    #[error("{}", .0.wrong_type())]
    WrongType(Identifier),
    #[error("{}", .0.not_found())]
    NotFound(Identifier),
    #[error("Neispravan zahtjev: {0}")]
    BadRequest(String),
    #[error("Interna greška servera.")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            // A missing code or serial is reported like an unknown one.
            ApiError::NotSupplied(Identifier::Code | Identifier::Serial) => StatusCode::NOT_FOUND,
            ApiError::NotSupplied(_) => StatusCode::BAD_REQUEST,
            ApiError::WrongType(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn record(&self, endpoint: &'static str) {
        match self.status() {
            StatusCode::NOT_FOUND => {
                metrics::counter!("locator_not_found_total", "endpoint" => endpoint).increment(1);
            }
            StatusCode::BAD_REQUEST => {
                metrics::counter!("locator_bad_requests_total", "endpoint" => endpoint).increment(1);
            }
            _ => {
                metrics::counter!("locator_internal_errors_total", "endpoint" => endpoint).increment(1);
            }
        }
    }
}

/// Counts a request and its failure, if any, under `endpoint`.
pub(crate) fn observed<T>(endpoint: &'static str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    metrics::counter!("locator_requests_total", "endpoint" => endpoint).increment(1);
    if let Err(e) = &result {
        e.record(endpoint);
    }
    result
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<FormRejection> for ApiError {
    fn from(r: FormRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self {
        ApiError::BadRequest(r.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_code_is_not_found_but_missing_switch_is_bad_request() {
        assert_eq!(ApiError::NotSupplied(Identifier::Code).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotSupplied(Identifier::Switch).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::WrongType(Identifier::Serial).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn messages_name_the_identifier_space() {
        assert_eq!(ApiError::NotFound(Identifier::Code).to_string(), "Šifra nije pronađena u bazi.");
        assert_eq!(ApiError::NotFound(Identifier::Serial).to_string(), "Serijski broj nije pronađen u bazi.");
        assert_eq!(ApiError::Internal("boom".into()).to_string(), "Interna greška servera.");
    }
}
