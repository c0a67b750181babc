use axum::{
    extract::{rejection::FormRejection, State},
    response::{IntoResponse, Response},
    Form, Json,
};
use grid_client::{
    domain::{CustomerMeter, MeterRecord},
    index::meter_queries::{self, CustomerSuggestion},
};
use serde::{Deserialize, Serialize};

use super::{
    error::{observed, ApiError, Identifier},
    response::{map_link, Sanitized},
    AppState, SharedState,
};

const LOCATION_UNAVAILABLE: &str = "Lokacija brojila nije dostupna.";

#[derive(Debug, Default, Deserialize)]
pub struct CodeForm {
    sifra: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerialForm {
    serijski_broj: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerForm {
    kupac: Option<String>,
    serijski: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerSuggestForm {
    input: Option<String>,
    kupac: Option<String>,
}

#[derive(Debug, Serialize)]
struct MeterResponse<'a> {
    additional_info: &'a MeterRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kupac_brojila: Option<&'a [CustomerMeter]>,
}

/// Digits only, after trimming. Digits that overflow cannot name a record.
fn parse_identifier(raw: Option<&str>, id: Identifier) -> Result<i64, ApiError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::NotSupplied(id));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::WrongType(id));
    }
    raw.parse().map_err(|_| ApiError::NotFound(id))
}

/// A request without a form body carries no identifier; that is reported
/// like an empty field. A body that is not a valid form stays a bad request.
fn form_fields<T: Default>(payload: Result<Form<T>, FormRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Form(form)) => Ok(form),
        Err(FormRejection::InvalidFormContentType(_)) => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

/// Fetches the record for a resolved code and attaches its map link, or a
/// message when the meter has no position.
fn resolved<'a>(state: &'a AppState, code: i64) -> Result<MeterResponse<'a>, ApiError> {
    let hit = meter_queries::meter_by_code(&state.index, code).ok_or(ApiError::NotFound(Identifier::Code))?;
    let url = hit.coordinates.map(|at| map_link(&state.maps.base_url, at));
    Ok(MeterResponse {
        additional_info: hit.record,
        message: url.is_none().then_some(LOCATION_UNAVAILABLE),
        url,
        kupac_brojila: None,
    })
}

#[tracing::instrument(skip(state, payload))]
pub async fn by_code(State(state): State<SharedState>, payload: Result<Form<CodeForm>, FormRejection>) -> Response {
    observed("get_coordinates", lookup_by_code(&state, payload)).into_response()
}

fn lookup_by_code(state: &AppState, payload: Result<Form<CodeForm>, FormRejection>) -> Result<Response, ApiError> {
    let form = form_fields(payload)?;
    let code = parse_identifier(form.sifra.as_deref(), Identifier::Code)?;
    Ok(Sanitized(resolved(state, code)?).into_response())
}

#[tracing::instrument(skip(state, payload))]
pub async fn by_serial(State(state): State<SharedState>, payload: Result<Form<SerialForm>, FormRejection>) -> Response {
    observed("get_coordinates_by_serial", lookup_by_serial(&state, payload)).into_response()
}

fn lookup_by_serial(state: &AppState, payload: Result<Form<SerialForm>, FormRejection>) -> Result<Response, ApiError> {
    let form = form_fields(payload)?;
    let serial = parse_identifier(form.serijski_broj.as_deref(), Identifier::Serial)?;
    let code = meter_queries::code_for_serial(&state.index, serial).ok_or(ApiError::NotFound(Identifier::Serial))?;
    Ok(Sanitized(resolved(state, code)?).into_response())
}

#[tracing::instrument(skip(state, payload))]
pub async fn suggest_customers(
    State(state): State<SharedState>,
    payload: Result<Form<CustomerSuggestForm>, FormRejection>,
) -> Response {
    observed("suggest_kupac", customer_suggestions(&state, payload)).into_response()
}

fn customer_suggestions(
    state: &AppState,
    payload: Result<Form<CustomerSuggestForm>, FormRejection>,
) -> Result<Json<Vec<CustomerSuggestion>>, ApiError> {
    let Form(form) = payload?;
    let fragment = [form.input, form.kupac]
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default();
    Ok(Json(meter_queries::customer_suggestions(&state.index, &fragment)))
}

#[tracing::instrument(skip(state, payload))]
pub async fn by_customer(
    State(state): State<SharedState>,
    payload: Result<Form<CustomerForm>, FormRejection>,
) -> Response {
    observed("get_coordinates_by_kupac", lookup_by_customer(&state, payload)).into_response()
}

fn lookup_by_customer(state: &AppState, payload: Result<Form<CustomerForm>, FormRejection>) -> Result<Response, ApiError> {
    let Form(form) = payload?;
    let name = form
        .kupac
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::NotSupplied(Identifier::Customer))?;
    let serial = parse_identifier(form.serijski.as_deref(), Identifier::Serial)?;

    let (_, owned) =
        meter_queries::customer_meters(&state.index, name).ok_or(ApiError::NotFound(Identifier::Customer))?;
    let code = meter_queries::code_for_serial(&state.index, serial)
        .filter(|code| owned.iter().any(|m| m.code == *code))
        .ok_or(ApiError::NotFound(Identifier::Serial))?;

    let mut body = resolved(state, code)?;
    body.kupac_brojila = Some(owned);
    Ok(Sanitized(body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_must_be_digits() {
        assert!(matches!(
            parse_identifier(None, Identifier::Code),
            Err(ApiError::NotSupplied(Identifier::Code))
        ));
        assert!(matches!(
            parse_identifier(Some("  "), Identifier::Code),
            Err(ApiError::NotSupplied(_))
        ));
        assert!(matches!(
            parse_identifier(Some("12a"), Identifier::Serial),
            Err(ApiError::WrongType(Identifier::Serial))
        ));
        assert!(matches!(parse_identifier(Some("-5"), Identifier::Code), Err(ApiError::WrongType(_))));
        assert_eq!(parse_identifier(Some(" 1001 "), Identifier::Code).unwrap(), 1001);
    }

    #[test]
    fn overflowing_digits_are_not_found() {
        assert!(matches!(
            parse_identifier(Some("99999999999999999999999"), Identifier::Code),
            Err(ApiError::NotFound(Identifier::Code))
        ));
    }
}
