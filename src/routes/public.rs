use std::collections::BTreeMap;

use actix_web::{web, HttpResponse, Result};
use chrono::Local;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{AvailabilityRow, ServiceRow},
    slots,
    state::AppState,
    store::{NewApplication, NewAppointment},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceView {
    id: String,
    names: BTreeMap<String, String>,
    price: f64,
    duration_min: i64,
}

impl From<ServiceRow> for ServiceView {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id.clone(),
            names: row.name_map(),
            price: row.price,
            duration_min: row.duration_min,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityView {
    barber: String,
    date: String,
    is_off: bool,
    closed_hours: Vec<String>,
}

impl From<AvailabilityRow> for AvailabilityView {
    fn from(row: AvailabilityRow) -> Self {
        Self {
            closed_hours: row.closed_slots(),
            barber: row.barber,
            date: row.date,
            is_off: row.is_off,
        }
    }
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    barber: Option<String>,
    date: Option<String>,
}

#[derive(Deserialize)]
struct SlotsQuery {
    date: String,
    barber: Option<String>,
}

#[derive(Deserialize)]
struct AppointmentsQuery {
    phone: Option<String>,
}

/// Booking submission. Services arrive as a list or as one pre-joined
/// string, the total as a number or numeric string; an attempted status is
/// simply dropped on the floor.
#[derive(Deserialize)]
struct AppointmentInput {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    date: String,
    time: String,
    services: ServicesField,
    #[serde(default, deserialize_with = "lenient_number")]
    total: f64,
    #[serde(rename = "barberId")]
    barber_id: Option<String>,
    barber: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServicesField {
    List(Vec<String>),
    Joined(String),
}

impl ServicesField {
    fn into_vec(self) -> Vec<String> {
        match self {
            ServicesField::List(list) => list,
            ServicesField::Joined(joined) => joined
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[derive(Deserialize)]
struct ApplicationInput {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    #[serde(default)]
    message: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/services").route(web::get().to(list_services)))
        .service(web::resource("/barbers").route(web::get().to(list_barbers)))
        .service(web::resource("/availability").route(web::get().to(get_availability)))
        .service(web::resource("/slots").route(web::get().to(get_slots)))
        .service(
            web::resource("/appointments")
                .route(web::get().to(list_appointments))
                .route(web::post().to(create_appointment)),
        )
        .service(web::resource("/applications").route(web::post().to(create_application)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let services = state.catalog.services().await?;
    let views: Vec<ServiceView> = services.into_iter().map(ServiceView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

async fn list_barbers(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let barbers = state.catalog.barbers().await?;
    Ok(HttpResponse::Ok().json(barbers))
}

/// Availability reads degrade to "no restrictions" when the store is
/// unreachable; a customer can always keep booking.
async fn get_availability(
    state: web::Data<AppState>,
    query: web::Query<AvailabilityQuery>,
) -> HttpResponse {
    let records = state
        .availability
        .get(non_empty(&query.barber), non_empty(&query.date))
        .await
        .unwrap_or_else(|err| {
            log::warn!("Availability read failed, returning no restrictions: {err}");
            Vec::new()
        });
    let views: Vec<AvailabilityView> = records.into_iter().map(AvailabilityView::from).collect();
    HttpResponse::Ok().json(views)
}

/// Bookable slots for a date, per barber when one is named, otherwise for
/// any barber on the books.
async fn get_slots(
    state: web::Data<AppState>,
    query: web::Query<SlotsQuery>,
) -> Result<HttpResponse, ApiError> {
    let date = normalize_date(&query.date)?;
    let records = state
        .availability
        .get(None, Some(&date))
        .await
        .unwrap_or_default();
    let now = Local::now().naive_local();

    let slots = match non_empty(&query.barber) {
        Some(barber) => slots::available_slots(&date, barber, &records, now),
        None => {
            let names: Vec<String> = state
                .catalog
                .barbers()
                .await
                .unwrap_or_default()
                .into_iter()
                .map(|barber| barber.display_name)
                .collect();
            slots::union_slots(&date, &names, &records, now)
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({ "date": date, "slots": slots })))
}

async fn list_appointments(
    state: web::Data<AppState>,
    query: web::Query<AppointmentsQuery>,
) -> Result<HttpResponse, ApiError> {
    let rows = state.appointments.list(non_empty(&query.phone)).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn create_appointment(
    state: web::Data<AppState>,
    payload: web::Json<AppointmentInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let date = normalize_date(&input.date)?;

    let row = state
        .appointments
        .create(NewAppointment {
            name: input.name,
            email: input.email,
            phone: input.phone,
            date,
            time: input.time,
            services: input.services.into_vec(),
            total: input.total,
            barber_id: input.barber_id,
            barber: input.barber,
        })
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

async fn create_application(
    state: web::Data<AppState>,
    payload: web::Json<ApplicationInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let row = state
        .applications
        .create(NewApplication {
            name: input.name,
            email: input.email,
            phone: input.phone,
            message: input.message,
        })
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

/// Dates are keys; reject anything unparseable and re-emit zero-padded
/// local date parts so lookups never drift by formatting.
pub(crate) fn normalize_date(date: &str) -> Result<String, ApiError> {
    slots::parse_date(date.trim())
        .map(slots::date_key)
        .ok_or_else(|| ApiError::validation("Please pick a valid date."))
}

/// `?barber=` arrives as an empty string; treat it as "no filter".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
