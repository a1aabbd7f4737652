use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use crate::{
    auth::admin_validator,
    error::ApiError,
    models::{AvailabilityRow, STATUS_APPROVED, STATUS_PENDING},
    notify,
    state::AppState,
    store::{NewBarber, NewService, SetOutcome},
};

use super::public::{non_empty, normalize_date};

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

/// Three-way day write: day off, specific closed hours, or fully working
/// (which deletes the record).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityUpdate {
    barber: String,
    date: String,
    #[serde(default)]
    is_off: bool,
    #[serde(default)]
    closed_hours: ClosedHoursField,
}

/// The availability editor posts closed hours either as a JSON array or as
/// the JSON-encoded string the text column stores.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClosedHoursField {
    List(Vec<String>),
    Encoded(String),
}

impl Default for ClosedHoursField {
    fn default() -> Self {
        ClosedHoursField::List(Vec::new())
    }
}

impl ClosedHoursField {
    fn into_vec(self) -> Vec<String> {
        match self {
            ClosedHoursField::List(list) => list,
            ClosedHoursField::Encoded(text) => serde_json::from_str(&text).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct StatusUpdate {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct DeleteQuery {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceInput {
    names: BTreeMap<String, String>,
    price: f64,
    duration_min: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BarberInput {
    display_name: String,
    #[serde(default)]
    specialty: String,
    #[serde(default)]
    image: String,
}

#[derive(Deserialize)]
struct ApplicationsQuery {
    status: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::basic(admin_validator))
            .service(
                web::resource("/availability")
                    .route(web::get().to(list_availability))
                    .route(web::post().to(set_availability)),
            )
            .service(
                web::resource("/appointments")
                    .route(web::patch().to(update_appointment_status))
                    .route(web::delete().to(delete_appointment)),
            )
            .service(web::resource("/appointments/pending").route(web::get().to(pending_queue)))
            .service(
                web::resource("/appointments/confirmed").route(web::get().to(confirmed_registry)),
            )
            .service(web::resource("/appointments/{id}/approve").route(web::post().to(approve)))
            .service(web::resource("/appointments/{id}/reject").route(web::post().to(reject)))
            .service(
                web::resource("/appointments/{id}/notification")
                    .route(web::get().to(compose_notification)),
            )
            .service(web::resource("/services").route(web::post().to(create_service)))
            .service(web::resource("/services/{id}").route(web::delete().to(delete_service)))
            .service(web::resource("/barbers").route(web::post().to(create_barber)))
            .service(web::resource("/barbers/{id}").route(web::delete().to(delete_barber)))
            .service(
                web::resource("/applications")
                    .route(web::get().to(list_applications))
                    .route(web::patch().to(update_application_status)),
            ),
    );
}

/// Unlike the public read, the editor surfaces store failures; an admin
/// resyncing the grid needs to know the read is stale.
async fn list_availability(
    state: web::Data<AppState>,
    query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, ApiError> {
    let records = state
        .availability
        .get(non_empty(&query.barber), non_empty(&query.date))
        .await?;
    let views: Vec<AvailabilityView> = records.into_iter().map(AvailabilityView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

async fn set_availability(
    state: web::Data<AppState>,
    payload: web::Json<AvailabilityUpdate>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    if input.barber.trim().is_empty() {
        return Err(ApiError::validation("Barber is required."));
    }
    let date = normalize_date(&input.date)?;

    let outcome = state
        .availability
        .set(
            input.barber.trim(),
            &date,
            input.is_off,
            &input.closed_hours.into_vec(),
        )
        .await?;

    Ok(match outcome {
        SetOutcome::Saved(row) => HttpResponse::Ok().json(AvailabilityView::from(row)),
        SetOutcome::Deleted => HttpResponse::Ok().json(json!({ "deleted": true })),
    })
}

async fn pending_queue(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = state.appointments.list_by_status(STATUS_PENDING).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn confirmed_registry(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = state.appointments.list_by_status(STATUS_APPROVED).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn update_appointment_status(
    state: web::Data<AppState>,
    payload: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let row = state
        .appointments
        .update_status(&input.id, &input.status)
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

/// Cancellation. A retry against an already-removed id reports the same
/// end state instead of failing.
async fn delete_appointment(
    state: web::Data<AppState>,
    query: web::Query<DeleteQuery>,
) -> Result<HttpResponse, ApiError> {
    match state.appointments.delete(&query.id).await {
        Ok(()) => {}
        Err(err) if err.is_not_found() => {}
        Err(err) => return Err(err),
    }
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

async fn approve(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let row = state
        .appointments
        .update_status(&path.into_inner(), STATUS_APPROVED)
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

/// Rejection removes the record; there is no stored rejected state for
/// appointments.
async fn reject(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.appointments.delete(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

/// Compose the outbound confirmation text; sending it is somebody else's
/// job.
async fn compose_notification(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let row = state.appointments.find(&path.into_inner()).await?;
    let message = notify::compose(notify::CONFIRMATION_TEMPLATE, &row);
    Ok(HttpResponse::Ok().json(json!({
        "to": row.client_phone,
        "message": message,
    })))
}

async fn create_service(
    state: web::Data<AppState>,
    payload: web::Json<ServiceInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let row = state
        .catalog
        .create_service(NewService {
            names: input.names,
            price: input.price,
            duration_min: input.duration_min,
        })
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "id": row.id,
        "names": row.name_map(),
        "price": row.price,
        "durationMin": row.duration_min,
    })))
}

async fn delete_service(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.catalog.delete_service(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

async fn create_barber(
    state: web::Data<AppState>,
    payload: web::Json<BarberInput>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let row = state
        .catalog
        .create_barber(NewBarber {
            display_name: input.display_name,
            specialty: input.specialty,
            image: input.image,
        })
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

async fn delete_barber(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.catalog.delete_barber(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": true })))
}

async fn list_applications(
    state: web::Data<AppState>,
    query: web::Query<ApplicationsQuery>,
) -> Result<HttpResponse, ApiError> {
    let rows = state.applications.list(non_empty(&query.status)).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn update_application_status(
    state: web::Data<AppState>,
    payload: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let input = payload.into_inner();
    let row = state
        .applications
        .update_status(&input.id, &input.status)
        .await?;
    Ok(HttpResponse::Ok().json(row))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use super::*;
    use crate::{
        auth::AdminAuth,
        db::test_pool,
        store::NewAppointment,
    };

    // "admin:admin"
    const AUTH: (&str, &str) = ("Authorization", "Basic YWRtaW46YWRtaW4=");

    async fn test_state() -> AppState {
        let pool = test_pool().await;
        sqlx::query("INSERT INTO shops (id, name, address, phone) VALUES ('shop-1', 'Fadehaus', '', '')")
            .execute(&pool)
            .await
            .unwrap();
        AppState::new(pool, AdminAuth::new("admin", "admin").unwrap(), false)
    }

    async fn seed_appointment(state: &AppState) -> String {
        state
            .appointments
            .create(NewAppointment {
                name: "Jan Becker".to_string(),
                phone: Some("+491761234567".to_string()),
                date: "2025-06-10".to_string(),
                time: "13:00".to_string(),
                services: vec!["Haircut".to_string()],
                total: 25.0,
                barber: Some("Ahmet".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    macro_rules! admin_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn admin_routes_require_credentials() {
        let state = test_state().await;
        let app = admin_app!(state);

        let req = test::TestRequest::get()
            .uri("/admin/appointments/pending")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/admin/appointments/pending")
            .insert_header(AUTH)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn approve_moves_pending_to_confirmed() {
        let state = test_state().await;
        let id = seed_appointment(&state).await;
        let app = admin_app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/admin/appointments/{id}/approve"))
            .insert_header(AUTH)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "approved");

        let req = test::TestRequest::get()
            .uri("/admin/appointments/pending")
            .insert_header(AUTH)
            .to_request();
        let pending: Value = test::call_and_read_body_json(&app, req).await;
        assert!(pending.as_array().unwrap().is_empty());

        let req = test::TestRequest::get()
            .uri("/admin/appointments/confirmed")
            .insert_header(AUTH)
            .to_request();
        let confirmed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(confirmed.as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn reject_deletes_the_appointment() {
        let state = test_state().await;
        let id = seed_appointment(&state).await;
        let app = admin_app!(state);

        let req = test::TestRequest::post()
            .uri(&format!("/admin/appointments/{id}/reject"))
            .insert_header(AUTH)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert!(state.appointments.find(&id).await.unwrap_err().is_not_found());
    }

    #[actix_web::test]
    async fn delete_is_a_soft_noop_on_missing_ids() {
        let state = test_state().await;
        let app = admin_app!(state);

        let req = test::TestRequest::delete()
            .uri("/admin/appointments?id=not-there")
            .insert_header(AUTH)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["deleted"], true);
    }

    #[actix_web::test]
    async fn fully_working_availability_write_reports_deleted() {
        let state = test_state().await;
        state
            .availability
            .set("Ahmet", "2025-06-10", true, &[])
            .await
            .unwrap();
        let app = admin_app!(state);

        let req = test::TestRequest::post()
            .uri("/admin/availability")
            .insert_header(AUTH)
            .set_json(serde_json::json!({
                "barber": "Ahmet",
                "date": "2025-06-10",
                "isOff": false,
                "closedHours": []
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["deleted"], true);

        let records = state
            .availability
            .get(Some("Ahmet"), Some("2025-06-10"))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[actix_web::test]
    async fn availability_accepts_the_encoded_string_form() {
        let state = test_state().await;
        let app = admin_app!(state);

        let req = test::TestRequest::post()
            .uri("/admin/availability")
            .insert_header(AUTH)
            .set_json(serde_json::json!({
                "barber": "Ahmet",
                "date": "2025-06-10",
                "isOff": false,
                "closedHours": "[\"10:00\",\"14:30\"]"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["closedHours"], serde_json::json!(["10:00", "14:30"]));
    }

    #[actix_web::test]
    async fn notification_text_is_composed_from_the_record() {
        let state = test_state().await;
        let id = seed_appointment(&state).await;
        let app = admin_app!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/admin/appointments/{id}/notification"))
            .insert_header(AUTH)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["to"], "+491761234567");
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("Jan Becker"));
        assert!(message.contains("2025-06-10"));
        assert!(message.contains("Ahmet"));
    }

    #[actix_web::test]
    async fn patch_with_unknown_status_is_rejected() {
        let state = test_state().await;
        let id = seed_appointment(&state).await;
        let app = admin_app!(state);

        let req = test::TestRequest::patch()
            .uri("/admin/appointments")
            .insert_header(AUTH)
            .set_json(serde_json::json!({ "id": id, "status": "rejected" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
