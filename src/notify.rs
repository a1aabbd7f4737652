//! Outbound message composition for confirmed appointments. Delivery is an
//! external collaborator's job; this module only fills the template and
//! hands the text back.

use crate::models::AppointmentRow;

/// Default confirmation template. Placeholders match the appointment fields
/// the admin surface exposes.
pub const CONFIRMATION_TEMPLATE: &str = "Hi {name}, your appointment at Fadehaus on {date} at {time} with {barber} is confirmed. Total: {total} EUR. See you soon!";

pub fn compose(template: &str, appointment: &AppointmentRow) -> String {
    template
        .replace("{name}", &appointment.client_name)
        .replace("{date}", &appointment.date)
        .replace("{time}", &appointment.time)
        .replace("{barber}", &appointment.barber)
        .replace("{services}", &appointment.services)
        .replace("{total}", &format!("{:.2}", appointment.total))
}
