//! The multi-step booking flow: service selection, date and time, barber,
//! contact details, submission. One instance drives one customer session;
//! moving backwards never discards what was entered further along.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::{
    error::ApiError,
    models::{AvailabilityRow, BarberRow, ServiceRow, ANY_BARBER},
    slots,
    store::{AppointmentStore, NewAppointment},
    validate,
};

/// Surcharge applied when the customer insists on a specific barber.
pub const BARBER_SURCHARGE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BookingStep {
    ServiceSelection,
    DateTime,
    BarberSelection,
    ContactInfo,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarberChoice {
    /// "No preference"; stored as the literal "Any".
    NoPreference,
    /// A specific barber, by id.
    Barber(String),
}

#[derive(Debug, Clone, Default)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub calling_code: String,
}

#[derive(Debug, Error)]
pub enum FlowError {
    /// A transition guard failed; the step does not advance.
    #[error("{0}")]
    Incomplete(&'static str),

    #[error("{0}")]
    Validation(String),

    /// The appointment store rejected the submission; the flow stays in
    /// ContactInfo so the customer can retry.
    #[error("Your booking could not be submitted. Please try again.")]
    Submit(#[source] ApiError),
}

pub struct BookingFlow {
    step: BookingStep,
    language: String,
    catalog: Vec<ServiceRow>,
    barbers: Vec<BarberRow>,
    selected_services: Vec<String>,
    date: Option<String>,
    time: Option<String>,
    availability: Vec<AvailabilityRow>,
    barber: Option<BarberChoice>,
    contact: ContactDetails,
}

impl BookingFlow {
    pub fn new(catalog: Vec<ServiceRow>, barbers: Vec<BarberRow>, language: &str) -> Self {
        Self {
            step: BookingStep::ServiceSelection,
            language: language.to_string(),
            catalog,
            barbers,
            selected_services: Vec::new(),
            date: None,
            time: None,
            availability: Vec::new(),
            barber: None,
            contact: ContactDetails::default(),
        }
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn selected_services(&self) -> &[String] {
        &self.selected_services
    }

    pub fn toggle_service(&mut self, service_id: &str) {
        if let Some(pos) = self.selected_services.iter().position(|id| id == service_id) {
            self.selected_services.remove(pos);
        } else if self.catalog.iter().any(|s| s.id == service_id) {
            self.selected_services.push(service_id.to_string());
        }
    }

    /// Pick a date. The caller hands over the fresh availability fetch for
    /// that date across all barbers; a previously chosen time or barber that
    /// the new date invalidates is cleared and must be re-chosen.
    pub fn set_date(&mut self, date: &str, availability: Vec<AvailabilityRow>, now: NaiveDateTime) {
        self.date = Some(date.to_string());
        self.availability = availability;

        if let Some(time) = self.time.clone() {
            if !self.selectable_slots(now).contains(&time) {
                self.time = None;
            }
        }
        if let Some(BarberChoice::Barber(id)) = self.barber.clone() {
            let off = self.off_barbers();
            let gone = self
                .barber_name(&id)
                .map(|name| off.contains(&name))
                .unwrap_or(true);
            if gone {
                self.barber = None;
            }
        }
    }

    pub fn set_time(&mut self, time: &str) {
        self.time = Some(time.to_string());
    }

    /// Slots offered at the date/time step, before a barber is chosen.
    pub fn selectable_slots(&self, now: NaiveDateTime) -> Vec<String> {
        let Some(date) = self.date.as_deref() else {
            return Vec::new();
        };
        let names: Vec<String> = self
            .barbers
            .iter()
            .map(|barber| barber.display_name.clone())
            .collect();
        slots::union_slots(date, &names, &self.availability, now)
    }

    pub fn off_barbers(&self) -> HashSet<String> {
        match self.date.as_deref() {
            Some(date) => slots::off_barbers(date, &self.availability),
            None => HashSet::new(),
        }
    }

    /// Barbers offered for selection on the chosen date.
    pub fn selectable_barbers(&self) -> Vec<&BarberRow> {
        let off = self.off_barbers();
        self.barbers
            .iter()
            .filter(|barber| !off.contains(&barber.display_name))
            .collect()
    }

    pub fn choose_barber(&mut self, choice: BarberChoice) -> Result<(), FlowError> {
        if let BarberChoice::Barber(id) = &choice {
            let name = self
                .barber_name(id)
                .ok_or(FlowError::Incomplete("Unknown barber."))?;
            if self.off_barbers().contains(&name) {
                return Err(FlowError::Validation(format!(
                    "{name} is not available on the selected date."
                )));
            }
        }
        self.barber = Some(choice);
        Ok(())
    }

    pub fn set_contact(&mut self, contact: ContactDetails) {
        self.contact = contact;
    }

    /// Running total, derived from the current selections on every call.
    pub fn total(&self) -> f64 {
        let services: f64 = self
            .catalog
            .iter()
            .filter(|service| self.selected_services.contains(&service.id))
            .map(|service| service.price)
            .sum();
        let surcharge = match self.barber {
            Some(BarberChoice::Barber(_)) => BARBER_SURCHARGE,
            _ => 0.0,
        };
        services + surcharge
    }

    /// Forward transition guards. ContactInfo advances through `submit`.
    pub fn advance(&mut self, now: NaiveDateTime) -> Result<BookingStep, FlowError> {
        let next = match self.step {
            BookingStep::ServiceSelection => {
                if self.selected_services.is_empty() {
                    return Err(FlowError::Incomplete("Please select at least one service."));
                }
                BookingStep::DateTime
            }
            BookingStep::DateTime => {
                if self.date.is_none() {
                    return Err(FlowError::Incomplete("Please pick a date."));
                }
                let time = self
                    .time
                    .as_ref()
                    .ok_or(FlowError::Incomplete("Please pick a time."))?;
                if !self.selectable_slots(now).contains(time) {
                    return Err(FlowError::Incomplete(
                        "The selected time is no longer available.",
                    ));
                }
                BookingStep::BarberSelection
            }
            BookingStep::BarberSelection => {
                if self.barber.is_none() {
                    return Err(FlowError::Incomplete(
                        "Please choose a barber or no preference.",
                    ));
                }
                BookingStep::ContactInfo
            }
            BookingStep::ContactInfo => {
                return Err(FlowError::Incomplete("Submit the booking to continue."))
            }
            BookingStep::Submitted => return Err(FlowError::Incomplete("Booking already submitted.")),
        };
        self.step = next;
        Ok(next)
    }

    /// Backward navigation to any earlier step; later input stays put.
    pub fn back_to(&mut self, step: BookingStep) -> Result<(), FlowError> {
        if step >= self.step {
            return Err(FlowError::Incomplete("Can only move back to an earlier step."));
        }
        self.step = step;
        Ok(())
    }

    /// The ContactInfo -> Submitted transition: validate contact details,
    /// assemble the payload, and write it through the appointment store.
    pub async fn submit(&mut self, store: &AppointmentStore) -> Result<crate::models::AppointmentRow, FlowError> {
        if self.step != BookingStep::ContactInfo {
            return Err(FlowError::Incomplete("Complete the earlier steps first."));
        }
        let payload = self.build_payload()?;

        match store.create(payload).await {
            Ok(row) => {
                self.step = BookingStep::Submitted;
                Ok(row)
            }
            Err(err) => Err(FlowError::Submit(err)),
        }
    }

    /// Start over for another booking.
    pub fn reset(&mut self) {
        self.step = BookingStep::ServiceSelection;
        self.selected_services.clear();
        self.date = None;
        self.time = None;
        self.availability.clear();
        self.barber = None;
        self.contact = ContactDetails::default();
    }

    fn barber_name(&self, id: &str) -> Option<String> {
        self.barbers
            .iter()
            .find(|barber| barber.id == id)
            .map(|barber| barber.display_name.clone())
    }

    fn build_payload(&self) -> Result<NewAppointment, FlowError> {
        if self.contact.name.trim().is_empty() {
            return Err(FlowError::Validation("Full name is required.".to_string()));
        }
        let phone = validate::normalize_phone(&self.contact.phone, &self.contact.calling_code)
            .map_err(|err| FlowError::Validation(err.to_string()))?;

        let services: Vec<String> = self
            .selected_services
            .iter()
            .filter_map(|id| self.catalog.iter().find(|s| &s.id == id))
            .map(|service| service.display_name(&self.language))
            .collect();
        let (barber_id, barber) = match &self.barber {
            Some(BarberChoice::Barber(id)) => {
                let name = self
                    .barber_name(id)
                    .ok_or(FlowError::Incomplete("Unknown barber."))?;
                (Some(id.clone()), name)
            }
            _ => (None, ANY_BARBER.to_string()),
        };

        Ok(NewAppointment {
            name: self.contact.name.trim().to_string(),
            email: Some(self.contact.email.clone()).filter(|e| !e.trim().is_empty()),
            phone: Some(phone),
            date: self.date.clone().unwrap_or_default(),
            time: self.time.clone().unwrap_or_default(),
            services,
            total: self.total(),
            barber_id,
            barber: Some(barber),
        })
    }
}
