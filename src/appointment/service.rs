use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::AppointmentModel,
    repository::AppointmentRepository,
    types::{AppointmentResponse, BookAppointmentRequest, UpdateAppointmentRequest},
};
use crate::doctor::repository::DoctorRepository;
use crate::patient::repository::PatientRepository;
use crate::schedule::{ensure_bookable, ensure_reschedulable};
use crate::session::CurrentUser;
use crate::shared::{non_blank, parse_id, AppError};

/// Service for booking and managing appointments.
///
/// Time-sensitive operations take `now` from the caller so the local clock
/// is read once per request.
pub struct AppointmentService {
    appointments: Arc<dyn AppointmentRepository + Send + Sync>,
    patients: Arc<dyn PatientRepository + Send + Sync>,
    doctors: Arc<dyn DoctorRepository + Send + Sync>,
}

impl AppointmentService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository + Send + Sync>,
        patients: Arc<dyn PatientRepository + Send + Sync>,
        doctors: Arc<dyn DoctorRepository + Send + Sync>,
    ) -> Self {
        Self {
            appointments,
            patients,
            doctors,
        }
    }

    /// Books the caller with the doctor assigned to their patient record
    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn book(
        &self,
        current: &CurrentUser,
        request: BookAppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<AppointmentResponse, AppError> {
        let (Some(date), Some(time), Some(symptoms)) = (
            non_blank(request.date),
            non_blank(request.time),
            non_blank(request.symptoms),
        ) else {
            return Err(AppError::bad_request("All fields are required"));
        };

        ensure_bookable(&date, &time, now)?;

        let patient = self
            .patients
            .find_by_user(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Patient not found"))?;

        let Some(doctor_id) = patient.doctor_id.clone() else {
            return Err(AppError::bad_request("No doctor assigned to this patient"));
        };

        if self
            .appointments
            .find_by_slot(&patient.id, &date, &time)
            .await?
            .is_some()
        {
            warn!(patient_id = %patient.id, "Duplicate appointment requested");
            return Err(AppError::bad_request("Appointment already exists"));
        }

        let appointment = AppointmentModel::new(patient.id, doctor_id, date, time, symptoms);
        self.appointments.create_appointment(&appointment).await?;

        info!(appointment_id = %appointment.id, "Appointment booked");
        Ok(appointment.into())
    }

    /// Reads one of the caller's own appointments
    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn get_appointment(
        &self,
        current: &CurrentUser,
        raw_id: &str,
    ) -> Result<AppointmentResponse, AppError> {
        let appointment = self.load(raw_id).await?;
        self.ensure_owner(current, &appointment, "You are not authorized to view this appointment.")
            .await?;

        self.populate(appointment).await
    }

    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn patient_appointments(
        &self,
        current: &CurrentUser,
    ) -> Result<Vec<AppointmentResponse>, AppError> {
        let patient = self
            .patients
            .find_by_user(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Patient not found for this user"))?;

        let appointments = self.appointments.list_by_patient(&patient.id).await?;
        debug!(count = appointments.len(), "Patient appointments listed");
        self.populate_all(appointments).await
    }

    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn doctor_appointments(
        &self,
        current: &CurrentUser,
    ) -> Result<Vec<AppointmentResponse>, AppError> {
        let doctor = self
            .doctors
            .find_by_user(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Doctor not found for this user"))?;

        let appointments = self.appointments.list_by_doctor(&doctor.id).await?;
        debug!(count = appointments.len(), "Doctor appointments listed");
        self.populate_all(appointments).await
    }

    /// Moves one of the caller's appointments to a new slot
    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn reschedule(
        &self,
        current: &CurrentUser,
        raw_id: &str,
        request: UpdateAppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<AppointmentResponse, AppError> {
        let mut appointment = self.load(raw_id).await?;

        let date = request.date.unwrap_or_default();
        let time = request.time.unwrap_or_default();
        ensure_reschedulable(date.trim(), time.trim(), now)?;

        let patient = self
            .patients
            .find_by_user(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Patient not found"))?;
        if !appointment.belongs_to_patient(&patient.id) {
            warn!(appointment_id = %appointment.id, "Appointment update by another patient");
            return Err(AppError::forbidden(
                "You are not authorized to update this appointment.",
            ));
        }

        appointment.reschedule(date.trim().to_string(), time.trim().to_string());
        if let Some(symptoms) = non_blank(request.symptoms) {
            appointment.symptoms = symptoms;
        }
        self.appointments.update_appointment(&appointment).await?;

        info!(appointment_id = %appointment.id, "Appointment rescheduled");
        Ok(appointment.into())
    }

    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn delete_appointment(
        &self,
        current: &CurrentUser,
        raw_id: &str,
    ) -> Result<(), AppError> {
        let appointment = self.load(raw_id).await?;
        self.ensure_owner(
            current,
            &appointment,
            "You are not authorized to delete this appointment.",
        )
        .await?;

        self.appointments
            .delete_appointment(&appointment.id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))?;

        info!(appointment_id = %appointment.id, "Appointment deleted");
        Ok(())
    }

    async fn load(&self, raw_id: &str) -> Result<AppointmentModel, AppError> {
        let appointment_id = parse_id(raw_id, "Appointment")?;
        self.appointments
            .get_appointment(&appointment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Appointment not found"))
    }

    /// The caller must hold the patient record the appointment was booked under
    async fn ensure_owner(
        &self,
        current: &CurrentUser,
        appointment: &AppointmentModel,
        message: &str,
    ) -> Result<(), AppError> {
        match self.patients.find_by_user(&current.id).await? {
            Some(patient) if appointment.belongs_to_patient(&patient.id) => Ok(()),
            _ => {
                warn!(appointment_id = %appointment.id, "Appointment accessed by another account");
                Err(AppError::forbidden(message))
            }
        }
    }

    async fn populate(
        &self,
        appointment: AppointmentModel,
    ) -> Result<AppointmentResponse, AppError> {
        let patient = self.patients.get_patient(&appointment.patient_id).await?;
        let doctor = self.doctors.get_doctor(&appointment.doctor_id).await?;

        Ok(AppointmentResponse {
            appointment,
            patient,
            doctor,
        })
    }

    async fn populate_all(
        &self,
        appointments: Vec<AppointmentModel>,
    ) -> Result<Vec<AppointmentResponse>, AppError> {
        let mut populated = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            populated.push(self.populate(appointment).await?);
        }
        Ok(populated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::repository::InMemoryAppointmentRepository;
    use crate::doctor::repository::{tests::create_test_doctor, InMemoryDoctorRepository};
    use crate::patient::repository::{tests::create_test_patient, InMemoryPatientRepository};
    use crate::user::models::Role;
    use crate::user::repository::tests::create_test_user;
    use chrono::{Duration, NaiveDate};

    struct Fixture {
        service: AppointmentService,
        patient: CurrentUser,
        other_patient: CurrentUser,
        unassigned: CurrentUser,
        doctor: CurrentUser,
        doctor_id: String,
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 4, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn fixture() -> Fixture {
        let doctor_user = create_test_user("doc@example.com", Role::Doctor);
        let doctor = create_test_doctor(&doctor_user.id);
        let patient_user = create_test_user("p@example.com", Role::Patient);
        let other_user = create_test_user("q@example.com", Role::Patient);
        let unassigned_user = create_test_user("r@example.com", Role::Patient);

        let patients = InMemoryPatientRepository::with_patients(vec![
            create_test_patient(&patient_user.id, Some(&doctor.id)),
            create_test_patient(&other_user.id, Some(&doctor.id)),
            create_test_patient(&unassigned_user.id, None),
        ]);

        Fixture {
            service: AppointmentService::new(
                Arc::new(InMemoryAppointmentRepository::new()),
                Arc::new(patients),
                Arc::new(InMemoryDoctorRepository::with_doctors(vec![doctor.clone()])),
            ),
            patient: CurrentUser::from(&patient_user),
            other_patient: CurrentUser::from(&other_user),
            unassigned: CurrentUser::from(&unassigned_user),
            doctor: CurrentUser::from(&doctor_user),
            doctor_id: doctor.id,
        }
    }

    fn booking(date: &str, time: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            symptoms: Some("Back pain".to_string()),
        }
    }

    #[tokio::test]
    async fn test_book_uses_assigned_doctor() {
        let f = fixture();
        let booked = f
            .service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await
            .unwrap();

        assert_eq!(booked.appointment.doctor_id, f.doctor_id);
        assert_eq!(booked.appointment.symptoms, "Back pain");
    }

    #[tokio::test]
    async fn test_book_validation_order() {
        let f = fixture();

        let mut missing = booking("2030-04-02", "09:00");
        missing.symptoms = None;
        let result = f.service.book(&f.patient, missing, now()).await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "All fields are required"));

        let result = f
            .service
            .book(&f.patient, booking("2030-04-02", "9:00"), now())
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "Invalid time format (HH:mm expected)"
        ));

        let result = f
            .service
            .book(&f.patient, booking("2030-03-31", "09:00"), now())
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "Appointment date/time must be in the future"
        ));
    }

    #[tokio::test]
    async fn test_book_without_record_or_doctor() {
        let f = fixture();

        let result = f
            .service
            .book(&f.doctor, booking("2030-04-02", "09:00"), now())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Patient not found"));

        let result = f
            .service
            .book(&f.unassigned, booking("2030-04-02", "09:00"), now())
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "No doctor assigned to this patient"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_booking_per_patient() {
        let f = fixture();
        f.service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await
            .unwrap();

        let result = f
            .service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "Appointment already exists"));

        // Another patient may take the same time with the same doctor
        assert!(f
            .service
            .book(&f.other_patient, booking("2030-04-02", "09:00"), now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_get_is_owner_only_and_populated() {
        let f = fixture();
        let booked = f
            .service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await
            .unwrap();
        let id = booked.appointment.id.clone();

        let fetched = f.service.get_appointment(&f.patient, &id).await.unwrap();
        assert!(fetched.patient.is_some());
        assert_eq!(fetched.doctor.unwrap().id, f.doctor_id);

        let result = f.service.get_appointment(&f.other_patient, &id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let result = f
            .service
            .get_appointment(&f.patient, &uuid::Uuid::new_v4().to_string())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Appointment not found"));
    }

    #[tokio::test]
    async fn test_listings_for_patient_and_doctor() {
        let f = fixture();
        f.service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await
            .unwrap();
        f.service
            .book(&f.other_patient, booking("2030-04-02", "10:00"), now())
            .await
            .unwrap();

        let mine = f.service.patient_appointments(&f.patient).await.unwrap();
        assert_eq!(mine.len(), 1);

        let booked = f.service.doctor_appointments(&f.doctor).await.unwrap();
        assert_eq!(booked.len(), 2);

        let result = f.service.doctor_appointments(&f.patient).await;
        assert!(matches!(
            result,
            Err(AppError::NotFound(msg)) if msg == "Doctor not found for this user"
        ));
        let result = f.service.patient_appointments(&f.doctor).await;
        assert!(matches!(
            result,
            Err(AppError::NotFound(msg)) if msg == "Patient not found for this user"
        ));
    }

    #[tokio::test]
    async fn test_reschedule_rules() {
        let f = fixture();
        let booked = f
            .service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await
            .unwrap();
        let id = booked.appointment.id.clone();
        let soon = now() + Duration::minutes(30);

        let result = f
            .service
            .reschedule(
                &f.patient,
                &id,
                UpdateAppointmentRequest {
                    date: Some(soon.format("%Y-%m-%d").to_string()),
                    time: Some(soon.format("%H:%M").to_string()),
                    symptoms: None,
                },
                now(),
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "Cannot reschedule less than 1 hour before appointment"
        ));

        let result = f
            .service
            .reschedule(&f.patient, &id, UpdateAppointmentRequest::default(), now())
            .await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "Invalid date format (YYYY-MM-DD expected)"
        ));

        let result = f
            .service
            .reschedule(
                &f.other_patient,
                &id,
                UpdateAppointmentRequest {
                    date: Some("2030-04-03".to_string()),
                    time: Some("12:00".to_string()),
                    symptoms: None,
                },
                now(),
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::Forbidden(msg)) if msg == "You are not authorized to update this appointment."
        ));

        let moved = f
            .service
            .reschedule(
                &f.patient,
                &id,
                UpdateAppointmentRequest {
                    date: Some("2030-04-03".to_string()),
                    time: Some("12:00".to_string()),
                    symptoms: Some("Back pain, worse at night".to_string()),
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(moved.appointment.date, "2030-04-03");
        assert_eq!(moved.appointment.time, "12:00");
        assert_eq!(moved.appointment.symptoms, "Back pain, worse at night");
    }

    #[tokio::test]
    async fn test_delete_is_owner_only() {
        let f = fixture();
        let booked = f
            .service
            .book(&f.patient, booking("2030-04-02", "09:00"), now())
            .await
            .unwrap();
        let id = booked.appointment.id.clone();

        let result = f.service.delete_appointment(&f.other_patient, &id).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        f.service.delete_appointment(&f.patient, &id).await.unwrap();

        let result = f.service.delete_appointment(&f.patient, &id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
