use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{BloodGroup, EmergencyContact, NewPatient, PatientModel, PatientStatus},
    repository::PatientRepository,
    types::{
        AdmitPatientRequest, EmergencyContactRequest, PatientResponse, RegisterPatientRequest,
        UpdatePatientRequest,
    },
};
use crate::doctor::repository::DoctorRepository;
use crate::session::CurrentUser;
use crate::shared::{non_blank, parse_choice, parse_id, AppError};
use crate::user::{repository::UserRepository, types::UserResponse};

/// Service for patient records and ward admission
pub struct PatientService {
    patients: Arc<dyn PatientRepository + Send + Sync>,
    doctors: Arc<dyn DoctorRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl PatientService {
    pub fn new(
        patients: Arc<dyn PatientRepository + Send + Sync>,
        doctors: Arc<dyn DoctorRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            patients,
            doctors,
            users,
        }
    }

    /// Registers the caller as a patient
    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn register(
        &self,
        current: &CurrentUser,
        request: RegisterPatientRequest,
    ) -> Result<PatientResponse, AppError> {
        let (Some(blood_group), Some(emergency_contact)) = (
            non_blank(request.blood_group),
            request.emergency_contact.and_then(complete_contact),
        ) else {
            return Err(AppError::bad_request(
                "Blood group and emergency contact (name, relation, phone) are required!",
            ));
        };
        let blood_group = parse_choice::<BloodGroup>(&blood_group, "blood group")?;
        let status = match non_blank(request.status) {
            Some(status) => parse_choice::<PatientStatus>(&status, "status")?,
            None => PatientStatus::default(),
        };

        let user = self
            .users
            .get_user(&current.id)
            .await?
            .ok_or_else(|| AppError::bad_request("User not found!"))?;

        if self.patients.find_by_user(&user.id).await?.is_some() {
            warn!("User is already registered as a patient");
            return Err(AppError::bad_request(
                "User is already registered as a patient!",
            ));
        }

        let doctor_id = self.checked_doctor(request.doctor_id).await?;
        let nurse_id = optional_id(request.nurse_id, "Nurse")?;
        let room_id = optional_id(request.room_id, "Room")?;

        let patient = PatientModel::new(NewPatient {
            user_id: user.id.clone(),
            blood_group,
            emergency_contact,
            allergies: request.allergies.unwrap_or_default(),
            health_history: request.health_history.unwrap_or_default(),
            current_medications: request.current_medications.unwrap_or_default(),
            doctor_id,
            nurse_id,
            room_id,
            insurance_details: request.insurance_details.unwrap_or_default(),
            status,
        });
        self.patients.create_patient(&patient).await?;

        info!(patient_id = %patient.id, "Patient registered");
        self.populate(patient).await
    }

    #[instrument(skip(self))]
    pub async fn list_patients(&self) -> Result<Vec<PatientResponse>, AppError> {
        let patients = self.patients.list_patients().await?;
        debug!(patient_count = patients.len(), "Patients listed");

        let mut populated = Vec::with_capacity(patients.len());
        for patient in patients {
            populated.push(self.populate(patient).await?);
        }
        Ok(populated)
    }

    /// Reads a record; patients may only read their own
    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn get_patient(
        &self,
        current: &CurrentUser,
        raw_id: &str,
    ) -> Result<PatientResponse, AppError> {
        let patient = self.load(raw_id).await?;
        if !patient.is_owned_by(&current.id) {
            warn!(patient_id = %patient.id, "Patient record read by another account");
            return Err(AppError::forbidden(
                "You are not authorized to see this profile.",
            ));
        }

        self.populate(patient).await
    }

    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn update_patient(
        &self,
        current: &CurrentUser,
        raw_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<PatientResponse, AppError> {
        let mut patient = self.load(raw_id).await?;
        if !patient.is_owned_by(&current.id) {
            warn!(patient_id = %patient.id, "Patient record update by another account");
            return Err(AppError::forbidden(
                "You are not authorized to update this profile.",
            ));
        }

        if let Some(blood_group) = non_blank(request.blood_group) {
            patient.blood_group = parse_choice::<BloodGroup>(&blood_group, "blood group")?;
        }
        if let Some(contact) = request.emergency_contact {
            patient.emergency_contact = complete_contact(contact).ok_or_else(|| {
                AppError::bad_request("Emergency contact requires name, relation and phone")
            })?;
        }
        if let Some(allergies) = request.allergies {
            patient.allergies = allergies;
        }
        if let Some(history) = request.health_history {
            patient.health_history = history;
        }
        if let Some(medications) = request.current_medications {
            patient.current_medications = medications;
        }
        if let Some(doctor_id) = self.checked_doctor(request.doctor_id).await? {
            patient.doctor_id = Some(doctor_id);
        }
        if let Some(nurse_id) = optional_id(request.nurse_id, "Nurse")? {
            patient.nurse_id = Some(nurse_id);
        }
        if let Some(room_id) = optional_id(request.room_id, "Room")? {
            patient.room_id = Some(room_id);
        }
        if let Some(insurance) = request.insurance_details {
            patient.insurance_details = insurance;
        }

        patient.touch();
        self.patients.update_patient(&patient).await?;

        info!(patient_id = %patient.id, "Patient record updated");
        self.populate(patient).await
    }

    #[instrument(skip(self, request))]
    pub async fn admit(
        &self,
        raw_id: &str,
        request: AdmitPatientRequest,
    ) -> Result<PatientResponse, AppError> {
        let room_id = non_blank(request.room_id)
            .ok_or_else(|| AppError::bad_request("Room ID is required!"))?;
        let room_id = parse_id(&room_id, "Room")?;

        let mut patient = self.load(raw_id).await?;
        if patient.admitted {
            return Err(AppError::bad_request("Patient is already admitted!"));
        }

        patient.admit(room_id);
        self.patients.update_patient(&patient).await?;

        info!(patient_id = %patient.id, "Patient admitted");
        self.populate(patient).await
    }

    #[instrument(skip(self))]
    pub async fn discharge(&self, raw_id: &str) -> Result<PatientResponse, AppError> {
        let mut patient = self.load(raw_id).await?;
        if !patient.admitted {
            return Err(AppError::bad_request("Patient is not currently admitted!"));
        }

        patient.discharge(Utc::now());
        self.patients.update_patient(&patient).await?;

        info!(patient_id = %patient.id, "Patient discharged");
        self.populate(patient).await
    }

    /// Attaches the patient's account and assigned doctor, where they still exist
    pub async fn populate(&self, patient: PatientModel) -> Result<PatientResponse, AppError> {
        let user = self
            .users
            .get_user(&patient.user_id)
            .await?
            .map(UserResponse::from);
        let doctor = match &patient.doctor_id {
            Some(doctor_id) => self.doctors.get_doctor(doctor_id).await?,
            None => None,
        };

        Ok(PatientResponse {
            patient,
            user,
            doctor,
        })
    }

    async fn load(&self, raw_id: &str) -> Result<PatientModel, AppError> {
        let patient_id = parse_id(raw_id, "Patient")?;
        self.patients
            .get_patient(&patient_id)
            .await?
            .ok_or_else(|| AppError::not_found("Patient not found!"))
    }

    /// Validates an optional doctor reference against stored profiles
    async fn checked_doctor(&self, raw: Option<String>) -> Result<Option<String>, AppError> {
        let Some(doctor_id) = optional_id(raw, "Doctor")? else {
            return Ok(None);
        };
        if self.doctors.get_doctor(&doctor_id).await?.is_none() {
            return Err(AppError::not_found("Doctor not found!"));
        }
        Ok(Some(doctor_id))
    }
}

fn complete_contact(contact: EmergencyContactRequest) -> Option<EmergencyContact> {
    Some(EmergencyContact {
        name: non_blank(contact.name)?,
        relation: non_blank(contact.relation)?,
        phone: non_blank(contact.phone)?,
    })
}

fn optional_id(raw: Option<String>, entity: &str) -> Result<Option<String>, AppError> {
    non_blank(raw).map(|id| parse_id(&id, entity)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctor::repository::{tests::create_test_doctor, InMemoryDoctorRepository};
    use crate::patient::repository::InMemoryPatientRepository;
    use crate::user::models::Role;
    use crate::user::repository::{tests::create_test_user, InMemoryUserRepository};

    struct Fixture {
        service: PatientService,
        patient_user: CurrentUser,
        other_patient: CurrentUser,
        doctor_id: String,
    }

    fn fixture() -> Fixture {
        let patient_user = create_test_user("p1@example.com", Role::Patient);
        let other_patient = create_test_user("p2@example.com", Role::Patient);
        let doctor_user = create_test_user("d1@example.com", Role::Doctor);
        let doctor = create_test_doctor(&doctor_user.id);

        Fixture {
            service: PatientService::new(
                Arc::new(InMemoryPatientRepository::new()),
                Arc::new(InMemoryDoctorRepository::with_doctors(vec![doctor.clone()])),
                Arc::new(InMemoryUserRepository::with_users(vec![
                    patient_user.clone(),
                    other_patient.clone(),
                    doctor_user,
                ])),
            ),
            patient_user: CurrentUser::from(&patient_user),
            other_patient: CurrentUser::from(&other_patient),
            doctor_id: doctor.id,
        }
    }

    fn contact() -> EmergencyContactRequest {
        EmergencyContactRequest {
            name: Some("Sunita".to_string()),
            relation: Some("Spouse".to_string()),
            phone: Some("9000000004".to_string()),
        }
    }

    fn register_request(doctor_id: Option<&str>) -> RegisterPatientRequest {
        RegisterPatientRequest {
            blood_group: Some("O+".to_string()),
            emergency_contact: Some(contact()),
            doctor_id: doctor_id.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_with_defaults() {
        let f = fixture();
        let created = f
            .service
            .register(&f.patient_user, register_request(Some(&f.doctor_id)))
            .await
            .unwrap();

        assert_eq!(created.patient.blood_group, BloodGroup::OPositive);
        assert_eq!(created.patient.status, PatientStatus::Outpatient);
        assert!(created.patient.allergies.is_empty());
        assert_eq!(created.user.unwrap().email, "p1@example.com");
        assert_eq!(created.doctor.unwrap().id, f.doctor_id);
    }

    #[tokio::test]
    async fn test_register_requires_complete_contact() {
        let f = fixture();
        let mut request = register_request(None);
        request.emergency_contact = Some(EmergencyContactRequest {
            phone: None,
            ..contact()
        });

        let result = f.service.register(&f.patient_user, request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let mut request = register_request(None);
        request.blood_group = Some("Z".to_string());
        let result = f.service.register(&f.patient_user, request).await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg.starts_with("Invalid blood group")));
    }

    #[tokio::test]
    async fn test_register_twice_rejected() {
        let f = fixture();
        f.service
            .register(&f.patient_user, register_request(None))
            .await
            .unwrap();

        let result = f.service.register(&f.patient_user, register_request(None)).await;
        assert!(matches!(
            result,
            Err(AppError::BadRequest(msg)) if msg == "User is already registered as a patient!"
        ));
    }

    #[tokio::test]
    async fn test_register_with_unknown_doctor() {
        let f = fixture();
        let unknown = uuid::Uuid::new_v4().to_string();

        let result = f
            .service
            .register(&f.patient_user, register_request(Some(&unknown)))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Doctor not found!"));
    }

    #[tokio::test]
    async fn test_get_patient_is_owner_only() {
        let f = fixture();
        let created = f
            .service
            .register(&f.patient_user, register_request(None))
            .await
            .unwrap();

        assert!(f
            .service
            .get_patient(&f.patient_user, &created.patient.id)
            .await
            .is_ok());
        let result = f
            .service
            .get_patient(&f.other_patient, &created.patient.id)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_patient_partial() {
        let f = fixture();
        let created = f
            .service
            .register(&f.patient_user, register_request(None))
            .await
            .unwrap();

        let updated = f
            .service
            .update_patient(
                &f.patient_user,
                &created.patient.id,
                UpdatePatientRequest {
                    allergies: Some(vec!["Latex".to_string()]),
                    doctor_id: Some(f.doctor_id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.patient.allergies, vec!["Latex".to_string()]);
        assert_eq!(updated.patient.doctor_id.as_deref(), Some(f.doctor_id.as_str()));
        assert_eq!(updated.patient.blood_group, BloodGroup::OPositive);
        assert!(updated.doctor.is_some());

        let result = f
            .service
            .update_patient(
                &f.other_patient,
                &created.patient.id,
                UpdatePatientRequest::default(),
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::Forbidden(msg)) if msg == "You are not authorized to update this profile."
        ));
    }

    #[tokio::test]
    async fn test_admit_and_discharge() {
        let f = fixture();
        let created = f
            .service
            .register(&f.patient_user, register_request(None))
            .await
            .unwrap();
        let id = created.patient.id.clone();
        let room = uuid::Uuid::new_v4().to_string();

        let missing_room = f
            .service
            .admit(&id, AdmitPatientRequest { room_id: None })
            .await;
        assert!(matches!(missing_room, Err(AppError::BadRequest(msg)) if msg == "Room ID is required!"));

        let early = f.service.discharge(&id).await;
        assert!(matches!(early, Err(AppError::BadRequest(_))));

        let admitted = f
            .service
            .admit(&id, AdmitPatientRequest { room_id: Some(room.clone()) })
            .await
            .unwrap();
        assert!(admitted.patient.admitted);
        assert_eq!(admitted.patient.room_id, Some(room.clone()));
        assert_eq!(admitted.patient.status, PatientStatus::Inpatient);

        let twice = f
            .service
            .admit(&id, AdmitPatientRequest { room_id: Some(room) })
            .await;
        assert!(matches!(twice, Err(AppError::BadRequest(msg)) if msg == "Patient is already admitted!"));

        let discharged = f.service.discharge(&id).await.unwrap();
        assert!(!discharged.patient.admitted);
        assert!(discharged.patient.room_id.is_none());
        assert!(discharged.patient.discharge_date.is_some());
        assert_eq!(discharged.patient.status, PatientStatus::Discharged);
    }

    #[tokio::test]
    async fn test_missing_patient() {
        let f = fixture();
        let result = f
            .service
            .get_patient(&f.patient_user, &uuid::Uuid::new_v4().to_string())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Patient not found!"));

        let result = f.service.discharge("nope").await;
        assert!(matches!(result, Err(AppError::BadRequest(msg)) if msg == "Invalid Patient ID format"));
    }
}
