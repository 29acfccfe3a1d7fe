use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{is_valid_rating, DoctorModel, DoctorStatus, NewDoctor, Slot, Specialization},
    repository::DoctorRepository,
    types::{AddSlotRequest, CreateDoctorRequest, DoctorResponse, SlotRequest, UpdateDoctorRequest},
};
use crate::schedule::validate_slot;
use crate::session::CurrentUser;
use crate::shared::{non_blank, parse_choice, parse_id, AppError};
use crate::user::{repository::UserRepository, types::UserResponse};

const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required and must be valid!";

/// Service for doctor profiles and their availability slots
pub struct DoctorService {
    doctors: Arc<dyn DoctorRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl DoctorService {
    pub fn new(
        doctors: Arc<dyn DoctorRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self { doctors, users }
    }

    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn create_profile(
        &self,
        current: &CurrentUser,
        request: CreateDoctorRequest,
    ) -> Result<DoctorResponse, AppError> {
        let (
            Some(specialization),
            Some(qualifications),
            Some(experience),
            Some(department),
            Some(slots),
        ) = (
            non_blank(request.specialization),
            request.qualifications.and_then(clean_list),
            request.experience,
            non_blank(request.department),
            request.available_slots,
        )
        else {
            return Err(AppError::bad_request(REQUIRED_FIELDS_MESSAGE));
        };

        let specialization = parse_choice::<Specialization>(&specialization, "specialization")?;
        let available_slots = build_slots(slots)?;

        let user = self
            .users
            .get_user(&current.id)
            .await?
            .ok_or_else(|| AppError::bad_request("User not found!"))?;

        if self.doctors.find_by_user(&user.id).await?.is_some() {
            warn!("Doctor profile already exists");
            return Err(AppError::bad_request(
                "Doctor profile already exists for this user!",
            ));
        }

        let doctor = DoctorModel::new(NewDoctor {
            user_id: user.id.clone(),
            specialization,
            qualifications,
            experience,
            department,
            available_slots,
        });
        self.doctors.create_doctor(&doctor).await?;

        info!(doctor_id = %doctor.id, "Doctor profile created");
        Ok(DoctorResponse {
            doctor,
            user: Some(user.into()),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_doctors(&self) -> Result<Vec<DoctorResponse>, AppError> {
        let doctors = self.doctors.list_doctors().await?;
        debug!(doctor_count = doctors.len(), "Doctors listed");

        let mut populated = Vec::with_capacity(doctors.len());
        for doctor in doctors {
            populated.push(self.populate(doctor).await?);
        }
        Ok(populated)
    }

    /// Reads a profile; doctors may only read their own
    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn get_profile(
        &self,
        current: &CurrentUser,
        raw_id: &str,
    ) -> Result<DoctorResponse, AppError> {
        let doctor = self.load(raw_id).await?;
        if !doctor.is_owned_by(&current.id) {
            warn!(doctor_id = %doctor.id, "Doctor profile read by another account");
            return Err(AppError::forbidden(
                "You are not authorized to see this profile.",
            ));
        }

        self.populate(doctor).await
    }

    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn update_profile(
        &self,
        current: &CurrentUser,
        raw_id: &str,
        request: UpdateDoctorRequest,
    ) -> Result<DoctorResponse, AppError> {
        let mut doctor = self.load(raw_id).await?;
        if !doctor.is_owned_by(&current.id) {
            warn!(doctor_id = %doctor.id, "Doctor profile update by another account");
            return Err(AppError::forbidden(
                "You are not authorized to update this profile.",
            ));
        }

        if let Some(specialization) = non_blank(request.specialization) {
            doctor.specialization =
                parse_choice::<Specialization>(&specialization, "specialization")?;
        }
        if let Some(qualifications) = request.qualifications {
            doctor.qualifications = clean_list(qualifications)
                .ok_or_else(|| AppError::bad_request("At least one qualification is required"))?;
        }
        if let Some(experience) = request.experience {
            doctor.experience = experience;
        }
        if let Some(department) = non_blank(request.department) {
            doctor.department = department;
        }
        if let Some(slots) = request.available_slots {
            doctor.available_slots = build_slots(slots)?;
        }
        if let Some(rating) = request.rating {
            if !is_valid_rating(rating) {
                return Err(AppError::bad_request("Rating must be between 0 and 5"));
            }
            doctor.rating = rating;
        }
        if let Some(status) = non_blank(request.status) {
            doctor.status = parse_choice::<DoctorStatus>(&status, "status")?;
        }

        doctor.touch();
        self.doctors.update_doctor(&doctor).await?;

        info!(doctor_id = %doctor.id, "Doctor profile updated");
        self.populate(doctor).await
    }

    #[instrument(skip(self))]
    pub async fn delete_profile(&self, raw_id: &str) -> Result<DoctorResponse, AppError> {
        let doctor_id = parse_id(raw_id, "Doctor")?;
        let doctor = self
            .doctors
            .delete_doctor(&doctor_id)
            .await?
            .ok_or_else(|| AppError::not_found("Doctor not found!"))?;

        info!(doctor_id = %doctor_id, "Doctor profile deleted");
        Ok(DoctorResponse { doctor, user: None })
    }

    /// Offers a new slot on the caller's own profile
    #[instrument(skip(self, current, request), fields(user_id = %current.id))]
    pub async fn add_slot(
        &self,
        current: &CurrentUser,
        request: AddSlotRequest,
    ) -> Result<Slot, AppError> {
        let (Some(date), Some(time)) = (non_blank(request.date), non_blank(request.time)) else {
            return Err(AppError::bad_request("Slot date and time are required"));
        };
        validate_slot(&date, &time)?;

        let mut doctor = self.own_profile(current).await?;
        if doctor.has_slot_at(&date, &time) {
            return Err(AppError::bad_request("Slot already exists"));
        }

        let slot = Slot::new(date, time);
        doctor.available_slots.push(slot.clone());
        doctor.touch();
        self.doctors.update_doctor(&doctor).await?;

        info!(doctor_id = %doctor.id, slot_id = %slot.id, "Slot added");
        Ok(slot)
    }

    #[instrument(skip(self, current), fields(user_id = %current.id))]
    pub async fn remove_slot(
        &self,
        current: &CurrentUser,
        raw_slot_id: &str,
    ) -> Result<DoctorResponse, AppError> {
        let slot_id = parse_id(raw_slot_id, "Slot")?;
        let mut doctor = self.own_profile(current).await?;

        let slot = doctor
            .find_slot(&slot_id)
            .ok_or_else(|| AppError::not_found("Slot not found"))?;
        if slot.is_booked {
            return Err(AppError::bad_request("Cannot remove a booked slot"));
        }

        doctor.remove_slot(&slot_id);
        doctor.touch();
        self.doctors.update_doctor(&doctor).await?;

        info!(doctor_id = %doctor.id, slot_id = %slot_id, "Slot removed");
        self.populate(doctor).await
    }

    /// Unbooked slots of any doctor
    #[instrument(skip(self))]
    pub async fn available_slots(&self, raw_doctor_id: &str) -> Result<Vec<Slot>, AppError> {
        Ok(self.load(raw_doctor_id).await?.open_slots())
    }

    /// Attaches the doctor's account, if it still exists
    pub async fn populate(&self, doctor: DoctorModel) -> Result<DoctorResponse, AppError> {
        let user = self
            .users
            .get_user(&doctor.user_id)
            .await?
            .map(UserResponse::from);
        Ok(DoctorResponse { doctor, user })
    }

    async fn load(&self, raw_id: &str) -> Result<DoctorModel, AppError> {
        let doctor_id = parse_id(raw_id, "Doctor")?;
        self.doctors
            .get_doctor(&doctor_id)
            .await?
            .ok_or_else(|| AppError::not_found("Doctor not found!"))
    }

    async fn own_profile(&self, current: &CurrentUser) -> Result<DoctorModel, AppError> {
        self.doctors
            .find_by_user(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Doctor profile not found for this user"))
    }
}

/// Trims entries and drops blanks; `None` when nothing is left
fn clean_list(values: Vec<String>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = values.into_iter().filter_map(|v| non_blank(Some(v))).collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn build_slots(requests: Vec<SlotRequest>) -> Result<Vec<Slot>, AppError> {
    let mut seen = HashSet::new();
    let mut slots = Vec::with_capacity(requests.len());

    for request in requests {
        let (Some(date), Some(time)) = (non_blank(request.date), non_blank(request.time)) else {
            return Err(AppError::bad_request(REQUIRED_FIELDS_MESSAGE));
        };
        validate_slot(&date, &time)?;

        if !seen.insert((date.clone(), time.clone())) {
            return Err(AppError::bad_request(format!(
                "Duplicate slot: {} {}",
                date, time
            )));
        }

        let mut slot = Slot::new(date, time);
        slot.is_booked = request.is_booked;
        slots.push(slot);
    }

    Ok(slots)
}
