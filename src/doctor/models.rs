use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use uuid::Uuid;

pub const MAX_RATING: f64 = 5.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Specialization {
    Cardiologist,
    Dermatologist,
    Neurologist,
    Oncologist,
    Orthopedic,
    Pediatrician,
    #[serde(rename = "General Physician")]
    #[strum(serialize = "General Physician")]
    GeneralPhysician,
    Psychiatrist,
    #[serde(rename = "ENT Specialist")]
    #[strum(serialize = "ENT Specialist")]
    EntSpecialist,
    Gynecologist,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DoctorStatus {
    #[default]
    OnDuty,
    OffDuty,
}

/// A bookable date/time offered by a doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:mm
    pub is_booked: bool,
}

impl Slot {
    pub fn new(date: String, time: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            time,
            is_booked: false,
        }
    }

    pub fn is_at(&self, date: &str, time: &str) -> bool {
        self.date == date && self.time == time
    }
}

/// Validated data for a new doctor profile
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub user_id: String,
    pub specialization: Specialization,
    pub qualifications: Vec<String>,
    pub experience: u32,
    pub department: String,
    pub available_slots: Vec<Slot>,
}

/// Stored doctor profile, one per doctor account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorModel {
    pub id: String,
    pub user_id: String,
    pub specialization: Specialization,
    pub qualifications: Vec<String>,
    pub experience: u32, // years
    pub department: String,
    pub available_slots: Vec<Slot>,
    pub rating: f64,
    pub status: DoctorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorModel {
    pub fn new(profile: NewDoctor) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: profile.user_id,
            specialization: profile.specialization,
            qualifications: profile.qualifications,
            experience: profile.experience,
            department: profile.department,
            available_slots: profile.available_slots,
            rating: 0.0,
            status: DoctorStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn has_slot_at(&self, date: &str, time: &str) -> bool {
        self.available_slots.iter().any(|s| s.is_at(date, time))
    }

    pub fn find_slot(&self, slot_id: &str) -> Option<&Slot> {
        self.available_slots.iter().find(|s| s.id == slot_id)
    }

    pub fn remove_slot(&mut self, slot_id: &str) {
        self.available_slots.retain(|s| s.id != slot_id);
    }

    pub fn open_slots(&self) -> Vec<Slot> {
        self.available_slots
            .iter()
            .filter(|s| !s.is_booked)
            .cloned()
            .collect()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub fn is_valid_rating(rating: f64) -> bool {
    (0.0..=MAX_RATING).contains(&rating)
}
