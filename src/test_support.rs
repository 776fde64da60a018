//! Shared fixtures for in-crate tests.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::*;
use crate::models::*;

pub fn test_db() -> Connection {
    open_memory_database().unwrap()
}

pub fn make_patient_unsaved(surname: &str) -> Patient {
    let id = Uuid::new_v4();
    Patient {
        id,
        surname: surname.into(),
        name: "Anna".into(),
        patronim: Some("Sergeevna".into()),
        gender: Gender::Female,
        birth_date: NaiveDate::from_ymd_opt(1968, 5, 17).unwrap(),
        city: None,
        street: None,
        building: None,
        email: Some(format!("{id}@patients.test")),
        phone: None,
        height: Some(165.0),
        weight: Some(70.0),
    }
}

pub fn make_patient(conn: &Connection, surname: &str) -> Patient {
    let patient = make_patient_unsaved(surname);
    insert_patient(conn, &patient).unwrap();
    patient
}

pub fn make_doctor(conn: &Connection, surname: &str) -> Doctor {
    let specialization = Specialization {
        id: Uuid::new_v4(),
        name: format!("Cardiology {surname}"),
    };
    let department = Department {
        id: Uuid::new_v4(),
        name: format!("Ward {surname}"),
    };
    insert_specialization(conn, &specialization).unwrap();
    insert_department(conn, &department).unwrap();

    let doctor = Doctor {
        id: Uuid::new_v4(),
        surname: surname.into(),
        name: "Pavel".into(),
        patronim: None,
        specialization_id: specialization.id,
        department_id: department.id,
        email: None,
        phone: None,
    };
    insert_doctor(conn, &doctor).unwrap();
    doctor
}

pub fn make_patient_user(conn: &Connection, patient: &Patient) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: format!("patient-{}@clinic.test", patient.id),
        role: Role::Patient,
        is_active: true,
        is_verified: true,
        patient_id: Some(patient.id),
        doctor_id: None,
    };
    insert_user(conn, &user).unwrap();
    user
}

pub fn make_doctor_user(conn: &Connection, doctor: &Doctor) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: format!("doctor-{}@clinic.test", doctor.id),
        role: Role::Doctor,
        is_active: true,
        is_verified: true,
        patient_id: None,
        doctor_id: Some(doctor.id),
    };
    insert_user(conn, &user).unwrap();
    user
}

pub fn make_admin_user(conn: &Connection) -> User {
    let user = User {
        id: Uuid::new_v4(),
        email: format!("admin-{}@clinic.test", Uuid::new_v4()),
        role: Role::Admin,
        is_active: true,
        is_verified: true,
        patient_id: None,
        doctor_id: None,
    };
    insert_user(conn, &user).unwrap();
    user
}

pub fn make_consultation(conn: &Connection, patient: &Patient, doctor: &Doctor) -> Consultation {
    let consultation = Consultation {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        consultation_date: now(),
        notes: None,
    };
    insert_consultation(conn, &consultation).unwrap();
    consultation
}

pub fn make_symptom(conn: &Connection, name: &str) -> Symptom {
    let category = SymptomCategory {
        id: Uuid::new_v4(),
        name: format!("Category {name}"),
    };
    insert_symptom_category(conn, &category).unwrap();
    let symptom = Symptom {
        id: Uuid::new_v4(),
        category_id: category.id,
        name: name.into(),
        description: None,
    };
    insert_symptom(conn, &symptom).unwrap();
    symptom
}

pub fn make_complaint(conn: &Connection, patient: &Patient, symptom: &Symptom) -> Complaint {
    let complaint = Complaint {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        symptom_id: symptom.id,
        complaint_date: now(),
        severity: "moderate".into(),
        description: None,
    };
    insert_complaint(conn, &complaint).unwrap();
    complaint
}

pub fn normal_vitals() -> Vitals {
    Vitals {
        glucose: 5.0,
        systolic_bp: 120.0,
        diastolic_bp: 80.0,
        pulse: 70.0,
        weight: 70.0,
    }
}

pub fn make_measurement(patient: &Patient, vitals: Vitals) -> Measurement {
    Measurement {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        vitals,
        measured_at: now(),
    }
}

/// An already-persisted-shape prescription (no lifecycle rules applied).
pub fn make_prescription(patient: &Patient, doctor: &Doctor) -> Prescription {
    Prescription {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        medication_name: "Lisinopril".into(),
        quantity: 10.0,
        dose_unit: "mg".into(),
        frequency: "once daily".into(),
        duration_days: 30,
        start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        end_date: None,
        instructions: None,
        status: PrescriptionStatus::Active,
    }
}

pub fn new_prescription(patient: &Patient, doctor: &Doctor) -> NewPrescription {
    NewPrescription {
        patient_id: patient.id,
        doctor_id: doctor.id,
        medication_name: "Lisinopril".into(),
        quantity: 10.0,
        dose_unit: "mg".into(),
        frequency: "once daily".into(),
        duration_days: 30,
        start_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        end_date: Some(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()),
        instructions: Some("Take in the morning".into()),
        status: None,
    }
}
