//! Repository layer: entity-scoped database operations.
//!
//! Plain functions over `&Connection`; a `UnitOfWork` derefs to a connection,
//! so the same functions run inside or outside a transaction.

mod complaint;
mod consultation;
mod doctor;
mod measurement;
mod notification;
mod patient;
mod prescription;
mod prescription_history;
mod reference;
mod user;

pub use complaint::*;
pub use consultation::*;
pub use doctor::*;
pub use measurement::*;
pub use notification::*;
pub use patient::*;
pub use prescription::*;
pub use prescription_history::*;
pub use reference::*;
pub use user::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseError;
    use crate::models::*;
    use crate::test_support::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn patient_insert_and_retrieve() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let loaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(loaded, patient);
        assert!(patient_exists(&conn, &patient.id).unwrap());
        assert!(!patient_exists(&conn, &Uuid::new_v4()).unwrap());
    }

    #[test]
    fn patient_update_replaces_attributes() {
        let conn = test_db();
        let mut patient = make_patient(&conn, "Ivanova");
        patient.city = Some("Kazan".into());
        patient.weight = Some(64.5);
        update_patient(&conn, &patient).unwrap();

        let loaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(loaded.city.as_deref(), Some("Kazan"));
        assert_eq!(loaded.weight, Some(64.5));
    }

    #[test]
    fn update_missing_patient_is_not_found() {
        let conn = test_db();
        let ghost = Patient {
            id: Uuid::new_v4(),
            surname: "Ghost".into(),
            name: "G".into(),
            patronim: None,
            gender: Gender::Male,
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            city: None,
            street: None,
            building: None,
            email: None,
            phone: None,
            height: None,
            weight: None,
        };
        let result = update_patient(&conn, &ghost);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn duplicate_patient_email_rejected() {
        let conn = test_db();
        let first = make_patient(&conn, "Ivanova");
        let mut second = make_patient_unsaved("Petrova");
        second.email = first.email.clone();
        assert!(insert_patient(&conn, &second).is_err());
    }

    #[test]
    fn deleting_patient_cascades_owned_records() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let doctor = make_doctor(&conn, "Sidorov");
        let user = make_patient_user(&conn, &patient);
        make_consultation(&conn, &patient, &doctor);
        insert_measurement(&conn, &make_measurement(&patient, normal_vitals())).unwrap();
        insert_prescription(&conn, &make_prescription(&patient, &doctor)).unwrap();
        let symptom = make_symptom(&conn, "Headache");
        make_complaint(&conn, &patient, &symptom);

        delete_patient(&conn, &patient.id).unwrap();

        assert_eq!(count_measurements(&conn, &patient.id).unwrap(), 0);
        assert_eq!(count_complaints(&conn, &patient.id).unwrap(), 0);
        assert!(get_patient_prescriptions(&conn, &patient.id).unwrap().is_empty());
        assert!(get_patient_consultations(&conn, &patient.id).unwrap().is_empty());
        assert!(get_user(&conn, &user.id).unwrap().is_none());
        // Doctor is a separate owner and survives
        assert!(doctor_exists(&conn, &doctor.id).unwrap());
    }

    #[test]
    fn deleting_doctor_cascades_prescriptions_and_consultations() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let doctor = make_doctor(&conn, "Sidorov");
        make_consultation(&conn, &patient, &doctor);
        insert_prescription(&conn, &make_prescription(&patient, &doctor)).unwrap();

        delete_doctor(&conn, &doctor.id).unwrap();

        assert!(get_patient_prescriptions(&conn, &patient.id).unwrap().is_empty());
        assert!(!has_consultation(&conn, &doctor.id, &patient.id).unwrap());
        assert!(patient_exists(&conn, &patient.id).unwrap());
    }

    #[test]
    fn delete_nonexistent_patient_fails() {
        let conn = test_db();
        let result = delete_patient(&conn, &Uuid::new_v4());
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn doctor_round_trip_and_update() {
        let conn = test_db();
        let mut doctor = make_doctor(&conn, "Sidorov");
        assert_eq!(get_doctor(&conn, &doctor.id).unwrap().unwrap(), doctor);

        doctor.phone = Some("+7 900 000 00 01".into());
        update_doctor(&conn, &doctor).unwrap();
        assert_eq!(
            get_doctor(&conn, &doctor.id).unwrap().unwrap().phone.as_deref(),
            Some("+7 900 000 00 01")
        );
    }

    #[test]
    fn doctor_patients_are_distinct() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let other = make_patient(&conn, "Petrova");
        let doctor = make_doctor(&conn, "Sidorov");
        make_consultation(&conn, &patient, &doctor);
        make_consultation(&conn, &patient, &doctor);
        make_consultation(&conn, &other, &doctor);

        let patients = list_patients_for_doctor(&conn, &doctor.id).unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].surname, "Ivanova");
    }

    #[test]
    fn user_lookup_by_email_and_patient() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let user = make_patient_user(&conn, &patient);

        assert_eq!(get_user_by_email(&conn, &user.email).unwrap().unwrap(), user);
        assert_eq!(get_user_for_patient(&conn, &patient.id).unwrap().unwrap().id, user.id);

        set_user_active(&conn, &user.id, false).unwrap();
        assert!(!get_user(&conn, &user.id).unwrap().unwrap().is_active);
    }

    #[test]
    fn attending_doctor_is_most_recent_consultation() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let earlier = make_doctor(&conn, "Sidorov");
        let later = make_doctor(&conn, "Kuznetsov");
        let unseen = make_doctor(&conn, "Popov");
        make_doctor_user(&conn, &earlier);
        let later_user = make_doctor_user(&conn, &later);
        make_doctor_user(&conn, &unseen);
        assert!(get_attending_doctor_user(&conn, &patient.id).unwrap().is_none());

        for (doctor, day) in [(&earlier, 1), (&later, 9), (&earlier, 3)] {
            insert_consultation(&conn, &Consultation {
                id: Uuid::new_v4(),
                patient_id: patient.id,
                doctor_id: doctor.id,
                consultation_date: NaiveDate::from_ymd_opt(2024, 3, day)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
                notes: None,
            })
            .unwrap();
        }

        let attending = get_attending_doctor_user(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(attending.id, later_user.id);
    }

    #[test]
    fn first_active_admin_skips_inactive_accounts() {
        let conn = test_db();
        assert!(get_first_active_admin(&conn).unwrap().is_none());

        let first = make_admin_user(&conn);
        let second = make_admin_user(&conn);
        let (earlier, later) = if first.email < second.email {
            (first, second)
        } else {
            (second, first)
        };
        assert_eq!(get_first_active_admin(&conn).unwrap().unwrap().id, earlier.id);

        set_user_active(&conn, &earlier.id, false).unwrap();
        assert_eq!(get_first_active_admin(&conn).unwrap().unwrap().id, later.id);
    }

    #[test]
    fn measurement_values_stored_unchanged() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let vitals = Vitals {
            glucose: 5.55,
            systolic_bp: 121.5,
            diastolic_bp: 79.25,
            pulse: 66.0,
            weight: 70.125,
        };
        let m = make_measurement(&patient, vitals);
        insert_measurement(&conn, &m).unwrap();

        let loaded = get_measurement(&conn, &m.id).unwrap().unwrap();
        assert_eq!(loaded, m);
    }

    #[test]
    fn recent_measurements_newest_first_with_limit() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        for day in 1..=5 {
            let mut m = make_measurement(&patient, normal_vitals());
            m.measured_at = NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap();
            insert_measurement(&conn, &m).unwrap();
        }

        let recent = get_recent_measurements(&conn, &patient.id, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].measured_at.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn complaint_requires_known_symptom() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let complaint = Complaint {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            symptom_id: Uuid::new_v4(),
            complaint_date: crate::db::now(),
            severity: "mild".into(),
            description: None,
        };
        assert!(insert_complaint(&conn, &complaint).is_err());
    }

    #[test]
    fn notification_mark_read_is_scoped_to_addressee() {
        let conn = test_db();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let n = Notification {
            id: Uuid::new_v4(),
            user_id: owner,
            notification_type: NotificationType::Info,
            message: "Lab results available".into(),
            created_at: crate::db::now(),
            is_read: false,
        };
        insert_notification(&conn, &n).unwrap();

        let result = mark_notification_read(&conn, &stranger, &n.id);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert_eq!(count_unread_notifications(&conn, &owner).unwrap(), 1);

        mark_notification_read(&conn, &owner, &n.id).unwrap();
        assert_eq!(count_unread_notifications(&conn, &owner).unwrap(), 0);
        assert!(get_user_notifications(&conn, &owner, true).unwrap().is_empty());
        assert_eq!(get_user_notifications(&conn, &owner, false).unwrap().len(), 1);
    }

    #[test]
    fn diagnosis_lookup_by_mkb_code() {
        let conn = test_db();
        let patient = make_patient(&conn, "Ivanova");
        let diagnosis = Diagnosis {
            id: Uuid::new_v4(),
            mkb_code: "I10".into(),
            name: "Essential hypertension".into(),
        };
        insert_diagnosis(&conn, &diagnosis).unwrap();
        assert_eq!(get_diagnosis_by_code(&conn, "I10").unwrap().unwrap(), diagnosis);

        insert_patient_diagnosis(&conn, &PatientDiagnosis {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            diagnosis_id: diagnosis.id,
            diagnosed_at: crate::db::now(),
            notes: None,
        })
        .unwrap();
        assert_eq!(get_patient_diagnoses(&conn, &patient.id).unwrap().len(), 1);
    }

    #[test]
    fn symptoms_listed_by_category() {
        let conn = test_db();
        let symptom = make_symptom(&conn, "Dizziness");
        let listed = list_symptoms_by_category(&conn, &symptom.category_id).unwrap();
        assert_eq!(listed, vec![symptom.clone()]);
        assert_eq!(get_symptom(&conn, &symptom.id).unwrap().unwrap(), symptom);
    }
}
