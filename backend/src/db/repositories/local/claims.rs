//! Claims and agenda tables.

use async_trait::async_trait;
use chrono::Utc;

use super::{missing_reference, not_found, LocalRepository};
use crate::db::repository::{
    AgendaRepository, ClaimRepository, ErrorContext, RepositoryError, RepositoryResult,
};
use crate::models::*;

#[async_trait]
impl ClaimRepository for LocalRepository {
    async fn list_claims(&self) -> RepositoryResult<Vec<Claim>> {
        self.check_health()?;
        let mut claims: Vec<Claim> = self.data.read().claims.values().cloned().collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(claims)
    }

    async fn get_claim(&self, id: ClaimId) -> RepositoryResult<Claim> {
        self.check_health()?;
        self.data
            .read()
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("claim", id))
    }

    async fn create_claim(&self, input: &ClaimInput) -> RepositoryResult<Claim> {
        self.check_health()?;
        let mut data = self.data.write();
        let mut claim = input.clone().into_claim(Utc::now().date_naive());

        if let Some(policy_id) = input.policy_id {
            let policy = data
                .policies
                .get(&policy_id)
                .ok_or_else(|| missing_reference("policy", policy_id))?;
            claim.policy_number = policy.policy_number.clone();
            claim.client_id = Some(policy.client_id);
        }
        if let Some(client_id) = claim.client_id {
            let client = data
                .clients
                .get(&client_id)
                .ok_or_else(|| missing_reference("client", client_id))?;
            claim.client_name = Some(client.name.clone());
        }

        data.claims.insert(claim.id, claim.clone());
        data.claim_activities.push(ClaimActivity::new(
            claim.id,
            ActivityType::Created,
            "Sinistro registrado",
        ));
        Ok(claim)
    }

    async fn update_claim(&self, id: ClaimId, update: &ClaimUpdate) -> RepositoryResult<Claim> {
        self.check_health()?;
        let mut data = self.data.write();
        let claim = data
            .claims
            .get_mut(&id)
            .ok_or_else(|| not_found("claim", id))?;
        update.apply_to(claim);
        Ok(claim.clone())
    }

    async fn delete_claim(&self, id: ClaimId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        data.claims.remove(&id).ok_or_else(|| not_found("claim", id))?;
        data.claim_activities.retain(|a| a.claim_id != id);
        Ok(())
    }

    async fn list_claim_activities(&self, id: ClaimId) -> RepositoryResult<Vec<ClaimActivity>> {
        self.check_health()?;
        let data = self.data.read();
        if !data.claims.contains_key(&id) {
            return Err(not_found("claim", id));
        }
        Ok(data
            .claim_activities
            .iter()
            .filter(|a| a.claim_id == id)
            .cloned()
            .collect())
    }

    async fn add_claim_activity(&self, activity: &ClaimActivity) -> RepositoryResult<ClaimActivity> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.claims.contains_key(&activity.claim_id) {
            return Err(missing_reference("claim", activity.claim_id));
        }
        data.claim_activities.push(activity.clone());
        Ok(activity.clone())
    }
}

#[async_trait]
impl AgendaRepository for LocalRepository {
    async fn list_appointments(&self) -> RepositoryResult<Vec<Appointment>> {
        self.check_health()?;
        let mut appointments: Vec<Appointment> =
            self.data.read().appointments.values().cloned().collect();
        appointments.sort_by_key(|a| a.scheduled_at());
        Ok(appointments)
    }

    async fn create_appointment(&self, input: &AppointmentInput) -> RepositoryResult<Appointment> {
        self.check_health()?;
        if input.title.trim().is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Appointment title is required",
                ErrorContext::new("create_appointment")
                    .with_entity("appointment")
                    .with_code("23502"),
            ));
        }
        let mut data = self.data.write();
        if let Some(client_id) = input.client_id {
            if !data.clients.contains_key(&client_id) {
                return Err(missing_reference("client", client_id));
            }
        }
        let appointment = input.clone().into_appointment();
        data.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(&self, appointment: &Appointment) -> RepositoryResult<Appointment> {
        self.check_health()?;
        let mut data = self.data.write();
        let slot = data
            .appointments
            .get_mut(&appointment.id)
            .ok_or_else(|| not_found("appointment", appointment.id))?;
        *slot = appointment.clone();
        Ok(appointment.clone())
    }

    async fn delete_appointment(&self, id: AppointmentId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .appointments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("appointment", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::PortfolioRepository;
    use chrono::{NaiveDate, NaiveTime};

    async fn policy_with_client(repo: &LocalRepository) -> Policy {
        let client = repo
            .create_client(&ClientInput {
                name: "Carlos Lima".into(),
                phone: Some("21988887777".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.create_policy(&PolicyInput {
            client_id: client.id,
            policy_number: Some("SIN-77".into()),
            insurance_company: None,
            ramo: Some("Auto".into()),
            producer_id: None,
            insured_asset: "HB20".into(),
            premium_value: 2100.0,
            commission_rate: 12.0,
            status: PolicyStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            expiration_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            automatic_renewal: true,
        })
        .await
        .unwrap()
    }

    fn claim_input(policy_id: Option<PolicyId>) -> ClaimInput {
        ClaimInput {
            policy_id,
            client_id: None,
            claim_number: None,
            occurrence_date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
            report_date: None,
            claim_type: "Colisão".into(),
            priority: Some(Priority::High),
            claim_amount: Some(8000.0),
            deductible_amount: None,
            description: "Batida traseira".into(),
            location_occurrence: None,
            police_report_number: None,
        }
    }

    #[tokio::test]
    async fn test_create_claim_copies_policy_data_and_logs_creation() {
        let repo = LocalRepository::new();
        let policy = policy_with_client(&repo).await;

        let claim = repo.create_claim(&claim_input(Some(policy.id))).await.unwrap();
        assert_eq!(claim.status, ClaimStatus::Open);
        assert_eq!(claim.policy_number.as_deref(), Some("SIN-77"));
        assert_eq!(claim.client_name.as_deref(), Some("Carlos Lima"));

        let activities = repo.list_claim_activities(claim.id).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].activity_type, ActivityType::Created);

        repo.delete_claim(claim.id).await.unwrap();
        assert!(repo.list_claim_activities(claim.id).await.is_err());
    }

    #[tokio::test]
    async fn test_claim_for_unknown_policy_is_rejected() {
        let repo = LocalRepository::new();
        let err = repo
            .create_claim(&claim_input(Some(PolicyId::new())))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("23503"));
    }

    #[tokio::test]
    async fn test_appointments_are_listed_chronologically() {
        let repo = LocalRepository::new();
        let at = |d: u32, h: u32| AppointmentInput {
            client_id: None,
            policy_id: None,
            title: format!("Visita {}", d),
            date: NaiveDate::from_ymd_opt(2025, 9, d).unwrap(),
            time: NaiveTime::from_hms_opt(h, 0, 0).unwrap(),
            status: AppointmentStatus::Pending,
            priority: None,
            notes: None,
        };
        repo.create_appointment(&at(12, 9)).await.unwrap();
        repo.create_appointment(&at(10, 15)).await.unwrap();
        repo.create_appointment(&at(10, 8)).await.unwrap();

        let titles: Vec<(u32, u32)> = repo
            .list_appointments()
            .await
            .unwrap()
            .iter()
            .map(|a| {
                use chrono::{Datelike, Timelike};
                (a.date.day(), a.time.hour())
            })
            .collect();
        assert_eq!(titles, vec![(10, 8), (10, 15), (12, 9)]);

        let mut blank = at(1, 1);
        blank.title = "  ".into();
        assert_eq!(
            repo.create_appointment(&blank).await.unwrap_err().code(),
            Some("23502")
        );
    }
}
