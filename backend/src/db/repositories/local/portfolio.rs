use async_trait::async_trait;

use super::{missing_reference, not_found, LocalRepository};
use crate::db::repository::{ErrorContext, PortfolioRepository, RepositoryError, RepositoryResult};
use crate::models::*;

#[async_trait]
impl PortfolioRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_clients(&self) -> RepositoryResult<Vec<Client>> {
        self.check_health()?;
        let data = self.data.read();
        let mut clients: Vec<Client> = data.clients.values().cloned().collect();
        clients.sort_by_key(|c| c.name.to_lowercase());
        Ok(clients)
    }

    async fn get_client(&self, id: ClientId) -> RepositoryResult<Client> {
        self.check_health()?;
        self.data
            .read()
            .clients
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("client", id))
    }

    async fn create_client(&self, input: &ClientInput) -> RepositoryResult<Client> {
        self.check_health()?;
        let client = input.clone().into_client();
        self.data.write().clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn update_client(&self, client: &Client) -> RepositoryResult<Client> {
        self.check_health()?;
        let mut data = self.data.write();
        let slot = data
            .clients
            .get_mut(&client.id)
            .ok_or_else(|| not_found("client", client.id))?;
        *slot = client.clone();
        Ok(client.clone())
    }

    async fn delete_client(&self, id: ClientId) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.policies.values().any(|p| p.client_id == id) {
            return Err(RepositoryError::validation_with_context(
                "Client still has policies",
                ErrorContext::new("delete_client")
                    .with_entity("client")
                    .with_entity_id(id)
                    .with_code("23503"),
            ));
        }
        data.clients
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("client", id))
    }

    async fn list_policies(&self) -> RepositoryResult<Vec<Policy>> {
        self.check_health()?;
        let data = self.data.read();
        let mut policies: Vec<Policy> = data
            .policies
            .values()
            .cloned()
            .map(|mut p| {
                p.insurance_company_name = p
                    .insurance_company
                    .and_then(|id| data.companies.get(&id))
                    .map(|c| c.name.clone());
                p
            })
            .collect();
        policies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(policies)
    }

    async fn get_policy(&self, id: PolicyId) -> RepositoryResult<Policy> {
        self.check_health()?;
        let data = self.data.read();
        let mut policy = data
            .policies
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("policy", id))?;
        policy.insurance_company_name = policy
            .insurance_company
            .and_then(|cid| data.companies.get(&cid))
            .map(|c| c.name.clone());
        Ok(policy)
    }

    async fn create_policy(&self, input: &PolicyInput) -> RepositoryResult<Policy> {
        self.check_health()?;
        let mut data = self.data.write();

        if !data.clients.contains_key(&input.client_id) {
            return Err(missing_reference("client", input.client_id));
        }
        if let Some(company) = input.insurance_company {
            if !data.companies.contains_key(&company) {
                return Err(missing_reference("company", company));
            }
        }

        let number = input
            .policy_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if let Some(number) = number {
            let duplicate = data.policies.values().any(|p| {
                p.insurance_company == input.insurance_company
                    && p.policy_number.as_deref().map(str::trim) == Some(number)
            });
            if duplicate {
                return Err(RepositoryError::validation_with_context(
                    format!("duplicate key value: policy_number={}", number),
                    ErrorContext::new("create_policy")
                        .with_entity("policy")
                        .with_code("23505"),
                ));
            }
        }

        let mut policy = input.clone().into_policy();
        policy.insurance_company_name = policy
            .insurance_company
            .and_then(|id| data.companies.get(&id))
            .map(|c| c.name.clone());
        data.policies.insert(policy.id, policy.clone());
        Ok(policy)
    }

    async fn update_policy(&self, policy: &Policy) -> RepositoryResult<Policy> {
        self.check_health()?;
        let mut data = self.data.write();
        let slot = data
            .policies
            .get_mut(&policy.id)
            .ok_or_else(|| not_found("policy", policy.id))?;
        *slot = policy.clone();
        Ok(policy.clone())
    }

    async fn delete_policy(&self, id: PolicyId) -> RepositoryResult<()> {
        self.check_health()?;
        self.data
            .write()
            .policies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("policy", id))
    }

    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        self.check_health()?;
        let mut companies: Vec<Company> = self.data.read().companies.values().cloned().collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn create_company(&self, name: &str) -> RepositoryResult<Company> {
        self.check_health()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Company name is required",
                ErrorContext::new("create_company").with_code("23502"),
            ));
        }
        let company = Company {
            id: CompanyId::new(),
            name: name.to_string(),
        };
        self.data
            .write()
            .companies
            .insert(company.id, company.clone());
        Ok(company)
    }

    async fn list_producers(&self) -> RepositoryResult<Vec<Producer>> {
        self.check_health()?;
        let mut producers: Vec<Producer> = self.data.read().producers.values().cloned().collect();
        producers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(producers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn policy_input(client_id: ClientId, company: Option<CompanyId>, number: &str) -> PolicyInput {
        PolicyInput {
            client_id,
            policy_number: Some(number.to_string()),
            insurance_company: company,
            ramo: Some("Auto".into()),
            producer_id: None,
            insured_asset: "Onix 2022".into(),
            premium_value: 1800.0,
            commission_rate: 15.0,
            status: PolicyStatus::AwaitingPolicy,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            expiration_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            automatic_renewal: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_policy_number_is_unique_violation() {
        let repo = LocalRepository::new();
        let client = repo
            .create_client(&ClientInput {
                name: "Maria Souza".into(),
                email: Some("maria@example.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let company = repo.create_company("Porto Seguro").await.unwrap();

        let first = repo
            .create_policy(&policy_input(client.id, Some(company.id), "AP-1"))
            .await
            .unwrap();
        assert_eq!(first.insurance_company_name.as_deref(), Some("Porto Seguro"));

        let err = repo
            .create_policy(&policy_input(client.id, Some(company.id), " AP-1 "))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("23505"));

        // Same number at another insurer is fine.
        let other = repo.create_company("Allianz").await.unwrap();
        assert!(repo
            .create_policy(&policy_input(client.id, Some(other.id), "AP-1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_policy_requires_existing_client() {
        let repo = LocalRepository::new();
        let err = repo
            .create_policy(&policy_input(ClientId::new(), None, "X"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("23503"));
    }

    #[tokio::test]
    async fn test_client_with_policies_cannot_be_deleted() {
        let repo = LocalRepository::new();
        let client = repo
            .create_client(&ClientInput {
                name: "João".into(),
                phone: Some("11999998888".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let policy = repo
            .create_policy(&policy_input(client.id, None, "P-9"))
            .await
            .unwrap();

        assert_eq!(
            repo.delete_client(client.id).await.unwrap_err().code(),
            Some("23503")
        );
        repo.delete_policy(policy.id).await.unwrap();
        repo.delete_client(client.id).await.unwrap();
        assert!(matches!(
            repo.get_client(client.id).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
