use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Appointment, AppointmentId, AppointmentInput};

#[async_trait]
pub trait AgendaRepository: Send + Sync {
    /// All appointments ordered by date and time.
    async fn list_appointments(&self) -> RepositoryResult<Vec<Appointment>>;

    async fn create_appointment(&self, input: &AppointmentInput) -> RepositoryResult<Appointment>;

    async fn update_appointment(&self, appointment: &Appointment) -> RepositoryResult<Appointment>;

    async fn delete_appointment(&self, id: AppointmentId) -> RepositoryResult<()>;
}
