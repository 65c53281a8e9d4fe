//! LocalRepository behaviour across the CRM, agenda and portfolio traits.

#![cfg(feature = "local-repo")]

mod support;

use chrono::NaiveTime;

use brokerdesk::db::repository::{AgendaRepository, CrmRepository, PortfolioRepository};
use brokerdesk::db::{LocalRepository, RepositoryError};
use brokerdesk::models::{AppointmentInput, AppointmentStatus, DealInput, Priority};
use brokerdesk::services::agenda::{immediate_focus, weekly_stats, FocusRank};
use brokerdesk::services::crm::{default_stage_inputs, pipeline_summary};
use brokerdesk::services::messages::friendly_message;
use support::{client_input, date};

fn appointment(title: &str, day: u32, hour: u32, priority: Option<Priority>) -> AppointmentInput {
    AppointmentInput {
        client_id: None,
        policy_id: None,
        title: title.to_string(),
        date: date(2025, 3, day),
        time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        status: AppointmentStatus::Pending,
        priority,
        notes: None,
    }
}

#[tokio::test]
async fn test_pipeline_board_and_deal_moves() {
    let repo = LocalRepository::new();
    let pipeline = repo.create_pipeline("Vendas", true).await.unwrap();
    for input in default_stage_inputs(pipeline.id) {
        repo.create_stage(&input).await.unwrap();
    }
    let stages = repo.list_stages(Some(pipeline.id)).await.unwrap();
    assert_eq!(stages.len(), 6);
    assert_eq!(stages[0].name, "Novo Lead");

    let lead = stages[0].id;
    let won = stages[4].id;
    let mut ids = Vec::new();
    for (title, value) in [("Frota", 12000.0), ("Residencial", 800.0), ("Vida", 2500.0)] {
        let deal = repo
            .create_deal(&DealInput {
                client_id: None,
                stage_id: lead,
                title: title.into(),
                value,
                expected_close_date: None,
                notes: None,
            })
            .await
            .unwrap();
        ids.push(deal.id);
    }

    let moved = repo.move_deal(ids[2], won, 0).await.unwrap();
    assert_eq!(moved.stage_id, won);
    assert_eq!(moved.position, 0);

    let deals = repo.list_deals().await.unwrap();
    let summary = pipeline_summary(&stages, &deals);
    assert_eq!(summary[0].deal_count, 2);
    assert_eq!(summary[0].total_value, 12800.0);
    assert_eq!(summary[4].deal_count, 1);
    assert_eq!(summary[4].total_value, 2500.0);

    // Positions in the source stage are renumbered from zero.
    let mut positions: Vec<i32> = deals
        .iter()
        .filter(|d| d.stage_id == lead)
        .map(|d| d.position)
        .collect();
    positions.sort();
    assert_eq!(positions, [0, 1]);
}

#[tokio::test]
async fn test_agenda_focus_from_repository() {
    let repo = LocalRepository::new();
    repo.create_appointment(&appointment("Renovação atrasada", 3, 9, None))
        .await
        .unwrap();
    repo.create_appointment(&appointment("Vistoria hoje", 5, 15, None))
        .await
        .unwrap();
    repo.create_appointment(&appointment("Proposta urgente", 7, 10, Some(Priority::Urgent)))
        .await
        .unwrap();
    let mut done = appointment("Visita concluída", 4, 11, None);
    done.status = AppointmentStatus::Done;
    repo.create_appointment(&done).await.unwrap();

    let list = repo.list_appointments().await.unwrap();
    let now = date(2025, 3, 5).and_hms_opt(12, 0, 0).unwrap();
    let focus = immediate_focus(&list, now, 5);
    let ranks: Vec<FocusRank> = focus.iter().map(|f| f.rank).collect();
    assert_eq!(ranks, [FocusRank::Overdue, FocusRank::Today, FocusRank::Priority]);

    // Week of 2025-03-02 (Sunday) to 2025-03-08.
    let stats = weekly_stats(&list, date(2025, 3, 5));
    assert_eq!(stats.total, 4);
    assert_eq!(stats.done, 1);
    assert_eq!(stats.attendance_rate, 25);
}

#[tokio::test]
async fn test_companies_and_producers() {
    let repo = LocalRepository::new();
    let company = repo.create_company("Porto Seguro").await.unwrap();
    assert_eq!(
        repo.company_name(company.id).await.unwrap().as_deref(),
        Some("Porto Seguro")
    );
    repo.add_producer("Marcos");
    assert_eq!(repo.list_producers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unhealthy_backend_reports_network_error() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);
    let err = repo.create_client(&client_input("Ana Lima")).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    assert_eq!(friendly_message(&err), "Erro de conexão. Verifique sua internet");

    repo.set_healthy(true);
    assert!(repo.create_client(&client_input("Ana Lima")).await.is_ok());
}
