use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use super::{not_found, LocalData, LocalRepository};
use crate::db::checksum::fingerprint;
use crate::db::repository::{
    ErrorContext, ReconciliationRepository, RepositoryError, RepositoryResult,
};
use crate::models::*;

/// Largest date distance, in days, for an automatic suggestion.
const MATCH_WINDOW_DAYS: i64 = 5;

fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
}

impl LocalData {
    fn reconciliation_kpis(
        &self,
        bank_account_id: Option<BankAccountId>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ReconciliationKpis {
        let mut kpis = ReconciliationKpis::default();
        for entry in self.statement_entries.values().filter(|e| {
            bank_account_id.is_none_or(|b| e.bank_account_id == Some(b))
                && in_range(e.transaction_date, start, end)
        }) {
            let magnitude = entry.amount.abs();
            kpis.total_count += 1;
            kpis.total_amount += magnitude;
            match entry.reconciliation_status {
                s if s.is_reconciled() => {
                    kpis.reconciled_count += 1;
                    kpis.reconciled_amount += magnitude;
                    if entry.amount >= 0.0 {
                        kpis.reconciled_revenue += magnitude;
                    } else {
                        kpis.reconciled_expense += magnitude;
                    }
                }
                ReconciliationStatus::Ignored => kpis.ignored_count += 1,
                _ => {
                    kpis.pending_count += 1;
                    kpis.pending_amount += magnitude;
                    if entry.amount >= 0.0 {
                        kpis.pending_revenue += magnitude;
                    } else {
                        kpis.pending_expense += magnitude;
                    }
                }
            }
        }
        kpis
    }
}

#[async_trait]
impl ReconciliationRepository for LocalRepository {
    async fn import_statement(
        &self,
        bank_account_id: BankAccountId,
        file_name: &str,
        entries: &[StatementEntryInput],
    ) -> RepositoryResult<StatementImportResult> {
        self.check_health()?;
        let ctx = || ErrorContext::new("import_bank_statement_batch").with_entity("bank_statement");
        if entries.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Statement has no entries",
                ctx().with_details(file_name.to_string()),
            ));
        }
        let key = fingerprint(&(bank_account_id, entries))?;

        let mut data = self.data.write();
        if !data.import_fingerprints.insert(key) {
            return Err(RepositoryError::validation_with_context(
                "duplicate key value violates unique constraint",
                ctx().with_details(file_name.to_string()).with_code("23505"),
            ));
        }

        let batch_id = ImportBatchId::new();
        let now = Utc::now();
        for input in entries {
            let entry = BankStatementEntry {
                id: StatementEntryId::new(),
                bank_account_id: Some(bank_account_id),
                import_batch_id: Some(batch_id),
                transaction_date: input.transaction_date,
                description: input.description.clone(),
                amount: input.amount,
                reference_number: input.reference_number.clone(),
                reconciliation_status: ReconciliationStatus::Pending,
                matched_transaction_id: None,
                match_confidence: None,
                notes: None,
                created_at: now,
            };
            data.statement_entries.insert(entry.id, entry);
        }
        log::info!(
            "Imported {} statement entries from '{}' (batch {})",
            entries.len(),
            file_name,
            batch_id
        );
        Ok(StatementImportResult {
            success: true,
            batch_id: Some(batch_id),
            count: entries.len(),
        })
    }

    async fn list_statement_entries(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> RepositoryResult<Vec<BankStatementEntry>> {
        self.check_health()?;
        let data = self.data.read();
        let mut entries: Vec<BankStatementEntry> = data
            .statement_entries
            .values()
            .filter(|e| bank_account_id.is_none_or(|b| e.bank_account_id == Some(b)))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then_with(|| a.description.cmp(&b.description))
        });
        Ok(entries)
    }

    async fn suggest_matches(
        &self,
        bank_account_id: Option<BankAccountId>,
    ) -> RepositoryResult<Vec<MatchSuggestion>> {
        self.check_health()?;
        let data = self.data.read();

        let candidates: Vec<(&TransactionWithEntries, f64)> = data
            .ledger
            .iter()
            .filter(|t| {
                !t.transaction.is_void
                    && !t.transaction.reconciled
                    && t.transaction.related_entity_type.as_deref() != Some("reversal")
            })
            .map(|t| (t, data.cash_delta(t)))
            .filter(|(_, delta)| delta.abs() > BALANCE_TOLERANCE)
            .collect();

        let mut pending: Vec<&BankStatementEntry> = data
            .statement_entries
            .values()
            .filter(|e| {
                e.reconciliation_status == ReconciliationStatus::Pending
                    && bank_account_id.is_none_or(|b| e.bank_account_id == Some(b))
            })
            .collect();
        pending.sort_by_key(|e| (e.transaction_date, e.id));

        let mut suggestions: Vec<MatchSuggestion> = pending
            .into_iter()
            .filter_map(|entry| {
                candidates
                    .iter()
                    .filter_map(|(tx, delta)| {
                        let amount_diff = (entry.amount - delta).abs();
                        let date_diff = (entry.transaction_date - tx.transaction.transaction_date)
                            .num_days()
                            .abs();
                        if amount_diff > BALANCE_TOLERANCE || date_diff > MATCH_WINDOW_DAYS {
                            return None;
                        }
                        Some(MatchSuggestion {
                            statement_entry_id: entry.id,
                            system_transaction_id: tx.transaction.id,
                            statement_description: entry.description.clone(),
                            system_description: tx.transaction.description.clone(),
                            statement_amount: entry.amount,
                            system_amount: *delta,
                            date_diff,
                            amount_diff,
                            confidence: 1.0 - date_diff as f64 / 10.0,
                        })
                    })
                    .min_by_key(|s| s.date_diff)
            })
            .collect();

        // Stable: equal confidence keeps statement date order.
        suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(suggestions)
    }

    async fn reconcile(
        &self,
        statement_entry_id: StatementEntryId,
        transaction_id: LedgerTransactionId,
    ) -> RepositoryResult<bool> {
        self.check_health()?;
        let ctx = || {
            ErrorContext::new("reconcile_transactions")
                .with_entity("bank_statement_entry")
                .with_entity_id(statement_entry_id)
        };
        let mut data = self.data.write();

        let entry_amount = data
            .statement_entries
            .get(&statement_entry_id)
            .map(|e| e.amount)
            .ok_or_else(|| not_found("bank_statement_entry", statement_entry_id))?;
        let tx = data
            .ledger
            .iter()
            .find(|t| t.transaction.id == transaction_id)
            .ok_or_else(|| not_found("financial_transaction", transaction_id))?;
        if tx.transaction.is_void {
            return Err(RepositoryError::validation_with_context(
                "Voided transactions cannot be reconciled",
                ctx(),
            ));
        }
        if tx.transaction.reconciled {
            return Err(RepositoryError::validation_with_context(
                "Transaction is already reconciled",
                ctx().with_code("23505"),
            ));
        }
        let delta = data.cash_delta(tx);

        let status = if (entry_amount - delta).abs() <= BALANCE_TOLERANCE {
            ReconciliationStatus::Matched
        } else {
            ReconciliationStatus::ManualMatch
        };
        let mut released = None;
        if let Some(entry) = data.statement_entries.get_mut(&statement_entry_id) {
            released = entry.matched_transaction_id.replace(transaction_id);
            entry.reconciliation_status = status;
            entry.match_confidence = Some(if status == ReconciliationStatus::Matched {
                1.0
            } else {
                0.0
            });
        }
        if let Some(previous) = released {
            log::info!("Statement entry {} re-linked from {}", statement_entry_id, previous);
        }
        for tx in data.ledger.iter_mut() {
            if Some(tx.transaction.id) == released {
                tx.transaction.reconciled = false;
            }
            if tx.transaction.id == transaction_id {
                tx.transaction.reconciled = true;
            }
        }
        Ok(true)
    }

    async fn unreconcile(&self, statement_entry_id: StatementEntryId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        let entry = data
            .statement_entries
            .get_mut(&statement_entry_id)
            .ok_or_else(|| not_found("bank_statement_entry", statement_entry_id))?;
        if !entry.reconciliation_status.is_reconciled() {
            return Ok(false);
        }
        let released = entry.matched_transaction_id.take();
        entry.reconciliation_status = ReconciliationStatus::Pending;
        entry.match_confidence = None;

        if let Some(id) = released {
            if let Some(tx) = data.ledger.iter_mut().find(|t| t.transaction.id == id) {
                tx.transaction.reconciled = false;
            }
        }
        Ok(true)
    }

    async fn ignore_entry(
        &self,
        statement_entry_id: StatementEntryId,
        notes: Option<&str>,
    ) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        let entry = data
            .statement_entries
            .get_mut(&statement_entry_id)
            .ok_or_else(|| not_found("bank_statement_entry", statement_entry_id))?;
        if entry.reconciliation_status.is_reconciled() {
            return Ok(false);
        }
        entry.reconciliation_status = ReconciliationStatus::Ignored;
        entry.notes = notes.map(str::to_string);
        Ok(true)
    }

    async fn get_reconciliation_kpis(
        &self,
        bank_account_id: Option<BankAccountId>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<KpisComparison> {
        self.check_health()?;
        let data = self.data.read();
        let current = data.reconciliation_kpis(bank_account_id, start, end);
        let previous = match (start, end) {
            (Some(start), Some(end)) if start <= end => {
                let previous_end = start - Duration::days(1);
                let previous_start = previous_end - (end - start);
                data.reconciliation_kpis(bank_account_id, Some(previous_start), Some(previous_end))
            }
            _ => ReconciliationKpis::default(),
        };
        Ok(KpisComparison { current, previous })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::LedgerRepository;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn line(d: u32, description: &str, amount: f64) -> StatementEntryInput {
        StatementEntryInput {
            transaction_date: date(d),
            description: description.into(),
            amount,
            reference_number: None,
        }
    }

    #[tokio::test]
    async fn test_reimporting_same_batch_fails_with_unique_violation() {
        let repo = LocalRepository::new();
        let bank = BankAccountId::new();
        let lines = vec![line(1, "PIX RECEBIDO", 500.0), line(2, "TARIFA", -9.9)];

        let result = repo.import_statement(bank, "extrato.ofx", &lines).await.unwrap();
        assert!(result.success);
        assert_eq!(result.count, 2);

        let err = repo
            .import_statement(bank, "extrato-copia.ofx", &lines)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("23505"));
        assert_eq!(repo.list_statement_entries(Some(bank)).await.unwrap().len(), 2);

        // Same lines on another account are a different batch.
        assert!(repo
            .import_statement(BankAccountId::new(), "extrato.ofx", &lines)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_suggest_reconcile_and_unreconcile() {
        let repo = LocalRepository::new();
        let accounts = repo.ensure_default_accounts().await.unwrap();
        let find = |name: &str| accounts.iter().find(|a| a.name == name).unwrap().id;

        let tx_id = repo
            .create_financial_movement(&MovementInput {
                description: "Comissão recebida".into(),
                transaction_date: date(3),
                reference_number: None,
                related_entity_type: None,
                related_entity_id: None,
                due_date: None,
                bank_account_id: Some(find("Banco")),
                is_confirmed: true,
                entries: vec![LedgerEntryInput::new(find("Outras Receitas"), -500.0)],
            })
            .await
            .unwrap();

        let bank = BankAccountId::new();
        repo.import_statement(bank, "a.csv", &[line(1, "PIX RECEBIDO", 500.0), line(1, "X", 7.0)])
            .await
            .unwrap();

        let suggestions = repo.suggest_matches(Some(bank)).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        let suggestion = &suggestions[0];
        assert_eq!(suggestion.system_transaction_id, tx_id);
        assert_eq!(suggestion.date_diff, 2);
        assert!((suggestion.confidence - 0.8).abs() < 1e-9);

        let entry = suggestion.statement_entry_id;
        assert!(repo.reconcile(entry, tx_id).await.unwrap());
        assert!(repo.suggest_matches(Some(bank)).await.unwrap().is_empty());

        let kpis = repo
            .get_reconciliation_kpis(Some(bank), Some(date(1)), Some(date(31)))
            .await
            .unwrap();
        assert_eq!(kpis.current.reconciled_count, 1);
        assert_eq!(kpis.current.pending_count, 1);
        assert_eq!(kpis.current.reconciled_revenue, 500.0);
        assert_eq!(kpis.previous.total_count, 0);

        assert!(repo.unreconcile(entry).await.unwrap());
        assert!(!repo.unreconcile(entry).await.unwrap());
        assert_eq!(repo.suggest_matches(Some(bank)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ignored_entries_leave_pending_totals() {
        let repo = LocalRepository::new();
        let bank = BankAccountId::new();
        repo.import_statement(bank, "b.csv", &[line(5, "ESTORNO", -20.0)])
            .await
            .unwrap();
        let entry = repo.list_statement_entries(None).await.unwrap()[0].id;

        assert!(repo.ignore_entry(entry, Some("duplicado")).await.unwrap());
        let kpis = repo.get_reconciliation_kpis(None, None, None).await.unwrap();
        assert_eq!(kpis.current.ignored_count, 1);
        assert_eq!(kpis.current.pending_expense, 0.0);
    }

    async fn confirmed_revenue(repo: &LocalRepository, day: u32, amount: f64) -> LedgerTransactionId {
        let accounts = repo.ensure_default_accounts().await.unwrap();
        let find = |name: &str| accounts.iter().find(|a| a.name == name).unwrap().id;
        repo.create_financial_movement(&MovementInput {
            description: format!("Recebimento {}", day),
            transaction_date: date(day),
            reference_number: None,
            related_entity_type: None,
            related_entity_id: None,
            due_date: None,
            bank_account_id: Some(find("Banco")),
            is_confirmed: true,
            entries: vec![LedgerEntryInput::new(find("Outras Receitas"), -amount)],
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_relinking_an_entry_releases_the_previous_transaction() {
        let repo = LocalRepository::new();
        let first = confirmed_revenue(&repo, 10, 250.0).await;
        let second = confirmed_revenue(&repo, 11, 250.0).await;
        let bank = BankAccountId::new();
        repo.import_statement(bank, "c.csv", &[line(10, "PIX", 250.0)])
            .await
            .unwrap();
        let entry = repo.list_statement_entries(Some(bank)).await.unwrap()[0].id;

        assert!(repo.reconcile(entry, first).await.unwrap());
        assert!(repo.reconcile(entry, second).await.unwrap());
        assert!(repo.unreconcile(entry).await.unwrap());

        let offered: Vec<_> = repo
            .suggest_matches(Some(bank))
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.system_transaction_id)
            .collect();
        assert_eq!(offered, vec![first]);
        assert!(repo.reconcile(entry, first).await.unwrap());
    }

    #[tokio::test]
    async fn test_equal_confidence_suggestions_follow_statement_dates() {
        let repo = LocalRepository::new();
        confirmed_revenue(&repo, 20, 300.0).await;
        confirmed_revenue(&repo, 4, 200.0).await;
        confirmed_revenue(&repo, 12, 100.0).await;
        let bank = BankAccountId::new();
        repo.import_statement(
            bank,
            "d.csv",
            &[line(20, "C", 300.0), line(4, "A", 200.0), line(12, "B", 100.0)],
        )
        .await
        .unwrap();

        for _ in 0..3 {
            let order: Vec<_> = repo
                .suggest_matches(Some(bank))
                .await
                .unwrap()
                .into_iter()
                .map(|s| s.statement_description)
                .collect();
            assert_eq!(order, vec!["A", "B", "C"]);
        }
    }
}
