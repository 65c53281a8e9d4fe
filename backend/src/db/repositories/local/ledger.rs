//! Ledger procedure emulation.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};

use super::{missing_reference, not_found, LocalData, LocalRepository};
use crate::db::repository::{
    ErrorContext, LedgerRepository, MovementKind, RepositoryError, RepositoryResult,
};
use crate::models::*;

const REVERSAL_ENTITY: &str = "reversal";
const SETTLEMENT_ENTITY: &str = "settlement";
const POLICY_ENTITY: &str = "policy";

fn movement_context() -> ErrorContext {
    ErrorContext::new("create_financial_movement").with_entity("financial_transaction")
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn reverse_failure(id: LedgerTransactionId, message: &str) -> ReverseResult {
    ReverseResult {
        success: false,
        reversal_id: None,
        original_id: Some(id),
        reversed_amount: None,
        error: Some(message.to_string()),
        message: None,
    }
}

fn settle_failure(message: &str) -> SettleResult {
    SettleResult {
        success: false,
        amount: 0.0,
        message: Some(message.to_string()),
    }
}

impl LocalData {
    fn account_by_name(&self, name: &str) -> Option<&FinancialAccount> {
        self.accounts
            .values()
            .find(|a| a.is_system && a.name == name)
    }

    fn sorted_accounts(&self) -> Vec<FinancialAccount> {
        let mut accounts: Vec<FinancialAccount> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.name.cmp(&b.name)));
        accounts
    }

    fn seed_default_accounts(&mut self) {
        for (code, name, account_type) in DEFAULT_ACCOUNTS {
            let exists = self
                .accounts
                .values()
                .any(|a| a.is_system && a.code.as_deref() == Some(*code));
            if exists {
                continue;
            }
            let account = FinancialAccount {
                id: AccountId::new(),
                name: (*name).to_string(),
                code: Some((*code).to_string()),
                description: None,
                account_type: *account_type,
                parent_id: None,
                is_system: true,
                status: AccountStatus::Active,
            };
            self.accounts.insert(account.id, account);
        }
    }

    fn account_type(&self, id: AccountId) -> Option<AccountType> {
        self.accounts.get(&id).map(|a| a.account_type)
    }

    /// Validate and store a movement. The bank leg is appended first so the
    /// balance check sees the completed movement.
    pub(super) fn post_movement(
        &mut self,
        movement: &MovementInput,
        related: Option<(&str, String)>,
    ) -> RepositoryResult<LedgerTransactionId> {
        if movement.description.trim().is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Description is required",
                movement_context().with_code("23502"),
            ));
        }

        let mut entries = movement.entries.clone();
        if movement.has_bank_counterpart() {
            if let Some(bank) = movement.bank_account_id {
                if self.account_type(bank) != Some(AccountType::Asset) {
                    return Err(RepositoryError::validation_with_context(
                        "Bank account must be an asset account",
                        movement_context().with_entity_id(bank),
                    ));
                }
                let total = entries_total(&entries);
                entries.push(LedgerEntryInput::new(bank, -total));
            }
        }

        for entry in &entries {
            match self.accounts.get(&entry.account_id) {
                None => return Err(missing_reference("financial_account", entry.account_id)),
                Some(account) if account.is_archived() => {
                    return Err(RepositoryError::validation_with_context(
                        format!("Account {} is archived", account.name),
                        movement_context().with_entity_id(account.id),
                    ))
                }
                Some(_) => {}
            }
        }

        if !is_balanced(&entries) {
            return Err(RepositoryError::validation_with_context(
                "Unbalanced transaction: entries must sum to zero",
                movement_context().with_details(format!(
                    "entries={}, sum={:.2}",
                    entries.len(),
                    entries_total(&entries)
                )),
            ));
        }

        let id = LedgerTransactionId::new();
        let (related_entity_type, related_entity_id) = match related {
            Some((kind, rid)) => (Some(kind.to_string()), Some(rid)),
            None => (
                movement.related_entity_type.clone(),
                movement.related_entity_id.clone(),
            ),
        };
        let header = FinancialTransaction {
            id,
            description: movement.description.trim().to_string(),
            transaction_date: movement.transaction_date,
            reference_number: movement.reference_number.clone(),
            related_entity_type,
            related_entity_id,
            due_date: movement.due_date,
            is_void: false,
            void_reason: None,
            is_confirmed: movement.is_confirmed,
            reconciled: false,
            created_at: Utc::now(),
        };
        let posted = entries
            .into_iter()
            .map(|e| LedgerEntry {
                id: LedgerEntryId::new(),
                transaction_id: id,
                account_id: e.account_id,
                amount: e.amount,
                memo: e.memo,
            })
            .collect();
        self.ledger.push(TransactionWithEntries {
            transaction: header,
            entries: posted,
        });
        Ok(id)
    }

    /// Movements that count in reports: not voided and not a reversal.
    fn is_reportable(tx: &TransactionWithEntries) -> bool {
        !tx.transaction.is_void
            && tx.transaction.related_entity_type.as_deref() != Some(REVERSAL_ENTITY)
    }

    /// (income, expense) carried by the result-account legs of a movement.
    fn income_expense(&self, tx: &TransactionWithEntries) -> (f64, f64) {
        tx.entries
            .iter()
            .fold((0.0, 0.0), |(inc, exp), e| match self.account_type(e.account_id) {
                Some(AccountType::Revenue) => (inc - e.amount, exp),
                Some(AccountType::Expense) => (inc, exp + e.amount),
                _ => (inc, exp),
            })
    }

    fn is_cash_account(&self, id: AccountId) -> bool {
        self.accounts
            .get(&id)
            .is_some_and(|a| a.account_type == AccountType::Asset && a.name != RECEIVABLE_ACCOUNT)
    }

    /// Net effect of a movement on cash accounts (receivables excluded).
    pub(super) fn cash_delta(&self, tx: &TransactionWithEntries) -> f64 {
        tx.entries
            .iter()
            .filter(|e| self.is_cash_account(e.account_id))
            .map(|e| e.amount)
            .sum()
    }

    fn summarize(&self, start: NaiveDate, end: NaiveDate) -> FinancialSummary {
        let mut summary = FinancialSummary::default();
        for tx in self.ledger.iter().filter(|t| Self::is_reportable(t)) {
            let header = &tx.transaction;
            let date = if header.is_confirmed {
                header.transaction_date
            } else {
                header.due_date.unwrap_or(header.transaction_date)
            };
            if date < start || date > end {
                continue;
            }
            let (income, expense) = self.income_expense(tx);
            if income == 0.0 && expense == 0.0 {
                continue;
            }
            if header.is_confirmed {
                summary.total_income += income;
                summary.total_expense += expense;
            } else {
                summary.pending_income += income;
                summary.pending_expense += expense;
            }
            summary.transaction_count += 1;
        }
        summary.net_result = summary.total_income - summary.total_expense;
        summary.cash_balance = self.ledger.iter().map(|t| self.cash_delta(t)).sum();
        summary
    }
}

#[async_trait]
impl LedgerRepository for LocalRepository {
    async fn list_accounts(&self) -> RepositoryResult<Vec<FinancialAccount>> {
        self.check_health()?;
        Ok(self.data.read().sorted_accounts())
    }

    async fn ensure_default_accounts(&self) -> RepositoryResult<Vec<FinancialAccount>> {
        self.check_health()?;
        let mut data = self.data.write();
        data.seed_default_accounts();
        Ok(data.sorted_accounts())
    }

    async fn create_account(&self, input: &AccountInput) -> RepositoryResult<FinancialAccount> {
        self.check_health()?;
        let ctx = || ErrorContext::new("create_account").with_entity("financial_account");
        let name = input.name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_with_context(
                "Account name is required",
                ctx().with_code("23502"),
            ));
        }
        let mut data = self.data.write();
        if let Some(code) = input.code.as_deref().filter(|c| !c.is_empty()) {
            if data.accounts.values().any(|a| a.code.as_deref() == Some(code)) {
                return Err(RepositoryError::validation_with_context(
                    format!("duplicate key value: code={}", code),
                    ctx().with_code("23505"),
                ));
            }
        }
        if let Some(parent) = input.parent_id {
            if !data.accounts.contains_key(&parent) {
                return Err(missing_reference("financial_account", parent));
            }
        }
        let account = FinancialAccount {
            id: AccountId::new(),
            name: name.to_string(),
            code: input.code.clone(),
            description: input.description.clone(),
            account_type: input.account_type,
            parent_id: input.parent_id,
            is_system: false,
            status: AccountStatus::Active,
        };
        data.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn archive_account(&self, id: AccountId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        let account = data
            .accounts
            .get_mut(&id)
            .ok_or_else(|| not_found("financial_account", id))?;
        if account.is_system {
            return Err(RepositoryError::validation_with_context(
                "System accounts cannot be archived",
                ErrorContext::new("archive_financial_account")
                    .with_entity_id(id)
                    .with_code("P0001"),
            ));
        }
        let changed = !account.is_archived();
        account.status = AccountStatus::Archived;
        Ok(changed)
    }

    async fn create_financial_movement(
        &self,
        movement: &MovementInput,
    ) -> RepositoryResult<LedgerTransactionId> {
        self.check_health()?;
        self.data.write().post_movement(movement, None)
    }

    async fn get_recent_transactions(
        &self,
        limit: usize,
        offset: usize,
        kind: Option<MovementKind>,
    ) -> RepositoryResult<Vec<TransactionWithEntries>> {
        self.check_health()?;
        let data = self.data.read();
        let mut txs: Vec<&TransactionWithEntries> = data
            .ledger
            .iter()
            .filter(|t| {
                let (income, expense) = data.income_expense(t);
                match kind {
                    Some(MovementKind::Revenue) => income != 0.0,
                    Some(MovementKind::Expense) => expense != 0.0,
                    None => true,
                }
            })
            .collect();
        txs.sort_by(|a, b| {
            b.transaction
                .transaction_date
                .cmp(&a.transaction.transaction_date)
                .then(b.transaction.created_at.cmp(&a.transaction.created_at))
        });
        Ok(txs.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn void_transaction(
        &self,
        id: LedgerTransactionId,
        reason: &str,
    ) -> RepositoryResult<ReverseResult> {
        self.check_health()?;
        let mut data = self.data.write();

        let Some(original) = data.ledger.iter_mut().find(|t| t.transaction.id == id) else {
            return Ok(reverse_failure(id, "Transação não encontrada"));
        };
        if original.transaction.is_void {
            return Ok(reverse_failure(id, "Transação já estornada"));
        }
        if original.transaction.related_entity_type.as_deref() == Some(REVERSAL_ENTITY) {
            return Ok(reverse_failure(id, "Não é possível estornar um estorno"));
        }
        if reason.trim().is_empty() {
            return Ok(reverse_failure(id, "Motivo do estorno é obrigatório"));
        }

        original.transaction.is_void = true;
        original.transaction.void_reason = Some(reason.trim().to_string());
        let reversed_amount = original.total_amount();
        let movement = MovementInput {
            description: format!("Estorno: {}", original.transaction.description),
            transaction_date: today(),
            reference_number: original.transaction.reference_number.clone(),
            related_entity_type: None,
            related_entity_id: None,
            due_date: None,
            bank_account_id: None,
            is_confirmed: original.transaction.is_confirmed,
            entries: original
                .entries
                .iter()
                .map(|e| LedgerEntryInput {
                    account_id: e.account_id,
                    amount: -e.amount,
                    memo: Some(format!("Estorno: {}", reason.trim())),
                })
                .collect(),
        };

        // Reversal legs hit the same accounts, archived or not.
        let reversal_id = LedgerTransactionId::new();
        let header = FinancialTransaction {
            id: reversal_id,
            description: movement.description.clone(),
            transaction_date: movement.transaction_date,
            reference_number: movement.reference_number.clone(),
            related_entity_type: Some(REVERSAL_ENTITY.to_string()),
            related_entity_id: Some(id.to_string()),
            due_date: None,
            is_void: false,
            void_reason: None,
            is_confirmed: movement.is_confirmed,
            reconciled: false,
            created_at: Utc::now(),
        };
        let entries = movement
            .entries
            .into_iter()
            .map(|e| LedgerEntry {
                id: LedgerEntryId::new(),
                transaction_id: reversal_id,
                account_id: e.account_id,
                amount: e.amount,
                memo: e.memo,
            })
            .collect();
        data.ledger.push(TransactionWithEntries {
            transaction: header,
            entries,
        });

        log::info!(
            "Voided ledger transaction {} (reversal {}, amount {:.2})",
            id,
            reversal_id,
            reversed_amount
        );
        Ok(ReverseResult {
            success: true,
            reversal_id: Some(reversal_id),
            original_id: Some(id),
            reversed_amount: Some(reversed_amount),
            error: None,
            message: Some("Transação estornada com sucesso".to_string()),
        })
    }

    async fn get_account_balances(&self) -> RepositoryResult<Vec<AccountBalance>> {
        self.check_health()?;
        let data = self.data.read();
        let mut totals: HashMap<AccountId, (f64, u64)> = HashMap::new();
        for entry in data.ledger.iter().flat_map(|t| t.entries.iter()) {
            let slot = totals.entry(entry.account_id).or_insert((0.0, 0));
            slot.0 += entry.amount;
            slot.1 += 1;
        }
        Ok(data
            .sorted_accounts()
            .into_iter()
            .map(|account| {
                let (balance, entry_count) = totals.get(&account.id).copied().unwrap_or_default();
                AccountBalance {
                    account,
                    balance,
                    entry_count,
                }
            })
            .collect())
    }

    async fn get_financial_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<SummaryComparison> {
        self.check_health()?;
        if end < start {
            return Err(RepositoryError::validation_with_context(
                "End date precedes start date",
                ErrorContext::new("get_financial_summary"),
            ));
        }
        let span = end - start;
        let previous_end = start - Duration::days(1);
        let previous_start = previous_end - span;

        let data = self.data.read();
        Ok(SummaryComparison {
            current: data.summarize(start, end),
            previous: Some(data.summarize(previous_start, previous_end)),
        })
    }

    async fn get_cash_flow(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: CashFlowGranularity,
    ) -> RepositoryResult<Vec<CashFlowPoint>> {
        self.check_health()?;
        let data = self.data.read();
        let mut buckets: BTreeMap<String, (f64, f64)> = BTreeMap::new();
        for tx in data
            .ledger
            .iter()
            .filter(|t| LocalData::is_reportable(t) && t.transaction.is_confirmed)
        {
            let date = tx.transaction.transaction_date;
            if date < start || date > end {
                continue;
            }
            let (income, expense) = data.income_expense(tx);
            if income == 0.0 && expense == 0.0 {
                continue;
            }
            let key = match granularity {
                CashFlowGranularity::Day => date.format("%Y-%m-%d").to_string(),
                CashFlowGranularity::Month => date.format("%Y-%m").to_string(),
            };
            let slot = buckets.entry(key).or_insert((0.0, 0.0));
            slot.0 += income;
            slot.1 += expense;
        }
        Ok(buckets
            .into_iter()
            .map(|(period, (income, expense))| CashFlowPoint {
                period,
                income,
                expense,
                balance: income - expense,
            })
            .collect())
    }

    async fn get_dre(&self, year: i32) -> RepositoryResult<Vec<DreRow>> {
        self.check_health()?;
        let data = self.data.read();
        let mut months: HashMap<AccountId, [f64; 12]> = HashMap::new();
        for tx in data.ledger.iter().filter(|t| LocalData::is_reportable(t)) {
            let date = tx.transaction.transaction_date;
            if date.year() != year {
                continue;
            }
            let month = date.month0() as usize;
            for entry in &tx.entries {
                let signed = match data.account_type(entry.account_id) {
                    Some(AccountType::Revenue) => -entry.amount,
                    Some(AccountType::Expense) => entry.amount,
                    _ => continue,
                };
                months.entry(entry.account_id).or_insert([0.0; 12])[month] += signed;
            }
        }

        let mut rows: Vec<DreRow> = months
            .into_iter()
            .filter_map(|(account_id, months)| {
                let account = data.accounts.get(&account_id)?;
                Some(DreRow {
                    category: account.name.clone(),
                    account_type: account.account_type,
                    months,
                    total: months.iter().sum(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            let rank = |t: AccountType| u8::from(t != AccountType::Revenue);
            rank(a.account_type)
                .cmp(&rank(b.account_type))
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(rows)
    }

    async fn settle_commission(
        &self,
        id: LedgerTransactionId,
        bank_account_id: AccountId,
    ) -> RepositoryResult<SettleResult> {
        self.check_health()?;
        let mut data = self.data.write();

        if data.account_type(bank_account_id) != Some(AccountType::Asset) {
            return Ok(settle_failure("Conta bancária inválida"));
        }
        let Some(idx) = data.ledger.iter().position(|t| t.transaction.id == id) else {
            return Ok(settle_failure("Transação não encontrada"));
        };
        let (description, receivable, amount) = {
            let tx = &data.ledger[idx];
            if tx.transaction.is_void {
                return Ok(settle_failure("Transação estornada não pode ser liquidada"));
            }
            if tx.transaction.is_confirmed {
                return Ok(settle_failure("Transação já liquidada"));
            }
            let receivable = tx
                .entries
                .iter()
                .find(|e| e.amount > 0.0 && data.account_type(e.account_id) == Some(AccountType::Asset))
                .map(|e| e.account_id);
            (tx.transaction.description.clone(), receivable, tx.total_amount())
        };
        let Some(receivable) = receivable else {
            return Ok(settle_failure("Transação sem conta a receber"));
        };

        let settlement = MovementInput {
            description: format!("Liquidação: {}", description),
            transaction_date: today(),
            reference_number: None,
            related_entity_type: None,
            related_entity_id: None,
            due_date: None,
            bank_account_id: None,
            is_confirmed: true,
            entries: vec![
                LedgerEntryInput::new(bank_account_id, amount),
                LedgerEntryInput::new(receivable, -amount),
            ],
        };
        data.post_movement(&settlement, Some((SETTLEMENT_ENTITY, id.to_string())))?;
        data.ledger[idx].transaction.is_confirmed = true;

        Ok(SettleResult {
            success: true,
            amount,
            message: Some("Comissão liquidada com sucesso".to_string()),
        })
    }

    async fn register_policy_commission(
        &self,
        registration: &CommissionRegistration,
    ) -> RepositoryResult<CommissionRegistrationResult> {
        self.check_health()?;
        let mut data = self.data.write();
        let policy_key = registration.policy_id.to_string();

        if let Some(existing) = data.ledger.iter().find(|t| {
            !t.transaction.is_void
                && t.transaction.related_entity_type.as_deref() == Some(POLICY_ENTITY)
                && t.transaction.related_entity_id.as_deref() == Some(policy_key.as_str())
        }) {
            return Ok(CommissionRegistrationResult {
                success: true,
                transaction_id: Some(existing.transaction.id),
                message: Some("Comissão já registrada".to_string()),
            });
        }
        if registration.commission_amount <= 0.0 || !registration.commission_amount.is_finite() {
            return Ok(CommissionRegistrationResult {
                success: false,
                transaction_id: None,
                message: Some("Valor de comissão inválido".to_string()),
            });
        }

        data.seed_default_accounts();
        let (receivable, revenue) = match (
            data.account_by_name(RECEIVABLE_ACCOUNT).map(|a| a.id),
            data.account_by_name(COMMISSION_REVENUE_ACCOUNT).map(|a| a.id),
        ) {
            (Some(r), Some(v)) => (r, v),
            _ => {
                return Err(RepositoryError::internal_with_context(
                    "Default commission accounts missing",
                    ErrorContext::new("register_policy_commission"),
                ))
            }
        };

        let mut description = format!(
            "Comissão {} - {}",
            registration.ramo_name, registration.client_name
        );
        if !registration.policy_number.trim().is_empty() {
            description.push_str(&format!(" (Apólice {})", registration.policy_number.trim()));
        }
        let amount = registration.commission_amount;
        let movement = MovementInput {
            description,
            transaction_date: registration.transaction_date,
            reference_number: None,
            related_entity_type: None,
            related_entity_id: None,
            due_date: Some(registration.transaction_date),
            bank_account_id: None,
            is_confirmed: false,
            entries: vec![
                LedgerEntryInput::new(receivable, amount),
                LedgerEntryInput::new(revenue, -amount),
            ],
        };
        let id = data.post_movement(&movement, Some((POLICY_ENTITY, policy_key)))?;
        Ok(CommissionRegistrationResult {
            success: true,
            transaction_id: Some(id),
            message: None,
        })
    }

    async fn bulk_create_movements(
        &self,
        asset_account_id: AccountId,
        rows: &[BulkMovementRow],
    ) -> RepositoryResult<BulkImportResult> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.accounts.contains_key(&asset_account_id) {
            return Err(missing_reference("financial_account", asset_account_id));
        }

        let mut result = BulkImportResult {
            total_processed: rows.len(),
            ..Default::default()
        };
        for (index, row) in rows.iter().enumerate() {
            if row.amount == 0.0 || !row.amount.is_finite() {
                result.errors.push(BulkImportError {
                    index,
                    message: "Valor inválido".to_string(),
                    description: Some(row.description.clone()),
                });
                continue;
            }
            let amount = row.amount.abs();
            let (asset_leg, category_leg) = if row.amount > 0.0 {
                (amount, -amount)
            } else {
                (-amount, amount)
            };
            let mut asset = LedgerEntryInput::new(asset_account_id, asset_leg);
            let mut category = LedgerEntryInput::new(row.category_account_id, category_leg);
            if let Some(memo) = &row.memo {
                asset = asset.with_memo(memo.clone());
                category = category.with_memo(memo.clone());
            }
            let movement = MovementInput {
                description: row.description.clone(),
                transaction_date: row.transaction_date,
                reference_number: row.reference_number.clone(),
                related_entity_type: None,
                related_entity_id: None,
                due_date: None,
                bank_account_id: None,
                is_confirmed: true,
                entries: vec![asset, category],
            };
            if let Err(e) = data.post_movement(&movement, None) {
                result.errors.push(BulkImportError {
                    index,
                    message: e.message().to_string(),
                    description: Some(row.description.clone()),
                });
            }
        }
        result.error_count = result.errors.len();
        result.success_count = result.total_processed - result.error_count;
        Ok(result)
    }
}
