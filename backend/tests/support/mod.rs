#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;

use brokerdesk::models::{
    Client, ClientInput, ClientStatus, PolicyInput, PolicyStatus, StatementEntryInput,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Fixtures ====================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn client_input(name: &str) -> ClientInput {
    ClientInput {
        name: name.to_string(),
        email: Some(format!(
            "{}@example.com",
            name.split_whitespace().next().unwrap_or("cliente").to_lowercase()
        )),
        phone: Some("(11) 98765-4321".to_string()),
        status: ClientStatus::Active,
        ..ClientInput::default()
    }
}

pub fn policy_input(client: &Client, number: &str, premium: f64, expiration: NaiveDate) -> PolicyInput {
    PolicyInput {
        client_id: client.id,
        policy_number: Some(number.to_string()),
        insurance_company: None,
        ramo: Some("Auto".to_string()),
        producer_id: None,
        insured_asset: "Onix 2022".to_string(),
        premium_value: premium,
        commission_rate: 10.0,
        status: PolicyStatus::AwaitingPolicy,
        start_date: Some(date(2025, 3, 1)),
        expiration_date: expiration,
        automatic_renewal: false,
    }
}

pub fn statement_line(day: u32, description: &str, amount: f64) -> StatementEntryInput {
    StatementEntryInput {
        transaction_date: date(2025, 3, day),
        description: description.to_string(),
        amount,
        reference_number: None,
    }
}
