//! Nightly batch: fees, lifecycle escalation and archival.
//!
//! Accounts are processed one at a time, each in its own unit of work:
//!
//! 1. lock the row and compute the balance
//! 2. evaluate the lifecycle (`Scheduled`); stop if the account recovered or
//!    was closed/archived
//! 3. charge the fee if due, then evaluate again (`AfterFee`)
//! 4. commit
//!
//! A failing account is rolled back, logged and counted; the batch moves on.
//! A configuration error aborts the whole run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use ledger_core::{
    format_cents, AccountId, AccountStatus, FeeCharge, LedgerError, Result, RunId, Transition,
    Trigger,
};
use ledger_store::{AccountScope, UnitOfWork};

use crate::balance::current_balance;
use crate::{finish, not_found, Engine};

/// What happened to one account during a run.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOutcome {
    /// Account processed.
    pub account_id: AccountId,
    /// Its number.
    pub account_number: String,
    /// Balance when the row was locked, in cents.
    pub opening_balance_cents: i64,
    /// Balance at commit, in cents.
    pub closing_balance_cents: i64,
    /// Status at commit.
    pub status: AccountStatus,
    /// Every status change applied, in order.
    pub transitions: Vec<Transition>,
    /// Fee charged, if any.
    pub fee: Option<FeeCharge>,
}

impl AccountOutcome {
    fn describe(&self) -> String {
        let mut line = format!(
            "account {}: balance {}",
            self.account_number,
            format_cents(self.opening_balance_cents)
        );
        if let Some(fee) = &self.fee {
            line.push_str(&format!(
                ", {} fee {} charged, balance now {}",
                fee.fee_category.as_str(),
                format_cents(fee.balance_before_cents - fee.balance_after_cents),
                format_cents(fee.balance_after_cents)
            ));
        }
        for transition in &self.transitions {
            line.push_str(&format!(", {}", describe_transition(*transition)));
        }
        if self.fee.is_none() && self.transitions.is_empty() {
            line.push_str(", no change");
        }
        line
    }
}

fn describe_transition(transition: Transition) -> &'static str {
    match transition {
        Transition::Unchanged | Transition::Frozen => "unchanged",
        Transition::FellBelowMaintaining => "fell below maintaining balance",
        Transition::Recovered => "recovered to active",
        Transition::Flagged { .. } => "flagged for removal",
        Transition::Closed => "closed after warning period",
        Transition::Archived => "archived and closed",
    }
}

/// Summary of one nightly run.
#[derive(Debug, Clone, Serialize)]
pub struct NightlyReport {
    /// Run identifier.
    pub run_id: RunId,
    /// Business date of the run.
    pub run_date: NaiveDate,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Accounts whose unit of work committed.
    pub accounts_processed: usize,
    /// Fees charged.
    pub fees_charged: usize,
    /// Sum of fees charged, in cents.
    pub fees_total_cents: i64,
    /// Accounts that fell below maintaining.
    pub accounts_below_maintaining: usize,
    /// Accounts that recovered to active.
    pub accounts_recovered: usize,
    /// Accounts flagged for removal.
    pub accounts_flagged: usize,
    /// Accounts closed after the warning period.
    pub accounts_closed: usize,
    /// Accounts archived.
    pub accounts_archived: usize,
    /// Accounts whose unit of work was rolled back.
    pub failures: usize,
    /// Human-readable run log.
    pub log: Vec<String>,
}

impl NightlyReport {
    fn start(run_date: NaiveDate, started_at: DateTime<Utc>) -> Self {
        let run_id = RunId::generate();
        Self {
            run_id,
            run_date,
            started_at,
            finished_at: started_at,
            accounts_processed: 0,
            fees_charged: 0,
            fees_total_cents: 0,
            accounts_below_maintaining: 0,
            accounts_recovered: 0,
            accounts_flagged: 0,
            accounts_closed: 0,
            accounts_archived: 0,
            failures: 0,
            log: vec![format!(
                "[{}] nightly run {run_id} started for {run_date}",
                started_at.to_rfc3339()
            )],
        }
    }

    fn record(&mut self, outcome: &AccountOutcome) {
        self.accounts_processed += 1;
        if let Some(fee) = &outcome.fee {
            self.fees_charged += 1;
            self.fees_total_cents += fee.balance_before_cents - fee.balance_after_cents;
        }
        for transition in &outcome.transitions {
            match transition {
                Transition::FellBelowMaintaining => self.accounts_below_maintaining += 1,
                Transition::Recovered => self.accounts_recovered += 1,
                Transition::Flagged { .. } => self.accounts_flagged += 1,
                Transition::Closed => self.accounts_closed += 1,
                Transition::Archived => self.accounts_archived += 1,
                Transition::Unchanged | Transition::Frozen => {}
            }
        }
        self.log.push(outcome.describe());
    }

    fn fail(&mut self, account_number: &str, err: &LedgerError) {
        self.failures += 1;
        self.log
            .push(format!("account {account_number}: FAILED, rolled back: {err}"));
    }

    fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = finished_at;
        self.log.push(format!(
            "[{}] finished: {} processed, {} fees charged ({}), {} below maintaining, \
             {} recovered, {} flagged, {} closed, {} archived, {} failures",
            finished_at.to_rfc3339(),
            self.accounts_processed,
            self.fees_charged,
            format_cents(self.fees_total_cents),
            self.accounts_below_maintaining,
            self.accounts_recovered,
            self.accounts_flagged,
            self.accounts_closed,
            self.accounts_archived,
            self.failures,
        ));
    }

    /// The run log as one newline-terminated block of text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut text = self.log.join("\n");
        text.push('\n');
        text
    }
}

impl Engine {
    /// Run the nightly batch over every open (not closed, not locked) account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Configuration` if the catalog is missing a type
    /// the batch writes, or if any account hits a configuration error; the
    /// accounts already committed stay committed. Returns a storage error if
    /// the account list cannot be read.
    pub async fn run_nightly(&self) -> Result<NightlyReport> {
        if let Err(err) = self.policy.catalog.validate() {
            error!(error = %err, "Nightly run aborted before start");
            return Err(err);
        }

        let mut report = NightlyReport::start(self.today(), self.now());
        info!(run_id = %report.run_id, run_date = %report.run_date, "Nightly run started");

        let accounts = self.store.list_accounts(AccountScope::Open).await?;
        for account in accounts {
            match self.process_account(account.id).await {
                Ok(outcome) => report.record(&outcome),
                Err(err) if err.is_fatal() => {
                    error!(
                        run_id = %report.run_id,
                        account_id = %account.id,
                        error = %err,
                        "Nightly run aborted"
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        run_id = %report.run_id,
                        account_id = %account.id,
                        account_number = %account.account_number,
                        error = %err,
                        "Account failed during nightly run; rolled back"
                    );
                    report.fail(&account.account_number, &err);
                }
            }
        }

        report.finish(self.now());
        info!(
            run_id = %report.run_id,
            processed = report.accounts_processed,
            fees_charged = report.fees_charged,
            flagged = report.accounts_flagged,
            closed = report.accounts_closed,
            archived = report.accounts_archived,
            failures = report.failures,
            "Nightly run finished"
        );
        Ok(report)
    }

    /// Run the nightly steps for one account in its own unit of work.
    ///
    /// # Errors
    ///
    /// Returns any error raised while processing; the unit of work is rolled
    /// back in that case.
    pub async fn process_account(&self, account_id: AccountId) -> Result<AccountOutcome> {
        let now = self.now();
        let mut uow = self.store.begin().await?;
        let result = self.process_locked(uow.as_mut(), account_id, now).await;
        finish(uow, result).await
    }

    async fn process_locked(
        &self,
        uow: &mut dyn UnitOfWork,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<AccountOutcome> {
        let mut account = uow
            .lock_account(account_id)
            .await?
            .ok_or_else(|| not_found(account_id))?;
        let opening = current_balance(uow, &self.policy.catalog, account.id).await?;

        let mut outcome = AccountOutcome {
            account_id: account.id,
            account_number: account.account_number.clone(),
            opening_balance_cents: opening,
            closing_balance_cents: opening,
            status: account.status,
            transitions: Vec::new(),
            fee: None,
        };

        let first = self
            .settle(uow, &mut account, opening, Trigger::Scheduled, now)
            .await?;
        if first.is_change() {
            outcome.transitions.push(first);
        }

        if !account.is_frozen() && first != Transition::Recovered {
            if let Some(charge) = self
                .charge_fee_if_due(uow, &mut account, opening, now)
                .await?
            {
                outcome.closing_balance_cents = charge.balance_after_cents;
                outcome.fee = Some(charge);

                let second = self
                    .settle(
                        uow,
                        &mut account,
                        outcome.closing_balance_cents,
                        Trigger::AfterFee,
                        now,
                    )
                    .await?;
                if second.is_change() {
                    outcome.transitions.push(second);
                }
            }
        }

        outcome.status = account.status;
        Ok(outcome)
    }
}
