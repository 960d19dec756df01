//! Fund transfers.
//!
//! An internal transfer writes a `Transfer Out` row on the sender, a
//! `Transfer In` row on the receiver and, when the transfer class carries a
//! fee, a `Service Charge` row on the sender. All rows share one reference
//! and one unit of work. Both account rows are locked in ascending id order.

use serde::{Deserialize, Serialize};
use tracing::info;

use ledger_core::{
    add_cents, ensure_positive, format_cents, generate_reference, Account, AccountStatus, Actor,
    LedgerError, LedgerPolicy, Result, Transaction, TransactionType, Trigger,
};
use ledger_store::UnitOfWork;

use crate::balance::current_balance;
use crate::recorder::Posting;
use crate::warnings::{maintaining_warnings, Warning};
use crate::{finish, not_found, Engine};

/// Where the money goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferDestination {
    /// An account at this bank.
    Internal {
        /// Receiver account number.
        account_number: String,
    },
    /// An account at another bank. Only the sender side is recorded here.
    External {
        /// Receiving bank.
        bank_name: String,
        /// Account number at the receiving bank.
        account_number: String,
        /// Name on the receiving account.
        account_name: String,
    },
}

/// A transfer instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Sender account number.
    pub from_account: String,
    /// Destination.
    pub destination: TransferDestination,
    /// Amount to move, in cents.
    pub amount_cents: i64,
    /// Optional note.
    #[serde(default)]
    pub description: Option<String>,
}

/// Fee class of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferClass {
    /// Both accounts belong to the same customer.
    SameCustomer,
    /// Different customers at this bank.
    OtherCustomer,
    /// Another bank.
    OtherBank,
}

impl TransferClass {
    /// Flat fee for this class, in cents.
    #[must_use]
    pub const fn fee_cents(self, policy: &LedgerPolicy) -> i64 {
        match self {
            Self::SameCustomer => 0,
            Self::OtherCustomer => policy.inter_customer_fee_cents,
            Self::OtherBank => policy.other_bank_fee_cents,
        }
    }

    fn classify(sender: &Account, receiver: Option<&Account>) -> Self {
        match receiver {
            None => Self::OtherBank,
            Some(r) if r.customer_id == sender.customer_id => Self::SameCustomer,
            Some(_) => Self::OtherCustomer,
        }
    }
}

/// Result of a transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    /// Reference shared by every row.
    pub reference: String,
    /// Fee class.
    pub class: TransferClass,
    /// Amount moved, in cents.
    pub amount_cents: i64,
    /// Fee charged, in cents.
    pub fee_cents: i64,
    /// Sender debit row.
    pub debit: Transaction,
    /// Receiver credit row; absent for other-bank transfers.
    pub credit: Option<Transaction>,
    /// Fee row; absent when the class is free.
    pub fee: Option<Transaction>,
    /// Sender balance afterwards, in cents.
    pub sender_balance_cents: i64,
    /// Sender status afterwards.
    pub sender_status: AccountStatus,
    /// Maintaining-balance warnings for the sender.
    pub warnings: Vec<Warning>,
}

impl Engine {
    /// Move money out of `request.from_account`.
    ///
    /// A customer actor may only send from their own accounts. The sender
    /// must cover amount plus fee; a resulting maintaining-balance shortfall
    /// is reported as a warning, not an error.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` for a non-positive or oversized amount
    /// - `LedgerError::SameAccount` when sender and receiver are the same
    /// - `LedgerError::AccountNotFound` for unknown internal accounts
    /// - `LedgerError::Forbidden` when a customer sends from another's account
    /// - `LedgerError::InsufficientFunds` when amount plus fee exceeds the balance
    /// - lock/flag/closed validation errors on either side
    pub async fn transfer(&self, request: &TransferRequest, actor: Actor) -> Result<TransferReceipt> {
        ensure_positive(request.amount_cents)?;

        // Resolve ids before taking locks so rows can be locked in id order.
        let sender = self.find_account(&request.from_account).await?;
        let receiver = match &request.destination {
            TransferDestination::Internal { account_number } => {
                if *account_number == request.from_account {
                    return Err(LedgerError::SameAccount);
                }
                Some(self.find_account(account_number).await?)
            }
            TransferDestination::External { .. } => None,
        };

        let mut uow = self.store.begin().await?;
        let result = self
            .transfer_in(uow.as_mut(), request, &sender, receiver.as_ref(), actor)
            .await;
        let receipt = finish(uow, result).await?;

        info!(
            reference = %receipt.reference,
            from = %request.from_account,
            class = ?receipt.class,
            amount_cents = receipt.amount_cents,
            fee_cents = receipt.fee_cents,
            actor = %actor,
            "Transfer completed"
        );
        Ok(receipt)
    }

    async fn transfer_in(
        &self,
        uow: &mut dyn UnitOfWork,
        request: &TransferRequest,
        sender: &Account,
        receiver: Option<&Account>,
        actor: Actor,
    ) -> Result<TransferReceipt> {
        let now = self.now();
        let (mut sender, mut receiver) = lock_pair(uow, sender, receiver).await?;

        if let Actor::Customer(customer_id) = actor {
            if sender.customer_id != customer_id {
                return Err(LedgerError::Forbidden(format!(
                    "account {} does not belong to the caller",
                    sender.account_number
                )));
            }
        }
        sender.ensure_debit_allowed()?;
        if let Some(receiver) = &receiver {
            receiver.ensure_credit_allowed()?;
        }

        let class = TransferClass::classify(&sender, receiver.as_ref());
        let fee_cents = class.fee_cents(&self.policy);
        let required = add_cents(request.amount_cents, fee_cents)?;

        let sender_balance = current_balance(uow, &self.policy.catalog, sender.id).await?;
        if sender_balance < required {
            return Err(LedgerError::InsufficientFunds {
                balance: sender_balance,
                required,
            });
        }
        if let Some(receiver) = &receiver {
            let receiver_balance = current_balance(uow, &self.policy.catalog, receiver.id).await?;
            add_cents(receiver_balance, request.amount_cents)?;
        }

        let reference = generate_reference(TransactionType::TransferOut, now.date_naive(), sender.id);
        let note = request.description.as_deref().unwrap_or("Fund transfer");
        let recorder = self.recorder();

        let (debit, credit) = match (&request.destination, &receiver) {
            (_, Some(receiver)) => {
                let debit = recorder
                    .record(
                        uow,
                        Posting::new(
                            &sender,
                            TransactionType::TransferOut,
                            request.amount_cents,
                            format!("{note} to {}", receiver.account_number),
                        )
                        .related_to(receiver.id)
                        .with_reference(reference.clone()),
                        actor,
                        now,
                    )
                    .await?;
                let credit = recorder
                    .record(
                        uow,
                        Posting::new(
                            receiver,
                            TransactionType::TransferIn,
                            request.amount_cents,
                            format!("{note} from {}", sender.account_number),
                        )
                        .related_to(sender.id)
                        .with_reference(reference.clone()),
                        actor,
                        now,
                    )
                    .await?;
                (debit, Some(credit))
            }
            (
                TransferDestination::External {
                    bank_name,
                    account_number,
                    account_name,
                },
                None,
            ) => {
                let debit = recorder
                    .record(
                        uow,
                        Posting::new(
                            &sender,
                            TransactionType::TransferOut,
                            request.amount_cents,
                            format!("{note} to {account_name} ({bank_name} {account_number})"),
                        )
                        .with_reference(reference.clone()),
                        actor,
                        now,
                    )
                    .await?;
                (debit, None)
            }
            (TransferDestination::Internal { account_number }, None) => {
                return Err(not_found(account_number));
            }
        };

        let fee = if fee_cents > 0 {
            let row = recorder
                .record(
                    uow,
                    Posting::new(
                        &sender,
                        TransactionType::ServiceCharge,
                        fee_cents,
                        format!("Transfer fee {}", format_cents(fee_cents)),
                    )
                    .with_reference(reference.clone()),
                    actor,
                    now,
                )
                .await?;
            Some(row)
        } else {
            None
        };

        let sender_after = current_balance(uow, &self.policy.catalog, sender.id).await?;
        self.settle(uow, &mut sender, sender_after, Trigger::Mutation, now)
            .await?;
        if let Some(receiver) = receiver.as_mut() {
            let receiver_after = current_balance(uow, &self.policy.catalog, receiver.id).await?;
            self.settle(uow, receiver, receiver_after, Trigger::Mutation, now)
                .await?;
        }

        Ok(TransferReceipt {
            reference,
            class,
            amount_cents: request.amount_cents,
            fee_cents,
            debit,
            credit,
            fee,
            sender_balance_cents: sender_after,
            sender_status: sender.status,
            warnings: maintaining_warnings(&sender, sender_after),
        })
    }
}

/// Lock sender and (optional) receiver in ascending id order and return the
/// freshly locked rows in (sender, receiver) order.
async fn lock_pair(
    uow: &mut dyn UnitOfWork,
    sender: &Account,
    receiver: Option<&Account>,
) -> Result<(Account, Option<Account>)> {
    let Some(receiver) = receiver else {
        let locked = uow
            .lock_account(sender.id)
            .await?
            .ok_or_else(|| not_found(&sender.account_number))?;
        return Ok((locked, None));
    };

    let (first, second) = if sender.id < receiver.id {
        (sender, receiver)
    } else {
        (receiver, sender)
    };
    let first_locked = uow
        .lock_account(first.id)
        .await?
        .ok_or_else(|| not_found(&first.account_number))?;
    let second_locked = uow
        .lock_account(second.id)
        .await?
        .ok_or_else(|| not_found(&second.account_number))?;

    if first_locked.id == sender.id {
        Ok((first_locked, Some(second_locked)))
    } else {
        Ok((second_locked, Some(first_locked)))
    }
}
