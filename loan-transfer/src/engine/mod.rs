pub mod config;
pub mod error;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::instrument;

use std::{str::FromStr, sync::Arc};

pub use config::*;
use error::*;

use crate::{
    atomic_operation::Operations,
    execution::{error::ExecutionError, *},
    journal_entry::{JournalEntries, JournalEntryValues},
    lifecycle::{error::LifecycleError, TransferCommandResult, TransferLifecycle},
    loan::{LoanLookup, LoanValues},
    outbox::{EventSequence, Outbox, OutboxEvent, OutboxListener},
    owner::Owners,
    primitives::*,
    query::{Page, PagingArgs},
    request::{BuybackRequest, SaleRequest, TransferSearchRequest},
    transfer::{Transfer, Transfers},
};

#[derive(Clone)]
pub struct LoanTransferEngine {
    pool: SqlitePool,
    ops: Operations,
    outbox: Outbox,
    owners: Owners,
    transfers: Transfers,
    journal_entries: JournalEntries,
    lifecycle: TransferLifecycle,
    loan_closure: LoanClosureReactions,
    settlement: SettlementStep,
    loans: Arc<dyn LoanLookup>,
    externalize_non_active_loans: bool,
}

impl LoanTransferEngine {
    pub async fn init(
        config: LoanTransferConfig,
        collaborators: Collaborators,
    ) -> Result<Self, EngineError> {
        let pool = match (config.pool, config.db_con) {
            (Some(pool), None) => pool,
            (None, Some(db_con)) => {
                let options = SqliteConnectOptions::from_str(&db_con)?
                    .create_if_missing(true)
                    .foreign_keys(true);
                let mut pool_opts = SqlitePoolOptions::new();
                if let Some(max_connections) = config.max_connections {
                    pool_opts = pool_opts.max_connections(max_connections);
                }
                pool_opts.connect_with(options).await?
            }
            _ => {
                return Err(EngineError::ConfigError(
                    "One of db_con or pool must be set".to_string(),
                ))
            }
        };
        if config.exec_migrations {
            crate::migrate::run(&pool).await?;
        }

        let Collaborators {
            loans,
            accounts,
            business_date,
        } = collaborators;
        let outbox = Outbox::new(&pool);
        let ops = Operations::new(&pool, &outbox, business_date);
        let owners = Owners::new(&pool);
        let transfers = Transfers::new(&pool);
        let journal_entries = JournalEntries::new(&pool, &transfers, accounts);
        let executor = TransferExecutor::new(&transfers, &journal_entries);
        let lifecycle = TransferLifecycle::new(
            &ops,
            &transfers,
            &owners,
            Arc::clone(&loans),
            config.auto_generate_external_id,
        );
        let loan_closure = LoanClosureReactions::new(&ops, &transfers, &executor);
        let settlement = SettlementStep::new(&ops, &transfers, &executor);
        Ok(Self {
            ops,
            outbox,
            owners,
            transfers,
            journal_entries,
            lifecycle,
            loan_closure,
            settlement,
            loans,
            externalize_non_active_loans: config.externalize_non_active_loans,
            pool,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn owners(&self) -> &Owners {
        &self.owners
    }

    pub fn transfers(&self) -> &Transfers {
        &self.transfers
    }

    pub fn journal_entries(&self) -> &JournalEntries {
        &self.journal_entries
    }

    pub fn lifecycle(&self) -> &TransferLifecycle {
        &self.lifecycle
    }

    pub fn settlement(&self) -> &SettlementStep {
        &self.settlement
    }

    pub fn loan_closure(&self) -> &LoanClosureReactions {
        &self.loan_closure
    }

    pub fn business_date(&self) -> chrono::NaiveDate {
        self.ops.business_date()
    }

    #[instrument(name = "loan_transfer.sell_loan", skip(self, request), err)]
    pub async fn sell_loan(
        &self,
        loan_id: LoanId,
        request: SaleRequest,
    ) -> Result<TransferCommandResult, LifecycleError> {
        let command = request.validate(loan_id)?;
        self.lifecycle.sale(command).await
    }

    #[instrument(name = "loan_transfer.buy_back_loan", skip(self, request), err)]
    pub async fn buy_back_loan(
        &self,
        loan_id: LoanId,
        request: BuybackRequest,
    ) -> Result<TransferCommandResult, LifecycleError> {
        let command = request.validate(loan_id)?;
        self.lifecycle.buyback(command).await
    }

    pub async fn cancel_transfer(
        &self,
        id: TransferId,
    ) -> Result<TransferCommandResult, LifecycleError> {
        self.lifecycle.cancel(id).await
    }

    pub async fn cancel_transfer_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<TransferCommandResult, LifecycleError> {
        self.lifecycle.cancel_by_external_id(external_id).await
    }

    #[instrument(name = "loan_transfer.search_transfers", skip(self), err)]
    pub async fn search_transfers(
        &self,
        request: TransferSearchRequest,
        paging: PagingArgs,
    ) -> Result<Page<Transfer>, EngineError> {
        let filter = request.validate()?;
        Ok(self.transfers.list(filter, paging).await?)
    }

    #[instrument(name = "loan_transfer.owner_journal_entries", skip(self), err)]
    pub async fn owner_journal_entries(
        &self,
        owner_external_id: &str,
        paging: PagingArgs,
    ) -> Result<Page<JournalEntryValues>, EngineError> {
        let owner = self.owners.find_by_external_id(owner_external_id).await?;
        Ok(self.journal_entries.list_for_owner(owner.id, paging).await?)
    }

    /// Forwards loans that became closed or overpaid to the loan closure
    /// reactions. Other status changes are ignored.
    #[instrument(
        name = "loan_transfer.on_loan_status_changed",
        skip(self, loan),
        fields(loan_id = %loan.id, status = %loan.status),
        err
    )]
    pub async fn on_loan_status_changed(&self, loan: &LoanValues) -> Result<(), EngineError> {
        if !self.externalize_non_active_loans {
            return Ok(());
        }
        if !(loan.status.is_closed() || loan.status.is_overpaid()) {
            return Ok(());
        }
        self.loan_closure.on_loan_closed_or_overpaid(loan).await?;
        Ok(())
    }

    /// Links a journal entry posted on a loan to the loan's current owner.
    #[instrument(
        name = "loan_transfer.on_loan_journal_entry_created",
        skip(self, entry),
        fields(entry_id = %entry.id),
        err
    )]
    pub async fn on_loan_journal_entry_created(
        &self,
        entry: &JournalEntryValues,
    ) -> Result<Option<OwnerId>, EngineError> {
        let loan_id = match entry.loan_id {
            Some(loan_id) => loan_id,
            None => return Ok(None),
        };
        let mut op = self.ops.begin_for_loan(loan_id).await?;
        let owner_id = self
            .journal_entries
            .record_loan_entry_in_op(&mut op, entry)
            .await?;
        op.commit().await?;
        Ok(owner_id)
    }

    /// Runs the settlement step for the loan on the current business date.
    pub async fn execute_settlement(
        &self,
        loan_id: LoanId,
    ) -> Result<SettlementOutcome, EngineError> {
        let loan = self
            .loans
            .find_by_id(loan_id)
            .await
            .map_err(ExecutionError::from)?
            .ok_or(LifecycleError::LoanNotFound(loan_id))?;
        Ok(self.settlement.execute(&loan).await?)
    }

    pub fn register_outbox_listener(&self) -> OutboxListener {
        self.outbox.register_listener()
    }

    pub async fn outbox_events(
        &self,
        after: Option<EventSequence>,
        limit: i64,
    ) -> Result<Vec<OutboxEvent>, EngineError> {
        Ok(self.outbox.list_events(after, limit).await?)
    }
}
