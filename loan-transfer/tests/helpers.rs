#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use loan_transfer::{
    accounts::{AccountPurpose, ProductAccountMappings},
    business_date::SimulatedBusinessDate,
    loan::*,
    request::{BuybackRequest, SaleRequest},
    *,
};

pub const PRODUCT_ID: i64 = 1;

pub const LOAN_PORTFOLIO: i64 = 101;
pub const INTEREST_RECEIVABLE: i64 = 102;
pub const FEES_RECEIVABLE: i64 = 103;
pub const PENALTIES_RECEIVABLE: i64 = 104;
pub const OVERPAYMENT: i64 = 105;
pub const ASSET_TRANSFER: i64 = 106;
pub const INTEREST_ON_LOANS: i64 = 107;
pub const INCOME_FROM_FEES: i64 = 108;
pub const INCOME_FROM_PENALTIES: i64 = 109;
pub const CHARGE_OFF_EXPENSE: i64 = 110;
pub const CHARGE_OFF_FRAUD_EXPENSE: i64 = 111;
pub const INCOME_FROM_CHARGE_OFF_INTEREST: i64 = 112;
pub const INCOME_FROM_CHARGE_OFF_FEES: i64 = 113;
pub const INCOME_FROM_CHARGE_OFF_PENALTY: i64 = 114;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start_date() -> NaiveDate {
    date(2024, 3, 1)
}

pub async fn init_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

pub fn account_mappings() -> ProductAccountMappings {
    [
        (AccountPurpose::LoanPortfolio, LOAN_PORTFOLIO),
        (AccountPurpose::InterestReceivable, INTEREST_RECEIVABLE),
        (AccountPurpose::FeesReceivable, FEES_RECEIVABLE),
        (AccountPurpose::PenaltiesReceivable, PENALTIES_RECEIVABLE),
        (AccountPurpose::Overpayment, OVERPAYMENT),
        (AccountPurpose::AssetTransfer, ASSET_TRANSFER),
        (AccountPurpose::InterestOnLoans, INTEREST_ON_LOANS),
        (AccountPurpose::IncomeFromFees, INCOME_FROM_FEES),
        (AccountPurpose::IncomeFromPenalties, INCOME_FROM_PENALTIES),
        (AccountPurpose::ChargeOffExpense, CHARGE_OFF_EXPENSE),
        (AccountPurpose::ChargeOffFraudExpense, CHARGE_OFF_FRAUD_EXPENSE),
        (
            AccountPurpose::IncomeFromChargeOffInterest,
            INCOME_FROM_CHARGE_OFF_INTEREST,
        ),
        (
            AccountPurpose::IncomeFromChargeOffFees,
            INCOME_FROM_CHARGE_OFF_FEES,
        ),
        (
            AccountPurpose::IncomeFromChargeOffPenalty,
            INCOME_FROM_CHARGE_OFF_PENALTY,
        ),
    ]
    .into_iter()
    .fold(ProductAccountMappings::new(), |mappings, (purpose, id)| {
        mappings.with(LoanProductId::new(PRODUCT_ID), purpose, LedgerAccountId::new(id))
    })
}

/// Loans kept in memory, updated by the tests as balances change.
#[derive(Clone, Default)]
pub struct InMemoryLoans {
    loans: Arc<Mutex<HashMap<LoanId, LoanValues>>>,
}

impl InMemoryLoans {
    pub fn upsert(&self, loan: LoanValues) {
        self.loans.lock().unwrap().insert(loan.id, loan);
    }
}

#[async_trait]
impl LoanLookup for InMemoryLoans {
    async fn find_by_id(&self, id: LoanId) -> Result<Option<LoanValues>, LoanLookupError> {
        Ok(self.loans.lock().unwrap().get(&id).cloned())
    }
}

pub struct TestEngine {
    pub engine: LoanTransferEngine,
    pub loans: InMemoryLoans,
    pub date: SimulatedBusinessDate,
}

impl TestEngine {
    pub async fn init() -> anyhow::Result<Self> {
        Self::init_with(|_| ()).await
    }

    pub async fn init_with(
        configure: impl FnOnce(&mut LoanTransferConfigBuilder),
    ) -> anyhow::Result<Self> {
        let pool = init_pool().await?;
        let loans = InMemoryLoans::default();
        let date = SimulatedBusinessDate::new(start_date());
        let mut builder = LoanTransferConfig::builder();
        builder.pool(pool).exec_migrations(true);
        configure(&mut builder);
        let engine = LoanTransferEngine::init(
            builder.build()?,
            Collaborators {
                loans: Arc::new(loans.clone()),
                accounts: Arc::new(account_mappings()),
                business_date: Arc::new(date.clone()),
            },
        )
        .await?;
        Ok(Self {
            engine,
            loans,
            date,
        })
    }

    pub fn add_loan(&self, loan: LoanValues) -> LoanValues {
        self.loans.upsert(loan.clone());
        loan
    }

    pub async fn sell(
        &self,
        loan_id: LoanId,
        settlement_date: NaiveDate,
        owner: &str,
        external_id: Option<&str>,
    ) -> Result<lifecycle::TransferCommandResult, lifecycle::error::LifecycleError> {
        self.engine
            .sell_loan(
                loan_id,
                SaleRequest {
                    settlement_date: Some(settlement_date.to_string()),
                    owner_external_id: Some(owner.to_string()),
                    transfer_external_id: external_id.map(str::to_string),
                    purchase_price_ratio: Some("1.0".to_string()),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn buy_back(
        &self,
        loan_id: LoanId,
        settlement_date: NaiveDate,
        external_id: Option<&str>,
    ) -> Result<lifecycle::TransferCommandResult, lifecycle::error::LifecycleError> {
        self.engine
            .buy_back_loan(
                loan_id,
                BuybackRequest {
                    settlement_date: Some(settlement_date.to_string()),
                    transfer_external_id: external_id.map(str::to_string),
                    ..Default::default()
                },
            )
            .await
    }

    /// Requests a sale settling today and settles it.
    pub async fn sell_and_settle(&self, loan_id: LoanId, owner: &str) -> anyhow::Result<()> {
        self.sell(loan_id, self.date.business_date(), owner, None)
            .await?;
        self.engine.execute_settlement(loan_id).await?;
        Ok(())
    }

    pub async fn transfers_of(&self, loan_id: LoanId) -> anyhow::Result<Vec<TransferValues>> {
        let page = self
            .engine
            .transfers()
            .list(TransferFilter::LoanId(loan_id), Default::default())
            .await?;
        Ok(page
            .entities
            .into_iter()
            .map(|transfer| transfer.into_values())
            .collect())
    }
}

pub fn test_loan(id: i64, principal: Decimal, interest: Decimal) -> LoanValues {
    LoanValues::builder()
        .id(LoanId::new(id))
        .external_id(format!("loan-{id}"))
        .product_id(LoanProductId::new(PRODUCT_ID))
        .office_id(OfficeId::new(1))
        .currency("USD".parse::<Currency>().unwrap())
        .status(LoanStatus::Active)
        .summary(LoanSummary {
            principal_outstanding: Some(principal),
            interest_outstanding: Some(interest),
            ..Default::default()
        })
        .build()
        .unwrap()
}

pub use loan_transfer::business_date::BusinessDateProvider;
pub use loan_transfer::transfer::{TransferFilter, TransferStatus, TransferSubStatus, TransferValues};
