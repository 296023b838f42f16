pub mod config;
mod db;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use loan_transfer::{
    business_date::{BusinessDateProvider, SimulatedBusinessDate, SystemBusinessDate},
    loan::{LoanLookup, LoanLookupError, LoanValues},
    query::PagingArgs,
    request::{BuybackRequest, SaleRequest, TransferSearchRequest},
    Collaborators, EventSequence, LoanId, LoanTransferConfig, LoanTransferEngine, TransferId,
};
use serde::Serialize;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use self::config::{Config, EnvOverride};

#[derive(Parser)]
#[clap(version, long_about = None)]
struct Cli {
    #[clap(short, long, env = "LOAN_TRANSFER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
    #[clap(long, env = "LOAN_TRANSFER_DB_CON")]
    db_con: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Applies the database migrations
    Migrate,
    /// Lists transfers selected by exactly one identifier
    Transfers {
        #[clap(long)]
        loan_id: Option<i64>,
        #[clap(long)]
        external_loan_id: Option<String>,
        #[clap(long)]
        transfer_external_id: Option<String>,
        #[clap(long)]
        offset: Option<i64>,
        #[clap(long)]
        limit: Option<i64>,
    },
    /// Lists the journal entries linked to an owner
    OwnerEntries {
        owner_external_id: String,
        #[clap(long)]
        offset: Option<i64>,
        #[clap(long)]
        limit: Option<i64>,
    },
    /// Lists recorded outbox events
    Events {
        #[clap(long)]
        after: Option<i64>,
        #[clap(long, default_value_t = 100)]
        limit: i64,
    },
    /// Requests the sale of a configured loan
    Sell {
        loan_id: i64,
        #[clap(long)]
        settlement_date: String,
        #[clap(long)]
        owner_external_id: String,
        #[clap(long)]
        purchase_price_ratio: String,
        #[clap(long)]
        transfer_external_id: Option<String>,
    },
    /// Requests the buyback of a configured loan
    Buyback {
        loan_id: i64,
        #[clap(long)]
        settlement_date: String,
        #[clap(long)]
        transfer_external_id: Option<String>,
    },
    /// Cancels a pending sale or buyback
    Cancel {
        #[clap(long, conflicts_with = "external_id", required_unless_present = "external_id")]
        id: Option<i64>,
        #[clap(long)]
        external_id: Option<String>,
    },
    /// Runs the settlement step for a configured loan
    Settle { loan_id: i64 },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_config(cli.config, EnvOverride { db_con: cli.db_con })?;

    run_cmd(cli.command, config).await
}

async fn run_cmd(command: Command, config: Config) -> anyhow::Result<()> {
    loan_transfer_tracing::init_tracer(config.tracing.clone())?;
    let engine = init_engine(&config).await?;

    match command {
        Command::Migrate => {
            println!("Migrations applied to {}", config.db.db_con);
        }
        Command::Transfers {
            loan_id,
            external_loan_id,
            transfer_external_id,
            offset,
            limit,
        } => {
            let request = TransferSearchRequest {
                loan_id: loan_id.map(LoanId::new),
                loan_external_id: external_loan_id,
                transfer_external_id,
            };
            let page = engine
                .search_transfers(request, PagingArgs::new(offset, limit))
                .await?
                .map(|transfer| transfer.into_values());
            print_json(&page)?;
        }
        Command::OwnerEntries {
            owner_external_id,
            offset,
            limit,
        } => {
            let page = engine
                .owner_journal_entries(&owner_external_id, PagingArgs::new(offset, limit))
                .await?;
            print_json(&page)?;
        }
        Command::Events { after, limit } => {
            let events = engine
                .outbox_events(after.map(EventSequence::from), limit)
                .await?;
            print_json(&events)?;
        }
        Command::Sell {
            loan_id,
            settlement_date,
            owner_external_id,
            purchase_price_ratio,
            transfer_external_id,
        } => {
            let request = SaleRequest {
                settlement_date: Some(settlement_date),
                owner_external_id: Some(owner_external_id),
                transfer_external_id,
                purchase_price_ratio: Some(purchase_price_ratio),
                ..Default::default()
            };
            print_json(&engine.sell_loan(LoanId::new(loan_id), request).await?)?;
        }
        Command::Buyback {
            loan_id,
            settlement_date,
            transfer_external_id,
        } => {
            let request = BuybackRequest {
                settlement_date: Some(settlement_date),
                transfer_external_id,
                ..Default::default()
            };
            print_json(&engine.buy_back_loan(LoanId::new(loan_id), request).await?)?;
        }
        Command::Cancel { id, external_id } => {
            let result = match (id, external_id) {
                (Some(id), _) => engine.cancel_transfer(TransferId::new(id)).await?,
                (None, Some(external_id)) => {
                    engine.cancel_transfer_by_external_id(&external_id).await?
                }
                (None, None) => anyhow::bail!("One of --id or --external-id must be set"),
            };
            print_json(&result)?;
        }
        Command::Settle { loan_id } => {
            let outcome = engine.execute_settlement(LoanId::new(loan_id)).await?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

async fn init_engine(config: &Config) -> anyhow::Result<LoanTransferEngine> {
    let engine_config = LoanTransferConfig::builder()
        .db_con(config.db.db_con.clone())
        .max_connections(config.db.max_connections)
        .exec_migrations(true)
        .externalize_non_active_loans(config.engine.externalize_non_active_loans)
        .auto_generate_external_id(config.engine.auto_generate_external_id)
        .build()?;
    let business_date: Arc<dyn BusinessDateProvider> = match config.engine.business_date {
        Some(date) => Arc::new(SimulatedBusinessDate::new(date)),
        None => Arc::new(SystemBusinessDate),
    };
    let collaborators = Collaborators {
        loans: Arc::new(ConfiguredLoans::new(config.loans.clone())),
        accounts: Arc::new(config.accounts.clone()),
        business_date,
    };
    LoanTransferEngine::init(engine_config, collaborators)
        .await
        .context("Couldn't initialize engine")
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Loans listed in the config file.
struct ConfiguredLoans {
    loans: HashMap<LoanId, LoanValues>,
}

impl ConfiguredLoans {
    fn new(loans: Vec<LoanValues>) -> Self {
        Self {
            loans: loans.into_iter().map(|loan| (loan.id, loan)).collect(),
        }
    }
}

#[async_trait]
impl LoanLookup for ConfiguredLoans {
    async fn find_by_id(&self, id: LoanId) -> Result<Option<LoanValues>, LoanLookupError> {
        Ok(self.loans.get(&id).cloned())
    }
}
