mod helpers;

use futures::{FutureExt, StreamExt};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use helpers::*;
use loan_transfer::{
    error::EngineError, execution::error::ExecutionError, loan::*, primitives::*,
    OutboxEventPayload,
};

fn closed(mut loan: LoanValues) -> LoanValues {
    loan.status = LoanStatus::ClosedObligationsMet;
    loan.summary = LoanSummary::default();
    loan
}

fn overpaid(mut loan: LoanValues) -> LoanValues {
    loan.status = LoanStatus::Overpaid;
    loan.summary = LoanSummary::default();
    loan.total_overpaid = Some(dec!(30));
    loan
}

#[tokio::test]
async fn closed_loan_declines_pending_sale() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;
    let mut listener = test.engine.register_outbox_listener();

    let loan = test.add_loan(closed(loan));
    test.engine.on_loan_status_changed(&loan).await?;

    let transfers = test.transfers_of(loan.id).await?;
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].effective_date_to, start_date());
    let declined = &transfers[1];
    assert_eq!(declined.status, TransferStatus::Declined);
    assert_eq!(declined.sub_status, Some(TransferSubStatus::BalanceZero));
    assert_eq!(declined.effective_date_from, start_date());
    assert_eq!(declined.effective_date_to, start_date());

    let event = listener.next().now_or_never().flatten().expect("event");
    match event.payload {
        OutboxEventPayload::OwnershipTransferred { transfer, loan } => {
            assert_eq!(transfer.id, declined.id);
            assert_eq!(loan.status, LoanStatus::ClosedObligationsMet);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(listener.next().now_or_never().is_none());
    Ok(())
}

#[tokio::test]
async fn overpaid_loan_declines_with_negative_balance() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;

    let loan = test.add_loan(overpaid(loan));
    test.engine.on_loan_status_changed(&loan).await?;

    let transfers = test.transfers_of(loan.id).await?;
    assert_eq!(transfers[1].status, TransferStatus::Declined);
    assert_eq!(
        transfers[1].sub_status,
        Some(TransferSubStatus::BalanceNegative)
    );
    Ok(())
}

#[tokio::test]
async fn unsold_buyback_is_cancelled() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;
    test.buy_back(loan.id, date(2024, 3, 6), None).await?;

    let loan = test.add_loan(closed(loan));
    test.engine.on_loan_status_changed(&loan).await?;

    let transfers = test.transfers_of(loan.id).await?;
    let terminal: Vec<_> = transfers
        .iter()
        .skip(2)
        .map(|t| (t.status, t.sub_status))
        .collect();
    assert_eq!(
        terminal,
        vec![
            (TransferStatus::Declined, Some(TransferSubStatus::BalanceZero)),
            (TransferStatus::Cancelled, Some(TransferSubStatus::Unsold)),
        ]
    );
    assert!(transfers.iter().all(|t| !t.is_open()));
    assert_eq!(test.engine.outbox_events(None, 100).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn same_day_transfers_are_cancelled() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;
    test.buy_back(loan.id, date(2024, 3, 5), None).await?;

    let loan = test.add_loan(closed(loan));
    test.engine.on_loan_status_changed(&loan).await?;

    let transfers = test.transfers_of(loan.id).await?;
    assert_eq!(transfers.len(), 4);
    for cancelled in &transfers[2..] {
        assert_eq!(cancelled.status, TransferStatus::Cancelled);
        assert_eq!(
            cancelled.sub_status,
            Some(TransferSubStatus::SamedayTransfers)
        );
    }
    assert_eq!(transfers[2].owner_id, transfers[0].owner_id);
    Ok(())
}

#[tokio::test]
async fn pending_buyback_of_owned_loan_is_executed() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell_and_settle(loan.id, "owner-1").await?;
    test.date.advance_days(1);
    test.buy_back(loan.id, date(2024, 3, 10), None).await?;
    let events_before = test.engine.outbox_events(None, 100).await?.len();

    let loan = test.add_loan(overpaid(loan));
    test.engine.on_loan_status_changed(&loan).await?;

    let transfers = test.transfers_of(loan.id).await?;
    assert_eq!(transfers.len(), 3);
    assert!(transfers.iter().all(|t| !t.is_open()));
    let buyback = &transfers[2];
    assert_eq!(buyback.status, TransferStatus::Buyback);
    assert_eq!(buyback.effective_date_to, date(2024, 3, 2));
    let details = buyback.details.as_ref().expect("balance snapshot");
    assert_eq!(details.total_outstanding, dec!(0));
    assert_eq!(details.total_overpaid, dec!(30));

    let entries = test
        .engine
        .journal_entries()
        .list_for_transfer(buyback.id, Default::default())
        .await?;
    assert_eq!(entries.total_count, 4);
    let total = |direction: DebitOrCredit| -> Decimal {
        entries
            .entities
            .iter()
            .filter(|e| e.direction == direction)
            .map(|e| e.amount)
            .sum()
    };
    assert_eq!(total(DebitOrCredit::Debit), dec!(60));
    assert_eq!(total(DebitOrCredit::Debit), total(DebitOrCredit::Credit));

    // Overpaid loans link the owner to the debit side of the buyback.
    let owner_entries = test
        .engine
        .owner_journal_entries("owner-1", Default::default())
        .await?;
    let buyback_ids: Vec<_> = entries.entities.iter().map(|e| e.id).collect();
    let linked: Vec<_> = owner_entries
        .entities
        .iter()
        .filter(|e| buyback_ids.contains(&e.id))
        .map(|e| (e.account_id, e.direction, e.amount))
        .collect();
    assert_eq!(
        linked,
        vec![(
            LedgerAccountId::new(OVERPAYMENT),
            DebitOrCredit::Debit,
            dec!(30)
        )]
    );

    let events = test.engine.outbox_events(None, 100).await?;
    let new_events: Vec<_> = events[events_before..].iter().collect();
    assert_eq!(new_events.len(), 2);
    assert!(matches!(
        new_events[0].payload,
        OutboxEventPayload::OwnershipTransferred { .. }
    ));
    assert!(matches!(
        new_events[1].payload,
        OutboxEventPayload::LoanAccountSnapshot { .. }
    ));
    Ok(())
}

#[tokio::test]
async fn reaction_is_idempotent() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;

    let loan = test.add_loan(closed(loan));
    test.engine.on_loan_status_changed(&loan).await?;
    test.engine.on_loan_status_changed(&loan).await?;

    assert_eq!(test.transfers_of(loan.id).await?.len(), 2);
    assert_eq!(test.engine.outbox_events(None, 100).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn ignored_status_changes() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;

    let mut on_hold = loan.clone();
    on_hold.status = LoanStatus::TransferOnHold;
    test.engine.on_loan_status_changed(&on_hold).await?;
    assert_eq!(test.transfers_of(loan.id).await?.len(), 1);

    let disabled = TestEngine::init_with(|config| {
        config.externalize_non_active_loans(false);
    })
    .await?;
    let loan = disabled.add_loan(test_loan(1, dec!(1000), dec!(0)));
    disabled
        .sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;
    disabled.engine.on_loan_status_changed(&closed(loan.clone())).await?;
    assert_eq!(disabled.transfers_of(loan.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn buyback_without_active_transfer_writes_nothing() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;
    test.buy_back(loan.id, date(2024, 3, 6), None).await?;
    sqlx::query(
        "UPDATE loan_transfer_transfers SET effective_date_to = effective_date_from WHERE status = 'PENDING'",
    )
    .execute(test.engine.pool())
    .await?;

    let loan = test.add_loan(closed(loan));
    let err = test.engine.on_loan_status_changed(&loan).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::ExecutionError(ExecutionError::ActiveTransferNotFound { .. })
    ));

    let transfers = test.transfers_of(loan.id).await?;
    assert_eq!(transfers.len(), 2);
    assert!(transfers[1].is_open());
    assert!(transfers[1].details.is_none());
    Ok(())
}

#[tokio::test]
async fn illegal_combination_is_reported() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell(loan.id, date(2024, 3, 5), "owner-1", None)
        .await?;
    test.buy_back(loan.id, date(2024, 3, 6), None).await?;
    sqlx::query("UPDATE loan_transfer_transfers SET status = 'BUYBACK' WHERE status = 'PENDING'")
        .execute(test.engine.pool())
        .await?;

    let loan = test.add_loan(closed(loan));
    let err = test.engine.on_loan_status_changed(&loan).await.unwrap_err();
    match err {
        EngineError::ExecutionError(err) => {
            assert!(err.is_invariant_violation());
            assert!(err
                .to_string()
                .contains("Expected PENDING and BUYBACK, found: BUYBACK and BUYBACK"));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(test
        .engine
        .transfers()
        .effective_for_loan(loan.id)
        .await?
        .iter()
        .all(|t| t.is_open()));
    Ok(())
}
