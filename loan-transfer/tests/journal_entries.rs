mod helpers;

use rust_decimal_macros::dec;

use helpers::*;
use loan_transfer::{
    error::EngineError, journal_entry::JournalEntryValues, owner::error::OwnerError,
    primitives::*, query::PagingArgs,
};

fn loan_entry(id: i64, loan_id: Option<LoanId>) -> JournalEntryValues {
    JournalEntryValues {
        id: JournalEntryId::new(id),
        office_id: OfficeId::new(1),
        currency: "USD".parse().unwrap(),
        account_id: LedgerAccountId::new(INTEREST_RECEIVABLE),
        loan_id,
        transaction_id: format!("L{id}"),
        direction: DebitOrCredit::Debit,
        amount: dec!(12.5),
        transaction_date: date(2024, 3, 2),
        submitted_on_date: date(2024, 3, 2),
        reversed: false,
    }
}

#[tokio::test]
async fn sale_links_owner_to_debit_side() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(50)));
    test.sell_and_settle(loan.id, "owner-1").await?;

    let page = test
        .engine
        .owner_journal_entries("owner-1", PagingArgs::default())
        .await?;
    assert_eq!(page.total_count, 2);
    let linked: Vec<_> = page
        .entities
        .iter()
        .map(|e| (e.account_id, e.direction, e.amount))
        .collect();
    assert_eq!(
        linked,
        vec![
            (
                LedgerAccountId::new(LOAN_PORTFOLIO),
                DebitOrCredit::Debit,
                dec!(1000)
            ),
            (
                LedgerAccountId::new(INTEREST_RECEIVABLE),
                DebitOrCredit::Debit,
                dec!(50)
            ),
        ]
    );

    let second = test
        .engine
        .owner_journal_entries("owner-1", PagingArgs::new(Some(1), Some(1)))
        .await?;
    assert_eq!(second.total_count, 2);
    assert_eq!(second.entities.len(), 1);
    assert_eq!(second.entities[0].id, page.entities[1].id);
    Ok(())
}

#[tokio::test]
async fn buyback_links_owner_to_credit_side() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell_and_settle(loan.id, "owner-1").await?;
    test.date.advance_days(1);
    test.buy_back(loan.id, date(2024, 3, 2), None).await?;
    test.engine.execute_settlement(loan.id).await?;

    let page = test
        .engine
        .owner_journal_entries("owner-1", PagingArgs::default())
        .await?;
    let linked: Vec<_> = page
        .entities
        .iter()
        .map(|e| (e.account_id, e.direction, e.transaction_date))
        .collect();
    assert_eq!(
        linked,
        vec![
            (
                LedgerAccountId::new(LOAN_PORTFOLIO),
                DebitOrCredit::Debit,
                date(2024, 3, 1)
            ),
            (
                LedgerAccountId::new(LOAN_PORTFOLIO),
                DebitOrCredit::Credit,
                date(2024, 3, 2)
            ),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn loan_entries_follow_the_owner() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let owned = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    let unowned = test.add_loan(test_loan(2, dec!(500), dec!(0)));
    test.sell_and_settle(owned.id, "owner-1").await?;
    let owner = test.engine.owners().find_by_external_id("owner-1").await?;

    let linked = test
        .engine
        .on_loan_journal_entry_created(&loan_entry(50, Some(owned.id)))
        .await?;
    assert_eq!(linked, Some(owner.id));
    // Re-delivery does not link twice.
    test.engine
        .on_loan_journal_entry_created(&loan_entry(50, Some(owned.id)))
        .await?;

    assert_eq!(
        test.engine
            .on_loan_journal_entry_created(&loan_entry(51, Some(unowned.id)))
            .await?,
        None
    );
    assert_eq!(
        test.engine
            .on_loan_journal_entry_created(&loan_entry(52, None))
            .await?,
        None
    );

    let page = test
        .engine
        .owner_journal_entries("owner-1", PagingArgs::default())
        .await?;
    assert_eq!(page.total_count, 2);
    let last = page.entities.last().expect("linked entry");
    let expected = loan_entry(50, Some(owned.id));
    assert_eq!(
        (
            last.transaction_id.as_str(),
            last.account_id,
            last.direction,
            last.amount,
            last.loan_id
        ),
        (
            expected.transaction_id.as_str(),
            expected.account_id,
            expected.direction,
            expected.amount,
            expected.loan_id
        )
    );
    Ok(())
}

#[tokio::test]
async fn loan_entry_ids_do_not_clash_with_postings() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(1000), dec!(0)));
    test.sell_and_settle(loan.id, "owner-1").await?;

    let repayment = JournalEntryValues {
        account_id: LedgerAccountId::new(FEES_RECEIVABLE),
        direction: DebitOrCredit::Credit,
        amount: dec!(5),
        ..loan_entry(1, Some(loan.id))
    };
    test.engine.on_loan_journal_entry_created(&repayment).await?;
    test.engine.on_loan_journal_entry_created(&repayment).await?;

    let page = test
        .engine
        .owner_journal_entries("owner-1", PagingArgs::default())
        .await?;
    let linked: Vec<_> = page
        .entities
        .iter()
        .map(|e| (e.transaction_id.as_str(), e.account_id, e.direction, e.amount))
        .collect();
    assert_eq!(page.total_count, 2);
    assert_eq!(
        linked[1],
        (
            "L1",
            LedgerAccountId::new(FEES_RECEIVABLE),
            DebitOrCredit::Credit,
            dec!(5)
        )
    );
    assert!(linked
        .iter()
        .all(|(txn, _, direction, _)| txn.starts_with('L') || *direction == DebitOrCredit::Debit));

    let active = test
        .engine
        .transfers()
        .find_active_owner_transfer(loan.id)
        .await?
        .expect("active transfer");
    let postings = test
        .engine
        .journal_entries()
        .list_for_transfer(active.id(), PagingArgs::default())
        .await?;
    assert_eq!(postings.total_count, 4);
    assert!(postings
        .entities
        .iter()
        .all(|e| e.transaction_id == format!("asset-transfer-{}", active.id())));
    Ok(())
}

#[tokio::test]
async fn unknown_owner_has_no_entries() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let err = test
        .engine
        .owner_journal_entries("nobody", PagingArgs::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::OwnerError(OwnerError::CouldNotFindByExternalId(_))
    ));
    Ok(())
}

#[tokio::test]
async fn generated_entries_are_not_persisted() -> anyhow::Result<()> {
    let test = TestEngine::init().await?;
    let loan = test.add_loan(test_loan(1, dec!(100), dec!(10)));
    let sale = test.sell(loan.id, date(2024, 3, 5), "owner-1", None).await?;
    let transfer = test.engine.transfers().find_by_id(sale.resource_id).await?;

    let entries = test.engine.journal_entries().generate_transfer_entries(
        &loan,
        transfer.values(),
        true,
        start_date(),
    )?;
    let shape: Vec<_> = entries
        .iter()
        .map(|e| (e.account_id, e.direction, e.amount))
        .collect();
    assert_eq!(
        shape,
        vec![
            (
                LedgerAccountId::new(LOAN_PORTFOLIO),
                DebitOrCredit::Debit,
                dec!(100)
            ),
            (
                LedgerAccountId::new(INTEREST_RECEIVABLE),
                DebitOrCredit::Debit,
                dec!(10)
            ),
            (
                LedgerAccountId::new(ASSET_TRANSFER),
                DebitOrCredit::Credit,
                dec!(110)
            ),
        ]
    );
    assert_eq!(
        test.engine
            .journal_entries()
            .list_for_transfer(sale.resource_id, PagingArgs::default())
            .await?
            .total_count,
        0
    );
    Ok(())
}
