mod common;

use anyhow::Result;
use common::{add_expense, add_income, date, test_store, StandardCategories};
use finly::application::{Entity, StoreError};
use finly::domain::{NewTransaction, TransactionKind};

#[tokio::test]
async fn test_added_transaction_round_trips() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;

    let id = store
        .add_transaction(
            NewTransaction::new(date("2024-03-15"), 5025, TransactionKind::Expense)
                .with_category(cats.food)
                .with_description("lunch, with coffee"),
        )
        .await?;

    let listed = store.list_transactions(None).await?;
    assert_eq!(listed.len(), 1);
    let row = &listed[0];
    assert_eq!(row.id, id);
    assert_eq!(row.date, date("2024-03-15"));
    assert_eq!(row.amount_cents, 5025);
    assert_eq!(row.kind, TransactionKind::Expense);
    assert_eq!(row.category_id, Some(cats.food));
    assert_eq!(row.category, "Food");
    assert_eq!(row.description.as_deref(), Some("lunch, with coffee"));

    Ok(())
}

#[tokio::test]
async fn test_uncategorized_transaction_shows_sentinel() -> Result<()> {
    let (store, _temp) = test_store().await?;
    add_income(&store, "2024-03-01", 300000, None).await?;

    let listed = store.list_transactions(None).await?;
    assert_eq!(listed[0].category_id, None);
    assert_eq!(listed[0].category, "Uncategorized");
    assert_eq!(listed[0].description, None);

    Ok(())
}

#[tokio::test]
async fn test_listing_resolves_current_category_name() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;
    add_expense(&store, "2024-03-01", 1000, Some(cats.food)).await?;

    store.rename_category(cats.food, "Groceries").await?;

    let listed = store.list_transactions(None).await?;
    assert_eq!(listed[0].category, "Groceries");

    Ok(())
}

#[tokio::test]
async fn test_add_with_missing_category_rejected() -> Result<()> {
    let (store, _temp) = test_store().await?;

    let err = add_expense(&store, "2024-03-01", 1000, Some(42))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::InvalidReference(42))
    ));
    assert!(store.list_transactions(None).await?.is_empty());

    Ok(())
}

#[test]
fn test_unknown_kind_is_a_constraint_violation() {
    let err = "Refund"
        .parse::<TransactionKind>()
        .map_err(StoreError::from)
        .unwrap_err();
    assert!(matches!(err, StoreError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_transactions_sorted_by_date_descending() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let first = add_expense(&store, "2024-01-10", 100, None).await?;
    let second = add_expense(&store, "2024-03-05", 200, None).await?;
    let third = add_expense(&store, "2023-12-31", 300, None).await?;
    let fourth = add_expense(&store, "2024-03-05", 400, None).await?;

    let ids: Vec<i64> = store
        .list_transactions(None)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    // Same-day entries: most recently recorded first
    assert_eq!(ids, vec![fourth, second, first, third]);

    Ok(())
}

#[tokio::test]
async fn test_update_transaction() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;
    let id = add_expense(&store, "2024-03-01", 1000, Some(cats.food)).await?;

    store
        .update_transaction(
            id,
            NewTransaction::new(date("2024-04-02"), 250000, TransactionKind::Income)
                .with_category(cats.salary)
                .with_description("April pay"),
        )
        .await?;

    let tx = store.get_transaction(id).await?;
    assert_eq!(tx.date, date("2024-04-02"));
    assert_eq!(tx.amount_cents, 250000);
    assert_eq!(tx.kind, TransactionKind::Income);
    assert_eq!(tx.category_id, Some(cats.salary));
    assert_eq!(tx.description.as_deref(), Some("April pay"));

    // Clearing the category
    store
        .update_transaction(
            id,
            NewTransaction::new(date("2024-04-02"), 250000, TransactionKind::Income),
        )
        .await?;
    assert_eq!(store.get_transaction(id).await?.category_id, None);

    Ok(())
}

#[tokio::test]
async fn test_update_missing_transaction_not_found() -> Result<()> {
    let (store, _temp) = test_store().await?;

    let err = store
        .update_transaction(
            7,
            NewTransaction::new(date("2024-04-02"), 100, TransactionKind::Expense),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: Entity::Transaction,
            id: 7
        }
    ));

    Ok(())
}

#[tokio::test]
async fn test_update_with_missing_category_keeps_original() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;
    let id = add_expense(&store, "2024-03-01", 1000, Some(cats.food)).await?;

    let err = store
        .update_transaction(
            id,
            NewTransaction::new(date("2024-03-01"), 1000, TransactionKind::Expense)
                .with_category(999),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidReference(999)));
    assert_eq!(store.get_transaction(id).await?.category_id, Some(cats.food));

    Ok(())
}

#[tokio::test]
async fn test_delete_transaction_is_idempotent() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let keep = add_expense(&store, "2024-03-01", 1000, None).await?;
    let gone = add_expense(&store, "2024-03-02", 2000, None).await?;

    store.delete_transaction(gone).await?;
    store.delete_transaction(gone).await?;
    store.delete_transaction(12345).await?;

    let listed = store.list_transactions(None).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, keep);
    assert!(matches!(
        store.get_transaction(gone).await,
        Err(StoreError::NotFound {
            entity: Entity::Transaction,
            ..
        })
    ));

    Ok(())
}
