mod common;

use anyhow::Result;
use common::{add_expense, date, test_store, StandardCategories};
use finly::application::{Entity, StoreError};
use finly::domain::{NewTransaction, TransactionKind};

#[tokio::test]
async fn test_categories_sorted_by_name() -> Result<()> {
    let (store, _temp) = test_store().await?;
    store.add_category("Travel").await?;
    store.add_category("Bills").await?;
    store.add_category("Groceries").await?;

    let names: Vec<String> = store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Bills", "Groceries", "Travel", "Uncategorized"]);

    Ok(())
}

#[tokio::test]
async fn test_add_category_trims_name() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let id = store.add_category("  Coffee \t").await?;

    assert_eq!(store.get_category(id).await?.name, "Coffee");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_category_rejected_without_mutation() -> Result<()> {
    let (store, _temp) = test_store().await?;
    store.add_category("Food").await?;

    let err = store.add_category("Food").await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref name) if name == "Food"));

    let err = store.add_category("  Food  ").await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(_)));

    assert_eq!(store.list_categories().await?.len(), 2);

    // A later insert still gets the next id
    assert_eq!(store.add_category("Rent").await?, 3);

    Ok(())
}

#[tokio::test]
async fn test_category_names_are_case_sensitive() -> Result<()> {
    let (store, _temp) = test_store().await?;
    store.add_category("Food").await?;
    store.add_category("food").await?;

    assert_eq!(store.list_categories().await?.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_blank_category_name_rejected() -> Result<()> {
    let (store, _temp) = test_store().await?;

    assert!(matches!(
        store.add_category("   ").await,
        Err(StoreError::ConstraintViolation(_))
    ));
    assert_eq!(store.list_categories().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_rename_category() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;

    store.rename_category(cats.food, " Groceries ").await?;
    assert_eq!(store.get_category(cats.food).await?.name, "Groceries");

    // Renaming to its own name is fine
    store.rename_category(cats.food, "Groceries").await?;

    // The default category can be renamed, just not deleted
    store.rename_category(1, "Misc").await?;
    assert_eq!(store.get_category(1).await?.name, "Misc");

    Ok(())
}

#[tokio::test]
async fn test_rename_category_collision() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;

    let err = store.rename_category(cats.food, "Rent").await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateName(ref name) if name == "Rent"));
    assert_eq!(store.get_category(cats.food).await?.name, "Food");

    Ok(())
}

#[tokio::test]
async fn test_rename_missing_category_not_found() -> Result<()> {
    let (store, _temp) = test_store().await?;

    let err = store.rename_category(99, "Ghost").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound {
            entity: Entity::Category,
            id: 99
        }
    ));

    Ok(())
}

#[tokio::test]
async fn test_delete_category_rules() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;

    let tx_id = add_expense(&store, "2024-05-01", 1200, Some(cats.food)).await?;

    // Referenced: refused and still present
    assert!(!store.delete_category(cats.food).await?);
    assert_eq!(store.get_category(cats.food).await?.name, "Food");

    // Unreferenced: removed
    assert!(store.delete_category(cats.rent).await?);
    assert!(matches!(
        store.get_category(cats.rent).await,
        Err(StoreError::NotFound { .. })
    ));

    // Unknown id: nothing to delete
    assert!(!store.delete_category(404).await?);

    // Once the last reference is gone the category can go
    store.delete_transaction(tx_id).await?;
    assert!(store.delete_category(cats.food).await?);

    Ok(())
}

#[tokio::test]
async fn test_delete_category_after_reassigning_transaction() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let cats = StandardCategories::create(&store).await?;

    let tx_id = add_expense(&store, "2024-05-01", 1200, Some(cats.food)).await?;
    let mut tx = store.get_transaction(tx_id).await?;
    tx.category_id = Some(cats.rent);
    store
        .update_transaction(
            tx_id,
            NewTransaction {
                date: tx.date,
                amount_cents: tx.amount_cents,
                kind: tx.kind,
                category_id: tx.category_id,
                description: tx.description,
            },
        )
        .await?;

    assert!(store.delete_category(cats.food).await?);
    assert!(!store.delete_category(cats.rent).await?);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_never_orphans_a_concurrent_add() -> Result<()> {
    let (store, _temp) = test_store().await?;

    for round in 0..20 {
        let category = store.add_category(&format!("Temp {}", round)).await?;
        let tx = NewTransaction::new(date("2024-06-01"), 700, TransactionKind::Expense)
            .with_category(category);

        let (added, deleted) = tokio::join!(
            store.add_transaction(tx),
            store.delete_category(category)
        );

        match (added, deleted?) {
            (Ok(id), false) => {
                let row = store.get_transaction(id).await?;
                assert_eq!(row.category_id, Some(category));
                assert!(store.get_category(category).await.is_ok());
            }
            (Err(StoreError::InvalidReference(missing)), true) => {
                assert_eq!(missing, category);
            }
            (added, deleted) => {
                panic!("round {round}: add={added:?} delete={deleted}")
            }
        }

        // No transaction ever points at a category that is gone
        for row in store.list_transactions(None).await? {
            if let Some(id) = row.category_id {
                assert_eq!(store.get_category(id).await?.name, row.category);
            }
        }
    }

    Ok(())
}
