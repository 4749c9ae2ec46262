use docdb_identity::{
    CollectionLink, DocumentError, DocumentUserStore, Filter, IdentityUser, UserStore,
    UserStoreError, UserStoreOptions,
};

use crate::common::Backend;

#[tokio::test]
async fn test_provisioning_is_idempotent() {
    for backend in Backend::ALL {
        // Given one backend
        let client = backend.client().await;
        let options = UserStoreOptions::new("tenant", "members").ensure_created(true);

        // When opening with provisioning repeatedly
        let first = DocumentUserStore::<IdentityUser>::open(client.clone(), &options)
            .await
            .unwrap();
        let mut user = IdentityUser::new("kept");
        first.create(&mut user).await.unwrap();
        let second = DocumentUserStore::<IdentityUser>::open(client.clone(), &options)
            .await
            .unwrap();

        // Then existing data is untouched
        assert!(second.find_by_id(&user.id).await.unwrap().is_some(), "{backend:?}");
        let link = CollectionLink::new("tenant", "members");
        assert!(client.read_collection(&link).await.is_ok());
    }
}

#[tokio::test]
async fn test_missing_collection_surfaces_not_found() {
    for backend in Backend::ALL {
        // Given a store opened without provisioning on an empty backend
        let client = backend.client().await;
        let store = DocumentUserStore::<IdentityUser>::open(client, &UserStoreOptions::default())
            .await
            .unwrap();

        // When using it
        let result = store.find_by_name("anyone").await;

        // Then the backend's not-found passes through unchanged
        assert!(
            matches!(
                result,
                Err(UserStoreError::Document(DocumentError::NotFound(_)))
            ),
            "{backend:?}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_empty_names_are_rejected() {
    let client = Backend::Memory.client().await;

    let result =
        DocumentUserStore::<IdentityUser>::open(client, &UserStoreOptions::new("", "users")).await;

    assert!(matches!(result, Err(UserStoreError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_collections_are_isolated() {
    for backend in Backend::ALL {
        let client = backend.client().await;
        let staff = DocumentUserStore::<IdentityUser>::open(
            client.clone(),
            &UserStoreOptions::new("identity", "staff").ensure_created(true),
        )
        .await
        .unwrap();
        let customers = DocumentUserStore::<IdentityUser>::open(
            client,
            &UserStoreOptions::new("identity", "customers").ensure_created(true),
        )
        .await
        .unwrap();

        let mut user = IdentityUser::new("employee");
        staff.create(&mut user).await.unwrap();

        assert_eq!(staff.users(&Filter::All).await.unwrap().len(), 1, "{backend:?}");
        assert!(customers.users(&Filter::All).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_users_query_filters_on_fields() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        for (name, two_factor) in [("c", true), ("a", false), ("b", true)] {
            let mut user = IdentityUser::new(name);
            user.id = format!("id-{name}");
            user.two_factor_enabled = two_factor;
            store.create(&mut user).await.unwrap();
        }

        let users = store
            .users(&Filter::eq("twoFactorEnabled", true))
            .await
            .unwrap();

        let names: Vec<_> = users.iter().map(|u| u.user_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c"], "{backend:?}");
    }
}
