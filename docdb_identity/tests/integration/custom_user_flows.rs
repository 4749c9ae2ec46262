use docdb_identity::{UserEmailStore, UserStore};

use crate::common::{Backend, CustomUser, TestUsers};

#[tokio::test]
async fn test_users_with_custom_ids_persist_through_storage() {
    for backend in Backend::ALL {
        let store = backend.open::<docdb_identity::IdentityUser>().await;
        let mut user = TestUsers::with_id("my-custom-id-42");

        store.create(&mut user).await.unwrap();

        assert_eq!(user.id, "my-custom-id-42");
        let found = store.find_by_id("my-custom-id-42").await.unwrap();
        assert_eq!(found.map(|u| u.user_name), Some("user-my-custom-id-42".to_string()), "{backend:?}");
    }
}

#[tokio::test]
async fn test_custom_user_properties_round_trip() {
    for backend in Backend::ALL {
        // Given a custom user type with extra properties
        let store = backend.open::<CustomUser>().await;
        let mut user = CustomUser::new("awesome");
        user.is_awesome = true;
        user.nickname = Some("Ace".to_string());

        // When storing it
        store.create(&mut user).await.unwrap();

        // Then the extra properties come back with the identity fields
        let found = store.find_by_name("awesome").await.unwrap().unwrap();
        assert_eq!(found, user, "{backend:?}");
    }
}

#[tokio::test]
async fn test_custom_user_properties_update() {
    for backend in Backend::ALL {
        let store = backend.open::<CustomUser>().await;
        let mut user = CustomUser::new("changing");
        store.create(&mut user).await.unwrap();

        user.is_awesome = true;
        user.nickname = Some("Changed".to_string());
        store.set_email(&mut user, "changing@test.com").await.unwrap();
        store.update(&user).await.unwrap();

        let found = store
            .find_by_email("changing@test.com")
            .await
            .unwrap()
            .unwrap();
        assert!(found.is_awesome, "{backend:?}");
        assert_eq!(found.nickname.as_deref(), Some("Changed"));
        assert_eq!(found.identity.id, user.identity.id);
    }
}

#[tokio::test]
async fn test_custom_and_plain_users_share_a_collection() {
    for backend in Backend::ALL {
        // Given a custom user written through a custom store
        let client = backend.client().await;
        let options = docdb_identity::UserStoreOptions::default().ensure_created(true);
        let custom = docdb_identity::DocumentUserStore::<CustomUser>::open(client.clone(), &options)
            .await
            .unwrap();
        let mut user = CustomUser::new("mixed");
        user.is_awesome = true;
        custom.create(&mut user).await.unwrap();

        // When reading it through a plain store over the same collection
        let plain = docdb_identity::DocumentUserStore::<docdb_identity::IdentityUser>::open(
            client, &options,
        )
        .await
        .unwrap();
        let found = plain.find_by_id(&user.identity.id).await.unwrap().unwrap();

        // Then the identity fields load and unknown properties are ignored
        assert_eq!(found, user.identity, "{backend:?}");
    }
}
