use docdb_identity::{
    IdentityUser, UserEmailStore, UserLockoutStore, UserPasswordStore, UserRoleStore, UserStore,
    UserStoreError,
};

use crate::common::{Backend, TestUsers};

/// A user created without an id gets a UUID and reads back unchanged
#[tokio::test]
async fn test_create_assigns_id_and_round_trips() {
    for backend in Backend::ALL {
        // Given a fully populated user without an id
        let store = backend.open::<IdentityUser>().await;
        let mut user = TestUsers::with_email("round-trip", "round-trip@test.com");
        user.phone_number = Some("+81-3-0000-0000".to_string());
        user.security_stamp = Some("stamp".to_string());
        user.lockout_enabled = true;
        user.access_failed_count = 2;
        user.roles.push("reader".to_string());

        // When creating it
        store.create(&mut user).await.unwrap();

        // Then it has a valid UUID and every field survives storage
        assert!(uuid::Uuid::parse_str(&user.id).is_ok(), "{backend:?}");
        let found = store.find_by_id(&user.id).await.unwrap();
        assert_eq!(found, Some(user), "{backend:?}");
    }
}

#[tokio::test]
async fn test_generated_ids_are_unique() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut first = IdentityUser::new("first");
        let mut second = IdentityUser::new("second");

        store.create(&mut first).await.unwrap();
        store.create(&mut second).await.unwrap();

        assert_ne!(first.id, second.id, "{backend:?}");
    }
}

#[tokio::test]
async fn test_update_of_uncreated_user_fails() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let user = TestUsers::with_id("never-created");

        let result = store.update(&user).await;

        assert!(
            matches!(result, Err(UserStoreError::InvalidOperation(_))),
            "{backend:?}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_find_by_email() {
    for backend in Backend::ALL {
        // Given a user created with a name and email
        let store = backend.open::<IdentityUser>().await;
        let mut user = TestUsers::with_email("u1", "u1@test.com");
        store.create(&mut user).await.unwrap();

        // When looking it up by email
        let found = store.find_by_email("u1@test.com").await.unwrap();

        // Then the record comes back
        assert_eq!(found.map(|u| u.user_name), Some("u1".to_string()), "{backend:?}");
    }
}

#[tokio::test]
async fn test_updates_are_applied_to_user() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut user = TestUsers::with_email("u1", "u1@test.com");
        store.create(&mut user).await.unwrap();

        // When confirming the email and saving
        let mut loaded = store.find_by_email("u1@test.com").await.unwrap().unwrap();
        store.set_email_confirmed(&mut loaded, true).await.unwrap();
        store.update(&loaded).await.unwrap();

        // Then a fresh lookup sees it
        let reloaded = store.find_by_email("u1@test.com").await.unwrap().unwrap();
        assert!(reloaded.email_confirmed, "{backend:?}");
        assert_eq!(reloaded.id, user.id);
    }
}

#[tokio::test]
async fn test_setters_only_persist_through_update() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut user = IdentityUser::new("lazy");
        store.create(&mut user).await.unwrap();

        store
            .set_password_hash(&mut user, Some("hash".to_string()))
            .await
            .unwrap();
        store.add_to_role(&mut user, "admin").await.unwrap();
        store.increment_access_failed_count(&mut user).await.unwrap();

        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, None, "{backend:?}");
        assert!(stored.roles.is_empty());
        assert_eq!(stored.access_failed_count, 0);

        store.update(&user).await.unwrap();
        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored, user, "{backend:?}");
    }
}

#[tokio::test]
async fn test_remove_from_absent_role_is_noop() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut user = IdentityUser::new("roles");
        store.add_to_role(&mut user, "editor").await.unwrap();

        store.remove_from_role(&mut user, "owner").await.unwrap();

        assert_eq!(user.roles, vec!["editor"], "{backend:?}");
    }
}

#[tokio::test]
async fn test_delete_is_silent_for_missing_users() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut user = IdentityUser::new("short-lived");
        store.create(&mut user).await.unwrap();

        store.delete(&user).await.unwrap();
        store.delete(&user).await.unwrap();

        assert!(store.find_by_id(&user.id).await.unwrap().is_none(), "{backend:?}");
        assert!(store.find_by_name("short-lived").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_every_operation_fails_after_dispose() {
    for backend in Backend::ALL {
        // Given a disposed store
        let store = backend.open::<IdentityUser>().await;
        let mut user = IdentityUser::new("disposed");
        store.create(&mut user).await.unwrap();
        let handle = store.clone();
        store.dispose();

        // Then reads, writes and accessors all fail, through every clone
        let mut results = Vec::new();
        results.push(handle.find_by_id(&user.id).await.map(|_| ()));
        results.push(handle.find_by_name("disposed").await.map(|_| ()));
        results.push(handle.find_by_email("x@test.com").await.map(|_| ()));
        results.push(handle.update(&user).await);
        results.push(handle.delete(&user).await);
        results.push(handle.create(&mut IdentityUser::new("late")).await);
        results.push(handle.get_email(&user).await.map(|_| ()));
        results.push(handle.get_roles(&user).await.map(|_| ()));
        results.push(handle.remove_from_role(&mut user, "x").await);
        results.push(handle.get_lockout_end_date(&user).await.map(|_| ()));
        for result in results {
            assert!(
                matches!(result, Err(UserStoreError::ObjectDisposed(_))),
                "{backend:?}: {result:?}"
            );
        }
        assert!(handle.is_disposed());
    }
}
