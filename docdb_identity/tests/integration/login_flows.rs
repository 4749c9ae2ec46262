use docdb_identity::{IdentityUser, UserLoginStore, UserStore};

use crate::common::{Backend, TestUsers};

#[tokio::test]
async fn test_can_find_user_by_login_info() {
    for backend in Backend::ALL {
        // Given a stored user with an external login
        let store = backend.open::<IdentityUser>().await;
        let mut user = TestUsers::with_email("login-user", "login@test.com");
        store.create(&mut user).await.unwrap();
        let login = TestUsers::google_login("1234567890");
        store.add_login(&mut user, login.clone()).await.unwrap();

        // When looking the user up by that login
        let found = store.find_by_login(&login).await.unwrap();

        // Then it is found with the login attached
        let found = found.unwrap_or_else(|| panic!("{backend:?}: user not found by login"));
        assert_eq!(found.id, user.id);
        assert_eq!(found.logins, vec![login]);
    }
}

#[tokio::test]
async fn test_add_login_twice_keeps_one_entry() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut user = IdentityUser::new("twice");
        store.create(&mut user).await.unwrap();
        let login = TestUsers::github_login("gh-1");

        store.add_login(&mut user, login.clone()).await.unwrap();
        store.add_login(&mut user, login.clone()).await.unwrap();

        let stored = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.logins, vec![login], "{backend:?}");
        assert_eq!(store.get_logins(&user).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_removed_login_no_longer_finds_user() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut user = IdentityUser::new("unlinker");
        store.create(&mut user).await.unwrap();
        let google = TestUsers::google_login("g-1");
        let github = TestUsers::github_login("gh-1");
        store.add_login(&mut user, google.clone()).await.unwrap();
        store.add_login(&mut user, github.clone()).await.unwrap();

        // When removing one login
        store.remove_login(&mut user, &google).await.unwrap();

        // Then only the other one still resolves to the user
        assert!(store.find_by_login(&google).await.unwrap().is_none(), "{backend:?}");
        let found = store.find_by_login(&github).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id.clone()));
    }
}

#[tokio::test]
async fn test_login_lookup_distinguishes_users_and_providers() {
    for backend in Backend::ALL {
        let store = backend.open::<IdentityUser>().await;
        let mut alice = IdentityUser::new("alice");
        let mut bob = IdentityUser::new("bob");
        store.create(&mut alice).await.unwrap();
        store.create(&mut bob).await.unwrap();
        store
            .add_login(&mut alice, TestUsers::google_login("shared-key"))
            .await
            .unwrap();
        store
            .add_login(&mut bob, TestUsers::github_login("shared-key"))
            .await
            .unwrap();

        let by_google = store
            .find_by_login(&TestUsers::google_login("shared-key"))
            .await
            .unwrap();
        let by_github = store
            .find_by_login(&TestUsers::github_login("shared-key"))
            .await
            .unwrap();

        assert_eq!(by_google.map(|u| u.user_name), Some("alice".to_string()), "{backend:?}");
        assert_eq!(by_github.map(|u| u.user_name), Some("bob".to_string()), "{backend:?}");
    }
}
