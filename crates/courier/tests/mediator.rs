use std::collections::HashMap;
use std::sync::Arc;

use courier::prelude::*;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
struct User {
    user_id: i64,
    username: String,
}

#[derive(Debug, Command)]
#[command(output = i64)]
struct CreateUser {
    user_id: i64,
    username: String,
}

#[derive(Debug, Query)]
#[query(output = Option<User>)]
struct GetUserById {
    user_id: i64,
}

#[derive(Debug, PartialEq, Command)]
struct DeleteUser {
    user_id: i64,
}

#[derive(Debug, Clone, Event)]
struct UserCreated {
    user_id: i64,
}

#[derive(Debug, Clone, Event)]
struct UserDeleted;

#[derive(Default)]
struct UserStore {
    users: Mutex<HashMap<i64, User>>,
}

struct CreateUserHandler {
    store: Arc<UserStore>,
}

#[async_trait]
impl RequestHandler<CreateUser> for CreateUserHandler {
    async fn handle(&self, command: CreateUser, _extras: Extras) -> HandlerResult<i64> {
        self.store.users.lock().insert(
            command.user_id,
            User {
                user_id: command.user_id,
                username: command.username,
            },
        );
        Ok(command.user_id)
    }
}

fn user_mediator(store: &Arc<UserStore>) -> Mediator {
    let mut mediator = Mediator::new();

    let queries = Arc::clone(store);
    mediator
        .register_command_handler(Handler::new(CreateUserHandler {
            store: Arc::clone(store),
        }))
        .register_query_handler(Handler::<GetUserById>::from_fn(move |query, _| {
            let store = Arc::clone(&queries);
            async move { Ok(store.users.lock().get(&query.user_id).cloned()) }
        }));
    mediator
}

#[tokio::test]
async fn test_create_then_get_user() {
    let store = Arc::new(UserStore::default());
    let mediator = user_mediator(&store);

    let user_id = mediator
        .send(CreateUser {
            user_id: 1,
            username: "Jon".into(),
        })
        .await
        .unwrap();
    assert_eq!(user_id, 1);

    let user = mediator.query(GetUserById { user_id: 1 }).await.unwrap();
    assert_eq!(
        user,
        Some(User {
            user_id: 1,
            username: "Jon".into()
        })
    );
    assert_eq!(mediator.query(GetUserById { user_id: 2 }).await.unwrap(), None);
}

#[tokio::test]
async fn test_unregistered_command_returns_request() {
    let store = Arc::new(UserStore::default());
    let mediator = user_mediator(&store);

    let err = mediator.send(DeleteUser { user_id: 9 }).await.unwrap_err();

    assert!(matches!(err, MediatorError::CommandHandlerNotFound { .. }));
    assert!(err.is_handler_not_found());
    assert_eq!(
        err.request_as::<DeleteUser>(),
        Some(&DeleteUser { user_id: 9 })
    );
}

#[tokio::test]
async fn test_latest_registration_wins() {
    let mut mediator = Mediator::new();
    mediator.register_command_handler(Handler::<DeleteUser>::from_fn(|_, _| async { Ok(()) }));

    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);
    mediator.register_command_handler(Handler::<DeleteUser>::from_fn(move |command, _| {
        let recorded = Arc::clone(&recorded);
        async move {
            recorded.lock().push(command.user_id);
            Ok(())
        }
    }));

    mediator.send(DeleteUser { user_id: 3 }).await.unwrap();
    assert_eq!(*calls.lock(), vec![3]);
}

#[tokio::test]
async fn test_publish_fans_out_in_order() {
    let mut mediator = Mediator::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for name in ["audit", "mailer"] {
        let seen = Arc::clone(&seen);
        mediator.register_event_handler(Handler::<UserCreated>::from_fn(move |event, _| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().push(format!("{name}:{}", event.user_id));
                Ok(())
            }
        }));
    }
    let deleted = Arc::clone(&seen);
    mediator.register_event_handler(Handler::<UserDeleted>::from_fn(move |_, _| {
        let deleted = Arc::clone(&deleted);
        async move {
            deleted.lock().push("deleted".to_string());
            Ok(())
        }
    }));

    mediator
        .publish(vec![UserCreated { user_id: 1 }, UserCreated { user_id: 2 }])
        .await
        .unwrap();

    assert_eq!(
        *seen.lock(),
        vec!["audit:1", "mailer:1", "audit:2", "mailer:2"]
    );
}

#[tokio::test]
async fn test_publish_without_listeners_is_ok() {
    let mediator = Mediator::new();
    mediator.publish(UserDeleted).await.unwrap();
    mediator.publish(EventBatch::new()).await.unwrap();
}

#[tokio::test]
async fn test_bind_and_unbind_are_non_mutating() {
    let mut mediator = Mediator::new().with_extra_data(extras! { "tenant" => "acme" });
    mediator.register_query_handler(Handler::<GetUserById>::from_fn(|query, extras| async move {
        let username = format!(
            "{}/{}",
            extras.get::<&str>("tenant").copied().unwrap_or("-"),
            extras.get::<&str>("role").copied().unwrap_or("-"),
        );
        Ok(Some(User {
            user_id: query.user_id,
            username,
        }))
    }));

    let bound = mediator.bind(extras! { "tenant" => "globex", "role" => "admin" });
    let unbound = bound.unbind(["role", "missing"]);

    assert_eq!(mediator.extra_data().get::<&str>("tenant"), Some(&"acme"));
    assert!(!mediator.extra_data().contains_key("role"));

    let name = |user: Option<User>| user.map(|u| u.username);
    assert_eq!(
        name(mediator.query(GetUserById { user_id: 1 }).await.unwrap()).as_deref(),
        Some("acme/-")
    );
    assert_eq!(
        name(bound.query(GetUserById { user_id: 1 }).await.unwrap()).as_deref(),
        Some("globex/admin")
    );
    assert_eq!(
        name(unbound.query(GetUserById { user_id: 1 }).await.unwrap()).as_deref(),
        Some("globex/-")
    );

    // Call-site extras win over bound ones.
    let user = bound
        .query_with(GetUserById { user_id: 1 }, extras! { "role" => "guest" })
        .await
        .unwrap();
    assert_eq!(name(user).as_deref(), Some("globex/guest"));
}
