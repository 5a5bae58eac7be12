use courier::{Command, Event, Handler, Mediator, Query, Request, RequestKind};

#[derive(Debug, Command)]
#[command(output = i64)]
struct CreateOrder {
    order_id: i64,
}

#[derive(Debug, Query)]
struct Ping;

#[derive(Debug, Clone, Event)]
struct OrderPlaced<T: Clone + std::fmt::Debug + Send + Sync + 'static> {
    payload: T,
}

fn kind_of<R: Request>() -> RequestKind {
    R::KIND
}

#[test]
fn test_derives_resolve_through_facade() {
    assert_eq!(kind_of::<CreateOrder>(), RequestKind::Command);
    assert_eq!(kind_of::<Ping>(), RequestKind::Query);
    assert_eq!(kind_of::<OrderPlaced<String>>(), RequestKind::Event);

    let placed = OrderPlaced { payload: 3u8 };
    assert_eq!(placed.clone().payload, 3);
}

#[tokio::test]
async fn test_derived_command_dispatches() {
    let mut mediator = Mediator::new();
    mediator.register_command_handler(Handler::<CreateOrder>::from_fn(|command, _| async move {
        Ok(command.order_id * 2)
    }));

    assert_eq!(mediator.send(CreateOrder { order_id: 21 }).await.unwrap(), 42);
}
