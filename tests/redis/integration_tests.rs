use std::time::Duration;

use redis_relay::{
    config::{ReplicaOf, ServerConfig},
    key_value_store::DataType,
    resp::RespValue,
    state::State,
};
use tokio::net::TcpStream;

use crate::test_utils::TestUtils;

fn master_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        dbfilename: "missing-integration.rdb".to_string(),
        ..Default::default()
    }
}

async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let attempt = async {
        while !condition().await {
            TestUtils::sleep_ms(10).await;
        }
    };

    tokio::time::timeout(Duration::from_secs(3), attempt)
        .await
        .expect("condition not reached in time");
}

async fn wait_for_key(state: &State, key: &str, expected: &str) {
    wait_until(move || async move {
        state.store.get(key).await == Some(DataType::String(expected.to_string()))
    })
    .await;
}

#[tokio::test]
async fn test_client_round_trip_over_tcp() {
    let (address, _state, _shutdown) = TestUtils::run_server(master_config()).await;
    let mut client = TcpStream::connect(address).await.unwrap();

    let test_cases = vec![
        (TestUtils::command(&["PING"]), RespValue::SimpleString("PONG".into())),
        (TestUtils::set_command("grape", "mango"), RespValue::ok()),
        (TestUtils::get_command("grape"), RespValue::bulk("mango")),
        (TestUtils::incr_command("counter"), RespValue::Integer(1)),
        (
            TestUtils::command(&["NOPE"]),
            RespValue::Error("ERR unknown command 'NOPE'".into()),
        ),
    ];

    for (command, expected) in test_cases {
        let reply = TestUtils::send_command_and_receive(&mut client, command.clone()).await;
        assert_eq!(reply, expected, "sending {:?}", command);
    }
}

#[tokio::test]
async fn test_master_replica_handshake_and_replication() {
    let (master_address, master_state, _master_shutdown) =
        TestUtils::run_server(master_config()).await;

    let replica_config = ServerConfig {
        replicaof: Some(ReplicaOf {
            host: "127.0.0.1".to_string(),
            port: master_address.port(),
        }),
        ..master_config()
    };
    let (replica_address, replica_state, _replica_shutdown) =
        TestUtils::run_server(replica_config).await;

    let master = &master_state;
    wait_until(move || async move { master.replication.replica_count().await == 1 }).await;

    let mut client = TcpStream::connect(master_address).await.unwrap();

    let reply = TestUtils::send_command_and_receive(
        &mut client,
        TestUtils::set_command("test_key", "test_value"),
    )
    .await;
    assert_eq!(reply, RespValue::ok());

    let reply = TestUtils::send_command_and_receive(
        &mut client,
        TestUtils::rpush_command("list", &["a", "b"]),
    )
    .await;
    assert_eq!(reply, RespValue::Integer(2));

    wait_for_key(&replica_state, "test_key", "test_value").await;

    let reply =
        TestUtils::send_command_and_receive(&mut client, TestUtils::wait_command(1, 1000)).await;
    assert_eq!(reply, RespValue::Integer(1));

    let mut replica_client = TcpStream::connect(replica_address).await.unwrap();

    let reply = TestUtils::send_command_and_receive(
        &mut replica_client,
        TestUtils::lrange_command("list", 0, -1),
    )
    .await;
    assert_eq!(reply, RespValue::array_of_bulk_strings(["a", "b"]));

    let reply = TestUtils::send_command_and_receive(
        &mut replica_client,
        TestUtils::set_command("test_key", "other"),
    )
    .await;
    assert!(matches!(reply, RespValue::Error(message) if message.starts_with("READONLY")));

    let reply = TestUtils::send_command_and_receive(
        &mut replica_client,
        TestUtils::command(&["INFO", "replication"]),
    )
    .await;
    let info = reply.as_str().unwrap().to_string();
    assert!(info.contains("role:slave"), "info: {}", info);

    let master_offset = master_state.replication.offset().get();
    let replica = &replica_state;
    wait_until(move || async move { replica.replication.offset().get() >= master_offset }).await;
}

#[tokio::test]
async fn test_wait_times_out_with_unresponsive_replica_count() {
    let (address, _state, _shutdown) = TestUtils::run_server(master_config()).await;
    let mut client = TcpStream::connect(address).await.unwrap();

    let reply =
        TestUtils::send_command_and_receive(&mut client, TestUtils::set_command("a", "1")).await;
    assert_eq!(reply, RespValue::ok());

    let reply =
        TestUtils::send_command_and_receive(&mut client, TestUtils::wait_command(1, 100)).await;
    assert_eq!(reply, RespValue::Integer(0));
}
