use std::sync::Arc;

use redis_relay::{commands::CommandError, replication::SharedWriter};
use tokio::{
    io::{duplex, AsyncReadExt},
    sync::Mutex,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_replconf_command() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (
            TestUtils::replconf_command("listening-port", "6380"),
            TestUtils::expected_simple_string("OK"),
        ),
        (
            TestUtils::replconf_command("capa", "psync2"),
            TestUtils::expected_simple_string("OK"),
        ),
        (
            TestUtils::replconf_command("GETACK", "*"),
            TestUtils::expected_bulk_string_array(&["REPLCONF", "ACK", "0"]),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, &expected)
            .await;
    }

    let outcome = env
        .exec_command(TestUtils::replconf_command("ACK", "42"), &client)
        .await;

    assert!(outcome.replies.is_empty());
    assert_eq!(outcome.acknowledged_offset, Some(42));
}

#[tokio::test]
async fn test_handle_psync_command() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_immediate_success_response(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let outcome = env
        .exec_command(
            TestUtils::command(&["PSYNC", "?", "-1"]),
            &TestUtils::client_address(41845),
        )
        .await;

    assert!(outcome.keep_connection_open());
    assert!(outcome.replies.is_empty());

    env.exec_command_immediate_success_response(
        TestUtils::set_command("late", "1"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let (master_side, mut replica) = duplex(8192);
    let writer: SharedWriter = Arc::new(Mutex::new(Box::new(master_side)));
    env.state
        .replication
        .attach_replica(&TestUtils::client_address(41845), writer, &env.state.store)
        .await
        .unwrap();

    let mut received = vec![0; 8192];
    let read = replica.read(&mut received).await.unwrap();
    let received = &received[..read];

    assert!(received.starts_with(b"+FULLRESYNC "));
    assert!(received.windows(5).any(|window| window == b"grape"));
    assert!(received.windows(4).any(|window| window == b"late"));
    assert_eq!(env.state.replication.replica_count().await, 1);
}

#[tokio::test]
async fn test_wait_without_writes_returns_replica_count() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_immediate_success_response(
        TestUtils::wait_command(0, 100),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(0),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::wait_command(3, 100),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(0),
    )
    .await;
}

#[tokio::test]
async fn test_replica_refuses_writes_and_master_only_commands() {
    let mut env = TestEnv::new_replica_server(6380);
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (TestUtils::set_command("grape", "mango"), CommandError::ReadOnlyReplica),
        (
            TestUtils::rpush_command("fruits", &["mango"]),
            CommandError::ReadOnlyReplica,
        ),
        (TestUtils::wait_command(1, 100), CommandError::WaitOnReplica),
        (
            TestUtils::command(&["PSYNC", "?", "-1"]),
            CommandError::PsyncOnReplica,
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_error_response(command, &client, expected)
            .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grape"),
        &client,
        &TestUtils::expected_null(),
    )
    .await;

    let outcome = env
        .exec_command(TestUtils::command(&["INFO", "replication"]), &client)
        .await;
    assert!(outcome.replies[0].as_str().unwrap().contains("role:slave"));
}
