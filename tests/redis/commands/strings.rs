use redis_relay::{commands::CommandError, key_value_store::StoreError};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_string_commands() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (TestUtils::command(&["PING"]), TestUtils::expected_simple_string("PONG")),
        (
            TestUtils::command(&["ECHO", "hey"]),
            TestUtils::expected_bulk_string("hey"),
        ),
        (TestUtils::get_command("grape"), TestUtils::expected_null()),
        (
            TestUtils::set_command("grape", "mango"),
            TestUtils::expected_simple_string("OK"),
        ),
        (
            TestUtils::get_command("grape"),
            TestUtils::expected_bulk_string("mango"),
        ),
        (
            TestUtils::command(&["TYPE", "grape"]),
            TestUtils::expected_simple_string("string"),
        ),
        (
            TestUtils::command(&["TYPE", "missing"]),
            TestUtils::expected_simple_string("none"),
        ),
        (TestUtils::incr_command("counter"), TestUtils::expected_integer(1)),
        (TestUtils::incr_command("counter"), TestUtils::expected_integer(2)),
        (
            TestUtils::command(&["KEYS", "*"]),
            TestUtils::expected_bulk_string_array(&["counter", "grape"]),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, &expected)
            .await;
    }
}

#[tokio::test]
async fn test_handle_string_command_errors() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::set_command("grape", "mango"),
        &client,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;
    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("fruits", &["apple"]),
        &client,
        &TestUtils::expected_integer(1),
    )
    .await;

    let test_cases = vec![
        (TestUtils::incr_command("grape"), CommandError::NotAnInteger),
        (
            TestUtils::get_command("fruits"),
            CommandError::Store(StoreError::WrongType),
        ),
        (TestUtils::command(&["GET"]), CommandError::wrong_arity("get")),
        (
            TestUtils::command(&["SET", "a", "b", "PX", "0"]),
            CommandError::InvalidExpireTime("set".to_string()),
        ),
        (
            TestUtils::command(&["FLUSHALL"]),
            CommandError::UnknownCommand("FLUSHALL".to_string()),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_error_response(command, &client, expected)
            .await;
    }
}

#[tokio::test]
async fn test_set_with_expiration() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::set_command_with_expiration("grape", "mango", 100),
        &client,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grape"),
        &client,
        &TestUtils::expected_bulk_string("mango"),
    )
    .await;

    TestUtils::sleep_ms(150).await;

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grape"),
        &client,
        &TestUtils::expected_null(),
    )
    .await;
}

#[tokio::test]
async fn test_config_get_and_info() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::command(&["CONFIG", "GET", "dir"]),
        &client,
        &TestUtils::expected_bulk_string_array(&["dir", "."]),
    )
    .await;

    let outcome = env
        .exec_command(TestUtils::command(&["INFO", "replication"]), &client)
        .await;
    let info = outcome.replies[0].as_str().unwrap().to_string();

    assert!(info.starts_with("# Replication"));
    assert!(info.contains("role:master"));
    assert!(info.contains("connected_slaves:0"));
    assert!(info.contains("master_repl_offset:0"));
}
