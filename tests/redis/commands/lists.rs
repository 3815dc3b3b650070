use redis_relay::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_list_commands() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (
            TestUtils::rpush_command("fruits", &["mango", "apple"]),
            TestUtils::expected_integer(2),
        ),
        (
            TestUtils::lpush_command("fruits", &["grape", "pear"]),
            TestUtils::expected_integer(4),
        ),
        (
            TestUtils::lrange_command("fruits", 0, -1),
            TestUtils::expected_bulk_string_array(&["pear", "grape", "mango", "apple"]),
        ),
        (
            TestUtils::lrange_command("fruits", 1, 2),
            TestUtils::expected_bulk_string_array(&["grape", "mango"]),
        ),
        (
            TestUtils::lrange_command("fruits", -2, 10),
            TestUtils::expected_bulk_string_array(&["mango", "apple"]),
        ),
        (
            TestUtils::lrange_command("fruits", 3, 1),
            TestUtils::expected_bulk_string_array(&[]),
        ),
        (
            TestUtils::command(&["LLEN", "fruits"]),
            TestUtils::expected_integer(4),
        ),
        (
            TestUtils::command(&["LPOP", "fruits"]),
            TestUtils::expected_bulk_string("pear"),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "2"]),
            TestUtils::expected_bulk_string_array(&["grape", "mango"]),
        ),
        (
            TestUtils::command(&["LPOP", "fruits", "5"]),
            TestUtils::expected_bulk_string_array(&["apple"]),
        ),
        (
            TestUtils::command(&["LLEN", "fruits"]),
            TestUtils::expected_integer(0),
        ),
        (
            TestUtils::command(&["LPOP", "fruits"]),
            TestUtils::expected_null(),
        ),
        (
            TestUtils::command(&["TYPE", "fruits"]),
            TestUtils::expected_simple_string("none"),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, &expected)
            .await;
    }
}

#[tokio::test]
async fn test_handle_list_command_errors() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (
            TestUtils::command(&["RPUSH", "fruits"]),
            CommandError::wrong_arity("rpush"),
        ),
        (
            TestUtils::command(&["LRANGE", "fruits", "a", "1"]),
            CommandError::NotAnInteger,
        ),
        (
            TestUtils::command(&["BLPOP", "fruits", "-1"]),
            CommandError::InvalidTimeout,
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_error_response(command, &client, expected)
            .await;
    }
}
