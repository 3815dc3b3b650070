use redis_relay::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_sorted_set_commands() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (
            TestUtils::command(&["ZADD", "racers", "2", "bob"]),
            TestUtils::expected_integer(1),
        ),
        (
            TestUtils::command(&["ZADD", "racers", "1.5", "alice"]),
            TestUtils::expected_integer(1),
        ),
        (
            TestUtils::command(&["ZADD", "racers", "2", "carol"]),
            TestUtils::expected_integer(1),
        ),
        (
            TestUtils::command(&["ZADD", "racers", "0.5", "bob"]),
            TestUtils::expected_integer(0),
        ),
        (
            TestUtils::command(&["ZCARD", "racers"]),
            TestUtils::expected_integer(3),
        ),
        (
            TestUtils::command(&["ZRANGE", "racers", "0", "-1"]),
            TestUtils::expected_bulk_string_array(&["bob", "alice", "carol"]),
        ),
        (
            TestUtils::command(&["ZRANGE", "racers", "0", "1", "WITHSCORES"]),
            TestUtils::expected_bulk_string_array(&["bob", "0.5", "alice", "1.5"]),
        ),
        (
            TestUtils::command(&["ZRANK", "racers", "carol"]),
            TestUtils::expected_integer(2),
        ),
        (
            TestUtils::command(&["ZRANK", "racers", "dave"]),
            TestUtils::expected_null(),
        ),
        (
            TestUtils::command(&["ZSCORE", "racers", "carol"]),
            TestUtils::expected_bulk_string("2"),
        ),
        (
            TestUtils::command(&["ZREM", "racers", "bob", "dave"]),
            TestUtils::expected_integer(1),
        ),
        (
            TestUtils::command(&["ZCARD", "racers"]),
            TestUtils::expected_integer(2),
        ),
        (
            TestUtils::command(&["TYPE", "racers"]),
            TestUtils::expected_simple_string("zset"),
        ),
        (
            TestUtils::command(&["ZCARD", "missing"]),
            TestUtils::expected_integer(0),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, &expected)
            .await;
    }
}

#[tokio::test]
async fn test_zadd_rejects_invalid_score() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_immediate_error_response(
        TestUtils::command(&["ZADD", "racers", "fast", "bob"]),
        &TestUtils::client_address(41844),
        CommandError::NotAFloat,
    )
    .await;
}
