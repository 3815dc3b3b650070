use redis_relay::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_exec_command_immediately_after_multi_command() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::multi_command(),
        &client,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::exec_command(),
        &client,
        &TestUtils::expected_bulk_string_array(&[]),
    )
    .await;

    env.exec_command_immediate_error_response(
        TestUtils::exec_command(),
        &client,
        CommandError::ExecWithoutMulti,
    )
    .await;
}

#[tokio::test]
async fn test_handle_should_queue_commands() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);
    let other_client = TestUtils::client_address(41845);

    let test_cases = vec![
        (TestUtils::multi_command(), TestUtils::expected_simple_string("OK")),
        (
            TestUtils::set_command("grapes", "4"),
            TestUtils::expected_simple_string("QUEUED"),
        ),
        (
            TestUtils::incr_command("grapes"),
            TestUtils::expected_simple_string("QUEUED"),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, &expected)
            .await;
    }

    // Nothing runs before EXEC.
    env.exec_command_immediate_success_response(
        TestUtils::get_command("grapes"),
        &other_client,
        &TestUtils::expected_null(),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::exec_command(),
        &client,
        "*2\r\n+OK\r\n:5\r\n",
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::get_command("grapes"),
        &other_client,
        &TestUtils::expected_bulk_string("5"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_discard_command() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command_immediate_error_response(
        TestUtils::discard_command(),
        &client,
        CommandError::DiscardWithoutMulti,
    )
    .await;

    let test_cases = vec![
        (TestUtils::multi_command(), TestUtils::expected_simple_string("OK")),
        (
            TestUtils::set_command("grapes", "4"),
            TestUtils::expected_simple_string("QUEUED"),
        ),
        (TestUtils::discard_command(), TestUtils::expected_simple_string("OK")),
        (TestUtils::get_command("grapes"), TestUtils::expected_null()),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, &expected)
            .await;
    }
}

#[tokio::test]
async fn test_transactions_are_per_client() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);
    let other_client = TestUtils::client_address(41845);

    env.exec_command_immediate_success_response(
        TestUtils::multi_command(),
        &client,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::set_command("grapes", "4"),
        &other_client,
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_immediate_error_response(
        TestUtils::exec_command(),
        &other_client,
        CommandError::ExecWithoutMulti,
    )
    .await;
}
