use redis_relay::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_subscribe_command() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    let test_cases = vec![
        (
            TestUtils::subscribe_command(&["channel1"]),
            "*3\r\n$9\r\nsubscribe\r\n$8\r\nchannel1\r\n:1\r\n",
        ),
        (
            TestUtils::subscribe_command(&["channel1"]),
            "*3\r\n$9\r\nsubscribe\r\n$8\r\nchannel1\r\n:1\r\n",
        ),
        (
            TestUtils::subscribe_command(&["channel2"]),
            "*3\r\n$9\r\nsubscribe\r\n$8\r\nchannel2\r\n:2\r\n",
        ),
        (
            TestUtils::command(&["PING"]),
            "*2\r\n$4\r\npong\r\n$0\r\n\r\n",
        ),
        (
            TestUtils::command(&["UNSUBSCRIBE", "channel1"]),
            "*3\r\n$11\r\nunsubscribe\r\n$8\r\nchannel1\r\n:1\r\n",
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_success_response(command, &client, expected)
            .await;
    }

    env.exec_command_immediate_error_response(
        TestUtils::set_command("grape", "mango"),
        &client,
        CommandError::SubscriptionMode("set".to_string()),
    )
    .await;
}

#[tokio::test]
async fn test_handle_publish_command() {
    let mut env = TestEnv::new_master_server();
    let subscriber = TestUtils::client_address(41844);
    let other_subscriber = TestUtils::client_address(41845);
    let publisher = TestUtils::client_address(41846);

    env.exec_command_immediate_success_response(
        TestUtils::publish_command("channel1", "hello"),
        &publisher,
        &TestUtils::expected_integer(0),
    )
    .await;

    let first = env
        .exec_command(TestUtils::subscribe_command(&["channel1"]), &subscriber)
        .await;
    let second = env
        .exec_command(TestUtils::subscribe_command(&["channel1"]), &other_subscriber)
        .await;

    env.exec_command_immediate_success_response(
        TestUtils::publish_command("channel1", "hello"),
        &publisher,
        &TestUtils::expected_integer(2),
    )
    .await;

    for outcome in [first, second] {
        let mut subscription = outcome.subscriptions.into_iter().next().unwrap();
        let message = subscription.recv_timeout(1000).await.unwrap();

        assert_eq!(
            message.encode(),
            TestUtils::expected_bulk_string_array(&["message", "channel1", "hello"])
        );
    }
}

#[tokio::test]
async fn test_unsubscribe_without_subscriptions() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_immediate_success_response(
        TestUtils::command(&["UNSUBSCRIBE"]),
        &TestUtils::client_address(41844),
        "*3\r\n$11\r\nunsubscribe\r\n$-1\r\n:0\r\n",
    )
    .await;
}
