use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_blpop_command_direct_response() {
    let mut env = TestEnv::new_master_server();

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("grape", &["mango", "raspberry", "apple"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(3),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::blpop_command("grape", "0"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_bulk_string_array(&["grape", "mango"]),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_blocks_until_push() {
    let mut env = TestEnv::new_master_server();

    let waiter = TestUtils::spawn_blpop_task(&env, "grape", "0");
    TestUtils::sleep_ms(50).await;
    assert!(!waiter.is_finished());

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("grape", &["mango"]),
        &TestUtils::client_address(41845),
        &TestUtils::expected_integer(1),
    )
    .await;

    let response = tokio::time::timeout(std::time::Duration::from_secs(2), waiter)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response, TestUtils::expected_bulk_string_array(&["grape", "mango"]));

    env.exec_command_immediate_success_response(
        TestUtils::command(&["LLEN", "grape"]),
        &TestUtils::client_address(41845),
        &TestUtils::expected_integer(0),
    )
    .await;
}

#[tokio::test]
async fn test_blpop_times_out_with_null() {
    let env = TestEnv::new_master_server();

    let waiter = TestUtils::spawn_blpop_task(&env, "grape", "0.1");
    let response = tokio::time::timeout(std::time::Duration::from_secs(2), waiter)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response, TestUtils::expected_null());
}

#[tokio::test]
async fn test_blpop_propagates_as_lpop() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command(TestUtils::rpush_command("grape", &["mango"]), &client)
        .await;

    let outcome = env
        .exec_command(TestUtils::blpop_command("grape", "1"), &client)
        .await;

    assert_eq!(outcome.propagate, vec![TestUtils::command(&["LPOP", "grape"])]);
}
