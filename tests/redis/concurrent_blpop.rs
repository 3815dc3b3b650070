use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_blpop_waiters_are_served_in_arrival_order() {
    let mut env = TestEnv::new_master_server();

    let first = TestUtils::spawn_blpop_task(&env, "queue", "0");
    TestUtils::sleep_ms(20).await;
    let second = TestUtils::spawn_blpop_task(&env, "queue", "0");
    TestUtils::sleep_ms(20).await;
    let third = TestUtils::spawn_blpop_task(&env, "queue", "0");
    TestUtils::sleep_ms(20).await;

    let client = TestUtils::client_address(41844);

    for (value, expected_length) in [("one", 1), ("two", 1), ("three", 1)] {
        env.exec_command_immediate_success_response(
            TestUtils::rpush_command("queue", &[value]),
            &client,
            &TestUtils::expected_integer(expected_length),
        )
        .await;
        TestUtils::sleep_ms(20).await;
    }

    assert_eq!(
        first.await.unwrap(),
        TestUtils::expected_bulk_string_array(&["queue", "one"])
    );
    assert_eq!(
        second.await.unwrap(),
        TestUtils::expected_bulk_string_array(&["queue", "two"])
    );
    assert_eq!(
        third.await.unwrap(),
        TestUtils::expected_bulk_string_array(&["queue", "three"])
    );

    env.exec_command_immediate_success_response(
        TestUtils::command(&["LLEN", "queue"]),
        &client,
        &TestUtils::expected_integer(0),
    )
    .await;
}

#[tokio::test]
async fn test_single_push_wakes_as_many_waiters_as_elements() {
    let mut env = TestEnv::new_master_server();

    let waiters: Vec<_> = (0..3)
        .map(|_| TestUtils::spawn_blpop_task(&env, "jobs", "1"))
        .collect();
    TestUtils::sleep_ms(50).await;

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("jobs", &["a", "b"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(2),
    )
    .await;

    let mut replies = Vec::new();
    for waiter in waiters {
        replies.push(waiter.await.unwrap());
    }

    let served: Vec<_> = replies
        .iter()
        .filter(|reply| **reply != TestUtils::expected_null())
        .cloned()
        .collect();

    assert_eq!(served.len(), 2, "replies: {:?}", replies);
    assert!(served.contains(&TestUtils::expected_bulk_string_array(&["jobs", "a"])));
    assert!(served.contains(&TestUtils::expected_bulk_string_array(&["jobs", "b"])));
}

#[tokio::test]
async fn test_blpop_on_other_key_is_not_woken() {
    let mut env = TestEnv::new_master_server();

    let waiter = TestUtils::spawn_blpop_task(&env, "left", "0.2");
    TestUtils::sleep_ms(20).await;

    env.exec_command_immediate_success_response(
        TestUtils::rpush_command("right", &["value"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(1),
    )
    .await;

    assert_eq!(waiter.await.unwrap(), TestUtils::expected_null());
}
