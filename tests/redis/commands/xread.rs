use std::time::Duration;

use crate::test_utils::{TestEnv, TestUtils};

fn stream_reply(key: &str, ids: &[&str], field: &str, value: &str) -> String {
    let mut response = format!("*2\r\n${}\r\n{}\r\n*{}\r\n", key.len(), key, ids.len());

    for id in ids {
        response.push_str(&format!(
            "*2\r\n${}\r\n{}\r\n*2\r\n${}\r\n{}\r\n${}\r\n{}\r\n",
            id.len(),
            id,
            field.len(),
            field,
            value.len(),
            value
        ));
    }

    response
}

async fn seed(env: &mut TestEnv, key: &str, ids: &[&str]) {
    for id in ids {
        env.exec_command_immediate_success_response(
            TestUtils::xadd_command(key, id, &["mango", "1"]),
            &TestUtils::client_address(41844),
            &TestUtils::expected_bulk_string(id),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_xread_command() {
    let mut env = TestEnv::new_master_server();
    seed(&mut env, "fruits", &["1-0", "1-1", "2-0"]).await;
    seed(&mut env, "exotic", &["1-5"]).await;

    let test_cases = vec![
        (
            vec!["fruits"],
            vec!["1-0"],
            format!("*1\r\n{}", stream_reply("fruits", &["1-1", "2-0"], "mango", "1")),
        ),
        (vec!["fruits"], vec!["2-0"], TestUtils::expected_null()),
        (
            vec!["fruits", "exotic"],
            vec!["1-1", "0-0"],
            format!(
                "*2\r\n{}{}",
                stream_reply("fruits", &["2-0"], "mango", "1"),
                stream_reply("exotic", &["1-5"], "mango", "1")
            ),
        ),
        (
            vec!["fruits", "missing"],
            vec!["2-0", "0-0"],
            TestUtils::expected_null(),
        ),
    ];

    for (keys, ids, expected) in test_cases {
        env.exec_command_immediate_success_response(
            TestUtils::xread_command(&keys, &ids),
            &TestUtils::client_address(41844),
            &expected,
        )
        .await;
    }
}

#[tokio::test]
async fn test_xread_block_is_woken_by_xadd() {
    let mut env = TestEnv::new_master_server();
    seed(&mut env, "fruits", &["1-0"]).await;

    let reader = TestUtils::spawn_command_task(
        &env,
        TestUtils::xread_blocking_command(0, &["fruits"], &["$"]),
    );
    TestUtils::sleep_ms(50).await;
    assert!(!reader.is_finished());

    seed(&mut env, "fruits", &["2-0"]).await;

    let response = tokio::time::timeout(Duration::from_secs(2), reader)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        response,
        format!("*1\r\n{}", stream_reply("fruits", &["2-0"], "mango", "1"))
    );
}

#[tokio::test]
async fn test_xread_block_times_out_with_null() {
    let env = TestEnv::new_master_server();

    let reader = TestUtils::spawn_command_task(
        &env,
        TestUtils::xread_blocking_command(100, &["fruits"], &["0-0"]),
    );

    let response = tokio::time::timeout(Duration::from_secs(2), reader)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(response, TestUtils::expected_null());
}

#[tokio::test]
async fn test_xread_block_returns_existing_entries_at_once() {
    let mut env = TestEnv::new_master_server();
    seed(&mut env, "fruits", &["1-0"]).await;

    env.exec_command_immediate_success_response(
        TestUtils::xread_blocking_command(1000, &["fruits"], &["0-0"]),
        &TestUtils::client_address(41844),
        &format!("*1\r\n{}", stream_reply("fruits", &["1-0"], "mango", "1")),
    )
    .await;
}
