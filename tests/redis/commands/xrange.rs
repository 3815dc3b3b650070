use redis_relay::{commands::CommandError, key_value_store::StreamError};

use crate::test_utils::{TestEnv, TestUtils};

fn entry(id: &str) -> String {
    format!(
        "*2\r\n${}\r\n{}\r\n*4\r\n$5\r\nmango\r\n$5\r\napple\r\n$9\r\nraspberry\r\n$4\r\npear\r\n",
        id.len(),
        id
    )
}

fn entries(ids: &[&str]) -> String {
    let mut response = format!("*{}\r\n", ids.len());

    for id in ids {
        response.push_str(&entry(id));
    }

    response
}

#[tokio::test]
async fn test_handle_xrange_command() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    for i in 0..=1 {
        let first_stream_id_part = format!("15269190304{}4", i);

        for j in 0..=3 {
            let stream_id = format!("{}-{}", &first_stream_id_part, j);

            env.exec_command_immediate_success_response(
                TestUtils::xadd_command(
                    "fruits",
                    &stream_id,
                    &["mango", "apple", "raspberry", "pear"],
                ),
                &client,
                &TestUtils::expected_bulk_string(&stream_id),
            )
            .await;
        }
    }

    let test_cases = vec![
        (
            "1526919030404-0",
            "1526919030404-3",
            entries(&[
                "1526919030404-0",
                "1526919030404-1",
                "1526919030404-2",
                "1526919030404-3",
            ]),
        ),
        (
            "1526919030404-3",
            "1526919030414-1",
            entries(&["1526919030404-3", "1526919030414-0", "1526919030414-1"]),
        ),
        (
            "1526919030414",
            "1526919030414",
            entries(&[
                "1526919030414-0",
                "1526919030414-1",
                "1526919030414-2",
                "1526919030414-3",
            ]),
        ),
        (
            "1526919030414-2",
            "+",
            entries(&["1526919030414-2", "1526919030414-3"]),
        ),
        ("-", "1526919030404-0", entries(&["1526919030404-0"])),
        ("1526919030500", "+", entries(&[])),
    ];

    for (start, end, expected) in test_cases {
        env.exec_command_immediate_success_response(
            TestUtils::xrange_command("fruits", start, end),
            &client,
            &expected,
        )
        .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::command(&["XRANGE", "fruits", "-", "+", "COUNT", "2"]),
        &client,
        &entries(&["1526919030404-0", "1526919030404-1"]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_xadd_errors() {
    let mut env = TestEnv::new_master_server();
    let client = TestUtils::client_address(41844);

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("fruits", "5-*", &["mango", "1"]),
        &client,
        &TestUtils::expected_bulk_string("5-0"),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("fruits", "5-*", &["mango", "2"]),
        &client,
        &TestUtils::expected_bulk_string("5-1"),
    )
    .await;

    let test_cases = vec![
        (
            TestUtils::xadd_command("fruits", "5-1", &["mango", "3"]),
            CommandError::Stream(StreamError::NotIncreasing),
        ),
        (
            TestUtils::xadd_command("fruits", "0-0", &["mango", "3"]),
            CommandError::Stream(StreamError::ZeroId),
        ),
        (
            TestUtils::xadd_command("fruits", "nope", &["mango", "3"]),
            CommandError::Stream(StreamError::InvalidId),
        ),
        (
            TestUtils::xadd_command("fruits", "6-0", &["mango"]),
            CommandError::wrong_arity("xadd"),
        ),
    ];

    for (command, expected) in test_cases {
        env.exec_command_immediate_error_response(command, &client, expected)
            .await;
    }

    env.exec_command_immediate_success_response(
        TestUtils::xadd_command("empty", "0-0", &["mango", "3"]),
        &client,
        &CommandError::Stream(StreamError::ZeroId).as_resp().encode(),
    )
    .await;

    env.exec_command_immediate_success_response(
        TestUtils::command(&["TYPE", "empty"]),
        &client,
        &TestUtils::expected_simple_string("none"),
    )
    .await;
}
