//! Full sessions over the console gateway.

use std::future;

use discbot_runtime::config::{BotConfig, ConfigError, ConsoleConfig};
use discbot_runtime::{BotRuntime, ConsoleConnector, RuntimeError, StopReason};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

fn runtime(token: Option<&str>, operators: &[&str]) -> BotRuntime {
    BotRuntime::from_config(BotConfig {
        token: token.map(str::to_string),
        operators: operators.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    })
}

fn connector() -> (ConsoleConnector, DuplexStream, DuplexStream) {
    let (input, reader) = duplex(8192);
    let (writer, output) = duplex(8192);
    let connector =
        ConsoleConnector::with_io(ConsoleConfig::default(), BufReader::new(reader), writer);
    (connector, input, output)
}

/// Reads gateway output until a line contains `marker` or the stream ends.
async fn read_until(output: &mut DuplexStream, marker: &str) -> Vec<String> {
    let mut text = String::new();
    let mut buf = vec![0u8; 8192];
    while !text.lines().any(|line| line.contains(marker)) {
        let n = output.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        text.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    text.lines().map(str::to_string).collect()
}

/// Reads gateway output up to and including the close line.
async fn drain(mut output: DuplexStream) -> Vec<String> {
    read_until(&mut output, r#"{"op":"close"}"#).await
}

#[tokio::test]
async fn test_operator_quit_ends_session() {
    let runtime = runtime(Some("token"), &["console"]);
    let (connector, mut input, output) = connector();

    input
        .write_all(
            b"{\"id\":\"1\",\"author\":{\"id\":\"42\"},\"channel_id\":\"general\",\"content\":\"hi\"}\n\
              !op 42 99\n\
              !quit\n",
        )
        .await
        .unwrap();

    let reason = runtime
        .run_until(&connector, future::pending())
        .await
        .unwrap();
    assert_eq!(reason, StopReason::Quit);

    let lines = drain(output).await;
    assert_eq!(
        lines,
        vec![
            r#"{"op":"send","id":"out-1","channel_id":"console","content":"1 user added to operators."}"#,
            r#"{"op":"close"}"#,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_dispatch_replies_then_quits() {
    let runtime = BotRuntime::from_config(BotConfig {
        token: Some("token".into()),
        operators: vec!["console".into()],
        concurrent_dispatch: true,
        ..Default::default()
    });
    let (connector, mut input, mut output) = connector();

    let operator = async move {
        input
            .write_all(
                b"{\"id\":\"1\",\"author\":{\"id\":\"42\"},\"channel_id\":\"general\",\"content\":\"hi\"}\n\
                  !op 42\n",
            )
            .await
            .unwrap();
        let replies = read_until(&mut output, "operators.").await;

        input.write_all(b"!quit\n").await.unwrap();
        let closing = read_until(&mut output, r#"{"op":"close"}"#).await;
        (replies, closing)
    };

    let (reason, (replies, closing)) =
        tokio::join!(runtime.run_until(&connector, future::pending()), operator);

    assert_eq!(reason.unwrap(), StopReason::Quit);
    assert_eq!(
        replies,
        vec![r#"{"op":"send","id":"out-1","channel_id":"console","content":"1 user added to operators."}"#]
    );
    assert_eq!(closing, vec![r#"{"op":"close"}"#]);
}

#[tokio::test]
async fn test_end_of_input_closes_session() {
    let runtime = runtime(Some("token"), &[]);
    let (connector, mut input, output) = connector();

    input.write_all(b"hello\n").await.unwrap();
    drop(input);

    let reason = runtime
        .run_until(&connector, future::pending())
        .await
        .unwrap();
    assert_eq!(reason, StopReason::SessionEnded);
    assert_eq!(drain(output).await, vec![r#"{"op":"close"}"#.to_string()]);
}

#[tokio::test]
async fn test_shutdown_future_stops_runtime() {
    let runtime = runtime(Some("token"), &[]);
    let (connector, _input, _output) = connector();

    let reason = runtime.run_until(&connector, async {}).await.unwrap();
    assert_eq!(reason, StopReason::Signal);
}

#[tokio::test]
async fn test_missing_token_fails_before_connecting() {
    let runtime = runtime(None, &[]);
    let (connector, _input, _output) = connector();

    let err = runtime
        .run_until(&connector, future::pending())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Config(ConfigError::MissingField { .. })
    ));
}
