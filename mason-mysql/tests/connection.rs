//! End-to-end scenarios that require a live server, gated behind `MYSQL_HOST`
//! via `MySqlConnectOptions::from_env()` so a plain `cargo test` never fails
//! for lack of a database. Run with:
//!
//!     MYSQL_HOST=127.0.0.1 cargo test -p mason-mysql --test connection -- --ignored

use mason_mysql::{MySqlConnectOptions, MySqlResult, Value};

async fn connect() -> mason_mysql::Connection {
    tracing_subscriber::fmt::try_init().ok();

    MySqlConnectOptions::from_env()
        .connect()
        .await
        .expect("failed to connect to MYSQL_HOST")
}

#[tokio::test]
#[ignore]
async fn it_connects_and_pings() {
    let mut conn = connect().await;

    match conn.fetch("SELECT 1").await.unwrap() {
        MySqlResult::Data { rows, .. } => {
            assert_eq!(rows, vec![vec![Value::Int(1)]]);
        }
        other => panic!("expected a result set, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn it_inserts_and_reports_affected_rows() {
    let mut conn = connect().await;

    conn.fetch("CREATE TEMPORARY TABLE it_inserts (a INTEGER)").await.unwrap();

    match conn.fetch("INSERT INTO it_inserts (a) VALUES (5)").await.unwrap() {
        MySqlResult::Updated { affected_rows, .. } => assert_eq!(affected_rows, 1),
        other => panic!("expected an OK packet, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn it_reports_a_syntax_error() {
    let mut conn = connect().await;

    let err = conn.fetch("SLECT 1").await.unwrap_err();
    match err {
        mason_mysql::Error::ServerError { code, sql_state, message } => {
            assert_eq!(code, 1064);
            assert_eq!(sql_state.as_deref(), Some("42000"));
            assert!(message.starts_with("You have an error"), "message was: {}", message);
        }
        other => panic!("expected a ServerError, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn it_executes_a_prepared_statement() {
    let mut conn = connect().await;

    match conn
        .execute("p1", "SELECT ? + ?", &[Value::Int(3), Value::Int(4)])
        .await
        .unwrap()
    {
        MySqlResult::Data { rows, .. } => assert_eq!(rows, vec![vec![Value::Int(7)]]),
        other => panic!("expected a result set, got {:?}", other),
    }

    // Re-executing the same name must not re-issue PREPARE.
    match conn
        .execute("p1", "SELECT ? + ?", &[Value::Int(10), Value::Int(20)])
        .await
        .unwrap()
    {
        MySqlResult::Data { rows, .. } => assert_eq!(rows, vec![vec![Value::Int(30)]]),
        other => panic!("expected a result set, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn it_rolls_back_on_caller_failure() {
    let mut conn = connect().await;

    conn.fetch("CREATE TEMPORARY TABLE it_rolls_back (a INTEGER)").await.unwrap();

    let outcome = conn
        .transaction(|session| {
            Box::pin(async move {
                session.fetch("INSERT INTO it_rolls_back (a) VALUES (1)").await?;
                session.fetch("SLECT this is not valid sql").await?;
                Ok(())
            })
        })
        .await;

    match outcome {
        mason_mysql::Outcome::Aborted(reason) => {
            assert!(matches!(reason, mason_mysql::AbortReason::RolledBack { .. }));
        }
        other => panic!("expected the transaction to abort, got {:?}", other),
    }

    match conn.fetch("SELECT COUNT(*) FROM it_rolls_back").await.unwrap() {
        MySqlResult::Data { rows, .. } => assert_eq!(rows, vec![vec![Value::Int(0)]]),
        other => panic!("expected a result set, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn it_round_trips_an_escaped_string() {
    let mut conn = connect().await;

    conn.fetch("CREATE TEMPORARY TABLE it_escapes (a TEXT)").await.unwrap();

    let value = Value::Bytes(b"a'b\\c\n".to_vec());
    let literal = mason_mysql::encode_literal(&value).unwrap();
    assert_eq!(literal, "'a\\'b\\\\c\\n'");

    conn.fetch(&format!("INSERT INTO it_escapes (a) VALUES ({})", literal)).await.unwrap();

    match conn.fetch("SELECT a FROM it_escapes").await.unwrap() {
        MySqlResult::Data { rows, .. } => {
            assert_eq!(rows, vec![vec![Value::Bytes(b"a'b\\c\n".to_vec())]]);
        }
        other => panic!("expected a result set, got {:?}", other),
    }
}

#[tokio::test]
#[ignore]
async fn it_pings_and_then_closes() {
    let mut conn = connect().await;

    match conn.ping().await.unwrap() {
        MySqlResult::Updated { .. } => {}
        other => panic!("expected an OK packet, got {:?}", other),
    }

    conn.close().await.unwrap();
}
