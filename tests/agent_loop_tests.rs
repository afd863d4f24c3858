// Agent loop tests - the function-calling agent driving the standard tool set

mod support;

use agentloom_core::agent::{AgentError, AgentOptions, FunctionCallingAgent};
use agentloom_core::database::SqliteDatabase;
use agentloom_core::model::{ModelParams, PromptFormat};
use agentloom_core::tooling::builtin::{self, SqlQueryTool};
use agentloom_core::types::MessageRole;
use rusqlite::Connection;
use std::sync::Arc;
use support::{FlakySandbox, ScriptedProvider};

fn chinook() -> SqliteDatabase {
    let conn = Connection::open_in_memory().expect("in-memory database");
    conn.execute_batch(
        "CREATE TABLE albums (id INTEGER PRIMARY KEY, title TEXT NOT NULL, artist TEXT);
         INSERT INTO albums (title, artist) VALUES
             ('For Those About To Rock', 'AC/DC'),
             ('Let There Be Rock', 'AC/DC'),
             ('Big Ones', 'Aerosmith');",
    )
    .expect("seed albums");
    SqliteDatabase::from_connection(conn)
}

fn agent(provider: &ScriptedProvider, sandbox: Arc<FlakySandbox>, with_db: bool) -> FunctionCallingAgent {
    let sql = with_db.then(|| {
        SqlQueryTool::new(
            Arc::new(provider.clone()),
            Arc::new(chinook()),
            ModelParams::default(),
        )
    });
    let registry = builtin::standard_registry(sandbox, sql).expect("registry builds");
    FunctionCallingAgent::new(Arc::new(provider.clone()), Arc::new(registry))
}

#[tokio::test]
async fn runs_a_batch_of_tools_then_answers() {
    let provider = ScriptedProvider::new(vec![
        r#"I will check both ways.
[{"tool": "calculator", "tool_input": {"expression": "6 * 7"}},
 {"tool": "python_repl", "tool_input": {"command": "print(6 * 7)"}}]"#,
        r#"[{"tool": "ConversationalResponse", "tool_input": {"response": "Six times seven is 42."}}]"#,
    ]);
    let sandbox = Arc::new(FlakySandbox::new(0, "42\n"));

    let outcome = agent(&provider, sandbox.clone(), false)
        .run("What is 6 times 7?", AgentOptions::default())
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.response, "Six times seven is 42.");
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.steps.len(), 2);
    assert!(outcome.steps.iter().all(|step| step.success && step.iteration == 1));
    assert_eq!(sandbox.runs.lock().await.as_slice(), ["print(6 * 7)"]);

    let tool_turn = outcome
        .history
        .iter()
        .find(|message| message.role == MessageRole::Tool)
        .expect("tool results recorded");
    assert_eq!(tool_turn.tool_call_id, Some(0));
    assert!(tool_turn.content.contains("Tool 'calculator' response: 42"));
    assert!(tool_turn.content.contains("Tool 'python_repl' response: 42"));

    let prompts = provider.prompts().await;
    assert!(prompts[1].contains("Tool 'calculator' response: 42"));
}

#[tokio::test]
async fn sql_tool_shares_the_model_with_the_loop() {
    let provider = ScriptedProvider::new(vec![
        r#"[{"tool": "query_db", "tool_input": {"query": "How many albums are there?"}}]"#,
        " COUNT(*) FROM albums; DROP TABLE albums;",
        r#"{"tool": "ConversationalResponse", "tool_input": {"response": "There are 3 albums."}}"#,
    ]);

    let outcome = agent(&provider, Arc::new(FlakySandbox::new(0, "")), true)
        .run("How many albums are in the store?", AgentOptions::default())
        .await
        .expect("agent succeeds");

    assert_eq!(outcome.response, "There are 3 albums.");
    assert_eq!(outcome.steps[0].output, "[(3,)]");

    let prompts = provider.prompts().await;
    assert!(prompts[1].contains("CREATE TABLE albums"));
    assert!(prompts[1].trim_end().ends_with("SELECT"));
}

#[tokio::test]
async fn failing_code_is_reported_back_to_the_model() {
    let provider = ScriptedProvider::new(vec![
        r#"[{"tool": "python_repl", "tool_input": {"command": "print(1 / 0)"}}]"#,
        r#"[{"tool": "ConversationalResponse", "tool_input": {"response": "Division by zero is undefined."}}]"#,
    ]);

    let outcome = agent(&provider, Arc::new(FlakySandbox::new(1, "")), false)
        .with_format(PromptFormat::ChatMl)
        .run("Divide one by zero", AgentOptions::default())
        .await
        .expect("agent succeeds");

    assert!(!outcome.steps[0].success);
    assert!(outcome.steps[0].output.contains("ZeroDivisionError"));
    let prompts = provider.prompts().await;
    assert!(prompts[1].contains("<|im_start|>"));
    assert!(prompts[1].contains("ZeroDivisionError"));
}

#[tokio::test]
async fn stops_when_the_budget_runs_out() {
    let call = r#"[{"tool": "get_time", "tool_input": {"kind": "date"}}]"#;
    let provider = ScriptedProvider::new(vec![call, call]);

    let result = agent(&provider, Arc::new(FlakySandbox::new(0, "")), false)
        .run("What day is it?", AgentOptions::default().with_max_iterations(2))
        .await;

    match result {
        Err(AgentError::BudgetExhausted { iterations, history }) => {
            assert_eq!(iterations, 2);
            let tool_turns = history
                .iter()
                .filter(|message| message.role == MessageRole::Tool)
                .count();
            assert_eq!(tool_turns, 2);
        }
        other => panic!("expected budget exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_tools_abort_the_run() {
    let provider = ScriptedProvider::new(vec![
        r#"[{"tool": "send_email", "tool_input": {"to": "ops@example.com"}}]"#,
    ]);

    let result = agent(&provider, Arc::new(FlakySandbox::new(0, "")), false)
        .run("Email the team", AgentOptions::default())
        .await;

    match result {
        Err(AgentError::UnknownTool { name, history }) => {
            assert_eq!(name, "send_email");
            assert_eq!(history.last().map(|m| m.role), Some(MessageRole::Assistant));
        }
        other => panic!("expected unknown tool, got {other:?}"),
    }
}
