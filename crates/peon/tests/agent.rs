use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};

use peon::agent::{Agent, AgentConfig, RunStatus};
use peon::errors::ProviderResult;
use peon::models::content::ToolPayload;
use peon::models::message::Message;
use peon::models::role::Role;
use peon::models::tool::{Tool, ToolArguments, ToolCall};
use peon::providers::base::{Provider, Response, Usage};
use peon::registry::ToolRegistry;

/// Replays a fixed script of responses and remembers what it was sent
struct ScriptedProvider {
    script: Mutex<Vec<Response>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Response>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], tools: &[Tool]) -> ProviderResult<Response> {
        assert!(!messages.is_empty());
        assert_eq!(tools.len(), 4);
        self.seen.lock().unwrap().push(messages.to_vec());
        let mut script = self.script.lock().unwrap();
        Ok(if script.is_empty() {
            Response::default()
        } else {
            script.remove(0)
        })
    }
}

fn call(name: &str, id: &str, args: Value) -> ToolCall {
    let args: ToolArguments = args.as_object().cloned().unwrap_or_default();
    ToolCall::new(name, args).with_id(id)
}

fn payload_text(message: &Message) -> String {
    match message.tool_payload() {
        Some(ToolPayload::Result(Value::String(text))) => text,
        other => panic!("expected a textual result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_agent_edits_files_in_the_sandbox() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("pkg"))?;
    fs::write(dir.path().join("main.py"), "print('calculator')\n")?;

    let provider = ScriptedProvider::new(vec![
        Response::default()
            .with_tool_call(call("get_files_info", "1", json!({})))
            .with_tool_call(call("get_file_content", "2", json!({"file_path": "main.py"})))
            .with_usage(Usage::new(100, 20)),
        Response::text("Writing the notes file.")
            .with_tool_call(call(
                "write_file",
                "3",
                json!({"file_path": "pkg/notes.txt", "content": "hello"}),
            ))
            .with_tool_call(call("write_file", "4", json!({"file_path": "../escape.txt", "content": "x"})))
            .with_tool_call(call("get_files_info", "5", json!({"dir": "pkg"})))
            .with_usage(Usage::new(150, 30)),
        Response::text("Created pkg/notes.txt. Job's done.").with_usage(Usage::new(200, 10)),
    ]);

    let registry = Arc::new(ToolRegistry::with_builtins(dir.path()));
    let agent = Agent::new(provider.clone(), registry, AgentConfig::default());
    let outcome = agent.run("Add a notes file").await?;

    assert_eq!(outcome.status, RunStatus::Done);
    assert_eq!(outcome.text, "Created pkg/notes.txt. Job's done.");
    assert_eq!(outcome.usage, Usage::new(450, 60));
    assert_eq!(fs::read_to_string(dir.path().join("pkg/notes.txt"))?, "hello");
    assert!(!dir.path().parent().unwrap().join("escape.txt").exists());

    let roles: Vec<Role> = outcome.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::User,
            Role::Tool,
            Role::Tool,
            Role::Assistant,
            Role::Tool,
            Role::Tool,
            Role::Tool,
            Role::Assistant,
        ]
    );

    let messages = &outcome.messages;
    let listing = payload_text(&messages[1]);
    assert!(listing.starts_with("- main.py: file_size=20 bytes, is_dir=false\n- pkg: file_size="));
    assert!(listing.trim_end().ends_with("is_dir=true"));
    assert_eq!(payload_text(&messages[2]), "print('calculator')\n");
    assert_eq!(
        payload_text(&messages[4]),
        "Successfully wrote to \"pkg/notes.txt\" (5 bytes written)"
    );
    assert!(payload_text(&messages[5]).starts_with("Error: Cannot write to \"../escape.txt\""));
    assert!(messages[6].tool_payload().unwrap().is_error());
    assert_eq!(messages[6].tool_call_id.as_deref(), Some("5"));

    assert_eq!(provider.seen().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_system_prompt_is_seeded_first() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Arc::new(ToolRegistry::with_builtins(dir.path()));
    let system_prompt = peon::prompt_template::system_prompt(registry.tools(), "Job's done.")?;

    let provider = ScriptedProvider::new(vec![Response::text("Nothing to do. Job's done.")]);
    let config = AgentConfig {
        system_prompt: Some(system_prompt.clone()),
        ..Default::default()
    };
    let outcome = Agent::new(provider.clone(), registry, config).run("hi").await?;

    let first = &provider.seen()[0];
    assert_eq!(first[0], Message::system(system_prompt.as_str()));
    assert_eq!(first[1], Message::user("hi"));
    assert!(first[0].content.contains("- run_python_file"));
    assert_eq!(outcome.steps, 1);
    Ok(())
}
