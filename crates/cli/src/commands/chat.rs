use std::io::{BufRead, Write};
use std::sync::Arc;

use leadflow_agent::runtime::{AgentRuntime, TurnRequest};
use leadflow_core::config::{AppConfig, LoadOptions};
use leadflow_db::{InMemoryConversationRepository, InMemoryLeadRepository};

use crate::commands::{block_on_runtime, CommandResult};

const QUIT_COMMAND: &str = "/quit";

/// Runs a single turn and reports the reply with its state snapshot.
pub fn run_once(thread_id: &str, message: &str) -> CommandResult {
    let (runtime, agent) = match prepare("chat") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let reply = runtime.block_on(agent.handle_turn(TurnRequest::new(thread_id, message)));
    let details = serde_json::to_value(&reply).ok();
    CommandResult::success_with_details("chat", reply.reply, details)
}

/// Line-oriented session until EOF or `/quit`. State lives in memory only.
pub fn run_interactive<R: BufRead, W: Write>(
    thread_id: &str,
    input: R,
    mut output: W,
) -> CommandResult {
    let (runtime, agent) = match prepare("chat") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let mut turns = 0usize;
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                return CommandResult::failure(
                    "chat",
                    "io",
                    format!("failed to read input: {error}"),
                    7,
                );
            }
        };
        let message = line.trim();
        if message == QUIT_COMMAND {
            break;
        }
        if message.is_empty() {
            continue;
        }

        let reply = runtime.block_on(agent.handle_turn(TurnRequest::new(thread_id, message)));
        turns += 1;
        if let Err(error) = writeln!(output, "{}\n", reply.reply) {
            return CommandResult::failure(
                "chat",
                "io",
                format!("failed to write reply: {error}"),
                7,
            );
        }
        if reply.is_complete {
            break;
        }
    }

    CommandResult::success("chat", format!("session ended after {turns} turns"))
}

fn prepare(command: &str) -> Result<(tokio::runtime::Runtime, AgentRuntime), CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })?;
    let runtime = block_on_runtime(command)?;
    let agent = AgentRuntime::from_config(
        &config,
        Arc::new(InMemoryConversationRepository::default()),
        Arc::new(InMemoryLeadRepository::default()),
    )
    .map_err(|error| {
        CommandResult::failure(
            command,
            "collaborators",
            format!("failed to build collaborators: {error}"),
            3,
        )
    })?;
    Ok((runtime, agent))
}
