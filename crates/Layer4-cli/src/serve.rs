//! JSON-lines harness - one request per stdin line, one response per stdout line
//!
//! ```text
//! → {"id": 1, "method": "tools/list"}
//! ← {"id": 1, "result": {"tools": [...]}}
//! → {"id": 2, "method": "tools/call", "params": {"name": "start_process", "arguments": {"command": "npm run dev"}}}
//! ← {"id": 2, "result": {"content": [{"type": "text", "text": "{\"processId\":...}"}], "isError": false}}
//! ```
//!
//! Ctrl-C or end of input runs the shutdown coordinator.

use bgproc_core::{RuntimeContext, ToolRegistry};
use bgproc_foundation::Error;
use bgproc_task::ProcessSupervisor;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serve requests until Ctrl-C or EOF, then shut the supervisor down.
pub async fn serve(supervisor: ProcessSupervisor, working_dir: PathBuf) -> anyhow::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    serve_with(supervisor, working_dir, input, tokio::io::stdout()).await
}

/// Shutdown runs even when the loop fails (unreadable input, closed stdout).
async fn serve_with<R, W>(
    supervisor: ProcessSupervisor,
    working_dir: PathBuf,
    input: R,
    mut output: W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let registry = ToolRegistry::with_process_tools(supervisor.clone());
    let ctx = RuntimeContext::new(uuid::Uuid::new_v4().to_string(), working_dir);

    info!(
        "Process supervisor started ({} tools: {})",
        registry.len(),
        registry.names().join(", ")
    );

    let result = pump(&registry, &supervisor, &ctx, input, &mut output).await;
    if let Err(e) = &result {
        error!("Request loop failed: {}", e);
    }

    supervisor.shutdown().await;
    result
}

async fn pump<R, W>(
    registry: &ToolRegistry,
    supervisor: &ProcessSupervisor,
    ctx: &RuntimeContext,
    input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let response = handle_line(registry, supervisor, ctx, &line).await;
                    let mut out = serde_json::to_string(&response)?;
                    out.push('\n');
                    output.write_all(out.as_bytes()).await?;
                    output.flush().await?;
                }
                None => {
                    info!("Input closed");
                    return Ok(());
                }
            },
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Received Ctrl-C");
                return Ok(());
            }
        }
    }
}

/// Handle one request line and build its response.
async fn handle_line(
    registry: &ToolRegistry,
    supervisor: &ProcessSupervisor,
    ctx: &RuntimeContext,
    line: &str,
) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed request: {}", e);
            return error_response(Value::Null, "parse_error", &e.to_string());
        }
    };
    debug!("Request {} {}", request.id, request.method);

    match request.method.as_str() {
        "tools/list" => json!({
            "id": request.id,
            "result": { "tools": registry.schemas() }
        }),
        "tools/call" => call_tool(registry, ctx, request.id, request.params).await,
        "processes/list" => {
            let processes = supervisor.list().await;
            json!({
                "id": request.id,
                "result": { "processes": processes }
            })
        }
        other => error_response(
            request.id,
            "method_not_found",
            &format!("Unknown method: {}", other),
        ),
    }
}

async fn call_tool(registry: &ToolRegistry, ctx: &RuntimeContext, id: Value, params: Value) -> Value {
    let params: CallParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            let err = Error::InvalidInput(format!("invalid tools/call params: {}", e));
            return error_response(id, err.kind(), &err.to_string());
        }
    };
    let arguments = if params.arguments.is_null() {
        json!({})
    } else {
        params.arguments
    };

    match registry.execute(&params.name, arguments, ctx).await {
        Ok(result) => {
            let is_error = !result.success;
            json!({
                "id": id,
                "result": {
                    "content": [{ "type": "text", "text": result.text() }],
                    "isError": is_error
                }
            })
        }
        Err(e) => error_response(id, e.kind(), &e.to_string()),
    }
}

fn error_response(id: Value, code: &str, message: &str) -> Value {
    json!({
        "id": id,
        "error": { "code": code, "message": message }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgproc_foundation::SupervisorConfig;

    fn setup() -> (ToolRegistry, ProcessSupervisor, RuntimeContext) {
        let supervisor = ProcessSupervisor::new(SupervisorConfig::default());
        let registry = ToolRegistry::with_process_tools(supervisor.clone());
        (registry, supervisor, RuntimeContext::new("test", "."))
    }

    #[tokio::test]
    async fn test_tools_list() {
        let (registry, sup, ctx) = setup();
        let response = handle_line(&registry, &sup, &ctx, r#"{"id":1,"method":"tools/list"}"#).await;

        assert_eq!(response["id"], 1);
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_and_unknown() {
        let (registry, sup, ctx) = setup();

        let response = handle_line(&registry, &sup, &ctx, "not json").await;
        assert!(response["id"].is_null());
        assert_eq!(response["error"]["code"], "parse_error");

        let response = handle_line(&registry, &sup, &ctx, r#"{"id":"a","method":"ping"}"#).await;
        assert_eq!(response["id"], "a");
        assert_eq!(response["error"]["code"], "method_not_found");

        let response = handle_line(
            &registry,
            &sup,
            &ctx,
            r#"{"id":2,"method":"tools/call","params":{"name":"nope"}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], "method_not_found");
        assert_eq!(response["error"]["message"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_tool_error_is_text() {
        let (registry, sup, ctx) = setup();
        let response = handle_line(
            &registry,
            &sup,
            &ctx,
            r#"{"id":3,"method":"tools/call","params":{"name":"stop_process","arguments":{}}}"#,
        )
        .await;

        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(text, "Error: Invalid input: processId is required");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_input_still_shuts_down() {
        let supervisor = ProcessSupervisor::new(
            SupervisorConfig::default().shutdown_grace(std::time::Duration::from_millis(10)),
        );
        supervisor.start("exec sleep 30", None).await.unwrap();
        assert_eq!(supervisor.running_count().await, 1);

        // 잘못된 UTF-8 줄에서 루프가 실패해도 자식 프로세스는 정리됨
        let input: &[u8] = b"\xff\xfe\n";
        let result = serve_with(
            supervisor.clone(),
            PathBuf::from("."),
            BufReader::new(input),
            tokio::io::sink(),
        )
        .await;

        assert!(result.is_err());
        assert!(supervisor.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_serve_answers_each_line() {
        let supervisor = ProcessSupervisor::new(SupervisorConfig::default());
        let input: &[u8] = b"{\"id\":1,\"method\":\"tools/list\"}\n\n{\"id\":2,\"method\":\"ping\"}\n";
        let mut output = Vec::new();

        serve_with(supervisor, PathBuf::from("."), BufReader::new(input), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        let responses: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["error"]["code"], "method_not_found");
    }

    #[tokio::test]
    async fn test_processes_list_empty() {
        let (registry, sup, ctx) = setup();
        let response =
            handle_line(&registry, &sup, &ctx, r#"{"id":4,"method":"processes/list"}"#).await;
        assert_eq!(response["result"]["processes"], json!([]));
    }
}
