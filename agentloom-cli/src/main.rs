use agentloom_core::agent::{AgentOptions, FunctionCallingAgent};
use agentloom_core::config::AppConfig;
use agentloom_core::database::SqliteDatabase;
use agentloom_core::model::{ModelProvider, ProviderFactory};
use agentloom_core::retrieval::KeywordRetriever;
use agentloom_core::sandbox::{CodeSandbox, PythonSandbox};
use agentloom_core::tooling::builtin::{self, SqlQueryTool};
use agentloom_core::workflow::{
    CodeRagWorkflow, Example, LlmCodegen, LlmRag, WorkflowContext, WorkflowSettings,
};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "agentloom",
    version,
    about = "Function-calling agent and code-RAG workflow runner"
)]
struct Cli {
    /// Path to agentloom.toml
    #[arg(long)]
    config: Option<String>,
    #[arg(long, value_enum, default_value_t = RunMode::Agent)]
    mode: RunMode,
    /// Workflow thread id; the run is checkpointed only when one is given
    #[arg(long)]
    thread: Option<String>,
    /// Overrides agent.max_iterations
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Extra system instructions for agent mode
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    prompt_file: Option<String>,
    prompt: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RunMode {
    Agent,
    Workflow,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting agentloom");
    let cli = Cli::parse();
    debug!(?cli.mode, config = ?cli.config, thread = ?cli.thread, "CLI arguments parsed");

    let config_path = cli.config.as_deref().map(Path::new);
    let config = AppConfig::load(config_path)?;
    info!(
        provider = %config.default_provider,
        model = %config.model,
        "Loaded configuration"
    );

    let provider = ProviderFactory::from_app_config(&config)?;
    let sandbox: Arc<dyn CodeSandbox> = Arc::new(PythonSandbox::new(
        config.tools.python.clone(),
        Duration::from_secs(config.tools.sandbox_timeout_secs),
    ));
    let prompt = load_prompt(&cli)?;

    let output = match cli.mode {
        RunMode::Agent => run_agent(&cli, &config, provider, sandbox, prompt).await?,
        RunMode::Workflow => run_workflow(&cli, &config, provider, sandbox, prompt).await?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    info!("Execution finished");
    Ok(())
}

async fn run_agent(
    cli: &Cli,
    config: &AppConfig,
    provider: Arc<dyn ModelProvider>,
    sandbox: Arc<dyn CodeSandbox>,
    prompt: String,
) -> Result<serde_json::Value, Box<dyn Error>> {
    let sql_tool = match &config.tools.database {
        Some(path) => {
            info!(path = %path.display(), "Registering database query tool");
            let database = SqliteDatabase::open(path)?;
            Some(SqlQueryTool::new(
                provider.clone(),
                Arc::new(database),
                config.model_params(),
            ))
        }
        None => None,
    };
    let registry = builtin::standard_registry(sandbox, sql_tool)?;
    debug!(tools = registry.len(), "Tool registry ready");

    let agent = FunctionCallingAgent::new(provider, Arc::new(registry))
        .with_format(config.prompt_format)
        .with_params(config.model_params());
    let options = AgentOptions {
        max_iterations: cli.max_iterations.unwrap_or(config.agent.max_iterations),
        system_prompt: cli.system.clone(),
    };

    info!("Running function-calling agent");
    let outcome = match agent.run(prompt, options).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(error = %err, "Agent run failed");
            eprintln!("{}", err.user_message());
            return Err(err.into());
        }
    };

    Ok(json!({
        "response": outcome.response,
        "iterations": outcome.iterations,
        "tool_steps": outcome.steps,
    }))
}

async fn run_workflow(
    cli: &Cli,
    config: &AppConfig,
    provider: Arc<dyn ModelProvider>,
    sandbox: Arc<dyn CodeSandbox>,
    prompt: String,
) -> Result<serde_json::Value, Box<dyn Error>> {
    let retriever = match &config.workflow.corpus {
        Some(path) => {
            info!(path = %path.display(), "Loading retrieval corpus");
            KeywordRetriever::from_jsonl(path)?
        }
        None => {
            warn!("No workflow.corpus configured; retrieval will return nothing");
            KeywordRetriever::new(Vec::new())
        }
    }
    .with_top_k(config.workflow.top_k);

    let rag = LlmRag::new(provider.clone(), Arc::new(retriever))
        .with_format(config.prompt_format)
        .with_params(config.model_params());
    let codegen = LlmCodegen::new(provider, sandbox)
        .with_format(config.prompt_format)
        .with_params(config.model_params());
    let examples = config.workflow.examples.iter().map(Example::from).collect();
    let context = WorkflowContext::new(Arc::new(rag), Arc::new(codegen))
        .with_examples(examples)
        .with_settings(WorkflowSettings::from(&config.workflow));

    let workflow = CodeRagWorkflow::new(context)?;
    info!("Running code-RAG workflow");
    let response = workflow.call(prompt, cli.thread.clone()).await?;
    Ok(serde_json::to_value(response)?)
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_writer(io::stderr)
            .init();
    });
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path, "Loading prompt from file");
        let content = fs::read_to_string(path)?;
        return Ok(normalize_prompt(content));
    }

    if !cli.prompt.is_empty() {
        info!("Using prompt provided through CLI arguments");
        return Ok(normalize_prompt(cli.prompt.join(" ")));
    }

    if !io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(normalize_prompt(buffer));
    }

    warn!("Prompt not provided via arguments, file, or stdin");
    Err("prompt required via arguments, file, or stdin".into())
}

fn normalize_prompt(prompt: String) -> String {
    prompt.trim().to_string()
}
