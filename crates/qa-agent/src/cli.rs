//! Command surface: `analyze`, `run`, `serve`

use crate::server::{self, ServerState};
use crate::settings::RunSettings;
use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use qa_core::{AgentConstraints, AgentRequest, Goal};
use qa_orchestrator::{AgentRunResult, RepoLocks};
use qa_scan::{discover_compile_commands, AnalyzeReport, RiskScanner};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Exit code of a run that completed with a non-ok result
pub const EXIT_NOT_OK: i32 = 2;

const DEFAULT_TOP: usize = 20;

fn repo_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("repo")
            .long("repo")
            .default_value(".")
            .value_parser(value_parser!(PathBuf))
            .help("Repository root"),
    )
    .arg(
        Arg::new("build-dir")
            .long("build-dir")
            .value_parser(value_parser!(PathBuf))
            .help("Build directory (default from qa-agent.toml, else <repo>/build)"),
    )
    .arg(
        Arg::new("target")
            .long("target")
            .default_value(".")
            .help("Directory scope relative to the repository root"),
    )
}

/// Top-level command definition
#[must_use]
pub fn command() -> Command {
    Command::new("qa-agent")
        .version(qa_core::VERSION)
        .about("Risk-driven test generation and triage for C/C++ repositories")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging for the agent crates"),
        )
        .subcommand(
            repo_args(Command::new("analyze").about("Rank files by risk"))
                .arg(
                    Arg::new("top")
                        .long("top")
                        .value_parser(value_parser!(usize))
                        .help("Number of findings to print [default: 20]"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the full report as JSON"),
                ),
        )
        .subcommand(
            repo_args(Command::new("run").about("Run the full configure/build/test/generate/triage loop"))
                .arg(
                    Arg::new("goal")
                        .long("goal")
                        .default_value(Goal::default().as_str())
                        .value_parser(Goal::ALL.map(Goal::as_str))
                        .help("What the run is trying to achieve"),
                )
                .arg(
                    Arg::new("budget")
                        .long("budget")
                        .value_parser(value_parser!(usize))
                        .help("Maximum number of generated test files [default: 3]"),
                )
                .arg(
                    Arg::new("time-budget-sec")
                        .long("time-budget-sec")
                        .value_parser(value_parser!(u64))
                        .help("Advisory wall-clock budget, recorded with the request [default: 300]"),
                )
                .arg(
                    Arg::new("allow-source-edits")
                        .long("allow-source-edits")
                        .action(ArgAction::SetTrue)
                        .help("Record that source edits are permitted"),
                )
                .arg(
                    Arg::new("request")
                        .long("request")
                        .value_parser(value_parser!(PathBuf))
                        .help("Request JSON file; replaces --target/--goal/--budget"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("Multi-config build type (e.g. Debug)"),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .value_parser(value_parser!(u32))
                        .help("Build parallelism"),
                )
                .arg(
                    Arg::new("ctest-timeout-sec")
                        .long("ctest-timeout-sec")
                        .value_parser(value_parser!(u64))
                        .help("Per-test timeout"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the run result as JSON"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve POST /run over HTTP")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .default_value("127.0.0.1")
                        .value_parser(value_parser!(IpAddr)),
                )
                .arg(
                    Arg::new("port")
                        .long("port")
                        .default_value("8080")
                        .value_parser(value_parser!(u16)),
                ),
        )
}

/// Execute the selected subcommand, returning the process exit code
///
/// # Errors
/// Returns an error for bad input or a run that could not complete.
pub async fn dispatch(matches: &ArgMatches) -> anyhow::Result<i32> {
    match matches.subcommand() {
        Some(("analyze", args)) => analyze(args),
        Some(("run", args)) => run(args).await,
        Some(("serve", args)) => {
            let host = args.get_one::<IpAddr>("host").copied().context("--host is required")?;
            let port = args.get_one::<u16>("port").copied().context("--port is required")?;
            server::serve(SocketAddr::new(host, port), ServerState::new()).await;
            Ok(0)
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
}

/// Settings from the shared repository flags
#[must_use]
pub fn settings_from(args: &ArgMatches) -> RunSettings {
    let repo = args.get_one::<PathBuf>("repo").cloned().unwrap_or_else(|| PathBuf::from("."));
    RunSettings {
        build_dir: args.get_one::<PathBuf>("build-dir").cloned(),
        config: args.try_get_one::<String>("config").ok().flatten().cloned(),
        parallel: args.try_get_one::<u32>("parallel").ok().flatten().copied(),
        ctest_timeout_sec: args.try_get_one::<u64>("ctest-timeout-sec").ok().flatten().copied(),
        ..RunSettings::new(repo)
    }
}

/// Request from `--request FILE`, or from the individual flags
///
/// # Errors
/// Returns an error if the request file is unreadable or malformed.
pub fn request_from(args: &ArgMatches) -> anyhow::Result<AgentRequest> {
    if let Some(path) = args.get_one::<PathBuf>("request") {
        return AgentRequest::load(path).with_context(|| format!("loading request {}", path.display()));
    }
    let target = args.get_one::<String>("target").map_or(".", String::as_str);
    let goal: Goal = args
        .get_one::<String>("goal")
        .map_or(Ok(Goal::default()), |g| g.parse())?;
    let defaults = AgentConstraints::default();
    let constraints = AgentConstraints {
        time_budget_sec: args.get_one::<u64>("time-budget-sec").copied().unwrap_or(defaults.time_budget_sec),
        max_tests_to_generate: args
            .get_one::<usize>("budget")
            .copied()
            .unwrap_or(defaults.max_tests_to_generate),
        allow_source_edits: args.get_flag("allow-source-edits"),
    };
    Ok(AgentRequest::new(target)
        .with_goal(goal)
        .with_constraints(constraints))
}

fn analyze(args: &ArgMatches) -> anyhow::Result<i32> {
    let settings = settings_from(args);
    let root = settings.repo_root()?;
    let config = settings.agent_config(&root)?;
    let target = args.get_one::<String>("target").map_or(".", String::as_str);
    let top = args.get_one::<usize>("top").copied().unwrap_or(DEFAULT_TOP);

    let compile_db = discover_compile_commands(&root, &config.build_dir_in(&root));
    let report = RiskScanner::new()
        .analyze(&root, compile_db.as_deref(), target)
        .context("risk analysis failed")?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_findings(&report, top));
    }
    Ok(0)
}

async fn run(args: &ArgMatches) -> anyhow::Result<i32> {
    let settings = settings_from(args);
    let request = request_from(args)?;
    let orchestrator = settings.orchestrator(RepoLocks::new())?;
    let result = orchestrator.run(&request).await.context("run failed")?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_summary(&result));
    }
    Ok(if result.ok { 0 } else { EXIT_NOT_OK })
}

/// One `score path [reasons]` line per finding
#[must_use]
pub fn render_findings(report: &AnalyzeReport, top: usize) -> String {
    report
        .top(top)
        .iter()
        .map(|f| format!("{:>4}  {}  [{}]\n", f.score, f.path, f.reasons.join(", ")))
        .collect()
}

/// Human-readable run summary
#[must_use]
pub fn render_summary(result: &AgentRunResult) -> String {
    let mut out = format!(
        "run {}: {} ({})\n",
        result.run_id,
        if result.ok { "ok" } else { "NOT OK" },
        result.triage.category
    );
    if let Some(phase) = result.aborted_phase {
        out.push_str(&format!("aborted at: {phase}\n"));
    }
    for note in &result.triage.notes {
        out.push_str(&format!("note: {note}\n"));
    }
    out.push_str(&format!("selected findings: {}\n", result.selected_findings.len()));
    for test in &result.generated {
        out.push_str(&format!("generated: {} ({})\n", test.path, test.rationale));
    }
    for name in &result.triage.disabled_generated {
        out.push_str(&format!("disabled: {name}\n"));
    }
    for name in &result.triage.failed_tests {
        out.push_str(&format!("failed: {name}\n"));
    }
    for q in &result.questions {
        out.push_str(&format!("question {}: {} ({})\n", q.id, q.message, q.path));
    }
    if result.need_human {
        out.push_str("needs human input\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(argv: &[&str]) -> ArgMatches {
        command().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn run_flags_build_the_request() {
        let matches = parse(&[
            "qa-agent", "run", "--repo", "/r", "--target", "src", "--goal", "api_contract", "--budget", "5",
            "--allow-source-edits", "--parallel", "4", "--config", "Release",
        ]);
        let (_, args) = matches.subcommand().unwrap();

        let request = request_from(args).unwrap();
        assert_eq!(request.target, "src");
        assert_eq!(request.goal, Goal::ApiContract);
        assert_eq!(request.constraints.max_tests_to_generate, 5);
        assert!(request.constraints.allow_source_edits);

        let settings = settings_from(args);
        assert_eq!(settings.repo, PathBuf::from("/r"));
        assert_eq!(settings.parallel, Some(4));
        assert_eq!(settings.config.as_deref(), Some("Release"));
        assert_eq!(settings.ctest_timeout_sec, None);
    }

    #[test]
    fn unknown_goal_is_rejected_by_the_parser() {
        assert!(command()
            .try_get_matches_from(["qa-agent", "run", "--goal", "fuzz"])
            .is_err());
    }

    #[test]
    fn analyze_has_no_build_overrides() {
        let matches = parse(&["qa-agent", "analyze", "--top", "3", "--json"]);
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "analyze");
        let settings = settings_from(args);
        assert_eq!(settings.parallel, None);
        assert_eq!(settings.config, None);
        assert_eq!(args.get_one::<usize>("top"), Some(&3));
    }

    #[test]
    fn global_log_flags() {
        let matches = parse(&["qa-agent", "serve", "--log-json", "--port", "9000"]);
        assert!(matches.get_flag("log-json"));
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<u16>("port"), Some(&9000));
    }
}
