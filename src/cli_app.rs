//! Top-level CLI definition and dispatch.

use std::collections::HashSet;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use context_widgets::core::config::Config;
use context_widgets::core::errors::WidgetError;
use context_widgets::engine::changeset::{WidgetUpdate, plan_updates};
use context_widgets::engine::home::{HomeSlotRules, replace_home_widget_with};
use context_widgets::engine::invariants::{check_sibling_orders, duplicate_ids};
use context_widgets::engine::reorder::{NewWidgetPosition, reorder_tree};
use context_widgets::engine::rules::{
    human_readable_type, is_droppable, is_valid_child, is_valid_home_widget, resolve_kind,
};
use context_widgets::engine::siblings::sibling_group;
use context_widgets::engine::widget::{Widget, WidgetId, find};
use context_widgets::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// ctxw: edit context widget menus stored as JSON.
#[derive(Debug, Parser)]
#[command(
    name = "ctxw",
    author,
    version,
    about = "Context widget menu editor",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Move a widget within the menu, or remove it from the menu.
    Reorder(ReorderArgs),
    /// Put a widget into the home slot.
    SetHome(SetHomeArgs),
    /// Report sibling order gaps, duplicates and repeated ids.
    Check(CheckArgs),
    /// Show the rows a store must rewrite to go from one list to another.
    Diff(DiffArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("destination")
        .required(true)
        .args(["before", "end", "remove"])
))]
struct ReorderArgs {
    /// Widget list JSON file, or `-` for stdin.
    #[arg(value_name = "FILE")]
    input: String,
    /// Id of the widget to move.
    #[arg(long, value_name = "ID")]
    widget: WidgetId,
    /// Place the widget immediately in front of this widget.
    #[arg(long, value_name = "ID")]
    before: Option<WidgetId>,
    /// Append the widget to the end of a sibling group.
    #[arg(long)]
    end: bool,
    /// Parent group for `--end`; omit for the top level.
    #[arg(long, value_name = "ID", requires = "end")]
    parent: Option<WidgetId>,
    /// Take the widget (and its children) out of the menu.
    #[arg(long)]
    remove: bool,
    /// Give the moved widget this id in the result.
    #[arg(long, value_name = "ID")]
    new_id: Option<WidgetId>,
    /// Print only the changed rows.
    #[arg(long)]
    changes: bool,
    /// Skip the drop rules.
    #[arg(long)]
    force: bool,
}

impl ReorderArgs {
    fn position(&self) -> NewWidgetPosition {
        let position = if self.remove {
            NewWidgetPosition::detach()
        } else if let Some(target) = &self.before {
            NewWidgetPosition::in_front_of(target.clone())
        } else {
            NewWidgetPosition::at_end(self.parent.clone())
        };
        match &self.new_id {
            Some(id) => position.with_id(id.clone()),
            None => position,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct SetHomeArgs {
    /// Widget list JSON file, or `-` for stdin.
    #[arg(value_name = "FILE")]
    input: String,
    /// Id of the widget that becomes the home view.
    #[arg(long, value_name = "ID")]
    widget: WidgetId,
    /// Print only the changed rows.
    #[arg(long)]
    changes: bool,
    /// Allow widgets that cannot normally be a home view.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Clone, Args)]
struct CheckArgs {
    /// Widget list JSON file, or `-` for stdin.
    #[arg(value_name = "FILE")]
    input: String,
}

#[derive(Debug, Clone, Args)]
struct DiffArgs {
    /// Widget list before the edit.
    #[arg(value_name = "BEFORE")]
    before: String,
    /// Widget list after the edit.
    #[arg(value_name = "AFTER")]
    after: String,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path in use.
    Path,
    /// Print the effective configuration.
    Show,
    /// Load and validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or widget data.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<WidgetError> for CliError {
    fn from(value: WidgetError) -> Self {
        match value {
            WidgetError::Io { .. } => Self::Runtime(value.to_string()),
            WidgetError::Serialization { .. } => Self::Internal(value.to_string()),
            _ => Self::User(value.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Reorder(args) => run_reorder(cli, args),
        Command::SetHome(args) => run_set_home(cli, args),
        Command::Check(args) => run_check(cli, args),
        Command::Diff(args) => run_diff(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

struct ActivityLog {
    writer: JsonlWriter,
    config_hash: Option<String>,
}

impl ActivityLog {
    fn open(config: &Config) -> Self {
        let writer = if config.logging.enabled {
            JsonlWriter::open(JsonlConfig::from(&config.logging))
        } else {
            JsonlWriter::disabled()
        };
        Self {
            writer,
            config_hash: config.stable_hash().ok(),
        }
    }

    fn record(&mut self, mut entry: LogEntry) {
        entry.config_hash.clone_from(&self.config_hash);
        self.writer.write_entry(&entry);
    }

    fn success(&mut self, event: EventType, widget: &WidgetId, position: String, changed: usize) {
        let mut entry = LogEntry::new(event, Severity::Info);
        entry.widget_id = Some(widget.to_string());
        entry.position = Some(position);
        entry.changed = Some(changed);
        entry.ok = Some(true);
        self.record(entry);
    }

    fn failure(&mut self, event: EventType, widget: &WidgetId, error: &WidgetError) {
        let mut entry = LogEntry::failure(event, error);
        entry.widget_id = Some(widget.to_string());
        self.record(entry);
    }

    fn rejected(&mut self, event: EventType, widget: &WidgetId, reason: &str) {
        let mut entry = LogEntry::new(event, Severity::Warning);
        entry.widget_id = Some(widget.to_string());
        entry.ok = Some(false);
        entry.details = Some(reason.to_string());
        self.record(entry);
    }

    fn violations(&mut self, count: usize, details: String, severity: Severity) {
        let mut entry = LogEntry::new(EventType::InvariantViolation, severity);
        entry.violations = Some(count);
        entry.details = Some(details);
        self.record(entry);
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_reorder(cli: &Cli, args: &ReorderArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut log = ActivityLog::open(&config);
    let widgets = read_widgets(&args.input)?;
    let position = args.position();

    if config.rules.enforce_drop_rules
        && !args.force
        && let Err(reason) = check_drop_rules(&widgets, &args.widget, &position, &config.home)
    {
        log.rejected(EventType::WidgetReorder, &args.widget, &reason);
        return Err(CliError::User(format!("{reason} (use --force to override)")));
    }

    let updated = match reorder_tree(&args.widget, &position, &widgets) {
        Ok(updated) => updated,
        Err(e) => {
            log.failure(EventType::WidgetReorder, &args.widget, &e);
            return Err(e.into());
        }
    };
    let updates = plan_updates(&widgets, &updated)?;
    log.success(
        EventType::WidgetReorder,
        &args.widget,
        position.describe(),
        updates.len(),
    );
    audit_result(cli, &mut log, &updated);

    emit_result(
        cli,
        &EditSummary {
            command: "reorder",
            widget: &args.widget,
            action: position.describe(),
            changes_only: args.changes,
        },
        &updated,
        &updates,
        &config.home,
    )
}

fn run_set_home(cli: &Cli, args: &SetHomeArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut log = ActivityLog::open(&config);
    let widgets = read_widgets(&args.input)?;

    if config.rules.enforce_drop_rules
        && !args.force
        && let Some(widget) = find(&widgets, &args.widget)
        && !is_valid_home_widget(widget)
    {
        let reason = format!(
            "widget {} ({}) cannot be a home view",
            widget.id,
            human_readable_type(resolve_kind(widget))
        );
        log.rejected(EventType::HomeReplace, &args.widget, &reason);
        return Err(CliError::User(format!("{reason} (use --force to override)")));
    }

    let updated = match replace_home_widget_with(&widgets, &args.widget, &config.home) {
        Ok(updated) => updated,
        Err(e) => {
            log.failure(EventType::HomeReplace, &args.widget, &e);
            return Err(e.into());
        }
    };
    let updates = plan_updates(&widgets, &updated)?;
    log.success(
        EventType::HomeReplace,
        &args.widget,
        "home".to_string(),
        updates.len(),
    );
    audit_result(cli, &mut log, &updated);

    emit_result(
        cli,
        &EditSummary {
            command: "set-home",
            widget: &args.widget,
            action: "set as home view".to_string(),
            changes_only: args.changes,
        },
        &updated,
        &updates,
        &config.home,
    )
}

fn run_check(cli: &Cli, args: &CheckArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut log = ActivityLog::open(&config);
    let widgets = read_widgets(&args.input)?;

    let violations = check_sibling_orders(&widgets);
    let duplicates = duplicate_ids(&widgets);
    let problems = violations.len() + duplicates.len();

    match output_mode(cli) {
        OutputMode::Human => {
            if problems == 0 {
                println!(
                    "{} {} widgets, every sibling group is dense",
                    "OK".green().bold(),
                    widgets.len()
                );
            }
            for violation in &violations {
                println!("{} {violation}", "ORDER".yellow().bold());
            }
            for id in &duplicates {
                println!("{} id {id} appears more than once", "DUPLICATE".red().bold());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "check",
                "widgets": widgets.len(),
                "ok": problems == 0,
                "violations": violations,
                "duplicate_ids": duplicates,
            });
            write_json_line(&payload)?;
        }
    }

    if problems == 0 {
        return Ok(());
    }
    let details: Vec<String> = violations
        .iter()
        .map(ToString::to_string)
        .chain(duplicates.iter().map(|id| format!("duplicate id {id}")))
        .collect();
    log.violations(problems, details.join("; "), Severity::Warning);
    Err(CliError::User(format!(
        "{problems} problem{} found",
        if problems == 1 { "" } else { "s" }
    )))
}

fn run_diff(cli: &Cli, args: &DiffArgs) -> Result<(), CliError> {
    let before = read_widgets(&args.before)?;
    let after = read_widgets(&args.after)?;
    let updates = plan_updates(&before, &after)?;

    match output_mode(cli) {
        OutputMode::Human => print_updates(&updates),
        OutputMode::Json => {
            let payload = json!({
                "command": "diff",
                "changed": updates.len(),
                "changes": updates,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => {
            let config = load_config(cli)?;
            let hash = config.stable_hash()?;
            let source = cli.config.clone().unwrap_or_else(Config::default_path);

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("Configuration is valid.");
                    println!("  Source: {}", source.display());
                    println!("  Hash: {hash}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config validate",
                        "valid": true,
                        "source": source.to_string_lossy(),
                        "hash": hash,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Drop rules
// ---------------------------------------------------------------------------

/// Check a move against the menu editing rules. `Err` carries the reason.
///
/// Unknown widgets pass here; the engine reports them with a proper error.
fn check_drop_rules(
    widgets: &[Widget],
    moved_id: &WidgetId,
    position: &NewWidgetPosition,
    rules: &HomeSlotRules,
) -> Result<(), String> {
    let Some(moved) = find(widgets, moved_id) else {
        return Ok(());
    };
    if !is_droppable(moved, rules) {
        return Err(format!(
            "widget {} ({}) cannot be moved",
            moved.id,
            resolve_kind(moved)
        ));
    }
    if position.remove {
        return Ok(());
    }

    let destination = match &position.order_in_front_of_widget_id {
        Some(target_id) if target_id != moved_id => match find(widgets, target_id) {
            Some(target) => target.parent_id.clone(),
            None => position.parent_id.clone(),
        },
        _ => position.parent_id.clone(),
    };
    let Some(parent_id) = destination else {
        return Ok(());
    };
    match find(widgets, &parent_id) {
        Some(parent) if !is_valid_child(moved, parent, rules) => Err(format!(
            "a {} cannot be placed under widget {} ({})",
            human_readable_type(resolve_kind(moved)),
            parent.id,
            resolve_kind(parent)
        )),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(CliError::from)
}

fn read_widgets(source: &str) -> Result<Vec<Widget>, CliError> {
    let raw = if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::Runtime(format!("read stdin: {e}")))?;
        buf
    } else {
        fs::read_to_string(source).map_err(|e| CliError::Runtime(format!("read {source}: {e}")))?
    };
    serde_json::from_str(&raw)
        .map_err(|e| CliError::User(format!("{source}: not a widget list: {e}")))
}

/// Audit an edit's output. Input that was already inconsistent can stay so.
fn audit_result(cli: &Cli, log: &mut ActivityLog, widgets: &[Widget]) {
    let violations = check_sibling_orders(widgets);
    if violations.is_empty() {
        return;
    }
    let details: Vec<String> = violations.iter().map(ToString::to_string).collect();
    log.violations(violations.len(), details.join("; "), Severity::Warning);
    if output_mode(cli) == OutputMode::Human {
        for detail in &details {
            eprintln!("{} {detail}", "warning:".yellow().bold());
        }
    }
}

struct EditSummary<'a> {
    command: &'static str,
    widget: &'a WidgetId,
    action: String,
    changes_only: bool,
}

fn emit_result(
    cli: &Cli,
    summary: &EditSummary<'_>,
    widgets: &[Widget],
    updates: &[WidgetUpdate],
    rules: &HomeSlotRules,
) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            println!(
                "{} widget {}: {} ({} row{} changed)",
                summary.command.bold(),
                summary.widget,
                summary.action,
                updates.len(),
                if updates.len() == 1 { "" } else { "s" }
            );
            if summary.changes_only {
                print_updates(updates);
            } else {
                print_tree(widgets, rules);
            }
        }
        OutputMode::Json => {
            let mut payload = json!({
                "command": summary.command,
                "widget": summary.widget,
                "action": summary.action,
                "changed": updates.len(),
            });
            let (key, body) = if summary.changes_only {
                ("changes", serde_json::to_value(updates)?)
            } else {
                ("widgets", serde_json::to_value(widgets)?)
            };
            if let Value::Object(map) = &mut payload {
                map.insert(key.to_string(), body);
            }
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_updates(updates: &[WidgetUpdate]) {
    if updates.is_empty() {
        println!("  (no changes)");
        return;
    }
    for update in updates {
        let renamed = update
            .previous_id
            .as_ref()
            .map_or_else(String::new, |old| format!(" (was {old})"));
        let place = match (&update.order, &update.parent_id) {
            (None, _) => "removed from menu".dimmed().to_string(),
            (Some(order), None) => format!("order {order} at top level"),
            (Some(order), Some(parent)) => format!("order {order} under {parent}"),
        };
        println!("  {}{renamed}: {place}", update.id.to_string().as_str().cyan());
    }
}

fn print_tree(widgets: &[Widget], rules: &HomeSlotRules) {
    fn walk(
        widgets: &[Widget],
        parent: Option<&WidgetId>,
        depth: usize,
        rules: &HomeSlotRules,
        seen: &mut HashSet<WidgetId>,
    ) {
        for widget in sibling_group(widgets, parent) {
            if !seen.insert(widget.id.clone()) {
                continue;
            }
            let marker = if rules.is_home(widget) { " *" } else { "" };
            println!(
                "{}{}. {} {}{marker}",
                "  ".repeat(depth + 1),
                widget.order.unwrap_or_default(),
                widget.id.to_string().as_str().cyan(),
                format!("[{}]", resolve_kind(widget)).as_str().dimmed()
            );
            walk(widgets, Some(&widget.id), depth + 1, rules, seen);
        }
    }

    let mut seen = HashSet::new();
    walk(widgets, None, 0, rules, &mut seen);

    let detached: Vec<String> = widgets
        .iter()
        .filter(|w| !w.is_positioned())
        .map(|w| w.id.to_string())
        .collect();
    if !detached.is_empty() {
        println!("  {} {}", "not in menu:".dimmed(), detached.join(", "));
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("CTXW_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
