use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasktrack_cli::cli::{self, CONFIG_OVERRIDE_FLAG, Cli, Command, ConfigOverrideTarget};
use tasktrack_core::config::{self, Config, ConfigOverrides, Palette};
use tasktrack_core::error::AppError;
use tasktrack_core::model::{Task, TaskStatus};
use tasktrack_core::storage::json_store;
use tasktrack_core::task_api;

struct App {
    store_path: PathBuf,
    palette: Palette,
}

impl App {
    fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            store_path: json_store::store_path()?,
            palette: config::palette_for_theme(config.theme.as_deref()),
        })
    }
}

fn styled_status(status: TaskStatus, palette: &Palette) -> String {
    match status {
        TaskStatus::Todo => status.label().to_string(),
        TaskStatus::InProgress => palette.paint(status.label()),
        TaskStatus::Done => palette.dim(status.label()),
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "id")]
    id: u64,
    #[tabled(rename = "description")]
    description: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "created")]
    created_at: String,
    #[tabled(rename = "updated")]
    updated_at: String,
}

impl TaskRow {
    fn new(task: &Task, palette: &Palette) -> Self {
        Self {
            id: task.id,
            description: task.description.clone(),
            status: styled_status(task.status, palette),
            created_at: task.created_at.clone(),
            updated_at: task.updated_at.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn print_tasks_table(tasks: &[Task], palette: &Palette) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    let rows: Vec<TaskRow> = tasks.iter().map(|task| TaskRow::new(task, palette)).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

fn print_task_detail(task: &Task, palette: &Palette) {
    println!("id:          {}", task.id);
    println!("description: {}", task.description);
    println!("status:      {}", styled_status(task.status, palette));
    println!("created:     {}", task.created_at);
    println!(
        "updated:     {}",
        task.updated_at.as_deref().unwrap_or("-")
    );
}

fn print_task_json(task: &Task) -> Result<(), AppError> {
    let json = serde_json::to_string(task).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn print_tasks_json(tasks: &[Task]) -> Result<(), AppError> {
    let json =
        serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => match chars.next() {
                Some('"') => current.push('"'),
                Some('\\') => current.push('\\'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '"' => in_quotes = !in_quotes,
            ch if ch.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

/// Collect `--config-override` values out of raw argv. Runs before clap so
/// overrides can influence alias expansion and theming.
fn collect_override_values(args: &[String]) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        } else if let Some(rest) = arg.strip_prefix(CONFIG_OVERRIDE_FLAG)
            && let Some(value) = rest.strip_prefix('=')
        {
            values.push(value.to_string());
        }
    }

    values
}

fn build_overrides(raw_values: &[String]) -> ConfigOverrides {
    let mut overrides = ConfigOverrides::default();

    for raw in raw_values {
        match cli::parse_config_override(raw) {
            Ok(parsed) => match parsed.target {
                ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
                ConfigOverrideTarget::Alias(name) => {
                    overrides.aliases.insert(name, parsed.value);
                }
            },
            Err(err) => eprintln!("WARNING: ignoring config override '{raw}': {err}"),
        }
    }

    overrides
}

fn load_effective_config(argv: &[String]) -> Config {
    let load = config::load_config_with_fallback();
    if let Some(err) = load.error {
        eprintln!("WARNING: {err}");
    }

    let overrides = build_overrides(&collect_override_values(argv));
    config::merge_overrides(&load.config, &overrides)
}

fn run_command(app: &App, cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Add { description } => {
            let description = match description {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("description is required")),
            };

            let task = task_api::add_task(&app.store_path, &description)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Added task: {} ({})", task.description, task.id);
            }
        }
        Command::Update { id, description } => {
            let task = task_api::update_task(&app.store_path, &id, &description)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Updated task: {} ({})", task.description, task.id);
            }
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(&app.store_path, &id)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Deleted task: {} ({})", task.description, task.id);
            }
        }
        Command::Mark { id, status } => {
            let task = task_api::set_status(&app.store_path, &id, &status)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                println!("Marked task {} as {}", task.id, task.status);
            }
        }
        Command::Show { id } => {
            let task = task_api::get_task(&app.store_path, &id)?;
            if cli.json {
                print_task_json(&task)?;
            } else {
                print_task_detail(&task, &app.palette);
            }
        }
        Command::List { status } => {
            let tasks = task_api::list_tasks(&app.store_path, status.as_deref())?;
            if cli.json {
                print_tasks_json(&tasks)?;
            } else {
                print_tasks_table(&tasks, &app.palette);
            }
        }
    }

    Ok(())
}

fn run_interactive(app: &App, config: &Config) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let args = cli::expand_alias(args, &config.aliases);
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasktrack".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                if err.use_stderr() {
                    eprintln!("ERROR: {}", normalize_parse_error(err));
                } else {
                    print!("{err}");
                }
                continue;
            }
        };

        if let Err(err) = run_command(app, cli) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let config = load_effective_config(&argv);

    let app = match App::from_config(&config) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
    };

    if argv.is_empty() {
        if let Err(err) = run_interactive(&app, &config) {
            eprintln!("ERROR: {err}");
            std::process::exit(1);
        }
        return;
    }

    let expanded = cli::expand_alias(argv, &config.aliases);
    let mut full_argv = Vec::with_capacity(expanded.len() + 1);
    full_argv.push("tasktrack".to_string());
    full_argv.extend(expanded);

    let cli = match Cli::try_parse_from(full_argv) {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version arrive here as "errors"; let clap print them
            if err.use_stderr() {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                std::process::exit(1);
            }
            print!("{err}");
            return;
        }
    };

    if let Err(err) = run_command(&app, cli) {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}
