use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, Table};
use inquire::autocompletion::{Autocomplete, Replacement};
use inquire::{CustomUserError, InquireError, Text};

use httpu::utils::{ResponseFormat, ResponseFormatter};
use httpu::{Executor, Project, Stash, load_project};

pub type Result<T> = std::result::Result<T, anyhow::Error>;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 发送一个请求：`name` 或 `name.variant`
    Run {
        /// 项目目录或配置文件
        project: String,
        target: String,
        /// 输出全部响应头
        #[arg(short, long)]
        verbose: bool,
    },
    /// 列出项目中的请求，可按前缀过滤
    List {
        project: String,
        prefix: Option<String>,
    },
    /// 交互模式，输入时按前缀补全请求名
    Shell { project: String },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            project,
            target,
            verbose,
        } => {
            let project = load_project(&project)?;
            let executor = Executor::for_project(&project, Arc::new(Stash::new()))?;
            let response = executor.execute_target(&project, &target).await?;
            println!("{}", formatter(verbose).format(&response));
        }
        Commands::List { project, prefix } => {
            let project = load_project(&project)?;
            print_requests(&project, prefix.as_deref());
        }
        Commands::Shell { project } => {
            let project = load_project(&project)?;
            shell(project).await?;
        }
    }
    Ok(())
}

fn formatter(verbose: bool) -> ResponseFormatter {
    let format = if verbose {
        ResponseFormat::Verbose
    } else {
        ResponseFormat::Compact
    };
    ResponseFormatter::new(format)
}

fn print_requests(project: &Project, prefix: Option<&str>) {
    let names = match prefix {
        Some(prefix) => project.search_by_prefix(prefix),
        None => project.requests.names(),
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Request", "Method", "URI"]);

    for name in names {
        let Ok((request, variant)) = project.requests.lookup(&name) else {
            continue;
        };
        let (method, uri) = match variant {
            Some(v) => (v.method.as_str(), format!("{}{}", request.spec.uri, v.path)),
            None => (request.spec.method.as_str(), request.spec.uri.clone()),
        };
        table.add_row(vec![
            Cell::new(&name),
            Cell::new(method).fg(Color::Cyan),
            Cell::new(uri).add_attribute(Attribute::Dim),
        ]);
    }

    println!("{}", table);
}

fn print_stash(stash: &Stash) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Name", "Value", "JSON Path", "Origin", "Captured"]);

    for entry in stash.entries() {
        let value = match &entry.value {
            Some(v) => Cell::new(v),
            None => Cell::new("<absent>").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&entry.name),
            value,
            Cell::new(entry.json_path.join(".")),
            Cell::new(&entry.origin),
            Cell::new(
                entry
                    .captured_at
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }

    println!("{}", table);
}

/// 按前缀补全请求名
#[derive(Clone)]
struct RequestCompleter {
    project: Arc<Project>,
}

impl Autocomplete for RequestCompleter {
    fn get_suggestions(&mut self, input: &str) -> std::result::Result<Vec<String>, CustomUserError> {
        Ok(self.project.search_by_prefix(input))
    }

    fn get_completion(
        &mut self,
        input: &str,
        highlighted_suggestion: Option<String>,
    ) -> std::result::Result<Replacement, CustomUserError> {
        if highlighted_suggestion.is_some() {
            return Ok(highlighted_suggestion);
        }

        let suggestions = self.project.search_by_prefix(input);
        let common = common_prefix(&suggestions);
        Ok((common.len() > input.len()).then(|| common.to_string()))
    }
}

fn common_prefix(items: &[String]) -> &str {
    let Some(first) = items.first() else {
        return "";
    };
    let mut end = first.len();
    for item in &items[1..] {
        end = end.min(
            first
                .char_indices()
                .zip(item.chars())
                .find(|((_, a), b)| a != b)
                .map(|((i, _), _)| i)
                .unwrap_or_else(|| first.len().min(item.len())),
        );
    }
    &first[..end]
}

async fn shell(project: Arc<Project>) -> Result<()> {
    let executor = Executor::for_project(&project, Arc::new(Stash::new()))?;
    let formatter = formatter(false);
    println!(
        "{} requests loaded. Type a request name, {} to show the stash, {} to exit.",
        project.requests.names().len(),
        ":stash".bold(),
        ":q".bold()
    );

    loop {
        let input = Text::new(">")
            .with_autocomplete(RequestCompleter {
                project: Arc::clone(&project),
            })
            .prompt();

        let line = match input {
            Ok(line) => line.trim().to_string(),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        match line.as_str() {
            "" => continue,
            ":q" | ":quit" => break,
            ":stash" => print_stash(executor.stash()),
            ":list" => print_requests(&project, None),
            target => match executor.execute_target(&project, target).await {
                Ok(response) => println!("{}\n", formatter.format(&response)),
                Err(e) => println!("{}: {}\n", "Error".red().bold(), e),
            },
        }
    }

    Ok(())
}
