mod command;
mod completer;
mod prompt;
pub(crate) mod view;

use crate::pages::{self, Catalog};
use nu_ansi_term::Color;
use reedline::{
    ColumnarMenu, DefaultHinter, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder,
    Reedline, ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use scanline_core::preference::HistorySizeSetting;
use scanline_core::router::{HistoryEntry, Route, Router};
use scanline_signals::CONTINUE;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tabled::{Table, settings::Style};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use self::command::{ShellCommand, parse_shell_command};
use self::completer::ScanlineCompleter;
use self::prompt::DefaultPrompt;
use self::view::{HistoryView, RouteView, describe};

// Shell configuration constants
const SHELL_HISTORY_SIZE: usize = 500;
const HOME_PATH: &str = "home";

pub struct ReplServer {
    router: Arc<Router<Catalog>>,
    /// Last page displayed. Differs from the history's current entry after
    /// `home`, which is never recorded.
    shown: Arc<Mutex<Option<HistoryEntry>>>,
    history_size: HistorySizeSetting,
    cancel: CancellationToken,
    runtime: Handle,
}

impl ReplServer {
    pub fn new(
        runtime: Handle,
        history_size_override: Option<usize>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let preferences = scanline_runtime::load_preferences();
        let (router, history_size) = scanline_runtime::build_router(&preferences, runtime.clone());
        if let Some(size) = history_size_override {
            history_size.set(size);
        }

        pages::register(&router)?;
        let cancel = CancellationToken::new();
        router.set_context(Arc::new(Catalog::demo()), cancel.clone());

        let server = Self {
            router: Arc::new(router),
            shown: Arc::new(Mutex::new(None)),
            history_size,
            cancel,
            runtime,
        };
        server.subscribe();
        Ok(server)
    }

    fn subscribe(&self) {
        self.router.navigation_started().on(|path: &String| {
            println!("{}", Color::DarkGray.paint(format!("loading {path} ...")));
            CONTINUE
        });
        let shown = Arc::clone(&self.shown);
        self.router.navigation_completed().on(move |entry: &HistoryEntry| {
            print_page(entry);
            *shown.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry.clone());
            CONTINUE
        });
    }

    pub fn run(&self, start: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
        info!(max_history = self.history_size.get(), "shell started");
        println!("Type 'help' for commands.");

        self.router.navigate(start.as_deref().unwrap_or(HOME_PATH));
        self.settle();

        let line_editor = self.setup_line_editor()?;
        let result = self.run_loop(line_editor);

        info!(in_flight = self.router.in_flight(), "cancelling navigations");
        self.cancel.cancel();
        self.settle();
        info!("shell stopped");
        result
    }

    /// Blocks until in-flight navigations have printed their page.
    fn settle(&self) {
        self.runtime.block_on(self.router.wait());
    }

    fn setup_line_editor(&self) -> Result<Reedline, Box<dyn std::error::Error>> {
        let commands = ShellCommand::command_names();

        let completer = Box::new(ScanlineCompleter::new(commands, Arc::clone(&self.router)));

        let completion_menu = Box::new(ColumnarMenu::default().with_name("completion_menu"));

        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu("completion_menu".to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let history = match shell_history_file() {
            Some(path) => FileBackedHistory::with_file(SHELL_HISTORY_SIZE, path)?,
            None => FileBackedHistory::new(SHELL_HISTORY_SIZE)?,
        };

        Ok(Reedline::create()
            .with_history(Box::new(history))
            .with_completer(completer)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(
                    nu_ansi_term::Style::new()
                        .italic()
                        .fg(nu_ansi_term::Color::LightGray),
                ),
            ))
            .with_edit_mode(Box::new(Emacs::new(keybindings))))
    }

    fn run_loop(&self, mut line_editor: Reedline) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let prompt = DefaultPrompt::new(self.shown().map(|e| e.path));
            let sig = line_editor.read_line(&prompt);

            match sig {
                Ok(Signal::Success(buffer)) => {
                    let trimmed = buffer.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if trimmed == "exit" || trimmed == "quit" {
                        break;
                    }

                    match parse_shell_command(trimmed) {
                        Ok(Some(cmd)) => {
                            let output = self.handle(&cmd);
                            if !output.is_empty() {
                                println!("{}", output);
                            }
                            if matches!(cmd, ShellCommand::Clear) {
                                let _ = line_editor.clear_screen();
                            }
                        }
                        Ok(None) => {}
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                Ok(Signal::CtrlD) | Ok(Signal::CtrlC) => {
                    println!("Bye!");
                    break;
                }
                Err(e) => return Err(Box::new(e)),
            }
        }
        Ok(())
    }

    fn handle(&self, cmd: &ShellCommand) -> String {
        match cmd {
            ShellCommand::Go { path } => self.router.navigate(path),
            ShellCommand::Home => self.router.navigate_clearing(HOME_PATH),
            ShellCommand::Back => {
                if self.router.history().entries_count() == 0 {
                    return "Nothing to go back to.".to_string();
                }
                self.router.back();
            }
            ShellCommand::Refresh => self.router.refresh(),
            ShellCommand::Pwd => {
                return match self.shown() {
                    Some(entry) => format!("{}  ({})", entry.path, entry.page_title),
                    None => "No page shown.".to_string(),
                };
            }
            ShellCommand::History => return self.render_history(),
            ShellCommand::Routes => {
                let routes: Vec<RouteView> = self
                    .router
                    .routes()
                    .patterns()
                    .into_iter()
                    .map(|pattern| RouteView::from_route(&Route::new(pattern)))
                    .collect();
                return Table::new(&routes).with(Style::psql()).to_string();
            }
            ShellCommand::Limit { size } => {
                if let Some(size) = size {
                    self.history_size.set(*size);
                }
                return format!("History keeps up to {} entries.", self.history_size.get());
            }
            ShellCommand::Clear => {}
        }

        if cmd.navigates() {
            self.settle();
        }
        String::new()
    }

    fn shown(&self) -> Option<HistoryEntry> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn render_history(&self) -> String {
        let entries = self.router.history().entries();
        if entries.is_empty() {
            return "NO RECORDS FOUND".to_string();
        }
        let now = Instant::now();
        let rows: Vec<HistoryView> = entries
            .iter()
            .rev()
            .enumerate()
            .map(|(i, entry)| HistoryView::from_entry(i + 1, entry, now))
            .collect();
        Table::new(&rows).with(Style::psql()).to_string()
    }
}

fn print_page(entry: &HistoryEntry) {
    println!("{}", Color::LightBlue.bold().paint(&entry.page_title));
    if let Some(text) = entry.view.as_ref().and_then(describe) {
        println!("{}", text);
    }
    if let Some(toolbar) = entry.toolbar.as_ref().and_then(describe) {
        println!("{}", Color::Cyan.paint(toolbar));
    }
}

fn shell_history_file() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".scanline");
    path.push("shell");
    std::fs::create_dir_all(&path).ok()?;
    path.push("history");
    Some(path)
}

pub fn run(
    runtime: Handle,
    start: Option<String>,
    history_size: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = ReplServer::new(runtime, history_size)?;
    server.run(start)
}
