mod app;
mod config;
mod logger;
mod store;
mod theme;

use app::{render_leaderboard, App, Outcome};
use clap::{Parser, Subcommand, ValueEnum};
use config::{Environment, LabConfig};
use crossterm::style::Stylize;
use lab_core::{
    catalog, AdminSettings, AssignmentMode, EscapeRoom, LeaderboardBackend, SetId, Stage,
};
use log::LevelFilter;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use store::KioskStore;
use theme::Theme;

#[derive(Parser)]
#[command(name = "stabilize-lab", version, about = "Chemistry escape room kiosk")]
struct Cli {
    /// Write debug output to the log file
    #[arg(short, long, global = true)]
    verbose: bool,

    /// High contrast colors
    #[arg(long, global = true)]
    high_contrast: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a group through the room (default)
    Play,
    /// Show or change set assignment
    Admin {
        /// Admin PIN; asked for when omitted
        #[arg(long)]
        pin: Option<String>,
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Show or clear the leaderboard
    Leaderboard {
        #[command(subcommand)]
        action: Option<BoardAction>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Current settings and the group in progress
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Switch between random and manual assignment
    Mode { mode: ModeArg },
    /// Set the manual set (A-D)
    Set { set: SetId },
    /// Advance the manual set A→B→C→D→A
    Rotate,
    /// Toggle never giving two groups in a row the same set
    ExcludeLast,
    /// Toggle the `Set: X` badge on the play screen
    Debug,
    /// Drop the group in progress; the leaderboard is kept
    ResetSession,
    /// Expected codes for every set
    Preview,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Random,
    Manual,
}

impl From<ModeArg> for AssignmentMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Random => AssignmentMode::Random,
            ModeArg::Manual => AssignmentMode::Manual,
        }
    }
}

#[derive(Subcommand)]
enum BoardAction {
    /// Fastest runs first
    List {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry
    Clear {
        /// Admin PIN; asked for when omitted
        #[arg(long)]
        pin: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    settings: &'a AdminSettings,
    stage: Stage,
    group_name: Option<&'a str>,
    set_id: Option<SetId>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = LabConfig::from_env();

    if config.env == Environment::Local {
        let level = if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        logger::init(&config.log_path(), level);
    }
    let theme = if cli.high_contrast {
        Theme::high_contrast()
    } else {
        Theme::default()
    };

    let result = match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(&config, theme),
        Command::Admin { pin, action } => admin(&config, &theme, pin, action),
        Command::Leaderboard { action } => leaderboard(&config, &theme, action),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_room(config: &LabConfig) -> (EscapeRoom<KioskStore>, Box<dyn LeaderboardBackend>) {
    let store = store::open_store(config);
    let leaderboard = store::create_leaderboard(config, &store);
    let room = EscapeRoom::new(store.clone(), store).with_pin(config.admin_pin.clone());
    (room, leaderboard)
}

fn play(config: &LabConfig, theme: Theme) -> io::Result<ExitCode> {
    let (room, leaderboard) = open_room(config);
    let stdin = io::stdin();
    let mut app = App::new(room, leaderboard, stdin.lock(), io::stdout()).with_theme(theme);
    match app.run()? {
        Outcome::Completed(entry) => log::info!("[SESSION] kiosk run done group:{}", entry.group),
        Outcome::Left => log::info!("[SESSION] kiosk run paused"),
    }
    Ok(ExitCode::SUCCESS)
}

fn ask_pin(pin: Option<String>) -> io::Result<String> {
    if let Some(pin) = pin {
        return Ok(pin);
    }
    print!("Admin PIN: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn denied() -> ExitCode {
    eprintln!("{}", "Wrong PIN.".red());
    ExitCode::FAILURE
}

fn admin(
    config: &LabConfig,
    theme: &Theme,
    pin: Option<String>,
    action: AdminAction,
) -> io::Result<ExitCode> {
    let (mut room, _) = open_room(config);
    if !room.admin().unlock(&ask_pin(pin)?) {
        return Ok(denied());
    }

    let result = run_admin_action(&mut room, theme, action);
    // A kiosk never stays logged in between commands
    room.admin().logout();
    result
}

fn run_admin_action(
    room: &mut EscapeRoom<KioskStore>,
    theme: &Theme,
    action: AdminAction,
) -> io::Result<ExitCode> {
    let mut out = io::stdout();

    if matches!(action, AdminAction::ResetSession) {
        if room.reset_session() {
            writeln!(out, "{}", "Session cleared.".with(theme.success))?;
            return Ok(ExitCode::SUCCESS);
        }
        return Ok(denied());
    }

    let Some(panel) = room.admin().panel() else {
        return Ok(denied());
    };
    match action {
        AdminAction::Status { json } => {
            let settings = room.admin().load();
            let status = Status {
                settings: &settings,
                stage: room.stage(),
                group_name: room.session().map(|s| s.group_name.as_str()),
                set_id: room.set_id(),
            };
            if json {
                let text = serde_json::to_string_pretty(&status)
                    .map_err(io::Error::other)?;
                writeln!(out, "{}", text)?;
            } else {
                print_status(&mut out, theme, &status)?;
            }
        }
        AdminAction::Mode { mode } => {
            let settings = panel.set_mode(mode.into());
            writeln!(out, "Mode: {:?}", settings.mode)?;
        }
        AdminAction::Set { set } => {
            let settings = panel.set_manual_set(set);
            writeln!(out, "Manual set: {}", settings.manual_set_id)?;
        }
        AdminAction::Rotate => {
            writeln!(out, "Manual set: {}", panel.rotate_manual_set())?;
        }
        AdminAction::ExcludeLast => {
            writeln!(out, "Exclude last in random: {}", on_off(panel.toggle_exclude_last()))?;
        }
        AdminAction::Debug => {
            writeln!(out, "Debug overlay: {}", on_off(panel.toggle_debug_overlay()))?;
        }
        AdminAction::Preview => {
            writeln!(out, "{}", "SET  P1    P2    P3   FINAL".with(theme.title).bold())?;
            for row in catalog::preview() {
                writeln!(
                    out,
                    "  {}  {:<5} {:<5} {:<4} {}",
                    row.set,
                    row.p1,
                    row.p2,
                    row.p3,
                    row.final_code.as_str().with(theme.accent)
                )?;
            }
        }
        AdminAction::ResetSession => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn print_status(out: &mut impl Write, theme: &Theme, status: &Status) -> io::Result<()> {
    let s = status.settings;
    writeln!(out, "{}", "ADMIN".with(theme.title).bold())?;
    writeln!(out, "  Mode:            {:?}", s.mode)?;
    writeln!(out, "  Manual set:      {}", s.manual_set_id)?;
    let last = s
        .last_assigned_set_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    writeln!(out, "  Last assigned:   {}", last)?;
    writeln!(out, "  Exclude last:    {}", on_off(s.exclude_last_in_random))?;
    writeln!(out, "  Debug overlay:   {}", on_off(s.debug_overlay_enabled))?;
    match (status.group_name, status.set_id) {
        (Some(group), Some(set)) => writeln!(
            out,
            "  In progress:     {} on set {} ({:?})",
            group, set, status.stage
        ),
        _ => writeln!(out, "  In progress:     {}", "none".with(theme.info)),
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn leaderboard(
    config: &LabConfig,
    theme: &Theme,
    action: Option<BoardAction>,
) -> io::Result<ExitCode> {
    let (room, board) = open_room(config);
    let mut out = io::stdout();

    match action.unwrap_or(BoardAction::List {
        limit: None,
        json: false,
    }) {
        BoardAction::List { limit, json } => {
            let entries = board
                .list()
                .map_err(io::Error::other)?;
            if json {
                let text = serde_json::to_string_pretty(&entries)
                    .map_err(io::Error::other)?;
                writeln!(out, "{}", text)?;
            } else {
                render_leaderboard(&mut out, theme, &entries, limit)?;
            }
        }
        BoardAction::Clear { pin } => {
            if !room.admin().unlock(&ask_pin(pin)?) {
                return Ok(denied());
            }
            let cleared = room.clear_leaderboard(board.as_ref());
            room.admin().logout();
            if !cleared {
                eprintln!("{}", "Could not clear the leaderboard.".with(theme.error));
                return Ok(ExitCode::FAILURE);
            }
            writeln!(out, "{}", "Leaderboard cleared.".with(theme.success))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
