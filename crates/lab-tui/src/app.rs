//! Line-based kiosk play
//!
//! One group at a time: setup form, countdown, the three puzzles and the
//! master code. Typing `hint` shows the next clue, `quit` pauses the run
//! with progress kept in the session store.

use crate::theme::Theme;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use lab_core::catalog::ElementCategory;
use lab_core::session::{DEFAULT_PLAYERS, MAX_PLAYERS};
use lab_core::{
    format_elapsed, EscapeRoom, GroupInfo, KeyValueStore, LeaderboardBackend, LeaderboardEntry,
    Puzzle, PuzzleSet, ReactionKind, Stage,
};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// How a kiosk run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(LeaderboardEntry),
    /// Players left before finishing; progress stays saved
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Solved,
    Quit,
}

enum Input {
    Line(String),
    Hint,
    Quit,
}

/// The kiosk application state
pub struct App<S: KeyValueStore, R: BufRead, W: Write> {
    room: EscapeRoom<S>,
    leaderboard: Box<dyn LeaderboardBackend>,
    theme: Theme,
    input: R,
    out: W,
    /// Pause between countdown ticks
    countdown_tick: Duration,
    clock: fn() -> u64,
    clear_screen: bool,
    /// Highest hint level shown per puzzle
    hints_shown: HashMap<Puzzle, usize>,
}

impl<S: KeyValueStore, R: BufRead, W: Write> App<S, R, W> {
    pub fn new(
        room: EscapeRoom<S>,
        leaderboard: Box<dyn LeaderboardBackend>,
        input: R,
        out: W,
    ) -> Self {
        Self {
            room,
            leaderboard,
            theme: Theme::default(),
            input,
            out,
            countdown_tick: Duration::from_secs(1),
            clock: now_ms,
            clear_screen: true,
            hints_shown: HashMap::new(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Run one group (or resume the one in the session store)
    pub fn run(&mut self) -> io::Result<Outcome> {
        if self.room.stage() == Stage::NotStarted {
            let Some(group) = self.setup()? else {
                return Ok(Outcome::Left);
            };
            self.countdown()?;
            self.room.begin(&group, (self.clock)());
        } else if let Some(name) = self.room.session().map(|s| s.group_name.clone()) {
            let msg = format!("Welcome back, {}. Picking up where you left off.", name);
            writeln!(self.out, "{}", msg.with(self.theme.info))?;
        }

        loop {
            let step = match self.room.stage() {
                Stage::Puzzle1Active => self.play_code(Puzzle::ReactionLogic)?,
                Stage::Puzzle2Active => self.play_code(Puzzle::PeriodicTable)?,
                Stage::Puzzle3Active => self.play_matching()?,
                Stage::FinalActive => self.play_final()?,
                Stage::Completed => return self.finish(),
                Stage::NotStarted => return Ok(Outcome::Left),
            };
            if step == Step::Quit {
                let msg = "Progress saved. Run stabilize-lab again to continue.";
                writeln!(self.out, "{}", msg.with(self.theme.info))?;
                return Ok(Outcome::Left);
            }
        }
    }

    // ==================== Screens ====================

    fn setup(&mut self) -> io::Result<Option<GroupInfo>> {
        self.clear()?;
        writeln!(self.out, "{}", "STABILIZE THE LAB".with(self.theme.title).bold())?;
        writeln!(
            self.out,
            "The reactor is unstable. Solve three chemistry puzzles to bring it back under control."
        )?;
        writeln!(self.out)?;

        loop {
            let name = match self.read("Group name:")? {
                Input::Line(name) => name,
                Input::Hint => String::new(),
                Input::Quit => return Ok(None),
            };
            let prompt = format!("Players (1-{}, Enter for {}):", MAX_PLAYERS, DEFAULT_PLAYERS);
            let players = match self.read(&prompt)? {
                Input::Line(p) if p.is_empty() => DEFAULT_PLAYERS,
                Input::Line(p) => p.parse::<u8>().unwrap_or(0),
                Input::Hint => DEFAULT_PLAYERS,
                Input::Quit => return Ok(None),
            };
            let block = match self.read("Class block (optional):")? {
                Input::Line(block) => block,
                Input::Hint => String::new(),
                Input::Quit => return Ok(None),
            };

            match GroupInfo::new(name, players, block).validate() {
                Ok(group) => return Ok(Some(group)),
                Err(e) => self.error(&e.to_string())?,
            }
        }
    }

    fn countdown(&mut self) -> io::Result<()> {
        for n in (1..=3).rev() {
            writeln!(self.out, "{}", format!("{}...", n).with(self.theme.title).bold())?;
            self.out.flush()?;
            std::thread::sleep(self.countdown_tick);
        }
        Ok(())
    }

    fn play_code(&mut self, puzzle: Puzzle) -> io::Result<Step> {
        let Some(set) = self.room.puzzle_set() else {
            return Ok(Step::Quit);
        };
        self.header(&format!("Puzzle {}: {}", puzzle.number(), puzzle.title()))?;
        match puzzle {
            Puzzle::ReactionLogic => self.show_equations(set)?,
            Puzzle::PeriodicTable => self.show_elements(set)?,
            Puzzle::ReactionConditions => {}
        }
        self.commands_help()?;

        let prompt = format!("Code ({} digits):", puzzle.code_len());
        loop {
            match self.read(&prompt)? {
                Input::Quit => return Ok(Step::Quit),
                Input::Hint => self.show_hint(puzzle)?,
                Input::Line(code) if code.is_empty() => {}
                Input::Line(code) => {
                    if self.room.submit_code(puzzle, &code) {
                        self.success(&format!(
                            "Puzzle {} solved! Code {} recorded.",
                            puzzle.number(),
                            code
                        ))?;
                        return Ok(Step::Solved);
                    }
                    self.error("That code doesn't stabilize anything. Try again.")?;
                }
            }
        }
    }

    fn show_equations(&mut self, set: &PuzzleSet) -> io::Result<()> {
        writeln!(self.out, "Classify and balance each reaction. One of them is a decoy.")?;
        writeln!(self.out, "Digit order: Single → Double → Acid–Base → Combustion.")?;
        writeln!(self.out)?;
        for (i, eq) in set.equations.iter().enumerate() {
            let target = format!("(coefficient of {})", eq.extract_from.unwrap_or("H₂O"));
            writeln!(
                self.out,
                "  {}. {}   {}",
                i + 1,
                eq.parts.join(" ").with(self.theme.accent),
                target.with(self.theme.info)
            )?;
        }
        writeln!(self.out)
    }

    fn show_elements(&mut self, set: &PuzzleSet) -> io::Result<()> {
        writeln!(
            self.out,
            "Find the metals that form +1 or +2 ions. Their atomic numbers, ordered by charge, make the code."
        )?;
        writeln!(self.out)?;
        for el in set.elements {
            let category = match el.category {
                ElementCategory::Metal => "metal",
                ElementCategory::NonMetal => "non-metal",
                ElementCategory::NobleGas => "noble gas",
                ElementCategory::Metalloid => "metalloid",
            };
            writeln!(
                self.out,
                "  {} {:<10} Z={:<3} charge {:+}  {}",
                format!("{:<3}", el.symbol).with(self.theme.accent),
                el.name,
                el.atomic_number,
                el.charge,
                category
            )?;
        }
        writeln!(self.out)
    }

    fn play_matching(&mut self) -> io::Result<Step> {
        let Some(set) = self.room.puzzle_set() else {
            return Ok(Step::Quit);
        };
        let puzzle = Puzzle::ReactionConditions;
        self.header(&format!("Puzzle {}: {}", puzzle.number(), puzzle.title()))?;
        writeln!(
            self.out,
            "Match each reaction to its condition. Type the condition id or its number."
        )?;
        writeln!(self.out)?;
        for (i, c) in set.conditions.iter().enumerate() {
            writeln!(
                self.out,
                "  {}. {} {}",
                i + 1,
                format!("{:<10}", c.id).with(self.theme.accent),
                c.name
            )?;
        }
        writeln!(self.out)?;
        self.commands_help()?;

        loop {
            let mut board = HashMap::new();
            for kind in ReactionKind::ALL {
                let prompt = format!("{} →", kind.label());
                loop {
                    match self.read(&prompt)? {
                        Input::Quit => return Ok(Step::Quit),
                        Input::Hint => self.show_hint(puzzle)?,
                        Input::Line(answer) => match resolve_condition(set, &answer) {
                            Some(id) => {
                                board.insert(kind, id.to_string());
                                break;
                            }
                            None => self.error("No condition by that name.")?,
                        },
                    }
                }
            }

            match self.room.submit_matches(&board) {
                Some(code) => {
                    self.success(&format!("All reactions stable! Code {} recorded.", code))?;
                    return Ok(Step::Solved);
                }
                None => self.error("The reactor is still unstable. Check your matches.")?,
            }
        }
    }

    fn play_final(&mut self) -> io::Result<Step> {
        self.header("Master Unlock")?;
        let codes = self.room.codes();
        writeln!(
            self.out,
            "Recovered codes: P1 {}  P2 {}  P3 {}",
            codes.p1.as_str().with(self.theme.accent),
            codes.p2.as_str().with(self.theme.accent),
            codes.p3.as_str().with(self.theme.accent)
        )?;
        writeln!(self.out)?;
        self.commands_help()?;

        loop {
            match self.read("Master code:")? {
                Input::Quit => return Ok(Step::Quit),
                Input::Hint => {
                    writeln!(self.out, "Put the three codes together, puzzle 1 first.")?;
                }
                Input::Line(code) if code.is_empty() => {}
                Input::Line(code) => {
                    if self.room.submit_final(&code, (self.clock)()) {
                        return Ok(Step::Solved);
                    }
                    self.error("Access denied.")?;
                }
            }
        }
    }

    fn finish(&mut self) -> io::Result<Outcome> {
        let now = (self.clock)();
        let Some(entry) = self.room.finish(self.leaderboard.as_ref(), now) else {
            return Ok(Outcome::Left);
        };

        self.clear()?;
        writeln!(self.out, "{}", "LAB STABILIZED".with(self.theme.success).bold())?;
        writeln!(
            self.out,
            "{} finished in {}",
            entry.group,
            entry.time.as_str().with(self.theme.success).bold()
        )?;
        writeln!(self.out)?;

        match self.leaderboard.list() {
            Ok(entries) => render_leaderboard(&mut self.out, &self.theme, &entries, Some(5))?,
            Err(e) => self.error(&format!("Leaderboard unavailable: {}", e))?,
        }
        Ok(Outcome::Completed(entry))
    }

    // ==================== Helpers ====================

    fn read(&mut self, prompt: &str) -> io::Result<Input> {
        write!(self.out, "{} ", prompt.with(self.theme.key))?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(Input::Quit);
        }
        let line = line.trim();
        Ok(match line.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Input::Quit,
            "hint" | "?" => Input::Hint,
            _ => Input::Line(line.to_string()),
        })
    }

    fn clear(&mut self) -> io::Result<()> {
        if self.clear_screen {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        Ok(())
    }

    fn header(&mut self, title: &str) -> io::Result<()> {
        self.clear()?;
        let group = self
            .room
            .session()
            .map(|s| s.group_name.clone())
            .unwrap_or_default();
        let mut status = format!(
            "{}  time {}",
            group,
            format_elapsed(self.room.elapsed_seconds((self.clock)()))
        );
        if self.room.admin().load().debug_overlay_enabled {
            if let Some(id) = self.room.set_id() {
                status.push_str(&format!("  Set: {}", id));
            }
        }
        writeln!(self.out, "{}", status.with(self.theme.info))?;
        writeln!(self.out, "{}", title.with(self.theme.title).bold())?;
        writeln!(self.out)
    }

    fn commands_help(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "Type {} for a clue, {} to pause.",
            "hint".with(self.theme.key),
            "quit".with(self.theme.key)
        )
    }

    fn show_hint(&mut self, puzzle: Puzzle) -> io::Result<()> {
        let level = {
            let shown = self.hints_shown.entry(puzzle).or_insert(0);
            *shown = (*shown + 1).min(3);
            *shown
        };
        let Some(hint) = self.room.puzzle_set().and_then(|s| s.hint(puzzle, level)) else {
            return Ok(());
        };
        log::info!("[SESSION] hint puzzle:{} level:{}", puzzle.number(), level);
        writeln!(
            self.out,
            "{} {}",
            format!("Hint {}:", level).with(self.theme.key),
            hint
        )
    }

    fn error(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{}", msg.with(self.theme.error))
    }

    fn success(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{}", msg.with(self.theme.success).bold())
    }
}

/// Accept a condition by id (any case) or by its 1-based position
fn resolve_condition(set: &PuzzleSet, answer: &str) -> Option<&'static str> {
    if let Ok(n) = answer.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| set.conditions.get(i))
            .map(|c| c.id);
    }
    set.condition(&answer.to_ascii_lowercase()).map(|c| c.id)
}

/// Print the leaderboard table, fastest first
pub fn render_leaderboard(
    out: &mut impl Write,
    theme: &Theme,
    entries: &[LeaderboardEntry],
    limit: Option<usize>,
) -> io::Result<()> {
    writeln!(out, "{}", "LEADERBOARD".with(theme.title).bold())?;
    if entries.is_empty() {
        return writeln!(out, "{}", "No runs yet.".with(theme.info));
    }
    for (i, e) in entries.iter().take(limit.unwrap_or(usize::MAX)).enumerate() {
        let set = e.set_id.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
        writeln!(
            out,
            "  {:>2}. {:<24} {:>6}  {}  set {}",
            i + 1,
            e.group,
            e.time,
            e.date.as_str().with(theme.info),
            set
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_core::{AdminSettings, AssignmentMode, MemoryStore, SetId, StoreLeaderboard};
    use std::io::Cursor;

    fn fixed_clock() -> u64 {
        1_000
    }

    fn room_on(set_id: SetId, sessions: MemoryStore) -> EscapeRoom<MemoryStore> {
        let room = EscapeRoom::new(MemoryStore::new(), sessions);
        room.admin()
            .save(&AdminSettings {
                mode: AssignmentMode::Manual,
                manual_set_id: set_id,
                ..AdminSettings::default()
            })
            .unwrap();
        room
    }

    fn app(
        room: EscapeRoom<MemoryStore>,
        board: MemoryStore,
        script: &str,
    ) -> App<MemoryStore, Cursor<Vec<u8>>, Vec<u8>> {
        let mut app = App::new(
            room,
            Box::new(StoreLeaderboard::new(board)),
            Cursor::new(script.as_bytes().to_vec()),
            Vec::new(),
        );
        app.countdown_tick = Duration::ZERO;
        app.clock = fixed_clock;
        app.clear_screen = false;
        app
    }

    fn output(app: &App<MemoryStore, Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8_lossy(&app.out).into_owned()
    }

    #[test]
    fn test_full_run_reaches_leaderboard() {
        let board = MemoryStore::new();
        let script = "Team Argon\n3\nB2\n1114\n1112\nheat\n4\nGAS\nelec\n11141112341\n";
        let mut app = app(room_on(SetId::A, MemoryStore::new()), board.clone(), script);

        let entry = match app.run().unwrap() {
            Outcome::Completed(entry) => entry,
            other => panic!("run did not complete: {:?}", other),
        };
        assert_eq!(entry.group, "Team Argon");
        assert_eq!(entry.set_id, Some(SetId::A));
        assert_eq!(app.room.stage(), Stage::NotStarted);

        let listed = StoreLeaderboard::new(board).list().unwrap();
        assert_eq!(listed, vec![entry]);
        assert!(output(&app).contains("LAB STABILIZED"));
    }

    #[test]
    fn test_quit_keeps_progress_for_resume() {
        let sessions = MemoryStore::new();
        let mut first = app(
            room_on(SetId::B, sessions.clone()),
            MemoryStore::new(),
            "Team Xenon\n\n\n1112\nquit\n",
        );
        assert_eq!(first.run().unwrap(), Outcome::Left);
        assert_eq!(first.room.stage(), Stage::Puzzle2Active);

        let mut second = app(
            EscapeRoom::new(MemoryStore::new(), sessions),
            MemoryStore::new(),
            "1920\n",
        );
        // Input runs out at puzzle 3, which counts as leaving
        assert_eq!(second.run().unwrap(), Outcome::Left);
        assert_eq!(second.room.stage(), Stage::Puzzle3Active);
        assert!(output(&second).contains("Welcome back, Team Xenon"));
    }

    #[test]
    fn test_wrong_code_and_hints() {
        let mut app = app(
            room_on(SetId::A, MemoryStore::new()),
            MemoryStore::new(),
            "Team\n2\n\nhint\nhint\n9999\nquit\n",
        );
        assert_eq!(app.run().unwrap(), Outcome::Left);

        let out = output(&app);
        assert!(out.contains("Hint 1:"));
        assert!(out.contains("Hint 2:"));
        assert!(out.contains("doesn't stabilize"));
        assert_eq!(app.room.stage(), Stage::Puzzle1Active);
    }

    #[test]
    fn test_setup_rejects_bad_input() {
        let mut app = app(
            room_on(SetId::A, MemoryStore::new()),
            MemoryStore::new(),
            "  \n3\n\nTeam\n12\n\nquit\n",
        );
        assert_eq!(app.run().unwrap(), Outcome::Left);

        let out = output(&app);
        assert!(out.contains("Group name is required"));
        assert!(out.contains("Player count must be between 1 and 10, got 12"));
        assert_eq!(app.room.stage(), Stage::NotStarted);
    }

    #[test]
    fn test_debug_overlay_shows_set() {
        let room = room_on(SetId::C, MemoryStore::new());
        room.admin().update(|s| s.debug_overlay_enabled = true);
        let mut app = app(room, MemoryStore::new(), "Team\n\n\nquit\n");
        app.run().unwrap();
        assert!(output(&app).contains("Set: C"));
    }

    #[test]
    fn test_resolve_condition() {
        let set = lab_core::get_set(SetId::A);
        assert_eq!(resolve_condition(set, "1"), Some("heat"));
        assert_eq!(resolve_condition(set, "4"), Some("aq"));
        assert_eq!(resolve_condition(set, "Elec"), Some("elec"));
        assert_eq!(resolve_condition(set, "0"), None);
        assert_eq!(resolve_condition(set, "5"), None);
        assert_eq!(resolve_condition(set, "plasma"), None);
    }

    #[test]
    fn test_render_empty_leaderboard() {
        let mut out = Vec::new();
        render_leaderboard(&mut out, &Theme::default(), &[], None).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No runs yet."));
    }
}
