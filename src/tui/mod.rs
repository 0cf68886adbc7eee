mod render;

use crate::clipboard::{copy_history_output, copy_output, ClipboardSink, CopyFeedback};
use crate::refine::{RefineError, Refiner};
use crate::session::{PendingRefinement, Session};
use crate::store::KeyValueStore;
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::cell::Cell;
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PROCESSING_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const UI_POLL_INTERVAL: Duration = Duration::from_millis(60);
const SPINNER_TICK_INTERVAL: Duration = Duration::from_millis(120);
const CURSOR_BLINK_INTERVAL: Duration = Duration::from_millis(500);
const QUIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);
const OUTPUT_SCROLL_STEP: u16 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Main,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TuiAction {
    Quit,
    Type(char),
    Paste(String),
    Backspace,
    Generate,
    Clear,
    ToggleLanguage,
    CopyOutput,
    ScrollOutputUp,
    ScrollOutputDown,
    OpenHistory,
    CloseHistory,
    SelectPrev,
    SelectNext,
    UseSelected,
    DeleteSelected,
    CopySelected,
    ToggleExpanded,
}

/// What the event loop must do after an action is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    None,
    Quit,
    Spawn(PendingRefinement),
    CopyOutput,
    CopyHistory(String),
}

struct RefineWorker {
    pending: PendingRefinement,
    result_rx: Receiver<Result<String, RefineError>>,
}

struct TuiState {
    view: View,
    history_selected: usize,
    expanded_id: Option<String>,
    worker: Option<RefineWorker>,
    notice: Option<String>,
    copy_feedback: CopyFeedback,
    spinner_index: usize,
    last_spinner_tick: Instant,
    cursor_visible: bool,
    last_cursor_tick: Instant,
    output_scroll: u16,
    /// Largest useful scroll offset for the output pane, set on each draw.
    output_scroll_max: Cell<u16>,
}

impl TuiState {
    fn new() -> Self {
        Self {
            view: View::Main,
            history_selected: 0,
            expanded_id: None,
            worker: None,
            notice: None,
            copy_feedback: CopyFeedback::default(),
            spinner_index: 0,
            last_spinner_tick: Instant::now(),
            cursor_visible: true,
            last_cursor_tick: Instant::now(),
            output_scroll: 0,
            output_scroll_max: Cell::new(0),
        }
    }

    fn spinner_frame(&self) -> &'static str {
        PROCESSING_FRAMES[self.spinner_index % PROCESSING_FRAMES.len()]
    }

    fn advance_spinner_if_needed(&mut self) {
        if self.worker.is_some() && self.last_spinner_tick.elapsed() >= SPINNER_TICK_INTERVAL {
            self.spinner_index = (self.spinner_index + 1) % PROCESSING_FRAMES.len();
            self.last_spinner_tick = Instant::now();
        }
    }

    fn advance_cursor_blink_if_needed(&mut self) {
        if self.last_cursor_tick.elapsed() >= CURSOR_BLINK_INTERVAL {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_tick = Instant::now();
        }
    }

    fn cursor_suffix(&self) -> &'static str {
        if self.cursor_visible {
            "█"
        } else {
            " "
        }
    }
}

/// Runs the interactive UI until the user quits and hands the session back.
pub fn run_prompt_tui<S, R, C>(
    mut session: Session<S>,
    refiner: Arc<R>,
    mut clipboard: C,
) -> Result<Session<S>, String>
where
    S: KeyValueStore,
    R: Refiner + Send + Sync + 'static,
    C: ClipboardSink,
{
    let mut terminal = setup_terminal()?;
    let mut state = TuiState::new();

    let result = run_event_loop(
        &mut terminal,
        &mut session,
        &refiner,
        &mut clipboard,
        &mut state,
    );
    teardown_terminal(&mut terminal)?;

    result.map(|()| session)
}

fn run_event_loop<S, R, C>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    session: &mut Session<S>,
    refiner: &Arc<R>,
    clipboard: &mut C,
    state: &mut TuiState,
) -> Result<(), String>
where
    S: KeyValueStore,
    R: Refiner + Send + Sync + 'static,
    C: ClipboardSink,
{
    loop {
        state.advance_spinner_if_needed();
        state.advance_cursor_blink_if_needed();
        check_refine_result(state, session);
        render::draw(terminal, session, state)?;

        if !event::poll(UI_POLL_INTERVAL).map_err(|e| format!("failed to poll events: {e}"))? {
            continue;
        }
        let action = match event::read().map_err(|e| format!("failed to read event: {e}"))? {
            Event::Key(key) => action_from_key(state.view, key),
            Event::Paste(text) => action_from_paste(state.view, text),
            _ => None,
        };
        let Some(action) = action else {
            continue;
        };

        match apply_action(state, session, action) {
            Effect::None => {}
            Effect::Quit => {
                if state.worker.is_some() {
                    state.notice = Some("finishing the request in flight...".to_string());
                    render::draw(terminal, session, state)?;
                    drain_refine_worker(state, session, QUIT_DRAIN_TIMEOUT);
                }
                break;
            }
            Effect::Spawn(pending) => spawn_refine_worker(state, refiner, pending),
            Effect::CopyOutput => {
                let copied = copy_output(session, clipboard);
                report_copy(state, copied);
            }
            Effect::CopyHistory(id) => {
                let copied = copy_history_output(session, &id, clipboard);
                report_copy(state, copied);
            }
        }
    }

    Ok(())
}

fn action_from_key(view: View, key: KeyEvent) -> Option<TuiAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl {
        return match key.code {
            KeyCode::Char('c') => Some(TuiAction::Quit),
            KeyCode::Char('h') => Some(match view {
                View::Main => TuiAction::OpenHistory,
                View::History => TuiAction::CloseHistory,
            }),
            KeyCode::Char('l') if view == View::Main => Some(TuiAction::Clear),
            KeyCode::Char('y') if view == View::Main => Some(TuiAction::CopyOutput),
            _ => None,
        };
    }

    match view {
        View::Main => match key.code {
            KeyCode::Esc => Some(TuiAction::Quit),
            KeyCode::Enter => Some(TuiAction::Generate),
            KeyCode::Tab => Some(TuiAction::ToggleLanguage),
            KeyCode::PageUp => Some(TuiAction::ScrollOutputUp),
            KeyCode::PageDown => Some(TuiAction::ScrollOutputDown),
            KeyCode::Backspace => Some(TuiAction::Backspace),
            KeyCode::Char(c) => Some(TuiAction::Type(c)),
            _ => None,
        },
        View::History => match key.code {
            KeyCode::Esc => Some(TuiAction::CloseHistory),
            KeyCode::Up | KeyCode::Char('k') => Some(TuiAction::SelectPrev),
            KeyCode::Down | KeyCode::Char('j') => Some(TuiAction::SelectNext),
            KeyCode::Enter => Some(TuiAction::UseSelected),
            KeyCode::Delete | KeyCode::Char('d') => Some(TuiAction::DeleteSelected),
            KeyCode::Char('c') => Some(TuiAction::CopySelected),
            KeyCode::Char(' ') => Some(TuiAction::ToggleExpanded),
            _ => None,
        },
    }
}

fn action_from_paste(view: View, text: String) -> Option<TuiAction> {
    if view != View::Main || text.is_empty() {
        return None;
    }
    Some(TuiAction::Paste(text.replace("\r\n", "\n").replace('\r', "\n")))
}

fn clamp_selection(selected: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    selected.min(len - 1)
}

fn selected_history_id<S: KeyValueStore>(state: &TuiState, session: &Session<S>) -> Option<String> {
    session
        .history()
        .entries()
        .get(state.history_selected)
        .map(|entry| entry.id().to_string())
}

fn apply_action<S: KeyValueStore>(
    state: &mut TuiState,
    session: &mut Session<S>,
    action: TuiAction,
) -> Effect {
    state.notice = None;
    match action {
        TuiAction::Quit => return Effect::Quit,
        TuiAction::Type(c) => {
            session.input_mut().push(c);
            state.cursor_visible = true;
            state.last_cursor_tick = Instant::now();
        }
        TuiAction::Paste(text) => {
            session.input_mut().push_str(&text);
            state.cursor_visible = true;
            state.last_cursor_tick = Instant::now();
        }
        TuiAction::Backspace => {
            session.input_mut().pop();
        }
        TuiAction::Generate => {
            if let Some(pending) = session.begin_generate() {
                state.output_scroll = 0;
                return Effect::Spawn(pending);
            }
        }
        TuiAction::Clear => {
            session.clear();
            state.output_scroll = 0;
        }
        TuiAction::ToggleLanguage => session.toggle_language(),
        TuiAction::CopyOutput => return Effect::CopyOutput,
        TuiAction::ScrollOutputUp => {
            state.output_scroll = state.output_scroll.saturating_sub(OUTPUT_SCROLL_STEP);
        }
        TuiAction::ScrollOutputDown => {
            state.output_scroll = state
                .output_scroll
                .saturating_add(OUTPUT_SCROLL_STEP)
                .min(state.output_scroll_max.get());
        }
        TuiAction::OpenHistory => {
            state.view = View::History;
            state.history_selected = 0;
            state.expanded_id = None;
        }
        TuiAction::CloseHistory => state.view = View::Main,
        TuiAction::SelectPrev => {
            state.history_selected = state.history_selected.saturating_sub(1);
        }
        TuiAction::SelectNext => {
            state.history_selected =
                clamp_selection(state.history_selected + 1, session.history().len());
        }
        TuiAction::UseSelected => {
            if let Some(id) = selected_history_id(state, session) {
                if session.use_history_entry(&id) {
                    state.view = View::Main;
                    state.output_scroll = 0;
                }
            }
        }
        TuiAction::DeleteSelected => {
            if let Some(id) = selected_history_id(state, session) {
                session.delete_history_entry(&id);
                if state.expanded_id.as_deref() == Some(id.as_str()) {
                    state.expanded_id = None;
                }
                state.history_selected =
                    clamp_selection(state.history_selected, session.history().len());
            }
        }
        TuiAction::CopySelected => {
            if let Some(id) = selected_history_id(state, session) {
                return Effect::CopyHistory(id);
            }
        }
        TuiAction::ToggleExpanded => {
            if let Some(id) = selected_history_id(state, session) {
                state.expanded_id = if state.expanded_id.as_deref() == Some(id.as_str()) {
                    None
                } else {
                    Some(id)
                };
            }
        }
    }
    Effect::None
}

fn report_copy(state: &mut TuiState, copied: Result<bool, String>) {
    match copied {
        Ok(true) => state.copy_feedback.mark(),
        Ok(false) => state.notice = Some("nothing to copy".to_string()),
        Err(err) => state.notice = Some(err),
    }
}

fn spawn_refine_worker<R>(state: &mut TuiState, refiner: &Arc<R>, pending: PendingRefinement)
where
    R: Refiner + Send + Sync + 'static,
{
    let worker_refiner = Arc::clone(refiner);
    let request = pending.clone();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = worker_refiner.refine(&request.input, request.language);
        let _ = tx.send(result);
    });

    state.worker = Some(RefineWorker {
        pending,
        result_rx: rx,
    });
    state.spinner_index = 0;
    state.last_spinner_tick = Instant::now();
}

fn check_refine_result<S: KeyValueStore>(state: &mut TuiState, session: &mut Session<S>) {
    let Some(worker) = state.worker.take() else {
        return;
    };

    match worker.result_rx.try_recv() {
        Ok(result) => {
            session.complete_generate(worker.pending, result);
        }
        Err(mpsc::TryRecvError::Empty) => {
            state.worker = Some(worker);
        }
        Err(mpsc::TryRecvError::Disconnected) => {
            session.complete_generate(
                worker.pending,
                Err(RefineError::Network(
                    "refinement worker stopped unexpectedly".to_string(),
                )),
            );
        }
    }
}

/// Waits up to `timeout` for the worker in flight so a finished refinement
/// is still recorded before the UI exits.
fn drain_refine_worker<S: KeyValueStore>(
    state: &mut TuiState,
    session: &mut Session<S>,
    timeout: Duration,
) {
    let Some(worker) = state.worker.take() else {
        return;
    };

    let result = match worker.result_rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => return,
        Err(RecvTimeoutError::Disconnected) => Err(RefineError::Network(
            "refinement worker stopped unexpectedly".to_string(),
        )),
    };
    session.complete_generate(worker.pending, result);
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, String> {
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste, cursor::Hide)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| format!("failed to initialize terminal: {e}"))
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), String> {
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen,
        cursor::Show
    )
        .map_err(|e| format!("failed to leave alternate screen: {e}"))?;
    terminal
        .show_cursor()
        .map_err(|e| format!("failed to restore cursor: {e}"))?;
    Ok(())
}
