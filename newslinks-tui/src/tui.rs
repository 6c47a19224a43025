use crate::{
    feeders::spawn_tui_feeders,
    state::{Action, TuiState},
    view::{self, ViewSnap},
};
use anyhow::Result;
use crossterm::{
    event::{Event as CtEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use newslinks_config::NewslinksConfig;
use newslinks_runtime::SearchHandle;
use newslinks_web::{LiveNewsSearch, SearchFailure, SearchOutcome, SearchRequest};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, Stdout},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::mpsc, task::JoinHandle};

pub enum TuiMsg {
    Input(CtEvent),
    InputError(String),
    Tick,
    SearchDone(Result<SearchOutcome, SearchFailure>),
}

/// Raw mode plus alternate screen, restored on drop.
struct TerminalGuard {
    term: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let mut term = Terminal::new(CrosstermBackend::new(stdout))?;
        term.clear()?;
        Ok(Self { term })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = self.term.show_cursor();
    }
}

/// Upper bound on waiting for an in-flight search to close its browser
/// after the user quits.
const QUIT_GRACE: Duration = Duration::from_secs(5);

/// Run the interactive shell until the user quits.
///
/// Searches run on `runtime`, one at a time; the UI keeps redrawing while
/// they are in flight. Quitting cancels the running search and waits for it
/// to close its browser.
pub async fn run_tui(cfg: &NewslinksConfig, runtime: SearchHandle) -> Result<()> {
    let search = Arc::new(LiveNewsSearch::from_config(cfg)?);
    let mut state = TuiState::new(cfg);

    let (tx, mut rx) = mpsc::channel::<TuiMsg>(256);
    let feeders = runtime.child_token();
    let mut guard = TerminalGuard::enter()?;
    spawn_tui_feeders(tx.clone(), feeders.clone());

    let mut in_flight: Option<JoinHandle<()>> = None;

    let tick_rate = Duration::from_millis(80);
    let mut last_draw = Instant::now();
    let result = loop {
        let Some(msg) = rx.recv().await else {
            break Ok(());
        };
        match msg {
            TuiMsg::Input(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => match state.handle_key(key) {
                Action::Quit => break Ok(()),
                Action::Search(request) => {
                    in_flight = Some(start_search(&runtime, search.clone(), request, tx.clone()));
                }
                Action::None => {}
            },
            TuiMsg::Input(_) => {}
            TuiMsg::InputError(e) => {
                tracing::warn!(error = %e, "terminal input failed");
                state.report_error(&e);
            }
            TuiMsg::SearchDone(result) => state.finish(result),
            TuiMsg::Tick => {
                state.step_spinner();
                if state.take_dirty() || last_draw.elapsed() >= tick_rate {
                    if let Err(e) = view::draw(&mut guard.term, &ViewSnap::from_state(&state)) {
                        break Err(e);
                    }
                    last_draw = Instant::now();
                }
            }
        }
    };

    feeders.cancel();
    drop(guard);
    runtime.cancel_all();
    if let Some(task) = in_flight.filter(|t| !t.is_finished()) {
        tracing::info!("waiting for the running search to close its browser");
        if tokio::time::timeout(QUIT_GRACE, task).await.is_err() {
            tracing::warn!(grace = ?QUIT_GRACE, "search did not stop in time");
        }
    }
    result
}

fn start_search(
    runtime: &SearchHandle,
    search: Arc<LiveNewsSearch>,
    request: SearchRequest,
    tx: mpsc::Sender<TuiMsg>,
) -> JoinHandle<()> {
    runtime.spawn_cancellable(move |cancel| async move {
        let result = search.run_until(&request, &cancel).await;
        let _ = tx.send(TuiMsg::SearchDone(result)).await;
    })
}
