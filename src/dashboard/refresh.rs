//! The dashboard's refresh loop.
//!
//! In manual mode (`RefreshInterval::Off`) a frame is drawn once per operator
//! command. In auto mode a frame is drawn, then the loop waits for the
//! refresh period or the next command, whichever comes first, so switching
//! modes takes effect immediately.

use super::session::{Session, SessionCommand};
use super::terminal::Screen;
use super::view::{render, View};
use crate::metrics_log::MetricsLog;
use chrono::NaiveDateTime;
use std::future::pending;
use std::io::{self, BufRead};
use tokio::sync::{mpsc, watch};
use tokio::time;
use tracing::{debug, info, warn};

/// Reads the log and builds the frame for `now`.
pub fn load_view(log: &MetricsLog, session: &Session, now: NaiveDateTime) -> View {
    match log.snapshot() {
        Ok(snapshot) => render(&snapshot, session.window, now),
        Err(e) => {
            debug!(error = %e, path = %log.path().display(), "Metrics log cannot be used");
            View::Corrupt(e.to_string())
        }
    }
}

/// Remembers the last integrity error shown, returning whether `view`
/// carries a different one.
fn corruption_changed(last: &mut Option<String>, view: &View) -> bool {
    let current = match view {
        View::Corrupt(reason) => Some(reason.as_str()),
        _ => None,
    };
    if last.as_deref() == current {
        return false;
    }
    *last = current.map(str::to_string);
    current.is_some()
}

enum Wake {
    Timer,
    Input(Option<String>),
    Shutdown,
}

/// Runs the dashboard until the operator quits or shutdown is signalled.
///
/// `commands` carries raw operator input lines; when it closes, a manual
/// session ends and an auto-refreshing one keeps going. Returns the final
/// session state.
pub async fn run_session<S, C>(
    log: &MetricsLog,
    screen: &mut S,
    mut session: Session,
    mut commands: mpsc::Receiver<String>,
    mut shutdown_rx: watch::Receiver<()>,
    clock: C,
) -> io::Result<Session>
where
    S: Screen,
    C: Fn() -> NaiveDateTime,
{
    let mut status: Option<String> = None;
    let mut input_open = true;
    let mut last_corruption: Option<String> = None;
    info!(window = %session.window, refresh = %session.refresh, "Dashboard session started.");

    loop {
        let view = load_view(log, &session, clock());
        if corruption_changed(&mut last_corruption, &view) {
            warn!(
                error = last_corruption.as_deref().unwrap_or_default(),
                path = %log.path().display(),
                "Metrics log cannot be used"
            );
        }
        screen.show(&view, &session, status.take().as_deref())?;

        let period = session.refresh.period();
        let timer = async {
            match period {
                Some(period) => time::sleep(period).await,
                None => pending::<()>().await,
            }
        };

        let wake = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => Wake::Shutdown,
            line = commands.recv(), if input_open => Wake::Input(line),
            _ = timer => Wake::Timer,
        };

        match wake {
            Wake::Shutdown => {
                info!("Dashboard received shutdown signal.");
                break;
            }
            Wake::Timer => debug!("Auto-refresh"),
            Wake::Input(None) => {
                debug!("Operator input closed");
                input_open = false;
                if period.is_none() {
                    break;
                }
            }
            Wake::Input(Some(line)) => match line.parse::<SessionCommand>() {
                Ok(command) => {
                    debug!(?command, "Operator command");
                    if !session.apply(command) {
                        break;
                    }
                }
                Err(e) => status = Some(e.to_string()),
            },
        }
    }

    info!("Dashboard session finished.");
    Ok(session)
}

/// Forwards stdin lines to the returned channel from a dedicated thread.
///
/// Blocking reads live on their own thread so an idle terminal never holds
/// up the runtime; the thread ends when stdin closes or the receiver is
/// dropped.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
