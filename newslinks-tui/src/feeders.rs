use crate::tui::TuiMsg;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

const INPUT_POLL: Duration = Duration::from_millis(100);
const TICK: Duration = Duration::from_millis(80);

/// Spawn the terminal-input reader and the redraw ticker. Both stop when
/// `cancel` fires or the receiver is dropped.
pub fn spawn_tui_feeders(tx: mpsc::Sender<TuiMsg>, cancel: CancellationToken) {
    let tx_in = tx.clone();
    let cancel_in = cancel.clone();
    // crossterm's reader blocks; the poll timeout lets the thread see `cancel`.
    let spawned = std::thread::Builder::new()
        .name("newslinks-input".into())
        .spawn(move || {
            while !cancel_in.is_cancelled() {
                match crossterm::event::poll(INPUT_POLL) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        let _ = tx_in.blocking_send(TuiMsg::InputError(format!("input: {e}")));
                        break;
                    }
                }
                let msg = match crossterm::event::read() {
                    Ok(ev) => TuiMsg::Input(ev),
                    Err(e) => TuiMsg::InputError(format!("input: {e}")),
                };
                if tx_in.blocking_send(msg).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "failed to spawn input thread");
    }

    tokio::spawn(async move {
        let mut interval = time::interval(TICK);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if tx.is_closed() {
                        break;
                    }
                    let _ = tx.try_send(TuiMsg::Tick);
                }
            }
        }
    });
}
