use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::catalog::CatalogSource;
use crate::state::{Delta, ProviderCommand};

/// Runs catalog lookups off the UI thread. Creature fetches run in order on
/// the worker; each name catalog fetch gets its own thread so a slow list
/// never holds up a round. The worker exits once either channel is closed.
pub fn spawn_provider<S>(
    source: S,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()>
where
    S: CatalogSource + 'static,
{
    let source = Arc::new(source);
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            if let ProviderCommand::FetchNameCatalog { .. } = cmd {
                let source = Arc::clone(&source);
                let tx = tx.clone();
                thread::spawn(move || {
                    let _ = tx.send(handle_command(&*source, cmd));
                });
                continue;
            }
            let delta = handle_command(&*source, cmd);
            if tx.send(delta).is_err() {
                break;
            }
        }
        tracing::debug!("provider stopped");
    })
}

pub fn handle_command(source: &dyn CatalogSource, cmd: ProviderCommand) -> Delta {
    match cmd {
        ProviderCommand::FetchCreature { generation, id } => {
            tracing::debug!(generation, id, "fetching creature");
            match source.fetch_by_id(id) {
                Ok(record) => Delta::CreatureLoaded { generation, record },
                Err(err) => Delta::CreatureFailed {
                    generation,
                    error: format!("#{id}: {err}"),
                },
            }
        }
        ProviderCommand::FetchNameCatalog { limit } => {
            tracing::debug!(limit, "fetching name catalog");
            match source.fetch_name_catalog(limit) {
                Ok(catalog) => Delta::NameCatalogLoaded(catalog),
                Err(err) => Delta::NameCatalogFailed(err.to_string()),
            }
        }
    }
}
