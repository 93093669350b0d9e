//! Command dispatch for the two views

use crate::{
    clock::Clock,
    command::{Command, HELP},
    geocode::CityLookup,
    location::LocationKey,
    search::{CitySearch, SearchState},
    settings::Settings,
    store::{AddOutcome, LocationStore},
    ticker::ClockTicker,
    view,
};
use anyhow::{anyhow, bail};
use log::{debug, error};
use std::{
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    thread::JoinHandle,
};

const DASHBOARD_FOOTER: &str =
    "left <n> | right <n> | del <n> | set ... | back | quit\n";
/// Clear the terminal and home the cursor
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Output shared between the command loop, the ticker, and search threads
#[derive(Clone)]
pub struct Screen(Arc<Mutex<Box<dyn Write + Send>>>);

impl Screen {
    pub fn new(writer: impl 'static + Write + Send) -> Self {
        Self(Arc::new(Mutex::new(Box::new(writer))))
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn print(&self, text: &str) {
        let result = self
            .0
            .lock()
            .map_err(|err| anyhow!("{err}"))
            .and_then(|mut writer| {
                writer.write_all(text.as_bytes())?;
                writer.flush()?;
                Ok(())
            });
        if let Err(err) = result {
            error!("Error writing to screen: {err:?}");
        }
    }

    /// Transient feedback line
    pub fn toast(&self, message: &str) {
        self.print(&format!(">> {message}\n"));
    }
}

/// Location waiting on a yes/no before deletion. Held by key so the answer
/// applies to the same city even if the list moved meanwhile. Shared with the
/// dashboard redraw so the question stays on screen.
#[derive(Clone, Default)]
struct PendingDelete(Arc<Mutex<Option<LocationKey>>>);

impl PendingDelete {
    fn set(&self, key: LocationKey) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(key);
    }

    fn take(&self) -> Option<LocationKey> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Question line for the dashboard footer, if one is open
    fn question(&self) -> Option<String> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|key| format!("Remove {}? (y/n)\n", key.name))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum View {
    Search,
    Dashboard,
}

/// Whether the command loop should keep going
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    store: Arc<RwLock<LocationStore>>,
    search: CitySearch,
    ticker: ClockTicker,
    screen: Screen,
    view: View,
    pending_delete: PendingDelete,
    search_thread: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(
        store: LocationStore,
        lookup: Arc<dyn CityLookup>,
        clock: Arc<dyn Clock>,
        screen: Screen,
    ) -> Self {
        let search_screen = screen.clone();
        let search = CitySearch::new(lookup, move |state| {
            show_search_state(&search_screen, state)
        });
        Self {
            store: Arc::new(RwLock::new(store)),
            search,
            ticker: ClockTicker::new(clock),
            screen,
            view: View::Search,
            pending_delete: PendingDelete::default(),
            search_thread: None,
        }
    }

    /// Input prompt. The dashboard redraws the whole screen every tick, so it
    /// only gets one when not ticking
    pub fn prompt(&self) {
        if !self.ticker.is_running() {
            self.screen.print("> ");
        }
    }

    /// Initial screen
    pub fn greet(&self) -> anyhow::Result<()> {
        self.screen.print("World clock. Type `help` for commands.\n");
        self.print_saved_list()
    }

    /// Parse and run one line of input
    pub fn handle(&mut self, line: &str) -> anyhow::Result<Flow> {
        let command: Command = line.parse()?;
        debug!("Running command {command:?}");

        // A pending question only survives until the next command
        let pending_delete = self.pending_delete.take();

        match command {
            Command::Search(query) => {
                self.require_view(View::Search)?;
                // Results are printed by the listener when they arrive
                self.screen.print("Searching...\n");
                self.search_thread = self.search.start(&query)?;
            }
            Command::Add(index) => {
                self.require_view(View::Search)?;
                let candidate = self
                    .search
                    .candidate(index)
                    .ok_or_else(|| anyhow!("No search result #{}", index + 1))?;
                let location = candidate.to_location();
                let name = location.name.clone();
                let outcome = self.store_mut()?.add(location)?;
                match outcome {
                    AddOutcome::Added => {
                        self.search.clear();
                        self.screen.toast(&format!("Added {name}"));
                        self.print_saved_list()?;
                    }
                    AddOutcome::Duplicate => self.screen.toast("Already added!"),
                }
            }
            Command::Remove(index) => {
                self.require_view(View::Search)?;
                let removed = self.store_mut()?.remove(index)?;
                let location =
                    removed.ok_or_else(|| anyhow!("No saved city #{}", index + 1))?;
                self.screen.toast(&format!("Removed {}", location.name));
                self.print_saved_list()?;
            }
            Command::List => {
                self.require_view(View::Search)?;
                self.print_saved_list()?;
            }
            Command::Dashboard => {
                self.require_view(View::Search)?;
                self.view = View::Dashboard;
                // Results are only shown on the search view, so drop them
                // along with any search still in flight
                self.search.clear();
                let screen = self.screen.clone();
                let pending = self.pending_delete.clone();
                self.ticker.start(Arc::clone(&self.store), move |frame| {
                    screen.print(&format!(
                        "{CLEAR}{}{DASHBOARD_FOOTER}{}",
                        view::render_dashboard(frame),
                        pending.question().unwrap_or_default()
                    ));
                });
            }
            Command::Back => {
                self.require_view(View::Dashboard)?;
                self.ticker.stop();
                self.view = View::Search;
                self.print_saved_list()?;
            }
            Command::Move(index, direction) => {
                self.require_view(View::Dashboard)?;
                let mut store = self.store_mut()?;
                if index >= store.locations().len() {
                    bail!("No card #{}", index + 1);
                }
                // Moving off either end is a silent no-op
                let moved = store.move_location(index, direction)?;
                drop(store);
                if moved {
                    self.ticker.refresh();
                }
            }
            Command::Delete(index) => {
                self.require_view(View::Dashboard)?;
                let key = self
                    .store()?
                    .locations()
                    .get(index)
                    .map(|location| location.key())
                    .ok_or_else(|| anyhow!("No card #{}", index + 1))?;
                self.pending_delete.set(key);
                if let Some(question) = self.pending_delete.question() {
                    self.screen.print(&question);
                }
            }
            Command::Confirm(yes) => {
                let Some(key) = pending_delete else {
                    bail!("Nothing to confirm");
                };
                if yes {
                    self.delete(&key)?;
                }
            }
            Command::SetSize(field, size) => {
                let settings = self.store()?.settings().with_size(field, size);
                self.update_settings(settings)?;
            }
            Command::SetDateFormat(date_format) => {
                let settings =
                    self.store()?.settings().with_date_format(date_format);
                self.update_settings(settings)?;
            }
            Command::ShowSettings => {
                let settings = self.store()?.settings();
                self.screen.print(&format_settings(&settings));
            }
            Command::Help => self.screen.print(&format!("{HELP}\n")),
            Command::Quit => {
                self.ticker.stop();
                if let Some(handle) = &self.search_thread {
                    if !handle.is_finished() {
                        debug!("Abandoning search in flight");
                    }
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Remove a location by key, wherever it currently is
    fn delete(&mut self, key: &LocationKey) -> anyhow::Result<()> {
        let mut store = self.store_mut()?;
        let Some(index) = store.position(key) else {
            bail!("{} is no longer saved", key.name);
        };
        store.remove(index)?;
        drop(store);
        self.ticker.refresh();
        Ok(())
    }

    fn update_settings(&mut self, settings: Settings) -> anyhow::Result<()> {
        self.store_mut()?.update_settings(settings)?;
        // Redraws the dashboard if it's up
        self.ticker.refresh();
        if self.view == View::Search {
            self.screen.toast("Settings saved");
        }
        Ok(())
    }

    fn require_view(&self, view: View) -> anyhow::Result<()> {
        match (self.view, view) {
            (current, wanted) if current == wanted => Ok(()),
            (_, View::Search) => bail!("Not available on the dashboard, use `back` first"),
            (_, View::Dashboard) => bail!("Only available on the dashboard, use `dash` first"),
        }
    }

    fn print_saved_list(&self) -> anyhow::Result<()> {
        let text = view::render_saved_list(self.store()?.locations());
        self.screen.print(&text);
        Ok(())
    }

    fn store(&self) -> anyhow::Result<RwLockReadGuard<'_, LocationStore>> {
        self.store.read().map_err(|err| anyhow!("{err}"))
    }

    fn store_mut(&self) -> anyhow::Result<RwLockWriteGuard<'_, LocationStore>> {
        self.store.write().map_err(|err| anyhow!("{err}"))
    }

    /// Block until the most recent search thread finishes
    #[cfg(test)]
    fn join_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            handle.join().unwrap();
        }
    }
}

fn show_search_state(screen: &Screen, state: &SearchState) {
    if let Some(status) = state.status() {
        screen.print(&format!("{status}\n"));
    } else if let SearchState::Found(candidates) = state {
        screen.print(&view::render_results(candidates));
    }
}

fn format_settings(settings: &Settings) -> String {
    format!(
        "city size:    {}\ncountry size: {}\ntime size:    {}\ndate size:    {}\ndate format:  {}\n",
        settings.city_size,
        settings.country_size,
        settings.time_size,
        settings.date_size,
        settings.date_format,
    )
}
