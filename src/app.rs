use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::{Action, Pane};
use crate::controller::{Applied, FetchRequest, ListController};
use crate::debounce::Debouncer;
use crate::event::Event;
use crate::favorites::FavoritesStore;
use crate::fetcher::{CatalogClient, PageFetcher};
use crate::filter::{FilterState, ALPHABET_KEY, CATEGORY_KEY, FEATURED_KEY, SORT_KEY, STATUS_KEY};
use crate::trigger::{ListViewport, LoadMoreTrigger};
use crate::types::{Category, Identified, SortKey, Store};

const STATUS_CYCLE: [&str; 2] = ["active", "draft"];

pub struct App {
    pub list: ListController<Store>,
    pub favorites: FavoritesStore,
    pub categories: Vec<Category>,
    pub pane: Pane,
    /// 0 is the "All" entry, `n` is `categories[n - 1]`
    pub category_index: usize,
    pub store_index: usize,
    pub viewport: ListViewport,
    pub search_mode: bool,
    pub search_input: String,
    pub error: Option<String>,
    pub should_quit: bool,
    trigger: LoadMoreTrigger,
    debouncer: Debouncer,
    search_delay: Duration,
    catalog: Arc<CatalogClient>,
    fetcher: Arc<dyn PageFetcher<Store>>,
    action_tx: mpsc::UnboundedSender<Action>,
}

/// Construction parameters that come from config and the command line
pub struct AppOptions {
    pub initial_filter: FilterState,
    pub page_size: u32,
    pub search_delay: Duration,
    pub prefetch_distance: usize,
}

impl App {
    pub fn new(
        catalog: CatalogClient,
        favorites: FavoritesStore,
        options: AppOptions,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let fetcher: Arc<dyn PageFetcher<Store>> = catalog.clone();
        let search_input = options.initial_filter.search().unwrap_or_default().to_string();

        Self {
            list: ListController::new(options.initial_filter, options.page_size),
            favorites,
            categories: Vec::new(),
            pane: Pane::default(),
            category_index: 0,
            store_index: 0,
            viewport: ListViewport::default(),
            search_mode: false,
            search_input,
            error: None,
            should_quit: false,
            trigger: LoadMoreTrigger::new(options.prefetch_distance),
            debouncer: Debouncer::new(),
            search_delay: options.search_delay,
            catalog,
            fetcher,
            action_tx,
        }
    }

    pub fn handle_event(&self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key),
            _ => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if self.search_mode {
            return match key.code {
                KeyCode::Esc => Action::ExitSearchMode,
                KeyCode::Enter => Action::SearchConfirm,
                KeyCode::Backspace => Action::SearchBackspace,
                KeyCode::Char(c) => Action::SearchInput(c),
                _ => Action::None,
            };
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('d') => Action::PageDown,
                KeyCode::Char('u') => Action::PageUp,
                _ => Action::None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => Action::ScrollDown,
            KeyCode::Char('k') | KeyCode::Up => Action::ScrollUp,
            KeyCode::Char('g') | KeyCode::Home => Action::GoToTop,
            KeyCode::Char('G') | KeyCode::End => Action::GoToBottom,
            KeyCode::PageDown => Action::PageDown,
            KeyCode::PageUp => Action::PageUp,
            KeyCode::Enter => Action::Select,
            KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => Action::SwitchPane,
            KeyCode::Char('/') => Action::EnterSearchMode,
            KeyCode::Char('s') => Action::CycleSort,
            KeyCode::Char('t') => Action::CycleStatus,
            KeyCode::Char('F') => Action::ToggleFeatured,
            KeyCode::Char(']') => Action::NextLetter,
            KeyCode::Char('[') => Action::PrevLetter,
            KeyCode::Char('x') => Action::ResetFilters,
            KeyCode::Char('f') => Action::ToggleFavorite,
            KeyCode::Char('r') => Action::Retry,
            _ => Action::None,
        }
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some() && !matches!(action, Action::PageLoaded(_) | Action::None) {
            self.error = None;
        }

        match action {
            Action::Quit => {
                self.debouncer.cancel();
                self.should_quit = true;
            }
            Action::ScrollUp => match self.pane {
                Pane::Categories => {
                    self.category_index = self.category_index.saturating_sub(1);
                }
                Pane::Stores => {
                    self.store_index = self.store_index.saturating_sub(1);
                }
            },
            Action::ScrollDown => match self.pane {
                Pane::Categories => {
                    if self.category_index < self.categories.len() {
                        self.category_index += 1;
                    }
                }
                Pane::Stores => {
                    let len = self.list.snapshot().items.len();
                    if len > 0 && self.store_index < len - 1 {
                        self.store_index += 1;
                    }
                }
            },
            Action::PageUp => {
                let step = self.viewport.height.max(1);
                match self.pane {
                    Pane::Categories => {
                        self.category_index = self.category_index.saturating_sub(step);
                    }
                    Pane::Stores => {
                        self.store_index = self.store_index.saturating_sub(step);
                    }
                }
            }
            Action::PageDown => {
                let step = self.viewport.height.max(1);
                match self.pane {
                    Pane::Categories => {
                        self.category_index =
                            (self.category_index + step).min(self.categories.len());
                    }
                    Pane::Stores => {
                        let last = self.list.snapshot().items.len().saturating_sub(1);
                        self.store_index = (self.store_index + step).min(last);
                    }
                }
            }
            Action::GoToTop => match self.pane {
                Pane::Categories => self.category_index = 0,
                Pane::Stores => self.store_index = 0,
            },
            Action::GoToBottom => match self.pane {
                Pane::Categories => self.category_index = self.categories.len(),
                Pane::Stores => {
                    self.store_index = self.list.snapshot().items.len().saturating_sub(1);
                }
            },
            Action::Select => {
                if self.pane == Pane::Categories {
                    let id = self
                        .category_index
                        .checked_sub(1)
                        .and_then(|i| self.categories.get(i))
                        .map(|c| c.id.clone());
                    self.update(Action::PickCategory(id));
                }
            }
            Action::SwitchPane => {
                self.pane = match self.pane {
                    Pane::Categories => Pane::Stores,
                    Pane::Stores => Pane::Categories,
                };
            }

            Action::Load => {
                let request = self.list.start();
                self.spawn_fetch(request);
                self.spawn_load_categories();
            }
            Action::CategoriesLoaded(categories) => {
                self.categories = categories;
                self.category_index = self
                    .list
                    .filter()
                    .get(CATEGORY_KEY)
                    .and_then(|id| self.categories.iter().position(|c| c.id == id))
                    .map_or(0, |i| i + 1);
            }

            Action::PageLoaded(outcome) => {
                if self.list.apply(outcome) == Applied::Applied {
                    let len = self.list.snapshot().items.len();
                    self.store_index = self.store_index.min(len.saturating_sub(1));
                }
            }
            Action::LoadMore => {
                if let Some(request) = self.list.on_load_more_requested() {
                    self.spawn_fetch(request);
                }
            }
            Action::Retry => {
                if let Some(request) = self.list.retry() {
                    self.spawn_fetch(request);
                }
            }
            Action::ToggleFavorite => {
                let Some(id) = self
                    .list
                    .snapshot()
                    .items
                    .get(self.store_index)
                    .map(|s| s.id().to_string())
                else {
                    return;
                };
                if let Err(e) = self.favorites.toggle(&id) {
                    self.error = Some(e.to_string());
                }
            }

            Action::PickCategory(id) => {
                self.edit_filter(|f| f.set(CATEGORY_KEY, id.as_deref().unwrap_or_default()));
            }
            Action::CycleSort => {
                let next = SortKey::cycle(self.list.filter().sort());
                self.edit_filter(|f| f.set(SORT_KEY, next.map_or("", |k| k.as_param())));
            }
            Action::CycleStatus => {
                let next = match self.list.filter().get(STATUS_KEY) {
                    None => Some(STATUS_CYCLE[0]),
                    Some(current) => STATUS_CYCLE
                        .iter()
                        .position(|s| *s == current)
                        .and_then(|i| STATUS_CYCLE.get(i + 1))
                        .copied(),
                };
                self.edit_filter(|f| f.set(STATUS_KEY, next.unwrap_or_default()));
            }
            Action::ToggleFeatured => {
                let on = self.list.filter().get(FEATURED_KEY).is_some();
                self.edit_filter(|f| f.set(FEATURED_KEY, if on { "" } else { "true" }));
            }
            Action::NextLetter => {
                let next = step_letter(self.current_letter(), true);
                self.edit_filter(|f| set_letter(f, next));
            }
            Action::PrevLetter => {
                let next = step_letter(self.current_letter(), false);
                self.edit_filter(|f| set_letter(f, next));
            }
            Action::ResetFilters => {
                self.debouncer.cancel();
                self.search_input.clear();
                self.category_index = 0;
                self.apply_filter(FilterState::new());
            }

            Action::EnterSearchMode => {
                self.search_mode = true;
                self.pane = Pane::Stores;
            }
            Action::ExitSearchMode => {
                self.search_mode = false;
            }
            Action::SearchInput(c) => {
                self.search_input.push(c);
                self.schedule_search();
            }
            Action::SearchBackspace => {
                self.search_input.pop();
                self.schedule_search();
            }
            Action::SearchConfirm => {
                self.debouncer.cancel();
                self.search_mode = false;
                let text = self.search_input.clone();
                self.update(Action::SearchSettled(text));
            }
            Action::SearchSettled(text) => {
                let next = self.list.filter().with_search(&text);
                self.apply_filter(next);
            }

            Action::Error(msg) => {
                self.error = Some(msg);
            }
            Action::None => {}
        }
    }

    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Called before each draw with the number of list rows on screen.
    /// Keeps the selection visible and asks for the next page when the tail
    /// of the list comes into view.
    pub fn on_frame(&mut self, list_rows: usize) {
        self.viewport.height = list_rows.max(1);
        self.scroll_into_view();

        let snapshot = self.list.snapshot();
        let fire = self.trigger.poll(
            snapshot.items.iter().map(|s| s.id()),
            snapshot.items.len(),
            &self.viewport,
            snapshot.status,
        );
        if fire {
            self.update(Action::LoadMore);
        }
    }

    fn scroll_into_view(&mut self) {
        let height = self.viewport.height.max(1);
        if self.store_index < self.viewport.offset {
            self.viewport.offset = self.store_index;
        } else if self.store_index >= self.viewport.offset + height {
            self.viewport.offset = self.store_index + 1 - height;
        }
    }

    fn current_letter(&self) -> Option<char> {
        self.list
            .filter()
            .get(ALPHABET_KEY)
            .and_then(|v| v.strip_prefix('^'))
            .and_then(|v| v.chars().next())
    }

    fn edit_filter(&mut self, edit: impl FnOnce(&mut FilterState)) {
        let mut next = self.list.filter().clone();
        edit(&mut next);
        self.apply_filter(next);
    }

    fn apply_filter(&mut self, filter: FilterState) {
        if let Some(request) = self.list.on_filter_changed(filter) {
            self.store_index = 0;
            self.viewport.offset = 0;
            self.trigger.detach();
            self.spawn_fetch(request);
        }
    }

    fn schedule_search(&mut self) {
        let tx = self.action_tx.clone();
        let text = self.search_input.clone();
        self.debouncer.schedule(
            move || {
                tx.send(Action::SearchSettled(text)).ok();
            },
            self.search_delay,
        );
    }

    fn spawn_fetch(&self, request: FetchRequest) {
        let tx = self.action_tx.clone();
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            let outcome = request.run(fetcher.as_ref()).await;
            tx.send(Action::PageLoaded(outcome)).ok();
        });
    }

    fn spawn_load_categories(&self) {
        let tx = self.action_tx.clone();
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            match catalog.list_categories().await {
                Ok(categories) => {
                    tx.send(Action::CategoriesLoaded(categories)).ok();
                }
                Err(e) => {
                    tx.send(Action::from(e)).ok();
                }
            }
        });
    }
}

fn step_letter(current: Option<char>, forward: bool) -> Option<char> {
    match (current, forward) {
        (None, true) => Some('A'),
        (None, false) => Some('Z'),
        (Some('Z'), true) | (Some('A'), false) => None,
        (Some(c), true) => char::from_u32(c as u32 + 1),
        (Some(c), false) => char::from_u32(c as u32 - 1),
    }
}

fn set_letter(filter: &mut FilterState, letter: Option<char>) {
    match letter {
        Some(c) => filter.set(ALPHABET_KEY, &format!("^{}", c)),
        None => filter.clear(ALPHABET_KEY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::controller::FetchOutcome;
    use crate::favorites::MemoryStore;
    use crate::types::{ListStatus, Page};

    fn store(n: usize) -> Store {
        Store {
            id: format!("store-{}", n),
            name: format!("Store {}", n),
            category: None,
            cats: None,
            status: None,
            cashback: None,
            is_featured: false,
        }
    }

    fn app() -> (App, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let catalog = CatalogClient::new(CatalogConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..CatalogConfig::default()
        });
        let favorites = FavoritesStore::load(Box::new(MemoryStore::new()), "favoriteStores");
        let options = AppOptions {
            initial_filter: FilterState::new(),
            page_size: 20,
            search_delay: Duration::from_millis(300),
            prefetch_distance: 0,
        };
        (App::new(catalog, favorites, options, tx), rx)
    }

    fn answer(app: &App, count: usize, offset: usize) -> Action {
        let snapshot = app.list.snapshot();
        assert_eq!(snapshot.status, ListStatus::Loading);
        let page = if snapshot.items.is_empty() { 1 } else { snapshot.current_page + 1 };
        Action::PageLoaded(FetchOutcome {
            fingerprint: app.list.fingerprint().to_string(),
            page,
            generation: app.list.generation(),
            result: Ok(Page::from_batch(
                (offset..offset + count).map(store).collect(),
                page,
                20,
            )),
        })
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn keys_map_to_actions() {
        let (app, _rx) = app();
        assert!(matches!(app.handle_event(key(KeyCode::Char('/'))), Action::EnterSearchMode));
        assert!(matches!(app.handle_event(key(KeyCode::Char('s'))), Action::CycleSort));
        assert!(matches!(app.handle_event(key(KeyCode::Char('f'))), Action::ToggleFavorite));
        assert!(matches!(app.handle_event(Event::Tick), Action::None));
    }

    #[tokio::test]
    async fn search_mode_captures_characters() {
        let (mut app, _rx) = app();
        app.update(Action::EnterSearchMode);
        assert!(matches!(app.handle_event(key(KeyCode::Char('q'))), Action::SearchInput('q')));
        assert!(matches!(app.handle_event(key(KeyCode::Esc)), Action::ExitSearchMode));
    }

    #[tokio::test]
    async fn paging_moves_the_focused_pane_only() {
        let (mut app, _rx) = app();
        app.update(Action::Load);
        let first = answer(&app, 20, 0);
        app.update(first);
        app.on_frame(4);
        app.categories = (1..=6)
            .map(|n| Category {
                id: n.to_string(),
                name: format!("Category {}", n),
            })
            .collect();

        app.pane = Pane::Categories;
        app.update(Action::PageDown);
        assert_eq!(app.category_index, 4);
        assert_eq!(app.store_index, 0);
        app.update(Action::PageDown);
        assert_eq!(app.category_index, 6);
        app.update(Action::PageUp);
        assert_eq!(app.category_index, 2);

        app.pane = Pane::Stores;
        app.update(Action::PageDown);
        assert_eq!(app.store_index, 4);
        assert_eq!(app.category_index, 2);
    }

    #[tokio::test]
    async fn scrolling_to_the_tail_requests_the_next_page() {
        let (mut app, _rx) = app();
        app.update(Action::Load);
        let first = answer(&app, 20, 0);
        app.update(first);

        app.on_frame(10);
        assert_eq!(app.list.snapshot().status, ListStatus::Ready);

        app.update(Action::GoToBottom);
        app.on_frame(10);
        assert_eq!(app.list.snapshot().status, ListStatus::Loading);

        // further frames while loading don't issue another request
        app.on_frame(10);
        let second = answer(&app, 5, 20);
        app.update(second);
        assert_eq!(app.list.snapshot().items.len(), 25);
        assert!(!app.list.snapshot().has_more);
    }

    #[tokio::test]
    async fn toggle_favorite_on_selected_store() {
        let (mut app, _rx) = app();
        app.update(Action::Load);
        let first = answer(&app, 3, 0);
        app.update(first);

        app.update(Action::ScrollDown);
        app.update(Action::ToggleFavorite);
        assert!(app.favorites.is_favorite("store-1"));
        app.update(Action::ToggleFavorite);
        assert!(!app.favorites.is_favorite("store-1"));
    }

    #[tokio::test]
    async fn filter_actions_update_the_fingerprint() {
        let (mut app, _rx) = app();
        app.update(Action::Load);
        app.update(Action::CycleStatus);
        assert_eq!(app.list.fingerprint(), "status=active");
        app.update(Action::CycleStatus);
        assert_eq!(app.list.fingerprint(), "status=draft");
        app.update(Action::CycleStatus);
        assert_eq!(app.list.fingerprint(), "");

        app.update(Action::ToggleFeatured);
        app.update(Action::NextLetter);
        app.update(Action::CycleSort);
        assert_eq!(app.list.fingerprint(), "is_featured=true&name_like=%5EA&sort=name");

        app.update(Action::ResetFilters);
        assert_eq!(app.list.fingerprint(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn typed_search_is_debounced_into_one_filter_change() {
        let (mut app, mut rx) = app();
        app.update(Action::Load);
        app.update(Action::EnterSearchMode);
        for c in "tea".chars() {
            app.update(Action::SearchInput(c));
        }
        assert_eq!(app.list.fingerprint(), "");

        tokio::time::sleep(Duration::from_millis(400)).await;
        let mut settled = Vec::new();
        while let Ok(action) = rx.try_recv() {
            if let Action::SearchSettled(text) = action {
                settled.push(text);
            }
        }
        assert_eq!(settled, vec!["tea".to_string()]);

        app.update(Action::SearchSettled(settled.remove(0)));
        assert_eq!(app.list.fingerprint(), "search=tea");
    }

    #[test]
    fn letters_step_and_wrap_to_none() {
        assert_eq!(step_letter(None, true), Some('A'));
        assert_eq!(step_letter(Some('A'), true), Some('B'));
        assert_eq!(step_letter(Some('Z'), true), None);
        assert_eq!(step_letter(None, false), Some('Z'));
        assert_eq!(step_letter(Some('A'), false), None);
    }
}
