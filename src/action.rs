use crate::controller::FetchOutcome;
use crate::error::ShelfError;
use crate::types::{Category, Store};

/// Which pane has keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    Categories,
    #[default]
    Stores,
}

#[derive(Debug)]
pub enum Action {
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    Select,
    SwitchPane,

    // Startup
    Load,
    CategoriesLoaded(Vec<Category>),

    // Store list
    PageLoaded(FetchOutcome<Store>),
    LoadMore,
    Retry,
    ToggleFavorite,

    // Filters
    PickCategory(Option<String>),
    CycleSort,
    CycleStatus,
    ToggleFeatured,
    NextLetter,
    PrevLetter,
    ResetFilters,

    // Search
    EnterSearchMode,
    ExitSearchMode,
    SearchInput(char),
    SearchBackspace,
    SearchConfirm,
    /// Debounced search text, ready to fold into the filter
    SearchSettled(String),

    Error(String),
    None,
}

impl From<ShelfError> for Action {
    fn from(err: ShelfError) -> Self {
        Action::Error(err.to_string())
    }
}
