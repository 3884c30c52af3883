use cafe_core::http::FromRef;
use cafe_data::DrinkRepository;
use cafe_security::AuthGuard;

#[derive(Clone)]
pub struct AppState {
    pub drinks: DrinkRepository,
    pub guard: AuthGuard,
}

impl AppState {
    pub fn new(drinks: DrinkRepository, guard: AuthGuard) -> Self {
        Self { drinks, guard }
    }
}

impl FromRef<AppState> for AuthGuard {
    fn from_ref(state: &AppState) -> Self {
        state.guard.clone()
    }
}

impl FromRef<AppState> for DrinkRepository {
    fn from_ref(state: &AppState) -> Self {
        state.drinks.clone()
    }
}
