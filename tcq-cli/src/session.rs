//! Stateful search session: paging, detail lookups and history.

use crate::history::{NavigationHistory, SearchHistory, SearchHistoryEntry};
use tcq_client::{ItemRef, SearchEngine, SearchExecutionError};
use tcq_core::{SearchItem, SearchRequest, SearchResult};

/// A place the user can navigate back or forward to.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Results(SearchRequest),
    Details(ItemRef),
}

/// What a back or forward step re-displays.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Results(SearchResult),
    Details(SearchItem),
}

pub struct SearchSession {
    engine: SearchEngine,
    request: Option<SearchRequest>,
    last_result: Option<SearchResult>,
    searches: SearchHistory,
    navigation: NavigationHistory<Location>,
}

impl SearchSession {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            request: None,
            last_result: None,
            searches: SearchHistory::new(),
            navigation: NavigationHistory::new(),
        }
    }

    pub fn current_request(&self) -> Option<&SearchRequest> {
        self.request.as_ref()
    }

    pub fn last_result(&self) -> Option<&SearchResult> {
        self.last_result.as_ref()
    }

    pub fn search_history(&self) -> &SearchHistory {
        &self.searches
    }

    pub fn search_history_mut(&mut self) -> &mut SearchHistory {
        &mut self.searches
    }

    pub fn navigation(&self) -> &NavigationHistory<Location> {
        &self.navigation
    }

    /// Run a new search and record it in both histories.
    pub async fn search(
        &mut self,
        request: SearchRequest,
    ) -> Result<&SearchResult, SearchExecutionError> {
        let result = self.engine.search(&request).await?;
        self.searches.add(SearchHistoryEntry::new(
            request.query(),
            request.kind(),
            result.pagination.total_results,
        ));
        self.navigation.push(Location::Results(request.clone()));
        Ok(self.store(request, result))
    }

    pub async fn next_page(&mut self) -> Result<Option<&SearchResult>, SearchExecutionError> {
        let page = match self.last_result.as_ref() {
            Some(result) if result.pagination.has_next => {
                result.pagination.current_page.saturating_add(1)
            }
            _ => return Ok(None),
        };
        self.goto_page(page).await
    }

    pub async fn previous_page(&mut self) -> Result<Option<&SearchResult>, SearchExecutionError> {
        let page = match self.last_result.as_ref() {
            Some(result) if result.pagination.has_previous => {
                result.pagination.current_page.saturating_sub(1)
            }
            _ => return Ok(None),
        };
        self.goto_page(page).await
    }

    /// Jump to zero-based `page` of the current search.
    ///
    /// Returns `Ok(None)` without touching the backend when nothing has been
    /// searched yet or `page` lies beyond the last page.
    pub async fn goto_page(
        &mut self,
        page: u32,
    ) -> Result<Option<&SearchResult>, SearchExecutionError> {
        let (Some(request), Some(result)) = (self.request.as_ref(), self.last_result.as_ref())
        else {
            return Ok(None);
        };
        match result.pagination.last_page() {
            Some(last) if page <= last => {}
            _ => return Ok(None),
        }

        let request = request.at_page(page);
        tracing::debug!(page, query = %request.query(), "Changing page");
        let result = self.engine.search(&request).await?;
        self.navigation.push(Location::Results(request.clone()));
        Ok(Some(self.store(request, result)))
    }

    /// Fetch one record's details and make it the current location.
    pub async fn open(
        &mut self,
        item: ItemRef,
        include_associations: bool,
    ) -> Result<SearchItem, SearchExecutionError> {
        let details = self
            .engine
            .get_item_details(item, include_associations)
            .await?;
        self.navigation.push(Location::Details(item));
        Ok(details)
    }

    pub async fn back(&mut self) -> Result<Option<Screen>, SearchExecutionError> {
        match self.navigation.back().cloned() {
            Some(location) => self.revisit(location).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn forward(&mut self) -> Result<Option<Screen>, SearchExecutionError> {
        match self.navigation.forward().cloned() {
            Some(location) => self.revisit(location).await.map(Some),
            None => Ok(None),
        }
    }

    /// Re-display a location without pushing it onto the navigation stack.
    async fn revisit(&mut self, location: Location) -> Result<Screen, SearchExecutionError> {
        match location {
            Location::Results(request) => {
                let result = self.engine.search(&request).await?;
                Ok(Screen::Results(self.store(request, result).clone()))
            }
            Location::Details(item) => {
                let details = self.engine.get_item_details(item, false).await?;
                Ok(Screen::Details(details))
            }
        }
    }

    fn store(&mut self, request: SearchRequest, result: SearchResult) -> &SearchResult {
        self.request = Some(request);
        self.last_result.insert(result)
    }
}
