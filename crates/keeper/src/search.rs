//! Search - resolve a typed query to a single account
//!
//! The query is encoded once and matched as a substring of the stored
//! (encoded) name, description and search tags. This is equivalent to
//! matching the decoded text because the cipher maps characters one to one.
//!
//! [`resolve`] is a single non-interactive step. [`SearchFlow`] wraps it in
//! the prompt / disambiguate loop the CLI drives, without doing any I/O.

use crate::error::Result;
use crate::record::{Field, RecordId};
use crate::store::{compare_names, AccountStore};
use serde::Serialize;

/// Query that lists every account (case-insensitive)
pub const ALL_QUERY: &str = "all";

/// Fields eligible for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope(Vec<Field>);

impl Scope {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self(fields.into_iter().collect())
    }

    pub fn fields(&self) -> &[Field] {
        &self.0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new([Field::Name, Field::Description, Field::SearchTags])
    }
}

/// One entry of an ambiguous result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    #[serde(skip)]
    pub id: RecordId,
    /// Decoded account name
    pub name: String,
}

/// Result of a single search step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Exactly one account matched
    Resolved(RecordId),
    /// Non-empty query, nothing matched
    NoMatch,
    /// Several accounts matched; sorted by name, case-insensitively
    Ambiguous(Vec<Candidate>),
    /// The query was empty: no selection
    Empty,
}

/// Run one search over `store`
pub fn resolve(store: &AccountStore, query: &str, scope: &Scope) -> Result<SearchOutcome> {
    if query.is_empty() {
        return Ok(SearchOutcome::Empty);
    }

    let mut ids = if query.eq_ignore_ascii_case(ALL_QUERY) {
        store.ids()?
    } else {
        let encoded = store.cipher().encode(query);
        store.ids_matching(&encoded, scope.fields())?
    };

    let outcome = match ids.len() {
        0 => SearchOutcome::NoMatch,
        1 => SearchOutcome::Resolved(ids.remove(0)),
        _ => SearchOutcome::Ambiguous(candidates(store, ids)),
    };
    Ok(outcome)
}

/// Decode and sort matching handles for display
fn candidates(store: &AccountStore, ids: Vec<RecordId>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = ids
        .into_iter()
        .map(|id| Candidate {
            name: store.name_of(&id),
            id,
        })
        .collect();
    candidates.sort_by(|a, b| compare_names(&a.name, &b.name));
    candidates
}

/// Pick a candidate from a 1-based number typed by the user
pub fn choose(candidates: &[Candidate], input: &str) -> Option<RecordId> {
    let number: usize = input.trim().parse().ok()?;
    if number == 0 {
        return None;
    }
    candidates.get(number - 1).map(|c| c.id.clone())
}

/// Where an interactive search currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    /// Waiting for a query; `notice` explains why we are asking again
    Prompting { notice: Option<String> },
    /// A query is being run
    Searching { query: String },
    /// Waiting for a number picking one of `candidates`
    Disambiguating {
        query: String,
        candidates: Vec<Candidate>,
    },
    Resolved(RecordId),
    Abandoned,
}

/// Prompt / search / disambiguate state machine.
///
/// The caller shows the current state, reads a line and passes it to
/// [`SearchFlow::submit`] until [`SearchFlow::is_finished`] is true.
#[derive(Debug, Clone)]
pub struct SearchFlow {
    scope: Scope,
    state: SearchState,
}

impl SearchFlow {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            state: SearchState::Prompting { notice: None },
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SearchState::Resolved(_) | SearchState::Abandoned)
    }

    /// Give up on the search
    pub fn abandon(&mut self) {
        self.state = SearchState::Abandoned;
    }

    /// The chosen handle, if the search resolved
    pub fn resolved(&self) -> Option<&RecordId> {
        match &self.state {
            SearchState::Resolved(id) => Some(id),
            _ => None,
        }
    }

    /// Feed one line of input.
    ///
    /// While prompting, `input` is the query: empty abandons, no match asks
    /// again with a notice. While disambiguating, `input` is the candidate
    /// number: anything out of range or non-numeric goes back to the prompt.
    /// If a search step fails the flow stays in `Searching` and the next
    /// call retries the same query.
    pub fn submit(&mut self, store: &AccountStore, input: &str) -> Result<&SearchState> {
        match &self.state {
            SearchState::Prompting { .. } => {
                self.state = SearchState::Searching {
                    query: input.to_string(),
                };
                self.run(store)?;
            }
            SearchState::Searching { .. } => self.run(store)?,
            SearchState::Disambiguating { candidates, .. } => {
                let choice = choose(candidates, input);
                self.state = match choice {
                    Some(id) => SearchState::Resolved(id),
                    None => SearchState::Prompting { notice: None },
                };
            }
            SearchState::Resolved(_) | SearchState::Abandoned => {}
        }
        Ok(&self.state)
    }

    fn run(&mut self, store: &AccountStore) -> Result<()> {
        let query = match &self.state {
            SearchState::Searching { query } => query.clone(),
            _ => return Ok(()),
        };

        self.state = match resolve(store, &query, &self.scope)? {
            SearchOutcome::Empty => SearchState::Abandoned,
            SearchOutcome::Resolved(id) => SearchState::Resolved(id),
            SearchOutcome::NoMatch => SearchState::Prompting {
                notice: Some(format!("No matches for search '{}'.", query)),
            },
            SearchOutcome::Ambiguous(candidates) => SearchState::Disambiguating { query, candidates },
        };
        Ok(())
    }
}
