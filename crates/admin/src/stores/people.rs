//! Customer and consultant store.

use tracing::instrument;

use tmc_core::validation::ValidPerson;
use tmc_core::{Person, PersonId};

use super::{ResourceCore, ResourceState};
use crate::backend::{ApiError, NewPerson, PersonApi, PersonKind};

/// State store for one kind of person.
pub struct PersonStore<A> {
    api: A,
    kind: PersonKind,
    core: ResourceCore<Person>,
}

impl<A: PersonApi> PersonStore<A> {
    /// Create an empty store for `kind`.
    pub fn new(api: A, kind: PersonKind) -> Self {
        Self {
            api,
            kind,
            core: ResourceCore::new(),
        }
    }

    /// The kind of person this store manages.
    pub const fn kind(&self) -> PersonKind {
        self.kind
    }

    /// Current state.
    pub async fn snapshot(&self) -> ResourceState<Person> {
        self.core.snapshot().await
    }

    /// Load the full list.
    ///
    /// # Errors
    ///
    /// Returns the backend error; it is also recorded in the state unless a
    /// later fetch superseded this one.
    #[instrument(skip(self), fields(kind = ?self.kind))]
    pub async fn fetch_all(&self) -> Result<(), ApiError> {
        let _in_flight = self.core.begin();
        let generation = self.core.next_list_generation();
        let result = self.api.list_people(self.kind).await;
        self.core.apply_list(generation, &result).await;
        result.map(|_| ())
    }

    /// Load one person into `current`.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self), fields(person_id = %id))]
    pub async fn fetch_by_id(&self, id: PersonId) -> Result<Person, ApiError> {
        let _in_flight = self.core.begin();
        let generation = self.core.next_item_generation();
        let result = self.api.get_person(id).await;
        self.core.apply_item(generation, &result).await;
        result
    }

    /// Create a person and append it to the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error, also recorded in the state.
    #[instrument(skip(self, new))]
    pub async fn create(&self, new: &NewPerson) -> Result<Person, ApiError> {
        let _in_flight = self.core.begin();
        match self.api.create_person(new).await {
            Ok(person) => {
                tracing::info!(person_id = %person.id, kind = ?self.kind, "Person created");
                self.core.insert(person.clone()).await;
                Ok(person)
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Update a person and replace it in the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error, also recorded in the state.
    #[instrument(skip(self, person), fields(person_id = %id))]
    pub async fn update(&self, id: PersonId, person: &ValidPerson) -> Result<Person, ApiError> {
        let _in_flight = self.core.begin();
        match self.api.update_person(id, self.kind, person).await {
            Ok(updated) => {
                tracing::info!(person_id = %id, "Person updated");
                self.core.replace(updated.clone()).await;
                Ok(updated)
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Delete a person and drop it from the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error (for example when the person still owns
    /// orders); the list is left untouched.
    #[instrument(skip(self), fields(person_id = %id))]
    pub async fn remove(&self, id: PersonId) -> Result<(), ApiError> {
        let _in_flight = self.core.begin();
        match self.api.delete_person(id).await {
            Ok(()) => {
                tracing::info!(person_id = %id, "Person deleted");
                self.core.remove(id).await;
                Ok(())
            }
            Err(e) => {
                self.core.fail(&e).await;
                Err(e)
            }
        }
    }

    /// Reload the list.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.fetch_all().await
    }

    /// Forget the last error.
    pub async fn clear_error(&self) {
        self.core.clear_error().await;
    }
}
